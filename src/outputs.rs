/*
 * The eight outputs of the output driver chip, the output command word and
 * the PWM rate.
 */

use enum_ordinalize::Ordinalize;

use crate::keys::Key;

pub const ALL_OFF: u16 = 0x0000;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Ordinalize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Output {
    Out1,
    Out2,
    Out3,
    Out4,
    Out5,
    Out6,
    Out7,
    Out8,
}

impl Output {
    /// The single bit the driver chip reports when this output is at fault.
    pub fn fault_mask(self) -> u16 {
        1 << self.ordinal()
    }

    pub fn label(self) -> &'static str {
        match self {
            Output::Out1 => "OUT1",
            Output::Out2 => "OUT2",
            Output::Out3 => "OUT3",
            Output::Out4 => "OUT4",
            Output::Out5 => "OUT5",
            Output::Out6 => "OUT6",
            Output::Out7 => "OUT7",
            Output::Out8 => "OUT8",
        }
    }

    pub fn from_fault_word(word: u16) -> Option<Output> {
        Output::VARIANTS
            .iter()
            .copied()
            .find(|output| output.fault_mask() == word)
    }
}

/// An output the operator can pick in the adjust sequence, with the bit that
/// switches it fully on in the output word.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Selection {
    pub output: Output,
    pub drive_mask: u16,
}

// The motor is wired to inputs 1 and 3 of the driver chip.
const SELECTABLE: [(u8, Selection); 2] = [
    (
        4,
        Selection {
            output: Output::Out4,
            drive_mask: 0x01,
        },
    ),
    (
        7,
        Selection {
            output: Output::Out7,
            drive_mask: 0x04,
        },
    ),
];

impl Selection {
    pub fn for_key(key: Key) -> Option<Selection> {
        let Key::Digit(digit) = key else {
            return None;
        };
        SELECTABLE
            .iter()
            .find(|(d, _)| *d == digit)
            .map(|(_, selection)| *selection)
    }
}

/// A PWM duty cycle in percent, 0 to 99. Zero means the channel is off.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmRate(u8);

impl PwmRate {
    pub const OFF: PwmRate = PwmRate(0);
    pub const MAX: PwmRate = PwmRate(99);

    pub const fn new(percent: u8) -> Option<PwmRate> {
        if percent <= Self::MAX.0 {
            Some(PwmRate(percent))
        } else {
            None
        }
    }

    pub const fn percent(self) -> u8 {
        self.0
    }

    pub const fn is_off(self) -> bool {
        self.0 == 0
    }

    pub const fn with_tens(self, digit: u8) -> Option<PwmRate> {
        if digit > 9 {
            return None;
        }
        PwmRate::new(10 * digit + self.0 % 10)
    }

    pub const fn with_ones(self, digit: u8) -> Option<PwmRate> {
        if digit > 9 {
            return None;
        }
        PwmRate::new(digit + 10 * (self.0 / 10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_masks_are_single_bits() {
        assert_eq!(Output::Out1.fault_mask(), 0x01);
        assert_eq!(Output::Out3.fault_mask(), 0x04);
        assert_eq!(Output::Out8.fault_mask(), 0x80);
    }

    #[test]
    fn fault_word_decoding() {
        assert_eq!(Output::from_fault_word(0x04), Some(Output::Out3));
        assert_eq!(Output::from_fault_word(0x80), Some(Output::Out8));
        assert_eq!(Output::from_fault_word(0x05), None);
        assert_eq!(Output::from_fault_word(0x00), None);
        assert_eq!(Output::from_fault_word(0x0104), None);
    }

    #[test]
    fn only_wired_outputs_are_selectable() {
        assert_eq!(
            Selection::for_key(Key::Digit(7)),
            Some(Selection {
                output: Output::Out7,
                drive_mask: 0x04
            })
        );
        assert_eq!(Selection::for_key(Key::Digit(4)).map(|s| s.drive_mask), Some(0x01));
        assert_eq!(Selection::for_key(Key::Digit(1)), None);
        assert_eq!(Selection::for_key(Key::A), None);
    }

    #[test]
    fn rate_is_bounded() {
        assert_eq!(PwmRate::new(99), Some(PwmRate::MAX));
        assert_eq!(PwmRate::new(100), None);
        assert!(PwmRate::new(0).unwrap().is_off());
    }

    #[test]
    fn digits_overwrite_never_accumulate() {
        let rate = PwmRate::OFF.with_tens(9).unwrap().with_ones(9).unwrap();
        assert_eq!(rate, PwmRate::MAX);
        assert_eq!(rate.with_tens(3).map(PwmRate::percent), Some(39));
        assert_eq!(rate.with_ones(0).map(PwmRate::percent), Some(90));
        assert_eq!(rate.with_tens(10), None);
    }
}
