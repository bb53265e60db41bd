/*
 * The keypad alphabet.
 *
 * The keypad service hands out single-byte key codes: ASCII for the digits,
 * small integers for the four function keys. Anything else is not a key and
 * is dropped by `Key::from_code`.
 */

pub mod code {
    pub const ZERO: u8 = 0x30;
    pub const NINE: u8 = 0x39;
    pub const A: u8 = 0x11;
    pub const B: u8 = 0x12;
    pub const C: u8 = 0x13;
    pub const D: u8 = 0x14;
    pub const STAR: u8 = 0x2A;
    pub const HASH: u8 = 0x23;
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    Digit(u8),
    /// Starts an adjustment, and accepts the rate being entered.
    A,
    B,
    C,
    /// Emergency stop, honoured in every state.
    D,
    Star,
    Hash,
}

impl Key {
    pub fn from_code(code: u8) -> Option<Key> {
        match code {
            code::ZERO..=code::NINE => Some(Key::Digit(code - code::ZERO)),
            code::A => Some(Key::A),
            code::B => Some(Key::B),
            code::C => Some(Key::C),
            code::D => Some(Key::D),
            code::STAR => Some(Key::Star),
            code::HASH => Some(Key::Hash),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Key::Digit(digit) => code::ZERO + digit,
            Key::A => code::A,
            Key::B => code::B,
            Key::C => code::C,
            Key::D => code::D,
            Key::Star => code::STAR,
            Key::Hash => code::HASH,
        }
    }

    /// Maps a character typed on a terminal to the key it stands for.
    pub fn from_char(c: char) -> Option<Key> {
        match c.to_ascii_uppercase() {
            '0'..='9' => Some(Key::Digit(c as u8 - b'0')),
            'A' => Some(Key::A),
            'B' => Some(Key::B),
            'C' => Some(Key::C),
            'D' => Some(Key::D),
            '*' => Some(Key::Star),
            '#' => Some(Key::Hash),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_decode_from_ascii() {
        assert_eq!(Key::from_code(0x30), Some(Key::Digit(0)));
        assert_eq!(Key::from_code(0x39), Some(Key::Digit(9)));
        assert_eq!(Key::from_code(0x3A), None);
    }

    #[test]
    fn function_keys_use_small_codes() {
        assert_eq!(Key::from_code(0x11), Some(Key::A));
        assert_eq!(Key::from_code(0x12), Some(Key::B));
        assert_eq!(Key::from_code(0x14), Some(Key::D));
        assert_eq!(Key::from_code(b'A'), None);
    }

    #[test]
    fn every_key_survives_its_code() {
        for key in [Key::Digit(7), Key::A, Key::B, Key::C, Key::D, Key::Star, Key::Hash] {
            assert_eq!(Key::from_code(key.code()), Some(key));
        }
    }

    #[test]
    fn terminal_characters() {
        assert_eq!(Key::from_char('d'), Some(Key::D));
        assert_eq!(Key::from_char('4'), Some(Key::Digit(4)));
        assert_eq!(Key::from_char('x'), None);
    }
}
