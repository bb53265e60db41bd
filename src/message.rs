/*
 * What travels through the UI task's queue.
 *
 * Each forwarding task tags its payload when it enqueues it, so the UI task
 * never has to guess the origin of a message from its size.
 */

use embassy_sync::channel::Channel;

use crate::config::QUEUE_CAPACITY;
use crate::outputs::Output;

pub type MessageQueue<M> = Channel<M, Message, QUEUE_CAPACITY>;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    Keypress(u8),
    PeripheralStatus(StatusWord),
}

impl From<u8> for Message {
    fn from(code: u8) -> Self {
        Message::Keypress(code)
    }
}

impl From<u16> for Message {
    fn from(word: u16) -> Self {
        Message::PeripheralStatus(StatusWord(word))
    }
}

impl From<StatusWord> for Message {
    fn from(status: StatusWord) -> Self {
        Message::PeripheralStatus(status)
    }
}

/// Fault status of the output driver chip. The low byte carries one fault
/// bit per output; the upper byte mirrors control bits and is not a fault.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusWord(pub u16);

impl StatusWord {
    pub const NO_FAULT: StatusWord = StatusWord(0x0000);

    pub fn is_clear(self) -> bool {
        self.0 & 0x00FF == 0
    }

    /// The output at fault, if exactly one output is at fault and nothing
    /// else is set. `None` for anything else: no bits, several bits, or
    /// stray upper bits.
    pub fn faulted_output(self) -> Option<Output> {
        Output::from_fault_word(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_are_tagged_by_type() {
        assert_eq!(Message::from(0x11u8), Message::Keypress(0x11));
        assert_eq!(
            Message::from(0x0004u16),
            Message::PeripheralStatus(StatusWord(0x0004))
        );
    }

    #[test]
    fn clear_ignores_the_control_byte() {
        assert!(StatusWord::NO_FAULT.is_clear());
        assert!(StatusWord(0x0300).is_clear());
        assert!(!StatusWord(0x0001).is_clear());
    }

    #[test]
    fn single_faults_name_their_output() {
        assert_eq!(StatusWord(0x04).faulted_output(), Some(Output::Out3));
        assert_eq!(StatusWord(0x05).faulted_output(), None);
    }
}
