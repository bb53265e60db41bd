/*
 * Forwarding tasks move events from a hardware source into the UI task's
 * queue, tagging each with its origin on the way.
 *
 * Enqueueing waits for room rather than dropping: when the UI task falls
 * behind, the forwarder stops taking events from its source, and the source
 * holds on to them.
 */

use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Sender};

use crate::config::QUEUE_CAPACITY;
use crate::error::{Error, fatal};
use crate::message::Message;
use crate::source::{EventSource, FOREVER};

pub struct Forwarder<'a, M: RawMutex, S> {
    name: &'static str,
    source: S,
    queue: Sender<'a, M, Message, QUEUE_CAPACITY>,
}

impl<'a, M, S> Forwarder<'a, M, S>
where
    M: RawMutex,
    S: EventSource,
    S::Event: Into<Message>,
{
    pub fn new(
        name: &'static str,
        source: S,
        queue: Sender<'a, M, Message, QUEUE_CAPACITY>,
    ) -> Self {
        Forwarder {
            name,
            source,
            queue,
        }
    }

    /// Moves exactly one event from the source to the queue.
    pub async fn forward_one(&mut self) -> Result<(), Error> {
        let message: Message = self.source.receive(FOREVER).await?.into();
        trace!("{}: forwarding {}", self.name, message);
        self.queue.send(message).await;
        Ok(())
    }

    pub async fn run(mut self) -> ! {
        info!("{} forwarding", self.name);
        loop {
            if let Err(error) = self.forward_one().await {
                fatal(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageQueue, StatusWord};
    use crate::source::{ChannelSource, SignalSource};
    use embassy_futures::{
        block_on,
        select::{Either, select},
        yield_now,
    };
    use embassy_sync::{
        blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, signal::Signal,
    };

    type Raw = CriticalSectionRawMutex;

    #[test]
    fn keypresses_arrive_tagged_and_in_order() {
        let keys: Channel<Raw, u8, 4> = Channel::new();
        let queue: MessageQueue<Raw> = MessageQueue::new();
        let mut forwarder = Forwarder::new("keypad", ChannelSource::new(keys.receiver()), queue.sender());

        for code in [0x11, 0x34, 0x39] {
            keys.try_send(code).unwrap();
        }
        block_on(async {
            for _ in 0..3 {
                forwarder.forward_one().await.unwrap();
            }
        });

        assert_eq!(queue.try_receive().ok(), Some(Message::Keypress(0x11)));
        assert_eq!(queue.try_receive().ok(), Some(Message::Keypress(0x34)));
        assert_eq!(queue.try_receive().ok(), Some(Message::Keypress(0x39)));
    }

    #[test]
    fn status_words_arrive_tagged() {
        let status: Signal<Raw, u16> = Signal::new();
        let queue: MessageQueue<Raw> = MessageQueue::new();
        let mut forwarder = Forwarder::new("status", SignalSource::new(&status), queue.sender());

        status.signal(0x0005);
        block_on(forwarder.forward_one()).unwrap();

        assert_eq!(
            queue.try_receive().ok(),
            Some(Message::PeripheralStatus(StatusWord(0x0005)))
        );
    }

    #[test]
    fn full_queue_holds_back_instead_of_dropping() {
        let keys: Channel<Raw, u8, 8> = Channel::new();
        let queue: MessageQueue<Raw> = MessageQueue::new();
        let mut forwarder = Forwarder::new("keypad", ChannelSource::new(keys.receiver()), queue.sender());

        for code in 0x30..0x30 + QUEUE_CAPACITY as u8 + 1 {
            keys.try_send(code).unwrap();
        }
        block_on(async {
            for _ in 0..QUEUE_CAPACITY {
                forwarder.forward_one().await.unwrap();
            }
            // The queue is full: the next forward waits.
            match select(forwarder.forward_one(), yield_now()).await {
                Either::First(_) => panic!("forwarded into a full queue"),
                Either::Second(()) => {}
            }
        });

        assert_eq!(queue.len(), QUEUE_CAPACITY);
        assert_eq!(queue.try_receive().ok(), Some(Message::Keypress(0x30)));
    }
}
