/*
 * Event sources: hardware services that block the calling task until a
 * discrete event is available.
 *
 * A source only has to say how to wait for the next event; `receive` adds the
 * timeout. A zero timeout means wait indefinitely.
 */

use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Receiver, signal::Signal};
use embassy_time::{Duration, with_timeout};

use crate::error::Error;

// Zero: wait as long as it takes.
pub const FOREVER: Duration = Duration::from_ticks(0);

#[allow(async_fn_in_trait)]
pub trait EventSource {
    type Event;

    async fn next_event(&mut self) -> Self::Event;

    /// Waits at most `timeout` for the next event.
    async fn receive(&mut self, timeout: Duration) -> Result<Self::Event, Error> {
        if timeout == FOREVER {
            Ok(self.next_event().await)
        } else {
            with_timeout(timeout, self.next_event())
                .await
                .map_err(|_| Error::TimedOut)
        }
    }
}

/// Events posted one at a time through a `Signal`. A new value overwrites one
/// that has not been taken yet, which suits level-like data such as a status
/// word.
pub struct SignalSource<'a, M: RawMutex, T> {
    signal: &'a Signal<M, T>,
}

impl<'a, M: RawMutex, T> SignalSource<'a, M, T> {
    pub fn new(signal: &'a Signal<M, T>) -> Self {
        SignalSource { signal }
    }
}

impl<M: RawMutex, T: Send> EventSource for SignalSource<'_, M, T> {
    type Event = T;

    async fn next_event(&mut self) -> T {
        self.signal.wait().await
    }
}

/// Events queued on a channel, lossless up to the channel's capacity.
pub struct ChannelSource<'a, M: RawMutex, T, const N: usize> {
    receiver: Receiver<'a, M, T, N>,
}

impl<'a, M: RawMutex, T, const N: usize> ChannelSource<'a, M, T, N> {
    pub fn new(receiver: Receiver<'a, M, T, N>) -> Self {
        ChannelSource { receiver }
    }
}

impl<M: RawMutex, T, const N: usize> EventSource for ChannelSource<'_, M, T, N> {
    type Event = T;

    async fn next_event(&mut self) -> T {
        self.receiver.receive().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};

    #[test]
    fn forever_returns_pending_event() {
        let signal: Signal<CriticalSectionRawMutex, u16> = Signal::new();
        let mut source = SignalSource::new(&signal);
        signal.signal(0x0004);
        assert_eq!(block_on(source.receive(FOREVER)), Ok(0x0004));
    }

    #[test]
    fn signal_keeps_only_latest() {
        let signal: Signal<CriticalSectionRawMutex, u16> = Signal::new();
        let mut source = SignalSource::new(&signal);
        signal.signal(1);
        signal.signal(2);
        assert_eq!(block_on(source.next_event()), 2);
    }

    #[test]
    fn finite_timeout_expires_without_events() {
        let channel: Channel<CriticalSectionRawMutex, u8, 2> = Channel::new();
        let mut source = ChannelSource::new(channel.receiver());
        assert_eq!(
            block_on(source.receive(Duration::from_millis(10))),
            Err(Error::TimedOut)
        );
    }

    #[test]
    fn finite_timeout_delivers_ready_event() {
        let channel: Channel<CriticalSectionRawMutex, u8, 2> = Channel::new();
        let mut source = ChannelSource::new(channel.receiver());
        channel.try_send(0x31).unwrap();
        assert_eq!(block_on(source.receive(Duration::from_millis(10))), Ok(0x31));
    }
}
