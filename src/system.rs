/*
 * Everything the tasks share, created once at start-up and never destroyed.
 *
 * The supervisor allocates one `System` with a process lifetime and builds
 * each task from it, so every task gets handles to exactly the primitives it
 * uses and nothing reaches for a global.
 */

use embassy_sync::{blocking_mutex::raw::RawMutex, signal::Signal};

use crate::display::Display;
use crate::driver::{OutputDriver, OutputPort, SpeedDriver, SpeedPort};
use crate::forwarding::Forwarder;
use crate::message::MessageQueue;
use crate::outputs::{ALL_OFF, PwmRate};
use crate::shared_cell::SharedCell;
use crate::source::{EventSource, SignalSource};
use crate::ui::UiTask;

pub struct System<M: RawMutex> {
    queue: MessageQueue<M>,
    outputs: SharedCell<M, u16>,
    pwm: SharedCell<M, PwmRate>,
    status: Signal<M, u16>,
}

impl<M: RawMutex> System<M> {
    pub const fn new() -> Self {
        System {
            queue: MessageQueue::new(),
            outputs: SharedCell::new(ALL_OFF),
            pwm: SharedCell::new(PwmRate::OFF),
            status: Signal::new(),
        }
    }

    pub fn outputs(&self) -> &SharedCell<M, u16> {
        &self.outputs
    }

    pub fn pwm(&self) -> &SharedCell<M, PwmRate> {
        &self.pwm
    }

    pub fn ui_task<D: Display>(&self, display: D) -> UiTask<'_, M, D> {
        UiTask::new(display, self.queue.receiver(), &self.outputs, &self.pwm)
    }

    pub fn keypad_forwarder<S>(&self, keypad: S) -> Forwarder<'_, M, S>
    where
        S: EventSource<Event = u8>,
    {
        Forwarder::new("keypad", keypad, self.queue.sender())
    }

    /// Forwards the status words the output driver reads back.
    pub fn status_forwarder(&self) -> Forwarder<'_, M, SignalSource<'_, M, u16>> {
        Forwarder::new("status", SignalSource::new(&self.status), self.queue.sender())
    }

    pub fn output_driver<P: OutputPort>(&self, port: P) -> OutputDriver<'_, M, P> {
        OutputDriver::new(&self.outputs, &self.status, port)
    }

    pub fn speed_driver<P: SpeedPort>(&self, port: P) -> SpeedDriver<'_, M, P> {
        SpeedDriver::new(&self.pwm, port)
    }
}

impl<M: RawMutex> Default for System<M> {
    fn default() -> Self {
        Self::new()
    }
}
