/*
 * The UI task: the only consumer of the message queue, the only writer of the
 * output and PWM cells, and the only user of the display.
 *
 * Each message is processed to completion, effects applied in order, before
 * the next one is taken off the queue.
 */

use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Receiver};

use crate::config::QUEUE_CAPACITY;
use crate::display::Display;
use crate::message::Message;
use crate::outputs::PwmRate;
use crate::panel::{Effect, Effects, Panel};
use crate::shared_cell::SharedCell;

pub struct UiTask<'a, M: RawMutex, D> {
    panel: Panel,
    display: D,
    queue: Receiver<'a, M, Message, QUEUE_CAPACITY>,
    outputs: &'a SharedCell<M, u16>,
    pwm: &'a SharedCell<M, PwmRate>,
}

impl<'a, M: RawMutex, D: Display> UiTask<'a, M, D> {
    pub fn new(
        display: D,
        queue: Receiver<'a, M, Message, QUEUE_CAPACITY>,
        outputs: &'a SharedCell<M, u16>,
        pwm: &'a SharedCell<M, PwmRate>,
    ) -> Self {
        UiTask {
            panel: Panel::new(),
            display,
            queue,
            outputs,
            pwm,
        }
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub async fn start(&mut self) {
        self.apply(Panel::startup()).await;
    }

    pub async fn process(&mut self, message: Message) {
        debug!("ui: {}", message);
        let effects = self.panel.handle(message);
        self.apply(effects).await;
    }

    /// Takes the next message off the queue, waiting for one if need be, and
    /// processes it.
    pub async fn step(&mut self) {
        let message = self.queue.receive().await;
        self.process(message).await;
    }

    async fn apply(&mut self, effects: Effects) {
        for effect in effects {
            match effect {
                Effect::Display(command) => self.display.apply(command),
                Effect::SetOutputs(word) => self.outputs.write(word).await,
                Effect::SetPwm(rate) => self.pwm.write(rate).await,
            }
        }
        self.display.refresh().await;
    }

    pub async fn run(mut self) -> ! {
        info!("ui task started");
        self.start().await;
        loop {
            self.step().await;
        }
    }
}
