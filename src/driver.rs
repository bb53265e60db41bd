/*
 * Driver loops: the consumers of the shared cells.
 *
 * The peripherals themselves sit behind `OutputPort` and `SpeedPort`. A loop
 * sleeps on its cell's change signal and hands each new value to its port.
 */

use embassy_futures::select::{Either, select};
use embassy_sync::{blocking_mutex::raw::RawMutex, signal::Signal};

use crate::error::Error;
use crate::outputs::PwmRate;
use crate::shared_cell::SharedCell;

/// The output driver chip. Every command shifted in clocks a status word out.
#[allow(async_fn_in_trait)]
pub trait OutputPort {
    fn exchange(&mut self, command: u16) -> Result<u16, Error>;

    /// Resolves when the chip flags a fault between commands. Chips without
    /// a fault line never do.
    async fn fault(&mut self) {
        core::future::pending::<()>().await
    }
}

/// The PWM channel driving the motor speed.
pub trait SpeedPort {
    fn set_rate(&mut self, rate: PwmRate);
}

pub struct OutputDriver<'a, M: RawMutex, P> {
    commands: &'a SharedCell<M, u16>,
    status: &'a Signal<M, u16>,
    port: P,
}

impl<'a, M: RawMutex, P: OutputPort> OutputDriver<'a, M, P> {
    pub fn new(commands: &'a SharedCell<M, u16>, status: &'a Signal<M, u16>, port: P) -> Self {
        OutputDriver {
            commands,
            status,
            port,
        }
    }

    /// Sends `command` to the chip and posts the status it answers with. A
    /// failed transfer is logged and leaves the last status standing.
    pub fn send(&mut self, command: u16) {
        match self.port.exchange(command) {
            Ok(status) => self.status.signal(status),
            Err(error) => warn!("output driver: {}", error),
        }
    }

    /// Sends the next new command, or re-sends the current one when the chip
    /// flags a fault, so that its status gets read back.
    pub async fn serve(&mut self) {
        let command = match select(self.commands.wait_changed(), self.port.fault()).await {
            Either::First(command) => command,
            Either::Second(()) => {
                debug!("fault line, reading status back");
                self.commands.read().await
            }
        };
        debug!("output command {=u16:#x}", command);
        self.send(command);
    }

    pub async fn run(mut self) -> ! {
        info!("output driver started");
        loop {
            self.serve().await;
        }
    }
}

pub struct SpeedDriver<'a, M: RawMutex, P> {
    rates: &'a SharedCell<M, PwmRate>,
    port: P,
}

impl<'a, M: RawMutex, P: SpeedPort> SpeedDriver<'a, M, P> {
    pub fn new(rates: &'a SharedCell<M, PwmRate>, port: P) -> Self {
        SpeedDriver { rates, port }
    }

    pub async fn apply_next(&mut self) {
        let rate = self.rates.wait_changed().await;
        debug!("pwm rate {}%", rate.percent());
        self.port.set_rate(rate);
    }

    pub async fn run(mut self) -> ! {
        info!("speed driver started");
        loop {
            self.apply_next().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    type Raw = CriticalSectionRawMutex;

    struct LoopbackChip {
        sent: std::vec::Vec<u16>,
        reply: Result<u16, Error>,
        fault_raised: bool,
    }

    impl LoopbackChip {
        fn replying(reply: Result<u16, Error>) -> Self {
            LoopbackChip {
                sent: std::vec::Vec::new(),
                reply,
                fault_raised: false,
            }
        }
    }

    impl OutputPort for &mut LoopbackChip {
        fn exchange(&mut self, command: u16) -> Result<u16, Error> {
            self.sent.push(command);
            self.reply
        }

        async fn fault(&mut self) {
            if self.fault_raised {
                self.fault_raised = false;
            } else {
                core::future::pending::<()>().await
            }
        }
    }

    #[derive(Default)]
    struct Pwm {
        rates: std::vec::Vec<u8>,
    }

    impl SpeedPort for &mut Pwm {
        fn set_rate(&mut self, rate: PwmRate) {
            self.rates.push(rate.percent());
        }
    }

    #[test]
    fn output_commands_reach_the_chip_and_status_comes_back() {
        let commands: SharedCell<Raw, u16> = SharedCell::new(0);
        let status: Signal<Raw, u16> = Signal::new();
        let mut chip = LoopbackChip::replying(Ok(0x0004));

        {
            let mut driver = OutputDriver::new(&commands, &status, &mut chip);
            block_on(async {
                commands.write(0x0001).await;
                driver.serve().await;
            });
        }

        assert_eq!(chip.sent, [0x0001]);
        assert_eq!(status.try_take(), Some(0x0004));
    }

    #[test]
    fn failed_transfer_posts_no_status() {
        let commands: SharedCell<Raw, u16> = SharedCell::new(0);
        let status: Signal<Raw, u16> = Signal::new();
        let mut chip = LoopbackChip::replying(Err(Error::Peripheral("spi")));

        OutputDriver::new(&commands, &status, &mut chip).send(0x0000);

        assert_eq!(status.try_take(), None);
    }

    #[test]
    fn fault_line_resends_the_current_command() {
        let commands: SharedCell<Raw, u16> = SharedCell::new(0x0004);
        let status: Signal<Raw, u16> = Signal::new();
        let mut chip = LoopbackChip::replying(Ok(0x0008));
        chip.fault_raised = true;

        block_on(OutputDriver::new(&commands, &status, &mut chip).serve());

        assert_eq!(chip.sent, [0x0004]);
        assert_eq!(status.try_take(), Some(0x0008));
    }

    #[test]
    fn every_rate_written_is_applied_in_order() {
        let rates: SharedCell<Raw, PwmRate> = SharedCell::new(PwmRate::OFF);
        let mut pwm = Pwm::default();

        {
            let mut driver = SpeedDriver::new(&rates, &mut pwm);
            block_on(async {
                rates.write(PwmRate::new(40).unwrap()).await;
                driver.apply_next().await;
                rates.write(PwmRate::OFF).await;
                driver.apply_next().await;
            });
        }

        assert_eq!(pwm.rates, [40, 0]);
    }
}
