/*
 * The board: DESPI-M02 (STM32F103VE).
 *
 * This is the only device-specific part of the firmware. It wraps the
 * peripherals in the ports and sources the panel core asks for:
 *
 * - USART1 (PA9/PA10, DMA) is the operator terminal. Characters typed on it
 *   are keypad keys; the panel's display is drawn back onto it.
 * - SPI1 (PA5/PA6/PA7, chip select PA4) talks to the output driver chip.
 *   Its fault line is on PB0.
 * - TIM2 channel 1 (PA0) is the motor PWM.
 */

use defmt::{Debug2Format, warn};
use embassy_stm32::{
    exti::ExtiInput,
    gpio::{Level, Output, OutputType, Pull, Speed},
    mode::{Async, Blocking},
    peripherals::TIM2,
    spi::{self, Spi},
    time::{Hertz, khz},
    timer::{
        low_level::CountingMode,
        simple_pwm::{PwmPin, SimplePwm},
    },
    usart::{self, Uart, UartRx, UartTx},
    Peripherals, bind_interrupts, peripherals,
};
use heapless::Vec;
use motor_panel::{
    Error, PwmRate,
    config::{DISPLAY_COLS, DISPLAY_ROWS},
    display::{Display, DisplayCommand, Screen},
    driver::{OutputPort, SpeedPort},
    fatal,
    keys::Key,
    source::EventSource,
};

bind_interrupts!(struct Irqs {
    USART1 => usart::InterruptHandler<peripherals::USART1>;
});

const SPI_FREQUENCY: Hertz = Hertz(1_000_000);
const PWM_FREQUENCY_KHZ: u32 = 20;

pub struct Board {
    pub keypad: SerialKeypad,
    pub display: TerminalDisplay,
    pub output_chip: OutputChip,
    pub motor: MotorPwm,
}

impl Board {
    pub fn new(p: Peripherals) -> Self {
        let usart = Uart::new(
            p.USART1,
            p.PA10,
            p.PA9,
            Irqs,
            p.DMA1_CH4,
            p.DMA1_CH5,
            usart::Config::default(), // 115200 baud
        )
        .unwrap_or_else(|_| fatal(Error::Init("usart1")));
        let (tx, rx) = usart.split();

        let mut spi_config = spi::Config::default();
        spi_config.frequency = SPI_FREQUENCY;
        spi_config.mode = spi::MODE_1;
        let spi = Spi::new_blocking(p.SPI1, p.PA5, p.PA7, p.PA6, spi_config);
        let chip_select = Output::new(p.PA4, Level::High, Speed::Low);

        let fault_line = ExtiInput::new(p.PB0, p.EXTI0, Pull::Up);

        let pwm = SimplePwm::new(
            p.TIM2,
            Some(PwmPin::new_ch1(p.PA0, OutputType::PushPull)),
            None,
            None,
            None,
            khz(PWM_FREQUENCY_KHZ),
            CountingMode::EdgeAlignedUp,
        );

        Board {
            keypad: SerialKeypad { rx },
            display: TerminalDisplay {
                screen: Screen::new(),
                tx,
            },
            output_chip: OutputChip {
                spi,
                chip_select,
                fault_line,
            },
            motor: MotorPwm { pwm },
        }
    }
}

pub struct SerialKeypad {
    rx: UartRx<'static, Async>,
}

impl EventSource for SerialKeypad {
    type Event = u8;

    async fn next_event(&mut self) -> u8 {
        let mut buf = [0u8; 1];
        loop {
            match self.rx.read(&mut buf).await {
                Ok(()) => {
                    if let Some(key) = Key::from_char(buf[0] as char) {
                        return key.code();
                    }
                }
                // Line noise is not a key press.
                Err(error) => warn!("keypad: {}", Debug2Format(&error)),
            }
        }
    }
}

pub struct TerminalDisplay {
    screen: Screen,
    tx: UartTx<'static, Async>,
}

// Home, rows, then the cursor parked where the panel put it.
const FRAME_LEN: usize = 3 + DISPLAY_ROWS * (DISPLAY_COLS + 2) + 8;

impl Display for TerminalDisplay {
    fn apply(&mut self, command: DisplayCommand) {
        self.screen.apply(command);
    }

    async fn refresh(&mut self) {
        let mut frame: Vec<u8, FRAME_LEN> = Vec::new();
        let _ = frame.extend_from_slice(b"\x1b[H");
        for row in 1..=DISPLAY_ROWS as u8 {
            let _ = frame.extend_from_slice(&self.screen.row(row));
            let _ = frame.extend_from_slice(b"\r\n");
        }
        if let Some(cursor) = self.screen.cursor() {
            let _ = frame.extend_from_slice(&[
                0x1b,
                b'[',
                b'0' + cursor.row,
                b';',
                b'0' + cursor.col / 10,
                b'0' + cursor.col % 10,
                b'H',
            ]);
        }
        if let Err(error) = self.tx.write(&frame).await {
            warn!("display: {}", Debug2Format(&error));
        }
    }
}

pub struct OutputChip {
    spi: Spi<'static, Blocking>,
    chip_select: Output<'static>,
    fault_line: ExtiInput<'static>,
}

impl OutputPort for OutputChip {
    fn exchange(&mut self, command: u16) -> Result<u16, Error> {
        let mut word = [command];
        self.chip_select.set_low();
        let result = self.spi.blocking_transfer_in_place(&mut word);
        self.chip_select.set_high();
        result.map_err(|_| Error::Peripheral("spi1"))?;
        Ok(word[0])
    }

    // The chip pulls the line low when an output faults.
    async fn fault(&mut self) {
        self.fault_line.wait_for_falling_edge().await
    }
}

pub struct MotorPwm {
    pwm: SimplePwm<'static, TIM2>,
}

impl SpeedPort for MotorPwm {
    fn set_rate(&mut self, rate: PwmRate) {
        let mut channel = self.pwm.ch1();
        channel.set_duty_cycle_percent(rate.percent());
        if rate.is_off() {
            channel.disable();
        } else {
            channel.enable();
        }
    }
}
