#![no_std]
#![no_main]

// Supervisor: brings up the board, creates the shared primitives and the
// tasks, then parks for good.
//
// Priorities, highest first:
// - drivers (interrupt executor, P6): output word over SPI, motor PWM;
// - forwarding (interrupt executor, P7): keypad and driver status;
// - UI task and the supervisor itself (thread mode).

use defmt::info;
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use panic_halt as _;
use static_cell::StaticCell;

use motor_panel::{
    Error, System,
    driver::{OutputDriver, SpeedDriver},
    fatal,
    forwarding::Forwarder,
    source::SignalSource,
    ui::UiTask,
};

mod board;
use board::{Board, MotorPwm, OutputChip, SerialKeypad, TerminalDisplay};

// The UI and the drivers run on different executors.
type PanelMutex = CriticalSectionRawMutex;

static SYSTEM: StaticCell<System<PanelMutex>> = StaticCell::new();

static EXECUTOR_DRIVERS: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_INPUTS: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn UART4() {
    unsafe { EXECUTOR_DRIVERS.on_interrupt() }
}

#[interrupt]
unsafe fn UART5() {
    unsafe { EXECUTOR_INPUTS.on_interrupt() }
}

#[embassy_executor::task]
async fn ui_task(task: UiTask<'static, PanelMutex, TerminalDisplay>) -> ! {
    task.run().await
}

#[embassy_executor::task]
async fn keypad_task(forwarder: Forwarder<'static, PanelMutex, SerialKeypad>) -> ! {
    forwarder.run().await
}

#[embassy_executor::task]
async fn status_task(
    forwarder: Forwarder<'static, PanelMutex, SignalSource<'static, PanelMutex, u16>>,
) -> ! {
    forwarder.run().await
}

#[embassy_executor::task]
async fn output_driver_task(driver: OutputDriver<'static, PanelMutex, OutputChip>) -> ! {
    driver.run().await
}

#[embassy_executor::task]
async fn speed_driver_task(driver: SpeedDriver<'static, PanelMutex, MotorPwm>) -> ! {
    driver.run().await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let peripherals = embassy_stm32::init(Default::default());
    let board = Board::new(peripherals);
    info!("board initialised");

    let system: &'static System<PanelMutex> = SYSTEM.init(System::new());

    interrupt::UART4.set_priority(Priority::P6);
    let drivers = EXECUTOR_DRIVERS.start(interrupt::UART4);
    interrupt::UART5.set_priority(Priority::P7);
    let inputs = EXECUTOR_INPUTS.start(interrupt::UART5);

    drivers
        .spawn(output_driver_task(system.output_driver(board.output_chip)))
        .unwrap_or_else(|_| fatal(Error::Spawn("output driver")));
    drivers
        .spawn(speed_driver_task(system.speed_driver(board.motor)))
        .unwrap_or_else(|_| fatal(Error::Spawn("speed driver")));

    inputs
        .spawn(keypad_task(system.keypad_forwarder(board.keypad)))
        .unwrap_or_else(|_| fatal(Error::Spawn("keypad forwarder")));
    inputs
        .spawn(status_task(system.status_forwarder()))
        .unwrap_or_else(|_| fatal(Error::Spawn("status forwarder")));

    spawner
        .spawn(ui_task(system.ui_task(board.display)))
        .unwrap_or_else(|_| fatal(Error::Spawn("ui")));

    info!("tasks started, supervisor parking");
    core::future::pending::<()>().await;
}
