/*
 * Motor control front panel.
 *
 * A keypad and the status line of an SPI output driver feed one queue; the UI
 * task works through it, drives the display, and hands output words and PWM
 * rates to the driver tasks through mutex-guarded cells.
 *
 * Nothing in this crate touches hardware. The firmware binary supplies the
 * peripherals and spawns the tasks.
 */

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod config;
pub mod display;
pub mod driver;
pub mod error;
pub mod forwarding;
pub mod keys;
pub mod message;
pub mod outputs;
pub mod panel;
pub mod shared_cell;
pub mod source;
pub mod system;
pub mod ui;

pub use error::{Error, fatal};
pub use message::{Message, StatusWord};
pub use outputs::PwmRate;
pub use panel::{AdjustStep, Panel, SystemState};
pub use shared_cell::SharedCell;
pub use system::System;
