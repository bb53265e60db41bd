/*
 * Compile-time configuration of the panel.
 *
 * Board-level settings (pins, clocks, priorities) live with the firmware in
 * `board.rs`; everything here is hardware independent.
 */

pub const QUEUE_CAPACITY: usize = 5;

// Upper bound on the effects a single message can produce.
pub const MAX_EFFECTS: usize = 16;

pub const DISPLAY_ROWS: usize = 2;
pub const DISPLAY_COLS: usize = 16;

// Where things go on the display. Rows and columns count from 1.
pub mod layout {
    pub const STATUS_ROW: u8 = 1;
    pub const UI_ROW: u8 = 2;
    pub const FIRST_COL: u8 = 1;

    pub const OUTPUT_COL: u8 = 5;
    pub const FAULT_LABEL_COL: u8 = 8;
    pub const PWM_LABEL_COL: u8 = 10;
    pub const RATE_COL: u8 = 14;
    pub const TENS_COL: u8 = 15;
    pub const ONES_COL: u8 = 16;
}

pub mod text {
    pub const OUTPUTS_OFF: &str = "Outputs Off";
    pub const SET: &str = "SET:";
    pub const PWM: &str = "PWM%";
    pub const FAULT: &str = "Fault: ";
    pub const MANY_FAULTS: &str = "Many";
}
