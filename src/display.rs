/*
 * The character display, as the UI task sees it.
 *
 * The display has two layers of text. The UI layer carries the status line
 * and the adjust prompt, the fault layer carries the fault message and is
 * drawn over the UI layer. Either can be shown or hidden without losing what
 * was written to it.
 *
 * `Screen` keeps the contents of both layers and composites the visible ones.
 * Whatever actually drives the glass implements `Display`.
 */

use enum_ordinalize::Ordinalize;
use heapless::String;

use crate::config::{DISPLAY_COLS, DISPLAY_ROWS};

#[derive(Debug, PartialEq, Eq, Copy, Clone, Ordinalize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum Layer {
    Ui,
    Fault,
}

// Rows and columns count from 1.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayCommand {
    ClearLayer(Layer),
    ClearLine { row: u8, layer: Layer },
    ShowLayer(Layer),
    HideLayer(Layer),
    Text { row: u8, col: u8, layer: Layer, text: &'static str },
    /// A number right-aligned in three columns, blank-padded.
    Byte { row: u8, col: u8, layer: Layer, value: u8 },
    Cursor { row: u8, col: u8, layer: Layer, on: bool, blink: bool },
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cursor {
    pub row: u8,
    pub col: u8,
    pub layer: Layer,
    pub blink: bool,
}

#[allow(async_fn_in_trait)]
pub trait Display {
    fn apply(&mut self, command: DisplayCommand);

    /// Pushes what has been applied so far out to the hardware.
    async fn refresh(&mut self) {}
}

type Rows = [[u8; DISPLAY_COLS]; DISPLAY_ROWS];

pub struct Screen {
    layers: [Rows; Layer::VARIANT_COUNT],
    visible: [bool; Layer::VARIANT_COUNT],
    cursor: Option<Cursor>,
}

impl Screen {
    pub const fn new() -> Self {
        Screen {
            layers: [[[b' '; DISPLAY_COLS]; DISPLAY_ROWS]; Layer::VARIANT_COUNT],
            visible: [false; Layer::VARIANT_COUNT],
            cursor: None,
        }
    }

    pub fn is_visible(&self, layer: Layer) -> bool {
        self.visible[layer.ordinal()]
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor.filter(|cursor| self.is_visible(cursor.layer))
    }

    /// Characters of `row` (1-based) as they appear on the glass: visible
    /// layers stacked in order, blanks letting lower layers show through.
    pub fn row(&self, row: u8) -> [u8; DISPLAY_COLS] {
        let mut out = [b' '; DISPLAY_COLS];
        let Some(index) = row_index(row) else {
            return out;
        };
        for layer in Layer::VARIANTS {
            if !self.is_visible(*layer) {
                continue;
            }
            for (dst, src) in out.iter_mut().zip(self.layers[layer.ordinal()][index]) {
                if src != b' ' {
                    *dst = src;
                }
            }
        }
        out
    }

    pub fn row_text(&self, row: u8) -> String<DISPLAY_COLS> {
        let mut text = String::new();
        for c in self.row(row) {
            // Row and string have the same capacity.
            let _ = text.push(c as char);
        }
        text
    }

    fn write(&mut self, row: u8, col: u8, layer: Layer, bytes: &[u8]) {
        let (Some(row), Some(col)) = (row_index(row), col_index(col)) else {
            return;
        };
        let line = &mut self.layers[layer.ordinal()][row];
        for (dst, src) in line[col..].iter_mut().zip(bytes) {
            *dst = if src.is_ascii() && !src.is_ascii_control() {
                *src
            } else {
                b'?'
            };
        }
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Screen {
    fn apply(&mut self, command: DisplayCommand) {
        match command {
            DisplayCommand::ClearLayer(layer) => {
                self.layers[layer.ordinal()] = [[b' '; DISPLAY_COLS]; DISPLAY_ROWS];
            }
            DisplayCommand::ClearLine { row, layer } => {
                if let Some(row) = row_index(row) {
                    self.layers[layer.ordinal()][row] = [b' '; DISPLAY_COLS];
                }
            }
            DisplayCommand::ShowLayer(layer) => self.visible[layer.ordinal()] = true,
            DisplayCommand::HideLayer(layer) => self.visible[layer.ordinal()] = false,
            DisplayCommand::Text {
                row,
                col,
                layer,
                text,
            } => self.write(row, col, layer, text.as_bytes()),
            DisplayCommand::Byte {
                row,
                col,
                layer,
                value,
            } => self.write(row, col, layer, &decimal(value)),
            DisplayCommand::Cursor {
                row,
                col,
                layer,
                on,
                blink,
            } => {
                self.cursor = on.then_some(Cursor {
                    row,
                    col,
                    layer,
                    blink,
                });
            }
        }
    }
}

fn row_index(row: u8) -> Option<usize> {
    (1..=DISPLAY_ROWS).contains(&(row as usize)).then(|| row as usize - 1)
}

fn col_index(col: u8) -> Option<usize> {
    (1..=DISPLAY_COLS).contains(&(col as usize)).then(|| col as usize - 1)
}

fn decimal(value: u8) -> [u8; 3] {
    let digits = [value / 100, value / 10 % 10, value % 10];
    let mut out = [b' '; 3];
    let mut leading = true;
    for (i, digit) in digits.into_iter().enumerate() {
        leading &= digit == 0 && i < 2;
        if !leading {
            out[i] = b'0' + digit;
        }
    }
    out
}
