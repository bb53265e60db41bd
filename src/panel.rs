/*
 * The front panel state machine.
 *
 * `Panel::next` is a pure function from the current state and one message to
 * the next state and the effects that message causes. Effects are display
 * commands and writes to the two shared cells, listed in the order they must
 * be carried out. The UI task does the carrying out.
 */

use heapless::Vec;

use crate::config::{MAX_EFFECTS, layout, text};
use crate::display::{DisplayCommand, Layer};
use crate::error::{Error, fatal};
use crate::keys::Key;
use crate::message::{Message, StatusWord};
use crate::outputs::{ALL_OFF, PwmRate, Selection};

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemState {
    Running,
    Adjusting,
    Fault,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdjustStep {
    SelectOutput,
    EnterTens,
    EnterOnes,
}

/// The output and rate being entered, once an output has been picked.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingEntry {
    pub selection: Selection,
    pub rate: PwmRate,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    Display(DisplayCommand),
    SetOutputs(u16),
    SetPwm(PwmRate),
}

pub type Effects = Vec<Effect, MAX_EFFECTS>;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum Mode {
    Running,
    Adjusting(Adjustment),
    Fault,
}

// The entry only exists once an output is selected.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum Adjustment {
    SelectOutput,
    EnterTens(PendingEntry),
    EnterOnes(PendingEntry),
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Panel {
    mode: Mode,
    // Last rate handed to the PWM cell.
    pwm: PwmRate,
}

impl Panel {
    pub const fn new() -> Self {
        Panel {
            mode: Mode::Running,
            pwm: PwmRate::OFF,
        }
    }

    pub fn system_state(&self) -> SystemState {
        match self.mode {
            Mode::Running => SystemState::Running,
            Mode::Adjusting(_) => SystemState::Adjusting,
            Mode::Fault => SystemState::Fault,
        }
    }

    pub fn adjust_step(&self) -> Option<AdjustStep> {
        match self.mode {
            Mode::Adjusting(Adjustment::SelectOutput) => Some(AdjustStep::SelectOutput),
            Mode::Adjusting(Adjustment::EnterTens(_)) => Some(AdjustStep::EnterTens),
            Mode::Adjusting(Adjustment::EnterOnes(_)) => Some(AdjustStep::EnterOnes),
            Mode::Running | Mode::Fault => None,
        }
    }

    pub fn pwm_rate(&self) -> PwmRate {
        self.pwm
    }

    pub fn pending_entry(&self) -> Option<PendingEntry> {
        match self.mode {
            Mode::Adjusting(Adjustment::EnterTens(entry) | Adjustment::EnterOnes(entry)) => {
                Some(entry)
            }
            _ => None,
        }
    }

    /// What the display shows before any message arrives.
    pub fn startup() -> Effects {
        let mut plan = Plan::new();
        plan.text(layout::STATUS_ROW, layout::FIRST_COL, Layer::Ui, text::OUTPUTS_OFF);
        plan.show(Layer::Ui);
        plan.effects
    }

    /*
     * Determine the next state and its effects, without changing the state
     * that we are in.
     */
    pub fn next(&self, message: Message) -> (Panel, Effects) {
        let mut plan = Plan::new();
        let mut pwm = self.pwm;
        let mode = match message {
            Message::Keypress(code) => match Key::from_code(code) {
                Some(key) => self.on_key(key, &mut pwm, &mut plan),
                None => self.mode,
            },
            Message::PeripheralStatus(status) => self.on_status(status, &mut plan),
        };
        (Panel { mode, pwm }, plan.effects)
    }

    pub fn handle(&mut self, message: Message) -> Effects {
        let (next, effects) = self.next(message);
        if next.system_state() != self.system_state() {
            info!("{} -> {}", self.system_state(), next.system_state());
        }
        *self = next;
        effects
    }

    fn on_key(&self, key: Key, pwm: &mut PwmRate, plan: &mut Plan) -> Mode {
        if key == Key::D {
            emergency_stop(plan);
            *pwm = PwmRate::OFF;
            return Mode::Running;
        }

        match (self.mode, key) {
            (Mode::Running, Key::A) => {
                plan.text(layout::UI_ROW, layout::FIRST_COL, Layer::Ui, text::SET);
                plan.cursor(layout::UI_ROW, layout::OUTPUT_COL);
                Mode::Adjusting(Adjustment::SelectOutput)
            }

            (Mode::Adjusting(Adjustment::SelectOutput), key) => match Selection::for_key(key) {
                Some(selection) => {
                    plan.text(
                        layout::UI_ROW,
                        layout::OUTPUT_COL,
                        Layer::Ui,
                        selection.output.label(),
                    );
                    plan.text(layout::UI_ROW, layout::PWM_LABEL_COL, Layer::Ui, text::PWM);
                    plan.cursor(layout::UI_ROW, layout::TENS_COL);
                    plan.show(Layer::Ui);
                    Mode::Adjusting(Adjustment::EnterTens(PendingEntry {
                        selection,
                        rate: PwmRate::OFF,
                    }))
                }
                None => self.mode,
            },

            (Mode::Adjusting(Adjustment::EnterTens(entry)), Key::Digit(digit)) => {
                match entry.rate.with_tens(digit) {
                    Some(rate) => {
                        plan.rate(layout::UI_ROW, rate);
                        plan.cursor(layout::UI_ROW, layout::ONES_COL);
                        plan.show(Layer::Ui);
                        Mode::Adjusting(Adjustment::EnterOnes(PendingEntry { rate, ..entry }))
                    }
                    None => self.mode,
                }
            }
            (Mode::Adjusting(Adjustment::EnterTens(_)), Key::B) => {
                plan.cursor(layout::UI_ROW, layout::OUTPUT_COL);
                Mode::Adjusting(Adjustment::SelectOutput)
            }

            (Mode::Adjusting(Adjustment::EnterOnes(entry)), Key::Digit(digit)) => {
                match entry.rate.with_ones(digit) {
                    Some(rate) => {
                        plan.rate(layout::UI_ROW, rate);
                        plan.cursor(layout::UI_ROW, layout::ONES_COL);
                        Mode::Adjusting(Adjustment::EnterOnes(PendingEntry { rate, ..entry }))
                    }
                    None => self.mode,
                }
            }
            (Mode::Adjusting(Adjustment::EnterOnes(entry)), Key::B) => {
                plan.cursor(layout::UI_ROW, layout::TENS_COL);
                Mode::Adjusting(Adjustment::EnterTens(entry))
            }
            (Mode::Adjusting(Adjustment::EnterOnes(entry)), Key::A) => {
                *pwm = commit(entry, *pwm, plan);
                Mode::Running
            }

            (Mode::Running | Mode::Adjusting(_) | Mode::Fault, _) => self.mode,
        }
    }

    fn on_status(&self, status: StatusWord, plan: &mut Plan) -> Mode {
        if status.is_clear() {
            return match self.mode {
                Mode::Fault => {
                    plan.hide(Layer::Fault);
                    plan.show(Layer::Ui);
                    Mode::Running
                }
                Mode::Running | Mode::Adjusting(_) => self.mode,
            };
        }

        warn!("output fault, status {=u16:#x}", status.0);
        if let Mode::Adjusting(_) = self.mode {
            // A fault abandons the entry in progress.
            plan.clear_line(layout::UI_ROW, Layer::Ui);
            plan.cursor_off();
        }
        let label = match status.faulted_output() {
            Some(output) => output.label(),
            None => text::MANY_FAULTS,
        };
        plan.hide(Layer::Ui);
        plan.text(layout::STATUS_ROW, layout::FIRST_COL, Layer::Fault, text::FAULT);
        plan.text(layout::STATUS_ROW, layout::FAULT_LABEL_COL, Layer::Fault, label);
        plan.show(Layer::Fault);
        Mode::Fault
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

fn emergency_stop(plan: &mut Plan) {
    info!("emergency stop");
    plan.push(Effect::SetOutputs(ALL_OFF));
    plan.push(Effect::SetPwm(PwmRate::OFF));
    plan.clear_line(layout::STATUS_ROW, Layer::Ui);
    plan.text(layout::STATUS_ROW, layout::FIRST_COL, Layer::Ui, text::OUTPUTS_OFF);
    plan.clear_line(layout::UI_ROW, Layer::Ui);
    plan.cursor_off();
    plan.hide(Layer::Fault);
    plan.show(Layer::Ui);
}

// Returns the rate the PWM cell holds afterwards.
fn commit(entry: PendingEntry, pwm: PwmRate, plan: &mut Plan) -> PwmRate {
    info!("{} at {}%", entry.selection.output, entry.rate.percent());
    if entry.rate.is_off() {
        // Fully on, no PWM. An earlier commit may have left PWM running.
        if !pwm.is_off() {
            plan.push(Effect::SetPwm(PwmRate::OFF));
        }
        plan.push(Effect::SetOutputs(entry.selection.drive_mask));
    } else {
        // The driver chip inputs may not be on while PWM drives the motor:
        // stop them before starting PWM.
        plan.push(Effect::SetOutputs(ALL_OFF));
        plan.push(Effect::SetPwm(entry.rate));
    }
    plan.clear_layer(Layer::Ui);
    plan.text(
        layout::STATUS_ROW,
        layout::FIRST_COL,
        Layer::Ui,
        entry.selection.output.label(),
    );
    plan.text(layout::STATUS_ROW, layout::PWM_LABEL_COL, Layer::Ui, text::PWM);
    plan.rate(layout::STATUS_ROW, entry.rate);
    plan.cursor_off();
    entry.rate
}

struct Plan {
    effects: Effects,
}

impl Plan {
    fn new() -> Self {
        Plan {
            effects: Effects::new(),
        }
    }

    fn push(&mut self, effect: Effect) {
        if self.effects.push(effect).is_err() {
            fatal(Error::EffectOverflow);
        }
    }

    fn display(&mut self, command: DisplayCommand) {
        self.push(Effect::Display(command));
    }

    fn show(&mut self, layer: Layer) {
        self.display(DisplayCommand::ShowLayer(layer));
    }

    fn hide(&mut self, layer: Layer) {
        self.display(DisplayCommand::HideLayer(layer));
    }

    fn clear_layer(&mut self, layer: Layer) {
        self.display(DisplayCommand::ClearLayer(layer));
    }

    fn clear_line(&mut self, row: u8, layer: Layer) {
        self.display(DisplayCommand::ClearLine { row, layer });
    }

    fn text(&mut self, row: u8, col: u8, layer: Layer, text: &'static str) {
        self.display(DisplayCommand::Text {
            row,
            col,
            layer,
            text,
        });
    }

    fn rate(&mut self, row: u8, rate: PwmRate) {
        self.display(DisplayCommand::Byte {
            row,
            col: layout::RATE_COL,
            layer: Layer::Ui,
            value: rate.percent(),
        });
    }

    fn cursor(&mut self, row: u8, col: u8) {
        self.display(DisplayCommand::Cursor {
            row,
            col,
            layer: Layer::Ui,
            on: true,
            blink: true,
        });
    }

    fn cursor_off(&mut self) {
        self.display(DisplayCommand::Cursor {
            row: layout::UI_ROW,
            col: layout::FIRST_COL,
            layer: Layer::Ui,
            on: false,
            blink: false,
        });
    }
}
