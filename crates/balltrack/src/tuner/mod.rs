//! Interactive HSV filter calibration.
//!
//! [`TunerState`] is a plain value: each [`TunerCommand`] consumes the
//! current state and returns the next one together with a [`TunerNotice`]
//! for the operator. [`HsvTuner`] wraps that transition with the
//! caller-supplied defaults and the persist/discard decision on exit.

mod keys;

pub use keys::{ConfirmAnswer, MenuCommand, MENU_HELP, TUNER_HELP};

use crate::color::{FilterParams, HsvChannel};

/// One of the eight adjustable filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSlot {
    HueMin,
    SatMin,
    ValMin,
    HueMax,
    SatMax,
    ValMax,
    Erosions,
    Dilations,
}

enum SlotTarget {
    Lower(HsvChannel),
    Upper(HsvChannel),
    Erosions,
    Dilations,
}

impl ParamSlot {
    /// Slots in key order (`1` to `8`).
    pub const ALL: [ParamSlot; 8] = [
        Self::HueMin,
        Self::SatMin,
        Self::ValMin,
        Self::HueMax,
        Self::SatMax,
        Self::ValMax,
        Self::Erosions,
        Self::Dilations,
    ];

    /// Slot bound to key `n` (1-based).
    pub fn from_index(n: u8) -> Option<Self> {
        Self::ALL.get((n as usize).checked_sub(1)?).copied()
    }

    pub fn index(self) -> u8 {
        Self::ALL.iter().position(|s| *s == self).map_or(0, |i| i as u8 + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HueMin => "hue min",
            Self::SatMin => "saturation min",
            Self::ValMin => "value min",
            Self::HueMax => "hue max",
            Self::SatMax => "saturation max",
            Self::ValMax => "value max",
            Self::Erosions => "erosion iterations",
            Self::Dilations => "dilation iterations",
        }
    }

    fn target(self) -> SlotTarget {
        match self {
            Self::HueMin => SlotTarget::Lower(HsvChannel::Hue),
            Self::SatMin => SlotTarget::Lower(HsvChannel::Saturation),
            Self::ValMin => SlotTarget::Lower(HsvChannel::Value),
            Self::HueMax => SlotTarget::Upper(HsvChannel::Hue),
            Self::SatMax => SlotTarget::Upper(HsvChannel::Saturation),
            Self::ValMax => SlotTarget::Upper(HsvChannel::Value),
            Self::Erosions => SlotTarget::Erosions,
            Self::Dilations => SlotTarget::Dilations,
        }
    }

    /// Largest value the slot can hold.
    pub fn max_value(self) -> u32 {
        match self.target() {
            SlotTarget::Lower(ch) | SlotTarget::Upper(ch) => ch.max_value() as u32,
            SlotTarget::Erosions | SlotTarget::Dilations => u32::MAX,
        }
    }

    pub fn get(self, params: &FilterParams) -> u32 {
        match self.target() {
            SlotTarget::Lower(ch) => params.color.lower[ch.index()] as u32,
            SlotTarget::Upper(ch) => params.color.upper[ch.index()] as u32,
            SlotTarget::Erosions => params.morphology.erosions,
            SlotTarget::Dilations => params.morphology.dilations,
        }
    }

    fn set(self, params: &mut FilterParams, value: u32) {
        let channel_value = value.min(u8::MAX as u32) as u8;
        match self.target() {
            SlotTarget::Lower(ch) => params.color.lower[ch.index()] = channel_value,
            SlotTarget::Upper(ch) => params.color.upper[ch.index()] = channel_value,
            SlotTarget::Erosions => params.morphology.erosions = value,
            SlotTarget::Dilations => params.morphology.dilations = value,
        }
    }
}

impl std::fmt::Display for ParamSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which mask stage the tuner shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    RawMask,
    Eroded,
    ErodedDilated,
}

impl DisplayMode {
    /// raw -> eroded -> eroded+dilated -> raw
    pub fn next(self) -> Self {
        match self {
            Self::RawMask => Self::Eroded,
            Self::Eroded => Self::ErodedDilated,
            Self::ErodedDilated => Self::RawMask,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::RawMask => "mask",
            Self::Eroded => "mask + erosion",
            Self::ErodedDilated => "mask + erosion + dilation",
        }
    }
}

/// Tuner input, decoupled from key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunerCommand {
    Select(ParamSlot),
    Increment,
    Decrement,
    ShowCurrent,
    Reset,
    CycleDisplay,
    Help,
    Quit,
}

/// Operator feedback for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunerNotice {
    Selected(ParamSlot),
    Changed { slot: ParamSlot, value: u32 },
    /// Increment ignored, the slot is at its maximum.
    AtMaximum { slot: ParamSlot, value: u32 },
    /// Decrement ignored, the value would go negative.
    NegativeRejected { slot: ParamSlot },
    Current(FilterParams),
    ResetToDefaults(FilterParams),
    Display(DisplayMode),
    Help,
    /// Quit requested; the caller must ask whether to keep the values.
    ConfirmSave,
}

impl std::fmt::Display for TunerNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Selected(slot) => write!(f, "Adjusting {slot}"),
            Self::Changed { slot, value } => write!(f, "{slot}: {value}"),
            Self::AtMaximum { slot, value } => {
                write!(f, "{slot} is already at its maximum ({value})")
            }
            Self::NegativeRejected { slot } => write!(f, "Value of {slot} must not be negative"),
            Self::Current(params) => write!(f, "{params}"),
            Self::ResetToDefaults(params) => write!(f, "Reset to defaults. {params}"),
            Self::Display(mode) => write!(f, "Showing {}", mode.label()),
            Self::Help => f.write_str(TUNER_HELP),
            Self::ConfirmSave => write!(f, "Save filter values? Type Y or N"),
        }
    }
}

/// Everything the tuner edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunerState {
    pub params: FilterParams,
    pub selected: ParamSlot,
    pub display: DisplayMode,
}

impl TunerState {
    pub fn new(params: FilterParams) -> Self {
        Self {
            params,
            selected: ParamSlot::HueMin,
            display: DisplayMode::RawMask,
        }
    }

    /// Apply one command. `Quit` leaves the state untouched.
    pub fn apply(mut self, cmd: TunerCommand, defaults: &FilterParams) -> (Self, TunerNotice) {
        let notice = match cmd {
            TunerCommand::Select(slot) => {
                self.selected = slot;
                TunerNotice::Selected(slot)
            }
            TunerCommand::Increment => {
                let slot = self.selected;
                let value = slot.get(&self.params);
                if value >= slot.max_value() {
                    TunerNotice::AtMaximum { slot, value }
                } else {
                    slot.set(&mut self.params, value + 1);
                    TunerNotice::Changed {
                        slot,
                        value: value + 1,
                    }
                }
            }
            TunerCommand::Decrement => {
                let slot = self.selected;
                match slot.get(&self.params).checked_sub(1) {
                    Some(value) => {
                        slot.set(&mut self.params, value);
                        TunerNotice::Changed { slot, value }
                    }
                    None => TunerNotice::NegativeRejected { slot },
                }
            }
            TunerCommand::ShowCurrent => TunerNotice::Current(self.params),
            TunerCommand::Reset => {
                self = Self::new(*defaults);
                TunerNotice::ResetToDefaults(self.params)
            }
            TunerCommand::CycleDisplay => {
                self.display = self.display.next();
                TunerNotice::Display(self.display)
            }
            TunerCommand::Help => TunerNotice::Help,
            TunerCommand::Quit => TunerNotice::ConfirmSave,
        };
        (self, notice)
    }
}

/// Calibration session over caller-supplied defaults.
#[derive(Debug, Clone)]
pub struct HsvTuner {
    defaults: FilterParams,
    state: TunerState,
}

impl HsvTuner {
    pub fn new(defaults: FilterParams) -> Self {
        Self {
            defaults,
            state: TunerState::new(defaults),
        }
    }

    pub fn state(&self) -> &TunerState {
        &self.state
    }

    pub fn defaults(&self) -> &FilterParams {
        &self.defaults
    }

    pub fn handle(&mut self, cmd: TunerCommand) -> TunerNotice {
        let (next, notice) = self.state.apply(cmd, &self.defaults);
        self.state = next;
        match notice {
            TunerNotice::NegativeRejected { slot } => {
                tracing::warn!("rejected decrement of {slot} below zero")
            }
            TunerNotice::Changed { slot, value } => tracing::debug!("{slot} -> {value}"),
            _ => {}
        }
        notice
    }

    /// End the session: modified values when `persist`, else the defaults.
    pub fn finish(self, persist: bool) -> FilterParams {
        if persist {
            tracing::info!("keeping tuned filter: {}", self.state.params);
            self.state.params
        } else {
            tracing::info!("discarding tuned filter");
            self.defaults
        }
    }
}
