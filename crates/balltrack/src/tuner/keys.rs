//! Key-code and text-answer mapping for the interactive surfaces.

use super::{ParamSlot, TunerCommand};

/// Numeric-keypad `+` as reported by some window toolkits.
const KEYPAD_PLUS: u32 = 171;
/// Numeric-keypad `-`.
const KEYPAD_MINUS: u32 = 173;

pub const MENU_HELP: &str = "\
*Adjust the HSV filter before running detection.*
Tennis ball tracker
  Run tennis ball detection:        r
  Adjust HSV filter:                v
  Show this help again:             h
  Quit:                             q";

pub const TUNER_HELP: &str = "\
Controls for adjusting the HSV filter:
  Select hue min:                   1
  Select saturation min:            2
  Select value min:                 3
  Select hue max:                   4
  Select saturation max:            5
  Select value max:                 6
  Select erosion iterations:        7
  Select dilation iterations:       8
  Increase selected value:          +
  Decrease selected value:          -
  Cycle displayed mask:             m
  Show current filter:              s
  Reset to initial values:          r
  Stop adjusting:                   q
  Show this help again:             h";

impl TunerCommand {
    /// Map a polled key code; unknown keys map to `None`.
    pub fn from_key_code(code: u32) -> Option<Self> {
        if code == KEYPAD_PLUS {
            return Some(Self::Increment);
        }
        if code == KEYPAD_MINUS {
            return Some(Self::Decrement);
        }
        let c = char::from_u32(code)?;
        Some(match c {
            '+' => Self::Increment,
            '-' => Self::Decrement,
            '1'..='8' => Self::Select(ParamSlot::from_index(c as u8 - b'0')?),
            'm' => Self::CycleDisplay,
            's' => Self::ShowCurrent,
            'r' => Self::Reset,
            'h' => Self::Help,
            'q' => Self::Quit,
            _ => return None,
        })
    }
}

/// Top-level menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    RunDetection,
    AdjustFilter,
    Help,
    Quit,
}

impl MenuCommand {
    /// Parse one line of menu input. Surrounding whitespace is ignored.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "r" => Some(Self::RunDetection),
            "v" => Some(Self::AdjustFilter),
            "h" => Some(Self::Help),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Answer to the save-on-exit question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAnswer {
    Persist,
    Discard,
}

impl ConfirmAnswer {
    /// Exactly `Y` or `N` (after trimming the line ending); anything else
    /// must be asked again.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim_end_matches(['\r', '\n']) {
            "Y" => Some(Self::Persist),
            "N" => Some(Self::Discard),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_select_slots() {
        assert_eq!(
            TunerCommand::from_key_code('1' as u32),
            Some(TunerCommand::Select(ParamSlot::HueMin))
        );
        assert_eq!(
            TunerCommand::from_key_code('7' as u32),
            Some(TunerCommand::Select(ParamSlot::Erosions))
        );
        assert_eq!(TunerCommand::from_key_code('9' as u32), None);
        assert_eq!(TunerCommand::from_key_code('0' as u32), None);
    }

    #[test]
    fn keypad_codes_map_like_ascii() {
        assert_eq!(TunerCommand::from_key_code(171), Some(TunerCommand::Increment));
        assert_eq!(TunerCommand::from_key_code('+' as u32), Some(TunerCommand::Increment));
        assert_eq!(TunerCommand::from_key_code(173), Some(TunerCommand::Decrement));
        assert_eq!(TunerCommand::from_key_code('-' as u32), Some(TunerCommand::Decrement));
    }

    #[test]
    fn letter_commands() {
        assert_eq!(TunerCommand::from_key_code('m' as u32), Some(TunerCommand::CycleDisplay));
        assert_eq!(TunerCommand::from_key_code('s' as u32), Some(TunerCommand::ShowCurrent));
        assert_eq!(TunerCommand::from_key_code('r' as u32), Some(TunerCommand::Reset));
        assert_eq!(TunerCommand::from_key_code('q' as u32), Some(TunerCommand::Quit));
        assert_eq!(TunerCommand::from_key_code('Q' as u32), None);
        assert_eq!(TunerCommand::from_key_code(0xD800), None);
    }

    #[test]
    fn menu_parsing() {
        assert_eq!(MenuCommand::parse("r\n"), Some(MenuCommand::RunDetection));
        assert_eq!(MenuCommand::parse(" v "), Some(MenuCommand::AdjustFilter));
        assert_eq!(MenuCommand::parse("x"), None);
        assert_eq!(MenuCommand::parse(""), None);
    }

    #[test]
    fn confirm_accepts_only_exact_answers() {
        assert_eq!(ConfirmAnswer::parse("Y\n"), Some(ConfirmAnswer::Persist));
        assert_eq!(ConfirmAnswer::parse("N"), Some(ConfirmAnswer::Discard));
        assert_eq!(ConfirmAnswer::parse("y"), None);
        assert_eq!(ConfirmAnswer::parse("yes"), None);
        assert_eq!(ConfirmAnswer::parse(" Y"), None);
    }
}
