//! Keymap tokens and the parse step.
//!
//! A keymap arrives as a flat heterogeneous array: command names and numeric
//! literals with no instruction/operand tagging. Classification is purely
//! lexical — a token is a command iff it matches a known name, otherwise it
//! is numeric. This module resolves all of the positional decoding (variable
//! cursor steps, the same-stick reset lookahead, the unknown-name skip) into
//! a closed [`Command`] type up front, so the executor only dispatches over
//! variants.

use log::warn;
use serde_json::Value;
use thiserror::Error;

use crate::pad::{Button, Side, trigger_from_name};

const LEFT_STICK: &str = "left_joystick_float";
const RIGHT_STICK: &str = "right_joystick_float";

/// One raw keymap entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Text(String),
    Number(f64),
}

impl Token {
    /// Converts a JSON array element. Anything that is neither a string nor
    /// a number keeps its JSON rendering and will fall out of the walk as an
    /// unrecognized token.
    pub fn from_value(value: &Value) -> Token {
        match value {
            Value::Number(n) => Token::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => Token::Text(s.clone()),
            other => Token::Text(other.to_string()),
        }
    }

    /// The token's numeric reading, if it has one. Text counts as numeric
    /// when it parses as a finite float.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Token::Number(n) => Some(*n).filter(|v| v.is_finite()),
            Token::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }
}

/// Converts a JSON array into tokens.
pub fn tokens_from_array(values: &[Value]) -> Vec<Token> {
    values.iter().map(Token::from_value).collect()
}

/// A fully decoded pad operation. Durations and delays are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Bare suspension between operations.
    Delay(f64),
    /// Timed stick move; `reset` snaps the stick to a second position
    /// immediately after the hold, with no extra delay.
    SetStick {
        side: Side,
        x: f64,
        y: f64,
        duration: f64,
        reset: Option<(f64, f64)>,
    },
    /// Press a digital button, then suspend for `duration`. The button
    /// stays down until a later release token.
    PressButton { button: Button, duration: f64 },
    /// Pull an analog trigger to maximum. It stays asserted until an
    /// explicit release token, never by timeout.
    PressTrigger { side: Side, duration: f64 },
    ReleaseButton(Button),
    ReleaseTrigger(Side),
}

/// Structural errors. These abort the remainder of the current keymap;
/// everything parsed before the offending unit still executes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KeymapError {
    #[error("{name} expects x, y and duration values")]
    StickArity { name: &'static str },

    #[error("press {name} expects a duration value")]
    PressArity { name: String },
}

/// Result of a parse pass: the commands up to the first structural error.
#[derive(Debug, Default)]
pub struct ParsedKeymap {
    pub commands: Vec<Command>,
    pub error: Option<KeymapError>,
}

fn stick_side(name: &str) -> Side {
    if name == LEFT_STICK { Side::Left } else { Side::Right }
}

/// Reads the three numeric operands of a stick command.
fn stick_args(rest: &[Token]) -> Option<(f64, f64, f64)> {
    match rest {
        [x, y, duration, ..] => Some((x.as_number()?, y.as_number()?, duration.as_number()?)),
        _ => None,
    }
}

/// Walks the token sequence and decodes every resolvable entry in order.
pub fn parse_keymap(tokens: &[Token]) -> ParsedKeymap {
    let mut parsed = ParsedKeymap::default();
    let mut i = 0;

    while i < tokens.len() {
        // A standalone numeric token is a bare delay.
        if let Some(seconds) = tokens[i].as_number() {
            parsed.commands.push(Command::Delay(seconds));
            i += 1;
            continue;
        }
        let name = match &tokens[i] {
            Token::Text(name) => name.as_str(),
            token => {
                warn!("unrecognized token: {token:?}");
                i += 1;
                continue;
            }
        };

        if name == LEFT_STICK || name == RIGHT_STICK {
            let stick: &'static str = if name == LEFT_STICK { LEFT_STICK } else { RIGHT_STICK };
            let Some((x, y, duration)) = stick_args(&tokens[i + 1..]) else {
                parsed.error = Some(KeymapError::StickArity { name: stick });
                break;
            };
            i += 4;

            // Lookahead: the same stick name with two values right after the
            // timed move is an implicit reset, applied with no delay token.
            let mut reset = None;
            let mut malformed_reset = false;
            if let [Token::Text(next), rx, ry, ..] = &tokens[i..] {
                if next.as_str() == stick {
                    match (rx.as_number(), ry.as_number()) {
                        (Some(rx), Some(ry)) => {
                            reset = Some((rx, ry));
                            i += 3;
                        }
                        _ => malformed_reset = true,
                    }
                }
            }
            parsed.commands.push(Command::SetStick {
                side: stick_side(stick),
                x,
                y,
                duration,
                reset,
            });
            if malformed_reset {
                parsed.error = Some(KeymapError::StickArity { name: stick });
                break;
            }
        } else if let Some(suffix) = name.strip_prefix("press") {
            if suffix.contains("TRIGGER") {
                let Some(side) = trigger_from_name(suffix) else {
                    warn!("unknown trigger: {suffix}");
                    i += 1;
                    continue;
                };
                let Some(duration) = tokens.get(i + 1).and_then(Token::as_number) else {
                    parsed.error = Some(KeymapError::PressArity {
                        name: suffix.to_string(),
                    });
                    break;
                };
                parsed.commands.push(Command::PressTrigger { side, duration });
                i += 2;
            } else {
                let Some(button) = Button::from_name(suffix) else {
                    // Only the name is consumed; the duration token that
                    // follows re-parses as a bare delay on the next step.
                    warn!("unknown button: {suffix}");
                    i += 1;
                    continue;
                };
                let Some(duration) = tokens.get(i + 1).and_then(Token::as_number) else {
                    parsed.error = Some(KeymapError::PressArity {
                        name: suffix.to_string(),
                    });
                    break;
                };
                parsed.commands.push(Command::PressButton { button, duration });
                i += 2;
            }
        } else if let Some(suffix) = name.strip_prefix("release") {
            // Releases carry no duration; the cursor advances by one
            // whether or not the name resolves.
            if let Some(side) = trigger_from_name(suffix) {
                parsed.commands.push(Command::ReleaseTrigger(side));
            } else if let Some(button) = Button::from_name(suffix) {
                parsed.commands.push(Command::ReleaseButton(button));
            } else {
                warn!("unknown release target: {suffix}");
            }
            i += 1;
        } else {
            warn!("unrecognized token: {name:?}");
            i += 1;
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &str) -> Token {
        Token::Text(name.to_string())
    }

    fn n(value: f64) -> Token {
        Token::Number(value)
    }

    #[test]
    fn test_stick_move_with_reset_folds_all_seven_tokens() {
        let tokens = vec![t(LEFT_STICK), n(1.0), n(0.0), n(0.2), t(LEFT_STICK), n(0.0), n(0.0)];
        let parsed = parse_keymap(&tokens);
        assert!(parsed.error.is_none());
        assert_eq!(
            parsed.commands,
            vec![Command::SetStick {
                side: Side::Left,
                x: 1.0,
                y: 0.0,
                duration: 0.2,
                reset: Some((0.0, 0.0)),
            }]
        );
    }

    #[test]
    fn test_stick_move_without_reset() {
        let tokens = vec![t(RIGHT_STICK), n(-0.5), n(0.5), n(1.0)];
        let parsed = parse_keymap(&tokens);
        assert!(parsed.error.is_none());
        assert_eq!(
            parsed.commands,
            vec![Command::SetStick {
                side: Side::Right,
                x: -0.5,
                y: 0.5,
                duration: 1.0,
                reset: None,
            }]
        );
    }

    #[test]
    fn test_mismatched_stick_name_is_not_a_reset() {
        // A right-stick entry after a left-stick move is a new command, and
        // with only two operands it is malformed.
        let tokens = vec![t(LEFT_STICK), n(1.0), n(0.0), n(0.2), t(RIGHT_STICK), n(0.0), n(0.0)];
        let parsed = parse_keymap(&tokens);
        assert_eq!(parsed.commands.len(), 1);
        assert!(matches!(
            parsed.commands[0],
            Command::SetStick { side: Side::Left, reset: None, .. }
        ));
        assert_eq!(parsed.error, Some(KeymapError::StickArity { name: RIGHT_STICK }));
    }

    #[test]
    fn test_stick_arity_error_keeps_prior_commands() {
        let tokens = vec![t("pressXUSB_GAMEPAD_A"), n(0.1), t(LEFT_STICK), n(1.0)];
        let parsed = parse_keymap(&tokens);
        assert_eq!(
            parsed.commands,
            vec![Command::PressButton {
                button: Button::A,
                duration: 0.1,
            }]
        );
        assert_eq!(parsed.error, Some(KeymapError::StickArity { name: LEFT_STICK }));
    }

    #[test]
    fn test_button_press_and_release() {
        let tokens = vec![t("pressXUSB_GAMEPAD_A"), n(0.1), t("releaseXUSB_GAMEPAD_A")];
        let parsed = parse_keymap(&tokens);
        assert!(parsed.error.is_none());
        assert_eq!(
            parsed.commands,
            vec![
                Command::PressButton {
                    button: Button::A,
                    duration: 0.1,
                },
                Command::ReleaseButton(Button::A),
            ]
        );
    }

    #[test]
    fn test_trigger_press_and_release() {
        let tokens = vec![
            t("pressXUSB_GAMEPAD_LEFT_TRIGGER"),
            n(0.3),
            t("releaseXUSB_GAMEPAD_LEFT_TRIGGER"),
        ];
        let parsed = parse_keymap(&tokens);
        assert!(parsed.error.is_none());
        assert_eq!(
            parsed.commands,
            vec![
                Command::PressTrigger {
                    side: Side::Left,
                    duration: 0.3,
                },
                Command::ReleaseTrigger(Side::Left),
            ]
        );
    }

    #[test]
    fn test_unknown_button_consumes_one_token() {
        // The duration after an unknown button name becomes a bare delay.
        let tokens = vec![t("pressXUSB_GAMEPAD_Q"), n(0.5), t("pressXUSB_GAMEPAD_B"), n(0.1)];
        let parsed = parse_keymap(&tokens);
        assert!(parsed.error.is_none());
        assert_eq!(
            parsed.commands,
            vec![
                Command::Delay(0.5),
                Command::PressButton {
                    button: Button::B,
                    duration: 0.1,
                },
            ]
        );
    }

    #[test]
    fn test_press_without_duration_is_structural() {
        let tokens = vec![t("pressXUSB_GAMEPAD_A")];
        let parsed = parse_keymap(&tokens);
        assert!(parsed.commands.is_empty());
        assert!(matches!(parsed.error, Some(KeymapError::PressArity { .. })));
    }

    #[test]
    fn test_unknown_release_is_soft() {
        let tokens = vec![t("releaseXUSB_GAMEPAD_Q"), n(0.2)];
        let parsed = parse_keymap(&tokens);
        assert!(parsed.error.is_none());
        assert_eq!(parsed.commands, vec![Command::Delay(0.2)]);
    }

    #[test]
    fn test_bare_delays_and_numeric_text() {
        let tokens = vec![n(0.5), Token::Text("0.25".to_string())];
        let parsed = parse_keymap(&tokens);
        assert_eq!(parsed.commands, vec![Command::Delay(0.5), Command::Delay(0.25)]);
    }

    #[test]
    fn test_non_scalar_json_values_are_skipped() {
        let values = vec![
            serde_json::json!(true),
            serde_json::json!(null),
            serde_json::json!(0.1),
        ];
        let tokens = tokens_from_array(&values);
        let parsed = parse_keymap(&tokens);
        assert!(parsed.error.is_none());
        assert_eq!(parsed.commands, vec![Command::Delay(0.1)]);
    }

    #[test]
    fn test_tokens_from_json_array() {
        let values: Vec<Value> =
            serde_json::from_str(r#"["left_joystick_float", 1.0, "0.5", 0.2]"#).unwrap();
        let tokens = tokens_from_array(&values);
        assert_eq!(
            tokens,
            vec![t(LEFT_STICK), n(1.0), Token::Text("0.5".to_string()), n(0.2)]
        );
    }
}
