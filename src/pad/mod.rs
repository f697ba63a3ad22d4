//! The shared virtual gamepad handle.
//!
//! The pad is the single hardware-emulation target every keymap executes
//! against. Backends implement [`PadBackend`]; the [`Pad`] wrapper owns one
//! backend behind a mutex and performs every state mutation together with
//! the following flush inside one lock scope, because the backend's
//! "set fields then flush" pattern is not atomic on its own. Timed
//! suspensions never happen while the lock is held.

use std::sync::Mutex;

use anyhow::Result;

mod uinput;

pub use uinput::UinputPad;

/// Full analog trigger deflection.
pub const TRIGGER_MAX: u8 = u8::MAX;

/// Left or right half of the pad, for sticks and triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// The digital buttons of an Xbox-360-layout pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    A,
    B,
    X,
    Y,
    LeftShoulder,
    RightShoulder,
    LeftThumb,
    RightThumb,
    Start,
    Back,
    Guide,
}

impl Button {
    /// Resolves a canonical wire name (`XUSB_GAMEPAD_*`). The table is
    /// closed; unknown names are a soft error for the caller to log.
    pub fn from_name(name: &str) -> Option<Button> {
        match name {
            "XUSB_GAMEPAD_DPAD_UP" => Some(Button::DpadUp),
            "XUSB_GAMEPAD_DPAD_DOWN" => Some(Button::DpadDown),
            "XUSB_GAMEPAD_DPAD_LEFT" => Some(Button::DpadLeft),
            "XUSB_GAMEPAD_DPAD_RIGHT" => Some(Button::DpadRight),
            "XUSB_GAMEPAD_A" => Some(Button::A),
            "XUSB_GAMEPAD_B" => Some(Button::B),
            "XUSB_GAMEPAD_X" => Some(Button::X),
            "XUSB_GAMEPAD_Y" => Some(Button::Y),
            "XUSB_GAMEPAD_LEFT_SHOULDER" => Some(Button::LeftShoulder),
            "XUSB_GAMEPAD_RIGHT_SHOULDER" => Some(Button::RightShoulder),
            "XUSB_GAMEPAD_LEFT_THUMB" => Some(Button::LeftThumb),
            "XUSB_GAMEPAD_RIGHT_THUMB" => Some(Button::RightThumb),
            "XUSB_GAMEPAD_START" => Some(Button::Start),
            "XUSB_GAMEPAD_BACK" => Some(Button::Back),
            "XUSB_GAMEPAD_GUIDE" => Some(Button::Guide),
            _ => None,
        }
    }
}

/// Resolves a canonical trigger wire name to a side.
pub fn trigger_from_name(name: &str) -> Option<Side> {
    match name {
        "XUSB_GAMEPAD_LEFT_TRIGGER" => Some(Side::Left),
        "XUSB_GAMEPAD_RIGHT_TRIGGER" => Some(Side::Right),
        _ => None,
    }
}

/// The device boundary: the primitives an emulation backend must provide.
///
/// Mutations only stage state; nothing reaches the host until `flush`.
/// Implementations: [`UinputPad`] (Linux uinput), a recording mock in tests.
pub trait PadBackend: Send {
    /// Stages a stick position. `x` and `y` are in [-1.0, 1.0], positive y up.
    fn set_stick(&mut self, side: Side, x: f64, y: f64) -> Result<()>;

    /// Stages an analog trigger level (0 released, 255 fully pressed).
    fn set_trigger(&mut self, side: Side, level: u8) -> Result<()>;

    /// Stages a button press.
    fn press(&mut self, button: Button) -> Result<()>;

    /// Stages a button release.
    fn release(&mut self, button: Button) -> Result<()>;

    /// Sends all staged state to the host as one report.
    fn flush(&mut self) -> Result<()>;
}

/// The process-wide pad handle shared by every command stream.
///
/// Each operation acquires the lock, stages the mutation and flushes before
/// releasing, so concurrent callers can never interleave partial updates
/// into one corrupted report.
pub struct Pad {
    backend: Mutex<Box<dyn PadBackend>>,
}

impl Pad {
    pub fn new(backend: Box<dyn PadBackend>) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    pub fn stick(&self, side: Side, x: f64, y: f64) -> Result<()> {
        let mut backend = self.backend.lock().unwrap();
        backend.set_stick(side, x, y)?;
        backend.flush()
    }

    pub fn trigger(&self, side: Side, level: u8) -> Result<()> {
        let mut backend = self.backend.lock().unwrap();
        backend.set_trigger(side, level)?;
        backend.flush()
    }

    pub fn press(&self, button: Button) -> Result<()> {
        let mut backend = self.backend.lock().unwrap();
        backend.press(button)?;
        backend.flush()
    }

    pub fn release(&self, button: Button) -> Result<()> {
        let mut backend = self.backend.lock().unwrap();
        backend.release(button)?;
        backend.flush()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_vocabulary() {
        assert_eq!(Button::from_name("XUSB_GAMEPAD_A"), Some(Button::A));
        assert_eq!(Button::from_name("XUSB_GAMEPAD_DPAD_UP"), Some(Button::DpadUp));
        assert_eq!(Button::from_name("XUSB_GAMEPAD_GUIDE"), Some(Button::Guide));
        assert_eq!(Button::from_name("XUSB_GAMEPAD_Q"), None);
        // Triggers are analog, not part of the button table.
        assert_eq!(Button::from_name("XUSB_GAMEPAD_LEFT_TRIGGER"), None);
    }

    #[test]
    fn test_trigger_vocabulary() {
        assert_eq!(trigger_from_name("XUSB_GAMEPAD_LEFT_TRIGGER"), Some(Side::Left));
        assert_eq!(trigger_from_name("XUSB_GAMEPAD_RIGHT_TRIGGER"), Some(Side::Right));
        assert_eq!(trigger_from_name("XUSB_GAMEPAD_MIDDLE_TRIGGER"), None);
    }

    #[test]
    fn test_pad_flushes_every_mutation() {
        use super::mock::{MockBackend, Op};

        let (backend, ops) = MockBackend::new();
        let pad = Pad::new(Box::new(backend));

        pad.stick(Side::Left, 0.5, -0.5).unwrap();
        pad.press(Button::A).unwrap();
        pad.release(Button::A).unwrap();
        pad.trigger(Side::Right, TRIGGER_MAX).unwrap();

        let ops = ops.lock().unwrap();
        assert_eq!(
            *ops,
            vec![
                Op::Stick(Side::Left, 0.5, -0.5),
                Op::Flush,
                Op::Press(Button::A),
                Op::Flush,
                Op::Release(Button::A),
                Op::Flush,
                Op::Trigger(Side::Right, TRIGGER_MAX),
                Op::Flush,
            ]
        );
    }
}
