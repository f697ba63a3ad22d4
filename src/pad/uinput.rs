//! Linux uinput backend.
//!
//! Creates a virtual device advertising the exact layout the kernel xpad
//! driver reports for a real Xbox 360 pad: 11 digital buttons, four stick
//! axes at -32768..=32767, two trigger axes at 0..=255 and the d-pad as the
//! HAT0X/HAT0Y axis pair. Staged events are buffered and emitted as a
//! single report on flush.

use std::io::ErrorKind;
use std::time::Duration;

use anyhow::{Context, Result};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, EventType, InputEvent, Key, UinputAbsSetup,
};
use log::{info, warn};

use super::{Button, PadBackend, Side};
use crate::error::Error;

const STICK_MIN: i32 = -32768;
const STICK_MAX: i32 = 32767;
const STICK_FUZZ: i32 = 16;
const STICK_FLAT: i32 = 128;

const TRIGGER_MIN: i32 = 0;
const TRIGGER_MAX: i32 = 255;

pub struct UinputPad {
    device: VirtualDevice,
    pending: Vec<InputEvent>,
}

fn stick_abs(axis: AbsoluteAxisType) -> UinputAbsSetup {
    UinputAbsSetup::new(axis, AbsInfo::new(0, STICK_MIN, STICK_MAX, STICK_FUZZ, STICK_FLAT, 0))
}

fn trigger_abs(axis: AbsoluteAxisType) -> UinputAbsSetup {
    UinputAbsSetup::new(axis, AbsInfo::new(0, TRIGGER_MIN, TRIGGER_MAX, 0, 0, 0))
}

fn hat_abs(axis: AbsoluteAxisType) -> UinputAbsSetup {
    UinputAbsSetup::new(axis, AbsInfo::new(0, -1, 1, 0, 0, 0))
}

fn key_code(button: Button) -> Key {
    match button {
        Button::A => Key::BTN_SOUTH,
        Button::B => Key::BTN_EAST,
        Button::X => Key::BTN_NORTH,
        Button::Y => Key::BTN_WEST,
        Button::LeftShoulder => Key::BTN_TL,
        Button::RightShoulder => Key::BTN_TR,
        Button::Back => Key::BTN_SELECT,
        Button::Start => Key::BTN_START,
        Button::Guide => Key::BTN_MODE,
        Button::LeftThumb => Key::BTN_THUMBL,
        Button::RightThumb => Key::BTN_THUMBR,
        // The d-pad is not a key on this layout; handled as hat axes.
        Button::DpadUp | Button::DpadDown | Button::DpadLeft | Button::DpadRight => {
            unreachable!("d-pad buttons map to hat axes")
        }
    }
}

/// Hat axis and pressed-direction value for a d-pad button, if it is one.
fn hat_code(button: Button) -> Option<(AbsoluteAxisType, i32)> {
    match button {
        Button::DpadUp => Some((AbsoluteAxisType::ABS_HAT0Y, -1)),
        Button::DpadDown => Some((AbsoluteAxisType::ABS_HAT0Y, 1)),
        Button::DpadLeft => Some((AbsoluteAxisType::ABS_HAT0X, -1)),
        Button::DpadRight => Some((AbsoluteAxisType::ABS_HAT0X, 1)),
        _ => None,
    }
}

impl UinputPad {
    /// Creates the virtual device. Fails with [`Error::DriverMissing`] when
    /// `/dev/uinput` is absent or not writable.
    pub fn open(name: &str) -> Result<Self, Error> {
        let mut keys = AttributeSet::<Key>::new();
        for key in [
            Key::BTN_SOUTH,
            Key::BTN_EAST,
            Key::BTN_NORTH,
            Key::BTN_WEST,
            Key::BTN_TL,
            Key::BTN_TR,
            Key::BTN_SELECT,
            Key::BTN_START,
            Key::BTN_MODE,
            Key::BTN_THUMBL,
            Key::BTN_THUMBR,
        ] {
            keys.insert(key);
        }

        let build = || -> std::io::Result<VirtualDevice> {
            VirtualDeviceBuilder::new()?
                .name(name)
                .with_keys(&keys)?
                .with_absolute_axis(&stick_abs(AbsoluteAxisType::ABS_X))?
                .with_absolute_axis(&stick_abs(AbsoluteAxisType::ABS_Y))?
                .with_absolute_axis(&stick_abs(AbsoluteAxisType::ABS_RX))?
                .with_absolute_axis(&stick_abs(AbsoluteAxisType::ABS_RY))?
                .with_absolute_axis(&trigger_abs(AbsoluteAxisType::ABS_Z))?
                .with_absolute_axis(&trigger_abs(AbsoluteAxisType::ABS_RZ))?
                .with_absolute_axis(&hat_abs(AbsoluteAxisType::ABS_HAT0X))?
                .with_absolute_axis(&hat_abs(AbsoluteAxisType::ABS_HAT0Y))?
                .build()
        };

        let device = build().map_err(|err| match err.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => Error::DriverMissing(format!(
                "cannot open /dev/uinput ({err}); load the uinput kernel module \
                 (`modprobe uinput`) and grant the user write access to it"
            )),
            _ => Error::Device(err.to_string()),
        })?;

        info!("virtual pad \"{name}\" created");
        Ok(Self {
            device,
            pending: Vec::new(),
        })
    }

    /// Opens the device with bounded retries; the device can take a moment
    /// to become available right after the driver loads.
    pub async fn open_with_retries(name: &str, retries: u32, delay: Duration) -> Result<Self, Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match Self::open(name) {
                Ok(pad) => return Ok(pad),
                Err(err) if attempt < retries => {
                    warn!("failed to create virtual pad (attempt {attempt}/{retries}): {err}");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn stage(&mut self, event_type: EventType, code: u16, value: i32) {
        self.pending.push(InputEvent::new(event_type, code, value));
    }

    fn stage_key(&mut self, button: Button, pressed: bool) {
        match hat_code(button) {
            Some((axis, direction)) => {
                let value = if pressed { direction } else { 0 };
                self.stage(EventType::ABSOLUTE, axis.0, value);
            }
            None => {
                let value = i32::from(pressed);
                self.stage(EventType::KEY, key_code(button).code(), value);
            }
        }
    }
}

fn scale_stick(value: f64) -> i32 {
    (value.clamp(-1.0, 1.0) * f64::from(STICK_MAX)).round() as i32
}

impl PadBackend for UinputPad {
    fn set_stick(&mut self, side: Side, x: f64, y: f64) -> Result<()> {
        let (x_axis, y_axis) = match side {
            Side::Left => (AbsoluteAxisType::ABS_X, AbsoluteAxisType::ABS_Y),
            Side::Right => (AbsoluteAxisType::ABS_RX, AbsoluteAxisType::ABS_RY),
        };
        self.stage(EventType::ABSOLUTE, x_axis.0, scale_stick(x));
        // evdev sticks report up as negative, the mirror of the float input.
        self.stage(EventType::ABSOLUTE, y_axis.0, scale_stick(-y));
        Ok(())
    }

    fn set_trigger(&mut self, side: Side, level: u8) -> Result<()> {
        let axis = match side {
            Side::Left => AbsoluteAxisType::ABS_Z,
            Side::Right => AbsoluteAxisType::ABS_RZ,
        };
        self.stage(EventType::ABSOLUTE, axis.0, i32::from(level));
        Ok(())
    }

    fn press(&mut self, button: Button) -> Result<()> {
        self.stage_key(button, true);
        Ok(())
    }

    fn release(&mut self, button: Button) -> Result<()> {
        self.stage_key(button, false);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let events = std::mem::take(&mut self.pending);
        self.device
            .emit(&events)
            .context("emitting events to the virtual pad")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stick_scaling() {
        assert_eq!(scale_stick(0.0), 0);
        assert_eq!(scale_stick(1.0), STICK_MAX);
        assert_eq!(scale_stick(-1.0), -STICK_MAX);
        // Out-of-range inputs clamp instead of wrapping.
        assert_eq!(scale_stick(2.5), STICK_MAX);
        assert_eq!(scale_stick(-7.0), -STICK_MAX);
    }

    #[test]
    fn test_dpad_maps_to_hat() {
        assert_eq!(hat_code(Button::DpadUp), Some((AbsoluteAxisType::ABS_HAT0Y, -1)));
        assert_eq!(hat_code(Button::DpadDown), Some((AbsoluteAxisType::ABS_HAT0Y, 1)));
        assert_eq!(hat_code(Button::DpadLeft), Some((AbsoluteAxisType::ABS_HAT0X, -1)));
        assert_eq!(hat_code(Button::DpadRight), Some((AbsoluteAxisType::ABS_HAT0X, 1)));
        assert_eq!(hat_code(Button::A), None);
    }
}
