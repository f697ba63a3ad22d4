//! Timed execution of parsed keymaps against the shared pad.
//!
//! Execution is best-effort and returns no value: structural errors abort
//! the rest of the current keymap, everything else is logged and skipped.
//! Every device write happens as one locked mutate-and-flush unit inside
//! [`Pad`]; suspensions run outside the lock so a held delay never blocks
//! other writers, and they select against the process shutdown signal so an
//! aborted session does not park a task in an unbounded wait.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::watch;

use crate::keymap::{self, Command, Token};
use crate::pad::{Pad, TRIGGER_MAX};

/// Keymaps shorter than this are rejected outright, before parsing.
const MIN_KEYMAP_TOKENS: usize = 3;

pub struct Interpreter {
    pad: Arc<Pad>,
    shutdown: watch::Receiver<bool>,
}

impl Interpreter {
    pub fn new(pad: Arc<Pad>, shutdown: watch::Receiver<bool>) -> Self {
        Self { pad, shutdown }
    }

    /// Parses and executes one keymap. The device is left in whatever state
    /// the last applied operation produced.
    pub async fn run(&mut self, tokens: &[Token]) {
        if tokens.len() < MIN_KEYMAP_TOKENS {
            warn!("invalid keymap: {tokens:?}");
            return;
        }

        let parsed = keymap::parse_keymap(tokens);
        for command in &parsed.commands {
            if self.apply(command).await {
                info!("keymap aborted by shutdown");
                return;
            }
        }
        if let Some(err) = parsed.error {
            error!("keymap aborted: {err}");
        }
    }

    /// Applies one command. Returns true when a suspension was cut short by
    /// shutdown and the rest of the keymap must be dropped.
    async fn apply(&mut self, command: &Command) -> bool {
        match command {
            Command::Delay(seconds) => return self.wait(*seconds).await,
            Command::SetStick {
                side,
                x,
                y,
                duration,
                reset,
            } => {
                self.write(|pad| pad.stick(*side, *x, *y));
                if self.wait(*duration).await {
                    return true;
                }
                if let Some((rx, ry)) = reset {
                    self.write(|pad| pad.stick(*side, *rx, *ry));
                }
            }
            Command::PressButton { button, duration } => {
                self.write(|pad| pad.press(*button));
                return self.wait(*duration).await;
            }
            Command::PressTrigger { side, duration } => {
                self.write(|pad| pad.trigger(*side, TRIGGER_MAX));
                return self.wait(*duration).await;
            }
            Command::ReleaseButton(button) => self.write(|pad| pad.release(*button)),
            Command::ReleaseTrigger(side) => self.write(|pad| pad.trigger(*side, 0)),
        }
        false
    }

    /// Write failures drop the command but never the sequence.
    fn write(&self, op: impl FnOnce(&Pad) -> anyhow::Result<()>) {
        if let Err(err) = op(&self.pad) {
            error!("device write failed: {err:#}");
        }
    }

    /// Suspends for `seconds`, or until shutdown. Returns true on shutdown.
    async fn wait(&mut self, seconds: f64) -> bool {
        if !(seconds > 0.0) {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs_f64(seconds)) => false,
            _ = self.shutdown.changed() => true,
        }
    }
}
