//! Main application logic.
//!
//! This module wires the crate's pieces into the three run modes behind the
//! CLI: `bridge` (keymap envelopes from stdin, executed on the virtual
//! pad), `words` (raw transcription fragments filtered into clean words on
//! stdout) and `run` (a full session: profile, filter, phrase matcher and
//! interpreter in one process). One line is fully processed, including its
//! timed suspensions, before the next is read, so at most one keymap runs
//! at a time by construction.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, warn};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;

use crate::config::Config;
use crate::interpreter::Interpreter;
use crate::keymap::{Token, tokens_from_array};
use crate::pad::{Pad, UinputPad};
use crate::phrase::PhraseMatcher;
use crate::profile::Profile;
use crate::words::WordFilter;

pub struct App {
    config: Config,
    shutdown: watch::Receiver<bool>,
}

impl App {
    pub fn new(config: Config, shutdown: watch::Receiver<bool>) -> Self {
        Self { config, shutdown }
    }

    /// Creates the shared pad handle, retrying initialization as
    /// configured. A missing uinput driver surfaces as a distinct,
    /// actionable error.
    async fn open_pad(&self) -> Result<Arc<Pad>> {
        let device = &self.config.device;
        let backend = UinputPad::open_with_retries(
            &device.name,
            device.init_retries.max(1),
            Duration::from_secs_f64(device.init_retry_secs.max(0.0)),
        )
        .await?;
        Ok(Arc::new(Pad::new(Box::new(backend))))
    }

    fn stdin_lines(&self) -> Lines<BufReader<Stdin>> {
        BufReader::new(tokio::io::stdin()).lines()
    }

    /// Reads the next stdin line, or None when the stream ends, errors out
    /// or shutdown is requested.
    async fn next_line(&mut self, lines: &mut Lines<BufReader<Stdin>>) -> Option<String> {
        tokio::select! {
            _ = self.shutdown.changed() => None,
            line = lines.next_line() => match line {
                Ok(line) => line,
                Err(err) => {
                    error!("reading stdin failed: {err}");
                    None
                }
            },
        }
    }

    /// Keymap envelopes from stdin, executed on the virtual pad.
    pub async fn run_bridge(&mut self) -> Result<()> {
        let pad = self.open_pad().await?;
        let mut interpreter = Interpreter::new(pad, self.shutdown.clone());

        // The parent process watches stdout for this exact line.
        println!("ready");
        std::io::stdout().flush().context("flushing readiness line")?;

        let mut lines = self.stdin_lines();
        while let Some(line) = self.next_line(&mut lines).await {
            if let Some(tokens) = decode_action_line(&line) {
                interpreter.run(&tokens).await;
            }
        }
        info!("input closed, stopping bridge");
        Ok(())
    }

    /// Raw transcription fragments from stdin, cleaned words to stdout.
    /// Each surviving word is emitted and flushed immediately; stdout
    /// stays a pure word stream, diagnostics go to stderr.
    pub async fn run_words(&mut self) -> Result<()> {
        let filter = WordFilter::new(&self.config.words.status_words);
        let mut stdout = std::io::stdout();
        let mut lines = self.stdin_lines();
        while let Some(line) = self.next_line(&mut lines).await {
            for word in filter.extract(&line) {
                writeln!(stdout, "{word}").context("writing word")?;
                stdout.flush().context("flushing word")?;
            }
        }
        Ok(())
    }

    /// Full session: fragments in, matched keymaps executed on the pad.
    pub async fn run_session(&mut self, profile_override: Option<PathBuf>) -> Result<()> {
        let profile_path = profile_override
            .or_else(|| self.config.profile.path.clone())
            .context("no keyword profile configured; pass --profile or set profile.path")?;
        let profile = Profile::load(&profile_path, self.config.profile.synonyms.as_deref())?;

        let filter = WordFilter::new(&self.config.words.status_words);
        let mut matcher = PhraseMatcher::new(profile.mappings, self.config.phrases.depth);

        let pad = self.open_pad().await?;
        let mut interpreter = Interpreter::new(pad, self.shutdown.clone());
        info!("session ready");

        let mut lines = self.stdin_lines();
        while let Some(line) = self.next_line(&mut lines).await {
            for word in filter.extract(&line) {
                if let Some(keymap) = matcher.push_word(&word) {
                    interpreter.run(&keymap).await;
                }
            }
        }
        info!("input closed, stopping session");
        Ok(())
    }
}

/// Decodes one transport line into keymap tokens.
///
/// The envelope is a JSON object whose `action` field carries the keymap
/// array directly, or a string that itself JSON-decodes to the array.
/// Malformed lines are logged and skipped; a missing field is skipped
/// silently.
pub fn decode_action_line(line: &str) -> Option<Vec<Token>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let envelope: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            error!("bad json line ({err}): {line}");
            return None;
        }
    };

    match envelope.get("action")? {
        Value::Array(values) => Some(tokens_from_array(values)),
        Value::String(inner) => match serde_json::from_str::<Value>(inner) {
            Ok(Value::Array(values)) => Some(tokens_from_array(&values)),
            Ok(other) => {
                warn!("action payload is not an array: {other}");
                None
            }
            Err(err) => {
                error!("bad action payload ({err}): {inner}");
                None
            }
        },
        other => {
            warn!("unsupported action field: {other}");
            None
        }
    }
}
