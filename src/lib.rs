#![doc = include_str!("../README.md")]
pub mod app;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod keymap;
pub mod logging;
pub mod pad;
pub mod phrase;
pub mod profile;
pub mod words;
