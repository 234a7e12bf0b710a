//! CLI module for focusflow.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `app`: Command execution against the library
//! - `display`: Output formatting and display logic

pub mod app;
pub mod commands;
pub mod display;

pub use app::{execute, Context};
pub use commands::{ChartArgs, ChartMetric, Cli, Commands, SettingsArgs, StartArgs, Toggle};
pub use display::Display;
