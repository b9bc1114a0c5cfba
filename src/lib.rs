//! Claude Monitor Lite
//!
//! A lightweight background monitor for Claude usage limits. A detached worker
//! polls the usage endpoint on a fixed interval, keeps the latest reading in a
//! shared cache and renders a compact indicator plus one line per usage window.
//!
//! ## Architecture Overview
//!
//! - [`daemon`] - PID marker, detaching, the shared cache and the refresh
//!   scheduler event loop
//! - [`client`] - Usage-limit client for the Claude web API
//! - [`display`] - Pure rendering of snapshots into indicator and menu text,
//!   plus the surfaces that show it
//! - [`session`] - Session key and display-mode persistence
//! - [`auth`] - Interactive login
//! - [`commands`] - CLI subcommands
//! - [`config`] - Configuration management with environment variable support
//! - [`logging`] - Structured logging with JSON and pretty-print formats
//!
//! ## Key Types
//!
//! - [`UsageSnapshot`] - One reading of all usage windows
//! - [`DisplayMode`] - Which window the indicator shows
//! - [`daemon::RefreshScheduler`] - Single-consumer loop driving fetches and rendering
//! - [`display::MenuView`] - What a surface draws

pub mod auth;
pub mod client;
pub mod commands;
pub mod config;
pub mod daemon;
pub mod display;
pub mod errors;
pub mod logging;
pub mod models;
pub mod session;

pub use models::*;
