//! CLI module for TrueTrack
//!
//! Headless commands for scanning, verification and the dashboards, plus the
//! interactive terminal UI.

pub mod error;
pub mod output;

pub mod config;
pub mod dashboard;
pub mod journey;
pub mod scan;
pub mod verify;

pub mod tui;
