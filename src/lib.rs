//! Library exports for the blackshot binary and its tools.
//!
//! The capture pipeline, inversion routines and configuration types are public
//! so the CLI, the daemon and the schema dumper share one implementation.

pub mod capture;
pub mod config;
pub mod daemon;
pub mod dialog;
pub mod feedback;
pub mod hotkey;
pub mod i18n;
pub mod invert;
pub mod notification;
pub mod permissions;
pub mod tray;
pub mod util;

pub use config::Config;
