//! apkstage-lib: Core types and logic for apkstage
//!
//! This crate decides, on every invocation, which artifacts of an Android/Java
//! build are stale and drives the external toolchain to regenerate them:
//! - `timestamp`: the staleness primitive
//! - `source`: source tree resolution with pruning matchers
//! - `diff`: per-stage dependency diffs
//! - `stage`: the stage sequencer and its state machine
//! - `target`: the standard and user-defined build targets

pub mod config;
pub mod consts;
pub mod context;
pub mod diff;
pub mod error;
pub mod platform;
pub mod source;
pub mod stage;
pub mod target;
pub mod timestamp;
pub mod tool;
pub mod translate;
pub mod util;

pub use context::BuildContext;
pub use error::{BuildError, Result};
