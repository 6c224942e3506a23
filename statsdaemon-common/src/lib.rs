//! Common utilities shared by the statsdaemon crates.

#![warn(missing_docs)]

mod macros;
mod time;

pub use crate::time::*;
