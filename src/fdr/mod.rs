// SPDX-License-Identifier: MIT
pub mod format;
pub mod writer;

pub use format::{FdrColumn, FdrHeader, Wind};
pub use writer::{FdrSink, StartOutcome, StopOutcome};
