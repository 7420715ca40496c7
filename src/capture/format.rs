// SPDX-License-Identifier: MIT
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::sampler::Signal;

pub const MAGIC: [u8; 4] = *b"PVCP";
pub const FORMAT_VERSION: u8 = 1;
pub const EOF_MARKER: [u8; 4] = *b"PCEO";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CaptureMetadata {
    pub aircraft: String,
    pub tail: String,
    pub signals: Vec<Signal>,
    pub sample_period_ms: u64,
    pub recording_start: SystemTime,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub format_version: u8,
    pub metadata: CaptureMetadata,
}
