// SPDX-License-Identifier: GPL-3.0
// error.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors surfaced by a disc source. Probe failures are not represented here, as an
/// empty drive or unsupported media just leaves the geometry unresolved.
#[derive(Debug, Error)]
pub enum CdvdError {

    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no device is open")]
    NotOpen,

    #[error("CDVD read sectors {first}-{last} failed: {source}")]
    Read {
        first: u32,
        last: u32,
        #[source]
        source: io::Error,
    },

    #[error("CDVD read sectors {first}-{last}: {read} bytes read, {expected} bytes expected")]
    ShortRead {
        first: u32,
        last: u32,
        read: usize,
        expected: usize,
    },

    #[error("buffer holds {len} bytes but {needed} bytes were requested")]
    BufferTooSmall {
        len: usize,
        needed: usize,
    },

    #[error("sector {0} cannot be expressed as an MSF address")]
    MsfOutOfRange(u32),

    #[error("CDVD CDROMREADRAW sector {lba} failed: {source}")]
    RawRead {
        lba: u32,
        #[source]
        source: io::Error,
    },

    #[error("SUB CHANNEL READ ERROR: {0}")]
    SubChannel(#[source] io::Error),
}

impl CdvdError {

    /// Returns the OS error code behind this error, if there is one.
    pub fn os_error_code(&self) -> Option<i32> {
        match self {
            CdvdError::Open { source, .. }
            | CdvdError::Read { source, .. }
            | CdvdError::RawRead { source, .. }
            | CdvdError::SubChannel(source) => source.raw_os_error(),
            _ => None,
        }
    }
}
