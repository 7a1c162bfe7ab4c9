// SPDX-License-Identifier: GPL-3.0
// lib.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

// This crate gives raw access to a physical CD/DVD drive: disc geometry, TOC,
// sector reads and disc presence. It is used by emulated optical drives.

/// This module contains the device layer, which issues the actual drive requests.
pub mod cdrom_device;

/// This module contains the disc source, the view of a drive used by the rest of the
/// system.
pub mod disc_source;

/// This module contains the sink used to report runtime failures.
pub mod diagnostics;

/// This module contains the error type.
pub mod error;

pub use disc_source::{DiscSource, Geometry, MediaType, SubQ, TocEntry, ioctl_source::IoctlSource};
pub use error::CdvdError;
pub use cdvd_utility::{SECTOR_SIZE_2048, SECTOR_SIZE_2352};
