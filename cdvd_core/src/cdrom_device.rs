// SPDX-License-Identifier: GPL-3.0
// cdrom_device.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{io, path::Path};

use crate::disc_source::{SubQ, TocEntry};
use cdvd_utility::{Msf, SECTOR_SIZE_2352};

/// This module contains the Linux implementation, which talks to the kernel's CD-ROM
/// driver via ioctl. There may be others in future.
#[cfg(target_os = "linux")]
pub mod linux_cdrom_device;

/// This module contains a recording fake device, used to test the layers above.
#[cfg(test)]
pub(crate) mod mock_cdrom_device;

/// The kernel's `CDSL_CURRENT` value.
const CDSL_CURRENT: i32 = i32::MAX;

/// Selects which changer slot a status query refers to. Only the current slot can be
/// expressed: a literal slot of 0 is taken by some drivers as a request to close the
/// tray, so it must never reach the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveSlot {
    Current,
}

impl DriveSlot {

    /// Returns the value passed to the device for this slot.
    pub fn raw(self) -> i32 {
        match self {
            DriveSlot::Current => CDSL_CURRENT,
        }
    }
}

/// Drive status as reported by a status query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveStatus {
    NoInfo,
    NoDisc,
    TrayOpen,
    DriveNotReady,
    DiscOk,
    Unknown(i32),
}

impl DriveStatus {

    /// Maps a kernel `CDS_*` value onto a status.
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => DriveStatus::NoInfo,
            1 => DriveStatus::NoDisc,
            2 => DriveStatus::TrayOpen,
            3 => DriveStatus::DriveNotReady,
            4 => DriveStatus::DiscOk,
            other => DriveStatus::Unknown(other),
        }
    }
}

/// Track path of a dual-layer DVD.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackPath {
    Parallel,
    Opposite,
}

/// One layer descriptor from a DVD physical format structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DvdLayer {

    // Number of layers minus one, so 0 means a single layer disc.
    pub layer_count: u8,
    pub track_path: TrackPath,
    pub start_sector: u32,
    pub end_sector: u32,

    // Last sector of layer 0, only meaningful on opposite track path discs.
    pub end_sector_l0: u32,
}

/// First and last track numbers from the TOC header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TocHeader {
    pub first_track: u8,
    pub last_track: u8,
}

/// A raw frame as returned by a 2352-byte read.
pub type RawFrame = [u8; SECTOR_SIZE_2352];

/// This trait provides an implementation-opaque way of opening CD-ROM devices, so that
/// a disc source can reopen its device whenever it needs to.
pub trait CdromBackend {

    type Device: CdromDevice;

    /// Implementations must open the device read-only, in a mode that still succeeds
    /// when the drive is empty.
    fn open(&self, path: &Path) -> io::Result<Self::Device>;
}

/// This trait provides the primitive operations of an open CD-ROM device. Closing the
/// device happens when it is dropped.
pub trait CdromDevice {

    /// Implementations must return the physical format descriptor for the given layer.
    fn read_dvd_layer(&self, layer_num: u8) -> io::Result<DvdLayer>;

    /// Implementations must return the TOC header.
    fn read_toc_header(&self) -> io::Result<TocHeader>;

    /// Implementations must return the TOC entry for the given track, addressed by LBA.
    fn read_toc_entry(&self, track_number: u8) -> io::Result<TocEntry>;

    /// Implementations must perform one positioned read and return the byte count.
    fn read_at(&self, buffer: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Implementations must read the raw frame at the given MSF address.
    fn read_raw_frame(&self, msf: Msf, frame: &mut RawFrame) -> io::Result<()>;

    /// Implementations must query the current sub-channel Q data in MSF form.
    fn read_sub_channel(&self) -> io::Result<SubQ>;

    /// Implementations must query the drive status for the given slot.
    fn drive_status(&self, slot: DriveSlot) -> io::Result<DriveStatus>;
}
