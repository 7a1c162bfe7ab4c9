// SPDX-License-Identifier: GPL-3.0
// disc_source.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use crate::error::CdvdError;
use cdvd_utility::Msf;

/// This module contains the default disc source, which drives a physical CD/DVD device
/// through the device layer. There may be others in future.
pub mod ioctl_source;

/// The kind of media in the drive, as worked out from its geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MediaType {

    // No geometry has been resolved.
    #[default]
    Unresolved,

    // A CD, identified through its TOC.
    Cd,

    // A DVD with one layer.
    SingleLayer,

    // A dual-layer DVD using parallel track path (PTP) addressing.
    DualLayerParallel,

    // A dual-layer DVD using opposite track path (OTP) addressing.
    DualLayerOpposite,
}

impl MediaType {

    /// Returns the integer code consumers of this media type expect: -1 for a CD, 0 for
    /// a single layer DVD or no DVD information, and 1 or 2 for PTP or OTP dual layer.
    pub fn code(self) -> i32 {
        match self {
            MediaType::Cd => -1,
            MediaType::Unresolved | MediaType::SingleLayer => 0,
            MediaType::DualLayerParallel => 1,
            MediaType::DualLayerOpposite => 2,
        }
    }
}

/// The geometry of the disc in the drive. These three values always change together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Geometry {
    pub sector_count: u32,
    pub layer_break_address: u32,
    pub media_type: MediaType,
}

impl Geometry {

    /// No disc, or a disc that could not be probed.
    pub const UNRESOLVED: Geometry = Geometry {
        sector_count: 0,
        layer_break_address: 0,
        media_type: MediaType::Unresolved,
    };

    /// Returns true if a disc has been probed successfully.
    pub fn is_resolved(&self) -> bool {
        self.sector_count != 0
    }
}

/// One track from a CD's table of contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TocEntry {
    pub lba: u32,
    pub track_number: u8,

    // Sub-channel Q address mode.
    pub adr: u8,

    // 4-bit control flags (pre-emphasis, copy permitted, data track, four channel).
    pub control: u8,
}

impl TocEntry {

    /// Returns true if this is a data track rather than an audio track.
    pub fn is_data(&self) -> bool {
        self.control & 0x4 != 0
    }
}

/// A snapshot of the drive's current sub-channel Q position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubQ {
    pub adr: u8,
    pub control: u8,
    pub track_number: u8,
    pub track_index: u8,

    // Position on the whole disc, and within the current track.
    pub absolute: Msf,
    pub relative: Msf,
}

/// This trait provides an implementation-opaque way for a virtual drive to read a disc.
pub trait DiscSource {

    /// Implementations must (re)open their device and resolve the disc's geometry. Only a
    /// failure to open is an error; a disc that cannot be probed is left unresolved.
    fn reopen(&mut self) -> Result<(), CdvdError>;

    /// Implementations must return true if a disc is present and its geometry resolved.
    fn disc_ready(&mut self) -> bool;

    /// Implementations must return the number of sectors on the disc, 0 if unresolved.
    fn sector_count(&self) -> u32;

    /// Implementations must return the last sector of layer 0 on dual layer discs.
    fn layer_break_address(&self) -> u32;

    /// Implementations must return the media type.
    fn media_type(&self) -> MediaType;

    /// Implementations must return the TOC read by the most recent CD probe.
    fn read_toc(&self) -> &[TocEntry];

    /// Implementations must read `count` 2048-byte sectors into the buffer.
    fn read_sectors_2048(
        &self,
        sector: u32,
        count: u32,
        buffer: &mut [u8]
    ) -> Result<(), CdvdError>;

    /// Implementations must read `count` 2352-byte raw frames into the buffer.
    fn read_sectors_2352(
        &self,
        sector: u32,
        count: u32,
        buffer: &mut [u8]
    ) -> Result<(), CdvdError>;

    /// Implementations must read the live sub-channel Q data.
    fn read_track_sub_q(&self) -> Result<SubQ, CdvdError>;
}
