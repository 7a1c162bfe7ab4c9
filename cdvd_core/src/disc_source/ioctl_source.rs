// SPDX-License-Identifier: GPL-3.0
// ioctl_source.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

/// This module contains the probes that work out a disc's geometry and TOC.
mod geometry;

use std::path::{Path, PathBuf};

use log::{debug, info, trace};

use super::{DiscSource, Geometry, MediaType, SubQ, TocEntry};
use crate::{
    cdrom_device::{CdromBackend, CdromDevice, DriveSlot, DriveStatus, RawFrame},
    diagnostics::DiagnosticSink,
    error::CdvdError,
};
use cdvd_utility::{Msf, SECTOR_SIZE_2048, SECTOR_SIZE_2352};

#[cfg(target_os = "linux")]
use crate::{cdrom_device::linux_cdrom_device::LinuxBackend, diagnostics::LogSink};

/// This struct models a physical CD/DVD drive. It owns the open device, plus the geometry
/// and TOC worked out when it was last opened. It is not thread safe; callers wanting
/// to share one must serialise access themselves.
pub struct IoctlSource<B: CdromBackend> {

    // Device path and the backend used to open it.
    path: PathBuf,
    backend: B,

    // The open device, if there is one.
    device: Option<B::Device>,

    // Geometry and TOC from the last probe.
    geometry: Geometry,
    toc: Vec<TocEntry>,

    // Where runtime read failures are reported.
    sink: Box<dyn DiagnosticSink>,
}

#[cfg(target_os = "linux")]
impl IoctlSource<LinuxBackend> {

    /// Creates a source for the given device node, reporting read failures to the `log`
    /// facade. Nothing is opened until `reopen` is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        IoctlSource::with_backend(path, LinuxBackend, Box::new(LogSink))
    }
}

/// Implementation functions for the source itself.
impl<B: CdromBackend> IoctlSource<B> {

    /// Creates a source using the supplied backend and diagnostic sink.
    pub fn with_backend(
        path: impl Into<PathBuf>,
        backend: B,
        sink: Box<dyn DiagnosticSink>
    ) -> Self {
        IoctlSource {
            path: path.into(),
            backend,
            device: None,
            geometry: Geometry::UNRESOLVED,
            toc: vec![],
            sink,
        }
    }

    /// Returns the device path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a device is currently open.
    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Returns the current geometry.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Placeholder for throttling the drive. It does nothing for now, and can't fail.
    // TODO: CDs could use CDROM_SELECT_SPEED here; there is no known DVD equivalent.
    pub fn set_spindle_speed(&self, restore_defaults: bool) {
        trace!("spindle speed request ignored (restore defaults: {restore_defaults})");
    }

    /// Resolves the geometry of the disc in the open device. DVD probing must come first,
    /// since the CD TOC requests also succeed on DVDs.
    fn resolve_geometry(&mut self) -> bool {

        let Some(device) = self.device.as_ref() else {
            return false;
        };

        let resolved = geometry::probe_dvd(device)
            .or_else(|| geometry::probe_cd(device, &mut self.toc));

        match resolved {
            Some(geometry) => {
                info!(
                    "{}: {:?}, {} sectors, layer break at {}",
                    self.path.display(),
                    geometry.media_type,
                    geometry.sector_count,
                    geometry.layer_break_address
                );
                self.geometry = geometry;
                true
            },
            None => {
                debug!("{}: no readable disc geometry", self.path.display());
                self.geometry = Geometry::UNRESOLVED;
                false
            },
        }
    }

    /// Sends a failure line to the diagnostic sink and hands the error back.
    fn report(&self, err: CdvdError) -> CdvdError {
        self.sink.emit(&format!(" * {err}"));
        err
    }

    /// Returns the open device, or reports that there isn't one.
    fn open_device(&self) -> Result<&B::Device, CdvdError> {
        self.device.as_ref().ok_or_else(|| self.report(CdvdError::NotOpen))
    }

    /// Returns the first `needed` bytes of the buffer, or reports that it is too small.
    fn output_slice<'a>(
        &self,
        buffer: &'a mut [u8],
        needed: u64
    ) -> Result<&'a mut [u8], CdvdError> {

        let len = buffer.len();
        match usize::try_from(needed) {
            Ok(needed) if needed <= len => Ok(&mut buffer[..needed]),
            _ => Err(self.report(CdvdError::BufferTooSmall {
                len,
                needed: usize::try_from(needed).unwrap_or(usize::MAX),
            })),
        }
    }
}

/// Implementation functions to be called from anything that understands what a
/// DiscSource object is.
impl<B: CdromBackend> DiscSource for IoctlSource<B> {

    /// Closes any open device and opens it again, then probes the disc. Opening is
    /// non-blocking, so an empty drive still opens fine and just stays unresolved.
    fn reopen(&mut self) -> Result<(), CdvdError> {

        self.device = None;

        match self.backend.open(&self.path) {
            Ok(device) => self.device = Some(device),
            Err(source) => {
                self.geometry = Geometry::UNRESOLVED;
                return Err(CdvdError::Open {
                    path: self.path.clone(),
                    source,
                });
            },
        }

        if self.resolve_geometry() {
            self.set_spindle_speed(false);
        }

        Ok(())
    }

    /// Checks the drive for a disc, probing it if it has just appeared and forgetting the
    /// geometry if it has gone.
    fn disc_ready(&mut self) -> bool {

        let Some(device) = self.device.as_ref() else {
            return false;
        };

        match device.drive_status(DriveSlot::Current) {
            Ok(DriveStatus::DiscOk) => {
                if !self.geometry.is_resolved() {
                    if let Err(err) = self.reopen() {
                        debug!("reprobe after disc insertion failed: {err}");
                    }
                }
            },
            status => {
                trace!("{}: drive status {status:?}", self.path.display());
                self.geometry = Geometry::UNRESOLVED;
            },
        }

        self.geometry.is_resolved()
    }

    fn sector_count(&self) -> u32 {
        self.geometry.sector_count
    }

    fn layer_break_address(&self) -> u32 {
        self.geometry.layer_break_address
    }

    fn media_type(&self) -> MediaType {
        self.geometry.media_type
    }

    fn read_toc(&self) -> &[TocEntry] {
        &self.toc
    }

    /// Reads whole 2048-byte sectors with a single positioned read. Anything short of the
    /// full byte count is a failure, and the buffer contents are then undefined.
    fn read_sectors_2048(
        &self,
        sector: u32,
        count: u32,
        buffer: &mut [u8]
    ) -> Result<(), CdvdError> {

        let device = self.open_device()?;

        let expected = count as u64 * SECTOR_SIZE_2048 as u64;
        let offset = sector as u64 * SECTOR_SIZE_2048 as u64;
        let output = self.output_slice(buffer, expected)?;

        let first = sector;
        let last = sector.wrapping_add(count).wrapping_sub(1);

        match device.read_at(output, offset) {
            Ok(read) if read == output.len() => Ok(()),
            Ok(read) => Err(self.report(CdvdError::ShortRead {
                first,
                last,
                read,
                expected: output.len(),
            })),
            Err(source) => Err(self.report(CdvdError::Read { first, last, source })),
        }
    }

    /// Reads raw 2352-byte frames one sector at a time, addressed by MSF. Stops at the
    /// first failure, leaving the frames before it in the buffer.
    fn read_sectors_2352(
        &self,
        sector: u32,
        count: u32,
        buffer: &mut [u8]
    ) -> Result<(), CdvdError> {

        let device = self.open_device()?;
        let output = self.output_slice(buffer, count as u64 * SECTOR_SIZE_2352 as u64)?;

        let mut frame: RawFrame = [0; SECTOR_SIZE_2352];
        // Sectors near the top of the u32 range have no MSF address, so the loop fails
        // before the range could run out.
        for (lba, chunk) in (sector..=u32::MAX).zip(output.chunks_exact_mut(SECTOR_SIZE_2352)) {

            let msf = Msf::from_lba(lba)
                .ok_or_else(|| self.report(CdvdError::MsfOutOfRange(lba)))?;

            if let Err(source) = device.read_raw_frame(msf, &mut frame) {
                return Err(self.report(CdvdError::RawRead { lba, source }));
            }
            chunk.copy_from_slice(&frame);
        }

        Ok(())
    }

    /// Reads the drive's current sub-channel Q position. Not cached.
    fn read_track_sub_q(&self) -> Result<SubQ, CdvdError> {

        let device = self.open_device()?;

        device
            .read_sub_channel()
            .map_err(|source| self.report(CdvdError::SubChannel(source)))
    }
}

impl<B: CdromBackend> Drop for IoctlSource<B> {

    /// Restores the spindle speed before the device is released.
    fn drop(&mut self) {
        if self.device.is_some() {
            self.set_spindle_speed(true);
            self.device = None;
        }
    }
}
