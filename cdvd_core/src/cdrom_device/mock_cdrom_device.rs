// SPDX-License-Identifier: GPL-3.0
// mock_cdrom_device.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    io,
    path::Path,
    rc::Rc,
    sync::{Arc, Mutex},
};

use super::{
    CdromBackend, CdromDevice, DriveSlot, DriveStatus, DvdLayer, RawFrame, TocHeader,
    TrackPath,
};
use crate::{
    diagnostics::DiagnosticSink,
    disc_source::{SubQ, TocEntry},
};
use cdvd_utility::Msf;

/// Track number of the lead-out entry.
pub const LEAD_OUT: u8 = 0xAA;

/// A single call made against the mock backend or device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Open,
    DvdLayer(u8),
    TocHeader,
    TocEntry(u8),
    ReadAt { offset: u64, len: usize },
    RawFrame(Msf),
    SubChannel,
    DriveStatus(i32),
}

/// The disc (and drive) the mock device answers for. Anything set to `None` fails
/// with an OS error.
pub struct MockDisc {
    pub open_error: Option<i32>,
    pub dvd_layers: [Option<DvdLayer>; 2],
    pub toc_header: Option<TocHeader>,
    pub toc_entries: BTreeMap<u8, TocEntry>,
    pub data: Vec<u8>,
    pub failing_raw_lba: Option<u32>,
    pub sub_q: Option<SubQ>,
    pub status: Option<DriveStatus>,
    pub calls: Vec<Call>,
}

impl MockDisc {

    /// A drive with nothing in it.
    pub fn empty() -> Self {
        MockDisc {
            open_error: None,
            dvd_layers: [None, None],
            toc_header: None,
            toc_entries: BTreeMap::new(),
            data: vec![],
            failing_raw_lba: None,
            sub_q: None,
            status: Some(DriveStatus::NoDisc),
            calls: vec![],
        }
    }

    /// A single layer DVD covering the given sectors.
    pub fn single_layer_dvd(start_sector: u32, end_sector: u32) -> Self {

        let mut disc = MockDisc::empty();
        disc.status = Some(DriveStatus::DiscOk);
        disc.dvd_layers[0] = Some(dvd_layer(0, TrackPath::Parallel, start_sector, end_sector, 0));

        disc
    }

    /// A CD with the given (track, lba) entries and lead-out.
    pub fn cd(tracks: &[(u8, u32)], lead_out: u32) -> Self {

        let mut disc = MockDisc::empty();
        disc.status = Some(DriveStatus::DiscOk);
        disc.toc_header = Some(TocHeader {
            first_track: tracks.first().map_or(1, |track| track.0),
            last_track: tracks.last().map_or(0, |track| track.0),
        });
        for &(track_number, lba) in tracks {
            disc.toc_entries.insert(track_number, toc_entry(track_number, lba));
        }
        disc.toc_entries.insert(LEAD_OUT, toc_entry(LEAD_OUT, lead_out));

        disc
    }

    /// Returns true if any TOC ioctl was issued.
    pub fn cd_probed(&self) -> bool {
        self.calls.iter().any(|call| matches!(call, Call::TocHeader | Call::TocEntry(_)))
    }
}

/// Builds a layer descriptor.
pub fn dvd_layer(
    layer_count: u8,
    track_path: TrackPath,
    start_sector: u32,
    end_sector: u32,
    end_sector_l0: u32,
) -> DvdLayer {
    DvdLayer {
        layer_count,
        track_path,
        start_sector,
        end_sector,
        end_sector_l0,
    }
}

/// Builds a data track entry.
pub fn toc_entry(track_number: u8, lba: u32) -> TocEntry {
    TocEntry {
        lba,
        track_number,
        adr: 1,
        control: 4,
    }
}

fn os_error(code: i32) -> io::Error {
    io::Error::from_raw_os_error(code)
}

/// Opens mock devices that all share one disc.
pub struct MockBackend {
    disc: Rc<RefCell<MockDisc>>,
}

impl MockBackend {

    pub fn new(disc: MockDisc) -> Self {
        MockBackend {
            disc: Rc::new(RefCell::new(disc)),
        }
    }

    /// Returns a handle on the shared disc, so tests can swap media or inspect calls.
    pub fn disc(&self) -> Rc<RefCell<MockDisc>> {
        Rc::clone(&self.disc)
    }
}

impl CdromBackend for MockBackend {

    type Device = MockCdromDevice;

    fn open(&self, _path: &Path) -> io::Result<MockCdromDevice> {

        let mut disc = self.disc.borrow_mut();
        disc.calls.push(Call::Open);

        match disc.open_error {
            Some(code) => Err(os_error(code)),
            None => Ok(MockCdromDevice {
                disc: Rc::clone(&self.disc),
            }),
        }
    }
}

/// A device backed by a `MockDisc`.
pub struct MockCdromDevice {
    disc: Rc<RefCell<MockDisc>>,
}

impl CdromDevice for MockCdromDevice {

    fn read_dvd_layer(&self, layer_num: u8) -> io::Result<DvdLayer> {

        let mut disc = self.disc.borrow_mut();
        disc.calls.push(Call::DvdLayer(layer_num));

        disc.dvd_layers
            .get(layer_num as usize)
            .copied()
            .flatten()
            .ok_or_else(|| os_error(libc::EINVAL))
    }

    fn read_toc_header(&self) -> io::Result<TocHeader> {

        let mut disc = self.disc.borrow_mut();
        disc.calls.push(Call::TocHeader);

        disc.toc_header.ok_or_else(|| os_error(libc::EIO))
    }

    fn read_toc_entry(&self, track_number: u8) -> io::Result<TocEntry> {

        let mut disc = self.disc.borrow_mut();
        disc.calls.push(Call::TocEntry(track_number));

        disc.toc_entries
            .get(&track_number)
            .copied()
            .ok_or_else(|| os_error(libc::EIO))
    }

    fn read_at(&self, buffer: &mut [u8], offset: u64) -> io::Result<usize> {

        let mut disc = self.disc.borrow_mut();
        disc.calls.push(Call::ReadAt { offset, len: buffer.len() });

        if disc.data.is_empty() {
            return Err(os_error(libc::EIO));
        }

        let start = (offset as usize).min(disc.data.len());
        let end = (start + buffer.len()).min(disc.data.len());
        buffer[..end - start].copy_from_slice(&disc.data[start..end]);

        Ok(end - start)
    }

    fn read_raw_frame(&self, msf: Msf, frame: &mut RawFrame) -> io::Result<()> {

        let mut disc = self.disc.borrow_mut();
        disc.calls.push(Call::RawFrame(msf));

        let lba = msf.to_lba() as u32;
        if disc.failing_raw_lba == Some(lba) {
            return Err(os_error(libc::EIO));
        }

        // Each frame is filled with the low byte of its LBA.
        frame.fill(lba as u8);

        Ok(())
    }

    fn read_sub_channel(&self) -> io::Result<SubQ> {

        let mut disc = self.disc.borrow_mut();
        disc.calls.push(Call::SubChannel);

        disc.sub_q.ok_or_else(|| os_error(libc::EIO))
    }

    fn drive_status(&self, slot: DriveSlot) -> io::Result<DriveStatus> {

        let mut disc = self.disc.borrow_mut();
        disc.calls.push(Call::DriveStatus(slot.raw()));

        disc.status.ok_or_else(|| os_error(libc::EIO))
    }
}

/// A diagnostic sink that keeps every line it is given.
#[derive(Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }
}

impl DiagnosticSink for RecordingSink {

    fn emit(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}
