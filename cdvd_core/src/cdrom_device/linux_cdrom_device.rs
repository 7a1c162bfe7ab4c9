// SPDX-License-Identifier: GPL-3.0
// linux_cdrom_device.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{
    fs::{File, OpenOptions},
    io,
    mem,
    os::{
        fd::AsRawFd,
        unix::fs::{FileExt, OpenOptionsExt},
    },
    path::Path,
};

use super::{
    CdromBackend, CdromDevice, DriveSlot, DriveStatus, DvdLayer, RawFrame, TocHeader,
    TrackPath,
};
use crate::disc_source::{SubQ, TocEntry};
use cdvd_utility::{Msf, SECTOR_SIZE_2352};

// Request numbers from <linux/cdrom.h>.
const CDROMREADTOCHDR: u32 = 0x5305;
const CDROMREADTOCENTRY: u32 = 0x5306;
const CDROMSUBCHNL: u32 = 0x530B;
const CDROMREADRAW: u32 = 0x5314;
const CDROM_DRIVE_STATUS: u32 = 0x5326;
const DVD_READ_STRUCT: u32 = 0x5390;

// Address formats and structure types.
const CDROM_LBA: u8 = 0x01;
const CDROM_MSF: u8 = 0x02;
const DVD_STRUCT_PHYSICAL: u8 = 0x00;

/// Number of layer descriptors in `struct dvd_physical`.
const DVD_LAYERS: usize = 4;

/// Size of `dvd_struct`, which is a union sized by its largest member (`dvd_manufact`).
/// The kernel copies the whole union in and out, so our buffer must be at least this big.
const DVD_STRUCT_SIZE: usize = 2056;

/// Mirrors `struct cdrom_tochdr`.
#[repr(C)]
#[derive(Clone, Copy, Default)]
struct RawTocHeader {
    first_track: u8,
    last_track: u8,
}

/// Mirrors `struct cdrom_tocentry`. The `cdte_addr` union is held as an `i32`, which has
/// the same size and alignment; in MSF form its first three bytes are M, S and F.
#[repr(C)]
#[derive(Clone, Copy, Default)]
struct RawTocEntry {
    track: u8,
    adr_ctrl: u8,
    format: u8,
    addr: i32,
    data_mode: u8,
}

/// Mirrors `struct cdrom_subchnl`.
#[repr(C)]
#[derive(Clone, Copy, Default)]
struct RawSubChannel {
    format: u8,
    audio_status: u8,
    adr_ctrl: u8,
    track: u8,
    index: u8,
    absolute_addr: i32,
    relative_addr: i32,
}

/// Mirrors `struct dvd_layer`. The first five bytes hold bitfields.
#[repr(C)]
#[derive(Clone, Copy, Default)]
struct RawDvdLayer {
    bitfields: [u8; 5],
    start_sector: u32,
    end_sector: u32,
    end_sector_l0: u32,
}

/// Mirrors `struct dvd_physical`.
#[repr(C)]
#[derive(Clone, Copy, Default)]
struct RawDvdPhysical {
    kind: u8,
    layer_num: u8,
    layer: [RawDvdLayer; DVD_LAYERS],
}

/// Mirrors `dvd_struct` when used for physical format requests, padded to the size of
/// the full union.
#[repr(C)]
struct RawDvdStruct {
    physical: RawDvdPhysical,
    padding: [u8; DVD_STRUCT_SIZE - mem::size_of::<RawDvdPhysical>()],
}

/// Raw read buffer. On input the first bytes hold a `struct cdrom_msf`, on output the
/// whole buffer holds the frame.
#[repr(C, align(4))]
struct RawReadBuffer([u8; SECTOR_SIZE_2352]);

const _: () = assert!(mem::size_of::<RawTocEntry>() == 12);
const _: () = assert!(mem::size_of::<RawSubChannel>() == 16);
const _: () = assert!(mem::size_of::<RawDvdLayer>() == 20);
const _: () = assert!(mem::size_of::<RawDvdPhysical>() == 84);
const _: () = assert!(mem::size_of::<RawDvdStruct>() == DVD_STRUCT_SIZE);

// Field offsets from <linux/cdrom.h>.
const _: () = assert!(mem::offset_of!(RawTocEntry, addr) == 4);
const _: () = assert!(mem::offset_of!(RawTocEntry, data_mode) == 8);
const _: () = assert!(mem::offset_of!(RawSubChannel, index) == 4);
const _: () = assert!(mem::offset_of!(RawSubChannel, absolute_addr) == 8);
const _: () = assert!(mem::offset_of!(RawSubChannel, relative_addr) == 12);
const _: () = assert!(mem::offset_of!(RawDvdLayer, start_sector) == 8);
const _: () = assert!(mem::offset_of!(RawDvdLayer, end_sector) == 12);
const _: () = assert!(mem::offset_of!(RawDvdLayer, end_sector_l0) == 16);
const _: () = assert!(mem::offset_of!(RawDvdPhysical, layer) == 4);

/// Splits a byte holding two 4-bit bitfields into (first declared, second declared).
#[cfg(target_endian = "little")]
fn split_nibbles(byte: u8) -> (u8, u8) {
    (byte & 0xF, byte >> 4)
}

#[cfg(target_endian = "big")]
fn split_nibbles(byte: u8) -> (u8, u8) {
    (byte >> 4, byte & 0xF)
}

/// Extracts (track_path, nlayers) from the third bitfield byte of `struct dvd_layer`,
/// which holds layer_type:4, track_path:1 and nlayers:2 in declaration order.
#[cfg(target_endian = "little")]
fn split_layer_bits(byte: u8) -> (u8, u8) {
    ((byte >> 4) & 0x1, (byte >> 5) & 0x3)
}

#[cfg(target_endian = "big")]
fn split_layer_bits(byte: u8) -> (u8, u8) {
    ((byte >> 3) & 0x1, (byte >> 1) & 0x3)
}

/// Reads the MSF address held in the first three bytes of a `union cdrom_addr`.
fn addr_to_msf(addr: i32) -> Msf {
    let bytes = addr.to_ne_bytes();
    Msf::new(bytes[0], bytes[1], bytes[2])
}

/// Opens CD-ROM device nodes through the kernel's CD-ROM driver.
pub struct LinuxBackend;

impl CdromBackend for LinuxBackend {

    type Device = LinuxCdromDevice;

    fn open(&self, path: &Path) -> io::Result<LinuxCdromDevice> {
        LinuxCdromDevice::open(path)
    }
}

/// This struct owns an open CD-ROM device node. The descriptor is closed on drop.
pub struct LinuxCdromDevice {
    file: File,
}

impl LinuxCdromDevice {

    /// Opens the device read-only. `O_NONBLOCK` lets the open succeed on an empty drive.
    pub fn open(path: &Path) -> io::Result<Self> {

        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)?;

        Ok(LinuxCdromDevice { file })
    }

    /// Issues an ioctl whose argument is a pointer to `arg`.
    fn ioctl<T>(&self, request: u32, arg: &mut T) -> io::Result<i32> {

        // SAFETY: the descriptor is owned by `self.file` and stays open for the call, and
        // `arg` is a live, exclusively borrowed `#[repr(C)]` mirror of the structure the
        // kernel expects for `request`.
        let ret = unsafe {
            libc::ioctl(self.file.as_raw_fd(), request as _, arg as *mut T)
        };

        if ret == -1 {
            Err(io::Error::last_os_error())
        } else {
            Ok(ret)
        }
    }
}

impl CdromDevice for LinuxCdromDevice {

    fn read_dvd_layer(&self, layer_num: u8) -> io::Result<DvdLayer> {

        let mut request = RawDvdStruct {
            physical: RawDvdPhysical {
                kind: DVD_STRUCT_PHYSICAL,
                layer_num,
                ..RawDvdPhysical::default()
            },
            padding: [0; DVD_STRUCT_SIZE - mem::size_of::<RawDvdPhysical>()],
        };
        self.ioctl(DVD_READ_STRUCT, &mut request)?;

        // The kernel fills in the descriptor slot matching the requested layer.
        let raw = request
            .physical
            .layer
            .get(layer_num as usize)
            .copied()
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EINVAL))?;

        let (track_path, layer_count) = split_layer_bits(raw.bitfields[2]);

        Ok(DvdLayer {
            layer_count,
            track_path: if track_path == 0 { TrackPath::Parallel } else { TrackPath::Opposite },
            start_sector: raw.start_sector,
            end_sector: raw.end_sector,
            end_sector_l0: raw.end_sector_l0,
        })
    }

    fn read_toc_header(&self) -> io::Result<TocHeader> {

        let mut header = RawTocHeader::default();
        self.ioctl(CDROMREADTOCHDR, &mut header)?;

        Ok(TocHeader {
            first_track: header.first_track,
            last_track: header.last_track,
        })
    }

    fn read_toc_entry(&self, track_number: u8) -> io::Result<TocEntry> {

        let mut entry = RawTocEntry {
            track: track_number,
            format: CDROM_LBA,
            ..RawTocEntry::default()
        };
        self.ioctl(CDROMREADTOCENTRY, &mut entry)?;

        let (adr, control) = split_nibbles(entry.adr_ctrl);

        Ok(TocEntry {
            lba: entry.addr as u32,
            track_number: entry.track,
            adr,
            control,
        })
    }

    fn read_at(&self, buffer: &mut [u8], offset: u64) -> io::Result<usize> {
        self.file.read_at(buffer, offset)
    }

    fn read_raw_frame(&self, msf: Msf, frame: &mut RawFrame) -> io::Result<()> {

        let mut data = RawReadBuffer([0; SECTOR_SIZE_2352]);
        data.0[0] = msf.minute;
        data.0[1] = msf.second;
        data.0[2] = msf.frame;

        self.ioctl(CDROMREADRAW, &mut data)?;
        frame.copy_from_slice(&data.0);

        Ok(())
    }

    fn read_sub_channel(&self) -> io::Result<SubQ> {

        let mut sub_channel = RawSubChannel {
            format: CDROM_MSF,
            ..RawSubChannel::default()
        };
        self.ioctl(CDROMSUBCHNL, &mut sub_channel)?;

        let (adr, control) = split_nibbles(sub_channel.adr_ctrl);

        Ok(SubQ {
            adr,
            control,
            track_number: sub_channel.track,
            track_index: sub_channel.index,
            absolute: addr_to_msf(sub_channel.absolute_addr),
            relative: addr_to_msf(sub_channel.relative_addr),
        })
    }

    fn drive_status(&self, slot: DriveSlot) -> io::Result<DriveStatus> {

        // SAFETY: the descriptor is owned by `self.file` and stays open for the call.
        // CDROM_DRIVE_STATUS takes its slot argument by value.
        let ret = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                CDROM_DRIVE_STATUS as _,
                slot.raw() as libc::c_int,
            )
        };

        if ret == -1 {
            Err(io::Error::last_os_error())
        } else {
            Ok(DriveStatus::from_raw(ret))
        }
    }
}
