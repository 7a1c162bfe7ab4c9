// SPDX-License-Identifier: GPL-3.0
// main.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{ffi::OsString, fs, process::ExitCode};

// This file is the core of the basic client - it exists merely as a CLI-based
// program to inspect a physical drive, and optionally dump sectors from it to
// a file.

use cdvd_core::{DiscSource, IoctlSource, SECTOR_SIZE_2048, SECTOR_SIZE_2352};
use clap::Parser;
use log::{error, info};

/// Number of sectors to dump when none is specified.
const DEFAULT_DUMP_COUNT: u32 = 16;

#[derive(Parser)]
#[command(
    version,
    about = "A basic barebones inspector for physical CD/DVD drives",
    long_about = None
)]
struct CdvdArgs {
    #[arg(
        long = "device",
        help = "The CD/DVD device node",
        default_value = "/dev/cdrom",
        id = "Device"
    )]
    device: OsString,

    #[arg(long = "toc", help = "Print the CD table of contents")]
    toc: bool,

    #[arg(long = "subq", help = "Print the current sub-channel Q position")]
    subq: bool,

    #[arg(
        long = "dump",
        help = "An optional file to dump sectors into",
        id = "Dump file"
    )]
    dump: Option<OsString>,

    #[arg(long = "start", help = "First sector to dump", default_value_t = 0)]
    start: u32,

    #[arg(long = "count", help = "Number of sectors to dump", default_value_t = DEFAULT_DUMP_COUNT)]
    count: u32,

    #[arg(long = "raw", help = "Dump raw 2352-byte frames instead of 2048-byte sectors")]
    raw: bool,
}

/// Allocates a zeroed buffer for `count` sectors of the chosen size. Returns `None` if
/// the size overflows or the memory can't be had.
fn dump_buffer(count: u32, raw: bool) -> Option<Vec<u8>> {
    let sector_size = if raw { SECTOR_SIZE_2352 } else { SECTOR_SIZE_2048 };
    let len = usize::try_from(count).ok()?.checked_mul(sector_size)?;

    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).ok()?;
    buffer.resize(len, 0);

    Some(buffer)
}

fn main() -> ExitCode {
    colog::init();
    let cdvd_args = CdvdArgs::parse();

    let mut source = IoctlSource::new(&cdvd_args.device);
    if let Err(err) = source.reopen() {
        error!("{err} (os error code {:?})", err.os_error_code());
        return ExitCode::FAILURE;
    }

    if !source.disc_ready() {
        error!("no readable disc in {}", source.path().display());
        return ExitCode::FAILURE;
    }

    info!(
        "media type {} ({:?}), {} sectors, layer break at {}",
        source.media_type().code(),
        source.media_type(),
        source.sector_count(),
        source.layer_break_address()
    );

    if cdvd_args.toc {
        for entry in source.read_toc() {
            info!(
                "track {:2}: lba {:7}, adr {}, control {:#x}{}",
                entry.track_number,
                entry.lba,
                entry.adr,
                entry.control,
                if entry.is_data() { " (data)" } else { "" }
            );
        }
    }

    if cdvd_args.subq {
        match source.read_track_sub_q() {
            Ok(sub_q) => info!(
                "track {} index {}, relative {}, absolute {}",
                sub_q.track_number, sub_q.track_index, sub_q.relative, sub_q.absolute
            ),
            Err(_) => return ExitCode::FAILURE,
        }
    }

    if let Some(dump_path) = &cdvd_args.dump {
        let Some(mut buffer) = dump_buffer(cdvd_args.count, cdvd_args.raw) else {
            error!("can't allocate a buffer for {} sectors", cdvd_args.count);
            return ExitCode::FAILURE;
        };

        let result = if cdvd_args.raw {
            source.read_sectors_2352(cdvd_args.start, cdvd_args.count, &mut buffer)
        } else {
            source.read_sectors_2048(cdvd_args.start, cdvd_args.count, &mut buffer)
        };
        if result.is_err() {
            return ExitCode::FAILURE;
        }

        if let Err(err) = fs::write(dump_path, &buffer) {
            error!("failed to write {}: {err}", dump_path.to_string_lossy());
            return ExitCode::FAILURE;
        }
        info!("dumped {} sectors to {}", cdvd_args.count, dump_path.to_string_lossy());
    }

    ExitCode::SUCCESS
}
