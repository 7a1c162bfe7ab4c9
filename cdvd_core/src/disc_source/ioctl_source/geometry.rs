// SPDX-License-Identifier: GPL-3.0
// geometry.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use log::{debug, warn};

use crate::{
    cdrom_device::{CdromDevice, TrackPath},
    disc_source::{Geometry, MediaType, TocEntry},
};

/// Track number of the lead-out TOC entry.
const LEAD_OUT_TRACK: u8 = 0xAA;

/// Mask for the 24-bit sector numbers used in DVD physical format descriptors.
const SECTOR_MASK_24: u32 = 0xFFFFFF;

/// Probes the DVD physical format descriptors. This must run before `probe_cd`, because
/// the CD TOC requests also succeed against DVD media.
pub fn probe_dvd(device: &impl CdromDevice) -> Option<Geometry> {

    let layer0 = match device.read_dvd_layer(0) {
        Ok(layer) => layer,
        Err(err) => {
            debug!("DVD layer 0 descriptor unavailable: {err}");
            return None;
        }
    };

    let start = layer0.start_sector;
    let end = layer0.end_sector;

    let geometry = if layer0.layer_count == 0 {

        Geometry {
            sector_count: end.wrapping_sub(start).wrapping_add(1),
            layer_break_address: 0,
            media_type: MediaType::SingleLayer,
        }
    } else {
        match layer0.track_path {

            TrackPath::Parallel => {

                // Layer 1 has its own descriptor, numbered from its own start sector.
                let layer1 = match device.read_dvd_layer(1) {
                    Ok(layer) => layer,
                    Err(err) => {
                        debug!("DVD layer 1 descriptor unavailable: {err}");
                        return None;
                    }
                };

                let layer0_sectors = end.wrapping_sub(start).wrapping_add(1);
                let layer1_sectors = layer1
                    .end_sector
                    .wrapping_sub(layer1.start_sector)
                    .wrapping_add(1);

                Geometry {
                    sector_count: layer0_sectors.wrapping_add(layer1_sectors),
                    layer_break_address: end.wrapping_sub(start),
                    media_type: MediaType::DualLayerParallel,
                }
            },

            TrackPath::Opposite => {

                // Layer 1 counts back down, starting at the bitwise complement of layer 0's
                // last sector, so its extent runs from there to layer 0's end_sector.
                let end_l0 = layer0.end_sector_l0;
                let layer1_start = !end_l0 & SECTOR_MASK_24;

                let layer0_sectors = end_l0.wrapping_sub(start).wrapping_add(1);
                let layer1_sectors = end.wrapping_sub(layer1_start).wrapping_add(1);

                Geometry {
                    sector_count: layer0_sectors.wrapping_add(layer1_sectors),
                    layer_break_address: end_l0.wrapping_sub(start),
                    media_type: MediaType::DualLayerOpposite,
                }
            },
        }
    };

    Some(geometry)
}

/// Probes the CD table of contents, rebuilding `toc` as it goes. Tracks that can't be
/// read are left out; the probe only fails if the header or lead-out can't be read.
/// Once the header has been read the old TOC is gone, even if the lead-out then fails.
pub fn probe_cd(device: &impl CdromDevice, toc: &mut Vec<TocEntry>) -> Option<Geometry> {

    let header = match device.read_toc_header() {
        Ok(header) => header,
        Err(err) => {
            debug!("CD TOC header unavailable: {err}");
            return None;
        }
    };

    toc.clear();
    for track_number in header.first_track..=header.last_track {
        match device.read_toc_entry(track_number) {
            Ok(entry) => toc.push(entry),
            Err(err) => warn!("skipping TOC entry for track {track_number}: {err}"),
        }
    }

    let lead_out = match device.read_toc_entry(LEAD_OUT_TRACK) {
        Ok(entry) => entry,
        Err(err) => {
            debug!("CD lead-out entry unavailable: {err}");
            return None;
        }
    };

    Some(Geometry {
        sector_count: lead_out.lba,
        layer_break_address: 0,
        media_type: MediaType::Cd,
    })
}
