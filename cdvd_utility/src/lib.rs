// SPDX-License-Identifier: GPL-3.0
// lib.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

// This crate contains CD addressing helpers that can be used throughout the codebase.

/// Size in bytes of a user-data sector in 2048-byte (cooked) mode.
pub const SECTOR_SIZE_2048: usize = 2048;

/// Size in bytes of a whole raw frame as read in 2352-byte mode.
pub const SECTOR_SIZE_2352: usize = 2352;

/// Number of frames (sectors) in one second of CD time.
pub const FRAMES_PER_SECOND: u32 = 75;

/// Number of seconds in one minute of CD time.
pub const SECONDS_PER_MINUTE: u32 = 60;

/// Number of frames in one minute of CD time.
pub const FRAMES_PER_MINUTE: u32 = FRAMES_PER_SECOND * SECONDS_PER_MINUTE;

/// LBA 0 sits two seconds into the disc, after the pregap.
pub const PREGAP_FRAMES: u32 = 2 * FRAMES_PER_SECOND;

/// This struct models a minutes/seconds/frames address, as used by raw reads and the
/// sub-channel Q data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Msf {
    pub minute: u8,
    pub second: u8,
    pub frame: u8,
}

impl Msf {

    /// Creates a new MSF address from its parts.
    pub const fn new(minute: u8, second: u8, frame: u8) -> Self {
        Msf { minute, second, frame }
    }

    /// Converts a logical block address into an MSF address, adding the pregap. Returns
    /// `None` when the address would need more than 255 minutes.
    pub fn from_lba(lba: u32) -> Option<Self> {

        let frames = lba.checked_add(PREGAP_FRAMES)?;
        let minute = u8::try_from(frames / FRAMES_PER_MINUTE).ok()?;

        Some(Msf {
            minute,
            second: ((frames / FRAMES_PER_SECOND) % SECONDS_PER_MINUTE) as u8,
            frame: (frames % FRAMES_PER_SECOND) as u8,
        })
    }

    /// Converts this MSF address back into a logical block address. Addresses inside the
    /// pregap/lead-in come out negative.
    pub fn to_lba(self) -> i32 {

        let frames = self.minute as i32 * FRAMES_PER_MINUTE as i32
            + self.second as i32 * FRAMES_PER_SECOND as i32
            + self.frame as i32;

        frames - PREGAP_FRAMES as i32
    }
}

impl std::fmt::Display for Msf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.minute, self.second, self.frame)
    }
}
