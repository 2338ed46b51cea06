//! DFU status codes and poll timeouts

use crate::config::{ERASE_SETTLE_MS, PROGRAM_BUDGET_MS, SCAN_BUDGET_MS, VERIFY_BUDGET_MS};

/// Outcome of a DFU callback, reported as `bStatus`
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfuStatus {
    /// No error condition is present.
    Ok = 0x00,
    /// File is for this device but fails some vendor-specific verification test.
    ErrFile = 0x02,
    /// Programmed memory failed verification.
    ErrVerify = 0x07,
    /// Cannot program memory due to received address that is out of range.
    ErrAddress = 0x08,
    /// Something went wrong, but the device does not know what it was.
    ErrUnknown = 0x0E,
}

impl DfuStatus {
    /// USB DFU 1.1 `bStatus` code
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether this is `Ok`
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl core::fmt::Display for DfuStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::ErrFile => "errFILE",
            Self::ErrVerify => "errVERIFY",
            Self::ErrAddress => "errADDRESS",
            Self::ErrUnknown => "errUNKNOWN",
        };
        f.write_str(name)
    }
}

/// DFU device states the USB stack asks a poll timeout for
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfuPhase {
    /// Waiting for requests in DFU mode
    DfuIdle = 2,
    /// Block received, waiting for `DFU_GETSTATUS`
    DnloadSync = 3,
    /// Programming a block
    DnBusy = 4,
    /// Expecting more `DFU_DNLOAD` requests
    DnloadIdle = 5,
    /// Final block received, waiting for `DFU_GETSTATUS`
    ManifestSync = 6,
    /// Manifestation in progress
    Manifest = 7,
    /// Expecting more `DFU_UPLOAD` requests
    UploadIdle = 9,
    /// Waiting for `DFU_CLRSTATUS`
    Error = 10,
}

/// `bwPollTimeout` to advertise before entering `phase`
///
/// A busy download block may erase one sector, program a full block with
/// single-word writes and scan or compare it. Manifestation may also have to
/// finish that work before the read-back checksum.
pub const fn poll_timeout_ms(phase: DfuPhase) -> u32 {
    const BUSY: u32 = ERASE_SETTLE_MS + PROGRAM_BUDGET_MS + SCAN_BUDGET_MS;

    match phase {
        DfuPhase::DnBusy => BUSY,
        DfuPhase::Manifest => BUSY + VERIFY_BUDGET_MS,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(DfuStatus::Ok.code(), 0x00);
        assert_eq!(DfuStatus::ErrFile.code(), 0x02);
        assert_eq!(DfuStatus::ErrVerify.code(), 0x07);
        assert_eq!(DfuStatus::ErrAddress.code(), 0x08);
        assert_eq!(DfuStatus::ErrUnknown.code(), 0x0E);
    }

    #[test]
    fn test_poll_timeouts() {
        let busy = poll_timeout_ms(DfuPhase::DnBusy);
        assert_eq!(busy, ERASE_SETTLE_MS + PROGRAM_BUDGET_MS + SCAN_BUDGET_MS);
        assert_eq!(poll_timeout_ms(DfuPhase::Manifest), busy + VERIFY_BUDGET_MS);

        for phase in [
            DfuPhase::DfuIdle,
            DfuPhase::DnloadSync,
            DfuPhase::DnloadIdle,
            DfuPhase::ManifestSync,
            DfuPhase::UploadIdle,
            DfuPhase::Error,
        ] {
            assert_eq!(poll_timeout_ms(phase), 0);
        }
    }
}
