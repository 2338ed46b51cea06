use vkart_core::crc::crc32;
use vkart_core::dfu::{BridgeState, DfuBridge, DfuPhase, DfuStatus};
use vkart_core::indicator::LedPattern;

use super::*;
use crate::RecordingIndicator;

type Bridge = DfuBridge<EmuBus, RecordingIndicator>;

const BLOCK: usize = 4096;

fn bridge(device_id: u16) -> Bridge {
    DfuBridge::new(small_flash(device_id), RecordingIndicator::new())
}

fn bridge_with(device_id: u16, image: &[u8]) -> Bridge {
    DfuBridge::new(
        small_flash_with(small_config(device_id), image),
        RecordingIndicator::new(),
    )
}

fn download_all(bridge: &mut Bridge, image: &[u8]) {
    for (block, chunk) in image.chunks(BLOCK).enumerate() {
        assert_eq!(bridge.download(block as u16, chunk), DfuStatus::Ok);
    }
}

#[test]
fn test_download_manifest_roundtrip() {
    let mut bridge = bridge(0x22FD);
    let image = pattern(100_000, 11);

    download_all(&mut bridge, &image);
    assert_eq!(bridge.state(), BridgeState::Downloading);
    assert_eq!(bridge.session().offset(), 100_000);

    assert_eq!(bridge.manifest(), DfuStatus::Ok);
    assert_eq!(bridge.state(), BridgeState::Idle);
    assert_eq!(bridge.session().crc(), crc32(&image));

    let written = chip_image(bridge.flash());
    assert_eq!(&written[..image.len()], &image[..]);
    assert_eq!(crc32(&written[..image.len()]), crc32(&image));
    assert_eq!(
        bridge.indicator().history(),
        [LedPattern::Writing, LedPattern::Waiting]
    );
}

#[test]
fn test_manifest_detects_corruption() {
    let mut bridge = bridge(0x22CB);
    let image = pattern(3 * BLOCK, 12);
    download_all(&mut bridge, &image);

    // a word the chip silently failed to program
    bridge.flash().bus_mut().chip_mut().words_mut()[100] ^= 0x0100;

    assert_eq!(bridge.manifest(), DfuStatus::ErrVerify);
    assert_eq!(bridge.state(), BridgeState::Idle);
    assert_eq!(bridge.indicator().current(), Some(LedPattern::Waiting));
}

#[test]
fn test_rewrite_same_image_keeps_sectors() {
    let image = pattern(SMALL_SIZE as usize / 2, 13);
    let mut bridge = bridge_with(0x22CB, &image);

    download_all(&mut bridge, &image);
    assert_eq!(bridge.manifest(), DfuStatus::Ok);

    // boot sectors fit the side buffer and are kept; the 64 KiB sector is rewritten
    assert_eq!(bridge.stats().sectors_kept, 8);
    assert_eq!(bridge.stats().sectors_erased, 1);
    assert_eq!(bridge.flash().bus_mut().chip().erase_count(), 1);
}

#[test]
fn test_odd_download_rejected() {
    let mut bridge = bridge(0x22CB);

    assert_eq!(bridge.download(0, &[1, 2, 3]), DfuStatus::ErrAddress);
    assert_eq!(bridge.state(), BridgeState::Idle);
    assert!(bridge.indicator().history().is_empty());

    assert_eq!(bridge.download(0, &[0; 16]), DfuStatus::Ok);
    assert_eq!(bridge.download(1, &[0; 5]), DfuStatus::ErrAddress);
    assert_eq!(bridge.state(), BridgeState::Downloading);
    assert_eq!(bridge.session().offset(), 16);
}

#[test]
fn test_second_begin_rejected() {
    let mut bridge = bridge(0x22CB);

    assert_eq!(bridge.begin_download(), DfuStatus::Ok);
    assert_eq!(bridge.begin_download(), DfuStatus::ErrUnknown);
    assert_eq!(bridge.begin_upload(), DfuStatus::ErrUnknown);
    assert_eq!(bridge.state(), BridgeState::Downloading);

    // the first transfer is still usable
    assert_eq!(bridge.download(0, &[0x55; 32]), DfuStatus::Ok);
    assert_eq!(bridge.manifest(), DfuStatus::Ok);
}

#[test]
fn test_out_of_sequence_requests() {
    let mut bridge = bridge(0x22CB);

    assert_eq!(bridge.download(3, &[0; 4]), DfuStatus::ErrUnknown);
    assert_eq!(bridge.manifest(), DfuStatus::ErrUnknown);
    assert_eq!(bridge.upload(2, &mut [0; 4]), Err(DfuStatus::ErrUnknown));
    assert_eq!(bridge.state(), BridgeState::Idle);

    assert_eq!(bridge.download(0, &[0; 4]), DfuStatus::Ok);
    assert_eq!(bridge.upload(0, &mut [0; 4]), Err(DfuStatus::ErrUnknown));
    assert_eq!(bridge.state(), BridgeState::Downloading);
}

#[test]
fn test_upload_whole_chip() {
    let image = pattern(SMALL_SIZE as usize, 14);
    let mut bridge = bridge_with(0x22E9, &image);
    let mut out = Vec::new();
    let mut buf = vec![0u8; BLOCK];

    let mut block = 0u16;
    loop {
        let len = bridge.upload(block, &mut buf).unwrap();
        out.extend_from_slice(&buf[..len]);
        block += 1;
        if bridge.state() == BridgeState::Idle {
            break;
        }
        assert_eq!(bridge.state(), BridgeState::Uploading);
    }

    assert_eq!(out, image);
    assert_eq!(block as usize, SMALL_SIZE as usize / BLOCK);
    assert_eq!(
        bridge.indicator().history(),
        [LedPattern::Reading, LedPattern::Waiting]
    );
    assert_eq!(bridge.upload(block, &mut buf), Err(DfuStatus::ErrUnknown));
}

#[test]
fn test_upload_clips_at_capacity() {
    let image = pattern(SMALL_SIZE as usize, 15);
    let mut bridge = bridge_with(0x227E, &image);
    let mut buf = vec![0u8; 0x30000];

    assert_eq!(bridge.upload(0, &mut buf), Ok(0x30000));
    assert_eq!(bridge.upload(1, &mut buf), Ok(0x10000));
    assert_eq!(&buf[..0x10000], &image[0x30000..]);
    assert_eq!(bridge.state(), BridgeState::Idle);
}

#[test]
fn test_odd_upload_rejected() {
    let mut bridge = bridge(0x22CB);
    assert_eq!(bridge.upload(0, &mut [0; 7]), Err(DfuStatus::ErrAddress));
    assert_eq!(bridge.state(), BridgeState::Idle);
}

#[test]
fn test_abort_download() {
    let mut bridge = bridge(0x22FD);
    download_all(&mut bridge, &pattern(2 * BLOCK, 16));

    bridge.abort();
    assert_eq!(bridge.state(), BridgeState::Idle);
    assert_eq!(bridge.indicator().current(), Some(LedPattern::Waiting));

    // a new transfer starts from scratch
    assert_eq!(bridge.download(0, &[0; 8]), DfuStatus::Ok);
    assert_eq!(bridge.session().offset(), 8);

    bridge.abort();
    bridge.abort();
    assert_eq!(bridge.state(), BridgeState::Idle);
}

#[test]
fn test_abort_upload() {
    let mut bridge = bridge(0x22CB);
    assert_eq!(bridge.upload(0, &mut [0; 64]), Ok(64));

    bridge.abort();
    assert_eq!(bridge.state(), BridgeState::Idle);
    assert_eq!(bridge.upload(0, &mut [0; 64]), Ok(64));
    assert_eq!(bridge.session().offset(), 64);
}

#[test]
fn test_download_past_capacity() {
    let mut bridge = bridge(0x22CB);
    let image = pattern(SMALL_SIZE as usize + 3 * BLOCK, 17);

    download_all(&mut bridge, &image);
    assert!(bridge.session().is_stopped());
    assert_eq!(bridge.session().offset(), SMALL_SIZE);
    assert_eq!(bridge.session().crc(), crc32(&image[..SMALL_SIZE as usize]));

    assert_eq!(bridge.manifest(), DfuStatus::Ok);
    assert_eq!(chip_image(bridge.flash()), &image[..SMALL_SIZE as usize]);
}

#[test]
fn test_bus_timeout_reports_unknown() {
    let mut bridge: Bridge = DfuBridge::new(
        small_flash_with(small_config(0x22CB).stuck(), &[]),
        RecordingIndicator::new(),
    );

    assert_eq!(bridge.download(0, &[0; 64]), DfuStatus::ErrUnknown);
    assert_eq!(bridge.state(), BridgeState::Downloading);
    assert_eq!(bridge.session().offset(), 0);

    bridge.abort();
    assert_eq!(bridge.state(), BridgeState::Idle);
}

#[test]
fn test_poll_timeouts() {
    let bridge = bridge(0x22CB);
    let busy = bridge.poll_timeout_ms(DfuPhase::DnBusy);

    assert!(busy >= 900);
    assert!(bridge.poll_timeout_ms(DfuPhase::Manifest) > busy);
    assert_eq!(bridge.poll_timeout_ms(DfuPhase::DnloadIdle), 0);
    assert_eq!(bridge.poll_timeout_ms(DfuPhase::UploadIdle), 0);
}
