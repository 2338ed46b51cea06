//! DFU download and upload commands
//!
//! These play the host side of a DFU session: the image is cut into
//! transfers of `block_size` bytes and handed to the firmware callbacks in
//! order, the way `dfu-util` would drive the real cartridge.

use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use indicatif::ProgressBar;
use vkart_core::dfu::{BridgeState, DfuPhase};

use super::{boot_cartridge, create_progress_bar, save_backing, Cartridge};
use crate::cli::CartridgeArgs;
use crate::error::CliError;

/// Simulated time the cartridge spent waiting on the chip
fn chip_time(cartridge: &mut Cartridge) -> Duration {
    Duration::from_micros(cartridge.flash().bus_mut().elapsed_us())
}

/// Run the download command
pub fn run_download(
    args: &CartridgeArgs,
    input: &Path,
    block_size: usize,
) -> Result<(), Box<dyn Error>> {
    let image = fs::read(input)?;
    println!("Read {} bytes from {:?}", image.len(), input);

    let mut cartridge = boot_cartridge(args)?;
    let capacity = cartridge.flash().profile().total_size as usize;
    if image.len() > capacity {
        log::warn!(
            "Image is {} bytes; only the first {} fit the chip",
            image.len(),
            capacity
        );
    }

    let pb = create_progress_bar(image.len() as u64, "Downloading")?;
    for (block, chunk) in image.chunks(block_size).enumerate() {
        // wBlockNum is 16 bits and wraps on long transfers
        let status = cartridge.download(block as u16, chunk);
        if !status.is_ok() {
            pb.abandon();
            cartridge.abort();
            return Err(CliError::Dfu {
                request: "download",
                block,
                status,
            }
            .into());
        }
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("Download complete");

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!(
        "Manifesting (poll timeout {} ms)...",
        cartridge.poll_timeout_ms(DfuPhase::Manifest)
    ));
    let status = cartridge.manifest();
    spinner.finish_and_clear();
    if !status.is_ok() {
        return Err(CliError::Dfu {
            request: "manifest",
            block: image.chunks(block_size).count(),
            status,
        }
        .into());
    }

    let crc = cartridge.session().crc();
    let written = cartridge.session().offset();
    let stats = *cartridge.stats();
    println!("Verified {} bytes, CRC-32 0x{:08X}", written, crc);
    println!(
        "Sectors: {} erased, {} already blank, {} kept unchanged ({} recovered after a mismatch)",
        stats.sectors_erased, stats.sectors_blank, stats.sectors_kept, stats.recoveries
    );
    println!(
        "{} bytes programmed, {:.1?} of simulated chip time",
        stats.bytes_programmed,
        chip_time(&mut cartridge)
    );

    save_backing(args, &mut cartridge)
}

/// Run the upload command
pub fn run_upload(
    args: &CartridgeArgs,
    output: &Path,
    block_size: usize,
) -> Result<(), Box<dyn Error>> {
    let mut cartridge = boot_cartridge(args)?;
    let capacity = cartridge.flash().profile().total_size as usize;

    let pb = create_progress_bar(capacity as u64, "Uploading")?;
    let mut data = Vec::with_capacity(capacity);
    let mut buf = vec![0u8; block_size];
    let mut block = 0usize;

    loop {
        let len = match cartridge.upload(block as u16, &mut buf) {
            Ok(len) => len,
            Err(status) => {
                pb.abandon();
                cartridge.abort();
                return Err(CliError::Dfu {
                    request: "upload",
                    block,
                    status,
                }
                .into());
            }
        };
        data.extend_from_slice(&buf[..len]);
        pb.inc(len as u64);
        block += 1;

        // the device ends the session once the whole chip was read
        if cartridge.state() == BridgeState::Idle {
            break;
        }
    }
    pb.finish_with_message("Upload complete");

    fs::write(output, &data)?;
    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}
