#![cfg(feature = "usb")]

//! Identify the card on the antenna and dump it with the default key.
//!
//! Usage:
//!   cargo run -p libpm3 --example read_card --features usb --release

use anyhow::{Context, bail};
use libpm3::card::classic::MfKey;
use libpm3::card::operations::read_card_by_keys;
use libpm3::constants::MF_DEFAULT_SECTOR_MAX;
use libpm3::{DeviceBuilder, bytes_to_hex_spaced};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut device = DeviceBuilder::new()
        .with_usb()
        .context("no Proxmark3 found on USB")?
        .build()?
        .connect()?;

    let card = device.card_info()?;
    println!("uid  {}", card.uid_hex());
    println!("atqa {}", bytes_to_hex_spaced(&card.atqa()));
    println!("sak  {:02X}", card.sak());
    if card.classic_size().is_none() {
        bail!("not a MIFARE Classic card");
    }

    let report = read_card_by_keys(&mut device, &[MfKey::DEFAULT], MF_DEFAULT_SECTOR_MAX)?;
    for (block, data) in report.data.chunks(16).enumerate() {
        let mark = if report.success[block] { ' ' } else { '!' };
        println!("{:3}{} {}", block, mark, bytes_to_hex_spaced(data));
    }
    for failure in &report.errors {
        eprintln!("{}", failure);
    }

    device.disconnect()?;
    Ok(())
}
