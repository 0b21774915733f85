// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! ENS160 struct implementing basic ENS160 I2C multi-gas sensor operations
//!
//! Operations taken from the [datasheet](https://www.sciosense.com/wp-content/uploads/documents/SC-001224-DS-9-ENS160-Datasheet.pdf)
//! //! **IMPORTANT**
//! Current version 1.0.0 contains measurement and configuration operations, some advanced ones not yet implemented
//! Pending stuff:
//!
//! - [ ] MISR checksum verification of data reads
//! - [ ] Readback of the temperature and humidity used by the algorithm (DATA_T / DATA_RH)
//! - [ ] Custom operating mode via the GPR write registers
//!
//! ## Basic Example
//!
//! Obtaining measurements, eCO2, TVOC and air quality
//!
//!
//!```no_run
//!use ens160_i2c::ens160::Ens160;
//!use std::thread;
//!use std::time::Duration;
//!
//!fn main() {
//!    // Open the I2C device
//!    let mut sensor = Ens160::new().unwrap();
//!    sensor.initialize().unwrap();
//!
//!    loop {
//!        match sensor.poll() {
//!            Ok(m) => {
//!                println!("eCO2: {} ppm TVOC: {} ppb AQI: {:?}", m.eco2, m.tvoc, m.aqi);
//!                thread::sleep(Duration::from_secs(1));
//!            }
//!            Err(e) => {
//!                println!(
//!                    "Error obtaining measurements. More details: {}. Waiting 10 seconds for recovering",
//!                    e
//!                );
//!                thread::sleep(Duration::from_secs(10));
//!            }
//!        }
//!    }
//!}
//!```
//!

/// Struct implementing ENS160 device related operations
pub mod ens160;
