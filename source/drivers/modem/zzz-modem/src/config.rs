// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Device configuration.
//!
//! ```toml
//! policy = "non-blocking"
//!
//! [registers]
//! tx_base = 0x000
//! tx_size = 0x400
//! rx_base = 0x400
//! rx_size = 0x400
//! tx_rp = 0x800
//! tx_wp = 0x804
//! rx_rp = 0x808
//! rx_wp = 0x80c
//! ```
//!
//! Every key is optional; missing ones take the reference modem layout.

use std::fs;
use std::path::Path;

use modem_ring::RegisterMap;
use serde::{Deserialize, Serialize};

use crate::device::Policy;
use crate::Result;

/// Register addresses as they appear in a config file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegisterMapConfig {
    /// TX buffer base offset.
    pub tx_base: u32,
    /// TX buffer size in bytes (power of two).
    pub tx_size: u32,
    /// RX buffer base offset.
    pub rx_base: u32,
    /// RX buffer size in bytes (power of two).
    pub rx_size: u32,
    /// TX read-pointer register.
    pub tx_rp: u32,
    /// TX write-pointer register.
    pub tx_wp: u32,
    /// RX read-pointer register.
    pub rx_rp: u32,
    /// RX write-pointer register.
    pub rx_wp: u32,
}

impl Default for RegisterMapConfig {
    fn default() -> Self {
        RegisterMap::REFERENCE.into()
    }
}

impl From<RegisterMap> for RegisterMapConfig {
    fn from(map: RegisterMap) -> Self {
        Self {
            tx_base: map.tx_base,
            tx_size: map.tx_size,
            rx_base: map.rx_base,
            rx_size: map.rx_size,
            tx_rp: map.tx_rp,
            tx_wp: map.tx_wp,
            rx_rp: map.rx_rp,
            rx_wp: map.rx_wp,
        }
    }
}

impl From<RegisterMapConfig> for RegisterMap {
    fn from(cfg: RegisterMapConfig) -> Self {
        Self {
            tx_base: cfg.tx_base,
            tx_size: cfg.tx_size,
            rx_base: cfg.rx_base,
            rx_size: cfg.rx_size,
            tx_rp: cfg.tx_rp,
            tx_wp: cfg.tx_wp,
            rx_rp: cfg.rx_rp,
            rx_wp: cfg.rx_wp,
        }
    }
}

/// Settings applied when a device is opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Back-pressure policy for both halves.
    pub policy: Policy,
    /// Register layout.
    pub registers: RegisterMapConfig,
}

impl DeviceConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Register layout as used by the ring engines.
    pub fn register_map(&self) -> RegisterMap {
        self.registers.into()
    }
}
