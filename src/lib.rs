//! ViceBIOS setup utility: a firmware setup GUI for UEFI and the porting
//! layer between its widget toolkit and boot services.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod boot_options;
pub mod config;
pub mod error;
pub mod exit;
pub mod firmware;
pub mod gui;
pub mod memory;
pub mod session;
pub mod smbios;
pub mod strings;
pub mod views;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{Session, SessionState};
