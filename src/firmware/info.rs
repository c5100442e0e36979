use alloc::string::ToString;
use core::slice;

use uefi::mem::memory_map::MemoryMap;
use uefi::{boot, guid, system, Guid};
use uefi_raw::table::boot::MemoryType;

use crate::memory::{MemoryInfo, RegionKind};
use crate::smbios::{parse_entry_point, SmbiosSummary};
use crate::views::{FirmwareSummary, InfoProvider, Logo};

use super::logo::platform_logo;

const SMBIOS3_GUID: Guid = guid!("f2fd1544-9794-4a2c-992e-e5bbcf20e394");
const SMBIOS_GUID: Guid = guid!("eb9d2d31-2d88-11d3-9a16-0090273fc14d");

const SMBIOS3_ENTRY_LEN: usize = 0x18;
const SMBIOS_ENTRY_LEN: usize = 0x1F;

/// The SMBIOS structure table, preferring the 64-bit entry point.
fn smbios_table() -> Option<&'static [u8]> {
    let entry = system::with_config_table(|tables| {
        [SMBIOS3_GUID, SMBIOS_GUID].iter().find_map(|guid| {
            tables
                .iter()
                .find(|t| t.guid == *guid)
                .map(|t| t.address.cast::<u8>())
        })
    })?;
    if entry.is_null() {
        return None;
    }
    // SAFETY: configuration tables stay mapped for the life of boot
    // services; the anchor decides how long the entry point is.
    let anchor = unsafe { slice::from_raw_parts(entry, 5) };
    let len = if anchor == b"_SM3_" {
        SMBIOS3_ENTRY_LEN
    } else {
        SMBIOS_ENTRY_LEN
    };
    let (address, length) = parse_entry_point(unsafe { slice::from_raw_parts(entry, len) })?;
    if address == 0 || length == 0 {
        return None;
    }
    log::debug!("SMBIOS table at {:#x}, {} bytes", address, length);
    Some(unsafe { slice::from_raw_parts(address as usize as *const u8, length) })
}

fn region_kind(ty: MemoryType) -> RegionKind {
    match ty {
        MemoryType::CONVENTIONAL => RegionKind::Free,
        MemoryType::BOOT_SERVICES_CODE | MemoryType::BOOT_SERVICES_DATA => RegionKind::BootServices,
        MemoryType::RUNTIME_SERVICES_CODE | MemoryType::RUNTIME_SERVICES_DATA => RegionKind::Runtime,
        _ => RegionKind::Other,
    }
}

fn memory_info() -> MemoryInfo {
    match boot::memory_map(MemoryType::LOADER_DATA) {
        Ok(map) => MemoryInfo::tally(map.entries().map(|d| (region_kind(d.ty), d.page_count))),
        Err(e) => {
            log::warn!("memory map unavailable: {:?}", e.status());
            MemoryInfo::default()
        }
    }
}

/// System information read straight from the firmware tables.
pub struct FirmwareInfo;

impl InfoProvider for FirmwareInfo {
    fn logo(&mut self) -> Option<Logo> {
        platform_logo()
    }

    fn smbios(&mut self) -> Option<SmbiosSummary> {
        let table = smbios_table();
        if table.is_none() {
            log::info!("no SMBIOS table published");
        }
        table.map(SmbiosSummary::from_table)
    }

    fn firmware(&mut self) -> Option<FirmwareSummary> {
        let revision = system::uefi_revision();
        Some(FirmwareSummary {
            vendor: system::firmware_vendor().to_string(),
            firmware_revision: system::firmware_revision(),
            uefi_revision: (revision.major(), revision.minor()),
            memory: memory_info(),
        })
    }
}
