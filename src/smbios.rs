use alloc::string::{String, ToString};

use crate::strings::bounded_format;

pub const TYPE_BIOS_INFORMATION: u8 = 0;
pub const TYPE_PROCESSOR_INFORMATION: u8 = 4;
pub const TYPE_MEMORY_DEVICE: u8 = 17;
pub const TYPE_MEMORY_ARRAY_MAPPED_ADDRESS: u8 = 19;
pub const TYPE_END_OF_TABLE: u8 = 127;

const HEADER_LEN: usize = 4;

/// Locates the structure table from an entry point structure. Returns the
/// table's physical address and length in bytes.
pub fn parse_entry_point(entry: &[u8]) -> Option<(u64, usize)> {
    if entry.starts_with(b"_SM3_") {
        let max_size = u32::from_le_bytes(entry.get(0x0C..0x10)?.try_into().ok()?);
        let address = u64::from_le_bytes(entry.get(0x10..0x18)?.try_into().ok()?);
        Some((address, max_size as usize))
    } else if entry.starts_with(b"_SM_") {
        let length = u16::from_le_bytes(entry.get(0x16..0x18)?.try_into().ok()?);
        let address = u32::from_le_bytes(entry.get(0x18..0x1C)?.try_into().ok()?);
        Some((address as u64, length as usize))
    } else {
        None
    }
}

/// One structure: its formatted area and the string set that follows it.
#[derive(Debug, Clone, Copy)]
pub struct Structure<'a> {
    pub kind: u8,
    pub handle: u16,
    formatted: &'a [u8],
    strings: &'a [u8],
}

impl<'a> Structure<'a> {
    pub fn byte(&self, offset: usize) -> Option<u8> {
        self.formatted.get(offset).copied()
    }

    pub fn word(&self, offset: usize) -> Option<u16> {
        let bytes = self.formatted.get(offset..offset + 2)?;
        Some(u16::from_le_bytes(bytes.try_into().ok()?))
    }

    pub fn dword(&self, offset: usize) -> Option<u32> {
        let bytes = self.formatted.get(offset..offset + 4)?;
        Some(u32::from_le_bytes(bytes.try_into().ok()?))
    }

    pub fn qword(&self, offset: usize) -> Option<u64> {
        let bytes = self.formatted.get(offset..offset + 8)?;
        Some(u64::from_le_bytes(bytes.try_into().ok()?))
    }

    /// String `number` (1-based) from the string set. Number 0 means "none".
    pub fn string(&self, number: u8) -> Option<&'a str> {
        if number == 0 {
            return None;
        }
        let raw = self
            .strings
            .split(|&b| b == 0)
            .take_while(|s| !s.is_empty())
            .nth(number as usize - 1)?;
        core::str::from_utf8(raw).ok()
    }

    /// The string referenced by the byte at `offset`.
    pub fn string_at(&self, offset: usize) -> Option<&'a str> {
        self.string(self.byte(offset)?)
    }
}

/// Iterator over the structures of a table; stops at the end-of-table
/// marker or the first malformed header.
pub struct Structures<'a> {
    rest: &'a [u8],
}

pub fn structures(table: &[u8]) -> Structures<'_> {
    Structures { rest: table }
}

impl<'a> Iterator for Structures<'a> {
    type Item = Structure<'a>;

    fn next(&mut self) -> Option<Structure<'a>> {
        let data = self.rest;
        if data.len() < HEADER_LEN {
            return None;
        }
        let kind = data[0];
        let length = data[1] as usize;
        if length < HEADER_LEN || length > data.len() {
            self.rest = &[];
            return None;
        }
        let handle = u16::from_le_bytes([data[2], data[3]]);
        let tail = &data[length..];
        // The string set ends with a double NUL, which is also what an empty
        // set looks like.
        let end = tail.windows(2).position(|w| w[0] == 0 && w[1] == 0).map(|p| p + 2);
        let Some(end) = end else {
            self.rest = &[];
            return None;
        };
        self.rest = if kind == TYPE_END_OF_TABLE { &[] } else { &tail[end..] };
        Some(Structure {
            kind,
            handle,
            formatted: &data[..length],
            strings: &tail[..end],
        })
    }
}

pub fn of_type(table: &[u8], kind: u8) -> impl Iterator<Item = Structure<'_>> {
    structures(table).filter(move |s| s.kind == kind)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BiosInfo {
    pub vendor: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuInfo {
    pub manufacturer: Option<String>,
    pub version: Option<String>,
    pub speed_mhz: u16,
    pub socket_count: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimmInfo {
    pub manufacturer: Option<String>,
    pub serial_number: Option<String>,
    pub speed_mts: u16,
    pub size_mb: u64,
    pub count: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmbiosSummary {
    pub bios: BiosInfo,
    pub cpu: CpuInfo,
    pub dimm: DimmInfo,
}

impl SmbiosSummary {
    pub fn from_table(table: &[u8]) -> Self {
        Self {
            bios: bios_info(table),
            cpu: cpu_info(table),
            dimm: dimm_info(table),
        }
    }
}

fn owned(s: Option<&str>) -> Option<String> {
    s.map(ToString::to_string)
}

pub fn bios_info(table: &[u8]) -> BiosInfo {
    let Some(bios) = of_type(table, TYPE_BIOS_INFORMATION).next() else {
        return BiosInfo::default();
    };
    BiosInfo {
        vendor: owned(bios.string_at(0x04)),
        version: owned(bios.string_at(0x05)),
    }
}

/// Sockets with a zero core count are empty and skipped. Tables older than
/// SMBIOS 2.5 have no core count field; those sockets are counted.
pub fn cpu_info(table: &[u8]) -> CpuInfo {
    let mut info = CpuInfo::default();
    for cpu in of_type(table, TYPE_PROCESSOR_INFORMATION) {
        if cpu.byte(0x23).unwrap_or(1) == 0 {
            continue;
        }
        if info.manufacturer.is_none() {
            info.manufacturer = owned(cpu.string_at(0x07));
        }
        if info.version.is_none() {
            info.version = owned(cpu.string_at(0x10));
        }
        if info.speed_mhz == 0 {
            info.speed_mhz = cpu.word(0x16).unwrap_or(0);
        }
        info.socket_count = info.socket_count.saturating_add(1);
    }
    info
}

const SIZE_UNKNOWN: u16 = 0xFFFF;
const SIZE_EXTENDED: u16 = 0x7FFF;
const SIZE_IN_KIB: u16 = 1 << 15;

pub fn dimm_info(table: &[u8]) -> DimmInfo {
    let mut info = DimmInfo::default();
    let mut size: u16 = 0;
    let mut extended: u32 = 0;
    for dimm in of_type(table, TYPE_MEMORY_DEVICE) {
        let this_size = dimm.word(0x0C).unwrap_or(0);
        if this_size == 0 {
            continue;
        }
        if info.manufacturer.is_none() {
            info.manufacturer = owned(dimm.string_at(0x17));
        }
        if info.serial_number.is_none() {
            info.serial_number = owned(dimm.string_at(0x18));
        }
        if info.speed_mts == 0 {
            info.speed_mts = dimm.word(0x20).unwrap_or(0);
        }
        if size == 0 {
            size = this_size;
        }
        if extended == 0 {
            extended = dimm.dword(0x1C).unwrap_or(0);
        }
        info.count = info.count.saturating_add(1);
    }

    info.size_mb = match size {
        0 | SIZE_UNKNOWN => mapped_megabytes(table),
        SIZE_EXTENDED => (extended & !(1 << 31)) as u64,
        s if s & SIZE_IN_KIB != 0 => ((s & !SIZE_IN_KIB) >> 10) as u64,
        s => s as u64,
    };
    info
}

/// Total of all type 19 address ranges, in megabytes.
fn mapped_megabytes(table: &[u8]) -> u64 {
    of_type(table, TYPE_MEMORY_ARRAY_MAPPED_ADDRESS)
        .map(|range| {
            let start = range.dword(0x04).unwrap_or(0);
            if start != u32::MAX {
                let end = range.dword(0x08).unwrap_or(0);
                (end as u64).wrapping_sub(start as u64).wrapping_add(1) >> 10
            } else {
                let start = range.qword(0x0F).unwrap_or(0);
                let end = range.qword(0x17).unwrap_or(0);
                end.wrapping_sub(start).wrapping_add(1) >> 20
            }
        })
        .fold(0u64, u64::wrapping_add)
}

pub fn speed_text(mhz: u16) -> String {
    bounded_format(16, format_args!("{}MHz", mhz))
}

/// Fits the ten-byte cell the memory table reserves for the size.
pub fn dimm_size_text(megabytes: u64) -> String {
    bounded_format(10, format_args!("{}MB ", megabytes))
}

pub fn dimm_speed_text(mts: u16) -> String {
    bounded_format(16, format_args!("{}MT/s", mts))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::vec::Vec;

    /// Builds one structure from its formatted bytes (header excluded) and
    /// strings.
    pub(crate) fn structure(kind: u8, handle: u16, body: &[u8], strings: &[&str]) -> Vec<u8> {
        let mut out = vec![kind, (HEADER_LEN + body.len()) as u8];
        out.extend_from_slice(&handle.to_le_bytes());
        out.extend_from_slice(body);
        if strings.is_empty() {
            out.extend_from_slice(&[0, 0]);
        } else {
            for s in strings {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
            out.push(0);
        }
        out
    }

    fn body(len: usize, fields: &[(usize, &[u8])]) -> Vec<u8> {
        let mut b = vec![0u8; len - HEADER_LEN];
        for (offset, bytes) in fields {
            let at = offset - HEADER_LEN;
            b[at..at + bytes.len()].copy_from_slice(bytes);
        }
        b
    }

    pub(crate) fn bios(vendor: &str, version: &str) -> Vec<u8> {
        let fields: [(usize, &[u8]); 2] = [(0x04, &[1]), (0x05, &[2])];
        structure(0, 0, &body(0x12, &fields), &[vendor, version])
    }

    pub(crate) fn cpu(cores: u8, speed: u16, manufacturer: &str, version: &str) -> Vec<u8> {
        let fields: [(usize, &[u8]); 4] = [
            (0x07, &[1]),
            (0x10, &[2]),
            (0x16, &speed.to_le_bytes()),
            (0x23, &[cores]),
        ];
        structure(4, 0x400, &body(0x2A, &fields), &[manufacturer, version])
    }

    pub(crate) fn dimm(size: u16, extended: u32, speed: u16, manufacturer: &str, serial: Option<&str>) -> Vec<u8> {
        let mut strings = vec![manufacturer];
        let serial_index = match serial {
            Some(s) => {
                strings.push(s);
                2
            }
            None => 0,
        };
        let fields: [(usize, &[u8]); 5] = [
            (0x0C, &size.to_le_bytes()),
            (0x17, &[1]),
            (0x18, &[serial_index]),
            (0x1C, &extended.to_le_bytes()),
            (0x20, &speed.to_le_bytes()),
        ];
        structure(17, 0x1100, &body(0x28, &fields), &strings)
    }

    fn mapped(start: u32, end: u32, ext: Option<(u64, u64)>) -> Vec<u8> {
        let (xs, xe) = ext.unwrap_or((0, 0));
        let fields: [(usize, &[u8]); 4] = [
            (0x04, &start.to_le_bytes()),
            (0x08, &end.to_le_bytes()),
            (0x0F, &xs.to_le_bytes()),
            (0x17, &xe.to_le_bytes()),
        ];
        structure(19, 0x1300, &body(0x1F, &fields), &[])
    }

    pub(crate) fn end() -> Vec<u8> {
        structure(TYPE_END_OF_TABLE, 0xFFFF, &[], &[])
    }

    fn table(parts: &[Vec<u8>]) -> Vec<u8> {
        parts.concat()
    }

    #[test]
    fn walker_reads_strings_and_stops_at_end_marker() {
        let t = table(&[bios("EDK II", "1.0"), end(), bios("after", "end")]);
        let all: Vec<_> = structures(&t).collect();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].string(1), Some("EDK II"));
        assert_eq!(all[0].string(2), Some("1.0"));
        assert_eq!(all[0].string(3), None);
        assert_eq!(all[0].string(0), None);
        assert_eq!(all[1].kind, TYPE_END_OF_TABLE);
    }

    #[test]
    fn truncated_table_ends_iteration() {
        let mut t = bios("EDK II", "1.0");
        t.truncate(t.len() - 3);
        assert_eq!(structures(&t).count(), 0);
        assert_eq!(structures(&[0, 2, 0, 0, 0, 0]).count(), 0);
    }

    #[test]
    fn bios_info_takes_vendor_and_version() {
        let t = table(&[bios("EDK II", "unknown"), end()]);
        let info = bios_info(&t);
        assert_eq!(info.vendor.as_deref(), Some("EDK II"));
        assert_eq!(info.version.as_deref(), Some("unknown"));
        assert_eq!(bios_info(&end()), BiosInfo::default());
    }

    #[test]
    fn empty_sockets_are_skipped() {
        let t = table(&[
            cpu(0, 9999, "Ghost", "None"),
            cpu(4, 2400, "QEMU", "pc-q35"),
            cpu(4, 3000, "Other", "Later"),
            end(),
        ]);
        let info = cpu_info(&t);
        assert_eq!(info.manufacturer.as_deref(), Some("QEMU"));
        assert_eq!(info.version.as_deref(), Some("pc-q35"));
        assert_eq!(info.speed_mhz, 2400);
        assert_eq!(info.socket_count, 2);
        assert_eq!(speed_text(info.speed_mhz), "2400MHz");
    }

    #[test]
    fn dimm_size_rules() {
        let plain = table(&[dimm(0, 0, 0, "none", None), dimm(8192, 0, 3200, "Acme", None), end()]);
        let info = dimm_info(&plain);
        assert_eq!(info.count, 1);
        assert_eq!(info.size_mb, 8192);
        assert_eq!(info.serial_number, None);
        assert_eq!(dimm_size_text(info.size_mb), "8192MB ");
        assert_eq!(dimm_speed_text(info.speed_mts), "3200MT/s");

        let kib = table(&[dimm(0x8000 | 2048, 0, 0, "Acme", Some("SN1")), end()]);
        assert_eq!(dimm_info(&kib).size_mb, 2);
        assert_eq!(dimm_info(&kib).serial_number.as_deref(), Some("SN1"));

        let extended = table(&[dimm(0x7FFF, (1 << 31) | 65536, 0, "Acme", None), end()]);
        assert_eq!(dimm_info(&extended).size_mb, 65536);
    }

    #[test]
    fn unknown_dimm_size_falls_back_to_mapped_ranges() {
        let t = table(&[
            dimm(0xFFFF, 0, 0, "Acme", None),
            mapped(0, 0x3F_FFFF, None),
            mapped(u32::MAX, u32::MAX, Some((0x1_0000_0000, 0x1_3FFF_FFFF))),
            end(),
        ]);
        assert_eq!(dimm_info(&t).size_mb, 4096 + 1024);
    }

    #[test]
    fn size_text_fits_a_ten_byte_cell() {
        assert_eq!(dimm_size_text(123_456_789), "123456789");
    }

    #[test]
    fn entry_points_of_both_generations() {
        let mut v3 = vec![0u8; 0x18];
        v3[..5].copy_from_slice(b"_SM3_");
        v3[0x0C..0x10].copy_from_slice(&0x1234u32.to_le_bytes());
        v3[0x10..0x18].copy_from_slice(&0xDEAD_0000u64.to_le_bytes());
        assert_eq!(parse_entry_point(&v3), Some((0xDEAD_0000, 0x1234)));

        let mut v2 = vec![0u8; 0x1F];
        v2[..4].copy_from_slice(b"_SM_");
        v2[0x16..0x18].copy_from_slice(&0x200u16.to_le_bytes());
        v2[0x18..0x1C].copy_from_slice(&0xF0000u32.to_le_bytes());
        assert_eq!(parse_entry_point(&v2), Some((0xF0000, 0x200)));

        assert_eq!(parse_entry_point(b"nothing here"), None);
    }
}
