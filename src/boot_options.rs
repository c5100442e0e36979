use alloc::string::String;
use alloc::vec::Vec;

use crate::strings::{bounded_format, decode_ucs2};

pub const LOAD_OPTION_ACTIVE: u32 = 0x0000_0001;
pub const LOAD_OPTION_HIDDEN: u32 = 0x0000_0008;

/// Room for the button label, including its terminator.
const BUTTON_TEXT_CAPACITY: usize = 256 + 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOption {
    pub number: u16,
    pub attributes: u32,
    pub description: String,
    pub file_path: Vec<u8>,
    pub optional_data: Vec<u8>,
}

impl LoadOption {
    /// Parses an `EFI_LOAD_OPTION` variable body.
    pub fn parse(number: u16, bytes: &[u8]) -> Option<Self> {
        let attributes = u32::from_le_bytes(bytes.get(0..4)?.try_into().ok()?);
        let path_len = u16::from_le_bytes(bytes.get(4..6)?.try_into().ok()?) as usize;

        let rest = bytes.get(6..)?;
        let mut units = Vec::new();
        let mut consumed = None;
        for (i, pair) in rest.chunks_exact(2).enumerate() {
            let unit = u16::from_le_bytes([pair[0], pair[1]]);
            if unit == 0 {
                consumed = Some((i + 1) * 2);
                break;
            }
            units.push(unit);
        }
        let consumed = consumed?;

        let after = rest.get(consumed..)?;
        let file_path = after.get(..path_len)?.to_vec();
        let optional_data = after[path_len..].to_vec();
        Some(Self {
            number,
            attributes,
            description: decode_ucs2(&units),
            file_path,
            optional_data,
        })
    }

    pub fn variable_name(number: u16) -> String {
        bounded_format(9, format_args!("Boot{:04X}", number))
    }

    pub fn is_active(&self) -> bool {
        self.attributes & LOAD_OPTION_ACTIVE != 0
    }

    pub fn is_hidden(&self) -> bool {
        self.attributes & LOAD_OPTION_HIDDEN != 0
    }

    pub fn button_text(&self) -> String {
        bounded_format(BUTTON_TEXT_CAPACITY, format_args!("BootOption: {}", self.description))
    }
}

/// `BootOrder` is a packed array of little-endian option numbers.
pub fn parse_boot_order(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Reads every option named in `order`, skipping ones that are missing or
/// malformed. `read` returns the raw `Boot####` variable.
pub fn collect_options<F>(order: &[u16], mut read: F) -> Vec<LoadOption>
where
    F: FnMut(u16) -> Option<Vec<u8>>,
{
    let mut options = Vec::with_capacity(order.len());
    for &number in order {
        let Some(bytes) = read(number) else {
            log::debug!("Boot{:04X} is missing", number);
            continue;
        };
        match LoadOption::parse(number, &bytes) {
            Some(option) => options.push(option),
            None => log::warn!("Boot{:04X} is malformed", number),
        }
    }
    options
}

/// Orders options by their position in `order`; unlisted options go last.
pub fn sort_by_boot_order(options: &mut [LoadOption], order: &[u16]) {
    options.sort_by_key(|o| order.iter().position(|&n| n == o.number).unwrap_or(usize::MAX));
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::vec;

    pub(crate) fn encode(attributes: u32, description: &str, path: &[u8], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&attributes.to_le_bytes());
        out.extend_from_slice(&(path.len() as u16).to_le_bytes());
        for unit in description.encode_utf16().chain([0]) {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out.extend_from_slice(path);
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn parses_a_load_option() {
        let raw = encode(LOAD_OPTION_ACTIVE, "Linux", &[0x7F, 0xFF, 0x04, 0x00], b"args");
        let option = LoadOption::parse(3, &raw).unwrap();
        assert_eq!(option.number, 3);
        assert_eq!(option.description, "Linux");
        assert_eq!(option.file_path, [0x7F, 0xFF, 0x04, 0x00]);
        assert_eq!(option.optional_data, b"args");
        assert!(option.is_active());
        assert!(!option.is_hidden());
        assert_eq!(option.button_text(), "BootOption: Linux");
    }

    #[test]
    fn rejects_truncated_options() {
        let raw = encode(LOAD_OPTION_ACTIVE, "Linux", &[0x7F, 0xFF, 0x04, 0x00], &[]);
        assert!(LoadOption::parse(0, &raw[..raw.len() - 1]).is_none());
        assert!(LoadOption::parse(0, &raw[..5]).is_none());
        // Description without a terminator.
        assert!(LoadOption::parse(0, &raw[..10]).is_none());
    }

    #[test]
    fn variable_names_are_upper_hex() {
        assert_eq!(LoadOption::variable_name(0x00AB), "Boot00AB");
    }

    #[test]
    fn options_follow_boot_order_and_skip_bad_entries() {
        let order = parse_boot_order(&[2, 0, 0, 0, 7, 0, 1]);
        assert_eq!(order, [2, 0, 7]);

        let options = collect_options(&order, |n| match n {
            0 => Some(encode(LOAD_OPTION_ACTIVE, "Shell", &[], &[])),
            2 => Some(encode(LOAD_OPTION_ACTIVE, "Disk", &[], &[])),
            7 => Some(vec![1, 2, 3]),
            _ => None,
        });
        let names: Vec<_> = options.iter().map(|o| o.description.as_str()).collect();
        assert_eq!(names, ["Disk", "Shell"]);
    }

    #[test]
    fn sort_puts_unlisted_options_last() {
        let mut options: Vec<_> = [5u16, 1, 9]
            .iter()
            .map(|&n| LoadOption::parse(n, &encode(0, "x", &[], &[])).unwrap())
            .collect();
        sort_by_boot_order(&mut options, &[1, 5]);
        let numbers: Vec<_> = options.iter().map(|o| o.number).collect();
        assert_eq!(numbers, [1, 5, 9]);
    }

    #[test]
    fn long_descriptions_are_cut_to_the_button_capacity() {
        let raw = encode(LOAD_OPTION_ACTIVE, &"d".repeat(400), &[], &[]);
        let option = LoadOption::parse(1, &raw).unwrap();
        assert_eq!(option.button_text().len(), 256);
    }
}
