//! "BIOS Info" tab: platform logo plus SMBIOS and firmware tables.

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use uefi::proto::console::gop::BltPixel;

use crate::error::Result;
use crate::gui::widget::{Flow, Size, WidgetId};
use crate::gui::Ui;
use crate::memory::{format_memory_info, MemoryInfo};
use crate::smbios::{dimm_size_text, dimm_speed_text, speed_text, SmbiosSummary};
use crate::strings::bounded_format;

/// Share of the container width each table takes, so two fit side by side.
const TABLE_WIDTH_PCT: u8 = 45;
const CONTAINER_PCT: u8 = 90;

pub struct Logo {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<BltPixel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirmwareSummary {
    pub vendor: String,
    pub firmware_revision: u32,
    pub uefi_revision: (u16, u16),
    pub memory: MemoryInfo,
}

pub trait InfoProvider {
    fn logo(&mut self) -> Option<Logo>;
    fn smbios(&mut self) -> Option<SmbiosSummary>;
    fn firmware(&mut self) -> Option<FirmwareSummary>;
}

#[derive(Debug, Default)]
pub struct InfoView {
    pub logo: Option<WidgetId>,
    pub container: Option<WidgetId>,
    pub tables: Vec<WidgetId>,
}

fn cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn row(key: &str, value: String) -> (String, String) {
    (key.to_string(), value)
}

pub fn bios_rows(summary: &SmbiosSummary) -> Vec<(String, String)> {
    vec![
        row("Vendor", cell(summary.bios.vendor.as_deref())),
        row("Version", cell(summary.bios.version.as_deref())),
    ]
}

pub fn cpu_rows(summary: &SmbiosSummary) -> Vec<(String, String)> {
    let cpu = &summary.cpu;
    vec![
        row("Manufacturer", cell(cpu.manufacturer.as_deref())),
        row("Version", cell(cpu.version.as_deref())),
        row("Speed", speed_text(cpu.speed_mhz)),
        row("SocketCount", cpu.socket_count.to_string()),
    ]
}

pub fn memory_rows(summary: &SmbiosSummary) -> Vec<(String, String)> {
    let dimm = &summary.dimm;
    vec![
        row("Manufacturer", cell(dimm.manufacturer.as_deref())),
        row("DimmSize", dimm_size_text(dimm.size_mb)),
        row(
            "SerialNumber",
            dimm.serial_number.clone().unwrap_or_else(|| "Null SN".to_string()),
        ),
        row("DimmSpeed", dimm_speed_text(dimm.speed_mts)),
        row("DimmCount", dimm.count.to_string()),
    ]
}

pub fn firmware_rows(firmware: &FirmwareSummary) -> Vec<(String, String)> {
    let (major, minor) = firmware.uefi_revision;
    vec![
        row("Vendor", firmware.vendor.clone()),
        row(
            "Revision",
            bounded_format(16, format_args!("0x{:08X}", firmware.firmware_revision)),
        ),
        row("UEFI", bounded_format(16, format_args!("{}.{}", major, minor))),
        row("Memory", format_memory_info(&firmware.memory)),
    ]
}

fn add_table(ui: &mut Ui, parent: WidgetId, title: &str, rows: Vec<(String, String)>) -> Result<WidgetId> {
    let table = ui.add_table(parent, title, rows)?;
    ui.set_size(table, Size::Percent(TABLE_WIDTH_PCT), Size::Content)?;
    Ok(table)
}

pub fn build(ui: &mut Ui, tab: WidgetId, provider: &mut dyn InfoProvider) -> Result<InfoView> {
    let mut view = InfoView::default();
    ui.set_flow(tab, Flow::Column)?;

    if let Some(logo) = provider.logo() {
        view.logo = Some(ui.add_image(tab, logo.width, logo.height, logo.pixels)?);
    }

    let smbios = provider.smbios();
    let firmware = provider.firmware();
    if smbios.is_none() && firmware.is_none() {
        log::info!("no system information available");
        return Ok(view);
    }

    let container = ui.add_container(tab, Flow::ColumnWrap)?;
    ui.set_size(container, Size::Percent(CONTAINER_PCT), Size::Percent(CONTAINER_PCT))?;
    view.container = Some(container);

    if let Some(summary) = smbios {
        view.tables.push(add_table(ui, container, "BIOS Info", bios_rows(&summary))?);
        view.tables.push(add_table(ui, container, "CPU Info", cpu_rows(&summary))?);
        view.tables.push(add_table(ui, container, "Memory Info", memory_rows(&summary))?);
    }
    if let Some(firmware) = firmware {
        view.tables.push(add_table(ui, container, "Firmware", firmware_rows(&firmware))?);
    }
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui::widget::Kind;
    use crate::smbios::{BiosInfo, CpuInfo, DimmInfo};
    use crate::testing::{FakeInfo, Rig};

    fn summary() -> SmbiosSummary {
        SmbiosSummary {
            bios: BiosInfo {
                vendor: Some("EDK II".to_string()),
                version: Some("unknown".to_string()),
            },
            cpu: CpuInfo {
                manufacturer: Some("QEMU".to_string()),
                version: Some("pc-q35".to_string()),
                speed_mhz: 2000,
                socket_count: 1,
            },
            dimm: DimmInfo {
                manufacturer: Some("QEMU".to_string()),
                serial_number: None,
                speed_mts: 0,
                size_mb: 2048,
                count: 1,
            },
        }
    }

    fn table_of(ui: &Ui, id: WidgetId) -> (String, Vec<(String, String)>) {
        match &ui.widget(id).unwrap().kind {
            Kind::Table { title, rows } => (title.clone(), rows.clone()),
            _ => panic!("not a table"),
        }
    }

    #[test]
    fn memory_table_uses_placeholders() {
        let rows = memory_rows(&summary());
        assert_eq!(rows[1], row("DimmSize", "2048MB ".to_string()));
        assert_eq!(rows[2], row("SerialNumber", "Null SN".to_string()));
        assert_eq!(rows[3], row("DimmSpeed", "0MT/s".to_string()));
    }

    #[test]
    fn builds_logo_and_three_smbios_tables() {
        let rig = Rig::new(800, 600);
        let mut ui = rig.ui();
        let root = ui.root();
        let tab = ui.add_container(root, Flow::Column).unwrap();
        let mut provider = FakeInfo {
            logo: Some((4, 2)),
            smbios: Some(summary()),
            firmware: None,
        };
        let view = build(&mut ui, tab, &mut provider).unwrap();

        let logo = view.logo.unwrap();
        assert_eq!(ui.tree().children(tab)[0], logo);
        assert_eq!(view.tables.len(), 3);
        let titles: Vec<_> = view.tables.iter().map(|&t| table_of(&ui, t).0).collect();
        assert_eq!(titles, ["BIOS Info", "CPU Info", "Memory Info"]);
        let (_, cpu) = table_of(&ui, view.tables[1]);
        assert_eq!(cpu[2], row("Speed", "2000MHz".to_string()));
        assert_eq!(cpu[3], row("SocketCount", "1".to_string()));

        ui.handle(0).unwrap();
        let container = ui.widget(view.container.unwrap()).unwrap().area;
        let first = ui.widget(view.tables[0]).unwrap().area;
        assert_eq!(first.w, container.w.saturating_sub(2 * ui.metrics().pad) * 45 / 100);
    }

    #[test]
    fn firmware_table_is_added_when_available() {
        let rig = Rig::new(800, 600);
        let mut ui = rig.ui();
        let root = ui.root();
        let tab = ui.add_container(root, Flow::Column).unwrap();
        let mut provider = FakeInfo {
            logo: None,
            smbios: None,
            firmware: Some(FirmwareSummary {
                vendor: "EDK II".to_string(),
                firmware_revision: 0x10000,
                uefi_revision: (2, 70),
                memory: MemoryInfo::default(),
            }),
        };
        let view = build(&mut ui, tab, &mut provider).unwrap();
        assert!(view.logo.is_none());
        assert_eq!(view.tables.len(), 1);
        let (title, rows) = table_of(&ui, view.tables[0]);
        assert_eq!(title, "Firmware");
        assert_eq!(rows[1], row("Revision", "0x00010000".to_string()));
        assert_eq!(rows[2], row("UEFI", "2.70".to_string()));
    }

    #[test]
    fn nothing_but_the_logo_without_system_tables() {
        let rig = Rig::new(800, 600);
        let mut ui = rig.ui();
        let root = ui.root();
        let tab = ui.add_container(root, Flow::Column).unwrap();
        let mut provider = FakeInfo::default();
        let view = build(&mut ui, tab, &mut provider).unwrap();
        assert!(view.container.is_none());
        assert!(ui.tree().children(tab).is_empty());
    }
}
