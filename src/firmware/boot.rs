use alloc::vec::Vec;

use uefi::boot::{self, LoadImageSource};
use uefi::proto::device_path::DevicePath;
use uefi::proto::BootPolicy;
use uefi::runtime::{self, VariableVendor};
use uefi::{cstr16, CString16, Status};

use crate::boot_options::{collect_options, parse_boot_order, LoadOption};
use crate::error::{Error, Result};
use crate::views::BootManager;

fn read_global(name: &str) -> Option<Vec<u8>> {
    let name = CString16::try_from(name).ok()?;
    match runtime::get_variable_boxed(&name, &VariableVendor::GLOBAL_VARIABLE) {
        Ok((data, _)) => Some(data.into_vec()),
        Err(e) => {
            log::debug!("{} unreadable: {:?}", name, e.status());
            None
        }
    }
}

pub struct FirmwareBootManager;

impl BootManager for FirmwareBootManager {
    fn load_options(&mut self) -> Result<Vec<LoadOption>> {
        let (order, _) =
            runtime::get_variable_boxed(cstr16!("BootOrder"), &VariableVendor::GLOBAL_VARIABLE)?;
        let order = parse_boot_order(&order);
        Ok(collect_options(&order, |number| {
            read_global(&LoadOption::variable_name(number))
        }))
    }

    fn boot(&mut self, option: &LoadOption) -> Result<()> {
        let device_path = <&DevicePath>::try_from(option.file_path.as_slice())
            .map_err(|_| Error::Firmware(Status::INVALID_PARAMETER))?;
        let image = boot::load_image(
            boot::image_handle(),
            LoadImageSource::FromDevicePath {
                device_path,
                boot_policy: BootPolicy::BootSelection,
            },
        )?;
        let started = boot::start_image(image);
        if let Err(e) = boot::unload_image(image) {
            log::debug!("image already unloaded: {:?}", e.status());
        }
        started?;
        Ok(())
    }
}
