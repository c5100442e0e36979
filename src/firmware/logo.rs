//! Boot logo from the EDK II platform logo protocol.

use alloc::vec::Vec;
use core::slice;

use uefi::boot;
use uefi::proto::console::gop::BltPixel;
use uefi::proto::unsafe_protocol;
use uefi::Status;

use crate::views::Logo;

#[repr(C)]
struct ImageInput {
    flags: u32,
    width: u16,
    height: u16,
    bitmap: *const BltPixel,
}

#[repr(C)]
#[allow(dead_code)]
struct PlatformLogoProtocol {
    get_image: unsafe extern "efiapi" fn(
        this: *const Self,
        instance: *mut u32,
        image: *mut ImageInput,
        attribute: *mut u32,
        offset_x: *mut isize,
        offset_y: *mut isize,
    ) -> Status,
}

#[repr(transparent)]
#[unsafe_protocol("53cd299f-2bc1-40c0-8c07-23f64fdb30e0")]
pub struct PlatformLogo(PlatformLogoProtocol);

impl PlatformLogo {
    /// Copies the first logo instance out of firmware memory.
    fn first_image(&self) -> Option<Logo> {
        let mut instance = 0u32;
        let mut image = ImageInput {
            flags: 0,
            width: 0,
            height: 0,
            bitmap: core::ptr::null(),
        };
        let mut attribute = 0u32;
        let (mut offset_x, mut offset_y) = (0isize, 0isize);
        let status = unsafe {
            (self.0.get_image)(
                &self.0,
                &mut instance,
                &mut image,
                &mut attribute,
                &mut offset_x,
                &mut offset_y,
            )
        };
        if status != Status::SUCCESS {
            log::debug!("platform logo: {:?}", status);
            return None;
        }
        if image.bitmap.is_null() || image.width == 0 || image.height == 0 {
            return None;
        }
        let (width, height) = (image.width as usize, image.height as usize);
        // SAFETY: the protocol hands out a width x height bitmap that stays
        // valid while the protocol is open.
        let pixels: Vec<BltPixel> =
            unsafe { slice::from_raw_parts(image.bitmap, width * height) }.to_vec();
        log::debug!("platform logo {}x{} (flags {:#x})", width, height, image.flags);
        Some(Logo {
            width,
            height,
            pixels,
        })
    }
}

pub fn platform_logo() -> Option<Logo> {
    let handle = boot::get_handle_for_protocol::<PlatformLogo>().ok()?;
    let logo = boot::open_protocol_exclusive::<PlatformLogo>(handle).ok()?;
    logo.first_image()
}
