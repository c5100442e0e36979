//! Pointer devices.
//!
//! The crate only wraps the simple pointer protocol, so the absolute pointer
//! is declared here from its C layout.

use core::ffi::c_void;

use uefi::boot::{self, OpenProtocolAttributes, OpenProtocolParams, ScopedProtocol, SearchType};
use uefi::proto::console::pointer::Pointer;
use uefi::proto::device_path::DevicePath;
use uefi::proto::{unsafe_protocol, ProtocolPointer};
use uefi::{Handle, Status};

use crate::error::{Error, Result};
use crate::gui::input::{AbsolutePointerDevice, SimplePointerDevice};
use crate::gui::mouse::{AbsoluteSample, RelativeSample};

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct AbsolutePointerState {
    current_x: u64,
    current_y: u64,
    current_z: u64,
    active_buttons: u32,
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
struct AbsolutePointerMode {
    absolute_min_x: u64,
    absolute_min_y: u64,
    absolute_min_z: u64,
    absolute_max_x: u64,
    absolute_max_y: u64,
    absolute_max_z: u64,
    attributes: u32,
}

#[repr(C)]
#[allow(dead_code)]
struct AbsolutePointerProtocol {
    reset: unsafe extern "efiapi" fn(this: *mut Self, extended_verification: bool) -> Status,
    get_state:
        unsafe extern "efiapi" fn(this: *mut Self, state: *mut AbsolutePointerState) -> Status,
    wait_for_input: *mut c_void,
    mode: *const AbsolutePointerMode,
}

/// `EFI_ABSOLUTE_POINTER_PROTOCOL`, used by touch screens and tablets.
#[repr(transparent)]
#[unsafe_protocol("8d59d32b-c655-4ae9-9b15-f25904992a43")]
pub struct AbsolutePointer(AbsolutePointerProtocol);

impl AbsolutePointer {
    fn read_state(&mut self) -> Result<Option<AbsoluteSample>> {
        let mut state = AbsolutePointerState::default();
        let status = unsafe { (self.0.get_state)(&mut self.0, &mut state) };
        match status {
            Status::SUCCESS => {}
            Status::NOT_READY => return Ok(None),
            other => return Err(Error::Firmware(other)),
        }
        if self.0.mode.is_null() {
            return Err(Error::Firmware(Status::DEVICE_ERROR));
        }
        // SAFETY: the mode pointer is owned by the driver and lives as long
        // as the protocol instance.
        let mode = unsafe { *self.0.mode };
        Ok(Some(AbsoluteSample {
            current_x: state.current_x,
            current_y: state.current_y,
            min_x: mode.absolute_min_x,
            max_x: mode.absolute_max_x,
            min_y: mode.absolute_min_y,
            max_y: mode.absolute_max_y,
            active_buttons: state.active_buttons,
        }))
    }
}

pub struct FirmwareAbsolutePointer(ScopedProtocol<AbsolutePointer>);

impl AbsolutePointerDevice for FirmwareAbsolutePointer {
    fn read(&mut self) -> Result<Option<AbsoluteSample>> {
        self.0.read_state()
    }
}

pub struct FirmwareSimplePointer(ScopedProtocol<Pointer>);

impl SimplePointerDevice for FirmwareSimplePointer {
    fn read(&mut self) -> Result<Option<RelativeSample>> {
        let [resolution_x, resolution_y, _] = self.0.mode().resolution;
        let Some(state) = self.0.read_state()? else {
            return Ok(None);
        };
        Ok(Some(RelativeSample {
            dx: state.relative_movement[0],
            dy: state.relative_movement[1],
            resolution_x,
            resolution_y,
            left: state.button[0],
            right: state.button[1],
        }))
    }
}

fn has_device_path(handle: Handle) -> bool {
    // SAFETY: the protocol is only queried, never used after the scope ends.
    unsafe {
        boot::open_protocol::<DevicePath>(
            OpenProtocolParams {
                handle,
                agent: boot::image_handle(),
                controller: None,
            },
            OpenProtocolAttributes::GetProtocol,
        )
    }
    .is_ok()
}

fn open_shared<P: ProtocolPointer + ?Sized>(handle: Handle) -> Option<ScopedProtocol<P>> {
    // GetProtocol leaves the console drivers connected.
    unsafe {
        boot::open_protocol::<P>(
            OpenProtocolParams {
                handle,
                agent: boot::image_handle(),
                controller: None,
            },
            OpenProtocolAttributes::GetProtocol,
        )
        .ok()
    }
}

/// Opens `P` only if some physical device with a device path publishes it.
/// The console-input handle is preferred since the firmware's console
/// splitter merges every device there.
pub(crate) fn open_console_protocol<P: ProtocolPointer + ?Sized>(console: Option<Handle>) -> Option<ScopedProtocol<P>> {
    let handles = boot::locate_handle_buffer(SearchType::ByProtocol(&P::GUID)).ok()?;
    let physical = handles.iter().copied().find(|&h| has_device_path(h));
    let Some(physical) = physical else {
        log::debug!("no device path behind {} handles", handles.len());
        return None;
    };
    console
        .and_then(open_shared::<P>)
        .or_else(|| open_shared::<P>(physical))
}

pub fn open_absolute(console: Option<Handle>) -> Option<FirmwareAbsolutePointer> {
    open_console_protocol::<AbsolutePointer>(console).map(FirmwareAbsolutePointer)
}

pub fn open_simple(console: Option<Handle>) -> Option<FirmwareSimplePointer> {
    open_console_protocol::<Pointer>(console).map(FirmwareSimplePointer)
}
