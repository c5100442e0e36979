//! UEFI implementations of the platform traits.

pub mod boot;
pub mod clock;
pub mod gop;
pub mod info;
pub mod logo;
pub mod pointer;
pub mod text_input;

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::ptr::NonNull;

use uefi::proto::loaded_image::LoadedImage;
use uefi::{system, Handle};
use uefi_raw::table::boot::MemoryType;

use crate::config::Config;
use crate::error::Result;
use crate::exit::EscapeMailbox;
use crate::gui::gop::{DisplayPort, ScreenInfo};
use crate::gui::input::{AbsolutePointerDevice, InputPort, PointerSource, SimplePointerDevice};
use crate::memory::PoolBackend;
use crate::session::{Platform, TickSource};

use self::gop::GopTarget;
use self::text_input::EscapeNotify;

/// Boot services pool memory, the backing store of the global allocator.
pub struct FirmwarePool;

impl PoolBackend for FirmwarePool {
    fn allocate_pool(&self, size: usize) -> Option<NonNull<u8>> {
        uefi::boot::allocate_pool(MemoryType::LOADER_DATA, size).ok()
    }

    unsafe fn free_pool(&self, block: NonNull<u8>) {
        if let Err(e) = unsafe { uefi::boot::free_pool(block) } {
            log::error!("free_pool({:p}): {:?}", block, e.status());
        }
    }
}

/// The firmware's console-input handle, where the console splitter
/// publishes the merged input devices.
fn console_in_handle() -> Option<Handle> {
    let table = uefi::table::system_table_raw()?;
    // SAFETY: the system table outlives boot services.
    unsafe { Handle::from_ptr(table.as_ref().stdin_handle) }
}

/// The image's load options, e.g. the arguments given on the shell line.
pub fn load_options() -> Option<String> {
    let image = uefi::boot::open_protocol_exclusive::<LoadedImage>(uefi::boot::image_handle()).ok()?;
    let options = image.load_options_as_cstr16().ok()?;
    Some(options.to_string())
}

#[derive(Default)]
pub struct UefiPlatform {
    escape: Option<EscapeNotify>,
}

impl Platform for UefiPlatform {
    fn open_display(&mut self, config: &Config) -> Result<DisplayPort> {
        let target = GopTarget::open(config.max_mode)?;
        Ok(DisplayPort::new(Box::new(target)))
    }

    fn open_input(&mut self, screen: ScreenInfo, config: &Config) -> InputPort {
        let console = console_in_handle();
        let absolute = pointer::open_absolute(console)
            .map(|p| Box::new(p) as Box<dyn AbsolutePointerDevice>);
        let simple = match absolute {
            Some(_) => None,
            None => pointer::open_simple(console).map(|p| Box::new(p) as Box<dyn SimplePointerDevice>),
        };
        let source = PointerSource::select(absolute, simple);
        let keyboard = text_input::open_keyboard(console);
        InputPort::new(screen, config.pointer_damping, source, Some(keyboard))
    }

    fn prepare_console(&mut self) {
        system::with_stdout(|out| {
            let _ = out.enable_cursor(false);
            let _ = out.clear();
        });
    }

    fn restore_console(&mut self) {
        system::with_stdout(|out| {
            let _ = out.clear();
            let _ = out.enable_cursor(true);
        });
    }

    fn register_escape(&mut self, mailbox: &'static EscapeMailbox) -> Result<()> {
        if let Some(previous) = self.escape.take() {
            previous.release();
        }
        self.escape = Some(EscapeNotify::register(console_in_handle(), mailbox)?);
        Ok(())
    }

    fn unregister_escape(&mut self) {
        if let Some(escape) = self.escape.take() {
            escape.release();
        }
    }
}

/// Boot services stall; there is no free-running millisecond counter.
pub struct StallTicks;

impl TickSource for StallTicks {
    fn stall(&mut self, ms: u64) {
        uefi::boot::stall(ms as usize * 1000);
    }
}
