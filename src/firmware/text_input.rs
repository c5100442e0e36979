//! Keyboard input through the extended simple text input protocol, plus the
//! escape key notification that opens the exit dialog.

use alloc::boxed::Box;
use core::ffi::c_void;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use uefi::boot::ScopedProtocol;
use uefi::proto::console::text::Key;
use uefi::proto::unsafe_protocol;
use uefi::{system, Handle, Status};

use crate::error::{Error, Result};
use crate::exit::EscapeMailbox;
use crate::gui::input::KeyboardDevice;
use crate::gui::keyboard::{KeyStroke, SCAN_ESC};

use super::pointer::open_console_protocol;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct InputKey {
    scan_code: u16,
    unicode_char: u16,
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct KeyState {
    key_shift_state: u32,
    key_toggle_state: u8,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct KeyData {
    key: InputKey,
    key_state: KeyState,
}

type KeyNotifyFn = unsafe extern "efiapi" fn(key_data: *mut KeyData) -> Status;

#[repr(C)]
#[allow(dead_code)]
struct SimpleTextInputExProtocol {
    reset: unsafe extern "efiapi" fn(this: *mut Self, extended_verification: bool) -> Status,
    read_key_stroke_ex: unsafe extern "efiapi" fn(this: *mut Self, key_data: *mut KeyData) -> Status,
    wait_for_key_ex: *mut c_void,
    set_state: unsafe extern "efiapi" fn(this: *mut Self, toggle_state: *const u8) -> Status,
    register_key_notify: unsafe extern "efiapi" fn(
        this: *mut Self,
        key_data: *const KeyData,
        notify: KeyNotifyFn,
        handle: *mut *mut c_void,
    ) -> Status,
    unregister_key_notify:
        unsafe extern "efiapi" fn(this: *mut Self, handle: *mut c_void) -> Status,
}

#[repr(transparent)]
#[unsafe_protocol("dd9e7534-7762-4698-8c14-f58517a625aa")]
pub struct TextInputEx(SimpleTextInputExProtocol);

impl TextInputEx {
    fn read_key_stroke(&mut self) -> Result<Option<KeyStroke>> {
        let mut data = KeyData::default();
        let status = unsafe { (self.0.read_key_stroke_ex)(&mut self.0, &mut data) };
        match status {
            Status::SUCCESS => Ok(Some(KeyStroke {
                scan_code: data.key.scan_code,
                unicode_char: data.key.unicode_char,
                shift_state: data.key_state.key_shift_state,
            })),
            Status::NOT_READY => Ok(None),
            other => Err(Error::Firmware(other)),
        }
    }

    fn register_escape(&mut self) -> Result<*mut c_void> {
        let key = KeyData {
            key: InputKey {
                scan_code: SCAN_ESC,
                unicode_char: 0,
            },
            key_state: KeyState::default(),
        };
        let mut handle = ptr::null_mut();
        let status =
            unsafe { (self.0.register_key_notify)(&mut self.0, &key, escape_notify, &mut handle) };
        match status {
            Status::SUCCESS => Ok(handle),
            other => Err(Error::Firmware(other)),
        }
    }

    fn unregister(&mut self, handle: *mut c_void) -> Result<()> {
        let status = unsafe { (self.0.unregister_key_notify)(&mut self.0, handle) };
        match status {
            Status::SUCCESS => Ok(()),
            other => Err(Error::Firmware(other)),
        }
    }
}

/// Mailbox the notify callback posts to. Null while nothing is registered.
static NOTIFY_TARGET: AtomicPtr<EscapeMailbox> = AtomicPtr::new(ptr::null_mut());

unsafe extern "efiapi" fn escape_notify(_key_data: *mut KeyData) -> Status {
    let target = NOTIFY_TARGET.load(Ordering::Acquire);
    // SAFETY: only 'static mailboxes are ever stored.
    let Some(mailbox) = (unsafe { target.as_ref() }) else {
        return Status::SUCCESS;
    };
    match mailbox.notify() {
        Ok(()) => Status::SUCCESS,
        Err(_) => Status::ALREADY_STARTED,
    }
}

/// Extended text input keyboard, with the shift state needed for Shift+Tab.
pub struct ExtendedKeyboard(ScopedProtocol<TextInputEx>);

impl KeyboardDevice for ExtendedKeyboard {
    fn read_key(&mut self) -> Result<Option<KeyStroke>> {
        self.0.read_key_stroke()
    }
}

/// Fallback over the system table's console input.
pub struct ConsoleKeyboard;

impl KeyboardDevice for ConsoleKeyboard {
    fn read_key(&mut self) -> Result<Option<KeyStroke>> {
        let key = system::with_stdin(|stdin| stdin.read_key())?;
        Ok(key.map(|key| match key {
            Key::Printable(c) => KeyStroke::unicode(u16::from(c)),
            Key::Special(scan) => KeyStroke::scan(scan.0),
        }))
    }
}

pub fn open_keyboard(console: Option<Handle>) -> Box<dyn KeyboardDevice> {
    match open_console_protocol::<TextInputEx>(console) {
        Some(input) => Box::new(ExtendedKeyboard(input)),
        None => {
            log::debug!("extended text input unavailable, using console input");
            Box::new(ConsoleKeyboard)
        }
    }
}

/// A live escape key registration; dropping it without `release` leaves
/// the callback installed.
pub struct EscapeNotify {
    input: ScopedProtocol<TextInputEx>,
    handle: *mut c_void,
}

impl EscapeNotify {
    pub fn register(console: Option<Handle>, mailbox: &'static EscapeMailbox) -> Result<Self> {
        let mut input = open_console_protocol::<TextInputEx>(console)
            .ok_or(Error::Firmware(Status::UNSUPPORTED))?;
        NOTIFY_TARGET.store(ptr::from_ref(mailbox).cast_mut(), Ordering::Release);
        match input.register_escape() {
            Ok(handle) => Ok(Self { input, handle }),
            Err(e) => {
                NOTIFY_TARGET.store(ptr::null_mut(), Ordering::Release);
                Err(e)
            }
        }
    }

    pub fn release(mut self) {
        if let Err(e) = self.input.unregister(self.handle) {
            log::warn!("escape notify not removed: {}", e);
        }
        NOTIFY_TARGET.store(ptr::null_mut(), Ordering::Release);
    }
}
