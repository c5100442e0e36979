//! In-memory stand-ins for firmware services, shared by the unit tests.

use std::alloc::{self, Layout};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::ptr::NonNull;
use std::rc::Rc;

use uefi::proto::console::gop::BltPixel;

use crate::boot_options::LoadOption;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::exit::EscapeMailbox;
use crate::gui::gop::{BlitTarget, Color, DisplayPort, ScreenInfo};
use crate::gui::input::{
    AbsolutePointerDevice, InputPort, KeyboardDevice, PointerSource, SimplePointerDevice,
};
use crate::gui::keyboard::KeyStroke;
use crate::gui::mouse::{AbsoluteSample, RelativeSample};
use crate::gui::Ui;
use crate::memory::PoolBackend;
use crate::session::{Platform, TickSource};
use crate::smbios::SmbiosSummary;
use crate::views::{BootManager, Clock, DateTime, FirmwareSummary, InfoProvider, Logo};

const POOL_ALIGN: usize = 8;

/// Pool backend over the host allocator with the firmware's 8-byte alignment.
#[derive(Default)]
pub struct HostPool {
    blocks: RefCell<Vec<(usize, Layout)>>,
    exhausted: Cell<bool>,
    leak_on_free: Cell<bool>,
}

impl HostPool {
    pub fn live_blocks(&self) -> usize {
        self.blocks.borrow().len()
    }

    pub fn set_exhausted(&self, exhausted: bool) {
        self.exhausted.set(exhausted);
    }

    /// Forget freed blocks instead of releasing them, so a stale pointer
    /// still reads mapped memory.
    pub fn set_leak_on_free(&self, leak: bool) {
        self.leak_on_free.set(leak);
    }
}

impl PoolBackend for HostPool {
    fn allocate_pool(&self, size: usize) -> Option<NonNull<u8>> {
        if self.exhausted.get() {
            return None;
        }
        let layout = Layout::from_size_align(size.max(1), POOL_ALIGN).ok()?;
        let block = NonNull::new(unsafe { alloc::alloc(layout) })?;
        self.blocks.borrow_mut().push((block.as_ptr() as usize, layout));
        Some(block)
    }

    unsafe fn free_pool(&self, block: NonNull<u8>) {
        let mut blocks = self.blocks.borrow_mut();
        let Some(index) = blocks.iter().position(|&(addr, _)| addr == block.as_ptr() as usize)
        else {
            panic!("host pool: unknown block {:p}", block);
        };
        let (_, layout) = blocks.remove(index);
        if !self.leak_on_free.get() {
            unsafe { alloc::dealloc(block.as_ptr(), layout) };
        }
    }
}

impl Drop for HostPool {
    fn drop(&mut self) {
        for (addr, layout) in self.blocks.borrow_mut().drain(..) {
            unsafe { alloc::dealloc(addr as *mut u8, layout) };
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlitRecord {
    pub src: (usize, usize),
    pub dest: (usize, usize),
    pub dims: (usize, usize),
    pub px_stride: usize,
}

struct ScreenState {
    width: usize,
    height: usize,
    video: Vec<BltPixel>,
    blits: Vec<BlitRecord>,
    failures: usize,
}

/// Frame buffer that records every blit. Clones share the same video memory.
#[derive(Clone)]
pub struct FakeScreen {
    state: Rc<RefCell<ScreenState>>,
}

impl FakeScreen {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(ScreenState {
                width,
                height,
                video: vec![BltPixel::new(0, 0, 0); width * height],
                blits: Vec::new(),
                failures: 0,
            })),
        }
    }

    /// The next `count` blits fail with a device error and copy nothing.
    pub fn fail_blits(&self, count: usize) {
        self.state.borrow_mut().failures = count;
    }

    pub fn blits(&self) -> Vec<BlitRecord> {
        self.state.borrow().blits.clone()
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color {
        let state = self.state.borrow();
        Color::from_blt(state.video[y * state.width + x])
    }
}

impl BlitTarget for FakeScreen {
    fn resolution(&self) -> (usize, usize) {
        let state = self.state.borrow();
        (state.width, state.height)
    }

    fn blit_buffer_to_video(
        &mut self,
        buffer: &[BltPixel],
        src: (usize, usize),
        dest: (usize, usize),
        dims: (usize, usize),
        px_stride: usize,
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.failures > 0 {
            state.failures -= 1;
            return Err(Error::Firmware(uefi::Status::DEVICE_ERROR));
        }
        let width = state.width;
        for row in 0..dims.1 {
            let from = (src.1 + row) * px_stride + src.0;
            let to = (dest.1 + row) * width + dest.0;
            state.video[to..to + dims.0].copy_from_slice(&buffer[from..from + dims.0]);
        }
        state.blits.push(BlitRecord {
            src,
            dest,
            dims,
            px_stride,
        });
        Ok(())
    }
}

/// Scripted device: each read pops one queued report, an empty queue reads
/// as "nothing pending".
pub struct Script<T> {
    queue: Rc<RefCell<VecDeque<Result<Option<T>>>>>,
}

impl<T> Clone for Script<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }
}

impl<T> Script<T> {
    pub fn push(&self, report: Result<Option<T>>) {
        self.queue.borrow_mut().push_back(report);
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    fn pop(&self) -> Result<Option<T>> {
        self.queue.borrow_mut().pop_front().unwrap_or(Ok(None))
    }
}

pub type FakeAbsolutePointer = Script<AbsoluteSample>;
pub type FakeSimplePointer = Script<RelativeSample>;

impl AbsolutePointerDevice for Script<AbsoluteSample> {
    fn read(&mut self) -> Result<Option<AbsoluteSample>> {
        self.pop()
    }
}

impl SimplePointerDevice for Script<RelativeSample> {
    fn read(&mut self) -> Result<Option<RelativeSample>> {
        self.pop()
    }
}

#[derive(Clone, Default)]
pub struct FakeKeyboard {
    keys: Script<KeyStroke>,
}

impl FakeKeyboard {
    pub fn push(&self, key: KeyStroke) {
        self.keys.push(Ok(Some(key)));
    }
}

impl KeyboardDevice for FakeKeyboard {
    fn read_key(&mut self) -> Result<Option<KeyStroke>> {
        self.keys.pop()
    }
}

/// A toolkit wired to a fake screen, an absolute pointer whose coordinates
/// map one to one onto pixels, and a keyboard.
pub struct Rig {
    pub screen: FakeScreen,
    pub pointer: FakeAbsolutePointer,
    pub keyboard: FakeKeyboard,
}

impl Rig {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            screen: FakeScreen::new(width, height),
            pointer: FakeAbsolutePointer::default(),
            keyboard: FakeKeyboard::default(),
        }
    }

    pub fn ui(&self) -> Ui {
        let display = DisplayPort::new(Box::new(self.screen.clone()));
        let source = PointerSource::select(Some(Box::new(self.pointer.clone())), None);
        let input = InputPort::new(
            display.screen(),
            50,
            source,
            Some(Box::new(self.keyboard.clone())),
        );
        Ui::new(display, input, 1)
    }

    pub fn point(&self, x: u64, y: u64, pressed: bool) {
        let (width, height) = self.screen.resolution();
        self.pointer.push(Ok(Some(AbsoluteSample {
            current_x: x,
            current_y: y,
            max_x: width as u64,
            max_y: height as u64,
            active_buttons: pressed as u32,
            ..Default::default()
        })));
    }

    pub fn key(&self, key: KeyStroke) {
        self.keyboard.push(key);
    }
}

/// Platform with a fake screen and devices that records every service call.
pub struct FakePlatform {
    pub screen: Option<FakeScreen>,
    pub pointer: FakeAbsolutePointer,
    pub keyboard: FakeKeyboard,
    calls: Vec<&'static str>,
}

impl FakePlatform {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            screen: Some(FakeScreen::new(width, height)),
            pointer: FakeAbsolutePointer::default(),
            keyboard: FakeKeyboard::default(),
            calls: Vec::new(),
        }
    }

    /// No graphics output device at all.
    pub fn headless() -> Self {
        Self {
            screen: None,
            ..Self::new(0, 0)
        }
    }

    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }
}

impl Platform for FakePlatform {
    fn open_display(&mut self, _config: &Config) -> Result<DisplayPort> {
        let screen = self.screen.clone().ok_or(Error::NoGraphicsDevice)?;
        self.calls.push("open_display");
        Ok(DisplayPort::new(Box::new(screen)))
    }

    fn open_input(&mut self, screen: ScreenInfo, config: &Config) -> InputPort {
        self.calls.push("open_input");
        let source = PointerSource::select(Some(Box::new(self.pointer.clone())), None);
        InputPort::new(
            screen,
            config.pointer_damping,
            source,
            Some(Box::new(self.keyboard.clone())),
        )
    }

    fn prepare_console(&mut self) {
        self.calls.push("prepare_console");
    }

    fn restore_console(&mut self) {
        self.calls.push("restore_console");
    }

    fn register_escape(&mut self, _mailbox: &'static EscapeMailbox) -> Result<()> {
        self.calls.push("register_escape");
        Ok(())
    }

    fn unregister_escape(&mut self) {
        self.calls.push("unregister_escape");
    }
}

/// Records stalls instead of waiting; an optional counter advances with them.
#[derive(Default)]
pub struct FakeTicks {
    pub stalls: Vec<u64>,
    pub hardware: Option<u64>,
}

impl TickSource for FakeTicks {
    fn stall(&mut self, ms: u64) {
        self.stalls.push(ms);
        if let Some(now) = self.hardware.as_mut() {
            *now += ms;
        }
    }

    fn hardware_ms(&mut self) -> Option<u64> {
        self.hardware
    }
}

/// Info source with a solid-colour logo of the given size.
#[derive(Default)]
pub struct FakeInfo {
    pub logo: Option<(usize, usize)>,
    pub smbios: Option<SmbiosSummary>,
    pub firmware: Option<FirmwareSummary>,
}

impl InfoProvider for FakeInfo {
    fn logo(&mut self) -> Option<Logo> {
        let (width, height) = self.logo?;
        Some(Logo {
            width,
            height,
            pixels: vec![BltPixel::new(0x20, 0x40, 0x80); width * height],
        })
    }

    fn smbios(&mut self) -> Option<SmbiosSummary> {
        self.smbios.clone()
    }

    fn firmware(&mut self) -> Option<FirmwareSummary> {
        self.firmware.clone()
    }
}

/// Real-time clock that reads back whatever the test last set.
pub struct FakeClock {
    now: Result<DateTime>,
}

impl FakeClock {
    pub fn new(now: DateTime) -> Self {
        Self { now: Ok(now) }
    }

    pub fn set(&mut self, now: DateTime) {
        self.now = Ok(now);
    }

    pub fn fail(&mut self, err: Error) {
        self.now = Err(err);
    }
}

impl Clock for FakeClock {
    fn now(&mut self) -> Result<DateTime> {
        self.now
    }
}

/// Boot manager that remembers which options it was asked to start.
#[derive(Default)]
pub struct FakeBootManager {
    pub options: Vec<LoadOption>,
    pub load_error: Option<Error>,
    pub boot_error: Option<Error>,
    pub booted: Vec<u16>,
}

impl BootManager for FakeBootManager {
    fn load_options(&mut self) -> Result<Vec<LoadOption>> {
        match self.load_error {
            Some(err) => Err(err),
            None => Ok(self.options.clone()),
        }
    }

    fn boot(&mut self, option: &LoadOption) -> Result<()> {
        self.booted.push(option.number);
        self.boot_error.map_or(Ok(()), Err)
    }
}
