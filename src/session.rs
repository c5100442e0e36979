//! `Uninitialized → Initialized → Running → Terminating → Uninitialized`

use crate::config::Config;
use crate::error::{Error, Result};
use crate::exit::{EscapeMailbox, ExitFlow, Resolution};
use crate::gui::gop::{DisplayPort, ScreenInfo};
use crate::gui::input::InputPort;
use crate::gui::{Ui, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Running,
    Terminating,
}

/// Firmware services the session needs around the toolkit.
pub trait Platform {
    /// Selects a mode and wraps the graphics device.
    fn open_display(&mut self, config: &Config) -> Result<DisplayPort>;

    /// Locates whichever pointer and keyboard devices exist.
    fn open_input(&mut self, screen: ScreenInfo, config: &Config) -> InputPort;

    /// Hides the text cursor and clears the console.
    fn prepare_console(&mut self);

    /// Clears the console and restores the text cursor at the origin.
    fn restore_console(&mut self);

    /// Routes escape key presses into `mailbox`.
    fn register_escape(&mut self, mailbox: &'static EscapeMailbox) -> Result<()>;

    fn unregister_escape(&mut self);
}

pub trait TickSource {
    /// Cooperative yield between ticks.
    fn stall(&mut self, ms: u64);

    /// Hardware millisecond counter, if the platform has one.
    fn hardware_ms(&mut self) -> Option<u64> {
        None
    }
}

pub trait Application {
    /// Builds the widget tree. Called once per run.
    fn build(&mut self, ui: &mut Ui) -> Result<()>;

    /// Receives every event the exit flow did not consume.
    fn on_event(&mut self, ui: &mut Ui, event: UiEvent) -> Result<()>;
}

pub struct Session<P, T> {
    platform: P,
    ticks: T,
    config: Config,
    mailbox: &'static EscapeMailbox,
    state: SessionState,
    ui: Option<Ui>,
    exit: ExitFlow,
    escape_registered: bool,
    clock_ms: u64,
}

impl<P: Platform, T: TickSource> Session<P, T> {
    pub fn new(platform: P, ticks: T, config: Config, mailbox: &'static EscapeMailbox) -> Self {
        Self {
            platform,
            ticks,
            config,
            mailbox,
            state: SessionState::Uninitialized,
            ui: None,
            exit: ExitFlow::new(),
            escape_registered: false,
            clock_ms: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn ui(&self) -> Option<&Ui> {
        self.ui.as_ref()
    }

    pub fn ui_mut(&mut self) -> Option<&mut Ui> {
        self.ui.as_mut()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn ticks(&self) -> &T {
        &self.ticks
    }

    pub fn exit_flow(&self) -> &ExitFlow {
        &self.exit
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Creates the toolkit and both ports. A second call is a no-op.
    pub fn init(&mut self) -> Result<()> {
        if self.state != SessionState::Uninitialized {
            log::debug!("session already initialized");
            return Ok(());
        }
        let display = self.platform.open_display(&self.config)?;
        let screen = display.screen();
        let input = self.platform.open_input(screen, &self.config);
        log::info!(
            "display {}x{}, pointer: {}, keyboard: {}",
            screen.width,
            screen.height,
            input.has_pointer(),
            input.has_keyboard()
        );
        self.ui = Some(Ui::new(display, input, self.config.font_scale));
        self.clock_ms = self.ticks.hardware_ms().unwrap_or(0);
        self.state = SessionState::Initialized;
        Ok(())
    }

    /// Builds the application and arms the escape key.
    pub fn start<A: Application>(&mut self, app: &mut A) -> Result<()> {
        if self.state != SessionState::Initialized {
            return Err(Error::NotInitialized);
        }
        let ui = self.ui.as_mut().ok_or(Error::NotInitialized)?;
        self.platform.prepare_console();
        app.build(ui)?;
        match self.platform.register_escape(self.mailbox) {
            Ok(()) => self.escape_registered = true,
            Err(e) => log::warn!("escape key unavailable: {}", e),
        }
        self.state = SessionState::Running;
        Ok(())
    }

    /// One pass of the loop.
    pub fn tick<A: Application>(&mut self, app: &mut A) -> Result<()> {
        if self.state != SessionState::Running {
            return Err(Error::NotInitialized);
        }
        let ui = self.ui.as_mut().ok_or(Error::NotInitialized)?;

        for _ in 0..self.mailbox.take() {
            match self.exit.on_escape(ui) {
                Ok(()) => {}
                Err(Error::AlreadyStarted) => log::debug!("exit dialog already open"),
                Err(e) => return Err(e),
            }
        }
        self.mailbox.set_modal_active(self.exit.is_confirming());

        ui.handle(self.clock_ms)?;

        for event in ui.take_events() {
            match self.exit.on_event(ui, &event)? {
                Some(Resolution::Exit) => {
                    log::info!("exit confirmed");
                    self.state = SessionState::Terminating;
                }
                Some(Resolution::Stay) => {}
                None => app.on_event(ui, event)?,
            }
        }
        self.mailbox.set_modal_active(self.exit.is_confirming());

        self.ticks.stall(self.config.tick_ms);
        self.clock_ms = match self.ticks.hardware_ms() {
            Some(ms) => ms,
            None => self.clock_ms + self.config.tick_ms,
        };
        Ok(())
    }

    /// Releases everything `init` and `start` acquired. Safe in any state.
    pub fn deinit(&mut self) {
        if self.state == SessionState::Uninitialized {
            return;
        }
        if self.escape_registered {
            self.platform.unregister_escape();
            self.escape_registered = false;
        }
        if let Some(mut ui) = self.ui.take() {
            ui.close();
        }
        self.platform.restore_console();
        self.mailbox.reset();
        self.exit = ExitFlow::new();
        self.state = SessionState::Uninitialized;
    }

    /// Runs `app` until the user confirms exit, then tears down.
    pub fn run<A: Application>(&mut self, app: &mut A) -> Result<()> {
        self.init()?;
        let result = self.start(app).and_then(|()| {
            while self.state == SessionState::Running {
                self.tick(app)?;
            }
            Ok(())
        });
        self.deinit();
        result
    }
}
