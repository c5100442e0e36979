//! Escape-triggered exit confirmation. The key-notify callback only bumps
//! [`EscapeMailbox`]; the loop drains it once per tick.

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::gui::focus::GroupId;
use crate::gui::{MsgBox, Ui, UiEvent};

pub const TITLE: &str = "Exit?";
pub const QUESTION: &str = "Exit this APP?";
pub const CONFIRM: &str = "Yes";
pub const CANCEL: &str = "No";

/// Bridge between the escape-key callback and the tick loop.
pub struct EscapeMailbox {
    pending: AtomicUsize,
    modal_active: AtomicBool,
}

impl EscapeMailbox {
    pub const fn new() -> Self {
        Self {
            pending: AtomicUsize::new(0),
            modal_active: AtomicBool::new(false),
        }
    }

    /// Called from the key-notify callback.
    pub fn notify(&self) -> Result<()> {
        if self.modal_active.load(Ordering::Acquire) {
            return Err(Error::AlreadyStarted);
        }
        self.pending.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    pub fn take(&self) -> usize {
        self.pending.swap(0, Ordering::AcqRel)
    }

    pub fn set_modal_active(&self, active: bool) {
        self.modal_active.store(active, Ordering::Release);
    }

    pub fn modal_active(&self) -> bool {
        self.modal_active.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.pending.store(0, Ordering::Release);
        self.modal_active.store(false, Ordering::Release);
    }
}

impl Default for EscapeMailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Exit,
    Stay,
}

#[derive(Debug)]
struct Confirmation {
    snapshot: Option<GroupId>,
    modal_group: GroupId,
    dialog: MsgBox,
}

#[derive(Debug, Default)]
enum ExitState {
    #[default]
    Idle,
    Confirming(Confirmation),
}

#[derive(Debug, Default)]
pub struct ExitFlow {
    state: ExitState,
}

impl ExitFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_confirming(&self) -> bool {
        matches!(self.state, ExitState::Confirming(_))
    }

    pub fn modal_group(&self) -> Option<GroupId> {
        match &self.state {
            ExitState::Confirming(c) => Some(c.modal_group),
            ExitState::Idle => None,
        }
    }

    pub fn dialog(&self) -> Option<&MsgBox> {
        match &self.state {
            ExitState::Confirming(c) => Some(&c.dialog),
            ExitState::Idle => None,
        }
    }

    /// Opens the confirmation dialog and moves every keypad onto its group.
    pub fn on_escape(&mut self, ui: &mut Ui) -> Result<()> {
        if self.is_confirming() {
            return Err(Error::AlreadyStarted);
        }
        let snapshot = ui.default_group();
        let dialog = ui.create_msgbox(TITLE, QUESTION, &[CONFIRM, CANCEL])?;
        let modal_group = ui.create_group();
        for &button in &dialog.buttons {
            ui.group_add(modal_group, button)?;
        }
        if let Some(&confirm) = dialog.buttons.first() {
            ui.focus(modal_group, confirm)?;
        }
        ui.bind_all_keypads(Some(modal_group))?;
        log::debug!("exit confirmation opened");

        self.state = ExitState::Confirming(Confirmation {
            snapshot,
            modal_group,
            dialog,
        });
        Ok(())
    }

    /// Resolves the dialog if `event` is a click on one of its buttons.
    pub fn on_event(&mut self, ui: &mut Ui, event: &UiEvent) -> Result<Option<Resolution>> {
        let ExitState::Confirming(confirmation) = &self.state else {
            return Ok(None);
        };
        let UiEvent::Clicked(target) = *event else {
            return Ok(None);
        };
        let Some(index) = confirmation.dialog.buttons.iter().position(|&b| b == target) else {
            return Ok(None);
        };
        let resolution = if index == 0 {
            Resolution::Exit
        } else {
            Resolution::Stay
        };

        let ExitState::Confirming(confirmation) = core::mem::take(&mut self.state) else {
            return Ok(None);
        };
        if let Err(e) = ui.bind_all_keypads(confirmation.snapshot) {
            log::warn!("previous focus group is gone ({}); keypads left unbound", e);
            ui.bind_all_keypads(None)?;
        }
        ui.delete_group(confirmation.modal_group)?;
        ui.close_msgbox(confirmation.dialog.msgbox)?;
        log::debug!("exit confirmation resolved: {:?}", resolution);
        Ok(Some(resolution))
    }
}
