use crate::error::Result;
use crate::gui::{Ui, UiEvent};
use crate::session::Application;

use super::boot::{BootManager, BootView};
use super::info::{self, InfoProvider, InfoView};
use super::time::{Clock, TimeView};

pub const TITLE: &str = "ViceBIOS Setup Utility";
pub const TAB_INFO: &str = "BIOS Info";
pub const TAB_TIME: &str = "Time&Date";
pub const TAB_BOOT: &str = "Boot Manager";

struct Views {
    info: InfoView,
    time: TimeView,
    boot: BootView,
}

/// The setup screen: a titled tab view over system information, the clock
/// and the boot manager.
pub struct SetupApp<I, C, B> {
    info: I,
    clock: C,
    boot: B,
    refresh_ms: u64,
    views: Option<Views>,
}

impl<I, C, B> SetupApp<I, C, B>
where
    I: InfoProvider,
    C: Clock,
    B: BootManager,
{
    pub fn new(info: I, clock: C, boot: B, refresh_ms: u64) -> Self {
        Self {
            info,
            clock,
            boot,
            refresh_ms,
            views: None,
        }
    }

    pub fn boot_manager(&self) -> &B {
        &self.boot
    }

    pub fn boot_view(&self) -> Option<&BootView> {
        self.views.as_ref().map(|v| &v.boot)
    }

    pub fn info_view(&self) -> Option<&InfoView> {
        self.views.as_ref().map(|v| &v.info)
    }

    pub fn time_view(&self) -> Option<&TimeView> {
        self.views.as_ref().map(|v| &v.time)
    }
}

impl<I, C, B> Application for SetupApp<I, C, B>
where
    I: InfoProvider,
    C: Clock,
    B: BootManager,
{
    fn build(&mut self, ui: &mut Ui) -> Result<()> {
        let group = ui.create_group();
        ui.set_default_group(Some(group))?;
        ui.bind_all_keypads(Some(group))?;

        let tabview = ui.add_tabview(TITLE)?;
        let info_tab = ui.add_tab(tabview, TAB_INFO)?;
        let time_tab = ui.add_tab(tabview, TAB_TIME)?;
        let boot_tab = ui.add_tab(tabview, TAB_BOOT)?;

        let info = info::build(ui, info_tab, &mut self.info)?;
        let time = TimeView::build(ui, time_tab, &mut self.clock, self.refresh_ms)?;
        let boot = BootView::build(ui, boot_tab, &mut self.boot)?;
        self.views = Some(Views { info, time, boot });
        Ok(())
    }

    fn on_event(&mut self, ui: &mut Ui, event: UiEvent) -> Result<()> {
        let Some(views) = &self.views else {
            return Ok(());
        };
        if views.time.on_event(ui, &mut self.clock, &event)? {
            return Ok(());
        }
        views.boot.on_event(ui, &mut self.boot, &event)?;
        Ok(())
    }
}
