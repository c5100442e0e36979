use alloc::vec::Vec;

use crate::boot_options::LoadOption;
use crate::error::Result;
use crate::gui::widget::{Flow, Size, WidgetId, WidgetState};
use crate::gui::{Ui, UiEvent};

pub const NO_OPTIONS: &str = "No valid boot options!";
pub const PROMPT: &str = "Select boot option to boot OS";

pub trait BootManager {
    fn load_options(&mut self) -> Result<Vec<LoadOption>>;
    /// Hands control to the option. Returns if the image exits or fails.
    fn boot(&mut self, option: &LoadOption) -> Result<()>;
}

pub struct BootView {
    pub label: WidgetId,
    pub list: Option<WidgetId>,
    entries: Vec<(WidgetId, LoadOption)>,
}

impl BootView {
    pub fn build(ui: &mut Ui, tab: WidgetId, manager: &mut dyn BootManager) -> Result<Self> {
        ui.set_flow(tab, Flow::Column)?;
        let options = manager.load_options().unwrap_or_else(|err| {
            log::warn!("boot options unavailable: {}", err);
            Vec::new()
        });

        if options.is_empty() {
            let label = ui.add_label(tab, NO_OPTIONS)?;
            return Ok(Self {
                label,
                list: None,
                entries: Vec::new(),
            });
        }

        let label = ui.add_label(tab, PROMPT)?;
        let list = ui.add_list(tab)?;
        ui.set_size(list, Size::Percent(95), Size::Percent(90))?;
        let mut entries = Vec::with_capacity(options.len());
        for option in options {
            let button = ui.add_list_button(list, &option.button_text())?;
            ui.set_size(button, Size::Percent(80), Size::Content)?;
            entries.push((button, option));
        }
        if let Some(&(first, _)) = entries.first() {
            ui.add_state(first, WidgetState::CHECKED)?;
        }
        log::debug!("{} boot options listed", entries.len());
        Ok(Self {
            label,
            list: Some(list),
            entries,
        })
    }

    pub fn buttons(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn option(&self, button: WidgetId) -> Option<&LoadOption> {
        self.entries.iter().find(|(id, _)| *id == button).map(|(_, o)| o)
    }

    /// Boots the clicked option. When control comes back the whole screen
    /// is repainted, since the image may have drawn over it.
    pub fn on_event(&self, ui: &mut Ui, manager: &mut dyn BootManager, event: &UiEvent) -> Result<bool> {
        let UiEvent::Clicked(id) = *event else {
            return Ok(false);
        };
        let Some(option) = self.option(id) else {
            return Ok(false);
        };
        log::info!("booting Boot{:04X} ({})", option.number, option.description);
        if let Err(err) = manager.boot(option) {
            log::warn!("Boot{:04X} failed: {}", option.number, err);
        }
        ui.invalidate_all();
        Ok(true)
    }
}
