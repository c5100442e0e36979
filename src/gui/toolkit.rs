//! The widget engine. [`Ui::handle`] runs once per loop tick and queues
//! anything the application must react to as a [`UiEvent`].

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::mem;

use uefi::proto::console::gop::BltPixel;

use super::canvas::Canvas;
use super::focus::{FocusGroups, GroupId, KeypadId};
use super::gop::{DisplayPort, Rect, ScreenInfo};
use super::input::InputPort;
use super::keyboard::UiKey;
use super::layout::{self, Metrics};
use super::mouse::PointerReport;
use super::render;
use super::timer::{TimerId, Timers};
use super::widget::{
    CalendarDate, ClockFace, Flow, Kind, Size, Widget, WidgetId, WidgetState, WidgetTree,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Clicked(WidgetId),
    Timer(TimerId),
}

/// A message box and its footer buttons, in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgBox {
    pub msgbox: WidgetId,
    pub buttons: Vec<WidgetId>,
}

pub struct Ui {
    tree: WidgetTree,
    focus: FocusGroups,
    timers: Timers,
    display: DisplayPort,
    input: InputPort,
    metrics: Metrics,
    keypad: Option<KeypadId>,
    events: Vec<UiEvent>,
    dirty: Option<Rect>,
    needs_layout: bool,
    pressed: Option<WidgetId>,
    pointer: Option<PointerReport>,
    cursor_area: Option<Rect>,
    shown_focus: Option<WidgetId>,
    now_ms: u64,
}

impl Ui {
    pub fn new(display: DisplayPort, input: InputPort, scale: usize) -> Self {
        let screen = display.screen().rect();
        let mut focus = FocusGroups::new();
        let keypad = input.has_keyboard().then(|| focus.register_keypad());
        Self {
            tree: WidgetTree::new(screen),
            focus,
            timers: Timers::default(),
            display,
            input,
            metrics: Metrics::new(scale),
            keypad,
            events: Vec::new(),
            dirty: Some(screen),
            needs_layout: true,
            pressed: None,
            pointer: None,
            cursor_area: None,
            shown_focus: None,
            now_ms: 0,
        }
    }

    pub fn screen(&self) -> ScreenInfo {
        self.display.screen()
    }

    pub fn root(&self) -> WidgetId {
        self.tree.root()
    }

    pub fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    pub fn display(&self) -> &DisplayPort {
        &self.display
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn widget(&self, id: WidgetId) -> Result<&Widget> {
        self.tree.get(id)
    }

    pub fn text(&self, id: WidgetId) -> Option<&str> {
        self.tree.get(id).ok().and_then(Widget::text)
    }

    pub fn take_events(&mut self) -> Vec<UiEvent> {
        mem::take(&mut self.events)
    }

    // ---- widget creation ------------------------------------------------

    /// Adds a widget. Focusable widgets outside message boxes join the
    /// default focus group.
    pub fn add(&mut self, parent: WidgetId, kind: Kind) -> Result<WidgetId> {
        let inside_modal = self.in_modal(parent);
        let id = self.tree.add(parent, kind)?;
        if !inside_modal && self.tree.get(id)?.is_focusable() {
            if let Some(group) = self.focus.default_group() {
                self.focus.add(group, id)?;
            }
        }
        self.relayout();
        Ok(id)
    }

    pub fn add_container(&mut self, parent: WidgetId, flow: Flow) -> Result<WidgetId> {
        let id = self.add(parent, Kind::Container)?;
        self.tree.get_mut(id)?.flow = flow;
        Ok(id)
    }

    pub fn add_label(&mut self, parent: WidgetId, text: &str) -> Result<WidgetId> {
        self.add(parent, Kind::Label { text: text.to_string() })
    }

    pub fn add_button(&mut self, parent: WidgetId, text: &str) -> Result<WidgetId> {
        self.add(parent, Kind::Button { text: text.to_string() })
    }

    pub fn add_list(&mut self, parent: WidgetId) -> Result<WidgetId> {
        self.add(parent, Kind::List)
    }

    pub fn add_list_button(&mut self, list: WidgetId, text: &str) -> Result<WidgetId> {
        self.add(list, Kind::ListButton { text: text.to_string() })
    }

    pub fn add_table(&mut self, parent: WidgetId, title: &str, rows: Vec<(String, String)>) -> Result<WidgetId> {
        self.add(parent, Kind::Table { title: title.to_string(), rows })
    }

    pub fn add_image(&mut self, parent: WidgetId, width: usize, height: usize, pixels: Vec<BltPixel>) -> Result<WidgetId> {
        self.add(parent, Kind::Image { width, height, pixels })
    }

    pub fn add_calendar(&mut self, parent: WidgetId, today: CalendarDate) -> Result<WidgetId> {
        self.add(parent, Kind::Calendar(today))
    }

    pub fn add_clock(&mut self, parent: WidgetId, face: ClockFace) -> Result<WidgetId> {
        self.add(parent, Kind::Clock(face))
    }

    pub fn add_tabview(&mut self, title: &str) -> Result<WidgetId> {
        let root = self.root();
        self.add(root, Kind::TabView { active: 0, title: title.to_string() })
    }

    /// Appends a tab; every tab after the first starts hidden.
    pub fn add_tab(&mut self, tabview: WidgetId, name: &str) -> Result<WidgetId> {
        if !matches!(self.tree.get(tabview)?.kind, Kind::TabView { .. }) {
            return Err(Error::UnknownWidget);
        }
        let id = self.add(tabview, Kind::Tab { name: name.to_string() })?;
        let index = self.tree.children(tabview).len() - 1;
        if index != self.active_tab(tabview)? {
            self.tree.get_mut(id)?.state.insert(WidgetState::HIDDEN);
        }
        Ok(id)
    }

    pub fn set_flow(&mut self, id: WidgetId, flow: Flow) -> Result<()> {
        self.tree.get_mut(id)?.flow = flow;
        self.relayout();
        Ok(())
    }

    pub fn set_size(&mut self, id: WidgetId, width: Size, height: Size) -> Result<()> {
        let widget = self.tree.get_mut(id)?;
        widget.width = width;
        widget.height = height;
        self.relayout();
        Ok(())
    }

    pub fn set_clock(&mut self, id: WidgetId, face: ClockFace) -> Result<()> {
        let widget = self.tree.get_mut(id)?;
        match &mut widget.kind {
            Kind::Clock(current) => {
                if *current != face {
                    *current = face;
                    let area = widget.area;
                    self.invalidate(area);
                }
                Ok(())
            }
            _ => Err(Error::UnknownWidget),
        }
    }

    pub fn add_state(&mut self, id: WidgetId, state: WidgetState) -> Result<()> {
        let widget = self.tree.get_mut(id)?;
        widget.state.insert(state);
        let area = widget.area;
        self.invalidate(area);
        Ok(())
    }

    pub fn clear_state(&mut self, id: WidgetId, state: WidgetState) -> Result<()> {
        let widget = self.tree.get_mut(id)?;
        widget.state.remove(state);
        let area = widget.area;
        self.invalidate(area);
        Ok(())
    }

    pub fn has_state(&self, id: WidgetId, state: WidgetState) -> bool {
        self.tree.get(id).is_ok_and(|w| w.state.contains(state))
    }

    /// Deletes a widget and its subtree, dropping them from every group.
    pub fn delete(&mut self, id: WidgetId) -> Result<()> {
        for gone in self.tree.remove(id)? {
            self.focus.forget(gone);
            if self.pressed == Some(gone) {
                self.pressed = None;
            }
            if self.shown_focus == Some(gone) {
                self.shown_focus = None;
            }
        }
        self.relayout();
        Ok(())
    }

    fn in_modal(&self, mut id: WidgetId) -> bool {
        loop {
            let Ok(widget) = self.tree.get(id) else {
                return false;
            };
            if let Kind::MsgBox { .. } = widget.kind {
                return true;
            }
            match widget.parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    // ---- tabs -------------------------------------------------------------

    pub fn active_tab(&self, tabview: WidgetId) -> Result<usize> {
        match self.tree.get(tabview)?.kind {
            Kind::TabView { active, .. } => Ok(active),
            _ => Err(Error::UnknownWidget),
        }
    }

    pub fn set_active_tab(&mut self, tabview: WidgetId, index: usize) -> Result<()> {
        if self.active_tab(tabview)? == index {
            return Ok(());
        }
        self.tree.set_active_tab(tabview, index)?;
        self.invalidate_all();
        Ok(())
    }

    fn tabviews(&self) -> Vec<WidgetId> {
        self.tree
            .iter()
            .filter(|(_, w)| matches!(w.kind, Kind::TabView { .. }))
            .map(|(id, _)| id)
            .collect()
    }

    /// Makes the tab holding `id` the active one.
    fn reveal(&mut self, id: WidgetId) -> Result<()> {
        let mut cursor = id;
        while let Some((tabview, index)) = self.tree.enclosing_tab(cursor) {
            self.set_active_tab(tabview, index)?;
            cursor = tabview;
        }
        Ok(())
    }

    // ---- focus groups -----------------------------------------------------

    pub fn create_group(&mut self) -> GroupId {
        self.focus.create()
    }

    pub fn delete_group(&mut self, group: GroupId) -> Result<()> {
        self.focus.delete(group)
    }

    pub fn group_exists(&self, group: GroupId) -> bool {
        self.focus.exists(group)
    }

    pub fn live_groups(&self) -> usize {
        self.focus.live_count()
    }

    pub fn default_group(&self) -> Option<GroupId> {
        self.focus.default_group()
    }

    pub fn set_default_group(&mut self, group: Option<GroupId>) -> Result<()> {
        self.focus.set_default(group)
    }

    pub fn group_add(&mut self, group: GroupId, id: WidgetId) -> Result<()> {
        self.tree.get(id)?;
        self.focus.add(group, id)
    }

    pub fn group_members(&self, group: GroupId) -> Result<&[WidgetId]> {
        self.focus.members(group)
    }

    pub fn focused(&self, group: GroupId) -> Option<WidgetId> {
        self.focus.focused(group)
    }

    pub fn focus(&mut self, group: GroupId, id: WidgetId) -> Result<()> {
        self.focus.focus(group, id)?;
        self.reveal(id)
    }

    pub fn keypad_groups(&self) -> Vec<Option<GroupId>> {
        self.focus
            .keypads()
            .map(|k| self.focus.keypad_group(k))
            .collect()
    }

    /// Binds every keypad device to `group`.
    pub fn bind_all_keypads(&mut self, group: Option<GroupId>) -> Result<()> {
        self.focus.bind_all_keypads(group)
    }

    /// Group key navigation acts on: the keypad's group, else the default.
    fn active_group(&self) -> Option<GroupId> {
        match self.keypad {
            Some(keypad) => self.focus.keypad_group(keypad),
            None => self.focus.default_group(),
        }
    }

    /// Moves the focus highlight to the active group's focused widget.
    fn sync_focus(&mut self) {
        let target = self.active_group().and_then(|g| self.focus.focused(g));
        if target == self.shown_focus {
            return;
        }
        if let Some(old) = self.shown_focus.take() {
            let _ = self.clear_state(old, WidgetState::FOCUSED);
        }
        if let Some(new) = target {
            if self.add_state(new, WidgetState::FOCUSED).is_ok() {
                self.shown_focus = Some(new);
            }
        }
    }

    // ---- message boxes ----------------------------------------------------

    /// Creates a centred modal message box with footer buttons. The buttons
    /// are not added to any group.
    pub fn create_msgbox(&mut self, title: &str, text: &str, buttons: &[&str]) -> Result<MsgBox> {
        let root = self.root();
        let msgbox = self.add(
            root,
            Kind::MsgBox {
                title: title.to_string(),
                text: text.to_string(),
            },
        )?;
        let mut ids = Vec::with_capacity(buttons.len());
        for label in buttons {
            ids.push(self.add_button(msgbox, label)?);
        }
        self.invalidate_all();
        Ok(MsgBox { msgbox, buttons: ids })
    }

    pub fn close_msgbox(&mut self, msgbox: WidgetId) -> Result<()> {
        if !matches!(self.tree.get(msgbox)?.kind, Kind::MsgBox { .. }) {
            return Err(Error::UnknownWidget);
        }
        self.delete(msgbox)?;
        self.invalidate_all();
        Ok(())
    }

    fn top_modal(&self) -> Option<WidgetId> {
        self.tree
            .children(self.root())
            .iter()
            .rev()
            .copied()
            .find(|&c| matches!(self.tree.get(c).map(|w| &w.kind), Ok(Kind::MsgBox { .. })))
    }

    pub fn modal_open(&self) -> bool {
        self.top_modal().is_some()
    }

    // ---- timers -----------------------------------------------------------

    pub fn create_timer(&mut self, period_ms: u64, ready: bool) -> TimerId {
        self.timers.create(period_ms, self.now_ms, ready)
    }

    pub fn delete_timer(&mut self, timer: TimerId) {
        self.timers.delete(timer);
    }

    // ---- damage -----------------------------------------------------------

    pub fn invalidate(&mut self, area: Rect) {
        if area.is_empty() {
            return;
        }
        self.dirty = Some(match self.dirty {
            Some(d) => d.union(&area),
            None => area,
        });
    }

    pub fn invalidate_all(&mut self) {
        self.dirty = Some(self.screen().rect());
    }

    fn relayout(&mut self) {
        self.needs_layout = true;
        self.invalidate_all();
    }

    // ---- the tick ---------------------------------------------------------

    pub fn handle(&mut self, now_ms: u64) -> Result<()> {
        self.now_ms = now_ms;
        for timer in self.timers.due(now_ms) {
            self.events.push(UiEvent::Timer(timer));
        }
        if self.needs_layout {
            layout::layout(&mut self.tree, &self.metrics);
            self.needs_layout = false;
        }
        self.poll_pointer()?;
        self.poll_keypad()?;
        self.sync_focus();
        if self.needs_layout {
            layout::layout(&mut self.tree, &self.metrics);
            self.needs_layout = false;
        }
        self.render()
    }

    fn hit(&self, x: i32, y: i32) -> Option<WidgetId> {
        match self.top_modal() {
            Some(modal) => self.tree.hit_test(modal, x, y),
            None => self.tree.hit_test(self.root(), x, y),
        }
    }

    fn hit_tab_bar(&self, x: i32, y: i32) -> Option<(WidgetId, usize)> {
        if self.modal_open() {
            return None;
        }
        for tabview in self.tabviews() {
            if !self.tree.is_visible(tabview) {
                continue;
            }
            let buttons = layout::tab_buttons(&self.tree, tabview, &self.metrics);
            if let Some(index) = buttons.iter().position(|r| r.contains(x, y)) {
                return Some((tabview, index));
            }
        }
        None
    }

    fn poll_pointer(&mut self) -> Result<()> {
        let Some(report) = self.input.poll_pointer() else {
            return Ok(());
        };
        let previous = self.pointer.replace(report);
        let was_pressed = previous.is_some_and(|p| p.pressed);

        if previous.map(|p| (p.x, p.y)) != Some((report.x, report.y)) {
            let cursor = self.input.tracker().cursor_rect();
            if let Some(old) = self.cursor_area.replace(cursor) {
                self.invalidate(old);
            }
            self.invalidate(cursor);
        }

        if report.pressed && !was_pressed {
            if let Some((tabview, index)) = self.hit_tab_bar(report.x, report.y) {
                self.set_active_tab(tabview, index)?;
            } else if let Some(target) = self.hit(report.x, report.y) {
                self.add_state(target, WidgetState::PRESSED)?;
                self.pressed = Some(target);
                if let Some(group) = self.active_group() {
                    if self.focus.members(group).is_ok_and(|m| m.contains(&target)) {
                        self.focus.focus(group, target)?;
                    }
                }
            }
        } else if !report.pressed {
            if let Some(target) = self.pressed.take() {
                self.clear_state(target, WidgetState::PRESSED)?;
                if self.hit(report.x, report.y) == Some(target) {
                    self.events.push(UiEvent::Clicked(target));
                }
            }
        }
        Ok(())
    }

    fn poll_keypad(&mut self) -> Result<()> {
        if self.keypad.is_none() {
            return Ok(());
        }
        let Some(key) = self.input.poll_key().key else {
            return Ok(());
        };
        let group = self.active_group();
        match key {
            UiKey::Next | UiKey::Down => self.step_focus(group, true)?,
            UiKey::Prev | UiKey::Up => self.step_focus(group, false)?,
            UiKey::Left | UiKey::Right if self.modal_open() => {
                self.step_focus(group, key == UiKey::Right)?
            }
            UiKey::Left | UiKey::Right => self.step_tab(key == UiKey::Right)?,
            UiKey::Enter => {
                if let Some(target) = group.and_then(|g| self.focus.focused(g)) {
                    self.events.push(UiEvent::Clicked(target));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn step_focus(&mut self, group: Option<GroupId>, forward: bool) -> Result<()> {
        let Some(group) = group else {
            return Ok(());
        };
        let tree = &self.tree;
        let exists = |id: WidgetId| tree.contains(id);
        let moved = if forward {
            self.focus.focus_next(group, exists)
        } else {
            self.focus.focus_prev(group, exists)
        };
        if let Some(id) = moved {
            self.reveal(id)?;
        }
        Ok(())
    }

    fn step_tab(&mut self, forward: bool) -> Result<()> {
        let Some(tabview) = self.tabviews().into_iter().next() else {
            return Ok(());
        };
        let count = self.tree.children(tabview).len();
        if count == 0 {
            return Ok(());
        }
        let active = self.active_tab(tabview)?;
        let next = if forward {
            (active + 1).min(count - 1)
        } else {
            active.saturating_sub(1)
        };
        self.set_active_tab(tabview, next)
    }

    fn render(&mut self) -> Result<()> {
        let Some(dirty) = self.dirty.take() else {
            return Ok(());
        };
        let screen = self.display.screen();
        let Some(dirty) = dirty.intersect(&screen.rect()) else {
            return Ok(());
        };
        let pixels = self.display.draw_buffer()?;
        let mut canvas = Canvas::new(pixels, screen.width, screen.height, self.metrics.scale);
        render::draw_tree(&mut canvas, &self.tree, &self.metrics, dirty);
        if self.pointer.is_some() {
            canvas.set_clip(dirty);
            self.input.tracker().draw_cursor(&mut canvas);
        }
        match self.display.flush_region(dirty) {
            Ok(()) => self.display.finish_frame(),
            Err(Error::DisplayClosed) => return Err(Error::DisplayClosed),
            Err(e) => {
                log::warn!("flush of {:?} failed, retrying: {}", dirty, e);
                self.invalidate(dirty);
            }
        }
        Ok(())
    }

    /// Releases the display buffers and input devices.
    pub fn close(&mut self) {
        self.timers.clear();
        self.input.close();
        self.display.close();
        self.events.clear();
        self.dirty = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui::keyboard::{KeyStroke, CHAR_CARRIAGE_RETURN, CHAR_TAB, SCAN_LEFT, SCAN_RIGHT};
    use crate::testing::Rig;
    use alloc::vec;

    fn centre(ui: &Ui, id: WidgetId) -> (u64, u64) {
        let area = ui.widget(id).unwrap().area;
        ((area.x + area.w / 2) as u64, (area.y + area.h / 2) as u64)
    }

    #[test]
    fn failed_flush_is_retried_on_the_next_tick() {
        let rig = Rig::new(64, 48);
        let mut ui = rig.ui();
        rig.screen.fail_blits(1);

        ui.handle(0).unwrap();
        assert!(rig.screen.blits().is_empty());

        ui.handle(10).unwrap();
        let blits = rig.screen.blits();
        assert_eq!(blits.len(), 1);
        assert_eq!(blits[0].dims, (64, 48));
    }

    #[test]
    fn press_and_release_over_a_button_clicks_it() {
        let rig = Rig::new(640, 480);
        let mut ui = rig.ui();
        let root = ui.root();
        let panel = ui.add_container(root, Flow::Column).unwrap();
        let ok = ui.add_button(panel, "OK").unwrap();
        ui.handle(0).unwrap();

        let (x, y) = centre(&ui, ok);
        rig.point(x, y, true);
        ui.handle(10).unwrap();
        assert!(ui.has_state(ok, WidgetState::PRESSED));
        assert!(ui.take_events().is_empty());

        rig.point(x, y, false);
        ui.handle(20).unwrap();
        assert!(!ui.has_state(ok, WidgetState::PRESSED));
        assert_eq!(ui.take_events(), vec![UiEvent::Clicked(ok)]);
    }

    #[test]
    fn release_away_from_the_button_does_not_click() {
        let rig = Rig::new(640, 480);
        let mut ui = rig.ui();
        let root = ui.root();
        let panel = ui.add_container(root, Flow::Column).unwrap();
        let ok = ui.add_button(panel, "OK").unwrap();
        ui.handle(0).unwrap();

        let (x, y) = centre(&ui, ok);
        rig.point(x, y, true);
        ui.handle(10).unwrap();
        rig.point(400, 400, false);
        ui.handle(20).unwrap();
        assert!(ui.take_events().is_empty());
    }

    #[test]
    fn tab_key_moves_focus_into_hidden_tab_and_enter_clicks() {
        let rig = Rig::new(640, 480);
        let mut ui = rig.ui();
        let group = ui.create_group();
        ui.set_default_group(Some(group)).unwrap();
        ui.bind_all_keypads(Some(group)).unwrap();
        let tv = ui.add_tabview("Setup").unwrap();
        let first = ui.add_tab(tv, "A").unwrap();
        let second = ui.add_tab(tv, "B").unwrap();
        let a = ui.add_button(first, "a").unwrap();
        let b = ui.add_button(second, "b").unwrap();
        ui.handle(0).unwrap();
        assert_eq!(ui.focused(group), Some(a));
        assert!(ui.has_state(a, WidgetState::FOCUSED));

        rig.key(KeyStroke::unicode(CHAR_TAB));
        ui.handle(10).unwrap();
        assert_eq!(ui.focused(group), Some(b));
        assert_eq!(ui.active_tab(tv), Ok(1));
        assert!(ui.has_state(b, WidgetState::FOCUSED));
        assert!(!ui.has_state(a, WidgetState::FOCUSED));

        rig.key(KeyStroke::unicode(CHAR_CARRIAGE_RETURN));
        ui.handle(20).unwrap();
        assert_eq!(ui.take_events(), vec![UiEvent::Clicked(b)]);
    }

    #[test]
    fn arrow_keys_switch_tabs_within_bounds() {
        let rig = Rig::new(640, 480);
        let mut ui = rig.ui();
        let tv = ui.add_tabview("Setup").unwrap();
        ui.add_tab(tv, "A").unwrap();
        let second = ui.add_tab(tv, "B").unwrap();
        assert!(!ui.tree().is_visible(second));

        rig.key(KeyStroke::scan(SCAN_RIGHT));
        ui.handle(0).unwrap();
        assert_eq!(ui.active_tab(tv), Ok(1));
        assert!(ui.tree().is_visible(second));
        rig.key(KeyStroke::scan(SCAN_RIGHT));
        ui.handle(10).unwrap();
        assert_eq!(ui.active_tab(tv), Ok(1));
        rig.key(KeyStroke::scan(SCAN_LEFT));
        ui.handle(20).unwrap();
        assert_eq!(ui.active_tab(tv), Ok(0));
    }

    #[test]
    fn clicking_a_tab_header_switches_tabs() {
        let rig = Rig::new(640, 480);
        let mut ui = rig.ui();
        let tv = ui.add_tabview("Setup").unwrap();
        ui.add_tab(tv, "A").unwrap();
        ui.add_tab(tv, "B").unwrap();
        ui.handle(0).unwrap();

        let header = layout::tab_buttons(ui.tree(), tv, ui.metrics())[1];
        rig.point((header.x + 4) as u64, (header.y + 4) as u64, true);
        ui.handle(10).unwrap();
        assert_eq!(ui.active_tab(tv), Ok(1));
    }

    #[test]
    fn msgbox_is_modal_and_outside_the_default_group() {
        let rig = Rig::new(640, 480);
        let mut ui = rig.ui();
        let group = ui.create_group();
        ui.set_default_group(Some(group)).unwrap();
        let root = ui.root();
        let panel = ui.add_container(root, Flow::Column).unwrap();
        let under = ui.add_button(panel, "under").unwrap();
        let dialog = ui.create_msgbox("Exit?", "Exit this APP?", &["Yes", "No"]).unwrap();
        assert_eq!(ui.group_members(group).unwrap(), &[under]);
        assert!(ui.modal_open());
        ui.handle(0).unwrap();

        let (x, y) = centre(&ui, under);
        rig.point(x, y, true);
        ui.handle(10).unwrap();
        rig.point(x, y, false);
        ui.handle(20).unwrap();
        assert!(ui.take_events().is_empty());

        let (x, y) = centre(&ui, dialog.buttons[0]);
        rig.point(x, y, true);
        ui.handle(30).unwrap();
        rig.point(x, y, false);
        ui.handle(40).unwrap();
        assert_eq!(ui.take_events(), vec![UiEvent::Clicked(dialog.buttons[0])]);

        ui.close_msgbox(dialog.msgbox).unwrap();
        assert!(!ui.modal_open());
        assert!(ui.widget(dialog.buttons[1]).is_err());
    }

    #[test]
    fn deleting_a_widget_drops_it_from_its_group() {
        let rig = Rig::new(320, 240);
        let mut ui = rig.ui();
        let group = ui.create_group();
        ui.set_default_group(Some(group)).unwrap();
        let root = ui.root();
        let list = ui.add_list(root).unwrap();
        let first = ui.add_list_button(list, "one").unwrap();
        let second = ui.add_list_button(list, "two").unwrap();
        ui.delete(first).unwrap();
        assert_eq!(ui.group_members(group).unwrap(), &[second]);
        ui.delete(list).unwrap();
        assert!(ui.group_members(group).unwrap().is_empty());
    }

    #[test]
    fn timers_are_reported_as_events() {
        let rig = Rig::new(320, 240);
        let mut ui = rig.ui();
        let timer = ui.create_timer(250, true);
        ui.handle(0).unwrap();
        assert_eq!(ui.take_events(), vec![UiEvent::Timer(timer)]);
        ui.handle(100).unwrap();
        assert!(ui.take_events().is_empty());
        ui.handle(250).unwrap();
        assert_eq!(ui.take_events(), vec![UiEvent::Timer(timer)]);
    }

    #[test]
    fn only_damaged_areas_are_flushed() {
        let rig = Rig::new(320, 240);
        let mut ui = rig.ui();
        let root = ui.root();
        let panel = ui.add_container(root, Flow::Column).unwrap();
        let ok = ui.add_button(panel, "OK").unwrap();
        ui.handle(0).unwrap();
        let blits = rig.screen.blits();
        assert_eq!(blits.len(), 1);
        assert_eq!(blits[0].dims, (320, 240));

        ui.handle(10).unwrap();
        assert_eq!(rig.screen.blits().len(), 1);

        ui.add_state(ok, WidgetState::CHECKED).unwrap();
        ui.handle(20).unwrap();
        let blits = rig.screen.blits();
        assert_eq!(blits.len(), 2);
        let area = ui.widget(ok).unwrap().area;
        assert_eq!(blits[1].dest, (area.x, area.y));
        assert_eq!(blits[1].dims, (area.w, area.h));
    }

    #[test]
    fn closed_ui_cannot_render() {
        let rig = Rig::new(64, 64);
        let mut ui = rig.ui();
        ui.close();
        ui.invalidate_all();
        assert_eq!(ui.handle(10), Err(Error::DisplayClosed));
    }
}
