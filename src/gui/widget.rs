use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use bitflags::bitflags;
use uefi::proto::console::gop::BltPixel;

use super::gop::Rect;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WidgetId(usize);

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct WidgetState: u8 {
        const CHECKED = 1 << 0;
        const FOCUSED = 1 << 1;
        const PRESSED = 1 << 2;
        const HIDDEN = 1 << 3;
    }
}

/// How a container places its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flow {
    #[default]
    Column,
    /// Column that starts a new column when the bottom edge is reached.
    ColumnWrap,
    Row,
}

/// Requested extent along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// Sized from content.
    Content,
    /// Take all the space the parent offers.
    Fill,
    Px(usize),
    Percent(u8),
}

impl Size {
    pub fn resolve(self, available: usize, content: usize) -> usize {
        match self {
            Size::Content => content,
            Size::Fill => available,
            Size::Px(px) => px,
            Size::Percent(pct) => available * pct as usize / 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockFace {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl ClockFace {
    /// Hour needle position on the 60-step dial.
    pub fn hour_value(&self) -> u8 {
        (self.hour % 12) * 5 + self.minute / 12
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl CalendarDate {
    pub fn is_leap_year(year: u16) -> bool {
        (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
    }

    pub fn days_in_month(year: u16, month: u8) -> u8 {
        match month {
            2 if Self::is_leap_year(year) => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// 0 = Sunday.
    pub fn day_of_week(year: u16, month: u8, day: u8) -> u8 {
        const OFFSETS: [u16; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
        let month = month.clamp(1, 12);
        let y = if month < 3 { year.saturating_sub(1) } else { year };
        let sum = y + y / 4 - y / 100 + y / 400 + OFFSETS[month as usize - 1] + day as u16;
        (sum % 7) as u8
    }

    pub fn month_name(month: u8) -> &'static str {
        const NAMES: [&str; 12] = [
            "January",
            "February",
            "March",
            "April",
            "May",
            "June",
            "July",
            "August",
            "September",
            "October",
            "November",
            "December",
        ];
        NAMES.get(month.wrapping_sub(1) as usize).copied().unwrap_or("?")
    }
}

pub enum Kind {
    Screen,
    Container,
    TabView { active: usize, title: String },
    Tab { name: String },
    Label { text: String },
    /// Two-column table under a merged title row.
    Table { title: String, rows: Vec<(String, String)> },
    List,
    ListButton { text: String },
    Button { text: String },
    MsgBox { title: String, text: String },
    Image { width: usize, height: usize, pixels: Vec<BltPixel> },
    Calendar(CalendarDate),
    Clock(ClockFace),
}

impl Kind {
    fn default_size(&self) -> (Size, Size) {
        match self {
            Kind::Screen | Kind::TabView { .. } | Kind::Tab { .. } | Kind::Container => {
                (Size::Fill, Size::Fill)
            }
            Kind::Table { .. } => (Size::Percent(45), Size::Content),
            Kind::List => (Size::Percent(95), Size::Content),
            Kind::ListButton { .. } => (Size::Percent(80), Size::Content),
            Kind::Calendar(_) | Kind::Clock(_) => (Size::Px(300), Size::Px(300)),
            _ => (Size::Content, Size::Content),
        }
    }
}

pub struct Widget {
    pub kind: Kind,
    pub parent: Option<WidgetId>,
    pub children: Vec<WidgetId>,
    pub area: Rect,
    pub state: WidgetState,
    pub flow: Flow,
    pub width: Size,
    pub height: Size,
}

impl Widget {
    pub fn is_focusable(&self) -> bool {
        matches!(self.kind, Kind::Button { .. } | Kind::ListButton { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            Kind::Label { text } | Kind::Button { text } | Kind::ListButton { text } => Some(text),
            Kind::Tab { name } => Some(name),
            Kind::MsgBox { title, .. } | Kind::Table { title, .. } => Some(title),
            _ => None,
        }
    }
}

// Deleted slots are never reused, so a stale id fails instead of aliasing.
pub struct WidgetTree {
    slots: Vec<Option<Widget>>,
}

impl WidgetTree {
    pub fn new(screen: Rect) -> Self {
        let (width, height) = Kind::Screen.default_size();
        let root = Widget {
            kind: Kind::Screen,
            parent: None,
            children: Vec::new(),
            area: screen,
            state: WidgetState::empty(),
            flow: Flow::Column,
            width,
            height,
        };
        Self {
            slots: vec![Some(root)],
        }
    }

    pub fn root(&self) -> WidgetId {
        WidgetId(0)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    pub fn get(&self, id: WidgetId) -> Result<&Widget> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownWidget)
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Result<&mut Widget> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownWidget)
    }

    pub fn add(&mut self, parent: WidgetId, kind: Kind) -> Result<WidgetId> {
        self.get(parent)?;
        let id = WidgetId(self.slots.len());
        let (width, height) = kind.default_size();
        self.slots.push(Some(Widget {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            area: Rect::default(),
            state: WidgetState::empty(),
            flow: Flow::Column,
            width,
            height,
        }));
        self.get_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Removes `id` and its subtree; returns every removed id, `id` first.
    pub fn remove(&mut self, id: WidgetId) -> Result<Vec<WidgetId>> {
        if id == self.root() {
            return Err(Error::UnknownWidget);
        }
        let parent = self.get(id)?.parent;
        if let Some(parent) = parent {
            if let Ok(p) = self.get_mut(parent) {
                p.children.retain(|&c| c != id);
            }
        }
        let removed = self.descendants(id);
        for &gone in &removed {
            self.slots[gone.0] = None;
        }
        Ok(removed)
    }

    /// `id` followed by its subtree in pre-order.
    pub fn descendants(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Ok(widget) = self.get(next) else {
                continue;
            };
            out.push(next);
            stack.extend(widget.children.iter().rev().copied());
        }
        out
    }

    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.get(id).map(|w| w.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_visible(&self, id: WidgetId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Ok(widget) = self.get(current) else {
                return false;
            };
            if widget.state.contains(WidgetState::HIDDEN) {
                return false;
            }
            cursor = widget.parent;
        }
        true
    }

    /// The tab view and tab index `id` lives under, if any.
    pub fn enclosing_tab(&self, id: WidgetId) -> Option<(WidgetId, usize)> {
        let mut cursor = id;
        loop {
            let widget = self.get(cursor).ok()?;
            let parent = widget.parent?;
            if let Kind::Tab { .. } = widget.kind {
                let index = self.children(parent).iter().position(|&c| c == cursor)?;
                return Some((parent, index));
            }
            cursor = parent;
        }
    }

    /// Shows tab `index` of `tabview` and hides the others.
    pub fn set_active_tab(&mut self, tabview: WidgetId, index: usize) -> Result<()> {
        let tabs = self.get(tabview)?.children.clone();
        if index >= tabs.len() {
            return Err(Error::UnknownWidget);
        }
        for (i, tab) in tabs.iter().enumerate() {
            self.get_mut(*tab)?.state.set(WidgetState::HIDDEN, i != index);
        }
        if let Kind::TabView { active, .. } = &mut self.get_mut(tabview)?.kind {
            *active = index;
        }
        Ok(())
    }

    /// Deepest visible focusable widget under the point, searching the
    /// subtree of `from`. Later siblings are on top.
    pub fn hit_test(&self, from: WidgetId, x: i32, y: i32) -> Option<WidgetId> {
        let widget = self.get(from).ok()?;
        if widget.state.contains(WidgetState::HIDDEN) {
            return None;
        }
        for &child in widget.children.iter().rev() {
            if let Some(hit) = self.hit_test(child, x, y) {
                return Some(hit);
            }
        }
        (widget.is_focusable() && widget.area.contains(x, y)).then_some(from)
    }

    pub fn iter(&self) -> impl Iterator<Item = (WidgetId, &Widget)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|w| (WidgetId(i), w)))
    }
}
