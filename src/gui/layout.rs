use alloc::vec::Vec;

use super::font;
use super::gop::Rect;
use super::widget::{Flow, Kind, WidgetId, WidgetTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    pub scale: usize,
    pub line_h: usize,
    pub pad: usize,
    pub gap: usize,
}

impl Metrics {
    pub fn new(scale: usize) -> Self {
        let scale = scale.max(1);
        Self {
            scale,
            line_h: font::line_height(scale),
            pad: 4 * scale,
            gap: 6 * scale,
        }
    }

    pub fn text_w(&self, text: &str) -> usize {
        font::text_width(text, self.scale)
    }

    pub fn button_h(&self) -> usize {
        self.line_h + 2 * self.pad
    }

    pub fn row_h(&self) -> usize {
        self.line_h + 2 * self.pad
    }

    pub fn tab_bar_h(&self) -> usize {
        self.line_h * 2
    }
}

fn shrink(area: Rect, by: usize) -> Rect {
    Rect::new(
        area.x + by,
        area.y + by,
        area.w.saturating_sub(2 * by),
        area.h.saturating_sub(2 * by),
    )
}

/// Lays out the whole tree from the screen down.
pub fn layout(tree: &mut WidgetTree, m: &Metrics) {
    let root = tree.root();
    let Ok(area) = tree.get(root).map(|w| w.area) else {
        return;
    };
    place(tree, root, area, m);
}

/// Tab buttons share the right half of the bar; the title sits on the left.
pub fn tab_buttons(tree: &WidgetTree, tabview: WidgetId, m: &Metrics) -> Vec<Rect> {
    let Ok(widget) = tree.get(tabview) else {
        return Vec::new();
    };
    let count = widget.children.len();
    if count == 0 {
        return Vec::new();
    }
    let area = widget.area;
    let start = area.x + area.w / 2;
    let each = (area.w - area.w / 2) / count;
    (0..count)
        .map(|i| Rect::new(start + i * each, area.y, each, m.tab_bar_h()))
        .collect()
}

fn content_size(tree: &WidgetTree, id: WidgetId, avail_w: usize, avail_h: usize, m: &Metrics) -> (usize, usize) {
    let Ok(widget) = tree.get(id) else {
        return (0, 0);
    };
    match &widget.kind {
        Kind::Label { text } => (m.text_w(text), m.line_h),
        Kind::Button { text } | Kind::ListButton { text } => {
            (m.text_w(text) + 4 * m.pad, m.button_h())
        }
        Kind::Table { title, rows } => {
            let key_w = rows.iter().map(|(k, _)| m.text_w(k)).max().unwrap_or(0);
            let value_w = rows.iter().map(|(_, v)| m.text_w(v)).max().unwrap_or(0);
            let w = (2 * key_w.max(value_w)).max(m.text_w(title)) + 4 * m.pad;
            (w, (rows.len() + 1) * m.row_h() + 4)
        }
        Kind::List => {
            let n = widget.children.len();
            let h = n * (m.button_h() + m.gap) + 2 * m.pad;
            (avail_w, h.min(avail_h * 9 / 10))
        }
        Kind::MsgBox { title, text } => {
            let buttons: usize = widget
                .children
                .iter()
                .map(|&c| content_size(tree, c, avail_w, avail_h, m).0 + m.gap)
                .sum();
            let w = m.text_w(title).max(m.text_w(text)).max(buttons) + 4 * m.pad;
            let h = 2 * m.line_h + m.button_h() + 5 * m.pad;
            (w.max(avail_w / 3).min(avail_w), h)
        }
        Kind::Image { width, height, .. } => (*width, *height),
        Kind::Calendar(_) | Kind::Clock(_) => (300, 300),
        Kind::Screen | Kind::Container | Kind::TabView { .. } | Kind::Tab { .. } => {
            (avail_w, avail_h)
        }
    }
}

pub fn measure(tree: &WidgetTree, id: WidgetId, avail_w: usize, avail_h: usize, m: &Metrics) -> (usize, usize) {
    let Ok(widget) = tree.get(id) else {
        return (0, 0);
    };
    let (cw, ch) = content_size(tree, id, avail_w, avail_h, m);
    (
        widget.width.resolve(avail_w, cw),
        widget.height.resolve(avail_h, ch),
    )
}

fn place(tree: &mut WidgetTree, id: WidgetId, area: Rect, m: &Metrics) {
    let Ok(widget) = tree.get_mut(id) else {
        return;
    };
    widget.area = area;
    let children = widget.children.clone();
    let flow = widget.flow;
    let role = match widget.kind {
        Kind::Screen => Role::Screen,
        Kind::TabView { .. } => Role::TabView,
        Kind::Tab { .. } | Kind::Container => Role::Flow,
        Kind::List => Role::List,
        Kind::MsgBox { .. } => Role::MsgBox,
        _ => Role::Leaf,
    };

    match role {
        Role::Screen => {
            for child in children {
                let is_modal = matches!(tree.get(child).map(|w| &w.kind), Ok(Kind::MsgBox { .. }));
                if is_modal {
                    let (w, h) = measure(tree, child, area.w, area.h, m);
                    let rect = Rect::new(
                        area.x + area.w.saturating_sub(w) / 2,
                        area.y + area.h.saturating_sub(h) / 2,
                        w,
                        h,
                    );
                    place(tree, child, rect, m);
                } else {
                    place(tree, child, area, m);
                }
            }
        }
        Role::TabView => {
            let bar = m.tab_bar_h().min(area.h);
            let content = Rect::new(area.x, area.y + bar, area.w, area.h - bar);
            for child in children {
                place(tree, child, content, m);
            }
        }
        Role::Flow => flow_children(tree, &children, area, flow, m),
        Role::List => {
            let inner = shrink(area, m.pad);
            let mut y = inner.y;
            for child in children {
                let (w, h) = measure(tree, child, inner.w, m.button_h(), m);
                place(tree, child, Rect::new(inner.x, y, w, h), m);
                y += h + m.gap;
            }
        }
        Role::MsgBox => {
            let inner = shrink(area, 2 * m.pad);
            let y = inner.bottom().saturating_sub(m.button_h());
            let mut x = inner.right();
            for child in children.into_iter().rev() {
                let (w, h) = measure(tree, child, inner.w, m.button_h(), m);
                x = x.saturating_sub(w);
                place(tree, child, Rect::new(x, y, w, h), m);
                x = x.saturating_sub(m.gap);
            }
        }
        Role::Leaf => {}
    }
}

enum Role {
    Screen,
    TabView,
    Flow,
    List,
    MsgBox,
    Leaf,
}

fn flow_children(tree: &mut WidgetTree, children: &[WidgetId], area: Rect, flow: Flow, m: &Metrics) {
    let inner = shrink(area, m.pad);
    let mut x = inner.x;
    let mut y = inner.y;
    let mut span = 0;
    for &child in children {
        match flow {
            Flow::Column => {
                let (w, h) = measure(tree, child, inner.w, inner.bottom().saturating_sub(y), m);
                place(tree, child, Rect::new(x, y, w, h), m);
                y += h + m.gap;
            }
            Flow::ColumnWrap => {
                let (w, h) = measure(tree, child, inner.w, inner.h, m);
                if y > inner.y && y + h > inner.bottom() {
                    x += span + m.gap;
                    y = inner.y;
                    span = 0;
                }
                place(tree, child, Rect::new(x, y, w, h), m);
                y += h + m.gap;
                span = span.max(w);
            }
            Flow::Row => {
                let (w, h) = measure(tree, child, inner.right().saturating_sub(x), inner.h, m);
                place(tree, child, Rect::new(x, y, w, h), m);
                x += w + m.gap;
            }
        }
    }
}
