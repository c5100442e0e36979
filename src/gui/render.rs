use alloc::string::String;
use alloc::vec::Vec;
use core::f32::consts::PI;

use super::canvas::Canvas;
use super::gop::{Color, Rect};
use super::layout::{tab_buttons, Metrics};
use super::widget::{CalendarDate, ClockFace, Kind, WidgetId, WidgetState, WidgetTree};

const SECOND_HAND: i32 = 120;
const MINUTE_HAND: i32 = 100;
const HOUR_HAND: i32 = 80;

const TITLE_INSET: usize = 25;

/// Redraws everything intersecting `dirty`, modal message boxes last.
pub fn draw_tree(canvas: &mut Canvas<'_>, tree: &WidgetTree, m: &Metrics, dirty: Rect) {
    let root = tree.root();
    let Ok(screen) = tree.get(root) else {
        return;
    };
    canvas.set_clip(dirty);
    canvas.fill_rect(screen.area, Color::SCREEN_BG);

    let (modal, normal): (Vec<WidgetId>, Vec<WidgetId>) = screen
        .children
        .iter()
        .copied()
        .partition(|&c| matches!(tree.get(c).map(|w| &w.kind), Ok(Kind::MsgBox { .. })));
    for child in normal {
        draw_widget(canvas, tree, child, dirty, m);
    }
    for child in modal {
        canvas.set_clip(dirty);
        canvas.shade_rect(screen.area, Color::GREY, 178);
        draw_widget(canvas, tree, child, dirty, m);
    }
}

fn draw_widget(canvas: &mut Canvas<'_>, tree: &WidgetTree, id: WidgetId, clip: Rect, m: &Metrics) {
    let Ok(widget) = tree.get(id) else {
        return;
    };
    if widget.state.contains(WidgetState::HIDDEN) {
        return;
    }
    let area = widget.area;
    let Some(visible) = area.intersect(&clip) else {
        return;
    };
    canvas.set_clip(visible);
    let state = widget.state;

    match &widget.kind {
        Kind::Screen | Kind::Tab { .. } | Kind::Container => {}
        Kind::TabView { active, title } => draw_tab_bar(canvas, tree, id, *active, title, m),
        Kind::Label { text } => canvas.draw_text(text, area.x, area.y, Color::TEXT),
        Kind::Table { title, rows } => draw_table(canvas, area, title, rows, m),
        Kind::List => {
            canvas.fill_rect(area, Color::PANEL);
            canvas.stroke_rect(area, 1, Color::GREY);
        }
        Kind::ListButton { text } => {
            let (bg, fg) = if state.contains(WidgetState::PRESSED) {
                (Color::GREY, Color::WHITE)
            } else if state.contains(WidgetState::CHECKED) {
                (Color::BUTTON, Color::WHITE)
            } else {
                (Color::PANEL, Color::TEXT)
            };
            canvas.fill_rect(area, bg);
            canvas.draw_text(text, area.x + 2 * m.pad, area.y + m.pad, fg);
            canvas.fill_rect(Rect::new(area.x, area.bottom().saturating_sub(1), area.w, 1), Color::GREY);
        }
        Kind::Button { text } => {
            let bg = if state.contains(WidgetState::PRESSED) {
                Color::BUTTON_CHECKED
            } else {
                Color::BUTTON
            };
            canvas.fill_rect(area, bg);
            let tx = area.x + area.w.saturating_sub(m.text_w(text)) / 2;
            canvas.draw_text(text, tx, area.y + m.pad, Color::WHITE);
        }
        Kind::MsgBox { title, text } => {
            canvas.fill_rect(area, Color::PANEL);
            canvas.stroke_rect(area, 1, Color::GREY);
            let x = area.x + 2 * m.pad;
            let y = area.y + 2 * m.pad;
            canvas.draw_text(title, x, y, Color::TEXT);
            canvas.draw_text(text, x, y + m.line_h + m.pad, Color::TEXT);
        }
        Kind::Image { width, height, pixels } => {
            canvas.blit_image(area.x, area.y, *width, *height, pixels);
        }
        Kind::Calendar(date) => draw_calendar(canvas, area, date, m),
        Kind::Clock(face) => draw_clock(canvas, area, face, m),
    }

    if state.contains(WidgetState::FOCUSED) {
        canvas.stroke_rect(area, 2 * m.scale, Color::FOCUS);
    }

    for &child in &widget.children {
        draw_widget(canvas, tree, child, visible, m);
    }
}

fn draw_tab_bar(canvas: &mut Canvas<'_>, tree: &WidgetTree, id: WidgetId, active: usize, title: &str, m: &Metrics) {
    let Ok(widget) = tree.get(id) else {
        return;
    };
    let area = widget.area;
    let bar = Rect::new(area.x, area.y, area.w, m.tab_bar_h());
    canvas.fill_rect(bar, Color::TAB_BAR);
    let text_y = bar.y + (bar.h - m.line_h) / 2 + m.scale;
    canvas.draw_text(title, area.x + TITLE_INSET, text_y, Color::TAB_TEXT);

    for (index, (button, &tab)) in tab_buttons(tree, id, m).iter().zip(&widget.children).enumerate() {
        let name = tree.get(tab).ok().and_then(|t| t.text()).unwrap_or("");
        let tx = button.x + button.w.saturating_sub(m.text_w(name)) / 2;
        if index == active {
            canvas.fill_rect(*button, Color::TAB_BAR.mix(Color::WHITE, 24));
            let underline = 3 * m.scale;
            canvas.fill_rect(
                Rect::new(button.x, button.bottom() - underline, button.w, underline),
                Color::TAB_ACTIVE,
            );
            canvas.draw_text(name, tx, text_y, Color::TAB_ACTIVE);
        } else {
            canvas.draw_text(name, tx, text_y, Color::TAB_TEXT);
        }
    }
}

fn draw_table(canvas: &mut Canvas<'_>, area: Rect, title: &str, rows: &[(String, String)], m: &Metrics) {
    let row_h = m.row_h();
    let col_w = area.w / 2;

    let tx = area.x + area.w.saturating_sub(m.text_w(title)) / 2;
    canvas.draw_text(title, tx, area.y + m.pad + 2, Color::TEXT);

    for (index, (key, value)) in rows.iter().enumerate() {
        let y = area.y + (index + 1) * row_h + 2;
        canvas.fill_rect(Rect::new(area.x, y, area.w, 1), Color::BORDER);
        canvas.fill_rect(Rect::new(area.x + col_w, y, 1, row_h), Color::BORDER);
        canvas.draw_text(key, area.x + m.pad + 2, y + m.pad, Color::TEXT);
        canvas.draw_text(value, area.x + col_w + m.pad + 1, y + m.pad, Color::TEXT);
    }
    canvas.stroke_rect(area, 2, Color::BORDER);
}

/// End point of a needle `length` pixels long pointing at `value` on a
/// 60-step dial with 0 at twelve o'clock.
pub fn needle_end(center: (i32, i32), length: i32, value: u8) -> (i32, i32) {
    let angle = value as f32 * (2.0 * PI / 60.0) - PI / 2.0;
    let x = center.0 as f32 + length as f32 * libm::cosf(angle);
    let y = center.1 as f32 + length as f32 * libm::sinf(angle);
    (libm::roundf(x) as i32, libm::roundf(y) as i32)
}

fn draw_clock(canvas: &mut Canvas<'_>, area: Rect, face: &ClockFace, m: &Metrics) {
    const HOUR_LABELS: [&str; 12] = ["12", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11"];

    let radius = (area.w.min(area.h) / 2) as i32;
    let center = ((area.x + area.w / 2) as i32, (area.y + area.h / 2) as i32);

    canvas.fill_circle(center, radius, Color::SCREEN_BG.mix(Color::BLACK, 153));
    for r in (radius - 4).max(0)..=radius {
        canvas.draw_circle(center, r, Color::BLACK);
    }

    for step in 0..60u8 {
        let major = step % 5 == 0;
        let inner = radius - 5 - if major { 8 } else { 6 };
        canvas.draw_line(
            needle_end(center, inner, step),
            needle_end(center, radius - 5, step),
            2,
            Color::YELLOW,
        );
        if major {
            let label = HOUR_LABELS[step as usize / 5];
            let (lx, ly) = needle_end(center, radius - 20 - 6 * m.scale as i32, step);
            let half_w = (m.text_w(label) / 2) as i32;
            let half_h = (m.line_h / 2) as i32;
            canvas.draw_text(
                label,
                (lx - half_w).max(0) as usize,
                (ly - half_h).max(0) as usize,
                Color::YELLOW,
            );
        }
    }

    canvas.draw_line(center, needle_end(center, HOUR_HAND, face.hour_value()), 6, Color::RED);
    canvas.draw_line(center, needle_end(center, MINUTE_HAND, face.minute), 4, Color::WHITE);
    canvas.draw_line(center, needle_end(center, SECOND_HAND, face.second), 2, Color::GREEN);
}

fn draw_calendar(canvas: &mut Canvas<'_>, area: Rect, date: &CalendarDate, m: &Metrics) {
    const WEEKDAYS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

    canvas.fill_rect(area, Color::PANEL);
    canvas.stroke_rect(area, 1, Color::GREY);

    let inner = Rect::new(area.x + m.pad, area.y + m.pad, area.w.saturating_sub(2 * m.pad), area.h.saturating_sub(2 * m.pad));
    let col_w = inner.w / 7;

    let mut header = String::new();
    let _ = core::fmt::write(
        &mut header,
        format_args!("{} {}", CalendarDate::month_name(date.month), date.year),
    );
    let hx = inner.x + inner.w.saturating_sub(m.text_w(&header)) / 2;
    canvas.draw_text(&header, hx, inner.y, Color::TEXT);

    let names_y = inner.y + m.line_h + m.pad;
    for (col, name) in WEEKDAYS.iter().enumerate() {
        let x = inner.x + col * col_w + col_w.saturating_sub(m.text_w(name)) / 2;
        canvas.draw_text(name, x, names_y, Color::GREY);
    }

    let grid_y = names_y + m.line_h + m.pad;
    let row_h = inner.bottom().saturating_sub(grid_y) / 6;
    let first = CalendarDate::day_of_week(date.year, date.month, 1) as usize;
    let days = CalendarDate::days_in_month(date.year, date.month);
    let mut label = [0u8; 4];
    for day in 1..=days {
        let cell = first + day as usize - 1;
        let (row, col) = (cell / 7, cell % 7);
        let cell_area = Rect::new(inner.x + col * col_w, grid_y + row * row_h, col_w, row_h);
        let text = day_label(day, &mut label);
        let color = if day == date.day {
            canvas.fill_rect(cell_area, Color::BUTTON);
            Color::WHITE
        } else {
            Color::TEXT
        };
        let x = cell_area.x + col_w.saturating_sub(m.text_w(text)) / 2;
        let y = cell_area.y + row_h.saturating_sub(m.line_h) / 2;
        canvas.draw_text(text, x, y, color);
    }
}

fn day_label(day: u8, buf: &mut [u8; 4]) -> &str {
    let mut writer = crate::strings::BoundedWriter::new(&mut buf[..]);
    let _ = core::fmt::write(&mut writer, format_args!("{}", day));
    let len = writer.len();
    core::str::from_utf8(&buf[..len]).unwrap_or("")
}
