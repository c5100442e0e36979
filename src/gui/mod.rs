//! Retained-mode widget toolkit and its display/input ports.

pub mod canvas;
pub mod focus;
pub mod font;
pub mod gop;
pub mod input;
pub mod keyboard;
pub mod layout;
pub mod mouse;
pub mod render;
pub mod timer;
pub mod toolkit;
pub mod widget;

pub use gop::{Color, DisplayPort, Rect, ScreenInfo};
pub use toolkit::{MsgBox, Ui, UiEvent};
pub use widget::{WidgetId, WidgetState};
