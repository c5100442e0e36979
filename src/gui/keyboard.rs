pub const SCAN_NULL: u16 = 0x00;
pub const SCAN_UP: u16 = 0x01;
pub const SCAN_DOWN: u16 = 0x02;
pub const SCAN_RIGHT: u16 = 0x03;
pub const SCAN_LEFT: u16 = 0x04;
pub const SCAN_HOME: u16 = 0x05;
pub const SCAN_END: u16 = 0x06;
pub const SCAN_DELETE: u16 = 0x08;
pub const SCAN_PAGE_UP: u16 = 0x09;
pub const SCAN_PAGE_DOWN: u16 = 0x0A;
pub const SCAN_ESC: u16 = 0x17;

pub const CHAR_BACKSPACE: u16 = 0x08;
pub const CHAR_TAB: u16 = 0x09;
pub const CHAR_LINEFEED: u16 = 0x0A;
pub const CHAR_CARRIAGE_RETURN: u16 = 0x0D;

pub const SHIFT_STATE_VALID: u32 = 0x8000_0000;
pub const RIGHT_SHIFT_PRESSED: u32 = 0x0000_0001;
pub const LEFT_SHIFT_PRESSED: u32 = 0x0000_0002;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyStroke {
    pub scan_code: u16,
    pub unicode_char: u16,
    pub shift_state: u32,
}

impl KeyStroke {
    pub const fn scan(scan_code: u16) -> Self {
        Self {
            scan_code,
            unicode_char: 0,
            shift_state: 0,
        }
    }

    pub const fn unicode(unicode_char: u16) -> Self {
        Self {
            scan_code: SCAN_NULL,
            unicode_char,
            shift_state: 0,
        }
    }

    pub const fn with_shift_state(mut self, shift_state: u32) -> Self {
        self.shift_state = shift_state;
        self
    }

    fn shifted(&self) -> bool {
        self.shift_state & SHIFT_STATE_VALID != 0
            && self.shift_state & (RIGHT_SHIFT_PRESSED | LEFT_SHIFT_PRESSED) != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiKey {
    Enter,
    Backspace,
    Next,
    Prev,
    Up,
    Down,
    Left,
    Right,
    Esc,
    Del,
    Home,
    End,
    Char(char),
}

/// Translates a firmware key stroke. Line feeds and unknown scan codes
/// produce nothing.
pub fn map_key(key: &KeyStroke) -> Option<UiKey> {
    match key.unicode_char {
        CHAR_CARRIAGE_RETURN => return Some(UiKey::Enter),
        CHAR_BACKSPACE => return Some(UiKey::Backspace),
        CHAR_TAB if key.shifted() => return Some(UiKey::Prev),
        CHAR_TAB => return Some(UiKey::Next),
        CHAR_LINEFEED => return None,
        0 => {}
        unit => return char::from_u32(unit as u32).map(UiKey::Char),
    }
    match key.scan_code {
        SCAN_UP => Some(UiKey::Up),
        SCAN_DOWN => Some(UiKey::Down),
        SCAN_LEFT => Some(UiKey::Left),
        SCAN_RIGHT => Some(UiKey::Right),
        SCAN_ESC => Some(UiKey::Esc),
        SCAN_DELETE => Some(UiKey::Del),
        SCAN_HOME => Some(UiKey::Home),
        SCAN_END => Some(UiKey::End),
        SCAN_PAGE_DOWN => Some(UiKey::Next),
        SCAN_PAGE_UP => Some(UiKey::Prev),
        _ => None,
    }
}
