use font8x8::legacy::BASIC_LEGACY;

pub const GLYPH_SIZE: usize = 8;

/// Bitmap rows for `ch`; bit 0 of each row is the leftmost pixel.
/// Anything outside ASCII renders as '?'.
pub fn glyph(ch: char) -> [u8; GLYPH_SIZE] {
    let index = ch as usize;
    if index < BASIC_LEGACY.len() {
        BASIC_LEGACY[index]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

pub fn char_width(scale: usize) -> usize {
    GLYPH_SIZE * scale
}

pub fn line_height(scale: usize) -> usize {
    (GLYPH_SIZE + 2) * scale
}

pub fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * char_width(scale)
}
