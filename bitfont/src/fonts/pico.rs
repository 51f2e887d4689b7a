//! Pico 3x5: space, digits, ':' and '?'.

use alloc::borrow::Cow;

use crate::{BwFont, CharRange, Font, FontFlags, FontInfo, FontKind, KerningTable, Span};

static DATA: [u8; 89] = [
  0x00, 0x00, 0x00, 0x00, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x00,
  0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x03, 0x00, 0x06, 0x00, 0x09, 0x00, 0x0c, 0x00, 0x0f, 0x00,
  0x12, 0x00, 0x15, 0x00, 0x18, 0x00, 0x1b, 0x00, 0x1e, 0x00, 0x20, 0x00, 0x20, 0x00, 0x20, 0x00,
  0x20, 0x00, 0x20, 0x00, 0x23, 0x00, 0x1f, 0x11, 0x1f, 0x12, 0x1f, 0x10, 0x1d, 0x15, 0x17, 0x15,
  0x15, 0x1f, 0x07, 0x04, 0x1f, 0x17, 0x15, 0x1d, 0x1f, 0x15, 0x1d, 0x01, 0x01, 0x1f, 0x1f, 0x15,
  0x1f, 0x17, 0x15, 0x1f, 0x00, 0x0a, 0x01, 0x15, 0x07,
];

static RANGES: [CharRange; 2] = [
  CharRange {
    first_char: 32,
    char_count: 1,
    offset_x: 0,
    offset_y: 0,
    height_bytes: 1,
    height_pixels: 5,
    width: 4,
    glyph_widths: Span::EMPTY,
    glyph_offsets: Span::EMPTY,
    glyph_data: Span::new(0, 4),
  },
  CharRange {
    first_char: 48,
    char_count: 16,
    offset_x: 0,
    offset_y: 0,
    height_bytes: 1,
    height_pixels: 5,
    width: 0,
    glyph_widths: Span::new(4, 16),
    glyph_offsets: Span::new(20, 34),
    glyph_data: Span::new(54, 35),
  },
];

pub static FONT: Font<'static> = Font {
  info: FontInfo {
    full_name: Cow::Borrowed("Pico 3x5"),
    short_name: Cow::Borrowed("pico"),
    width: 4,
    height: 5,
    min_x_advance: 4,
    max_x_advance: 4,
    baseline_x: 0,
    baseline_y: 5,
    line_height: 6,
    flags: FontFlags::MONOSPACE.union(FontFlags::BW),
    fallback_character: 63,
  },
  kind: FontKind::Bitmap(BwFont { version: 4, data: Cow::Borrowed(&DATA), ranges: Cow::Borrowed(&RANGES) }),
  kerning: KerningTable::EMPTY,
};
