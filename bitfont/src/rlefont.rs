use alloc::borrow::Cow;

use crate::font::{Codepoint, PixelSink};

/// Run-length encoded glyph storage ("ftrl").
///
/// Only the slot exists: the reader does not decode this encoding, so every
/// codepoint is reported unmapped and [`crate::load`] refuses the magic.
#[derive(Clone, Debug)]
pub struct RleFont<'a> {
  pub version: u8,
  pub data: Cow<'a, [u8]>,
}

impl RleFont<'_> {
  #[inline]
  pub fn character_width(&self, _character: Codepoint) -> u8 {
    0
  }

  #[inline]
  pub fn render_character<S: PixelSink + ?Sized>(
    &self,
    _x0: i16,
    _y0: i16,
    _character: Codepoint,
    _sink: &mut S,
  ) -> Result<u8, S::Error> {
    Ok(0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::font::{Face, Font, FontFlags, FontInfo, FontKind};
  use crate::kerning::KerningTable;
  use alloc::vec::Vec;

  #[test]
  fn run_length_slot_draws_nothing() {
    let font = Font {
      info: FontInfo {
        full_name: Cow::Borrowed("Rle"),
        short_name: Cow::Borrowed("rle"),
        width: 4,
        height: 4,
        min_x_advance: 4,
        max_x_advance: 4,
        baseline_x: 0,
        baseline_y: 3,
        line_height: 5,
        flags: FontFlags::empty(),
        fallback_character: b'?' as Codepoint,
      },
      kind: FontKind::RunLength(RleFont { version: 4, data: Cow::Borrowed(&[]) }),
      kerning: KerningTable::EMPTY,
    };
    let mut runs = Vec::new();
    assert_eq!(font.render_character(0, 0, b'A' as Codepoint, &mut runs).unwrap(), 0);
    assert!(runs.is_empty());
    assert_eq!(font.character_width(b'A' as Codepoint), 0);
    assert!(font.bitmap().is_none());
  }
}
