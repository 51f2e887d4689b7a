//! Range splitter: groups the present codepoints into character ranges.

use log::debug;
use std::collections::BTreeMap;

/// Limits that close a pending range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Limits {
  /// Largest estimated glyph-data size of one range, in bytes.
  pub max_bytes: usize,
  /// A gap of this many codepoints (or more) between present characters starts a new range.
  pub max_gap: usize,
}

impl Default for Limits {
  fn default() -> Self {
    Limits { max_bytes: 65536, max_gap: 16 }
  }
}

/// One planned range: `glyphs[i]` is the glyph for `first_char + i`, `None` for a
/// hole folded into the range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangePlan {
  pub first_char: u16,
  pub glyphs: Vec<Option<usize>>,
}

impl RangePlan {
  #[inline]
  pub fn char_count(&self) -> usize {
    self.glyphs.len()
  }

  #[inline]
  pub fn has_placeholders(&self) -> bool {
    self.glyphs.iter().any(Option::is_none)
  }
}

/// Splits the codepoints of `char_to_glyph` into ascending, non-overlapping ranges.
///
/// Every range starts and ends on a present codepoint and holds at least one glyph.
pub fn compute_char_ranges(
  char_to_glyph: &BTreeMap<u16, usize>,
  glyph_size: impl Fn(usize) -> usize,
  limits: Limits,
) -> Vec<RangePlan> {
  let chars: Vec<u16> = char_to_glyph.keys().copied().collect();
  let mut out = Vec::new();
  let mut i = 0;
  while i < chars.len() {
    let first = chars[i];
    i += 1;
    while i < chars.len() && ((chars[i] - chars[i - 1]) as usize) < limits.max_gap {
      i += 1;
    }
    let mut last = chars[i - 1];

    let mut glyphs = Vec::new();
    let mut bytes = 0usize;
    for c in first..=last {
      let Some(&glyph) = char_to_glyph.get(&c) else {
        glyphs.push(None);
        continue;
      };
      bytes += glyph_size(glyph);
      if bytes > limits.max_bytes && c != first {
        // Hand the rest back for the next range.
        last = c - 1;
        while chars[i - 1] > last {
          i -= 1;
        }
        break;
      }
      glyphs.push(Some(glyph));
    }
    // A split may leave holes at the end; the range ends on its last glyph.
    while glyphs.last() == Some(&None) {
      glyphs.pop();
    }
    debug!("range U+{:04X} +{}", first, glyphs.len());
    out.push(RangePlan { first_char: first, glyphs });
  }
  out
}
