//! String measurement and aligned/justified rendering.
//!
//! Text is a byte string decoded with [`crate::getchar`]; `count` limits the number of
//! codepoints used, with 0 meaning "up to the end or the first NUL". Drawing goes
//! through a per-character callback that renders the glyph and returns the advance
//! to use, so callers can clip or substitute glyphs.

use crate::encoding::{chars, take_chars};
use crate::font::{Codepoint, Face};

/// Horizontal anchoring of a rendered line relative to its `x0`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Align {
  #[default]
  Left,
  Center,
  Right,
}

#[cfg(feature = "kerning")]
#[inline]
fn kern_between<F: Face + ?Sized>(font: &F, prev: Option<Codepoint>, c: Codepoint) -> i16 {
  prev.map_or(0, |prev| crate::kerning::compute_kerning(font, prev, c) as i16)
}

#[cfg(not(feature = "kerning"))]
#[inline]
fn kern_between<F: Face + ?Sized>(_font: &F, _prev: Option<Codepoint>, _c: Codepoint) -> i16 {
  0
}

#[inline]
fn is_whitespace(c: Codepoint) -> bool {
  matches!(c, 0x20 | 0xA0 | 0x09 | 0x0D | 0x0A)
}

/// `text` without trailing whitespace.
pub(crate) fn strip_trailing(text: &[u8]) -> &[u8] {
  let mut it = chars(text);
  let mut end = 0;
  while let Some(c) = it.next() {
    if !is_whitespace(c) {
      end = text.len() - it.as_bytes().len();
    }
  }
  &text[..end]
}

/// Total advance of the first `count` codepoints of `text`, optionally kerned.
pub fn string_width<F: Face + ?Sized>(font: &F, text: &[u8], count: usize, kern: bool) -> i16 {
  let mut width = 0i16;
  let mut prev = None;
  for c in chars(take_chars(text, count)) {
    if kern {
      width = width.saturating_add(kern_between(font, prev, c));
    }
    width = width.saturating_add(font.character_width(c) as i16);
    prev = Some(c);
  }
  width
}

pub(crate) fn render_left<F, E, C>(font: &F, mut x: i16, y0: i16, text: &[u8], mut extra: impl FnMut() -> i16, cb: &mut C) -> Result<(), E>
where
  F: Face + ?Sized,
  C: FnMut(i16, i16, Codepoint) -> Result<u8, E>,
{
  let mut prev = None;
  for c in chars(text) {
    if prev.is_some() {
      x = x.wrapping_add(kern_between(font, prev, c)).wrapping_add(extra());
    }
    x = x.wrapping_add(cb(x, y0, c)? as i16);
    prev = Some(c);
  }
  Ok(())
}

/// Renders `text` anchored at `x0` according to `align`.
///
/// Trailing whitespace is dropped before measuring so it does not shift centred or
/// right-aligned lines. The callback's error aborts the line.
pub fn render_aligned<F, E, C>(
  font: &F,
  x0: i16,
  y0: i16,
  align: Align,
  text: &[u8],
  count: usize,
  mut cb: C,
) -> Result<(), E>
where
  F: Face + ?Sized,
  C: FnMut(i16, i16, Codepoint) -> Result<u8, E>,
{
  let text = strip_trailing(take_chars(text, count));
  let x = match align {
    Align::Left => x0,
    Align::Center => x0.wrapping_sub(string_width(font, text, 0, true) / 2),
    Align::Right => x0.wrapping_sub(string_width(font, text, 0, true)),
  };
  render_left(font, x, y0, text, || 0, &mut cb)
}

/// Renders `text` from `x0` stretched to exactly `width` pixels.
///
/// The difference between `width` and the natural width is spread over the gaps
/// between characters, earlier gaps taking one extra pixel each when it does not
/// divide evenly. Lines already at or beyond `width`, and single characters, render
/// left-aligned.
pub fn render_justified<F, E, C>(
  font: &F,
  x0: i16,
  y0: i16,
  width: i16,
  text: &[u8],
  count: usize,
  mut cb: C,
) -> Result<(), E>
where
  F: Face + ?Sized,
  C: FnMut(i16, i16, Codepoint) -> Result<u8, E>,
{
  let text = strip_trailing(take_chars(text, count));
  let gaps = chars(text).count().saturating_sub(1) as i16;
  let extra = width.saturating_sub(string_width(font, text, 0, true));
  if gaps <= 0 || extra <= 0 {
    return render_left(font, x0, y0, text, || 0, &mut cb);
  }
  let (base, mut rem) = (extra / gaps, extra % gaps);
  let spread = || {
    if rem > 0 {
      rem -= 1;
      base + 1
    } else {
      base
    }
  };
  render_left(font, x0, y0, text, spread, &mut cb)
}
