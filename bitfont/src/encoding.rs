//! UTF-8 style codepoint decoding for the layout functions.
//!
//! Sequences of one to three bytes decode to a 16-bit [`Codepoint`]. A NUL byte or
//! the end of the slice terminates the text. Bytes that cannot start a sequence
//! (stray continuation bytes, 4-byte leads) or sequences cut short are returned
//! verbatim, one byte at a time, so a renderer shows them via the fallback glyph.

use crate::font::Codepoint;

#[inline]
fn is_continuation(b: u8) -> bool {
  b & 0xC0 == 0x80
}

/// Decodes the next codepoint and advances `text` past it.
///
/// Returns `None` at the end of the slice or at a NUL byte (which is not consumed).
pub fn getchar(text: &mut &[u8]) -> Option<Codepoint> {
  let (&lead, rest) = text.split_first()?;
  if lead == 0 {
    return None;
  }
  let (len, bits) = match lead {
    0x00..=0x7F => (1, lead as Codepoint),
    0xC0..=0xDF => (2, (lead & 0x1F) as Codepoint),
    0xE0..=0xEF => (3, (lead & 0x0F) as Codepoint),
    _ => (1, lead as Codepoint),
  };
  let tail = &rest[..rest.len().min(len - 1)];
  if tail.len() != len - 1 || !tail.iter().all(|&b| is_continuation(b)) {
    *text = rest;
    return Some(lead as Codepoint);
  }
  let c = tail.iter().fold(bits, |acc, &b| (acc << 6) | (b & 0x3F) as Codepoint);
  *text = &rest[len - 1..];
  Some(c)
}

/// Steps back from byte position `pos` to the start of the previous codepoint.
pub fn rewind(text: &[u8], pos: usize) -> usize {
  let mut pos = pos.min(text.len());
  if pos == 0 {
    return 0;
  }
  pos -= 1;
  let mut steps = 0;
  while pos > 0 && steps < 2 && is_continuation(text[pos]) {
    pos -= 1;
    steps += 1;
  }
  pos
}

/// Iterator over the codepoints of a byte string, stopping at NUL.
#[derive(Clone, Debug)]
pub struct Chars<'a> {
  rest: &'a [u8],
}

impl<'a> Chars<'a> {
  /// The bytes not yet decoded.
  #[inline]
  pub fn as_bytes(&self) -> &'a [u8] {
    self.rest
  }
}

impl Iterator for Chars<'_> {
  type Item = Codepoint;

  #[inline]
  fn next(&mut self) -> Option<Codepoint> {
    getchar(&mut self.rest)
  }
}

#[inline]
pub fn chars(text: &[u8]) -> Chars<'_> {
  Chars { rest: text }
}

/// Prefix of `text` holding its first `count` codepoints, or everything before the
/// terminator when `count` is 0.
pub(crate) fn take_chars(text: &[u8], count: usize) -> &[u8] {
  let mut it = chars(text);
  let mut taken = 0;
  while count == 0 || taken < count {
    if it.next().is_none() {
      break;
    }
    taken += 1;
  }
  &text[..text.len() - it.as_bytes().len()]
}
