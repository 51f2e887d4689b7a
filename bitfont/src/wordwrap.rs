use crate::encoding::{getchar, take_chars};
use crate::font::{Codepoint, Face};

#[inline]
fn is_break(c: Codepoint) -> bool {
  c == b' ' as Codepoint || c == b'\t' as Codepoint
}

#[cfg(feature = "kerning")]
#[inline]
fn advance<F: Face + ?Sized>(font: &F, prev: Option<Codepoint>, c: Codepoint) -> i16 {
  let kern = prev.map_or(0, |prev| crate::kerning::compute_kerning(font, prev, c) as i16);
  font.character_width(c) as i16 + kern
}

#[cfg(not(feature = "kerning"))]
#[inline]
fn advance<F: Face + ?Sized>(font: &F, _prev: Option<Codepoint>, c: Codepoint) -> i16 {
  font.character_width(c) as i16
}

/// One line of `text`: its byte span and codepoint count, and where the next line
/// starts.
#[derive(Copy, Clone)]
struct Break {
  begin: usize,
  end: usize,
  chars: u16,
  resume: usize,
}

/// Position after the whitespace run at `pos`, and after one `\n` that directly
/// follows it: a wrap there already ends the line.
fn skip_breaks(text: &[u8], pos: usize) -> usize {
  let mut rest = &text[pos..];
  loop {
    let before = rest;
    match getchar(&mut rest) {
      Some(c) if is_break(c) => continue,
      Some(c) if c == b'\n' as Codepoint => return text.len() - rest.len(),
      _ => return text.len() - before.len(),
    }
  }
}

/// Scans one line off the front of `text`.
fn next_line<F: Face + ?Sized>(font: &F, width: i16, text: &[u8]) -> Break {
  let mut rest = text;
  let mut begin = 0;
  let mut x = 0i16;
  let mut chars = 0u16;
  let mut prev: Option<Codepoint> = None;
  // Break opportunities only exist once the line holds a visible character.
  let mut inked = false;
  let mut last_space: Option<Break> = None;
  loop {
    let start = text.len() - rest.len();
    let Some(c) = getchar(&mut rest) else {
      return Break { begin, end: start, chars, resume: start };
    };
    let next = text.len() - rest.len();
    if c == b'\n' as Codepoint {
      return Break { begin, end: start, chars, resume: next };
    }
    let mut w = advance(font, prev, c);
    if chars > 0 && x.saturating_add(w) > width {
      if !inked {
        // Leading whitespace of a line that has to wrap is dropped.
        (x, chars, prev) = (0, 0, None);
        if is_break(c) {
          begin = next;
          continue;
        }
        begin = start;
        w = advance(font, None, c);
      } else if is_break(c) {
        // Inside a whitespace run the line ends where the run began.
        return match last_space {
          Some(brk) if prev.is_some_and(is_break) => brk,
          _ => Break { begin, end: start, chars, resume: skip_breaks(text, start) },
        };
      } else {
        // A word longer than the line is split rather than stalling.
        return last_space.unwrap_or(Break { begin, end: start, chars, resume: start });
      }
    }
    if is_break(c) {
      if inked && !prev.is_some_and(is_break) {
        last_space = Some(Break { begin, end: start, chars, resume: skip_breaks(text, start) });
      }
    } else {
      inked = true;
    }
    x = x.saturating_add(w);
    chars = chars.saturating_add(1);
    prev = Some(c);
  }
}

/// Splits `text` into lines no wider than `width` and hands each to `line`.
///
/// Lines break at the last space or tab that fits (the whole whitespace run is
/// dropped), at every `\n`, or mid-word when a single word is wider than `width`;
/// every line holds at least one character. A line that fits is passed unchanged,
/// leading whitespace included. `line` receives the line's bytes and codepoint
/// count and returns `false` to stop wrapping.
pub fn wordwrap<F, L>(font: &F, width: i16, text: &[u8], mut line: L)
where
  F: Face + ?Sized,
  L: FnMut(&[u8], u16) -> bool,
{
  let mut rest = take_chars(text, 0);
  while !rest.is_empty() {
    let brk = next_line(font, width, rest);
    if !line(&rest[brk.begin..brk.end], brk.chars) {
      return;
    }
    rest = &rest[brk.resume..];
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fonts::pico;
  use alloc::string::String;
  use alloc::vec::Vec;

  fn wrap(width: i16, text: &str) -> Vec<(String, u16)> {
    let mut lines = Vec::new();
    wordwrap(&pico::FONT, width, text.as_bytes(), |l, n| {
      lines.push((String::from_utf8(l.to_vec()).unwrap(), n));
      true
    });
    lines
  }

  fn texts(width: i16, text: &str) -> Vec<String> {
    wrap(width, text).into_iter().map(|(l, _)| l).collect()
  }

  #[test]
  fn short_text_is_one_identical_line() {
    assert_eq!(wrap(100, "12 34"), [(String::from("12 34"), 5)]);
  }

  #[test]
  fn breaks_at_last_space_that_fits() {
    // Every pico glyph advances 4 pixels.
    assert_eq!(texts(20, "12 34 56"), ["12 34", "56"]);
    assert_eq!(texts(8, "12 34"), ["12", "34"]);
    assert_eq!(texts(12, "1\t22 3"), ["1", "22", "3"]);
  }

  #[test]
  fn whitespace_runs_never_make_empty_lines() {
    assert_eq!(texts(8, "12  34"), ["12", "34"]);
    assert_eq!(texts(12, "1 \t 22"), ["1", "22"]);
    assert_eq!(texts(8, "12   "), ["12"]);
    assert_eq!(texts(8, "12 \n34"), ["12", "34"]);
    // A run that fits stays inside the line.
    assert_eq!(texts(100, "12  34"), ["12  34"]);
  }

  #[test]
  fn leading_whitespace_is_dropped_only_when_wrapping() {
    assert_eq!(wrap(4, " 12"), [(String::from("1"), 1), (String::from("2"), 1)]);
    assert_eq!(texts(4, "\t1"), ["1"]);
    assert_eq!(texts(100, " 12"), [" 12"]);
    assert_eq!(texts(8, "12\n  34"), ["12", "34"]);
  }

  #[test]
  fn long_words_split_mid_word() {
    assert_eq!(texts(8, "12345"), ["12", "34", "5"]);
    // Narrower than one glyph still makes progress.
    assert_eq!(texts(1, "123"), ["1", "2", "3"]);
  }

  #[test]
  fn newline_forces_break() {
    assert_eq!(texts(100, "12\n\n34"), ["12", "", "34"]);
    assert_eq!(texts(100, "12\n"), ["12"]);
  }

  #[test]
  fn empty_text_has_no_lines() {
    assert!(wrap(100, "").is_empty());
  }

  #[test]
  fn stops_when_callback_declines() {
    let mut seen = 0;
    wordwrap(&pico::FONT, 4, b"1 2 3 4", |_, _| {
      seen += 1;
      seen < 2
    });
    assert_eq!(seen, 2);
  }
}
