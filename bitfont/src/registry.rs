//! Process-wide list of compiled-in fonts.

use crate::font::Font;
use crate::fonts::pico;

/// A link in a statically allocated font list.
#[derive(Debug)]
pub struct FontList {
  pub font: &'static Font<'static>,
  pub next: Option<&'static FontList>,
}

impl FontList {
  pub const fn new(font: &'static Font<'static>, next: Option<&'static FontList>) -> Self {
    FontList { font, next }
  }

  #[inline]
  pub fn iter(&'static self) -> FontListIter {
    FontListIter { next: Some(self) }
  }

  /// First font in this list whose full or short name equals `name`.
  pub fn find(&'static self, name: &str) -> Option<&'static Font<'static>> {
    self.iter().find(|f| f.info.full_name == name || f.info.short_name == name)
  }
}

#[derive(Clone, Debug)]
pub struct FontListIter {
  next: Option<&'static FontList>,
}

impl Iterator for FontListIter {
  type Item = &'static Font<'static>;

  fn next(&mut self) -> Option<Self::Item> {
    let node = self.next?;
    self.next = node.next;
    Some(node.font)
  }
}

static PICO: FontList = FontList::new(&pico::FONT, None);

/// Head of the built-in font list.
pub static INCLUDED_FONTS: Option<&'static FontList> = Some(&PICO);

/// Every built-in font, in registration order.
#[inline]
pub fn font_list() -> FontListIter {
  FontListIter { next: INCLUDED_FONTS }
}

/// Looks a built-in font up by full or short name.
pub fn find_font(name: &str) -> Option<&'static Font<'static>> {
  INCLUDED_FONTS.and_then(|list| list.find(name))
}

#[cfg(test)]
mod tests {
  use super::*;
  use core::ptr;

  #[test]
  fn full_and_short_names_find_the_same_font() {
    for font in font_list() {
      let by_full = find_font(&font.info.full_name).unwrap();
      let by_short = find_font(&font.info.short_name).unwrap();
      assert!(ptr::eq(by_full, by_short));
      assert!(ptr::eq(by_full, font));
    }
    assert!(ptr::eq(find_font("pico").unwrap(), &pico::FONT));
  }

  #[test]
  fn unknown_names_miss() {
    assert!(find_font("Pico").is_none());
    assert!(find_font("").is_none());
  }

  #[test]
  fn user_lists_chain_onto_included_fonts() {
    static MINE: FontList = FontList::new(&pico::FONT, Some(&PICO));
    assert_eq!(MINE.iter().count(), 2);
    assert!(ptr::eq(MINE.find("Pico 3x5").unwrap(), &pico::FONT));
    assert_eq!(font_list().count(), 1);
  }
}
