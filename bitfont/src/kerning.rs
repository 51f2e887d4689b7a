use alloc::borrow::Cow;
use alloc::vec::Vec;

#[cfg(feature = "kerning")]
use crate::font::{Face, FontFlags};
use crate::font::Codepoint;

/// Advance adjustment applied between `left` and `right`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct KerningPair {
  pub left: Codepoint,
  pub right: Codepoint,
  pub adjust: i8,
}

/// Pair adjustments sorted by `(left, right)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KerningTable<'a> {
  pairs: Cow<'a, [KerningPair]>,
}

impl<'a> KerningTable<'a> {
  pub const EMPTY: KerningTable<'static> = KerningTable { pairs: Cow::Borrowed(&[]) };

  /// Wraps a compiled table. `pairs` must already be sorted by `(left, right)`
  /// without duplicates.
  pub const fn from_static(pairs: &'a [KerningPair]) -> Self {
    KerningTable { pairs: Cow::Borrowed(pairs) }
  }

  /// Sorts `pairs`; for duplicate keys the first occurrence wins.
  pub fn from_pairs(mut pairs: Vec<KerningPair>) -> KerningTable<'static> {
    pairs.sort_by_key(|p| (p.left, p.right));
    pairs.dedup_by_key(|p| (p.left, p.right));
    KerningTable { pairs: Cow::Owned(pairs) }
  }

  pub fn get(&self, left: Codepoint, right: Codepoint) -> Option<i8> {
    self
      .pairs
      .binary_search_by_key(&(left, right), |p| (p.left, p.right))
      .ok()
      .map(|i| self.pairs[i].adjust)
  }

  pub fn pairs(&self) -> &[KerningPair] {
    &self.pairs
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.pairs.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.pairs.is_empty()
  }
}

/// Adjustment to add to the advance of `left` when `right` follows it.
///
/// Monospace fonts never kern.
#[cfg(feature = "kerning")]
pub fn compute_kerning<F: Face + ?Sized>(font: &F, left: Codepoint, right: Codepoint) -> i8 {
  if font.info().flags.contains(FontFlags::MONOSPACE) {
    return 0;
  }
  font.kerning(left, right)
}

#[cfg(test)]
mod tests {
  use super::*;
  use alloc::vec;

  fn pair(left: u8, right: u8, adjust: i8) -> KerningPair {
    KerningPair { left: left as Codepoint, right: right as Codepoint, adjust }
  }

  #[test]
  fn lookup_after_sort() {
    let table = KerningTable::from_pairs(vec![pair(b'V', b'A', -2), pair(b'A', b'V', -1), pair(b'A', b'V', 5), pair(b'T', b'o', -3)]);
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(b'A' as Codepoint, b'V' as Codepoint), Some(-1));
    assert_eq!(table.get(b'V' as Codepoint, b'A' as Codepoint), Some(-2));
    assert_eq!(table.get(b'T' as Codepoint, b'o' as Codepoint), Some(-3));
    assert_eq!(table.get(b'o' as Codepoint, b'T' as Codepoint), None);
    assert!(KerningTable::EMPTY.is_empty());
    assert_eq!(KerningTable::EMPTY.get(0, 0), None);
  }

  #[test]
  fn static_table_borrows() {
    static PAIRS: [KerningPair; 1] = [KerningPair { left: 1, right: 2, adjust: 1 }];
    const TABLE: KerningTable<'static> = KerningTable::from_static(&PAIRS);
    assert_eq!(TABLE.get(1, 2), Some(1));
    assert_eq!(TABLE.pairs(), &PAIRS);
  }

  #[cfg(feature = "kerning")]
  #[test]
  fn monospace_fonts_never_kern() {
    use crate::fonts::pico;

    let table = KerningTable::from_pairs(vec![pair(b'1', b'1', -1)]);
    let mut font = pico::FONT.clone().with_kerning(table);
    assert_eq!(compute_kerning(&font, b'1' as Codepoint, b'1' as Codepoint), 0);
    font.info.flags.remove(FontFlags::MONOSPACE);
    assert_eq!(compute_kerning(&font, b'1' as Codepoint, b'1' as Codepoint), -1);
    assert_eq!(compute_kerning(&font, b'1' as Codepoint, b'2' as Codepoint), 0);
  }
}
