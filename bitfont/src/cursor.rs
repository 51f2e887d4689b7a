use crate::Error;

/// Checked little-endian reader over a borrowed byte slice.
pub(crate) struct Cursor<'a> {
  data: &'a [u8],
  pos: usize,
}

impl<'a> Cursor<'a> {
  #[inline]
  pub(crate) fn new(data: &'a [u8]) -> Self {
    Cursor { data, pos: 0 }
  }

  pub(crate) fn bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
    let end = self.pos.checked_add(n).ok_or(Error::Truncated)?;
    let out = self.data.get(self.pos..end).ok_or(Error::Truncated)?;
    self.pos = end;
    Ok(out)
  }

  #[inline]
  pub(crate) fn u8(&mut self) -> Result<u8, Error> {
    Ok(self.bytes(1)?[0])
  }

  #[inline]
  pub(crate) fn u16_le(&mut self) -> Result<u16, Error> {
    let b = self.bytes(2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
  }

  #[inline]
  pub(crate) fn u32_le(&mut self) -> Result<u32, Error> {
    let b = self.bytes(4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
  }

  /// Length byte followed by that many UTF-8 bytes.
  pub(crate) fn pascal_str(&mut self) -> Result<&'a str, Error> {
    let len = self.u8()? as usize;
    core::str::from_utf8(self.bytes(len)?).map_err(|_| Error::BadName)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_little_endian_and_stops_at_end() {
    let mut c = Cursor::new(&[0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xff]);
    assert_eq!(c.u16_le(), Ok(0x1234));
    assert_eq!(c.u32_le(), Ok(0x1234_5678));
    assert_eq!(c.u16_le(), Err(Error::Truncated));
    assert_eq!(c.u8(), Ok(0xff));
    assert_eq!(c.u8(), Err(Error::Truncated));
  }

  #[test]
  fn pascal_strings() {
    let mut c = Cursor::new(b"\x03abc\x05ab");
    assert_eq!(c.pascal_str(), Ok("abc"));
    assert_eq!(c.pascal_str(), Err(Error::Truncated));
    assert_eq!(Cursor::new(b"\x01\xff").pascal_str(), Err(Error::BadName));
  }
}
