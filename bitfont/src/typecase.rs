//! Multi-font container ("case").
//!
//! Layout: magic, u8 version, u16 face count, then per face a Pascal name, u8 pixel
//! size, u32 offset of the face's font blob and u32 end of that blob (exclusive),
//! both from the start of the container.

use alloc::vec::Vec;

use crate::cursor::Cursor;
use crate::font::Font;
use crate::loader::{load, TYPECASE_VERSION};
use crate::Error;

pub const TYPECASE_MAGIC: &[u8; 4] = b"case";

/// Directory entry for one face.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FaceEntry<'a> {
  pub name: &'a str,
  pub size: u8,
  pub offset: u32,
  pub next: u32,
}

/// Parsed container directory borrowing the container bytes.
#[derive(Clone, Debug)]
pub struct TypeCase<'a> {
  pub version: u8,
  data: &'a [u8],
  faces: Vec<FaceEntry<'a>>,
}

impl<'a> TypeCase<'a> {
  /// Reads the directory and checks that every face blob lies inside `data`.
  pub fn parse(data: &'a [u8]) -> Result<Self, Error> {
    let mut c = Cursor::new(data);
    if c.bytes(4)? != TYPECASE_MAGIC {
      return Err(Error::BadMagic);
    }
    let version = c.u8()?;
    if version != TYPECASE_VERSION {
      return Err(Error::BadVersion(version));
    }
    let count = c.u16_le()? as usize;
    let mut faces = Vec::with_capacity(count.min(data.len()));
    for _ in 0..count {
      let name = c.pascal_str()?;
      let size = c.u8()?;
      let offset = c.u32_le()?;
      let next = c.u32_le()?;
      if offset > next {
        return Err(Error::Malformed);
      }
      if next as usize > data.len() {
        return Err(Error::Truncated);
      }
      faces.push(FaceEntry { name, size, offset, next });
    }
    Ok(TypeCase { version, data, faces })
  }

  #[inline]
  pub fn faces(&self) -> &[FaceEntry<'a>] {
    &self.faces
  }

  /// First face called `name`.
  pub fn find(&self, name: &str) -> Option<&FaceEntry<'a>> {
    self.faces.iter().find(|f| f.name == name)
  }

  /// The encoded font blob of `face`.
  pub fn font_bytes(&self, face: &FaceEntry<'_>) -> Result<&'a [u8], Error> {
    self.data.get(face.offset as usize..face.next as usize).ok_or(Error::Truncated)
  }

  /// Parses the font of `face`, borrowing the container bytes.
  pub fn load_face(&self, face: &FaceEntry<'_>) -> Result<Font<'a>, Error> {
    load(self.font_bytes(face)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::font::Face;
  use crate::loader::tests::tiny;
  use alloc::vec::Vec;

  fn container(blobs: &[(&str, u8, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(TYPECASE_MAGIC);
    out.push(TYPECASE_VERSION);
    out.extend_from_slice(&(blobs.len() as u16).to_le_bytes());
    let dir_len: usize = blobs.iter().map(|(n, _, _)| 1 + n.len() + 1 + 8).sum();
    let mut offset = out.len() + dir_len;
    for (name, size, blob) in blobs {
      out.push(name.len() as u8);
      out.extend_from_slice(name.as_bytes());
      out.push(*size);
      out.extend_from_slice(&(offset as u32).to_le_bytes());
      offset += blob.len();
      out.extend_from_slice(&(offset as u32).to_le_bytes());
    }
    for (_, _, blob) in blobs {
      out.extend_from_slice(blob);
    }
    out
  }

  #[test]
  fn directory_and_face_loading() {
    let font = tiny();
    let bytes = container(&[("tiny", 2, &font), ("other", 9, b"xx")]);
    let case = TypeCase::parse(&bytes).unwrap();
    assert_eq!(case.version, TYPECASE_VERSION);
    assert_eq!(case.faces().len(), 2);
    let face = case.find("tiny").unwrap();
    assert_eq!((face.size, face.next - face.offset), (2, font.len() as u32));
    assert_eq!(case.font_bytes(face).unwrap(), &font[..]);
    let loaded = case.load_face(face).unwrap();
    assert_eq!(loaded.info().short_name, "tiny");
    let other = case.find("other").unwrap();
    assert_eq!(case.load_face(other).unwrap_err(), Error::Truncated);
    assert!(case.find("missing").is_none());
  }

  #[test]
  fn rejects_bad_headers_and_out_of_bounds_faces() {
    let font = tiny();
    let mut bytes = container(&[("tiny", 2, &font)]);
    assert!(TypeCase::parse(&bytes[..bytes.len() - 1]).is_err());
    bytes[4] = 3;
    assert_eq!(TypeCase::parse(&bytes).unwrap_err(), Error::BadVersion(3));
    bytes[0] = b'C';
    assert_eq!(TypeCase::parse(&bytes).unwrap_err(), Error::BadMagic);
  }

  #[test]
  fn empty_container() {
    let bytes = container(&[]);
    assert!(TypeCase::parse(&bytes).unwrap().faces().is_empty());
  }
}
