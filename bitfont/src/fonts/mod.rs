//! Fonts compiled into the library.
//!
//! Each module holds the output of `bitfont build --format rust` with the import
//! paths pointed at this crate.

pub mod pico;
