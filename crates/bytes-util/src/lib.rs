//! Small byte and bit level helpers shared by the codec crates.
//!
//! - [`BitWriter`] packs bits MSB-first into any [`std::io::Write`].
//! - [`BitReader`] reads bits MSB-first from any [`std::io::Read`].
//! - [`BytesCursorExt`] slices [`bytes::Bytes`] out of a cursor without copying.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod bit_read;
mod bit_write;
mod bytes_cursor;

pub use bit_read::BitReader;
pub use bit_write::BitWriter;
pub use bytes_cursor::BytesCursorExt;
