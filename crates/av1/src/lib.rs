//! Bit-exact synthesis of small AV1 test streams.
//!
//! Supports:
//! - OBU header and LEB128 writing and parsing
//! - Reduced still-picture sequence headers
//! - Minimal frame headers with uniform `tile_info()`
//! - Tile group OBU payloads with explicit tile sizes
//! - A boolean model of the symbol decoder and a search for payloads it
//!   consumes exactly
//! - Single-frame IVF wrapping
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod ivf;
mod obu;
pub mod obu_stream;
pub mod search;
pub mod symbol;

pub use error::{Av1Error, Result};
pub use obu::frame::{FrameHeader, TileInfo, TileLimits};
pub use obu::seq::SequenceHeader;
pub use obu::tile_group::{TileGroup, TileGroupSpec, TileSpan};
pub use obu::utils::{leb128_size, write_leb128};
pub use obu::{ObuHeader, ObuType};
pub use symbol::{SymbolDecoder, check_trailing_bits};
