//! Error types for AV1 bitstream synthesis and parsing.

use thiserror::Error;

/// Errors that can occur while building or parsing AV1 test streams.
#[derive(Error, Debug)]
pub enum Av1Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid OBU data.
    #[error("invalid OBU: {0}")]
    InvalidObu(String),

    /// Unexpected end of data.
    #[error("unexpected end of data: expected {expected} bytes, got {actual}")]
    UnexpectedEof {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes available.
        actual: usize,
    },

    /// A frame dimension is zero.
    #[error("invalid frame dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested maximum frame width.
        width: u32,
        /// Requested maximum frame height.
        height: u32,
    },

    /// A frame dimension needs more than 16 bits to code `max - 1`.
    #[error("frame dimension {value} needs {bits} bits, at most 16 are supported")]
    DimensionTooLarge {
        /// The offending dimension.
        value: u32,
        /// Bits required to code `value - 1`.
        bits: u8,
    },

    /// The sequence header is not a reduced still-picture header.
    #[error("unsupported sequence header: {0}")]
    UnsupportedSequenceHeader(&'static str),

    /// A tile log2 count is not the maximum allowed for the frame size, so the
    /// unary increment code would need an explicit terminator.
    #[error("tile {axis} log2 {requested} is not the maximum {max} for this frame size")]
    NonMaximalTileLog2 {
        /// `"cols"` or `"rows"`.
        axis: &'static str,
        /// Requested log2 value.
        requested: u8,
        /// Maximum log2 value for the frame size.
        max: u8,
    },

    /// The tile layout cannot be coded or parsed by this implementation.
    #[error("unsupported tile layout: {0}")]
    UnsupportedTileLayout(&'static str),

    /// The frame has no tiles.
    #[error("invalid tile count: {0}")]
    InvalidTileCount(u32),

    /// `tg_start` is greater than `tg_end`.
    #[error("invalid tile group range: tg_start={start} > tg_end={end}")]
    InvalidTileGroupRange {
        /// First tile of the group.
        start: u32,
        /// Last tile of the group.
        end: u32,
    },

    /// A tile index does not exist in the frame.
    #[error("tile index {index} out of range for {num_tiles} tiles")]
    TileIndexOutOfRange {
        /// The offending tile index.
        index: u32,
        /// Number of tiles in the frame.
        num_tiles: u32,
    },

    /// `TileSizeBytes` is outside `1..=4`.
    #[error("invalid tile_size_bytes: {0}, expected 1..=4")]
    InvalidTileSizeBytes(u8),

    /// The explicit tile size list does not cover every non-final tile.
    #[error("expected {expected} explicit tile sizes, got {actual}")]
    TileSizeCountMismatch {
        /// Tiles in the group minus one.
        expected: usize,
        /// Length of the supplied size list.
        actual: usize,
    },

    /// An explicit tile size is zero or does not fit in `TileSizeBytes`.
    #[error("invalid size {size} for tile {index} with tile_size_bytes={tile_size_bytes}")]
    InvalidTileSize {
        /// Position of the tile inside the group.
        index: usize,
        /// The offending size in bytes.
        size: usize,
        /// Width of the `tile_size_minus_1` field.
        tile_size_bytes: u8,
    },

    /// The explicit tile sizes add up to more than the payload.
    #[error("explicit tile sizes total {total} bytes but the payload has {payload}")]
    TileSizesExceedPayload {
        /// Sum of the explicit sizes.
        total: usize,
        /// Payload length.
        payload: usize,
    },

    /// An IVF frame's size must fit the 32-bit frame header field.
    #[error("IVF frame of {0} bytes is too large")]
    IvfFrameTooLarge(usize),

    /// Searches and synthetic payloads need at least one boolean or byte.
    #[error("invalid search target: {0}")]
    InvalidSearchTarget(&'static str),

    /// No 16-bit payload decodes the requested number of booleans and exits cleanly.
    #[error("no 2-byte payload exits cleanly after {bools} bool(s)")]
    SearchExhausted {
        /// Requested boolean count.
        bools: u32,
    },
}

/// Result type alias for AV1 operations.
pub type Result<T> = std::result::Result<T, Av1Error>;
