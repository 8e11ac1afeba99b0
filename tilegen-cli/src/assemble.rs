//! Turns recipes into complete OBU streams.

use av1::obu_stream::write_obu;
use av1::search::{PayloadSearch, trailing_only_payload};
use av1::{FrameHeader, ObuType, SequenceHeader, TileGroup, TileGroupSpec, TileInfo};
use bytes::{Bytes, BytesMut};
use serde::Serialize;
use tracing::trace;

use crate::error::{AppError, Result};
use crate::recipe::{TileSource, VectorRecipe};

/// Tile layout a stream was built with, as a decoder should recover it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorSummary {
    pub tile_cols: u32,
    pub tile_rows: u32,
    /// `TileSizeBytes`, 0 when the frame has a single tile.
    pub tile_size_bytes: u8,
    pub tg_start: u32,
    pub tg_end: u32,
    /// `(tile_index, size)` for every tile in the group.
    pub tiles: Vec<(u32, usize)>,
}

impl VectorSummary {
    pub fn new(tile_info: &TileInfo, group: &TileGroup) -> Self {
        Self {
            tile_cols: tile_info.tile_cols,
            tile_rows: tile_info.tile_rows,
            tile_size_bytes: tile_info.tile_size_bytes,
            tg_start: group.tg_start,
            tg_end: group.tg_end,
            tiles: group.tile_sizes(),
        }
    }
}

/// A fully assembled stream, ready to be written.
#[derive(Debug, Clone)]
pub struct TestVector {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// `obu(seq) | obu(frame header) | obu(tile group)`
    pub stream: Bytes,
    pub summary: VectorSummary,
}

/// Builds test vectors, sharing search results between them.
#[derive(Debug, Default)]
pub struct VectorAssembler {
    search: PayloadSearch,
}

impl VectorAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    fn tile_bytes(&mut self, source: &TileSource) -> Result<Bytes> {
        Ok(match source {
            TileSource::Bytes(bytes) => Bytes::copy_from_slice(bytes),
            TileSource::Trailing(size) => trailing_only_payload(*size)?,
            TileSource::ExitAfterBools(bools) => Bytes::copy_from_slice(&self.search.exit_after(*bools)?),
        })
    }

    /// Assembles one vector entirely in memory.
    pub fn assemble(&mut self, recipe: &VectorRecipe) -> Result<TestVector> {
        let seq = SequenceHeader {
            max_frame_width: recipe.width,
            max_frame_height: recipe.height,
            use_128x128_superblock: recipe.use_128x128_superblock,
        };
        let frame = FrameHeader {
            tile_cols_log2: recipe.tile_cols_log2,
            tile_rows_log2: recipe.tile_rows_log2,
        };

        let mut seq_payload = Vec::new();
        seq.mux(&mut seq_payload)?;
        let mut frame_payload = Vec::new();
        frame.mux_for(&seq, &mut frame_payload)?;
        let tile_info = TileInfo::uniform(&seq, frame.tile_cols_log2, frame.tile_rows_log2);

        let mut payload = BytesMut::new();
        let mut sizes = Vec::with_capacity(recipe.tiles.len());
        for source in &recipe.tiles {
            let tile = self.tile_bytes(source)?;
            sizes.push(tile.len());
            payload.extend_from_slice(&tile);
        }
        sizes.pop();

        let spec = TileGroupSpec {
            present_flag: recipe.group.is_some(),
            tg_start: recipe.group.map_or(0, |group| group.start),
            tg_end: recipe.group.map_or(0, |group| group.end),
            tile_size_bytes: tile_info.tile_size_bytes,
            non_last_sizes: sizes,
            payload: payload.freeze(),
        };

        if let Ok((start, end)) = spec.range(tile_info.num_tiles()) {
            let expected = end.saturating_sub(start) as usize + 1;
            if start <= end && recipe.tiles.len() != expected {
                return Err(AppError::InvalidInput(format!(
                    "vector {:?} lists {} tiles but its group holds {expected}",
                    recipe.name,
                    recipe.tiles.len()
                )));
            }
        }

        let (tile_group_payload, group) = spec.to_bytes(&tile_info)?;

        let mut stream = Vec::new();
        for (obu_type, obu_payload) in [
            (ObuType::SequenceHeader, seq_payload.as_slice()),
            (ObuType::FrameHeader, frame_payload.as_slice()),
            (ObuType::TileGroup, tile_group_payload.as_ref()),
        ] {
            let written = write_obu(&mut stream, obu_type, obu_payload)?;
            trace!(name = %recipe.name, ?obu_type, written, "framed OBU");
        }

        Ok(TestVector {
            name: recipe.name.clone(),
            width: recipe.width,
            height: recipe.height,
            stream: Bytes::from(stream),
            summary: VectorSummary::new(&tile_info, &group),
        })
    }

    /// Assembles every recipe, failing before anything is returned if one
    /// of them cannot be built.
    pub fn assemble_all(&mut self, recipes: &[VectorRecipe]) -> Result<Vec<TestVector>> {
        recipes.iter().map(|recipe| self.assemble(recipe)).collect()
    }
}

#[cfg(test)]
#[cfg_attr(all(coverage_nightly, test), coverage(off))]
mod tests {
    use super::*;
    use crate::recipe::{self, GroupRecipe};

    fn builtin_vectors() -> Vec<TestVector> {
        VectorAssembler::new()
            .assemble_all(&recipe::builtin().unwrap())
            .unwrap()
    }

    #[test]
    fn test_builtin_streams() {
        let streams: Vec<(String, String)> = builtin_vectors()
            .into_iter()
            .map(|vector| (vector.name, hex::encode(&vector.stream)))
            .collect();

        let expected = [
            ("m3b_tilegroup_1tile", "0a0618157ffc00001a0190220411223344"),
            ("m3b_tilegroup_1tile_trailingonly", "0a0618157ffc00001a0190220180"),
            ("m3b_tilegroup_1tile_exit1bool", "0a0618157ffc00001a019022022000"),
            ("m3b_tilegroup_1tile_exit8bool", "0a0618157ffc00001a019022020080"),
            (
                "m3b_tilegroup_2x2_alltiles_flag0",
                "0a061819bfff00001a029c00220e0002aaabac01babb00cadadbdcdd",
            ),
            (
                "m3b_tilegroup_2x2_alltiles_flag0_trailingonly",
                "0a061819bfff00001a029c00220b0000800180000280000080",
            ),
            (
                "m3b_tilegroup_2x2_alltiles_flag0_exit8bool",
                "0a061819bfff00001a029c00220c000100800100800100800080",
            ),
            (
                "m3b_tilegroup_2x2_subset_flag1",
                "0a061819bfff00001a029c002209b00121223132333435",
            ),
            (
                "m3b_tilegroup_2x2_subset_flag1_trailingonly",
                "0a061819bfff00001a029c002208b001800080000000",
            ),
        ];

        assert_eq!(streams.len(), expected.len());
        for ((name, stream), (expected_name, expected_stream)) in streams.iter().zip(expected) {
            assert_eq!(name, expected_name);
            assert_eq!(stream, expected_stream, "{name}");
        }
    }

    #[test]
    fn test_builtin_summaries() {
        let summaries: Vec<(String, (u32, u32, u8), (u32, u32), Vec<(u32, usize)>)> = builtin_vectors()
            .into_iter()
            .map(|vector| {
                let summary = vector.summary;
                (
                    vector.name,
                    (summary.tile_cols, summary.tile_rows, summary.tile_size_bytes),
                    (summary.tg_start, summary.tg_end),
                    summary.tiles,
                )
            })
            .collect();

        let single = (1, 1, 0);
        let grid = (2, 2, 1);
        let expected = vec![
            ("m3b_tilegroup_1tile", single, (0, 0), vec![(0, 4)]),
            ("m3b_tilegroup_1tile_trailingonly", single, (0, 0), vec![(0, 1)]),
            ("m3b_tilegroup_1tile_exit1bool", single, (0, 0), vec![(0, 2)]),
            ("m3b_tilegroup_1tile_exit8bool", single, (0, 0), vec![(0, 2)]),
            ("m3b_tilegroup_2x2_alltiles_flag0", grid, (0, 3), vec![(0, 3), (1, 2), (2, 1), (3, 4)]),
            (
                "m3b_tilegroup_2x2_alltiles_flag0_trailingonly",
                grid,
                (0, 3),
                vec![(0, 1), (1, 2), (2, 3), (3, 1)],
            ),
            (
                "m3b_tilegroup_2x2_alltiles_flag0_exit8bool",
                grid,
                (0, 3),
                vec![(0, 2), (1, 2), (2, 2), (3, 2)],
            ),
            ("m3b_tilegroup_2x2_subset_flag1", grid, (1, 2), vec![(1, 2), (2, 5)]),
            ("m3b_tilegroup_2x2_subset_flag1_trailingonly", grid, (1, 2), vec![(1, 2), (2, 4)]),
        ];

        assert_eq!(summaries.len(), expected.len());
        for (actual, (name, layout, range, tiles)) in summaries.into_iter().zip(expected) {
            assert_eq!(actual, (name.to_string(), layout, range, tiles));
        }
    }

    #[test]
    fn test_search_results_are_shared() {
        let mut assembler = VectorAssembler::new();
        assembler.assemble_all(&recipe::builtin().unwrap()).unwrap();
        // exit_after_bools = 1 and 8
        assert_eq!(assembler.search.len(), 2);
    }

    fn recipe(tiles: Vec<TileSource>) -> VectorRecipe {
        VectorRecipe {
            name: "test".into(),
            width: 128,
            height: 128,
            use_128x128_superblock: false,
            tile_cols_log2: 1,
            tile_rows_log2: 1,
            group: None,
            tiles,
        }
    }

    #[test]
    fn test_tile_count_must_match_group() {
        let err = VectorAssembler::new()
            .assemble(&recipe(vec![TileSource::Trailing(1); 3]))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let mut subset = recipe(vec![TileSource::Trailing(1)]);
        subset.group = Some(GroupRecipe { start: 2, end: 2 });
        let vector = VectorAssembler::new().assemble(&subset).unwrap();
        assert_eq!(vector.summary.tiles, [(2, 1)]);
    }

    #[test]
    fn test_precondition_errors_surface() {
        let mut bad_range = recipe(vec![TileSource::Trailing(1); 2]);
        bad_range.group = Some(GroupRecipe { start: 3, end: 4 });
        let err = VectorAssembler::new().assemble(&bad_range).unwrap_err();
        assert!(matches!(err, AppError::Av1(av1::Av1Error::TileIndexOutOfRange { .. })));

        let mut non_maximal = recipe(vec![TileSource::Trailing(1); 2]);
        non_maximal.width = 256;
        non_maximal.height = 64;
        non_maximal.tile_rows_log2 = 0;
        let err = VectorAssembler::new().assemble(&non_maximal).unwrap_err();
        assert!(matches!(err, AppError::Av1(av1::Av1Error::NonMaximalTileLog2 { .. })));

        let err = VectorAssembler::new()
            .assemble(&recipe(vec![
                TileSource::ExitAfterBools(16),
                TileSource::Trailing(1),
                TileSource::Trailing(1),
                TileSource::Trailing(1),
            ]))
            .unwrap_err();
        assert!(matches!(err, AppError::Av1(av1::Av1Error::SearchExhausted { bools: 16 })));
    }
}
