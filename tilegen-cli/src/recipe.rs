//! TOML recipes describing the vectors to generate.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, Result};

const BUILTIN_RECIPES: &str = include_str!("../recipes/builtin.toml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecipeFile {
    #[serde(rename = "vector", default)]
    vectors: Vec<VectorRecipe>,
}

/// One `[[vector]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VectorRecipe {
    /// File stem of the generated vector.
    pub name: String,
    /// Maximum (and coded) frame width.
    pub width: u32,
    /// Maximum (and coded) frame height.
    pub height: u32,
    #[serde(default)]
    pub use_128x128_superblock: bool,
    #[serde(default)]
    pub tile_cols_log2: u8,
    #[serde(default)]
    pub tile_rows_log2: u8,
    /// Explicit tile range; without it the group covers every tile.
    #[serde(default)]
    pub group: Option<GroupRecipe>,
    /// Payload of every tile in the group, in tile order.
    pub tiles: Vec<TileSource>,
}

/// `tile_start_and_end_present_flag=1` with the given range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupRecipe {
    pub start: u32,
    pub end: u32,
}

/// Where a tile's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileSource {
    /// Literal bytes.
    Bytes(Vec<u8>),
    /// `0x80` followed by zeros, this many bytes in total.
    Trailing(usize),
    /// The smallest 2-byte payload that exits after this many bools.
    ExitAfterBools(u32),
}

/// Parses recipes from TOML text.
pub fn from_toml_str(text: &str) -> Result<Vec<VectorRecipe>> {
    let file: RecipeFile = toml::from_str(text)?;
    validate(&file.vectors)?;
    Ok(file.vectors)
}

/// Loads recipes from a TOML file.
pub fn load(path: &Path) -> Result<Vec<VectorRecipe>> {
    let text = std::fs::read_to_string(path)?;
    from_toml_str(&text)
}

/// The built-in tile group vectors.
pub fn builtin() -> Result<Vec<VectorRecipe>> {
    from_toml_str(BUILTIN_RECIPES)
}

/// Loads `path` if given, otherwise the built-in catalog.
pub fn load_or_builtin(path: Option<&Path>) -> Result<Vec<VectorRecipe>> {
    match path {
        Some(path) => load(path),
        None => builtin(),
    }
}

fn validate(recipes: &[VectorRecipe]) -> Result<()> {
    if recipes.is_empty() {
        return Err(AppError::InvalidInput("no [[vector]] tables found".into()));
    }

    let mut seen = HashSet::new();
    for recipe in recipes {
        let name = recipe.name.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(AppError::InvalidInput(format!("invalid vector name {name:?}")));
        }
        if !seen.insert(name) {
            return Err(AppError::InvalidInput(format!("duplicate vector name {name:?}")));
        }
        if recipe.tiles.is_empty() {
            return Err(AppError::InvalidInput(format!("vector {name:?} has no tiles")));
        }
    }
    Ok(())
}

#[cfg(test)]
#[cfg_attr(all(coverage_nightly, test), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let recipes = builtin().unwrap();
        let names: Vec<&str> = recipes.iter().map(|recipe| recipe.name.as_str()).collect();
        insta::assert_debug_snapshot!(names, @r#"
        [
            "m3b_tilegroup_1tile",
            "m3b_tilegroup_1tile_trailingonly",
            "m3b_tilegroup_1tile_exit1bool",
            "m3b_tilegroup_1tile_exit8bool",
            "m3b_tilegroup_2x2_alltiles_flag0",
            "m3b_tilegroup_2x2_alltiles_flag0_trailingonly",
            "m3b_tilegroup_2x2_alltiles_flag0_exit8bool",
            "m3b_tilegroup_2x2_subset_flag1",
            "m3b_tilegroup_2x2_subset_flag1_trailingonly",
        ]
        "#);
    }

    #[test]
    fn test_parse_recipe() {
        let recipes = from_toml_str(
            r#"
            [[vector]]
            name = "custom"
            width = 128
            height = 128
            tile_cols_log2 = 1
            tile_rows_log2 = 1
            group = { start = 0, end = 1 }
            tiles = [{ bytes = [0x01, 2] }, { trailing = 3 }]

            [[vector]]
            name = "searched"
            width = 16
            height = 16
            use_128x128_superblock = true
            tiles = [{ exit_after_bools = 4 }]
            "#,
        )
        .unwrap();

        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].group, Some(GroupRecipe { start: 0, end: 1 }));
        assert_eq!(recipes[0].tiles, [TileSource::Bytes(vec![1, 2]), TileSource::Trailing(3)]);
        assert!(!recipes[0].use_128x128_superblock);

        assert!(recipes[1].use_128x128_superblock);
        assert_eq!((recipes[1].tile_cols_log2, recipes[1].tile_rows_log2), (0, 0));
        assert_eq!(recipes[1].group, None);
        assert_eq!(recipes[1].tiles, [TileSource::ExitAfterBools(4)]);
    }

    #[test]
    fn test_invalid_recipes() {
        let err = from_toml_str("").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let duplicate = r#"
            [[vector]]
            name = "a"
            width = 64
            height = 64
            tiles = [{ trailing = 1 }]

            [[vector]]
            name = "a"
            width = 64
            height = 64
            tiles = [{ trailing = 1 }]
        "#;
        assert!(matches!(from_toml_str(duplicate), Err(AppError::InvalidInput(_))));

        let escaping = r#"
            [[vector]]
            name = "../a"
            width = 64
            height = 64
            tiles = [{ trailing = 1 }]
        "#;
        assert!(matches!(from_toml_str(escaping), Err(AppError::InvalidInput(_))));

        let unknown_source = r#"
            [[vector]]
            name = "a"
            width = 64
            height = 64
            tiles = [{ random = 1 }]
        "#;
        assert!(matches!(from_toml_str(unknown_source), Err(AppError::Recipe(_))));

        let no_tiles = r#"
            [[vector]]
            name = "a"
            width = 64
            height = 64
            tiles = []
        "#;
        assert!(matches!(from_toml_str(no_tiles), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.toml");
        std::fs::write(
            &path,
            "[[vector]]\nname = \"one\"\nwidth = 8\nheight = 8\ntiles = [{ bytes = [0x80] }]\n",
        )
        .unwrap();

        let recipes = load_or_builtin(Some(&path)).unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "one");

        assert_eq!(load_or_builtin(None).unwrap().len(), 9);
    }
}
