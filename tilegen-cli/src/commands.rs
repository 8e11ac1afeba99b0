//! Subcommand implementations.

use std::path::Path;

use av1::search::{find_payload_exiting_after, trailing_only_payload};
use tracing::info;

use crate::assemble::VectorAssembler;
use crate::cli::{Commands, TargetArgs};
use crate::error::{AppError, Result};
use crate::output::VectorStore;
use crate::recipe;
use crate::verify::verify_stream;

/// Assembles every recipe, then writes them. Nothing is written if any
/// recipe fails to build.
pub fn generate(target: &TargetArgs, ivf: bool, manifest: bool) -> Result<usize> {
    let recipes = recipe::load_or_builtin(target.recipes.as_deref())?;
    let vectors = VectorAssembler::new().assemble_all(&recipes)?;

    let store = VectorStore::new(&target.out_dir);
    for vector in &vectors {
        store.write_vector(vector, ivf)?;
    }
    if manifest {
        store.write_manifest(&vectors)?;
    }

    info!(count = vectors.len(), out_dir = %target.out_dir.display(), "generated vectors");
    Ok(vectors.len())
}

/// Re-parses every written vector and compares it with a fresh build.
pub fn verify(target: &TargetArgs) -> Result<usize> {
    let recipes = recipe::load_or_builtin(target.recipes.as_deref())?;
    let vectors = VectorAssembler::new().assemble_all(&recipes)?;
    let store = VectorStore::new(&target.out_dir);

    for vector in &vectors {
        let written = store.read_vector(&vector.name)?;
        verify_stream(&vector.name, written.clone(), &vector.summary)?;
        if written != vector.stream {
            return Err(AppError::VerificationFailed {
                name: vector.name.clone(),
                detail: format!(
                    "bytes differ: expected {}, found {}",
                    hex::encode(&vector.stream),
                    hex::encode(&written)
                ),
            });
        }
        info!(name = %vector.name, "verified");
    }

    Ok(vectors.len())
}

/// Hex payload for `search --bools N` or `search --trailing N`.
pub fn search(bools: Option<u32>, trailing: Option<usize>) -> Result<String> {
    match (bools, trailing) {
        (Some(bools), None) => Ok(hex::encode(find_payload_exiting_after(bools)?)),
        (None, Some(size)) => Ok(hex::encode(trailing_only_payload(size)?)),
        _ => Err(AppError::InvalidInput("expected exactly one of --bools or --trailing".into())),
    }
}

pub fn list(recipes: Option<&Path>) -> Result<Vec<String>> {
    Ok(recipe::load_or_builtin(recipes)?
        .into_iter()
        .map(|recipe| recipe.name)
        .collect())
}

/// Runs a parsed subcommand, printing its result to stdout.
pub fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Generate { target, ivf, manifest } => {
            let count = generate(&target, ivf, manifest)?;
            println!("Generated {count} vectors in {}", target.out_dir.display());
        }
        Commands::Search { bools, trailing } => println!("{}", search(bools, trailing)?),
        Commands::Verify { target } => {
            let count = verify(&target)?;
            println!("Verified {count} vectors in {}", target.out_dir.display());
        }
        Commands::List { recipes } => {
            for name in list(recipes.as_deref())? {
                println!("{name}");
            }
        }
    }
    Ok(())
}
