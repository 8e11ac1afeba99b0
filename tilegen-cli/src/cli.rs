use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const DEFAULT_OUT_DIR: &str = "testFiles/generated/av1";

#[derive(Parser, Debug)]
#[command(name = "tilegen", author, version, about = "Bit-exact AV1 tile group test vector generator", long_about = None)]
pub struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write every vector to the output directory
    Generate {
        #[command(flatten)]
        target: TargetArgs,

        /// Also write a single-frame IVF file per vector
        #[arg(long)]
        ivf: bool,

        /// Also write manifest.json with the expected tile layouts
        #[arg(long)]
        manifest: bool,
    },

    /// Print the payload the symbol decoder consumes exactly
    Search {
        /// Number of booleans decoded before the exit check
        #[arg(long, conflicts_with = "trailing", required_unless_present = "trailing")]
        bools: Option<u32>,

        /// Print the trailing-only payload of this many bytes instead
        #[arg(long)]
        trailing: Option<usize>,
    },

    /// Parse written vectors back and compare them with their recipes
    Verify {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List vector names
    List {
        /// TOML recipe file; the built-in catalog when omitted
        #[arg(long)]
        recipes: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    /// Directory holding the generated vectors
    #[arg(long, env = "TILEGEN_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,

    /// TOML recipe file; the built-in catalog when omitted
    #[arg(long)]
    pub recipes: Option<PathBuf>,
}

#[cfg(test)]
#[cfg_attr(all(coverage_nightly, test), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let args = Args::try_parse_from(["tilegen", "-v", "generate", "--out-dir", "out", "--ivf"]).unwrap();
        assert!(args.verbose);
        let Commands::Generate { target, ivf, manifest } = args.command else {
            panic!("expected generate");
        };
        assert_eq!(target.out_dir, PathBuf::from("out"));
        assert!(target.recipes.is_none());
        assert!(ivf);
        assert!(!manifest);
    }

    #[test]
    fn test_parse_search() {
        let args = Args::try_parse_from(["tilegen", "search", "--bools", "8"]).unwrap();
        assert!(matches!(
            args.command,
            Commands::Search {
                bools: Some(8),
                trailing: None
            }
        ));

        assert!(Args::try_parse_from(["tilegen", "search"]).is_err());
        assert!(Args::try_parse_from(["tilegen", "search", "--bools", "1", "--trailing", "2"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["tilegen", "-q", "-v", "list"]).is_err());
    }
}
