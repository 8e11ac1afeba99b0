//! Library target for the `tilegen` package.
//!
//! The `tilegen` binary (`src/main.rs`) writes bit-exact AV1 tile group
//! test vectors. The pieces it is built from live here so they can be
//! tested and reused by other tools.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]

pub mod assemble;
pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod recipe;
pub mod verify;
