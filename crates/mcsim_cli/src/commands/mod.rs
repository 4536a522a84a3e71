//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

use clap::ValueEnum;

pub mod grid;
pub mod price;

/// Report format shared by the commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Boxed text table
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}
