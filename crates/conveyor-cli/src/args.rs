use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{PlanCommands, StackCommands};

/// Command-line front end for Conveyor clone and migration plans
///
/// A plan records a set of cloud resources and the dependencies between them
/// so they can be replayed into another environment. The CLI creates plans
/// from resource or template documents, edits them through batches of
/// update commands, drives their lifecycle and flattens nested stacks.
#[derive(Parser)]
#[command(version, about, name = "conveyor")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/conveyor/conveyor.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// JSON file of provider objects used when an edit adopts an existing
    /// resource
    #[arg(long, global = true)]
    pub provider_file: Option<PathBuf>,

    /// JSON file of deployed stacks used by `stack extract`
    #[arg(long, global = true)]
    pub stacks_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the Conveyor CLI
///
/// - `plan`: create, inspect, edit and retire plans
/// - `stack`: work with deployed orchestration stacks
#[derive(Subcommand)]
pub enum Commands {
    /// Manage plans
    #[command(alias = "p")]
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Work with deployed stacks
    #[command(alias = "s")]
    Stack {
        #[command(subcommand)]
        command: StackCommands,
    },
}
