//! Conveyor CLI Application
//!
//! Command-line interface for building and editing clone/migrate plans.

mod args;
mod cli;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::{read_json, Cli};
use conveyor_core::{params::ListPlans, InMemoryExtractor, InMemoryTemplateSource, PlannerBuilder};
use log::{debug, info};
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        provider_file,
        stacks_file,
        no_color,
        command,
    } = Args::parse();

    let mut builder = PlannerBuilder::new().with_database_path(database_file);
    if let Some(path) = provider_file {
        let extractor = InMemoryExtractor::from_json(read_json(&path)?)
            .context("Failed to load provider objects")?;
        debug!("Loaded provider objects from {}", path.display());
        builder = builder.with_resource_extractor(extractor);
    }
    if let Some(path) = stacks_file {
        let source = InMemoryTemplateSource::from_json(read_json(&path)?)
            .context("Failed to load stacks")?;
        debug!("Loaded stacks from {}", path.display());
        builder = builder.with_template_source(source);
    }

    let planner = builder.build().await.context("Failed to initialize planner")?;
    let renderer = TerminalRenderer::new(!no_color);

    info!("Conveyor started");

    let cli = Cli::new(planner, renderer);
    match command {
        Some(Plan { command }) => cli.handle_plan_command(command).await,
        Some(Stack { command }) => cli.handle_stack_command(command).await,
        None => cli.list_plans(&ListPlans::default()).await,
    }
}
