//! Command-line argument wrappers and their handlers.
//!
//! Each subcommand has a clap [`Args`] struct converted into the matching
//! core parameter type, so core params stay free of clap derives:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Planner → Display → Renderer
//! ```
//!
//! Document inputs (resources, templates, update batches) are read from JSON
//! files by the handlers before conversion.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use conveyor_core::{
    models::{PlanStatus, PlanType, ResourceMap},
    params::*,
    template::resources_to_template,
    PlanView, Planner, View,
};
use serde_json::Value;

use crate::renderer::TerminalRenderer;

/// Reads and parses a JSON document.
pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum PlanTypeArg {
    Clone,
    Migrate,
}

impl From<PlanTypeArg> for PlanType {
    fn from(val: PlanTypeArg) -> Self {
        match val {
            PlanTypeArg::Clone => PlanType::Clone,
            PlanTypeArg::Migrate => PlanType::Migrate,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum PlanStatusArg {
    Initiating,
    Creating,
    Available,
    Cloning,
    Migrating,
    Finished,
    Error,
    Deleting,
    Expired,
}

impl From<PlanStatusArg> for PlanStatus {
    fn from(val: PlanStatusArg) -> Self {
        match val {
            PlanStatusArg::Initiating => PlanStatus::Initiating,
            PlanStatusArg::Creating => PlanStatus::Creating,
            PlanStatusArg::Available => PlanStatus::Available,
            PlanStatusArg::Cloning => PlanStatus::Cloning,
            PlanStatusArg::Migrating => PlanStatus::Migrating,
            PlanStatusArg::Finished => PlanStatus::Finished,
            PlanStatusArg::Error => PlanStatus::Error,
            PlanStatusArg::Deleting => PlanStatus::Deleting,
            PlanStatusArg::Expired => PlanStatus::Expired,
        }
    }
}

/// Owner and kind of a new plan.
#[derive(Args)]
pub struct PlanOwnerArgs {
    /// Kind of replay the plan is built for
    #[arg(long, value_enum, default_value = "clone")]
    pub plan_type: PlanTypeArg,
    /// Project owning the plan
    #[arg(long)]
    pub project_id: String,
    /// User requesting the plan
    #[arg(long)]
    pub user_id: String,
}

/// Create a plan from a JSON map of extracted resources
#[derive(Args)]
pub struct CreatePlanArgs {
    /// JSON file mapping resource names to resources
    pub resources_file: PathBuf,
    #[command(flatten)]
    pub owner: PlanOwnerArgs,
}

impl CreatePlanArgs {
    fn into_params(self, resources: ResourceMap) -> CreatePlan {
        CreatePlan {
            plan_type: self.owner.plan_type.into(),
            project_id: self.owner.project_id,
            user_id: self.owner.user_id,
            resources,
        }
    }
}

/// Create a plan from a Heat template
#[derive(Args)]
pub struct CreateFromTemplateArgs {
    /// JSON template file with a `resources` section
    pub template_file: PathBuf,
    #[command(flatten)]
    pub owner: PlanOwnerArgs,
}

impl CreateFromTemplateArgs {
    fn into_params(self, template: Value) -> CreatePlanFromTemplate {
        CreatePlanFromTemplate {
            plan_type: self.owner.plan_type.into(),
            project_id: self.owner.project_id,
            user_id: self.owner.user_id,
            template,
        }
    }
}

/// List plans
#[derive(Args)]
pub struct ListPlansArgs {
    /// Only plans in this status
    #[arg(long, value_enum)]
    pub status: Option<PlanStatusArg>,
    /// Only plans of this type
    #[arg(long, value_enum)]
    pub plan_type: Option<PlanTypeArg>,
    /// Only plans of this project
    #[arg(long)]
    pub project_id: Option<String>,
    /// Include soft-deleted plans
    #[arg(long)]
    pub include_deleted: bool,
}

impl From<ListPlansArgs> for ListPlans {
    fn from(val: ListPlansArgs) -> Self {
        ListPlans {
            status: val.status.map(Into::into),
            plan_type: val.plan_type.map(Into::into),
            project_id: val.project_id,
            include_deleted: val.include_deleted,
        }
    }
}

/// Show a plan with the resources of one view
#[derive(Args)]
pub struct ShowPlanArgs {
    /// ID of the plan
    pub id: String,
    /// Show the original view instead of the updated one
    #[arg(long)]
    pub original: bool,
}

/// Change status, task status or stack id of a plan
#[derive(Args)]
pub struct UpdatePlanArgs {
    /// ID of the plan
    pub id: String,
    /// New lifecycle status
    #[arg(long, value_enum)]
    pub status: Option<PlanStatusArg>,
    /// Free-text progress marker
    #[arg(long)]
    pub task_status: Option<String>,
    /// Executor stack handle
    #[arg(long)]
    pub stack_id: Option<String>,
}

impl From<UpdatePlanArgs> for UpdatePlan {
    fn from(val: UpdatePlanArgs) -> Self {
        UpdatePlan {
            id: val.id,
            status: val.status.map(|s| PlanStatus::from(s).as_str().to_string()),
            task_status: val.task_status,
            stack_id: val.stack_id,
        }
    }
}

/// Apply a batch of add/edit/delete commands to the updated view
#[derive(Args)]
pub struct UpdateResourcesArgs {
    /// ID of the plan
    pub id: String,
    /// JSON file holding the list of update commands
    pub commands_file: PathBuf,
}

/// Replace the updated view with the resources of a template
#[derive(Args)]
pub struct UpdateTemplateArgs {
    /// ID of the plan
    pub id: String,
    /// JSON template file
    pub template_file: PathBuf,
}

/// Recompute the cached dependencies of a view
#[derive(Args)]
pub struct RebuildArgs {
    /// ID of the plan
    pub id: String,
    /// Rebuild the original view instead of the updated one
    #[arg(long)]
    pub original: bool,
}

impl From<RebuildArgs> for RebuildDependencies {
    fn from(val: RebuildArgs) -> Self {
        RebuildDependencies {
            id: val.id,
            original: val.original,
        }
    }
}

/// Print a view of a plan as a Heat template
#[derive(Args)]
pub struct ExportPlanArgs {
    /// ID of the plan
    pub id: String,
    /// Export the original view instead of the updated one
    #[arg(long)]
    pub original: bool,
}

/// Soft-delete a plan
#[derive(Args)]
pub struct DeletePlanArgs {
    /// ID of the plan
    pub id: String,
}

impl From<DeletePlanArgs> for Id {
    fn from(val: DeletePlanArgs) -> Self {
        Id { id: val.id }
    }
}

/// Expire available plans left untouched longer than the time to live
#[derive(Args)]
pub struct ExpirePlansArgs {
    /// Time to live in seconds, defaults to one day
    #[arg(long)]
    pub ttl_secs: Option<u64>,
}

impl From<ExpirePlansArgs> for ExpirePlans {
    fn from(val: ExpirePlansArgs) -> Self {
        ExpirePlans {
            ttl_secs: val.ttl_secs,
        }
    }
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a plan from a resource map
    #[command(alias = "c")]
    Create(CreatePlanArgs),
    /// Create a plan from a Heat template
    CreateFromTemplate(CreateFromTemplateArgs),
    /// List plans
    #[command(alias = "l")]
    List(ListPlansArgs),
    /// Show a plan
    #[command(alias = "s")]
    Show(ShowPlanArgs),
    /// Change the status, task status or stack id of a plan
    #[command(alias = "u")]
    Update(UpdatePlanArgs),
    /// Apply a batch of resource update commands
    #[command(alias = "ur")]
    UpdateResources(UpdateResourcesArgs),
    /// Replace the updated view from a template
    UpdateTemplate(UpdateTemplateArgs),
    /// Recompute cached dependencies
    Rebuild(RebuildArgs),
    /// Print a view as a Heat template
    Export(ExportPlanArgs),
    /// Soft-delete a plan
    #[command(alias = "d")]
    Delete(DeletePlanArgs),
    /// Expire idle plans
    Expire(ExpirePlansArgs),
}

/// Flatten a deployed stack, inlining nested stacks
#[derive(Args)]
pub struct ExtractStackArgs {
    /// ID of the root stack
    pub stack_id: String,
}

impl From<ExtractStackArgs> for ExtractStack {
    fn from(val: ExtractStackArgs) -> Self {
        ExtractStack {
            stack_id: val.stack_id,
        }
    }
}

#[derive(Subcommand)]
pub enum StackCommands {
    /// Flatten a stack and print the resulting template
    #[command(alias = "x")]
    Extract(ExtractStackArgs),
}

/// Runs CLI commands against a planner and renders their output.
pub struct Cli {
    planner: Planner,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(planner: Planner, renderer: TerminalRenderer) -> Self {
        Self { planner, renderer }
    }

    pub async fn handle_plan_command(&self, command: PlanCommands) -> Result<()> {
        match command {
            PlanCommands::Create(args) => {
                let resources: ResourceMap = serde_json::from_value(read_json(&args.resources_file)?)
                    .context("Resources file is not a map of resources")?;
                let result = self
                    .planner
                    .create_plan_result(&args.into_params(resources))
                    .await?;
                self.renderer.render(&result.to_string())
            }
            PlanCommands::CreateFromTemplate(args) => {
                let template = read_json(&args.template_file)?;
                let result = self
                    .planner
                    .create_plan_from_template_result(&args.into_params(template))
                    .await?;
                self.renderer.render(&result.to_string())
            }
            PlanCommands::List(args) => self.list_plans(&args.into()).await,
            PlanCommands::Show(args) => {
                let plan = self
                    .planner
                    .get_plan(&Id { id: args.id.clone() })
                    .await?
                    .ok_or_else(|| anyhow!("Plan with ID {} not found", args.id))?;
                let view = PlanView::new(&plan, View::from_original(args.original));
                self.renderer.render(&view.to_string())
            }
            PlanCommands::Update(args) => {
                let result = self.planner.update_plan(&args.into()).await?;
                self.renderer.render(&result.to_string())
            }
            PlanCommands::UpdateResources(args) => {
                let commands = read_json(&args.commands_file)?;
                let result = self
                    .planner
                    .update_plan_resources(&UpdatePlanResources {
                        id: args.id,
                        commands,
                    })
                    .await?;
                self.renderer.render(&result.to_string())
            }
            PlanCommands::UpdateTemplate(args) => {
                let template = read_json(&args.template_file)?;
                let result = self
                    .planner
                    .update_plan_from_template(&UpdatePlanTemplate {
                        id: args.id,
                        template,
                    })
                    .await?;
                self.renderer.render(&result.to_string())
            }
            PlanCommands::Rebuild(args) => {
                let result = self.planner.rebuild_plan_dependencies(&args.into()).await?;
                self.renderer.render(&result.to_string())
            }
            PlanCommands::Export(args) => {
                let plan = self
                    .planner
                    .get_plan(&Id { id: args.id.clone() })
                    .await?
                    .ok_or_else(|| anyhow!("Plan with ID {} not found", args.id))?;
                let template = resources_to_template(
                    plan.resources.resources(View::from_original(args.original)),
                );
                println!("{}", serde_json::to_string_pretty(&template)?);
                Ok(())
            }
            PlanCommands::Delete(args) => {
                let id: Id = args.into();
                match self.planner.delete_plan_result(&id).await? {
                    Some(result) => self.renderer.render(&result.to_string()),
                    None => Err(anyhow!("Plan with ID {} not found", id.id)),
                }
            }
            PlanCommands::Expire(args) => {
                let status = self.planner.expire_plans_result(&args.into()).await?;
                self.renderer.render(&status.to_string())
            }
        }
    }

    pub async fn handle_stack_command(&self, command: StackCommands) -> Result<()> {
        match command {
            StackCommands::Extract(args) => {
                let template = self.planner.extract_stack(&args.into()).await?;
                println!("{}", serde_json::to_string_pretty(&template)?);
                Ok(())
            }
        }
    }

    pub async fn list_plans(&self, params: &ListPlans) -> Result<()> {
        let summaries = self.planner.list_plans_summary(params).await?;
        self.renderer.render(&summaries.to_string())
    }
}
