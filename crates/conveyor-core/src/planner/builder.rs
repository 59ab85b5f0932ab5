//! Builder for creating and configuring Planner instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tokio::task;

use super::{locks::PlanLocks, Planner};
use crate::{
    db::Database,
    error::{join_error, ConveyorError, Result},
    extract::{NestedTemplateExtractor, TemplateSource},
    provider::ResourceExtractor,
    update::ValidatorRegistry,
};

/// Time an available plan may stay untouched before `expire_plans` expires
/// it, unless configured otherwise.
pub const DEFAULT_PLAN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Builder for creating and configuring Planner instances.
#[derive(Clone)]
pub struct PlannerBuilder {
    database_path: Option<PathBuf>,
    registry: Option<ValidatorRegistry>,
    extractor: Option<Arc<dyn ResourceExtractor>>,
    template_source: Option<Arc<dyn TemplateSource>>,
    max_nesting_depth: usize,
    plan_ttl: Duration,
}

impl PlannerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            database_path: None,
            registry: None,
            extractor: None,
            template_source: None,
            max_nesting_depth: NestedTemplateExtractor::DEFAULT_MAX_DEPTH,
            plan_ttl: DEFAULT_PLAN_TTL,
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/conveyor/conveyor.db` or
    /// `~/.local/share/conveyor/conveyor.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Replaces the built-in per-type update rules.
    pub fn with_validator_registry(mut self, registry: ValidatorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the provider boundary used when updates adopt external objects.
    pub fn with_resource_extractor(mut self, extractor: impl ResourceExtractor + 'static) -> Self {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    /// Sets the template executor boundary used by `extract_stack`.
    pub fn with_template_source(mut self, source: impl TemplateSource + 'static) -> Self {
        self.template_source = Some(Arc::new(source));
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_plan_ttl(mut self, ttl: Duration) -> Self {
        self.plan_ttl = ttl;
        self
    }

    /// Builds the configured planner instance.
    ///
    /// # Errors
    ///
    /// Returns `ConveyorError::FileSystem` if the database path is invalid
    /// Returns `ConveyorError::Database` if database initialization fails
    pub async fn build(self) -> Result<Planner> {
        let db_path = if let Some(path) = self.database_path {
            path
        } else {
            Self::default_database_path()?
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConveyorError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let db_path_clone = db_path.clone();
        task::spawn_blocking(move || {
            let _db = Database::new(&db_path_clone)?;
            Ok::<(), ConveyorError>(())
        })
        .await
        .map_err(join_error)??;

        log::debug!("Using plan database at {}", db_path.display());

        Ok(Planner {
            db_path,
            registry: Arc::new(self.registry.unwrap_or_default()),
            extractor: self.extractor,
            template_source: self.template_source,
            max_nesting_depth: self.max_nesting_depth,
            plan_ttl: self.plan_ttl,
            locks: PlanLocks::default(),
        })
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("conveyor")
            .place_data_file("conveyor.db")
            .map_err(|e| ConveyorError::XdgDirectory(e.to_string()))
    }
}

impl Default for PlannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
