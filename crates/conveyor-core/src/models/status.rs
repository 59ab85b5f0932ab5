//! Status and type enumerations for plans.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type-safe enumeration of plan lifecycle statuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Plan was requested and resources are being extracted
    #[default]
    Initiating,

    /// Plan resources are being recorded
    Creating,

    /// Plan is complete and ready to be replayed
    Available,

    /// Plan is being replayed as a clone
    Cloning,

    /// Plan is being replayed as a migration
    Migrating,

    /// Replay finished
    Finished,

    /// Extraction or replay failed
    Error,

    /// Plan is being torn down
    Deleting,

    /// Plan stayed available past its time to live
    Expired,
}

impl FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "initiating" => Ok(PlanStatus::Initiating),
            "creating" => Ok(PlanStatus::Creating),
            "available" => Ok(PlanStatus::Available),
            "cloning" => Ok(PlanStatus::Cloning),
            "migrating" => Ok(PlanStatus::Migrating),
            "finished" => Ok(PlanStatus::Finished),
            "error" => Ok(PlanStatus::Error),
            "deleting" => Ok(PlanStatus::Deleting),
            "expired" => Ok(PlanStatus::Expired),
            _ => Err(format!("Invalid plan status: {s}")),
        }
    }
}

impl PlanStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [PlanStatus; 9] = [
        PlanStatus::Initiating,
        PlanStatus::Creating,
        PlanStatus::Available,
        PlanStatus::Cloning,
        PlanStatus::Migrating,
        PlanStatus::Finished,
        PlanStatus::Error,
        PlanStatus::Deleting,
        PlanStatus::Expired,
    ];

    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Initiating => "initiating",
            PlanStatus::Creating => "creating",
            PlanStatus::Available => "available",
            PlanStatus::Cloning => "cloning",
            PlanStatus::Migrating => "migrating",
            PlanStatus::Finished => "finished",
            PlanStatus::Error => "error",
            PlanStatus::Deleting => "deleting",
            PlanStatus::Expired => "expired",
        }
    }

    /// Whether no further lifecycle progress is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlanStatus::Finished | PlanStatus::Error | PlanStatus::Deleting | PlanStatus::Expired
        )
    }

    /// Whether resource updates are accepted in this status.
    pub fn is_updatable(&self) -> bool {
        matches!(
            self,
            PlanStatus::Initiating
                | PlanStatus::Creating
                | PlanStatus::Available
                | PlanStatus::Finished
        )
    }

    /// Whether the plan may be deleted in this status.
    pub fn is_deletable(&self) -> bool {
        self.is_updatable() || matches!(self, PlanStatus::Error | PlanStatus::Expired)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Re-asserting the current status is always allowed.
    pub fn can_transition_to(&self, next: PlanStatus) -> bool {
        use PlanStatus::*;

        if *self == next {
            return true;
        }
        match next {
            Deleting => !self.is_terminal(),
            Error => *self != Deleting,
            _ => matches!(
                (*self, next),
                (Initiating, Creating)
                    | (Creating, Available)
                    | (Available, Cloning | Migrating | Finished | Expired)
                    | (Cloning | Migrating, Finished)
            ),
        }
    }
}

/// Kind of replay a plan is built for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    /// Copy the resources, leaving the source in place
    #[default]
    Clone,

    /// Move the resources
    Migrate,
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clone" => Ok(PlanType::Clone),
            "migrate" => Ok(PlanType::Migrate),
            _ => Err(format!("Invalid plan type: {s}")),
        }
    }
}

impl PlanType {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Clone => "clone",
            PlanType::Migrate => "migrate",
        }
    }
}
