//! Collection wrapper types for displaying groups of plans.

use std::{fmt, ops::Index};

use crate::models::PlanSummary;

/// Newtype wrapper for displaying a list of plan summaries.
///
/// # Examples
///
/// ```rust
/// use conveyor_core::{
///     display::PlanSummaries,
///     models::{Plan, PlanSummary, PlanType, ResourceMap},
/// };
///
/// let plan = Plan::new(PlanType::Migrate, "project", "user", ResourceMap::new());
/// let summaries = PlanSummaries(vec![PlanSummary::from(&plan)]);
/// assert!(summaries.to_string().contains(&plan.plan_id));
/// assert!(PlanSummaries(vec![]).to_string().contains("No plans found"));
/// ```
pub struct PlanSummaries(pub Vec<PlanSummary>);

impl PlanSummaries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanSummary> {
        self.0.iter()
    }
}

impl Index<usize> for PlanSummaries {
    type Output = PlanSummary;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IntoIterator for PlanSummaries {
    type Item = PlanSummary;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PlanSummaries {
    type Item = &'a PlanSummary;
    type IntoIter = std::slice::Iter<'a, PlanSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for PlanSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No plans found.");
        }
        for summary in &self.0 {
            write!(f, "{summary}")?;
        }
        Ok(())
    }
}
