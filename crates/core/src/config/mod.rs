//! Configuration types for scheduling
//!
//! Values come from the manifest's `project` block and are then overridden
//! by command-line flags.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    /// Anchor for items with neither an explicit date nor dependencies.
    ///
    /// Takes precedence over the plan's own start date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_start: Option<NaiveDate>,

    /// Whether `depends_on` may name milestones as well as work packages.
    #[serde(default)]
    pub allow_milestone_dependencies: bool,
}

impl SchedulerConfig {
    /// Set the default start date.
    #[must_use]
    pub const fn with_default_start(mut self, date: NaiveDate) -> Self {
        self.default_start = Some(date);
        self
    }

    /// Allow or forbid milestones as dependency targets.
    #[must_use]
    pub const fn with_milestone_dependencies(mut self, allow: bool) -> Self {
        self.allow_milestone_dependencies = allow;
        self
    }

    /// Layer `overrides` on top of this configuration.
    ///
    /// A start date in `overrides` replaces ours; milestone targets stay
    /// enabled if either side enables them.
    #[must_use]
    pub fn merged_with(&self, overrides: &Self) -> Self {
        Self {
            default_start: overrides.default_start.or(self.default_start),
            allow_milestone_dependencies: self.allow_milestone_dependencies
                || overrides.allow_milestone_dependencies,
        }
    }
}
