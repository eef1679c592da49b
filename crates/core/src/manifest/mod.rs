//! YAML plan manifests.
//!
//! Two document shapes are accepted:
//!
//! ```yaml
//! project:
//!   name: Website relaunch
//!   start_date: 2024-03-04
//! categories:
//!   - id: design
//!     name: Design
//!     color: "#4c72b0"
//!     items:
//!       - id: wireframes
//!         name: Wireframes
//!         duration_days: 5
//!       - id: signoff
//!         name: Sign-off
//!         type: milestone
//!         depends_on: [wireframes]
//! ```
//!
//! and the WBS shape, where `phases` replaces `categories` and every node is
//! keyed by a `wbs` code that extends its parent's code (`1`, `1.1`, `1.1.1`).
//!
//! Field and type errors carry the YAML path of the offending value, such as
//! `phases[0].items[1].duration_days`.

use crate::config::SchedulerConfig;
use crate::plan::{GroupId, Milestone, NodeId, Plan, WorkPackage};
use crate::{Error, Result};
use chrono::NaiveDate;
use miette::Diagnostic;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

/// Title used when the manifest has no `project.name`.
pub const DEFAULT_PROJECT_NAME: &str = "Project plan";

/// Errors raised while reading a plan manifest.
#[derive(Error, Debug, Diagnostic)]
pub enum ManifestError {
    /// The document is not well-formed YAML.
    #[error("Invalid YAML: {message}")]
    #[diagnostic(code(ganttgen::manifest::yaml))]
    Yaml {
        /// Parser message, including line and column when known.
        message: String,
    },

    /// A field is missing, unexpected, or has the wrong type or value.
    #[error("{path}: {message}")]
    #[diagnostic(code(ganttgen::manifest::field))]
    Field {
        /// YAML path of the offending node or value.
        path: String,
        /// What is wrong with it.
        message: String,
    },

    /// A WBS code does not extend its parent's code.
    #[error("{path}: expected WBS code '{code}' to start with '{parent}.'")]
    #[diagnostic(
        code(ganttgen::manifest::wbs_mismatch),
        help("Child codes extend the parent code with a dot-separated suffix, e.g. 1.2 under 1")
    )]
    WbsMismatch {
        /// YAML path of the `wbs` field.
        path: String,
        /// The parent's code.
        parent: String,
        /// The offending code.
        code: String,
    },
}

impl ManifestError {
    fn field(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Field {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A parsed manifest: the plan plus the scheduler settings it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPlan {
    /// The plan tree.
    pub plan: Plan,
    /// Settings from the `project` block.
    pub config: SchedulerConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    project: Option<RawProject>,
    #[serde(default)]
    categories: Option<Vec<RawItem>>,
    #[serde(default)]
    phases: Option<Vec<RawItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    allow_milestone_dependencies: bool,
    #[serde(default)]
    meta: Option<serde_yaml::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ItemType {
    Group,
    #[serde(alias = "work_package")]
    Workpackage,
    Milestone,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawItem {
    #[serde(default, rename = "type")]
    item_type: Option<ItemType>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    wbs: Option<String>,
    name: String,
    #[serde(default)]
    items: Option<Vec<RawItem>>,
    #[serde(default)]
    duration_days: Option<i64>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    depends_on: Option<Vec<String>>,
    #[serde(default, alias = "date")]
    deadline_date: Option<NaiveDate>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    meta: Option<serde_yaml::Value>,
}

impl RawItem {
    fn has_scheduling_fields(&self) -> bool {
        self.duration_days.is_some()
            || self.start_date.is_some()
            || self.depends_on.is_some()
            || self.deadline_date.is_some()
    }

    /// Resolve the item's kind from `type` or, failing that, its fields.
    fn kind(&self, path: &str) -> std::result::Result<ItemType, ManifestError> {
        let kind = match self.item_type {
            Some(kind) => kind,
            None if self.items.is_some() => ItemType::Group,
            None => match (self.duration_days.is_some(), self.deadline_date.is_some()) {
                (true, true) => {
                    return Err(ManifestError::field(
                        path,
                        "choose either duration_days or deadline_date, not both",
                    ));
                }
                (true, false) => ItemType::Workpackage,
                (false, true) => ItemType::Milestone,
                (false, false) => {
                    return Err(ManifestError::field(
                        path,
                        "leaf items must define duration_days or deadline_date",
                    ));
                }
            },
        };

        match kind {
            ItemType::Group if self.has_scheduling_fields() => Err(ManifestError::field(
                path,
                "groups must not define scheduling fields",
            )),
            ItemType::Workpackage if self.items.is_some() || self.deadline_date.is_some() => {
                Err(ManifestError::field(
                    path,
                    "work packages accept duration_days, start_date, depends_on and category only",
                ))
            }
            ItemType::Milestone
                if self.items.is_some()
                    || self.duration_days.is_some()
                    || self.start_date.is_some() =>
            {
                Err(ManifestError::field(
                    path,
                    "milestones accept deadline_date, depends_on and category only",
                ))
            }
            _ => Ok(kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keying {
    Id,
    Wbs,
}

impl Keying {
    const fn field(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Wbs => "wbs",
        }
    }
}

/// Load a manifest from disk.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and
/// [`Error::Manifest`] when its content is invalid.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_plan(path: &Path) -> Result<LoadedPlan> {
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_plan(&source)
}

/// Parse a manifest from a YAML string.
///
/// # Errors
///
/// Returns [`Error::Manifest`] when the document is malformed, has unknown
/// or mistyped fields, or breaks the item rules.
pub fn parse_plan(source: &str) -> Result<LoadedPlan> {
    let deserializer = serde_yaml::Deserializer::from_str(source);
    let raw: RawManifest = serde_path_to_error::deserialize(deserializer).map_err(path_error)?;

    let loaded = build(raw)?;
    debug!(
        plan = %loaded.plan.name,
        nodes = loaded.plan.len(),
        "Parsed plan manifest"
    );
    Ok(loaded)
}

fn path_error(err: serde_path_to_error::Error<serde_yaml::Error>) -> Error {
    let path = err.path().to_string();
    let inner = err.into_inner();
    let message = match inner.location() {
        Some(loc) => format!("{inner} (line {}, column {})", loc.line(), loc.column()),
        None => inner.to_string(),
    };

    if path == "." || path.is_empty() {
        ManifestError::Yaml { message }.into()
    } else {
        ManifestError::Field { path, message }.into()
    }
}

fn build(raw: RawManifest) -> Result<LoadedPlan> {
    let (keying, list, top) = match (raw.categories, raw.phases) {
        (Some(_), Some(_)) => {
            return Err(ManifestError::field(
                "root",
                "define either 'categories' or 'phases', not both",
            )
            .into());
        }
        (Some(categories), None) => (Keying::Id, categories, "categories"),
        (None, Some(phases)) => (Keying::Wbs, phases, "phases"),
        (None, None) => {
            return Err(
                ManifestError::field("root", "missing required field 'categories'").into(),
            );
        }
    };

    let project = raw.project;
    let name = project
        .as_ref()
        .and_then(|p| p.name.clone())
        .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
    if name.trim().is_empty() {
        return Err(ManifestError::field("project.name", "expected non-empty string").into());
    }

    let mut plan = Plan::new(name);
    plan.start_date = project.as_ref().and_then(|p| p.start_date);
    plan.meta = project.as_ref().and_then(|p| p.meta.clone());
    let config = SchedulerConfig {
        default_start: None,
        allow_milestone_dependencies: project
            .as_ref()
            .is_some_and(|p| p.allow_milestone_dependencies),
    };

    let mut builder = Builder {
        plan: &mut plan,
        keying,
    };
    for (idx, item) in list.into_iter().enumerate() {
        let path = format!("{top}[{idx}]");
        if item.item_type.is_some_and(|t| t != ItemType::Group) || item.has_scheduling_fields() {
            return Err(ManifestError::field(path, "top-level entries are groups of items").into());
        }
        if item.items.is_none() {
            return Err(ManifestError::field(path, "missing required field 'items'").into());
        }
        builder.add(item, None, None, &path)?;
    }

    Ok(LoadedPlan { plan, config })
}

struct Builder<'a> {
    plan: &'a mut Plan,
    keying: Keying,
}

impl Builder<'_> {
    fn key(&self, item: &mut RawItem, parent_code: Option<&str>, path: &str) -> Result<String> {
        let (wanted, other) = match self.keying {
            Keying::Id => (item.id.take(), item.wbs.is_some()),
            Keying::Wbs => (item.wbs.take(), item.id.is_some()),
        };
        let field = self.keying.field();

        if other {
            let stray = match self.keying {
                Keying::Id => "wbs",
                Keying::Wbs => "id",
            };
            return Err(ManifestError::field(
                path,
                format!("unexpected field '{stray}'; items are keyed by '{field}'"),
            )
            .into());
        }

        let key = wanted
            .ok_or_else(|| {
                ManifestError::field(path, format!("missing required field '{field}'"))
            })?;
        if key.trim().is_empty() {
            return Err(
                ManifestError::field(format!("{path}.{field}"), "expected non-empty string").into(),
            );
        }

        if let (Keying::Wbs, Some(parent)) = (self.keying, parent_code) {
            let extends = key
                .strip_prefix(parent)
                .is_some_and(|rest| rest.len() > 1 && rest.starts_with('.'));
            if !extends {
                return Err(ManifestError::WbsMismatch {
                    path: format!("{path}.wbs"),
                    parent: parent.to_string(),
                    code: key,
                }
                .into());
            }
        }

        Ok(key)
    }

    fn add(
        &mut self,
        mut item: RawItem,
        parent: Option<GroupId>,
        parent_code: Option<&str>,
        path: &str,
    ) -> Result<()> {
        let key = self.key(&mut item, parent_code, path)?;
        if item.name.trim().is_empty() {
            return Err(
                ManifestError::field(format!("{path}.name"), "expected non-empty string").into(),
            );
        }
        let kind = item.kind(path)?;

        match kind {
            ItemType::Group => {
                if item.category.is_some() {
                    return Err(ManifestError::field(
                        format!("{path}.category"),
                        "groups take their category from their position",
                    )
                    .into());
                }
                let group = self.plan.add_group(parent, key.clone(), item.name);
                self.record(group, path, item.meta);
                if let Some(color) = item.color {
                    self.plan.set_color(group, color);
                }
                for (idx, child) in item.items.unwrap_or_default().into_iter().enumerate() {
                    let child_path = format!("{path}.items[{idx}]");
                    self.add(child, Some(group), Some(&key), &child_path)?;
                }
            }
            ItemType::Workpackage => {
                reject_color(&item, path)?;
                let days = item.duration_days.ok_or_else(|| {
                    ManifestError::field(path, "missing required field 'duration_days'")
                })?;
                let duration = u32::try_from(days)
                    .ok()
                    .and_then(NonZeroU32::new)
                    .ok_or_else(|| {
                        ManifestError::field(
                            format!("{path}.duration_days"),
                            format!("expected a positive number of days, got {days}"),
                        )
                    })?;

                let mut wp = WorkPackage::new(duration).after(item.depends_on.unwrap_or_default());
                wp.start_date = item.start_date;
                wp.category = item.category;

                let id = self.plan.add_work_package(parent, key, item.name, wp);
                self.record(id, path, item.meta);
            }
            ItemType::Milestone => {
                reject_color(&item, path)?;
                let mut milestone = Milestone::default().after(item.depends_on.unwrap_or_default());
                milestone.date = item.deadline_date;
                milestone.category = item.category;

                let id = self.plan.add_milestone(parent, key, item.name, milestone);
                self.record(id, path, item.meta);
            }
        }

        Ok(())
    }

    fn record(&mut self, id: impl Into<NodeId>, path: &str, meta: Option<serde_yaml::Value>) {
        let id = id.into();
        self.plan.set_location(id, path);
        if let Some(meta) = meta {
            self.plan.set_meta(id, meta);
        }
    }
}

fn reject_color(item: &RawItem, path: &str) -> Result<()> {
    if item.color.is_some() {
        return Err(ManifestError::field(
            format!("{path}.color"),
            "only groups accept a color",
        )
        .into());
    }
    Ok(())
}
