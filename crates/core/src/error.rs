//! Error types for plan validation and scheduling.

use crate::manifest::ManifestError;
use crate::plan::NodeType;
use chrono::NaiveDate;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ganttgen-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading, validating, scheduling or flattening a plan.
///
/// Every variant aborts the run at the point of detection.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Two nodes share an identifier.
    #[error("Duplicate identifier '{id}' (first at {first}, again at {second})")]
    #[diagnostic(
        code(ganttgen::plan::duplicate_identifier),
        help("Identifiers must be unique across the whole plan, not just among siblings")
    )]
    DuplicateIdentifier {
        /// The repeated identifier.
        id: String,
        /// Location of the first declaration.
        first: String,
        /// Location of the second declaration.
        second: String,
    },

    /// A `depends_on` entry names a missing or ineligible node.
    #[error("'{from}' depends on {}", describe_target(target, *found))]
    #[diagnostic(code(ganttgen::plan::unknown_dependency))]
    UnknownDependency {
        /// The node declaring the dependency.
        from: String,
        /// The referenced identifier.
        target: String,
        /// Kind of the node found under that identifier, when it exists but
        /// cannot be depended on.
        found: Option<NodeType>,
        /// Suggestion shown to the user.
        #[help]
        help: Option<String>,
    },

    /// The dependency graph has a cycle.
    #[error("Dependency cycle detected: {}", cycle.join(" -> "))]
    #[diagnostic(
        code(ganttgen::plan::cyclic_dependency),
        help("Each entry depends on the next one; remove one of these dependencies")
    )]
    CyclicDependency {
        /// Ordered trace, first and last entries equal.
        cycle: Vec<String>,
    },

    /// An explicit date precedes a dependency's end.
    #[error(
        "'{id}' starts {actual_start} but dependency '{dependency}' ends {required_start}"
    )]
    #[diagnostic(
        code(ganttgen::schedule::precedence_violation),
        help("Move the start date to {required_start} or later, or drop it to have it inferred")
    )]
    PrecedenceViolation {
        /// The node with the explicit date.
        id: String,
        /// The dependency with the latest end.
        dependency: String,
        /// Earliest admissible start.
        required_start: NaiveDate,
        /// The declared start.
        actual_start: NaiveDate,
    },

    /// No anchor date is available for an item without dependencies.
    #[error("Cannot schedule '{id}': it has no start date, no dependencies, and the plan has no start date")]
    #[diagnostic(
        code(ganttgen::schedule::missing_start_date),
        help("Set project.start_date, give the item a start_date, or pass --start-date")
    )]
    MissingStartDate {
        /// The unanchored node.
        id: String,
    },

    /// Date arithmetic left the representable range.
    #[error("Dates for '{id}' fall outside the supported calendar range")]
    #[diagnostic(code(ganttgen::schedule::date_out_of_range))]
    DateOutOfRange {
        /// The node whose end date overflowed.
        id: String,
    },

    /// The flattener met a leaf with no computed dates.
    #[error("Internal error: '{id}' was not scheduled")]
    #[diagnostic(code(ganttgen::internal::inconsistent_schedule))]
    InconsistentSchedule {
        /// The unscheduled node.
        id: String,
    },

    /// An invariant of the pipeline itself did not hold.
    #[error("Internal error: {message}")]
    #[diagnostic(code(ganttgen::internal))]
    Internal {
        /// Description of the broken invariant.
        message: String,
    },

    /// The plan manifest could not be parsed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Manifest(#[from] ManifestError),

    /// The plan file could not be read.
    #[error("Failed to read plan file {}: {source}", path.display())]
    #[diagnostic(
        code(ganttgen::io),
        help("Check that the file exists and is readable")
    )]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn describe_target(target: &str, found: Option<NodeType>) -> String {
    match found {
        None => format!("unknown id '{target}'"),
        Some(kind) => format!("'{target}', a {kind}, which cannot be a dependency target"),
    }
}

impl Error {
    /// Create an unknown-dependency error for a missing identifier.
    pub fn unknown_dependency(from: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnknownDependency {
            from: from.into(),
            target: target.into(),
            found: None,
            help: Some("Check the identifier for typos".to_string()),
        }
    }

    /// Create an unknown-dependency error for an existing node of the wrong kind.
    pub fn ineligible_dependency(
        from: impl Into<String>,
        target: impl Into<String>,
        found: NodeType,
    ) -> Self {
        let help = match found {
            NodeType::Milestone => {
                "Milestone targets are disabled; enable allow_milestone_dependencies to permit them"
            }
            NodeType::Group | NodeType::WorkPackage => "Depend on a work package instead",
        };
        Self::UnknownDependency {
            from: from.into(),
            target: target.into(),
            found: Some(found),
            help: Some(help.to_string()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an I/O error for a plan file.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error is caused by the plan's content.
    ///
    /// User errors are the validation, scheduling and manifest errors; the
    /// rest are I/O failures or broken internal invariants.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentifier { .. }
                | Self::UnknownDependency { .. }
                | Self::CyclicDependency { .. }
                | Self::PrecedenceViolation { .. }
                | Self::MissingStartDate { .. }
                | Self::DateOutOfRange { .. }
                | Self::Manifest(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_dependency_messages() {
        let missing = Error::unknown_dependency("b", "ghost");
        assert_eq!(missing.to_string(), "'b' depends on unknown id 'ghost'");

        let group = Error::ineligible_dependency("b", "phase-1", NodeType::Group);
        assert_eq!(
            group.to_string(),
            "'b' depends on 'phase-1', a group, which cannot be a dependency target"
        );
    }

    #[test]
    fn test_cycle_message_shows_trace() {
        let err = Error::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Dependency cycle detected: a -> b -> a");
    }

    #[test]
    fn test_user_error_classification() {
        assert!(Error::unknown_dependency("a", "b").is_user_error());
        let internal = Error::InconsistentSchedule { id: "a".into() };
        assert!(!internal.is_user_error());
        assert!(
            !Error::io(
                "plan.yaml",
                std::io::Error::new(std::io::ErrorKind::NotFound, "missing")
            )
            .is_user_error()
        );
    }
}
