//! Validation report for naming-convention and geometry problems.

use std::fmt;

use drape_pipeline::GeometryError;
use serde::Serialize;

/// One problem found while loading or validating a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// A boundary mesh has no tech-pack counterpart.
    MissingTechpack {
        /// Boundary mesh name.
        boundary: String,
    },
    /// A boundary's geometry could not be analyzed.
    InvalidGeometry {
        /// Boundary mesh name.
        boundary: String,
        /// What went wrong.
        reason: String,
    },
    /// A required boundary is absent from the model.
    MissingBoundary {
        /// Expected boundary name.
        name: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTechpack { boundary } => {
                write!(f, "could not find flat version of {boundary}")
            }
            Self::InvalidGeometry { boundary, reason } => write!(f, "{boundary}: {reason}"),
            Self::MissingBoundary { name } => write!(f, "could not find boundary {name}"),
        }
    }
}

/// Issues collected during a model load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Record a geometry failure for `boundary`.
    pub fn record_geometry(&mut self, boundary: &str, error: &GeometryError) {
        let issue = match error {
            GeometryError::MissingTechpack { .. } => ValidationIssue::MissingTechpack {
                boundary: boundary.to_string(),
            },
            other => ValidationIssue::InvalidGeometry {
                boundary: boundary.to_string(),
                reason: other.to_string(),
            },
        };
        self.issues.push(issue);
    }

    /// Append an issue.
    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// All issues in discovery order.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Human-readable lines.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    /// Number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Whether the model loaded cleanly.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Forget every issue.
    pub fn clear(&mut self) {
        self.issues.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_techpack_message() {
        let mut report = ValidationReport::default();
        report.record_geometry(
            "Tee_boundary_back",
            &GeometryError::MissingTechpack {
                boundary: "Tee_boundary_back".to_string(),
            },
        );
        report.record_geometry(
            "Tee_boundary_cuff",
            &GeometryError::DegenerateHull { distinct_points: 2 },
        );
        assert_eq!(report.len(), 2);
        assert_eq!(
            report.messages()[0],
            "could not find flat version of Tee_boundary_back"
        );
        assert!(matches!(
            report.issues()[1],
            ValidationIssue::InvalidGeometry { .. }
        ));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let mut report = ValidationReport::default();
        report.push(ValidationIssue::MissingBoundary {
            name: "Tee_boundary_hood".to_string(),
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["issues"][0]["kind"], "missing_boundary");
        assert_eq!(json["issues"][0]["name"], "Tee_boundary_hood");
    }
}
