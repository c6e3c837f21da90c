//! Build identity and build detail types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{BuildId, BuildStatus};

/// A named, repeatable build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuilderId {
    /// LUCI project (e.g., "chromium").
    pub project: String,

    /// Bucket within the project (e.g., "ci", "try").
    pub bucket: String,

    /// Builder name (e.g., "linux-rel").
    pub builder: String,
}

impl BuilderId {
    /// Create a new BuilderId.
    pub fn new(
        project: impl Into<String>,
        bucket: impl Into<String>,
        builder: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            bucket: bucket.into(),
            builder: builder.into(),
        }
    }
}

impl fmt::Display for BuilderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.project, self.bucket, self.builder)
    }
}

/// Canonical identity of one build. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildRef {
    /// Service-assigned id.
    pub id: BuildId,

    /// Builder that produced the build.
    pub builder: BuilderId,

    /// Build number within the builder.
    pub number: u32,
}

impl BuildRef {
    /// Create a new BuildRef.
    pub fn new(id: BuildId, builder: BuilderId, number: u32) -> Self {
        Self {
            id,
            builder,
            number,
        }
    }
}

/// A build as returned by a search, with its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub build: BuildRef,
    pub status: BuildStatus,
}

/// Projection of the Build Service's build record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildDetail {
    /// The build this detail describes.
    pub build: BuildRef,

    /// Current status.
    pub status: BuildStatus,

    /// Human-readable summary (markdown), if the build set one.
    pub summary_markdown: Option<String>,

    /// Output properties written by the build.
    pub output_properties: serde_json::Map<String, serde_json::Value>,
}
