#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a distribution job.
///
/// Transitions are forward-only: `Pending -> Processing -> Complete | Failed`.
/// When the `sea-orm` feature is enabled, this enum can be used directly in
/// SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "PascalCase")]
pub enum JobStatus {
    /// Inserted but not yet claimed by a worker.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Pending"))]
    Pending,
    /// Claimed by a worker and currently executing.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Processing"))]
    Processing,
    /// All chunk I/O finished successfully.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Complete"))]
    Complete,
    /// Aborted with a diagnostic in `error_message`.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Failed"))]
    Failed,
}

impl JobStatus {
    /// Returns true if no further transitions are permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// All possible status values.
    pub const ALL: &'static [JobStatus] = &[
        Self::Pending,
        Self::Processing,
        Self::Complete,
        Self::Failed,
    ];

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// The distribution operation a job performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "PascalCase")]
pub enum JobAction {
    /// Split, encrypt and write chunks to the destination.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Upload"))]
    Upload,
    /// Read, decrypt and reassemble chunks from the destination.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Download"))]
    Download,
    /// Remove all chunk artifacts for the target.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Delete"))]
    Delete,
}

impl JobAction {
    /// All possible action values.
    pub const ALL: &'static [JobAction] = &[Self::Upload, Self::Download, Self::Delete];

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "Upload",
            Self::Download => "Download",
            Self::Delete => "Delete",
        }
    }

    /// Upload and Download move file bytes; Delete only touches artifacts.
    pub fn moves_data(&self) -> bool {
        !matches!(self, Self::Delete)
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid status or action string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseJobEnumError {
    kind: &'static str,
    invalid: String,
    valid: &'static str,
}

impl fmt::Display for ParseJobEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid {} '{}'. Valid values: {}",
            self.kind, self.invalid, self.valid
        )
    }
}

impl std::error::Error for ParseJobEnumError {}

impl FromStr for JobStatus {
    type Err = ParseJobEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Complete" => Ok(Self::Complete),
            "Failed" => Ok(Self::Failed),
            _ => Err(ParseJobEnumError {
                kind: "status",
                invalid: s.to_string(),
                valid: "Pending, Processing, Complete, Failed",
            }),
        }
    }
}

impl FromStr for JobAction {
    type Err = ParseJobEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Upload" => Ok(Self::Upload),
            "Download" => Ok(Self::Download),
            "Delete" => Ok(Self::Delete),
            _ => Err(ParseJobEnumError {
                kind: "action",
                invalid: s.to_string(),
                valid: "Upload, Download, Delete",
            }),
        }
    }
}
