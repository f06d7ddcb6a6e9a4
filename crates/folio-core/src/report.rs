// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Structured error reports for the request boundary.
//
// Every `IngestionError` maps to a stable machine-readable code, a plain
// English message, and an HTTP-style status so that any front end (CLI, HTTP)
// renders failures the same way.

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, SetupError};

/// Broad class of a failure from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The request itself was wrong; resending it unchanged will fail again.
    Rejected,
    /// The referenced document does not exist.
    Missing,
    /// Local I/O or database trouble; the request may succeed later.
    Transient,
}

/// Error payload returned across the request boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Stable snake_case identifier, e.g. `page_out_of_range`.
    pub code: &'static str,
    /// Human-readable description including the underlying detail.
    pub message: String,
    /// HTTP-style status (400, 404, 422, 500).
    pub status: u16,
    pub severity: Severity,
}

/// Convert an `IngestionError` into the report shown to callers.
pub fn report_for(err: &IngestionError) -> ErrorReport {
    let (code, status, severity) = match err {
        IngestionError::InvalidEncoding(_) => ("invalid_encoding", 400, Severity::Rejected),
        IngestionError::InvalidRequest(_) => ("invalid_request", 400, Severity::Rejected),
        IngestionError::StorageWriteFailed(_) => ("storage_write_failed", 500, Severity::Transient),
        IngestionError::StorageReadFailed(inner) => {
            if inner.is_not_found() {
                ("blob_missing", 500, Severity::Missing)
            } else {
                ("storage_read_failed", 500, Severity::Transient)
            }
        }
        IngestionError::MetadataExtractionFailed(_) => {
            ("metadata_extraction_failed", 422, Severity::Rejected)
        }
        IngestionError::IndexCommitFailed(_) => ("index_commit_failed", 500, Severity::Transient),
        IngestionError::Index(_) => ("index_error", 500, Severity::Transient),
        IngestionError::SourceNotFound(_) => ("source_not_found", 404, Severity::Missing),
        IngestionError::NotFound(_) => ("not_found", 404, Severity::Missing),
        IngestionError::PageOutOfRange { .. } => ("page_out_of_range", 400, Severity::Rejected),
        IngestionError::RenderFailed(_) => ("render_failed", 422, Severity::Rejected),
        IngestionError::TransformFailed(_) => ("transform_failed", 500, Severity::Transient),
    };

    ErrorReport {
        code,
        message: err.to_string(),
        status,
        severity,
    }
}

/// Report for a service that could not start. Always a local fault.
pub fn report_for_setup(err: &SetupError) -> ErrorReport {
    let code = match err {
        SetupError::ConfigRead { .. } | SetupError::ConfigParse { .. } => "config_invalid",
        SetupError::ConfigWrite { .. } => "config_write_failed",
        SetupError::Store(_) => "store_unavailable",
        SetupError::Index(_) => "index_unavailable",
    };
    ErrorReport {
        code,
        message: err.to_string(),
        status: 500,
        severity: Severity::Transient,
    }
}

impl From<&IngestionError> for ErrorReport {
    fn from(err: &IngestionError) -> Self {
        report_for(err)
    }
}
