// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command dispatch: one service call per subcommand, rendered as JSON.

use std::path::Path;

use folio_core::error::{IngestionError, SetupError};
use folio_core::report::{ErrorReport, Severity, report_for, report_for_setup};
use folio_service::{
    Deletion, DocumentService, RasterizeRequest, RotateRequest, UploadRequest, Verification,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cli::{Command, UploadArgs};

/// Anything that stops a command from producing its normal output.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Service(#[from] IngestionError),

    #[error("cannot read {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn report(&self) -> ErrorReport {
        match self {
            Self::Setup(err) => report_for_setup(err),
            Self::Service(err) => report_for(err),
            Self::Input { .. } => ErrorReport {
                code: "input_unreadable",
                message: self.to_string(),
                status: 400,
                severity: Severity::Rejected,
            },
            Self::Output(_) => ErrorReport {
                code: "output_failed",
                message: self.to_string(),
                status: 500,
                severity: Severity::Transient,
            },
        }
    }
}

/// Result of a command that ran to completion.
#[derive(Debug)]
pub struct Outcome {
    pub body: Value,
    /// False when the command ran but found a problem (e.g. a tampered blob).
    pub clean: bool,
}

impl Outcome {
    fn ok(body: impl Serialize) -> Result<Self, CliError> {
        Ok(Self {
            body: serde_json::to_value(body)?,
            clean: true,
        })
    }
}

pub fn run(service: &DocumentService, cmd: Command) -> Result<Outcome, CliError> {
    debug!(?cmd, "running command");
    match cmd {
        Command::Upload(args) => upload(service, args),
        Command::List {
            kind,
            offset,
            limit,
        } => Outcome::ok(service.list(kind, offset, limit)?),
        Command::Show { id } => Outcome::ok(service.detail(id)?),
        Command::Delete { id } => match service.delete(id)? {
            removed @ Deletion::Removed(_) => Outcome::ok(removed),
            Deletion::AlreadyAbsent => Err(IngestionError::NotFound(id).into()),
        },
        Command::Rotate { id, angle } => Outcome::ok(service.rotate(RotateRequest {
            image_id: id,
            angle,
        })?),
        Command::Rasterize { id, page, dpi } => {
            Outcome::ok(service.rasterize(RasterizeRequest {
                pdf_id: id,
                page_number: page,
                dpi,
            })?)
        }
        Command::Verify { id } => {
            let verification = service.verify(id)?;
            let clean = verification == Verification::Intact;
            Ok(Outcome {
                body: serde_json::to_value(verification)?,
                clean,
            })
        }
        Command::Prune => Outcome::ok(service.prune_orphans()?),
    }
}

fn upload(service: &DocumentService, args: UploadArgs) -> Result<Outcome, CliError> {
    let UploadArgs {
        kind,
        title,
        source,
    } = args;

    let view = match (source.file, source.base64) {
        (Some(path), _) => service.upload_bytes(kind, &read_input(&path)?, &title)?,
        (None, Some(path)) => {
            let file = String::from_utf8_lossy(&read_input(&path)?).into_owned();
            service.upload(UploadRequest { kind, title, file })?
        }
        (None, None) => {
            return Err(IngestionError::InvalidRequest(
                "upload needs --file or --base64".into(),
            )
            .into());
        }
    };
    Outcome::ok(view)
}

fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Input {
        path: path.display().to_string(),
        source,
    })
}
