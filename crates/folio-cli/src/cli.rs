// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use folio_core::types::{DocumentId, DocumentKind};

#[derive(Debug, Parser)]
#[command(name = "folio", version)]
#[command(about = "Image and PDF document store")]
pub struct Cli {
    /// Config file. Defaults to `config.json` in the data directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory. Overrides `FOLIO_DATA_DIR` and the config file.
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a new image or PDF.
    Upload(UploadArgs),
    /// List documents, newest first.
    List {
        #[arg(long)]
        kind: Option<DocumentKind>,
        #[arg(long)]
        offset: Option<u64>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one document with its read-time details.
    Show { id: DocumentId },
    /// Delete a document and its stored file.
    Delete { id: DocumentId },
    /// Rotate a stored image clockwise into a new image.
    Rotate {
        id: DocumentId,
        #[arg(long, allow_negative_numbers = true)]
        angle: f64,
    },
    /// Render one page of a stored PDF into a new image.
    Rasterize {
        id: DocumentId,
        #[arg(long)]
        page: u32,
        #[arg(long)]
        dpi: Option<u32>,
    },
    /// Re-hash a stored file against its recorded digest.
    Verify { id: DocumentId },
    /// Remove stored files no document refers to.
    Prune,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[arg(long)]
    pub kind: DocumentKind,
    #[arg(long)]
    pub title: String,
    #[command(flatten)]
    pub source: UploadSource,
}

/// Where the upload payload comes from: raw bytes or base64 text.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct UploadSource {
    /// File with the raw document bytes.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// File holding the document as base64 text (a data URL prefix is allowed).
    #[arg(long)]
    pub base64: Option<PathBuf>,
}
