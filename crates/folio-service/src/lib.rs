// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-service: moves documents from raw bytes to committed records.
//
// `IngestionPipeline` runs one upload with all-or-nothing semantics,
// `Transformers` derive new documents from stored ones, and `DocumentService`
// is the thread-safe facade a front end talks to.

pub mod pipeline;
pub mod service;
pub mod transform;
pub mod views;

pub use pipeline::{IngestionPipeline, decode_payload};
pub use service::{Deletion, DocumentService, PRUNE_GRACE, PruneReport, Verification};
pub use transform::Transformers;
pub use views::{
    DetailExtra, DocumentDetail, DocumentView, ListPage, RasterizeRequest, RotateRequest,
    UploadRequest,
};
