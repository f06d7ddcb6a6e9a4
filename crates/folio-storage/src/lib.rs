// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-storage: where Folio documents live.
//
// Raw bytes go to a `ContentStore` (local filesystem by default), records go
// to the SQLite-backed `DocumentIndex`, and `integrity` fingerprints blobs so
// that tampering can be detected later.

pub mod content;
pub mod index;
pub mod integrity;

pub use content::{ContentStore, LocalContentStore};
pub use index::DocumentIndex;
pub use integrity::{hash_bytes, verify_hash};
