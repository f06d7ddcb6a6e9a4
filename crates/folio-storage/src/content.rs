// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content store: raw document bytes addressed by generated relative keys.
//
// Layout under the store root:
//
//   images/<uuid simple hex>.<png|jpg|gif|...|bin>
//   pdfs/<uuid simple hex>.pdf
//
// Blobs are written to a hidden temporary sibling first and renamed into
// place, so a committed name never refers to a truncated file.

use std::fs;
use std::io::{self, ErrorKind, Read};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use folio_core::error::StoreError;
use folio_core::types::{DocumentKind, StorageLocation};
use folio_document::image::processor::sniff_extension;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Extension for image blobs whose format cannot be sniffed.
const UNKNOWN_EXTENSION: &str = "bin";

/// Addressable persistence of raw bytes, organised by document kind.
///
/// Implementations must be safe to share between threads; every `put` must
/// return a location no other `put` has returned.
pub trait ContentStore: Send + Sync {
    /// Persist `bytes` under a freshly generated location in `kind`'s
    /// namespace.
    fn put(&self, kind: DocumentKind, bytes: &[u8]) -> Result<StorageLocation, StoreError>;

    /// Read the whole blob at `location`.
    fn get(&self, location: &StorageLocation) -> Result<Vec<u8>, StoreError>;

    /// Remove the blob at `location`. Removing an absent blob succeeds.
    fn delete(&self, location: &StorageLocation) -> Result<(), StoreError>;

    /// Whether a blob exists at `location`.
    fn exists(&self, location: &StorageLocation) -> Result<bool, StoreError>;

    /// Size in bytes of the blob at `location`.
    fn size(&self, location: &StorageLocation) -> Result<u64, StoreError>;

    /// Last modification time of the blob at `location`.
    fn modified(&self, location: &StorageLocation) -> Result<SystemTime, StoreError>;

    /// Every committed blob location currently in the store.
    fn locations(&self) -> Result<Vec<StorageLocation>, StoreError>;
}

/// `ContentStore` backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalContentStore {
    root: PathBuf,
}

impl LocalContentStore {
    /// Use `root` as the store directory, creating it if needed.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StoreError::Write {
            location: root.display().to_string(),
            source,
        })?;
        debug!("content store opened");
        Ok(Self { root })
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a relative key onto the filesystem, refusing anything that could
    /// escape the store root.
    pub fn resolve(&self, location: &StorageLocation) -> Result<PathBuf, StoreError> {
        let key = location.as_str();
        let relative = Path::new(key);
        let well_formed = !key.is_empty()
            && !relative.is_absolute()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !well_formed {
            return Err(StoreError::InvalidLocation(key.to_owned()));
        }
        Ok(self.root.join(relative))
    }

    fn file_name(kind: DocumentKind, bytes: &[u8]) -> String {
        let extension = match kind {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Image => sniff_extension(bytes).unwrap_or(UNKNOWN_EXTENSION),
        };
        format!("{}.{}", Uuid::new_v4().simple(), extension)
    }
}

impl ContentStore for LocalContentStore {
    #[instrument(skip_all, fields(%kind, bytes_len = bytes.len()))]
    fn put(&self, kind: DocumentKind, bytes: &[u8]) -> Result<StorageLocation, StoreError> {
        let namespace = self.root.join(kind.namespace());
        let name = Self::file_name(kind, bytes);
        let location = StorageLocation::new(format!("{}/{}", kind.namespace(), name));

        let write_err = |source: std::io::Error| StoreError::Write {
            location: location.to_string(),
            source,
        };

        fs::create_dir_all(&namespace).map_err(write_err)?;

        let staging = namespace.join(format!(".{name}.tmp"));
        let target = namespace.join(&name);
        write_staged(&staging, bytes).map_err(write_err)?;
        if let Err(source) = fs::rename(&staging, &target) {
            discard_staging(&staging);
            return Err(write_err(source));
        }

        info!(%location, "blob written");
        Ok(location)
    }

    #[instrument(skip_all, fields(%location))]
    fn get(&self, location: &StorageLocation) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(location)?;
        let bytes = fs::read(&path).map_err(|source| StoreError::Read {
            location: location.to_string(),
            source,
        })?;
        debug!(bytes_len = bytes.len(), "blob read");
        Ok(bytes)
    }

    #[instrument(skip_all, fields(%location))]
    fn delete(&self, location: &StorageLocation) -> Result<(), StoreError> {
        let path = self.resolve(location)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("blob deleted");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("blob already absent");
                Ok(())
            }
            Err(source) => Err(StoreError::Delete {
                location: location.to_string(),
                source,
            }),
        }
    }

    fn exists(&self, location: &StorageLocation) -> Result<bool, StoreError> {
        let path = self.resolve(location)?;
        path.try_exists().map_err(|source| StoreError::Read {
            location: location.to_string(),
            source,
        })
    }

    fn size(&self, location: &StorageLocation) -> Result<u64, StoreError> {
        let path = self.resolve(location)?;
        fs::metadata(&path)
            .map(|meta| meta.len())
            .map_err(|source| StoreError::Read {
                location: location.to_string(),
                source,
            })
    }

    fn modified(&self, location: &StorageLocation) -> Result<SystemTime, StoreError> {
        let path = self.resolve(location)?;
        fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .map_err(|source| StoreError::Read {
                location: location.to_string(),
                source,
            })
    }

    #[instrument(skip(self))]
    fn locations(&self) -> Result<Vec<StorageLocation>, StoreError> {
        let mut found = Vec::new();

        for kind in [DocumentKind::Image, DocumentKind::Pdf] {
            let namespace = self.root.join(kind.namespace());
            let entries = match fs::read_dir(&namespace) {
                Ok(entries) => entries,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(StoreError::Read {
                        location: kind.namespace().to_owned(),
                        source,
                    });
                }
            };

            for entry in entries {
                let entry = entry.map_err(|source| StoreError::Read {
                    location: kind.namespace().to_owned(),
                    source,
                })?;
                let name = entry.file_name();
                let Some(name) = name.to_str() else {
                    warn!(name = ?entry.file_name(), "skipping non UTF-8 blob name");
                    continue;
                };
                // Staging files belong to writes still in flight.
                if name.starts_with('.') || !entry.path().is_file() {
                    continue;
                }
                found.push(StorageLocation::new(format!("{}/{}", kind.namespace(), name)));
            }
        }

        debug!(count = found.len(), "blob locations listed");
        Ok(found)
    }
}

/// Copy `source` into the staging file. A failed or partial write removes
/// the file, since `locations` never reports staging names.
fn write_staged(staging: &Path, mut source: impl Read) -> io::Result<()> {
    let result = fs::File::create(staging).and_then(|mut file| {
        io::copy(&mut source, &mut file)?;
        Ok(())
    });
    if result.is_err() {
        discard_staging(staging);
    }
    result
}

fn discard_staging(staging: &Path) {
    match fs::remove_file(staging) {
        Ok(()) => debug!(path = %staging.display(), "staging file removed"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(error = %err, "failed to remove staging file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Enough of a PNG for format sniffing.
    fn png() -> Vec<u8> {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        bytes
    }

    fn store() -> (tempfile::TempDir, LocalContentStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalContentStore::open(dir.path().join("media")).expect("open store");
        (dir, store)
    }

    #[test]
    fn put_then_get_returns_same_bytes() {
        let (_dir, store) = store();
        let bytes = png();
        let location = store.put(DocumentKind::Image, &bytes).expect("put");

        assert!(location.as_str().starts_with("images/"));
        assert!(location.as_str().ends_with(".png"));
        assert_eq!(store.get(&location).expect("get"), bytes);
        assert_eq!(store.size(&location).expect("size"), bytes.len() as u64);
        assert!(store.modified(&location).expect("modified") <= SystemTime::now());
    }

    #[test]
    fn pdfs_and_unknown_images_get_fixed_extensions() {
        let (_dir, store) = store();
        let pdf = store.put(DocumentKind::Pdf, b"%PDF-1.5").expect("put pdf");
        let junk = store.put(DocumentKind::Image, b"0123456789").expect("put junk");

        assert!(pdf.as_str().starts_with("pdfs/") && pdf.as_str().ends_with(".pdf"));
        assert!(junk.as_str().ends_with(".bin"));
    }

    #[test]
    fn locations_are_unique() {
        let (_dir, store) = store();
        let locations: HashSet<_> = (0..50)
            .map(|_| store.put(DocumentKind::Pdf, b"x").expect("put"))
            .collect();
        assert_eq!(locations.len(), 50);
    }

    #[test]
    fn delete_is_idempotent() {
        let (_dir, store) = store();
        let location = store.put(DocumentKind::Pdf, b"x").expect("put");

        store.delete(&location).expect("first delete");
        store.delete(&location).expect("second delete");
        assert!(!store.exists(&location).expect("exists"));

        let err = store.get(&location).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn escaping_locations_are_rejected() {
        let (_dir, store) = store();
        for key in ["../outside.png", "/etc/passwd", "images/../../x", "", "./images/a"] {
            let err = store.get(&StorageLocation::new(key)).unwrap_err();
            assert!(matches!(err, StoreError::InvalidLocation(_)), "{key}");
        }
    }

    #[test]
    fn locations_skip_staging_files() {
        let (_dir, store) = store();
        let kept = store.put(DocumentKind::Image, &png()).expect("put");
        fs::write(store.root().join("images/.pending.tmp"), b"partial").expect("write");

        let listed = store.locations().expect("locations");
        assert_eq!(listed, vec![kept]);
    }

    #[test]
    fn no_staging_files_left_after_put() {
        let (_dir, store) = store();
        store.put(DocumentKind::Pdf, b"x").expect("put");

        let leftovers = fs::read_dir(store.root().join("pdfs"))
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    /// Yields a few bytes, then fails like a full disk.
    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::other("no space left on device"));
            }
            self.sent = true;
            let chunk = b"partial";
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn failed_staging_write_leaves_no_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let staging = dir.path().join(".blob.pdf.tmp");

        let err = write_staged(&staging, FailingReader { sent: false }).expect_err("must fail");
        assert_eq!(err.to_string(), "no space left on device");
        assert!(!staging.exists());
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn staging_write_copies_all_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let staging = dir.path().join(".blob.png.tmp");

        write_staged(&staging, &b"complete"[..]).expect("write");
        assert_eq!(fs::read(&staging).expect("read"), b"complete");
    }
}
