//! src/services/file_store.rs
//!
//! FileStore: the directory-backed metadata store. Each record is one JSON
//! document at `base_path/{set}/{base64url(entity_id)}.json`, written to a
//! temporary file first and renamed into place. Entity ids too long for a
//! file name are stored as `sha256.{hex digest}.json` instead.

use crate::{
    models::record::MetadataRecord,
    services::store::{
        MetadataStore, StoreError, StoreResult, ensure_entity_id_present, ensure_set_name_safe,
    },
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, warn};
use uuid::Uuid;

const RECORD_EXTENSION: &str = "json";

/// Longest encoded entity id used verbatim as a file stem. Leaves room for
/// the extension below the usual 255-byte file name limit.
const MAX_ENCODED_STEM: usize = 200;

/// Stem prefix of hashed file names. `.` is outside the base64url alphabet,
/// so hashed and encoded stems never collide.
const HASHED_STEM_PREFIX: &str = "sha256.";

#[derive(Clone, Debug)]
pub struct FileStore {
    /// Root directory holding one subdirectory per metadata set.
    pub base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn set_root(&self, set: &str) -> PathBuf {
        self.base_path.join(set)
    }

    /// Entity ids are URLs; the file name is their unpadded base64url form,
    /// or a digest when that form is too long.
    fn record_path(&self, entity_id: &str, set: &str) -> PathBuf {
        self.set_root(set)
            .join(format!("{}.{RECORD_EXTENSION}", file_stem(entity_id)))
    }

    /// Read one stored document. A missing file is `None`.
    async fn read_record(
        &self,
        path: &Path,
        entity_id: &str,
    ) -> StoreResult<Option<MetadataRecord>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Io(err)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Unreadable {
                entity_id: entity_id.to_string(),
                source,
            })
    }
}

#[async_trait]
impl MetadataStore for FileStore {
    async fn get(&self, entity_id: &str, set: &str) -> StoreResult<Option<MetadataRecord>> {
        ensure_set_name_safe(set)?;
        if entity_id.is_empty() {
            return Ok(None);
        }
        self.read_record(&self.record_path(entity_id, set), entity_id)
            .await
    }

    async fn list(&self, set: &str) -> StoreResult<Vec<MetadataRecord>> {
        ensure_set_name_safe(set)?;
        let mut entries = match fs::read_dir(self.set_root(set)).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::Io(err)),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                debug!("skipping foreign file {}", path.display());
                continue;
            };
            let decoded = decode_entity_id(stem);
            if decoded.is_none() && !stem.starts_with(HASHED_STEM_PREFIX) {
                debug!("skipping foreign file {}", path.display());
                continue;
            }

            let mut record = match self.read_record(&path, stem).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(StoreError::Unreadable { source, .. }) => {
                    warn!("ignoring unreadable metadata file {}: {}", path.display(), source);
                    continue;
                }
                Err(err) => return Err(err),
            };
            if record.entityid.is_none() {
                match decoded {
                    Some(entity_id) => record.entityid = Some(entity_id),
                    None => {
                        warn!("ignoring metadata file {} without an entity id", path.display());
                        continue;
                    }
                }
            }
            records.push(record);
        }

        records.sort_by(|a, b| a.entityid.cmp(&b.entityid));
        Ok(records)
    }

    async fn save(&self, entity_id: &str, set: &str, record: &MetadataRecord) -> StoreResult<()> {
        ensure_set_name_safe(set)?;
        ensure_entity_id_present(entity_id)?;

        let root = self.set_root(set);
        fs::create_dir_all(&root).await?;
        let content = serde_json::to_vec_pretty(record)?;

        let tmp_path = root.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;
        if let Err(err) = file.write_all(&content).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }

        let file_path = self.record_path(entity_id, set);
        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }
        debug!("wrote metadata file {}", file_path.display());
        Ok(())
    }

    async fn delete(&self, entity_id: &str, set: &str) -> StoreResult<()> {
        ensure_set_name_safe(set)?;
        ensure_entity_id_present(entity_id)?;

        let file_path = self.record_path(entity_id, set);
        match fs::remove_file(&file_path).await {
            Ok(_) => {
                debug!("removed metadata file {}", file_path.display());
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("attempted to delete missing metadata `{}` in `{}`", entity_id, set);
                Ok(())
            }
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    /// Write, read back and remove a probe file under `base_path`.
    async fn ping(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.base_path).await?;
        let probe = self.base_path.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&probe, b"readyz").await?;
        let read_back = fs::read(&probe).await;
        let _ = fs::remove_file(&probe).await;
        if read_back? != b"readyz" {
            return Err(StoreError::Io(std::io::Error::other("probe file content mismatch")));
        }
        Ok(())
    }
}

fn file_stem(entity_id: &str) -> String {
    let encoded = URL_SAFE_NO_PAD.encode(entity_id);
    if encoded.len() <= MAX_ENCODED_STEM {
        return encoded;
    }
    let digest = Sha256::digest(entity_id.as_bytes());
    format!("{HASHED_STEM_PREFIX}{digest:x}")
}

fn decode_entity_id(stem: &str) -> Option<String> {
    URL_SAFE_NO_PAD
        .decode(stem)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}
