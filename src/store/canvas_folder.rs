// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Folder-backed persistence: one JSON file per checkpoint plus a small view metadata file.

use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Checkpoint, CheckpointStore};
use crate::model::{CheckpointId, Element, IdError, ViewId, ViewMeta};

const STORE_META_FILENAME: &str = "livecanvas.meta.json";
const CHECKPOINTS_DIR: &str = "checkpoints";
const STORE_META_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("json error at {path:?}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("checkpoint {checkpoint_id} already exists")]
    CheckpointExists { checkpoint_id: CheckpointId },
    #[error("invalid id for {field}: {value:?}: {source}")]
    InvalidId { field: &'static str, value: String, source: IdError },
    #[error("unsupported store meta version {version} at {path:?}")]
    UnsupportedVersion { path: PathBuf, version: u32 },
    #[error("refusing to write through symlink at {path:?}")]
    SymlinkRefused { path: PathBuf },
}

/// The minimal per-view record that survives a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredView {
    pub view_id: ViewId,
    pub meta: ViewMeta,
    pub last_checkpoint_id: Option<CheckpointId>,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreMeta {
    pub views: Vec<StoredView>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to stable storage where
    /// possible. Exact guarantees are platform/filesystem-dependent.
    Durable,
}

#[derive(Debug, Clone)]
pub struct CanvasFolder {
    root: PathBuf,
    durability: WriteDurability,
    meta_lock: Arc<Mutex<()>>,
}

impl CanvasFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
            meta_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_path(&self) -> PathBuf {
        self.root.join(STORE_META_FILENAME)
    }

    pub fn checkpoint_path(&self, checkpoint_id: &CheckpointId) -> PathBuf {
        let file_stem = checkpoint_file_stem(checkpoint_id.as_str());
        self.root.join(CHECKPOINTS_DIR).join(format!("{file_stem}.json"))
    }

    /// Loads the view metadata file; a missing file is an empty store.
    pub fn load_meta(&self) -> Result<StoreMeta, StoreError> {
        let path = self.meta_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(StoreMeta::default()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let meta_json: StoreMetaJson = serde_json::from_slice(&bytes)
            .map_err(|source| StoreError::Json { path: path.clone(), source })?;
        if meta_json.version != STORE_META_VERSION {
            return Err(StoreError::UnsupportedVersion { path, version: meta_json.version });
        }
        store_meta_from_json(meta_json)
    }

    pub fn save_meta(&self, meta: &StoreMeta) -> Result<(), StoreError> {
        let path = self.meta_path();
        let mut bytes = serde_json::to_vec_pretty(&store_meta_to_json(meta))
            .map_err(|source| StoreError::Json { path: path.clone(), source })?;
        bytes.push(b'\n');
        write_atomic(&self.root, &path, &bytes, self.durability)
    }

    /// Inserts or replaces the record for `view.view_id`.
    pub fn upsert_view(&self, view: StoredView) -> Result<(), StoreError> {
        let _guard = self.meta_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut meta = self.load_meta()?;
        match meta.views.iter_mut().find(|stored| stored.view_id == view.view_id) {
            Some(slot) => *slot = view,
            None => meta.views.push(view),
        }
        self.save_meta(&meta)
    }

    pub fn remove_view(&self, view_id: &ViewId) -> Result<(), StoreError> {
        let _guard = self.meta_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut meta = self.load_meta()?;
        let before = meta.views.len();
        meta.views.retain(|stored| &stored.view_id != view_id);
        if meta.views.len() == before {
            return Ok(());
        }
        self.save_meta(&meta)
    }
}

impl CheckpointStore for CanvasFolder {
    fn save(&self, id: &CheckpointId, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        let path = self.checkpoint_path(id);
        match fs::symlink_metadata(&path) {
            Ok(_) => return Err(StoreError::CheckpointExists { checkpoint_id: id.clone() }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(StoreError::Io { path, source }),
        }

        let json = CheckpointJsonRef { id: id.as_str(), elements: &checkpoint.elements };
        let bytes = serde_json::to_vec(&json)
            .map_err(|source| StoreError::Json { path: path.clone(), source })?;
        write_atomic(&self.root, &path, &bytes, self.durability)
    }

    fn load(&self, id: &CheckpointId) -> Result<Option<Checkpoint>, StoreError> {
        let path = self.checkpoint_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let json: CheckpointJson =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Json { path, source })?;
        Ok(Some(Checkpoint::new(json.elements)))
    }
}

// Extracted JSON mapping and filesystem helpers.
include!("canvas_folder/helpers.rs");
