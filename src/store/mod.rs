// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Checkpoint persistence.
//!
//! Checkpoints are write-once snapshots of a resolved element list, keyed by a caller-minted id.
//! There is no update or delete; superseded checkpoints accumulate until collected externally.

pub mod canvas_folder;
pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{CheckpointId, Element};

pub use canvas_folder::{CanvasFolder, StoreError, StoreMeta, StoredView, WriteDurability};
pub use memory::MemoryCheckpointStore;

/// An immutable snapshot of a resolved element list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub elements: Vec<Element>,
}

impl Checkpoint {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }
}

/// Key-value persistence for checkpoints.
///
/// `save` must fail with [`StoreError::CheckpointExists`] when `id` was already written; `load`
/// returns `Ok(None)` for unknown ids.
pub trait CheckpointStore: Send + Sync + fmt::Debug {
    fn save(&self, id: &CheckpointId, checkpoint: &Checkpoint) -> Result<(), StoreError>;

    fn load(&self, id: &CheckpointId) -> Result<Option<Checkpoint>, StoreError>;
}
