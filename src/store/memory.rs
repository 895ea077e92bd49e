// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{Checkpoint, CheckpointStore, StoreError};
use crate::model::CheckpointId;

/// Process-local checkpoint store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    checkpoints: Mutex<HashMap<CheckpointId, Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.checkpoints.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn save(&self, id: &CheckpointId, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        let mut checkpoints = self.checkpoints.lock().unwrap_or_else(PoisonError::into_inner);
        if checkpoints.contains_key(id) {
            return Err(StoreError::CheckpointExists { checkpoint_id: id.clone() });
        }
        checkpoints.insert(id.clone(), checkpoint.clone());
        Ok(())
    }

    fn load(&self, id: &CheckpointId) -> Result<Option<Checkpoint>, StoreError> {
        let checkpoints = self.checkpoints.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(checkpoints.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;

    fn checkpoint(ids: &[&str]) -> Checkpoint {
        Checkpoint::new(
            ids.iter()
                .map(|id| {
                    Element::from_value(serde_json::json!({ "id": id, "type": "rectangle" }))
                        .expect("element")
                })
                .collect(),
        )
    }

    #[test]
    fn save_then_load_returns_the_snapshot() {
        let store = MemoryCheckpointStore::new();
        let id = CheckpointId::new("cp1").expect("checkpoint id");
        store.save(&id, &checkpoint(&["a", "b"])).expect("save");

        assert_eq!(store.load(&id).expect("load"), Some(checkpoint(&["a", "b"])));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_ids_load_as_none() {
        let store = MemoryCheckpointStore::new();
        let id = CheckpointId::new("missing").expect("checkpoint id");
        assert_eq!(store.load(&id).expect("load"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn checkpoints_are_write_once() {
        let store = MemoryCheckpointStore::new();
        let id = CheckpointId::new("cp1").expect("checkpoint id");
        store.save(&id, &checkpoint(&["a"])).expect("save");

        let err = store.save(&id, &checkpoint(&["b"])).unwrap_err();
        assert!(matches!(err, StoreError::CheckpointExists { .. }));
        assert_eq!(store.load(&id).expect("load"), Some(checkpoint(&["a"])));
    }
}
