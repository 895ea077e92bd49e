// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Error taxonomy for synchronization calls.
//!
//! Every failure maps to one [`ErrorKind`] and carries the state a caller needs to retry with
//! corrected input (see [`SyncError::remediation`]). No failure is process-fatal.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::model::{Bounds, CheckpointId, ScriptItemError, SelectionBounds, ViewId};
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    NotFound,
    ParseError,
    PolicyViolation,
    PreconditionFailed,
    ResourceExceeded,
    StorageError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::ParseError => "ParseError",
            Self::PolicyViolation => "PolicyViolation",
            Self::PreconditionFailed => "PreconditionFailed",
            Self::ResourceExceeded => "ResourceExceeded",
            Self::StorageError => "StorageError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("view not found: {view_id}")]
    ViewNotFound { view_id: String },

    #[error("no chunked upload in progress for view {view_id}; send a chunk with start=true first")]
    NoPendingChunk { view_id: ViewId },

    #[error("cannot parse edit script: {message}")]
    Parse { message: String },

    #[error("view {view_id} has no fetched image; fetch the current image before editing")]
    ImageNotFetched { view_id: ViewId, last_checkpoint_id: Option<CheckpointId> },

    #[error("view {view_id} has no checkpoint to apply a delta against; send a full update first")]
    NoBaseline { view_id: ViewId },

    #[error("a selection is active; resend with selection_ack=true and edit_bounds inside it")]
    SelectionNotAcknowledged { selection: SelectionBounds },

    #[error("a selection is active; edit_bounds is required")]
    EditBoundsRequired { selection: SelectionBounds },

    #[error("edit_bounds is not inside the active selection")]
    EditBoundsOutsideSelection { edit_bounds: Bounds, selection: SelectionBounds },

    #[error("replace_all is locked for view {view_id}; unlock it with allow_replace_all first")]
    ReplaceAllLocked { view_id: ViewId, last_checkpoint_id: Option<CheckpointId> },

    #[error("edit script has no restoreCheckpoint item; start from the current checkpoint or set replace_all")]
    MissingRestoreCheckpoint { last_checkpoint_id: Option<CheckpointId> },

    #[error(
        "chunked upload exceeded limits ({elements} elements, {bytes} bytes; max {max_elements} elements, {max_bytes} bytes); restart with start=true"
    )]
    ChunkLimitExceeded { elements: usize, bytes: u64, max_elements: usize, max_bytes: u64 },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl SyncError {
    pub fn view_not_found(view_id: impl fmt::Display) -> Self {
        Self::ViewNotFound { view_id: view_id.to_string() }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse { message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ViewNotFound { .. } | Self::NoPendingChunk { .. } => ErrorKind::NotFound,
            Self::Parse { .. } => ErrorKind::ParseError,
            Self::ImageNotFetched { .. } | Self::NoBaseline { .. } => ErrorKind::PreconditionFailed,
            Self::SelectionNotAcknowledged { .. }
            | Self::EditBoundsRequired { .. }
            | Self::EditBoundsOutsideSelection { .. }
            | Self::ReplaceAllLocked { .. }
            | Self::MissingRestoreCheckpoint { .. } => ErrorKind::PolicyViolation,
            Self::ChunkLimitExceeded { .. } => ErrorKind::ResourceExceeded,
            Self::Storage(_) => ErrorKind::StorageError,
        }
    }

    /// State the caller needs to self-correct, as a JSON object.
    pub fn remediation(&self) -> Value {
        match self {
            Self::ViewNotFound { view_id } => json!({ "view_id": view_id }),
            Self::NoPendingChunk { view_id } => json!({
                "view_id": view_id,
                "pending": Value::Null,
                "hint": "send start=true to begin a chunked upload",
            }),
            Self::Parse { .. } => json!({}),
            Self::ImageNotFetched { view_id, last_checkpoint_id } => json!({
                "view_id": view_id,
                "last_checkpoint_id": last_checkpoint_id,
            }),
            Self::NoBaseline { view_id } => json!({
                "view_id": view_id,
                "last_checkpoint_id": Value::Null,
            }),
            Self::SelectionNotAcknowledged { selection } | Self::EditBoundsRequired { selection } => {
                json!({ "selection": selection })
            }
            Self::EditBoundsOutsideSelection { edit_bounds, selection } => json!({
                "selection": selection,
                "edit_bounds": edit_bounds,
            }),
            Self::ReplaceAllLocked { view_id, last_checkpoint_id } => json!({
                "view_id": view_id,
                "allow_replace_all": false,
                "last_checkpoint_id": last_checkpoint_id,
            }),
            Self::MissingRestoreCheckpoint { last_checkpoint_id } => json!({
                "last_checkpoint_id": last_checkpoint_id,
            }),
            Self::ChunkLimitExceeded { elements, bytes, max_elements, max_bytes } => json!({
                "pending": { "elements": elements, "bytes": bytes },
                "limits": { "max_elements": max_elements, "max_bytes": max_bytes },
                "pending_discarded": true,
            }),
            Self::Storage(_) => json!({}),
        }
    }
}

impl From<ScriptItemError> for SyncError {
    fn from(err: ScriptItemError) -> Self {
        Self::parse(err.to_string())
    }
}
