// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! Views hold the current resolved element list plus the gate state (image freshness, selection,
//! replace-all unlock, pending chunk upload) consulted before every mutation.

pub mod element;
pub mod ids;
pub mod view;

pub use element::{split_delete_ids, Element, ScriptItem, ScriptItemError};
pub use ids::{CheckpointId, Id, IdError, ViewId};
pub use view::{
    now_millis, view_url, Bounds, PendingChunk, RenderCache, Selection, SelectionBounds, View,
    ViewBox, ViewMeta, ViewMetaPatch,
};
