// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::element::Element;
use super::ids::{CheckpointId, ViewId};

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

/// An axis-aligned rectangle in diagram coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True when `inner` lies entirely within `self` (edges may touch).
    pub fn contains(&self, inner: &Bounds) -> bool {
        inner.x >= self.x
            && inner.y >= self.y
            && inner.right() <= self.right()
            && inner.bottom() <= self.bottom()
    }
}

/// The renderer viewport the selection was drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionBounds {
    #[serde(flatten)]
    pub rect: Bounds,
    #[serde(default, rename = "viewBox", skip_serializing_if = "Option::is_none")]
    pub view_box: Option<ViewBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub bounds: SelectionBounds,
    #[serde(default, rename = "pngBase64", skip_serializing_if = "Option::is_none")]
    pub png_base64: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: u64,
}

/// Cosmetic view fields; never consulted by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<String>,
}

/// A partial update of [`ViewMeta`]; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewMetaPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub skin: Option<String>,
}

impl ViewMeta {
    /// Applies `patch` and reports whether anything changed.
    pub fn apply(&mut self, patch: ViewMetaPatch) -> bool {
        let mut changed = false;
        for (slot, value) in [
            (&mut self.title, patch.title),
            (&mut self.description, patch.description),
            (&mut self.skin, patch.skin),
        ] {
            if let Some(value) = value {
                if slot.as_deref() != Some(value.as_str()) {
                    *slot = Some(value);
                    changed = true;
                }
            }
        }
        changed
    }
}

/// Accumulator for an in-progress chunked upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingChunk {
    pub elements: Vec<Element>,
    pub total_bytes: u64,
}

/// Export artifacts the renderer reports back; opaque to synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderCache {
    pub svg: Option<String>,
    pub png_bytes: Option<Vec<u8>>,
}

/// The mutable unit of diagram state.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    view_id: ViewId,
    url: String,
    meta: ViewMeta,
    last_checkpoint_id: Option<CheckpointId>,
    elements: Vec<Element>,
    created_at: u64,
    updated_at: u64,
    last_image_access_at: Option<u64>,
    selection: Option<Selection>,
    allow_replace_all: bool,
    pending_chunk: Option<PendingChunk>,
    render_cache: RenderCache,
}

impl View {
    pub fn new(view_id: ViewId, base_url: &str, meta: ViewMeta, now: u64) -> Self {
        let url = view_url(base_url, &view_id);
        Self {
            view_id,
            url,
            meta,
            last_checkpoint_id: None,
            elements: Vec::new(),
            created_at: now,
            updated_at: now,
            last_image_access_at: None,
            selection: None,
            allow_replace_all: false,
            pending_chunk: None,
            render_cache: RenderCache::default(),
        }
    }

    pub fn view_id(&self) -> &ViewId {
        &self.view_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn meta(&self) -> &ViewMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut ViewMeta {
        &mut self.meta
    }

    pub fn last_checkpoint_id(&self) -> Option<&CheckpointId> {
        self.last_checkpoint_id.as_ref()
    }

    /// The resolved element list of the current checkpoint.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Installs a committed checkpoint as the current state.
    pub fn install_checkpoint(&mut self, checkpoint_id: CheckpointId, elements: Vec<Element>, now: u64) {
        self.last_checkpoint_id = Some(checkpoint_id);
        self.elements = elements;
        self.updated_at = now;
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn updated_at(&self) -> u64 {
        self.updated_at
    }

    pub fn touch(&mut self, now: u64) {
        self.updated_at = now;
    }

    pub fn last_image_access_at(&self) -> Option<u64> {
        self.last_image_access_at
    }

    pub fn mark_image_access(&mut self, now: u64) {
        self.last_image_access_at = Some(now);
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    pub fn allow_replace_all(&self) -> bool {
        self.allow_replace_all
    }

    pub fn set_allow_replace_all(&mut self, allow: bool) {
        self.allow_replace_all = allow;
    }

    pub fn pending_chunk(&self) -> Option<&PendingChunk> {
        self.pending_chunk.as_ref()
    }

    pub fn pending_chunk_mut(&mut self) -> &mut Option<PendingChunk> {
        &mut self.pending_chunk
    }

    pub fn render_cache(&self) -> &RenderCache {
        &self.render_cache
    }

    pub fn render_cache_mut(&mut self) -> &mut RenderCache {
        &mut self.render_cache
    }

    /// Rebuilds a view from persisted metadata. Runtime-only state starts empty.
    pub fn restore(
        view_id: ViewId,
        base_url: &str,
        meta: ViewMeta,
        checkpoint: Option<(CheckpointId, Vec<Element>)>,
        created_at: u64,
        updated_at: u64,
    ) -> Self {
        let mut view = Self::new(view_id, base_url, meta, created_at);
        if let Some((checkpoint_id, elements)) = checkpoint {
            view.last_checkpoint_id = Some(checkpoint_id);
            view.elements = elements;
        }
        view.updated_at = updated_at;
        view
    }
}

pub fn view_url(base_url: &str, view_id: &ViewId) -> String {
    format!("{}/views/{}", base_url.trim_end_matches('/'), view_id)
}
