// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Live view registry.
//!
//! The hub owns every open view, runs the edit gates, commits resolved element lists as new
//! checkpoints and fans the result out to subscribed renderers.
//!
//! Each view sits behind its own async mutex held for the whole gate-resolve-commit pipeline, so
//! concurrent edits to one view serialize and the later commit wins. The registry lock is only
//! held long enough to look a view up.

pub mod subscribers;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::chunk::{ChunkAssembler, ChunkTotals};
use crate::config::{ChunkLimits, HubConfig};
use crate::error::SyncError;
use crate::model::{
    now_millis, Bounds, CheckpointId, Element, Selection, SelectionBounds, View, ViewId, ViewMeta,
    ViewMetaPatch,
};
use crate::resolve::{resolve_script, Resolution, Script};
use crate::selection::{self, SelectionState};
use crate::store::{CanvasFolder, Checkpoint, CheckpointStore, MemoryCheckpointStore, StoredView};

pub use subscribers::{PushEvent, PushReceiver, SubscriberId, SubscriberSet};

#[derive(Debug)]
struct ViewSlot {
    view: View,
    subscribers: SubscriberSet,
    closed: bool,
}

/// Caller-declared intent accompanying a mutating call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditIntent {
    pub replace_all: bool,
    pub selection_ack: bool,
    pub edit_bounds: Option<Bounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateOutcome {
    pub view_id: ViewId,
    pub checkpoint_id: CheckpointId,
    pub element_count: usize,
    pub ratio_hint: String,
    /// Subscribers the new state was enqueued for.
    pub delivered: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaRequest {
    pub delete_ids: Vec<String>,
    pub upsert_elements: Vec<Element>,
    pub selection_ack: bool,
    pub edit_bounds: Option<Bounds>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkRequest {
    pub start: bool,
    pub is_final: bool,
    pub elements: Vec<Element>,
    /// Size hint for this chunk; the serialized length is used when absent.
    pub byte_len: Option<u64>,
    pub intent: EditIntent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    Pending(ChunkTotals),
    Committed(UpdateOutcome),
    /// A final chunk closed an upload that carried no elements.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSummary {
    pub view_id: ViewId,
    pub url: String,
    #[serde(flatten)]
    pub meta: ViewMeta,
    pub last_checkpoint_id: Option<CheckpointId>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl ViewSummary {
    fn of(view: &View) -> Self {
        Self {
            view_id: view.view_id().clone(),
            url: view.url().to_owned(),
            meta: view.meta().clone(),
            last_checkpoint_id: view.last_checkpoint_id().cloned(),
            created_at: view.created_at(),
            updated_at: view.updated_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    #[serde(flatten)]
    pub summary: ViewSummary,
    pub elements: Vec<Element>,
    pub allow_replace_all: bool,
    pub selection: Option<Selection>,
    pub last_image_access_at: Option<u64>,
    pub pending_chunk: Option<ChunkTotals>,
    pub subscribers: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderArtifacts {
    pub view_id: ViewId,
    pub last_checkpoint_id: Option<CheckpointId>,
    pub svg: Option<String>,
    pub png_bytes: Option<Vec<u8>>,
}

impl RenderArtifacts {
    pub fn is_empty(&self) -> bool {
        self.svg.is_none() && self.png_bytes.is_none()
    }
}

/// One kind of cached render artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
        }
    }
}

#[derive(Debug)]
pub struct Subscription {
    pub subscriber_id: SubscriberId,
    pub receiver: PushReceiver,
}

#[derive(Debug)]
pub struct LiveViewHub {
    config: HubConfig,
    chunks: ChunkAssembler,
    checkpoints: Arc<dyn CheckpointStore>,
    folder: Option<CanvasFolder>,
    views: Mutex<BTreeMap<ViewId, Arc<Mutex<ViewSlot>>>>,
}

impl LiveViewHub {
    pub fn new(config: HubConfig, checkpoints: Arc<dyn CheckpointStore>) -> Self {
        Self {
            chunks: ChunkAssembler::new(config.chunk_limits),
            config,
            checkpoints,
            folder: None,
            views: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn in_memory(config: HubConfig) -> Self {
        Self::new(config, Arc::new(MemoryCheckpointStore::new()))
    }

    /// Opens a hub backed by `folder`, reloading the views recorded in its metadata file.
    ///
    /// Reloaded views keep their metadata and current checkpoint but start without selection,
    /// subscribers, render cache or image access.
    pub fn open(config: HubConfig, folder: CanvasFolder) -> Result<Self, SyncError> {
        let stored = folder.load_meta()?;
        let mut hub = Self::new(config, Arc::new(folder.clone()));
        hub.folder = Some(folder);

        let mut views = BTreeMap::new();
        for StoredView { view_id, meta, last_checkpoint_id, created_at, updated_at } in stored.views
        {
            let checkpoint = match last_checkpoint_id {
                Some(checkpoint_id) => match hub.checkpoints.load(&checkpoint_id)? {
                    Some(checkpoint) => Some((checkpoint_id, checkpoint.elements)),
                    None => {
                        tracing::warn!(
                            view_id = %view_id,
                            checkpoint_id = %checkpoint_id,
                            "recorded checkpoint is missing; view reopened empty"
                        );
                        None
                    }
                },
                None => None,
            };
            let view = View::restore(
                view_id.clone(),
                &hub.config.base_url,
                meta,
                checkpoint,
                created_at,
                updated_at,
            );
            views.insert(view_id, Arc::new(Mutex::new(ViewSlot::new(view))));
        }

        tracing::info!(root = %hub.folder_root(), views = views.len(), "opened canvas folder");
        hub.views = Mutex::new(views);
        Ok(hub)
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn chunk_limits(&self) -> ChunkLimits {
        self.chunks.limits()
    }

    pub fn parse_view_id(raw: &str) -> Result<ViewId, SyncError> {
        ViewId::new(raw).map_err(|_| SyncError::view_not_found(raw))
    }

    pub async fn create_view(&self, meta: ViewMeta) -> Result<ViewSummary, SyncError> {
        let now = now_millis();
        let mut views = self.views.lock().await;
        let mut view_id = ViewId::mint();
        while views.contains_key(&view_id) {
            view_id = ViewId::mint();
        }

        let view = View::new(view_id.clone(), &self.config.base_url, meta, now);
        if let Some(folder) = &self.folder {
            folder.upsert_view(stored_view(&view))?;
        }
        let summary = ViewSummary::of(&view);
        views.insert(view_id.clone(), Arc::new(Mutex::new(ViewSlot::new(view))));
        drop(views);

        tracing::info!(view_id = %view_id, "view created");
        Ok(summary)
    }

    /// Most recently updated first.
    pub async fn list_views(&self) -> Vec<ViewSummary> {
        let slots = self.views.lock().await.values().cloned().collect::<Vec<_>>();
        let mut summaries = Vec::with_capacity(slots.len());
        for slot in slots {
            let slot = slot.lock().await;
            if !slot.closed {
                summaries.push(ViewSummary::of(&slot.view));
            }
        }
        summaries.sort_by(|a, b| {
            b.updated_at.cmp(&a.updated_at).then_with(|| a.view_id.cmp(&b.view_id))
        });
        summaries
    }

    pub async fn get_view(&self, view_id: &ViewId) -> Result<ViewSnapshot, SyncError> {
        let slot = self.lock_view(view_id).await?;
        let view = &slot.view;
        Ok(ViewSnapshot {
            summary: ViewSummary::of(view),
            elements: view.elements().to_vec(),
            allow_replace_all: view.allow_replace_all(),
            selection: view.selection().cloned(),
            last_image_access_at: view.last_image_access_at(),
            pending_chunk: view.pending_chunk().map(ChunkTotals::from),
            subscribers: slot.subscribers.len(),
        })
    }

    /// Applies a full edit script.
    pub async fn update(
        &self,
        view_id: &ViewId,
        script: Value,
        intent: EditIntent,
    ) -> Result<UpdateOutcome, SyncError> {
        let mut slot = self.lock_view(view_id).await?;
        self.commit(&mut slot, ScriptInput::Raw(script), &intent)
    }

    /// Applies a delta against the current checkpoint.
    pub async fn apply_delta(
        &self,
        view_id: &ViewId,
        delta: DeltaRequest,
    ) -> Result<UpdateOutcome, SyncError> {
        let DeltaRequest { delete_ids, upsert_elements, selection_ack, edit_bounds } = delta;
        let intent = EditIntent { replace_all: false, selection_ack, edit_bounds };

        let mut slot = self.lock_view(view_id).await?;
        check_fresh(&slot.view)?;
        let state = SelectionState::of(&slot.view);
        selection::check_edit(state, intent.selection_ack, intent.edit_bounds.as_ref())?;
        let Some(baseline) = slot.view.last_checkpoint_id().cloned() else {
            tracing::debug!(view_id = %view_id, "delta rejected: no baseline checkpoint");
            return Err(SyncError::NoBaseline { view_id: view_id.clone() });
        };

        let mut script = Vec::with_capacity(upsert_elements.len() + 2);
        script.push(Element::restore_checkpoint(baseline.as_str()));
        // Union in first-seen order: an id named twice still deletes a single match.
        let mut removed: Vec<&str> = Vec::new();
        let named = delete_ids.iter().map(String::as_str);
        for id in named.chain(upsert_elements.iter().filter_map(Element::id)) {
            if !removed.contains(&id) {
                removed.push(id);
            }
        }
        script.push(Element::delete(removed));
        script.extend(upsert_elements);

        self.commit(&mut slot, ScriptInput::Elements(script), &intent)
    }

    /// Feeds one chunk of a chunked upload; the final chunk commits the whole upload.
    pub async fn chunk(
        &self,
        view_id: &ViewId,
        request: ChunkRequest,
    ) -> Result<ChunkOutcome, SyncError> {
        let ChunkRequest { start, is_final, elements, byte_len, intent } = request;
        let mut slot = self.lock_view(view_id).await?;

        let totals =
            self.chunks.append(slot.view.pending_chunk_mut(), view_id, start, elements, byte_len)?;
        if !is_final {
            return Ok(ChunkOutcome::Pending(totals));
        }

        let elements = ChunkAssembler::take(slot.view.pending_chunk_mut());
        if elements.is_empty() {
            return Ok(ChunkOutcome::Empty);
        }
        tracing::debug!(
            view_id = %view_id,
            elements = totals.elements,
            bytes = totals.bytes,
            "committing chunked upload"
        );
        self.commit(&mut slot, ScriptInput::Elements(elements), &intent).map(ChunkOutcome::Committed)
    }

    /// Updates cosmetic metadata and pushes it to subscribers.
    pub async fn update_meta(
        &self,
        view_id: &ViewId,
        patch: ViewMetaPatch,
    ) -> Result<ViewSummary, SyncError> {
        let mut slot = self.lock_view(view_id).await?;
        if slot.view.meta_mut().apply(patch) {
            slot.view.touch(now_millis());
            self.persist_best_effort(&slot.view);
        }
        let event = PushEvent::meta(slot.view.meta());
        slot.subscribers.push(event);
        Ok(ViewSummary::of(&slot.view))
    }

    /// Disconnects subscribers with a `closed` event and discards the view.
    pub async fn close_view(&self, view_id: &ViewId) -> Result<(), SyncError> {
        let slot = self
            .views
            .lock()
            .await
            .remove(view_id)
            .ok_or_else(|| SyncError::view_not_found(view_id))?;

        let mut slot = slot.lock().await;
        slot.closed = true;
        slot.subscribers.close_all();
        if let Some(folder) = &self.folder {
            if let Err(err) = folder.remove_view(view_id) {
                tracing::warn!(view_id = %view_id, error = %err, "failed to remove view metadata");
            }
        }
        tracing::info!(view_id = %view_id, "view closed");
        Ok(())
    }

    pub async fn set_selection(
        &self,
        view_id: &ViewId,
        bounds: SelectionBounds,
        png_base64: Option<String>,
    ) -> Result<Selection, SyncError> {
        let mut slot = self.lock_view(view_id).await?;
        Ok(selection::report_selection(&mut slot.view, bounds, png_base64, now_millis()))
    }

    pub async fn get_selection(&self, view_id: &ViewId) -> Result<Option<Selection>, SyncError> {
        let slot = self.lock_view(view_id).await?;
        Ok(slot.view.selection().cloned())
    }

    /// Returns the selection that was active, if any.
    pub async fn clear_selection(&self, view_id: &ViewId) -> Result<Option<Selection>, SyncError> {
        let mut slot = self.lock_view(view_id).await?;
        Ok(selection::clear_selection(&mut slot.view))
    }

    pub async fn set_allow_replace_all(&self, view_id: &ViewId, allow: bool) -> Result<bool, SyncError> {
        let mut slot = self.lock_view(view_id).await?;
        if slot.view.allow_replace_all() != allow {
            tracing::info!(view_id = %view_id, allow, "replace_all toggled");
        }
        slot.view.set_allow_replace_all(allow);
        Ok(allow)
    }

    /// Stores renderer-exported artifacts. Absent fields keep their cached value.
    pub async fn set_render_cache(
        &self,
        view_id: &ViewId,
        svg: Option<String>,
        png_bytes: Option<Vec<u8>>,
    ) -> Result<(), SyncError> {
        let mut slot = self.lock_view(view_id).await?;
        let cache = slot.view.render_cache_mut();
        if svg.is_some() {
            cache.svg = svg;
        }
        if png_bytes.is_some() {
            cache.png_bytes = png_bytes;
        }
        Ok(())
    }

    /// Returns cached render artifacts. Fetching an actual artifact stamps the freshness gate.
    pub async fn get_image(&self, view_id: &ViewId) -> Result<RenderArtifacts, SyncError> {
        let mut slot = self.lock_view(view_id).await?;
        let cache = slot.view.render_cache();
        let artifacts = RenderArtifacts {
            view_id: view_id.clone(),
            last_checkpoint_id: slot.view.last_checkpoint_id().cloned(),
            svg: cache.svg.clone(),
            png_bytes: cache.png_bytes.clone(),
        };
        if !artifacts.is_empty() {
            slot.view.mark_image_access(now_millis());
        }
        Ok(artifacts)
    }

    /// Returns one cached artifact; only a hit stamps the freshness gate.
    pub async fn get_image_as(
        &self,
        view_id: &ViewId,
        format: ImageFormat,
    ) -> Result<Option<Vec<u8>>, SyncError> {
        let mut slot = self.lock_view(view_id).await?;
        let cache = slot.view.render_cache();
        let bytes = match format {
            ImageFormat::Svg => cache.svg.as_ref().map(|svg| svg.as_bytes().to_vec()),
            ImageFormat::Png => cache.png_bytes.clone(),
        };
        if bytes.is_some() {
            slot.view.mark_image_access(now_millis());
        }
        Ok(bytes)
    }

    /// Stamps the freshness gate, e.g. when a renderer reports it displayed the current state.
    pub async fn mark_image_access(&self, view_id: &ViewId) -> Result<u64, SyncError> {
        let mut slot = self.lock_view(view_id).await?;
        let now = now_millis();
        slot.view.mark_image_access(now);
        Ok(now)
    }

    /// Registers a push subscriber. The current state is queued first when a checkpoint exists.
    pub async fn subscribe(&self, view_id: &ViewId) -> Result<Subscription, SyncError> {
        let mut slot = self.lock_view(view_id).await?;
        let initial = slot.view.last_checkpoint_id().map(|checkpoint_id| PushEvent::Update {
            elements: slot.view.elements().to_vec(),
            checkpoint_id: checkpoint_id.clone(),
        });
        let (subscriber_id, receiver) = slot.subscribers.subscribe_with(initial);
        tracing::debug!(view_id = %view_id, subscriber = subscriber_id.get(), "subscriber attached");
        Ok(Subscription { subscriber_id, receiver })
    }

    pub async fn unsubscribe(&self, view_id: &ViewId, subscriber_id: SubscriberId) -> bool {
        match self.lock_view(view_id).await {
            Ok(mut slot) => slot.subscribers.unsubscribe(subscriber_id),
            Err(_) => false,
        }
    }

    async fn lock_view(&self, view_id: &ViewId) -> Result<OwnedMutexGuard<ViewSlot>, SyncError> {
        let slot = self
            .views
            .lock()
            .await
            .get(view_id)
            .cloned()
            .ok_or_else(|| SyncError::view_not_found(view_id))?;
        let slot = slot.lock_owned().await;
        if slot.closed {
            return Err(SyncError::view_not_found(view_id));
        }
        Ok(slot)
    }

    /// Gates, resolves and installs `script` on the locked view.
    fn commit(
        &self,
        slot: &mut ViewSlot,
        script: ScriptInput,
        intent: &EditIntent,
    ) -> Result<UpdateOutcome, SyncError> {
        let view_id = slot.view.view_id().clone();
        let result = self.run_gates_and_resolve(&slot.view, script, intent);
        let resolution = match result {
            Ok(resolution) => resolution,
            Err(err) => {
                tracing::debug!(view_id = %view_id, kind = %err.kind(), error = %err, "update rejected");
                return Err(err);
            }
        };

        let checkpoint_id = CheckpointId::mint();
        self.checkpoints
            .save(&checkpoint_id, &Checkpoint::new(resolution.resolved_elements.clone()))?;

        let element_count = resolution.resolved_elements.len();
        slot.view.install_checkpoint(
            checkpoint_id.clone(),
            resolution.resolved_elements.clone(),
            now_millis(),
        );
        self.persist_best_effort(&slot.view);

        let delivered = slot.subscribers.push(PushEvent::Update {
            elements: resolution.resolved_elements,
            checkpoint_id: checkpoint_id.clone(),
        });
        tracing::info!(
            view_id = %view_id,
            checkpoint_id = %checkpoint_id,
            elements = element_count,
            delivered,
            "checkpoint installed"
        );

        Ok(UpdateOutcome {
            view_id,
            checkpoint_id,
            element_count,
            ratio_hint: resolution.ratio_hint,
            delivered,
        })
    }

    fn run_gates_and_resolve(
        &self,
        view: &View,
        script: ScriptInput,
        intent: &EditIntent,
    ) -> Result<Resolution, SyncError> {
        check_fresh(view)?;
        let state = SelectionState::of(view);
        selection::check_edit(state, intent.selection_ack, intent.edit_bounds.as_ref())?;
        if intent.replace_all && !view.allow_replace_all() {
            return Err(SyncError::ReplaceAllLocked {
                view_id: view.view_id().clone(),
                last_checkpoint_id: view.last_checkpoint_id().cloned(),
            });
        }

        let script = script.parse()?;
        if !intent.replace_all && !script.has_restore_checkpoint() {
            return Err(SyncError::MissingRestoreCheckpoint {
                last_checkpoint_id: view.last_checkpoint_id().cloned(),
            });
        }
        resolve_script(self.checkpoints.as_ref(), script)
    }

    fn persist_best_effort(&self, view: &View) {
        let Some(folder) = &self.folder else {
            return;
        };
        if let Err(err) = folder.upsert_view(stored_view(view)) {
            tracing::warn!(view_id = %view.view_id(), error = %err, "failed to persist view metadata");
        }
    }

    fn folder_root(&self) -> String {
        self.folder.as_ref().map(|folder| folder.root().display().to_string()).unwrap_or_default()
    }
}

impl ViewSlot {
    fn new(view: View) -> Self {
        Self { view, subscribers: SubscriberSet::default(), closed: false }
    }
}

enum ScriptInput {
    Raw(Value),
    Elements(Vec<Element>),
}

impl ScriptInput {
    fn parse(self) -> Result<Script, SyncError> {
        match self {
            Self::Raw(value) => Script::parse(value),
            Self::Elements(elements) => {
                Script::parse(Value::Array(elements.into_iter().map(Value::from).collect()))
            }
        }
    }
}

fn check_fresh(view: &View) -> Result<(), SyncError> {
    if view.last_image_access_at().is_some() {
        return Ok(());
    }
    Err(SyncError::ImageNotFetched {
        view_id: view.view_id().clone(),
        last_checkpoint_id: view.last_checkpoint_id().cloned(),
    })
}

fn stored_view(view: &View) -> StoredView {
    StoredView {
        view_id: view.view_id().clone(),
        meta: view.meta().clone(),
        last_checkpoint_id: view.last_checkpoint_id().cloned(),
        created_at: view.created_at(),
        updated_at: view.updated_at(),
    }
}
