// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use serde_json::Value;

use crate::chunk::ChunkTotals;
use crate::error::{ErrorKind, SyncError};
use crate::hub::{
    ChunkOutcome, ChunkRequest, DeltaRequest, EditIntent, LiveViewHub, UpdateOutcome, ViewSummary,
};
use crate::model::{Bounds, Element, Selection, ViewId, ViewMeta, ViewMetaPatch};

use super::types::*;

#[derive(Clone)]
pub struct LiveCanvasMcp {
    hub: Arc<LiveViewHub>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl LiveCanvasMcp {
    pub fn new(hub: Arc<LiveViewHub>) -> Self {
        Self { hub, tool_router: Self::tool_router() }
    }

    pub fn hub(&self) -> &Arc<LiveViewHub> {
        &self.hub
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Create a new live view; open its `url` in a renderer and fetch an image before editing.
    #[tool(name = "view.create")]
    async fn view_create(
        &self,
        params: Parameters<ViewCreateParams>,
    ) -> Result<Json<ViewCreateResponse>, ErrorData> {
        let ViewCreateParams { title, description, skin } = params.0;
        let summary =
            self.hub.create_view(ViewMeta { title, description, skin }).await.map_err(to_mcp_error)?;
        Ok(Json(ViewCreateResponse { view: mcp_view_summary(&summary) }))
    }

    /// List open views, most recently updated first.
    #[tool(name = "view.list")]
    async fn view_list(&self) -> Result<Json<ViewListResponse>, ErrorData> {
        let views = self.hub.list_views().await.iter().map(mcp_view_summary).collect();
        Ok(Json(ViewListResponse { views }))
    }

    /// Read a view's metadata, current elements, selection and upload state.
    #[tool(name = "view.read")]
    async fn view_read(
        &self,
        params: Parameters<ViewIdParams>,
    ) -> Result<Json<ViewReadResponse>, ErrorData> {
        let view_id = parse_view_id(&params.0.view_id)?;
        let snapshot = self.hub.get_view(&view_id).await.map_err(to_mcp_error)?;
        Ok(Json(ViewReadResponse {
            view: mcp_view_summary(&snapshot.summary),
            elements: snapshot.elements.into_iter().map(Value::from).collect(),
            allow_replace_all: snapshot.allow_replace_all,
            selection: snapshot.selection.as_ref().map(mcp_selection),
            last_image_access_at: snapshot.last_image_access_at,
            pending_chunk: snapshot.pending_chunk.map(mcp_chunk_totals),
            subscribers: snapshot.subscribers as u64,
        }))
    }

    /// Apply an edit script. Start it with `{"type":"restoreCheckpoint","id":<last_checkpoint_id>}`
    /// unless `replace_all` is set; `delete` and `cameraUpdate` items are also interpreted.
    #[tool(name = "view.update")]
    async fn view_update(
        &self,
        params: Parameters<ViewUpdateParams>,
    ) -> Result<Json<ViewUpdateResponse>, ErrorData> {
        let ViewUpdateParams { view_id, elements, replace_all, selection_ack, edit_bounds } =
            params.0;
        let view_id = parse_view_id(&view_id)?;
        let script = script_value(elements).map_err(to_mcp_error)?;
        let intent = edit_intent(replace_all, selection_ack, edit_bounds);

        let outcome = self.hub.update(&view_id, script, intent).await.map_err(to_mcp_error)?;
        Ok(Json(mcp_update_response(outcome)))
    }

    /// Apply upserts and deletes on top of the current checkpoint without resending the diagram.
    #[tool(name = "view.delta")]
    async fn view_delta(
        &self,
        params: Parameters<ViewDeltaParams>,
    ) -> Result<Json<ViewUpdateResponse>, ErrorData> {
        let ViewDeltaParams { view_id, delete_ids, upsert_elements, selection_ack, edit_bounds } =
            params.0;
        let view_id = parse_view_id(&view_id)?;
        let upsert_elements =
            elements_from_values(upsert_elements.unwrap_or_default()).map_err(to_mcp_error)?;
        let delta = DeltaRequest {
            delete_ids: delete_ids.unwrap_or_default(),
            upsert_elements,
            selection_ack: selection_ack.unwrap_or(false),
            edit_bounds: edit_bounds.map(model_bounds),
        };

        let outcome = self.hub.apply_delta(&view_id, delta).await.map_err(to_mcp_error)?;
        Ok(Json(mcp_update_response(outcome)))
    }

    /// Send a large edit script in pieces: `start=true` begins, `final=true` commits the whole
    /// script through the same checks as `view.update`.
    #[tool(name = "view.chunk")]
    async fn view_chunk(
        &self,
        params: Parameters<ViewChunkParams>,
    ) -> Result<Json<ViewChunkResponse>, ErrorData> {
        let ViewChunkParams {
            view_id,
            elements,
            start,
            is_final,
            byte_len,
            replace_all,
            selection_ack,
            edit_bounds,
        } = params.0;
        let view_id = parse_view_id(&view_id)?;
        let request = ChunkRequest {
            start: start.unwrap_or(false),
            is_final: is_final.unwrap_or(false),
            elements: elements.into_iter().map(Element::opaque).collect(),
            byte_len,
            intent: edit_intent(replace_all, selection_ack, edit_bounds),
        };

        let outcome = self.hub.chunk(&view_id, request).await.map_err(to_mcp_error)?;
        let response = match outcome {
            ChunkOutcome::Pending(totals) => ViewChunkResponse {
                status: "pending".to_owned(),
                pending: Some(mcp_chunk_totals(totals)),
                update: None,
            },
            ChunkOutcome::Committed(outcome) => ViewChunkResponse {
                status: "committed".to_owned(),
                pending: None,
                update: Some(mcp_update_response(outcome)),
            },
            ChunkOutcome::Empty => {
                ViewChunkResponse { status: "empty".to_owned(), pending: None, update: None }
            }
        };
        Ok(Json(response))
    }

    /// Update title, description or skin; renderers receive a `meta` event.
    #[tool(name = "view.set_meta")]
    async fn view_set_meta(
        &self,
        params: Parameters<ViewSetMetaParams>,
    ) -> Result<Json<ViewSetMetaResponse>, ErrorData> {
        let ViewSetMetaParams { view_id, title, description, skin } = params.0;
        let view_id = parse_view_id(&view_id)?;
        let summary = self
            .hub
            .update_meta(&view_id, ViewMetaPatch { title, description, skin })
            .await
            .map_err(to_mcp_error)?;
        Ok(Json(ViewSetMetaResponse { view: mcp_view_summary(&summary) }))
    }

    /// Close a view; renderers receive `closed` and its state is discarded.
    #[tool(name = "view.close")]
    async fn view_close(
        &self,
        params: Parameters<ViewIdParams>,
    ) -> Result<Json<ViewCloseResponse>, ErrorData> {
        let view_id = parse_view_id(&params.0.view_id)?;
        self.hub.close_view(&view_id).await.map_err(to_mcp_error)?;
        Ok(Json(ViewCloseResponse { view_id: view_id.into_string(), closed: true }))
    }

    /// Fetch the renderer's last exported image. Required once before the first edit.
    #[tool(name = "view.get_image")]
    async fn view_get_image(
        &self,
        params: Parameters<ViewIdParams>,
    ) -> Result<Json<ViewGetImageResponse>, ErrorData> {
        let view_id = parse_view_id(&params.0.view_id)?;
        let artifacts = self.hub.get_image(&view_id).await.map_err(to_mcp_error)?;
        Ok(Json(ViewGetImageResponse {
            has_image: !artifacts.is_empty(),
            view_id: artifacts.view_id.into_string(),
            last_checkpoint_id: artifacts.last_checkpoint_id.map(|id| id.into_string()),
            svg: artifacts.svg,
            png_base64: artifacts.png_bytes.map(|bytes| STANDARD.encode(bytes)),
        }))
    }

    /// Allow or forbid `replace_all` edits for a view (forbidden by default).
    #[tool(name = "view.allow_replace_all")]
    async fn view_allow_replace_all(
        &self,
        params: Parameters<ViewAllowReplaceAllParams>,
    ) -> Result<Json<ViewAllowReplaceAllResponse>, ErrorData> {
        let ViewAllowReplaceAllParams { view_id, allow } = params.0;
        let view_id = parse_view_id(&view_id)?;
        let allow_replace_all =
            self.hub.set_allow_replace_all(&view_id, allow).await.map_err(to_mcp_error)?;
        Ok(Json(ViewAllowReplaceAllResponse { view_id: view_id.into_string(), allow_replace_all }))
    }

    /// Read the selection a human drew in the renderer; edits must stay inside it.
    #[tool(name = "selection.read")]
    async fn selection_read(
        &self,
        params: Parameters<ViewIdParams>,
    ) -> Result<Json<SelectionReadResponse>, ErrorData> {
        let view_id = parse_view_id(&params.0.view_id)?;
        let selection = self.hub.get_selection(&view_id).await.map_err(to_mcp_error)?;
        Ok(Json(SelectionReadResponse {
            view_id: view_id.into_string(),
            selection: selection.as_ref().map(mcp_selection),
        }))
    }

    /// Clear the active selection, lifting the edit-bounds restriction.
    #[tool(name = "selection.clear")]
    async fn selection_clear(
        &self,
        params: Parameters<ViewIdParams>,
    ) -> Result<Json<SelectionClearResponse>, ErrorData> {
        let view_id = parse_view_id(&params.0.view_id)?;
        let cleared = self.hub.clear_selection(&view_id).await.map_err(to_mcp_error)?;
        Ok(Json(SelectionClearResponse { view_id: view_id.into_string(), cleared: cleared.is_some() }))
    }
}

#[tool_handler]
impl ServerHandler for LiveCanvasMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "livecanvas live diagram views (tools: view.create, view.list, view.read, view.update, view.delta, view.chunk, view.set_meta, view.close, view.get_image, view.allow_replace_all, selection.read, selection.clear). Fetch an image with view.get_image before the first edit of a view."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Mapping helpers between hub types and tool payloads.
include!("server/helpers.rs");
