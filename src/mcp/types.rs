// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct McpBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpViewSummary {
    pub view_id: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub skin: Option<String>,
    pub last_checkpoint_id: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpSelection {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub view_box: Option<McpBounds>,
    pub png_base64: Option<String>,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct McpChunkTotals {
    pub elements: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ViewCreateParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub skin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewCreateResponse {
    pub view: McpViewSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewListResponse {
    pub views: Vec<McpViewSummary>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ViewIdParams {
    pub view_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewReadResponse {
    pub view: McpViewSummary,
    pub elements: Vec<Value>,
    pub allow_replace_all: bool,
    pub selection: Option<McpSelection>,
    pub last_image_access_at: Option<u64>,
    pub pending_chunk: Option<McpChunkTotals>,
    pub subscribers: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ViewUpdateParams {
    pub view_id: String,
    /// Edit script: an array of elements and pseudo-operations, or the same array as a JSON
    /// string.
    pub elements: Value,
    #[serde(default)]
    pub replace_all: Option<bool>,
    #[serde(default)]
    pub selection_ack: Option<bool>,
    #[serde(default)]
    pub edit_bounds: Option<McpBounds>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewUpdateResponse {
    pub view_id: String,
    pub checkpoint_id: String,
    pub element_count: u64,
    pub ratio_hint: Option<String>,
    pub delivered: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ViewDeltaParams {
    pub view_id: String,
    #[serde(default)]
    pub delete_ids: Option<Vec<String>>,
    #[serde(default)]
    pub upsert_elements: Option<Vec<Value>>,
    #[serde(default)]
    pub selection_ack: Option<bool>,
    #[serde(default)]
    pub edit_bounds: Option<McpBounds>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ViewChunkParams {
    pub view_id: String,
    #[serde(default)]
    pub elements: Vec<Value>,
    #[serde(default)]
    pub start: Option<bool>,
    #[serde(default, rename = "final")]
    pub is_final: Option<bool>,
    /// Byte size of this chunk as sent; defaults to the serialized size of `elements`.
    #[serde(default)]
    pub byte_len: Option<u64>,
    #[serde(default)]
    pub replace_all: Option<bool>,
    #[serde(default)]
    pub selection_ack: Option<bool>,
    #[serde(default)]
    pub edit_bounds: Option<McpBounds>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewChunkResponse {
    /// `pending`, `committed` or `empty`.
    pub status: String,
    pub pending: Option<McpChunkTotals>,
    pub update: Option<ViewUpdateResponse>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ViewSetMetaParams {
    pub view_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub skin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewSetMetaResponse {
    pub view: McpViewSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewCloseResponse {
    pub view_id: String,
    pub closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewGetImageResponse {
    pub view_id: String,
    pub last_checkpoint_id: Option<String>,
    pub has_image: bool,
    pub svg: Option<String>,
    pub png_base64: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ViewAllowReplaceAllParams {
    pub view_id: String,
    pub allow: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewAllowReplaceAllResponse {
    pub view_id: String,
    pub allow_replace_all: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SelectionReadResponse {
    pub view_id: String,
    pub selection: Option<McpSelection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SelectionClearResponse {
    pub view_id: String,
    pub cleared: bool,
}
