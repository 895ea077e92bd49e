// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// MCP server helper functions:
/// id parsing, hub-to-payload mapping, and error translation.
fn parse_view_id(raw: &str) -> Result<ViewId, ErrorData> {
    LiveViewHub::parse_view_id(raw).map_err(to_mcp_error)
}

/// Accepts the script either as a JSON array or as a string holding one.
fn script_value(elements: Value) -> Result<Value, SyncError> {
    match elements {
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|err| SyncError::parse(format!("invalid JSON in elements: {err}"))),
        other => Ok(other),
    }
}

fn elements_from_values(values: Vec<Value>) -> Result<Vec<Element>, SyncError> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            Element::from_value(value)
                .ok_or_else(|| SyncError::parse(format!("element {index} must be an object")))
        })
        .collect()
}

fn edit_intent(
    replace_all: Option<bool>,
    selection_ack: Option<bool>,
    edit_bounds: Option<McpBounds>,
) -> EditIntent {
    EditIntent {
        replace_all: replace_all.unwrap_or(false),
        selection_ack: selection_ack.unwrap_or(false),
        edit_bounds: edit_bounds.map(model_bounds),
    }
}

fn model_bounds(bounds: McpBounds) -> Bounds {
    Bounds::new(bounds.x, bounds.y, bounds.width, bounds.height)
}

fn mcp_view_summary(summary: &ViewSummary) -> McpViewSummary {
    McpViewSummary {
        view_id: summary.view_id.as_str().to_owned(),
        url: summary.url.clone(),
        title: summary.meta.title.clone(),
        description: summary.meta.description.clone(),
        skin: summary.meta.skin.clone(),
        last_checkpoint_id: summary.last_checkpoint_id.as_ref().map(|id| id.as_str().to_owned()),
        created_at: summary.created_at,
        updated_at: summary.updated_at,
    }
}

fn mcp_selection(selection: &Selection) -> McpSelection {
    let rect = selection.bounds.rect;
    McpSelection {
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
        view_box: selection.bounds.view_box.map(|view_box| McpBounds {
            x: view_box.x,
            y: view_box.y,
            width: view_box.width,
            height: view_box.height,
        }),
        png_base64: selection.png_base64.clone(),
        updated_at: selection.updated_at,
    }
}

fn mcp_chunk_totals(totals: ChunkTotals) -> McpChunkTotals {
    McpChunkTotals { elements: totals.elements as u64, bytes: totals.bytes }
}

fn mcp_update_response(outcome: UpdateOutcome) -> ViewUpdateResponse {
    ViewUpdateResponse {
        view_id: outcome.view_id.into_string(),
        checkpoint_id: outcome.checkpoint_id.into_string(),
        element_count: outcome.element_count as u64,
        ratio_hint: Some(outcome.ratio_hint).filter(|hint| !hint.is_empty()),
        delivered: outcome.delivered as u64,
    }
}

fn to_mcp_error(err: SyncError) -> ErrorData {
    let kind = err.kind();
    let mut data = err.remediation();
    if let Value::Object(fields) = &mut data {
        fields.insert("kind".to_owned(), Value::from(kind.as_str()));
    }
    let message = err.to_string();
    match kind {
        ErrorKind::NotFound => ErrorData::resource_not_found(message, Some(data)),
        ErrorKind::ParseError => ErrorData::invalid_params(message, Some(data)),
        ErrorKind::PolicyViolation
        | ErrorKind::PreconditionFailed
        | ErrorKind::ResourceExceeded => ErrorData::invalid_request(message, Some(data)),
        ErrorKind::StorageError => {
            tracing::warn!(error = %err, "storage failure surfaced to tool caller");
            ErrorData::internal_error(message, Some(data))
        }
    }
}
