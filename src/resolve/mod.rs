// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Edit-script resolution.
//!
//! A script is an ordered list of items. One left-to-right pass turns it into the concrete element
//! list a renderer draws: `restoreCheckpoint` splices in a stored snapshot, `delete` removes
//! elements resolved so far, `cameraUpdate` passes through but may raise an aspect-ratio hint, and
//! every other item (objects or not) is appended verbatim.

use serde_json::Value;

use crate::error::SyncError;
use crate::model::{CheckpointId, Element, ScriptItem};
use crate::store::CheckpointStore;

pub const TARGET_ASPECT_RATIO: f64 = 4.0 / 3.0;
pub const ASPECT_RATIO_TOLERANCE: f64 = 0.05;

/// A parsed edit script: the original entries plus their interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    parsed: Vec<Value>,
    items: Vec<ScriptItem>,
}

impl Script {
    pub fn parse(input: Value) -> Result<Self, SyncError> {
        let Value::Array(parsed) = input else {
            return Err(SyncError::parse(format!(
                "expected an array of script items, got {}",
                json_type_name(&input)
            )));
        };

        let items = parsed
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                ScriptItem::from_element(Element::opaque(entry.clone()))
                    .map_err(|err| SyncError::parse(format!("script item {index}: {err}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { parsed, items })
    }

    pub fn parse_str(raw: &str) -> Result<Self, SyncError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| SyncError::parse(format!("invalid JSON: {err}")))?;
        Self::parse(value)
    }

    pub fn items(&self) -> &[ScriptItem] {
        &self.items
    }

    pub fn parsed(&self) -> &[Value] {
        &self.parsed
    }

    pub fn has_restore_checkpoint(&self) -> bool {
        self.items.iter().any(ScriptItem::is_restore_checkpoint)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub parsed: Vec<Value>,
    pub resolved_elements: Vec<Element>,
    /// Advisory only; empty when the last camera directive is close enough to 4:3.
    pub ratio_hint: String,
}

pub fn resolve_script(store: &dyn CheckpointStore, script: Script) -> Result<Resolution, SyncError> {
    let Script { parsed, items } = script;
    let mut resolved: Vec<Element> = Vec::new();
    let mut ratio_hint = String::new();

    for item in items {
        match item {
            ScriptItem::RestoreCheckpoint { checkpoint_id } => {
                // Missing, unknown or malformed ids restore nothing.
                let Some(Ok(checkpoint_id)) = checkpoint_id.map(CheckpointId::new) else {
                    continue;
                };
                if let Some(checkpoint) = store.load(&checkpoint_id)? {
                    resolved.extend(checkpoint.elements);
                }
            }
            ScriptItem::Delete { ids } => {
                for id in &ids {
                    if let Some(index) =
                        resolved.iter().position(|element| element.id() == Some(id.as_str()))
                    {
                        resolved.remove(index);
                    }
                }
            }
            ScriptItem::CameraUpdate { element, width, height } => {
                ratio_hint = camera_ratio_hint(width, height).unwrap_or_default();
                resolved.push(element);
            }
            ScriptItem::Drawable(element) => resolved.push(element),
        }
    }

    Ok(Resolution { parsed, resolved_elements: resolved, ratio_hint })
}

/// Parses and resolves raw script JSON.
pub fn resolve_script_str(store: &dyn CheckpointStore, raw: &str) -> Result<Resolution, SyncError> {
    resolve_script(store, Script::parse_str(raw)?)
}

/// A zero height with a non-zero width is an unbounded ratio and always hints; `0/0` has no ratio.
fn camera_ratio_hint(width: Option<f64>, height: Option<f64>) -> Option<String> {
    let (Some(width), Some(height)) = (width, height) else {
        return None;
    };

    let ratio = width / height;
    if ratio.is_nan() || (ratio - TARGET_ASPECT_RATIO).abs() <= ASPECT_RATIO_TOLERANCE {
        return None;
    }

    let shown = if ratio.is_finite() { format!("{ratio:.2}") } else { "unbounded".to_owned() };
    Some(format!(
        "cameraUpdate aspect ratio is {shown}; use 4:3 (e.g. width 800, height 600) to avoid a distorted viewport"
    ))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
