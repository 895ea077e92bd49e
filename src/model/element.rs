// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Elements and edit-script items.
//!
//! Drawable elements are schema-less JSON values (normally objects) carried verbatim. Only three
//! script item types are interpreted (`restoreCheckpoint`, `delete`, `cameraUpdate`); everything
//! else is a drawable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const RESTORE_CHECKPOINT: &str = "restoreCheckpoint";
pub const DELETE: &str = "delete";
pub const CAMERA_UPDATE: &str = "cameraUpdate";

/// A single element record. Field accessors see nothing on non-object values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Element(Value);

impl Default for Element {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl Element {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(Value::Object(fields))
    }

    /// Returns `None` unless `value` is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        value.is_object().then_some(Self(value))
    }

    /// Wraps any script entry, object or not, to be carried through unchanged.
    pub fn opaque(value: Value) -> Self {
        Self(value)
    }

    pub fn restore_checkpoint(checkpoint_id: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("type".to_owned(), Value::from(RESTORE_CHECKPOINT));
        fields.insert("id".to_owned(), Value::from(checkpoint_id));
        Self::new(fields)
    }

    pub fn delete<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let joined = ids.into_iter().collect::<Vec<_>>().join(",");
        let mut fields = Map::new();
        fields.insert("type".to_owned(), Value::from(DELETE));
        fields.insert("ids".to_owned(), Value::from(joined));
        Self::new(fields)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Element> for Value {
    fn from(element: Element) -> Self {
        element.into_value()
    }
}

/// One interpreted entry of an edit script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptItem {
    /// `None` when the item carries no string `id`; such a restore finds nothing.
    RestoreCheckpoint { checkpoint_id: Option<String> },
    Delete { ids: Vec<String> },
    /// Kept as a regular element; the renderer consumes it as a viewport directive.
    CameraUpdate { element: Element, width: Option<f64>, height: Option<f64> },
    Drawable(Element),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptItemError {
    #[error("delete `ids` must be a comma-separated string or an array of strings")]
    InvalidDeleteIds,
}

impl ScriptItem {
    pub fn from_element(element: Element) -> Result<Self, ScriptItemError> {
        match element.kind() {
            Some(RESTORE_CHECKPOINT) => {
                Ok(Self::RestoreCheckpoint { checkpoint_id: element.id().map(ToOwned::to_owned) })
            }
            Some(DELETE) => {
                let ids = match element.get("ids") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::String(raw)) => split_delete_ids(raw),
                    Some(Value::Array(values)) => {
                        let mut ids = Vec::with_capacity(values.len());
                        for value in values {
                            let raw = value.as_str().ok_or(ScriptItemError::InvalidDeleteIds)?;
                            ids.extend(split_delete_ids(raw));
                        }
                        ids
                    }
                    Some(_) => return Err(ScriptItemError::InvalidDeleteIds),
                };
                Ok(Self::Delete { ids })
            }
            Some(CAMERA_UPDATE) => {
                let width = element.get("width").and_then(Value::as_f64);
                let height = element.get("height").and_then(Value::as_f64);
                Ok(Self::CameraUpdate { element, width, height })
            }
            _ => Ok(Self::Drawable(element)),
        }
    }

    pub fn is_restore_checkpoint(&self) -> bool {
        matches!(self, Self::RestoreCheckpoint { .. })
    }
}

/// Splits a `delete` id list on commas, trimming whitespace and dropping empty entries.
pub fn split_delete_ids(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|id| !id.is_empty()).map(ToOwned::to_owned).collect()
}
