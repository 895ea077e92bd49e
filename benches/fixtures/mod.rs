// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Deterministic element fixtures for benchmarks (no RNG).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use livecanvas::model::Element;
use serde_json::{json, Value};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = std::env::temp_dir();
        path.push(format!("livecanvas_bench_{prefix}_{}_{nanos}_{counter}", std::process::id()));
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Case {
    Small,
    Medium,
    Large,
}

impl Case {
    pub fn element_count(self) -> usize {
        match self {
            Self::Small => 50,
            Self::Medium => 500,
            Self::Large => 3_000,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// A grid of labelled boxes with an arrow between horizontal neighbours.
pub fn diagram(count: usize) -> Vec<Element> {
    (0..count)
        .map(|i| {
            let col = (i % 20) as i64;
            let row = (i / 20) as i64;
            let value = if i % 4 == 3 {
                json!({
                    "id": format!("e{i}"),
                    "type": "arrow",
                    "x": col * 120 + 100,
                    "y": row * 90 + 30,
                    "points": [[0, 0], [20, 0]],
                    "start": { "id": format!("e{}", i - 1) },
                })
            } else {
                json!({
                    "id": format!("e{i}"),
                    "type": "rectangle",
                    "x": col * 120,
                    "y": row * 90,
                    "width": 100,
                    "height": 60,
                    "label": { "text": format!("Box {i}") },
                })
            };
            Element::from_value(value).expect("object element")
        })
        .collect()
}

/// `restoreCheckpoint` plus every `stride`-th element deleted and re-appended.
pub fn edit_script(checkpoint_id: &str, count: usize, stride: usize) -> Value {
    let touched = (0..count).step_by(stride.max(1)).map(|i| format!("e{i}")).collect::<Vec<_>>();
    let mut items = vec![
        json!({ "type": "restoreCheckpoint", "id": checkpoint_id }),
        json!({ "type": "delete", "ids": touched.join(",") }),
    ];
    items.extend(touched.iter().map(|id| json!({ "id": id, "type": "ellipse", "x": 0, "y": 0 })));
    items.push(json!({ "type": "cameraUpdate", "width": 1200, "height": 900 }));
    Value::Array(items)
}
