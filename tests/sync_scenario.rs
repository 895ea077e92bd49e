// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use livecanvas::config::HubConfig;
use livecanvas::error::ErrorKind;
use livecanvas::hub::{DeltaRequest, EditIntent, LiveViewHub, PushEvent};
use livecanvas::model::{Element, ViewMeta};
use livecanvas::store::{CanvasFolder, CheckpointStore};
use serde_json::Value;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join("sync_scenario")
}

fn read_fixture(name: &str) -> Value {
    let path = fixtures_dir().join(name);
    let raw = fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to read {path:?}: {err}"));
    serde_json::from_str(&raw).unwrap_or_else(|err| panic!("invalid JSON in {path:?}: {err}"))
}

fn elements_fixture(name: &str) -> Vec<Element> {
    let Value::Array(values) = read_fixture(name) else {
        panic!("{name} must hold an array");
    };
    values.into_iter().map(|value| Element::from_value(value).expect("object element")).collect()
}

fn ids(elements: &[Element]) -> Vec<&str> {
    elements.iter().filter_map(Element::id).collect()
}

fn temp_store_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!("livecanvas-it-{name}-{}-{nanos}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[tokio::test]
async fn agent_session_against_a_persistent_store() {
    let dir = temp_store_dir("session");
    let folder = CanvasFolder::new(&dir);
    let hub = Arc::new(LiveViewHub::open(HubConfig::default(), folder.clone()).expect("open"));

    let view = hub
        .create_view(ViewMeta { title: Some("Services".into()), ..Default::default() })
        .await
        .expect("create");
    let view_id = view.view_id;

    let mut renderer = hub.subscribe(&view_id).await.expect("subscribe");

    // No image yet.
    let err = hub
        .update(&view_id, read_fixture("seed.json"), EditIntent::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    hub.set_render_cache(&view_id, Some("<svg/>".into()), None).await.expect("render cache");
    assert!(!hub.get_image(&view_id).await.expect("image").is_empty());

    let seeded = hub
        .update(&view_id, read_fixture("seed.json"), EditIntent::default())
        .await
        .expect("seed");
    assert_eq!(seeded.ratio_hint, "");
    assert_eq!(seeded.element_count, 4);

    let pushed = renderer.receiver.recv().await.expect("seed push");
    let PushEvent::Update { elements, checkpoint_id } = &*pushed else {
        panic!("expected update, got {pushed:?}");
    };
    assert_eq!(checkpoint_id, &seeded.checkpoint_id);
    assert_eq!(ids(elements), vec!["api", "db", "api-db"]);

    let delta = DeltaRequest {
        delete_ids: vec!["api-db".into()],
        upsert_elements: elements_fixture("upserts.json"),
        ..Default::default()
    };
    let edited = hub.apply_delta(&view_id, delta).await.expect("delta");

    let snapshot = hub.get_view(&view_id).await.expect("get");
    assert_eq!(ids(&snapshot.elements), vec!["api", "db", "cache"]);
    assert_eq!(snapshot.elements[2].get("y"), Some(&Value::from(200)));

    // Both checkpoints remain loadable from disk.
    let seed_checkpoint = folder.load(&seeded.checkpoint_id).expect("load").expect("seed checkpoint");
    assert_eq!(seed_checkpoint.elements.len(), 4);
    let edit_checkpoint = folder.load(&edited.checkpoint_id).expect("load").expect("edit checkpoint");
    assert_eq!(edit_checkpoint.elements, snapshot.elements);

    hub.close_view(&view_id).await.expect("close");
    let mut tail = Vec::new();
    while let Some(event) = renderer.receiver.recv().await {
        tail.push(event);
    }
    assert_eq!(tail.last().map(|event| event.name()), Some("closed"));

    let reopened = LiveViewHub::open(HubConfig::default(), folder).expect("reopen");
    assert!(reopened.list_views().await.is_empty());

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn restart_keeps_views_and_their_current_checkpoint() {
    let dir = temp_store_dir("restart");

    let (view_id, checkpoint_id) = {
        let hub = LiveViewHub::open(HubConfig::default(), CanvasFolder::new(&dir)).expect("open");
        let view_id = hub.create_view(ViewMeta::default()).await.expect("create").view_id;
        hub.mark_image_access(&view_id).await.expect("mark");
        let outcome = hub
            .update(&view_id, read_fixture("seed.json"), EditIntent::default())
            .await
            .expect("seed");
        (view_id, outcome.checkpoint_id)
    };

    let hub = LiveViewHub::open(HubConfig::default(), CanvasFolder::new(&dir)).expect("reopen");
    let snapshot = hub.get_view(&view_id).await.expect("get");
    assert_eq!(snapshot.summary.last_checkpoint_id, Some(checkpoint_id.clone()));
    assert_eq!(ids(&snapshot.elements), vec!["api", "db", "api-db"]);

    // A restarted process has not shown the view to anyone yet.
    let delta = DeltaRequest { delete_ids: vec!["db".into()], ..Default::default() };
    let err = hub.apply_delta(&view_id, delta.clone()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    hub.mark_image_access(&view_id).await.expect("mark");
    hub.apply_delta(&view_id, delta).await.expect("delta after restart");
    assert_eq!(ids(&hub.get_view(&view_id).await.expect("get").elements), vec!["api", "api-db"]);

    let _ = fs::remove_dir_all(&dir);
}
