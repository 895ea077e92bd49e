// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Per-view subscriber fan-out.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::model::{CheckpointId, Element, ViewMeta};

/// Event pushed to renderers subscribed to a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum PushEvent {
    Update {
        elements: Vec<Element>,
        #[serde(rename = "checkpointId")]
        checkpoint_id: CheckpointId,
    },
    Meta {
        title: Option<String>,
        description: Option<String>,
        skin: Option<String>,
    },
    Closed,
}

impl PushEvent {
    pub fn meta(meta: &ViewMeta) -> Self {
        Self::Meta {
            title: meta.title.clone(),
            description: meta.description.clone(),
            skin: meta.skin.clone(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Update { .. } => "update",
            Self::Meta { .. } => "meta",
            Self::Closed => "closed",
        }
    }
}

pub type PushSender = mpsc::UnboundedSender<Arc<PushEvent>>;
pub type PushReceiver = mpsc::UnboundedReceiver<Arc<PushEvent>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct SubscriberSet {
    next_id: u64,
    senders: BTreeMap<SubscriberId, PushSender>,
}

impl SubscriberSet {
    pub fn subscribe(&mut self) -> (SubscriberId, PushReceiver) {
        self.subscribe_with(None)
    }

    /// Registers a subscriber whose queue starts with `initial`.
    pub fn subscribe_with(&mut self, initial: Option<PushEvent>) -> (SubscriberId, PushReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(initial) = initial {
            // The receiver is alive, so this cannot fail.
            let _ = tx.send(Arc::new(initial));
        }
        self.next_id += 1;
        let id = SubscriberId(self.next_id);
        self.senders.insert(id, tx);
        (id, rx)
    }

    /// Sends `event` to every live subscriber and drops the ones whose receiver is gone.
    /// Returns the number of subscribers that accepted the event.
    pub fn push(&mut self, event: PushEvent) -> usize {
        if self.senders.is_empty() {
            return 0;
        }
        let event = Arc::new(event);
        let before = self.senders.len();
        self.senders.retain(|_, sender| sender.send(Arc::clone(&event)).is_ok());
        let dropped = before - self.senders.len();
        if dropped > 0 {
            tracing::debug!(dropped, event = event.name(), "dropped disconnected subscribers");
        }
        self.senders.len()
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.senders.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Pushes `closed` and drops every subscriber.
    pub fn close_all(&mut self) {
        self.push(PushEvent::Closed);
        self.senders.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn push_reaches_every_subscriber() {
        let mut set = SubscriberSet::default();
        let (_, mut first) = set.subscribe();
        let (_, mut second) = set.subscribe();

        assert_eq!(set.push(PushEvent::Closed), 2);
        assert_eq!(*first.try_recv().expect("first"), PushEvent::Closed);
        assert_eq!(*second.try_recv().expect("second"), PushEvent::Closed);
    }

    #[test]
    fn initial_event_is_queued_for_the_new_subscriber_only() {
        let mut set = SubscriberSet::default();
        let (_, mut existing) = set.subscribe();
        let (_, mut fresh) = set.subscribe_with(Some(PushEvent::Closed));

        assert_eq!(*fresh.try_recv().expect("initial"), PushEvent::Closed);
        assert!(existing.try_recv().is_err());
    }

    #[test]
    fn dropped_receivers_are_pruned_on_push() {
        let mut set = SubscriberSet::default();
        let (_, kept) = set.subscribe();
        let (_, gone) = set.subscribe();
        drop(gone);

        assert_eq!(set.push(PushEvent::Closed), 1);
        assert_eq!(set.len(), 1);
        drop(kept);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut set = SubscriberSet::default();
        let (id, mut rx) = set.subscribe();
        assert!(set.unsubscribe(id));
        assert!(!set.unsubscribe(id));
        assert_eq!(set.push(PushEvent::Closed), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn close_all_sends_closed_then_disconnects() {
        let mut set = SubscriberSet::default();
        let (_, mut rx) = set.subscribe();
        set.close_all();

        assert!(set.is_empty());
        assert_eq!(*rx.try_recv().expect("closed"), PushEvent::Closed);
        assert!(matches!(rx.try_recv(), Err(mpsc::error::TryRecvError::Disconnected)));
    }

    #[test]
    fn events_serialize_with_event_tag() {
        let update = PushEvent::Update {
            elements: vec![Element::from_value(json!({ "id": "a" })).expect("element")],
            checkpoint_id: CheckpointId::new("cp1").expect("checkpoint id"),
        };
        assert_eq!(
            serde_json::to_value(&update).expect("serialize"),
            json!({ "event": "update", "elements": [{ "id": "a" }], "checkpointId": "cp1" })
        );

        let meta = PushEvent::meta(&ViewMeta { title: Some("T".into()), ..Default::default() });
        assert_eq!(
            serde_json::to_value(&meta).expect("serialize"),
            json!({ "event": "meta", "title": "T", "description": null, "skin": null })
        );
        assert_eq!(serde_json::to_value(PushEvent::Closed).expect("serialize"), json!({ "event": "closed" }));
    }
}
