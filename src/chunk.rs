// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Reassembly of large element lists sent in several calls.
//!
//! The assembler owns no state of its own; the accumulator lives on the view so it is guarded by
//! the same lock as the rest of the view.

use serde::Serialize;

use crate::config::ChunkLimits;
use crate::error::SyncError;
use crate::model::{Element, PendingChunk, ViewId};

/// Running totals of a pending upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChunkTotals {
    pub elements: usize,
    pub bytes: u64,
}

impl From<&PendingChunk> for ChunkTotals {
    fn from(pending: &PendingChunk) -> Self {
        Self { elements: pending.elements.len(), bytes: pending.total_bytes }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkAssembler {
    limits: ChunkLimits,
}

impl ChunkAssembler {
    pub fn new(limits: ChunkLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ChunkLimits {
        self.limits
    }

    /// Appends one chunk to `pending`.
    ///
    /// `start` discards whatever was accumulated before. `byte_len` defaults to the serialized
    /// size of `elements`. When either ceiling is exceeded the accumulator is cleared and the
    /// error reports the totals that tripped it.
    pub fn append(
        &self,
        pending: &mut Option<PendingChunk>,
        view_id: &ViewId,
        start: bool,
        elements: Vec<Element>,
        byte_len: Option<u64>,
    ) -> Result<ChunkTotals, SyncError> {
        if start {
            *pending = Some(PendingChunk::default());
        }
        let Some(accumulator) = pending.as_mut() else {
            return Err(SyncError::NoPendingChunk { view_id: view_id.clone() });
        };

        let byte_len = byte_len.unwrap_or_else(|| chunk_byte_len(&elements));
        accumulator.total_bytes = accumulator.total_bytes.saturating_add(byte_len);
        accumulator.elements.extend(elements);
        let totals = ChunkTotals::from(&*accumulator);

        if totals.elements > self.limits.max_elements || totals.bytes > self.limits.max_bytes {
            *pending = None;
            tracing::debug!(
                view_id = %view_id,
                elements = totals.elements,
                bytes = totals.bytes,
                "chunked upload discarded: limits exceeded"
            );
            return Err(SyncError::ChunkLimitExceeded {
                elements: totals.elements,
                bytes: totals.bytes,
                max_elements: self.limits.max_elements,
                max_bytes: self.limits.max_bytes,
            });
        }

        Ok(totals)
    }

    /// Takes the accumulated elements, leaving no upload in progress.
    pub fn take(pending: &mut Option<PendingChunk>) -> Vec<Element> {
        pending.take().map(|pending| pending.elements).unwrap_or_default()
    }
}

/// Serialized JSON size of `elements` as an array.
pub fn chunk_byte_len(elements: &[Element]) -> u64 {
    serde_json::to_vec(elements).map(|bytes| bytes.len() as u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    fn rects(count: usize) -> Vec<Element> {
        (0..count)
            .map(|i| {
                Element::from_value(json!({ "id": format!("r{i}"), "type": "rectangle" }))
                    .expect("element")
            })
            .collect()
    }

    #[fixture]
    fn view_id() -> ViewId {
        ViewId::new("v1").expect("view id")
    }

    #[fixture]
    fn assembler() -> ChunkAssembler {
        ChunkAssembler::new(ChunkLimits { max_bytes: 1_000, max_elements: 5 })
    }

    #[rstest]
    fn start_append_and_take(assembler: ChunkAssembler, view_id: ViewId) {
        let mut pending = None;
        let totals =
            assembler.append(&mut pending, &view_id, true, rects(2), Some(10)).expect("start");
        assert_eq!(totals, ChunkTotals { elements: 2, bytes: 10 });

        let totals =
            assembler.append(&mut pending, &view_id, false, rects(1), Some(5)).expect("append");
        assert_eq!(totals, ChunkTotals { elements: 3, bytes: 15 });

        let elements = ChunkAssembler::take(&mut pending);
        assert_eq!(elements.len(), 3);
        assert!(pending.is_none());
        assert!(ChunkAssembler::take(&mut pending).is_empty());
    }

    #[rstest]
    fn start_discards_previous_upload(assembler: ChunkAssembler, view_id: ViewId) {
        let mut pending = None;
        assembler.append(&mut pending, &view_id, true, rects(3), Some(1)).expect("first");
        let totals =
            assembler.append(&mut pending, &view_id, true, rects(1), Some(1)).expect("restart");
        assert_eq!(totals, ChunkTotals { elements: 1, bytes: 1 });
    }

    #[rstest]
    fn append_without_start_is_not_found(assembler: ChunkAssembler, view_id: ViewId) {
        let mut pending = None;
        let err =
            assembler.append(&mut pending, &view_id, false, rects(1), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(pending.is_none());
    }

    #[rstest]
    #[case::too_many_elements(rects(6), Some(1))]
    #[case::too_many_bytes(rects(1), Some(1_001))]
    fn overflow_discards_the_upload(
        assembler: ChunkAssembler,
        view_id: ViewId,
        #[case] elements: Vec<Element>,
        #[case] byte_len: Option<u64>,
    ) {
        let mut pending = None;
        let err =
            assembler.append(&mut pending, &view_id, true, elements, byte_len).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceExceeded);
        assert!(pending.is_none());

        let err = assembler.append(&mut pending, &view_id, false, rects(1), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[rstest]
    fn overflow_across_calls_reports_accumulated_totals(assembler: ChunkAssembler, view_id: ViewId) {
        let mut pending = None;
        assembler.append(&mut pending, &view_id, true, rects(3), Some(400)).expect("first");
        let err =
            assembler.append(&mut pending, &view_id, false, rects(3), Some(400)).unwrap_err();
        match err {
            SyncError::ChunkLimitExceeded { elements, bytes, max_elements, max_bytes } => {
                assert_eq!((elements, bytes), (6, 800));
                assert_eq!((max_elements, max_bytes), (5, 1_000));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(pending.is_none());
    }

    #[rstest]
    fn byte_hint_defaults_to_serialized_length(assembler: ChunkAssembler, view_id: ViewId) {
        let elements = rects(2);
        let expected = serde_json::to_vec(&elements).expect("serialize").len() as u64;
        let mut pending = None;
        let totals = assembler.append(&mut pending, &view_id, true, elements, None).expect("start");
        assert_eq!(totals.bytes, expected);
        assert_eq!(chunk_byte_len(&[]), 2);
    }
}
