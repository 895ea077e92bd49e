// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Selection guard.
//!
//! While a renderer reports an active selection, edits must acknowledge it and declare bounds that
//! lie inside it. Element geometry is never inspected; the declared bounds are trusted.

use crate::error::SyncError;
use crate::model::{Bounds, Selection, SelectionBounds, View};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionState<'a> {
    NoSelection,
    SelectionActive(&'a Selection),
}

impl<'a> SelectionState<'a> {
    pub fn of(view: &'a View) -> Self {
        match view.selection() {
            Some(selection) => Self::SelectionActive(selection),
            None => Self::NoSelection,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::SelectionActive(_))
    }
}

/// Replaces the current selection.
pub fn report_selection(
    view: &mut View,
    bounds: SelectionBounds,
    png_base64: Option<String>,
    now: u64,
) -> Selection {
    let selection = Selection { bounds, png_base64, updated_at: now };
    view.set_selection(Some(selection.clone()));
    selection
}

/// Returns the selection that was cleared, if any.
pub fn clear_selection(view: &mut View) -> Option<Selection> {
    let previous = view.selection().cloned();
    view.set_selection(None);
    previous
}

/// Admits or rejects an edit against the current selection.
pub fn check_edit(
    state: SelectionState<'_>,
    selection_ack: bool,
    edit_bounds: Option<&Bounds>,
) -> Result<(), SyncError> {
    let SelectionState::SelectionActive(selection) = state else {
        return Ok(());
    };
    let bounds = selection.bounds;

    if !selection_ack {
        return Err(SyncError::SelectionNotAcknowledged { selection: bounds });
    }
    let Some(edit_bounds) = edit_bounds else {
        return Err(SyncError::EditBoundsRequired { selection: bounds });
    };
    if !bounds.rect.contains(edit_bounds) {
        return Err(SyncError::EditBoundsOutsideSelection {
            edit_bounds: *edit_bounds,
            selection: bounds,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{ViewId, ViewMeta};

    fn selection(x: f64, y: f64, width: f64, height: f64) -> Selection {
        Selection {
            bounds: SelectionBounds { rect: Bounds::new(x, y, width, height), view_box: None },
            png_base64: None,
            updated_at: 1,
        }
    }

    #[test]
    fn no_selection_admits_everything() {
        let idle = SelectionState::NoSelection;
        assert!(check_edit(idle, false, None).is_ok());
        assert!(check_edit(idle, true, Some(&Bounds::new(-1e9, -1e9, 1.0, 1.0))).is_ok());
    }

    #[test]
    fn missing_ack_is_rejected_with_bounds() {
        let active = selection(0.0, 0.0, 100.0, 100.0);
        let state = SelectionState::SelectionActive(&active);
        let err = check_edit(state, false, Some(&Bounds::new(1.0, 1.0, 2.0, 2.0))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
        assert_eq!(err.remediation()["selection"]["width"], 100.0);
    }

    #[test]
    fn missing_edit_bounds_is_rejected() {
        let active = selection(0.0, 0.0, 100.0, 100.0);
        let err = check_edit(SelectionState::SelectionActive(&active), true, None).unwrap_err();
        assert!(matches!(err, SyncError::EditBoundsRequired { .. }));
    }

    #[rstest]
    #[case::inside(Bounds::new(10.0, 10.0, 20.0, 20.0), true)]
    #[case::same_rect(Bounds::new(0.0, 0.0, 100.0, 100.0), true)]
    #[case::overhangs_right(Bounds::new(90.0, 10.0, 20.0, 20.0), false)]
    #[case::overhangs_top(Bounds::new(10.0, -5.0, 20.0, 20.0), false)]
    #[case::disjoint(Bounds::new(200.0, 200.0, 5.0, 5.0), false)]
    fn edit_bounds_must_be_contained(#[case] edit: Bounds, #[case] admitted: bool) {
        let active = selection(0.0, 0.0, 100.0, 100.0);
        let result = check_edit(SelectionState::SelectionActive(&active), true, Some(&edit));
        assert_eq!(result.is_ok(), admitted);
        if let Err(err) = result {
            let data = err.remediation();
            assert_eq!(data["edit_bounds"]["x"], edit.x);
            assert_eq!(data["selection"]["width"], 100.0);
        }
    }

    #[test]
    fn report_replaces_and_clear_resets() {
        let view_id = ViewId::new("v1").expect("view id");
        let mut view = View::new(view_id, "http://localhost", ViewMeta::default(), 0);
        assert_eq!(SelectionState::of(&view), SelectionState::NoSelection);

        let first = SelectionBounds { rect: Bounds::new(0.0, 0.0, 1.0, 1.0), view_box: None };
        report_selection(&mut view, first, None, 5);
        let second = SelectionBounds { rect: Bounds::new(5.0, 5.0, 2.0, 2.0), view_box: None };
        report_selection(&mut view, second, Some("AAAA".into()), 6);

        let SelectionState::SelectionActive(active) = SelectionState::of(&view) else {
            panic!("selection should be active");
        };
        assert_eq!(active.bounds, second);
        assert_eq!(active.updated_at, 6);

        let cleared = clear_selection(&mut view).expect("previous selection");
        assert_eq!(cleared.bounds, second);
        assert!(!SelectionState::of(&view).is_active());
        assert!(clear_selection(&mut view).is_none());
    }
}
