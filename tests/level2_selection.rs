//! Level 2: Selection Tests
//!
//! Tests click/ctrl-click/shift-click semantics, the last-clicked anchor,
//! the current-group context, and selection reveal behavior.

mod common;

use common::harness::OutlinerHarness;
use slint_outliner::NodeId;

// ============================================================================
// Plain click - Replacement
// ============================================================================

#[test]
fn test_click_selects_single_row() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.a);

    assert!(harness.selection.contains(ids.a));
    assert_eq!(harness.selection.len(), 1);
    assert!(harness.outliner.is_row_selected(ids.a));
}

#[test]
fn test_click_replaces_previous_selection() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.a);
    harness.click(ids.c);

    assert!(!harness.selection.contains(ids.a));
    assert!(harness.selection.contains(ids.c));
    assert!(!harness.outliner.is_row_selected(ids.a));
    assert!(harness.outliner.is_row_selected(ids.c));
}

#[test]
fn test_click_sets_anchor() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.a);
    assert_eq!(harness.outliner.last_clicked(), Some(ids.a));

    harness.click(ids.b);
    assert_eq!(harness.outliner.last_clicked(), Some(ids.b));
    // The anchor marker moves with the click.
    let rows = harness.outliner.visible_rows();
    let anchor_labels: Vec<&str> = rows
        .iter()
        .filter(|r| r.anchor)
        .map(|r| r.label.as_str())
        .collect();
    assert_eq!(anchor_labels, vec!["B"]);
}

#[test]
fn test_click_on_unknown_row_is_ignored() {
    let (harness, _) = OutlinerHarness::with_sample_assembly();
    harness.click(NodeId(999));
    assert!(harness.selection.is_empty());
    assert_eq!(harness.outliner.last_clicked(), None);
}

// ============================================================================
// Ctrl-click - Additive toggle
// ============================================================================

#[test]
fn test_ctrl_click_adds_to_selection() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.a);
    harness.ctrl_click(ids.c);

    assert!(harness.selection.contains(ids.a));
    assert!(harness.selection.contains(ids.c));
    assert_eq!(harness.selection.len(), 2);
}

#[test]
fn test_ctrl_click_toggles_off_selected_row() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.a);
    harness.ctrl_click(ids.b);
    harness.ctrl_click(ids.a);

    assert!(!harness.selection.contains(ids.a));
    assert!(harness.selection.contains(ids.b));
    assert!(!harness.outliner.is_row_selected(ids.a));
}

// ============================================================================
// Shift-click - Range selection
// ============================================================================

#[test]
fn test_shift_click_selects_range_from_anchor() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.a);
    harness.shift_click(ids.c);

    // Document order between A and C: A, B, G2, C.
    assert_eq!(
        harness.selection.selected_nodes(),
        {
            let mut expected = vec![ids.a, ids.b, ids.g2, ids.c];
            expected.sort();
            expected
        }
    );
}

#[test]
fn test_shift_click_range_replaces_unrelated_selection() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.m);
    harness.click(ids.a);
    harness.shift_click(ids.b);

    // Exactly the range, regardless of what was selected before.
    assert_eq!(harness.selection.selected_nodes(), vec![ids.a, ids.b]);
    assert!(!harness.selection.contains(ids.m));
}

#[test]
fn test_shift_click_upward_range() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.c);
    harness.shift_click(ids.b);

    let mut expected = vec![ids.b, ids.g2, ids.c];
    expected.sort();
    assert_eq!(harness.selection.selected_nodes(), expected);
}

#[test]
fn test_shift_click_without_anchor_selects_nothing() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.shift_click(ids.b);
    assert!(harness.selection.is_empty());
}

#[test]
fn test_anchorless_shift_click_seeds_anchor_for_next_range() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.shift_click(ids.a);
    assert!(harness.selection.is_empty());
    assert_eq!(harness.outliner.last_clicked(), Some(ids.a));

    harness.shift_click(ids.b);
    assert_eq!(harness.selection.selected_nodes(), vec![ids.a, ids.b]);
}

// ============================================================================
// Current group context
// ============================================================================

#[test]
fn test_click_on_group_makes_it_current() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.g1);
    assert_eq!(harness.selection.current(), Some(ids.g1));
}

#[test]
fn test_click_on_model_makes_parent_current() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.c);
    assert_eq!(harness.selection.current(), Some(ids.g2));
}

// ============================================================================
// Ghost selection and diff events
// ============================================================================

#[test]
fn test_clear_leaves_no_selected_rows() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.a);
    harness.ctrl_click(ids.c);
    harness.selection.select(&[], false);

    assert!(harness.selection.is_empty());
    assert!(harness.outliner.visible_rows().iter().all(|r| !r.selected));
}

#[test]
fn test_deselection_clears_anchor() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.a);
    assert_eq!(harness.outliner.last_clicked(), Some(ids.a));

    harness.selection.select(&[], false);
    assert_eq!(harness.outliner.last_clicked(), None);
}

#[test]
fn test_each_click_publishes_one_diff() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.click(ids.a);
    harness.ctrl_click(ids.b);
    assert_eq!(harness.tracker.selection_count(), 2);

    // Re-clicking the sole selected row with the same result is a no-op
    // for the additive=false path only when the set is unchanged.
    harness.click(ids.b); // replaces {a,b} with {b}: effective
    assert_eq!(harness.tracker.selection_count(), 3);
    harness.click(ids.b); // selection already exactly {b}: no event
    assert_eq!(harness.tracker.selection_count(), 3);
}

// ============================================================================
// Selection reveal - Ancestor expansion and scroll
// ============================================================================

#[test]
fn test_selecting_hidden_row_expands_collapsed_ancestors() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.outliner.toggle_expanded(ids.g1);
    assert!(!harness.outliner.is_expanded(ids.g1));

    // API-level selection, e.g. from a viewport pick.
    harness.selection.select(&[ids.a], false);

    assert!(harness.outliner.is_expanded(ids.g1));
    assert_eq!(harness.outliner.take_scroll_request(), Some(ids.a));
    assert!(harness.outliner.row_index_of(ids.a).is_some());
}

#[test]
fn test_reveal_expands_every_collapsed_ancestor() {
    let harness = OutlinerHarness::new();
    let (outer, inner, leaf) = harness
        .history
        .run_atomically("Nest", |doc| {
            let root = doc.root();
            let outer = doc.add_group(root, "Outer")?;
            let inner = doc.add_group(outer, "Inner")?;
            let leaf = doc.add_model(inner, "Leaf", 1)?;
            Ok((outer, inner, leaf))
        })
        .unwrap();
    harness.outliner.toggle_expanded(outer);
    harness.outliner.toggle_expanded(inner);

    harness.selection.select(&[leaf], false);

    // Both ancestors expand, not just the nearest collapsed one.
    assert!(harness.outliner.is_expanded(outer));
    assert!(harness.outliner.is_expanded(inner));
}
