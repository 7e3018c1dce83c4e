//! Level 1: Initialization Tests
//!
//! Tests the initial tree walk, row projection, and basic wiring.

mod common;

use common::harness::OutlinerHarness;
use slint::Model;
use slint_outliner::{NodeId, Outliner, RowData};

#[test]
fn test_empty_document_has_no_rows() {
    let harness = OutlinerHarness::new();
    assert!(harness.outliner.visible_rows().is_empty());
    harness.assert_mirrors();
}

#[test]
fn test_sample_assembly_rows_in_document_order() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    let rows = harness.outliner.visible_rows();
    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["G1", "A", "B", "G2", "C", "M"]);
    assert_eq!(rows[0].node_id, ids.g1.0);
    assert_eq!(rows[0].depth, 0);
    assert_eq!(rows[1].depth, 1);
    harness.assert_mirrors();
}

#[test]
fn test_rows_tag_groups_and_models() {
    let (harness, _) = OutlinerHarness::with_sample_assembly();
    let rows = harness.outliner.visible_rows();
    assert!(rows[0].is_group, "G1 row should be a group");
    assert!(rows[0].expanded, "groups start expanded");
    assert!(!rows[1].is_group, "A row should be a model");
}

#[test]
fn test_outliner_over_prebuilt_document_walks_existing_nodes() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    // A second panel over the same document builds from the existing tree.
    let second = Outliner::new(
        harness.document.clone(),
        harness.selection.clone(),
        harness.history.clone(),
        harness.bus.clone(),
    );
    assert_eq!(second.view_children(ids.g1), vec![ids.a, ids.b]);
    assert_eq!(second.visible_rows().len(), 6);
    second.dispose();
}

#[test]
fn test_sync_rows_fills_model() {
    let (harness, _) = OutlinerHarness::with_sample_assembly();
    let model = slint::VecModel::<RowData>::from(Vec::new());
    harness.outliner.sync_rows(&model);
    assert_eq!(model.row_count(), 6);
    assert_eq!(
        model.row_data(0).map(|r| r.label),
        Some(slint::SharedString::from("G1"))
    );
}

#[test]
fn test_row_index_of() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    assert_eq!(harness.outliner.row_index_of(ids.g1), Some(0));
    assert_eq!(harness.outliner.row_index_of(ids.c), Some(4));
    assert_eq!(harness.outliner.row_index_of(NodeId(999)), None);
}

#[test]
fn test_collapse_hides_subtree_rows() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.outliner.toggle_expanded(ids.g1);
    assert!(!harness.outliner.is_expanded(ids.g1));

    let labels: Vec<String> = harness
        .outliner
        .visible_rows()
        .iter()
        .map(|r| r.label.to_string())
        .collect();
    assert_eq!(labels, vec!["G1", "G2", "C", "M"]);
}

#[test]
fn test_toggle_expanded_on_model_is_noop() {
    let (harness, ids) = OutlinerHarness::with_sample_assembly();
    harness.outliner.toggle_expanded(ids.a);
    assert_eq!(harness.outliner.visible_rows().len(), 6);
}
