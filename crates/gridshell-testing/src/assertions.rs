//! Custom assertions for grid and persistence validation.

use gridshell_core::MemoryStore;
use gridshell_types::{GridSpec, WidgetInstance, WorkspaceId};

/// Assert that every instance fits the grid and that no two occupied
/// rectangles overlap.
pub fn assert_occupancy_invariant(grid: &GridSpec, instances: &[WidgetInstance]) {
    for instance in instances {
        assert!(
            instance.rect().fits(grid),
            "widget {} at cell {} with size {}x{} does not fit a {}x{} grid",
            instance.id,
            instance.cell,
            instance.size.width,
            instance.size.height,
            grid.rows,
            grid.cols,
        );
    }
    for (i, a) in instances.iter().enumerate() {
        for b in &instances[i + 1..] {
            assert!(
                !a.rect().intersects(&b.rect(), grid),
                "widgets {} and {} overlap (cells {} and {})",
                a.id,
                b.id,
                a.cell,
                b.cell,
            );
        }
    }
}

/// Assert that the store holds a workspace with the given widget count.
pub fn assert_persisted_widget_count(store: &MemoryStore, id: &WorkspaceId, expected: usize) {
    let workspace = store
        .workspace(id)
        .unwrap_or_else(|| panic!("workspace {id} was never persisted"));
    assert_eq!(
        workspace.widgets.len(),
        expected,
        "persisted widget count for workspace {id}",
    );
}
