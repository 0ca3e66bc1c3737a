//! End-to-end flows through an assembled `ShellContext` backed by an
//! in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use gridshell_core::MemoryStore;
use gridshell_shell::{Gesture, ShellConfig, ShellContext, WidgetChrome};
use gridshell_testing::assertions::{assert_occupancy_invariant, assert_persisted_widget_count};
use gridshell_testing::fixtures::{instance_at, sample_catalog, seeded_store, workspace_with};
use gridshell_types::{Error, GridSpec, UiElement, WorkspaceId};

fn boot(store: Arc<MemoryStore>) -> ShellContext {
    ShellContext::new(&ShellConfig::default(), sample_catalog(), store)
}

#[test]
fn test_first_boot_creates_a_default_workspace() {
    let store = Arc::new(MemoryStore::new());
    let shell = boot(store.clone());

    let summaries = shell.workspace_summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].name, "My Workspace");
    assert_eq!(summaries[0].id, shell.current_workspace());

    shell.flush_persistence();
    assert_persisted_widget_count(&store, &shell.current_workspace(), 0);
}

#[test]
fn test_restart_restores_workspaces_and_current_pointer() {
    let catalog = sample_catalog();
    let store = seeded_store(vec![
        workspace_with("ws-100", "Home", vec![instance_at(&catalog, "clock", 0)]),
        workspace_with("ws-200", "Work", Vec::new()),
    ]);
    let shell = boot(store);

    assert_eq!(shell.current_workspace(), WorkspaceId::new("ws-100"));
    assert_eq!(shell.workspace_summaries().len(), 2);
    assert_eq!(shell.current_widgets().len(), 1);
    assert_eq!(shell.widget_views().len(), 1);
}

#[test]
fn test_drawer_click_to_add_lands_on_first_free_cell() {
    let shell = boot(Arc::new(MemoryStore::new()));
    shell.toggle_drawer();
    assert!(shell.drawer_is_open());

    // 2x1 clock claims cells 0-1, so the 2x2 weather starts at cell 2.
    let clock = shell.add_from_catalog("clock").unwrap().unwrap();
    shell.toggle_drawer();
    let weather = shell.add_from_catalog("weather").unwrap().unwrap();

    assert_eq!(clock.cell, 0);
    assert_eq!(weather.cell, 2);
    assert!(!shell.drawer_is_open());
    assert_occupancy_invariant(&GridSpec::default(), &shell.current_widgets());
}

#[test]
fn test_full_grid_keeps_drawer_open_and_adds_nothing() {
    let shell = boot(Arc::new(MemoryStore::new()));
    // Two 2x2 widgets fill rows 0-1; a third cannot fit in the last row.
    for _ in 0..2 {
        shell.add_from_catalog("weather").unwrap().unwrap();
    }
    shell.toggle_drawer();
    let placed = shell.add_from_catalog("weather").unwrap();
    assert!(placed.is_none());
    assert!(shell.drawer_is_open());
}

#[test]
fn test_widget_edits_autosave_after_debounce() {
    let store = Arc::new(MemoryStore::new());
    let shell = boot(store.clone());
    let home = shell.current_workspace();

    shell.add_from_catalog("clock").unwrap().unwrap();
    shell.flush_persistence();
    let saves_before = store.save_count();

    shell.tick(Utc::now() + Duration::seconds(5));
    shell.flush_persistence();
    assert!(store.save_count() > saves_before);
    assert_persisted_widget_count(&store, &home, 1);
}

#[test]
fn test_switching_persists_outgoing_and_rebuilds_views() {
    let store = Arc::new(MemoryStore::new());
    let shell = boot(store.clone());
    let home = shell.current_workspace();

    shell.add_from_catalog("clock").unwrap().unwrap();
    let second = shell.create_workspace(Some("Studio")).unwrap();
    assert_eq!(shell.current_workspace(), second);
    assert!(shell.current_widgets().is_empty());
    assert!(shell.widget_views().is_empty());

    shell.flush_persistence();
    assert_persisted_widget_count(&store, &home, 1);

    shell.switch_workspace(&home).unwrap();
    assert_eq!(shell.current_widgets().len(), 1);
    assert_eq!(shell.widget_views().len(), 1);
}

#[test]
fn test_deleting_populated_workspace_requires_confirmation() {
    let shell = boot(Arc::new(MemoryStore::new()));
    shell.create_workspace(Some("Scratch")).unwrap();
    shell.add_from_catalog("notes").unwrap().unwrap();

    assert!(matches!(
        shell.delete_current_workspace(false).unwrap_err(),
        Error::ConfirmationRequired { widgets: 1, .. }
    ));

    let landed = shell.delete_current_workspace(true).unwrap();
    assert_eq!(shell.current_workspace(), landed);
    assert_eq!(shell.workspace_summaries().len(), 1);

    assert!(matches!(
        shell.delete_current_workspace(true).unwrap_err(),
        Error::LastWorkspaceProtected
    ));
}

#[test]
fn test_single_instance_app_reopens_to_the_same_window() {
    let shell = boot(Arc::new(MemoryStore::new()));
    let first = shell.open_app("notebook", None).unwrap();
    shell.animation_complete(first);
    let second = shell.open_app("notebook", None).unwrap();

    assert_eq!(first, second);
    assert_eq!(shell.stacking_order().len(), 1);
}

#[test]
fn test_chrome_suppression_lifts_when_last_fullscreen_app_closes() {
    let shell = boot(Arc::new(MemoryStore::new()));
    let notebook = shell.open_app("notebook", None).unwrap();
    let player = shell.open_app("player", None).unwrap();

    let ui = shell.global_ui();
    assert!(ui.suppresses(UiElement::Dock));
    assert!(ui.suppresses(UiElement::MenuBar));

    shell.close_app(player);
    let ui = shell.global_ui();
    assert!(ui.suppresses(UiElement::Dock));

    shell.close_app(notebook);
    let ui = shell.global_ui();
    assert!(!ui.suppresses(UiElement::Dock));
    assert!(!ui.suppresses(UiElement::MenuBar));
    assert!(!ui.suppresses(UiElement::SideNav));
}

#[test]
fn test_tap_on_launcher_widget_opens_its_app() {
    let shell = boot(Arc::new(MemoryStore::new()));
    let shortcut = shell.add_from_catalog("notebook-shortcut").unwrap().unwrap();

    let view = shell.widget_view(shortcut.id).unwrap();
    assert_eq!(view.chrome, WidgetChrome::Launcher);

    let launched = shell
        .handle_gesture(shortcut.id, Gesture::Tap)
        .unwrap()
        .unwrap();
    let app = shell.app_instance(launched).unwrap();
    assert_eq!(app.app_id, "notebook");
    assert_eq!(app.source_widget, Some(shortcut.id));
}

#[test]
fn test_destroy_persists_unsaved_edits() {
    let store = Arc::new(MemoryStore::new());
    let shell = boot(store.clone());
    let home = shell.current_workspace();

    shell.add_from_catalog("clock").unwrap().unwrap();
    shell.destroy();
    assert_persisted_widget_count(&store, &home, 1);
}
