//! End-to-end tests: a [`GraphModel`] edited through transactions and
//! replayed through an [`UndoManager`].
//!
//! ```bash
//! cargo test -p cellflow-core --test integration
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use rstest::rstest;

use cellflow_core::change::{Change, Model, UndoableChange};
use cellflow_core::config::{EngineConfig, load_config};
use cellflow_core::edit::{Edit, HistoryError, UndoManager};
use cellflow_core::event::{EventKind, listener};
use cellflow_core::graph::{CellId, CellValue, Geometry, GraphModel, ModelError};
use cellflow_core::identity::Identified;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A model with `count` labelled vertices under the default layer.
fn model_with_vertices(count: usize) -> (GraphModel, Vec<CellId>) {
    let mut model = GraphModel::new();
    let layer = model.default_parent().unwrap();
    let cells = (0..count)
        .map(|i| {
            let cell = model.create_vertex(
                CellValue::text(format!("v{i}")),
                Geometry::new(0.0, i as f64 * 40.0, 80.0, 30.0),
                None,
            );
            model.add(layer, cell, None).unwrap();
            cell
        })
        .collect();
    (model, cells)
}

fn record_names(model: &GraphModel) -> Rc<RefCell<Vec<&'static str>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    model
        .events()
        .listen(None, move |_, event| sink.borrow_mut().push(event.name()));
    log
}

// ============================================================================
// Edit replay
// ============================================================================

#[rstest]
#[case::empty(0)]
#[case::single(1)]
#[case::several(5)]
fn edit_undo_and_redo_restore_state(#[case] count: usize) {
    init_logger();
    let (mut model, cells) = model_with_vertices(5);
    let targets = &cells[..count];

    let recorded = model
        .transaction(|m| {
            for cell in targets {
                m.set_style(*cell, Some("fillColor=red"))?;
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(recorded.is_some(), count > 0);
    let mut edit = recorded.unwrap_or_else(|| Edit::new(Some(model.identity()), true));
    assert_eq!(edit.len(), count);

    edit.undo(&mut model).unwrap();
    assert!(cells.iter().all(|cell| model.style(*cell).is_none()));

    edit.redo(&mut model).unwrap();
    assert!(targets.iter().all(|cell| model.style(*cell) == Some("fillColor=red")));
    assert!(cells[count..].iter().all(|cell| model.style(*cell).is_none()));

    edit.undo(&mut model).unwrap();
    assert!(cells.iter().all(|cell| model.style(*cell).is_none()));
}

#[test]
fn undo_replays_forward_with_bracketing_events() {
    init_logger();
    let (mut model, cells) = model_with_vertices(2);
    let mut history = UndoManager::default();
    let edit = model
        .transaction(|m| {
            m.set_visible(cells[0], false)?;
            m.set_value(cells[1], Some(CellValue::text("renamed")))?;
            Ok(())
        })
        .unwrap()
        .unwrap();
    history.record(edit);

    let log = record_names(&model);
    let replayed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&replayed);
    model.events().listen(Some(EventKind::Executed), move |_, event| {
        let change = event.object::<Change<GraphModel>>("change");
        sink.borrow_mut().push(change.map(|c| c.description().to_owned()));
    });

    history.undo(&mut model).unwrap();
    assert_eq!(
        *log.borrow(),
        ["startEdit", "executed", "executed", "endEdit", "change", "notify"]
    );
    assert_eq!(
        *replayed.borrow(),
        [
            Some("Change visibility".to_owned()),
            Some("Change value".to_owned())
        ]
    );
    assert!(model.is_visible(cells[0]));
    assert_eq!(model.value(cells[1]).and_then(CellValue::as_text), Some("v1"));
}

// ============================================================================
// History workflows
// ============================================================================

#[test]
fn build_connect_move_then_unwind() {
    init_logger();
    let mut model = GraphModel::new();
    let mut history = UndoManager::default();
    let layer = model.default_parent().unwrap();

    let a = model.create_vertex(CellValue::text("A"), Geometry::new(0.0, 0.0, 80.0, 30.0), None);
    let b = model.create_vertex(CellValue::text("B"), Geometry::new(200.0, 0.0, 80.0, 30.0), None);
    let edge = model.create_edge(None, Some("endArrow=classic"));

    let built = model
        .transaction(|m| {
            m.add(layer, a, None)?;
            m.add(layer, b, None)?;
            m.add(layer, edge, None)?;
            m.set_terminals(edge, Some(a), Some(b))?;
            Ok(())
        })
        .unwrap()
        .unwrap();
    history.record(built);

    let moved = model.set_geometry(a, Some(Geometry::new(0.0, 100.0, 80.0, 30.0))).unwrap();
    history.record(moved.unwrap());
    assert_eq!(history.undo_count(), 2);

    history.undo(&mut model).unwrap();
    assert_eq!(model.geometry(a), Some(Geometry::new(0.0, 0.0, 80.0, 30.0)));
    assert!(model.contains(edge));

    history.undo(&mut model).unwrap();
    assert!(!model.contains(a));
    assert!(!model.contains(edge));
    assert!(model.edges(a).is_empty());
    assert!(matches!(history.undo(&mut model), Err(HistoryError::NothingToUndo)));

    history.redo(&mut model).unwrap();
    assert_eq!(model.edges(a), [edge]);
    assert_eq!(model.terminal(edge, false), Some(b));
    assert_eq!(model.children(layer), [a, b, edge]);
}

#[test]
fn removing_a_group_disconnects_inner_edges() {
    init_logger();
    let (mut model, cells) = model_with_vertices(2);
    let layer = model.default_parent().unwrap();
    let group = model.create_vertex(CellValue::text("group"), Geometry::default(), None);
    let edge = model.create_edge(None, None);
    model
        .transaction(|m| {
            m.add(layer, group, None)?;
            m.add(group, edge, None)?;
            m.set_terminals(edge, Some(cells[0]), Some(cells[1]))?;
            Ok(())
        })
        .unwrap();

    let mut removal = model.remove(group).unwrap().unwrap();
    assert!(model.edges(cells[0]).is_empty());
    assert!(model.edges(cells[1]).is_empty());
    assert_eq!(model.terminal(edge, true), Some(cells[0]));

    removal.undo(&mut model).unwrap();
    assert_eq!(model.edges(cells[0]), [edge]);
    assert_eq!(model.edges(cells[1]), [edge]);
    assert_eq!(model.index_of(layer, group), Some(2));
}

#[test]
fn rejected_reparent_leaves_history_untouched() {
    init_logger();
    let (mut model, cells) = model_with_vertices(1);
    let mut history = UndoManager::<GraphModel>::default();
    let inner = model.create_vertex(CellValue::text("inner"), Geometry::default(), None);
    history.record(model.add(cells[0], inner, None).unwrap().unwrap());

    let err = model.add(inner, cells[0], Some(0)).unwrap_err();
    assert_eq!(err, ModelError::InvalidParent { child: cells[0], parent: inner });
    assert_eq!(history.len(), 1);
    assert_eq!(model.parent(inner), Some(cells[0]));
}

#[test]
fn save_point_follows_undo_and_redo() {
    init_logger();
    let (mut model, cells) = model_with_vertices(1);
    let mut history = UndoManager::default();
    history.mark_saved();

    history.record(model.set_style(cells[0], Some("bold")).unwrap().unwrap());
    assert!(history.has_unsaved_changes());
    history.undo(&mut model).unwrap();
    assert!(!history.has_unsaved_changes());
    history.redo(&mut model).unwrap();
    history.mark_saved();
    history.record(model.set_style(cells[0], Some("italic")).unwrap().unwrap());
    history.undo(&mut model).unwrap();
    assert!(!history.has_unsaved_changes());
    assert_eq!(model.style(cells[0]), Some("bold"));
}

// ============================================================================
// Custom changes
// ============================================================================

/// Swaps the labels of two vertices.
#[derive(Debug)]
struct SwapLabels {
    a: CellId,
    b: CellId,
}

impl SwapLabels {
    fn swap(&self, model: &mut GraphModel) -> Result<(), ModelError> {
        let a = model.value(self.a).cloned();
        let b = model.value(self.b).cloned();
        model.value_for_cell_changed(&self.a, b)?;
        model.value_for_cell_changed(&self.b, a)?;
        Ok(())
    }
}

impl UndoableChange<GraphModel> for SwapLabels {
    fn undo(&mut self, model: &mut GraphModel) -> Result<(), ModelError> {
        self.swap(model)
    }

    fn redo(&mut self, model: &mut GraphModel) -> Result<(), ModelError> {
        self.swap(model)
    }

    fn description(&self) -> &str {
        "Swap labels"
    }
}

#[test]
fn custom_change_goes_through_history() {
    init_logger();
    let (mut model, cells) = model_with_vertices(2);
    let mut history = UndoManager::default();
    let label = |model: &GraphModel, cell: CellId| model.value(cell).and_then(CellValue::as_text).map(str::to_owned);

    let swap: Change<GraphModel> = Change::Custom(Box::new(SwapLabels { a: cells[0], b: cells[1] }));
    let edit = model.execute(swap).unwrap().unwrap();
    assert_eq!(edit.changes()[0].description(), "Swap labels");
    assert!(edit.affected_cells().is_empty());
    history.record(edit);
    assert_eq!(label(&model, cells[0]).as_deref(), Some("v1"));

    history.undo(&mut model).unwrap();
    assert_eq!(label(&model, cells[0]).as_deref(), Some("v0"));
    history.redo(&mut model).unwrap();
    assert_eq!(label(&model, cells[1]).as_deref(), Some("v0"));
}

// ============================================================================
// Listeners
// ============================================================================

#[test]
fn listener_registered_twice_is_fully_removed() {
    init_logger();
    let (mut model, cells) = model_with_vertices(1);
    let hits = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&hits);
    let handle = listener(move |_, _| *counter.borrow_mut() += 1);

    model.events().add_listener(Some(EventKind::Change), Rc::clone(&handle));
    model.events().listen(None, |_, _| {});
    model.events().add_listener(Some(EventKind::Notify), Rc::clone(&handle));
    assert_eq!(model.events().remove_listener(&handle), 2);

    model.set_style(cells[0], Some("bold")).unwrap();
    assert_eq!(*hits.borrow(), 0);
    assert_eq!(model.events().listener_count(), 1);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn config_file_bounds_history() {
    init_logger();
    let path = std::env::temp_dir().join(format!("cellflow-integration-{}.toml", std::process::id()));
    std::fs::write(&path, "[history]\nmax_undo = 2\n").unwrap();
    let config = load_config(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.history.max_undo, 2);
    assert!(config.events.enabled);

    let (mut model, cells) = model_with_vertices(1);
    let mut history = UndoManager::from_config(&config);
    for style in ["a", "b", "c"] {
        history.record(model.set_style(cells[0], Some(style)).unwrap().unwrap());
    }
    assert_eq!(history.undo_count(), 2);
    history.undo(&mut model).unwrap();
    history.undo(&mut model).unwrap();
    assert_eq!(model.style(cells[0]), Some("a"));
    assert!(!history.can_undo());
}

#[test]
fn default_config_matches_defaults() {
    let config = EngineConfig::default();
    let history = UndoManager::<GraphModel>::from_config(&config);
    assert_eq!(history.max_undo(), 100);
    assert!(GraphModel::from_config(&config).events().is_events_enabled());
}
