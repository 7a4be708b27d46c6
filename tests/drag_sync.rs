use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use tileboard::arrange::{Arrangement, DropOutcome, TaskBoard, TileGrid};
use tileboard::io::board_io::init_board;
use tileboard::io::store::{BoardData, FileStore, Store};
use tileboard::model::{Collection, GroupId, ItemId, Task, TaskFields};
use tileboard::sync::worker::{SyncWorker, dispatch};
use tileboard::sync::{ORDER_FAILED, Resolution, STATUS_FAILED, SyncCall, SyncError, SyncRequest, SyncResponse};
use tileboard::tui::app::task_collection;

// ---------------------------------------------------------------------------
// Scripted store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Script {
    order: Vec<ItemId>,
    statuses: HashMap<ItemId, GroupId>,
    /// Consumed one per mutating call; an empty queue means success
    outcomes: VecDeque<Result<(), SyncError>>,
    saved_orders: Vec<Vec<ItemId>>,
}

/// In-memory store whose answers are queued up by the test
#[derive(Clone, Default)]
struct ScriptedStore(Arc<Mutex<Script>>);

impl ScriptedStore {
    fn with_order(raw: &[u64]) -> Self {
        let store = ScriptedStore::default();
        store.0.lock().unwrap().order = ids(raw);
        store
    }

    fn then(&self, outcome: Result<(), SyncError>) -> &Self {
        self.0.lock().unwrap().outcomes.push_back(outcome);
        self
    }

    fn next_outcome(&self) -> Result<(), SyncError> {
        self.0.lock().unwrap().outcomes.pop_front().unwrap_or(Ok(()))
    }

    fn saved_orders(&self) -> Vec<Vec<ItemId>> {
        self.0.lock().unwrap().saved_orders.clone()
    }

    fn status(&self, id: ItemId) -> Option<GroupId> {
        self.0.lock().unwrap().statuses.get(&id).cloned()
    }
}

impl Store for ScriptedStore {
    fn load(&mut self) -> Result<BoardData, SyncError> {
        Ok(BoardData {
            order: self.0.lock().unwrap().order.clone(),
            tasks: Vec::new(),
        })
    }

    fn get_order(&mut self) -> Result<Vec<ItemId>, SyncError> {
        Ok(self.0.lock().unwrap().order.clone())
    }

    fn set_order(&mut self, order: &[ItemId]) -> Result<(), SyncError> {
        self.next_outcome()?;
        let mut script = self.0.lock().unwrap();
        script.order = order.to_vec();
        script.saved_orders.push(order.to_vec());
        Ok(())
    }

    fn set_status(&mut self, id: ItemId, group: &GroupId) -> Result<(), SyncError> {
        self.next_outcome()?;
        self.0.lock().unwrap().statuses.insert(id, group.clone());
        Ok(())
    }

    fn delete_item(&mut self, _id: ItemId) -> Result<(), SyncError> {
        self.next_outcome()
    }

    fn edit_item(&mut self, _id: ItemId, _fields: &TaskFields) -> Result<Task, SyncError> {
        Err(SyncError::rejected("Task not found"))
    }

    fn create_item(&mut self, _fields: &TaskFields) -> Result<Task, SyncError> {
        Err(SyncError::rejected("Task not found"))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ids(raw: &[u64]) -> Vec<ItemId> {
    raw.iter().copied().map(ItemId).collect()
}

fn grid(raw: &[u64]) -> TileGrid {
    Arrangement::new(Collection::flat(ids(raw)).unwrap())
}

fn kanban() -> TaskBoard {
    Arrangement::new(
        Collection::bucketed(
            [GroupId::new("todo"), GroupId::new("doing")],
            [(ItemId(10), GroupId::new("todo")), (ItemId(11), GroupId::new("todo"))],
        )
        .unwrap(),
    )
}

fn drag_tile(grid: &mut TileGrid, item: u64, onto: u64) -> DropOutcome {
    grid.pick_up(ItemId(item));
    grid.enter(ItemId(onto));
    grid.drop()
}

fn drag_card(board: &mut TaskBoard, item: u64, into: &str) -> DropOutcome {
    board.pick_up(ItemId(item));
    board.enter(GroupId::new(into));
    board.drop()
}

fn submitted(outcome: DropOutcome) -> SyncRequest {
    match outcome {
        DropOutcome::Submitted(request) => request,
        other => panic!("expected a submitted request, got {:?}", other),
    }
}

/// Run a request against `store` on this thread
fn round_trip(store: &mut dyn Store, request: &SyncRequest) -> SyncResponse {
    SyncResponse {
        ticket: request.ticket,
        result: dispatch(store, request.call.clone()),
    }
}

fn counters(board: &TaskBoard) -> (usize, usize) {
    let tree = board.tree();
    (
        tree.counter(&GroupId::new("todo")).unwrap(),
        tree.counter(&GroupId::new("doing")).unwrap(),
    )
}

// ---------------------------------------------------------------------------
// Tile grid
// ---------------------------------------------------------------------------

#[test]
fn swap_is_sent_and_reverted_on_rejection() {
    let mut store = ScriptedStore::with_order(&[1, 2, 3, 4]);
    store.then(Err(SyncError::Rejected { reason: None }));
    let mut grid = grid(&[1, 2, 3, 4]);
    let before = grid.tree().clone();

    let request = submitted(drag_tile(&mut grid, 3, 1));
    assert_eq!(request.call, SyncCall::SetOrder(ids(&[3, 2, 1, 4])));
    assert_eq!(grid.collection().order(), ids(&[3, 2, 1, 4]));
    assert_eq!(grid.tree().order(), ids(&[3, 2, 1, 4]));

    let response = round_trip(&mut store, &request);
    let resolution = grid.resolve(response);

    assert!(matches!(resolution, Resolution::RolledBack { .. }));
    assert_eq!(grid.collection().order(), ids(&[1, 2, 3, 4]));
    assert_eq!(grid.tree(), &before);
    assert_eq!(grid.notice(), Some(ORDER_FAILED));
    assert!(store.saved_orders().is_empty());
}

#[test]
fn confirmed_swap_is_persisted() {
    let mut store = ScriptedStore::with_order(&[1, 2, 3, 4]);
    let mut grid = grid(&[1, 2, 3, 4]);

    let request = submitted(drag_tile(&mut grid, 3, 1));
    let resolution = grid.resolve(round_trip(&mut store, &request));

    assert_eq!(resolution, Resolution::Confirmed);
    assert_eq!(grid.collection().order(), ids(&[3, 2, 1, 4]));
    assert_eq!(store.saved_orders(), vec![ids(&[3, 2, 1, 4])]);
    assert_eq!(grid.in_flight(), 0);
}

#[test]
fn swapping_back_restores_the_original_order() {
    let mut store = ScriptedStore::with_order(&[1, 2, 3, 4]);
    let mut grid = grid(&[1, 2, 3, 4]);

    for _ in 0..2 {
        let request = submitted(drag_tile(&mut grid, 2, 4));
        grid.resolve(round_trip(&mut store, &request));
    }

    assert_eq!(grid.collection().order(), ids(&[1, 2, 3, 4]));
    assert_eq!(store.saved_orders().last(), Some(&ids(&[1, 2, 3, 4])));
}

#[test]
fn dropping_onto_itself_sends_nothing() {
    let mut grid = grid(&[1, 2, 3, 4]);
    let revision = grid.collection().revision();

    assert_eq!(drag_tile(&mut grid, 2, 2), DropOutcome::Unchanged);
    assert_eq!(grid.collection().revision(), revision);
    assert_eq!(grid.in_flight(), 0);
}

#[test]
fn late_failure_does_not_clobber_newer_state() {
    let mut store = ScriptedStore::with_order(&[1, 2, 3, 4]);
    let mut grid = grid(&[1, 2, 3, 4]);

    let first = submitted(drag_tile(&mut grid, 3, 1));
    let second = submitted(drag_tile(&mut grid, 2, 4));
    assert_eq!(grid.in_flight(), 2);
    assert_eq!(grid.collection().order(), ids(&[3, 4, 1, 2]));

    // The second call lands first; the first fails afterwards
    let confirmed = grid.resolve(round_trip(&mut store, &second));
    assert_eq!(confirmed, Resolution::Confirmed);
    store.then(Err(SyncError::Unreachable("connection reset".into())));
    let late = grid.resolve(round_trip(&mut store, &first));

    assert!(matches!(late, Resolution::Stale(_)));
    assert_eq!(grid.collection().order(), ids(&[3, 4, 1, 2]));
    assert_eq!(grid.tree().order(), ids(&[3, 4, 1, 2]));
    assert_eq!(grid.notice(), None);
}

// ---------------------------------------------------------------------------
// Task board
// ---------------------------------------------------------------------------

#[test]
fn move_between_groups_keeps_counts() {
    let mut store = ScriptedStore::default();
    let mut board = kanban();

    let request = submitted(drag_card(&mut board, 10, "doing"));
    assert_eq!(
        request.call,
        SyncCall::SetStatus {
            id: ItemId(10),
            group: GroupId::new("doing"),
        }
    );
    assert_eq!(board.collection().sequence(&GroupId::new("todo")), &ids(&[11])[..]);
    assert_eq!(board.collection().sequence(&GroupId::new("doing")), &ids(&[10])[..]);
    assert_eq!(counters(&board), (1, 1));

    let resolution = board.resolve(round_trip(&mut store, &request));
    assert_eq!(resolution, Resolution::Confirmed);
    assert_eq!(counters(&board), (1, 1));
    assert_eq!(store.status(ItemId(10)), Some(GroupId::new("doing")));
}

#[test]
fn rejected_move_reverts_with_the_store_reason() {
    let mut store = ScriptedStore::default();
    store.then(Err(SyncError::rejected("Moving from todo to doing is not permitted")));
    let mut board = kanban();
    let before = board.tree().clone();

    let request = submitted(drag_card(&mut board, 10, "doing"));
    let resolution = board.resolve(round_trip(&mut store, &request));

    assert!(matches!(resolution, Resolution::RolledBack { .. }));
    assert_eq!(board.collection().sequence(&GroupId::new("todo")), &ids(&[10, 11])[..]);
    assert!(board.collection().sequence(&GroupId::new("doing")).is_empty());
    assert_eq!(counters(&board), (2, 0));
    assert_eq!(board.tree(), &before);
    assert_eq!(
        board.notice(),
        Some("Moving from todo to doing is not permitted")
    );
}

#[test]
fn unreachable_store_uses_the_generic_notice() {
    let mut store = ScriptedStore::default();
    store.then(Err(SyncError::Unreachable("timed out".into())));
    let mut board = kanban();

    let request = submitted(drag_card(&mut board, 11, "doing"));
    board.resolve(round_trip(&mut store, &request));

    assert_eq!(board.notice(), Some(STATUS_FAILED));
    assert_eq!(counters(&board), (2, 0));
}

#[test]
fn dropping_into_own_group_sends_nothing() {
    let mut board = kanban();
    assert_eq!(drag_card(&mut board, 11, "todo"), DropOutcome::Unchanged);
    assert_eq!(board.in_flight(), 0);
    assert_eq!(counters(&board), (2, 0));
}

// ---------------------------------------------------------------------------
// Through the background worker
// ---------------------------------------------------------------------------

#[test]
fn worker_round_trip_with_scripted_store() {
    let store = ScriptedStore::with_order(&[1, 2, 3, 4]);
    let worker = SyncWorker::start(Box::new(store.clone()), Duration::ZERO).unwrap();
    let mut grid = grid(&[1, 2, 3, 4]);

    let request = submitted(drag_tile(&mut grid, 1, 4));
    worker.submit(request).unwrap();
    let response = worker.wait(Duration::from_secs(5)).expect("worker answered");

    assert_eq!(grid.resolve(response), Resolution::Confirmed);
    assert_eq!(store.saved_orders(), vec![ids(&[4, 2, 3, 1])]);
}

#[test]
fn worker_with_file_store_rejects_forbidden_transition() {
    let tmp = TempDir::new().unwrap();
    let mut board = init_board(tmp.path(), "study", false).unwrap();
    if let Some(done) = board.config.groups.iter_mut().find(|g| g.id.as_str() == "done") {
        done.accepts_from = Some(vec![GroupId::new("in_progress")]);
    }
    let mut store = FileStore::new(&board.dir, board.config.clone());
    let task = store
        .create_item(&TaskFields {
            course: "CS101".into(),
            title: "Lab 2".into(),
            ..Default::default()
        })
        .unwrap();

    let data = store.load().unwrap();
    let (collection, _) = task_collection(&board.config, &data.tasks).unwrap();
    let mut cards: TaskBoard = Arrangement::new(collection);
    let worker = SyncWorker::start(Box::new(store.clone()), Duration::ZERO).unwrap();

    let request = submitted(drag_card(&mut cards, task.id.0, "done"));
    worker.submit(request).unwrap();
    let response = worker.wait(Duration::from_secs(5)).expect("worker answered");
    let resolution = cards.resolve(response);

    assert!(matches!(resolution, Resolution::RolledBack { .. }));
    assert_eq!(
        cards.notice(),
        Some("Moving from todo to done is not permitted")
    );
    assert_eq!(cards.collection().group_of(task.id), Some(&GroupId::new("todo")));
    assert_eq!(store.load().unwrap().tasks[0].status, GroupId::new("todo"));
}

#[test]
fn fetched_order_is_applied_when_nothing_moved() {
    let mut store = ScriptedStore::with_order(&[4, 3, 2, 1]);
    let mut grid = grid(&[1, 2, 3, 4]);

    let request = grid.request_order();
    let resolution = grid.resolve(round_trip(&mut store, &request));

    assert_eq!(resolution, Resolution::Fetched(ids(&[4, 3, 2, 1])));
    assert_eq!(grid.collection().order(), ids(&[4, 3, 2, 1]));
    assert_eq!(grid.tree().order(), ids(&[4, 3, 2, 1]));
}
