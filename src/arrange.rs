//! Wires one collection to its gesture tracker, view tree and sync client.
//!
//! A drop is handled in a single call: the mutation is applied, the view is
//! reconciled and the store call is issued before control returns. Sync
//! responses are applied the same way, so model and view never disagree
//! between two calls.

use std::fmt::Debug;
use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::gesture::{GestureTracker, Origin, Transition};
use crate::model::{Collection, GroupId, ItemId, ModelError, TaskFields};
use crate::sync::{
    ORDER_FAILED, Resolution, STATUS_FAILED, SyncCall, SyncClient, SyncRequest, SyncResponse,
    Ticket,
};
use crate::view::{Reconciler, ViewTree};

/// How a drop onto a target changes the collection and what gets persisted
pub trait DropPolicy {
    type Target: Clone + PartialEq + Debug;

    /// Notice shown when the store fails without a reason
    const FAILURE_NOTICE: &'static str;

    /// Apply the drop. `Ok(false)` means the drop is a no-op.
    fn apply(
        collection: &mut Collection,
        item: ItemId,
        target: &Self::Target,
    ) -> Result<bool, ModelError>;

    /// The one call that persists an applied drop
    fn call(collection: &Collection, item: ItemId, target: &Self::Target) -> SyncCall;

    fn highlight(reconciler: &mut Reconciler, target: &Self::Target, on: bool);
}

/// Tile grid: dropping onto another tile swaps the two; the whole order is saved
#[derive(Debug, Clone, Copy, Default)]
pub struct SwapPolicy;

impl DropPolicy for SwapPolicy {
    type Target = ItemId;
    const FAILURE_NOTICE: &'static str = ORDER_FAILED;

    fn apply(collection: &mut Collection, item: ItemId, target: &ItemId) -> Result<bool, ModelError> {
        collection.swap(item, *target)
    }

    fn call(collection: &Collection, _item: ItemId, _target: &ItemId) -> SyncCall {
        SyncCall::SetOrder(collection.order())
    }

    fn highlight(reconciler: &mut Reconciler, target: &ItemId, on: bool) {
        reconciler.set_item_highlight(*target, on);
    }
}

/// Task board: dropping onto a column moves the card to its end; the new status is saved
#[derive(Debug, Clone, Copy, Default)]
pub struct RegroupPolicy;

impl DropPolicy for RegroupPolicy {
    type Target = GroupId;
    const FAILURE_NOTICE: &'static str = STATUS_FAILED;

    fn apply(
        collection: &mut Collection,
        item: ItemId,
        target: &GroupId,
    ) -> Result<bool, ModelError> {
        collection.move_to(item, target)
    }

    fn call(_collection: &Collection, item: ItemId, target: &GroupId) -> SyncCall {
        SyncCall::SetStatus {
            id: item,
            group: target.clone(),
        }
    }

    fn highlight(reconciler: &mut Reconciler, target: &GroupId, on: bool) {
        reconciler.set_group_highlight(target, on);
    }
}

/// Result of ending a gesture with a drop
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// No gesture, or released outside every target
    NoTarget,
    /// Dropped onto itself or its own group; nothing changed or was sent
    Unchanged,
    /// The mutation failed validation; nothing changed or was sent
    Aborted(ModelError),
    /// Applied optimistically; submit this request to the store
    Submitted(SyncRequest),
}

pub type TileGrid = Arrangement<SwapPolicy>;
pub type TaskBoard = Arrangement<RegroupPolicy>;

/// One draggable collection with everything attached to it
#[derive(Debug)]
pub struct Arrangement<P: DropPolicy> {
    collection: Collection,
    reconciler: Reconciler,
    tracker: GestureTracker<P::Target>,
    sync: SyncClient,
    notice: Option<String>,
    _policy: PhantomData<P>,
}

impl<P: DropPolicy> Arrangement<P> {
    pub fn new(collection: Collection) -> Self {
        let mut reconciler = Reconciler::new();
        reconciler.render(&collection.snapshot());
        Arrangement {
            collection,
            reconciler,
            tracker: GestureTracker::new(),
            sync: SyncClient::new(),
            notice: None,
            _policy: PhantomData,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn tree(&self) -> &ViewTree {
        self.reconciler.tree()
    }

    pub fn tracker(&self) -> &GestureTracker<P::Target> {
        &self.tracker
    }

    pub fn in_flight(&self) -> usize {
        self.sync.in_flight()
    }

    pub fn owns(&self, ticket: Ticket) -> bool {
        self.sync.owns(ticket)
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn pick_up(&mut self, item: ItemId) -> Transition<P::Target> {
        let (Some(group), Some(position)) =
            (self.collection.group_of(item), self.collection.position(item))
        else {
            debug!(item = %item, "pick-up of unknown item ignored");
            return Transition::Ignored;
        };
        let origin = Origin {
            group: group.clone(),
            position,
        };
        let transition = self.tracker.pick_up(item, origin);
        if let Transition::PickedUp { item } = &transition {
            self.reconciler.set_dragging(*item, true);
        }
        transition
    }

    pub fn enter(&mut self, target: P::Target) -> Transition<P::Target> {
        let transition = self.tracker.enter(target);
        if let Transition::Highlight { previous, current } = &transition {
            if let Some(previous) = previous {
                P::highlight(&mut self.reconciler, previous, false);
            }
            P::highlight(&mut self.reconciler, current, true);
        }
        transition
    }

    pub fn leave(&mut self, target: &P::Target) -> Transition<P::Target> {
        let transition = self.tracker.leave(target);
        if let Transition::Unhighlight { target } = &transition {
            P::highlight(&mut self.reconciler, target, false);
        }
        transition
    }

    /// End the gesture. On a real change the collection is mutated, the view
    /// reconciled and the returned request must be submitted.
    pub fn drop(&mut self) -> DropOutcome {
        let transition = self.tracker.drop();
        self.reconciler.clear_marks();
        let Transition::Dropped { item, target, .. } = transition else {
            return DropOutcome::NoTarget;
        };

        let before = self.collection.snapshot();
        match P::apply(&mut self.collection, item, &target) {
            Ok(false) => DropOutcome::Unchanged,
            Err(err) => {
                warn!(item = %item, ?target, %err, "drop aborted");
                DropOutcome::Aborted(err)
            }
            Ok(true) => {
                self.reconciler.render(&self.collection.snapshot());
                let call = P::call(&self.collection, item, &target);
                DropOutcome::Submitted(self.sync.issue_arrangement(
                    call,
                    before,
                    self.collection.revision(),
                    P::FAILURE_NOTICE,
                ))
            }
        }
    }

    pub fn cancel(&mut self) -> Transition<P::Target> {
        let transition = self.tracker.cancel();
        self.reconciler.clear_marks();
        transition
    }

    /// Apply a store response. Model and view are updated together.
    pub fn resolve(&mut self, response: SyncResponse) -> Resolution {
        let resolution = self.sync.resolve(response, self.collection.revision());
        match &resolution {
            Resolution::RolledBack { snapshot, notice } => {
                self.collection.restore(snapshot);
                self.reconciler.render(snapshot);
                self.notice = Some(notice.clone());
            }
            Resolution::Failed { notice } => {
                self.notice = Some(notice.clone());
            }
            Resolution::Fetched(order) => {
                if self.collection.sort_by_order(order) {
                    self.reconciler.render(&self.collection.snapshot());
                }
            }
            Resolution::Deleted(id) => {
                if self.collection.remove(*id).is_ok() {
                    self.reconciler.remove(*id);
                }
            }
            Resolution::Edited(task) => {
                self.reconciler.refresh(task.id);
            }
            Resolution::Confirmed | Resolution::Stale(_) | Resolution::Unknown => {}
        }
        resolution
    }

    /// Ask the store for its saved order
    pub fn request_order(&mut self) -> SyncRequest {
        self.sync.issue_fetch(self.collection.revision())
    }

    /// Delete is not optimistic: the item stays until the store confirms.
    pub fn request_delete(&mut self, id: ItemId) -> Option<SyncRequest> {
        self.collection
            .contains(id)
            .then(|| self.sync.issue_delete(id))
    }

    pub fn request_edit(&mut self, id: ItemId, fields: TaskFields) -> Option<SyncRequest> {
        self.collection
            .contains(id)
            .then(|| self.sync.issue_edit(id, fields))
    }

    /// Replace the whole collection, as after a full reload. Pending requests
    /// are forgotten and any active gesture is abandoned.
    pub fn reload(&mut self, collection: Collection) {
        self.tracker.cancel();
        self.sync.clear();
        self.collection = collection;
        self.reconciler.clear_marks();
        self.reconciler.render(&self.collection.snapshot());
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, Task};
    use crate::sync::{Reply, SyncError};
    use pretty_assertions::assert_eq;

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId).collect()
    }

    fn grid() -> TileGrid {
        Arrangement::new(Collection::flat(ids(&[1, 2, 3, 4])).unwrap())
    }

    fn board() -> TaskBoard {
        Arrangement::new(
            Collection::bucketed(
                [GroupId::new("todo"), GroupId::new("in_progress"), GroupId::new("done")],
                [
                    (ItemId(10), GroupId::new("todo")),
                    (ItemId(11), GroupId::new("todo")),
                    (ItemId(12), GroupId::new("in_progress")),
                ],
            )
            .unwrap(),
        )
    }

    fn fail(req: &SyncRequest, reason: Option<&str>) -> SyncResponse {
        SyncResponse {
            ticket: req.ticket,
            result: Err(SyncError::Rejected {
                reason: reason.map(String::from),
            }),
        }
    }

    fn ack(req: &SyncRequest) -> SyncResponse {
        SyncResponse {
            ticket: req.ticket,
            result: Ok(Reply::Ack),
        }
    }

    fn submitted(outcome: DropOutcome) -> SyncRequest {
        match outcome {
            DropOutcome::Submitted(req) => req,
            other => panic!("expected a submitted request, got {:?}", other),
        }
    }

    #[test]
    fn swap_drop_updates_model_view_and_issues_full_order() {
        let mut g = grid();
        g.pick_up(ItemId(3));
        assert!(g.tree().node(ItemId(3)).unwrap().dragging);
        g.enter(ItemId(1));
        assert!(g.tree().node(ItemId(1)).unwrap().highlighted);

        let req = submitted(g.drop());
        assert_eq!(req.call, SyncCall::SetOrder(ids(&[3, 2, 1, 4])));
        assert_eq!(g.collection().order(), ids(&[3, 2, 1, 4]));
        assert_eq!(g.tree().order(), ids(&[3, 2, 1, 4]));
        assert!(!g.tree().node(ItemId(1)).unwrap().highlighted);
        assert!(!g.tree().node(ItemId(3)).unwrap().dragging);
        assert_eq!(g.in_flight(), 1);
    }

    #[test]
    fn rejected_swap_rolls_back_model_and_view() {
        let mut g = grid();
        g.pick_up(ItemId(3));
        g.enter(ItemId(1));
        let req = submitted(g.drop());

        let res = g.resolve(fail(&req, None));
        assert!(matches!(res, Resolution::RolledBack { .. }));
        assert_eq!(g.collection().order(), ids(&[1, 2, 3, 4]));
        assert_eq!(g.tree().order(), ids(&[1, 2, 3, 4]));
        assert_eq!(g.take_notice().as_deref(), Some(ORDER_FAILED));
        assert_eq!(g.notice(), None);
    }

    #[test]
    fn regroup_drop_moves_to_end_and_adjusts_counters() {
        let mut b = board();
        b.pick_up(ItemId(10));
        b.enter(GroupId::new("in_progress"));
        assert!(b.tree().container(&GroupId::new("in_progress")).unwrap().highlighted);

        let req = submitted(b.drop());
        assert_eq!(
            req.call,
            SyncCall::SetStatus {
                id: ItemId(10),
                group: GroupId::new("in_progress")
            }
        );
        assert_eq!(b.tree().children(&GroupId::new("in_progress")), ids(&[12, 10]).as_slice());
        assert_eq!(b.tree().counter(&GroupId::new("todo")), Some(1));
        assert_eq!(b.tree().counter(&GroupId::new("in_progress")), Some(2));

        assert_eq!(b.resolve(ack(&req)), Resolution::Confirmed);
        assert_eq!(b.tree().counter(&GroupId::new("in_progress")), Some(2));
    }

    #[test]
    fn rejected_regroup_restores_original_position() {
        let mut b = board();
        b.pick_up(ItemId(10));
        b.enter(GroupId::new("done"));
        let req = submitted(b.drop());
        b.resolve(fail(&req, Some("Moving from todo to done is not permitted")));

        assert_eq!(b.tree().children(&GroupId::new("todo")), ids(&[10, 11]).as_slice());
        assert_eq!(b.tree().counter(&GroupId::new("done")), Some(0));
        assert_eq!(
            b.take_notice().as_deref(),
            Some("Moving from todo to done is not permitted")
        );
    }

    #[test]
    fn drops_that_change_nothing_send_nothing() {
        let mut b = board();
        b.pick_up(ItemId(10));
        b.enter(GroupId::new("todo"));
        assert_eq!(b.drop(), DropOutcome::Unchanged);

        let mut g = grid();
        g.pick_up(ItemId(2));
        g.enter(ItemId(2));
        assert_eq!(g.drop(), DropOutcome::Unchanged);
        assert_eq!(g.in_flight() + b.in_flight(), 0);
    }

    #[test]
    fn drop_outside_and_cancel_leave_everything_as_is() {
        let mut g = grid();
        g.pick_up(ItemId(1));
        g.enter(ItemId(4));
        g.leave(&ItemId(4));
        assert_eq!(g.drop(), DropOutcome::NoTarget);

        g.pick_up(ItemId(1));
        g.enter(ItemId(4));
        g.cancel();
        assert!(!g.tree().node(ItemId(4)).unwrap().highlighted);
        assert_eq!(g.collection().revision(), 0);
        assert_eq!(g.in_flight(), 0);
    }

    #[test]
    fn drop_onto_unknown_group_aborts() {
        let mut b = board();
        b.pick_up(ItemId(11));
        b.enter(GroupId::new("archived"));
        assert_eq!(
            b.drop(),
            DropOutcome::Aborted(ModelError::InvalidGroup(GroupId::new("archived")))
        );
        assert_eq!(b.collection().count(&GroupId::new("todo")), 2);
    }

    #[test]
    fn stale_failure_keeps_newer_state() {
        let mut g = grid();
        g.pick_up(ItemId(1));
        g.enter(ItemId(2));
        let first = submitted(g.drop());
        g.pick_up(ItemId(3));
        g.enter(ItemId(4));
        let second = submitted(g.drop());

        assert_eq!(g.resolve(ack(&second)), Resolution::Confirmed);
        assert!(matches!(g.resolve(fail(&first, None)), Resolution::Stale(_)));
        assert_eq!(g.collection().order(), ids(&[2, 1, 4, 3]));
        assert_eq!(g.notice(), None);
    }

    #[test]
    fn fetched_order_applies_to_untouched_grid() {
        let mut g = grid();
        let req = g.request_order();
        g.resolve(SyncResponse {
            ticket: req.ticket,
            result: Ok(Reply::Order(ids(&[4, 3, 2, 1]))),
        });
        assert_eq!(g.tree().order(), ids(&[4, 3, 2, 1]));
    }

    #[test]
    fn delete_waits_for_confirmation() {
        let mut b = board();
        let req = b.request_delete(ItemId(11)).unwrap();
        assert_eq!(req.call, SyncCall::DeleteItem(ItemId(11)));
        assert!(b.collection().contains(ItemId(11)));
        assert_eq!(b.resolve(ack(&req)), Resolution::Deleted(ItemId(11)));
        assert!(!b.collection().contains(ItemId(11)));
        assert_eq!(b.tree().counter(&GroupId::new("todo")), Some(1));
        assert!(b.request_delete(ItemId(99)).is_none());
    }

    #[test]
    fn edit_bumps_render_version() {
        let mut b = board();
        let req = b.request_edit(ItemId(12), TaskFields::default()).unwrap();
        let task = Task {
            id: ItemId(12),
            course: "CS".into(),
            title: "Lab".into(),
            due: None,
            weight: None,
            est_hours: None,
            priority: Priority::Low,
            status: GroupId::new("in_progress"),
        };
        let res = b.resolve(SyncResponse {
            ticket: req.ticket,
            result: Ok(Reply::Task(task.clone())),
        });
        assert_eq!(res, Resolution::Edited(task));
        assert_eq!(b.tree().node(ItemId(12)).unwrap().version, 1);
    }

    #[test]
    fn reload_forgets_pending_requests() {
        let mut g = grid();
        g.pick_up(ItemId(1));
        g.enter(ItemId(2));
        let req = submitted(g.drop());
        g.reload(Collection::flat(ids(&[1, 2, 3, 4, 5])).unwrap());
        assert_eq!(g.resolve(fail(&req, None)), Resolution::Unknown);
        assert_eq!(g.tree().order(), ids(&[1, 2, 3, 4, 5]));
    }
}
