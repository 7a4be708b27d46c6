//! Sync client: turns committed optimistic mutations into store calls and
//! decides, when each response comes back, whether the optimistic state
//! stands, must be rolled back, or has already been superseded.

pub mod worker;

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::model::{GroupId, ItemId, Snapshot, Task, TaskFields};

/// Correlates a request with its response
pub type Ticket = u64;

/// Tickets are unique across every client in the process, so one worker can
/// serve several arrangements.
static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

fn next_ticket() -> Ticket {
    NEXT_TICKET.fetch_add(1, Ordering::Relaxed)
}

pub const ORDER_FAILED: &str = "Failed to save the new order.";
pub const STATUS_FAILED: &str = "Failed to update task status.";
pub const DELETE_FAILED: &str = "Failed to delete the task.";

/// A call to the persistence service
#[derive(Debug, Clone, PartialEq)]
pub enum SyncCall {
    GetOrder,
    SetOrder(Vec<ItemId>),
    SetStatus { id: ItemId, group: GroupId },
    DeleteItem(ItemId),
    EditItem { id: ItemId, fields: TaskFields },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncRequest {
    pub ticket: Ticket,
    pub call: SyncCall,
}

/// Successful store reply
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ack,
    Order(Vec<ItemId>),
    Task(Task),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncResponse {
    pub ticket: Ticket,
    pub result: Result<Reply, SyncError>,
}

/// Error type for sync round trips
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("rejected by store: {}", reason.as_deref().unwrap_or("no reason given"))]
    Rejected { reason: Option<String> },
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error("sync {ticket} superseded by a newer state")]
    Stale { ticket: Ticket },
}

impl SyncError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        SyncError::Rejected {
            reason: Some(reason.into()),
        }
    }

    /// Text for the user: the store's reason when it gave one, `fallback` otherwise
    pub fn notice(&self, fallback: &str) -> String {
        match self {
            SyncError::Rejected {
                reason: Some(reason),
            } if !reason.is_empty() => reason.clone(),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum Pending {
    /// Optimistic reorder/regroup; rolled back to `before` on failure
    Arrange {
        before: Snapshot,
        after_revision: u64,
        failure: &'static str,
    },
    Fetch {
        revision: u64,
    },
    Delete(ItemId),
    Edit(ItemId),
}

/// What the caller must do with a resolved response
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Optimistic state is now confirmed
    Confirmed,
    /// Restore both model and view to `snapshot` and show `notice`
    RolledBack { snapshot: Snapshot, notice: String },
    /// Failure against a state that has since moved on; drop silently
    Stale(SyncError),
    /// Server order arrived and nothing moved since it was requested
    Fetched(Vec<ItemId>),
    Deleted(ItemId),
    Edited(Task),
    /// Non-optimistic call failed; nothing to roll back
    Failed { notice: String },
    /// No pending request with this ticket
    Unknown,
}

/// Tracks in-flight requests and resolves their responses
#[derive(Debug, Default)]
pub struct SyncClient {
    pending: IndexMap<Ticket, Pending>,
}

impl SyncClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn owns(&self, ticket: Ticket) -> bool {
        self.pending.contains_key(&ticket)
    }

    /// Forget every pending request (full reload). Late responses resolve as
    /// [`Resolution::Unknown`].
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Issue the single call for a committed drop. `before` is the snapshot
    /// taken just before the mutation, `after_revision` the collection
    /// revision right after it.
    pub fn issue_arrangement(
        &mut self,
        call: SyncCall,
        before: Snapshot,
        after_revision: u64,
        failure: &'static str,
    ) -> SyncRequest {
        let ticket = next_ticket();
        debug!(ticket, ?call, after_revision, "sync issued");
        self.pending.insert(
            ticket,
            Pending::Arrange {
                before,
                after_revision,
                failure,
            },
        );
        SyncRequest { ticket, call }
    }

    /// Ask for the server order; applied only if the collection is still at
    /// `revision` when it arrives.
    pub fn issue_fetch(&mut self, revision: u64) -> SyncRequest {
        let ticket = next_ticket();
        self.pending.insert(ticket, Pending::Fetch { revision });
        SyncRequest {
            ticket,
            call: SyncCall::GetOrder,
        }
    }

    pub fn issue_delete(&mut self, id: ItemId) -> SyncRequest {
        let ticket = next_ticket();
        self.pending.insert(ticket, Pending::Delete(id));
        SyncRequest {
            ticket,
            call: SyncCall::DeleteItem(id),
        }
    }

    pub fn issue_edit(&mut self, id: ItemId, fields: TaskFields) -> SyncRequest {
        let ticket = next_ticket();
        self.pending.insert(ticket, Pending::Edit(id));
        SyncRequest {
            ticket,
            call: SyncCall::EditItem { id, fields },
        }
    }

    /// Resolve a response against the collection's current revision.
    /// The pending entry is discarded whatever the outcome.
    pub fn resolve(&mut self, response: SyncResponse, current_revision: u64) -> Resolution {
        let SyncResponse { ticket, result } = response;
        let Some(pending) = self.pending.shift_remove(&ticket) else {
            debug!(ticket, "response for unknown ticket");
            return Resolution::Unknown;
        };

        match pending {
            Pending::Arrange {
                before,
                after_revision,
                failure,
            } => match result {
                Ok(_) => {
                    info!(ticket, "sync confirmed");
                    Resolution::Confirmed
                }
                Err(err) if current_revision != after_revision => {
                    debug!(ticket, %err, current_revision, after_revision, "stale failure discarded");
                    Resolution::Stale(SyncError::Stale { ticket })
                }
                Err(err) => {
                    warn!(ticket, %err, revision = before.revision(), "sync failed, rolling back");
                    Resolution::RolledBack {
                        notice: err.notice(failure),
                        snapshot: before,
                    }
                }
            },
            Pending::Fetch { revision } => match result {
                Ok(Reply::Order(order)) if revision == current_revision => {
                    Resolution::Fetched(order)
                }
                Ok(Reply::Order(_)) => Resolution::Stale(SyncError::Stale { ticket }),
                Ok(other) => {
                    warn!(ticket, ?other, "unexpected reply to order fetch");
                    Resolution::Failed {
                        notice: "Could not load the saved order.".into(),
                    }
                }
                Err(err) => {
                    warn!(ticket, %err, "order fetch failed");
                    Resolution::Failed {
                        notice: err.notice("Could not load the saved order."),
                    }
                }
            },
            Pending::Delete(id) => match result {
                Ok(_) => {
                    info!(ticket, item = %id, "delete confirmed");
                    Resolution::Deleted(id)
                }
                Err(err) => {
                    warn!(ticket, item = %id, %err, "delete failed");
                    Resolution::Failed {
                        notice: err.notice(DELETE_FAILED),
                    }
                }
            },
            Pending::Edit(id) => match result {
                Ok(Reply::Task(task)) => {
                    info!(ticket, item = %id, "edit confirmed");
                    Resolution::Edited(task)
                }
                Ok(other) => {
                    warn!(ticket, ?other, "unexpected reply to edit");
                    Resolution::Failed {
                        notice: "Error updating task: no task returned".into(),
                    }
                }
                Err(err) => {
                    warn!(ticket, item = %id, %err, "edit failed");
                    let reason = match &err {
                        SyncError::Rejected {
                            reason: Some(reason),
                        } => reason.clone(),
                        other => other.to_string(),
                    };
                    Resolution::Failed {
                        notice: format!("Error updating task: {}", reason),
                    }
                }
            },
        }
    }
}
