//! Retained view tree and the reconciler that keeps it in step with the
//! collection.
//!
//! The tree is what the terminal frontend draws from: containers hold child
//! node ids in display order plus a visible counter, and nodes carry the
//! transient drag/highlight flags. The reconciler only ever reads collection
//! snapshots; it never mutates the collection.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::trace;

use crate::model::{GroupId, ItemId, Snapshot};

/// A change applied to the view tree during reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOp {
    /// Node moved to the end of another container
    Reparent {
        item: ItemId,
        from: GroupId,
        to: GroupId,
    },
    /// Node appeared at the end of a container
    Attach { item: ItemId, to: GroupId },
    /// Node removed from the tree
    Detach { item: ItemId, from: GroupId },
    /// Container children rearranged into `order`
    Reorder { group: GroupId, order: Vec<ItemId> },
    /// Visible counter changed by `delta`
    AdjustCounter { group: GroupId, delta: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Container {
    pub children: Vec<ItemId>,
    pub counter: usize,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    pub dragging: bool,
    pub highlighted: bool,
    /// Bumped whenever the node's payload must be redrawn
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewTree {
    containers: IndexMap<GroupId, Container>,
    nodes: HashMap<ItemId, Node>,
}

impl ViewTree {
    pub fn containers(&self) -> impl Iterator<Item = (&GroupId, &Container)> {
        self.containers.iter()
    }

    pub fn container(&self, group: &GroupId) -> Option<&Container> {
        self.containers.get(group)
    }

    pub fn node(&self, id: ItemId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn children(&self, group: &GroupId) -> &[ItemId] {
        self.containers
            .get(group)
            .map_or(&[], |c| c.children.as_slice())
    }

    pub fn counter(&self, group: &GroupId) -> Option<usize> {
        self.containers.get(group).map(|c| c.counter)
    }

    /// All node ids in display order
    pub fn order(&self) -> Vec<ItemId> {
        self.containers
            .values()
            .flat_map(|c| c.children.iter().copied())
            .collect()
    }

    fn parent_of(&self, id: ItemId) -> Option<GroupId> {
        self.containers
            .iter()
            .find(|(_, c)| c.children.contains(&id))
            .map(|(g, _)| g.clone())
    }
}

/// Applies collection state to a [`ViewTree`]
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    tree: ViewTree,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    /// Bring the tree in line with `snapshot`. Returns the ops applied; an
    /// empty list means the tree already matched.
    pub fn render(&mut self, snapshot: &Snapshot) -> Vec<ViewOp> {
        let mut ops = Vec::new();

        for (group, _) in snapshot.groups() {
            if !self.tree.containers.contains_key(group) {
                self.tree
                    .containers
                    .insert(group.clone(), Container::default());
            }
        }

        let desired: HashMap<ItemId, &GroupId> = snapshot
            .groups()
            .flat_map(|(g, ids)| ids.iter().map(move |id| (*id, g)))
            .collect();

        // Detach nodes that no longer exist, reparent the ones that moved
        let current: Vec<(ItemId, GroupId)> = self
            .tree
            .containers
            .iter()
            .flat_map(|(g, c)| c.children.iter().map(move |id| (*id, g.clone())))
            .collect();
        for (id, parent) in current {
            match desired.get(&id) {
                None => {
                    self.detach(id, &parent);
                    self.tree.nodes.remove(&id);
                    ops.push(ViewOp::Detach {
                        item: id,
                        from: parent,
                    });
                }
                Some(&target) if *target != parent => {
                    self.detach(id, &parent);
                    self.append(id, target);
                    ops.push(ViewOp::Reparent {
                        item: id,
                        from: parent,
                        to: target.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        // Attach nodes the tree has never seen
        for (group, ids) in snapshot.groups() {
            for &id in ids {
                if self.tree.parent_of(id).is_none() {
                    self.append(id, group);
                    ops.push(ViewOp::Attach {
                        item: id,
                        to: group.clone(),
                    });
                }
            }
        }

        for (group, ids) in snapshot.groups() {
            if let Some(container) = self.tree.containers.get_mut(group) {
                if container.children != ids {
                    container.children = ids.to_vec();
                    ops.push(ViewOp::Reorder {
                        group: group.clone(),
                        order: ids.to_vec(),
                    });
                }
                let delta = ids.len() as i64 - container.counter as i64;
                if delta != 0 {
                    container.counter = ids.len();
                    ops.push(ViewOp::AdjustCounter {
                        group: group.clone(),
                        delta,
                    });
                }
            }
        }

        if !ops.is_empty() {
            trace!(ops = ops.len(), revision = snapshot.revision(), "view reconciled");
        }
        ops
    }

    /// Remove a node after a confirmed delete
    pub fn remove(&mut self, id: ItemId) -> Vec<ViewOp> {
        let Some(parent) = self.tree.parent_of(id) else {
            return Vec::new();
        };
        self.detach(id, &parent);
        self.tree.nodes.remove(&id);
        let mut ops = vec![ViewOp::Detach {
            item: id,
            from: parent.clone(),
        }];
        if let Some(container) = self.tree.containers.get_mut(&parent) {
            container.counter = container.counter.saturating_sub(1);
            ops.push(ViewOp::AdjustCounter {
                group: parent,
                delta: -1,
            });
        }
        ops
    }

    /// Mark a node's payload as changed so it is redrawn in place
    pub fn refresh(&mut self, id: ItemId) {
        if let Some(node) = self.tree.nodes.get_mut(&id) {
            node.version += 1;
        }
    }

    pub fn set_dragging(&mut self, id: ItemId, dragging: bool) {
        if let Some(node) = self.tree.nodes.get_mut(&id) {
            node.dragging = dragging;
        }
    }

    pub fn set_item_highlight(&mut self, id: ItemId, on: bool) {
        if let Some(node) = self.tree.nodes.get_mut(&id) {
            node.highlighted = on;
        }
    }

    pub fn set_group_highlight(&mut self, group: &GroupId, on: bool) {
        if let Some(container) = self.tree.containers.get_mut(group) {
            container.highlighted = on;
        }
    }

    /// Drop every transient drag/highlight flag
    pub fn clear_marks(&mut self) {
        for node in self.tree.nodes.values_mut() {
            node.dragging = false;
            node.highlighted = false;
        }
        for container in self.tree.containers.values_mut() {
            container.highlighted = false;
        }
    }

    fn detach(&mut self, id: ItemId, parent: &GroupId) {
        if let Some(container) = self.tree.containers.get_mut(parent) {
            container.children.retain(|&c| c != id);
        }
    }

    fn append(&mut self, id: ItemId, group: &GroupId) {
        if let Some(container) = self.tree.containers.get_mut(group) {
            container.children.push(id);
        }
        self.tree.nodes.entry(id).or_default();
    }
}
