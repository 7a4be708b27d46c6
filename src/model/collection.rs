use std::collections::HashSet;

use indexmap::IndexMap;

use super::ids::{GroupId, ItemId};

/// Error type for collection operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("item not found: {0}")]
    InvalidId(ItemId),
    #[error("group not found: {0}")]
    InvalidGroup(GroupId),
    #[error("item appears more than once: {0}")]
    DuplicateId(ItemId),
}

/// Immutable copy of a collection's order and group assignment.
///
/// Taken before every optimistic mutation so a failed sync can put the
/// collection (and the view rendered from it) back exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    groups: IndexMap<GroupId, Vec<ItemId>>,
    revision: u64,
}

impl Snapshot {
    /// Revision of the collection at the time the snapshot was taken
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Sequences in group order
    pub fn groups(&self) -> impl Iterator<Item = (&GroupId, &[ItemId])> {
        self.groups.iter().map(|(g, ids)| (g, ids.as_slice()))
    }

    pub fn sequence(&self, group: &GroupId) -> &[ItemId] {
        self.groups.get(group).map_or(&[], |ids| ids.as_slice())
    }

    /// All ids, group by group
    pub fn order(&self) -> Vec<ItemId> {
        self.groups.values().flatten().copied().collect()
    }

    pub fn count(&self, group: &GroupId) -> usize {
        self.sequence(group).len()
    }

    pub fn group_of(&self, id: ItemId) -> Option<&GroupId> {
        self.groups
            .iter()
            .find(|(_, ids)| ids.contains(&id))
            .map(|(g, _)| g)
    }
}

/// In-memory order of items, optionally split into named groups.
///
/// A flat collection keeps one sequence under [`GroupId::root`]; a bucketed
/// collection has a fixed set of groups defined at construction. Every id
/// appears exactly once across all sequences, and every operation either
/// fully applies or leaves the collection untouched.
#[derive(Debug, Clone)]
pub struct Collection {
    groups: IndexMap<GroupId, Vec<ItemId>>,
    bucketed: bool,
    revision: u64,
    /// Source of fresh revision numbers; never goes backwards, even on restore
    issued: u64,
}

impl Collection {
    /// A single ordered sequence (icon grid)
    pub fn flat(ids: impl IntoIterator<Item = ItemId>) -> Result<Self, ModelError> {
        let ids: Vec<ItemId> = ids.into_iter().collect();
        ensure_unique(&ids)?;
        let mut groups = IndexMap::new();
        groups.insert(GroupId::root(), ids);
        Ok(Collection {
            groups,
            bucketed: false,
            revision: 0,
            issued: 0,
        })
    }

    /// Named groups (kanban columns). `assignments` are appended to their
    /// group in iteration order.
    pub fn bucketed(
        groups: impl IntoIterator<Item = GroupId>,
        assignments: impl IntoIterator<Item = (ItemId, GroupId)>,
    ) -> Result<Self, ModelError> {
        let mut map: IndexMap<GroupId, Vec<ItemId>> =
            groups.into_iter().map(|g| (g, Vec::new())).collect();
        let mut seen = HashSet::new();
        for (id, group) in assignments {
            if !seen.insert(id) {
                return Err(ModelError::DuplicateId(id));
            }
            map.get_mut(&group)
                .ok_or(ModelError::InvalidGroup(group))?
                .push(id);
        }
        Ok(Collection {
            groups: map,
            bucketed: true,
            revision: 0,
            issued: 0,
        })
    }

    pub fn is_bucketed(&self) -> bool {
        self.bucketed
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.locate(id).is_some()
    }

    pub fn group_ids(&self) -> impl Iterator<Item = &GroupId> {
        self.groups.keys()
    }

    pub fn has_group(&self, group: &GroupId) -> bool {
        self.groups.contains_key(group)
    }

    pub fn sequence(&self, group: &GroupId) -> &[ItemId] {
        self.groups.get(group).map_or(&[], |ids| ids.as_slice())
    }

    /// All ids, group by group. For a flat collection this is the full order.
    pub fn order(&self) -> Vec<ItemId> {
        self.groups.values().flatten().copied().collect()
    }

    pub fn count(&self, group: &GroupId) -> usize {
        self.sequence(group).len()
    }

    /// Per-group sizes in group order
    pub fn counts(&self) -> Vec<(GroupId, usize)> {
        self.groups
            .iter()
            .map(|(g, ids)| (g.clone(), ids.len()))
            .collect()
    }

    pub fn group_of(&self, id: ItemId) -> Option<&GroupId> {
        let (g, _) = self.locate(id)?;
        self.groups.get_index(g).map(|(k, _)| k)
    }

    /// Zero-based position of `id` within its own sequence
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.locate(id).map(|(_, pos)| pos)
    }

    /// Exchange the slots of two items. Returns `Ok(false)` when `a == b`.
    pub fn swap(&mut self, a: ItemId, b: ItemId) -> Result<bool, ModelError> {
        let (ga, pa) = self.locate(a).ok_or(ModelError::InvalidId(a))?;
        let (gb, pb) = self.locate(b).ok_or(ModelError::InvalidId(b))?;
        if a == b {
            return Ok(false);
        }
        self.groups[ga][pa] = b;
        self.groups[gb][pb] = a;
        self.bump();
        Ok(true)
    }

    /// Remove `id` from its group and append it to the end of `target`.
    /// Returns `Ok(false)` when the item is already in `target`.
    pub fn move_to(&mut self, id: ItemId, target: &GroupId) -> Result<bool, ModelError> {
        if !self.bucketed {
            return Err(ModelError::InvalidGroup(target.clone()));
        }
        let target_idx = self
            .groups
            .get_index_of(target)
            .ok_or_else(|| ModelError::InvalidGroup(target.clone()))?;
        let (source_idx, pos) = self.locate(id).ok_or(ModelError::InvalidId(id))?;
        if source_idx == target_idx {
            return Ok(false);
        }
        self.groups[source_idx].remove(pos);
        self.groups[target_idx].push(id);
        self.bump();
        Ok(true)
    }

    /// Drop an item, closing the gap it leaves. Returns the group it was in.
    pub fn remove(&mut self, id: ItemId) -> Result<GroupId, ModelError> {
        let (g, pos) = self.locate(id).ok_or(ModelError::InvalidId(id))?;
        let (group, ids) = self
            .groups
            .get_index_mut(g)
            .ok_or(ModelError::InvalidId(id))?;
        let group = group.clone();
        ids.remove(pos);
        self.bump();
        Ok(group)
    }

    /// Append a new item to the end of `group` (the root group for flat collections).
    pub fn insert(&mut self, id: ItemId, group: &GroupId) -> Result<(), ModelError> {
        if self.contains(id) {
            return Err(ModelError::DuplicateId(id));
        }
        let ids = self
            .groups
            .get_mut(group)
            .ok_or_else(|| ModelError::InvalidGroup(group.clone()))?;
        ids.push(id);
        self.bump();
        Ok(())
    }

    /// Rearrange every group by the server's `order` (see [`arrange_by_order`]).
    /// Returns `false` when nothing moved.
    pub fn sort_by_order(&mut self, order: &[ItemId]) -> bool {
        let mut changed = false;
        for ids in self.groups.values_mut() {
            let arranged = arrange_by_order(ids, order);
            if *ids != arranged {
                *ids = arranged;
                changed = true;
            }
        }
        if changed {
            self.bump();
        }
        changed
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            groups: self.groups.clone(),
            revision: self.revision,
        }
    }

    /// Replace the current state with `snapshot`, including its revision.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.groups = snapshot.groups.clone();
        self.revision = snapshot.revision;
    }

    /// Re-verify that every id appears exactly once.
    pub fn check(&self) -> Result<(), ModelError> {
        ensure_unique(&self.order())
    }

    fn locate(&self, id: ItemId) -> Option<(usize, usize)> {
        self.groups
            .values()
            .enumerate()
            .find_map(|(g, ids)| ids.iter().position(|&i| i == id).map(|pos| (g, pos)))
    }

    fn bump(&mut self) {
        self.issued += 1;
        self.revision = self.issued;
        debug_assert!(self.check().is_ok());
    }
}

fn ensure_unique(ids: &[ItemId]) -> Result<(), ModelError> {
    let mut seen = HashSet::with_capacity(ids.len());
    for &id in ids {
        if !seen.insert(id) {
            return Err(ModelError::DuplicateId(id));
        }
    }
    Ok(())
}

/// Order `loaded` (ids in load order) by the server's `order`.
///
/// Ids the server order does not mention keep their relative load order and
/// come first; ids in `order` with no loaded item are ignored.
pub fn arrange_by_order(loaded: &[ItemId], order: &[ItemId]) -> Vec<ItemId> {
    let rank = |id: &ItemId| order.iter().position(|o| o == id);
    let mut arranged = loaded.to_vec();
    // Stable sort: None < Some(_) puts unknown ids first
    arranged.sort_by_key(rank);
    arranged
}
