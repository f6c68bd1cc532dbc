use std::collections::HashSet;
use worldsync_common::EntityId;

/// The mobs an observer's client currently displays, in client slot order.
///
/// Existing members keep their relative order from tick to tick; new members
/// are only ever appended. Membership lookups are backed by a set so the
/// per-tick candidate scan stays linear in the world size.
#[derive(Debug, Clone, Default)]
pub struct LocalView {
    members: Vec<EntityId>,
    present: HashSet<EntityId>,
}

impl LocalView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.present.contains(&id)
    }

    /// Members in slot order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter().copied()
    }

    pub fn as_slice(&self) -> &[EntityId] {
        &self.members
    }

    /// Append a member after all existing ones. Returns false if already present.
    pub(crate) fn push(&mut self, id: EntityId) -> bool {
        if !self.present.insert(id) {
            return false;
        }
        self.members.push(id);
        true
    }

    /// Visit every member in slot order and drop those for which `keep` returns false.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(EntityId) -> bool) {
        let present = &mut self.present;
        self.members.retain(|&id| {
            let kept = keep(id);
            if !kept {
                present.remove(&id);
            }
            kept
        });
    }
}
