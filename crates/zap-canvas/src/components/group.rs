use std::collections::HashMap;

use glam::DVec2;
use serde::Deserialize;

use crate::api::types::{DrawableId, EntityId, GroupId};

/// How an entity belongs to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    /// Moved along with the drag leader, keeping its offset.
    Grouped,
    /// Tracked for bulk operations only.
    Enrolled,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub name: String,
}

/// Joint-membership set linking entities for synchronized movement and
/// animation. Members are referenced by id; the group owns none of them.
#[derive(Debug, Default)]
pub struct Group {
    pub(crate) id: Option<GroupId>,
    pub name: String,
    pub(crate) grouped: Vec<EntityId>,
    pub(crate) enrolled: Vec<EntityId>,
    /// Offset of each grouped drawable from the drag leader, recorded at
    /// drag begin.
    pub(crate) offsets: HashMap<DrawableId, DVec2>,
}

impl Group {
    pub fn new(config: GroupConfig) -> Self {
        Self {
            name: config.name,
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<GroupId> {
        self.id
    }

    pub fn grouped(&self) -> &[EntityId] {
        &self.grouped
    }

    pub fn enrolled(&self) -> &[EntityId] {
        &self.enrolled
    }

    /// All members, grouped first.
    pub fn members(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.grouped.iter().chain(self.enrolled.iter()).copied()
    }

    pub fn membership(&self, member: EntityId) -> Option<Membership> {
        if self.grouped.contains(&member) {
            Some(Membership::Grouped)
        } else if self.enrolled.contains(&member) {
            Some(Membership::Enrolled)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.grouped.len() + self.enrolled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grouped.is_empty() && self.enrolled.is_empty()
    }

    /// Insert into exactly one of the two sets.
    pub(crate) fn insert(&mut self, member: EntityId, membership: Membership) {
        self.remove(member);
        match membership {
            Membership::Grouped => self.grouped.push(member),
            Membership::Enrolled => self.enrolled.push(member),
        }
    }

    pub(crate) fn remove(&mut self, member: EntityId) -> bool {
        let before = self.len();
        self.grouped.retain(|m| *m != member);
        self.enrolled.retain(|m| *m != member);
        if let Ok(drawable) = DrawableId::try_from(member) {
            self.offsets.remove(&drawable);
        }
        self.len() != before
    }

    pub(crate) fn take_members(&mut self) -> Vec<EntityId> {
        self.offsets.clear();
        let mut members = std::mem::take(&mut self.grouped);
        members.append(&mut self.enrolled);
        members
    }
}
