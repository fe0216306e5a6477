//! The frozen output of the decision phase.

use std::collections::BTreeSet;

use crate::model::handle::Handle;

/// The set of classes and members scheduled for erasure in one run.
///
/// Built once by the marker, then treated as immutable: the rewriter and the
/// eliminator only ever read it. Both underlying sets are ordered, so two
/// runs over identical inputs produce identical removal sets.
///
/// Invariant: a member of a removed class is never separately present in the
/// member set — class removal subsumes it, and the marker never scans the
/// members of a removed class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemovalSet {
    classes: BTreeSet<Handle>,
    members: BTreeSet<Handle>,
}

impl RemovalSet {
    /// Creates an empty removal set.
    #[must_use]
    pub fn new() -> Self {
        RemovalSet::default()
    }

    /// Schedules a whole class for removal.
    pub(crate) fn insert_class(&mut self, class: Handle) {
        self.classes.insert(class);
    }

    /// Schedules a member for removal.
    pub(crate) fn insert_member(&mut self, member: Handle) {
        self.members.insert(member);
    }

    /// True if the class is scheduled for removal.
    #[must_use]
    pub fn is_class_removed(&self, class: Handle) -> bool {
        self.classes.contains(&class)
    }

    /// True if the member is individually scheduled for removal. Does NOT
    /// consider the member's declaring class; callers that need the combined
    /// verdict check both.
    #[must_use]
    pub fn is_member_removed(&self, member: Handle) -> bool {
        self.members.contains(&member)
    }

    /// The removed classes, ascending.
    pub fn classes(&self) -> impl Iterator<Item = Handle> + '_ {
        self.classes.iter().copied()
    }

    /// The removed members, ascending.
    pub fn members(&self) -> impl Iterator<Item = Handle> + '_ {
        self.members.iter().copied()
    }

    /// Number of removed classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Number of individually removed members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// True if nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.members.is_empty()
    }
}
