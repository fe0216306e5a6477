//! The deletion phase: physically erase marked elements.
//!
//! Runs strictly after the rewriter has finished for the ENTIRE class
//! closure. The barrier matters: a body visited later could still need a
//! marked member to exist in the model (for lookups and metadata) even
//! though no code may legally reference it any more. Deleting only after
//! rewrite-all avoids that hazard entirely.

use log::debug;

use crate::{
    engine::removal::RemovalSet,
    model::registry::ClassRegistry,
    Result,
};

/// Counts of what the elimination phase actually deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EliminationStats {
    /// Whole classes dropped from the closure
    pub classes: usize,
    /// Members deleted from kept classes
    pub members: usize,
}

/// Deletes every marked member from its declaring class, then drops every
/// marked class from the closure.
///
/// # Errors
/// Returns [`crate::Error::Structural`] when a marked element is no longer
/// present — the mark and delete phases disagree about the model, which is
/// fatal.
pub fn eliminate(registry: &ClassRegistry, removal: &RemovalSet) -> Result<EliminationStats> {
    let mut stats = EliminationStats::default();

    for member in removal.members() {
        debug!("- removed member {}", registry.element_name(member));
        registry.remove_member(member)?;
        stats.members += 1;
    }

    for class in removal.classes() {
        debug!("- removed class {}", registry.element_name(class));
        registry.remove_class(class)?;
        stats.classes += 1;
    }

    Ok(stats)
}
