//! Run reports: the annotation listing diagnostic and the process summary.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::engine::rewriter::RewriteEvent;

/// The read-only annotation listing: every distinct feature id referenced in
/// the loaded closure, grouped by declaring class, plus the global id set.
///
/// Both groupings are ordered, so the rendering is stable across runs.
/// Building the report performs no mutation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotationReport {
    per_class: BTreeMap<String, BTreeSet<String>>,
    ids: BTreeSet<String>,
}

impl AnnotationReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        AnnotationReport::default()
    }

    /// Records the ids of one resolved annotation under its declaring class.
    pub(crate) fn append<'a>(&mut self, class: &str, ids: impl IntoIterator<Item = &'a str>) {
        let per_class = self.per_class.entry(class.to_string()).or_default();
        for id in ids {
            per_class.insert(id.to_string());
            self.ids.insert(id.to_string());
        }
    }

    /// The ids referenced by one class, if any.
    #[must_use]
    pub fn ids_of(&self, class: &str) -> Option<&BTreeSet<String>> {
        self.per_class.get(class).filter(|ids| !ids.is_empty())
    }

    /// Classes that reference at least one id, in name order.
    pub fn annotated_classes(&self) -> impl Iterator<Item = &str> {
        self.per_class
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Every distinct id referenced anywhere, in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// True if no annotation was found anywhere.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl fmt::Display for AnnotationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Annotated classes:")?;
        for class in self.annotated_classes() {
            let ids: Vec<&str> = self.per_class[class].iter().map(String::as_str).collect();
            writeln!(f, " - {}: {}", class, ids.join(", "))?;
        }
        writeln!(f)?;
        writeln!(f, "Annotation ids:")?;
        for id in self.ids() {
            writeln!(f, " - {}", id)?;
        }
        Ok(())
    }
}

/// Summary of one completed specialization run.
#[derive(Clone, Debug, Default)]
pub struct ProcessReport {
    /// Whole classes erased from the closure
    pub removed_classes: usize,
    /// Members erased from kept classes
    pub removed_members: usize,
    /// Use sites patched by the rewriter
    pub patched_sites: usize,
    /// Metadata entries stripped (0 unless stripping was requested)
    pub stripped_annotations: usize,
    /// The applied patches, ordered by behavior and site index
    pub events: Vec<RewriteEvent>,
}
