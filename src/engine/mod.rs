//! The specialization engine: decision, rewrite and deletion phases.
//!
//! Processing is a strictly phased batch over a fixed, already-loaded
//! closure of classes:
//!
//! 1. **mark** ([`marker`]) - read-only scan producing the frozen
//!    [`removal::RemovalSet`];
//! 2. **rewrite** ([`rewriter`]) - one pass over every behavior body of
//!    every kept class, patching references to removed elements; parallel
//!    per class;
//! 3. **eliminate** ([`eliminator`]) - physical deletion, only after
//!    rewriting has completed for the ENTIRE closure.
//!
//! There is no cancellation or timeout model: a run either completes for
//! the whole closure or aborts atomically with the first fatal error,
//! leaving no partial output to commit.

use std::sync::Arc;

use log::info;

use crate::{
    annotations::resolver::AnnotationResolver,
    model::{handle::Handle, registry::ClassRegistry},
    Result,
};

pub mod bindings;
pub mod eliminator;
pub mod evaluator;
pub mod marker;
pub mod removal;
pub mod report;
pub mod rewriter;

pub use bindings::FeatureBindings;
pub use report::{AnnotationReport, ProcessReport};

/// Configuration of one processor run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Consider annotations of superclasses and interfaces, not just the
    /// element itself. Default: `true`.
    pub recurse: bool,
    /// Strip variability and bound-value metadata from every surviving
    /// element after specialization. Default: `false`.
    pub strip_annotations: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig {
            recurse: true,
            strip_annotations: false,
        }
    }
}

/// The feature-oriented specialization processor.
///
/// Owns one run over one loaded closure: the registry, the active feature
/// bindings and the configuration. All run state lives here; nothing is
/// kept in globals.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use variscope::{FeatureBindings, Processor, ProcessorConfig};
/// use variscope::annotations::VariabilityAnnotation;
/// use variscope::model::builder::ClassBuilder;
/// use variscope::model::registry::ClassRegistry;
///
/// let registry = Arc::new(ClassRegistry::new());
/// ClassBuilder::new("monitoring.Probe")
///     .variability(VariabilityAnnotation::new(["monitoring"]))
///     .build(&registry)?;
///
/// // "monitoring" is unbound and removeIfDisabled defaults to true:
/// // the probe class is erased.
/// let processor = Processor::new(
///     registry.clone(),
///     FeatureBindings::new(),
///     ProcessorConfig::default(),
/// );
/// let report = processor.process()?;
/// assert_eq!(report.removed_classes, 1);
/// assert_eq!(registry.class_count(), 0);
/// # Ok::<(), variscope::Error>(())
/// ```
pub struct Processor {
    registry: Arc<ClassRegistry>,
    bindings: FeatureBindings,
    config: ProcessorConfig,
}

impl Processor {
    /// Creates a processor over an already-loaded closure.
    #[must_use]
    pub fn new(
        registry: Arc<ClassRegistry>,
        bindings: FeatureBindings,
        config: ProcessorConfig,
    ) -> Self {
        Processor {
            registry,
            bindings,
            config,
        }
    }

    /// Runs the full specialization: mark, rewrite, eliminate (and
    /// optionally strip).
    ///
    /// # Errors
    /// Propagates the first [`crate::Error::Rewrite`] or
    /// [`crate::Error::Structural`]; the run aborts as a whole and the
    /// driver must discard the model instead of writing an artifact.
    pub fn process(&self) -> Result<ProcessReport> {
        let removal = marker::mark(&self.registry, &self.bindings, self.config.recurse);
        info!(
            "mark phase complete: {} classes, {} members scheduled",
            removal.class_count(),
            removal.member_count()
        );

        let ctx = rewriter::RewriteContext::new(
            &self.registry,
            &removal,
            &self.bindings,
            self.config.recurse,
        );
        rewriter::rewrite(&ctx)?;
        let events = ctx.take_events();

        // Hard barrier: nothing is deleted until rewriting has finished
        // for the whole closure.
        let stats = eliminator::eliminate(&self.registry, &removal)?;
        info!(
            "elimination phase complete: {} classes, {} members removed",
            stats.classes, stats.members
        );

        let stripped = if self.config.strip_annotations {
            self.strip_annotations()
        } else {
            0
        };

        Ok(ProcessReport {
            removed_classes: stats.classes,
            removed_members: stats.members,
            patched_sites: events.len(),
            stripped_annotations: stripped,
            events,
        })
    }

    /// Builds the read-only annotation listing over the current closure.
    ///
    /// Every class, field, constructor and method is resolved with the
    /// configured recursion; the referenced ids are grouped under the
    /// scanned class. Performs no mutation.
    #[must_use]
    pub fn list_annotations(&self) -> AnnotationReport {
        let resolver = AnnotationResolver::new(&self.registry);
        let mut report = AnnotationReport::new();

        for class_handle in self.registry.class_handles() {
            let Some(class) = self.registry.class(class_handle) else {
                continue;
            };
            let mut elements: Vec<Handle> = vec![class_handle];
            elements.extend_from_slice(&class.fields);
            elements.extend(class.behaviors());

            for element in elements {
                if let Some(annotation) = resolver.resolve(element, self.config.recurse) {
                    report.append(&class.name, annotation.ids.iter().map(String::as_str));
                }
            }
        }
        report
    }

    /// Removes variability and bound-value metadata from every element of
    /// the current closure, returning how many entries were stripped.
    ///
    /// Usable standalone or, via [`ProcessorConfig::strip_annotations`], as
    /// the final step of [`Processor::process`] so shipped artifacts carry
    /// no leftover configuration metadata.
    pub fn strip_annotations(&self) -> usize {
        let mut stripped = 0;
        for class_handle in self.registry.class_handles() {
            let Some(class) = self.registry.class(class_handle) else {
                continue;
            };
            let mut elements: Vec<Handle> = vec![class_handle];
            elements.extend_from_slice(&class.fields);
            elements.extend(class.behaviors());

            for element in elements {
                if self.registry.take_variability(element).is_some() {
                    stripped += 1;
                }
                if self.registry.take_bound_value(element).is_some() {
                    stripped += 1;
                }
            }
        }
        stripped
    }
}
