//! Folding an annotation and the active bindings into a removal verdict.

use crate::{
    annotations::{Operation, VariabilityAnnotation},
    engine::bindings::FeatureBindings,
};

/// Decides whether an annotated element should be removed under the active
/// bindings.
///
/// Unannotated elements are never removed. Otherwise the accumulator is
/// seeded by the operation (And→true, Or/Xor→false) and each id's
/// enablement — inverted first when `remove_if_disabled` is set — is folded
/// in with the operation's boolean connective. An [`Operation::Unspecified`]
/// annotation always keeps.
///
/// # Examples
///
/// ```rust
/// use variscope::annotations::VariabilityAnnotation;
/// use variscope::engine::evaluator::should_remove;
/// use variscope::FeatureBindings;
///
/// let ann = VariabilityAnnotation::new(["verbose"]).with_remove_if_disabled(false);
/// let off = FeatureBindings::new();
/// let on: FeatureBindings = ["verbose"].into_iter().collect();
///
/// assert!(!should_remove(Some(&ann), &off));
/// assert!(should_remove(Some(&ann), &on));
/// assert!(!should_remove(None, &on));
/// ```
#[must_use]
pub fn should_remove(
    annotation: Option<&VariabilityAnnotation>,
    bindings: &FeatureBindings,
) -> bool {
    let Some(annotation) = annotation else {
        return false;
    };

    let mut remove = match annotation.op {
        Operation::And => true,
        Operation::Or | Operation::Xor | Operation::Unspecified => false,
    };

    for id in &annotation.ids {
        let mut enabled = bindings.contains(id);
        if annotation.remove_if_disabled {
            enabled = !enabled;
        }
        match annotation.op {
            Operation::And => remove &= enabled,
            Operation::Or => remove |= enabled,
            Operation::Xor => remove ^= enabled,
            Operation::Unspecified => {}
        }
    }
    remove
}
