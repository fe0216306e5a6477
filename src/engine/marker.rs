//! The decision phase: scan the whole closure, build the removal set.

use log::debug;

use crate::{
    annotations::resolver::AnnotationResolver,
    engine::{bindings::FeatureBindings, evaluator::should_remove, removal::RemovalSet},
    model::registry::ClassRegistry,
};

/// Scans every loaded class and builds the frozen [`RemovalSet`].
///
/// For each class the removal verdict is evaluated first; a removed class is
/// recorded and its members are NOT scanned (class removal subsumes member
/// removal). Kept classes have each declared field, constructor and method
/// evaluated independently. The scan is read-only and visits every declared
/// member of every loaded class exactly once, in handle order, so identical
/// inputs always produce identical sets.
#[must_use]
pub fn mark(registry: &ClassRegistry, bindings: &FeatureBindings, recurse: bool) -> RemovalSet {
    let resolver = AnnotationResolver::new(registry);
    let mut removal = RemovalSet::new();

    for class_handle in registry.class_handles() {
        let annotation = resolver.resolve(class_handle, recurse);
        if should_remove(annotation.as_ref(), bindings) {
            debug!("marking class {} for removal", registry.element_name(class_handle));
            removal.insert_class(class_handle);
            continue;
        }

        let Some(class) = registry.class(class_handle) else {
            continue;
        };
        for member in class
            .fields
            .iter()
            .chain(class.constructors.iter())
            .chain(class.methods.iter())
        {
            let annotation = resolver.resolve(*member, recurse);
            if should_remove(annotation.as_ref(), bindings) {
                debug!("marking member {} for removal", registry.element_name(*member));
                removal.insert_member(*member);
            }
        }
    }

    removal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        annotations::VariabilityAnnotation,
        model::{
            builder::{ClassBuilder, ConstructorBuilder, FieldBuilder, MethodBuilder},
            types::{PrimitiveKind, TypeDesc},
        },
    };

    #[test]
    fn test_class_removal_subsumes_members() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::new("Sensor")
            .variability(VariabilityAnnotation::new(["sensors"]))
            .build(&registry)
            .unwrap();
        // Member annotated with the same id; it must NOT be marked
        // separately once the class itself is.
        let field = FieldBuilder::new(class, "value", TypeDesc::Primitive(PrimitiveKind::Int))
            .variability(VariabilityAnnotation::new(["sensors"]))
            .build(&registry)
            .unwrap();

        let removal = mark(&registry, &FeatureBindings::new(), true);
        assert!(removal.is_class_removed(class));
        assert!(!removal.is_member_removed(field));
        assert_eq!(removal.member_count(), 0);
    }

    #[test]
    fn test_members_evaluated_independently() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::new("App").build(&registry).unwrap();
        let removed = MethodBuilder::new(class, "trace")
            .variability(VariabilityAnnotation::new(["tracing"]))
            .build(&registry)
            .unwrap();
        let kept = MethodBuilder::new(class, "run").build(&registry).unwrap();
        let ctor = ConstructorBuilder::new(class)
            .variability(VariabilityAnnotation::new(["other"]))
            .build(&registry)
            .unwrap();

        let bindings: FeatureBindings = ["other"].into_iter().collect();
        let removal = mark(&registry, &bindings, true);

        assert!(removal.is_member_removed(removed));
        assert!(!removal.is_member_removed(kept));
        assert!(!removal.is_member_removed(ctor));
        assert!(!removal.is_class_removed(class));
    }

    #[test]
    fn test_mark_is_deterministic() {
        let registry = ClassRegistry::new();
        for i in 0..16 {
            let class = ClassBuilder::new(&format!("pkg.C{}", i))
                .variability(VariabilityAnnotation::new(["feature"]))
                .build(&registry)
                .unwrap();
            let _ = MethodBuilder::new(class, "m").build(&registry).unwrap();
        }

        let bindings = FeatureBindings::new();
        let first = mark(&registry, &bindings, true);
        let second = mark(&registry, &bindings, true);
        assert_eq!(first, second);
        assert_eq!(first.class_count(), 16);
    }

    #[test]
    fn test_inherited_annotation_marks_subclass() {
        let registry = ClassRegistry::new();
        let base = ClassBuilder::new("Base")
            .variability(VariabilityAnnotation::new(["feature"]))
            .build(&registry)
            .unwrap();
        let derived = ClassBuilder::new("Derived").extends(base).build(&registry).unwrap();

        let flat = mark(&registry, &FeatureBindings::new(), false);
        assert!(flat.is_class_removed(base));
        assert!(!flat.is_class_removed(derived));

        let recursive = mark(&registry, &FeatureBindings::new(), true);
        assert!(recursive.is_class_removed(base));
        assert!(recursive.is_class_removed(derived));
    }
}
