//! Inheritance-aware lookup of declarative metadata.
//!
//! An element's annotation may live on the element itself or, when recursive
//! lookup is enabled, somewhere up the inheritance graph: on an ancestor
//! class, or on the structurally matching member an ancestor declares (the
//! annotation is "inherited from the overridden member"). The walk is
//! depth-first — superclass before interfaces, interfaces in declaration
//! order — and the first match wins; annotations are never merged.
//!
//! Lookup failures during the walk (a superclass or interface handle that
//! resolves to nothing, a member whose declaring class vanished) are
//! swallowed as "no annotation on that branch": metadata presence is
//! best-effort and a broken branch must not abort the run. No such failure
//! ever escapes this module.

use std::collections::HashSet;

use crate::{
    annotations::{BoundValueDirective, VariabilityAnnotation},
    model::{
        handle::{Handle, HandleKind},
        registry::ClassRegistry,
        types::TypeDesc,
    },
};

/// Structural identity of a member, used to match overridden members across
/// the hierarchy: fields by name, methods by name and parameter-type
/// sequence, constructors by parameter-type sequence alone.
enum MemberSignature {
    Field { name: String },
    Method { name: String, params: Vec<TypeDesc> },
    Constructor { params: Vec<TypeDesc> },
}

/// Resolves declarative metadata for program elements, optionally walking
/// the inheritance graph.
///
/// # Examples
///
/// ```rust
/// use variscope::annotations::{resolver::AnnotationResolver, VariabilityAnnotation};
/// use variscope::model::builder::{ClassBuilder, MethodBuilder};
/// use variscope::model::registry::ClassRegistry;
///
/// let registry = ClassRegistry::new();
/// let base = ClassBuilder::new("Base")
///     .variability(VariabilityAnnotation::new(["monitoring"]))
///     .build(&registry)?;
/// let derived = ClassBuilder::new("Derived").extends(base).build(&registry)?;
///
/// let resolver = AnnotationResolver::new(&registry);
/// assert!(resolver.resolve(derived, false).is_none());
/// assert!(resolver.resolve(derived, true).is_some());
/// # Ok::<(), variscope::Error>(())
/// ```
pub struct AnnotationResolver<'a> {
    registry: &'a ClassRegistry,
}

impl<'a> AnnotationResolver<'a> {
    /// Creates a resolver over the given registry.
    #[must_use]
    pub fn new(registry: &'a ClassRegistry) -> Self {
        AnnotationResolver { registry }
    }

    /// Resolves the variability annotation of an element.
    ///
    /// Checks the element directly first; with `recurse` the inheritance
    /// graph is searched as described in the module docs. Returns `None`
    /// when no annotation is attached anywhere.
    #[must_use]
    pub fn resolve(&self, element: Handle, recurse: bool) -> Option<VariabilityAnnotation> {
        self.resolve_with(element, recurse, &|r, h| r.variability(h))
    }

    /// Resolves the bound-value directive of an element, with the same walk.
    #[must_use]
    pub fn resolve_bound_value(&self, element: Handle, recurse: bool) -> Option<BoundValueDirective> {
        self.resolve_with(element, recurse, &|r, h| r.bound_value(h))
    }

    fn resolve_with<T>(
        &self,
        element: Handle,
        recurse: bool,
        get: &dyn Fn(&ClassRegistry, Handle) -> Option<T>,
    ) -> Option<T> {
        if let Some(found) = get(self.registry, element) {
            return Some(found);
        }
        if !recurse {
            return None;
        }

        // The type graph is acyclic by host-language guarantee; the visited
        // set guards against malformed or synthetic input anyway.
        let mut visited = HashSet::new();

        match element.kind()? {
            HandleKind::Class => {
                visited.insert(element);
                self.walk_ancestors(element, &mut visited, &mut |class| {
                    get(self.registry, class)
                })
            }
            HandleKind::Field | HandleKind::Method | HandleKind::Constructor => {
                let signature = self.member_signature(element)?;
                let declaring = self.registry.declaring_class(element)?;
                visited.insert(declaring);
                self.walk_ancestors(declaring, &mut visited, &mut |class| {
                    self.matching_member(class, &signature)
                        .and_then(|member| get(self.registry, member))
                })
            }
        }
    }

    /// Depth-first walk over the ancestors of `class` (superclass first,
    /// then interfaces in declaration order), applying `check` to each
    /// ancestor until it yields a match.
    fn walk_ancestors<T>(
        &self,
        class: Handle,
        visited: &mut HashSet<Handle>,
        check: &mut dyn FnMut(Handle) -> Option<T>,
    ) -> Option<T> {
        // A dangling class handle ends this branch silently.
        let class_rc = self.registry.class(class)?;

        let mut ancestors = Vec::with_capacity(1 + class_rc.interfaces.len());
        ancestors.extend(class_rc.superclass);
        ancestors.extend_from_slice(&class_rc.interfaces);

        for ancestor in ancestors {
            if !visited.insert(ancestor) {
                continue;
            }
            if let Some(found) = check(ancestor) {
                return Some(found);
            }
            if let Some(found) = self.walk_ancestors(ancestor, visited, check) {
                return Some(found);
            }
        }
        None
    }

    fn member_signature(&self, member: Handle) -> Option<MemberSignature> {
        match member.kind()? {
            HandleKind::Field => self.registry.field(member).map(|f| MemberSignature::Field {
                name: f.name.clone(),
            }),
            HandleKind::Method => self.registry.method(member).map(|m| MemberSignature::Method {
                name: m.name.clone(),
                params: m.params.clone(),
            }),
            HandleKind::Constructor => {
                self.registry
                    .constructor(member)
                    .map(|c| MemberSignature::Constructor {
                        params: c.params.clone(),
                    })
            }
            HandleKind::Class => None,
        }
    }

    fn matching_member(&self, class: Handle, signature: &MemberSignature) -> Option<Handle> {
        match signature {
            MemberSignature::Field { name } => self.registry.find_field(class, name),
            MemberSignature::Method { name, params } => {
                self.registry.find_method(class, name, params)
            }
            MemberSignature::Constructor { params } => {
                self.registry.find_constructor(class, params)
            }
        }
    }
}
