//! Central class registry for the loaded program closure.
//!
//! The registry is the arena that owns every program element and hands out
//! the stable [`Handle`] identities everything else keys on. It serves the
//! three engine phases with exactly the access each needs:
//!
//! - **mark**: read-only enumeration of classes and members, metadata and
//!   hierarchy queries;
//! - **rewrite**: shared reads of elements plus per-entry locked mutable
//!   access to bodies (different bodies patch in parallel);
//! - **eliminate**: structural deletion of members and whole classes.
//!
//! # Thread Safety
//!
//! All maps are concurrent (`DashMap`); handle allocation is atomic. Elements
//! are stored behind `Arc` and cloned-on-write for structural mutation, so a
//! reader holding an element `Arc` across the elimination phase sees the
//! pre-deletion snapshot rather than a torn one.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use dashmap::DashMap;

use crate::{
    annotations::{BoundValueDirective, VariabilityAnnotation},
    model::{
        body::Body,
        elements::{
            Class, ClassRc, Constructor, ConstructorRc, ElementMetadata, Field, FieldRc,
            MemberFlags, Method, MethodRc,
        },
        handle::{Handle, HandleKind},
        types::TypeDesc,
    },
    Error, Result,
};

/// The arena owning all program elements of one loaded closure.
///
/// # Examples
///
/// ```rust
/// use variscope::model::registry::ClassRegistry;
/// use variscope::model::builder::ClassBuilder;
///
/// let registry = ClassRegistry::new();
/// let logger = ClassBuilder::new("logging.Logger").build(&registry)?;
///
/// assert_eq!(registry.class_handles(), vec![logger]);
/// assert_eq!(registry.class(logger).unwrap().name, "logging.Logger");
/// # Ok::<(), variscope::Error>(())
/// ```
pub struct ClassRegistry {
    classes: DashMap<Handle, ClassRc>,
    fields: DashMap<Handle, FieldRc>,
    methods: DashMap<Handle, MethodRc>,
    constructors: DashMap<Handle, ConstructorRc>,
    bodies: DashMap<Handle, Body>,
    by_name: DashMap<String, Handle>,
    next_class: AtomicU32,
    next_field: AtomicU32,
    next_method: AtomicU32,
    next_constructor: AtomicU32,
}

impl ClassRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        ClassRegistry {
            classes: DashMap::new(),
            fields: DashMap::new(),
            methods: DashMap::new(),
            constructors: DashMap::new(),
            bodies: DashMap::new(),
            by_name: DashMap::new(),
            next_class: AtomicU32::new(1),
            next_field: AtomicU32::new(1),
            next_method: AtomicU32::new(1),
            next_constructor: AtomicU32::new(1),
        }
    }

    /// Allocates the next handle of the given kind.
    pub(crate) fn alloc(&self, kind: HandleKind) -> Handle {
        let counter = match kind {
            HandleKind::Class => &self.next_class,
            HandleKind::Field => &self.next_field,
            HandleKind::Method => &self.next_method,
            HandleKind::Constructor => &self.next_constructor,
        };
        Handle::new(kind, counter.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a freshly built class.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateClass`] if the fully qualified name is
    /// already taken.
    pub(crate) fn insert_class(&self, class: Class) -> Result<()> {
        if self.by_name.contains_key(&class.name) {
            return Err(Error::DuplicateClass(class.name));
        }
        self.by_name.insert(class.name.clone(), class.handle);
        self.classes.insert(class.handle, Arc::new(class));
        Ok(())
    }

    /// Registers a freshly built field and attaches it to its declaring
    /// class.
    pub(crate) fn insert_field(&self, field: Field) -> Result<()> {
        let handle = field.handle;
        let declaring = field.declaring;
        self.fields.insert(handle, Arc::new(field));
        self.attach_member(declaring, handle)
    }

    /// Registers a freshly built method and attaches it to its declaring
    /// class.
    pub(crate) fn insert_method(&self, method: Method) -> Result<()> {
        let handle = method.handle;
        let declaring = method.declaring;
        self.methods.insert(handle, Arc::new(method));
        self.attach_member(declaring, handle)
    }

    /// Registers a freshly built constructor and attaches it to its
    /// declaring class.
    pub(crate) fn insert_constructor(&self, constructor: Constructor) -> Result<()> {
        let handle = constructor.handle;
        let declaring = constructor.declaring;
        self.constructors.insert(handle, Arc::new(constructor));
        self.attach_member(declaring, handle)
    }

    /// Stores the body of a behavior.
    pub(crate) fn set_body(&self, behavior: Handle, body: Body) {
        self.bodies.insert(behavior, body);
    }

    fn attach_member(&self, declaring: Handle, member: Handle) -> Result<()> {
        let mut entry = self
            .classes
            .get_mut(&declaring)
            .ok_or(Error::HandleNotFound(declaring))?;
        let class = Arc::make_mut(&mut *entry);
        match member.kind() {
            Some(HandleKind::Field) => class.fields.push(member),
            Some(HandleKind::Method) => class.methods.push(member),
            Some(HandleKind::Constructor) => class.constructors.push(member),
            _ => return Err(Error::HandleNotFound(member)),
        }
        Ok(())
    }

    /// All class handles, sorted ascending. The engine iterates classes in
    /// this order so that repeated runs visit elements identically.
    #[must_use]
    pub fn class_handles(&self) -> Vec<Handle> {
        let mut handles: Vec<Handle> = self.classes.iter().map(|e| *e.key()).collect();
        handles.sort_unstable();
        handles
    }

    /// Number of registered classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Looks up a class by handle.
    #[must_use]
    pub fn class(&self, handle: Handle) -> Option<ClassRc> {
        self.classes.get(&handle).map(|e| e.value().clone())
    }

    /// Looks up a class by fully qualified name.
    #[must_use]
    pub fn class_by_name(&self, name: &str) -> Option<Handle> {
        self.by_name.get(name).map(|e| *e.value())
    }

    /// Looks up a field by handle.
    #[must_use]
    pub fn field(&self, handle: Handle) -> Option<FieldRc> {
        self.fields.get(&handle).map(|e| e.value().clone())
    }

    /// Looks up a method by handle.
    #[must_use]
    pub fn method(&self, handle: Handle) -> Option<MethodRc> {
        self.methods.get(&handle).map(|e| e.value().clone())
    }

    /// Looks up a constructor by handle.
    #[must_use]
    pub fn constructor(&self, handle: Handle) -> Option<ConstructorRc> {
        self.constructors.get(&handle).map(|e| e.value().clone())
    }

    /// A snapshot of a behavior's body, if it has one.
    #[must_use]
    pub fn body(&self, behavior: Handle) -> Option<Body> {
        self.bodies.get(&behavior).map(|e| e.value().clone())
    }

    /// Mutable access to a behavior's body; the entry stays locked for the
    /// duration of the guard. Distinct bodies lock independently.
    pub(crate) fn body_mut(
        &self,
        behavior: Handle,
    ) -> Option<dashmap::mapref::one::RefMut<'_, Handle, Body>> {
        self.bodies.get_mut(&behavior)
    }

    /// The declaring class of a member handle.
    #[must_use]
    pub fn declaring_class(&self, member: Handle) -> Option<Handle> {
        match member.kind()? {
            HandleKind::Field => self.field(member).map(|f| f.declaring),
            HandleKind::Method => self.method(member).map(|m| m.declaring),
            HandleKind::Constructor => self.constructor(member).map(|c| c.declaring),
            HandleKind::Class => None,
        }
    }

    /// The modifier flags of a member handle.
    #[must_use]
    pub fn member_flags(&self, member: Handle) -> Option<MemberFlags> {
        match member.kind()? {
            HandleKind::Field => self.field(member).map(|f| f.flags),
            HandleKind::Method => self.method(member).map(|m| m.flags),
            HandleKind::Constructor => self.constructor(member).map(|c| c.flags),
            HandleKind::Class => None,
        }
    }

    // ---- metadata queries ----

    /// The variability annotation attached directly to an element, if any.
    /// No hierarchy walk happens here; that is the resolver's job.
    #[must_use]
    pub fn variability(&self, element: Handle) -> Option<VariabilityAnnotation> {
        self.with_metadata(element, |m| m.variability.clone())?
    }

    /// The bound-value directive attached directly to an element, if any.
    #[must_use]
    pub fn bound_value(&self, element: Handle) -> Option<BoundValueDirective> {
        self.with_metadata(element, |m| m.bound_value.clone())?
    }

    /// Removes and returns the element's variability annotation (the
    /// consume-metadata side effect used by the strip pass).
    pub fn take_variability(&self, element: Handle) -> Option<VariabilityAnnotation> {
        self.with_metadata_mut(element, |m| m.variability.take())?
    }

    /// Removes and returns the element's bound-value directive.
    pub fn take_bound_value(&self, element: Handle) -> Option<BoundValueDirective> {
        self.with_metadata_mut(element, |m| m.bound_value.take())?
    }

    fn with_metadata<R>(
        &self,
        element: Handle,
        f: impl FnOnce(&ElementMetadata) -> R,
    ) -> Option<R> {
        match element.kind()? {
            HandleKind::Class => self.classes.get(&element).map(|e| f(&e.value().metadata)),
            HandleKind::Field => self.fields.get(&element).map(|e| f(&e.value().metadata)),
            HandleKind::Method => self.methods.get(&element).map(|e| f(&e.value().metadata)),
            HandleKind::Constructor => self
                .constructors
                .get(&element)
                .map(|e| f(&e.value().metadata)),
        }
    }

    fn with_metadata_mut<R>(
        &self,
        element: Handle,
        f: impl FnOnce(&mut ElementMetadata) -> R,
    ) -> Option<R> {
        match element.kind()? {
            HandleKind::Class => self
                .classes
                .get_mut(&element)
                .map(|mut e| f(&mut Arc::make_mut(&mut *e).metadata)),
            HandleKind::Field => self
                .fields
                .get_mut(&element)
                .map(|mut e| f(&mut Arc::make_mut(&mut *e).metadata)),
            HandleKind::Method => self
                .methods
                .get_mut(&element)
                .map(|mut e| f(&mut Arc::make_mut(&mut *e).metadata)),
            HandleKind::Constructor => self
                .constructors
                .get_mut(&element)
                .map(|mut e| f(&mut Arc::make_mut(&mut *e).metadata)),
        }
    }

    // ---- signature search (used by the annotation resolver) ----

    /// Finds a declared field of `class` with the given name.
    #[must_use]
    pub fn find_field(&self, class: Handle, name: &str) -> Option<Handle> {
        let class = self.class(class)?;
        class
            .fields
            .iter()
            .copied()
            .find(|&h| self.field(h).is_some_and(|f| f.name == name))
    }

    /// Finds a declared method of `class` with the given name and
    /// parameter-type sequence.
    #[must_use]
    pub fn find_method(&self, class: Handle, name: &str, params: &[TypeDesc]) -> Option<Handle> {
        let class = self.class(class)?;
        class
            .methods
            .iter()
            .copied()
            .find(|&h| {
                self.method(h)
                    .is_some_and(|m| m.name == name && m.params == params)
            })
    }

    /// Finds a declared constructor of `class` with the given parameter-type
    /// sequence.
    #[must_use]
    pub fn find_constructor(&self, class: Handle, params: &[TypeDesc]) -> Option<Handle> {
        let class = self.class(class)?;
        class
            .constructors
            .iter()
            .copied()
            .find(|&h| self.constructor(h).is_some_and(|c| c.params == params))
    }

    // ---- display names ----

    /// A human-readable name for any element, used in errors, events and
    /// reports: `Class`, `Class.field`, `Class.method(int,String)` or
    /// `Class(int)`.
    #[must_use]
    pub fn element_name(&self, element: Handle) -> String {
        let class_name = |h: Handle| {
            self.class(h)
                .map_or_else(|| h.to_string(), |c| c.name.clone())
        };
        match element.kind() {
            Some(HandleKind::Class) => class_name(element),
            Some(HandleKind::Field) => match self.field(element) {
                Some(f) => format!("{}.{}", class_name(f.declaring), f.name),
                None => element.to_string(),
            },
            Some(HandleKind::Method) => match self.method(element) {
                Some(m) => format!(
                    "{}.{}({})",
                    class_name(m.declaring),
                    m.name,
                    join_types(&m.params)
                ),
                None => element.to_string(),
            },
            Some(HandleKind::Constructor) => match self.constructor(element) {
                Some(c) => format!("{}({})", class_name(c.declaring), join_types(&c.params)),
                None => element.to_string(),
            },
            None => element.to_string(),
        }
    }

    // ---- structural deletion (elimination phase) ----

    /// Physically deletes a member: removed from the declaring class's
    /// member list, from its arena, and its body (if any) is dropped.
    ///
    /// # Errors
    /// Returns a structural error if the member or its declaring class is
    /// not present — the mark and delete phases disagree about the model.
    pub fn remove_member(&self, member: Handle) -> Result<()> {
        let declaring = self
            .declaring_class(member)
            .ok_or_else(|| structural_error!("cannot delete unknown member {}", member))?;

        {
            let mut entry = self.classes.get_mut(&declaring).ok_or_else(|| {
                structural_error!("declaring class {} of member {} vanished", declaring, member)
            })?;
            let class = Arc::make_mut(&mut *entry);
            class.fields.retain(|&h| h != member);
            class.methods.retain(|&h| h != member);
            class.constructors.retain(|&h| h != member);
        }

        self.detach_member(member);
        Ok(())
    }

    /// Physically deletes a whole class with all its members and bodies.
    ///
    /// # Errors
    /// Returns a structural error if the class is not present.
    pub fn remove_class(&self, class: Handle) -> Result<()> {
        let class_rc = self
            .class(class)
            .ok_or_else(|| structural_error!("cannot delete unknown class {}", class))?;

        for member in class_rc
            .fields
            .iter()
            .chain(class_rc.constructors.iter())
            .chain(class_rc.methods.iter())
        {
            self.detach_member(*member);
        }
        self.by_name.remove(&class_rc.name);
        self.classes.remove(&class);
        Ok(())
    }

    fn detach_member(&self, member: Handle) {
        self.fields.remove(&member);
        self.methods.remove(&member);
        self.constructors.remove(&member);
        self.bodies.remove(&member);
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        ClassRegistry::new()
    }
}

fn join_types(types: &[TypeDesc]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        annotations::VariabilityAnnotation,
        model::{
            builder::{ClassBuilder, FieldBuilder, MethodBuilder},
            types::PrimitiveKind,
        },
    };

    #[test]
    fn test_duplicate_class_rejected() {
        let registry = ClassRegistry::new();
        ClassBuilder::new("a.B").build(&registry).unwrap();
        let result = ClassBuilder::new("a.B").build(&registry);
        assert!(matches!(result, Err(Error::DuplicateClass(_))));
    }

    #[test]
    fn test_handle_allocation_is_per_kind() {
        let registry = ClassRegistry::new();
        let c1 = registry.alloc(HandleKind::Class);
        let f1 = registry.alloc(HandleKind::Field);
        let c2 = registry.alloc(HandleKind::Class);

        assert_eq!(c1.index(), 1);
        assert_eq!(f1.index(), 1);
        assert_eq!(c2.index(), 2);
        assert_ne!(c1, f1);
    }

    #[test]
    fn test_member_attachment_and_lookup() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::new("Sensor").build(&registry).unwrap();
        let field = FieldBuilder::new(class, "value", TypeDesc::Primitive(PrimitiveKind::Int))
            .build(&registry)
            .unwrap();
        let method = MethodBuilder::new(class, "read")
            .returns(TypeDesc::Primitive(PrimitiveKind::Int))
            .build(&registry)
            .unwrap();

        let class_rc = registry.class(class).unwrap();
        assert_eq!(class_rc.fields, vec![field]);
        assert_eq!(class_rc.methods, vec![method]);
        assert_eq!(registry.declaring_class(field), Some(class));
        assert_eq!(registry.element_name(field), "Sensor.value");
        assert_eq!(registry.element_name(method), "Sensor.read()");
    }

    #[test]
    fn test_take_variability_consumes() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::new("Probe")
            .variability(VariabilityAnnotation::new(["probes"]))
            .build(&registry)
            .unwrap();

        assert!(registry.variability(class).is_some());
        assert!(registry.take_variability(class).is_some());
        assert!(registry.variability(class).is_none());
        assert!(registry.take_variability(class).is_none());
    }

    #[test]
    fn test_remove_member() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::new("Sensor").build(&registry).unwrap();
        let field = FieldBuilder::new(class, "value", TypeDesc::Primitive(PrimitiveKind::Int))
            .build(&registry)
            .unwrap();

        registry.remove_member(field).unwrap();
        assert!(registry.field(field).is_none());
        assert!(registry.class(class).unwrap().fields.is_empty());

        assert!(registry.remove_member(field).is_err());
    }

    #[test]
    fn test_remove_class_drops_members() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::new("Sensor").build(&registry).unwrap();
        let field = FieldBuilder::new(class, "value", TypeDesc::Primitive(PrimitiveKind::Int))
            .build(&registry)
            .unwrap();

        registry.remove_class(class).unwrap();
        assert!(registry.class(class).is_none());
        assert!(registry.field(field).is_none());
        assert!(registry.class_by_name("Sensor").is_none());
    }

    #[test]
    fn test_class_handles_sorted() {
        let registry = ClassRegistry::new();
        let a = ClassBuilder::new("A").build(&registry).unwrap();
        let b = ClassBuilder::new("B").build(&registry).unwrap();
        let c = ClassBuilder::new("C").build(&registry).unwrap();

        assert_eq!(registry.class_handles(), vec![a, b, c]);
    }
}
