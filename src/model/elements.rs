//! The program elements of the class model.
//!
//! Elements are plain data carried behind `Arc` in the registry arenas; the
//! registry clones-on-write during the elimination phase, so holders of stale
//! `Arc`s observe the pre-deletion snapshot, never a torn one.

use std::sync::Arc;

use bitflags::bitflags;

use crate::{
    annotations::{BoundValueDirective, VariabilityAnnotation},
    model::{handle::Handle, types::TypeDesc},
};

bitflags! {
    /// Modifier flags of a class declaration.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct ClassFlags: u32 {
        /// Publicly accessible
        const PUBLIC = 0x0001;
        /// Cannot be subclassed
        const FINAL = 0x0010;
        /// Interface declaration
        const INTERFACE = 0x0200;
        /// Cannot be instantiated
        const ABSTRACT = 0x0400;
    }
}

bitflags! {
    /// Modifier flags of a member declaration.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct MemberFlags: u32 {
        /// Publicly accessible
        const PUBLIC = 0x0001;
        /// Class-level member (no receiver); the rewriter's value-baking
        /// rule only applies to static field writes
        const STATIC = 0x0008;
        /// Cannot be overridden / reassigned
        const FINAL = 0x0010;
        /// Declared without a body
        const ABSTRACT = 0x0400;
    }
}

/// Declarative metadata slots of one program element.
///
/// Queried by the annotation resolver; consumed (removed as a side effect)
/// by the optional strip pass.
#[derive(Clone, Debug, Default)]
pub struct ElementMetadata {
    /// Attached variability annotation, if any
    pub variability: Option<VariabilityAnnotation>,
    /// Attached bound-value directive, if any (fields only, by construction)
    pub bound_value: Option<BoundValueDirective>,
}

impl ElementMetadata {
    /// True if no metadata of any kind is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variability.is_none() && self.bound_value.is_none()
    }
}

/// Reference counted class
pub type ClassRc = Arc<Class>;
/// Reference counted field
pub type FieldRc = Arc<Field>;
/// Reference counted method
pub type MethodRc = Arc<Method>;
/// Reference counted constructor
pub type ConstructorRc = Arc<Constructor>;

/// A class (or interface) of the loaded closure.
///
/// Member lists hold handles in declaration order; interface order matters to
/// the annotation resolver, which walks them depth-first after the
/// superclass.
#[derive(Clone, Debug)]
pub struct Class {
    /// Stable identity of this class
    pub handle: Handle,
    /// Fully qualified name
    pub name: String,
    /// Modifier flags
    pub flags: ClassFlags,
    /// Superclass, if this class extends one inside the loaded closure
    pub superclass: Option<Handle>,
    /// Implemented interfaces, in declaration order
    pub interfaces: Vec<Handle>,
    /// Declared fields, in declaration order
    pub fields: Vec<Handle>,
    /// Declared constructors, in declaration order
    pub constructors: Vec<Handle>,
    /// Declared methods, in declaration order
    pub methods: Vec<Handle>,
    /// Attached declarative metadata
    pub metadata: ElementMetadata,
}

impl Class {
    /// Handles of all declared behaviors (constructors first, then methods),
    /// the iteration unit of the rewrite phase.
    #[must_use]
    pub fn behaviors(&self) -> Vec<Handle> {
        let mut all = Vec::with_capacity(self.constructors.len() + self.methods.len());
        all.extend_from_slice(&self.constructors);
        all.extend_from_slice(&self.methods);
        all
    }
}

/// A field declaration.
#[derive(Clone, Debug)]
pub struct Field {
    /// Stable identity of this field
    pub handle: Handle,
    /// Field name
    pub name: String,
    /// The class declaring this field
    pub declaring: Handle,
    /// Declared type
    pub ty: TypeDesc,
    /// Modifier flags
    pub flags: MemberFlags,
    /// Attached declarative metadata
    pub metadata: ElementMetadata,
}

/// A method declaration.
#[derive(Clone, Debug)]
pub struct Method {
    /// Stable identity of this method
    pub handle: Handle,
    /// Method name
    pub name: String,
    /// The class declaring this method
    pub declaring: Handle,
    /// Parameter types, in declaration order
    pub params: Vec<TypeDesc>,
    /// Return type
    pub ret: TypeDesc,
    /// Modifier flags
    pub flags: MemberFlags,
    /// Attached declarative metadata
    pub metadata: ElementMetadata,
}

/// A constructor declaration.
///
/// Constructors carry no name of their own; identity within a class is the
/// parameter-type sequence.
#[derive(Clone, Debug)]
pub struct Constructor {
    /// Stable identity of this constructor
    pub handle: Handle,
    /// The class declaring this constructor
    pub declaring: Handle,
    /// Parameter types, in declaration order
    pub params: Vec<TypeDesc>,
    /// Modifier flags
    pub flags: MemberFlags,
    /// Attached declarative metadata
    pub metadata: ElementMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::handle::HandleKind;

    #[test]
    fn test_behavior_order() {
        let class = Class {
            handle: Handle::new(HandleKind::Class, 1),
            name: "App".to_string(),
            flags: ClassFlags::PUBLIC,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            constructors: vec![Handle::new(HandleKind::Constructor, 1)],
            methods: vec![
                Handle::new(HandleKind::Method, 1),
                Handle::new(HandleKind::Method, 2),
            ],
            metadata: ElementMetadata::default(),
        };

        let behaviors = class.behaviors();
        assert_eq!(behaviors.len(), 3);
        assert_eq!(behaviors[0].kind(), Some(HandleKind::Constructor));
        assert_eq!(behaviors[1], Handle::new(HandleKind::Method, 1));
    }

    #[test]
    fn test_metadata_empty() {
        assert!(ElementMetadata::default().is_empty());

        let meta = ElementMetadata {
            variability: Some(crate::annotations::VariabilityAnnotation::new(["x"])),
            bound_value: None,
        };
        assert!(!meta.is_empty());
    }
}
