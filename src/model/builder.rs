//! Fluent construction of classes, members and bodies.
//!
//! The engine itself never builds a model; drivers that synthesize one (and
//! the test suites) do. Builders are consuming: configure, then `build` into
//! a registry, which allocates the handle and wires the element into its
//! declaring class.
//!
//! # Examples
//!
//! ```rust
//! use variscope::model::builder::{ClassBuilder, MethodBuilder};
//! use variscope::model::registry::ClassRegistry;
//! use variscope::model::types::TypeDesc;
//! use variscope::annotations::VariabilityAnnotation;
//!
//! let registry = ClassRegistry::new();
//! let logger = ClassBuilder::new("logging.Logger")
//!     .variability(VariabilityAnnotation::new(["logging"]))
//!     .build(&registry)?;
//! let log = MethodBuilder::new(logger, "log")
//!     .param(TypeDesc::named("String"))
//!     .build(&registry)?;
//! # Ok::<(), variscope::Error>(())
//! ```

use crate::{
    annotations::{BoundValueDirective, VariabilityAnnotation},
    model::{
        body::{Body, Site},
        elements::{Class, ClassFlags, Constructor, ElementMetadata, Field, MemberFlags, Method},
        handle::{Handle, HandleKind},
        registry::ClassRegistry,
        types::TypeDesc,
    },
    Result,
};

/// Builder for a class declaration.
pub struct ClassBuilder {
    name: String,
    flags: ClassFlags,
    superclass: Option<Handle>,
    interfaces: Vec<Handle>,
    metadata: ElementMetadata,
}

impl ClassBuilder {
    /// Starts a class with the given fully qualified name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        ClassBuilder {
            name: name.to_string(),
            flags: ClassFlags::PUBLIC,
            superclass: None,
            interfaces: Vec::new(),
            metadata: ElementMetadata::default(),
        }
    }

    /// Sets the modifier flags.
    #[must_use]
    pub fn flags(mut self, flags: ClassFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the superclass.
    #[must_use]
    pub fn extends(mut self, superclass: Handle) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Adds an implemented interface; call order is declaration order.
    #[must_use]
    pub fn implements(mut self, interface: Handle) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Attaches a variability annotation.
    #[must_use]
    pub fn variability(mut self, annotation: VariabilityAnnotation) -> Self {
        self.metadata.variability = Some(annotation);
        self
    }

    /// Registers the class and returns its handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateClass`] if the name is taken.
    pub fn build(self, registry: &ClassRegistry) -> Result<Handle> {
        let handle = registry.alloc(HandleKind::Class);
        registry.insert_class(Class {
            handle,
            name: self.name,
            flags: self.flags,
            superclass: self.superclass,
            interfaces: self.interfaces,
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            metadata: self.metadata,
        })?;
        Ok(handle)
    }
}

/// Builder for a field declaration.
pub struct FieldBuilder {
    declaring: Handle,
    name: String,
    ty: TypeDesc,
    flags: MemberFlags,
    metadata: ElementMetadata,
}

impl FieldBuilder {
    /// Starts a field of the given declaring class, name and type.
    #[must_use]
    pub fn new(declaring: Handle, name: &str, ty: TypeDesc) -> Self {
        FieldBuilder {
            declaring,
            name: name.to_string(),
            ty,
            flags: MemberFlags::empty(),
            metadata: ElementMetadata::default(),
        }
    }

    /// Sets the modifier flags.
    #[must_use]
    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Attaches a variability annotation.
    #[must_use]
    pub fn variability(mut self, annotation: VariabilityAnnotation) -> Self {
        self.metadata.variability = Some(annotation);
        self
    }

    /// Attaches a bound-value directive.
    #[must_use]
    pub fn bound_value(mut self, directive: BoundValueDirective) -> Self {
        self.metadata.bound_value = Some(directive);
        self
    }

    /// Registers the field and returns its handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::HandleNotFound`] if the declaring class does
    /// not exist.
    pub fn build(self, registry: &ClassRegistry) -> Result<Handle> {
        let handle = registry.alloc(HandleKind::Field);
        registry.insert_field(Field {
            handle,
            name: self.name,
            declaring: self.declaring,
            ty: self.ty,
            flags: self.flags,
            metadata: self.metadata,
        })?;
        Ok(handle)
    }
}

/// Builder for a method declaration.
pub struct MethodBuilder {
    declaring: Handle,
    name: String,
    params: Vec<TypeDesc>,
    ret: TypeDesc,
    flags: MemberFlags,
    metadata: ElementMetadata,
    sites: Vec<Site>,
}

impl MethodBuilder {
    /// Starts a void, parameterless method of the given declaring class.
    #[must_use]
    pub fn new(declaring: Handle, name: &str) -> Self {
        MethodBuilder {
            declaring,
            name: name.to_string(),
            params: Vec::new(),
            ret: TypeDesc::Void,
            flags: MemberFlags::PUBLIC,
            metadata: ElementMetadata::default(),
            sites: Vec::new(),
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, ty: TypeDesc) -> Self {
        self.params.push(ty);
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn returns(mut self, ty: TypeDesc) -> Self {
        self.ret = ty;
        self
    }

    /// Sets the modifier flags.
    #[must_use]
    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Attaches a variability annotation.
    #[must_use]
    pub fn variability(mut self, annotation: VariabilityAnnotation) -> Self {
        self.metadata.variability = Some(annotation);
        self
    }

    /// Appends a classified site to the method body.
    #[must_use]
    pub fn site(mut self, site: Site) -> Self {
        self.sites.push(site);
        self
    }

    /// Registers the method (and its body, if any sites were added) and
    /// returns its handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::HandleNotFound`] if the declaring class does
    /// not exist.
    pub fn build(self, registry: &ClassRegistry) -> Result<Handle> {
        let handle = registry.alloc(HandleKind::Method);
        let has_body = !self.flags.contains(MemberFlags::ABSTRACT);
        registry.insert_method(Method {
            handle,
            name: self.name,
            declaring: self.declaring,
            params: self.params,
            ret: self.ret,
            flags: self.flags,
            metadata: self.metadata,
        })?;
        if has_body {
            registry.set_body(handle, Body::new(self.sites));
        }
        Ok(handle)
    }
}

/// Builder for a constructor declaration.
pub struct ConstructorBuilder {
    declaring: Handle,
    params: Vec<TypeDesc>,
    flags: MemberFlags,
    metadata: ElementMetadata,
    sites: Vec<Site>,
}

impl ConstructorBuilder {
    /// Starts a parameterless constructor of the given declaring class.
    #[must_use]
    pub fn new(declaring: Handle) -> Self {
        ConstructorBuilder {
            declaring,
            params: Vec::new(),
            flags: MemberFlags::PUBLIC,
            metadata: ElementMetadata::default(),
            sites: Vec::new(),
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, ty: TypeDesc) -> Self {
        self.params.push(ty);
        self
    }

    /// Sets the modifier flags.
    #[must_use]
    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Attaches a variability annotation.
    #[must_use]
    pub fn variability(mut self, annotation: VariabilityAnnotation) -> Self {
        self.metadata.variability = Some(annotation);
        self
    }

    /// Appends a classified site to the constructor body.
    #[must_use]
    pub fn site(mut self, site: Site) -> Self {
        self.sites.push(site);
        self
    }

    /// Registers the constructor and its body and returns its handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::HandleNotFound`] if the declaring class does
    /// not exist.
    pub fn build(self, registry: &ClassRegistry) -> Result<Handle> {
        let handle = registry.alloc(HandleKind::Constructor);
        registry.insert_constructor(Constructor {
            handle,
            declaring: self.declaring,
            params: self.params,
            flags: self.flags,
            metadata: self.metadata,
        })?;
        registry.set_body(handle, Body::new(self.sites));
        Ok(handle)
    }
}
