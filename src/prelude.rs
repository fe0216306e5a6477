//! # variscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used
//! types from the variscope library. Import this module to get quick access
//! to the essential types for model construction and specialization.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all variscope operations
pub use crate::Error;

/// The result type used throughout variscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The per-run specialization processor and its configuration
pub use crate::engine::{Processor, ProcessorConfig};

/// The active feature configuration of one run
pub use crate::engine::FeatureBindings;

/// Run reports
pub use crate::engine::report::{AnnotationReport, ProcessReport};

// ================================================================================================
// Class Model
// ================================================================================================

/// The arena owning all program elements of one run
pub use crate::model::registry::ClassRegistry;

/// Stable element identity
pub use crate::model::handle::{Handle, HandleKind};

/// Program elements and their modifier flags
pub use crate::model::elements::{
    Class, ClassFlags, ClassRc, Constructor, ConstructorRc, ElementMetadata, Field, FieldRc,
    MemberFlags, Method, MethodRc,
};

/// Behavior bodies and their rewritable constructs
pub use crate::model::body::{Body, Construct, Site, SiteKind, SourceFragment};

/// Declared types
pub use crate::model::types::{PrimitiveKind, TypeDesc};

/// Fluent model construction
pub use crate::model::builder::{ClassBuilder, ConstructorBuilder, FieldBuilder, MethodBuilder};

// ================================================================================================
// Metadata
// ================================================================================================

/// The variability metadata schema
pub use crate::annotations::{BoundValueDirective, Operation, VariabilityAnnotation};

/// Inheritance-aware metadata lookup
pub use crate::annotations::resolver::AnnotationResolver;

// ================================================================================================
// Engine Internals (for drivers that phase manually)
// ================================================================================================

/// The frozen decision-phase output
pub use crate::engine::removal::RemovalSet;

/// The decision-phase scan
pub use crate::engine::marker::mark;

/// The removal verdict fold
pub use crate::engine::evaluator::should_remove;
