// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # variscope
//!
//! Feature-oriented specialization of compiled class models. Given a set of
//! active feature bindings, `variscope` erases the program elements
//! (classes, fields, methods, constructors) whose attached variability
//! metadata says they should be removed under the active configuration, and
//! rewrites every remaining use site so the program stays structurally valid
//! after erasure. One annotated codebase, many lean configuration-specific
//! builds — the classic use case is compiling out optional monitoring
//! instrumentation.
//!
//! ## Features
//!
//! - **Declarative removal metadata** - per-element annotations combining
//!   feature ids with AND/OR/XOR connectives and an optional inversion
//! - **Inheritance-aware resolution** - annotations are found on ancestor
//!   classes and on overridden members, depth-first, first match wins
//! - **Total use-site rewriting** - a closed construct union with one
//!   exhaustive rule table; a forgotten construct kind is a compile-time
//!   error, not a silent no-op
//! - **Strictly phased** - mark (read-only) → rewrite (bodies only) →
//!   eliminate (structure), with a hard barrier before deletion
//! - **Parallel rewriting** - bodies patch concurrently per class; all
//!   shared state is a frozen removal set and thread-safe caches
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use variscope::prelude::*;
//!
//! // Build (or load) a class model...
//! let registry = Arc::new(ClassRegistry::new());
//! ClassBuilder::new("monitoring.Probe")
//!     .variability(VariabilityAnnotation::new(["monitoring"]))
//!     .build(&registry)?;
//!
//! // ...and specialize it for a configuration without "monitoring".
//! let processor = Processor::new(
//!     registry.clone(),
//!     FeatureBindings::new(),
//!     ProcessorConfig::default(),
//! );
//! let report = processor.process()?;
//! assert_eq!(report.removed_classes, 1);
//! # Ok::<(), variscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `variscope` is organized into three key modules:
//!
//! - [`model`] - the arena-backed class model: elements keyed by stable
//!   [`model::handle::Handle`]s, behavior bodies classified into rewritable
//!   constructs, fluent builders
//! - [`annotations`] - the variability metadata schema and the
//!   inheritance-aware [`annotations::resolver::AnnotationResolver`]
//! - [`engine`] - the phased [`Processor`]: binding evaluation, element
//!   marking, site rewriting, element elimination, diagnostics
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`](Result). A run
//! either completes for the whole closure or aborts atomically with the
//! first fatal error — an invalid override fragment
//! ([`Error::Rewrite`]) or a model inconsistency between phases
//! ([`Error::Structural`]). Annotation-resolution misses are never fatal;
//! they simply resolve to "no annotation".
//!
//! ```rust
//! use variscope::Error;
//!
//! # fn handle(result: variscope::Result<()>) {
//! match result {
//!     Ok(()) => println!("specialized"),
//!     Err(Error::Rewrite { element, message }) => {
//!         eprintln!("bad override on {}: {}", element, message);
//!     }
//!     Err(e) => eprintln!("failed: {}", e),
//! }
//! # }
//! ```
#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use variscope::prelude::*;
///
/// let registry = ClassRegistry::new();
/// let handle = ClassBuilder::new("App").build(&registry)?;
/// assert!(registry.class(handle).is_some());
/// # Ok::<(), variscope::Error>(())
/// ```
pub mod prelude;

/// Declarative variability metadata and its inheritance-aware resolution.
///
/// # Key Types
///
/// - [`annotations::VariabilityAnnotation`] - under which binding
///   combination an element is erased, and what replaces its use sites
/// - [`annotations::Operation`] - the AND/OR/XOR connective
/// - [`annotations::BoundValueDirective`] - configuration baking for
///   static fields
/// - [`annotations::resolver::AnnotationResolver`] - lookup with optional
///   hierarchy walk
pub mod annotations;

/// The specialization engine: mark, rewrite and eliminate phases.
///
/// # Key Types
///
/// - [`Processor`] - the per-run entry point
/// - [`engine::removal::RemovalSet`] - the frozen decision-phase output
/// - [`engine::rewriter::RewriteContext`] - shared state of the parallel
///   rewrite pass
/// - [`engine::report::AnnotationReport`] - the operator-facing listing
pub mod engine;

/// The arena-backed class model the engine operates on.
///
/// # Key Types
///
/// - [`model::registry::ClassRegistry`] - owns every element of one run
/// - [`model::handle::Handle`] - stable opaque element identity
/// - [`model::body::SiteKind`] - the closed union of rewritable constructs
/// - [`model::builder::ClassBuilder`] - fluent model construction
pub mod model;

/// `variscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type
/// is always [`Error`]. Used consistently throughout the crate for all
/// fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `variscope` Error type
///
/// The main error type for all operations in this crate. See [`error`]
/// module documentation on the taxonomy and which variants abort a run.
pub use error::Error;

/// Main entry point for specializing a loaded class model.
///
/// See [`engine::Processor`] for the phased processing contract.
pub use engine::{FeatureBindings, Processor, ProcessorConfig};
