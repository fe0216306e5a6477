//! Declarative variability metadata attached to program elements.
//!
//! The metadata schema is the only durable format at the boundary to the
//! driver: `{ids: [string], operation: AND|OR|XOR, removeIfDisabled: bool,
//! overrideValue: optional string}`, plus the separate bound-value directive
//! used for configuration baking of static fields.
//!
//! How metadata is attached (class-file attributes, side tables, …) is the
//! model provider's business; this module only defines the decoded form the
//! decision engine consumes.

use std::str::FromStr;

use strum::{Display, EnumString};

pub mod resolver;

/// Boolean connective combining the per-id enablement values of a
/// [`VariabilityAnnotation`].
///
/// Unknown operation strings decode to [`Operation::Unspecified`], which the
/// evaluator treats as a conservative "keep": an annotation whose operation
/// the tool does not understand never removes code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum Operation {
    /// Remove iff every id is enabled (after optional inversion)
    #[strum(serialize = "AND")]
    And,
    /// Remove iff at least one id is enabled
    #[strum(serialize = "OR")]
    Or,
    /// Remove iff an odd number of ids are enabled
    #[strum(serialize = "XOR")]
    Xor,
    /// An operation this tool does not recognize; always keeps
    #[strum(serialize = "UNSPECIFIED")]
    Unspecified,
}

impl Operation {
    /// Decodes an operation from its schema string, mapping anything
    /// unrecognized to [`Operation::Unspecified`].
    #[must_use]
    pub fn from_schema(value: &str) -> Self {
        Operation::from_str(value).unwrap_or(Operation::Unspecified)
    }
}

/// Marks a variable part of the program.
///
/// Attached to a class, field, method or constructor, the annotation states
/// under which boolean combination of feature bindings the element should be
/// erased, and optionally supplies a replacement for its use sites:
///
/// - on a class: `override_value` names a replacement class; the replacement
///   must offer compatible constructors
/// - on a field or method: `override_value` is an expression producing the
///   replacement value
/// - on a constructor: `override_value` is ignored
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariabilityAnnotation {
    /// The feature ids this variability reacts on, in authoring order
    pub ids: Vec<String>,
    /// How the per-id enablement values are combined
    pub op: Operation,
    /// Remove the element when the (combined) id is disabled rather than
    /// enabled; the schema default is `true`
    pub remove_if_disabled: bool,
    /// Replacement source fragment or type name for patched use sites
    pub override_value: Option<String>,
}

impl VariabilityAnnotation {
    /// Creates an annotation with the schema defaults: `AND`,
    /// `removeIfDisabled = true`, no override.
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        VariabilityAnnotation {
            ids: ids.into_iter().map(Into::into).collect(),
            op: Operation::And,
            remove_if_disabled: true,
            override_value: None,
        }
    }

    /// Sets the combination operation.
    #[must_use]
    pub fn with_op(mut self, op: Operation) -> Self {
        self.op = op;
        self
    }

    /// Sets the remove-if-disabled flag.
    #[must_use]
    pub fn with_remove_if_disabled(mut self, remove_if_disabled: bool) -> Self {
        self.remove_if_disabled = remove_if_disabled;
        self
    }

    /// Sets the override fragment. An empty string means "no override", as
    /// in the schema.
    #[must_use]
    pub fn with_override(mut self, value: &str) -> Self {
        self.override_value = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
        self
    }

    /// The override fragment, if present and non-empty.
    #[must_use]
    pub fn override_value(&self) -> Option<&str> {
        self.override_value.as_deref().filter(|v| !v.is_empty())
    }
}

/// Requests that assigned values of a static field be replaced by the bound
/// literal of a feature id (configuration baking).
///
/// Unlike [`VariabilityAnnotation`] this directive never removes anything; it
/// only rewrites the right-hand side of static writes when the referenced id
/// is bound with a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundValueDirective {
    /// The feature id whose bound value is baked in
    pub id: String,
}

impl BoundValueDirective {
    /// Creates a directive for the given feature id.
    #[must_use]
    pub fn new(id: &str) -> Self {
        BoundValueDirective { id: id.to_string() }
    }
}
