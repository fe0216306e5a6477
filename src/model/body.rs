//! Behavior bodies as sequences of classified constructs.
//!
//! A body is not a full instruction stream: the model provider has already
//! classified every syntactic occurrence that can reference a removable
//! element into one of the nine [`SiteKind`]s. Everything between those
//! sites is opaque to the rewrite engine and is not represented.
//!
//! Replacement fragments use the host compiler's positional placeholder
//! notation: `$_` binds the result of the construct, `$1`..`$n` its
//! operands (for an array creation, the dimension sizes), and `$$` the full
//! argument list. An empty fragment is a plain no-op.

use strum::Display;

use crate::{model::handle::Handle, Error, Result};

/// One syntactic occurrence in a body that can reference a removable
/// element.
///
/// This is a closed union on purpose: the rewrite engine dispatches with one
/// total match, so a newly added construct kind that lacks a rewrite rule is
/// a compile-time error instead of a silent no-op.
#[derive(Clone, Debug, PartialEq, Eq, Display)]
pub enum SiteKind {
    /// A cast to a class type
    Cast {
        /// The class cast to
        target: Handle,
    },
    /// An `instanceof` test against a class type
    InstanceofTest {
        /// The class tested against
        target: Handle,
    },
    /// A read of a field's value
    FieldRead {
        /// The field read
        field: Handle,
    },
    /// A write of a field's value
    FieldWrite {
        /// The field written
        field: Handle,
    },
    /// An invocation of a method
    MethodCall {
        /// The method invoked
        method: Handle,
    },
    /// An explicit `super(...)` / `this(...)` constructor call
    CtorCall {
        /// The constructor invoked
        ctor: Handle,
    },
    /// An object creation, `new T(...)`
    NewObject {
        /// The constructor invoked by the creation
        ctor: Handle,
    },
    /// An array creation, `new T[...]...`
    NewArray {
        /// The component class of the array
        component: Handle,
        /// Number of dimensions being created
        dims: u8,
    },
    /// An exception handler (catch clause)
    CatchHandler {
        /// The caught class
        caught: Handle,
    },
}

impl SiteKind {
    /// The handle of the program element this site references.
    #[must_use]
    pub fn referenced(&self) -> Handle {
        match self {
            SiteKind::Cast { target } | SiteKind::InstanceofTest { target } => *target,
            SiteKind::FieldRead { field } | SiteKind::FieldWrite { field } => *field,
            SiteKind::MethodCall { method } => *method,
            SiteKind::CtorCall { ctor } | SiteKind::NewObject { ctor } => *ctor,
            SiteKind::NewArray { component, .. } => *component,
            SiteKind::CatchHandler { caught } => *caught,
        }
    }
}

/// A classified construct plus the original source text it was lifted from.
///
/// The text is carried for diagnostics and event logs only; rewrite
/// decisions depend exclusively on the kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Site {
    /// What kind of construct this is and what it references
    pub kind: SiteKind,
    /// Original source text of the construct
    pub text: String,
}

impl Site {
    /// Creates a site with its original source text.
    #[must_use]
    pub fn new(kind: SiteKind, text: &str) -> Self {
        Site {
            kind,
            text: text.to_string(),
        }
    }
}

/// A validated replacement source fragment.
///
/// Fragments come from two places: generated by the rewrite rules (defaults,
/// no-ops, baked literals) and author-supplied override values. Both go
/// through the syntactic checks here; semantic correctness of overrides is
/// the author's responsibility.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SourceFragment(String);

impl SourceFragment {
    /// The empty fragment: replacing a construct with it turns the construct
    /// into a no-op (for an exception handler, it drops the handler).
    #[must_use]
    pub fn noop() -> Self {
        SourceFragment(String::new())
    }

    /// Validates an expression fragment: non-empty, balanced `()`/`[]`,
    /// closed string/char literals, and no statement terminator.
    ///
    /// # Errors
    /// Returns [`Error::Fragment`] describing the first violation.
    pub fn expression(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(Error::Fragment("expression is empty".to_string()));
        }
        if text.contains(';') {
            return Err(Error::Fragment(format!(
                "expression '{}' contains a statement terminator",
                text
            )));
        }
        check_balanced(text)?;
        Ok(SourceFragment(text.to_string()))
    }

    /// Validates a type-name fragment: a dot-separated chain of identifiers.
    ///
    /// # Errors
    /// Returns [`Error::Fragment`] if the text is not a well-formed dotted
    /// type name.
    pub fn type_name(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(Error::Fragment("type name is empty".to_string()));
        }
        for segment in text.split('.') {
            let mut chars = segment.chars();
            let valid_head = chars
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
            if !valid_head || !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
                return Err(Error::Fragment(format!(
                    "'{}' is not a valid type name",
                    text
                )));
            }
        }
        Ok(SourceFragment(text.to_string()))
    }

    /// Builds a fragment from already-validated parts. Used by the rewrite
    /// rules, which only interpolate validated fragments and literals.
    #[must_use]
    pub(crate) fn assembled(text: String) -> Self {
        SourceFragment(text)
    }

    /// The fragment text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the no-op fragment.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.0.is_empty()
    }
}

/// Scans for balanced parentheses/brackets and closed quotes.
fn check_balanced(text: &str) -> Result<()> {
    let mut depth_paren = 0i32;
    let mut depth_bracket = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => depth_paren += 1,
            ')' => depth_paren -= 1,
            '[' => depth_bracket += 1,
            ']' => depth_bracket -= 1,
            _ => {}
        }
        if depth_paren < 0 || depth_bracket < 0 {
            break;
        }
    }

    if depth_paren != 0 || depth_bracket != 0 || quote.is_some() {
        return Err(Error::Fragment(format!(
            "'{}' has unbalanced delimiters",
            text
        )));
    }
    Ok(())
}

/// One entry of a behavior body: either a still-live site or the fragment
/// that replaced one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Construct {
    /// A classified construct that still references program elements
    Site(Site),
    /// A replacement fragment; references nothing
    Fragment(SourceFragment),
}

/// The body of one method or constructor.
#[derive(Clone, Debug, Default)]
pub struct Body {
    constructs: Vec<Construct>,
}

impl Body {
    /// Creates a body from classified sites in encounter order.
    #[must_use]
    pub fn new(sites: Vec<Site>) -> Self {
        Body {
            constructs: sites.into_iter().map(Construct::Site).collect(),
        }
    }

    /// All constructs, in encounter order.
    #[must_use]
    pub fn constructs(&self) -> &[Construct] {
        &self.constructs
    }

    /// The still-live sites, with their construct indices.
    pub fn sites(&self) -> impl Iterator<Item = (usize, &Site)> {
        self.constructs
            .iter()
            .enumerate()
            .filter_map(|(i, c)| match c {
                Construct::Site(site) => Some((i, site)),
                Construct::Fragment(_) => None,
            })
    }

    /// Replaces the construct at `index` with a source fragment.
    ///
    /// # Errors
    /// Returns a structural error if `index` does not denote a construct.
    pub fn replace(&mut self, index: usize, fragment: SourceFragment) -> Result<()> {
        match self.constructs.get_mut(index) {
            Some(construct) => {
                *construct = Construct::Fragment(fragment);
                Ok(())
            }
            None => Err(structural_error!(
                "construct index {} out of bounds ({} constructs)",
                index,
                self.constructs.len()
            )),
        }
    }
}
