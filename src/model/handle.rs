//! Stable, opaque element identity.

use std::fmt;
use std::hash::{Hash, Hasher};

use strum::{EnumIter, FromRepr};

/// The kind of program element a [`Handle`] refers to.
///
/// Encoded in the high byte of the handle value so that a handle alone is
/// enough to route a lookup to the right arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, FromRepr)]
#[repr(u8)]
pub enum HandleKind {
    /// A class (or interface) declaration
    Class = 0x02,
    /// A field declaration
    Field = 0x04,
    /// A method declaration
    Method = 0x06,
    /// A constructor declaration
    Constructor = 0x07,
}

/// A stable, opaque identity for one program element.
///
/// Handles consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the element kind
/// - The low 24 bits (bits 0-23) indicate the arena index within that kind
///
/// A handle is assigned once at load time and stays valid for the duration of
/// one run; removal sets and override caches key by handle, never by reference
/// identity, so model rebuilds cannot alias.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Handle(pub u32);

impl Handle {
    /// Creates a new handle from a kind and an arena index.
    ///
    /// The index must fit into 24 bits; higher bits are masked off.
    #[must_use]
    pub fn new(kind: HandleKind, index: u32) -> Self {
        Handle(((kind as u32) << 24) | (index & 0x00FF_FFFF))
    }

    /// Returns the raw handle value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the element kind from the handle (high byte).
    ///
    /// Returns `None` for values whose high byte is not a known kind, which
    /// only happens for handles that were never produced by the arena.
    #[must_use]
    pub fn kind(&self) -> Option<HandleKind> {
        HandleKind::from_repr((self.0 >> 24) as u8)
    }

    /// Extracts the arena index from the handle (low 24 bits)
    #[must_use]
    pub fn index(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null handle (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if this handle refers to a class
    #[must_use]
    pub fn is_class(&self) -> bool {
        self.kind() == Some(HandleKind::Class)
    }

    /// Returns true if this handle refers to a member (field, method or constructor)
    #[must_use]
    pub fn is_member(&self) -> bool {
        matches!(
            self.kind(),
            Some(HandleKind::Field) | Some(HandleKind::Method) | Some(HandleKind::Constructor)
        )
    }
}

impl From<u32> for Handle {
    fn from(value: u32) -> Self {
        Handle(value)
    }
}

impl From<Handle> for u32 {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handle(0x{:08x}, kind: {:?}, index: {})",
            self.0,
            self.kind(),
            self.index()
        )
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
