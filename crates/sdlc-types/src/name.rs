//! Qualified schema object names.
//!
//! A [`QualName`] is a `(module, name)` pair. `module` is a dotted path
//! (`a::b::c`); `name` is unique within that module, but is not necessarily a
//! bare identifier — per the fully-qualified identifier scheme, `name` may
//! itself carry `@`/`@@`-separated compound segments for pointers, concrete
//! constraints, concrete indexes, and access policies. See the `QualName`
//! constructors below for each of those shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The distinguished module every standard-library object lives under.
///
/// References into this module (and any module nested under it) are legal
/// but never generate DDL nodes: they are presumed to already exist in the
/// host schema.
pub const STD_MODULE: &str = "std";

/// The two polymorphic pseudo-type names, addressable only as `std::anytype`
/// / `std::anytuple`.
pub const ANYTYPE: &str = "anytype";
pub const ANYTUPLE: &str = "anytuple";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QualName {
    module: String,
    name: String,
}

impl QualName {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        QualName {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Parse a canonical `module::name` string.
    ///
    /// Because `module` itself may be a dotted path, this splits on the
    /// *last* `::` separator the declaring context tells us about; callers
    /// that already know the module/name split (the common case) should
    /// prefer [`QualName::new`].
    pub fn parse(module: &str, rest: &str) -> Self {
        QualName::new(module, rest)
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// The local name part. May contain `@`/`@@` compound segments.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn std_anytype() -> Self {
        QualName::new(STD_MODULE, ANYTYPE)
    }

    pub fn std_anytuple() -> Self {
        QualName::new(STD_MODULE, ANYTUPLE)
    }

    /// True if this name lives in the standard library (`std`, or any module
    /// nested under it, e.g. `std::net`). Such names are legal references
    /// but never become DDL graph nodes.
    pub fn is_std(&self) -> bool {
        is_std_module(&self.module)
    }

    /// `module::owner@pointername` — a pointer (link or property) declared
    /// on `owner` (an object type, or another pointer, for link properties).
    pub fn pointer(owner: &QualName, ptr_name: &str) -> Self {
        QualName::new(owner.module.clone(), format!("{}@{}", owner.name, ptr_name))
    }

    /// `module::subject@cons_basename@@signature` — a concrete constraint
    /// bound to `subject` (an object type, scalar type, or pointer).
    pub fn concrete_constraint(subject: &QualName, base_name: &str, signature: &str) -> Self {
        QualName::new(
            subject.module.clone(),
            format!("{}@{}@@{}", subject.name, base_name, signature),
        )
    }

    /// `module::owner@name@@(expr)/(except_expr?)` — a concrete index.
    pub fn concrete_index(owner: &QualName, idx_name: &str, signature: &str) -> Self {
        QualName::new(
            owner.module.clone(),
            format!("{}@{}@@{}", owner.name, idx_name, signature),
        )
    }

    /// `module::owner@policy_name` — an access policy attached to `owner`.
    pub fn access_policy(owner: &QualName, policy_name: &str) -> Self {
        QualName::pointer(owner, policy_name)
    }

    /// `module::name(param-rendering)` — a function, identified by name plus
    /// call-signature fingerprint.
    pub fn function(module: impl Into<String>, name: &str, param_rendering: &str) -> Self {
        QualName::new(module, format!("{name}({param_rendering})"))
    }

    /// Split a pointer-shaped local name (`owner@ptr`) into its owner and
    /// pointer-name parts. Returns `None` if this name has no `@` segment.
    pub fn split_pointer(&self) -> Option<(QualName, &str)> {
        let (owner, ptr) = self.name.split_once('@')?;
        Some((QualName::new(self.module.clone(), owner), ptr))
    }

    /// The short, un-module-qualified local name (no `@`/`@@` compounding
    /// considered — just the raw segment after the module separator).
    pub fn local_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.name)
    }
}

/// Whether `module` is the standard library module, or nested under it.
pub fn is_std_module(module: &str) -> bool {
    module == STD_MODULE || module.starts_with("std::")
}
