//! The host schema: an external collaborator providing lookup into
//! already-materialized schema objects (from a prior compilation, or
//! built-in standard-library definitions). The core never constructs one
//! of these — it is handed a `&dyn HostSchema` by the caller.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sdlc_types::QualName;

use crate::ast::Cardinality;

/// The tagged category of a schema object, used throughout the compiler to
/// distinguish "same name, different kind" collisions and to render
/// human-readable `verbosename`s in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SchemaObjectKind {
    ObjectType,
    ScalarType,
    Link,
    Property,
    Alias,
    Global,
    Function,
    Constraint,
    AccessPolicy,
    Index,
    Annotation,
    AnnotationValue,
    Module,
}

impl SchemaObjectKind {
    /// The noun used in `verbosename` rendering, e.g. `object 'name'`.
    pub fn noun(self) -> &'static str {
        match self {
            SchemaObjectKind::ObjectType => "object",
            SchemaObjectKind::ScalarType => "scalar",
            SchemaObjectKind::Link => "link",
            SchemaObjectKind::Property => "property",
            SchemaObjectKind::Alias => "alias",
            SchemaObjectKind::Global => "global",
            SchemaObjectKind::Function => "function",
            SchemaObjectKind::Constraint => "constraint",
            SchemaObjectKind::AccessPolicy => "access policy",
            SchemaObjectKind::Index => "index",
            SchemaObjectKind::Annotation => "annotation",
            SchemaObjectKind::AnnotationValue => "annotation value",
            SchemaObjectKind::Module => "module",
        }
    }
}

/// A pointer as seen on a host (already-materialized) object: enough
/// information for the inheritance merger to copy it into a subtype that
/// extends a standard-library base.
#[derive(Clone, Debug, PartialEq)]
pub struct HostPointer {
    pub name: String,
    pub kind: crate::ast::PointerKind,
    pub target: QualName,
    pub cardinality: Cardinality,
    pub required: bool,
}

/// An already-materialized schema object, as reported by the host.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct HostObject {
    pub pointers: IndexMap<String, HostPointer>,
}

/// Read-only lookup into schema objects that exist independently of the
/// batch currently being compiled: standard-library definitions, and
/// (for incremental compilation) objects created by a previous batch.
pub trait HostSchema {
    /// Look up an object of a specific kind. Returns `None` if no object of
    /// that name exists, regardless of kind (kind mismatches for an
    /// existing name under a different kind are reported by the caller via
    /// `lookup_any`).
    fn get(&self, name: &QualName, kind: SchemaObjectKind) -> Option<HostObject>;

    /// Look up an object by name irrespective of kind, returning the kind it
    /// was actually declared under. Used to distinguish `UnresolvedReference`
    /// (truly absent) from `InvalidReference` (present, wrong kind).
    fn get_any_kind(&self, name: &QualName) -> Option<SchemaObjectKind>;

    fn get_global(&self, kind: SchemaObjectKind, name: &str) -> Option<HostObject>;

    fn lookup_pointer(&self, owner: &QualName, ptr_name: &str) -> Option<HostPointer>;

    /// All names visible for fuzzy "did you mean" suggestions: the objects
    /// of a given module, plus (when `include_std` is set) the standard
    /// library's.
    fn visible_names(&self, module: &str, include_std: bool) -> Vec<QualName>;
}

/// A `HostSchema` with nothing in it: useful for compiling a batch against
/// no prior state (the common case for building a schema from scratch).
#[derive(Default)]
pub struct EmptyHostSchema;

impl HostSchema for EmptyHostSchema {
    fn get(&self, _name: &QualName, _kind: SchemaObjectKind) -> Option<HostObject> {
        None
    }

    fn get_any_kind(&self, _name: &QualName) -> Option<SchemaObjectKind> {
        None
    }

    fn get_global(&self, _kind: SchemaObjectKind, _name: &str) -> Option<HostObject> {
        None
    }

    fn lookup_pointer(&self, _owner: &QualName, _ptr_name: &str) -> Option<HostPointer> {
        None
    }

    fn visible_names(&self, _module: &str, _include_std: bool) -> Vec<QualName> {
        Vec::new()
    }
}
