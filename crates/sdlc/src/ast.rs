//! The input AST: the shape of SDL declarations handed to the compiler by
//! the parser. The compiler never parses source text itself — it consumes
//! these nodes as already-structured data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sdlc_types::Span;

/// A reference to a name, as written in source: either bare (`Foo`) or
/// already module-qualified (`mymodule::Foo`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ref {
    pub module: Option<String>,
    pub name: String,
    pub span: Option<Span>,
}

impl Ref {
    pub fn bare(name: impl Into<String>) -> Self {
        Ref {
            module: None,
            name: name.into(),
            span: None,
        }
    }

    pub fn qualified(module: impl Into<String>, name: impl Into<String>) -> Self {
        Ref {
            module: Some(module.into()),
            name: name.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    Named(Ref),
    AnyType,
    AnyTuple,
    /// `enum<v1, v2, ...>` — only legal as a scalar base.
    Enum(Vec<String>),
    /// `array<T>`, `tuple<T, U>`, etc. `kind` is the constructor name.
    Collection { kind: String, args: Vec<TypeExpr> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PathAnchor {
    /// `__subject__`, used inside constraint expressions.
    Subject,
    /// Implicit `.` prefix: the enclosing pointer/alias/policy's source.
    Source,
    Global(Ref),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Str(String),
    Bool(bool),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    TypeRef(TypeExpr),
    Call {
        func: Ref,
        args: Vec<Expr>,
    },
    Path {
        anchor: PathAnchor,
        steps: Vec<String>,
    },
    BinOp {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    UnaryOp {
        op: String,
        operand: Box<Expr>,
    },
    Literal(Literal),
    /// Reference to a function parameter by name.
    Param(String),
    Set(Vec<Expr>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: Ref,
    pub value: Expr,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConcreteConstraint {
    pub base: Ref,
    pub args: Vec<Expr>,
    pub subjectexpr: Option<Expr>,
    pub except_expr: Option<Expr>,
    pub inline_expr: Option<Expr>,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConcreteIndex {
    pub name: Option<String>,
    pub expr: Expr,
    pub except_expr: Option<Expr>,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub name: String,
    pub condition: Option<Expr>,
    pub using: Option<Expr>,
    pub span: Option<Span>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Link,
    Property,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub name: String,
    pub kind: PointerKind,
    /// Explicit target type, for a plain (non-computed) pointer.
    pub target: Option<TypeExpr>,
    /// `:=` body, for a computed pointer. Mutually exclusive with `target`.
    pub computed_expr: Option<Expr>,
    pub cardinality: Cardinality,
    pub required: bool,
    pub constraints: Vec<ConcreteConstraint>,
    pub annotations: Vec<Annotation>,
    /// Link properties declared on a link pointer.
    pub pointers: Vec<Pointer>,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Base {
    Named(Ref),
    Enum(Vec<String>, Option<Span>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectTypeDecl {
    pub name: String,
    pub bases: Vec<Base>,
    pub abstract_: bool,
    pub pointers: Vec<Pointer>,
    pub constraints: Vec<ConcreteConstraint>,
    pub annotations: Vec<Annotation>,
    pub access_policies: Vec<AccessPolicy>,
    pub indexes: Vec<ConcreteIndex>,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalarTypeDecl {
    pub name: String,
    pub bases: Vec<Base>,
    pub abstract_: bool,
    pub constraints: Vec<ConcreteConstraint>,
    pub annotations: Vec<Annotation>,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AliasDecl {
    pub name: String,
    pub expr: Expr,
    pub computed_pointers: Vec<Pointer>,
    pub annotations: Vec<Annotation>,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalDecl {
    pub name: String,
    pub target: Option<TypeExpr>,
    pub default: Option<Expr>,
    pub annotations: Vec<Annotation>,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub type_: TypeExpr,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FunctionBody {
    Expr(Expr),
    Native,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeExpr,
    pub body: FunctionBody,
    pub annotations: Vec<Annotation>,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbstractConstraintDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbstractAnnotationDecl {
    pub name: String,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    ObjectType(ObjectTypeDecl),
    ScalarType(ScalarTypeDecl),
    Alias(AliasDecl),
    Global(GlobalDecl),
    Function(FunctionDecl),
    AbstractConstraint(AbstractConstraintDecl),
    AbstractAnnotation(AbstractAnnotationDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::ObjectType(d) => &d.name,
            Decl::ScalarType(d) => &d.name,
            Decl::Alias(d) => &d.name,
            Decl::Global(d) => &d.name,
            Decl::Function(d) => &d.name,
            Decl::AbstractConstraint(d) => &d.name,
            Decl::AbstractAnnotation(d) => &d.name,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Decl::ObjectType(d) => d.span,
            Decl::ScalarType(d) => d.span,
            Decl::Alias(d) => d.span,
            Decl::Global(d) => d.span,
            Decl::Function(d) => d.span,
            Decl::AbstractConstraint(d) => d.span,
            Decl::AbstractAnnotation(d) => d.span,
        }
    }
}

/// The compilation input: declarations grouped by the module they were
/// declared in. Iteration order is document order, which matters for
/// tie-breaking diagnostics and for `orig_` annotation preservation.
pub type Batch = IndexMap<String, Vec<Decl>>;
