//! AST builders and a tiny in-memory `HostSchema` double, shared by this
//! crate's test modules.

use indexmap::IndexMap;
use sdlc_types::QualName;

use crate::ast::*;
use crate::schema::{HostObject, HostPointer, HostSchema, SchemaObjectKind};

pub fn bare(name: &str) -> Ref {
    Ref::bare(name)
}

pub fn qualified(module: &str, name: &str) -> Ref {
    Ref::qualified(module, name)
}

pub fn named(name: &str) -> TypeExpr {
    TypeExpr::Named(bare(name))
}

pub fn std_type(name: &str) -> TypeExpr {
    TypeExpr::Named(qualified("std", name))
}

pub fn path(anchor: PathAnchor, steps: &[&str]) -> Expr {
    Expr::Path {
        anchor,
        steps: steps.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn subject_path(steps: &[&str]) -> Expr {
    path(PathAnchor::Subject, steps)
}

pub fn source_path(steps: &[&str]) -> Expr {
    path(PathAnchor::Source, steps)
}

pub fn int_lit(v: i64) -> Expr {
    Expr::Literal(Literal::Int(v))
}

pub fn binop(op: &str, lhs: Expr, rhs: Expr) -> Expr {
    Expr::BinOp {
        op: op.to_string(),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

pub fn pointer(name: &str, kind: PointerKind, target: TypeExpr, cardinality: Cardinality, required: bool) -> Pointer {
    Pointer {
        name: name.to_string(),
        kind,
        target: Some(target),
        computed_expr: None,
        cardinality,
        required,
        constraints: Vec::new(),
        annotations: Vec::new(),
        pointers: Vec::new(),
        span: None,
    }
}

pub fn required_property(name: &str, target: TypeExpr) -> Pointer {
    pointer(name, PointerKind::Property, target, Cardinality::One, true)
}

pub fn optional_link(name: &str, target: TypeExpr) -> Pointer {
    pointer(name, PointerKind::Link, target, Cardinality::One, false)
}

pub fn computed_pointer(name: &str, expr: Expr) -> Pointer {
    Pointer {
        name: name.to_string(),
        kind: PointerKind::Property,
        target: None,
        computed_expr: Some(expr),
        cardinality: Cardinality::One,
        required: false,
        constraints: Vec::new(),
        annotations: Vec::new(),
        pointers: Vec::new(),
        span: None,
    }
}

pub fn with_constraint(mut p: Pointer, c: ConcreteConstraint) -> Pointer {
    p.constraints.push(c);
    p
}

pub fn expr_constraint(base: &str, inline_expr: Expr) -> ConcreteConstraint {
    ConcreteConstraint {
        base: bare(base),
        args: Vec::new(),
        subjectexpr: None,
        except_expr: None,
        inline_expr: Some(inline_expr),
        span: None,
    }
}

pub fn object_type(name: &str, bases: Vec<Base>, pointers: Vec<Pointer>) -> ObjectTypeDecl {
    ObjectTypeDecl {
        name: name.to_string(),
        bases,
        abstract_: false,
        pointers,
        constraints: Vec::new(),
        annotations: Vec::new(),
        access_policies: Vec::new(),
        indexes: Vec::new(),
        span: None,
    }
}

pub fn abstract_object_type(name: &str, pointers: Vec<Pointer>) -> ObjectTypeDecl {
    ObjectTypeDecl {
        abstract_: true,
        ..object_type(name, Vec::new(), pointers)
    }
}

pub fn scalar_type(name: &str, bases: Vec<Base>) -> ScalarTypeDecl {
    ScalarTypeDecl {
        name: name.to_string(),
        bases,
        abstract_: false,
        constraints: Vec::new(),
        annotations: Vec::new(),
        span: None,
    }
}

pub fn alias(name: &str, expr: Expr) -> AliasDecl {
    AliasDecl {
        name: name.to_string(),
        expr,
        computed_pointers: Vec::new(),
        annotations: Vec::new(),
        span: None,
    }
}

pub fn batch(entries: Vec<(&str, Vec<Decl>)>) -> Batch {
    let mut b: Batch = IndexMap::new();
    for (m, decls) in entries {
        b.insert(m.to_string(), decls);
    }
    b
}

/// A minimal `HostSchema` double backed by plain maps, for tests exercising
/// incremental compilation (a prior batch's objects reappearing as host
/// state) or inheritance from a standard-library base the test wants to
/// give concrete pointers.
#[derive(Default)]
pub struct FakeHostSchema {
    objects: IndexMap<QualName, (SchemaObjectKind, HostObject)>,
}

impl FakeHostSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, name: QualName, kind: SchemaObjectKind, object: HostObject) -> Self {
        self.objects.insert(name, (kind, object));
        self
    }

    pub fn with_empty_object_type(self, name: QualName) -> Self {
        self.with_object(name, SchemaObjectKind::ObjectType, HostObject::default())
    }
}

pub fn host_pointer(name: &str, kind: PointerKind, target: QualName, cardinality: Cardinality, required: bool) -> HostPointer {
    HostPointer {
        name: name.to_string(),
        kind,
        target,
        cardinality,
        required,
    }
}

impl HostSchema for FakeHostSchema {
    fn get(&self, name: &QualName, kind: SchemaObjectKind) -> Option<HostObject> {
        self.objects
            .get(name)
            .filter(|(k, _)| *k == kind)
            .map(|(_, o)| o.clone())
    }

    fn get_any_kind(&self, name: &QualName) -> Option<SchemaObjectKind> {
        self.objects.get(name).map(|(k, _)| *k)
    }

    fn get_global(&self, _kind: SchemaObjectKind, _name: &str) -> Option<HostObject> {
        None
    }

    fn lookup_pointer(&self, owner: &QualName, ptr_name: &str) -> Option<HostPointer> {
        self.objects
            .get(owner)
            .and_then(|(_, o)| o.pointers.get(ptr_name))
            .cloned()
    }

    fn visible_names(&self, module: &str, _include_std: bool) -> Vec<QualName> {
        self.objects
            .keys()
            .filter(|k| k.module() == module)
            .cloned()
            .collect()
    }
}
