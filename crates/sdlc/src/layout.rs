//! §4.2 Layout Tracer — two-pass population of the objects map and the
//! inheritance graph.

use indexmap::{IndexMap, IndexSet};
use sdlc_types::QualName;

use crate::ast::{
    AbstractAnnotationDecl, AbstractConstraintDecl, AliasDecl, Base, Batch, Decl, FunctionDecl,
    GlobalDecl, ObjectTypeDecl, Param, Pointer, ScalarTypeDecl, TypeExpr,
};
use crate::diagnostics::CompileError;
use crate::resolver::{qualify, resolve_any_ref, ResolveEnv};
use crate::schema::{HostObject, HostSchema, SchemaObjectKind};

/// A type declaration as registered by the layout tracer: either shape of
/// the two "has bases, has pointers" declarations, or a minimal shadow
/// entry synthesized for a standard-library base so the merger has
/// something concrete to copy pointers from.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeEntry {
    Object(ObjectTypeDecl),
    Scalar(ScalarTypeDecl),
    /// Synthesized from the host schema for an `extends`-base living in a
    /// standard-library module. Never becomes a DDL node.
    Shadow { pointers: Vec<Pointer> },
}

impl TypeEntry {
    pub fn bases(&self) -> &[Base] {
        match self {
            TypeEntry::Object(o) => &o.bases,
            TypeEntry::Scalar(s) => &s.bases,
            TypeEntry::Shadow { .. } => &[],
        }
    }

    pub fn pointers(&self) -> &[Pointer] {
        match self {
            TypeEntry::Object(o) => &o.pointers,
            TypeEntry::Shadow { pointers } => pointers,
            TypeEntry::Scalar(_) => &[],
        }
    }
}

/// One entry of the inheritance graph: `item`'s ordering dependencies and
/// merge sources.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct InheritanceGraphEntry {
    pub item: QualName,
    /// Bases that must be created before `item` (standard-library bases
    /// excluded — they need no ordering).
    pub deps: IndexSet<QualName>,
    /// Bases whose pointers must be merged into `item` (includes
    /// standard-library bases, via their shadow entry).
    pub merge: IndexSet<QualName>,
}

#[derive(Default)]
pub struct LayoutResult {
    pub objects: IndexMap<QualName, SchemaObjectKind>,
    pub types: IndexMap<QualName, TypeEntry>,
    pub aliases: IndexMap<QualName, AliasDecl>,
    pub globals: IndexMap<QualName, GlobalDecl>,
    pub functions: IndexMap<QualName, FunctionDecl>,
    pub abstract_constraints: IndexMap<QualName, AbstractConstraintDecl>,
    pub abstract_annotations: IndexMap<QualName, AbstractAnnotationDecl>,
    pub inheritance: Vec<InheritanceGraphEntry>,
}

pub fn trace_layout(batch: &Batch, host: &dyn HostSchema) -> Result<LayoutResult, CompileError> {
    let mut result = LayoutResult::default();
    let empty_aliases = IndexMap::new();

    // Registration pass: every top-level declaration gets a placeholder in
    // `objects` so forward references within the batch resolve.
    for (module, decls) in batch {
        for decl in decls {
            let qn = match decl {
                Decl::Function(f) => {
                    QualName::function(module.clone(), &f.name, &render_params(&f.params))
                }
                _ => QualName::new(module.clone(), decl.name()),
            };
            register(&mut result.objects, qn, decl_kind(decl), decl.span())?;
        }
    }

    // Layout pass: resolve bases, recurse into sub-commands.
    for (module, decls) in batch {
        let env = ResolveEnv::new(module, &empty_aliases);
        for decl in decls {
            match decl {
                Decl::ObjectType(ot) => trace_object_type(&mut result, &env, host, ot)?,
                Decl::ScalarType(st) => trace_scalar_type(&mut result, &env, host, st)?,
                Decl::Alias(a) => trace_alias(&mut result, &env, a)?,
                Decl::Global(g) => trace_global(&mut result, &env, g)?,
                Decl::Function(f) => trace_function(&mut result, &env, f)?,
                Decl::AbstractConstraint(c) => {
                    let qn = QualName::new(module.clone(), c.name.clone());
                    result.abstract_constraints.insert(qn, c.clone());
                }
                Decl::AbstractAnnotation(a) => {
                    let qn = QualName::new(module.clone(), a.name.clone());
                    result.abstract_annotations.insert(qn, a.clone());
                }
            }
        }
    }

    Ok(result)
}

fn decl_kind(decl: &Decl) -> SchemaObjectKind {
    match decl {
        Decl::ObjectType(_) => SchemaObjectKind::ObjectType,
        Decl::ScalarType(_) => SchemaObjectKind::ScalarType,
        Decl::Alias(_) => SchemaObjectKind::Alias,
        Decl::Global(_) => SchemaObjectKind::Global,
        Decl::Function(_) => SchemaObjectKind::Function,
        Decl::AbstractConstraint(_) => SchemaObjectKind::Constraint,
        Decl::AbstractAnnotation(_) => SchemaObjectKind::Annotation,
    }
}

fn register(
    objects: &mut IndexMap<QualName, SchemaObjectKind>,
    qn: QualName,
    kind: SchemaObjectKind,
    span: Option<sdlc_types::Span>,
) -> Result<(), CompileError> {
    if objects.contains_key(&qn) {
        return Err(CompileError::DuplicateDeclaration { name: qn, span });
    }
    objects.insert(qn, kind);
    Ok(())
}

/// Resolve `bases` into ordering-dependency and merge-source sets,
/// enforcing the enum-composition rule, and synthesizing shadow entries
/// for any standard-library base.
fn resolve_bases(
    result: &mut LayoutResult,
    env: &ResolveEnv,
    host: &dyn HostSchema,
    owner_qn: &QualName,
    bases: &[Base],
    span: Option<sdlc_types::Span>,
) -> Result<InheritanceGraphEntry, CompileError> {
    let enum_base = bases.iter().find(|b| matches!(b, Base::Enum(..)));
    if let Some(Base::Enum(_, enum_span)) = enum_base {
        if bases.len() > 1 {
            return Err(CompileError::InvalidEnumComposition {
                name: owner_qn.clone(),
                span: enum_span.or(span),
            });
        }
    }

    let mut entry = InheritanceGraphEntry {
        item: owner_qn.clone(),
        ..Default::default()
    };

    for base in bases {
        let Base::Named(r) = base else {
            continue;
        };
        let base_qn = qualify(r, env);

        if base_qn.is_std() {
            entry.merge.insert(base_qn.clone());
            synthesize_shadow_if_absent(result, host, &base_qn);
        } else {
            resolve_any_ref(r, env, &result.objects, host)?;
            entry.deps.insert(base_qn.clone());
            entry.merge.insert(base_qn);
        }
    }

    Ok(entry)
}

fn synthesize_shadow_if_absent(result: &mut LayoutResult, host: &dyn HostSchema, base_qn: &QualName) {
    if result.types.contains_key(base_qn) {
        return;
    }
    let host_obj: HostObject = host
        .get(base_qn, SchemaObjectKind::ObjectType)
        .unwrap_or_default();
    let pointers = host_obj
        .pointers
        .values()
        .map(|hp| Pointer {
            name: hp.name.clone(),
            kind: hp.kind,
            target: Some(TypeExpr::Named(crate::ast::Ref::qualified(
                hp.target.module().to_string(),
                hp.target.local_name().to_string(),
            ))),
            computed_expr: None,
            cardinality: hp.cardinality,
            required: hp.required,
            constraints: Vec::new(),
            annotations: Vec::new(),
            pointers: Vec::new(),
            span: None,
        })
        .collect();
    result
        .types
        .insert(base_qn.clone(), TypeEntry::Shadow { pointers });
}

fn trace_object_type(
    result: &mut LayoutResult,
    env: &ResolveEnv,
    host: &dyn HostSchema,
    ot: &ObjectTypeDecl,
) -> Result<(), CompileError> {
    let qn = QualName::new(env.current_module.to_string(), ot.name.clone());
    let entry = resolve_bases(result, env, host, &qn, &ot.bases, ot.span)?;
    result.inheritance.push(entry);

    for p in &ot.pointers {
        trace_pointer(result, env, &qn, p)?;
    }
    for c in &ot.constraints {
        trace_concrete_constraint(result, &qn, c)?;
    }
    for a in &ot.annotations {
        trace_annotation_value(result, &qn, a)?;
    }
    for ap in &ot.access_policies {
        let ap_qn = QualName::access_policy(&qn, &ap.name);
        register(&mut result.objects, ap_qn, SchemaObjectKind::AccessPolicy, ap.span)?;
    }
    for idx in &ot.indexes {
        let sig = index_signature(idx);
        let idx_qn = QualName::concrete_index(&qn, idx.name.as_deref().unwrap_or("index"), &sig);
        register(&mut result.objects, idx_qn, SchemaObjectKind::Index, idx.span)?;
    }

    result.types.insert(qn, TypeEntry::Object(ot.clone()));
    Ok(())
}

fn trace_scalar_type(
    result: &mut LayoutResult,
    env: &ResolveEnv,
    host: &dyn HostSchema,
    st: &ScalarTypeDecl,
) -> Result<(), CompileError> {
    let qn = QualName::new(env.current_module.to_string(), st.name.clone());
    let entry = resolve_bases(result, env, host, &qn, &st.bases, st.span)?;
    result.inheritance.push(entry);

    for c in &st.constraints {
        trace_concrete_constraint(result, &qn, c)?;
    }
    for a in &st.annotations {
        trace_annotation_value(result, &qn, a)?;
    }

    result.types.insert(qn, TypeEntry::Scalar(st.clone()));
    Ok(())
}

fn trace_pointer(
    result: &mut LayoutResult,
    _env: &ResolveEnv,
    owner: &QualName,
    p: &Pointer,
) -> Result<(), CompileError> {
    let ptr_qn = QualName::pointer(owner, &p.name);
    let kind = match p.kind {
        crate::ast::PointerKind::Link => SchemaObjectKind::Link,
        crate::ast::PointerKind::Property => SchemaObjectKind::Property,
    };
    register(&mut result.objects, ptr_qn.clone(), kind, p.span)?;

    for c in &p.constraints {
        trace_concrete_constraint(result, &ptr_qn, c)?;
    }
    for a in &p.annotations {
        trace_annotation_value(result, &ptr_qn, a)?;
    }
    for sub in &p.pointers {
        trace_pointer(result, _env, &ptr_qn, sub)?;
    }
    Ok(())
}

fn trace_concrete_constraint(
    result: &mut LayoutResult,
    subject: &QualName,
    c: &crate::ast::ConcreteConstraint,
) -> Result<(), CompileError> {
    let sig = constraint_signature(c);
    let qn = QualName::concrete_constraint(subject, &c.base.name, &sig);
    register(&mut result.objects, qn, SchemaObjectKind::Constraint, c.span)
}

/// Builds the stable source rendering used as a constraint's signature: its
/// positional args, an optional `subjectexpr`, an optional `except_expr`
/// (with an empty placeholder inserted between them when only one is
/// present so ON-only and EXCEPT-only constraints get distinct
/// identifiers), joined with `|`.
pub fn constraint_signature(c: &crate::ast::ConcreteConstraint) -> String {
    let args: Vec<String> = c.args.iter().map(render_expr_stub).collect();
    let subjectexpr = c.subjectexpr.as_ref().map(render_expr_stub);
    let except_expr = c.except_expr.as_ref().map(render_expr_stub);

    let mut parts = args;
    match (&subjectexpr, &except_expr) {
        (Some(s), Some(e)) => {
            parts.push(s.clone());
            parts.push(e.clone());
        }
        (Some(s), None) => {
            parts.push(s.clone());
            parts.push(String::new());
        }
        (None, Some(e)) => {
            parts.push(String::new());
            parts.push(e.clone());
        }
        (None, None) => {}
    }
    if let Some(inline) = &c.inline_expr {
        parts.push(render_expr_stub(inline));
    }
    parts.join("|")
}

/// Builds an index's signature per §3's `(expr)/(except_expr?)` scheme: the
/// indexed expression, optionally followed by the except-expression when
/// one is present. Mirrors `constraint_signature`'s use of `render_expr_stub`
/// as a stable, non-user-facing fingerprint.
pub fn index_signature(idx: &crate::ast::ConcreteIndex) -> String {
    let mut sig = format!("({})", render_expr_stub(&idx.expr));
    if let Some(except) = &idx.except_expr {
        sig.push_str(&format!("/({})", render_expr_stub(except)));
    }
    sig
}

/// A stable (if simplified) source-text rendering of an expression, for use
/// only as a signature fingerprint — never shown to users.
fn render_expr_stub(e: &crate::ast::Expr) -> String {
    use crate::ast::{Expr, Literal, PathAnchor};
    match e {
        Expr::Literal(Literal::Int(i)) => i.to_string(),
        Expr::Literal(Literal::Str(s)) => format!("{s:?}"),
        Expr::Literal(Literal::Bool(b)) => b.to_string(),
        Expr::Param(p) => format!("${p}"),
        Expr::Path { anchor, steps } => {
            let a = match anchor {
                PathAnchor::Subject => "__subject__".to_string(),
                PathAnchor::Source => ".".to_string(),
                PathAnchor::Global(r) => format!("global {}", r.name),
            };
            format!("{a}.{}", steps.join("."))
        }
        Expr::BinOp { op, lhs, rhs } => {
            format!("({} {op} {})", render_expr_stub(lhs), render_expr_stub(rhs))
        }
        Expr::UnaryOp { op, operand } => format!("({op}{})", render_expr_stub(operand)),
        Expr::Call { func, args } => {
            let rendered: Vec<String> = args.iter().map(render_expr_stub).collect();
            format!("{}({})", func.name, rendered.join(", "))
        }
        Expr::Set(items) => {
            let rendered: Vec<String> = items.iter().map(render_expr_stub).collect();
            format!("{{{}}}", rendered.join(", "))
        }
        Expr::TypeRef(t) => render_type_expr(t),
    }
}

pub fn render_type_expr(t: &TypeExpr) -> String {
    match t {
        TypeExpr::Named(r) => match &r.module {
            Some(m) => format!("{m}::{}", r.name),
            None => r.name.clone(),
        },
        TypeExpr::AnyType => "anytype".to_string(),
        TypeExpr::AnyTuple => "anytuple".to_string(),
        TypeExpr::Enum(vals) => format!("enum<{}>", vals.join(", ")),
        TypeExpr::Collection { kind, args } => {
            let rendered: Vec<String> = args.iter().map(render_type_expr).collect();
            format!("{kind}<{}>", rendered.join(", "))
        }
    }
}

fn trace_annotation_value(
    result: &mut LayoutResult,
    owner: &QualName,
    a: &crate::ast::Annotation,
) -> Result<(), CompileError> {
    let qn = QualName::pointer(owner, &a.name.name);
    register(&mut result.objects, qn, SchemaObjectKind::AnnotationValue, a.span)
}

fn trace_alias(result: &mut LayoutResult, env: &ResolveEnv, a: &AliasDecl) -> Result<(), CompileError> {
    let qn = QualName::new(env.current_module.to_string(), a.name.clone());
    for p in &a.computed_pointers {
        trace_pointer(result, env, &qn, p)?;
    }
    result.aliases.insert(qn, a.clone());
    Ok(())
}

fn trace_global(result: &mut LayoutResult, env: &ResolveEnv, g: &GlobalDecl) -> Result<(), CompileError> {
    let qn = QualName::new(env.current_module.to_string(), g.name.clone());
    result.globals.insert(qn, g.clone());
    Ok(())
}

fn trace_function(result: &mut LayoutResult, env: &ResolveEnv, f: &FunctionDecl) -> Result<(), CompileError> {
    let sig = render_params(&f.params);
    let qn = QualName::function(env.current_module.to_string(), &f.name, &sig);
    result.functions.insert(qn, f.clone());
    Ok(())
}

pub fn render_params(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| render_type_expr(&p.type_))
        .collect::<Vec<_>>()
        .join(", ")
}
