//! §4.5 Dependency Tracer — walk the same declarations the layout tracer
//! saw and build the DDL dependency graph: one node per emittable command,
//! each carrying the set of other nodes that must precede it.

use indexmap::{IndexMap, IndexSet};

use sdlc_types::QualName;

use crate::ast::{
    AbstractAnnotationDecl, AbstractConstraintDecl, AccessPolicy, AliasDecl, Annotation, Batch,
    ConcreteConstraint, ConcreteIndex, Decl, Expr, FunctionBody, FunctionDecl, GlobalDecl,
    ObjectTypeDecl, Pointer, ScalarTypeDecl, TypeExpr,
};
use crate::ddl::{Ddl, DdlKind, DdlNode};
use crate::diagnostics::CompileError;
use crate::expr_trace::{trace_expr, ExprEnv};
use crate::inherit::merge_inheritance;
use crate::layout::{constraint_signature, index_signature, render_params, LayoutResult, TypeEntry};
use crate::resolver::{qualify, ResolveEnv};
use crate::schema::{HostSchema, SchemaObjectKind};

/// One node of the DDL dependency graph.
#[derive(Clone, Debug)]
pub struct DepGraphEntry {
    pub item: Ddl,
    /// Hard dependencies: must be emitted before this node.
    pub deps: IndexSet<QualName>,
    /// Ordering-only dependencies; never participate in cycle formation.
    pub weak_deps: IndexSet<QualName>,
    /// Names excluded from being treated as a dependency of this node, even
    /// if an expression inside it references them (legal bounded
    /// self-reference, e.g. a scalar's own constraint referencing
    /// `__subject__`).
    pub loop_control: IndexSet<QualName>,
}

pub type DepGraph = IndexMap<QualName, DepGraphEntry>;

/// Per-owner auxiliary maps built once from the layout result, mirroring
/// the original tracer's `defdeps` (owner -> its own explicitly declared
/// pointers) and `constraints` (subject -> its own concrete constraints),
/// both of which the layout pass populates as a side effect of recursing
/// through pointers there; reconstructing them here keeps the layout
/// tracer focused on producing `objects`/`types`/`inheritance` only.
struct AuxMaps {
    defdeps: IndexMap<QualName, IndexSet<QualName>>,
    constraints: IndexMap<QualName, IndexSet<QualName>>,
}

fn build_aux_maps(layout: &LayoutResult) -> AuxMaps {
    let mut aux = AuxMaps {
        defdeps: IndexMap::new(),
        constraints: IndexMap::new(),
    };

    for (owner, entry) in &layout.types {
        match entry {
            TypeEntry::Object(ot) => {
                collect_subject_constraints(&mut aux, owner, &ot.constraints);
            }
            TypeEntry::Scalar(st) => {
                collect_subject_constraints(&mut aux, owner, &st.constraints);
            }
            TypeEntry::Shadow { .. } => {}
        }
        for p in entry.pointers() {
            collect_pointer_aux(&mut aux, owner, p);
        }
    }
    for (owner, a) in &layout.aliases {
        for p in &a.computed_pointers {
            collect_pointer_aux(&mut aux, owner, p);
        }
    }

    aux
}

fn collect_subject_constraints(aux: &mut AuxMaps, subject: &QualName, constraints: &[ConcreteConstraint]) {
    for c in constraints {
        let sig = constraint_signature(c);
        let cqn = QualName::concrete_constraint(subject, &c.base.name, &sig);
        aux.constraints.entry(subject.clone()).or_default().insert(cqn);
    }
}

fn collect_pointer_aux(aux: &mut AuxMaps, owner: &QualName, p: &Pointer) {
    let ptr_qn = QualName::pointer(owner, &p.name);
    aux.defdeps.entry(owner.clone()).or_default().insert(ptr_qn.clone());
    collect_subject_constraints(aux, &ptr_qn, &p.constraints);
    for sub in &p.pointers {
        collect_pointer_aux(aux, &ptr_qn, sub);
    }
}

/// Every ancestor-or-self of `dep`'s owning type that explicitly declares a
/// pointer of the same local name, plus any object whose name is itself
/// prefixed by `dep@` (a link property nested under `dep`). Mirrors
/// `_get_pointer_deps`: "depending on a link typically comes as a package
/// of depending on the link's property."
fn pointer_fallback_deps(
    dep: &QualName,
    ancestors: &IndexMap<QualName, IndexSet<QualName>>,
    objects: &IndexMap<QualName, SchemaObjectKind>,
) -> IndexSet<QualName> {
    let mut result = IndexSet::new();
    let Some((owner, ptr_name)) = dep.split_pointer() else {
        result.insert(dep.clone());
        return result;
    };

    if let Some(owner_ancestors) = ancestors.get(&owner) {
        for tansc in owner_ancestors {
            let ptr_ansc = QualName::pointer(tansc, ptr_name);
            if objects.contains_key(&ptr_ansc) {
                result.insert(ptr_ansc);
            }
        }
    }

    if objects.contains_key(dep) {
        result.insert(dep.clone());
    }

    let prefix = format!("{}@", dep.name());
    for cand in objects.keys() {
        if cand.module() == dep.module() && cand.name().starts_with(&prefix) {
            result.insert(cand.clone());
        }
    }

    result
}

/// Resolve the refs an expression collects into hard dependencies, applying
/// the pointer-ancestor fallback uniformly (§4.5 step 6, first bullet).
fn expr_hard_deps(
    expr: &Expr,
    env: &ExprEnv,
    ctx: &DepTraceCtx,
) -> Result<IndexSet<QualName>, CompileError> {
    let raw = trace_expr(expr, env, &ctx.layout.objects, &ctx.merged, ctx.host)?;
    let mut deps = IndexSet::new();
    for dep in &raw {
        if dep.name().contains('@') {
            deps.extend(pointer_fallback_deps(dep, ctx.ancestors, &ctx.layout.objects));
        } else {
            deps.insert(dep.clone());
        }
    }
    Ok(deps)
}

/// The structural-closure refinement for alias/global bodies: depend on
/// every referenced type's (and its ancestors') own explicitly declared
/// pointers, so a view sees the full physical schema it reaches into.
fn extend_structural_closure(
    deps: &mut IndexSet<QualName>,
    base: &IndexSet<QualName>,
    ancestors: &IndexMap<QualName, IndexSet<QualName>>,
    defdeps: &IndexMap<QualName, IndexSet<QualName>>,
) {
    for dep in base {
        let mut vdeps: IndexSet<QualName> = IndexSet::from_iter([dep.clone()]);
        if let Some(a) = ancestors.get(dep) {
            vdeps.extend(a.iter().cloned());
        }
        for vdep in &vdeps {
            if let Some(d) = defdeps.get(vdep) {
                deps.extend(d.iter().cloned());
            }
        }
    }
}

/// The constraint-environment refinement for computed pointers / access
/// policies: depend on every referenced type's (and its ancestors') own
/// concrete constraints, so cardinality inference sees the right
/// constraint environment.
fn extend_constraint_env(
    deps: &mut IndexSet<QualName>,
    base: &IndexSet<QualName>,
    ancestors: &IndexMap<QualName, IndexSet<QualName>>,
    constraints: &IndexMap<QualName, IndexSet<QualName>>,
) {
    for dep in base {
        let mut cdeps: IndexSet<QualName> = IndexSet::from_iter([dep.clone()]);
        if let Some(a) = ancestors.get(dep) {
            cdeps.extend(a.iter().cloned());
        }
        for cdep in &cdeps {
            if let Some(c) = constraints.get(cdep) {
                deps.extend(c.iter().cloned());
            }
        }
    }
}

/// Non-std bases of `qn`, per the inheritance graph built by the layout
/// tracer (empty if `qn` declares no bases).
fn base_deps_of(layout: &LayoutResult, qn: &QualName) -> IndexSet<QualName> {
    layout
        .inheritance
        .iter()
        .find(|e| &e.item == qn)
        .map(|e| e.deps.clone())
        .unwrap_or_default()
}

/// Dependencies contributed by nested `CreateConcreteConstraint` /
/// `CreateAnnotationValue` sub-commands: the *referenced abstract*
/// constraint/annotation name becomes a dependency of the owner's own
/// node, so a constraint or annotation declared earlier in the same batch
/// is guaranteed to exist by the time the owner is created.
fn abstract_ref_deps(env: &ResolveEnv, constraints: &[ConcreteConstraint], annotations: &[Annotation]) -> IndexSet<QualName> {
    let mut deps = IndexSet::new();
    for c in constraints {
        let base_qn = qualify(&c.base, env);
        if !base_qn.is_std() {
            deps.insert(base_qn);
        }
    }
    for a in annotations {
        let base_qn = qualify(&a.name, env);
        if !base_qn.is_std() {
            deps.insert(base_qn);
        }
    }
    deps
}

pub struct DepTraceCtx<'a> {
    pub layout: &'a LayoutResult,
    pub ancestors: &'a IndexMap<QualName, IndexSet<QualName>>,
    pub host: &'a dyn HostSchema,
    /// The fully inheritance-merged pointer view, used only for chasing
    /// path-expression steps through a pointer a subtype inherits without
    /// redeclaring.
    merged: IndexMap<QualName, Vec<Pointer>>,
    aux: AuxMaps,
}

pub fn trace_dependencies(
    batch: &Batch,
    layout: &LayoutResult,
    ancestors: &IndexMap<QualName, IndexSet<QualName>>,
    host: &dyn HostSchema,
) -> Result<DepGraph, CompileError> {
    let ctx = DepTraceCtx {
        layout,
        ancestors,
        host,
        merged: merge_inheritance(&layout.types, &layout.inheritance),
        aux: build_aux_maps(layout),
    };

    let mut graph = DepGraph::new();
    let empty_aliases = IndexMap::new();

    for (module, decls) in batch {
        let env = ResolveEnv::new(module, &empty_aliases);
        for decl in decls {
            match decl {
                Decl::ObjectType(ot) => trace_object_type(&mut graph, &ctx, &env, ot)?,
                Decl::ScalarType(st) => trace_scalar_type(&mut graph, &ctx, &env, st)?,
                Decl::Alias(a) => trace_alias(&mut graph, &ctx, &env, a)?,
                Decl::Global(g) => trace_global(&mut graph, &ctx, &env, g)?,
                Decl::Function(f) => trace_function(&mut graph, &ctx, &env, f)?,
                Decl::AbstractConstraint(c) => trace_abstract_constraint(&mut graph, module, c)?,
                Decl::AbstractAnnotation(a) => trace_abstract_annotation(&mut graph, module, a)?,
            }
        }
    }

    Ok(graph)
}

// Every qualified name produced here was already validated unique by the
// layout tracer's registration pass, which runs (and would have already
// returned `DuplicateDeclaration`) before dependency tracing starts.
fn insert(graph: &mut DepGraph, qn: QualName, item: Ddl, deps: IndexSet<QualName>) -> Result<(), CompileError> {
    graph.insert(
        qn,
        DepGraphEntry {
            item,
            deps,
            weak_deps: IndexSet::new(),
            loop_control: IndexSet::new(),
        },
    );
    Ok(())
}

fn trace_object_type(graph: &mut DepGraph, ctx: &DepTraceCtx, env: &ResolveEnv, ot: &ObjectTypeDecl) -> Result<(), CompileError> {
    let qn = QualName::new(env.current_module.to_string(), ot.name.clone());
    let mut deps = base_deps_of(ctx.layout, &qn);
    deps.extend(abstract_ref_deps(env, &ot.constraints, &ot.annotations));

    insert(
        graph,
        qn.clone(),
        Ddl {
            name: qn.clone(),
            kind: DdlKind::Create,
            node: DdlNode::ObjectType(ot.clone()),
            sdl_alter_if_exists: false,
        },
        deps,
    )?;

    for p in &ot.pointers {
        trace_pointer(graph, ctx, env, &qn, p)?;
    }
    for c in &ot.constraints {
        trace_concrete_constraint(graph, ctx, env, &qn, c, /*scalar_loop_control=*/ false)?;
    }
    for a in &ot.annotations {
        trace_annotation_value(graph, &qn, a)?;
    }
    for ap in &ot.access_policies {
        trace_access_policy(graph, ctx, env, &qn, ap)?;
    }
    for idx in &ot.indexes {
        trace_index(graph, ctx, env, &qn, idx)?;
    }
    Ok(())
}

fn trace_scalar_type(graph: &mut DepGraph, ctx: &DepTraceCtx, env: &ResolveEnv, st: &ScalarTypeDecl) -> Result<(), CompileError> {
    let qn = QualName::new(env.current_module.to_string(), st.name.clone());
    let mut deps = base_deps_of(ctx.layout, &qn);
    deps.extend(abstract_ref_deps(env, &st.constraints, &st.annotations));

    insert(
        graph,
        qn.clone(),
        Ddl {
            name: qn.clone(),
            kind: DdlKind::Create,
            node: DdlNode::ScalarType(st.clone()),
            sdl_alter_if_exists: false,
        },
        deps,
    )?;

    for c in &st.constraints {
        trace_concrete_constraint(graph, ctx, env, &qn, c, /*scalar_loop_control=*/ true)?;
    }
    for a in &st.annotations {
        trace_annotation_value(graph, &qn, a)?;
    }
    Ok(())
}

fn trace_pointer(graph: &mut DepGraph, ctx: &DepTraceCtx, env: &ResolveEnv, owner: &QualName, p: &Pointer) -> Result<(), CompileError> {
    trace_pointer_with_source(graph, ctx, env, owner, owner, p)
}

/// `owner` names the pointer (and is what its alter command attaches to);
/// `source` is what an implicit `.` prefix in its computed expression
/// chases pointers from. The two coincide for a pointer declared directly
/// on an object type, but diverge for a computed pointer nested under an
/// alias, whose `.` prefix reaches into the alias's underlying type, not
/// the alias itself.
fn trace_pointer_with_source(
    graph: &mut DepGraph,
    ctx: &DepTraceCtx,
    env: &ResolveEnv,
    owner: &QualName,
    source: &QualName,
    p: &Pointer,
) -> Result<(), CompileError> {
    let ptr_qn = QualName::pointer(owner, &p.name);

    let mut deps: IndexSet<QualName> = IndexSet::from_iter([owner.clone()]);
    if let Some(owner_ancestors) = ctx.ancestors.get(owner) {
        for anc in owner_ancestors {
            let overridden = QualName::pointer(anc, &p.name);
            if ctx.layout.objects.contains_key(&overridden) {
                deps.insert(overridden);
            }
        }
    }
    deps.extend(abstract_ref_deps(env, &p.constraints, &p.annotations));

    let exprenv = ExprEnv {
        module: env.current_module,
        aliases: env.aliases,
        params: &IndexSet::new(),
        subject: None,
        source: Some(source),
    };

    if let Some(t) = &p.target {
        deps.extend(hard_deps_of_type_expr(t, env, ctx)?);
    } else if let Some(e) = &p.computed_expr {
        let base = expr_hard_deps(e, &exprenv, ctx)?;
        extend_constraint_env(&mut deps, &base, ctx.ancestors, &ctx.aux.constraints);
        deps.extend(base);
    }

    insert(
        graph,
        ptr_qn.clone(),
        Ddl {
            name: owner.clone(),
            kind: DdlKind::Alter,
            node: DdlNode::Pointer { owner: owner.clone(), pointer: p.clone() },
            sdl_alter_if_exists: false,
        },
        deps,
    )?;

    for c in &p.constraints {
        trace_concrete_constraint(graph, ctx, env, &ptr_qn, c, false)?;
    }
    for a in &p.annotations {
        trace_annotation_value(graph, &ptr_qn, a)?;
    }
    for sub in &p.pointers {
        trace_pointer_with_source(graph, ctx, env, &ptr_qn, &ptr_qn, sub)?;
    }
    Ok(())
}

/// Pointer target dependencies: §4.5 carries over §4.4's `TypeExpr` "hard
/// deps" treatment — subtypes of a collection contribute, a plain named
/// reference contributes itself, `anytype`/`anytuple` contribute nothing
/// (pseudo-types need no ordering).
fn hard_deps_of_type_expr(t: &TypeExpr, env: &ResolveEnv, ctx: &DepTraceCtx) -> Result<IndexSet<QualName>, CompileError> {
    let mut deps = IndexSet::new();
    match t {
        TypeExpr::Named(r) => {
            let qn = qualify(r, env);
            if !qn.is_std() {
                let resolved = crate::resolver::resolve_any_ref(r, env, &ctx.layout.objects, ctx.host)?;
                deps.insert(resolved);
            }
        }
        TypeExpr::AnyType | TypeExpr::AnyTuple => {}
        TypeExpr::Enum(_) => {}
        TypeExpr::Collection { args, .. } => {
            for a in args {
                deps.extend(hard_deps_of_type_expr(a, env, ctx)?);
            }
        }
    }
    Ok(deps)
}

fn trace_concrete_constraint(
    graph: &mut DepGraph,
    ctx: &DepTraceCtx,
    env: &ResolveEnv,
    subject: &QualName,
    c: &ConcreteConstraint,
    scalar_loop_control: bool,
) -> Result<(), CompileError> {
    let sig = constraint_signature(c);
    let qn = QualName::concrete_constraint(subject, &c.base.name, &sig);

    let mut deps: IndexSet<QualName> = IndexSet::from_iter([subject.clone()]);
    let base_qn = qualify(&c.base, env);
    if !base_qn.is_std() {
        deps.insert(base_qn);
    }

    let exprenv = ExprEnv {
        module: env.current_module,
        aliases: env.aliases,
        params: &IndexSet::new(),
        subject: Some(subject),
        source: Some(subject),
    };

    let mut exprs: Vec<&Expr> = c.args.iter().collect();
    if let Some(e) = &c.subjectexpr {
        exprs.push(e);
    }
    if let Some(e) = &c.except_expr {
        exprs.push(e);
    }
    if let Some(e) = &c.inline_expr {
        exprs.push(e);
    }
    for e in exprs {
        deps.extend(expr_hard_deps(e, &exprenv, ctx)?);
    }

    // A constraint nested directly under a scalar type is exempt from
    // treating that scalar as a cycle-forming dependency: `__subject__`
    // legally refers back to the scalar it constrains.
    let loop_control = if scalar_loop_control { Some(subject.clone()) } else { None };
    if let Some(lc) = &loop_control {
        deps.shift_remove(lc);
    }

    let mut entry_loop_control = IndexSet::new();
    if let Some(lc) = loop_control {
        // The scalar's own node records that this constraint is allowed to
        // reference it without forming a cycle.
        if let Some(scalar_entry) = graph.get_mut(&lc) {
            scalar_entry.loop_control.insert(qn.clone());
        }
        entry_loop_control.insert(lc);
    }

    graph.insert(
        qn,
        DepGraphEntry {
            item: Ddl {
                name: subject.clone(),
                kind: DdlKind::Alter,
                node: DdlNode::ConcreteConstraint { subject: subject.clone(), constraint: c.clone() },
                sdl_alter_if_exists: false,
            },
            deps,
            weak_deps: IndexSet::new(),
            loop_control: entry_loop_control,
        },
    );
    Ok(())
}

fn trace_annotation_value(graph: &mut DepGraph, owner: &QualName, a: &Annotation) -> Result<(), CompileError> {
    let qn = QualName::pointer(owner, &a.name.name);
    insert(
        graph,
        qn.clone(),
        Ddl {
            name: owner.clone(),
            kind: DdlKind::Alter,
            node: DdlNode::AnnotationValue { owner: owner.clone(), annotation: a.clone() },
            sdl_alter_if_exists: false,
        },
        IndexSet::from_iter([owner.clone()]),
    )
}

fn trace_access_policy(graph: &mut DepGraph, ctx: &DepTraceCtx, env: &ResolveEnv, owner: &QualName, ap: &AccessPolicy) -> Result<(), CompileError> {
    let qn = QualName::access_policy(owner, &ap.name);
    let mut deps: IndexSet<QualName> = IndexSet::from_iter([owner.clone()]);

    let exprenv = ExprEnv {
        module: env.current_module,
        aliases: env.aliases,
        params: &IndexSet::new(),
        subject: Some(owner),
        source: Some(owner),
    };

    let mut base = IndexSet::new();
    if let Some(e) = &ap.using {
        base.extend(expr_hard_deps(e, &exprenv, ctx)?);
    }
    if let Some(e) = &ap.condition {
        base.extend(expr_hard_deps(e, &exprenv, ctx)?);
    }
    extend_constraint_env(&mut deps, &base, ctx.ancestors, &ctx.aux.constraints);
    deps.extend(base);

    insert(
        graph,
        qn.clone(),
        Ddl {
            name: owner.clone(),
            kind: DdlKind::Alter,
            node: DdlNode::AccessPolicy { owner: owner.clone(), policy: ap.clone() },
            sdl_alter_if_exists: false,
        },
        deps,
    )
}

fn trace_index(graph: &mut DepGraph, ctx: &DepTraceCtx, env: &ResolveEnv, owner: &QualName, idx: &ConcreteIndex) -> Result<(), CompileError> {
    // Matches the signature scheme the layout tracer already registered this
    // index's qualified name under.
    let sig = index_signature(idx);
    let qn = QualName::concrete_index(owner, idx.name.as_deref().unwrap_or("index"), &sig);

    let mut deps: IndexSet<QualName> = IndexSet::from_iter([owner.clone()]);
    let exprenv = ExprEnv {
        module: env.current_module,
        aliases: env.aliases,
        params: &IndexSet::new(),
        subject: Some(owner),
        source: Some(owner),
    };
    deps.extend(expr_hard_deps(&idx.expr, &exprenv, ctx)?);
    if let Some(e) = &idx.except_expr {
        deps.extend(expr_hard_deps(e, &exprenv, ctx)?);
    }

    insert(
        graph,
        qn.clone(),
        Ddl {
            name: owner.clone(),
            kind: DdlKind::Alter,
            node: DdlNode::ConcreteIndex { owner: owner.clone(), index: idx.clone() },
            sdl_alter_if_exists: false,
        },
        deps,
    )
}

fn trace_alias(graph: &mut DepGraph, ctx: &DepTraceCtx, env: &ResolveEnv, a: &AliasDecl) -> Result<(), CompileError> {
    let qn = QualName::new(env.current_module.to_string(), a.name.clone());

    let exprenv = ExprEnv {
        module: env.current_module,
        aliases: env.aliases,
        params: &IndexSet::new(),
        subject: None,
        source: None,
    };
    let base = expr_hard_deps(&a.expr, &exprenv, ctx)?;
    let mut deps = IndexSet::new();
    extend_structural_closure(&mut deps, &base, ctx.ancestors, &ctx.aux.defdeps);
    deps.extend(base);

    insert(
        graph,
        qn.clone(),
        Ddl {
            name: qn.clone(),
            kind: DdlKind::Create,
            node: DdlNode::Alias(a.clone()),
            sdl_alter_if_exists: false,
        },
        deps,
    )?;

    // A computed pointer nested under an alias chases its `.` prefix into
    // the alias's underlying type (when statically known), not the alias
    // node itself, which carries no pointer map of its own.
    let source = alias_source_type(&a.expr, env).unwrap_or_else(|| qn.clone());
    for p in &a.computed_pointers {
        trace_pointer_with_source(graph, ctx, env, &qn, &source, p)?;
    }
    Ok(())
}

fn alias_source_type(expr: &Expr, env: &ResolveEnv) -> Option<QualName> {
    match expr {
        Expr::TypeRef(TypeExpr::Named(r)) => Some(qualify(r, env)),
        _ => None,
    }
}

fn trace_global(graph: &mut DepGraph, ctx: &DepTraceCtx, env: &ResolveEnv, g: &GlobalDecl) -> Result<(), CompileError> {
    let qn = QualName::new(env.current_module.to_string(), g.name.clone());

    let mut deps = IndexSet::new();
    if let Some(t) = &g.target {
        deps.extend(hard_deps_of_type_expr(t, env, ctx)?);
    }
    if let Some(e) = &g.default {
        let exprenv = ExprEnv {
            module: env.current_module,
            aliases: env.aliases,
            params: &IndexSet::new(),
            subject: None,
            source: None,
        };
        let base = expr_hard_deps(e, &exprenv, ctx)?;
        extend_structural_closure(&mut deps, &base, ctx.ancestors, &ctx.aux.defdeps);
        deps.extend(base);
    }

    insert(
        graph,
        qn.clone(),
        Ddl {
            name: qn.clone(),
            kind: DdlKind::Create,
            node: DdlNode::Global(g.clone()),
            sdl_alter_if_exists: false,
        },
        deps,
    )
}

fn trace_function(graph: &mut DepGraph, ctx: &DepTraceCtx, env: &ResolveEnv, f: &FunctionDecl) -> Result<(), CompileError> {
    let sig = render_params(&f.params);
    let qn = QualName::function(env.current_module.to_string(), &f.name, &sig);

    let mut deps = IndexSet::new();
    for param in &f.params {
        deps.extend(hard_deps_of_type_expr(&param.type_, env, ctx)?);
    }
    deps.extend(hard_deps_of_type_expr(&f.return_type, env, ctx)?);

    if let FunctionBody::Expr(body) = &f.body {
        let params: IndexSet<String> = f.params.iter().map(|p| p.name.clone()).collect();
        let exprenv = ExprEnv {
            module: env.current_module,
            aliases: env.aliases,
            params: &params,
            subject: None,
            source: None,
        };
        deps.extend(expr_hard_deps(body, &exprenv, ctx)?);
    }

    insert(
        graph,
        qn.clone(),
        Ddl {
            name: qn.clone(),
            kind: DdlKind::Create,
            node: DdlNode::Function(f.clone()),
            sdl_alter_if_exists: false,
        },
        deps,
    )
}

fn trace_abstract_constraint(graph: &mut DepGraph, module: &str, c: &AbstractConstraintDecl) -> Result<(), CompileError> {
    let qn = QualName::new(module.to_string(), c.name.clone());
    insert(
        graph,
        qn.clone(),
        Ddl {
            name: qn,
            kind: DdlKind::Create,
            node: DdlNode::AbstractConstraint(c.clone()),
            sdl_alter_if_exists: false,
        },
        IndexSet::new(),
    )
}

fn trace_abstract_annotation(graph: &mut DepGraph, module: &str, a: &AbstractAnnotationDecl) -> Result<(), CompileError> {
    let qn = QualName::new(module.to_string(), a.name.clone());
    insert(
        graph,
        qn.clone(),
        Ddl {
            name: qn,
            kind: DdlKind::Create,
            node: DdlNode::AbstractAnnotation(a.clone()),
            sdl_alter_if_exists: false,
        },
        IndexSet::new(),
    )
}
