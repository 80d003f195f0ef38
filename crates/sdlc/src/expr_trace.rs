//! §4.4 Expression Tracer — walk an expression AST to collect the set of
//! qualified names it references.

use indexmap::{IndexMap, IndexSet};
use sdlc_types::QualName;

use crate::ast::{Expr, PathAnchor, Pointer, Ref, TypeExpr};
use crate::diagnostics::CompileError;
use crate::resolver::{resolve_any_ref, resolve_ref, ResolveEnv};
use crate::schema::{HostSchema, SchemaObjectKind};

/// The environment an expression is traced under: the module/alias scope
/// for bare references, the function-local parameter bindings in scope,
/// and the anchor types for `__subject__` and the implicit `.` prefix.
pub struct ExprEnv<'a> {
    pub module: &'a str,
    pub aliases: &'a IndexMap<String, String>,
    pub params: &'a IndexSet<String>,
    pub subject: Option<&'a QualName>,
    pub source: Option<&'a QualName>,
}

impl<'a> ExprEnv<'a> {
    pub fn resolve_env(&self) -> ResolveEnv<'a> {
        ResolveEnv::new(self.module, self.aliases)
    }
}

/// Resolve a pointer's declared target to a qualified name, for path-step
/// chasing. A bare target name is qualified relative to the *owner's*
/// declaring module, per the standard unqualified-reference rule.
fn target_name(t: &TypeExpr, owner_module: &str) -> Option<QualName> {
    match t {
        TypeExpr::Named(r) => {
            let module = r.module.clone().unwrap_or_else(|| owner_module.to_string());
            Some(QualName::new(module, r.name.clone()))
        }
        TypeExpr::AnyType => Some(QualName::std_anytype()),
        TypeExpr::AnyTuple => Some(QualName::std_anytuple()),
        TypeExpr::Enum(_) | TypeExpr::Collection { .. } => None,
    }
}

/// Look up the declared target of `owner@ptr_name`, consulting the
/// in-batch, inheritance-merged pointer map first (so a path step through
/// a pointer `owner` only inherits, and never redeclares, still
/// resolves), then the host schema.
fn pointer_target(
    owner: &QualName,
    ptr_name: &str,
    merged: &IndexMap<QualName, Vec<Pointer>>,
    host: &dyn HostSchema,
) -> Option<QualName> {
    if let Some(pointers) = merged.get(owner) {
        if let Some(p) = pointers.iter().find(|p| p.name == ptr_name) {
            return p.target.as_ref().and_then(|t| target_name(t, owner.module()));
        }
    }
    host.lookup_pointer(owner, ptr_name).map(|hp| hp.target)
}

/// Walk `expr`, collecting the qualified names it references. Names
/// resolved into standard-library modules are dropped (pre-existing,
/// need no dependency edge).
pub fn trace_expr(
    expr: &Expr,
    env: &ExprEnv,
    objects: &IndexMap<QualName, SchemaObjectKind>,
    merged: &IndexMap<QualName, Vec<Pointer>>,
    host: &dyn HostSchema,
) -> Result<IndexSet<QualName>, CompileError> {
    let mut refs = IndexSet::new();
    walk(expr, env, objects, merged, host, &mut refs)?;
    refs.retain(|r| !r.is_std());
    Ok(refs)
}

fn walk(
    expr: &Expr,
    env: &ExprEnv,
    objects: &IndexMap<QualName, SchemaObjectKind>,
    merged: &IndexMap<QualName, Vec<Pointer>>,
    host: &dyn HostSchema,
    refs: &mut IndexSet<QualName>,
) -> Result<(), CompileError> {
    match expr {
        Expr::Literal(_) => {}
        Expr::Param(name) => {
            if !env.params.contains(name) {
                return Err(CompileError::UnknownReference {
                    name: name.clone(),
                    span: None,
                });
            }
        }
        Expr::TypeRef(t) => {
            if let TypeExpr::Named(r) = t {
                let qn = resolve_ref(r, &env.resolve_env(), objects, host, SchemaObjectKind::ObjectType)
                    .or_else(|_| resolve_ref(r, &env.resolve_env(), objects, host, SchemaObjectKind::ScalarType))?;
                refs.insert(qn);
            }
        }
        Expr::Call { func, args } => {
            let qn = resolve_function_ref(func, env, objects, host)?;
            refs.insert(qn);
            for a in args {
                walk(a, env, objects, merged, host, refs)?;
            }
        }
        Expr::BinOp { lhs, rhs, .. } => {
            walk(lhs, env, objects, merged, host, refs)?;
            walk(rhs, env, objects, merged, host, refs)?;
        }
        Expr::UnaryOp { operand, .. } => {
            walk(operand, env, objects, merged, host, refs)?;
        }
        Expr::Set(items) => {
            for i in items {
                walk(i, env, objects, merged, host, refs)?;
            }
        }
        Expr::Path { anchor, steps } => {
            let mut current = match anchor {
                PathAnchor::Subject => env.subject.cloned(),
                PathAnchor::Source => env.source.cloned(),
                PathAnchor::Global(r) => {
                    let qn = resolve_any_ref(r, &env.resolve_env(), objects, host)?;
                    refs.insert(qn.clone());
                    None
                }
            };

            for step in steps {
                let Some(owner) = &current else {
                    // Anchor type unknown (e.g. past a global whose target
                    // type we don't track) — the reference to the step
                    // name itself still can't be formed without an owner,
                    // so tracing stops here for this path.
                    break;
                };
                let ptr_qn = QualName::pointer(owner, step);
                refs.insert(ptr_qn);
                current = pointer_target(owner, step, merged, host);
            }
        }
    }
    Ok(())
}

/// Functions are overloaded on parameter signature, but an expression's
/// call site only gives us argument expressions, not resolved argument
/// types; we identify the function purely by name within scope (matching
/// any arity), consistent with this being a reference-collection pass
/// rather than a type checker.
fn resolve_function_ref(
    func: &Ref,
    env: &ExprEnv,
    objects: &IndexMap<QualName, SchemaObjectKind>,
    host: &dyn HostSchema,
) -> Result<QualName, CompileError> {
    let module = func
        .module
        .clone()
        .unwrap_or_else(|| env.module.to_string());
    let full_module = env.aliases.get(&module).cloned().unwrap_or(module);

    if let Some((qn, _)) = objects
        .iter()
        .find(|(k, &kind)| kind == SchemaObjectKind::Function && k.module() == full_module && k.local_name().starts_with(&format!("{}(", func.name)))
    {
        return Ok(qn.clone());
    }

    let qn = QualName::new(full_module.clone(), func.name.clone());
    if qn.is_std() {
        return Ok(qn);
    }
    if host.get_any_kind(&qn).is_some() {
        return Ok(qn);
    }

    Err(CompileError::UnresolvedReference {
        name: format!("{full_module}::{}", func.name),
        hint: None,
        span: func.span,
    })
}
