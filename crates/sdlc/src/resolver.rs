//! §4.1 Name Resolver — qualify a written reference to a fully-qualified
//! schema object identifier, validating that it exists and is of the
//! expected kind.

use indexmap::IndexMap;
use sdlc_types::QualName;

use crate::ast::{Ref, TypeExpr};
use crate::diagnostics::{find_suggestions, format_hint, CompileError};
use crate::schema::{HostSchema, SchemaObjectKind};

/// The module-alias environment a reference is resolved under: the module
/// the enclosing declaration lives in, plus any short-name aliases in
/// scope (`using module mymod as m`).
pub struct ResolveEnv<'a> {
    pub current_module: &'a str,
    pub aliases: &'a IndexMap<String, String>,
}

impl<'a> ResolveEnv<'a> {
    pub fn new(current_module: &'a str, aliases: &'a IndexMap<String, String>) -> Self {
        ResolveEnv {
            current_module,
            aliases,
        }
    }
}

/// Rule 1 & 2: expand a written `Ref` into a `QualName`, without checking
/// existence. A reference already carrying a module is alias-expanded; a
/// bare reference is qualified with the current module.
pub fn qualify(r: &Ref, env: &ResolveEnv) -> QualName {
    match &r.module {
        Some(m) => {
            let full = env.aliases.get(m).cloned().unwrap_or_else(|| m.clone());
            QualName::new(full, r.name.clone())
        }
        None => QualName::new(env.current_module.to_string(), r.name.clone()),
    }
}

/// Resolve and kind-check a reference against the in-batch objects map,
/// falling back to the host schema. Returns `UnresolvedReference` (with a
/// fuzzy-match hint) when the name exists nowhere, or `InvalidReference`
/// when it exists but under a different kind.
pub fn resolve_ref(
    r: &Ref,
    env: &ResolveEnv,
    objects: &IndexMap<QualName, SchemaObjectKind>,
    host: &dyn HostSchema,
    expected: SchemaObjectKind,
) -> Result<QualName, CompileError> {
    let qn = qualify(r, env);

    if let Some(&kind) = objects.get(&qn) {
        return check_kind(qn, kind, expected, r);
    }

    if let Some(kind) = host.get_any_kind(&qn) {
        return check_kind(qn, kind, expected, r);
    }

    if qn.is_std() {
        // Presumed to exist even if the host has no explicit record of it.
        return Ok(qn);
    }

    let mut candidates: Vec<String> = objects
        .keys()
        .filter(|k| k.module() == qn.module())
        .map(|k| k.local_name().to_string())
        .collect();
    candidates.extend(
        host.visible_names(qn.module(), r.module.is_none())
            .iter()
            .map(|n| n.local_name().to_string()),
    );
    candidates.sort();
    candidates.dedup();

    let suggestions = find_suggestions(&qn.local_name().to_string(), &candidates, 3, 3);
    Err(CompileError::UnresolvedReference {
        name: qn.to_string(),
        hint: format_hint(&suggestions),
        span: r.span,
    })
}

fn check_kind(
    qn: QualName,
    actual: SchemaObjectKind,
    expected: SchemaObjectKind,
    r: &Ref,
) -> Result<QualName, CompileError> {
    // Object types and scalar types are both "types" as far as a bare type
    // reference is concerned; anything else must match exactly.
    if actual == expected || (is_type_like(expected) && is_type_like(actual)) {
        Ok(qn)
    } else {
        Err(CompileError::InvalidReference {
            name: qn,
            expected: expected.noun(),
            actual: actual.noun(),
            span: r.span,
        })
    }
}

fn is_type_like(kind: SchemaObjectKind) -> bool {
    matches!(kind, SchemaObjectKind::ObjectType | SchemaObjectKind::ScalarType)
}

/// Resolve a path's explicit named root. Unlike `resolve_ref`, this accepts
/// any schema object kind: a path can open on an object type, an alias, or
/// a global alike, and which one it is falls out of what's actually
/// declared under that name rather than being fixed by the grammar
/// position the reference appeared in.
pub fn resolve_any_ref(
    r: &Ref,
    env: &ResolveEnv,
    objects: &IndexMap<QualName, SchemaObjectKind>,
    host: &dyn HostSchema,
) -> Result<QualName, CompileError> {
    let qn = qualify(r, env);

    if objects.contains_key(&qn) {
        return Ok(qn);
    }
    if host.get_any_kind(&qn).is_some() {
        return Ok(qn);
    }
    if qn.is_std() {
        return Ok(qn);
    }

    let mut candidates: Vec<String> = objects
        .keys()
        .filter(|k| k.module() == qn.module())
        .map(|k| k.local_name().to_string())
        .collect();
    candidates.extend(
        host.visible_names(qn.module(), r.module.is_none())
            .iter()
            .map(|n| n.local_name().to_string()),
    );
    candidates.sort();
    candidates.dedup();

    let suggestions = find_suggestions(&qn.local_name().to_string(), &candidates, 3, 3);
    Err(CompileError::UnresolvedReference {
        name: qn.to_string(),
        hint: format_hint(&suggestions),
        span: r.span,
    })
}

/// Resolve a `TypeExpr` used as a concrete type (a pointer target, a base
/// reference, a function parameter/return type). Rejects `AnyType`/
/// `AnyTuple` with `PseudoTypeInUserSchema` unless `allow_pseudo` is set
/// (generic function signatures are the one place they are legal).
pub fn resolve_type_expr(
    t: &TypeExpr,
    env: &ResolveEnv,
    objects: &IndexMap<QualName, SchemaObjectKind>,
    host: &dyn HostSchema,
    allow_pseudo: bool,
) -> Result<QualName, CompileError> {
    match t {
        TypeExpr::Named(r) => resolve_ref(r, env, objects, host, SchemaObjectKind::ObjectType),
        TypeExpr::AnyType if allow_pseudo => Ok(QualName::std_anytype()),
        TypeExpr::AnyTuple if allow_pseudo => Ok(QualName::std_anytuple()),
        TypeExpr::AnyType => Err(CompileError::PseudoTypeInUserSchema {
            name: "anytype".to_string(),
            span: None,
        }),
        TypeExpr::AnyTuple => Err(CompileError::PseudoTypeInUserSchema {
            name: "anytuple".to_string(),
            span: None,
        }),
        TypeExpr::Enum(_) => unreachable!("enum bases are validated in the layout tracer, not resolved as references"),
        TypeExpr::Collection { args, .. } => {
            // Resolve the element type(s) for their dependency value; the
            // collection constructor itself names no schema object.
            for a in args {
                resolve_type_expr(a, env, objects, host, allow_pseudo)?;
            }
            // A collection type has no single qualified name; callers that
            // need one fall back to `std::anytype` as a structural stand-in.
            Ok(QualName::std_anytype())
        }
    }
}
