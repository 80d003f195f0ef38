use indexmap::IndexMap;
use sdlc_types::QualName;

use crate::ast::TypeExpr;
use crate::diagnostics::CompileError;
use crate::resolver::{qualify, resolve_any_ref, resolve_ref, resolve_type_expr, ResolveEnv};
use crate::schema::{EmptyHostSchema, SchemaObjectKind};
use crate::test_utils::*;

#[test]
fn bare_reference_is_qualified_with_the_current_module() {
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let qn = qualify(&bare("Foo"), &env);
    assert_eq!(qn, QualName::new("m", "Foo"));
}

#[test]
fn already_qualified_reference_keeps_its_module() {
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let qn = qualify(&qualified("other", "Foo"), &env);
    assert_eq!(qn, QualName::new("other", "Foo"));
}

#[test]
fn module_alias_is_expanded_to_its_full_path() {
    let mut aliases = IndexMap::new();
    aliases.insert("o".to_string(), "other::nested".to_string());
    let env = ResolveEnv::new("m", &aliases);
    let qn = qualify(&qualified("o", "Foo"), &env);
    assert_eq!(qn, QualName::new("other::nested", "Foo"));
}

#[test]
fn resolve_ref_finds_names_registered_in_the_batch_objects_map() {
    let mut objects = IndexMap::new();
    objects.insert(QualName::new("m", "Book"), SchemaObjectKind::ObjectType);
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let host = EmptyHostSchema;

    let qn = resolve_ref(&bare("Book"), &env, &objects, &host, SchemaObjectKind::ObjectType).unwrap();
    assert_eq!(qn, QualName::new("m", "Book"));
}

#[test]
fn resolve_ref_falls_back_to_the_host_schema() {
    let objects = IndexMap::new();
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let host = FakeHostSchema::new().with_empty_object_type(QualName::new("m", "Book"));

    let qn = resolve_ref(&bare("Book"), &env, &objects, &host, SchemaObjectKind::ObjectType).unwrap();
    assert_eq!(qn, QualName::new("m", "Book"));
}

#[test]
fn resolve_ref_presumes_std_references_exist_without_a_host_entry() {
    let objects = IndexMap::new();
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let host = EmptyHostSchema;

    let qn = resolve_ref(&qualified("std", "int64"), &env, &objects, &host, SchemaObjectKind::ScalarType).unwrap();
    assert_eq!(qn, QualName::new("std", "int64"));
}

#[test]
fn resolve_ref_reports_unresolved_reference_with_a_hint() {
    let mut objects = IndexMap::new();
    objects.insert(QualName::new("m", "Book"), SchemaObjectKind::ObjectType);
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let host = EmptyHostSchema;

    let err = resolve_ref(&bare("Bok"), &env, &objects, &host, SchemaObjectKind::ObjectType).unwrap_err();
    match err {
        CompileError::UnresolvedReference { name, hint, .. } => {
            assert_eq!(name, "m::Bok");
            assert_eq!(hint.as_deref(), Some("did you mean 'Book'?"));
        }
        other => panic!("expected UnresolvedReference, got {other:?}"),
    }
}

#[test]
fn resolve_ref_reports_invalid_reference_for_a_kind_mismatch() {
    let mut objects = IndexMap::new();
    objects.insert(QualName::new("m", "SmallInt"), SchemaObjectKind::Function);
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let host = EmptyHostSchema;

    let err = resolve_ref(&bare("SmallInt"), &env, &objects, &host, SchemaObjectKind::Constraint).unwrap_err();
    match err {
        CompileError::InvalidReference { expected, actual, .. } => {
            assert_eq!(expected, "constraint");
            assert_eq!(actual, "function");
        }
        other => panic!("expected InvalidReference, got {other:?}"),
    }
}

#[test]
fn resolve_ref_treats_object_types_and_scalar_types_as_interchangeably_type_like() {
    let mut objects = IndexMap::new();
    objects.insert(QualName::new("m", "SmallInt"), SchemaObjectKind::ScalarType);
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let host = EmptyHostSchema;

    // Asking for an ObjectType but finding a ScalarType is fine: both are
    // "a type" as far as a bare type reference is concerned.
    let qn = resolve_ref(&bare("SmallInt"), &env, &objects, &host, SchemaObjectKind::ObjectType).unwrap();
    assert_eq!(qn, QualName::new("m", "SmallInt"));
}

#[test]
fn resolve_type_expr_rejects_anytype_in_user_schema_by_default() {
    let objects = IndexMap::new();
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let host = EmptyHostSchema;

    let err = resolve_type_expr(&TypeExpr::AnyType, &env, &objects, &host, false).unwrap_err();
    assert!(matches!(err, CompileError::PseudoTypeInUserSchema { .. }));
}

#[test]
fn resolve_type_expr_allows_anytype_when_pseudo_types_are_permitted() {
    let objects = IndexMap::new();
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let host = EmptyHostSchema;

    let qn = resolve_type_expr(&TypeExpr::AnyType, &env, &objects, &host, true).unwrap();
    assert_eq!(qn, QualName::std_anytype());
}

#[test]
fn resolve_type_expr_recurses_into_collection_element_types() {
    let mut objects = IndexMap::new();
    objects.insert(QualName::new("m", "Book"), SchemaObjectKind::ObjectType);
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let host = EmptyHostSchema;

    let t = TypeExpr::Collection {
        kind: "array".to_string(),
        args: vec![named("Book")],
    };
    // Resolves without error (validating the element type); the collection
    // itself has no single qualified name.
    let qn = resolve_type_expr(&t, &env, &objects, &host, false).unwrap();
    assert_eq!(qn, QualName::std_anytype());
}

#[test]
fn resolve_any_ref_accepts_a_name_regardless_of_its_declared_kind() {
    let mut objects = IndexMap::new();
    objects.insert(QualName::new("m", "V"), SchemaObjectKind::Alias);
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let host = EmptyHostSchema;

    let qn = resolve_any_ref(&bare("V"), &env, &objects, &host).unwrap();
    assert_eq!(qn, QualName::new("m", "V"));
}

#[test]
fn resolve_any_ref_still_reports_unresolved_reference_with_a_hint() {
    let mut objects = IndexMap::new();
    objects.insert(QualName::new("m", "View"), SchemaObjectKind::Alias);
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let host = EmptyHostSchema;

    let err = resolve_any_ref(&bare("Veiw"), &env, &objects, &host).unwrap_err();
    match err {
        CompileError::UnresolvedReference { name, hint, .. } => {
            assert_eq!(name, "m::Veiw");
            assert_eq!(hint.as_deref(), Some("did you mean 'View'?"));
        }
        other => panic!("expected UnresolvedReference, got {other:?}"),
    }
}

#[test]
fn resolve_type_expr_propagates_errors_from_a_bad_collection_element() {
    let objects = IndexMap::new();
    let aliases = IndexMap::new();
    let env = ResolveEnv::new("m", &aliases);
    let host = EmptyHostSchema;

    let t = TypeExpr::Collection {
        kind: "array".to_string(),
        args: vec![named("Missing")],
    };
    let err = resolve_type_expr(&t, &env, &objects, &host, false).unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedReference { .. }));
}
