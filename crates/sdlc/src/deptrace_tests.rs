use sdlc_types::QualName;

use crate::ast::{AbstractConstraintDecl, AccessPolicy, Base, Decl, GlobalDecl, Param};
use crate::deptrace::trace_dependencies;
use crate::inherit::compute_ancestors;
use crate::layout::trace_layout;
use crate::schema::EmptyHostSchema;
use crate::test_utils::*;

#[test]
fn object_type_depends_on_its_non_std_bases() {
    let base = abstract_object_type("Base", vec![required_property("id", std_type("int64"))]);
    let leaf = object_type("Leaf", vec![Base::Named(bare("Base"))], Vec::new());
    let b = batch(vec![("m", vec![Decl::ObjectType(base), Decl::ObjectType(leaf)])]);

    let layout = trace_layout(&b, &EmptyHostSchema).unwrap();
    let ancestors = compute_ancestors(&layout.inheritance, &layout.objects).unwrap();
    let graph = trace_dependencies(&b, &layout, &ancestors, &EmptyHostSchema).unwrap();

    let leaf_entry = graph.get(&QualName::new("m", "Leaf")).unwrap();
    assert!(leaf_entry.deps.contains(&QualName::new("m", "Base")));
}

#[test]
fn index_node_in_the_dependency_graph_matches_the_name_the_layout_pass_registered() {
    // The layout tracer and the dependency tracer each independently compute
    // an index's qualified name from its expression; they must agree.
    let mut ot = object_type("Book", Vec::new(), Vec::new());
    ot.indexes = vec![crate::ast::ConcreteIndex {
        name: None,
        expr: subject_path(&["title"]),
        except_expr: None,
        span: None,
    }];
    let b = batch(vec![("m", vec![Decl::ObjectType(ot)])]);

    let layout = trace_layout(&b, &EmptyHostSchema).unwrap();
    let ancestors = compute_ancestors(&layout.inheritance, &layout.objects).unwrap();
    let graph = trace_dependencies(&b, &layout, &ancestors, &EmptyHostSchema).unwrap();

    let index_qn = layout
        .objects
        .keys()
        .find(|qn| qn.name().starts_with("Book@index@@"))
        .expect("layout pass registered the index")
        .clone();
    assert!(graph.contains_key(&index_qn), "dependency tracer computed a different qualified name for the same index");
}

#[test]
fn pointer_depends_on_its_owner_and_target_type() {
    let author = object_type("Author", Vec::new(), Vec::new());
    let book = object_type("Book", Vec::new(), vec![optional_link("author", named("Author"))]);
    let b = batch(vec![("m", vec![Decl::ObjectType(author), Decl::ObjectType(book)])]);

    let layout = trace_layout(&b, &EmptyHostSchema).unwrap();
    let ancestors = compute_ancestors(&layout.inheritance, &layout.objects).unwrap();
    let graph = trace_dependencies(&b, &layout, &ancestors, &EmptyHostSchema).unwrap();

    let ptr_entry = graph.get(&QualName::new("m", "Book@author")).unwrap();
    assert!(ptr_entry.deps.contains(&QualName::new("m", "Book")));
    assert!(ptr_entry.deps.contains(&QualName::new("m", "Author")));
}

#[test]
fn overriding_a_pointer_depends_on_the_ancestor_pointer_it_overrides() {
    let base = abstract_object_type("Named", vec![optional_link("owner", named("Named"))]);
    let child = object_type(
        "SpecialNamed",
        vec![Base::Named(bare("Named"))],
        vec![optional_link("owner", named("Named"))],
    );
    let b = batch(vec![("m", vec![Decl::ObjectType(base), Decl::ObjectType(child)])]);

    let layout = trace_layout(&b, &EmptyHostSchema).unwrap();
    let ancestors = compute_ancestors(&layout.inheritance, &layout.objects).unwrap();
    let graph = trace_dependencies(&b, &layout, &ancestors, &EmptyHostSchema).unwrap();

    let overriding = graph.get(&QualName::new("m", "SpecialNamed@owner")).unwrap();
    assert!(overriding.deps.contains(&QualName::new("m", "Named@owner")));
}

#[test]
fn scalar_constraint_self_reference_is_exempted_from_its_own_dependency_set() {
    // `SmallInt` extends `std::int64` and constrains `__subject__` directly,
    // a legal bounded self-reference that must not form a cycle.
    let constraint = expr_constraint("max_value", subject_path(&[]));
    let mut st = scalar_type("SmallInt", vec![Base::Named(qualified("std", "int64"))]);
    st.constraints.push(constraint);
    let b = batch(vec![("m", vec![Decl::ScalarType(st)])]);

    let layout = trace_layout(&b, &EmptyHostSchema).unwrap();
    let ancestors = compute_ancestors(&layout.inheritance, &layout.objects).unwrap();
    let graph = trace_dependencies(&b, &layout, &ancestors, &EmptyHostSchema).unwrap();

    let scalar_qn = QualName::new("m", "SmallInt");
    let scalar_entry = graph.get(&scalar_qn).unwrap();
    assert_eq!(scalar_entry.loop_control.len(), 1);

    let constraint_qn = scalar_entry.loop_control.iter().next().unwrap();
    let constraint_entry = graph.get(constraint_qn).unwrap();
    assert!(!constraint_entry.deps.contains(&scalar_qn));
    assert!(constraint_entry.loop_control.contains(&scalar_qn));
}

#[test]
fn concrete_constraint_depends_on_its_abstract_base() {
    let ac = AbstractConstraintDecl {
        name: "nonzero".to_string(),
        params: Vec::new(),
        span: None,
    };
    let constraint = expr_constraint("nonzero", subject_path(&[]));
    let mut st = scalar_type("Count", vec![Base::Named(qualified("std", "int64"))]);
    st.constraints.push(constraint);
    let b = batch(vec![(
        "m",
        vec![Decl::AbstractConstraint(ac), Decl::ScalarType(st)],
    )]);

    let layout = trace_layout(&b, &EmptyHostSchema).unwrap();
    let ancestors = compute_ancestors(&layout.inheritance, &layout.objects).unwrap();
    let graph = trace_dependencies(&b, &layout, &ancestors, &EmptyHostSchema).unwrap();

    let constraint_qn = graph
        .keys()
        .find(|k| k.module() == "m" && k.name().starts_with("Count@nonzero@@"))
        .unwrap()
        .clone();
    let entry = graph.get(&constraint_qn).unwrap();
    assert!(entry.deps.contains(&QualName::new("m", "nonzero")));
}

#[test]
fn alias_depends_on_the_structural_closure_of_its_referenced_type() {
    let book = object_type("Book", Vec::new(), vec![required_property("title", std_type("str"))]);
    let a = alias("titles", crate::ast::Expr::TypeRef(named("Book")));
    let b = batch(vec![("m", vec![Decl::ObjectType(book), Decl::Alias(a)])]);

    let layout = trace_layout(&b, &EmptyHostSchema).unwrap();
    let ancestors = compute_ancestors(&layout.inheritance, &layout.objects).unwrap();
    let graph = trace_dependencies(&b, &layout, &ancestors, &EmptyHostSchema).unwrap();

    let entry = graph.get(&QualName::new("m", "titles")).unwrap();
    assert!(entry.deps.contains(&QualName::new("m", "Book")));
    assert!(entry.deps.contains(&QualName::new("m", "Book@title")));
}

#[test]
fn global_depends_on_its_target_type() {
    let color = scalar_type("Color", vec![Base::Enum(vec!["red".into(), "blue".into()], None)]);
    let g = GlobalDecl {
        name: "default_color".to_string(),
        target: Some(named("Color")),
        default: None,
        annotations: Vec::new(),
        span: None,
    };
    let b = batch(vec![("m", vec![Decl::ScalarType(color), Decl::Global(g)])]);

    let layout = trace_layout(&b, &EmptyHostSchema).unwrap();
    let ancestors = compute_ancestors(&layout.inheritance, &layout.objects).unwrap();
    let graph = trace_dependencies(&b, &layout, &ancestors, &EmptyHostSchema).unwrap();

    let entry = graph.get(&QualName::new("m", "default_color")).unwrap();
    assert!(entry.deps.contains(&QualName::new("m", "Color")));
}

#[test]
fn function_depends_on_its_parameter_and_return_types() {
    use crate::ast::{FunctionBody, FunctionDecl};

    let widget = object_type("Widget", Vec::new(), Vec::new());
    let f = FunctionDecl {
        name: "identity".to_string(),
        params: vec![Param { name: "w".to_string(), type_: named("Widget") }],
        return_type: named("Widget"),
        body: FunctionBody::Native,
        annotations: Vec::new(),
        span: None,
    };
    let b = batch(vec![("m", vec![Decl::ObjectType(widget), Decl::Function(f)])]);

    let layout = trace_layout(&b, &EmptyHostSchema).unwrap();
    let ancestors = compute_ancestors(&layout.inheritance, &layout.objects).unwrap();
    let graph = trace_dependencies(&b, &layout, &ancestors, &EmptyHostSchema).unwrap();

    let qn = QualName::function("m", "identity", "m::Widget");
    let entry = graph.get(&qn).unwrap();
    assert!(entry.deps.contains(&QualName::new("m", "Widget")));
}

#[test]
fn abstract_constraint_and_annotation_declarations_have_no_dependencies() {
    use crate::ast::AbstractAnnotationDecl;

    let ac = AbstractConstraintDecl { name: "nonzero".to_string(), params: Vec::new(), span: None };
    let aa = AbstractAnnotationDecl { name: "deprecated".to_string(), span: None };
    let b = batch(vec![(
        "m",
        vec![Decl::AbstractConstraint(ac), Decl::AbstractAnnotation(aa)],
    )]);

    let layout = trace_layout(&b, &EmptyHostSchema).unwrap();
    let ancestors = compute_ancestors(&layout.inheritance, &layout.objects).unwrap();
    let graph = trace_dependencies(&b, &layout, &ancestors, &EmptyHostSchema).unwrap();

    assert!(graph.get(&QualName::new("m", "nonzero")).unwrap().deps.is_empty());
    assert!(graph.get(&QualName::new("m", "deprecated")).unwrap().deps.is_empty());
}

#[test]
fn access_policy_depends_on_its_owner_and_the_constraint_environment_of_referenced_types() {
    let book = object_type("Book", Vec::new(), vec![required_property("title", std_type("str"))]);
    let ap = AccessPolicy {
        name: "readable".to_string(),
        condition: None,
        using: Some(subject_path(&["title"])),
        span: None,
    };
    let mut owner = object_type("Shelf", Vec::new(), Vec::new());
    owner.access_policies.push(ap);
    let b = batch(vec![("m", vec![Decl::ObjectType(book), Decl::ObjectType(owner)])]);

    let layout = trace_layout(&b, &EmptyHostSchema).unwrap();
    let ancestors = compute_ancestors(&layout.inheritance, &layout.objects).unwrap();
    let graph = trace_dependencies(&b, &layout, &ancestors, &EmptyHostSchema).unwrap();

    let qn = QualName::access_policy(&QualName::new("m", "Shelf"), "readable");
    let entry = graph.get(&qn).unwrap();
    assert!(entry.deps.contains(&QualName::new("m", "Shelf")));
}

#[test]
fn dependency_graph_preserves_declaration_order_for_unrelated_nodes() {
    let a = object_type("A", Vec::new(), Vec::new());
    let b2 = object_type("B", Vec::new(), Vec::new());
    let b = batch(vec![("m", vec![Decl::ObjectType(a), Decl::ObjectType(b2)])]);

    let layout = trace_layout(&b, &EmptyHostSchema).unwrap();
    let ancestors = compute_ancestors(&layout.inheritance, &layout.objects).unwrap();
    let graph = trace_dependencies(&b, &layout, &ancestors, &EmptyHostSchema).unwrap();

    let keys: Vec<&QualName> = graph.keys().collect();
    let pos_a = keys.iter().position(|k| **k == QualName::new("m", "A")).unwrap();
    let pos_b = keys.iter().position(|k| **k == QualName::new("m", "B")).unwrap();
    assert!(pos_a < pos_b);
}
