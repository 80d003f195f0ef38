//! §4.3 Inheritance Ancestor Computation & Merger.

use indexmap::{IndexMap, IndexSet};
use sdlc_types::QualName;

use crate::ast::Pointer;
use crate::diagnostics::{verbosename, CompileError};
use crate::layout::{InheritanceGraphEntry, TypeEntry};
use crate::schema::SchemaObjectKind;

/// Transitive closure of the `merge` edges in the inheritance graph, one
/// entry per item that has at least one base. A self-cycle (an item
/// reachable from itself) raises `RecursiveDefinition`.
pub fn compute_ancestors(
    inheritance: &[InheritanceGraphEntry],
    objects: &IndexMap<QualName, SchemaObjectKind>,
) -> Result<IndexMap<QualName, IndexSet<QualName>>, CompileError> {
    let parents: IndexMap<QualName, IndexSet<QualName>> = inheritance
        .iter()
        .map(|e| (e.item.clone(), e.merge.clone()))
        .collect();

    let mut ancestors = IndexMap::new();
    for item in parents.keys() {
        let mut guard = IndexSet::new();
        let a = get_ancestors(item, &parents, objects, &mut guard)?;
        ancestors.insert(item.clone(), a);
    }
    Ok(ancestors)
}

/// `RECURSION_GUARD` sentinel pattern: `guard` tracks the chain currently
/// being expanded; re-entering an item already on the chain is a cycle.
fn get_ancestors(
    item: &QualName,
    parents: &IndexMap<QualName, IndexSet<QualName>>,
    objects: &IndexMap<QualName, SchemaObjectKind>,
    guard: &mut IndexSet<QualName>,
) -> Result<IndexSet<QualName>, CompileError> {
    if !guard.insert(item.clone()) {
        let kind = objects
            .get(item)
            .copied()
            .unwrap_or(SchemaObjectKind::ObjectType);
        return Err(CompileError::RecursiveDefinition {
            name: item.clone(),
            verbosename: verbosename(kind, item),
            span: None,
        });
    }

    let mut acc = IndexSet::new();
    if let Some(bases) = parents.get(item) {
        for base in bases {
            acc.insert(base.clone());
            if parents.contains_key(base) {
                let sub = get_ancestors(base, parents, objects, guard)?;
                acc.extend(sub);
            }
        }
    }

    guard.shift_remove(item);
    Ok(acc)
}

/// Walk the inheritance graph bottom-up (bases before descendants, via
/// memoized recursion rather than a separate topological pass — safe
/// because `compute_ancestors` has already proven the graph acyclic) and
/// compute each item's effective, fully-merged pointer map.
///
/// This does NOT mutate `types`: the original, explicitly-declared pointer
/// lists on each `ObjectTypeDecl` must survive untouched, since the
/// dependency tracer uses them (not the merged view) to decide which
/// pointers get their own DDL node — a pointer purely inherited and never
/// redeclared emits no `CreateConcretePointer` of its own (§4.3, §8
/// scenario F). The merged view returned here exists only for chasing
/// path-expression steps through inherited pointers, and for the
/// dependency tracer's ancestor-pointer fallback.
///
/// Idempotent in the sense that recomputing from the same `types`/
/// `inheritance` input always yields the same fixpoint.
pub fn merge_inheritance(
    types: &IndexMap<QualName, TypeEntry>,
    inheritance: &[InheritanceGraphEntry],
) -> IndexMap<QualName, Vec<Pointer>> {
    let bases_of: IndexMap<QualName, Vec<QualName>> = inheritance
        .iter()
        .map(|e| (e.item.clone(), e.merge.iter().cloned().collect()))
        .collect();

    let mut memo: IndexMap<QualName, Vec<Pointer>> = IndexMap::new();
    let mut in_progress: IndexSet<QualName> = IndexSet::new();

    let keys: Vec<QualName> = types.keys().cloned().collect();
    for k in &keys {
        compute_merged(k, &bases_of, types, &mut memo, &mut in_progress);
    }
    memo
}

fn compute_merged(
    qn: &QualName,
    bases_of: &IndexMap<QualName, Vec<QualName>>,
    types: &IndexMap<QualName, TypeEntry>,
    memo: &mut IndexMap<QualName, Vec<Pointer>>,
    in_progress: &mut IndexSet<QualName>,
) -> Vec<Pointer> {
    if let Some(cached) = memo.get(qn) {
        return cached.clone();
    }
    if !in_progress.insert(qn.clone()) {
        // Cycles are already rejected by `compute_ancestors`; fall back to
        // the item's own pointers rather than looping.
        return types.get(qn).map(|t| t.pointers().to_vec()).unwrap_or_default();
    }

    let mut acc: IndexMap<String, Pointer> = IndexMap::new();
    if let Some(bases) = bases_of.get(qn) {
        for base in bases {
            for p in compute_merged(base, bases_of, types, memo, in_progress) {
                acc.entry(p.name.clone()).or_insert(p);
            }
        }
    }

    if let Some(entry) = types.get(qn) {
        for p in entry.pointers() {
            match acc.remove(&p.name) {
                Some(parent_ptr) => {
                    acc.insert(p.name.clone(), merge_pointer(&parent_ptr, p));
                }
                None => {
                    acc.insert(p.name.clone(), p.clone());
                }
            }
        }
    }

    in_progress.shift_remove(qn);
    let result: Vec<Pointer> = acc.into_values().collect();
    memo.insert(qn.clone(), result.clone());
    result
}

/// The child's explicit declaration always wins for target/cardinality;
/// only the nested pointer map (link properties) recursively merges
/// parent entries the child did not redeclare.
fn merge_pointer(parent: &Pointer, child: &Pointer) -> Pointer {
    let mut merged = child.clone();
    let mut acc: IndexMap<String, Pointer> = parent
        .pointers
        .iter()
        .map(|p| (p.name.clone(), p.clone()))
        .collect();

    for p in &child.pointers {
        match acc.remove(&p.name) {
            Some(parent_sub) => acc.insert(p.name.clone(), merge_pointer(&parent_sub, p)),
            None => acc.insert(p.name.clone(), p.clone()),
        };
    }

    merged.pointers = acc.into_values().collect();
    merged
}
