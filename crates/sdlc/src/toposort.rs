//! §4.6 Topological Sorter & §4.7 Output Assembly — turn the dependency
//! graph into the flat, deterministically-ordered DDL sequence the
//! compiler hands back to its caller.

use indexmap::{IndexMap, IndexSet};

use sdlc_types::QualName;

use crate::ast::Batch;
use crate::ddl::Ddl;
use crate::deptrace::DepGraph;
use crate::diagnostics::{verbosename, CompileError};
use crate::schema::SchemaObjectKind;

/// Prepend a `CreateModule` for every module a declaration lives in, plus
/// every dotted-path prefix of that module (so `a::b::c` also creates `a`
/// and `a::b`), even if a prefix owns no declarations of its own.
fn module_prelude(batch: &Batch) -> Vec<Ddl> {
    let mut modules: IndexSet<String> = IndexSet::new();
    for module in batch.keys() {
        let mut acc = String::new();
        for (i, segment) in module.split("::").enumerate() {
            if i > 0 {
                acc.push_str("::");
            }
            acc.push_str(segment);
            modules.insert(acc.clone());
        }
    }

    let mut sorted: Vec<String> = modules.into_iter().collect();
    sorted.sort();
    sorted
        .into_iter()
        .map(|m| Ddl::create_module(QualName::new(m, String::new())))
        .collect()
}

/// Deterministically order `graph`'s nodes so every hard dependency
/// precedes its dependent, tying off with lexicographic order both for
/// the ready set at each round and for picking a cycle's representative.
///
/// Weak dependencies are honored when they can be (to keep output stable
/// and readable) but never block progress on their own and never
/// contribute to a `DefinitionCycle` diagnostic — they exist purely to
/// nudge ordering, not to encode a real creation-order requirement.
pub fn topological_sort(graph: &DepGraph, objects: &IndexMap<QualName, SchemaObjectKind>) -> Result<Vec<Ddl>, CompileError> {
    let mut hard: IndexMap<QualName, IndexSet<QualName>> = IndexMap::new();
    let mut weak: IndexMap<QualName, IndexSet<QualName>> = IndexMap::new();

    for (qn, entry) in graph {
        // Self-dependencies are kept, not discarded: a node that hard-deps
        // on itself can never become ready, which is exactly how a
        // single-object recursive definition (§4.6, §7) gets caught below.
        // The one legal case of a node referencing itself — a scalar's own
        // constraint expression anchoring `__subject__` back to the scalar
        // — is already broken before it reaches here, via `loop_control`
        // (the constraint's own dep on the scalar is removed in
        // `deptrace::trace_concrete_constraint`), so this filter only ever
        // needs to exclude `loop_control` members, not `qn` itself.
        let mut h: IndexSet<QualName> = entry
            .deps
            .iter()
            .filter(|d| !entry.loop_control.contains(*d) && graph.contains_key(*d))
            .cloned()
            .collect();
        h.sort();
        hard.insert(qn.clone(), h);

        let mut w: IndexSet<QualName> = entry
            .weak_deps
            .iter()
            .filter(|d| !entry.loop_control.contains(*d) && graph.contains_key(*d))
            .cloned()
            .collect();
        w.sort();
        weak.insert(qn.clone(), w);
    }

    let mut sorted_keys: Vec<QualName> = graph.keys().cloned().collect();
    sorted_keys.sort();

    let mut output = Vec::with_capacity(graph.len());
    let mut emitted: IndexSet<QualName> = IndexSet::new();

    while emitted.len() < graph.len() {
        let pending: Vec<&QualName> = sorted_keys.iter().filter(|qn| !emitted.contains(*qn)).collect();

        let mut ready: Vec<QualName> = pending
            .iter()
            .filter(|qn| all_satisfied(&hard[**qn], &emitted) && all_satisfied(&weak[**qn], &emitted))
            .map(|qn| (*qn).clone())
            .collect();

        if ready.is_empty() {
            ready = pending
                .iter()
                .filter(|qn| all_satisfied(&hard[**qn], &emitted))
                .map(|qn| (*qn).clone())
                .collect();
        }

        if ready.is_empty() {
            return Err(cycle_error(&pending, &hard, objects));
        }

        ready.sort();
        for qn in &ready {
            output.push(graph[qn].item.clone());
            emitted.insert(qn.clone());
        }
    }

    Ok(output)
}

fn all_satisfied(deps: &IndexSet<QualName>, emitted: &IndexSet<QualName>) -> bool {
    deps.iter().all(|d| emitted.contains(d))
}

/// `pending` is already in lexicographic order (a suffix of the globally
/// sorted key list), so its first element is the smallest-qualname node
/// still stalled — the cycle representative.
fn cycle_error(pending: &[&QualName], hard: &IndexMap<QualName, IndexSet<QualName>>, objects: &IndexMap<QualName, SchemaObjectKind>) -> CompileError {
    let pending_set: IndexSet<QualName> = pending.iter().map(|q| (*q).clone()).collect();
    let start = pending[0].clone();

    let verbosename_of = |qn: &QualName| {
        let kind = objects.get(qn).copied().unwrap_or(SchemaObjectKind::ObjectType);
        verbosename(kind, qn)
    };

    // A node that hard-deps on itself is the single-object case (§4.6,
    // §7): "<X> is defined recursively", never the two-object "between X
    // and Y" form below.
    if hard[&start].contains(&start) {
        return CompileError::RecursiveDefinition {
            name: start.clone(),
            verbosename: verbosename_of(&start),
            span: None,
        };
    }

    let mut path = vec![start.clone()];
    let mut seen: IndexSet<QualName> = IndexSet::from_iter([start.clone()]);
    let mut current = start.clone();

    loop {
        let mut candidates: Vec<&QualName> = hard[&current].iter().filter(|d| pending_set.contains(*d)).collect();
        candidates.sort();
        let next = candidates
            .into_iter()
            .next()
            .expect("a stalled node always has at least one stalled hard dependency")
            .clone();
        path.push(next.clone());
        if next == start || seen.contains(&next) {
            break;
        }
        seen.insert(next.clone());
        current = next;
    }

    let x = verbosename_of(&path[0]);
    let y = verbosename_of(&path[path.len() - 2]);
    CompileError::DefinitionCycle(format!("{x} and {y}"))
}

/// §4.7: the final output is the module prelude followed by the
/// topologically sorted DDL sequence.
pub fn assemble_output(
    batch: &Batch,
    graph: &DepGraph,
    objects: &IndexMap<QualName, SchemaObjectKind>,
) -> Result<Vec<Ddl>, CompileError> {
    let mut output = module_prelude(batch);
    output.extend(topological_sort(graph, objects)?);
    Ok(output)
}
