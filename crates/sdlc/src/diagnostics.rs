//! The compiler's single error type, and the fuzzy-match hinting utility
//! used to enrich unresolved-reference diagnostics.

use sdlc_types::{QualName, Span};

use crate::schema::SchemaObjectKind;

/// Everything that can go wrong while compiling a batch. The one fallible
/// public entry point (`compile`) returns `Result<_, CompileError>`;
/// there is no partial output on error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompileError {
    #[error("could not resolve reference to '{name}'{}", hint_suffix(.hint))]
    UnresolvedReference {
        name: String,
        hint: Option<String>,
        span: Option<Span>,
    },

    #[error(
        "reference to '{name}' is a {actual}, but a {expected} was expected here"
    )]
    InvalidReference {
        name: QualName,
        expected: &'static str,
        actual: &'static str,
        span: Option<Span>,
    },

    #[error("cannot use the polymorphic pseudo-type '{name}' as a concrete type")]
    PseudoTypeInUserSchema { name: String, span: Option<Span> },

    #[error("cannot combine an enum base with other bases in '{name}'")]
    InvalidEnumComposition { name: QualName, span: Option<Span> },

    #[error("'{name}' is already declared")]
    DuplicateDeclaration { name: QualName, span: Option<Span> },

    #[error("{verbosename} is defined recursively")]
    RecursiveDefinition {
        name: QualName,
        verbosename: String,
        span: Option<Span>,
    },

    #[error("definition dependency cycle between {0}")]
    DefinitionCycle(String),

    #[error("reference to unknown name '{name}'")]
    UnknownReference { name: String, span: Option<Span> },
}

impl CompileError {
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::UnresolvedReference { span, .. }
            | CompileError::InvalidReference { span, .. }
            | CompileError::PseudoTypeInUserSchema { span, .. }
            | CompileError::InvalidEnumComposition { span, .. }
            | CompileError::DuplicateDeclaration { span, .. }
            | CompileError::RecursiveDefinition { span, .. }
            | CompileError::UnknownReference { span, .. } => *span,
            CompileError::DefinitionCycle(_) => None,
        }
    }
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(" ({h})"),
        None => String::new(),
    }
}

/// Compose a "did you mean" hint from a ranked suggestion list, matching the
/// phrasing used when enriching unresolved-reference lookups elsewhere in
/// this codebase's sibling crates.
pub fn format_hint(suggestions: &[String]) -> Option<String> {
    match suggestions {
        [] => None,
        [one] => Some(format!("did you mean '{one}'?")),
        many => {
            let joined = many
                .iter()
                .map(|s| format!("'{s}'"))
                .collect::<Vec<_>>()
                .join(", ");
            Some(format!("did you mean one of these: {joined}?"))
        }
    }
}

/// Simple edit distance for fuzzy matching (Levenshtein).
///
/// Intentionally stays minimal and dependency-free, optimized for small
/// inputs (identifiers), not for very large strings.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Rank `candidates` by closeness to `name`, keep those within
/// `max_distance`, and return up to `limit` names ordered by distance, then
/// by whether they share `name`'s prefix, then lexicographically.
pub fn find_suggestions(name: &str, candidates: &[String], max_distance: usize, limit: usize) -> Vec<String> {
    let mut ranked: Vec<(usize, bool, &str)> = candidates
        .iter()
        .map(|c| (edit_distance(name, c), !c.starts_with(name), c.as_str()))
        .filter(|(d, ..)| *d <= max_distance)
        .collect();

    ranked.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(b.2)));
    ranked.dedup_by(|a, b| a.2 == b.2);
    ranked.into_iter().take(limit).map(|(_, _, c)| c.to_string()).collect()
}

/// `verbosename` rendering: object-types as `object 'name'`, scalars as
/// `scalar 'name'`, functions as `function 'name(params)'`, pointers as
/// `link/property 'ptrname' of object type 'owner'`, etc.
pub fn verbosename(kind: SchemaObjectKind, name: &QualName) -> String {
    match kind {
        SchemaObjectKind::Link | SchemaObjectKind::Property => {
            if let Some((owner, ptr)) = name.split_pointer() {
                let noun = if kind == SchemaObjectKind::Link {
                    "link"
                } else {
                    "property"
                };
                format!("{noun} '{ptr}' of object type '{owner}'")
            } else {
                format!("{} '{}'", kind.noun(), name)
            }
        }
        SchemaObjectKind::AccessPolicy => {
            if let Some((owner, policy)) = name.split_pointer() {
                format!("access policy '{policy}' of object type '{owner}'")
            } else {
                format!("access policy '{name}'")
            }
        }
        _ => format!("{} '{}'", kind.noun(), name),
    }
}
