//! SDL-to-DDL compiler core.
//!
//! Consumes a batch of parsed SDL declarations and a read-only view of
//! whatever schema objects already exist (the host schema — standard
//! library definitions, or a prior incremental compilation's output) and
//! produces the linear sequence of DDL commands that would create the
//! declared schema, in an order safe to execute top to bottom.
//!
//! The crate never touches source text or a database connection: parsing
//! happens upstream, execution happens downstream. Its only job is name
//! resolution, inheritance, dependency tracing, and linearization.

pub mod ast;
pub mod ddl;
mod deptrace;
pub mod diagnostics;
mod expr_trace;
mod inherit;
mod layout;
pub mod resolver;
pub mod schema;
mod toposort;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod deptrace_tests;
#[cfg(test)]
mod resolver_tests;

use crate::ast::Batch;
use crate::ddl::Ddl;
use crate::diagnostics::CompileError;
use crate::schema::HostSchema;

/// Compile a batch of SDL declarations into a linear DDL sequence.
///
/// `host` supplies everything the batch doesn't declare itself: standard
/// library objects any declaration may reference or extend, and (for
/// incremental compilation) objects a prior batch already created. Pass
/// [`schema::EmptyHostSchema`] to compile a schema entirely from scratch
/// against nothing but the standard library's implicit presence.
pub fn compile(batch: &Batch, host: &dyn HostSchema) -> Result<Vec<Ddl>, CompileError> {
    let layout = layout::trace_layout(batch, host)?;
    let ancestors = inherit::compute_ancestors(&layout.inheritance, &layout.objects)?;
    let graph = deptrace::trace_dependencies(batch, &layout, &ancestors, host)?;
    toposort::assemble_output(batch, &graph, &layout.objects)
}
