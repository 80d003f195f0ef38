//! Shared data structures for the SDL-to-DDL compiler: fully-qualified
//! names and source spans. Kept in their own crate so both the compiler
//! core and any downstream consumer of its output (a DDL executor, a
//! language server) can depend on the data without pulling in the
//! compiler itself.

mod name;
mod span;


pub use name::{is_std_module, QualName, ANYTUPLE, ANYTYPE, STD_MODULE};
pub use span::Span;
