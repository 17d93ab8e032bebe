// Assembling
mod parser;
pub use parser::{AsmParser, SourceLine, Token};
mod symbol;
pub use symbol::SymbolTable;
mod encode;
pub use encode::encode;

// Running
mod runtime;
pub use runtime::{RunState, StepOutcome, STEP_LIMIT};
mod output;
pub use output::Tracer;

// Shared instruction layout contract
pub mod isa;

mod error;
mod span;
pub use span::{Idx, Span};

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 2;
