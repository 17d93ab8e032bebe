use miette::{miette, LabeledSpan, Report, Severity};

use crate::isa::MEMORY_MAX;
use crate::span::Span;

// Parser errors

pub fn parse_missing_opcode(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::missing_opcode",
        help = "a label must be followed by an opcode or .fill on the same line.",
        labels = vec![LabeledSpan::at(span, "no opcode after this label")],
        "Missing opcode.",
    )
    .with_source_code(src.to_string())
}

pub fn parse_duplicate_label(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::duplicate_label",
        help = "labels may be defined only once per program.",
        labels = vec![LabeledSpan::at(span, "duplicate label")],
        "Duplicate label definition.",
    )
    .with_source_code(src.to_string())
}

// Encoder errors

pub fn encode_unknown_opcode(span: Span, src: &str, mnemonic: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "encode::unknown_opcode",
        help = "valid opcodes are add, nand, lw, sw, beq, jalr, halt and noop, plus the .fill directive.",
        labels = vec![LabeledSpan::at(span, "not an opcode")],
        "Unknown opcode '{mnemonic}'.",
    )
    .with_source_code(src.to_string())
}

pub fn encode_argument_count(span: Span, src: &str, expected: usize, actual: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "encode::argument_count",
        help = "check the operands required by this instruction.",
        labels = vec![LabeledSpan::at(span, "wrong operand count")],
        "Expected {expected} arguments, got {actual}.",
    )
    .with_source_code(src.to_string())
}

pub fn encode_bad_register(span: Span, src: &str, token: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "encode::bad_register",
        help = "register operands are written as plain numbers 0 through 7.",
        labels = vec![LabeledSpan::at(span, "not a register")],
        "Invalid register '{token}'.",
    )
    .with_source_code(src.to_string())
}

pub fn encode_range(span: Span, src: &str, value: i64) -> Report {
    miette!(
        severity = Severity::Error,
        code = "encode::range",
        help = "offsets must fit a signed 16-bit field, -32768 through 32767.",
        labels = vec![LabeledSpan::at(span, "out-of-range offset")],
        "Offset {value} does not fit in 16 bits.",
    )
    .with_source_code(src.to_string())
}

pub fn encode_undefined_symbol(span: Span, src: &str, token: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "encode::undefined_symbol",
        help = "expected a decimal literal or the name of a label defined in this program.",
        labels = vec![LabeledSpan::at(span, "unknown symbol")],
        "Undefined symbol '{token}'.",
    )
    .with_source_code(src.to_string())
}

// Loader errors

pub fn load_bad_word(span: Span, src: &str, token: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::bad_word",
        help = "machine-code files contain one decimal word per line.",
        labels = vec![LabeledSpan::at(span, "not a machine word")],
        "Cannot parse '{token}' as a machine word.",
    )
    .with_source_code(src.to_string())
}

pub fn load_too_large(words: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::too_large",
        help = format!("the machine addresses {MEMORY_MAX} words of memory."),
        "Program of {words} words does not fit in memory.",
    )
}
