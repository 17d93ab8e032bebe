use miette::Result;

use crate::error;
use crate::isa::Opcode;
use crate::span::Span;
use crate::symbol::is_label;

/// A single word of source text with its place in the file.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub val: String,
    pub span: Span,
}

/// One statement-bearing line: optional label, mnemonic, raw operand tokens.
///
/// Operands are kept verbatim; validating them is the encoder's job.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SourceLine {
    /// 1-based line number inside the file.
    pub line: u32,
    pub label: Option<Token>,
    pub mnemonic: Token,
    pub operands: Vec<Token>,
}

/// Turns LC-2K source text into an ordered sequence of [`SourceLine`]s.
pub struct AsmParser<'a> {
    src: &'a str,
}

impl<'a> AsmParser<'a> {
    pub fn new(src: &'a str) -> Self {
        AsmParser { src }
    }

    /// Parse every line, skipping blank and comment-only ones.
    pub fn parse(&self) -> Result<Vec<SourceLine>> {
        let mut lines = Vec::new();
        for (i, raw) in self.src.lines().enumerate() {
            // Everything from the first `#` onward is a comment
            let code = match raw.find('#') {
                Some(idx) => &raw[..idx],
                None => raw,
            };

            let mut toks = code
                .split_whitespace()
                .map(|word| Token {
                    val: word.to_string(),
                    span: Span::within(self.src, word),
                });
            let first = match toks.next() {
                Some(tok) => tok,
                None => continue,
            };

            // The first token is a label only if it fits the label grammar
            // and cannot be read as an opcode or the .fill keyword
            let takes_label =
                is_label(&first.val) && !Opcode::is_mnemonic(&first.val) && first.val != ".fill";
            let (label, mnemonic) = if takes_label {
                match toks.next() {
                    Some(mnemonic) => (Some(first), mnemonic),
                    None => return Err(error::parse_missing_opcode(first.span, self.src)),
                }
            } else {
                (None, first)
            };

            lines.push(SourceLine {
                line: (i + 1) as u32,
                label,
                mnemonic,
                operands: toks.collect(),
            });
        }
        Ok(lines)
    }
}
