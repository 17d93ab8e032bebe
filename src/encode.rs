use miette::Result;

use crate::error;
use crate::isa::{self, Opcode};
use crate::parser::{SourceLine, Token};
use crate::symbol::SymbolTable;

/// Bounds of a signed 16-bit offset/immediate field.
const FIELD_MIN: i64 = -(1 << 15);
const FIELD_MAX: i64 = (1 << 15) - 1;

/// Encode every parsed line into a 32-bit word, in program order.
///
/// Pure with respect to its inputs; all file I/O stays with the caller, so
/// no output can exist for a program that failed to encode.
pub fn encode(lines: &[SourceLine], symbols: &SymbolTable, src: &str) -> Result<Vec<u32>> {
    let mut words = Vec::with_capacity(lines.len());
    for (addr, line) in lines.iter().enumerate() {
        words.push(encode_line(addr as u32, line, symbols, src)?);
    }
    Ok(words)
}

fn encode_line(addr: u32, line: &SourceLine, symbols: &SymbolTable, src: &str) -> Result<u32> {
    if line.mnemonic.val == ".fill" {
        expect_argc(line, 1, src)?;
        let value = resolve_value(&line.operands[0], symbols, true, src)?;
        // Raw data word: truncate to 32 bits, no range check
        return Ok(value as u32);
    }

    let op = match Opcode::from_mnemonic(&line.mnemonic.val) {
        Some(op) => op,
        None => {
            return Err(error::encode_unknown_opcode(
                line.mnemonic.span,
                src,
                &line.mnemonic.val,
            ))
        }
    };

    let word = match op {
        Opcode::Add | Opcode::Nand => {
            expect_argc(line, 3, src)?;
            let reg_a = expect_reg(&line.operands[0], src)?;
            let reg_b = expect_reg(&line.operands[1], src)?;
            let dest = expect_reg(&line.operands[2], src)?;
            isa::encode_rrr(op, reg_a, reg_b, dest)
        }
        Opcode::Lw | Opcode::Sw => {
            expect_argc(line, 3, src)?;
            let reg_a = expect_reg(&line.operands[0], src)?;
            let reg_b = expect_reg(&line.operands[1], src)?;
            // A label offset resolves to its absolute address, not a
            // displacement
            let target = &line.operands[2];
            let offset = resolve_value(target, symbols, true, src)?;
            isa::encode_rri(op, reg_a, reg_b, expect_field(offset, target, src)?)
        }
        Opcode::Beq => {
            expect_argc(line, 3, src)?;
            let reg_a = expect_reg(&line.operands[0], src)?;
            let reg_b = expect_reg(&line.operands[1], src)?;
            // A label target is measured from the address after this
            // instruction; anything else must be a literal displacement
            let target = &line.operands[2];
            let offset = match symbols.get(&target.val) {
                Some(dest_addr) => dest_addr as i64 - (addr as i64 + 1),
                None => resolve_value(target, symbols, false, src)?,
            };
            isa::encode_rri(op, reg_a, reg_b, expect_field(offset, target, src)?)
        }
        Opcode::Jalr => {
            expect_argc(line, 2, src)?;
            let reg_a = expect_reg(&line.operands[0], src)?;
            let reg_b = expect_reg(&line.operands[1], src)?;
            isa::encode_rr(op, reg_a, reg_b)
        }
        Opcode::Halt | Opcode::Noop => {
            expect_argc(line, 0, src)?;
            isa::encode_o(op)
        }
    };
    Ok(word)
}

fn expect_argc(line: &SourceLine, expected: usize, src: &str) -> Result<()> {
    if line.operands.len() != expected {
        return Err(error::encode_argument_count(
            line.mnemonic.span,
            src,
            expected,
            line.operands.len(),
        ));
    }
    Ok(())
}

fn expect_reg(tok: &Token, src: &str) -> Result<u32> {
    match tok.val.parse::<u32>() {
        Ok(reg) if reg < isa::NUM_REGS as u32 => Ok(reg),
        _ => Err(error::encode_bad_register(tok.span, src, &tok.val)),
    }
}

fn expect_field(value: i64, tok: &Token, src: &str) -> Result<i16> {
    if (FIELD_MIN..=FIELD_MAX).contains(&value) {
        Ok(value as i16)
    } else {
        Err(error::encode_range(tok.span, src, value))
    }
}

/// A literal decimal integer, else (where allowed) an exact label match.
/// No expressions, no other bases.
fn resolve_value(tok: &Token, symbols: &SymbolTable, allow_label: bool, src: &str) -> Result<i64> {
    if let Ok(value) = tok.val.parse::<i64>() {
        return Ok(value);
    }
    if allow_label {
        if let Some(addr) = symbols.get(&tok.val) {
            return Ok(addr as i64);
        }
    }
    Err(error::encode_undefined_symbol(tok.span, src, &tok.val))
}
