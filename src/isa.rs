//! Shared definition of the LC-2K instruction layout.
//!
//! Both the encoder and the runtime read opcode values and field positions
//! from here, so the two halves of the toolchain cannot drift apart.

/// Number of addressable words in machine memory.
pub const MEMORY_MAX: usize = 1 << 16;
/// Number of general-purpose registers. Register 0 is hardwired to zero.
pub const NUM_REGS: usize = 8;
/// Addresses wrap modulo memory size.
pub const ADDR_MASK: u32 = (MEMORY_MAX - 1) as u32;

pub const OPCODE_SHIFT: u32 = 22;
pub const REG_A_SHIFT: u32 = 19;
pub const REG_B_SHIFT: u32 = 16;
/// The opcode, regA, regB and destReg fields are all 3 bits wide.
pub const REG_MASK: u32 = 0b111;
/// 16-bit immediate/offset field of I-format instructions.
pub const FIELD_MASK: u32 = 0xFFFF;

/// The eight LC-2K opcodes with their 3-bit encodings.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Opcode {
    Add = 0,
    Nand = 1,
    Lw = 2,
    Sw = 3,
    Beq = 4,
    Jalr = 5,
    Halt = 6,
    Noop = 7,
}

impl Opcode {
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        let op = match mnemonic {
            "add" => Opcode::Add,
            "nand" => Opcode::Nand,
            "lw" => Opcode::Lw,
            "sw" => Opcode::Sw,
            "beq" => Opcode::Beq,
            "jalr" => Opcode::Jalr,
            "halt" => Opcode::Halt,
            "noop" => Opcode::Noop,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_mnemonic(token: &str) -> bool {
        Opcode::from_mnemonic(token).is_some()
    }

    /// Extract the opcode field from a packed word. Total as the field is
    /// only 3 bits wide.
    pub fn decode(word: u32) -> Opcode {
        match (word >> OPCODE_SHIFT) & REG_MASK {
            0 => Opcode::Add,
            1 => Opcode::Nand,
            2 => Opcode::Lw,
            3 => Opcode::Sw,
            4 => Opcode::Beq,
            5 => Opcode::Jalr,
            6 => Opcode::Halt,
            _ => Opcode::Noop,
        }
    }
}

/// Every field of a fetched word. Only the fields belonging to the decoded
/// opcode's format carry meaning; the rest are whatever bits were there.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Fields {
    pub op: Opcode,
    pub reg_a: usize,
    pub reg_b: usize,
    /// R-format destination, read from the low 3 bits.
    pub dest: usize,
    /// Raw 16-bit field. Sign-extend where the format treats it as signed.
    pub imm: u16,
}

pub fn decode(word: u32) -> Fields {
    Fields {
        op: Opcode::decode(word),
        reg_a: ((word >> REG_A_SHIFT) & REG_MASK) as usize,
        reg_b: ((word >> REG_B_SHIFT) & REG_MASK) as usize,
        dest: (word & REG_MASK) as usize,
        imm: (word & FIELD_MASK) as u16,
    }
}

/// R-format (add, nand). destReg sits in the low 3 bits of the word,
/// not at a 16-bit shift like regA/regB.
pub fn encode_rrr(op: Opcode, reg_a: u32, reg_b: u32, dest: u32) -> u32 {
    (op as u32) << OPCODE_SHIFT | reg_a << REG_A_SHIFT | reg_b << REG_B_SHIFT | dest
}

/// I-format (lw, sw, beq) with a signed 16-bit offset.
pub fn encode_rri(op: Opcode, reg_a: u32, reg_b: u32, offset: i16) -> u32 {
    (op as u32) << OPCODE_SHIFT
        | reg_a << REG_A_SHIFT
        | reg_b << REG_B_SHIFT
        | offset as u16 as u32
}

/// J-format (jalr). No immediate field; the low 16 bits stay zero.
pub fn encode_rr(op: Opcode, reg_a: u32, reg_b: u32) -> u32 {
    (op as u32) << OPCODE_SHIFT | reg_a << REG_A_SHIFT | reg_b << REG_B_SHIFT
}

/// O-format (halt, noop). Opcode only.
pub fn encode_o(op: Opcode) -> u32 {
    (op as u32) << OPCODE_SHIFT
}

/// Sign-extend the 16-bit field of an I-format word.
pub fn sign_extend16(field: u16) -> i32 {
    field as i16 as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_extend() {
        let cases: &[(u16, i32)] = &[
            (0x0000, 0),
            (0x0001, 1),
            (0x7FFF, 32767),
            (0x8000, -32768),
            (0xFFFE, -2),
            (0xFFFF, -1),
        ];
        for (input, expected) in cases {
            assert_eq!(sign_extend16(*input), *expected);
        }
    }

    #[test]
    fn decode_inverts_encode() {
        let word = encode_rrr(Opcode::Add, 3, 5, 7);
        let fields = decode(word);
        assert_eq!(fields.op, Opcode::Add);
        assert_eq!(fields.reg_a, 3);
        assert_eq!(fields.reg_b, 5);
        assert_eq!(fields.dest, 7);

        let word = encode_rri(Opcode::Beq, 1, 2, -1);
        let fields = decode(word);
        assert_eq!(fields.op, Opcode::Beq);
        assert_eq!(fields.reg_a, 1);
        assert_eq!(fields.reg_b, 2);
        assert_eq!(sign_extend16(fields.imm), -1);

        let fields = decode(encode_rr(Opcode::Jalr, 6, 0));
        assert_eq!(fields.op, Opcode::Jalr);
        assert_eq!(fields.reg_a, 6);
        assert_eq!(fields.reg_b, 0);
        assert_eq!(fields.imm, 0);

        assert_eq!(decode(encode_o(Opcode::Halt)).op, Opcode::Halt);
        assert_eq!(decode(encode_o(Opcode::Noop)).op, Opcode::Noop);
    }

    #[test]
    fn dest_is_not_shifted() {
        // The R-format destination lives in bits 0-2.
        assert_eq!(encode_rrr(Opcode::Add, 0, 0, 1), 1);
        assert_eq!(encode_o(Opcode::Halt), 25165824);
    }

    #[test]
    fn every_mnemonic_round_trips() {
        for mnemonic in ["add", "nand", "lw", "sw", "beq", "jalr", "halt", "noop"] {
            let op = Opcode::from_mnemonic(mnemonic).unwrap();
            assert_eq!(Opcode::decode(encode_o(op)), op);
        }
        assert!(Opcode::from_mnemonic(".fill").is_none());
        assert!(Opcode::from_mnemonic("ADD").is_none());
    }
}
