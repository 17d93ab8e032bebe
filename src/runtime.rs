use std::io::{self, Write};

use miette::Result;

use crate::error;
use crate::isa::{self, Opcode, ADDR_MASK, MEMORY_MAX, NUM_REGS};
use crate::output::Tracer;
use crate::span::Span;

/// Execution gives up after this many instructions without a halt.
pub const STEP_LIMIT: u32 = 1_000_000;

/// Represents complete machine state during runtime.
pub struct RunState {
    /// System memory - 64K words, loaded image at the bottom, zeroes above.
    mem: Box<[u32; MEMORY_MAX]>,
    /// Program counter
    pc: u32,
    /// 8x 32-bit registers. Register 0 reads as zero after every step.
    reg: [u32; NUM_REGS],
    /// Instructions executed so far
    steps: u32,
}

/// What a single executed instruction means for the rest of the run.
///
/// The run loop matches on this after every step; there is no other way
/// out of the loop.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepOutcome {
    /// Keep fetching.
    Continue,
    /// The program executed `halt` - the only success terminal.
    Halted,
    /// The step limit ran out before a halt.
    StepLimit,
}

impl RunState {
    /// Build machine state from an assembled word image.
    pub fn try_from(words: &[u32]) -> Result<RunState> {
        if words.len() > MEMORY_MAX {
            return Err(error::load_too_large(words.len()));
        }
        let mut mem = Box::new([0u32; MEMORY_MAX]);
        mem[..words.len()].copy_from_slice(words);
        Ok(RunState {
            mem,
            pc: 0,
            reg: [0; NUM_REGS],
            steps: 0,
        })
    }

    /// Parse a machine-code file: one decimal word per line, masked to
    /// 32 bits.
    pub fn parse_image(src: &str) -> Result<Vec<u32>> {
        let mut words = Vec::new();
        for raw in src.lines() {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }
            match token.parse::<i64>() {
                Ok(word) => words.push(word as u32),
                Err(_) => {
                    return Err(error::load_bad_word(Span::within(src, token), src, token))
                }
            }
        }
        Ok(words)
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn reg(&self, reg: usize) -> u32 {
        self.reg[reg]
    }

    pub fn mem(&self, addr: usize) -> u32 {
        self.mem[addr]
    }

    /// Fetch-decode-dispatch until the program halts or runs out of steps.
    pub fn run<W: Write>(&mut self, tracer: &mut Tracer<W>) -> io::Result<StepOutcome> {
        loop {
            match self.step(tracer)? {
                StepOutcome::Continue => {}
                outcome => return Ok(outcome),
            }
        }
    }

    /// Execute a single instruction: trace the pre-step state, dispatch on
    /// the opcode, enforce the hardwired zero register and the step limit.
    pub fn step<W: Write>(&mut self, tracer: &mut Tracer<W>) -> io::Result<StepOutcome> {
        self.trace_registers(tracer)?;

        let fields = isa::decode(self.mem[self.pc as usize]);
        let offset = isa::sign_extend16(fields.imm);
        match fields.op {
            Opcode::Add => {
                self.reg[fields.dest] =
                    self.reg[fields.reg_a].wrapping_add(self.reg[fields.reg_b]);
                self.pc = self.next_pc();
            }
            Opcode::Nand => {
                self.reg[fields.dest] = !(self.reg[fields.reg_a] & self.reg[fields.reg_b]);
                self.pc = self.next_pc();
            }
            Opcode::Lw => {
                self.reg[fields.reg_b] = self.mem[self.data_addr(fields.reg_a, offset)];
                self.pc = self.next_pc();
            }
            Opcode::Sw => {
                self.mem[self.data_addr(fields.reg_a, offset)] = self.reg[fields.reg_b];
                self.pc = self.next_pc();
            }
            Opcode::Beq => {
                if self.reg[fields.reg_a] == self.reg[fields.reg_b] {
                    // Relative to the address after the branch; wraps like
                    // every other address
                    self.pc = self.pc.wrapping_add(1).wrapping_add(offset as u32) & ADDR_MASK;
                } else {
                    self.pc = self.next_pc();
                }
            }
            Opcode::Jalr => {
                // Link first: `jalr r r` lands on the next instruction
                self.reg[fields.reg_b] = self.pc.wrapping_add(1);
                self.pc = self.reg[fields.reg_a] & ADDR_MASK;
            }
            Opcode::Halt => {
                tracer.line(format_args!("machine halted"))?;
                tracer.line(format_args!("instructions executed: {}", self.steps))?;
                self.trace_registers(tracer)?;
                tracer.line(format_args!("--- memory state ---"))?;
                for (addr, val) in self.mem.iter().enumerate() {
                    if *val != 0 {
                        tracer.line(format_args!("mem[{addr}] = {val}"))?;
                    }
                }
                return Ok(StepOutcome::Halted);
            }
            Opcode::Noop => {
                self.pc = self.next_pc();
            }
        }

        // r0 reads as zero no matter what this instruction wrote to it
        self.reg[0] = 0;
        self.steps += 1;
        if self.steps > STEP_LIMIT {
            tracer.line(format_args!("step limit {STEP_LIMIT} exceeded"))?;
            return Ok(StepOutcome::StepLimit);
        }
        Ok(StepOutcome::Continue)
    }

    fn next_pc(&self) -> u32 {
        self.pc.wrapping_add(1) & ADDR_MASK
    }

    fn data_addr(&self, reg_a: usize, offset: i32) -> usize {
        (self.reg[reg_a].wrapping_add(offset as u32) & ADDR_MASK) as usize
    }

    fn trace_registers<W: Write>(&self, tracer: &mut Tracer<W>) -> io::Result<()> {
        let regs = self
            .reg
            .iter()
            .enumerate()
            .map(|(i, val)| format!("r{i}:{val}"))
            .collect::<Vec<_>>()
            .join(" ");
        tracer.line(format_args!("pc:{}  {}", self.pc, regs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;
    use crate::parser::AsmParser;
    use crate::symbol::SymbolTable;

    fn assemble(src: &str) -> Vec<u32> {
        let lines = AsmParser::new(src).parse().unwrap();
        let symbols = SymbolTable::build(&lines, src).unwrap();
        encode(&lines, &symbols, src).unwrap()
    }

    /// Run a source program to completion, returning final state and the
    /// full trace.
    fn run(src: &str) -> (RunState, StepOutcome, String) {
        let words = assemble(src);
        let mut state = RunState::try_from(&words).unwrap();
        let mut tracer = Tracer::new(Vec::new(), false);
        let outcome = state.run(&mut tracer).unwrap();
        let log = String::from_utf8(tracer.into_inner().unwrap()).unwrap();
        (state, outcome, log)
    }

    #[test]
    fn add_then_halt_transcript() {
        let (state, outcome, log) = run("add 0 0 1\nhalt\n");
        assert_eq!(outcome, StepOutcome::Halted);
        assert_eq!(state.reg(1), 0);
        assert_eq!(state.pc(), 1);
        assert_eq!(state.steps(), 1);
        let expected = "\
pc:0  r0:0 r1:0 r2:0 r3:0 r4:0 r5:0 r6:0 r7:0
pc:1  r0:0 r1:0 r2:0 r3:0 r4:0 r5:0 r6:0 r7:0
machine halted
instructions executed: 1
pc:1  r0:0 r1:0 r2:0 r3:0 r4:0 r5:0 r6:0 r7:0
--- memory state ---
mem[0] = 1
mem[1] = 25165824
";
        assert_eq!(log, expected);
    }

    #[test]
    fn lw_reads_absolute_address() {
        let (state, outcome, _) = run("lw 0 1 five\nhalt\nfive .fill 5\n");
        assert_eq!(outcome, StepOutcome::Halted);
        assert_eq!(state.reg(1), 5);
    }

    #[test]
    fn register_zero_stays_hardwired() {
        // `add 1 1 0` writes the sum into r0; the write must not stick
        let words = assemble("lw 0 1 one\nadd 1 1 0\nhalt\none .fill 1\n");
        let mut state = RunState::try_from(&words).unwrap();
        let mut tracer = Tracer::new(io::sink(), false);
        assert_eq!(state.step(&mut tracer).unwrap(), StepOutcome::Continue);
        assert_eq!(state.reg(1), 1);
        assert_eq!(state.step(&mut tracer).unwrap(), StepOutcome::Continue);
        assert_eq!(state.reg(0), 0);
        assert_eq!(state.step(&mut tracer).unwrap(), StepOutcome::Halted);
    }

    #[test]
    fn nand_is_not_and() {
        let (state, _, _) = run(
            "lw 0 1 a\nlw 0 2 b\nnand 1 2 3\nhalt\na .fill 12\nb .fill 10\n",
        );
        assert_eq!(state.reg(3), !(12u32 & 10u32));
    }

    #[test]
    fn sw_wraps_address_arithmetic() {
        // r1 = -1, so `sw 1 2 0` stores at (u32::MAX + 0) mod 65536 = 65535
        let (state, _, log) = run(
            "lw 0 1 neg\nlw 0 2 seven\nsw 1 2 0\nhalt\nneg .fill -1\nseven .fill 7\n",
        );
        assert_eq!(state.mem(65535), 7);
        assert!(log.contains("mem[65535] = 7"));
    }

    #[test]
    fn beq_taken_and_not_taken() {
        // First beq is not taken (r1 != r0), second loops back over noop
        let (state, outcome, _) = run(
            "lw 0 1 one\nbeq 0 1 skip\nbeq 0 0 skip\nnoop\nskip halt\none .fill 1\n",
        );
        assert_eq!(outcome, StepOutcome::Halted);
        assert_eq!(state.pc(), 4);
        assert_eq!(state.steps(), 3);
    }

    #[test]
    fn jalr_links_before_jumping() {
        // With regA == regB the link value wins: jump lands on pc + 1
        let (state, outcome, _) = run("jalr 1 1\nhalt\n");
        assert_eq!(outcome, StepOutcome::Halted);
        assert_eq!(state.reg(1), 1);
        assert_eq!(state.pc(), 1);
    }

    #[test]
    fn jalr_returns_through_register() {
        let (state, outcome, _) = run(
            "lw 0 4 taddr\njalr 4 7\nhalt\nnoop\ntarget jalr 7 3\ntaddr .fill target\n",
        );
        // r4 = 4; jalr 4 7: r7 = 2, pc = 4; jalr 7 3: r3 = 5, pc = r7 = 2 -> halt
        assert_eq!(outcome, StepOutcome::Halted);
        assert_eq!(state.reg(7), 2);
        assert_eq!(state.reg(3), 5);
        assert_eq!(state.pc(), 2);
    }

    #[test]
    fn infinite_loop_hits_step_limit() {
        let words = assemble("loop beq 0 0 loop\n");
        let mut state = RunState::try_from(&words).unwrap();
        let mut tracer = Tracer::new(io::sink(), false);
        assert_eq!(state.run(&mut tracer).unwrap(), StepOutcome::StepLimit);
        assert_eq!(state.steps(), STEP_LIMIT + 1);
    }

    #[test]
    fn image_must_fit_in_memory() {
        assert!(RunState::try_from(&vec![0u32; MEMORY_MAX]).is_ok());
        assert!(RunState::try_from(&vec![0u32; MEMORY_MAX + 1]).is_err());
    }

    #[test]
    fn parse_image_masks_words() {
        let words = RunState::parse_image("5\n-1\n4294967296\n").unwrap();
        assert_eq!(words, vec![5, 4294967295, 0]);
        assert!(RunState::parse_image("5\nnot a word\n").is_err());
    }

    #[test]
    fn loaded_words_decode_to_encoded_fields() {
        // Assemble, reload through the text format, and decode: the field
        // values must survive the round trip for every instruction
        let src = "start add 1 2 3\nnand 4 5 6\nlw 0 1 data\nsw 0 1 data\n\
                   beq 1 2 start\njalr 3 4\nnoop\nhalt\ndata .fill -7\n";
        let words = assemble(src);
        let text = words
            .iter()
            .map(|w| format!("{w}\n"))
            .collect::<String>();
        let reloaded = RunState::parse_image(&text).unwrap();
        assert_eq!(words, reloaded);

        let fields = crate::isa::decode(reloaded[0]);
        assert_eq!(
            (fields.op, fields.reg_a, fields.reg_b, fields.dest),
            (Opcode::Add, 1, 2, 3)
        );
        let fields = crate::isa::decode(reloaded[4]);
        assert_eq!(
            (fields.op, fields.reg_a, fields.reg_b),
            (Opcode::Beq, 1, 2)
        );
        // beq back to start: 0 - (4 + 1) = -5
        assert_eq!(crate::isa::sign_extend16(fields.imm), -5);
    }
}
