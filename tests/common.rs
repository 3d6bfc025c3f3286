//! Helpers shared by the integration tests: canned byte-code programs, a
//! table-backed stand-in for the external PCRE compiler, and the reference
//! engine used to cross-check acceptance.

use std::{collections::HashMap, error::Error};

use pcrenfa::{Assembler, CompilePcre, bytecode::Opcode};
use regex_automata::{meta, util::syntax};

/// A reference engine configured for the same byte-oriented, unanchored
/// search semantics as the NFA simulator.
pub fn oracle(pattern: &str, caseless: bool, dotall: bool) -> meta::Regex {
    meta::Regex::builder()
        .syntax(
            syntax::Config::new()
                .unicode(false)
                .utf8(false)
                .case_insensitive(caseless)
                .dot_matches_new_line(dotall),
        )
        .build(pattern)
        .unwrap()
}

/// A byte-code "compiler" backed by a table of canned programs.
///
/// Each entry also records the option bits the caller is expected to derive
/// from the pattern literal; a mismatch fails compilation, which doubles as
/// an assertion on the flag plumbing.
#[derive(Debug, Default)]
pub struct TableCompiler {
    programs: HashMap<String, (u32, Vec<u8>)>,
}

impl TableCompiler {
    pub fn new() -> TableCompiler {
        TableCompiler::default()
    }

    pub fn insert(&mut self, pattern: &str, flags: u32, code: Vec<u8>) -> &mut TableCompiler {
        self.programs.insert(pattern.to_owned(), (flags, code));
        self
    }
}

impl CompilePcre for TableCompiler {
    fn compile(
        &self,
        pattern: &str,
        flags: u32,
    ) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        match self.programs.get(pattern) {
            Some((expected, code)) if *expected == flags => Ok(code.clone()),
            Some((expected, _)) => Err(format!(
                "pattern {pattern:?} compiled with option bits {flags:#x}, expected {expected:#x}"
            )
            .into()),
            None => Err(format!("no canned program for pattern {pattern:?}").into()),
        }
    }
}

/// Wrap assembled instructions in the standard top-level group.
pub fn program(body: impl FnOnce(&mut Assembler)) -> Vec<u8> {
    let mut asm = Assembler::new();
    asm.open(Opcode::Bra);
    body(&mut asm);
    asm.close(Opcode::Ket);
    asm.finish()
}

/// The program a PCRE compiler emits for a literal pattern.
pub fn literal(bytes: &[u8]) -> Vec<u8> {
    program(|asm| {
        for &byte in bytes {
            asm.op(Opcode::Char).byte(byte);
        }
    })
}

/// The caseless spelling of a literal pattern.
pub fn caseless_literal(bytes: &[u8]) -> Vec<u8> {
    program(|asm| {
        for &byte in bytes {
            asm.op(Opcode::CharI).byte(byte);
        }
    })
}

/// The digit-class bitmap, `[0-9]`.
pub fn digit_bitmap() -> [u8; 32] {
    Assembler::class_bitmap(b'0'..=b'9')
}
