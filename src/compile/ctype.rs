//! Construction fragments for character types: `.`, digit, whitespace, and
//! word-character sets, their negations, and the `TYPE*` quantifiers that
//! repeat them.

use super::NfaBuilder;
use crate::{
    bytecode::Opcode,
    error::BuildError,
    nfa::{EPSILON, StateId},
};

const LF: u8 = 0x0A;

/// The whitespace set matched by `\s`: TAB, LF, FF, CR, and space.
const WHITESPACE: [u8; 5] = [0x09, 0x0A, 0x0C, 0x0D, 0x20];

/// A fixed byte set an instruction can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CharType {
    /// `.`: every byte, minus LF unless DOTALL is active.
    Any,
    Digit,
    NotDigit,
    Whitespace,
    NotWhitespace,
    Wordchar,
    NotWordchar,
}

impl CharType {
    /// The type named by an opcode, either a standalone instruction or the
    /// operand of a `TYPE*` quantifier.
    pub(super) fn from_opcode(opcode: Opcode) -> Option<CharType> {
        match opcode {
            Opcode::Any | Opcode::AllAny => Some(CharType::Any),
            Opcode::Digit => Some(CharType::Digit),
            Opcode::NotDigit => Some(CharType::NotDigit),
            Opcode::Whitespace => Some(CharType::Whitespace),
            Opcode::NotWhitespace => Some(CharType::NotWhitespace),
            Opcode::Wordchar => Some(CharType::Wordchar),
            Opcode::NotWordchar => Some(CharType::NotWordchar),
            _ => None,
        }
    }

    fn matches(self, byte: u8, dotall: bool) -> bool {
        match self {
            CharType::Any => dotall || byte != LF,
            CharType::Digit => byte.is_ascii_digit(),
            CharType::NotDigit => !byte.is_ascii_digit(),
            CharType::Whitespace => WHITESPACE.contains(&byte),
            CharType::NotWhitespace => !WHITESPACE.contains(&byte),
            CharType::Wordchar => byte.is_ascii_alphanumeric() || byte == b'_',
            CharType::NotWordchar => !(byte.is_ascii_alphanumeric() || byte == b'_'),
        }
    }
}

impl NfaBuilder<'_> {
    /// Add an edge from `from` to `to` for every byte in the type's set, in
    /// ascending byte order.
    fn add_type_edges(&mut self, from: StateId, ty: CharType, to: StateId) {
        let dotall = self.nfa.options().dotall();
        for byte in 0..=u8::MAX {
            if ty.matches(byte, dotall) {
                self.nfa.add_tx(from, usize::from(byte), to);
            }
        }
    }

    /// Read the type operand at the cursor and advance past it.
    fn type_operand(&mut self) -> Result<CharType, BuildError> {
        let tag = self.byte_at(0)?;
        let ty = Opcode::from_u8(tag)
            .and_then(CharType::from_opcode)
            .ok_or_else(|| BuildError::unknown_opcode(tag))?;
        self.cp += 1;
        Ok(ty)
    }

    /// `Any`/`AllAny`: one hop on (almost) every byte.
    pub(super) fn any(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let tail = self.nfa.alloc_state();
        self.add_type_edges(sp, CharType::Any, tail);
        Ok(tail)
    }

    /// A standalone type instruction (`Digit`, `NotWhitespace`, ...): one hop
    /// on the type's set.
    pub(super) fn simple_type(&mut self, sp: StateId, opcode: Opcode) -> Result<StateId, BuildError> {
        self.cp += 1;
        let ty = CharType::from_opcode(opcode)
            .ok_or_else(|| BuildError::unknown_opcode(opcode.into()))?;
        let tail = self.nfa.alloc_state();
        self.add_type_edges(sp, ty, tail);
        Ok(tail)
    }

    /// `TypeExact{n}`: a chain of `n` type hops.
    pub(super) fn type_exact(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let count = self.get2(0)?;
        self.cp += 2;
        let ty = self.type_operand()?;
        let mut sp = sp;
        for _ in 0..count {
            let tail = self.nfa.alloc_state();
            self.add_type_edges(sp, ty, tail);
            sp = tail;
        }
        Ok(sp)
    }

    /// `TypePlus` family.
    pub(super) fn type_plus(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let ty = self.type_operand()?;
        let tail = self.nfa.alloc_state();
        self.add_type_edges(sp, ty, tail);
        self.add_type_edges(tail, ty, tail);
        Ok(tail)
    }

    /// `TypeStar` family.
    pub(super) fn type_star(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let ty = self.type_operand()?;
        let tail = self.nfa.alloc_state();
        self.nfa.add_tx(sp, EPSILON, tail);
        self.add_type_edges(tail, ty, tail);
        Ok(tail)
    }

    /// `TypeQuery` family.
    pub(super) fn type_query(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let ty = self.type_operand()?;
        let tail = self.nfa.alloc_state();
        self.nfa.add_tx(sp, EPSILON, tail);
        self.add_type_edges(sp, ty, tail);
        Ok(tail)
    }

    /// `TypeUpto{n}`: zero through `n` type hops, each able to bail out to
    /// the tail over epsilon.
    pub(super) fn type_upto(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let bound = self.get2(0)?;
        self.cp += 2;
        let ty = self.type_operand()?;
        if bound < 1 {
            return Ok(sp);
        }
        let tail = self.nfa.alloc_state();
        self.nfa.add_tx(sp, EPSILON, tail);
        let mut prev = sp;
        for _ in 0..bound {
            let mid = self.nfa.alloc_state();
            self.add_type_edges(prev, ty, mid);
            self.nfa.add_tx(mid, EPSILON, tail);
            prev = mid;
        }
        Ok(tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Config,
        bytecode::Assembler,
        compile::build,
        nfa::Nfa,
        options::Options,
    };

    fn one_op(body: impl FnOnce(&mut Assembler), flags: &str) -> Nfa {
        let mut asm = Assembler::new();
        asm.open(Opcode::Bra);
        body(&mut asm);
        asm.close(Opcode::Ket);
        build(
            &asm.finish(),
            Options::from_flags(flags.chars()),
            Config::new().unanchored_prefix(false),
        )
        .unwrap()
    }

    #[test]
    fn any_skips_line_feed_without_dotall() {
        let nfa = one_op(|asm| { asm.op(Opcode::Any); }, "");
        assert!(nfa.is_match(b"x"));
        assert!(nfa.is_match(b"\x00"));
        assert!(!nfa.is_match(b"\n"));
    }

    #[test]
    fn any_matches_line_feed_with_dotall() {
        let nfa = one_op(|asm| { asm.op(Opcode::Any); }, "s");
        assert!(nfa.is_match(b"\n"));
    }

    #[test]
    fn digit_sets() {
        let nfa = one_op(|asm| { asm.op(Opcode::Digit); }, "");
        assert!(nfa.is_match(b"0"));
        assert!(nfa.is_match(b"9"));
        assert!(!nfa.is_match(b"a"));

        let nfa = one_op(|asm| { asm.op(Opcode::NotDigit); }, "");
        assert!(!nfa.is_match(b"5"));
        assert!(nfa.is_match(b"a"));
    }

    #[test]
    fn whitespace_sets() {
        let nfa = one_op(|asm| { asm.op(Opcode::Whitespace); }, "");
        for byte in [0x09u8, 0x0A, 0x0C, 0x0D, 0x20] {
            assert!(nfa.is_match([byte]));
        }
        assert!(!nfa.is_match(b"\x0B")); // vertical tab is not \s here
        assert!(!nfa.is_match(b"x"));
    }

    #[test]
    fn wordchar_sets() {
        let nfa = one_op(|asm| { asm.op(Opcode::Wordchar); }, "");
        assert!(nfa.is_match(b"a"));
        assert!(nfa.is_match(b"Z"));
        assert!(nfa.is_match(b"0"));
        assert!(nfa.is_match(b"_"));
        assert!(!nfa.is_match(b"-"));

        let nfa = one_op(|asm| { asm.op(Opcode::NotWordchar); }, "");
        assert!(nfa.is_match(b"-"));
        assert!(!nfa.is_match(b"_"));
    }

    #[test]
    fn type_plus_repeats_digits() {
        let nfa = one_op(
            |asm| {
                asm.op(Opcode::TypePlus).op(Opcode::Digit);
                asm.op(Opcode::Char).byte(b'z');
            },
            "",
        );
        assert!(!nfa.is_match(b"z"));
        assert!(nfa.is_match(b"1z"));
        assert!(nfa.is_match(b"123z"));
        assert!(!nfa.is_match(b"12az"));
    }

    #[test]
    fn type_star_allows_zero_digits() {
        let nfa = one_op(
            |asm| {
                asm.op(Opcode::TypeStar).op(Opcode::Digit);
                asm.op(Opcode::Char).byte(b'z');
            },
            "",
        );
        assert!(nfa.is_match(b"z"));
        assert!(nfa.is_match(b"42z"));
    }

    #[test]
    fn type_exact_counts_hops() {
        let nfa = one_op(
            |asm| {
                asm.op(Opcode::TypeExact).uint16(2).op(Opcode::Digit);
                asm.op(Opcode::Char).byte(b'z');
            },
            "",
        );
        assert!(!nfa.is_match(b"1z"));
        assert!(nfa.is_match(b"12z"));
        assert!(!nfa.is_match(b"123z"));
    }

    #[test]
    fn type_upto_bounds_hops() {
        let nfa = one_op(
            |asm| {
                asm.op(Opcode::TypeUpto).uint16(2).op(Opcode::Whitespace);
                asm.op(Opcode::Char).byte(b'z');
            },
            "",
        );
        assert!(nfa.is_match(b"z"));
        assert!(nfa.is_match(b" z"));
        assert!(nfa.is_match(b"\t z"));
        assert!(!nfa.is_match(b"\t\t z"));
    }

    #[test]
    fn type_quantifier_rejects_non_type_operand() {
        let mut asm = Assembler::new();
        asm.open(Opcode::Bra);
        asm.op(Opcode::TypePlus).op(Opcode::Char);
        asm.close(Opcode::Ket);
        let err = build(&asm.finish(), Options::new(), Config::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("unknown opcode: {}", u8::from(Opcode::Char))
        );
    }
}
