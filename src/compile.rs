//! Byte-code to NFA construction.
//!
//! The builder walks the byte-code left to right with a cursor, dispatching
//! on the opcode at the cursor to a construction fragment. Every fragment
//! receives the current tail state, appends its sub-automaton, advances the
//! cursor past the instruction, and returns the new tail; the tail left over
//! from the single top-level group becomes the accept state.

use crate::{
    Config,
    bytecode::Opcode,
    error::BuildError,
    nfa::{EPSILON, NSYMBOLS, Nfa, StateId},
    options::Options,
};

mod class;
mod ctype;
mod literal;

/// Build an NFA from compiled byte-code.
pub(crate) fn build(code: &[u8], options: Options, config: Config) -> Result<Nfa, BuildError> {
    let mut nfa = Nfa::new_for_build(config.get_stats());
    if config.get_unanchored_prefix() {
        // The implicit `.*?` search prefix: a self-loop on every byte. An
        // anchor opcode removes it again.
        let start = nfa.start();
        for sym in 0..NSYMBOLS {
            nfa.add_tx(start, sym, start);
        }
    }
    nfa.set_options(options);

    let builder = NfaBuilder {
        nfa,
        code,
        cp: 0,
        bra_state: Vec::new(),
    };
    builder.build()
}

/// Carries the construction state for one build.
struct NfaBuilder<'c> {
    nfa: Nfa,
    code: &'c [u8],
    /// Cursor into `code`.
    cp: usize,
    /// Entry states of the currently open groups, innermost last. The top
    /// entry is the back-edge target for a greedy group repeat.
    bra_state: Vec<StateId>,
}

impl NfaBuilder<'_> {
    fn build(mut self) -> Result<Nfa, BuildError> {
        let start = self.nfa.start();
        let accept = self.op(start)?;
        self.nfa.set_accept(accept);
        Ok(self.nfa)
    }

    /// Translate the instruction at the cursor, returning the new tail.
    fn op(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        let tag = self.byte_at(0)?;
        let opcode = Opcode::from_u8(tag).ok_or_else(|| BuildError::unknown_opcode(tag))?;
        match opcode {
            Opcode::Any | Opcode::AllAny => self.any(sp),

            Opcode::Bra | Opcode::CBra | Opcode::SCBra => self.bra(sp),
            Opcode::BraZero | Opcode::BraMinZero => self.bra_zero(sp),

            Opcode::Char | Opcode::CharI => self.char_(sp),
            Opcode::Circ | Opcode::CircM => self.circ(sp),
            Opcode::Class | Opcode::NClass => self.class(sp),

            Opcode::Digit
            | Opcode::NotDigit
            | Opcode::Whitespace
            | Opcode::NotWhitespace
            | Opcode::Wordchar
            | Opcode::NotWordchar => self.simple_type(sp, opcode),

            Opcode::Exact | Opcode::ExactI => self.exact(sp),
            Opcode::Not | Opcode::NotI => self.not(sp),
            Opcode::NotExact | Opcode::NotExactI => self.not_exact(sp),

            Opcode::NotPlus
            | Opcode::NotMinPlus
            | Opcode::NotPosPlus
            | Opcode::NotPlusI
            | Opcode::NotMinPlusI
            | Opcode::NotPosPlusI => self.not_plus(sp),

            Opcode::NotStar
            | Opcode::NotMinStar
            | Opcode::NotPosStar
            | Opcode::NotStarI
            | Opcode::NotMinStarI
            | Opcode::NotPosStarI => self.not_star(sp),

            Opcode::NotQuery
            | Opcode::NotMinQuery
            | Opcode::NotPosQuery
            | Opcode::NotQueryI
            | Opcode::NotMinQueryI
            | Opcode::NotPosQueryI => self.not_query(sp),

            Opcode::NotUpto
            | Opcode::NotMinUpto
            | Opcode::NotPosUpto
            | Opcode::NotUptoI
            | Opcode::NotMinUptoI
            | Opcode::NotPosUptoI => self.not_upto(sp),

            Opcode::Plus
            | Opcode::MinPlus
            | Opcode::PosPlus
            | Opcode::PlusI
            | Opcode::MinPlusI
            | Opcode::PosPlusI => self.plus(sp),

            Opcode::Query
            | Opcode::MinQuery
            | Opcode::PosQuery
            | Opcode::QueryI
            | Opcode::MinQueryI
            | Opcode::PosQueryI => self.query(sp),

            Opcode::Star
            | Opcode::MinStar
            | Opcode::PosStar
            | Opcode::StarI
            | Opcode::MinStarI
            | Opcode::PosStarI => self.star(sp),

            Opcode::Upto
            | Opcode::MinUpto
            | Opcode::PosUpto
            | Opcode::UptoI
            | Opcode::MinUptoI
            | Opcode::PosUptoI => self.upto(sp),

            Opcode::TypeExact => self.type_exact(sp),
            Opcode::TypePlus | Opcode::TypeMinPlus | Opcode::TypePosPlus => self.type_plus(sp),
            Opcode::TypeStar | Opcode::TypeMinStar | Opcode::TypePosStar => self.type_star(sp),
            Opcode::TypeQuery | Opcode::TypeMinQuery | Opcode::TypePosQuery => self.type_query(sp),
            Opcode::TypeUpto | Opcode::TypeMinUpto | Opcode::TypePosUpto => self.type_upto(sp),

            Opcode::Doll | Opcode::DollM | Opcode::WordBoundary => {
                // Not modeled: the automaton has no end-of-input or word
                // boundary symbol. The instruction is consumed without
                // producing transitions.
                log::debug!("skipping unmodeled assertion opcode {opcode:?}");
                self.cp += 1;
                Ok(sp)
            },

            // Valid tags that never start an instruction: group plumbing and
            // class-repeat suffixes are consumed by their owning fragments.
            Opcode::End
            | Opcode::Alt
            | Opcode::Ket
            | Opcode::KetRMax
            | Opcode::KetRMin
            | Opcode::KetRPos
            | Opcode::CRStar
            | Opcode::CRMinStar
            | Opcode::CRPosStar
            | Opcode::CRPlus
            | Opcode::CRMinPlus
            | Opcode::CRPosPlus
            | Opcode::CRQuery
            | Opcode::CRMinQuery
            | Opcode::CRPosQuery
            | Opcode::CRRange
            | Opcode::CRMinRange
            | Opcode::CRPosRange => Err(BuildError::unknown_opcode(tag)),
        }
    }

    /// A group: `Bra`/`CBra`/`SCBra`, alternation branches separated by
    /// `Alt`, terminated by `Ket` (or `KetRMax` for a greedy repeat).
    ///
    /// Each non-empty branch fans out of the entry state through an epsilon;
    /// all branch tails join into a fresh state through epsilons. A greedy
    /// repeat adds an epsilon from the join back to the entry.
    fn bra(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.bra_state.push(sp);
        let mut last_states = Vec::new();
        loop {
            let np = self.cp + usize::from(self.get2(1)?);
            let tag = self.byte_at(0)?;
            let bracket = Opcode::from_u8(tag).ok_or_else(|| BuildError::unknown_opcode(tag))?;
            self.cp += bracket.len();
            if self.cp < np {
                let mut subsp = self.nfa.alloc_state();
                self.nfa.add_tx(sp, EPSILON, subsp);
                while self.cp < np {
                    subsp = self.op(subsp)?;
                }
                last_states.push(subsp);
            }
            if self.byte_at(0)? != u8::from(Opcode::Alt) {
                break;
            }
        }

        let terminator = self.byte_at(0)?;
        let ket = match Opcode::from_u8(terminator) {
            Some(ket @ (Opcode::Ket | Opcode::KetRMax)) => ket,
            _ => return Err(BuildError::malformed_group(terminator)),
        };

        let mut sp = sp;
        if !last_states.is_empty() {
            sp = self.nfa.alloc_state();
            for tail in last_states {
                self.nfa.add_tx(tail, EPSILON, sp);
            }
        }
        if ket == Opcode::KetRMax {
            if let Some(&entry) = self.bra_state.last() {
                self.nfa.add_tx(sp, EPSILON, entry);
            }
        }
        self.cp += ket.len();
        self.bra_state.pop();
        Ok(sp)
    }

    /// `BraZero`/`BraMinZero`: the following group may be skipped entirely,
    /// via an epsilon from the pre-group state to the group tail.
    fn bra_zero(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.bra_state.push(sp);
        self.cp += 1;
        let tag = self.byte_at(0)?;
        match Opcode::from_u8(tag) {
            Some(Opcode::Bra | Opcode::CBra | Opcode::SCBra) => {},
            _ => return Err(BuildError::unknown_opcode(tag)),
        }
        let tail = self.bra(sp)?;
        if let Some(entry) = self.bra_state.pop() {
            self.nfa.add_tx(entry, EPSILON, tail);
        }
        Ok(tail)
    }

    /// `Circ`/`CircM`: anchor the automaton by removing the start state's
    /// byte self-loop.
    fn circ(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let start = self.nfa.start();
        self.nfa.clear_byte_tx(start);
        Ok(sp)
    }

    /// Read the byte at `cp + offset`.
    fn byte_at(&self, offset: usize) -> Result<u8, BuildError> {
        let at = self.cp + offset;
        self.code
            .get(at)
            .copied()
            .ok_or_else(|| BuildError::truncated(at, self.code.len()))
    }

    /// Read the two bytes at `cp + offset` as a big-endian integer.
    fn get2(&self, offset: usize) -> Result<u16, BuildError> {
        Ok(u16::from_be_bytes([
            self.byte_at(offset)?,
            self.byte_at(offset + 1)?,
        ]))
    }

    /// Read the 32-byte class bitmap at `cp + offset`.
    fn bitmap_at(&self, offset: usize) -> Result<[u8; 32], BuildError> {
        let at = self.cp + offset;
        let bytes = self
            .code
            .get(at..at + 32)
            .ok_or_else(|| BuildError::truncated(at + 31, self.code.len()))?;
        let mut bitmap = [0u8; 32];
        bitmap.copy_from_slice(bytes);
        Ok(bitmap)
    }
}
