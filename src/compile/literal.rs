//! Construction fragments for single-symbol instructions: literal characters,
//! negated characters, and their quantified forms.
//!
//! Case folding is option-driven: when the pattern was compiled caseless and
//! the symbol is an ASCII letter, the case-swapped byte goes to the same
//! target as the stated byte.

use super::NfaBuilder;
use crate::{
    error::BuildError,
    nfa::{EPSILON, StateId},
};

impl NfaBuilder<'_> {
    /// The case-swapped counterpart of `sym`, when folding applies.
    fn case_fold(&self, sym: u8) -> Option<u8> {
        if self.nfa.options().caseless() && sym.is_ascii_alphabetic() {
            Some(sym ^ 0x20)
        } else {
            None
        }
    }

    /// Add `sym` edges (and the case-folded twin) from `from` to `to`.
    fn add_symbol(&mut self, from: StateId, sym: u8, to: StateId) {
        self.nfa.add_tx(from, usize::from(sym), to);
        if let Some(folded) = self.case_fold(sym) {
            self.nfa.add_tx(from, usize::from(folded), to);
        }
    }

    /// Add an edge from `from` to `to` for every byte except `sym` (and its
    /// case-folded twin).
    fn add_negated(&mut self, from: StateId, sym: u8, to: StateId) {
        let folded = self.case_fold(sym);
        for byte in 0..=u8::MAX {
            if byte == sym || Some(byte) == folded {
                continue;
            }
            self.nfa.add_tx(from, usize::from(byte), to);
        }
    }

    /// `Char`/`CharI`: one symbol hop.
    pub(super) fn char_(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let sym = self.byte_at(0)?;
        self.cp += 1;
        let tail = self.nfa.alloc_state();
        self.add_symbol(sp, sym, tail);
        Ok(tail)
    }

    /// `Not`/`NotI`: one hop on any byte but the stated one.
    pub(super) fn not(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let sym = self.byte_at(0)?;
        self.cp += 1;
        let tail = self.nfa.alloc_state();
        self.add_negated(sp, sym, tail);
        Ok(tail)
    }

    /// `Exact{n}`: a chain of `n` symbol hops, each through a fresh state.
    pub(super) fn exact(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let count = self.get2(0)?;
        self.cp += 2;
        let sym = self.byte_at(0)?;
        self.cp += 1;
        let mut sp = sp;
        for _ in 0..count {
            let tail = self.nfa.alloc_state();
            self.add_symbol(sp, sym, tail);
            sp = tail;
        }
        Ok(sp)
    }

    /// `NotExact{n}`: a chain of `n` negated hops.
    pub(super) fn not_exact(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let count = self.get2(0)?;
        self.cp += 2;
        let sym = self.byte_at(0)?;
        self.cp += 1;
        let mut sp = sp;
        for _ in 0..count {
            let tail = self.nfa.alloc_state();
            self.add_negated(sp, sym, tail);
            sp = tail;
        }
        Ok(sp)
    }

    /// `Plus` family: one mandatory hop into a tail that loops on the symbol.
    pub(super) fn plus(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let sym = self.byte_at(0)?;
        self.cp += 1;
        let tail = self.nfa.alloc_state();
        self.add_symbol(sp, sym, tail);
        self.add_symbol(tail, sym, tail);
        Ok(tail)
    }

    /// `NotPlus` family.
    pub(super) fn not_plus(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let sym = self.byte_at(0)?;
        self.cp += 1;
        let tail = self.nfa.alloc_state();
        self.add_negated(sp, sym, tail);
        self.add_negated(tail, sym, tail);
        Ok(tail)
    }

    /// `Star` family: epsilon into a tail that loops on the symbol.
    pub(super) fn star(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let sym = self.byte_at(0)?;
        self.cp += 1;
        let tail = self.nfa.alloc_state();
        self.nfa.add_tx(sp, EPSILON, tail);
        self.add_symbol(tail, sym, tail);
        Ok(tail)
    }

    /// `NotStar` family.
    pub(super) fn not_star(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let sym = self.byte_at(0)?;
        self.cp += 1;
        let tail = self.nfa.alloc_state();
        self.nfa.add_tx(sp, EPSILON, tail);
        self.add_negated(tail, sym, tail);
        Ok(tail)
    }

    /// `Query` family: the tail is reachable both by epsilon and by the
    /// symbol.
    pub(super) fn query(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let sym = self.byte_at(0)?;
        self.cp += 1;
        let tail = self.nfa.alloc_state();
        self.nfa.add_tx(sp, EPSILON, tail);
        self.add_symbol(sp, sym, tail);
        Ok(tail)
    }

    /// `NotQuery` family.
    pub(super) fn not_query(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let sym = self.byte_at(0)?;
        self.cp += 1;
        let tail = self.nfa.alloc_state();
        self.nfa.add_tx(sp, EPSILON, tail);
        self.add_negated(sp, sym, tail);
        Ok(tail)
    }

    /// `Upto{n}`: zero through `n` repetitions, as a chain of `n` optional
    /// hops that can each bail out to the tail over epsilon.
    ///
    /// A bound below one leaves the tail untouched.
    pub(super) fn upto(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let bound = self.get2(0)?;
        self.cp += 2;
        let sym = self.byte_at(0)?;
        self.cp += 1;
        if bound < 1 {
            return Ok(sp);
        }
        let tail = self.nfa.alloc_state();
        self.nfa.add_tx(sp, EPSILON, tail);
        let mut prev = sp;
        for _ in 0..bound {
            let mid = self.nfa.alloc_state();
            self.add_symbol(prev, sym, mid);
            self.nfa.add_tx(mid, EPSILON, tail);
            prev = mid;
        }
        Ok(tail)
    }

    /// `NotUpto{n}`.
    pub(super) fn not_upto(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        self.cp += 1;
        let bound = self.get2(0)?;
        self.cp += 2;
        let sym = self.byte_at(0)?;
        self.cp += 1;
        if bound < 1 {
            return Ok(sp);
        }
        let tail = self.nfa.alloc_state();
        self.nfa.add_tx(sp, EPSILON, tail);
        let mut prev = sp;
        for _ in 0..bound {
            let mid = self.nfa.alloc_state();
            self.add_negated(prev, sym, mid);
            self.nfa.add_tx(mid, EPSILON, tail);
            prev = mid;
        }
        Ok(tail)
    }
}
