//! Construction fragments for character classes: the 32-byte membership
//! bitmap, optionally followed by a class-repeat suffix.

use super::NfaBuilder;
use crate::{
    bytecode::Opcode,
    error::BuildError,
    nfa::{EPSILON, StateId},
};

impl NfaBuilder<'_> {
    /// `Class`/`NClass`: a bitmap hop, possibly quantified by a `CR*` suffix.
    ///
    /// The byte-code compiler has already inverted the bitmap for `NClass`,
    /// so both opcodes read the bitmap as the membership set.
    pub(super) fn class(&mut self, sp: StateId) -> Result<StateId, BuildError> {
        let bitmap = self.bitmap_at(1)?;
        self.cp += 33;

        let suffix = self.byte_at(0).ok().and_then(Opcode::from_u8);
        match suffix {
            Some(op @ (Opcode::CRPlus | Opcode::CRMinPlus | Opcode::CRPosPlus)) => {
                let tail = self.nfa.alloc_state();
                self.nfa.add_txs(sp, &bitmap, tail);
                self.nfa.add_txs(tail, &bitmap, tail);
                self.cp += op.len();
                Ok(tail)
            },
            Some(op @ (Opcode::CRQuery | Opcode::CRMinQuery | Opcode::CRPosQuery)) => {
                let tail = self.nfa.alloc_state();
                self.nfa.add_txs(sp, &bitmap, tail);
                self.nfa.add_tx(sp, EPSILON, tail);
                self.cp += op.len();
                Ok(tail)
            },
            Some(op @ (Opcode::CRStar | Opcode::CRMinStar | Opcode::CRPosStar)) => {
                let tail = self.nfa.alloc_state();
                self.nfa.add_tx(sp, EPSILON, tail);
                self.nfa.add_txs(tail, &bitmap, tail);
                self.cp += op.len();
                Ok(tail)
            },
            Some(op @ (Opcode::CRRange | Opcode::CRMinRange | Opcode::CRPosRange)) => {
                self.class_range(sp, &bitmap, op)
            },
            _ => {
                // No repeat suffix: a single bitmap hop. The next instruction
                // is dispatched normally.
                let tail = self.nfa.alloc_state();
                self.nfa.add_txs(sp, &bitmap, tail);
                Ok(tail)
            },
        }
    }

    /// `CRRange{min,max}`: `min` mandatory bitmap hops, then `max - min`
    /// optional hops that can each step straight to the final tail.
    fn class_range(
        &mut self,
        sp: StateId,
        bitmap: &[u8; 32],
        op: Opcode,
    ) -> Result<StateId, BuildError> {
        let mut min = usize::from(self.get2(1)?);
        let max = usize::from(self.get2(3)?);
        self.cp += op.len();

        let mut sp = sp;
        let mut prev = None;
        for _ in 0..min {
            let tail = self.nfa.alloc_state();
            self.nfa.add_txs(sp, bitmap, tail);
            prev = Some(sp);
            sp = tail;
        }
        let mut prev = match prev {
            Some(prev) => prev,
            None => {
                // Zero mandatory hops: the tail is reachable over epsilon,
                // and the first optional hop is folded into a direct edge.
                let entry = sp;
                let tail = self.nfa.alloc_state();
                self.nfa.add_tx(entry, EPSILON, tail);
                self.nfa.add_txs(entry, bitmap, tail);
                sp = tail;
                min += 1;
                entry
            },
        };
        for _ in 0..max.saturating_sub(min) {
            let mid = self.nfa.alloc_state();
            self.nfa.add_txs(prev, bitmap, mid);
            prev = mid;
            self.nfa.add_txs(prev, bitmap, sp);
        }
        Ok(sp)
    }
}
