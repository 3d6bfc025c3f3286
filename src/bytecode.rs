//! The compiled-pattern byte-code contract.
//!
//! Byte-code is a flat sequence of single-byte opcode tags with inline
//! operands: two-byte big-endian integers for counts and group links, single
//! bytes for literal symbols, and 32-byte bitmaps for character classes. The
//! table below is shared between the NFA builder and whatever produces the
//! byte-code: an external PCRE compiler behind [`CompilePcre`], or the
//! [`Assembler`] for hand-written programs.
//!
//! A complete program is one top-level group (`Bra`/`CBra`/`SCBra` through a
//! `Ket` variant) followed by `End`.

use std::error::Error;

/// Option bit requesting case-insensitive compilation (`i`).
pub const CASELESS: u32 = 0x01;
/// Option bit requesting multiline compilation (`m`).
pub const MULTILINE: u32 = 0x02;
/// Option bit requesting that `.` also match a line feed (`s`).
pub const DOTALL: u32 = 0x04;

/// An external PCRE byte-code compiler.
///
/// Implementations turn a pattern source string and an option bit-mask
/// ([`CASELESS`] | [`MULTILINE`] | [`DOTALL`]) into byte-code over the
/// [`Opcode`] table. The error type is deliberately open: whatever the
/// underlying library reports is carried into
/// [`BuildError`](crate::BuildError) unchanged.
pub trait CompilePcre {
    /// Compile `pattern` under the given option bits.
    fn compile(&self, pattern: &str, flags: u32)
    -> Result<Vec<u8>, Box<dyn Error + Send + Sync>>;
}

macro_rules! opcode_table {
    ($( $name:ident = $value:literal / $len:literal; )*) => {
        /// A single-byte tag in compiled pattern byte-code.
        ///
        /// Quantifier tags come in greedy, minimal (`Min`), and possessive
        /// (`Pos`) forms, with `I` marking the caseless spellings; the NFA
        /// builder collapses each family to one construction. The numeric
        /// values are this crate's contract with its byte-code producers.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $(
                #[doc = concat!("Tag value ", stringify!($value), ".")]
                $name = $value,
            )*
        }

        impl Opcode {
            /// Decode a raw byte-code tag.
            pub const fn from_u8(byte: u8) -> Option<Opcode> {
                match byte {
                    $( $value => Some(Opcode::$name), )*
                    _ => None,
                }
            }

            /// Byte length of this opcode together with its inline operands.
            ///
            /// This is the stride the builder uses to advance its cursor past
            /// an instruction.
            pub const fn len(self) -> usize {
                match self {
                    $( Opcode::$name => $len, )*
                }
            }
        }
    };
}

opcode_table! {
    End = 0 / 1;
    WordBoundary = 1 / 1;
    NotDigit = 2 / 1;
    Digit = 3 / 1;
    NotWhitespace = 4 / 1;
    Whitespace = 5 / 1;
    NotWordchar = 6 / 1;
    Wordchar = 7 / 1;
    Any = 8 / 1;
    AllAny = 9 / 1;
    Circ = 10 / 1;
    CircM = 11 / 1;
    Doll = 12 / 1;
    DollM = 13 / 1;

    Char = 14 / 2;
    CharI = 15 / 2;
    Not = 16 / 2;
    NotI = 17 / 2;

    Star = 18 / 2;
    MinStar = 19 / 2;
    PosStar = 20 / 2;
    Plus = 21 / 2;
    MinPlus = 22 / 2;
    PosPlus = 23 / 2;
    Query = 24 / 2;
    MinQuery = 25 / 2;
    PosQuery = 26 / 2;
    Upto = 27 / 4;
    MinUpto = 28 / 4;
    PosUpto = 29 / 4;
    Exact = 30 / 4;

    StarI = 31 / 2;
    MinStarI = 32 / 2;
    PosStarI = 33 / 2;
    PlusI = 34 / 2;
    MinPlusI = 35 / 2;
    PosPlusI = 36 / 2;
    QueryI = 37 / 2;
    MinQueryI = 38 / 2;
    PosQueryI = 39 / 2;
    UptoI = 40 / 4;
    MinUptoI = 41 / 4;
    PosUptoI = 42 / 4;
    ExactI = 43 / 4;

    NotStar = 44 / 2;
    NotMinStar = 45 / 2;
    NotPosStar = 46 / 2;
    NotPlus = 47 / 2;
    NotMinPlus = 48 / 2;
    NotPosPlus = 49 / 2;
    NotQuery = 50 / 2;
    NotMinQuery = 51 / 2;
    NotPosQuery = 52 / 2;
    NotUpto = 53 / 4;
    NotMinUpto = 54 / 4;
    NotPosUpto = 55 / 4;
    NotExact = 56 / 4;

    NotStarI = 57 / 2;
    NotMinStarI = 58 / 2;
    NotPosStarI = 59 / 2;
    NotPlusI = 60 / 2;
    NotMinPlusI = 61 / 2;
    NotPosPlusI = 62 / 2;
    NotQueryI = 63 / 2;
    NotMinQueryI = 64 / 2;
    NotPosQueryI = 65 / 2;
    NotUptoI = 66 / 4;
    NotMinUptoI = 67 / 4;
    NotPosUptoI = 68 / 4;
    NotExactI = 69 / 4;

    TypeStar = 70 / 2;
    TypeMinStar = 71 / 2;
    TypePosStar = 72 / 2;
    TypePlus = 73 / 2;
    TypeMinPlus = 74 / 2;
    TypePosPlus = 75 / 2;
    TypeQuery = 76 / 2;
    TypeMinQuery = 77 / 2;
    TypePosQuery = 78 / 2;
    TypeUpto = 79 / 4;
    TypeMinUpto = 80 / 4;
    TypePosUpto = 81 / 4;
    TypeExact = 82 / 4;

    Class = 83 / 33;
    NClass = 84 / 33;
    CRStar = 85 / 1;
    CRMinStar = 86 / 1;
    CRPosStar = 87 / 1;
    CRPlus = 88 / 1;
    CRMinPlus = 89 / 1;
    CRPosPlus = 90 / 1;
    CRQuery = 91 / 1;
    CRMinQuery = 92 / 1;
    CRPosQuery = 93 / 1;
    CRRange = 94 / 5;
    CRMinRange = 95 / 5;
    CRPosRange = 96 / 5;

    Alt = 97 / 3;
    Ket = 98 / 3;
    KetRMax = 99 / 3;
    KetRMin = 100 / 3;
    KetRPos = 101 / 3;
    Bra = 102 / 3;
    CBra = 103 / 5;
    SCBra = 104 / 5;
    BraZero = 105 / 1;
    BraMinZero = 106 / 1;
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> u8 {
        opcode as u8
    }
}

/// Hand-assembles byte-code programs over the [`Opcode`] table.
///
/// This is the counterpart of building from an external compiler: the output
/// of [`finish`](Assembler::finish) can be fed straight to
/// [`Builder::build_from_bytecode`](crate::Builder::build_from_bytecode).
/// Group links (`Bra`/`Alt`/`Ket`) are back-patched automatically by
/// [`open`](Assembler::open), [`alt`](Assembler::alt), and
/// [`close`](Assembler::close).
///
/// The assembler panics on structural misuse (closing a group that was never
/// opened, finishing with groups still open); it does not try to validate
/// that the emitted program makes semantic sense.
#[derive(Debug, Default)]
pub struct Assembler {
    code: Vec<u8>,
    open_groups: Vec<OpenGroup>,
}

#[derive(Debug)]
struct OpenGroup {
    /// Position of the group's `Bra`/`CBra`/`SCBra` tag.
    start: usize,
    /// Position of the `Bra`/`Alt` tag whose forward link is still unpatched.
    last_link: usize,
}

impl Assembler {
    /// Create an empty assembler.
    pub fn new() -> Assembler {
        Assembler::default()
    }

    /// Emit a bare opcode tag.
    pub fn op(&mut self, opcode: Opcode) -> &mut Assembler {
        self.code.push(opcode.into());
        self
    }

    /// Emit a single operand byte.
    pub fn byte(&mut self, byte: u8) -> &mut Assembler {
        self.code.push(byte);
        self
    }

    /// Emit a run of operand bytes, e.g. a class bitmap.
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Assembler {
        self.code.extend_from_slice(bytes);
        self
    }

    /// Emit a two-byte big-endian operand.
    pub fn uint16(&mut self, value: u16) -> &mut Assembler {
        self.code.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Open a group with the given bracket opcode (`Bra`, `CBra`, or
    /// `SCBra`). Capturing brackets get a capture number of zero; the NFA
    /// builder does not read it.
    pub fn open(&mut self, opcode: Opcode) -> &mut Assembler {
        debug_assert!(matches!(
            opcode,
            Opcode::Bra | Opcode::CBra | Opcode::SCBra
        ));
        let start = self.code.len();
        self.open_groups.push(OpenGroup {
            start,
            last_link: start,
        });
        self.op(opcode).uint16(0);
        if matches!(opcode, Opcode::CBra | Opcode::SCBra) {
            self.uint16(0);
        }
        self
    }

    /// Begin the next alternation branch of the innermost open group.
    pub fn alt(&mut self) -> &mut Assembler {
        let here = self.code.len();
        let group = self
            .open_groups
            .last_mut()
            .expect("alt emitted outside of a group");
        let at = group.last_link;
        group.last_link = here;
        self.patch_link(at, here);
        self.op(Opcode::Alt).uint16(0)
    }

    /// Close the innermost open group with the given `Ket` variant.
    pub fn close(&mut self, opcode: Opcode) -> &mut Assembler {
        debug_assert!(matches!(
            opcode,
            Opcode::Ket | Opcode::KetRMax | Opcode::KetRMin | Opcode::KetRPos
        ));
        let here = self.code.len();
        let group = self
            .open_groups
            .pop()
            .expect("close emitted outside of a group");
        self.patch_link(group.last_link, here);
        let back = to_link(here - group.start);
        self.op(opcode).uint16(back)
    }

    /// Append the terminating `End` tag and take the finished program.
    pub fn finish(&mut self) -> Vec<u8> {
        debug_assert!(
            self.open_groups.is_empty(),
            "finished with {} group(s) still open",
            self.open_groups.len()
        );
        self.op(Opcode::End);
        std::mem::take(&mut self.code)
    }

    /// Build a 32-byte class bitmap from its member bytes.
    pub fn class_bitmap<I: IntoIterator<Item = u8>>(members: I) -> [u8; 32] {
        let mut bitmap = [0u8; 32];
        for byte in members {
            bitmap[usize::from(byte >> 3)] |= 1 << (byte & 7);
        }
        bitmap
    }

    fn patch_link(&mut self, at: usize, target: usize) {
        let link = to_link(target - at);
        self.code[at + 1..at + 3].copy_from_slice(&link.to_be_bytes());
    }
}

fn to_link(distance: usize) -> u16 {
    u16::try_from(distance).expect("group body too large for a 2-byte link")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        let mut decoded = 0;
        for byte in 0..=u8::MAX {
            if let Some(opcode) = Opcode::from_u8(byte) {
                assert_eq!(u8::from(opcode), byte);
                decoded += 1;
            }
        }
        assert_eq!(decoded, 107);
    }

    #[test]
    fn strides() {
        assert_eq!(Opcode::End.len(), 1);
        assert_eq!(Opcode::Char.len(), 2);
        assert_eq!(Opcode::Exact.len(), 4);
        assert_eq!(Opcode::TypePosUpto.len(), 4);
        assert_eq!(Opcode::Class.len(), 33);
        assert_eq!(Opcode::Bra.len(), 3);
        assert_eq!(Opcode::CBra.len(), 5);
        assert_eq!(Opcode::CRRange.len(), 5);
        assert_eq!(Opcode::BraZero.len(), 1);
    }

    #[test]
    fn assemble_alternation_links() {
        let mut asm = Assembler::new();
        asm.open(Opcode::Bra);
        asm.op(Opcode::Char).byte(b'a');
        asm.alt();
        asm.op(Opcode::Char).byte(b'b');
        asm.close(Opcode::Ket);
        let code = asm.finish();

        assert_eq!(
            code,
            vec![
                u8::from(Opcode::Bra),
                0,
                5,
                u8::from(Opcode::Char),
                b'a',
                u8::from(Opcode::Alt),
                0,
                5,
                u8::from(Opcode::Char),
                b'b',
                u8::from(Opcode::Ket),
                0,
                10,
                u8::from(Opcode::End),
            ]
        );
    }

    #[test]
    fn capturing_bracket_reserves_capture_number() {
        let mut asm = Assembler::new();
        asm.open(Opcode::CBra);
        asm.op(Opcode::Char).byte(b'x');
        asm.close(Opcode::Ket);
        let code = asm.finish();

        // CBra is five bytes wide: tag, link, capture number.
        assert_eq!(code[0], u8::from(Opcode::CBra));
        assert_eq!(&code[1..3], &[0, 7]);
        assert_eq!(&code[3..5], &[0, 0]);
        assert_eq!(code[5], u8::from(Opcode::Char));
    }

    #[test]
    fn class_bitmap_bit_positions() {
        let bitmap = Assembler::class_bitmap([0u8, 1, 9, 255]);
        assert_eq!(bitmap[0], 0b0000_0011);
        assert_eq!(bitmap[1], 0b0000_0010);
        assert_eq!(bitmap[31], 0b1000_0000);
        let empty: u32 = bitmap[2..31].iter().map(|&b| u32::from(b)).sum();
        assert_eq!(empty, 0);
    }
}
