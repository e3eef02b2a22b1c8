//! The two-level CIL opcode table.
//!
//! Two fixed 256-entry arrays: one for single-byte opcodes and one for the
//! second byte of `0xFE`-prefixed opcodes. Built once behind a [`OnceLock`]
//! on first use and read-only afterward; vacant slots keep an empty mnemonic
//! and decode as reserved. Mnemonics and declared operand widths follow
//! ECMA-335 partition III.

use std::sync::OnceLock;

/// The escape byte introducing two-byte opcodes.
pub const ESCAPE_BYTE: u8 = 0xFE;

/// Declared operand shape of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum OperandKind {
    None,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    Int64,
    Float32,
    Float64,
    Token,
    /// `switch`: a u32 count followed by that many u32 targets
    Switch,
}

impl OperandKind {
    /// Fixed operand width in bytes; `None` for the variable-length
    /// `switch` shape.
    #[must_use]
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            OperandKind::None => Some(0),
            OperandKind::Int8 | OperandKind::UInt8 => Some(1),
            OperandKind::Int16 | OperandKind::UInt16 => Some(2),
            OperandKind::Int32 | OperandKind::Float32 | OperandKind::Token => Some(4),
            OperandKind::Int64 | OperandKind::Float64 => Some(8),
            OperandKind::Switch => None,
        }
    }
}

/// How the reconstruction engine folds an opcode.
///
/// Everything outside the modeled subset carries [`Effect::Unmodeled`]: the
/// engine advances past the operand without touching its stack. That path is
/// a deliberate completeness boundary, not a decoding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Advance only; no stack interaction
    Unmodeled,
    /// Field-token operand: push `this.<field>`
    FieldAccess,
    /// Method-token operand: push a synthesized call-site expression
    Call,
    /// `ldarg.0`-`ldarg.3`: record the fixed argument index
    LoadArgConst(u8),
    /// `ldarg.s`/`ldarg`: record the argument index from the operand
    LoadArgOperand,
    /// `ret`: emit a pseudo-statement
    Return,
    /// `ldtoken`: push a sentinel name for the referenced entity
    LoadToken,
}

/// One slot of the opcode table.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeEntry {
    /// Mnemonic, empty for reserved slots
    pub mnemonic: &'static str,
    /// Declared operand shape
    pub operand: OperandKind,
    /// Reconstruction effect
    pub effect: Effect,
}

impl OpcodeEntry {
    /// True for slots no opcode occupies.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.mnemonic.is_empty()
    }
}

const VACANT: OpcodeEntry = OpcodeEntry {
    mnemonic: "",
    operand: OperandKind::None,
    effect: Effect::Unmodeled,
};

/// The process-wide opcode table pair.
pub struct OpcodeTable {
    /// Single-byte opcodes, indexed by the opcode byte
    pub single: [OpcodeEntry; 256],
    /// Two-byte opcodes, indexed by the byte following [`ESCAPE_BYTE`]
    pub extended: [OpcodeEntry; 256],
}

static TABLES: OnceLock<OpcodeTable> = OnceLock::new();

/// The lazily-initialized opcode table.
pub fn tables() -> &'static OpcodeTable {
    TABLES.get_or_init(build)
}

fn set(
    table: &mut [OpcodeEntry; 256],
    opcode: u8,
    mnemonic: &'static str,
    operand: OperandKind,
    effect: Effect,
) {
    debug_assert!(
        table[opcode as usize].is_reserved(),
        "opcode 0x{opcode:02x} inserted twice"
    );
    table[opcode as usize] = OpcodeEntry {
        mnemonic,
        operand,
        effect,
    };
}

#[allow(clippy::too_many_lines)]
fn build() -> OpcodeTable {
    use Effect as E;
    use OperandKind as O;

    let mut single = [VACANT; 256];
    let mut extended = [VACANT; 256];
    let s = &mut single;

    set(s, 0x00, "nop", O::None, E::Unmodeled);
    set(s, 0x01, "break", O::None, E::Unmodeled);
    set(s, 0x02, "ldarg.0", O::None, E::LoadArgConst(0));
    set(s, 0x03, "ldarg.1", O::None, E::LoadArgConst(1));
    set(s, 0x04, "ldarg.2", O::None, E::LoadArgConst(2));
    set(s, 0x05, "ldarg.3", O::None, E::LoadArgConst(3));
    set(s, 0x06, "ldloc.0", O::None, E::Unmodeled);
    set(s, 0x07, "ldloc.1", O::None, E::Unmodeled);
    set(s, 0x08, "ldloc.2", O::None, E::Unmodeled);
    set(s, 0x09, "ldloc.3", O::None, E::Unmodeled);
    set(s, 0x0A, "stloc.0", O::None, E::Unmodeled);
    set(s, 0x0B, "stloc.1", O::None, E::Unmodeled);
    set(s, 0x0C, "stloc.2", O::None, E::Unmodeled);
    set(s, 0x0D, "stloc.3", O::None, E::Unmodeled);
    set(s, 0x0E, "ldarg.s", O::UInt8, E::LoadArgOperand);
    set(s, 0x0F, "ldarga.s", O::UInt8, E::Unmodeled);
    set(s, 0x10, "starg.s", O::UInt8, E::Unmodeled);
    set(s, 0x11, "ldloc.s", O::UInt8, E::Unmodeled);
    set(s, 0x12, "ldloca.s", O::UInt8, E::Unmodeled);
    set(s, 0x13, "stloc.s", O::UInt8, E::Unmodeled);
    set(s, 0x14, "ldnull", O::None, E::Unmodeled);
    set(s, 0x15, "ldc.i4.m1", O::None, E::Unmodeled);
    set(s, 0x16, "ldc.i4.0", O::None, E::Unmodeled);
    set(s, 0x17, "ldc.i4.1", O::None, E::Unmodeled);
    set(s, 0x18, "ldc.i4.2", O::None, E::Unmodeled);
    set(s, 0x19, "ldc.i4.3", O::None, E::Unmodeled);
    set(s, 0x1A, "ldc.i4.4", O::None, E::Unmodeled);
    set(s, 0x1B, "ldc.i4.5", O::None, E::Unmodeled);
    set(s, 0x1C, "ldc.i4.6", O::None, E::Unmodeled);
    set(s, 0x1D, "ldc.i4.7", O::None, E::Unmodeled);
    set(s, 0x1E, "ldc.i4.8", O::None, E::Unmodeled);
    set(s, 0x1F, "ldc.i4.s", O::Int8, E::Unmodeled);
    set(s, 0x20, "ldc.i4", O::Int32, E::Unmodeled);
    set(s, 0x21, "ldc.i8", O::Int64, E::Unmodeled);
    set(s, 0x22, "ldc.r4", O::Float32, E::Unmodeled);
    set(s, 0x23, "ldc.r8", O::Float64, E::Unmodeled);
    set(s, 0x25, "dup", O::None, E::Unmodeled);
    set(s, 0x26, "pop", O::None, E::Unmodeled);
    set(s, 0x27, "jmp", O::Token, E::Unmodeled);
    set(s, 0x28, "call", O::Token, E::Call);
    set(s, 0x29, "calli", O::Token, E::Unmodeled);
    set(s, 0x2A, "ret", O::None, E::Return);
    set(s, 0x2B, "br.s", O::Int8, E::Unmodeled);
    set(s, 0x2C, "brfalse.s", O::Int8, E::Unmodeled);
    set(s, 0x2D, "brtrue.s", O::Int8, E::Unmodeled);
    set(s, 0x2E, "beq.s", O::Int8, E::Unmodeled);
    set(s, 0x2F, "bge.s", O::Int8, E::Unmodeled);
    set(s, 0x30, "bgt.s", O::Int8, E::Unmodeled);
    set(s, 0x31, "ble.s", O::Int8, E::Unmodeled);
    set(s, 0x32, "blt.s", O::Int8, E::Unmodeled);
    set(s, 0x33, "bne.un.s", O::Int8, E::Unmodeled);
    set(s, 0x34, "bge.un.s", O::Int8, E::Unmodeled);
    set(s, 0x35, "bgt.un.s", O::Int8, E::Unmodeled);
    set(s, 0x36, "ble.un.s", O::Int8, E::Unmodeled);
    set(s, 0x37, "blt.un.s", O::Int8, E::Unmodeled);
    set(s, 0x38, "br", O::Int32, E::Unmodeled);
    set(s, 0x39, "brfalse", O::Int32, E::Unmodeled);
    set(s, 0x3A, "brtrue", O::Int32, E::Unmodeled);
    set(s, 0x3B, "beq", O::Int32, E::Unmodeled);
    set(s, 0x3C, "bge", O::Int32, E::Unmodeled);
    set(s, 0x3D, "bgt", O::Int32, E::Unmodeled);
    set(s, 0x3E, "ble", O::Int32, E::Unmodeled);
    set(s, 0x3F, "blt", O::Int32, E::Unmodeled);
    set(s, 0x40, "bne.un", O::Int32, E::Unmodeled);
    set(s, 0x41, "bge.un", O::Int32, E::Unmodeled);
    set(s, 0x42, "bgt.un", O::Int32, E::Unmodeled);
    set(s, 0x43, "ble.un", O::Int32, E::Unmodeled);
    set(s, 0x44, "blt.un", O::Int32, E::Unmodeled);
    set(s, 0x45, "switch", O::Switch, E::Unmodeled);
    set(s, 0x46, "ldind.i1", O::None, E::Unmodeled);
    set(s, 0x47, "ldind.u1", O::None, E::Unmodeled);
    set(s, 0x48, "ldind.i2", O::None, E::Unmodeled);
    set(s, 0x49, "ldind.u2", O::None, E::Unmodeled);
    set(s, 0x4A, "ldind.i4", O::None, E::Unmodeled);
    set(s, 0x4B, "ldind.u4", O::None, E::Unmodeled);
    set(s, 0x4C, "ldind.i8", O::None, E::Unmodeled);
    set(s, 0x4D, "ldind.i", O::None, E::Unmodeled);
    set(s, 0x4E, "ldind.r4", O::None, E::Unmodeled);
    set(s, 0x4F, "ldind.r8", O::None, E::Unmodeled);
    set(s, 0x50, "ldind.ref", O::None, E::Unmodeled);
    set(s, 0x51, "stind.ref", O::None, E::Unmodeled);
    set(s, 0x52, "stind.i1", O::None, E::Unmodeled);
    set(s, 0x53, "stind.i2", O::None, E::Unmodeled);
    set(s, 0x54, "stind.i4", O::None, E::Unmodeled);
    set(s, 0x55, "stind.i8", O::None, E::Unmodeled);
    set(s, 0x56, "stind.r4", O::None, E::Unmodeled);
    set(s, 0x57, "stind.r8", O::None, E::Unmodeled);
    set(s, 0x58, "add", O::None, E::Unmodeled);
    set(s, 0x59, "sub", O::None, E::Unmodeled);
    set(s, 0x5A, "mul", O::None, E::Unmodeled);
    set(s, 0x5B, "div", O::None, E::Unmodeled);
    set(s, 0x5C, "div.un", O::None, E::Unmodeled);
    set(s, 0x5D, "rem", O::None, E::Unmodeled);
    set(s, 0x5E, "rem.un", O::None, E::Unmodeled);
    set(s, 0x5F, "and", O::None, E::Unmodeled);
    set(s, 0x60, "or", O::None, E::Unmodeled);
    set(s, 0x61, "xor", O::None, E::Unmodeled);
    set(s, 0x62, "shl", O::None, E::Unmodeled);
    set(s, 0x63, "shr", O::None, E::Unmodeled);
    set(s, 0x64, "shr.un", O::None, E::Unmodeled);
    set(s, 0x65, "neg", O::None, E::Unmodeled);
    set(s, 0x66, "not", O::None, E::Unmodeled);
    set(s, 0x67, "conv.i1", O::None, E::Unmodeled);
    set(s, 0x68, "conv.i2", O::None, E::Unmodeled);
    set(s, 0x69, "conv.i4", O::None, E::Unmodeled);
    set(s, 0x6A, "conv.i8", O::None, E::Unmodeled);
    set(s, 0x6B, "conv.r4", O::None, E::Unmodeled);
    set(s, 0x6C, "conv.r8", O::None, E::Unmodeled);
    set(s, 0x6D, "conv.u4", O::None, E::Unmodeled);
    set(s, 0x6E, "conv.u8", O::None, E::Unmodeled);
    set(s, 0x6F, "callvirt", O::Token, E::Call);
    set(s, 0x70, "cpobj", O::Token, E::Unmodeled);
    set(s, 0x71, "ldobj", O::Token, E::Unmodeled);
    set(s, 0x72, "ldstr", O::Token, E::Unmodeled);
    set(s, 0x73, "newobj", O::Token, E::Call);
    set(s, 0x74, "castclass", O::Token, E::Unmodeled);
    set(s, 0x75, "isinst", O::Token, E::Unmodeled);
    set(s, 0x76, "conv.r.un", O::None, E::Unmodeled);
    set(s, 0x79, "unbox", O::Token, E::Unmodeled);
    set(s, 0x7A, "throw", O::None, E::Unmodeled);
    set(s, 0x7B, "ldfld", O::Token, E::FieldAccess);
    set(s, 0x7C, "ldflda", O::Token, E::FieldAccess);
    set(s, 0x7D, "stfld", O::Token, E::FieldAccess);
    set(s, 0x7E, "ldsfld", O::Token, E::FieldAccess);
    set(s, 0x7F, "ldsflda", O::Token, E::FieldAccess);
    set(s, 0x80, "stsfld", O::Token, E::FieldAccess);
    set(s, 0x81, "stobj", O::Token, E::Unmodeled);
    set(s, 0x82, "conv.ovf.i1.un", O::None, E::Unmodeled);
    set(s, 0x83, "conv.ovf.i2.un", O::None, E::Unmodeled);
    set(s, 0x84, "conv.ovf.i4.un", O::None, E::Unmodeled);
    set(s, 0x85, "conv.ovf.i8.un", O::None, E::Unmodeled);
    set(s, 0x86, "conv.ovf.u1.un", O::None, E::Unmodeled);
    set(s, 0x87, "conv.ovf.u2.un", O::None, E::Unmodeled);
    set(s, 0x88, "conv.ovf.u4.un", O::None, E::Unmodeled);
    set(s, 0x89, "conv.ovf.u8.un", O::None, E::Unmodeled);
    set(s, 0x8A, "conv.ovf.i.un", O::None, E::Unmodeled);
    set(s, 0x8B, "conv.ovf.u.un", O::None, E::Unmodeled);
    set(s, 0x8C, "box", O::Token, E::Unmodeled);
    set(s, 0x8D, "newarr", O::Token, E::Unmodeled);
    set(s, 0x8E, "ldlen", O::None, E::Unmodeled);
    set(s, 0x8F, "ldelema", O::Token, E::Unmodeled);
    set(s, 0x90, "ldelem.i1", O::None, E::Unmodeled);
    set(s, 0x91, "ldelem.u1", O::None, E::Unmodeled);
    set(s, 0x92, "ldelem.i2", O::None, E::Unmodeled);
    set(s, 0x93, "ldelem.u2", O::None, E::Unmodeled);
    set(s, 0x94, "ldelem.i4", O::None, E::Unmodeled);
    set(s, 0x95, "ldelem.u4", O::None, E::Unmodeled);
    set(s, 0x96, "ldelem.i8", O::None, E::Unmodeled);
    set(s, 0x97, "ldelem.i", O::None, E::Unmodeled);
    set(s, 0x98, "ldelem.r4", O::None, E::Unmodeled);
    set(s, 0x99, "ldelem.r8", O::None, E::Unmodeled);
    set(s, 0x9A, "ldelem.ref", O::None, E::Unmodeled);
    set(s, 0x9B, "stelem.i", O::None, E::Unmodeled);
    set(s, 0x9C, "stelem.i1", O::None, E::Unmodeled);
    set(s, 0x9D, "stelem.i2", O::None, E::Unmodeled);
    set(s, 0x9E, "stelem.i4", O::None, E::Unmodeled);
    set(s, 0x9F, "stelem.i8", O::None, E::Unmodeled);
    set(s, 0xA0, "stelem.r4", O::None, E::Unmodeled);
    set(s, 0xA1, "stelem.r8", O::None, E::Unmodeled);
    set(s, 0xA2, "stelem.ref", O::None, E::Unmodeled);
    set(s, 0xA3, "ldelem", O::Token, E::Unmodeled);
    set(s, 0xA4, "stelem", O::Token, E::Unmodeled);
    set(s, 0xA5, "unbox.any", O::Token, E::Unmodeled);
    set(s, 0xB3, "conv.ovf.i1", O::None, E::Unmodeled);
    set(s, 0xB4, "conv.ovf.u1", O::None, E::Unmodeled);
    set(s, 0xB5, "conv.ovf.i2", O::None, E::Unmodeled);
    set(s, 0xB6, "conv.ovf.u2", O::None, E::Unmodeled);
    set(s, 0xB7, "conv.ovf.i4", O::None, E::Unmodeled);
    set(s, 0xB8, "conv.ovf.u4", O::None, E::Unmodeled);
    set(s, 0xB9, "conv.ovf.i8", O::None, E::Unmodeled);
    set(s, 0xBA, "conv.ovf.u8", O::None, E::Unmodeled);
    set(s, 0xC2, "refanyval", O::Token, E::Unmodeled);
    set(s, 0xC3, "ckfinite", O::None, E::Unmodeled);
    set(s, 0xC6, "mkrefany", O::Token, E::Unmodeled);
    set(s, 0xD0, "ldtoken", O::Token, E::LoadToken);
    set(s, 0xD1, "conv.u2", O::None, E::Unmodeled);
    set(s, 0xD2, "conv.u1", O::None, E::Unmodeled);
    set(s, 0xD3, "conv.i", O::None, E::Unmodeled);
    set(s, 0xD4, "conv.ovf.i", O::None, E::Unmodeled);
    set(s, 0xD5, "conv.ovf.u", O::None, E::Unmodeled);
    set(s, 0xD6, "add.ovf", O::None, E::Unmodeled);
    set(s, 0xD7, "add.ovf.un", O::None, E::Unmodeled);
    set(s, 0xD8, "mul.ovf", O::None, E::Unmodeled);
    set(s, 0xD9, "mul.ovf.un", O::None, E::Unmodeled);
    set(s, 0xDA, "sub.ovf", O::None, E::Unmodeled);
    set(s, 0xDB, "sub.ovf.un", O::None, E::Unmodeled);
    set(s, 0xDC, "endfinally", O::None, E::Unmodeled);
    set(s, 0xDD, "leave", O::Int32, E::Unmodeled);
    set(s, 0xDE, "leave.s", O::Int8, E::Unmodeled);
    set(s, 0xDF, "stind.i", O::None, E::Unmodeled);
    set(s, 0xE0, "conv.u", O::None, E::Unmodeled);

    let x = &mut extended;
    set(x, 0x00, "arglist", O::None, E::Unmodeled);
    set(x, 0x01, "ceq", O::None, E::Unmodeled);
    set(x, 0x02, "cgt", O::None, E::Unmodeled);
    set(x, 0x03, "cgt.un", O::None, E::Unmodeled);
    set(x, 0x04, "clt", O::None, E::Unmodeled);
    set(x, 0x05, "clt.un", O::None, E::Unmodeled);
    set(x, 0x06, "ldftn", O::Token, E::Unmodeled);
    set(x, 0x07, "ldvirtftn", O::Token, E::Unmodeled);
    set(x, 0x09, "ldarg", O::UInt16, E::LoadArgOperand);
    set(x, 0x0A, "ldarga", O::UInt16, E::Unmodeled);
    set(x, 0x0B, "starg", O::UInt16, E::Unmodeled);
    set(x, 0x0C, "ldloc", O::UInt16, E::Unmodeled);
    set(x, 0x0D, "ldloca", O::UInt16, E::Unmodeled);
    set(x, 0x0E, "stloc", O::UInt16, E::Unmodeled);
    set(x, 0x0F, "localloc", O::None, E::Unmodeled);
    set(x, 0x11, "endfilter", O::None, E::Unmodeled);
    set(x, 0x12, "unaligned.", O::UInt8, E::Unmodeled);
    set(x, 0x13, "volatile.", O::None, E::Unmodeled);
    set(x, 0x14, "tail.", O::None, E::Unmodeled);
    set(x, 0x15, "initobj", O::Token, E::Unmodeled);
    set(x, 0x16, "constrained.", O::Token, E::Unmodeled);
    set(x, 0x17, "cpblk", O::None, E::Unmodeled);
    set(x, 0x18, "initblk", O::None, E::Unmodeled);
    set(x, 0x19, "no.", O::UInt8, E::Unmodeled);
    set(x, 0x1A, "rethrow", O::None, E::Unmodeled);
    set(x, 0x1C, "sizeof", O::Token, E::Unmodeled);
    set(x, 0x1D, "refanytype", O::None, E::Unmodeled);
    set(x, 0x1E, "readonly.", O::None, E::Unmodeled);

    OpcodeTable { single, extended }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn both_tables_have_exactly_256_slots() {
        let tables = tables();
        assert_eq!(tables.single.len(), 256);
        assert_eq!(tables.extended.len(), 256);
    }

    #[test]
    fn opcodes_live_in_exactly_one_set() {
        let tables = tables();
        let single: HashSet<_> = tables
            .single
            .iter()
            .filter(|entry| !entry.is_reserved())
            .map(|entry| entry.mnemonic)
            .collect();
        let extended: HashSet<_> = tables
            .extended
            .iter()
            .filter(|entry| !entry.is_reserved())
            .map(|entry| entry.mnemonic)
            .collect();

        assert!(single.intersection(&extended).next().is_none());
        // No mnemonic occupies two slots within one table either.
        assert_eq!(
            single.len(),
            tables.single.iter().filter(|e| !e.is_reserved()).count()
        );
        assert_eq!(
            extended.len(),
            tables.extended.iter().filter(|e| !e.is_reserved()).count()
        );
    }

    #[test]
    fn well_known_slots() {
        let tables = tables();
        assert_eq!(tables.single[0x2A].mnemonic, "ret");
        assert_eq!(tables.single[0x2A].effect, Effect::Return);
        assert_eq!(tables.single[0x28].mnemonic, "call");
        assert_eq!(tables.single[0x7B].effect, Effect::FieldAccess);
        assert_eq!(tables.single[0xD0].effect, Effect::LoadToken);
        assert_eq!(tables.single[0x02].effect, Effect::LoadArgConst(0));
        assert_eq!(tables.extended[0x01].mnemonic, "ceq");
        assert_eq!(tables.extended[0x09].mnemonic, "ldarg");
        assert_eq!(tables.extended[0x09].operand, OperandKind::UInt16);
    }

    #[test]
    fn reserved_slots_stay_vacant() {
        let tables = tables();
        assert!(tables.single[0x24].is_reserved());
        assert!(tables.single[0xFF].is_reserved());
        assert!(tables.extended[0x08].is_reserved());
        assert!(tables.extended[0xFF].is_reserved());
    }

    #[test]
    fn operand_widths() {
        assert_eq!(OperandKind::None.fixed_width(), Some(0));
        assert_eq!(OperandKind::Token.fixed_width(), Some(4));
        assert_eq!(OperandKind::Int64.fixed_width(), Some(8));
        assert_eq!(OperandKind::Switch.fixed_width(), None);
    }
}
