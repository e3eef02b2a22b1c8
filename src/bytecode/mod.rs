//! CIL bytecode reconstruction.
//!
//! Two pieces: the process-wide two-level [`opcodes`] table (single-byte and
//! `0xFE`-prefixed, 256 slots each, lazily built once) and the [`engine`]
//! that walks one method's instruction range folding the modeled operand
//! kinds into pseudo-statements.
//!
//! # Key Types
//! - [`opcodes::OpcodeEntry`] - mnemonic, operand shape, reconstruction effect
//! - [`engine::reconstruct`] - one method body to ordered pseudo-statements

pub mod engine;
pub mod opcodes;

pub use engine::reconstruct;
pub use opcodes::{Effect, OpcodeEntry, OpcodeTable, OperandKind, ESCAPE_BYTE};
