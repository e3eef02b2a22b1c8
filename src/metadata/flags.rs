//! Attribute bitmasks carried by type and member rows (ECMA-335 II.23.1).

use bitflags::bitflags;

bitflags! {
    /// `TypeAttributes` on a TypeDef row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TypeAttributes: u32 {
        /// Visible outside the assembly
        const PUBLIC = 0x0000_0001;
        /// Nested with public visibility
        const NESTED_PUBLIC = 0x0000_0002;
        /// The type is an interface
        const INTERFACE = 0x0000_0020;
        /// The type cannot be instantiated
        const ABSTRACT = 0x0000_0080;
        /// The type cannot be derived from
        const SEALED = 0x0000_0100;
        /// Name carries special meaning to the runtime
        const SPECIAL_NAME = 0x0000_0400;
    }
}

bitflags! {
    /// `FieldAttributes` on a Field row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldAttributes: u16 {
        /// Accessible only within the declaring type
        const PRIVATE = 0x0001;
        /// Accessible within the declaring type and subtypes
        const FAMILY = 0x0004;
        /// Accessible everywhere
        const PUBLIC = 0x0006;
        /// Per-type rather than per-instance
        const STATIC = 0x0010;
        /// Assignable only in a constructor
        const INIT_ONLY = 0x0020;
        /// A compile-time constant; value lives in the Constant table
        const LITERAL = 0x0040;
        /// Name carries special meaning to the runtime
        const SPECIAL_NAME = 0x0200;
        /// Initial data addressed through the FieldRVA table
        const HAS_FIELD_RVA = 0x0100;
    }
}

impl FieldAttributes {
    /// The three-bit member-access field.
    #[must_use]
    pub fn access(&self) -> u16 {
        self.bits() & 0x0007
    }
}

bitflags! {
    /// `MethodAttributes` on a MethodDef row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodAttributes: u16 {
        /// Accessible only within the declaring type
        const PRIVATE = 0x0001;
        /// Accessible within the declaring type and subtypes
        const FAMILY = 0x0004;
        /// Accessible everywhere
        const PUBLIC = 0x0006;
        /// Per-type rather than per-instance
        const STATIC = 0x0010;
        /// Participates in virtual dispatch
        const VIRTUAL = 0x0040;
        /// Hidden by signature rather than by name alone
        const HIDE_BY_SIG = 0x0080;
        /// No implementation in this type
        const ABSTRACT = 0x0400;
        /// Name carries special meaning (accessors, operators, ctors)
        const SPECIAL_NAME = 0x0800;
    }
}

impl MethodAttributes {
    /// The three-bit member-access field.
    #[must_use]
    pub fn access(&self) -> u16 {
        self.bits() & 0x0007
    }
}
