//! ECMA-335 metadata tables: identifiers, physical layout, and typed rows.
//!
//! The `#~` stream packs up to 45 tables back to back, each with a row size
//! that depends on the module (heap index widths and cross-table index
//! widths grow from 2 to 4 bytes on large modules). [`TableDirectory`]
//! decodes the stream header, computes every table's row size and base
//! offset, and hands out positioned [`RowCursor`]s; the `rows` module builds
//! the typed row structs the transpiler consumes on top of that.

mod directory;
mod layout;
mod rows;

pub use directory::{RowCursor, TableDirectory};
#[cfg(test)]
pub(crate) use directory::tests::build_stream;
pub use layout::CodedIndexKind;
pub use rows::{
    ConstantRow, FieldRow, FieldRvaRow, GenericParamRow, InterfaceImplRow, MemberRefRow,
    MethodDefRow, MethodSemanticsRow, MethodSpecRow, NestedClassRow, ParamRow, PropertyMapRow, PropertyRow,
    TypeDefRow, TypeRefRow, TypeSpecRow,
};

use strum::{Display, EnumIter, FromRepr};

/// Identifier of one metadata table, numerically equal to its token table
/// tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum TableId {
    Module = 0x00,
    TypeRef = 0x01,
    TypeDef = 0x02,
    FieldPtr = 0x03,
    Field = 0x04,
    MethodPtr = 0x05,
    MethodDef = 0x06,
    ParamPtr = 0x07,
    Param = 0x08,
    InterfaceImpl = 0x09,
    MemberRef = 0x0A,
    Constant = 0x0B,
    CustomAttribute = 0x0C,
    FieldMarshal = 0x0D,
    DeclSecurity = 0x0E,
    ClassLayout = 0x0F,
    FieldLayout = 0x10,
    StandAloneSig = 0x11,
    EventMap = 0x12,
    EventPtr = 0x13,
    Event = 0x14,
    PropertyMap = 0x15,
    PropertyPtr = 0x16,
    Property = 0x17,
    MethodSemantics = 0x18,
    MethodImpl = 0x19,
    ModuleRef = 0x1A,
    TypeSpec = 0x1B,
    ImplMap = 0x1C,
    FieldRva = 0x1D,
    EncLog = 0x1E,
    EncMap = 0x1F,
    Assembly = 0x20,
    AssemblyProcessor = 0x21,
    AssemblyOs = 0x22,
    AssemblyRef = 0x23,
    AssemblyRefProcessor = 0x24,
    AssemblyRefOs = 0x25,
    File = 0x26,
    ExportedType = 0x27,
    ManifestResource = 0x28,
    NestedClass = 0x29,
    GenericParam = 0x2A,
    MethodSpec = 0x2B,
    GenericParamConstraint = 0x2C,
}

impl TableId {
    /// Maps a token table tag to a table id, if it names a known table.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::from_repr(tag)
    }
}

/// Byte widths of the three heap index kinds, derived from the `HeapSizes`
/// bits of the `#~` header.
#[derive(Debug, Clone, Copy)]
pub struct IndexWidths {
    /// Width of `#Strings` indexes (2 or 4)
    pub string: usize,
    /// Width of `#GUID` indexes (2 or 4)
    pub guid: usize,
    /// Width of `#Blob` indexes (2 or 4)
    pub blob: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn tag_round_trip() {
        for id in TableId::iter() {
            assert_eq!(TableId::from_tag(id as u8), Some(id));
        }
        assert_eq!(TableId::from_tag(0x2D), None);
        assert_eq!(TableId::from_tag(0xFF), None);
    }

    #[test]
    fn table_count_is_ecma_complete() {
        assert_eq!(TableId::iter().count(), 45);
    }
}
