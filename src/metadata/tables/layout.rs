//! Row-size computation for every metadata table.
//!
//! Widths follow ECMA-335 II.24.2.6: a heap index is 4 bytes when the
//! matching `HeapSizes` bit is set, a plain table index is 4 bytes when the
//! target table has more than 0xFFFF rows, and a coded index is 4 bytes when
//! the largest member of its family overflows the 16-bit space left after
//! the tag bits.

use crate::metadata::{
    tables::{IndexWidths, TableId},
    token::Token,
};

/// The coded-index families used across table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum CodedIndexKind {
    TypeDefOrRef,
    HasConstant,
    HasCustomAttribute,
    HasFieldMarshal,
    HasDeclSecurity,
    MemberRefParent,
    HasSemantics,
    MethodDefOrRef,
    MemberForwarded,
    Implementation,
    CustomAttributeType,
    ResolutionScope,
    TypeOrMethodDef,
}

impl CodedIndexKind {
    /// Family members in tag order; `None` marks a reserved tag.
    #[must_use]
    pub fn tables(&self) -> &'static [Option<TableId>] {
        use TableId::*;
        match self {
            CodedIndexKind::TypeDefOrRef => &[Some(TypeDef), Some(TypeRef), Some(TypeSpec)],
            CodedIndexKind::HasConstant => &[Some(Field), Some(Param), Some(Property)],
            CodedIndexKind::HasCustomAttribute => &[
                Some(MethodDef),
                Some(Field),
                Some(TypeRef),
                Some(TypeDef),
                Some(Param),
                Some(InterfaceImpl),
                Some(MemberRef),
                Some(Module),
                Some(DeclSecurity),
                Some(Property),
                Some(Event),
                Some(StandAloneSig),
                Some(ModuleRef),
                Some(TypeSpec),
                Some(Assembly),
                Some(AssemblyRef),
                Some(File),
                Some(ExportedType),
                Some(ManifestResource),
                Some(GenericParam),
                Some(GenericParamConstraint),
                Some(MethodSpec),
            ],
            CodedIndexKind::HasFieldMarshal => &[Some(Field), Some(Param)],
            CodedIndexKind::HasDeclSecurity => &[Some(TypeDef), Some(MethodDef), Some(Assembly)],
            CodedIndexKind::MemberRefParent => &[
                Some(TypeDef),
                Some(TypeRef),
                Some(ModuleRef),
                Some(MethodDef),
                Some(TypeSpec),
            ],
            CodedIndexKind::HasSemantics => &[Some(Event), Some(Property)],
            CodedIndexKind::MethodDefOrRef => &[Some(MethodDef), Some(MemberRef)],
            CodedIndexKind::MemberForwarded => &[Some(Field), Some(MethodDef)],
            CodedIndexKind::Implementation => &[Some(File), Some(AssemblyRef), Some(ExportedType)],
            CodedIndexKind::CustomAttributeType => {
                &[None, None, Some(MethodDef), Some(MemberRef), None]
            }
            CodedIndexKind::ResolutionScope => {
                &[Some(Module), Some(ModuleRef), Some(AssemblyRef), Some(TypeRef)]
            }
            CodedIndexKind::TypeOrMethodDef => &[Some(TypeDef), Some(MethodDef)],
        }
    }

    /// Number of tag bits the family occupies.
    #[must_use]
    pub fn tag_bits(&self) -> u32 {
        let members = self.tables().len() as u32;
        // ceil(log2(members)), with single-member families still taking 1 bit
        32 - members.next_power_of_two().leading_zeros() - 1
    }

    /// Decodes a raw coded-index value into a token, or `None` for a
    /// reserved tag.
    #[must_use]
    pub fn decode(&self, value: u32) -> Option<Token> {
        let bits = self.tag_bits();
        let tag = (value & ((1 << bits) - 1)) as usize;
        let row = value >> bits;
        let table = (*self.tables().get(tag)?)?;
        Some(Token::from_parts(table as u8, row))
    }
}

/// Everything needed to size a row: heap index widths plus all row counts.
pub(crate) struct SizeContext {
    pub heap: IndexWidths,
    pub row_counts: [u32; 64],
}

impl SizeContext {
    /// Width in bytes of a plain index into `table`.
    pub(crate) fn table_index_width(&self, table: TableId) -> usize {
        if self.row_counts[table as usize] > 0xFFFF {
            4
        } else {
            2
        }
    }

    /// Width in bytes of a coded index of the given family.
    pub(crate) fn coded_index_width(&self, kind: CodedIndexKind) -> usize {
        let max_rows = kind
            .tables()
            .iter()
            .flatten()
            .map(|&table| self.row_counts[table as usize])
            .max()
            .unwrap_or(0);

        if u64::from(max_rows) >= (1u64 << (16 - kind.tag_bits())) {
            4
        } else {
            2
        }
    }

    /// Size in bytes of one row of `table` within this module.
    pub(crate) fn row_size(&self, table: TableId) -> usize {
        use CodedIndexKind as Coded;
        use TableId::*;

        let s = self.heap.string;
        let g = self.heap.guid;
        let b = self.heap.blob;
        let t = |id| self.table_index_width(id);
        let c = |kind| self.coded_index_width(kind);

        match table {
            Module => 2 + s + 3 * g,
            TypeRef => c(Coded::ResolutionScope) + 2 * s,
            TypeDef => 4 + 2 * s + c(Coded::TypeDefOrRef) + t(Field) + t(MethodDef),
            FieldPtr => t(Field),
            Field => 2 + s + b,
            MethodPtr => t(MethodDef),
            MethodDef => 8 + s + b + t(Param),
            ParamPtr => t(Param),
            Param => 4 + s,
            InterfaceImpl => t(TypeDef) + c(Coded::TypeDefOrRef),
            MemberRef => c(Coded::MemberRefParent) + s + b,
            Constant => 2 + c(Coded::HasConstant) + b,
            CustomAttribute => {
                c(Coded::HasCustomAttribute) + c(Coded::CustomAttributeType) + b
            }
            FieldMarshal => c(Coded::HasFieldMarshal) + b,
            DeclSecurity => 2 + c(Coded::HasDeclSecurity) + b,
            ClassLayout => 6 + t(TypeDef),
            FieldLayout => 4 + t(Field),
            StandAloneSig => b,
            EventMap => t(TypeDef) + t(Event),
            EventPtr => t(Event),
            Event => 2 + s + c(Coded::TypeDefOrRef),
            PropertyMap => t(TypeDef) + t(Property),
            PropertyPtr => t(Property),
            Property => 2 + s + b,
            MethodSemantics => 2 + t(MethodDef) + c(Coded::HasSemantics),
            MethodImpl => t(TypeDef) + 2 * c(Coded::MethodDefOrRef),
            ModuleRef => s,
            TypeSpec => b,
            ImplMap => 2 + c(Coded::MemberForwarded) + s + t(ModuleRef),
            FieldRva => 4 + t(Field),
            EncLog => 8,
            EncMap => 4,
            Assembly => 16 + b + 2 * s,
            AssemblyProcessor => 4,
            AssemblyOs => 12,
            AssemblyRef => 12 + 2 * b + 2 * s,
            AssemblyRefProcessor => 4 + t(AssemblyRef),
            AssemblyRefOs => 12 + t(AssemblyRef),
            File => 4 + s + b,
            ExportedType => 8 + 2 * s + c(Coded::Implementation),
            ManifestResource => 8 + s + c(Coded::Implementation),
            NestedClass => 2 * t(TypeDef),
            GenericParam => 4 + c(Coded::TypeOrMethodDef) + s,
            MethodSpec => c(Coded::MethodDefOrRef) + b,
            GenericParamConstraint => t(GenericParam) + c(Coded::TypeDefOrRef),
        }
    }
}
