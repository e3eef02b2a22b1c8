//! The metadata resolver: tokens and addresses to concrete rows and bytes.
//!
//! [`Resolver`] performs the full physical parse once (CLR header, metadata
//! root, heaps, table directory) and then answers the questions the rest of
//! the pipeline asks: resolve a token to its row, walk a type's member runs,
//! read a method body's instruction bytes, or fetch a field's statically
//! addressed initial data.
//!
//! Token resolution is bounded to the seven modeled kinds; anything else is
//! [`crate::Error::UnknownTokenKind`], which callers absorb with the
//! `"unknown"` sentinel and continue.

use crate::{
    file::Image,
    metadata::{
        root::MetadataRoot,
        streams::{BlobHeap, StringsHeap},
        tables::{
            ConstantRow, FieldRow, FieldRvaRow, GenericParamRow, InterfaceImplRow, MemberRefRow,
            MethodDefRow, MethodSemanticsRow, MethodSpecRow, NestedClassRow, ParamRow,
            PropertyMapRow, PropertyRow, TableDirectory, TableId, TypeDefRow, TypeRefRow,
            TypeSpecRow,
        },
        token::Token,
    },
    Error, Result,
};

/// Sentinel name substituted for unresolvable entities.
pub const UNKNOWN_NAME: &str = "unknown";

/// `MethodSemantics` bit marking a property setter.
pub const SEMANTICS_SETTER: u16 = 0x0001;
/// `MethodSemantics` bit marking a property getter.
pub const SEMANTICS_GETTER: u16 = 0x0002;

/// A token resolved to its table row.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum ResolvedEntity {
    TypeDef(TypeDefRow),
    TypeRef(TypeRefRow),
    TypeSpec(TypeSpecRow),
    Field(FieldRow),
    MethodDef(MethodDefRow),
    MemberRef(MemberRefRow),
    MethodSpec(MethodSpecRow),
}

/// The raw instruction range of one method body.
#[derive(Debug, Clone)]
pub struct MethodBody<'a> {
    /// Instruction bytes; empty for abstract/extern methods
    pub code: &'a [u8],
    /// Bytes consumed by the tiny or fat header
    pub header_size: usize,
}

/// Parsed metadata views over one [`Image`].
pub struct Resolver<'a> {
    image: &'a Image,
    strings: StringsHeap<'a>,
    blob: BlobHeap<'a>,
    tables: TableDirectory<'a>,
}

impl<'a> Resolver<'a> {
    /// Parses the CLR header, metadata root, heaps and table directory.
    ///
    /// # Errors
    /// Returns an error when any layer of the physical metadata is missing
    /// or malformed.
    pub fn new(image: &'a Image) -> Result<Self> {
        let (clr_rva, clr_size) = image.clr();
        if clr_size < 72 {
            return Err(malformed_error!("CLR header too small - {}", clr_size));
        }

        let clr_offset = image.rva_to_offset(clr_rva)?;
        let clr_header = image.data_slice(clr_offset, 72)?;

        let metadata_rva = u32::from_le_bytes([
            clr_header[8],
            clr_header[9],
            clr_header[10],
            clr_header[11],
        ]);
        let metadata_size = u32::from_le_bytes([
            clr_header[12],
            clr_header[13],
            clr_header[14],
            clr_header[15],
        ]);
        if metadata_rva == 0 || metadata_size == 0 {
            return Err(Error::NotSupported);
        }

        let metadata_offset = image.rva_to_offset(metadata_rva)?;
        let metadata = image.data_slice(metadata_offset, metadata_size as usize)?;

        let root = MetadataRoot::parse(metadata)?;

        let tables_header = root
            .stream("#~")
            .or_else(|| root.stream("#-"))
            .ok_or_else(|| malformed_error!("Module has no #~ stream"))?;
        let strings_header = root
            .stream("#Strings")
            .ok_or_else(|| malformed_error!("Module has no #Strings stream"))?;
        let blob_header = root
            .stream("#Blob")
            .ok_or_else(|| malformed_error!("Module has no #Blob stream"))?;

        let stream = |header: &crate::metadata::root::StreamHeader| {
            metadata
                .get(header.offset as usize..(header.offset + header.size) as usize)
                .ok_or(Error::OutOfBounds)
        };

        Ok(Resolver {
            image,
            strings: StringsHeap::new(stream(strings_header)?)?,
            blob: BlobHeap::new(stream(blob_header)?)?,
            tables: TableDirectory::parse(stream(tables_header)?)?,
        })
    }

    /// Builds a resolver from pre-parsed parts. Test fixtures only.
    #[cfg(test)]
    pub(crate) fn from_parts(
        image: &'a Image,
        strings: StringsHeap<'a>,
        blob: BlobHeap<'a>,
        tables: TableDirectory<'a>,
    ) -> Self {
        Resolver {
            image,
            strings,
            blob,
            tables,
        }
    }

    /// The underlying table directory.
    #[must_use]
    pub fn tables(&self) -> &TableDirectory<'a> {
        &self.tables
    }

    /// Reads a `#Strings` entry.
    ///
    /// # Errors
    /// Returns an error for an out-of-range offset or non-UTF-8 entry.
    pub fn string(&self, offset: u32) -> Result<&'a str> {
        self.strings.get(offset)
    }

    /// Reads a `#Blob` entry.
    ///
    /// # Errors
    /// Returns an error for an out-of-range offset or overrunning length.
    pub fn blob(&self, offset: u32) -> Result<&'a [u8]> {
        self.blob.get(offset)
    }

    /// Resolves a token to its table row.
    ///
    /// # Errors
    /// Returns [`Error::UnknownTokenKind`] for table tags outside the
    /// modeled set and [`Error::RowNotFound`] for a missing row.
    pub fn resolve_token(&self, token: Token) -> Result<ResolvedEntity> {
        match TableId::from_tag(token.table()) {
            Some(TableId::TypeDef) => {
                Ok(ResolvedEntity::TypeDef(TypeDefRow::read(&self.tables, token.row())?))
            }
            Some(TableId::TypeRef) => {
                Ok(ResolvedEntity::TypeRef(TypeRefRow::read(&self.tables, token.row())?))
            }
            Some(TableId::TypeSpec) => {
                Ok(ResolvedEntity::TypeSpec(TypeSpecRow::read(&self.tables, token.row())?))
            }
            Some(TableId::Field) => {
                Ok(ResolvedEntity::Field(FieldRow::read(&self.tables, token.row())?))
            }
            Some(TableId::MethodDef) => {
                Ok(ResolvedEntity::MethodDef(MethodDefRow::read(&self.tables, token.row())?))
            }
            Some(TableId::MemberRef) => {
                Ok(ResolvedEntity::MemberRef(MemberRefRow::read(&self.tables, token.row())?))
            }
            Some(TableId::MethodSpec) => {
                Ok(ResolvedEntity::MethodSpec(MethodSpecRow::read(&self.tables, token.row())?))
            }
            _ => Err(Error::UnknownTokenKind(token)),
        }
    }

    /// A short display name for any resolvable entity, with the `"unknown"`
    /// sentinel for everything else.
    ///
    /// This is the absorption point for [`Error::UnknownTokenKind`]: the
    /// condition is logged and the sentinel substituted, per the
    /// recoverable-local policy.
    #[must_use]
    pub fn entity_label(&self, token: Token) -> String {
        match self.resolve_token(token) {
            Ok(ResolvedEntity::TypeDef(row)) => self
                .string(row.name)
                .unwrap_or(UNKNOWN_NAME)
                .to_string(),
            Ok(ResolvedEntity::TypeRef(row)) => self
                .string(row.name)
                .unwrap_or(UNKNOWN_NAME)
                .to_string(),
            Ok(ResolvedEntity::Field(row)) => self
                .string(row.name)
                .unwrap_or(UNKNOWN_NAME)
                .to_string(),
            Ok(ResolvedEntity::MethodDef(row)) => self
                .string(row.name)
                .unwrap_or(UNKNOWN_NAME)
                .to_string(),
            Ok(ResolvedEntity::MemberRef(row)) => self
                .string(row.name)
                .unwrap_or(UNKNOWN_NAME)
                .to_string(),
            Ok(ResolvedEntity::TypeSpec(_) | ResolvedEntity::MethodSpec(_)) => {
                UNKNOWN_NAME.to_string()
            }
            Err(error) => {
                log::warn!("substituting sentinel for {token}: {error}");
                UNKNOWN_NAME.to_string()
            }
        }
    }

    /// The contiguous Field run owned by a type (1-based, end exclusive).
    ///
    /// # Errors
    /// Returns an error if the following TypeDef row cannot be read.
    pub fn fields_of(&self, typedef: &TypeDefRow) -> Result<std::ops::Range<u32>> {
        let end = if typedef.rid < self.tables.row_count(TableId::TypeDef) {
            TypeDefRow::read(&self.tables, typedef.rid + 1)?.field_list
        } else {
            self.tables.row_count(TableId::Field) + 1
        };
        Ok(typedef.field_list..end.max(typedef.field_list))
    }

    /// The contiguous MethodDef run owned by a type.
    ///
    /// # Errors
    /// Returns an error if the following TypeDef row cannot be read.
    pub fn methods_of(&self, typedef: &TypeDefRow) -> Result<std::ops::Range<u32>> {
        let end = if typedef.rid < self.tables.row_count(TableId::TypeDef) {
            TypeDefRow::read(&self.tables, typedef.rid + 1)?.method_list
        } else {
            self.tables.row_count(TableId::MethodDef) + 1
        };
        Ok(typedef.method_list..end.max(typedef.method_list))
    }

    /// The contiguous Param run owned by a method.
    ///
    /// # Errors
    /// Returns an error if the following MethodDef row cannot be read.
    pub fn params_of(&self, method: &MethodDefRow) -> Result<std::ops::Range<u32>> {
        let end = if method.rid < self.tables.row_count(TableId::MethodDef) {
            MethodDefRow::read(&self.tables, method.rid + 1)?.param_list
        } else {
            self.tables.row_count(TableId::Param) + 1
        };
        Ok(method.param_list..end.max(method.param_list))
    }

    /// The name of the parameter at 1-based position `sequence`, or `None`
    /// when the Param table carries no row for it.
    #[must_use]
    pub fn param_name(&self, method: &MethodDefRow, sequence: u16) -> Option<String> {
        let range = self.params_of(method).ok()?;
        for rid in range {
            let Ok(param) = ParamRow::read(&self.tables, rid) else {
                continue;
            };
            if param.sequence == sequence {
                return self.string(param.name).ok().map(str::to_string);
            }
        }
        None
    }

    /// Interfaces implemented by a type, in InterfaceImpl row order.
    #[must_use]
    pub fn interfaces_of(&self, typedef_rid: u32) -> Vec<InterfaceImplRow> {
        let mut rows = Vec::new();
        for rid in 1..=self.tables.row_count(TableId::InterfaceImpl) {
            if let Ok(row) = InterfaceImplRow::read(&self.tables, rid) {
                if row.class == typedef_rid {
                    rows.push(row);
                }
            }
        }
        rows
    }

    /// Properties owned by a type, resolved through its PropertyMap run.
    ///
    /// # Errors
    /// Returns an error if a Property row inside the run cannot be read.
    pub fn properties_of(&self, typedef_rid: u32) -> Result<Vec<PropertyRow>> {
        let map_count = self.tables.row_count(TableId::PropertyMap);
        for map_rid in 1..=map_count {
            let map = PropertyMapRow::read(&self.tables, map_rid)?;
            if map.parent != typedef_rid {
                continue;
            }

            let end = if map_rid < map_count {
                PropertyMapRow::read(&self.tables, map_rid + 1)?.property_list
            } else {
                self.tables.row_count(TableId::Property) + 1
            };

            let mut rows = Vec::new();
            for rid in map.property_list..end.max(map.property_list) {
                rows.push(PropertyRow::read(&self.tables, rid)?);
            }
            return Ok(rows);
        }
        Ok(Vec::new())
    }

    /// Getter and setter MethodDef rows bound to a property token.
    #[must_use]
    pub fn accessors_of(&self, property: Token) -> (Option<u32>, Option<u32>) {
        let mut getter = None;
        let mut setter = None;
        for rid in 1..=self.tables.row_count(TableId::MethodSemantics) {
            let Ok(row) = MethodSemanticsRow::read(&self.tables, rid) else {
                continue;
            };
            if row.association != property {
                continue;
            }
            if row.semantics & SEMANTICS_GETTER != 0 {
                getter = Some(row.method);
            }
            if row.semantics & SEMANTICS_SETTER != 0 {
                setter = Some(row.method);
            }
        }
        (getter, setter)
    }

    /// Generic parameters declared by `owner` (a TypeDef or MethodDef
    /// token), in position order.
    #[must_use]
    pub fn generic_params_of(&self, owner: Token) -> Vec<GenericParamRow> {
        let mut rows = Vec::new();
        for rid in 1..=self.tables.row_count(TableId::GenericParam) {
            if let Ok(row) = GenericParamRow::read(&self.tables, rid) {
                if row.owner == owner {
                    rows.push(row);
                }
            }
        }
        rows.sort_by_key(|row| row.number);
        rows
    }

    /// TypeDef rows nested directly inside `typedef_rid`.
    #[must_use]
    pub fn nested_of(&self, typedef_rid: u32) -> Vec<u32> {
        let mut rids = Vec::new();
        for rid in 1..=self.tables.row_count(TableId::NestedClass) {
            if let Ok(row) = NestedClassRow::read(&self.tables, rid) {
                if row.enclosing == typedef_rid {
                    rids.push(row.nested);
                }
            }
        }
        rids
    }

    /// The enclosing TypeDef row for a nested type, if any.
    #[must_use]
    pub fn enclosing_of(&self, typedef_rid: u32) -> Option<u32> {
        for rid in 1..=self.tables.row_count(TableId::NestedClass) {
            if let Ok(row) = NestedClassRow::read(&self.tables, rid) {
                if row.nested == typedef_rid {
                    return Some(row.enclosing);
                }
            }
        }
        None
    }

    /// The Constant row attached to `parent` (a Field, Param or Property
    /// token), if any.
    #[must_use]
    pub fn constant_of(&self, parent: Token) -> Option<ConstantRow> {
        for rid in 1..=self.tables.row_count(TableId::Constant) {
            if let Ok(row) = ConstantRow::read(&self.tables, rid) {
                if row.parent == parent {
                    return Some(row);
                }
            }
        }
        None
    }

    /// The TypeDef whose method run contains `method_rid`, if any.
    #[must_use]
    pub fn declaring_type_of_method(&self, method_rid: u32) -> Option<TypeDefRow> {
        for rid in 1..=self.tables.row_count(TableId::TypeDef) {
            let Ok(typedef) = TypeDefRow::read(&self.tables, rid) else {
                continue;
            };
            if let Ok(range) = self.methods_of(&typedef) {
                if range.contains(&method_rid) {
                    return Some(typedef);
                }
            }
        }
        None
    }

    /// Reads the raw instruction range of a method body.
    ///
    /// Methods without a body (RVA 0) yield an empty range. Both tiny and
    /// fat headers are handled.
    ///
    /// # Errors
    /// Returns [`Error::SectionMapping`] when the body RVA is unmapped and
    /// a malformed error for an unrecognized header shape; both abort this
    /// method only.
    pub fn method_body(&self, method: &MethodDefRow) -> Result<MethodBody<'a>> {
        if method.rva == 0 {
            return Ok(MethodBody {
                code: &[],
                header_size: 0,
            });
        }

        let offset = self.image.rva_to_offset(method.rva)?;
        let data = self.image.data();
        let first = *data.get(offset).ok_or(Error::OutOfBounds)?;

        match first & 0x03 {
            0x02 => {
                // Tiny header: code size in the upper six bits.
                let code_size = (first >> 2) as usize;
                let code = self
                    .image
                    .data_slice(offset + 1, code_size)?;
                Ok(MethodBody {
                    code,
                    header_size: 1,
                })
            }
            0x03 => {
                // Fat header: 12-byte minimum, actual size in dwords in the
                // upper nibble of the second byte.
                let header = self.image.data_slice(offset, 12)?;
                let flags_and_size = u16::from_le_bytes([header[0], header[1]]);
                let header_size = ((flags_and_size >> 12) & 0x0F) as usize * 4;
                if header_size < 12 {
                    return Err(malformed_error!(
                        "Fat method header declares size {} dwords",
                        header_size / 4
                    ));
                }
                let code_size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
                let code = self
                    .image
                    .data_slice(offset + header_size, code_size as usize)?;
                Ok(MethodBody {
                    code,
                    header_size,
                })
            }
            _ => Err(malformed_error!(
                "Unrecognized method header byte - 0x{:02x}",
                first
            )),
        }
    }

    /// Reads a field's statically addressed initial data, `byte_size` bytes
    /// starting at its FieldRVA target.
    ///
    /// Best-effort: a missing FieldRVA row, unmapped address or overrunning
    /// range is absorbed here (logged, `None`), per the recoverable-local
    /// policy.
    #[must_use]
    pub fn field_initial_value(&self, field_rid: u32, byte_size: usize) -> Option<&'a [u8]> {
        for rid in 1..=self.tables.row_count(TableId::FieldRva) {
            let Ok(row) = FieldRvaRow::read(&self.tables, rid) else {
                continue;
            };
            if row.field != field_rid {
                continue;
            }

            return match self
                .image
                .rva_to_offset(row.rva)
                .and_then(|offset| self.image.data_slice(offset, byte_size))
            {
                Ok(bytes) => Some(bytes),
                Err(error) => {
                    log::warn!("field {field_rid} initial value unresolved: {error}");
                    None
                }
            };
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        file::{Image, Section},
        metadata::tables::TableId,
    };

    /// Builds a resolver over hand-assembled streams. The image's data is
    /// used for method bodies and field data; metadata streams live in
    /// separate leaked buffers so lifetimes line up.
    fn fixture<'a>(
        image: &'a Image,
        strings: &'a [u8],
        blob: &'a [u8],
        stream: &'a [u8],
    ) -> Resolver<'a> {
        Resolver::from_parts(
            image,
            StringsHeap::new(strings).unwrap(),
            BlobHeap::new(blob).unwrap(),
            TableDirectory::parse(stream).unwrap(),
        )
    }

    fn build_stream(tables: &[(TableId, Vec<Vec<u8>>)]) -> Vec<u8> {
        crate::metadata::tables::build_stream(tables)
    }

    fn u16le(value: u16) -> [u8; 2] {
        value.to_le_bytes()
    }

    #[test]
    fn resolve_modeled_kinds_only() {
        let mut field_row = Vec::new();
        field_row.extend_from_slice(&u16le(0x0006));
        field_row.extend_from_slice(&u16le(1)); // name "Count"
        field_row.extend_from_slice(&u16le(1)); // signature

        let stream = build_stream(&[(TableId::Field, vec![field_row])]);
        let image = Image::from_parts(vec![0u8; 16], Vec::new());
        let strings = b"\0Count\0";
        let blob = [0x00, 0x02, 0x06, 0x08];
        let resolver = fixture(&image, strings, &blob, &stream);

        match resolver.resolve_token(Token::new(0x0400_0001)).unwrap() {
            ResolvedEntity::Field(row) => {
                assert_eq!(resolver.string(row.name).unwrap(), "Count");
            }
            other => panic!("expected Field, got {other:?}"),
        }

        // Param tokens (0x08) are not in the modeled set.
        match resolver.resolve_token(Token::new(0x0800_0001)) {
            Err(Error::UnknownTokenKind(token)) => assert_eq!(token.table(), 0x08),
            other => panic!("expected UnknownTokenKind, got {other:?}"),
        }
    }

    #[test]
    fn entity_label_substitutes_sentinel() {
        let stream = build_stream(&[]);
        let image = Image::from_parts(vec![0u8; 16], Vec::new());
        let resolver = fixture(&image, b"\0", &[0x00], &stream);

        assert_eq!(resolver.entity_label(Token::new(0x2600_0001)), "unknown");
        // A modeled kind whose row is missing also degrades to the sentinel.
        assert_eq!(resolver.entity_label(Token::new(0x0200_0009)), "unknown");
    }

    #[test]
    fn member_runs_use_next_row_boundary() {
        let typedef = |name: u16, field_list: u16, method_list: u16| {
            let mut row = Vec::new();
            row.extend_from_slice(&0u32.to_le_bytes());
            row.extend_from_slice(&u16le(name));
            row.extend_from_slice(&u16le(0));
            row.extend_from_slice(&u16le(0)); // extends: null
            row.extend_from_slice(&u16le(field_list));
            row.extend_from_slice(&u16le(method_list));
            row
        };
        let field = |name: u16| {
            let mut row = Vec::new();
            row.extend_from_slice(&u16le(0x0006));
            row.extend_from_slice(&u16le(name));
            row.extend_from_slice(&u16le(1));
            row
        };

        let stream = build_stream(&[
            (
                TableId::TypeDef,
                vec![typedef(1, 1, 1), typedef(3, 3, 1)],
            ),
            (TableId::Field, vec![field(1), field(1), field(1)]),
        ]);
        let image = Image::from_parts(vec![0u8; 16], Vec::new());
        let resolver = fixture(&image, b"\0A\0B\0", &[0x00, 0x02, 0x06, 0x08], &stream);

        let first = TypeDefRow::read(resolver.tables(), 1).unwrap();
        assert_eq!(resolver.fields_of(&first).unwrap(), 1..3);

        let second = TypeDefRow::read(resolver.tables(), 2).unwrap();
        assert_eq!(resolver.fields_of(&second).unwrap(), 3..4);
    }

    #[test]
    fn tiny_method_body() {
        // Body at file offset 4: tiny header (2 << 2) | 2 = 0x0A, code [0x2A, 0x00].
        let mut data = vec![0u8; 4];
        data.push(0x0A);
        data.push(0x2A);
        data.push(0x00);
        let image = Image::from_parts(
            data,
            vec![Section {
                virtual_address: 0x1000,
                virtual_size: 0x100,
                pointer_to_raw_data: 0,
                size_of_raw_data: 0x100,
            }],
        );

        let method = MethodDefRow {
            rid: 1,
            rva: 0x1004,
            impl_flags: 0,
            flags: 0,
            name: 0,
            signature: 0,
            param_list: 1,
        };

        let stream = build_stream(&[]);
        let resolver = fixture(&image, b"\0", &[0x00], &stream);
        let body = resolver.method_body(&method).unwrap();
        assert_eq!(body.header_size, 1);
        assert_eq!(body.code, &[0x2A, 0x00]);
    }

    #[test]
    fn fat_method_body() {
        // Fat header: flags 0x3003 (fat, 3 dwords), maxstack 8, code size 1.
        let mut data = vec![0u8; 4];
        data.extend_from_slice(&0x3003u16.to_le_bytes());
        data.extend_from_slice(&8u16.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.push(0x2A);
        let image = Image::from_parts(
            data,
            vec![Section {
                virtual_address: 0x1000,
                virtual_size: 0x100,
                pointer_to_raw_data: 0,
                size_of_raw_data: 0x100,
            }],
        );

        let method = MethodDefRow {
            rid: 1,
            rva: 0x1004,
            impl_flags: 0,
            flags: 0,
            name: 0,
            signature: 0,
            param_list: 1,
        };

        let stream = build_stream(&[]);
        let resolver = fixture(&image, b"\0", &[0x00], &stream);
        let body = resolver.method_body(&method).unwrap();
        assert_eq!(body.header_size, 12);
        assert_eq!(body.code, &[0x2A]);
    }

    #[test]
    fn bodyless_method_is_empty_range() {
        let method = MethodDefRow {
            rid: 1,
            rva: 0,
            impl_flags: 0,
            flags: 0x0400, // abstract
            name: 0,
            signature: 0,
            param_list: 1,
        };

        let stream = build_stream(&[]);
        let image = Image::from_parts(vec![0u8; 4], Vec::new());
        let resolver = fixture(&image, b"\0", &[0x00], &stream);
        let body = resolver.method_body(&method).unwrap();
        assert!(body.code.is_empty());
    }

    #[test]
    fn unmapped_body_rva_is_section_mapping() {
        let method = MethodDefRow {
            rid: 1,
            rva: 0x9000,
            impl_flags: 0,
            flags: 0,
            name: 0,
            signature: 0,
            param_list: 1,
        };

        let stream = build_stream(&[]);
        let image = Image::from_parts(vec![0u8; 4], Vec::new());
        let resolver = fixture(&image, b"\0", &[0x00], &stream);
        assert!(matches!(
            resolver.method_body(&method),
            Err(Error::SectionMapping(0x9000))
        ));
    }

    #[test]
    fn field_initial_value_best_effort() {
        // FieldRVA row: rva 0x1000 -> file offset 0, field 1.
        let mut row = Vec::new();
        row.extend_from_slice(&0x1000u32.to_le_bytes());
        row.extend_from_slice(&u16le(1));
        let stream = build_stream(&[(TableId::FieldRva, vec![row])]);

        let image = Image::from_parts(
            vec![0x41, 0x42, 0x43, 0x44],
            vec![Section {
                virtual_address: 0x1000,
                virtual_size: 0x10,
                pointer_to_raw_data: 0,
                size_of_raw_data: 0x10,
            }],
        );
        let resolver = fixture(&image, b"\0", &[0x00], &stream);

        assert_eq!(resolver.field_initial_value(1, 4), Some(&b"ABCD"[..]));
        // No FieldRVA row for field 2.
        assert_eq!(resolver.field_initial_value(2, 4), None);
        // Overrunning size is absorbed, not fatal.
        assert_eq!(resolver.field_initial_value(1, 64), None);
    }
}
