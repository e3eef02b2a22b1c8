//! Typed row readers for the tables the transpiler consumes.
//!
//! Each struct mirrors one physical row with heap indexes left unresolved;
//! name and signature lookups happen at the resolver layer. Row ids are
//! 1-based throughout, matching token row encoding.

use crate::{
    metadata::{
        tables::{CodedIndexKind, TableDirectory, TableId},
        token::Token,
    },
    Result,
};

/// One TypeDef row: a type declared by this module.
#[derive(Debug, Clone)]
pub struct TypeDefRow {
    /// Row id within the TypeDef table
    pub rid: u32,
    /// `TypeAttributes` bitmask
    pub flags: u32,
    /// `#Strings` index of the type name
    pub name: u32,
    /// `#Strings` index of the namespace
    pub namespace: u32,
    /// TypeDefOrRef token of the base type (null for none)
    pub extends: Token,
    /// First Field row owned by this type (run ends at the next type's)
    pub field_list: u32,
    /// First MethodDef row owned by this type
    pub method_list: u32,
}

impl TypeDefRow {
    /// Reads row `rid` of the TypeDef table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::TypeDef, rid)?;
        Ok(TypeDefRow {
            rid,
            flags: cursor.fixed_u32()?,
            name: cursor.string_index()?,
            namespace: cursor.string_index()?,
            extends: cursor.coded_index(CodedIndexKind::TypeDefOrRef)?,
            field_list: cursor.table_index(TableId::Field)?,
            method_list: cursor.table_index(TableId::MethodDef)?,
        })
    }

    /// The token form of this row.
    #[must_use]
    pub fn token(&self) -> Token {
        Token::from_parts(TableId::TypeDef as u8, self.rid)
    }
}

/// One TypeRef row: a type defined in another module.
#[derive(Debug, Clone)]
pub struct TypeRefRow {
    /// Row id within the TypeRef table
    pub rid: u32,
    /// ResolutionScope token (module, assembly ref, or enclosing type ref)
    pub resolution_scope: Token,
    /// `#Strings` index of the type name
    pub name: u32,
    /// `#Strings` index of the namespace
    pub namespace: u32,
}

impl TypeRefRow {
    /// Reads row `rid` of the TypeRef table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::TypeRef, rid)?;
        Ok(TypeRefRow {
            rid,
            resolution_scope: cursor.coded_index(CodedIndexKind::ResolutionScope)?,
            name: cursor.string_index()?,
            namespace: cursor.string_index()?,
        })
    }

    /// The token form of this row.
    #[must_use]
    pub fn token(&self) -> Token {
        Token::from_parts(TableId::TypeRef as u8, self.rid)
    }
}

/// One TypeSpec row: a constructed type described by a signature blob.
#[derive(Debug, Clone)]
pub struct TypeSpecRow {
    /// Row id within the TypeSpec table
    pub rid: u32,
    /// `#Blob` index of the type signature
    pub signature: u32,
}

impl TypeSpecRow {
    /// Reads row `rid` of the TypeSpec table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::TypeSpec, rid)?;
        Ok(TypeSpecRow {
            rid,
            signature: cursor.blob_index()?,
        })
    }
}

/// One Field row.
#[derive(Debug, Clone)]
pub struct FieldRow {
    /// Row id within the Field table
    pub rid: u32,
    /// `FieldAttributes` bitmask
    pub flags: u16,
    /// `#Strings` index of the field name
    pub name: u32,
    /// `#Blob` index of the field signature
    pub signature: u32,
}

impl FieldRow {
    /// Reads row `rid` of the Field table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::Field, rid)?;
        Ok(FieldRow {
            rid,
            flags: cursor.fixed_u16()?,
            name: cursor.string_index()?,
            signature: cursor.blob_index()?,
        })
    }
}

/// One MethodDef row.
#[derive(Debug, Clone)]
pub struct MethodDefRow {
    /// Row id within the MethodDef table
    pub rid: u32,
    /// RVA of the method body (0 for abstract/extern)
    pub rva: u32,
    /// `MethodImplAttributes` bitmask
    pub impl_flags: u16,
    /// `MethodAttributes` bitmask
    pub flags: u16,
    /// `#Strings` index of the method name
    pub name: u32,
    /// `#Blob` index of the method signature
    pub signature: u32,
    /// First Param row owned by this method
    pub param_list: u32,
}

impl MethodDefRow {
    /// Reads row `rid` of the MethodDef table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::MethodDef, rid)?;
        Ok(MethodDefRow {
            rid,
            rva: cursor.fixed_u32()?,
            impl_flags: cursor.fixed_u16()?,
            flags: cursor.fixed_u16()?,
            name: cursor.string_index()?,
            signature: cursor.blob_index()?,
            param_list: cursor.table_index(TableId::Param)?,
        })
    }
}

/// One Param row: name and position of a method parameter.
#[derive(Debug, Clone)]
pub struct ParamRow {
    /// Row id within the Param table
    pub rid: u32,
    /// `ParamAttributes` bitmask
    pub flags: u16,
    /// 1-based parameter position; 0 names the return value
    pub sequence: u16,
    /// `#Strings` index of the parameter name
    pub name: u32,
}

impl ParamRow {
    /// Reads row `rid` of the Param table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::Param, rid)?;
        Ok(ParamRow {
            rid,
            flags: cursor.fixed_u16()?,
            sequence: cursor.fixed_u16()?,
            name: cursor.string_index()?,
        })
    }
}

/// One InterfaceImpl row: a type implementing an interface.
#[derive(Debug, Clone)]
pub struct InterfaceImplRow {
    /// Row id within the InterfaceImpl table
    pub rid: u32,
    /// TypeDef row of the implementing class
    pub class: u32,
    /// TypeDefOrRef token of the implemented interface
    pub interface: Token,
}

impl InterfaceImplRow {
    /// Reads row `rid` of the InterfaceImpl table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::InterfaceImpl, rid)?;
        Ok(InterfaceImplRow {
            rid,
            class: cursor.table_index(TableId::TypeDef)?,
            interface: cursor.coded_index(CodedIndexKind::TypeDefOrRef)?,
        })
    }
}

/// One MemberRef row: a member defined elsewhere (or on a constructed type).
#[derive(Debug, Clone)]
pub struct MemberRefRow {
    /// Row id within the MemberRef table
    pub rid: u32,
    /// MemberRefParent token of the declaring entity
    pub class: Token,
    /// `#Strings` index of the member name
    pub name: u32,
    /// `#Blob` index of the member signature
    pub signature: u32,
}

impl MemberRefRow {
    /// Reads row `rid` of the MemberRef table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::MemberRef, rid)?;
        Ok(MemberRefRow {
            rid,
            class: cursor.coded_index(CodedIndexKind::MemberRefParent)?,
            name: cursor.string_index()?,
            signature: cursor.blob_index()?,
        })
    }
}

/// One Constant row: a compile-time literal attached to a field, parameter
/// or property.
#[derive(Debug, Clone)]
pub struct ConstantRow {
    /// Row id within the Constant table
    pub rid: u32,
    /// `ELEMENT_TYPE` of the literal value
    pub value_type: u8,
    /// HasConstant token of the owning entity
    pub parent: Token,
    /// `#Blob` index of the raw literal bytes
    pub value: u32,
}

impl ConstantRow {
    /// Reads row `rid` of the Constant table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::Constant, rid)?;
        let value_type = cursor.fixed_u8()?;
        let _padding = cursor.fixed_u8()?;
        Ok(ConstantRow {
            rid,
            value_type,
            parent: cursor.coded_index(CodedIndexKind::HasConstant)?,
            value: cursor.blob_index()?,
        })
    }
}

/// One PropertyMap row: the property run owned by a type.
#[derive(Debug, Clone)]
pub struct PropertyMapRow {
    /// Row id within the PropertyMap table
    pub rid: u32,
    /// TypeDef row owning the run
    pub parent: u32,
    /// First Property row of the run
    pub property_list: u32,
}

impl PropertyMapRow {
    /// Reads row `rid` of the PropertyMap table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::PropertyMap, rid)?;
        Ok(PropertyMapRow {
            rid,
            parent: cursor.table_index(TableId::TypeDef)?,
            property_list: cursor.table_index(TableId::Property)?,
        })
    }
}

/// One Property row.
#[derive(Debug, Clone)]
pub struct PropertyRow {
    /// Row id within the Property table
    pub rid: u32,
    /// `PropertyAttributes` bitmask
    pub flags: u16,
    /// `#Strings` index of the property name
    pub name: u32,
    /// `#Blob` index of the property signature
    pub signature: u32,
}

impl PropertyRow {
    /// Reads row `rid` of the Property table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::Property, rid)?;
        Ok(PropertyRow {
            rid,
            flags: cursor.fixed_u16()?,
            name: cursor.string_index()?,
            signature: cursor.blob_index()?,
        })
    }

    /// The token form of this row.
    #[must_use]
    pub fn token(&self) -> Token {
        Token::from_parts(TableId::Property as u8, self.rid)
    }
}

/// One MethodSemantics row: binds an accessor method to a property or event.
#[derive(Debug, Clone)]
pub struct MethodSemanticsRow {
    /// Row id within the MethodSemantics table
    pub rid: u32,
    /// Semantics bitmask (0x01 setter, 0x02 getter, 0x08/0x10/0x20 events)
    pub semantics: u16,
    /// MethodDef row of the accessor
    pub method: u32,
    /// HasSemantics token of the owning property or event
    pub association: Token,
}

impl MethodSemanticsRow {
    /// Reads row `rid` of the MethodSemantics table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::MethodSemantics, rid)?;
        Ok(MethodSemanticsRow {
            rid,
            semantics: cursor.fixed_u16()?,
            method: cursor.table_index(TableId::MethodDef)?,
            association: cursor.coded_index(CodedIndexKind::HasSemantics)?,
        })
    }
}

/// One FieldRVA row: a field with statically addressed initial data.
#[derive(Debug, Clone)]
pub struct FieldRvaRow {
    /// Row id within the FieldRVA table
    pub rid: u32,
    /// RVA of the initial data
    pub rva: u32,
    /// Field row the data belongs to
    pub field: u32,
}

impl FieldRvaRow {
    /// Reads row `rid` of the FieldRVA table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::FieldRva, rid)?;
        Ok(FieldRvaRow {
            rid,
            rva: cursor.fixed_u32()?,
            field: cursor.table_index(TableId::Field)?,
        })
    }
}

/// One NestedClass row: places one TypeDef inside another.
#[derive(Debug, Clone)]
pub struct NestedClassRow {
    /// Row id within the NestedClass table
    pub rid: u32,
    /// TypeDef row of the nested type
    pub nested: u32,
    /// TypeDef row of the enclosing type
    pub enclosing: u32,
}

impl NestedClassRow {
    /// Reads row `rid` of the NestedClass table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::NestedClass, rid)?;
        Ok(NestedClassRow {
            rid,
            nested: cursor.table_index(TableId::TypeDef)?,
            enclosing: cursor.table_index(TableId::TypeDef)?,
        })
    }
}

/// One MethodSpec row: a generic method instantiation.
#[derive(Debug, Clone)]
pub struct MethodSpecRow {
    /// Row id within the MethodSpec table
    pub rid: u32,
    /// MethodDefOrRef token of the generic method
    pub method: Token,
    /// `#Blob` index of the instantiation signature
    pub instantiation: u32,
}

impl MethodSpecRow {
    /// Reads row `rid` of the MethodSpec table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::MethodSpec, rid)?;
        Ok(MethodSpecRow {
            rid,
            method: cursor.coded_index(CodedIndexKind::MethodDefOrRef)?,
            instantiation: cursor.blob_index()?,
        })
    }
}

/// One GenericParam row: a declared generic parameter and its name.
#[derive(Debug, Clone)]
pub struct GenericParamRow {
    /// Row id within the GenericParam table
    pub rid: u32,
    /// 0-based parameter position
    pub number: u16,
    /// `GenericParamAttributes` bitmask
    pub flags: u16,
    /// TypeOrMethodDef token of the declaring type or method
    pub owner: Token,
    /// `#Strings` index of the parameter name
    pub name: u32,
}

impl GenericParamRow {
    /// Reads row `rid` of the GenericParam table.
    ///
    /// # Errors
    /// Returns an error for an out-of-range row or truncated stream.
    pub fn read(directory: &TableDirectory<'_>, rid: u32) -> Result<Self> {
        let mut cursor = directory.row(TableId::GenericParam, rid)?;
        Ok(GenericParamRow {
            rid,
            number: cursor.fixed_u16()?,
            flags: cursor.fixed_u16()?,
            owner: cursor.coded_index(CodedIndexKind::TypeOrMethodDef)?,
            name: cursor.string_index()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::directory::tests::build_stream;

    #[test]
    fn typedef_row_reads_in_column_order() {
        let mut row = Vec::new();
        row.extend_from_slice(&0x0010_0001u32.to_le_bytes()); // flags
        row.extend_from_slice(&0x0011u16.to_le_bytes()); // name
        row.extend_from_slice(&0x0022u16.to_le_bytes()); // namespace
        row.extend_from_slice(&(((3u16) << 2) | 1).to_le_bytes()); // extends: TypeRef row 3
        row.extend_from_slice(&1u16.to_le_bytes()); // field_list
        row.extend_from_slice(&1u16.to_le_bytes()); // method_list

        let stream = build_stream(&[(TableId::TypeDef, vec![row])]);
        let directory = TableDirectory::parse(&stream).unwrap();

        let typedef = TypeDefRow::read(&directory, 1).unwrap();
        assert_eq!(typedef.flags, 0x0010_0001);
        assert_eq!(typedef.name, 0x11);
        assert_eq!(typedef.namespace, 0x22);
        assert_eq!(typedef.extends.table(), 0x01);
        assert_eq!(typedef.extends.row(), 3);
        assert_eq!(typedef.token().value(), 0x0200_0001);
    }

    #[test]
    fn constant_row_skips_padding() {
        let mut row = Vec::new();
        row.push(0x08); // ELEMENT_TYPE_I4
        row.push(0x00); // padding
        row.extend_from_slice(&(((2u16) << 2) | 0).to_le_bytes()); // parent: Field row 2
        row.extend_from_slice(&0x0007u16.to_le_bytes()); // value blob

        let stream = build_stream(&[(TableId::Constant, vec![row])]);
        let directory = TableDirectory::parse(&stream).unwrap();

        let constant = ConstantRow::read(&directory, 1).unwrap();
        assert_eq!(constant.value_type, 0x08);
        assert_eq!(constant.parent.table(), 0x04);
        assert_eq!(constant.parent.row(), 2);
        assert_eq!(constant.value, 7);
    }

    #[test]
    fn method_semantics_association() {
        let mut row = Vec::new();
        row.extend_from_slice(&0x0002u16.to_le_bytes()); // getter
        row.extend_from_slice(&4u16.to_le_bytes()); // method rid
        row.extend_from_slice(&(((1u16) << 1) | 1).to_le_bytes()); // Property row 1

        let stream = build_stream(&[(TableId::MethodSemantics, vec![row])]);
        let directory = TableDirectory::parse(&stream).unwrap();

        let semantics = MethodSemanticsRow::read(&directory, 1).unwrap();
        assert_eq!(semantics.semantics, 0x0002);
        assert_eq!(semantics.method, 4);
        assert_eq!(semantics.association.table(), 0x17);
    }
}
