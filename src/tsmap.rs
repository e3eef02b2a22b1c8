//! The primitive-type mapping table.
//!
//! One of the two process-wide read-only tables (the other is the opcode
//! table): the fixed mapping from metadata primitives and well-known system
//! types onto TypeScript's primitive type names. Initialized at compile time
//! and never mutated.

use crate::metadata::signature::Primitive;

/// The TypeScript spelling of a metadata primitive.
#[must_use]
pub fn ts_primitive(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::Void => "void",
        Primitive::Boolean => "boolean",
        Primitive::Char | Primitive::String => "string",
        Primitive::I1
        | Primitive::U1
        | Primitive::I2
        | Primitive::U2
        | Primitive::I4
        | Primitive::U4
        | Primitive::I8
        | Primitive::U8
        | Primitive::R4
        | Primitive::R8
        | Primitive::I
        | Primitive::U => "number",
        Primitive::Object => "any",
    }
}

/// The TypeScript primitive a named system type maps to, if any.
///
/// Type references to these never produce declarations of their own; the
/// graph builder skips them and the synthesizer writes the mapping directly.
#[must_use]
pub fn primitive_for_named(namespace: &str, name: &str) -> Option<&'static str> {
    if namespace != "System" {
        return None;
    }
    match name {
        "Void" => Some("void"),
        "Boolean" => Some("boolean"),
        "Char" | "String" => Some("string"),
        "SByte" | "Byte" | "Int16" | "UInt16" | "Int32" | "UInt32" | "Int64" | "UInt64"
        | "Single" | "Double" | "Decimal" | "IntPtr" | "UIntPtr" => Some("number"),
        "Object" => Some("any"),
        _ => None,
    }
}
