//! Compact type-signature decoding.
//!
//! Signature blobs encode type shapes as a prefix tree of `ELEMENT_TYPE`
//! bytes (ECMA-335 II.23.2). [`SignatureDecoder`] turns them into the
//! [`SignatureNode`] value tree consumed by the graph builder and the
//! synthesizer. The decoder never produces target-language text; rendering
//! belongs exclusively to the emit layer.

use crate::{file::parser::Parser, metadata::token::Token, Error::RecursionLimit, Result};

/// Maximum nesting depth for signature decoding.
const MAX_RECURSION_DEPTH: usize = 50;

/// `ELEMENT_TYPE` byte constants (ECMA-335 II.23.1.16).
#[allow(missing_docs, dead_code)]
pub mod element_type {
    pub const END: u8 = 0x00;
    pub const VOID: u8 = 0x01;
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const PTR: u8 = 0x0F;
    pub const BYREF: u8 = 0x10;
    pub const VALUETYPE: u8 = 0x11;
    pub const CLASS: u8 = 0x12;
    pub const VAR: u8 = 0x13;
    pub const ARRAY: u8 = 0x14;
    pub const GENERICINST: u8 = 0x15;
    pub const TYPEDBYREF: u8 = 0x16;
    pub const I: u8 = 0x18;
    pub const U: u8 = 0x19;
    pub const FNPTR: u8 = 0x1B;
    pub const OBJECT: u8 = 0x1C;
    pub const SZARRAY: u8 = 0x1D;
    pub const MVAR: u8 = 0x1E;
    pub const CMOD_REQD: u8 = 0x1F;
    pub const CMOD_OPT: u8 = 0x20;
    pub const INTERNAL: u8 = 0x21;
    pub const SENTINEL: u8 = 0x41;
    pub const PINNED: u8 = 0x45;
}

/// The primitive types with a direct target-language mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Primitive {
    Void,
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    String,
    Object,
    /// Signed integer sized to the executing platform
    I,
    /// Unsigned integer sized to the executing platform
    U,
}

impl Primitive {
    /// Storage size in bytes, for statically addressed field data.
    ///
    /// Platform-sized integers use the 64-bit width; reference shapes have
    /// no defined storage size.
    #[must_use]
    pub fn byte_size(&self) -> Option<usize> {
        match self {
            Primitive::Boolean | Primitive::I1 | Primitive::U1 => Some(1),
            Primitive::Char | Primitive::I2 | Primitive::U2 => Some(2),
            Primitive::I4 | Primitive::U4 | Primitive::R4 => Some(4),
            Primitive::I8 | Primitive::U8 | Primitive::R8 | Primitive::I | Primitive::U => Some(8),
            Primitive::Void | Primitive::String | Primitive::Object => None,
        }
    }
}

/// Whether a generic parameter is declared by the type or the method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericScope {
    /// `VAR` - declared by the enclosing type
    Type,
    /// `MVAR` - declared by the method
    Method,
}

/// A decoded type shape.
///
/// Pure value tree with no identity; compared structurally only.
#[derive(Debug, Clone, PartialEq)]
pub enum SignatureNode {
    /// A primitive with a direct target mapping
    Primitive(Primitive),
    /// A named TypeDef/TypeRef/TypeSpec reference
    Named(Token),
    /// Single-dimension, zero-based array
    SzArray(Box<SignatureNode>),
    /// Multi-dimensional array of the given rank
    Array {
        /// Element shape
        elem: Box<SignatureNode>,
        /// Number of dimensions
        rank: u32,
    },
    /// Unmanaged pointer
    Ptr(Box<SignatureNode>),
    /// By-reference passing of the inner shape
    ByRef(Box<SignatureNode>),
    /// Generic instantiation of a named generic definition
    GenericInst {
        /// The generic type definition
        base: Box<SignatureNode>,
        /// Ordered type arguments
        args: Vec<SignatureNode>,
    },
    /// A generic parameter by position
    GenericParam {
        /// 0-based position
        index: u32,
        /// Declaring scope
        scope: GenericScope,
    },
    /// A shape outside the modeled subset (function pointers, typed
    /// references). First-class so downstream stages can render a sentinel.
    Unmodeled,
}

/// A decoded method signature.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    /// Instance calling convention (`this` passed implicitly)
    pub has_this: bool,
    /// `explicit` calling convention
    pub explicit_this: bool,
    /// Number of generic parameters the method declares
    pub generic_arity: u32,
    /// Return shape
    pub return_type: SignatureNode,
    /// Parameter shapes in declaration order
    pub params: Vec<SignatureNode>,
}

/// A decoded property signature.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySig {
    /// Instance property (`this` passed to accessors)
    pub has_this: bool,
    /// The property's value shape
    pub value: SignatureNode,
    /// Indexer parameters, empty for plain properties
    pub params: Vec<SignatureNode>,
}

/// Recursive decoder over one signature blob.
///
/// Do not reuse an instance across blobs; each wraps exactly one encoded
/// signature.
pub struct SignatureDecoder<'a> {
    parser: Parser<'a>,
    depth: usize,
}

impl<'a> SignatureDecoder<'a> {
    /// Creates a decoder over a signature blob.
    #[must_use]
    pub fn new(blob: &'a [u8]) -> Self {
        SignatureDecoder {
            parser: Parser::new(blob),
            depth: 0,
        }
    }

    /// Decodes one type shape from the blob.
    fn decode_type(&mut self) -> Result<SignatureNode> {
        self.depth += 1;
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(RecursionLimit(MAX_RECURSION_DEPTH));
        }

        let result = self.decode_type_inner();
        self.depth -= 1;
        result
    }

    fn decode_type_inner(&mut self) -> Result<SignatureNode> {
        use element_type as et;

        let byte = self.parser.read_le::<u8>()?;
        match byte {
            et::VOID => Ok(SignatureNode::Primitive(Primitive::Void)),
            et::BOOLEAN => Ok(SignatureNode::Primitive(Primitive::Boolean)),
            et::CHAR => Ok(SignatureNode::Primitive(Primitive::Char)),
            et::I1 => Ok(SignatureNode::Primitive(Primitive::I1)),
            et::U1 => Ok(SignatureNode::Primitive(Primitive::U1)),
            et::I2 => Ok(SignatureNode::Primitive(Primitive::I2)),
            et::U2 => Ok(SignatureNode::Primitive(Primitive::U2)),
            et::I4 => Ok(SignatureNode::Primitive(Primitive::I4)),
            et::U4 => Ok(SignatureNode::Primitive(Primitive::U4)),
            et::I8 => Ok(SignatureNode::Primitive(Primitive::I8)),
            et::U8 => Ok(SignatureNode::Primitive(Primitive::U8)),
            et::R4 => Ok(SignatureNode::Primitive(Primitive::R4)),
            et::R8 => Ok(SignatureNode::Primitive(Primitive::R8)),
            et::STRING => Ok(SignatureNode::Primitive(Primitive::String)),
            et::OBJECT => Ok(SignatureNode::Primitive(Primitive::Object)),
            et::I => Ok(SignatureNode::Primitive(Primitive::I)),
            et::U => Ok(SignatureNode::Primitive(Primitive::U)),
            et::PTR => {
                self.skip_custom_mods()?;
                Ok(SignatureNode::Ptr(Box::new(self.decode_type()?)))
            }
            et::BYREF => Ok(SignatureNode::ByRef(Box::new(self.decode_type()?))),
            et::PINNED => self.decode_type(),
            et::VALUETYPE | et::CLASS => {
                Ok(SignatureNode::Named(self.parser.read_compressed_token()?))
            }
            et::VAR => Ok(SignatureNode::GenericParam {
                index: self.parser.read_compressed_uint()?,
                scope: GenericScope::Type,
            }),
            et::MVAR => Ok(SignatureNode::GenericParam {
                index: self.parser.read_compressed_uint()?,
                scope: GenericScope::Method,
            }),
            et::SZARRAY => {
                self.skip_custom_mods()?;
                Ok(SignatureNode::SzArray(Box::new(self.decode_type()?)))
            }
            et::ARRAY => {
                let elem = self.decode_type()?;
                let rank = self.parser.read_compressed_uint()?;

                // Size and lower-bound lists are recorded but not modeled.
                let sizes = self.parser.read_compressed_uint()?;
                for _ in 0..sizes {
                    self.parser.read_compressed_uint()?;
                }
                let bounds = self.parser.read_compressed_uint()?;
                for _ in 0..bounds {
                    self.parser.read_compressed_uint()?;
                }

                Ok(SignatureNode::Array {
                    elem: Box::new(elem),
                    rank,
                })
            }
            et::GENERICINST => {
                let shape = self.parser.peek_byte()?;
                if shape != et::CLASS && shape != et::VALUETYPE {
                    return Err(malformed_error!(
                        "GENERICINST base must be CLASS or VALUETYPE - 0x{:02x}",
                        shape
                    ));
                }

                let base = self.decode_type()?;
                let count = self.parser.read_compressed_uint()?;
                let mut args = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    args.push(self.decode_type()?);
                }

                Ok(SignatureNode::GenericInst {
                    base: Box::new(base),
                    args,
                })
            }
            et::CMOD_REQD | et::CMOD_OPT => {
                self.parser.read_compressed_token()?;
                self.decode_type()
            }
            et::FNPTR => {
                // Consume the nested method signature so the cursor stays
                // aligned, then report the shape as outside the model.
                self.decode_method()?;
                Ok(SignatureNode::Unmodeled)
            }
            et::TYPEDBYREF | et::INTERNAL | et::SENTINEL => Ok(SignatureNode::Unmodeled),
            _ => Err(malformed_error!("Unsupported ELEMENT_TYPE - 0x{:02x}", byte)),
        }
    }

    /// Skips any run of custom-modifier pairs at the cursor.
    fn skip_custom_mods(&mut self) -> Result<()> {
        use element_type as et;

        while self.parser.has_more_data() {
            let next = self.parser.peek_byte()?;
            if next != et::CMOD_REQD && next != et::CMOD_OPT {
                break;
            }
            self.parser.advance()?;
            self.parser.read_compressed_token()?;
        }
        Ok(())
    }

    /// Decodes a field signature (II.23.2.4).
    ///
    /// # Errors
    /// Returns an error for a wrong header byte or malformed type shape.
    pub fn decode_field(&mut self) -> Result<SignatureNode> {
        let header = self.parser.read_le::<u8>()?;
        if header != 0x06 {
            return Err(malformed_error!(
                "Field signature has invalid header - 0x{:02x}",
                header
            ));
        }

        self.skip_custom_mods()?;
        self.decode_type()
    }

    /// Decodes a method signature (II.23.2.1/2).
    ///
    /// # Errors
    /// Returns an error for malformed convention bytes or type shapes.
    pub fn decode_method(&mut self) -> Result<MethodSig> {
        let convention = self.parser.read_le::<u8>()?;

        let generic_arity = if convention & 0x10 != 0 {
            self.parser.read_compressed_uint()?
        } else {
            0
        };

        let param_count = self.parser.read_compressed_uint()?;
        let return_type = self.decode_param()?;

        let mut params = Vec::with_capacity(param_count as usize);
        for _ in 0..param_count {
            if self.parser.has_more_data()
                && self.parser.peek_byte()? == element_type::SENTINEL
            {
                // Vararg tail; the fixed parameter list ends here.
                self.parser.advance()?;
                break;
            }
            params.push(self.decode_param()?);
        }

        Ok(MethodSig {
            has_this: convention & 0x20 != 0,
            explicit_this: convention & 0x40 != 0,
            generic_arity,
            return_type,
            params,
        })
    }

    fn decode_param(&mut self) -> Result<SignatureNode> {
        self.skip_custom_mods()?;

        if self.parser.has_more_data() && self.parser.peek_byte()? == element_type::BYREF {
            self.parser.advance()?;
            return Ok(SignatureNode::ByRef(Box::new(self.decode_type()?)));
        }

        self.decode_type()
    }

    /// Decodes a property signature (II.23.2.5).
    ///
    /// # Errors
    /// Returns an error for a wrong header byte or malformed type shapes.
    pub fn decode_property(&mut self) -> Result<PropertySig> {
        let header = self.parser.read_le::<u8>()?;
        if header & 0x08 == 0 {
            return Err(malformed_error!(
                "Property signature has invalid header - 0x{:02x}",
                header
            ));
        }

        let param_count = self.parser.read_compressed_uint()?;
        self.skip_custom_mods()?;
        let value = self.decode_type()?;

        let mut params = Vec::with_capacity(param_count as usize);
        for _ in 0..param_count {
            params.push(self.decode_param()?);
        }

        Ok(PropertySig {
            has_this: header & 0x20 != 0,
            value,
            params,
        })
    }

    /// Decodes a TypeSpec signature (II.23.2.14): a bare type shape.
    ///
    /// # Errors
    /// Returns an error for a malformed type shape.
    pub fn decode_type_spec(&mut self) -> Result<SignatureNode> {
        self.decode_type()
    }

    /// Decodes a MethodSpec instantiation (II.23.2.15): the type-argument
    /// list of a generic method call.
    ///
    /// # Errors
    /// Returns an error for a wrong header byte or malformed type shapes.
    pub fn decode_method_spec(&mut self) -> Result<Vec<SignatureNode>> {
        let header = self.parser.read_le::<u8>()?;
        if header != 0x0A {
            return Err(malformed_error!(
                "MethodSpec signature has invalid header - 0x{:02x}",
                header
            ));
        }

        let count = self.parser.read_compressed_uint()?;
        let mut args = Vec::with_capacity(count as usize);
        for _ in 0..count {
            args.push(self.decode_type()?);
        }
        Ok(args)
    }
}
