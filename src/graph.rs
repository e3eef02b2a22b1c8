//! Type graph discovery and the descriptor model.
//!
//! Starting from root types, [`GraphBuilder`] walks the transitive closure of
//! everything a declaration set must contain for the roots to type-check:
//! base types, implemented interfaces, and every member signature's named
//! references. Descriptors live in an arena keyed by opaque [`TypeId`] with
//! token-based identity; name resolution is a derived, validated projection,
//! and two distinct types sanitizing to one emitted identifier reject the
//! run rather than merging.
//!
//! Generic instantiations are reduced to their unbound definitions before
//! the visit; arrays, pointers and by-reference shapes unwrap to their
//! element type; primitives, unbound generic parameters and the universal
//! marker bases are skipped without error.

use std::collections::{HashMap, HashSet};

use crate::{
    bytecode,
    metadata::{
        flags::{FieldAttributes, MethodAttributes, TypeAttributes},
        resolver::{ResolvedEntity, Resolver},
        signature::{MethodSig, SignatureDecoder, SignatureNode},
        tables::{FieldRow, MethodDefRow, ParamRow, TypeDefRow, TypeRefRow},
        token::Token,
    },
    sanitize::{sanitize, strip_arity},
    tsmap, Error, Result,
};

/// Opaque identity of an admitted type within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

/// The declaration shape of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Reference type; renders as a `class` block
    Class,
    /// Renders as an `interface` block
    Interface,
    /// Renders as an `enum` block
    Enum,
    /// Value type; renders as a `class` block
    ValueType,
}

/// Emitted member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// `public`
    Public,
    /// `protected`
    Protected,
    /// `private`
    Private,
}

impl Visibility {
    fn from_access(access: u16) -> Self {
        match access {
            0x0006 => Visibility::Public,
            0x0004 | 0x0005 => Visibility::Protected,
            _ => Visibility::Private,
        }
    }
}

/// An explicit interface implementation: the member is invisible under its
/// plain name and reachable only through the originating interface.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitImpl {
    /// Sanitized, arity-stripped interface name
    pub interface: String,
    /// The member's bare name within that interface
    pub member: String,
}

/// A field member.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Metadata name
    pub name: String,
    /// Declared shape
    pub signature: SignatureNode,
    /// Emitted visibility
    pub visibility: Visibility,
    /// Per-type rather than per-instance
    pub is_static: bool,
    /// Compile-time constant (enum members)
    pub is_literal: bool,
    /// Constant value when the Constant table carries one
    pub constant: Option<i64>,
}

/// A property member: a getter/setter pair, independently optional.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    /// Metadata name (interface-qualified for explicit implementations)
    pub name: String,
    /// The property's value shape
    pub value: SignatureNode,
    /// Emitted visibility
    pub visibility: Visibility,
    /// Per-type rather than per-instance
    pub is_static: bool,
    /// A getter accessor exists
    pub has_getter: bool,
    /// A setter accessor exists
    pub has_setter: bool,
    /// Present when the property implements an interface member explicitly
    pub explicit_impl: Option<ExplicitImpl>,
}

/// A method or constructor member.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    /// Metadata name (interface-qualified for explicit implementations)
    pub name: String,
    /// Decoded signature
    pub signature: MethodSig,
    /// Parameter names in sequence order, receiver excluded
    pub param_names: Vec<String>,
    /// Emitted visibility
    pub visibility: Visibility,
    /// Per-type rather than per-instance
    pub is_static: bool,
    /// Participates in virtual dispatch
    pub is_virtual: bool,
    /// Declared without an implementation
    pub is_abstract: bool,
    /// `.ctor` / `.cctor`
    pub is_ctor: bool,
    /// Present when the method implements an interface member explicitly
    pub explicit_impl: Option<ExplicitImpl>,
    /// Reconstructed pseudo-statements; empty for bodies outside the model
    pub statements: Vec<String>,
}

/// One admitted type. Immutable once created; owned by its [`TypeGraph`].
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Arena identity
    pub id: TypeId,
    /// Metadata token identity (unique per declared type)
    pub token: Token,
    /// Declaration shape
    pub kind: TypeKind,
    /// Raw namespace
    pub namespace: String,
    /// Raw metadata name (arity suffix intact)
    pub name: String,
    /// Sanitized, arity-stripped identifier used in emitted text
    pub emitted_name: String,
    /// Base type shape, absent for marker bases and external stubs
    pub base: Option<SignatureNode>,
    /// Implemented interfaces in metadata order
    pub interfaces: Vec<SignatureNode>,
    /// Field members
    pub fields: Vec<FieldDescriptor>,
    /// Property members
    pub properties: Vec<PropertyDescriptor>,
    /// Method and constructor members
    pub methods: Vec<MethodDescriptor>,
    /// Tokens of directly nested types
    pub nested: Vec<Token>,
    /// Enclosing type token for nested types
    pub enclosing: Option<Token>,
    /// Generic parameter names in position order
    pub generic_params: Vec<String>,
    /// Declared outside this module (TypeRef stub, no members)
    pub is_external: bool,
    /// Type-level visibility
    pub is_public: bool,
}

impl TypeDescriptor {
    /// True when at least one member is an explicit interface
    /// implementation.
    #[must_use]
    pub fn has_explicit_members(&self) -> bool {
        self.methods.iter().any(|method| method.explicit_impl.is_some())
            || self
                .properties
                .iter()
                .any(|property| property.explicit_impl.is_some())
    }
}

/// The admitted set, in dependencies-before-self admission order.
#[derive(Debug, Default)]
pub struct TypeGraph {
    types: Vec<TypeDescriptor>,
    by_token: HashMap<Token, TypeId>,
    by_emitted: HashMap<(String, String), Token>,
}

impl TypeGraph {
    /// All admitted descriptors in admission order.
    #[must_use]
    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    /// Number of admitted types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when nothing was admitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The descriptor behind an identity.
    #[must_use]
    pub fn get(&self, id: TypeId) -> &TypeDescriptor {
        &self.types[id.0 as usize]
    }

    /// Looks up an admitted type by token.
    #[must_use]
    pub fn lookup(&self, token: Token) -> Option<&TypeDescriptor> {
        self.by_token.get(&token).map(|&id| self.get(id))
    }

    /// True when the token is already admitted.
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        self.by_token.contains_key(&token)
    }

    /// Admits a descriptor, enforcing the collision invariant.
    ///
    /// # Errors
    /// Returns [`Error::NameCollision`] when a different identity already
    /// holds the sanitized name.
    pub fn admit(&mut self, mut descriptor: TypeDescriptor) -> Result<TypeId> {
        let key = (
            sanitize(&descriptor.namespace),
            descriptor.emitted_name.clone(),
        );
        if let Some(&existing) = self.by_emitted.get(&key) {
            if existing != descriptor.token {
                return Err(Error::NameCollision {
                    name: descriptor.emitted_name,
                    existing,
                    incoming: descriptor.token,
                });
            }
        }

        let id = TypeId(u32::try_from(self.types.len()).unwrap_or(u32::MAX));
        descriptor.id = id;
        self.by_token.insert(descriptor.token, id);
        self.by_emitted.insert(key, descriptor.token);
        self.types.push(descriptor);
        Ok(id)
    }
}

/// Depth-first discovery of the type closure.
pub struct GraphBuilder<'r, 'a> {
    resolver: &'r Resolver<'a>,
    graph: TypeGraph,
    in_progress: HashSet<Token>,
}

impl<'r, 'a> GraphBuilder<'r, 'a> {
    /// Creates a builder over a resolver.
    #[must_use]
    pub fn new(resolver: &'r Resolver<'a>) -> Self {
        GraphBuilder {
            resolver,
            graph: TypeGraph::default(),
            in_progress: HashSet::new(),
        }
    }

    /// Discovers the closure of the given roots and returns the graph.
    ///
    /// # Errors
    /// Returns [`Error::NameCollision`] on the collision invariant and any
    /// fatal physical-parse error reached through an unskippable path.
    pub fn build(mut self, roots: &[Token]) -> Result<TypeGraph> {
        for &root in roots {
            self.visit_token(root)?;
        }
        Ok(self.graph)
    }

    fn visit_token(&mut self, token: Token) -> Result<()> {
        if token.is_null() || self.graph.contains(token) || self.in_progress.contains(&token) {
            return Ok(());
        }

        match self.resolver.resolve_token(token) {
            Ok(ResolvedEntity::TypeDef(row)) => self.visit_typedef(&row),
            Ok(ResolvedEntity::TypeRef(row)) => self.visit_typeref(&row),
            Ok(ResolvedEntity::TypeSpec(row)) => {
                let node = self
                    .resolver
                    .blob(row.signature)
                    .ok()
                    .and_then(|blob| SignatureDecoder::new(blob).decode_type_spec().ok());
                match node {
                    Some(node) => self.visit_node(&node),
                    None => {
                        log::warn!("TypeSpec {token} signature undecodable; skipped");
                        Ok(())
                    }
                }
            }
            Ok(_) => Ok(()),
            Err(Error::UnknownTokenKind(_) | Error::RowNotFound(_)) => {
                log::warn!("type token {token} unresolvable; skipped");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn visit_node(&mut self, node: &SignatureNode) -> Result<()> {
        match node {
            SignatureNode::Primitive(_)
            | SignatureNode::GenericParam { .. }
            | SignatureNode::Unmodeled => Ok(()),
            SignatureNode::Named(token) => self.visit_token(*token),
            SignatureNode::SzArray(elem)
            | SignatureNode::Ptr(elem)
            | SignatureNode::ByRef(elem) => self.visit_node(elem),
            SignatureNode::Array { elem, .. } => self.visit_node(elem),
            SignatureNode::GenericInst { base, args } => {
                // The instantiation reduces to its unbound definition; each
                // argument is a dependency of its own.
                self.visit_node(base)?;
                for arg in args {
                    self.visit_node(arg)?;
                }
                Ok(())
            }
        }
    }

    fn visit_typeref(&mut self, row: &TypeRefRow) -> Result<()> {
        let namespace = self.resolver.string(row.namespace).unwrap_or("").to_string();
        let name = self.resolver.string(row.name).unwrap_or("").to_string();

        if tsmap::primitive_for_named(&namespace, &name).is_some()
            || is_marker_base(&namespace, &name)
        {
            return Ok(());
        }

        let descriptor = TypeDescriptor {
            id: TypeId(0),
            token: row.token(),
            kind: TypeKind::Class,
            emitted_name: sanitize(strip_arity(&name)),
            namespace,
            name,
            base: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
            enclosing: None,
            generic_params: Vec::new(),
            is_external: true,
            is_public: true,
        };
        self.graph.admit(descriptor)?;
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn visit_typedef(&mut self, row: &TypeDefRow) -> Result<()> {
        let token = row.token();
        let namespace = self.resolver.string(row.namespace).unwrap_or("").to_string();
        let name = self.resolver.string(row.name).unwrap_or("").to_string();

        // `<Module>` holds global members, not a declarable type.
        if name == "<Module>" && namespace.is_empty() {
            return Ok(());
        }
        if tsmap::primitive_for_named(&namespace, &name).is_some()
            || is_marker_base(&namespace, &name)
        {
            return Ok(());
        }

        self.in_progress.insert(token);
        let result = self.visit_typedef_inner(row, token, namespace, name);
        self.in_progress.remove(&token);
        result
    }

    fn visit_typedef_inner(
        &mut self,
        row: &TypeDefRow,
        token: Token,
        namespace: String,
        name: String,
    ) -> Result<()> {
        let flags = TypeAttributes::from_bits_retain(row.flags);

        let extends_name = self.type_full_name(row.extends);
        let kind = if flags.contains(TypeAttributes::INTERFACE) {
            TypeKind::Interface
        } else {
            match extends_name.as_deref() {
                Some("System.Enum") => TypeKind::Enum,
                Some("System.ValueType") => TypeKind::ValueType,
                _ => TypeKind::Class,
            }
        };

        let base = match kind {
            TypeKind::Enum | TypeKind::ValueType => None,
            _ => self.base_node(row.extends, extends_name.as_deref()),
        };

        let interfaces: Vec<SignatureNode> = self
            .resolver
            .interfaces_of(row.rid)
            .iter()
            .map(|imp| self.interface_node(imp.interface))
            .collect();

        let fields = self.collect_fields(row)?;
        let (properties, accessor_rids) = self.collect_properties(row)?;
        let methods = self.collect_methods(row, &accessor_rids)?;

        let generic_params: Vec<String> = self
            .resolver
            .generic_params_of(token)
            .iter()
            .map(|param| {
                self.resolver
                    .string(param.name)
                    .map(sanitize)
                    .unwrap_or_else(|_| format!("T{}", param.number))
            })
            .collect();

        // Dependencies before self: base, interfaces, then every member
        // signature.
        if let Some(node) = &base {
            self.visit_node(node)?;
        }
        for node in &interfaces {
            self.visit_node(node)?;
        }
        for field in &fields {
            self.visit_node(&field.signature)?;
        }
        for property in &properties {
            self.visit_node(&property.value)?;
        }
        for method in &methods {
            self.visit_node(&method.signature.return_type)?;
            for param in &method.signature.params {
                self.visit_node(param)?;
            }
        }

        let nested_rids = self.resolver.nested_of(row.rid);
        let mut nested = Vec::with_capacity(nested_rids.len());
        for nested_rid in nested_rids {
            let nested_token = Token::from_parts(0x02, nested_rid);
            nested.push(nested_token);
            self.visit_token(nested_token)?;
        }

        let visibility = row.flags & 0x0007;
        let descriptor = TypeDescriptor {
            id: TypeId(0),
            token,
            kind,
            emitted_name: sanitize(strip_arity(&name)),
            namespace,
            name,
            base,
            interfaces,
            fields,
            properties,
            methods,
            nested,
            enclosing: self
                .resolver
                .enclosing_of(row.rid)
                .map(|rid| Token::from_parts(0x02, rid)),
            generic_params,
            is_external: false,
            is_public: visibility == 0x0001 || visibility == 0x0002,
        };
        self.graph.admit(descriptor)?;
        Ok(())
    }

    fn collect_fields(&mut self, row: &TypeDefRow) -> Result<Vec<FieldDescriptor>> {
        let mut fields = Vec::new();
        for rid in self.resolver.fields_of(row)? {
            let Ok(field) = FieldRow::read(self.resolver.tables(), rid) else {
                continue;
            };
            let flags = FieldAttributes::from_bits_retain(field.flags);
            let name = self.resolver.string(field.name).unwrap_or("").to_string();

            let signature = self
                .resolver
                .blob(field.signature)
                .ok()
                .and_then(|blob| SignatureDecoder::new(blob).decode_field().ok())
                .unwrap_or(SignatureNode::Unmodeled);

            let constant = self
                .resolver
                .constant_of(Token::from_parts(0x04, rid))
                .and_then(|constant| {
                    let bytes = self.resolver.blob(constant.value).ok()?;
                    decode_constant(constant.value_type, bytes)
                });

            fields.push(FieldDescriptor {
                name,
                signature,
                visibility: Visibility::from_access(flags.access()),
                is_static: flags.contains(FieldAttributes::STATIC),
                is_literal: flags.contains(FieldAttributes::LITERAL),
                constant,
            });
        }
        Ok(fields)
    }

    fn collect_properties(
        &mut self,
        row: &TypeDefRow,
    ) -> Result<(Vec<PropertyDescriptor>, HashSet<u32>)> {
        let mut properties = Vec::new();
        let mut accessor_rids = HashSet::new();

        for property in self.resolver.properties_of(row.rid)? {
            let name = self.resolver.string(property.name).unwrap_or("").to_string();
            let signature = self
                .resolver
                .blob(property.signature)
                .ok()
                .and_then(|blob| SignatureDecoder::new(blob).decode_property().ok());

            let (getter, setter) = self.resolver.accessors_of(property.token());
            let mut visibility = Visibility::Private;
            let mut is_static = false;
            for accessor in [getter, setter].into_iter().flatten() {
                accessor_rids.insert(accessor);
                if let Ok(method) = MethodDefRow::read(self.resolver.tables(), accessor) {
                    let flags = MethodAttributes::from_bits_retain(method.flags);
                    is_static = flags.contains(MethodAttributes::STATIC);
                    if flags.access() == 0x0006 {
                        visibility = Visibility::Public;
                    }
                }
            }

            properties.push(PropertyDescriptor {
                explicit_impl: split_explicit_name(&name),
                name,
                value: signature.map_or(SignatureNode::Unmodeled, |sig| sig.value),
                visibility,
                is_static,
                has_getter: getter.is_some(),
                has_setter: setter.is_some(),
            });
        }

        Ok((properties, accessor_rids))
    }

    fn collect_methods(
        &mut self,
        row: &TypeDefRow,
        accessor_rids: &HashSet<u32>,
    ) -> Result<Vec<MethodDescriptor>> {
        let mut methods = Vec::new();
        for rid in self.resolver.methods_of(row)? {
            if accessor_rids.contains(&rid) {
                // Rendered through the owning property instead.
                continue;
            }
            let Ok(method) = MethodDefRow::read(self.resolver.tables(), rid) else {
                continue;
            };
            let flags = MethodAttributes::from_bits_retain(method.flags);
            let name = self.resolver.string(method.name).unwrap_or("").to_string();

            let signature = self
                .resolver
                .blob(method.signature)
                .ok()
                .and_then(|blob| SignatureDecoder::new(blob).decode_method().ok())
                .unwrap_or(MethodSig {
                    has_this: false,
                    explicit_this: false,
                    generic_arity: 0,
                    return_type: SignatureNode::Unmodeled,
                    params: Vec::new(),
                });

            let mut param_names = Vec::new();
            if let Ok(range) = self.resolver.params_of(&method) {
                let mut rows: Vec<ParamRow> = range
                    .filter_map(|param_rid| {
                        ParamRow::read(self.resolver.tables(), param_rid).ok()
                    })
                    .filter(|param| param.sequence >= 1)
                    .collect();
                rows.sort_by_key(|param| param.sequence);
                for param in rows {
                    param_names.push(
                        self.resolver
                            .string(param.name)
                            .map(sanitize)
                            .unwrap_or_else(|_| format!("arg{}", param.sequence - 1)),
                    );
                }
            }

            let statements = self.reconstruct_body(&method, &signature, &param_names);

            methods.push(MethodDescriptor {
                explicit_impl: split_explicit_name(&name),
                is_ctor: name == ".ctor" || name == ".cctor",
                name,
                signature,
                param_names,
                visibility: Visibility::from_access(flags.access()),
                is_static: flags.contains(MethodAttributes::STATIC),
                is_virtual: flags.contains(MethodAttributes::VIRTUAL),
                is_abstract: flags.contains(MethodAttributes::ABSTRACT),
                statements,
            });
        }
        Ok(methods)
    }

    /// Runs the reconstruction engine over one body; per-method failures are
    /// absorbed here and yield an empty statement list.
    fn reconstruct_body(
        &self,
        method: &MethodDefRow,
        signature: &MethodSig,
        param_names: &[String],
    ) -> Vec<String> {
        let body = match self.resolver.method_body(method) {
            Ok(body) => body,
            Err(error) => {
                log::warn!("method body {} unreadable: {error}", method.rid);
                return Vec::new();
            }
        };
        if body.code.is_empty() {
            return Vec::new();
        }

        let mut arg_names = Vec::new();
        if signature.has_this {
            arg_names.push("this".to_string());
        }
        arg_names.extend(param_names.iter().cloned());

        match bytecode::reconstruct(body.code, self.resolver, &arg_names) {
            Ok(statements) => statements,
            Err(error) => {
                log::warn!("method {} reconstruction failed: {error}", method.rid);
                Vec::new()
            }
        }
    }

    /// `Namespace.Name` of a TypeDef/TypeRef token, for marker detection.
    fn type_full_name(&self, token: Token) -> Option<String> {
        match self.resolver.resolve_token(token).ok()? {
            ResolvedEntity::TypeDef(row) => Some(join_name(
                self.resolver.string(row.namespace).unwrap_or(""),
                self.resolver.string(row.name).unwrap_or(""),
            )),
            ResolvedEntity::TypeRef(row) => Some(join_name(
                self.resolver.string(row.namespace).unwrap_or(""),
                self.resolver.string(row.name).unwrap_or(""),
            )),
            _ => None,
        }
    }

    fn base_node(&self, extends: Token, extends_name: Option<&str>) -> Option<SignatureNode> {
        if extends.is_null() {
            return None;
        }
        if let Some(full) = extends_name {
            if matches!(full, "System.Object" | "System.Enum" | "System.ValueType") {
                return None;
            }
        }
        match self.resolver.resolve_token(extends) {
            Ok(ResolvedEntity::TypeSpec(row)) => self
                .resolver
                .blob(row.signature)
                .ok()
                .and_then(|blob| SignatureDecoder::new(blob).decode_type_spec().ok()),
            Ok(_) => Some(SignatureNode::Named(extends)),
            Err(_) => None,
        }
    }

    fn interface_node(&self, token: Token) -> SignatureNode {
        match self.resolver.resolve_token(token) {
            Ok(ResolvedEntity::TypeSpec(row)) => self
                .resolver
                .blob(row.signature)
                .ok()
                .and_then(|blob| SignatureDecoder::new(blob).decode_type_spec().ok())
                .unwrap_or(SignatureNode::Named(token)),
            _ => SignatureNode::Named(token),
        }
    }
}

/// Splits an interface-qualified member name (`Ns.IFace.Run`) into its
/// explicit-implementation parts. Names without a qualifier, and the
/// `.ctor`/`.cctor` special names, are not explicit.
#[must_use]
pub fn split_explicit_name(name: &str) -> Option<ExplicitImpl> {
    if name.starts_with('.') {
        return None;
    }
    let last_dot = name.rfind('.')?;
    let member = &name[last_dot + 1..];
    if member.is_empty() {
        return None;
    }
    let interface_path = &name[..last_dot];
    let interface = interface_path.rsplit('.').next().unwrap_or(interface_path);
    Some(ExplicitImpl {
        interface: sanitize(strip_arity(interface)),
        member: member.to_string(),
    })
}

fn join_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

fn is_marker_base(namespace: &str, name: &str) -> bool {
    namespace == "System" && matches!(name, "Enum" | "ValueType")
}

/// Decodes a Constant-table literal into a widened integer value.
fn decode_constant(value_type: u8, bytes: &[u8]) -> Option<i64> {
    use crate::metadata::signature::element_type as et;
    match value_type {
        et::BOOLEAN | et::I1 => bytes.first().map(|&b| i64::from(b as i8)),
        et::U1 => bytes.first().map(|&b| i64::from(b)),
        et::CHAR | et::U2 => bytes
            .get(..2)
            .map(|b| i64::from(u16::from_le_bytes([b[0], b[1]]))),
        et::I2 => bytes
            .get(..2)
            .map(|b| i64::from(i16::from_le_bytes([b[0], b[1]]))),
        et::I4 => bytes
            .get(..4)
            .map(|b| i64::from(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))),
        et::U4 => bytes
            .get(..4)
            .map(|b| i64::from(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))),
        et::I8 | et::U8 => bytes.get(..8).map(|b| {
            i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        }),
        _ => None,
    }
}
