//! TypeScript declaration synthesis.
//!
//! Renders each admitted [`TypeDescriptor`] as one declaration block:
//! `class`-shaped for classes and value types, `interface`-shaped for
//! interfaces, `enum`-shaped for enumerations (hex literals when the member
//! values form a bit-flag set). Explicit interface implementations are
//! emitted under mangled private names and reached through a per-interface
//! dispatch proxy, reproducing interface-qualified dispatch in a language
//! whose member namespace is flat.

pub mod output;

use crate::{
    graph::{
        MethodDescriptor, PropertyDescriptor, TypeDescriptor, TypeGraph, TypeKind, Visibility,
    },
    metadata::signature::{GenericScope, SignatureNode},
    sanitize::sanitize,
    tsmap, Error, Result,
};

/// Prefix of the mangled private name an explicit member renders under.
pub const EXPLICIT_PREFIX: &str = "__explicit__";

const INDENT: &str = "    ";

/// Renders admitted types into TypeScript declaration text.
pub struct Synthesizer<'g> {
    graph: &'g TypeGraph,
}

impl<'g> Synthesizer<'g> {
    /// Creates a synthesizer over a finished graph.
    #[must_use]
    pub fn new(graph: &'g TypeGraph) -> Self {
        Synthesizer { graph }
    }

    /// Renders one complete output unit: the type's declaration block plus
    /// the nested grouping block for its nested types.
    ///
    /// # Errors
    /// Returns an error if proxy synthesis fails its contract check.
    pub fn render_unit(&self, descriptor: &TypeDescriptor) -> Result<String> {
        let mut text = self.render_declaration(descriptor, 0)?;
        text.push_str(&self.render_nested_group(descriptor, 0)?);
        Ok(text)
    }

    fn render_nested_group(&self, descriptor: &TypeDescriptor, level: usize) -> Result<String> {
        let children: Vec<&TypeDescriptor> = descriptor
            .nested
            .iter()
            .filter_map(|&token| self.graph.lookup(token))
            .collect();
        if children.is_empty() {
            return Ok(String::new());
        }

        let pad = INDENT.repeat(level);
        let mut text = format!("{pad}export namespace {} {{\n", descriptor.emitted_name);
        for child in children {
            text.push_str(&self.render_declaration(child, level + 1)?);
            text.push_str(&self.render_nested_group(child, level + 1)?);
        }
        text.push_str(&format!("{pad}}}\n"));
        Ok(text)
    }

    fn render_declaration(&self, descriptor: &TypeDescriptor, level: usize) -> Result<String> {
        match descriptor.kind {
            TypeKind::Enum => Ok(self.render_enum(descriptor, level)),
            TypeKind::Interface => Ok(self.render_interface(descriptor, level)),
            TypeKind::Class | TypeKind::ValueType => self.render_class(descriptor, level),
        }
    }

    // ── enum ──────────────────────────────────────────────────────────

    fn render_enum(&self, descriptor: &TypeDescriptor, level: usize) -> String {
        let pad = INDENT.repeat(level);
        let members: Vec<(&str, i64)> = descriptor
            .fields
            .iter()
            .filter(|field| field.is_literal)
            .filter_map(|field| field.constant.map(|value| (field.name.as_str(), value)))
            .collect();

        let hex = is_flag_set(&members);

        let mut text = format!("{pad}export enum {} {{\n", descriptor.emitted_name);
        for (name, value) in members {
            if hex {
                text.push_str(&format!("{pad}{INDENT}{} = 0x{value:x},\n", sanitize(name)));
            } else {
                text.push_str(&format!("{pad}{INDENT}{} = {value},\n", sanitize(name)));
            }
        }
        text.push_str(&format!("{pad}}}\n"));
        text
    }

    // ── interface ─────────────────────────────────────────────────────

    fn render_interface(&self, descriptor: &TypeDescriptor, level: usize) -> String {
        let pad = INDENT.repeat(level);
        let mut heading = format!(
            "{pad}export interface {}{}",
            descriptor.emitted_name,
            generic_suffix(&descriptor.generic_params)
        );
        if !descriptor.interfaces.is_empty() {
            let bases: Vec<String> = descriptor
                .interfaces
                .iter()
                .map(|node| self.type_text(descriptor, node))
                .collect();
            heading.push_str(&format!(" extends {}", bases.join(", ")));
        }

        let mut text = format!("{heading} {{\n");
        for property in &descriptor.properties {
            let marker = if property.has_setter { "" } else { "readonly " };
            text.push_str(&format!(
                "{pad}{INDENT}{marker}{}: {};\n",
                sanitize(&property.name),
                self.type_text(descriptor, &property.value)
            ));
        }
        for method in &descriptor.methods {
            if method.is_ctor {
                continue;
            }
            text.push_str(&format!(
                "{pad}{INDENT}{}{}({}): {};\n",
                sanitize(&method.name),
                method_generic_suffix(method),
                self.parameter_list(descriptor, method),
                self.type_text(descriptor, &method.signature.return_type)
            ));
        }
        text.push_str(&format!("{pad}}}\n"));
        text
    }

    // ── class ─────────────────────────────────────────────────────────

    fn render_class(&self, descriptor: &TypeDescriptor, level: usize) -> Result<String> {
        let pad = INDENT.repeat(level);
        let mut heading = format!(
            "{pad}export class {}{}",
            descriptor.emitted_name,
            generic_suffix(&descriptor.generic_params)
        );
        if let Some(base) = &descriptor.base {
            heading.push_str(&format!(" extends {}", self.type_text(descriptor, base)));
        }
        if !descriptor.interfaces.is_empty() {
            let names: Vec<String> = descriptor
                .interfaces
                .iter()
                .map(|node| self.type_text(descriptor, node))
                .collect();
            heading.push_str(&format!(" implements {}", names.join(", ")));
        }

        let mut text = format!("{heading} {{\n");

        for field in &descriptor.fields {
            text.push_str(&self.render_field_line(descriptor, field, level + 1));
        }
        for property in &descriptor.properties {
            text.push_str(&self.render_property_line(descriptor, property, level + 1));
        }
        for method in &descriptor.methods {
            text.push_str(&self.render_method(descriptor, method, level + 1));
        }

        // Interface-qualified dispatch: one proxy per interface carrying
        // explicit members, plus invalid-call passthroughs for names that
        // stay free.
        if descriptor.has_explicit_members() {
            for interface in explicit_interfaces(descriptor) {
                text.push_str(&self.render_proxy(descriptor, &interface, level + 1)?);
            }
            text.push_str(&self.render_passthroughs(descriptor, level + 1));
        }

        text.push_str(&format!("{pad}}}\n"));
        Ok(text)
    }

    fn render_field_line(
        &self,
        descriptor: &TypeDescriptor,
        field: &crate::graph::FieldDescriptor,
        level: usize,
    ) -> String {
        let pad = INDENT.repeat(level);
        let mut line = format!("{pad}{}", visibility_keyword(field.visibility));
        if field.is_static {
            line.push_str(" static");
        }
        if field.is_literal {
            line.push_str(" readonly");
        }
        line.push_str(&format!(
            " {}: {}",
            sanitize(&field.name),
            self.type_text(descriptor, &field.signature)
        ));
        if field.is_literal {
            if let Some(value) = field.constant {
                line.push_str(&format!(" = {value}"));
            }
        }
        line.push_str(";\n");
        line
    }

    fn render_property_line(
        &self,
        descriptor: &TypeDescriptor,
        property: &PropertyDescriptor,
        level: usize,
    ) -> String {
        let pad = INDENT.repeat(level);
        let name = match &property.explicit_impl {
            Some(explicit) => mangled_name(&explicit.interface, &explicit.member),
            None => sanitize(&property.name),
        };
        let visibility = if property.explicit_impl.is_some() {
            Visibility::Private
        } else {
            property.visibility
        };

        let mut line = format!("{pad}{}", visibility_keyword(visibility));
        if property.is_static {
            line.push_str(" static");
        }
        if property.has_getter && !property.has_setter {
            line.push_str(" readonly");
        }
        line.push_str(&format!(
            " {name}: {};\n",
            self.type_text(descriptor, &property.value)
        ));
        line
    }

    fn render_method(
        &self,
        descriptor: &TypeDescriptor,
        method: &MethodDescriptor,
        level: usize,
    ) -> String {
        let pad = INDENT.repeat(level);

        let name = match &method.explicit_impl {
            Some(explicit) => mangled_name(&explicit.interface, &explicit.member),
            None if method.is_ctor && !method.is_static => "constructor".to_string(),
            None if method.is_ctor => {
                // Static initializer; keep it private and out of the way.
                "__cctor".to_string()
            }
            None => sanitize(&method.name),
        };
        let visibility = if method.explicit_impl.is_some() {
            Visibility::Private
        } else {
            method.visibility
        };

        let mut line = format!("{pad}{}", visibility_keyword(visibility));
        if method.is_static {
            line.push_str(" static");
        }
        if method.is_abstract {
            line.push_str(" abstract");
        }
        line.push_str(&format!(
            " {name}{}({})",
            method_generic_suffix(method),
            self.parameter_list(descriptor, method)
        ));
        if !method.is_ctor {
            line.push_str(&format!(
                ": {}",
                self.type_text(descriptor, &method.signature.return_type)
            ));
        }

        if method.is_abstract {
            line.push_str(";\n");
            return line;
        }

        if method.statements.is_empty() {
            line.push_str(" {\n");
        } else {
            line.push_str(" {\n");
            for statement in &method.statements {
                line.push_str(&format!("{pad}{INDENT}{statement}\n"));
            }
        }
        line.push_str(&format!("{pad}}}\n"));
        line
    }

    /// Emits the dispatch proxy for one interface: a publicly exposed object
    /// bound to the instance that forwards explicit names to their mangled
    /// implementations and falls through for everything else.
    ///
    /// # Errors
    /// Returns [`Error::NoExplicitMembers`] when the type has no explicit
    /// members; calling this then is a programming error, not a data error.
    pub fn render_proxy(
        &self,
        descriptor: &TypeDescriptor,
        interface: &str,
        level: usize,
    ) -> Result<String> {
        if !descriptor.has_explicit_members() {
            return Err(Error::NoExplicitMembers(descriptor.emitted_name.clone()));
        }

        let pad = INDENT.repeat(level);
        let inner = INDENT.repeat(level + 1);
        let deeper = INDENT.repeat(level + 2);
        let deepest = INDENT.repeat(level + 3);

        let mut text = format!("{pad}public as{interface}(): any {{\n");
        text.push_str(&format!(
            "{inner}return new Proxy(this as any, {{\n{deeper}get(target: any, name: string) {{\n"
        ));
        text.push_str(&format!("{deepest}switch (name) {{\n"));

        for method in &descriptor.methods {
            if let Some(explicit) = &method.explicit_impl {
                if explicit.interface == interface {
                    let mangled = mangled_name(&explicit.interface, &explicit.member);
                    text.push_str(&format!(
                        "{deepest}{INDENT}case \"{}\": return target.{mangled}.bind(target);\n",
                        sanitize(&explicit.member)
                    ));
                }
            }
        }
        for property in &descriptor.properties {
            if let Some(explicit) = &property.explicit_impl {
                if explicit.interface == interface {
                    let mangled = mangled_name(&explicit.interface, &explicit.member);
                    text.push_str(&format!(
                        "{deepest}{INDENT}case \"{}\": return target.{mangled};\n",
                        sanitize(&explicit.member)
                    ));
                }
            }
        }

        text.push_str(&format!(
            "{deepest}{INDENT}default: return target[name];\n{deepest}}}\n{deeper}}},\n{inner}}});\n{pad}}}\n"
        ));
        Ok(text)
    }

    /// Emits the public invalid-call passthrough for each explicit member
    /// whose bare name collides with no implicitly-named member.
    fn render_passthroughs(&self, descriptor: &TypeDescriptor, level: usize) -> String {
        let pad = INDENT.repeat(level);
        let mut text = String::new();
        let mut emitted = std::collections::HashSet::new();

        for method in &descriptor.methods {
            let Some(explicit) = &method.explicit_impl else {
                continue;
            };
            if self.name_taken_implicitly(descriptor, &explicit.member)
                || !emitted.insert(explicit.member.clone())
            {
                continue;
            }
            let name = sanitize(&explicit.member);
            text.push_str(&format!(
                "{pad}public {name}{}({}): {} {{\n",
                method_generic_suffix(method),
                self.parameter_list(descriptor, method),
                self.type_text(descriptor, &method.signature.return_type)
            ));
            text.push_str(&format!(
                "{pad}{INDENT}throw new Error(\"invalid call: '{name}' is an explicit \
                 interface implementation; use as{}().{name}\");\n",
                explicit.interface
            ));
            text.push_str(&format!("{pad}}}\n"));
        }

        text
    }

    fn name_taken_implicitly(&self, descriptor: &TypeDescriptor, member: &str) -> bool {
        descriptor
            .methods
            .iter()
            .any(|method| method.explicit_impl.is_none() && method.name == member)
            || descriptor
                .properties
                .iter()
                .any(|property| property.explicit_impl.is_none() && property.name == member)
            || descriptor.fields.iter().any(|field| field.name == member)
    }

    fn parameter_list(&self, descriptor: &TypeDescriptor, method: &MethodDescriptor) -> String {
        let mut parts = Vec::new();
        for (index, param) in method.signature.params.iter().enumerate() {
            let name = method
                .param_names
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("arg{index}"));
            // By-reference parameters pass unwrapped; TypeScript reference
            // semantics stand in for the adjusted call convention.
            let shape = match param {
                SignatureNode::ByRef(inner) => inner.as_ref(),
                other => other,
            };
            parts.push(format!("{name}: {}", self.type_text(descriptor, shape)));
        }
        parts.join(", ")
    }

    /// Renders a type shape as TypeScript type text.
    #[must_use]
    pub fn type_text(&self, context: &TypeDescriptor, node: &SignatureNode) -> String {
        match node {
            SignatureNode::Primitive(primitive) => tsmap::ts_primitive(*primitive).to_string(),
            SignatureNode::Named(token) => match self.graph.lookup(*token) {
                Some(named) => named.emitted_name.clone(),
                None => "any".to_string(),
            },
            SignatureNode::SzArray(elem) => {
                format!("{}[]", self.type_text(context, elem))
            }
            SignatureNode::Array { elem, rank } => {
                let mut text = self.type_text(context, elem);
                for _ in 0..(*rank).max(1) {
                    text.push_str("[]");
                }
                text
            }
            SignatureNode::Ptr(elem) => {
                format!("Pointer<{}>", self.type_text(context, elem))
            }
            SignatureNode::ByRef(elem) => self.type_text(context, elem),
            SignatureNode::GenericInst { base, args } => {
                let rendered: Vec<String> =
                    args.iter().map(|arg| self.type_text(context, arg)).collect();
                format!("{}<{}>", self.type_text(context, base), rendered.join(", "))
            }
            SignatureNode::GenericParam { index, scope } => match scope {
                GenericScope::Type => context
                    .generic_params
                    .get(*index as usize)
                    .cloned()
                    .unwrap_or_else(|| format!("T{index}")),
                GenericScope::Method => format!("T{index}"),
            },
            SignatureNode::Unmodeled => "any".to_string(),
        }
    }
}

/// The mangled private name of an explicit interface member.
#[must_use]
pub fn mangled_name(interface: &str, member: &str) -> String {
    format!("{EXPLICIT_PREFIX}{}_{}", sanitize(interface), sanitize(member))
}

fn visibility_keyword(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "public",
        Visibility::Protected => "protected",
        Visibility::Private => "private",
    }
}

fn generic_suffix(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("<{}>", params.join(", "))
    }
}

fn method_generic_suffix(method: &MethodDescriptor) -> String {
    if method.signature.generic_arity == 0 {
        return String::new();
    }
    let params: Vec<String> = (0..method.signature.generic_arity)
        .map(|index| format!("T{index}"))
        .collect();
    format!("<{}>", params.join(", "))
}

/// Interfaces with at least one explicit member, first-appearance order.
fn explicit_interfaces(descriptor: &TypeDescriptor) -> Vec<String> {
    let mut interfaces = Vec::new();
    let mut note = |name: &str| {
        if !interfaces.iter().any(|existing: &String| existing == name) {
            interfaces.push(name.to_string());
        }
    };
    for method in &descriptor.methods {
        if let Some(explicit) = &method.explicit_impl {
            note(&explicit.interface);
        }
    }
    for property in &descriptor.properties {
        if let Some(explicit) = &property.explicit_impl {
            note(&explicit.interface);
        }
    }
    interfaces
}

fn is_flag_set(members: &[(&str, i64)]) -> bool {
    let nonzero: Vec<i64> = members
        .iter()
        .map(|&(_, value)| value)
        .filter(|&value| value != 0)
        .collect();
    if nonzero.len() < 2 {
        return false;
    }
    let mut seen = std::collections::HashSet::new();
    nonzero
        .iter()
        .all(|&value| value > 0 && (value & (value - 1)) == 0 && seen.insert(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{
            ExplicitImpl, FieldDescriptor, MethodDescriptor, PropertyDescriptor, TypeDescriptor,
            TypeGraph, TypeId, TypeKind, Visibility,
        },
        metadata::signature::{MethodSig, Primitive, SignatureNode},
        metadata::token::Token,
    };

    fn empty_type(token: u32, name: &str, kind: TypeKind) -> TypeDescriptor {
        TypeDescriptor {
            id: TypeId(0),
            token: Token::new(token),
            kind,
            namespace: "App".to_string(),
            name: name.to_string(),
            emitted_name: crate::sanitize::sanitize(crate::sanitize::strip_arity(name)),
            base: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
            enclosing: None,
            generic_params: Vec::new(),
            is_external: false,
            is_public: true,
        }
    }

    fn void_method(name: &str, explicit: Option<ExplicitImpl>) -> MethodDescriptor {
        MethodDescriptor {
            name: name.to_string(),
            signature: MethodSig {
                has_this: true,
                explicit_this: false,
                generic_arity: 0,
                return_type: SignatureNode::Primitive(Primitive::Void),
                params: Vec::new(),
            },
            param_names: Vec::new(),
            visibility: Visibility::Public,
            is_static: false,
            is_virtual: false,
            is_abstract: false,
            is_ctor: false,
            explicit_impl: explicit,
            statements: Vec::new(),
        }
    }

    fn graph_of(types: Vec<TypeDescriptor>) -> TypeGraph {
        let mut graph = TypeGraph::default();
        for descriptor in types {
            graph.admit(descriptor).unwrap();
        }
        graph
    }

    #[test]
    fn scenario_a_single_numeric_field() {
        let mut widget = empty_type(0x0200_0001, "Widget", TypeKind::Class);
        widget.fields.push(FieldDescriptor {
            name: "count".to_string(),
            signature: SignatureNode::Primitive(Primitive::I4),
            visibility: Visibility::Public,
            is_static: false,
            is_literal: false,
            constant: None,
        });

        let graph = graph_of(vec![widget]);
        let synthesizer = Synthesizer::new(&graph);
        let text = synthesizer.render_unit(&graph.types()[0]).unwrap();

        let field_lines: Vec<&str> = text
            .lines()
            .filter(|line| line.contains("count"))
            .collect();
        assert_eq!(field_lines, vec!["    public count: number;"]);
    }

    #[test]
    fn scenario_b_explicit_member_proxy_and_passthrough() {
        let mut runner = empty_type(0x0200_0001, "Runner", TypeKind::Class);
        runner.interfaces.push(SignatureNode::Named(Token::new(0x0200_0002)));
        runner.methods.push(void_method(
            "Contracts.IRunnable.Run",
            Some(ExplicitImpl {
                interface: "IRunnable".to_string(),
                member: "Run".to_string(),
            }),
        ));

        let mut interface = empty_type(0x0200_0002, "IRunnable", TypeKind::Interface);
        interface.methods.push(void_method("Run", None));

        let graph = graph_of(vec![interface, runner]);
        let synthesizer = Synthesizer::new(&graph);
        let text = synthesizer.render_unit(graph.types().last().unwrap()).unwrap();

        // Mangled private implementation, never the original qualified name.
        assert!(text.contains("private __explicit__IRunnable_Run()"));
        assert!(!text.contains("Contracts.IRunnable.Run("));
        // Dispatch proxy bound to the instance.
        assert!(text.contains("public asIRunnable(): any {"));
        assert!(text.contains("case \"Run\": return target.__explicit__IRunnable_Run.bind(target);"));
        assert!(text.contains("default: return target[name];"));
        // Public passthrough signalling the invalid call.
        assert!(text.contains("public Run(): void {"));
        assert!(text.contains("throw new Error(\"invalid call:"));
    }

    #[test]
    fn passthrough_suppressed_on_implicit_collision() {
        let mut runner = empty_type(0x0200_0001, "Runner", TypeKind::Class);
        runner.methods.push(void_method("Run", None));
        runner.methods.push(void_method(
            "Contracts.IRunnable.Run",
            Some(ExplicitImpl {
                interface: "IRunnable".to_string(),
                member: "Run".to_string(),
            }),
        ));

        let graph = graph_of(vec![runner]);
        let synthesizer = Synthesizer::new(&graph);
        let text = synthesizer.render_unit(&graph.types()[0]).unwrap();

        // The implicit Run stays; no throwing passthrough appears.
        assert!(text.contains("public Run(): void {"));
        assert!(!text.contains("invalid call"));
        assert!(text.contains("__explicit__IRunnable_Run"));
    }

    #[test]
    fn scenario_c_flag_enum_hex_members() {
        let mut flags = empty_type(0x0200_0001, "Modes", TypeKind::Enum);
        for (name, value) in [("A", 1i64), ("B", 2), ("C", 4)] {
            flags.fields.push(FieldDescriptor {
                name: name.to_string(),
                signature: SignatureNode::Primitive(Primitive::I4),
                visibility: Visibility::Public,
                is_static: true,
                is_literal: true,
                constant: Some(value),
            });
        }

        let graph = graph_of(vec![flags]);
        let synthesizer = Synthesizer::new(&graph);
        let text = synthesizer.render_unit(&graph.types()[0]).unwrap();

        assert!(text.contains("A = 0x1,"));
        assert!(text.contains("B = 0x2,"));
        assert!(text.contains("C = 0x4,"));
    }

    #[test]
    fn non_flag_enum_stays_decimal() {
        let mut plain = empty_type(0x0200_0001, "Levels", TypeKind::Enum);
        for (name, value) in [("Low", 1i64), ("Mid", 2), ("High", 3)] {
            plain.fields.push(FieldDescriptor {
                name: name.to_string(),
                signature: SignatureNode::Primitive(Primitive::I4),
                visibility: Visibility::Public,
                is_static: true,
                is_literal: true,
                constant: Some(value),
            });
        }

        let graph = graph_of(vec![plain]);
        let synthesizer = Synthesizer::new(&graph);
        let text = synthesizer.render_unit(&graph.types()[0]).unwrap();

        assert!(text.contains("Low = 1,"));
        assert!(text.contains("High = 3,"));
        assert!(!text.contains("0x"));
    }

    #[test]
    fn scenario_d_generic_instantiation_strips_arity() {
        let container = empty_type(0x0200_0001, "Container`1", TypeKind::Class);
        let mut holder = empty_type(0x0200_0002, "Holder", TypeKind::Class);
        holder.fields.push(FieldDescriptor {
            name: "items".to_string(),
            signature: SignatureNode::GenericInst {
                base: Box::new(SignatureNode::Named(Token::new(0x0200_0001))),
                args: vec![SignatureNode::Primitive(Primitive::I4)],
            },
            visibility: Visibility::Public,
            is_static: false,
            is_literal: false,
            constant: None,
        });

        let graph = graph_of(vec![container, holder]);
        let synthesizer = Synthesizer::new(&graph);
        let text = synthesizer.render_unit(&graph.types()[1]).unwrap();

        assert!(text.contains("items: Container<number>;"));
        assert!(!text.contains("Container`1"));
    }

    #[test]
    fn proxy_without_explicit_members_is_contract_violation() {
        let plain = empty_type(0x0200_0001, "Plain", TypeKind::Class);
        let graph = graph_of(vec![plain]);
        let synthesizer = Synthesizer::new(&graph);

        let result = synthesizer.render_proxy(&graph.types()[0], "IRunnable", 1);
        assert!(matches!(result, Err(Error::NoExplicitMembers(name)) if name == "Plain"));
    }

    #[test]
    fn nested_types_render_as_namespace_group() {
        let mut outer = empty_type(0x0200_0001, "Outer", TypeKind::Class);
        outer.nested.push(Token::new(0x0200_0002));
        let mut inner = empty_type(0x0200_0002, "Inner", TypeKind::Class);
        inner.enclosing = Some(Token::new(0x0200_0001));

        let graph = graph_of(vec![inner, outer]);
        let synthesizer = Synthesizer::new(&graph);
        let text = synthesizer.render_unit(graph.types().last().unwrap()).unwrap();

        assert!(text.contains("export class Outer {"));
        assert!(text.contains("export namespace Outer {"));
        assert!(text.contains("    export class Inner {"));
    }

    #[test]
    fn pointer_and_array_wrapping() {
        let mut holder = empty_type(0x0200_0001, "Holder", TypeKind::Class);
        holder.fields.push(FieldDescriptor {
            name: "buffer".to_string(),
            signature: SignatureNode::Ptr(Box::new(SignatureNode::Primitive(Primitive::U1))),
            visibility: Visibility::Public,
            is_static: false,
            is_literal: false,
            constant: None,
        });
        holder.fields.push(FieldDescriptor {
            name: "grid".to_string(),
            signature: SignatureNode::Array {
                elem: Box::new(SignatureNode::Primitive(Primitive::R8)),
                rank: 2,
            },
            visibility: Visibility::Public,
            is_static: false,
            is_literal: false,
            constant: None,
        });

        let graph = graph_of(vec![holder]);
        let synthesizer = Synthesizer::new(&graph);
        let text = synthesizer.render_unit(&graph.types()[0]).unwrap();

        assert!(text.contains("buffer: Pointer<number>;"));
        assert!(text.contains("grid: number[][];"));
    }

    #[test]
    fn method_bodies_carry_reconstructed_statements() {
        let mut widget = empty_type(0x0200_0001, "Widget", TypeKind::Class);
        let mut setter = void_method("SetName", None);
        setter.statements = vec!["this.name_ = value;".to_string()];
        setter.param_names = vec!["value".to_string()];
        setter.signature.params = vec![SignatureNode::Primitive(Primitive::String)];
        widget.methods.push(setter);

        let graph = graph_of(vec![widget]);
        let synthesizer = Synthesizer::new(&graph);
        let text = synthesizer.render_unit(&graph.types()[0]).unwrap();

        assert!(text.contains("public SetName(value: string): void {"));
        assert!(text.contains("        this.name_ = value;"));
    }

    #[test]
    fn flag_detection_edges() {
        assert!(is_flag_set(&[("A", 1), ("B", 2), ("C", 4)]));
        assert!(is_flag_set(&[("None", 0), ("A", 1), ("B", 2)]));
        assert!(!is_flag_set(&[("A", 1), ("B", 2), ("C", 3)]));
        assert!(!is_flag_set(&[("A", 1)]));
        assert!(!is_flag_set(&[("A", 2), ("B", 2)]));
    }
}
