//! Best-effort reconstruction of method bodies into pseudo-statements.
//!
//! A single pass over one method's instruction range, folding the modeled
//! operand kinds into symbolic expressions on a conceptual evaluation stack
//! and emitting pseudo-statements at statement-terminating opcodes. No
//! control-flow recovery is attempted: every opcode outside the modeled
//! subset advances the cursor by its declared operand width and leaves the
//! stack untouched. That skip path is a deliberate completeness boundary.

use std::collections::BTreeMap;

use crate::{
    bytecode::opcodes::{self, Effect, OpcodeEntry, OperandKind, ESCAPE_BYTE},
    file::parser::Parser,
    metadata::{
        resolver::{ResolvedEntity, Resolver, UNKNOWN_NAME},
        signature::{SignatureDecoder, SignatureNode},
        token::Token,
    },
    sanitize::sanitize,
    tsmap,
    Error, Result,
};

/// Reconstructs one method body into an ordered list of pseudo-statements.
///
/// `arg_names` is indexed by argument slot, with the receiver at slot 0 for
/// instance methods; slots past the end render as `argN`. The returned list
/// may be empty for methods built entirely from unmodeled opcodes.
///
/// # Errors
/// Returns [`Error::TruncatedBytecode`] when the cursor runs past the range
/// mid-instruction. Fatal for this method only; callers continue with the
/// remaining methods.
pub fn reconstruct(
    code: &[u8],
    resolver: &Resolver<'_>,
    arg_names: &[String],
) -> Result<Vec<String>> {
    let tables = opcodes::tables();
    let mut parser = Parser::new(code);

    let mut stack: Vec<String> = Vec::new();
    let mut pending: BTreeMap<u32, String> = BTreeMap::new();
    let mut last_pending: Option<u32> = None;
    let mut statements = Vec::new();

    while parser.has_more_data() {
        let offset = parser.pos();
        let entry = read_opcode(&mut parser, tables, offset)?;

        if entry.is_reserved() {
            // Tolerated, not decoded; the cursor already sits past the
            // opcode byte(s).
            log::debug!("reserved opcode at body offset {offset}");
            continue;
        }

        match entry.effect {
            Effect::FieldAccess => {
                let token = read_token(&mut parser, offset)?;
                let name = resolver.entity_label(token);
                stack.push(format!("this.{}", sanitize(&name)));
            }
            Effect::Call => {
                let token = read_token(&mut parser, offset)?;
                stack.push(call_expression(resolver, token));
            }
            Effect::LoadArgConst(index) => {
                let index = u32::from(index);
                pending.insert(index, argument_name(arg_names, index));
                last_pending = Some(index);
            }
            Effect::LoadArgOperand => {
                let index = match entry.operand {
                    OperandKind::UInt8 => u32::from(
                        parser
                            .read_le::<u8>()
                            .map_err(|_| truncated(offset))?,
                    ),
                    _ => u32::from(
                        parser
                            .read_le::<u16>()
                            .map_err(|_| truncated(offset))?,
                    ),
                };
                pending.insert(index, argument_name(arg_names, index));
                last_pending = Some(index);
            }
            Effect::Return => {
                if let Some(index) = last_pending.take() {
                    let argument = pending
                        .remove(&index)
                        .unwrap_or_else(|| argument_name(arg_names, index));
                    let target = stack.pop().unwrap_or_else(|| UNKNOWN_NAME.to_string());
                    statements.push(format!("{target} = {argument};"));
                    pending.clear();
                } else if let Some(top) = stack.pop() {
                    statements.push(format!("return {top};"));
                }
            }
            Effect::LoadToken => {
                let token = read_token(&mut parser, offset)?;
                let label = resolver.entity_label(token);
                if let Ok(ResolvedEntity::Field(field)) = resolver.resolve_token(token) {
                    report_static_data(resolver, &field, &label);
                }
                stack.push(sanitize(&label));
            }
            Effect::Unmodeled => {
                skip_operand(&mut parser, entry, offset)?;
            }
        }
    }

    Ok(statements)
}

fn truncated(offset: usize) -> Error {
    Error::TruncatedBytecode { offset }
}

fn read_opcode<'t>(
    parser: &mut Parser<'_>,
    tables: &'t opcodes::OpcodeTable,
    offset: usize,
) -> Result<&'t OpcodeEntry> {
    let first = parser.read_le::<u8>().map_err(|_| truncated(offset))?;
    if first == ESCAPE_BYTE {
        let second = parser.read_le::<u8>().map_err(|_| truncated(offset))?;
        Ok(&tables.extended[second as usize])
    } else {
        Ok(&tables.single[first as usize])
    }
}

fn read_token(parser: &mut Parser<'_>, offset: usize) -> Result<Token> {
    Ok(Token::new(
        parser.read_le::<u32>().map_err(|_| truncated(offset))?,
    ))
}

fn skip_operand(parser: &mut Parser<'_>, entry: &OpcodeEntry, offset: usize) -> Result<()> {
    match entry.operand.fixed_width() {
        Some(width) => parser.advance_by(width).map_err(|_| truncated(offset)),
        None => {
            // switch: u32 case count, then one u32 target per case
            let cases = parser.read_le::<u32>().map_err(|_| truncated(offset))?;
            parser
                .advance_by(cases as usize * 4)
                .map_err(|_| truncated(offset))
        }
    }
}

fn argument_name(arg_names: &[String], index: u32) -> String {
    arg_names
        .get(index as usize)
        .cloned()
        .unwrap_or_else(|| format!("arg{index}"))
}

/// Synthesizes a call-site expression for a method-token operand, excluding
/// the implicit receiver parameter.
fn call_expression(resolver: &Resolver<'_>, token: Token) -> String {
    match resolver.resolve_token(token) {
        Ok(ResolvedEntity::MethodDef(row)) => {
            let name = resolver.string(row.name).unwrap_or(UNKNOWN_NAME);
            let declaring = resolver
                .declaring_type_of_method(row.rid)
                .and_then(|typedef| resolver.string(typedef.name).ok().map(str::to_string))
                .unwrap_or_else(|| UNKNOWN_NAME.to_string());

            let mut arguments = Vec::new();
            if let Ok(range) = resolver.params_of(&row) {
                for rid in range {
                    if let Ok(param) =
                        crate::metadata::tables::ParamRow::read(resolver.tables(), rid)
                    {
                        if param.sequence >= 1 {
                            arguments.push(
                                resolver
                                    .string(param.name)
                                    .map(sanitize)
                                    .unwrap_or_else(|_| format!("arg{}", param.sequence - 1)),
                            );
                        }
                    }
                }
            }

            format!(
                "{}.{}({})",
                sanitize(&declaring),
                sanitize(name),
                arguments.join(", ")
            )
        }
        Ok(ResolvedEntity::MemberRef(row)) => {
            let name = resolver.string(row.name).unwrap_or(UNKNOWN_NAME);
            let declaring = resolver.entity_label(row.class);

            let count = resolver
                .blob(row.signature)
                .ok()
                .and_then(|blob| SignatureDecoder::new(blob).decode_method().ok())
                .map_or(0, |sig| sig.params.len());
            let arguments: Vec<String> = (0..count).map(|index| format!("arg{index}")).collect();

            format!(
                "{}.{}({})",
                sanitize(&declaring),
                sanitize(name),
                arguments.join(", ")
            )
        }
        Ok(ResolvedEntity::MethodSpec(row)) => {
            let inner = call_expression(resolver, row.method);

            let type_arguments = resolver
                .blob(row.instantiation)
                .ok()
                .and_then(|blob| SignatureDecoder::new(blob).decode_method_spec().ok())
                .unwrap_or_default();
            let rendered: Vec<String> = type_arguments
                .iter()
                .map(|node| node_label(resolver, node))
                .collect();

            match inner.find('(') {
                Some(split) => format!(
                    "{}<{}>{}",
                    &inner[..split],
                    rendered.join(", "),
                    &inner[split..]
                ),
                None => inner,
            }
        }
        Ok(_) => {
            log::warn!("method-token operand {token} resolves to a non-method entity");
            format!("{UNKNOWN_NAME}()")
        }
        Err(error) => {
            log::warn!("substituting sentinel call for {token}: {error}");
            format!("{UNKNOWN_NAME}()")
        }
    }
}

/// A short diagnostic label for a decoded type shape.
fn node_label(resolver: &Resolver<'_>, node: &SignatureNode) -> String {
    match node {
        SignatureNode::Primitive(primitive) => tsmap::ts_primitive(*primitive).to_string(),
        SignatureNode::Named(token) => sanitize(&resolver.entity_label(*token)),
        SignatureNode::SzArray(elem) => format!("{}[]", node_label(resolver, elem)),
        SignatureNode::GenericParam { index, .. } => format!("T{index}"),
        _ => UNKNOWN_NAME.to_string(),
    }
}

/// Best-effort decode of a field's statically addressed data as text.
///
/// Diagnostic only; an unresolved value or unsized type is absorbed here.
fn report_static_data(
    resolver: &Resolver<'_>,
    field: &crate::metadata::tables::FieldRow,
    label: &str,
) {
    let Some(size) = resolver
        .blob(field.signature)
        .ok()
        .and_then(|blob| SignatureDecoder::new(blob).decode_field().ok())
        .and_then(|node| match node {
            SignatureNode::Primitive(primitive) => primitive.byte_size(),
            _ => None,
        })
    else {
        return;
    };

    match resolver.field_initial_value(field.rid, size) {
        Some(bytes) => {
            log::debug!(
                "static data for {label}: {}",
                String::from_utf8_lossy(bytes)
            );
        }
        None => log::debug!("static data for {label} unresolved"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        file::Image,
        metadata::{
            streams::{BlobHeap, StringsHeap},
            tables::{TableDirectory, TableId},
        },
    };

    struct Fixture {
        image: Image,
        strings: Vec<u8>,
        blob: Vec<u8>,
        stream: Vec<u8>,
    }

    impl Fixture {
        fn resolver(&self) -> Resolver<'_> {
            Resolver::from_parts(
                &self.image,
                StringsHeap::new(&self.strings).unwrap(),
                BlobHeap::new(&self.blob).unwrap(),
                TableDirectory::parse(&self.stream).unwrap(),
            )
        }
    }

    fn empty_fixture() -> Fixture {
        Fixture {
            image: Image::from_parts(vec![0u8; 8], Vec::new()),
            strings: b"\0".to_vec(),
            blob: vec![0x00],
            stream: crate::metadata::tables::build_stream(&[]),
        }
    }

    /// Fixture with one Field row named `value_` (I4) and one TypeDef
    /// `Widget` owning one method `Helper(count)`.
    fn member_fixture() -> Fixture {
        let strings = b"\0value_\0Widget\0Helper\0count\0".to_vec();
        // blob: [0] empty, [1] field sig I4, [4] method sig: default, 1 param, void, I4
        let blob = vec![0x00, 0x02, 0x06, 0x08, 0x04, 0x00, 0x01, 0x01, 0x08];

        let mut field_row = Vec::new();
        field_row.extend_from_slice(&0x0001u16.to_le_bytes());
        field_row.extend_from_slice(&1u16.to_le_bytes()); // "value_"
        field_row.extend_from_slice(&1u16.to_le_bytes()); // field sig

        let mut typedef_row = Vec::new();
        typedef_row.extend_from_slice(&0u32.to_le_bytes());
        typedef_row.extend_from_slice(&8u16.to_le_bytes()); // "Widget"
        typedef_row.extend_from_slice(&0u16.to_le_bytes());
        typedef_row.extend_from_slice(&0u16.to_le_bytes());
        typedef_row.extend_from_slice(&1u16.to_le_bytes()); // field_list
        typedef_row.extend_from_slice(&1u16.to_le_bytes()); // method_list

        let mut method_row = Vec::new();
        method_row.extend_from_slice(&0u32.to_le_bytes()); // rva
        method_row.extend_from_slice(&0u16.to_le_bytes());
        method_row.extend_from_slice(&0x0016u16.to_le_bytes());
        method_row.extend_from_slice(&15u16.to_le_bytes()); // "Helper"
        method_row.extend_from_slice(&4u16.to_le_bytes()); // method sig
        method_row.extend_from_slice(&1u16.to_le_bytes()); // param_list

        let mut param_row = Vec::new();
        param_row.extend_from_slice(&0u16.to_le_bytes());
        param_row.extend_from_slice(&1u16.to_le_bytes()); // sequence 1
        param_row.extend_from_slice(&22u16.to_le_bytes()); // "count"

        Fixture {
            image: Image::from_parts(vec![0u8; 8], Vec::new()),
            strings,
            blob,
            stream: crate::metadata::tables::build_stream(&[
                (TableId::TypeDef, vec![typedef_row]),
                (TableId::Field, vec![field_row]),
                (TableId::MethodDef, vec![method_row]),
                (TableId::Param, vec![param_row]),
            ]),
        }
    }

    fn this_and(value: &str) -> Vec<String> {
        vec!["this".to_string(), value.to_string()]
    }

    #[test]
    fn setter_pattern_emits_assignment() {
        let fixture = member_fixture();
        let resolver = fixture.resolver();

        // ldarg.0; ldarg.1; stfld <Field 1>; ret
        let code = [0x02, 0x03, 0x7D, 0x01, 0x00, 0x00, 0x04, 0x2A];
        let statements = reconstruct(&code, &resolver, &this_and("value")).unwrap();

        assert_eq!(statements, vec!["this.value_ = value;".to_string()]);
    }

    #[test]
    fn pending_load_without_stack_uses_sentinel() {
        let fixture = empty_fixture();
        let resolver = fixture.resolver();

        // ldarg.0; ret
        let statements = reconstruct(&[0x02, 0x2A], &resolver, &this_and("value")).unwrap();
        assert_eq!(statements, vec!["unknown = this;".to_string()]);
    }

    #[test]
    fn getter_pattern_emits_return() {
        let fixture = member_fixture();
        let resolver = fixture.resolver();

        // ldfld <Field 1>; ret (receiver load elided for the test)
        let code = [0x7B, 0x01, 0x00, 0x00, 0x04, 0x2A];
        let statements = reconstruct(&code, &resolver, &this_and("value")).unwrap();

        assert_eq!(statements, vec!["return this.value_;".to_string()]);
    }

    #[test]
    fn call_site_uses_callee_parameter_names() {
        let fixture = member_fixture();
        let resolver = fixture.resolver();

        // call <MethodDef 1>; ret
        let code = [0x28, 0x01, 0x00, 0x00, 0x06, 0x2A];
        let statements = reconstruct(&code, &resolver, &[]).unwrap();

        assert_eq!(statements, vec!["return Widget.Helper(count);".to_string()]);
    }

    #[test]
    fn wide_ldarg_records_pending_load() {
        let fixture = empty_fixture();
        let resolver = fixture.resolver();

        // ldarg.s 1; ret
        let statements =
            reconstruct(&[0x0E, 0x01, 0x2A], &resolver, &this_and("width")).unwrap();
        assert_eq!(statements, vec!["unknown = width;".to_string()]);

        // FE ldarg 1; ret
        let statements = reconstruct(
            &[0xFE, 0x09, 0x01, 0x00, 0x2A],
            &resolver,
            &this_and("width"),
        )
        .unwrap();
        assert_eq!(statements, vec!["unknown = width;".to_string()]);
    }

    #[test]
    fn ldtoken_pushes_sentinel_label() {
        let fixture = member_fixture();
        let resolver = fixture.resolver();

        // ldtoken <Field 1>; ret
        let code = [0xD0, 0x01, 0x00, 0x00, 0x04, 0x2A];
        let statements = reconstruct(&code, &resolver, &[]).unwrap();
        assert_eq!(statements, vec!["return value_;".to_string()]);

        // Tokens outside the modeled kinds degrade to the sentinel.
        let code = [0xD0, 0x01, 0x00, 0x00, 0x26, 0x2A];
        let statements = reconstruct(&code, &resolver, &[]).unwrap();
        assert_eq!(statements, vec!["return unknown;".to_string()]);
    }

    #[test]
    fn unmodeled_opcodes_skip_without_stack_effects() {
        let fixture = empty_fixture();
        let resolver = fixture.resolver();

        // The completeness boundary: arithmetic, branches and constants are
        // not decompiled; a body of only unmodeled opcodes yields nothing.
        let code = [
            0x00, // nop
            0x16, // ldc.i4.0
            0x1F, 0x2C, // ldc.i4.s 44
            0x20, 0x01, 0x00, 0x00, 0x00, // ldc.i4 1
            0x58, // add
            0x2B, 0x00, // br.s +0
            0x26, // pop
            0x2A, // ret (empty stack, no pending load)
        ];
        let statements = reconstruct(&code, &resolver, &[]).unwrap();
        assert!(statements.is_empty());
    }

    #[test]
    fn switch_operand_is_skipped_by_count() {
        let fixture = empty_fixture();
        let resolver = fixture.resolver();

        // switch with 2 targets, then ret
        let code = [
            0x45, 0x02, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x2A,
        ];
        let statements = reconstruct(&code, &resolver, &[]).unwrap();
        assert!(statements.is_empty());
    }

    #[test]
    fn truncated_operand_is_fatal_per_method() {
        let fixture = empty_fixture();
        let resolver = fixture.resolver();

        // ldc.i4 with only two operand bytes
        let result = reconstruct(&[0x20, 0x01, 0x00], &resolver, &[]);
        assert!(matches!(
            result,
            Err(Error::TruncatedBytecode { offset: 0 })
        ));

        // field token cut short
        let result = reconstruct(&[0x7B, 0x01], &resolver, &[]);
        assert!(matches!(result, Err(Error::TruncatedBytecode { .. })));
    }

    #[test]
    fn empty_body_yields_no_statements() {
        let fixture = empty_fixture();
        let resolver = fixture.resolver();
        assert!(reconstruct(&[], &resolver, &[]).unwrap().is_empty());
    }
}
