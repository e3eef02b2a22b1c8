//! Output writing: one text unit per admitted type.
//!
//! The directory hierarchy mirrors each type's namespace (segments become
//! nested directories; the root has no prefix). Nested types are emitted
//! inside their enclosing type's unit, so only non-nested types produce
//! files. Each unit ends with a trailing blank line.

use std::path::{Path, PathBuf};

use crate::{
    emit::Synthesizer,
    graph::TypeGraph,
    sanitize::sanitize,
    Result,
};

/// The support unit emitted when any declaration mentions a pointer shape.
const SUPPORT_UNIT: &str = "export type Pointer<T> = { value: T };\n\n";

/// Renders and writes every unit of the graph below `out_root`.
///
/// Deterministic: units are written in admission order, and re-running on
/// the same image reproduces identical bytes.
///
/// # Errors
/// Returns an error on a failed render or any filesystem failure.
pub fn write_units(graph: &TypeGraph, out_root: &Path) -> Result<()> {
    let synthesizer = Synthesizer::new(graph);
    let mut any_pointer = false;

    for descriptor in graph.types() {
        if emitted_inside_enclosing(graph, descriptor) {
            continue;
        }

        let text = synthesizer.render_unit(descriptor)?;
        any_pointer = any_pointer || text.contains("Pointer<");

        let directory = namespace_directory(out_root, &descriptor.namespace);
        std::fs::create_dir_all(&directory)?;

        let path = directory.join(format!("{}.ts", descriptor.emitted_name));
        std::fs::write(path, format!("{text}\n"))?;
    }

    if any_pointer {
        std::fs::create_dir_all(out_root)?;
        std::fs::write(out_root.join("__support.ts"), SUPPORT_UNIT)?;
    }

    Ok(())
}

/// Renders every unit into memory, in admission order. The writer's file
/// layout without the filesystem; also what determinism tests compare.
#[must_use = "the rendered units are the only output"]
pub fn render_all(graph: &TypeGraph) -> Result<Vec<(PathBuf, String)>> {
    let synthesizer = Synthesizer::new(graph);
    let mut units = Vec::new();

    for descriptor in graph.types() {
        if emitted_inside_enclosing(graph, descriptor) {
            continue;
        }
        let text = synthesizer.render_unit(descriptor)?;
        let path = namespace_directory(Path::new(""), &descriptor.namespace)
            .join(format!("{}.ts", descriptor.emitted_name));
        units.push((path, format!("{text}\n")));
    }

    Ok(units)
}

/// A nested type is emitted inside its enclosing type's unit; it only gets
/// a unit of its own when discovery never admitted the enclosing type.
fn emitted_inside_enclosing(graph: &TypeGraph, descriptor: &crate::graph::TypeDescriptor) -> bool {
    descriptor
        .enclosing
        .is_some_and(|parent| graph.lookup(parent).is_some())
}

fn namespace_directory(root: &Path, namespace: &str) -> PathBuf {
    let mut directory = root.to_path_buf();
    if namespace.is_empty() {
        return directory;
    }
    for segment in namespace.split('.') {
        directory.push(sanitize(segment));
    }
    directory
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{TypeDescriptor, TypeGraph, TypeId, TypeKind},
        metadata::token::Token,
        sanitize::strip_arity,
    };

    fn stub(token: u32, namespace: &str, name: &str) -> TypeDescriptor {
        TypeDescriptor {
            id: TypeId(0),
            token: Token::new(token),
            kind: TypeKind::Class,
            namespace: namespace.to_string(),
            name: name.to_string(),
            emitted_name: sanitize(strip_arity(name)),
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

    #[test]
    fn namespace_segments_become_directories() {
        let path = namespace_directory(Path::new("out"), "App.Core.Model");
        assert_eq!(path, Path::new("out/App/Core/Model"));

        let path = namespace_directory(Path::new("out"), "");
        assert_eq!(path, Path::new("out"));
    }

    #[test]
    fn units_skip_nested_types_and_end_blank() {
        let mut graph = TypeGraph::default();
        let mut outer = stub(0x0200_0001, "App", "Outer");
        outer.nested.push(Token::new(0x0200_0002));
        let mut inner = stub(0x0200_0002, "App", "Inner");
        inner.enclosing = Some(Token::new(0x0200_0001));
        graph.admit(inner).unwrap();
        graph.admit(outer).unwrap();

        let units = render_all(&graph).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].0, Path::new("App/Outer.ts"));
        assert!(units[0].1.ends_with("}\n\n"));
        assert!(units[0].1.contains("export class Inner"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut graph = TypeGraph::default();
        graph.admit(stub(0x0200_0001, "App", "Alpha")).unwrap();
        graph.admit(stub(0x0200_0002, "App", "Beta")).unwrap();

        let first = render_all(&graph).unwrap();
        let second = render_all(&graph).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn files_land_in_namespace_hierarchy() {
        let out = std::env::temp_dir().join(format!(
            "cil2ts-test-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_dir_all(&out);

        let mut graph = TypeGraph::default();
        graph.admit(stub(0x0200_0001, "App.Core", "Widget")).unwrap();
        write_units(&graph, &out).unwrap();

        let written = std::fs::read_to_string(out.join("App/Core/Widget.ts")).unwrap();
        assert!(written.starts_with("export class Widget"));
        assert!(written.ends_with("\n\n"));

        std::fs::remove_dir_all(&out).unwrap();
    }
}
