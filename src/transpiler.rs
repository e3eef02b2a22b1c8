//! The top-level driver tying the pipeline together.
//!
//! [`Transpiler`] owns the loaded image and runs the phases in order: parse
//! metadata, discover the type graph from the selected roots, synthesize
//! declarations, write units. One image, one traversal, one output pass.

use std::path::Path;

use crate::{
    emit::output,
    file::Image,
    graph::{GraphBuilder, TypeGraph},
    metadata::{
        resolver::Resolver,
        tables::{TableId, TypeDefRow},
        token::Token,
    },
    Result,
};

/// A loaded module ready for transpilation.
///
/// # Examples
///
/// ```rust,no_run
/// use cil2ts::Transpiler;
/// use std::path::Path;
///
/// let transpiler = Transpiler::from_file(Path::new("Library.dll"))?;
/// let graph = transpiler.build_graph(None)?;
/// println!("admitted {} types", graph.len());
/// transpiler.write_output(&graph, Path::new("out"))?;
/// # Ok::<(), cil2ts::Error>(())
/// ```
pub struct Transpiler {
    image: Image,
}

impl Transpiler {
    /// Loads a module from disk.
    ///
    /// # Errors
    /// Returns an error when the file is unreadable or not a CLR module.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Transpiler {
            image: Image::from_file(path)?,
        })
    }

    /// Loads a module from an in-memory buffer.
    ///
    /// # Errors
    /// Returns an error when the buffer is not a CLR module.
    pub fn from_mem(data: Vec<u8>) -> Result<Self> {
        Ok(Transpiler {
            image: Image::from_mem(data)?,
        })
    }

    /// The underlying image.
    #[must_use]
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Discovers the type graph.
    ///
    /// With `root` set, discovery starts from that type (matched by
    /// `Namespace.Name` or bare name); otherwise every non-nested TypeDef
    /// seeds the traversal.
    ///
    /// # Errors
    /// Returns an error when the metadata cannot be parsed, the named root
    /// does not exist, or graph construction hits a fatal condition.
    pub fn build_graph(&self, root: Option<&str>) -> Result<TypeGraph> {
        let resolver = Resolver::new(&self.image)?;
        let roots = self.select_roots(&resolver, root)?;
        GraphBuilder::new(&resolver).build(&roots)
    }

    /// Renders and writes every unit of a finished graph.
    ///
    /// # Errors
    /// Returns an error on a failed render or filesystem failure.
    pub fn write_output(&self, graph: &TypeGraph, out_root: &Path) -> Result<()> {
        output::write_units(graph, out_root)
    }

    fn select_roots(
        &self,
        resolver: &Resolver<'_>,
        root: Option<&str>,
    ) -> Result<Vec<Token>> {
        let count = resolver.tables().row_count(TableId::TypeDef);
        let mut roots = Vec::new();

        for rid in 1..=count {
            let row = TypeDefRow::read(resolver.tables(), rid)?;
            let name = resolver.string(row.name).unwrap_or("");
            let namespace = resolver.string(row.namespace).unwrap_or("");

            match root {
                Some(wanted) => {
                    let full = if namespace.is_empty() {
                        name.to_string()
                    } else {
                        format!("{namespace}.{name}")
                    };
                    if full == wanted || name == wanted {
                        return Ok(vec![row.token()]);
                    }
                }
                None => {
                    if resolver.enclosing_of(rid).is_none() {
                        roots.push(row.token());
                    }
                }
            }
        }

        match root {
            Some(wanted) => Err(malformed_error!(
                "root type '{}' not found in module",
                wanted
            )),
            None => Ok(roots),
        }
    }
}
