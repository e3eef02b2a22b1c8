// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # cil2ts
//!
//! Transpiles compiled .NET PE modules into TypeScript source declarations.
//! `cil2ts` decodes ECMA-335 metadata tables and signature blobs into
//! language-neutral type descriptors, reconstructs CIL method bodies into
//! best-effort pseudo-statements, discovers the transitive closure of
//! referenced types, and renders one TypeScript declaration unit per type -
//! including a dynamic-dispatch proxy for member patterns TypeScript cannot
//! express natively (explicit, interface-qualified implementations).
//!
//! ## Pipeline
//!
//! - [`metadata`] - tokens, heaps, tables, signatures, and the resolver
//! - [`bytecode`] - the two-level opcode table and the reconstruction engine
//! - [`graph`] - type descriptors and transitive closure discovery
//! - [`emit`] - declaration synthesis and the output writer
//! - [`Transpiler`] - the driver wiring the phases together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cil2ts::Transpiler;
//! use std::path::Path;
//!
//! let transpiler = Transpiler::from_file(Path::new("Library.dll"))?;
//! let graph = transpiler.build_graph(None)?;
//! transpiler.write_output(&graph, Path::new("out"))?;
//! println!("wrote {} types", graph.len());
//! # Ok::<(), cil2ts::Error>(())
//! ```
//!
//! ## Scope
//!
//! Reconstruction is deliberately bounded: a fixed subset of operand kinds
//! folds into pseudo-statements, and everything else advances past its
//! declared operand width untouched. No control-flow recovery, no execution,
//! no round-tripping back to the binary form.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Unresolvable tokens
//! and unmodeled operands are absorbed where they occur (a sentinel name is
//! substituted); a malformed instruction stream costs only that method; an
//! unmapped address, an unresolvable name collision, or a misused proxy
//! synthesis terminates the run.

#[macro_use]
pub(crate) mod error;

pub mod bytecode;
pub mod emit;
pub mod file;
pub mod graph;
pub mod metadata;
pub mod sanitize;
pub mod transpiler;
pub mod tsmap;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust,no_run
/// use cil2ts::prelude::*;
///
/// let transpiler = Transpiler::from_file("Library.dll".as_ref())?;
/// let graph = transpiler.build_graph(None)?;
/// # Ok::<(), cil2ts::Error>(())
/// ```
pub mod prelude {
    pub use crate::{
        graph::{TypeDescriptor, TypeGraph, TypeId, TypeKind},
        metadata::token::Token,
        transpiler::Transpiler,
        Error, Result,
    };
}

/// `cil2ts` Result type.
///
/// A type alias for [`std::result::Result`] with the error fixed to
/// [`Error`], used for all fallible operations in the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// `cil2ts` Error type.
///
/// See the variant documentation for the recoverable-local,
/// recoverable-per-method and fatal-per-run tiers.
pub use error::Error;

/// The loaded input module.
pub use file::Image;

/// Low-level byte cursor over metadata streams and method bodies.
pub use file::parser::Parser;

/// Main entry point: load a module, build the graph, write units.
pub use transpiler::Transpiler;
