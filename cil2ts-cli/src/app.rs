use std::path::PathBuf;

use clap::Parser;

/// cil2ts - transpile a .NET module into TypeScript declarations
#[derive(Debug, Parser)]
#[command(name = "cil2ts", version, about, long_about = None)]
pub struct Cli {
    /// Path to the .NET module file.
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Output root directory; namespace segments become subdirectories.
    #[arg(short, long, value_name = "DIR", default_value = "out")]
    pub out: PathBuf,

    /// Start discovery from one type (Namespace.Name or bare name) instead
    /// of every top-level type.
    #[arg(short, long, value_name = "TYPE")]
    pub root: Option<String>,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long)]
    pub verbose: bool,
}
