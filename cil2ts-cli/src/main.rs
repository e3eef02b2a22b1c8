mod app;

use clap::Parser;

use crate::app::Cli;

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let cli = Cli::parse();

    // Show cil2ts info+ on stderr; --verbose enables debug; RUST_LOG overrides
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("cil2ts", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let transpiler = cil2ts::Transpiler::from_file(&cli.path)?;
    let graph = transpiler.build_graph(cli.root.as_deref())?;
    transpiler.write_output(&graph, &cli.out)?;

    log::info!(
        "wrote {} type(s) to {}",
        graph.types().iter().filter(|t| t.enclosing.is_none()).count(),
        cli.out.display()
    );

    Ok(())
}
