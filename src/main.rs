//! robocompdsl - RoboComp description file checker
//!
//! Parses a `.idsl`, `.cdsl` or `.smdsl` file, resolves everything it
//! references and optionally dumps the result.
//!
//! # Usage
//!
//! ```bash
//! robocompdsl -I ~/robocomp/interfaces/IDSLs camerafollower.cdsl --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use robocompdsl_core::{error::Result, Document, DslFactory, ModulePool, PoolConfig};
use tracing_subscriber::EnvFilter;

/// RoboComp description file checker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Description file (.idsl, .cdsl or .smdsl)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Extra directory to search for imported .idsl files (repeatable)
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Print the resolved document as JSON
    #[arg(long)]
    json: bool,

    /// Run the module pool consistency check
    #[arg(long)]
    check: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<()> {
    let config = PoolConfig::new().with_include_dirs(args.include.iter().cloned());
    let pool = Arc::new(ModulePool::new(config));
    let factory = DslFactory::new(Arc::clone(&pool));

    let doc = factory.from_file(&args.file)?;

    if args.check {
        pool.ensure_initialized()?;
        for warning in pool.consistency_check() {
            eprintln!("warning: {}", warning);
        }
    }

    if args.json {
        println!("{}", doc.to_json()?);
    } else {
        println!("{}", summary(&doc));
    }
    Ok(())
}

fn summary(doc: &Document) -> String {
    match doc {
        Document::Interface(m) => format!(
            "module {}: {} interfaces, {} types, imports [{}]",
            m.name,
            m.interfaces.len(),
            m.types.len(),
            m.recursive_imports.join(", ")
        ),
        Document::Component(c) => format!(
            "component {} ({}): {} implements, {} requires, {} subscribesTo, {} publishes",
            c.name,
            c.language.as_str(),
            c.implements.len(),
            c.requires.len(),
            c.subscribes_to.len(),
            c.publishes.len()
        ),
        Document::StateMachine(sm) => format!(
            "state machine {}: {} sub-machines",
            sm.name(),
            sm.substates.len()
        ),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
