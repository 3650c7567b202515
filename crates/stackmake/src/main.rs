use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stackmake::Result;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a design and print the resolved stacks and conflicts
    Plan {
        /// Path to a design definition TOML
        design: PathBuf,
    },
    /// Resolve all stacks and write one Makefile per stack
    Generate {
        /// Path to a design definition TOML
        design: PathBuf,
        /// Base output directory
        #[arg(long, default_value = "out")]
        out: PathBuf,
        /// Subdirectory qualifier (defaults to the design name)
        #[arg(long)]
        qualifier: Option<String>,
    },
    /// Load a design and print the fully-merged TOML (after extends)
    Resolve {
        /// Path to a design definition TOML
        design: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match args.cmd {
        Command::Plan { design } => cmd_plan(&design),
        Command::Generate {
            design,
            out,
            qualifier,
        } => cmd_generate(&design, &out, qualifier.as_deref()),
        Command::Resolve { design } => cmd_resolve(&design),
    }
}

fn cmd_plan(path: &PathBuf) -> Result<()> {
    let file = stackmake::config::load(path.as_path())?;
    let design = file.into_design();

    let stacks = stackmake::stacks::resolve(&design);
    let plans = stackmake::plan::build_plans(&design, &stacks);

    for plan in &plans {
        let compiled = plan.objects.iter().filter(|u| !u.include).count();
        println!(
            "{:<24} objects={:<4} includes={:<4} linker={}",
            plan.name,
            compiled,
            plan.objects.len() - compiled,
            if plan.linker.is_empty() {
                "(none)"
            } else {
                plan.linker.as_str()
            }
        );
        for group in &plan.conflicts {
            println!("  CONFLICT: {}", group.path);
            for unit in &group.units {
                println!("    compiler='{}' flags='{}'", unit.compiler, unit.flags);
            }
        }
    }
    if plans.is_empty() {
        println!("no stacks resolve to a build plan");
    }
    Ok(())
}

fn cmd_generate(path: &PathBuf, out: &PathBuf, qualifier: Option<&str>) -> Result<()> {
    let file = stackmake::config::load(path.as_path())?;
    let design = file.into_design();
    let qualifier = qualifier.unwrap_or(design.name.as_str()).to_string();

    let stacks = stackmake::stacks::resolve(&design);
    let plans = stackmake::plan::build_plans(&design, &stacks);

    let docs = stackmake::emit::emit_all(&plans, &qualifier);
    let written = stackmake::emit::write_all(out.as_path(), &docs)?;
    for p in &written {
        println!("WROTE: {}", p.display());
    }

    for plan in &plans {
        for group in &plan.conflicts {
            println!(
                "WARN: {} is built with conflicting settings in stack {}",
                group.path, plan.name
            );
        }
    }
    Ok(())
}

fn cmd_resolve(path: &PathBuf) -> Result<()> {
    let value = stackmake::config::load_value(path.as_path())?;
    // Best-effort pretty print of the merged design.
    let s = toml::to_string_pretty(&value).unwrap_or_else(|_| format!("{:?}", value));
    print!("{s}");
    Ok(())
}
