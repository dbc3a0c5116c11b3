use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::Parser;
use dpda::loader::Context;
use dpda::{AutomatonSpec, Run, Verdict};

#[derive(Parser, Debug)]
#[command(name = "dpda", about = "Runs inputs through a deterministic pushdown automaton")]
struct Args {
    /// Automaton definition file.
    #[arg(value_name = "DEFINITION")]
    definition: PathBuf,
    /// Inputs to run. Read one per line from stdin when none are given.
    #[arg(value_name = "INPUT")]
    inputs: Vec<String>,
    /// Give up on an input after this many transitions.
    #[arg(long)]
    max_steps: Option<usize>,
    /// Print every transition taken.
    #[arg(long)]
    trace: bool,
    /// Print results, diagnostics and the canonical definition as JSON.
    #[arg(long)]
    json: bool,
    /// Print the loaded definition in canonical form before running.
    #[arg(long)]
    canonical: bool,
}

#[derive(serde::Serialize)]
struct Report<'r, 'a> {
    input: &'r str,
    #[serde(flatten)]
    outcome: Outcome<'r, 'a>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome<'r, 'a> {
    Run(&'r Run<'a>),
    StepLimit(usize),
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let src = std::fs::read_to_string(&args.definition)
        .with_context(|| format!("failed to read {}", args.definition.display()))?;

    let mut ctx = Context::new(&src);
    let spec = AutomatonSpec::compile(&mut ctx);
    if args.json {
        eprintln!("{}", serde_json::to_string(ctx.logs())?);
    } else {
        for log in ctx.logs_display() {
            eprint!("{log}");
        }
    }
    let Some(spec) = spec else {
        bail!("{} is not a valid automaton", args.definition.display());
    };

    if args.canonical {
        if args.json {
            println!("{}", serde_json::to_string(&spec)?);
        } else {
            print!("{spec}");
        }
    }

    let inputs = if args.inputs.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read inputs from stdin")?
    } else {
        args.inputs.clone()
    };

    let mut accepted = 0;
    for input in &inputs {
        let run = match args.max_steps {
            Some(max_steps) => dpda::run_bounded(&spec, input, max_steps),
            None => Ok(dpda::run(&spec, input)),
        };

        if args.json {
            let outcome = match &run {
                Ok(run) => Outcome::Run(run),
                Err(err) => Outcome::StepLimit(err.max_steps),
            };
            println!("{}", serde_json::to_string(&Report { input, outcome })?);
        } else {
            match &run {
                Ok(run) if args.trace => println!("{input:?}:\n{run}"),
                Ok(run) => println!("{input:?}: {:?}", run.verdict),
                Err(err) => println!("{input:?}: {err}"),
            }
        }

        if let Ok(Run {
            verdict: Verdict::Accepted,
            ..
        }) = run
        {
            accepted += 1;
        }
    }

    log::info!("{accepted}/{} inputs accepted", inputs.len());
    Ok(())
}
