use anyhow::{bail, Context, Result};
use clap::Parser;
use rebound_core::{Env, Strengthen};
use rebound_lc::{
    dump_term, eval, evaluate, nf, nf_env, normalize, parse_term, run_with, step, step_value,
    whnf, EvalConfig, Term,
};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Normalize, evaluate, and strengthen lambda terms.
#[derive(clap::Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// The main command to run.
    #[command(subcommand)]
    subcommand: Subcommand,

    /// The global options.
    #[clap(flatten)]
    global: GlobalArgs,
}

/// Global configuration options.
#[derive(clap::Args, Debug)]
struct GlobalArgs {
    /// Log evaluation at debug level.
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    /// Log everything, including each forced substitution.
    #[arg(long = "debug", global = true)]
    debug: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Subcommand {
    /// Reduce a term to normal form, under binders too.
    Nf(NfArgs),
    /// Evaluate a term to a value, call by value.
    Eval(EvalArgs),
    /// Reduce the head of a term, call by name.
    Whnf(WhnfArgs),
    /// Print every intermediate term of a reduction.
    Trace(TraceArgs),
    /// Remove unused free variables from a term.
    Strengthen(StrengthenArgs),
}

/// Where the term comes from.
#[derive(clap::Args, Debug)]
struct TermArgs {
    /// The term, e.g. `(λ %x → %x) !0`.
    term: Option<String>,

    /// Read the term from a file instead.
    #[arg(long)]
    file: Option<PathBuf>,

    /// The number of free variables, written `!0` and up.
    #[arg(long, default_value_t = 0)]
    scope: usize,
}

#[derive(clap::Args, Debug)]
struct LimitArgs {
    /// Give up after this many steps.
    #[arg(long)]
    max_steps: Option<usize>,

    /// A JSON file of evaluator settings.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum NfStrategy {
    /// Substitute into binders as they are reduced.
    Subst,
    /// Carry an environment, never building substituted bodies.
    Env,
    /// Iterate single normal order steps.
    Step,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EvalStrategy {
    BigStep,
    SmallStep,
}

#[derive(clap::Args, Debug)]
struct NfArgs {
    #[clap(flatten)]
    input: TermArgs,

    #[arg(long, value_enum, default_value = "subst")]
    strategy: NfStrategy,

    #[clap(flatten)]
    limit: LimitArgs,
}

#[derive(clap::Args, Debug)]
struct EvalArgs {
    #[clap(flatten)]
    input: TermArgs,

    #[arg(long, value_enum, default_value = "big-step")]
    strategy: EvalStrategy,

    #[clap(flatten)]
    limit: LimitArgs,
}

#[derive(clap::Args, Debug)]
struct WhnfArgs {
    #[clap(flatten)]
    input: TermArgs,
}

#[derive(clap::Args, Debug)]
struct TraceArgs {
    #[clap(flatten)]
    input: TermArgs,

    /// Trace call by value evaluation instead of normalization.
    #[arg(long)]
    value: bool,

    #[clap(flatten)]
    limit: LimitArgs,
}

#[derive(clap::Args, Debug)]
struct StrengthenArgs {
    #[clap(flatten)]
    input: TermArgs,

    /// How many of the innermost free variables to remove.
    #[arg(long)]
    remove: usize,
}

impl TermArgs {
    fn read(&self) -> Result<Term> {
        let source = match (&self.term, &self.file) {
            (Some(term), None) => term.clone(),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            (Some(_), Some(_)) => bail!("pass either a term or --file, not both"),
            (None, None) => bail!("no term given"),
        };
        parse_term(&source, self.scope)
            .with_context(|| format!("failed to parse `{}`", source.trim()))
    }
}

impl LimitArgs {
    fn config(&self) -> Result<EvalConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("invalid settings in {}", path.display()))?
            }
            None => EvalConfig::default(),
        };
        if let Some(max_steps) = self.max_steps {
            config.max_steps = max_steps;
        }
        Ok(config)
    }
}

fn init_tracing(global: &GlobalArgs) {
    let default = if global.debug {
        "trace"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.global);
    tracing::debug!(?args, "parsed arguments");
    let result = match &args.subcommand {
        Subcommand::Nf(nf_args) => cmd_nf(nf_args),
        Subcommand::Eval(eval_args) => cmd_eval(eval_args),
        Subcommand::Whnf(whnf_args) => cmd_whnf(whnf_args),
        Subcommand::Trace(trace_args) => cmd_trace(trace_args),
        Subcommand::Strengthen(strengthen_args) => cmd_strengthen(strengthen_args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_nf(args: &NfArgs) -> Result<()> {
    let term = args.input.read()?;
    let result = match args.strategy {
        NfStrategy::Subst => nf(&term)?,
        NfStrategy::Env => nf_env(&Env::identity(args.input.scope), &term)?,
        NfStrategy::Step => normalize(&term, &args.limit.config()?)?,
    };
    dump_term(&result);
    Ok(())
}

fn cmd_eval(args: &EvalArgs) -> Result<()> {
    let term = args.input.read()?;
    let result = match args.strategy {
        EvalStrategy::BigStep => eval(&term)?,
        EvalStrategy::SmallStep => evaluate(&term, &args.limit.config()?)?,
    };
    dump_term(&result);
    Ok(())
}

fn cmd_whnf(args: &WhnfArgs) -> Result<()> {
    let term = args.input.read()?;
    dump_term(&whnf(&term)?);
    Ok(())
}

fn cmd_trace(args: &TraceArgs) -> Result<()> {
    let term = args.input.read()?;
    let config = args.limit.config()?;
    let print = |n: usize, t: &Term| println!("{n}: {t}");
    print(0, &term);
    if args.value {
        run_with(&term, &config, step_value, print)?;
    } else {
        run_with(&term, &config, step, print)?;
    }
    Ok(())
}

fn cmd_strengthen(args: &StrengthenArgs) -> Result<()> {
    let scope = args.input.scope;
    if args.remove > scope {
        bail!("cannot remove {} variables from a scope of {scope}", args.remove);
    }
    let term = args.input.read()?;
    let result = term
        .strengthen(args.remove, scope - args.remove)
        .with_context(|| format!("the term uses one of the innermost {} variables", args.remove))?;
    dump_term(&result);
    Ok(())
}
