//! CLI entry point (spec.md §6 "CLI surface"). Thin wrapper over
//! `eyeling::reason`/`eyeling::reason::run_files`: parses flags, wires them
//! into `ReasonOptions`, and maps `ReasonStatus`/`EyelingError` to exit
//! codes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use eyeling::reason::{self, ReasonOptions};

#[derive(Parser)]
#[command(name = "eyeling", version, about = "Forward/backward chaining reasoner for an N3-family rule language")]
struct Cli {
    /// N3 documents to reason over.
    files: Vec<PathBuf>,

    /// Emit the parsed AST (document triples/rules) and exit, without reasoning.
    #[arg(long)]
    ast: bool,

    /// Rewrite dereferenced `http://` IRIs to `https://` before fetching.
    #[arg(long)]
    enforce_https: bool,

    /// Include a `log:trace`-style proof comment alongside derived triples.
    #[arg(long, overrides_with = "no_proof_comments")]
    proof_comments: bool,

    /// Suppress proof comments (the default).
    #[arg(long, overrides_with = "proof_comments")]
    no_proof_comments: bool,

    /// Print concatenated `log:outputString` values ordered by subject key.
    #[arg(long)]
    strings: bool,

    /// Disable every built-in except `log:implies`/`log:impliedBy`.
    #[arg(long)]
    super_restricted: bool,

    /// Emit derived triples as they are produced instead of only the final closure.
    #[arg(long)]
    stream: bool,

    /// Verbose logging (`-v`, `-vv` for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.ast {
        return run_ast(&cli);
    }

    let opts_template = || ReasonOptions {
        enforce_https: cli.enforce_https,
        proof: cli.proof_comments,
        include_input_facts_in_closure: true,
        super_restricted: cli.super_restricted,
        deterministic_skolem: false,
        max_results: None,
    };

    if cli.files.is_empty() {
        eprintln!("eyeling: no input files given");
        return ExitCode::from(1);
    }

    if cli.strings {
        return run_strings(&cli, opts_template);
    }

    if cli.stream {
        return run_stream(&cli, opts_template);
    }

    let file_names: Vec<String> = cli.files.iter().map(|p| p.display().to_string()).collect();
    let code = reason::run_files(&file_names, opts_template);
    ExitCode::from(code as u8)
}

fn run_ast(cli: &Cli) -> ExitCode {
    let mut overall = 0;
    for path in &cli.files {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("eyeling: {}: {}", path.display(), e);
                overall = overall.max(1);
                continue;
            }
        };
        let config = eyeling::config::ReasonerConfig::default();
        let mut run = eyeling::config::RunState::new(config);
        match eyeling::parser::parse_document(&text, &mut run) {
            Ok(doc) => {
                let env = eyeling::printer::PrefixEnv::new(doc.prefixes.clone());
                println!("{}", eyeling::printer::print_closure(&doc.facts, &env, &run.interner));
                for rule in &doc.forward_rules {
                    println!("# forward rule {} (fuse={})", rule.id, rule.is_fuse);
                }
                for rule in &doc.backward_rules {
                    println!("# backward rule {}", rule.id);
                }
            }
            Err(e) => {
                eprintln!("eyeling: {}: {}", path.display(), e);
                overall = overall.max(e.exit_code());
            }
        }
    }
    ExitCode::from(overall as u8)
}

fn run_strings(cli: &Cli, opts_template: impl Fn() -> ReasonOptions) -> ExitCode {
    let mut overall = 0;
    for path in &cli.files {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("eyeling: {}: {}", path.display(), e);
                overall = overall.max(1);
                continue;
            }
        };
        match reason::reason(&text, opts_template()) {
            Ok(mut out) => {
                overall = overall.max(out.status.exit_code());
                for s in reason::sorted_output_strings(&mut out.engine) {
                    print!("{s}");
                }
            }
            Err(e) => {
                eprintln!("eyeling: {}: {}", path.display(), e);
                overall = overall.max(e.exit_code());
            }
        }
    }
    ExitCode::from(overall as u8)
}

/// `--stream`: prints each derived triple in firing order (spec.md §6) as
/// soon as reasoning finishes, rather than the final closure's fact-set
/// order. The engine runs to completion synchronously either way (spec.md
/// §9 "Coroutines and control flow" permits a synchronous engine-to-host
/// interface); this only changes which order the host sees results in.
fn run_stream(cli: &Cli, opts_template: impl Fn() -> ReasonOptions) -> ExitCode {
    let mut overall = 0;
    for path in &cli.files {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("eyeling: {}: {}", path.display(), e);
                overall = overall.max(1);
                continue;
            }
        };
        match reason::reason(&text, opts_template()) {
            Ok(out) => {
                overall = overall.max(out.status.exit_code());
                let env = eyeling::printer::PrefixEnv::new(out.prefixes.clone());
                for derived in &out.derived {
                    println!("{}", eyeling::printer::print_triple(&derived.conclusion, &env, &out.engine.run.interner));
                }
            }
            Err(e) => {
                eprintln!("eyeling: {}: {}", path.display(), e);
                overall = overall.max(e.exit_code());
            }
        }
    }
    ExitCode::from(overall as u8)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
