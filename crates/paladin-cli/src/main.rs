//! Paladin CLI
//!
//! Command-line interface for:
//! - Compiling and verifying evidence graphs (`compile`, `verify`)
//! - Running individual checks (`classify`, `calc`, `date-after`, `hash`)
//! - Answering questions with a verified proof (`ask`)
//! - Evaluating a document set against labelled questions (`eval`, `card`)
//! - Building document sets from a directory of text files (`build-docs`)
//!
//! JSON results go to stdout (or `-o`); status lines and logs go to stderr.

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use paladin_egl::{compile_json, content_hash, graph_digest, CompileError, EvidenceGraph};
use paladin_pipeline::{
    build_corpus, evaluate_dataset, load_examples, write_documents, Metrics, ProofRunner,
    ReportCard, TfIdfRetriever,
};
use paladin_verifier::{classify_with, date_on_or_after, numeric, Verifier};

mod config;

use config::PaladinConfig;

#[derive(Parser)]
#[command(name = "paladin")]
#[command(
    author,
    version,
    about = "Paladin: proof-carrying answers with verifiable evidence graphs"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// More log output (-v info, -vv debug, -vvv trace). `RUST_LOG` wins.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a graph JSON file and print its canonical form.
    ///
    /// The graph digest is printed on stderr. Schema and validation errors
    /// are listed in full and the command fails.
    Compile {
        /// Input graph JSON
        input: PathBuf,
        /// Write canonical JSON here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Compile and verify a graph; exits with status 1 when the proof is invalid.
    Verify {
        /// Input graph JSON
        input: PathBuf,
        /// Write the verification report here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Classify a premise/hypothesis pair as supported, contradicted or unverifiable.
    Classify { premise: String, hypothesis: String },

    /// Recompute an arithmetic expression and compare its rendering to `expected`.
    Calc {
        #[arg(allow_hyphen_values = true)]
        expression: String,
        #[arg(allow_hyphen_values = true)]
        expected: String,
    },

    /// Is `date` on or after `threshold`? Both use the strftime-style `format`.
    DateAfter {
        date: String,
        format: String,
        threshold: String,
    },

    /// Print the content hash (lowercase hex SHA-256) of a span.
    Hash { text: String },

    /// Answer a question with a proof, verified before it is returned.
    Ask {
        /// Document set JSON (array of {id, text})
        #[arg(long)]
        docs: PathBuf,
        question: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Evaluate the pipeline over a JSONL dataset of {question, answer}.
    Eval {
        #[arg(long)]
        docs: PathBuf,
        #[arg(long)]
        dataset: PathBuf,
    },

    /// Evaluate and write a timestamped report card.
    Card {
        #[arg(long)]
        docs: PathBuf,
        #[arg(long)]
        dataset: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Build a document set from the regular files in a directory.
    BuildDocs { dir: PathBuf, out: PathBuf },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = PaladinConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Compile { input, out } => cmd_compile(&input, out.as_ref())?,
        Commands::Verify { input, out } => {
            if !cmd_verify(&input, out.as_ref(), &config)? {
                std::process::exit(1);
            }
        }
        Commands::Classify {
            premise,
            hypothesis,
        } => cmd_classify(&premise, &hypothesis, &config),
        Commands::Calc {
            expression,
            expected,
        } => cmd_calc(&expression, &expected, &config),
        Commands::DateAfter {
            date,
            format,
            threshold,
        } => cmd_date_after(&date, &format, &threshold)?,
        Commands::Hash { text } => println!("{}", content_hash(&text)),
        Commands::Ask {
            docs,
            question,
            out,
        } => cmd_ask(&docs, &question, out.as_ref(), &config)?,
        Commands::Eval { docs, dataset } => {
            let metrics = run_eval(&docs, &dataset, &config)?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        Commands::Card { docs, dataset, out } => cmd_card(&docs, &dataset, &out, &config)?,
        Commands::BuildDocs { dir, out } => cmd_build_docs(&dir, &out)?,
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn write_or_print(out: Option<&PathBuf>, json: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("{} {}", "Wrote".green().bold(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn load_graph(input: &PathBuf) -> Result<EvidenceGraph> {
    let text =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    compile_json(&text).map_err(|err| {
        report_compile_error(&err);
        anyhow!("{} did not compile", input.display())
    })
}

fn report_compile_error(err: &CompileError) {
    match err {
        CompileError::Schema(e) => eprintln!("{} {}", "schema error:".red().bold(), e),
        CompileError::Validation(e) => {
            eprintln!(
                "{} {} violation(s)",
                "invalid graph:".red().bold(),
                e.violations.len()
            );
            for v in &e.violations {
                eprintln!("  {} {}", "-".red(), v);
            }
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_compile(input: &PathBuf, out: Option<&PathBuf>) -> Result<()> {
    let graph = load_graph(input)?;
    eprintln!(
        "{} {} ({} nodes, {} edges)",
        "Compiled".green().bold(),
        input.display(),
        graph.nodes().len(),
        graph.edges().len()
    );
    eprintln!("  digest: {}", graph_digest(&graph)?.as_str().cyan());
    write_or_print(out, &graph.to_canonical_form().to_json_pretty()?)
}

fn cmd_verify(input: &PathBuf, out: Option<&PathBuf>, config: &PaladinConfig) -> Result<bool> {
    let graph = load_graph(input)?;
    let report = Verifier::new(config.verifier.clone()).verify(&graph);
    write_or_print(out, &serde_json::to_string_pretty(&report)?)?;

    if report.valid {
        eprintln!("{} {}", "Valid.".green().bold(), input.display());
    } else {
        eprintln!(
            "{} {} (failed: {})",
            "Invalid.".red().bold(),
            input.display(),
            report.failed_checks().join(", ")
        );
    }
    Ok(report.valid)
}

fn cmd_classify(premise: &str, hypothesis: &str, config: &PaladinConfig) {
    println!(
        "{}",
        classify_with(&config.verifier.support, premise, hypothesis)
    );
}

fn cmd_calc(expression: &str, expected: &str, config: &PaladinConfig) {
    let limits = &config.verifier.numeric;
    match numeric::evaluate_with(expression, limits) {
        Ok(value) => eprintln!("  value: {}", value.to_string().as_str().cyan()),
        Err(err) => eprintln!("  {} {}", "error:".red(), err),
    }
    println!("{}", numeric::check_with(expression, expected, limits));
}

fn cmd_date_after(date: &str, format: &str, threshold: &str) -> Result<()> {
    println!("{}", date_on_or_after(date, format, threshold)?);
    Ok(())
}

fn build_runner(docs: &PathBuf, config: &PaladinConfig) -> Result<ProofRunner> {
    let retriever = TfIdfRetriever::from_json(docs)?;
    Ok(ProofRunner::new(retriever, config.runner_config())?)
}

fn cmd_ask(
    docs: &PathBuf,
    question: &str,
    out: Option<&PathBuf>,
    config: &PaladinConfig,
) -> Result<()> {
    let runner = build_runner(docs, config)?;
    let result = runner.answer_and_proof(question);
    write_or_print(out, &serde_json::to_string_pretty(&result)?)?;

    let verdict = if result.valid {
        "verified".green().bold()
    } else {
        "unverified".red().bold()
    };
    eprintln!("{} {} [{}]", "Answer:".bold(), result.answer, verdict);
    Ok(())
}

fn run_eval(docs: &PathBuf, dataset: &PathBuf, config: &PaladinConfig) -> Result<Metrics> {
    let runner = build_runner(docs, config)?;
    let examples = load_examples(dataset)?;
    eprintln!(
        "{} {} examples against {}",
        "Evaluating".green().bold(),
        examples.len(),
        docs.display()
    );
    Ok(evaluate_dataset(&runner, &examples))
}

fn cmd_card(docs: &PathBuf, dataset: &PathBuf, out: &PathBuf, config: &PaladinConfig) -> Result<()> {
    let metrics = run_eval(docs, dataset, config)?;
    let card = ReportCard::new(
        docs.display().to_string(),
        dataset.display().to_string(),
        metrics,
    );
    write_or_print(Some(out), &serde_json::to_string_pretty(&card)?)
}

fn cmd_build_docs(dir: &PathBuf, out: &PathBuf) -> Result<()> {
    let docs = build_corpus(dir)?;
    write_documents(out, &docs)?;
    eprintln!(
        "{} {} documents to {}",
        "Wrote".green().bold(),
        docs.len(),
        out.display()
    );
    Ok(())
}
