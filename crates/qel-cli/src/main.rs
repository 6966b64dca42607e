use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use qel_core::{Attributes, Deadline, QuestionData};
use qel_expr::{describe, parse, ParseOptions};
use qel_fsm::{grade_fsm, Automaton, FsmKind};
use qel_grade::{element_for, run_phase, GradingConfig, Phase, ELEMENT_TAGS};
use qel_symbolic::{compare, EquivalenceOptions};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "qel", about = "Question element lifecycle driver")]
struct Cli {
    /// YAML file overriding the default grading limits.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one lifecycle phase of an element against a question state.
    Run(RunArgs),
    /// Parse an expression and optionally compare it with a reference.
    CheckExpr(CheckExprArgs),
    /// Grade one automaton against another.
    FsmCompare(FsmCompareArgs),
    /// List the supported element tags.
    Tags,
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// Phase to run: prepare, parse, grade, test or format-answer.
    phase: Phase,
    /// JSON file holding the element attributes (`tag` and `values`).
    #[arg(long)]
    element: PathBuf,
    /// JSON file holding the question state; omitted means an empty state.
    #[arg(long)]
    data: Option<PathBuf>,
    /// Write the resulting state here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct CheckExprArgs {
    /// Expression text.
    text: String,
    /// Comma separated variable names.
    #[arg(long, default_value = "")]
    variables: String,
    /// Reference expression to compare against.
    #[arg(long)]
    reference: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct FsmCompareArgs {
    /// DFA or NFA.
    #[arg(long, default_value = "DFA")]
    kind: FsmKind,
    /// Reference automaton JSON.
    reference: PathBuf,
    /// Submitted automaton JSON.
    submitted: PathBuf,
    /// State cap of the submitted machine.
    #[arg(long)]
    max_states: Option<usize>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => GradingConfig::load(path)?,
        None => GradingConfig::default(),
    };
    init_logging(&config.log_level);
    match cli.command {
        Command::Run(args) => run_element(&args, &config),
        Command::CheckExpr(args) => check_expr(&args, &config),
        Command::FsmCompare(args) => fsm_compare(&args, &config),
        Command::Tags => {
            let mut stdout = io::stdout().lock();
            for tag in ELEMENT_TAGS {
                writeln!(stdout, "{tag}")?;
            }
            Ok(())
        }
    }
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_element(args: &RunArgs, config: &GradingConfig) -> Result<(), Box<dyn Error>> {
    let attrs: Attributes = read_json(&args.element)?;
    let Some(element) = element_for(&attrs.tag) else {
        return Err(format!("unknown element tag {:?}", attrs.tag).into());
    };
    let mut data: QuestionData = match &args.data {
        Some(path) => read_json(path)?,
        None => QuestionData::default(),
    };
    let limits = config.to_limits();
    info!(phase = %args.phase, tag = %attrs.tag, "running phase");
    let answer = run_phase(args.phase, element.as_ref(), &attrs, &mut data, &limits)?;

    let output = match answer {
        Some(answer) => json!({ "answer": answer, "data": data }),
        None => json!({ "data": data }),
    };
    match &args.out {
        Some(path) => write_json(path, &output),
        None => print_json(&output),
    }
}

fn check_expr(args: &CheckExprArgs, config: &GradingConfig) -> Result<(), Box<dyn Error>> {
    let variables = args
        .variables
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let options = ParseOptions::with_variables(variables).max_length(config.expr.max_length);
    let submitted = match parse(&args.text, &options) {
        Ok(expr) => expr,
        Err(err) => {
            let message = describe(&err, &args.text);
            return print_json(&json!({ "valid": false, "message": message }));
        }
    };
    debug!(expr = %submitted, "parsed");

    let Some(reference) = &args.reference else {
        return print_json(&json!({ "valid": true, "expression": submitted.to_string() }));
    };
    let reference = parse(reference, &options)
        .map_err(|err| format!("reference does not parse: {}", describe(&err, reference)))?;
    let limits = config.to_limits();
    let deadline = Deadline::after(limits.timeout());
    let stage = compare(&reference, &submitted, &deadline, &EquivalenceOptions::from(&limits))?;
    print_json(&json!({
        "valid": true,
        "expression": submitted.to_string(),
        "equivalent": stage.is_equivalent(),
        "stage": format!("{stage:?}"),
    }))
}

fn fsm_compare(args: &FsmCompareArgs, config: &GradingConfig) -> Result<(), Box<dyn Error>> {
    let reference = Automaton::from_json(args.kind, &read_json(&args.reference)?)?;
    let submitted = Automaton::from_json(args.kind, &read_json(&args.submitted)?)?;
    let limits = config.to_limits();
    let deadline = Deadline::after(limits.timeout());
    let grade = grade_fsm(
        &submitted,
        &reference,
        args.max_states,
        limits.fsm_max_length,
        &deadline,
    )?;
    print_json(&grade)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_arguments_parse_phase_names() {
        let cli = Cli::try_parse_from([
            "qel",
            "run",
            "format-answer",
            "--element",
            "element.json",
            "--config",
            "qel.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("qel.yaml")));
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.phase, Phase::FormatAnswer);
                assert!(args.data.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn fsm_kind_is_case_insensitive() {
        let cli = Cli::try_parse_from(["qel", "fsm-compare", "--kind", "nfa", "a.json", "b.json"])
            .unwrap();
        match cli.command {
            Command::FsmCompare(args) => assert_eq!(args.kind, FsmKind::Nfa),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
