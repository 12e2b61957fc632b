use clap::Parser;
use pda::{
    FuzzDriver, PdaError, Program, ProgramLoader, ProgramManager, PushdownMachine, TraceStep,
    WordEnumerator,
};
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Runs words through a deterministic pushdown automaton.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  pda-cli programs/anbn.pda -i ab -i aab
  pda-cli programs/anbn.pda -i aabb --trace
  pda-cli --builtin 'Balanced brackets' --fuzz --max-len 8
  cat programs/anbn.pda | pda-cli -i ab")]
struct Cli {
    /// Path to a program file (.pda). Program content can also be piped via stdin.
    program_file: Option<String>,

    /// Use one of the built-in programs, by name
    #[clap(short, long, conflicts_with = "program_file")]
    builtin: Option<String>,

    /// List the built-in programs and exit
    #[clap(long)]
    list: bool,

    /// A word to run; repeat for several words
    #[clap(short, long)]
    input: Vec<String>,

    /// Print every step of each run
    #[clap(short, long)]
    trace: bool,

    /// Search all words up to --max-len for accepted ones
    #[clap(short, long)]
    fuzz: bool,

    /// Longest word the search tries
    #[clap(long, default_value_t = 8)]
    max_len: usize,

    /// Time budget of the search in milliseconds
    #[clap(long, default_value_t = 1000)]
    budget_ms: u64,

    /// Print results as JSON
    #[clap(long)]
    json: bool,

    /// Log engine activity to stderr
    #[clap(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if cli.list {
        for (i, name) in ProgramManager::list_program_names().iter().enumerate() {
            println!("{i}: {name}");
        }
        return;
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), PdaError> {
    let program = load_program(cli)?;
    let mut machine = PushdownMachine::from_program(&program)?;

    for word in &cli.input {
        machine.reset();

        if cli.trace {
            let steps = machine.step_through(word)?;
            print_trace(cli, word, &steps);
        } else {
            let accepted = machine.accepts(word)?;
            print_decision(cli, word, accepted);
        }
    }

    if cli.fuzz {
        let words = WordEnumerator::new(&program.alphabet, cli.max_len);
        let budget = Duration::from_millis(cli.budget_ms);

        if cli.json {
            let report = FuzzDriver::new(budget).collect(&mut machine, words)?;
            println!("{}", to_json(&report));
        } else {
            let summary = FuzzDriver::new(budget).run(&mut machine, words, |word| {
                println!("{}", display_word(word))
            })?;
            println!("{} ({} words tested)", summary.status, summary.tested);
        }
    }

    Ok(())
}

/// Loads the program from a file, from stdin, or from the built-in registry.
fn load_program(cli: &Cli) -> Result<Program, PdaError> {
    if let Some(file_path) = &cli.program_file {
        ProgramLoader::load_program(Path::new(file_path))
    } else if let Some(name) = &cli.builtin {
        ProgramManager::get_program_by_name(name)
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| PdaError::FileError(format!("Failed to read from stdin: {}", e)))?;
        ProgramLoader::load_program_from_string(&buffer)
    } else {
        Err(PdaError::FileError(
            "No program given; pass a file, pipe one via stdin, or use --builtin".to_string(),
        ))
    }
}

fn print_decision(cli: &Cli, word: &str, accepted: bool) {
    if cli.json {
        println!(
            "{}",
            to_json(&serde_json::json!({ "word": word, "accepted": accepted }))
        );
    } else {
        let verdict = if accepted { "accept" } else { "reject" };
        println!("{}: {}", display_word(word), verdict);
    }
}

fn print_trace(cli: &Cli, word: &str, steps: &[TraceStep]) {
    if cli.json {
        println!(
            "{}",
            to_json(&serde_json::json!({ "word": word, "trace": steps }))
        );
        return;
    }

    println!("{}:", display_word(word));
    for step in steps {
        println!(
            "  {:<8} {:<12} {:<16} {}",
            step.state,
            display_word(&step.remaining),
            step.stack,
            step.annotation
        );
    }
}

fn display_word(word: &str) -> &str {
    if word.is_empty() {
        "ε"
    } else {
        word
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}
