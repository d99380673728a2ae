use anyhow::{bail, Context, Result};
use clap::Parser;
use logic_mill::{
    machine::DEFAULT_WINDOW, Config, MachineError, Program, ProgramLoader, ProgramManager,
    RunReport, Session,
};
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Exit status reported when the machine gets stuck.
const EXIT_STUCK: u8 = 2;

/// A single-tape Turing machine simulator.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  mill programs/find-end.tm --tape '||||'
  mill --builtin binary-increment --trace
  cat programs/unary-addition.tm | mill --tape '||+|||'")]
struct Cli {
    /// Path to a rule file. If omitted, rules are read from stdin when it is piped.
    rules_file: Option<PathBuf>,

    /// The initial tape. Defaults to the built-in program's tape, or an empty tape.
    #[clap(short, long)]
    tape: Option<String>,

    /// Run one of the built-in programs instead of a rule file.
    #[clap(short, long, conflicts_with = "rules_file")]
    builtin: Option<String>,

    /// List the built-in programs and exit.
    #[clap(long)]
    list: bool,

    /// Stop after this many steps if the machine has not halted.
    #[clap(short, long)]
    max_steps: Option<usize>,

    /// Name of the initial state.
    #[clap(long)]
    init: Option<String>,

    /// Name of the halt state.
    #[clap(long)]
    halt: Option<String>,

    /// The blank symbol.
    #[clap(long)]
    blank: Option<char>,

    /// JSON file overriding the default symbols and limits.
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Print the tape after every step.
    #[clap(long, conflicts_with = "interactive")]
    trace: bool,

    /// Step through the machine one command at a time.
    #[clap(short, long)]
    interactive: bool,

    /// Blank cells shown around the tape when rendering (capped at the tape length limit).
    #[clap(long, default_value_t = DEFAULT_WINDOW)]
    window: usize,

    /// Increase log verbosity (-v debug, -vv trace).
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    if cli.list {
        list_programs();
        return Ok(ExitCode::SUCCESS);
    }

    let config = build_config(cli)?;
    let (program, default_tape) = load_program(cli, &config)?;
    let tape = cli.tape.clone().unwrap_or(default_tape);

    let started = Instant::now();
    let mut session = program.session(&tape, cli.interactive)?;
    if let Some(max_steps) = cli.max_steps {
        session.set_max_steps(max_steps);
    }

    let outcome = if cli.interactive {
        interactive(&mut session, cli.window)
    } else if cli.trace {
        trace(&mut session, cli.window)
    } else {
        session.run().map(drop).map_err(Into::into)
    };
    let elapsed = started.elapsed();

    let report = session.machine().report();
    print_results(&report, elapsed);

    match outcome {
        Ok(()) => {
            if session.at_ceiling() {
                println!(
                    "\nStopped at the step ceiling ({}) without halting",
                    session.max_steps()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => match e.downcast_ref::<MachineError>() {
            Some(err) if err.is_stuck() => {
                eprintln!("\nMachine stuck: {}", err);
                Ok(ExitCode::from(EXIT_STUCK))
            }
            _ => Err(e),
        },
    }
}

/// Applies the config file and command-line overrides on top of the defaults.
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(init) = &cli.init {
        config.init_state.clone_from(init);
    }
    if let Some(halt) = &cli.halt {
        config.halt_state.clone_from(halt);
    }
    if let Some(blank) = cli.blank {
        config.blank = blank;
    }

    config.validate()?;
    Ok(config)
}

/// Loads the program from a built-in, a file, or stdin, and returns it with its default tape.
fn load_program(cli: &Cli, config: &Config) -> Result<(Program, String)> {
    if let Some(name) = &cli.builtin {
        let Some(builtin) = ProgramManager::get_builtin_by_name(name) else {
            bail!(
                "Unknown built-in program '{}'. Available: {}",
                name,
                ProgramManager::list_program_names().join(", ")
            );
        };
        let program = Program::new(builtin.rules, config.clone())
            .with_context(|| format!("Failed to load built-in program '{}'", name))?;
        return Ok((program, builtin.tape.to_string()));
    }

    if let Some(path) = &cli.rules_file {
        let program = ProgramLoader::load_program(path, config)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?;
        return Ok((program, String::new()));
    }

    if atty::isnt(atty::Stream::Stdin) {
        if cli.interactive {
            bail!("Interactive mode reads commands from stdin; pass the rules as a file");
        }

        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read rules from stdin")?;
        let program = ProgramLoader::load_program_from_string(&buffer, config)
            .context("Failed to load rules from stdin")?;
        return Ok((program, String::new()));
    }

    bail!("No rules given: pass a rule file, pipe rules on stdin, or use --builtin")
}

fn list_programs() {
    for index in 0..ProgramManager::count() {
        if let Some(info) = ProgramManager::get_program_info(index) {
            println!(
                "{:<18} {:<46} tape: {:<8} states: {:<3} rules: {}",
                info.name,
                info.description,
                format!("'{}'", info.initial_tape),
                info.state_count,
                info.transition_count
            );
        }
    }
}

/// Runs to completion, printing the tape after every step.
fn trace(session: &mut Session, window: usize) -> Result<()> {
    println!("{}\n", session.machine().render(window));

    while session.step()?.is_some() {
        let machine = session.machine();
        println!("Step {}", machine.step_count());
        println!("{}\n", machine.render(window));

        if machine.is_halted() {
            println!("HALTED after {} steps", machine.step_count());
            break;
        }
    }

    Ok(())
}

/// Steps through the machine, reading one command per line from stdin.
fn interactive(session: &mut Session, window: usize) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("Turing machine initialized:");
    println!("{}\n", session.machine().render(window));

    loop {
        if session.machine().is_halted() {
            println!("HALTED after {} steps", session.machine().step_count());
            return Ok(());
        }
        if session.at_ceiling() {
            return Ok(());
        }

        print!("[Enter] step | N: step N times | b N: back to step N | r: reset | q: quit > ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line.context("Failed to read command")?;

        match parse_command(&line) {
            Command::Step(n) => {
                session.step_n(n)?;
            }
            Command::Back(index) => {
                if !session.rewind(index) {
                    println!("No snapshot for step {}", index);
                    continue;
                }
                if let Some(history) = session.history() {
                    let (previous, next) = history.neighbours(index);
                    println!(
                        "Rewound to step {} (previous: {}, next: {})",
                        index,
                        previous.unwrap_or("--"),
                        next.unwrap_or("--")
                    );
                }
            }
            Command::Reset => session.reset(),
            Command::Quit => {
                println!("Machine stopped manually");
                return Ok(());
            }
            Command::Unknown(input) => {
                println!("Unrecognized command: {:?}", input);
                continue;
            }
        }

        println!("{}\n", session.machine().render(window));
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    Step(usize),
    Back(usize),
    Reset,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();

    match line {
        "" => Command::Step(1),
        "q" => Command::Quit,
        "r" => Command::Reset,
        _ => {
            if let Ok(n) = line.parse::<usize>() {
                return Command::Step(n);
            }
            match line.strip_prefix('b').map(|rest| rest.trim().parse::<usize>()) {
                Some(Ok(index)) => Command::Back(index),
                _ => Command::Unknown(line.to_string()),
            }
        }
    }
}

fn print_results(report: &RunReport, elapsed: Duration) {
    println!("Result Tape: '{}'", report.tape);
    println!("Steps Count: {}", report.steps);
    println!("Total Rules: {}", report.rules);
    println!();
    println!("   Time run: {:.5}s", elapsed.as_secs_f64());
    println!(
        "Memory used: {}",
        memory_used(memory_stats::memory_stats().map(|stats| stats.physical_mem))
    );
}

/// Resident memory in megabytes, or `n/a` where the platform does not report it.
fn memory_used(physical_bytes: Option<usize>) -> String {
    match physical_bytes {
        Some(bytes) => format!("{:.2}MB", bytes as f64 / (1024.0 * 1024.0)),
        None => "n/a".to_string(),
    }
}
