use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use lark::{encode, AsmParser, RunState, StepOutcome, SymbolTable, Tracer};

/// Lark is an assembler and simulator toolchain for the LC-2K assembly language.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.as` or `.mc` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a `.as` source file into a `.mc` machine-code file
    Asm {
        /// Assembly source file
        #[arg(default_value = "input.as")]
        source: PathBuf,
        /// Destination machine-code file
        #[arg(default_value = "output.mc")]
        dest: PathBuf,
    },
    /// Run a text `.as` or machine-code `.mc` file, tracing every step
    Run {
        /// `.as` or `.mc` file to run
        #[arg(default_value = "output.mc")]
        program: PathBuf,
        /// Suppress per-step console output (the log still receives it)
        #[arg(short, long)]
        quiet: bool,
        /// File that receives a copy of the execution trace
        #[arg(short, long, default_value = "result.txt")]
        log: PathBuf,
    },
    /// Check a `.as` file without running or producing machine code
    Check {
        /// File to check
        #[arg(default_value = "input.as")]
        source: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(lark::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    match args.command {
        Some(Command::Asm { source, dest }) => {
            file_message(Green, "Assembling", &source);
            let contents = fs::read_to_string(&source).into_diagnostic()?;
            let words = assemble(&contents)?;

            // The file is only created once the whole program has encoded
            let mut file = BufWriter::new(File::create(&dest).into_diagnostic()?);
            for word in &words {
                writeln!(file, "{word}").into_diagnostic()?;
            }
            file.flush().into_diagnostic()?;

            message(Green, "Finished", &format!("assembled {} words", words.len()));
            file_message(Green, "Saved", &dest);
            Ok(())
        }
        Some(Command::Run { program, quiet, log }) => run(&program, quiet, &log),
        Some(Command::Check { source }) => {
            file_message(Green, "Checking", &source);
            let contents = fs::read_to_string(&source).into_diagnostic()?;
            let _ = assemble(&contents)?;
            message(Green, "Success", "no errors found!");
            Ok(())
        }
        None => {
            if let Some(path) = args.path {
                run(&path, false, Path::new("result.txt"))
            } else {
                println!("\n~ lark v{VERSION} ~");
                println!("{SHORT_INFO}");
                Ok(())
            }
        }
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    message(color, left, &format!("target {}", right.display()));
}

fn message(color: MsgColor, left: &str, right: &str) {
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn run(name: &Path, quiet: bool, log: &Path) -> Result<()> {
    let words = match name.extension().and_then(|ext| ext.to_str()) {
        Some("as") => {
            file_message(MsgColor::Green, "Assembling", name);
            let contents = fs::read_to_string(name).into_diagnostic()?;
            assemble(&contents)?
        }
        Some("mc") => {
            file_message(MsgColor::Green, "Loading", name);
            let contents = fs::read_to_string(name).into_diagnostic()?;
            RunState::parse_image(&contents)?
        }
        _ => bail!("File must have a .as or .mc extension. Exiting..."),
    };

    let mut state = RunState::try_from(&words)?;
    let mut tracer = Tracer::new(
        BufWriter::new(File::create(log).into_diagnostic()?),
        !quiet,
    );

    message(MsgColor::Green, "Running", "loaded program");
    let outcome = state.run(&mut tracer).into_diagnostic()?;
    tracer.flush().into_diagnostic()?;

    match outcome {
        StepOutcome::Halted => {
            file_message(MsgColor::Green, "Completed", name);
            Ok(())
        }
        StepOutcome::StepLimit => bail!("Program exceeded the step limit without halting"),
        StepOutcome::Continue => unreachable!("run only returns terminal outcomes"),
    }
}

/// Assemble source text into machine words: parse, collect symbols, encode.
fn assemble(contents: &str) -> Result<Vec<u32>> {
    let lines = AsmParser::new(contents).parse()?;
    let symbols = SymbolTable::build(&lines, contents)?;
    encode(&lines, &symbols, contents)
}

const SHORT_INFO: &str = r"
Welcome to lark (from LC-2K Assembler & Runtime Kit),
a two-part toolchain for assembling and simulating LC-2K assembly programs.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
