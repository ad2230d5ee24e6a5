use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use nv2avsh_rs::diff;
use nv2avsh_rs::disasm::{self, Disassembly};
use nv2avsh_rs::encoded::EncodedInstruction;

mod model;
use model::load_hex_text;

#[derive(Parser, Debug)]
#[command(author, version, about = "nv2a vertex shader disassembler CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Disassemble a hex-text machine code listing
    Disasm {
        /// Input listing (comma/whitespace separated 0x words)
        input: PathBuf,
        /// Append a per-field explanation to every instruction
        #[arg(long)]
        explain: bool,
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Compare two machine code listings field by field
    Diff {
        expected: PathBuf,
        actual: PathBuf,
        /// Skip the FINAL flag (partial-program comparison)
        #[arg(long)]
        ignore_final: bool,
    },
    /// Dump every field of each instruction
    Explain {
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, serde::Serialize)]
struct InstructionOut {
    words: [u32; 4],
    text: String,
    #[serde(flatten)]
    units: Disassembly,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Disasm {
            input,
            explain,
            format,
            out,
        } => run_disasm(&input, explain, format, out.as_deref()),
        Command::Diff {
            expected,
            actual,
            ignore_final,
        } => run_diff(&expected, &actual, ignore_final),
        Command::Explain { input } => run_explain(&input),
    }
}

fn run_disasm(
    input: &std::path::Path,
    explain: bool,
    format: OutputFormat,
    out: Option<&std::path::Path>,
) -> Result<()> {
    let program = load_hex_text(input)?;

    let mut decoded = Vec::with_capacity(program.len());
    for words in &program {
        let ins = EncodedInstruction::from_words(words)?;
        let units = disasm::disassemble_instruction(&ins)?;
        decoded.push((ins, units));
    }

    let rendered = match format {
        OutputFormat::Text => {
            let mut lines = Vec::with_capacity(decoded.len());
            for (ins, units) in &decoded {
                let mut line = units.render();
                if explain {
                    line.push_str("\n/*");
                    line.push_str(&ins.explain());
                    line.push_str("\n*/");
                }
                lines.push(line);
            }
            lines.join("\n")
        }
        OutputFormat::Json => {
            let entries: Vec<InstructionOut> = decoded
                .into_iter()
                .map(|(ins, units)| InstructionOut {
                    words: ins.words(),
                    text: units.render(),
                    units,
                })
                .collect();
            serde_json::to_string_pretty(&entries)?
        }
    };

    match out {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn run_diff(expected: &std::path::Path, actual: &std::path::Path, ignore_final: bool) -> Result<()> {
    let expected_program = load_hex_text(expected)?;
    let actual_program = load_hex_text(actual)?;
    if expected_program.len() != actual_program.len() {
        bail!(
            "Instruction counts differ: expected {} but actual has {}",
            expected_program.len(),
            actual_program.len()
        );
    }

    let mut mismatches = 0usize;
    for (index, (expected, actual)) in expected_program
        .iter()
        .zip(actual_program.iter())
        .enumerate()
    {
        if let Some(report) = diff::report(expected, actual, ignore_final)? {
            mismatches += 1;
            println!("[{index}] {report}");
        }
    }

    if mismatches > 0 {
        bail!("{mismatches} instruction(s) differ");
    }
    println!("Listings are identical.");
    Ok(())
}

fn run_explain(input: &std::path::Path) -> Result<()> {
    for words in load_hex_text(input)? {
        println!("{}", diff::explain(&words)?);
    }
    Ok(())
}
