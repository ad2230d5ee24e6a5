use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use nv2avsh_rs::builder::{
    Assembler, MacroInvocation, Program, RawOperation, Statement, UniformDecl, UniformKind,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Assemble nv2a vertex shader source into machine code"
)]
struct Opts {
    /// Input assembly file
    input: PathBuf,
    /// Output binary file (little-endian machine code words)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Write the listing to a file (defaults to stdout when no binary
    /// output is requested)
    #[arg(long)]
    listing: Option<PathBuf>,
    /// Listing format: the C-style text listing or JSON
    #[arg(long, value_enum, default_value_t = ListingFormat::Text)]
    format: ListingFormat,
    /// Set the final flag on the last instruction instead of appending a
    /// terminator
    #[arg(long)]
    inline_final: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ListingFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct ListingEntry<'a> {
    words: [u32; 4],
    source: Option<&'a str>,
}

fn render_listing(program: &Program, format: ListingFormat) -> Result<String> {
    match format {
        ListingFormat::Text => Ok(program.c_listing()),
        ListingFormat::Json => {
            let entries: Vec<ListingEntry<'_>> = program
                .instructions
                .iter()
                .enumerate()
                .map(|(index, ins)| ListingEntry {
                    words: ins.words(),
                    source: program.listing.get(index).map(String::as_str),
                })
                .collect();
            Ok(serde_json::to_string_pretty(&entries)?)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let text = fs::read_to_string(&opts.input)?;
    let statements = parse_source(&text)?;

    let program = Assembler::new().assemble(&statements, opts.inline_final)?;

    if let Some(path) = &opts.output {
        fs::write(path, program.to_le_bytes())?;
    }
    let listing = render_listing(&program, opts.format)?;
    match &opts.listing {
        Some(path) => fs::write(path, listing)?,
        None if opts.output.is_none() => println!("{listing}"),
        None => {}
    }
    Ok(())
}

/// Line-based front-end for the statement surface: `#name vector|matrix4 N`
/// uniform declarations, `%macro` invocations, and operations optionally
/// joined by top-level `+` markers (leading `+` continues the previous
/// line's group).
fn parse_source(text: &str) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    let mut in_block_comment = false;

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = (index + 1) as u32;
        let stripped = strip_comments(raw_line, &mut in_block_comment);
        let line = stripped.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix('#') {
            statements.push(parse_uniform(rest, line_no)?);
            continue;
        }
        if let Some(rest) = line.strip_prefix('%') {
            statements.push(parse_macro(rest, line_no)?);
            continue;
        }

        let (mut combine, rest) = match line.strip_prefix('+') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, line),
        };
        for (column, chunk) in split_top_level_plus(rest) {
            statements.push(parse_operation(&chunk, combine, line_no, column)?);
            combine = true;
        }
    }

    Ok(statements)
}

fn parse_uniform(rest: &str, line: u32) -> Result<Statement> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let [name, kind, index] = parts.as_slice() else {
        return Err(anyhow!(
            "line {line}: uniform declaration must be '#name vector|matrix4 N'"
        ));
    };
    let kind = UniformKind::from_keyword(kind)
        .ok_or_else(|| anyhow!("line {line}: unknown uniform kind '{kind}'"))?;
    let index = index
        .parse::<u32>()
        .map_err(|_| anyhow!("line {line}: bad uniform index '{index}'"))?;
    Ok(Statement::Uniform(UniformDecl {
        name: name.to_string(),
        kind,
        index,
        line,
    }))
}

fn parse_macro(rest: &str, line: u32) -> Result<Statement> {
    let cleaned = rest.replace(',', " ");
    let mut parts = cleaned.split_whitespace();
    let name = parts
        .next()
        .ok_or_else(|| anyhow!("line {line}: empty macro invocation"))?;
    Ok(Statement::Macro(MacroInvocation {
        name: name.to_string(),
        operands: parts.map(str::to_string).collect(),
        line,
        column: 1,
    }))
}

fn parse_operation(chunk: &str, combine: bool, line: u32, column: u32) -> Result<Statement> {
    let chunk = chunk.trim();
    let (mnemonic, rest) = match chunk.split_once(char::is_whitespace) {
        Some(split) => split,
        None => (chunk, ""),
    };
    if mnemonic.is_empty() {
        return Err(anyhow!("line {line}: empty operation"));
    }
    let operands = rest
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    Ok(Statement::Operation(RawOperation {
        mnemonic: mnemonic.to_string(),
        operands,
        combine_with_previous: combine,
        line,
        column,
    }))
}

/// Removes `//`, `;` and `/* */` comments; block comments may span lines.
fn strip_comments(mut line: &str, in_block_comment: &mut bool) -> String {
    let mut out = String::new();
    loop {
        if *in_block_comment {
            match line.find("*/") {
                Some(end) => {
                    line = &line[end + 2..];
                    *in_block_comment = false;
                }
                None => return out,
            }
            continue;
        }

        let line_comment = [line.find("//"), line.find(';')].into_iter().flatten().min();
        let block_comment = line.find("/*");
        match (line_comment, block_comment) {
            (Some(lc), Some(bc)) if bc < lc => {
                out.push_str(&line[..bc]);
                line = &line[bc + 2..];
                *in_block_comment = true;
            }
            (Some(lc), _) => {
                out.push_str(&line[..lc]);
                return out;
            }
            (None, Some(bc)) => {
                out.push_str(&line[..bc]);
                line = &line[bc + 2..];
                *in_block_comment = true;
            }
            (None, None) => {
                out.push_str(line);
                return out;
            }
        }
    }
}

/// Splits on `+` outside brackets, so `c[A0+12]` stays whole. Returns the
/// 1-based column of each chunk.
fn split_top_level_plus(text: &str) -> Vec<(u32, String)> {
    let mut chunks = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (pos, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '+' if depth == 0 => {
                chunks.push((start as u32 + 1, text[start..pos].to_string()));
                start = pos + 1;
            }
            _ => {}
        }
    }
    chunks.push((start as u32 + 1, text[start..].to_string()));
    chunks
}
