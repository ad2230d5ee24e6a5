use anyhow::{ensure, Result};
use std::path::Path;

/// Loads a textual machine-code listing: any stream containing 0x-prefixed
/// hex words, four words per instruction. Comments and separators between
/// the words are ignored.
pub fn load_hex_text(path: &Path) -> Result<Vec<[u32; 4]>> {
    let content = std::fs::read_to_string(path)?;
    parse_hex_text(&content)
}

pub fn parse_hex_text(content: &str) -> Result<Vec<[u32; 4]>> {
    let bytes = content.as_bytes();
    let mut values = Vec::new();
    let mut pos = 0;
    while pos + 1 < bytes.len() {
        if bytes[pos] == b'0' && (bytes[pos + 1] == b'x' || bytes[pos + 1] == b'X') {
            let start = pos + 2;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_hexdigit() {
                end += 1;
            }
            if end > start {
                values.push(u32::from_str_radix(&content[start..end], 16)?);
                pos = end;
                continue;
            }
        }
        pos += 1;
    }

    ensure!(
        values.len() % 4 == 0,
        "Invalid input, {} values is not divisible by 4.",
        values.len()
    );
    Ok(values
        .chunks_exact(4)
        .map(|chunk| [chunk[0], chunk[1], chunk[2], chunk[3]])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_empty_input() {
        assert_eq!(parse_hex_text("").unwrap(), Vec::<[u32; 4]>::new());
    }

    #[test]
    fn parses_single_line() {
        assert_eq!(parse_hex_text("0x0,0x1,0x2,0x3").unwrap(), vec![[0, 1, 2, 3]]);
    }

    #[test]
    fn parses_across_lines_and_whitespace() {
        assert_eq!(
            parse_hex_text("0x0,0x1,\n\t0x2,   0x3  ").unwrap(),
            vec![[0, 1, 2, 3]]
        );
    }

    #[test]
    fn parses_multiple_instructions_with_comments() {
        let text = "/* mov */\n0x00000000, 0x002000bf, 0x0836106c, 0x2070c848,\n0x0, 0x0, 0x0, 0x1,";
        assert_eq!(
            parse_hex_text(text).unwrap(),
            vec![
                [0x00000000, 0x002000BF, 0x0836106C, 0x2070C848],
                [0, 0, 0, 1]
            ]
        );
    }

    #[test]
    fn rejects_partial_instruction() {
        assert!(parse_hex_text("0x0, 0x1, 0x2").is_err());
    }
}
