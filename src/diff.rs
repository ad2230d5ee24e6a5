//! Field-by-field comparison and explain tooling for encoded instructions.
//!
//! Reads bit positions from the same `layout` table the encoder writes
//! through, so a mismatch reported here is always a real encoding
//! difference.

use crate::encoded::EncodedInstruction;
use crate::error::AsmError;
use crate::layout::{self, Field};

/// Compares two quadruplets field by field.
///
/// Returns one line per differing field, in field-table order; an empty
/// result means the instructions are bit-identical (modulo the reserved
/// high bits of word 1, which carry no fields). `ignore_final` skips the
/// final flag for partial-program comparisons.
pub fn diff(
    expected: &[u32; 4],
    actual: &[u32; 4],
    ignore_final: bool,
) -> Result<Vec<String>, AsmError> {
    if expected[0] != 0 {
        return Err(AsmError::ReservedWordNotZero { word: expected[0] });
    }

    let mut differences = Vec::new();
    if actual[0] != expected[0] {
        differences.push(format!(
            "Invalid instruction, [0](0x{:08x}) must == 0",
            actual[0]
        ));
    }

    for spec in layout::FIELDS {
        if ignore_final && spec.field == Field::Final {
            continue;
        }
        let expected_value = layout::get(expected, spec.field);
        let actual_value = layout::get(actual, spec.field);
        if expected_value != actual_value {
            let width = spec.width as usize;
            differences.push(format!(
                "{} 0x{:x} ({:0width$b}) != actual 0x{:x} ({:0width$b})",
                spec.name, expected_value, expected_value, actual_value, actual_value,
            ));
        }
    }

    Ok(differences)
}

/// Human-readable diff report, or `None` when the instructions match.
pub fn report(
    expected: &[u32; 4],
    actual: &[u32; 4],
    ignore_final: bool,
) -> Result<Option<String>, AsmError> {
    let differences = diff(expected, actual, ignore_final)?;
    if differences.is_empty() {
        return Ok(None);
    }

    let mut out = String::from("Instructions differ.\n");
    out.push_str(&format!(
        "\t0x{:08x} 0x{:08x} 0x{:08x} 0x{:08x}\n",
        expected[0], expected[1], expected[2], expected[3]
    ));
    out.push_str(&format!(
        "\t0x{:08x} 0x{:08x} 0x{:08x} 0x{:08x}\n",
        actual[0], actual[1], actual[2], actual[3]
    ));
    out.push_str("\n\t");
    out.push_str(&differences.join("\n\t"));
    out.push('\n');
    Ok(Some(out))
}

/// Verbose field dump of a single raw quadruplet.
pub fn explain(words: &[u32]) -> Result<String, AsmError> {
    Ok(EncodedInstruction::from_words(words)?.explain())
}
