use crate::merge::MergeConflict;
use crate::operand::RegisterFile;

/// Fatal assembly, pairing, and decode-validation errors.
///
/// Every variant renders a human-readable message; variants raised while
/// resolving source text carry the line (and column where the front-end
/// provides one).
#[derive(thiserror::Error, Debug)]
pub enum AsmError {
    #[error("Undefined uniform {name} used at line {line}")]
    UndefinedUniform { name: String, line: u32 },
    #[error("Uniform offset out of range (max is {max}) at line {line}")]
    UniformOffsetOutOfRange { max: u32, line: u32 },
    #[error("Duplicate definition of uniform {name} at line {line}")]
    DuplicateUniform { name: String, line: u32 },
    #[error("Unknown mnemonic '{mnemonic}' at line {line}")]
    UnknownMnemonic { mnemonic: String, line: u32 },
    #[error("Unknown macro '{name}' at line {line}")]
    UnknownMacro { name: String, line: u32 },
    #[error("{message} on line {line}: '{text}'.\n  Usage: {usage}")]
    MacroUsage {
        message: &'static str,
        text: String,
        line: u32,
        usage: &'static str,
    },
    #[error("{mnemonic} expects {expected} source operands but {found} were given at line {line}")]
    WrongOperandCount {
        mnemonic: String,
        expected: usize,
        found: usize,
        line: u32,
    },
    #[error("Unsupported input register '{text}' at {line}:{column}")]
    UnsupportedSource { text: String, line: u32, column: u32 },
    #[error("Unsupported output target '{text}' at {line}:{column}")]
    UnsupportedTarget { text: String, line: u32, column: u32 },
    #[error("Unsupported write to relative constant register at line {line}")]
    RelativeConstantWrite { line: u32 },
    #[error("Combined operation at line {line} must contain 2, 3, or 4 operations")]
    BadGroupSize { line: u32 },
    #[error("Combine marker without a preceding operation at line {line}")]
    DanglingCombineMarker { line: u32 },

    #[error("Conflicting MAC operations ({reason}) at {line}")]
    ConflictingMacOperations { reason: MergeConflict, line: u32 },
    #[error("Conflicting ILU operations ({reason}) at {line}")]
    ConflictingIluOperations { reason: MergeConflict, line: u32 },
    #[error("Invalid pairing ({reason}) at {line}")]
    InvalidPairing { reason: MergeConflict, line: u32 },
    #[error("Invalid instruction pairing (MAC operation uses input C which does not match ILU input)")]
    PairedInputMismatch,

    #[error("Operation reads from more than one C register (c[{first}] and c[{second}])")]
    MultipleConstantRegisters { first: u8, second: u8 },
    #[error("SUB is not implemented (folding the negate into an already-negated C lane is undefined)")]
    SubNotImplemented,
    #[error("Paired operations both use the {unit} unit")]
    PairedUnitCollision { unit: &'static str },
    #[error("A0 may only be written by ARL, which executes on the MAC unit")]
    AddressWriteNotMac,
    #[error("Unsupported destination register file {0:?}")]
    UnsupportedDestinationFile(RegisterFile),
    #[error("Unsupported source register file {0:?} in lane {1}")]
    UnsupportedSourceFile(RegisterFile, usize),

    #[error("Encoded instruction must be exactly 4 words but was {count}")]
    BadWordCount { count: usize },
    #[error("First word of encoded instruction must be zero but was {word:#010x}")]
    ReservedWordNotZero { word: u32 },
    #[error("Unknown source mux code {code}")]
    UnknownMuxCode { code: u32 },
    #[error("Unknown MAC operation code {code}")]
    UnknownMacCode { code: u32 },
    #[error("Unknown ILU operation code {code}")]
    UnknownIluCode { code: u32 },
    #[error("Invalid output register index {index}")]
    InvalidOutputRegister { index: u32 },
    #[error("ARL implicitly writes to A0; the MAC destination fields must be empty")]
    ArlExplicitDestination,

    #[error("{0}")]
    Internal(String),
}
