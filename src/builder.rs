//! Turns pre-parsed statements into semantic instructions and drives the
//! merge engine and encoder.
//!
//! The grammar lives outside this crate; callers hand over uniform
//! declarations, macro invocations and raw operations whose operands are
//! still token text (`"-c[A0+12].xyz"`). Resolving those tokens, expanding
//! macros and validating uniform references happens here.

use std::collections::HashMap;

use crate::encoded::EncodedInstruction;
use crate::encoder;
use crate::error::AsmError;
use crate::instruction::Instruction;
use crate::merge::{self, SourcedOp};
use crate::opcode::Opcode;
use crate::operand::{DestinationOperand, RegisterFile, SourceOperand, Swizzle, WriteMask};
use crate::registers::{self, OutputRegister};

/// Uniform layout kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    /// One constant slot.
    Vector,
    /// Four consecutive constant slots.
    Matrix4,
}

impl UniformKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "vector" => UniformKind::Vector,
            "matrix4" => UniformKind::Matrix4,
            _ => return None,
        })
    }

    pub fn size(self) -> u32 {
        match self {
            UniformKind::Vector => 1,
            UniformKind::Matrix4 => 4,
        }
    }
}

/// `#name vector|matrix4 N`
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDecl {
    pub name: String,
    pub kind: UniformKind,
    pub index: u32,
    pub line: u32,
}

/// One textual operation: mnemonic plus operand token strings. The first
/// operand is the destination. `combine_with_previous` carries the `+`
/// marker joining this operation to the one before it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOperation {
    pub mnemonic: String,
    pub operands: Vec<String>,
    pub combine_with_previous: bool,
    pub line: u32,
    pub column: u32,
}

/// `%name arg...`
#[derive(Debug, Clone, PartialEq)]
pub struct MacroInvocation {
    pub name: String,
    pub operands: Vec<String>,
    pub line: u32,
    pub column: u32,
}

/// A pre-parsed source statement handed over by the front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Uniform(UniformDecl),
    Operation(RawOperation),
    Macro(MacroInvocation),
}

#[derive(Debug, Clone, Copy)]
struct Uniform {
    kind: UniformKind,
    index: u32,
}

struct UniformRef {
    kind: UniformKind,
    offset: u32,
    index: u32,
}

/// An assembled program: machine code plus the pretty-printed source line
/// for each real instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub instructions: Vec<EncodedInstruction>,
    pub listing: Vec<String>,
}

impl Program {
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn words(&self) -> Vec<[u32; 4]> {
        self.instructions.iter().map(|i| i.words()).collect()
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.instructions.len() * 16);
        for ins in &self.instructions {
            for word in ins.words() {
                out.extend_from_slice(&word.to_le_bytes());
            }
        }
        out
    }

    /// C-style listing: a comment with the pretty source followed by the
    /// four machine words of each instruction.
    pub fn c_listing(&self) -> String {
        let mut lines = Vec::with_capacity(self.instructions.len() * 2);
        for (ins, source) in self.instructions.iter().zip(&self.listing) {
            lines.push(format!("/* {source} */"));
            lines.push(ins.to_string());
        }
        if self.instructions.len() == self.listing.len() + 1 {
            lines.push("/* <NOP FINAL MARKER> */".to_string());
            lines.push(self.instructions[self.instructions.len() - 1].to_string());
        }
        lines.join("\n")
    }
}

/// Assembles statement streams into machine code.
#[derive(Default)]
pub struct Assembler {
    uniforms: HashMap<String, Uniform>,
}

impl Assembler {
    pub fn new() -> Self {
        Assembler::default()
    }

    /// Assembles a whole program. With `inline_final` the final flag lands
    /// on the last real instruction; otherwise a terminator is appended.
    pub fn assemble(
        &mut self,
        statements: &[Statement],
        inline_final: bool,
    ) -> Result<Program, AsmError> {
        let groups = self.build_groups(statements)?;

        let mut merged: Vec<SourcedOp> = Vec::with_capacity(groups.len());
        for (line, mut group) in groups {
            if group.len() == 1 {
                merged.push(group.pop().expect("length checked"));
            } else {
                merged.push(merge::combine_group(group, line)?);
            }
        }

        let mut instructions = Vec::with_capacity(merged.len());
        let mut listing = Vec::with_capacity(merged.len());
        for op in merged {
            instructions.push(op.ins);
            listing.push(op.text);
        }

        let instructions = encoder::encode(instructions, inline_final)?;
        Ok(Program {
            instructions,
            listing,
        })
    }

    /// Flat ordered operation lists, one per program line/group.
    fn build_groups(
        &mut self,
        statements: &[Statement],
    ) -> Result<Vec<(u32, Vec<SourcedOp>)>, AsmError> {
        let mut groups: Vec<(u32, Vec<SourcedOp>)> = Vec::new();
        for statement in statements {
            match statement {
                Statement::Uniform(decl) => self.define_uniform(decl)?,
                Statement::Macro(invocation) => {
                    for op in self.expand_macro(invocation)? {
                        groups.push((invocation.line, vec![op]));
                    }
                }
                Statement::Operation(raw) => {
                    let op = self.resolve_operation(raw)?;
                    if raw.combine_with_previous {
                        let Some(last) = groups.last_mut() else {
                            return Err(AsmError::DanglingCombineMarker { line: raw.line });
                        };
                        if last.1.len() >= 4 {
                            return Err(AsmError::BadGroupSize { line: last.0 });
                        }
                        last.1.push(op);
                    } else {
                        groups.push((raw.line, vec![op]));
                    }
                }
            }
        }
        Ok(groups)
    }

    fn define_uniform(&mut self, decl: &UniformDecl) -> Result<(), AsmError> {
        if self.uniforms.contains_key(&decl.name) {
            return Err(AsmError::DuplicateUniform {
                name: decl.name.clone(),
                line: decl.line,
            });
        }
        self.uniforms.insert(
            decl.name.clone(),
            Uniform {
                kind: decl.kind,
                index: decl.index,
            },
        );
        Ok(())
    }

    fn resolve_operation(&self, raw: &RawOperation) -> Result<SourcedOp, AsmError> {
        let opcode =
            Opcode::from_mnemonic(&raw.mnemonic).ok_or_else(|| AsmError::UnknownMnemonic {
                mnemonic: raw.mnemonic.clone(),
                line: raw.line,
            })?;

        let arity = opcode.source_arity();
        if raw.operands.len() != arity + 1 {
            return Err(AsmError::WrongOperandCount {
                mnemonic: raw.mnemonic.clone(),
                expected: arity,
                found: raw.operands.len().saturating_sub(1),
                line: raw.line,
            });
        }

        let destination = self.resolve_destination(&raw.operands[0], raw.line, raw.column)?;
        let mut sources: [Option<SourceOperand>; 3] = [None, None, None];
        for (slot, token) in sources.iter_mut().zip(&raw.operands[1..]) {
            *slot = Some(self.resolve_source(token, raw.line, raw.column)?);
        }

        let text = pretty_operation(opcode, &destination, &sources);
        Ok(SourcedOp::new(
            Instruction::new(opcode, destination, sources),
            text,
        ))
    }

    fn resolve_destination(
        &self,
        token: &str,
        line: u32,
        column: u32,
    ) -> Result<DestinationOperand, AsmError> {
        let token = token.trim();
        let unsupported = || AsmError::UnsupportedTarget {
            text: token.to_string(),
            line,
            column,
        };

        let (core, suffix) = split_suffix(token);
        let mask = match suffix {
            Some(text) => WriteMask::parse(text).ok_or_else(unsupported)?,
            None => WriteMask::XYZW,
        };

        if let Some(index) = parse_temporary(core) {
            return Ok(DestinationOperand::new(RegisterFile::Temporary, index).with_mask(mask));
        }
        if let Some(reg) = registers::output_register(core) {
            return Ok(DestinationOperand::new(RegisterFile::Output, reg as u8).with_mask(mask));
        }
        if core.eq_ignore_ascii_case("a0") {
            return Ok(
                DestinationOperand::new(RegisterFile::Address, OutputRegister::Address as u8)
                    .with_mask(mask),
            );
        }
        if core.starts_with('#') {
            let uniform = self.resolve_uniform_ref(core, line)?;
            return Ok(DestinationOperand::new(
                RegisterFile::EnvironmentConstant,
                uniform.index as u8,
            )
            .with_mask(mask));
        }
        if let Some((index, relative)) = parse_constant(core) {
            if relative {
                return Err(AsmError::RelativeConstantWrite { line });
            }
            return Ok(
                DestinationOperand::new(RegisterFile::EnvironmentConstant, index).with_mask(mask),
            );
        }

        Err(unsupported())
    }

    fn resolve_source(
        &self,
        token: &str,
        line: u32,
        column: u32,
    ) -> Result<SourceOperand, AsmError> {
        let token = token.trim();
        let unsupported = || AsmError::UnsupportedSource {
            text: token.to_string(),
            line,
            column,
        };

        let (negate, rest) = match token.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, token),
        };

        let (core, suffix) = split_suffix(rest);
        let swizzle = match suffix {
            Some(text) => Swizzle::parse(text).ok_or_else(unsupported)?,
            None => Swizzle::XYZW,
        };

        let mut operand = if let Some(index) = parse_temporary(core) {
            SourceOperand::new(RegisterFile::Temporary, index)
        } else if let Some(index) = registers::input_register(core) {
            SourceOperand::new(RegisterFile::Input, index)
        } else if core.starts_with('#') {
            let uniform = self.resolve_uniform_ref(core, line)?;
            SourceOperand::new(RegisterFile::EnvironmentConstant, uniform.index as u8)
        } else if let Some((index, relative)) = parse_constant(core) {
            let mut op = SourceOperand::new(RegisterFile::EnvironmentConstant, index);
            op.relative = relative;
            op
        } else {
            return Err(unsupported());
        };

        operand.swizzle = swizzle;
        operand.negate = negate;
        Ok(operand)
    }

    fn resolve_uniform_ref(&self, token: &str, line: u32) -> Result<UniformRef, AsmError> {
        let rest = token.strip_prefix('#').unwrap_or(token);
        let (name, offset) = match rest.find('[') {
            Some(bracket) => {
                let inner = rest[bracket + 1..]
                    .strip_suffix(']')
                    .ok_or_else(|| AsmError::UndefinedUniform {
                        name: rest.to_string(),
                        line,
                    })?;
                let offset =
                    inner
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| AsmError::UndefinedUniform {
                            name: rest.to_string(),
                            line,
                        })?;
                (&rest[..bracket], offset)
            }
            None => (rest, 0),
        };

        let uniform = self
            .uniforms
            .get(name)
            .ok_or_else(|| AsmError::UndefinedUniform {
                name: name.to_string(),
                line,
            })?;
        if offset >= uniform.kind.size() {
            return Err(AsmError::UniformOffsetOutOfRange {
                max: uniform.kind.size() - 1,
                line,
            });
        }

        Ok(UniformRef {
            kind: uniform.kind,
            offset,
            index: uniform.index + offset,
        })
    }

    fn expand_macro(&self, invocation: &MacroInvocation) -> Result<Vec<SourcedOp>, AsmError> {
        match invocation.name.to_ascii_lowercase().as_str() {
            "matmul4x4" => self.expand_matmul4x4(invocation),
            "norm3" => self.expand_norm3(invocation),
            _ => Err(AsmError::UnknownMacro {
                name: invocation.name.clone(),
                line: invocation.line,
            }),
        }
    }

    /// `%matmul4x4 dst src matrixUniform` -> four DP4 rows.
    fn expand_matmul4x4(&self, invocation: &MacroInvocation) -> Result<Vec<SourcedOp>, AsmError> {
        const USAGE: &str = "%matmul4x4 <destination> <source> <matrix_uniform>";
        let usage_error = |message: &'static str| AsmError::MacroUsage {
            message,
            text: invocation.operands.join(" "),
            line: invocation.line,
            usage: USAGE,
        };

        let [dst, src, uniform_token] = invocation.operands.as_slice() else {
            return Err(usage_error("Invalid parameters to %matmul4x4"));
        };

        let destination = self.resolve_destination(dst, invocation.line, invocation.column)?;
        let source = self.resolve_source(src, invocation.line, invocation.column)?;
        let uniform = match self.resolve_uniform_ref(uniform_token.trim(), invocation.line) {
            Ok(uniform) => uniform,
            Err(AsmError::UndefinedUniform { .. }) => {
                return Err(usage_error("Invalid matrix uniform parameter"));
            }
            Err(err) => return Err(err),
        };
        if uniform.kind != UniformKind::Matrix4 {
            return Err(usage_error(
                "Invalid matrix uniform type; uniform must be matrix type",
            ));
        }
        if uniform.offset != 0 {
            return Err(usage_error(
                "Invalid matrix uniform offset; uniform must be referenced at offset 0",
            ));
        }

        let rows = [WriteMask::X, WriteMask::Y, WriteMask::Z, WriteMask::W];
        let mut ops = Vec::with_capacity(4);
        for (row, mask) in rows.into_iter().enumerate() {
            let row_destination = destination.with_mask(mask);
            let row_constant = SourceOperand::new(
                RegisterFile::EnvironmentConstant,
                (uniform.index + row as u32) as u8,
            );
            let sources = [Some(source), Some(row_constant), None];
            let text = pretty_operation(Opcode::Dp4, &row_destination, &sources);
            ops.push(SourcedOp::new(
                Instruction::new(Opcode::Dp4, row_destination, sources),
                text,
            ));
        }
        Ok(ops)
    }

    /// `%norm3 dst src temp` -> DP3/RSQ/MUL 3-component normalize.
    fn expand_norm3(&self, invocation: &MacroInvocation) -> Result<Vec<SourcedOp>, AsmError> {
        const USAGE: &str = "%norm3 <destination> <source> <temp_register_rw>";
        let usage_error = |message: &'static str| AsmError::MacroUsage {
            message,
            text: invocation.operands.join(" "),
            line: invocation.line,
            usage: USAGE,
        };

        let [dst, src, temp] = invocation.operands.as_slice() else {
            return Err(usage_error("Invalid parameters to %norm3"));
        };

        let destination = self.resolve_destination(dst, invocation.line, invocation.column)?;
        let source = self.resolve_source(src, invocation.line, invocation.column)?;
        let temp = self.resolve_source(temp, invocation.line, invocation.column)?;
        // r12 is the read-only position alias and cannot hold scratch values
        if temp.file != RegisterFile::Temporary || temp.index == 12 {
            return Err(usage_error(
                "Invalid temp register parameter; temp register must be read/write",
            ));
        }

        let temp_write = DestinationOperand::new(RegisterFile::Temporary, temp.index);
        let dp3_dst = temp_write.with_mask(WriteMask::X);
        let rsq_dst = temp_write.with_mask(WriteMask::W);
        let mul_dst = destination.with_mask(WriteMask::X | WriteMask::Y | WriteMask::Z);
        let temp_x = temp.with_swizzle(Swizzle::XXXX);
        let temp_w = temp.with_swizzle(Swizzle::WWWW);

        let steps = [
            (Opcode::Dp3, dp3_dst, [Some(source), Some(source), None]),
            (Opcode::Rsq, rsq_dst, [Some(temp_x), None, None]),
            (Opcode::Mul, mul_dst, [Some(source), Some(temp_w), None]),
        ];
        Ok(steps
            .into_iter()
            .map(|(opcode, destination, sources)| {
                let text = pretty_operation(opcode, &destination, &sources);
                SourcedOp::new(Instruction::new(opcode, destination, sources), text)
            })
            .collect())
    }
}

fn pretty_operation(
    opcode: Opcode,
    destination: &DestinationOperand,
    sources: &[Option<SourceOperand>; 3],
) -> String {
    let mut parts = vec![destination.to_string()];
    parts.extend(sources.iter().flatten().map(|s| s.to_string()));
    format!("{} {}", opcode.mnemonic(), parts.join(", "))
}

/// Splits a trailing `.suffix` off an operand token.
fn split_suffix(token: &str) -> (&str, Option<&str>) {
    match token.rfind('.') {
        Some(index) if index + 1 < token.len() => (&token[..index], Some(&token[index + 1..])),
        _ => (token, None),
    }
}

/// `r0`..`r12`, case-insensitive.
fn parse_temporary(core: &str) -> Option<u8> {
    let rest = core.strip_prefix('r').or_else(|| core.strip_prefix('R'))?;
    let index = rest.parse::<u8>().ok()?;
    (index <= 12).then_some(index)
}

/// Constant register forms: `c12`, `c[12]`, `c[A0+12]`, `c[12+A0]`, with
/// arbitrary interior spacing. Returns (index, relative).
fn parse_constant(core: &str) -> Option<(u8, bool)> {
    let rest = core.strip_prefix('c').or_else(|| core.strip_prefix('C'))?;
    if let Some(bracketed) = rest.strip_prefix('[') {
        let inner = bracketed.strip_suffix(']')?.trim();
        if let Some((left, right)) = inner.split_once('+') {
            let (left, right) = (left.trim(), right.trim());
            let offset = if left.eq_ignore_ascii_case("a0") {
                right
            } else if right.eq_ignore_ascii_case("a0") {
                left
            } else {
                return None;
            };
            return offset.parse::<u8>().ok().map(|index| (index, true));
        }
        return inner.parse::<u8>().ok().map(|index| (index, false));
    }
    if rest.is_empty() {
        return None;
    }
    rest.parse::<u8>().ok().map(|index| (index, false))
}
