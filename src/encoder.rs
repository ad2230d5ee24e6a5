//! Semantic instruction to machine-code packing.
//!
//! Field layout comes from `layout`; this module only decides which fields
//! to write for a given instruction shape.

use tracing::warn;

use crate::encoded::{EncodedInstruction, Lane, SourceMux, OMUX_ILU, OMUX_MAC, OUTPUT_C};
use crate::error::AsmError;
use crate::instruction::Instruction;
use crate::layout::Field;
use crate::opcode::{IluCode, MacCode, Opcode};
use crate::operand::{DestinationOperand, RegisterFile};

/// Encodes a program. Unless `inline_final` is set, a terminating all-zero
/// instruction with only the final bit is appended; an empty input produces
/// an empty output with no terminator.
pub fn encode(
    instructions: Vec<Instruction>,
    inline_final: bool,
) -> Result<Vec<EncodedInstruction>, AsmError> {
    let mut program = Vec::with_capacity(instructions.len() + 1);
    for mut ins in instructions {
        let mut out = EncodedInstruction::new();
        process_instruction(&mut ins, &mut out)?;
        program.push(out);
    }

    if let Some(last) = program.last_mut() {
        if inline_final {
            last.set_final(true);
        } else {
            program.push(EncodedInstruction::final_marker());
        }
    }

    Ok(program)
}

fn process_instruction(ins: &mut Instruction, out: &mut EncodedInstruction) -> Result<(), AsmError> {
    let (ilu, mac) = process_opcode(ins, out)?;
    if ins.paired_ilu_destination.is_some() {
        process_destination(
            ins.paired_ilu_destination.as_ref(),
            ins.paired_ilu_secondary_destination.as_ref(),
            true,
            false,
            out,
            true,
        )?;
        process_destination(
            ins.destination.as_ref(),
            ins.secondary_destination.as_ref(),
            false,
            true,
            out,
            true,
        )?;
    } else {
        process_destination(
            ins.destination.as_ref(),
            ins.secondary_destination.as_ref(),
            ilu,
            mac,
            out,
            false,
        )?;
    }
    process_sources(ins, ilu, mac, out)
}

/// Writes the unit codes and reports which units the instruction occupies.
fn process_opcode(ins: &Instruction, out: &mut EncodedInstruction) -> Result<(bool, bool), AsmError> {
    let (ilu, mac) = set_unit_code(ins.opcode, false, out)?;
    if let Some(paired) = ins.paired_ilu_opcode {
        let (paired_ilu, paired_mac) = set_unit_code(paired, true, out)?;
        if ilu && paired_ilu {
            return Err(AsmError::PairedUnitCollision { unit: "ILU" });
        }
        if mac && paired_mac {
            return Err(AsmError::PairedUnitCollision { unit: "MAC" });
        }
        return Ok((true, true));
    }
    Ok((ilu, mac))
}

fn set_unit_code(
    opcode: Opcode,
    mov_is_ilu: bool,
    out: &mut EncodedInstruction,
) -> Result<(bool, bool), AsmError> {
    let mac = |out: &mut EncodedInstruction, code: MacCode| -> Result<(bool, bool), AsmError> {
        out.set(Field::Mac, code as u32);
        Ok((false, true))
    };
    let ilu = |out: &mut EncodedInstruction, code: IluCode| -> Result<(bool, bool), AsmError> {
        out.set(Field::Ilu, code as u32);
        Ok((true, false))
    };

    match opcode {
        Opcode::Mov if mov_is_ilu => ilu(out, IluCode::Mov),
        Opcode::Mov => mac(out, MacCode::Mov),
        Opcode::Add => mac(out, MacCode::Add),
        Opcode::Arl => mac(out, MacCode::Arl),
        Opcode::Mad => mac(out, MacCode::Mad),
        Opcode::Mul => mac(out, MacCode::Mul),
        Opcode::Max => mac(out, MacCode::Max),
        Opcode::Min => mac(out, MacCode::Min),
        Opcode::Sge => mac(out, MacCode::Sge),
        Opcode::Slt => mac(out, MacCode::Slt),
        Opcode::Dp3 => mac(out, MacCode::Dp3),
        Opcode::Dp4 => mac(out, MacCode::Dp4),
        Opcode::Dph => mac(out, MacCode::Dph),
        Opcode::Dst => mac(out, MacCode::Dst),
        Opcode::Rcp => ilu(out, IluCode::Rcp),
        Opcode::Rcc => ilu(out, IluCode::Rcc),
        Opcode::Rsq => ilu(out, IluCode::Rsq),
        Opcode::Exp => ilu(out, IluCode::Exp),
        Opcode::Log => ilu(out, IluCode::Log),
        Opcode::Lit => ilu(out, IluCode::Lit),
        // Would be MAC ADD with a negated C lane, but merging that negate
        // with an operand-level negate is unresolved.
        Opcode::Sub => Err(AsmError::SubNotImplemented),
    }
}

fn process_destination(
    destination: Option<&DestinationOperand>,
    secondary: Option<&DestinationOperand>,
    ilu: bool,
    mac: bool,
    out: &mut EncodedInstruction,
    is_paired: bool,
) -> Result<(), AsmError> {
    let Some(destination) = destination else {
        if secondary.is_some() {
            return Err(AsmError::Internal(
                "secondary destination without a primary destination".into(),
            ));
        }
        return Ok(());
    };

    let mut write = |reg: &DestinationOperand| -> Result<(), AsmError> {
        match reg.file {
            RegisterFile::Temporary => {
                if is_paired && ilu && reg.index != 1 {
                    warn!(
                        register = reg.index,
                        "paired ILU write targets R{} but the hardware only writes R1",
                        reg.index
                    );
                    out.set(Field::OutTempReg, 1);
                } else {
                    out.set(Field::OutTempReg, reg.index as u32);
                }
                if mac {
                    out.set(Field::OutMacMask, reg.write_mask.hardware_bits());
                } else if ilu {
                    out.set(Field::OutIluMask, reg.write_mask.hardware_bits());
                }
                Ok(())
            }
            RegisterFile::Output => {
                out.set(Field::OutOMask, reg.write_mask.hardware_bits());
                out.set(Field::OutMux, if mac { OMUX_MAC } else { OMUX_ILU });
                out.set(Field::OutAddress, reg.index as u32);
                Ok(())
            }
            RegisterFile::EnvironmentConstant => {
                out.set(Field::OutOMask, reg.write_mask.hardware_bits());
                out.set(Field::OutMux, if mac { OMUX_MAC } else { OMUX_ILU });
                out.set(Field::OutOrb, OUTPUT_C);
                out.set(Field::OutAddress, reg.index as u32);
                Ok(())
            }
            RegisterFile::Address => {
                // ARL only; the write target is implied by the opcode.
                if !mac {
                    return Err(AsmError::AddressWriteNotMac);
                }
                Ok(())
            }
            file => Err(AsmError::UnsupportedDestinationFile(file)),
        }
    };

    write(destination)?;
    if let Some(secondary) = secondary {
        write(secondary)?;
    }
    Ok(())
}

fn process_sources(
    ins: &mut Instruction,
    ilu: bool,
    mac: bool,
    out: &mut EncodedInstruction,
) -> Result<(), AsmError> {
    // A lone ILU operation reads through lane C. Groups arrive with the
    // rotation already applied by the merge engine, so only rotate when C is
    // still empty.
    if ilu && !mac && ins.sources[2].is_none() {
        if ins.sources[1].is_some() {
            return Err(AsmError::Internal("ILU operation populates lane B".into()));
        }
        ins.rotate_a_to_c();
    }

    if matches!(ins.opcode, Opcode::Add | Opcode::Sub) && ins.sources[2].is_none() {
        ins.rotate_b_to_c();
    }

    let mut constant_index: Option<u8> = None;
    for (index, lane) in Lane::ALL.into_iter().enumerate() {
        let Some(reg) = ins.sources[index] else {
            continue;
        };

        if reg.relative {
            out.set_flag(Field::A0x, true);
        }

        match reg.file {
            RegisterFile::Temporary => {
                out.set_lane_mux(lane, SourceMux::Temporary);
                out.set_lane_temp_reg(lane, reg.index as u32);
            }
            RegisterFile::EnvironmentConstant => {
                out.set_lane_mux(lane, SourceMux::Constant);
                out.set(Field::Const, reg.index as u32);
                if let Some(previous) = constant_index {
                    if previous != reg.index {
                        return Err(AsmError::MultipleConstantRegisters {
                            first: previous,
                            second: reg.index,
                        });
                    }
                }
                constant_index = Some(reg.index);
            }
            RegisterFile::Input => {
                out.set_lane_mux(lane, SourceMux::Input);
                out.set(Field::Input, reg.index as u32);
            }
            file => return Err(AsmError::UnsupportedSourceFile(file, index)),
        }

        if reg.negate {
            out.set_lane_negate(lane, true);
        }
        out.set_lane_swizzle(lane, reg.swizzle);
    }

    Ok(())
}
