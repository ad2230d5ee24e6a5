//! Machine code back to mnemonic text.

use serde::Serialize;

use crate::encoded::{EncodedInstruction, Lane, SourceMux, OMUX_MAC, OUTPUT_O};
use crate::error::AsmError;
use crate::layout::Field;
use crate::opcode::{IluCode, MacCode};
use crate::operand::WriteMask;
use crate::registers::OutputRegister;

/// One execution unit's decoded half of an instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitDisassembly {
    pub mnemonic: &'static str,
    pub outputs: Vec<String>,
    pub inputs: Vec<String>,
}

/// Structured disassembly of one instruction. Both units empty means an
/// explicit NOP (used by some programs to wipe trailing slots).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Disassembly {
    pub mac: Option<UnitDisassembly>,
    pub ilu: Option<UnitDisassembly>,
}

impl Disassembly {
    pub fn is_empty(&self) -> bool {
        self.mac.is_none() && self.ilu.is_none()
    }

    /// Mnemonic text: one line per active destination, joined with `" + "`.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return "/* 0, 0, 0, 0 */".to_string();
        }

        let mut lines = Vec::new();
        for unit in [&self.mac, &self.ilu].into_iter().flatten() {
            for output in &unit.outputs {
                lines.push(format!(
                    "{} {}, {}",
                    unit.mnemonic,
                    output,
                    unit.inputs.join(", ")
                ));
            }
        }
        lines.join(" + ")
    }
}

/// Disassembles a validated instruction into its per-unit parts.
pub fn disassemble_instruction(ins: &EncodedInstruction) -> Result<Disassembly, AsmError> {
    let mac_code = MacCode::from_code(ins.get(Field::Mac)).ok_or(AsmError::UnknownMacCode {
        code: ins.get(Field::Mac),
    })?;
    let ilu_code = IluCode::from_code(ins.get(Field::Ilu)).ok_or(AsmError::UnknownIluCode {
        code: ins.get(Field::Ilu),
    })?;

    if mac_code == MacCode::Nop && ilu_code == IluCode::Nop {
        return Ok(Disassembly::default());
    }

    let inputs = [
        lane_text(ins, Lane::A)?,
        lane_text(ins, Lane::B)?,
        lane_text(ins, Lane::C)?,
    ];
    let (mac_outputs, ilu_outputs) = outputs(ins, mac_code)?;

    let mut result = Disassembly::default();
    if mac_code != MacCode::Nop {
        result.mac = Some(UnitDisassembly {
            mnemonic: mac_code.name(),
            outputs: mac_outputs,
            inputs: mac_inputs(mac_code, &inputs),
        });
    }
    if ilu_code != IluCode::Nop {
        result.ilu = Some(UnitDisassembly {
            mnemonic: ilu_code.name(),
            outputs: ilu_outputs,
            inputs: vec![inputs[2].clone()],
        });
    }
    Ok(result)
}

/// Disassembles a machine-code stream into one text line per instruction.
pub fn disassemble(program: &[[u32; 4]]) -> Result<Vec<String>, AsmError> {
    program
        .iter()
        .map(|words| {
            let ins = EncodedInstruction::from_words(words)?;
            Ok(disassemble_instruction(&ins)?.render())
        })
        .collect()
}

fn lane_text(ins: &EncodedInstruction, lane: Lane) -> Result<String, AsmError> {
    let code = ins.lane_mux(lane);
    let mut text = match SourceMux::from_code(code) {
        Some(SourceMux::Temporary) => format!("R{}", ins.lane_temp_reg(lane)),
        Some(SourceMux::Constant) => {
            let offset = ins.get(Field::Const);
            if ins.get(Field::A0x) != 0 {
                format!("c[A0+{offset}]")
            } else {
                format!("c[{offset}]")
            }
        }
        Some(SourceMux::Input) => format!("v{}", ins.get(Field::Input)),
        Some(SourceMux::Unknown) | None => return Err(AsmError::UnknownMuxCode { code }),
    };

    if ins.lane_negate(lane) {
        text.insert(0, '-');
    }

    let suffix = ins.lane_swizzle(lane).suffix();
    if suffix != "xyzw" {
        text.push('.');
        text.push_str(&suffix);
    }
    Ok(text)
}

/// Destination strings for (MAC, ILU).
fn outputs(
    ins: &EncodedInstruction,
    mac_code: MacCode,
) -> Result<(Vec<String>, Vec<String>), AsmError> {
    let mut mac = Vec::new();
    let mut ilu = Vec::new();

    let o_mask = ins.get(Field::OutOMask);
    if o_mask != 0 {
        let address = ins.get(Field::OutAddress);
        let name = if ins.get(Field::OutOrb) == OUTPUT_O {
            OutputRegister::from_index(address as u8)
                .ok_or(AsmError::InvalidOutputRegister { index: address })?
                .short_name()
                .to_string()
        } else {
            format!("c[{address}]")
        };
        let destination = format!("{}{}", name, mask_suffix(o_mask));
        if ins.get(Field::OutMux) == OMUX_MAC {
            mac.push(destination);
        } else {
            ilu.push(destination);
        }
    }

    let temp_reg = ins.get(Field::OutTempReg);
    let mac_mask = ins.get(Field::OutMacMask);
    if mac_mask != 0 {
        mac.push(format!("R{}{}", temp_reg, mask_suffix(mac_mask)));
    }
    let ilu_mask = ins.get(Field::OutIluMask);
    if ilu_mask != 0 {
        // A paired ILU write lands in R1 no matter what register was encoded.
        let reg = if mac_code != MacCode::Nop { 1 } else { temp_reg };
        ilu.push(format!("R{}{}", reg, mask_suffix(ilu_mask)));
    }

    // ARL writes A0 with an implicit x mask; it has no destination fields.
    if mac_code == MacCode::Arl {
        if !mac.is_empty() {
            return Err(AsmError::ArlExplicitDestination);
        }
        mac.push(OutputRegister::Address.short_name().to_string());
    }

    Ok((mac, ilu))
}

fn mac_inputs(mac_code: MacCode, inputs: &[String; 3]) -> Vec<String> {
    match mac_code {
        MacCode::Mov | MacCode::Arl => vec![inputs[0].clone()],
        MacCode::Add => vec![inputs[0].clone(), inputs[2].clone()],
        MacCode::Mad => inputs.to_vec(),
        _ => vec![inputs[0].clone(), inputs[1].clone()],
    }
}

/// The hardware-order mask rendered as a suffix; a full mask is spelled out.
fn mask_suffix(hardware_bits: u32) -> String {
    let suffix = WriteMask::from_hardware_bits(hardware_bits)
        .unwrap_or(WriteMask::XYZW)
        .suffix();
    if suffix.is_empty() {
        ".xyzw".to_string()
    } else {
        suffix
    }
}
