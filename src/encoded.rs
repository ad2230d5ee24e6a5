use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AsmError;
use crate::layout::{self, Field};
use crate::operand::Swizzle;

/// Output mux values: which unit drives the shared output address.
pub const OMUX_MAC: u32 = 0;
pub const OMUX_ILU: u32 = 1;

/// Output-vs-constant selector values for the shared output address.
pub const OUTPUT_C: u32 = 0;
pub const OUTPUT_O: u32 = 1;

/// Per-lane register file selector codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SourceMux {
    Unknown = 0,
    Temporary = 1,
    Input = 2,
    Constant = 3,
}

impl SourceMux {
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => SourceMux::Unknown,
            1 => SourceMux::Temporary,
            2 => SourceMux::Input,
            3 => SourceMux::Constant,
            _ => return None,
        })
    }
}

/// One of the three operand slots feeding the execution units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    A,
    B,
    C,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::A, Lane::B, Lane::C];

    fn mux_field(self) -> Field {
        match self {
            Lane::A => Field::AMux,
            Lane::B => Field::BMux,
            Lane::C => Field::CMux,
        }
    }

    fn negate_field(self) -> Field {
        match self {
            Lane::A => Field::ANeg,
            Lane::B => Field::BNeg,
            Lane::C => Field::CNeg,
        }
    }

    fn swizzle_fields(self) -> [Field; 4] {
        match self {
            Lane::A => [Field::ASwzX, Field::ASwzY, Field::ASwzZ, Field::ASwzW],
            Lane::B => [Field::BSwzX, Field::BSwzY, Field::BSwzZ, Field::BSwzW],
            Lane::C => [Field::CSwzX, Field::CSwzY, Field::CSwzZ, Field::CSwzW],
        }
    }
}

/// One machine-code instruction: four little-endian 32-bit words, the first
/// of which is reserved and always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedInstruction {
    words: [u32; 4],
}

impl EncodedInstruction {
    /// The empty-operation state the encoder starts from: both units NOP,
    /// identity swizzles, all lanes reading inputs, and the output fields
    /// parked at their idle values.
    pub fn new() -> Self {
        let mut ins = EncodedInstruction { words: [0; 4] };
        for lane in Lane::ALL {
            ins.set_lane_swizzle(lane, Swizzle::XYZW);
            ins.set_lane_mux(lane, SourceMux::Input);
        }
        ins.set(Field::OutTempReg, 7);
        ins.set(Field::OutAddress, 0xFF);
        ins.set(Field::OutMux, OMUX_MAC);
        ins.set(Field::OutOrb, OUTPUT_O);
        ins
    }

    /// The program terminator: all zeros with only the final bit set.
    pub fn final_marker() -> Self {
        let mut ins = EncodedInstruction { words: [0; 4] };
        ins.set(Field::Final, 1);
        ins
    }

    /// Validates and adopts a raw quadruplet.
    pub fn from_words(words: &[u32]) -> Result<Self, AsmError> {
        if words.len() != 4 {
            return Err(AsmError::BadWordCount { count: words.len() });
        }
        if words[0] != 0 {
            return Err(AsmError::ReservedWordNotZero { word: words[0] });
        }
        Ok(EncodedInstruction {
            words: [words[0], words[1], words[2], words[3]],
        })
    }

    pub fn words(&self) -> [u32; 4] {
        self.words
    }

    pub fn get(&self, field: Field) -> u32 {
        layout::get(&self.words, field)
    }

    pub fn set(&mut self, field: Field, value: u32) {
        layout::set(&mut self.words, field, value);
    }

    pub fn set_flag(&mut self, field: Field, value: bool) {
        self.set(field, value as u32);
    }

    pub fn is_final(&self) -> bool {
        self.get(Field::Final) != 0
    }

    pub fn set_final(&mut self, value: bool) {
        self.set_flag(Field::Final, value);
    }

    pub fn lane_mux(&self, lane: Lane) -> u32 {
        self.get(lane.mux_field())
    }

    pub fn set_lane_mux(&mut self, lane: Lane, mux: SourceMux) {
        self.set(lane.mux_field(), mux as u32);
    }

    pub fn lane_negate(&self, lane: Lane) -> bool {
        self.get(lane.negate_field()) != 0
    }

    pub fn set_lane_negate(&mut self, lane: Lane, value: bool) {
        self.set_flag(lane.negate_field(), value);
    }

    /// The temporary register index read by `lane`. Lane C's index is split
    /// across two non-adjacent ranges and is reassembled here.
    pub fn lane_temp_reg(&self, lane: Lane) -> u32 {
        match lane {
            Lane::A => self.get(Field::ATempReg),
            Lane::B => self.get(Field::BTempReg),
            Lane::C => (self.get(Field::CTempRegHigh) << 2) | self.get(Field::CTempRegLow),
        }
    }

    pub fn set_lane_temp_reg(&mut self, lane: Lane, value: u32) {
        match lane {
            Lane::A => self.set(Field::ATempReg, value),
            Lane::B => self.set(Field::BTempReg, value),
            Lane::C => {
                self.set(Field::CTempRegLow, value & 0x3);
                self.set(Field::CTempRegHigh, (value >> 2) & 0x3);
            }
        }
    }

    pub fn lane_swizzle(&self, lane: Lane) -> Swizzle {
        use crate::operand::Component;
        let fields = lane.swizzle_fields();
        let mut components = Swizzle::XYZW.0;
        for (component, field) in components.iter_mut().zip(fields) {
            // 2-bit field, every value is a component code
            *component = match self.get(field) {
                0 => Component::X,
                1 => Component::Y,
                2 => Component::Z,
                _ => Component::W,
            };
        }
        Swizzle(components)
    }

    pub fn set_lane_swizzle(&mut self, lane: Lane, swizzle: Swizzle) {
        let fields = lane.swizzle_fields();
        for (index, field) in fields.into_iter().enumerate() {
            self.set(field, swizzle.component(index) as u32);
        }
    }

    /// Verbose per-field dump used by the explain tooling.
    pub fn explain(&self) -> String {
        let raw = self
            .words
            .iter()
            .map(|w| format!("0x{w:08X}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut out = format!("{raw}:");
        for spec in layout::FIELDS {
            let value = self.get(spec.field);
            out.push_str(&format!(
                "\n\t{}: 0x{:x} ({:0width$b})",
                spec.name,
                value,
                value,
                width = spec.width as usize
            ));
        }
        out
    }
}

impl Default for EncodedInstruction {
    fn default() -> Self {
        EncodedInstruction::new()
    }
}

impl fmt::Display for EncodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.words;
        write!(f, "0x{a:08x}, 0x{b:08x}, 0x{c:08x}, 0x{d:08x},")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_matches_hardware_defaults() {
        assert_eq!(
            EncodedInstruction::new().words(),
            [0x00000000, 0x0000001B, 0x0836106C, 0x20700FF8]
        );
    }

    #[test]
    fn final_marker_is_all_zero_plus_flag() {
        assert_eq!(EncodedInstruction::final_marker().words(), [0, 0, 0, 1]);
    }

    #[test]
    fn c_lane_temp_reg_splits_across_words() {
        let mut ins = EncodedInstruction::new();
        ins.set_lane_temp_reg(Lane::C, 0b1110);
        assert_eq!(ins.get(Field::CTempRegHigh), 0b11);
        assert_eq!(ins.get(Field::CTempRegLow), 0b10);
        assert_eq!(ins.lane_temp_reg(Lane::C), 0b1110);
    }

    #[test]
    fn from_words_validates_shape() {
        assert!(matches!(
            EncodedInstruction::from_words(&[0, 1, 2]),
            Err(AsmError::BadWordCount { count: 3 })
        ));
        assert!(matches!(
            EncodedInstruction::from_words(&[5, 1, 2, 3]),
            Err(AsmError::ReservedWordNotZero { word: 5 })
        ));
        assert!(EncodedInstruction::from_words(&[0, 1, 2, 3]).is_ok());
    }
}
