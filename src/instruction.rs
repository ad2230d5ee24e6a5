use serde::{Deserialize, Serialize};

use crate::opcode::Opcode;
use crate::operand::{DestinationOperand, SourceOperand};

/// A single semantic instruction, before bit-level encoding.
///
/// `secondary_destination` records the extra write target produced when two
/// operations with identical inputs were merged into a dual write. The
/// `paired_ilu_*` fields hold the folded ILU half of a MAC+ILU pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub destination: Option<DestinationOperand>,
    pub secondary_destination: Option<DestinationOperand>,
    /// Lanes A, B, C.
    pub sources: [Option<SourceOperand>; 3],
    pub paired_ilu_opcode: Option<Opcode>,
    pub paired_ilu_destination: Option<DestinationOperand>,
    pub paired_ilu_secondary_destination: Option<DestinationOperand>,
}

impl Instruction {
    pub fn new(
        opcode: Opcode,
        destination: DestinationOperand,
        sources: [Option<SourceOperand>; 3],
    ) -> Self {
        Instruction {
            opcode,
            destination: Some(destination),
            secondary_destination: None,
            sources,
            paired_ilu_opcode: None,
            paired_ilu_destination: None,
            paired_ilu_secondary_destination: None,
        }
    }

    fn destinations(&self) -> impl Iterator<Item = &DestinationOperand> {
        self.destination
            .iter()
            .chain(self.secondary_destination.iter())
    }

    /// True if the primary operation writes temporary register 1.
    pub fn targets_r1(&self) -> bool {
        self.destinations()
            .any(|d| d.targets_temporary() && d.index == 1)
    }

    /// True if the primary operation writes any temporary register.
    pub fn targets_temporary(&self) -> bool {
        self.destinations().any(|d| d.targets_temporary())
    }

    /// True if the primary operation writes an output or constant register.
    pub fn targets_output(&self) -> bool {
        self.destinations().any(|d| !d.targets_temporary())
    }

    pub fn identical_inputs(&self, other: &Instruction) -> bool {
        self.sources == other.sources
    }

    /// Moves lane A into lane C (ILU operations read only via C).
    pub fn rotate_a_to_c(&mut self) {
        self.sources.swap(0, 2);
    }

    /// Moves lane B into lane C (ADD/SUB read via A and C).
    pub fn rotate_b_to_c(&mut self) {
        self.sources.swap(1, 2);
    }
}
