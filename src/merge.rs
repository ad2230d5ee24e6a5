//! The pairing/merge engine.
//!
//! A group of 1..=4 operations that shared a `+` marker on one program line
//! is packed into a single hardware instruction holding at most one MAC and
//! one ILU operation. Same-unit duplicates must be dual writes (identical
//! opcode and inputs, one temporary and one output target); MOVs are
//! distributed to whichever unit is still free, constrained by the rule that
//! the ILU can only write temporary R1.

use std::fmt;

use tracing::warn;

use crate::error::AsmError;
use crate::instruction::Instruction;
use crate::opcode::Opcode;

/// An instruction along with the pretty-printed source it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedOp {
    pub ins: Instruction,
    pub text: String,
}

impl SourcedOp {
    pub fn new(ins: Instruction, text: impl Into<String>) -> Self {
        SourcedOp {
            ins,
            text: text.into(),
        }
    }
}

/// Reasons a group cannot be packed into one hardware instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeConflict {
    ConflictingOperations,
    DifferentInputs,
    BothTemporaries,
    BothOutputs,
    TooManyInputSets,
    MultipleR1Movs,
    MultipleOutputMovs,
    MultipleTempMovs,
    IluNonR1Temporary,
    TooManyMac,
    TooManyIlu,
    UnexpectedMovState,
}

impl fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MergeConflict::ConflictingOperations => "conflicting operations",
            MergeConflict::DifferentInputs => "operations have different inputs",
            MergeConflict::BothTemporaries => "operations both target temporary registers",
            MergeConflict::BothOutputs => "operations both target output registers",
            MergeConflict::TooManyInputSets => "more than 2 distinct sets of inputs",
            MergeConflict::MultipleR1Movs => "more than 1 MOV targets R1",
            MergeConflict::MultipleOutputMovs => "more than 1 MOV targets an output register",
            MergeConflict::MultipleTempMovs => {
                "more than 1 MOV targets a non-R1 temporary register"
            }
            MergeConflict::IluNonR1Temporary => {
                "ILU operation may not target non-R1 temporary registers"
            }
            MergeConflict::TooManyMac => "more than 2 MAC operations",
            MergeConflict::TooManyIlu => "more than 2 ILU operations",
            MergeConflict::UnexpectedMovState => "unexpected MOV processing state",
        };
        f.write_str(text)
    }
}

/// Merges one or two same-unit operations into a single op.
///
/// Two operations must form a dual write: same opcode, identical inputs, one
/// targeting a temporary and the other an output/constant register. The
/// non-temporary destination stays primary.
pub(crate) fn merge_pair(mut ops: Vec<SourcedOp>) -> Result<SourcedOp, MergeConflict> {
    if ops.len() == 1 {
        return Ok(ops.pop().expect("length checked"));
    }

    if ops.len() != 2 || ops[0].ins.opcode != ops[1].ins.opcode {
        return Err(MergeConflict::ConflictingOperations);
    }
    if !ops[0].ins.identical_inputs(&ops[1].ins) {
        return Err(MergeConflict::DifferentInputs);
    }

    // Reorder so the temporary target comes last.
    if ops[0]
        .ins
        .destination
        .as_ref()
        .is_some_and(|d| d.targets_temporary())
    {
        ops.swap(0, 1);
    }

    let temp_op = ops.pop().expect("length checked");
    let mut output_op = ops.pop().expect("length checked");

    if output_op
        .ins
        .destination
        .as_ref()
        .is_some_and(|d| d.targets_temporary())
    {
        return Err(MergeConflict::BothTemporaries);
    }
    let temp_destination = temp_op.ins.destination;
    if !temp_destination.is_some_and(|d| d.targets_temporary()) {
        return Err(MergeConflict::BothOutputs);
    }

    output_op.ins.secondary_destination = temp_destination;
    output_op.text = format!("{} + {}", output_op.text, temp_op.text);
    Ok(output_op)
}

/// Distributes merged MOV operations into the free unit slots.
pub(crate) fn distribute_movs(
    movs: Vec<SourcedOp>,
    mac_ops: &mut Vec<SourcedOp>,
    ilu_ops: &mut Vec<SourcedOp>,
) -> Result<(), MergeConflict> {
    // Group by identical inputs, preserving source order.
    let mut groups: Vec<Vec<SourcedOp>> = Vec::new();
    for op in movs {
        match groups
            .iter_mut()
            .find(|g| g[0].ins.identical_inputs(&op.ins))
        {
            Some(group) => group.push(op),
            None => groups.push(vec![op]),
        }
    }
    if groups.len() > 2 {
        return Err(MergeConflict::TooManyInputSets);
    }

    let mut r1_target: Option<SourcedOp> = None;
    let mut output_target: Option<SourcedOp> = None;
    let mut temp_target: Option<SourcedOp> = None;

    for group in groups {
        let merged = merge_pair(group)?;

        let targets_r1 = merged.ins.targets_r1();
        let targets_temp = merged.ins.targets_temporary();
        let targets_output = merged.ins.targets_output();
        if targets_r1 {
            if r1_target.is_some() {
                return Err(MergeConflict::MultipleR1Movs);
            }
            r1_target = Some(merged.clone());
        }
        if targets_output {
            if output_target.is_some() {
                return Err(MergeConflict::MultipleOutputMovs);
            }
            output_target = Some(merged.clone());
        }
        if targets_temp && !targets_r1 {
            if temp_target.is_some() {
                return Err(MergeConflict::MultipleTempMovs);
            }
            temp_target = Some(merged);
        }
    }

    // A dual write that claimed both the output slot and a temporary slot is
    // covered by the temporary classification alone.
    let same_op = |a: &Option<SourcedOp>, b: &Option<SourcedOp>| {
        matches!((a, b), (Some(a), Some(b)) if a.ins == b.ins)
    };
    if same_op(&output_target, &r1_target) || same_op(&output_target, &temp_target) {
        output_target = None;
    }

    // A non-MOV MAC operation forces every MOV onto the ILU, which cannot
    // write non-R1 temporaries.
    if !mac_ops.is_empty() {
        if temp_target.is_some() {
            return Err(MergeConflict::IluNonR1Temporary);
        }
        if let Some(mut op) = output_target {
            op.ins.rotate_a_to_c();
            ilu_ops.push(op);
        }
        if let Some(mut op) = r1_target {
            op.ins.rotate_a_to_c();
            ilu_ops.push(op);
        }
        return Ok(());
    }

    // A non-MOV ILU operation forces every MOV onto the MAC.
    if !ilu_ops.is_empty() {
        if let Some(op) = temp_target {
            mac_ops.push(op);
        }
        if let Some(op) = output_target {
            mac_ops.push(op);
        }
        if let Some(op) = r1_target {
            mac_ops.push(op);
        }
        return Ok(());
    }

    // Only MOVs remain. A non-R1 temporary write must take the MAC slot.
    if let Some(op) = temp_target {
        mac_ops.push(op);
        if let Some(mut op) = output_target {
            op.ins.rotate_a_to_c();
            ilu_ops.push(op);
        } else if let Some(mut op) = r1_target {
            op.ins.rotate_a_to_c();
            ilu_ops.push(op);
        }
        return Ok(());
    }

    match (output_target, r1_target) {
        // Two distinct MOVs: the output write runs on the MAC, the R1
        // write on the ILU.
        (Some(output), Some(mut r1)) => {
            mac_ops.push(output);
            r1.ins.rotate_a_to_c();
            ilu_ops.push(r1);
            Ok(())
        }
        (None, Some(r1)) => {
            mac_ops.push(r1);
            Ok(())
        }
        _ => Err(MergeConflict::UnexpectedMovState),
    }
}

/// Packs a combined group into one instruction, or fails.
pub fn combine_group(operations: Vec<SourcedOp>, line: u32) -> Result<SourcedOp, AsmError> {
    let mut mac_ops: Vec<SourcedOp> = Vec::new();
    let mut ilu_ops: Vec<SourcedOp> = Vec::new();
    let mut mov_ops: Vec<SourcedOp> = Vec::new();

    for mut op in operations {
        if op.ins.opcode == Opcode::Mov {
            mov_ops.push(op);
        } else if op.ins.opcode.is_ilu() {
            op.ins.rotate_a_to_c();
            ilu_ops.push(op);
        } else {
            if matches!(op.ins.opcode, Opcode::Add | Opcode::Sub) {
                op.ins.rotate_b_to_c();
            }
            mac_ops.push(op);
        }
    }

    if mac_ops.len() > 1 {
        let merged = merge_pair(mac_ops)
            .map_err(|reason| AsmError::ConflictingMacOperations { reason, line })?;
        mac_ops = vec![merged];
    }
    if ilu_ops.len() > 1 {
        let merged = merge_pair(ilu_ops)
            .map_err(|reason| AsmError::ConflictingIluOperations { reason, line })?;
        ilu_ops = vec![merged];
    }

    if !mov_ops.is_empty() {
        distribute_movs(mov_ops, &mut mac_ops, &mut ilu_ops)
            .map_err(|reason| AsmError::InvalidPairing { reason, line })?;
    }

    if mac_ops.len() > 1 {
        return Err(AsmError::InvalidPairing {
            reason: MergeConflict::TooManyMac,
            line,
        });
    }
    if ilu_ops.len() > 1 {
        return Err(AsmError::InvalidPairing {
            reason: MergeConflict::TooManyIlu,
            line,
        });
    }

    match (mac_ops.pop(), ilu_ops.pop()) {
        (Some(mut mac), Some(ilu)) => {
            let input_c = mac.ins.sources[2];
            if input_c.is_some() && input_c != ilu.ins.sources[2] {
                return Err(AsmError::PairedInputMismatch);
            }
            if mac.ins.targets_r1() {
                warn!(line, "MAC write to R1 is discarded by the hardware when an ILU operation is paired");
            }
            mac.ins.sources[2] = ilu.ins.sources[2];
            mac.ins.paired_ilu_opcode = Some(ilu.ins.opcode);
            mac.ins.paired_ilu_destination = ilu.ins.destination;
            mac.ins.paired_ilu_secondary_destination = ilu.ins.secondary_destination;
            mac.text = format!("{} + {}", mac.text, ilu.text);
            Ok(mac)
        }
        (Some(mac), None) => Ok(mac),
        (None, Some(ilu)) => Ok(ilu),
        (None, None) => Err(AsmError::Internal(
            "combined group resolved to no operations".into(),
        )),
    }
}
