//! Bit-exact encoding of hand-built semantic instructions.

use nv2avsh_rs::encoder::encode;
use nv2avsh_rs::operand::{Component, Swizzle};
use nv2avsh_rs::registers::OutputRegister;
use nv2avsh_rs::{
    diff, AsmError, DestinationOperand, EncodedInstruction, Instruction, Opcode, RegisterFile,
    SourceOperand, WriteMask,
};

fn temp_dst(index: u8) -> DestinationOperand {
    DestinationOperand::new(RegisterFile::Temporary, index)
}

fn out_dst(reg: OutputRegister) -> DestinationOperand {
    DestinationOperand::new(RegisterFile::Output, reg as u8)
}

fn temp(index: u8) -> SourceOperand {
    SourceOperand::new(RegisterFile::Temporary, index)
}

fn input(index: u8) -> SourceOperand {
    SourceOperand::new(RegisterFile::Input, index)
}

fn constant(index: u8) -> SourceOperand {
    SourceOperand::new(RegisterFile::EnvironmentConstant, index)
}

fn assert_vsh(expected: [u32; 4], actual: EncodedInstruction) {
    if let Some(report) = diff::report(&expected, &actual.words(), false).expect("diffable words") {
        panic!("{report}");
    }
}

fn assert_program(program: Vec<Instruction>, expected: [u32; 4]) {
    let results = encode(program, false).expect("encoding should succeed");
    assert_eq!(results.len(), 2);
    assert_eq!(results[1].words(), [0, 0, 0, 1]);
    assert_vsh(expected, results[0]);
}

#[test]
fn empty_program() {
    assert!(encode(vec![], false).unwrap().is_empty());
    assert!(encode(vec![], true).unwrap().is_empty());
}

#[test]
fn incompatible_constant_reads_fail() {
    let program = vec![Instruction::new(
        Opcode::Add,
        out_dst(OutputRegister::Position),
        [Some(constant(12)), Some(constant(13)), None],
    )];
    let err = encode(program, false).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Operation reads from more than one C register (c[12] and c[13])"
    );
}

#[test]
fn compatible_constant_reads() {
    let program = vec![Instruction::new(
        Opcode::Add,
        out_dst(OutputRegister::Position),
        [Some(constant(12)), Some(constant(12)), None],
    )];
    assert_program(program, [0x00000000, 0x0061801B, 0x0C36106C, 0x3070F800]);
}

#[test]
fn mov_output_from_input() {
    let program = vec![Instruction::new(
        Opcode::Mov,
        out_dst(OutputRegister::Diffuse),
        [Some(input(3)), None, None],
    )];
    assert_program(program, [0x00000000, 0x0020061B, 0x0836106C, 0x2070F818]);
}

#[test]
fn mov_output_from_temporary_swizzled() {
    let src = temp(0).with_swizzle(Swizzle::from_components(&[Component::X, Component::Y]).unwrap());
    let program = vec![Instruction::new(
        Opcode::Mov,
        out_dst(OutputRegister::Position).with_mask(WriteMask::X | WriteMask::Y),
        [Some(src), None, None],
    )];
    assert_program(program, [0x00000000, 0x00200015, 0x0436106C, 0x2070C800]);
}

#[test]
fn rcp_rotates_source_into_lane_c() {
    let program = vec![Instruction::new(
        Opcode::Rcp,
        out_dst(OutputRegister::FogCoord),
        [Some(input(0).with_swizzle(Swizzle::WWWW)), None, None],
    )];
    assert_program(program, [0x00000000, 0x0400001B, 0x083613FC, 0x2070F82C]);
}

#[test]
fn mul_temporary_from_input_and_constant() {
    let program = vec![Instruction::new(
        Opcode::Mul,
        temp_dst(0).with_mask(WriteMask::X),
        [
            Some(input(0).with_swizzle(Swizzle::XXXX)),
            Some(constant(96).with_swizzle(Swizzle::XXXX)),
            None,
        ],
    )];
    assert_program(program, [0x00000000, 0x004C0000, 0x0800186C, 0x28000FF8]);
}

#[test]
fn add_rotates_lane_b_into_c() {
    let program = vec![Instruction::new(
        Opcode::Add,
        temp_dst(0).with_mask(WriteMask::Y),
        [
            Some(temp(0).with_swizzle(Swizzle::YYYY)),
            Some(constant(97).with_swizzle(Swizzle::WWWW)),
            None,
        ],
    )];
    assert_program(program, [0x00000000, 0x006C2055, 0x043613FC, 0x34000FF8]);
}

#[test]
fn add_with_negated_temporary() {
    let program = vec![Instruction::new(
        Opcode::Add,
        temp_dst(6).with_mask(WriteMask::X | WriteMask::Y | WriteMask::Z),
        [Some(constant(17)), Some(temp(10).negated()), None],
    )];
    assert_program(program, [0x00000000, 0x0062201B, 0x0C36146E, 0x9E600FF8]);
}

#[test]
fn dp4_output_from_input_and_constant() {
    let program = vec![Instruction::new(
        Opcode::Dp4,
        out_dst(OutputRegister::Position).with_mask(WriteMask::X),
        [Some(input(0)), Some(constant(96)), None],
    )];
    assert_program(program, [0x00000000, 0x00EC001B, 0x0836186C, 0x20708800]);
}

#[test]
fn mad_three_sources() {
    let program = vec![Instruction::new(
        Opcode::Mad,
        temp_dst(0).with_mask(WriteMask::X),
        [
            Some(input(0).with_swizzle(Swizzle::YYYY)),
            Some(constant(96).with_swizzle(Swizzle::YYYY)),
            Some(temp(0).with_swizzle(Swizzle::XXXX)),
        ],
    )];
    assert_program(program, [0x00000000, 0x008C0055, 0x08AA1800, 0x18000FF8]);
}

#[test]
fn mad_with_negated_constant() {
    let program = vec![Instruction::new(
        Opcode::Mad,
        temp_dst(0).with_mask(WriteMask::Z),
        [
            Some(temp(0).with_swizzle(Swizzle::ZZZZ)),
            Some(constant(117).with_swizzle(Swizzle::ZZZZ)),
            Some(constant(117).with_swizzle(Swizzle::WWWW).negated()),
        ],
    )];
    assert_program(program, [0x00000000, 0x008EA0AA, 0x05541FFC, 0x32000FF8]);
}

fn paired(
    opcode: Opcode,
    destination: DestinationOperand,
    sources: [Option<SourceOperand>; 3],
    ilu_opcode: Opcode,
    ilu_destination: DestinationOperand,
) -> Instruction {
    let mut ins = Instruction::new(opcode, destination, sources);
    ins.paired_ilu_opcode = Some(ilu_opcode);
    ins.paired_ilu_destination = Some(ilu_destination);
    ins
}

#[test]
fn mac_mov_paired_with_rcp() {
    let program = vec![paired(
        Opcode::Mov,
        out_dst(OutputRegister::Diffuse),
        [
            Some(input(3)),
            None,
            Some(temp(1).with_swizzle(Swizzle::WWWW)),
        ],
        Opcode::Rcp,
        temp_dst(1).with_mask(WriteMask::W),
    )];
    assert_program(program, [0x00000000, 0x0420061B, 0x083613FC, 0x5011F818]);
}

#[test]
fn mac_mov_paired_with_rcc() {
    let program = vec![paired(
        Opcode::Mov,
        out_dst(OutputRegister::Tex1),
        [
            Some(input(3)),
            None,
            Some(temp(12).with_swizzle(Swizzle::WWWW)),
        ],
        Opcode::Rcc,
        temp_dst(1).with_mask(WriteMask::X),
    )];
    assert_program(program, [0x00000000, 0x0620061B, 0x083613FF, 0x1018F850]);
}

#[test]
fn mac_mul_paired_with_rcc() {
    let program = vec![paired(
        Opcode::Mul,
        out_dst(OutputRegister::Diffuse),
        [
            Some(input(1)),
            Some(constant(188)),
            Some(temp(12).with_swizzle(Swizzle::WWWW)),
        ],
        Opcode::Rcc,
        temp_dst(1).with_mask(WriteMask::X),
    )];
    assert_program(program, [0x00000000, 0x0657821B, 0x08361BFF, 0x1018F818]);
}

#[test]
fn mac_mul_paired_with_ilu_mov() {
    let program = vec![paired(
        Opcode::Mul,
        temp_dst(2),
        [Some(temp(1)), Some(constant(0)), Some(input(4))],
        Opcode::Mov,
        out_dst(OutputRegister::Specular),
    )];
    assert_program(program, [0x00000000, 0x0240081B, 0x1436186C, 0x2F20F824]);
}

#[test]
fn mac_mov_paired_with_ilu_mov() {
    let program = vec![paired(
        Opcode::Mov,
        temp_dst(5).with_mask(WriteMask::X | WriteMask::Y | WriteMask::Z),
        [Some(temp(4)), None, Some(input(1))],
        Opcode::Mov,
        out_dst(OutputRegister::Tex0).with_mask(WriteMask::X | WriteMask::Y),
    )];
    assert_program(program, [0x00000000, 0x0220021B, 0x4436106C, 0x2E50C84C]);
}

#[test]
fn mac_mov_constant_paired_with_ilu_mov() {
    let program = vec![paired(
        Opcode::Mov,
        temp_dst(8).with_mask(WriteMask::X | WriteMask::Y | WriteMask::Z),
        [
            Some(constant(27)),
            None,
            Some(input(4).with_swizzle(Swizzle::ZZZZ)),
        ],
        Opcode::Mov,
        out_dst(OutputRegister::Diffuse).with_mask(WriteMask::W),
    )];
    assert_program(program, [0x00000000, 0x0223681B, 0x0C3612A8, 0x2E80181C]);
}

#[test]
fn mac_dp3_paired_with_ilu_mov() {
    let program = vec![paired(
        Opcode::Dp3,
        temp_dst(7).with_mask(WriteMask::W),
        [Some(temp(6)), Some(temp(6)), Some(temp(5))],
        Opcode::Mov,
        out_dst(OutputRegister::Tex3).with_mask(WriteMask::X | WriteMask::Y | WriteMask::Z),
    )];
    assert_program(program, [0x00000000, 0x02A0001B, 0x6436C86D, 0x5170E864]);
}

#[test]
fn secondary_destination_encodes_both_targets() {
    let mut ins = Instruction::new(
        Opcode::Dp4,
        out_dst(OutputRegister::Position).with_mask(WriteMask::Z),
        [Some(temp(6)), Some(constant(98)), None],
    );
    ins.secondary_destination = Some(temp_dst(0).with_mask(WriteMask::X));
    assert_program(vec![ins], [0x00000000, 0x00EC401B, 0x6436186C, 0x28002800]);
}

#[test]
fn sub_is_not_implemented() {
    let program = vec![Instruction::new(
        Opcode::Sub,
        temp_dst(0),
        [Some(input(0)), Some(input(1)), None],
    )];
    assert!(matches!(
        encode(program, false).unwrap_err(),
        AsmError::SubNotImplemented
    ));
}

#[test]
fn address_write_requires_mac_unit() {
    let program = vec![Instruction::new(
        Opcode::Rcp,
        DestinationOperand::new(RegisterFile::Address, OutputRegister::Address as u8),
        [Some(temp(0)), None, None],
    )];
    assert!(matches!(
        encode(program, false).unwrap_err(),
        AsmError::AddressWriteNotMac
    ));
}

#[test]
fn inline_final_sets_flag_without_terminator() {
    let program = vec![Instruction::new(
        Opcode::Mov,
        out_dst(OutputRegister::Diffuse),
        [Some(input(3)), None, None],
    )];
    let results = encode(program, true).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_final());
}
