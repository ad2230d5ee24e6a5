//! Disassembly of machine code captured from real programs.

use nv2avsh_rs::disasm::{disassemble, disassemble_instruction};
use nv2avsh_rs::{AsmError, EncodedInstruction};

fn assert_disasm(expected: &str, words: [u32; 4]) {
    let result = disassemble(&[words]).expect("disassembly should succeed");
    assert_eq!(vec![expected.to_string()], result);
}

#[test]
fn empty_stream() {
    assert_eq!(disassemble(&[]).unwrap(), Vec::<String>::new());
}

#[test]
fn explicit_nop() {
    assert_disasm("/* 0, 0, 0, 0 */", [0, 0, 0, 0]);
}

#[test]
fn single_mac_operations() {
    assert_disasm(
        "MOV oT2.xyzw, v11",
        [0x00000000, 0x0020161B, 0x0836106C, 0x2070F858],
    );
    assert_disasm(
        "MAD oPos.xyz, R12, R1.x, c[59]",
        [0x00000000, 0x0087601B, 0xC400286C, 0x3070E801],
    );
    assert_disasm(
        "DP4 oPos.z, v0, c[100]",
        [0x00000000, 0x00EC801B, 0x0836186C, 0x20702800],
    );
    assert_disasm(
        "MUL oPos.xyz, R12.xyz, c[58].xyz",
        [0x00000000, 0x0047401A, 0xC434186C, 0x2070E800],
    );
}

#[test]
fn ambiguous_encodings_decode_to_the_same_text() {
    // These two differ only in unused fields.
    assert_disasm(
        "MAD R0.z, R0.z, c[117].z, -c[117].w",
        [0x00000000, 0x008EA0AA, 0x05541FFC, 0x32000FF8],
    );
    assert_disasm(
        "MAD R0.z, R0.z, c[117].z, -c[117].w",
        [0x00000000, 0x008EA0AA, 0x0554BFFD, 0x72000000],
    );
}

#[test]
fn arl_synthesizes_its_destination() {
    assert_disasm(
        "ARL A0, R0.x",
        [0x00000000, 0x01A00000, 0x0436106C, 0x20700FF8],
    );
}

#[test]
fn relative_constant_reads() {
    assert_disasm(
        "ADD R0.xy, c[A0+121].zw, -c[A0+121].xy",
        [0x00000000, 0x006F20BF, 0x9C001456, 0x7C000002],
    );
}

#[test]
fn lone_ilu_operation() {
    assert_disasm(
        "RCP oFog.xyzw, v0.w",
        [0x00000000, 0x0400001B, 0x083613FC, 0x2070F82C],
    );
}

#[test]
fn paired_operations() {
    assert_disasm(
        "MUL R2.xyzw, R1, c[0] + MOV oD1.xyzw, v4",
        [0x00000000, 0x0240081B, 0x1436186C, 0x2F20F824],
    );
    assert_disasm(
        "MOV oD0.xyzw, v3 + RCP R1.w, R1.w",
        [0x00000000, 0x0420061B, 0x083613FC, 0x5011F818],
    );
    assert_disasm(
        "DP4 oPos.x, R6, c[96] + RSQ R1.x, R2.x",
        [0x00000000, 0x08EC001B, 0x64361800, 0x90A88800],
    );
}

#[test]
fn dual_write_renders_two_lines() {
    assert_disasm(
        "DP4 oPos.z, R6, c[98] + DP4 R0.x, R6, c[98]",
        [0x00000000, 0x00EC401B, 0x64365800, 0x28002800],
    );
}

#[test]
fn constant_register_destination() {
    assert_disasm(
        "DPH c[15].xy, v4, c[10]",
        [0x00000000, 0x00C1481B, 0x0836186C, 0x2070C078],
    );
}

#[test]
fn paired_ilu_temporary_write_displays_r1() {
    // R10 is encoded, but a paired ILU write always lands in R1.
    assert_disasm(
        "DP4 oPos.x, R6, c[96] + RSQ R1.x, R2.x",
        [0x00000000, 0x08EC001B, 0x64361800, 0x90A88800],
    );
}

#[test]
fn structured_form_reports_units() {
    let ins = EncodedInstruction::from_words(&[0x00000000, 0x0240081B, 0x1436186C, 0x2F20F824])
        .unwrap();
    let decoded = disassemble_instruction(&ins).unwrap();

    let mac = decoded.mac.expect("mac unit active");
    assert_eq!(mac.mnemonic, "MUL");
    assert_eq!(mac.outputs, vec!["R2.xyzw"]);
    assert_eq!(mac.inputs, vec!["R1", "c[0]"]);

    let ilu = decoded.ilu.expect("ilu unit active");
    assert_eq!(ilu.mnemonic, "MOV");
    assert_eq!(ilu.outputs, vec!["oD1.xyzw"]);
    assert_eq!(ilu.inputs, vec!["v4"]);
}

#[test]
fn word_zero_must_be_zero() {
    assert!(matches!(
        disassemble(&[[1, 0, 0, 0]]),
        Err(AsmError::ReservedWordNotZero { word: 1 })
    ));
}
