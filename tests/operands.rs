//! Operand model: swizzle and write-mask suffix bijectivity, rendering.

use pretty_assertions::assert_eq;

use nv2avsh_rs::operand::{Component, DestinationOperand, Swizzle, WriteMask};
use nv2avsh_rs::registers::OutputRegister;
use nv2avsh_rs::{RegisterFile, SourceOperand};

const COMPONENTS: [Component; 4] = [Component::X, Component::Y, Component::Z, Component::W];

#[test]
fn swizzle_suffix_is_bijective_over_all_combinations() {
    for a in COMPONENTS {
        for b in COMPONENTS {
            for c in COMPONENTS {
                for d in COMPONENTS {
                    let swizzle = Swizzle([a, b, c, d]);
                    let suffix = swizzle.suffix();
                    assert_eq!(
                        Swizzle::parse(&suffix),
                        Some(swizzle),
                        "suffix {suffix} does not round trip"
                    );
                }
            }
        }
    }
}

#[test]
fn swizzle_parse_expands_short_suffixes() {
    assert_eq!(Swizzle::parse("x"), Some(Swizzle::XXXX));
    assert_eq!(
        Swizzle::parse("zw"),
        Some(Swizzle([
            Component::Z,
            Component::W,
            Component::W,
            Component::W
        ]))
    );
    assert_eq!(Swizzle::parse("xyzw"), Some(Swizzle::XYZW));
    assert_eq!(Swizzle::parse("rgba"), Some(Swizzle::XYZW));
    assert_eq!(Swizzle::parse(""), None);
    assert_eq!(Swizzle::parse("xyzwx"), None);
    assert_eq!(Swizzle::parse("q"), None);
}

#[test]
fn swizzle_suffix_collapses_trailing_repeats() {
    assert_eq!(Swizzle::XYZW.suffix(), "xyzw");
    assert_eq!(Swizzle::WWWW.suffix(), "w");
    assert_eq!(
        Swizzle([Component::Z, Component::W, Component::W, Component::W]).suffix(),
        "zw"
    );
    // no interior collapse: xxyy is not xy
    assert_eq!(
        Swizzle([Component::X, Component::X, Component::Y, Component::Y]).suffix(),
        "xxyy"
    );
}

#[test]
fn write_mask_suffix_is_bijective_over_all_values() {
    for bits in 1u8..=15 {
        let mask = WriteMask::from_bits(bits).unwrap();
        let suffix = mask.suffix();
        let text = suffix.strip_prefix('.').unwrap_or("xyzw");
        assert_eq!(WriteMask::parse(text), Some(mask), "mask {bits:#06b}");
    }
}

#[test]
fn write_mask_parse_requires_canonical_order() {
    assert_eq!(WriteMask::parse("xz"), Some(WriteMask::X | WriteMask::Z));
    assert_eq!(WriteMask::parse("rgb"), Some(WriteMask::X | WriteMask::Y | WriteMask::Z));
    assert_eq!(WriteMask::parse("zx"), None);
    assert_eq!(WriteMask::parse("xx"), None);
    assert_eq!(WriteMask::parse(""), None);
}

#[test]
fn write_mask_hardware_bits_reverse_component_order() {
    assert_eq!(WriteMask::X.hardware_bits(), 8);
    assert_eq!(WriteMask::W.hardware_bits(), 1);
    assert_eq!((WriteMask::X | WriteMask::Y).hardware_bits(), 12);
    for bits in 0u8..=15 {
        let mask = WriteMask::from_bits(bits).unwrap();
        assert_eq!(WriteMask::from_hardware_bits(mask.hardware_bits()), Some(mask));
    }
}

#[test]
fn source_operand_rendering() {
    let temp = SourceOperand::new(RegisterFile::Temporary, 3)
        .with_swizzle(Swizzle::parse("xyz").unwrap());
    assert_eq!(temp.to_string(), "r3.xyz");

    let constant = SourceOperand::new(RegisterFile::EnvironmentConstant, 12)
        .with_swizzle(Swizzle::WWWW);
    assert_eq!(constant.to_string(), "c[12].w");

    let negated = SourceOperand::new(RegisterFile::Input, 4)
        .with_swizzle(Swizzle::XXXX)
        .negated();
    assert_eq!(negated.to_string(), "-v4.x");

    let relative = SourceOperand::new(RegisterFile::EnvironmentConstant, 60).relative();
    assert_eq!(relative.to_string(), "c[A0+60]");
}

#[test]
fn destination_operand_rendering() {
    let temp = DestinationOperand::new(RegisterFile::Temporary, 3)
        .with_mask(WriteMask::X | WriteMask::Y | WriteMask::Z);
    assert_eq!(temp.to_string(), "r3.xyz");

    let output = DestinationOperand::new(RegisterFile::Output, OutputRegister::Diffuse as u8)
        .with_mask(WriteMask::X | WriteMask::Y);
    assert_eq!(output.to_string(), "oDiffuse.xy");

    let constant = DestinationOperand::new(RegisterFile::EnvironmentConstant, 15);
    assert_eq!(constant.to_string(), "c[15]");

    let address =
        DestinationOperand::new(RegisterFile::Address, OutputRegister::Address as u8);
    assert_eq!(address.to_string(), "A0");
}

#[test]
fn input_aliases_share_indices() {
    use nv2avsh_rs::registers::input_register;
    assert_eq!(input_register("v3"), input_register("idiffuse"));
    assert_eq!(input_register("V3"), Some(3));
    assert_eq!(input_register("itex2"), Some(11));
    assert_eq!(input_register("oPos"), None);
}

#[test]
fn output_aliases_share_registers() {
    use nv2avsh_rs::registers::output_register;
    assert_eq!(output_register("oDiffuse"), output_register("oD0"));
    assert_eq!(output_register("oT3"), output_register("oTex3"));
    assert_eq!(output_register("opos"), None);
}
