//! Static register name tables for the nv2a vertex pipeline.

/// Input attribute aliases. Several semantic names map onto the same
/// register index as the plain `vN` form.
pub const INPUT_ALIASES: &[(&str, u8)] = &[
    ("v0", 0),
    ("ipos", 0),
    ("v1", 1),
    ("iweight", 1),
    ("v2", 2),
    ("inormal", 2),
    ("v3", 3),
    ("idiffuse", 3),
    ("v4", 4),
    ("ispecular", 4),
    ("v5", 5),
    ("ifog", 5),
    ("v6", 6),
    ("ipts", 6),
    ("v7", 7),
    ("ibackdiffuse", 7),
    ("v8", 8),
    ("ibackspecular", 8),
    ("v9", 9),
    ("itex0", 9),
    ("v10", 10),
    ("itex1", 10),
    ("v11", 11),
    ("itex2", 11),
    ("v12", 12),
    ("itex3", 12),
    ("v13", 13),
    ("v14", 14),
    ("v15", 15),
];

/// Case-insensitive input register lookup.
pub fn input_register(name: &str) -> Option<u8> {
    let lower = name.to_ascii_lowercase();
    INPUT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|&(_, index)| index)
}

/// Result registers addressable through the shared output-address field.
///
/// Indices 1, 2, 13 and 14 are not wired on the hardware; `Address` is the
/// pseudo-slot used when rendering ARL destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputRegister {
    Position = 0,
    Diffuse = 3,
    Specular = 4,
    FogCoord = 5,
    PointSize = 6,
    BackDiffuse = 7,
    BackSpecular = 8,
    Tex0 = 9,
    Tex1 = 10,
    Tex2 = 11,
    Tex3 = 12,
    Address = 13,
}

impl OutputRegister {
    pub fn from_index(index: u8) -> Option<Self> {
        Some(match index {
            0 => OutputRegister::Position,
            3 => OutputRegister::Diffuse,
            4 => OutputRegister::Specular,
            5 => OutputRegister::FogCoord,
            6 => OutputRegister::PointSize,
            7 => OutputRegister::BackDiffuse,
            8 => OutputRegister::BackSpecular,
            9 => OutputRegister::Tex0,
            10 => OutputRegister::Tex1,
            11 => OutputRegister::Tex2,
            12 => OutputRegister::Tex3,
            13 => OutputRegister::Address,
            _ => return None,
        })
    }

    /// The verbose spelling used in listings.
    pub fn long_name(self) -> &'static str {
        match self {
            OutputRegister::Position => "oPos",
            OutputRegister::Diffuse => "oDiffuse",
            OutputRegister::Specular => "oSpecular",
            OutputRegister::FogCoord => "oFog",
            OutputRegister::PointSize => "oPts",
            OutputRegister::BackDiffuse => "oBackDiffuse",
            OutputRegister::BackSpecular => "oBackSpecular",
            OutputRegister::Tex0 => "oTex0",
            OutputRegister::Tex1 => "oTex1",
            OutputRegister::Tex2 => "oTex2",
            OutputRegister::Tex3 => "oTex3",
            OutputRegister::Address => "A0",
        }
    }

    /// The compact spelling used by the disassembler.
    pub fn short_name(self) -> &'static str {
        match self {
            OutputRegister::Position => "oPos",
            OutputRegister::Diffuse => "oD0",
            OutputRegister::Specular => "oD1",
            OutputRegister::FogCoord => "oFog",
            OutputRegister::PointSize => "oPts",
            OutputRegister::BackDiffuse => "oB0",
            OutputRegister::BackSpecular => "oB1",
            OutputRegister::Tex0 => "oT0",
            OutputRegister::Tex1 => "oT1",
            OutputRegister::Tex2 => "oT2",
            OutputRegister::Tex3 => "oT3",
            OutputRegister::Address => "A0",
        }
    }
}

/// Output alias lookup. Both long and short names are accepted; matching is
/// case-sensitive like the assembly surface itself.
pub fn output_register(name: &str) -> Option<OutputRegister> {
    Some(match name {
        "oPos" => OutputRegister::Position,
        "oD0" | "oDiffuse" => OutputRegister::Diffuse,
        "oD1" | "oSpecular" => OutputRegister::Specular,
        "oFog" => OutputRegister::FogCoord,
        "oPts" => OutputRegister::PointSize,
        "oB0" | "oBackDiffuse" => OutputRegister::BackDiffuse,
        "oB1" | "oBackSpecular" => OutputRegister::BackSpecular,
        "oT0" | "oTex0" => OutputRegister::Tex0,
        "oT1" | "oTex1" => OutputRegister::Tex1,
        "oT2" | "oTex2" => OutputRegister::Tex2,
        "oT3" | "oTex3" => OutputRegister::Tex3,
        _ => return None,
    })
}
