use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::registers::OutputRegister;

/// Logical groupings of I/O registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterFile {
    /// r0..r12 registers
    Temporary,
    /// v0..v15 vertex attributes
    Input,
    /// oPos, oD0, ... result registers
    Output,
    /// c[0..191] host-supplied constants
    EnvironmentConstant,
    /// A0, the relative-addressing register
    Address,
    Undefined,
}

/// One axis selector of a source swizzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Component {
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
}

impl Component {
    /// Accepts both xyzw and the rgba aliases.
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c.to_ascii_lowercase() {
            'x' | 'r' => Component::X,
            'y' | 'g' => Component::Y,
            'z' | 'b' => Component::Z,
            'w' | 'a' => Component::W,
            _ => return None,
        })
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Component::X,
            1 => Component::Y,
            2 => Component::Z,
            3 => Component::W,
            _ => return None,
        })
    }

    pub fn name(self) -> char {
        match self {
            Component::X => 'x',
            Component::Y => 'y',
            Component::Z => 'z',
            Component::W => 'w',
        }
    }
}

/// Per-axis component selection applied to a source operand.
///
/// The canonical suffix drops trailing repetitions of the last component, so
/// `zwww` prints as `zw` and parsing a short suffix repeats its final
/// component. The two directions are bijective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Swizzle(pub [Component; 4]);

impl Swizzle {
    pub const XYZW: Swizzle = Swizzle([Component::X, Component::Y, Component::Z, Component::W]);
    pub const XXXX: Swizzle = Swizzle([Component::X; 4]);
    pub const YYYY: Swizzle = Swizzle([Component::Y; 4]);
    pub const ZZZZ: Swizzle = Swizzle([Component::Z; 4]);
    pub const WWWW: Swizzle = Swizzle([Component::W; 4]);

    pub fn splat(c: Component) -> Self {
        Swizzle([c; 4])
    }

    /// Builds a swizzle from 1..=4 components, repeating the last one.
    pub fn from_components(components: &[Component]) -> Option<Self> {
        let (&last, _) = components.split_last()?;
        if components.len() > 4 {
            return None;
        }
        let mut out = [last; 4];
        out[..components.len()].copy_from_slice(components);
        Some(Swizzle(out))
    }

    /// Parses a suffix such as `zw` or `xyzw` (rgba accepted).
    pub fn parse(text: &str) -> Option<Self> {
        let components: Option<Vec<Component>> = text.chars().map(Component::from_char).collect();
        Self::from_components(&components?)
    }

    pub fn component(self, index: usize) -> Component {
        self.0[index]
    }

    /// Shortest suffix that re-expands to this swizzle; `xyzw` for identity.
    pub fn suffix(self) -> String {
        let mut len = 4;
        while len > 1 && self.0[len - 1] == self.0[len - 2] {
            len -= 1;
        }
        self.0[..len].iter().map(|c| c.name()).collect()
    }
}

impl fmt::Display for Swizzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

bitflags! {
    /// Which destination components an operation updates.
    ///
    /// The bit order here matches the write-mask suffix text (x lowest); the
    /// hardware mask fields use the reversed order, see `hardware_bits`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct WriteMask: u8 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
        const W = 1 << 3;
    }
}

impl WriteMask {
    pub const XYZW: WriteMask = WriteMask::all();

    /// `.xy`-style suffix; the full mask renders as the empty string.
    pub fn suffix(self) -> String {
        if self == WriteMask::all() {
            return String::new();
        }
        let mut out = String::from(".");
        for (flag, name) in [
            (WriteMask::X, 'x'),
            (WriteMask::Y, 'y'),
            (WriteMask::Z, 'z'),
            (WriteMask::W, 'w'),
        ] {
            if self.contains(flag) {
                out.push(name);
            }
        }
        out
    }

    /// Parses a mask suffix (without the dot). Components must appear in
    /// canonical x, y, z, w order; rgba aliases are accepted.
    pub fn parse(text: &str) -> Option<Self> {
        let mut mask = WriteMask::empty();
        let mut last: Option<Component> = None;
        for c in text.chars() {
            let component = Component::from_char(c)?;
            if let Some(prev) = last {
                if component as u32 <= prev as u32 {
                    return None;
                }
            }
            last = Some(component);
            mask |= match component {
                Component::X => WriteMask::X,
                Component::Y => WriteMask::Y,
                Component::Z => WriteMask::Z,
                Component::W => WriteMask::W,
            };
        }
        if mask.is_empty() {
            return None;
        }
        Some(mask)
    }

    /// The hardware mask field value (x=8, y=4, z=2, w=1).
    pub fn hardware_bits(self) -> u32 {
        let mut bits = 0;
        if self.contains(WriteMask::X) {
            bits |= 8;
        }
        if self.contains(WriteMask::Y) {
            bits |= 4;
        }
        if self.contains(WriteMask::Z) {
            bits |= 2;
        }
        if self.contains(WriteMask::W) {
            bits |= 1;
        }
        bits
    }

    pub fn from_hardware_bits(bits: u32) -> Option<Self> {
        if bits > 0xF {
            return None;
        }
        let mut mask = WriteMask::empty();
        if bits & 8 != 0 {
            mask |= WriteMask::X;
        }
        if bits & 4 != 0 {
            mask |= WriteMask::Y;
        }
        if bits & 2 != 0 {
            mask |= WriteMask::Z;
        }
        if bits & 1 != 0 {
            mask |= WriteMask::W;
        }
        Some(mask)
    }
}

/// A resolved source operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOperand {
    pub file: RegisterFile,
    pub index: u8,
    pub swizzle: Swizzle,
    /// Only meaningful for EnvironmentConstant reads (`c[A0+n]`).
    pub relative: bool,
    pub negate: bool,
}

impl SourceOperand {
    pub fn new(file: RegisterFile, index: u8) -> Self {
        SourceOperand {
            file,
            index,
            swizzle: Swizzle::XYZW,
            relative: false,
            negate: false,
        }
    }

    pub fn with_swizzle(mut self, swizzle: Swizzle) -> Self {
        self.swizzle = swizzle;
        self
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    pub fn relative(mut self) -> Self {
        self.relative = true;
        self
    }
}

impl fmt::Display for SourceOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            write!(f, "-")?;
        }
        match self.file {
            RegisterFile::Temporary => write!(f, "r{}", self.index)?,
            RegisterFile::Input => write!(f, "v{}", self.index)?,
            RegisterFile::EnvironmentConstant => {
                if self.relative {
                    write!(f, "c[A0+{}]", self.index)?;
                } else {
                    write!(f, "c[{}]", self.index)?;
                }
            }
            RegisterFile::Address => write!(f, "A0")?,
            RegisterFile::Output | RegisterFile::Undefined => write!(f, "<invalid>")?,
        }
        if self.swizzle != Swizzle::XYZW {
            write!(f, ".{}", self.swizzle.suffix())?;
        }
        Ok(())
    }
}

/// A resolved destination operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationOperand {
    pub file: RegisterFile,
    pub index: u8,
    pub write_mask: WriteMask,
    pub relative: bool,
}

impl DestinationOperand {
    pub fn new(file: RegisterFile, index: u8) -> Self {
        DestinationOperand {
            file,
            index,
            write_mask: WriteMask::XYZW,
            relative: false,
        }
    }

    pub fn with_mask(mut self, mask: WriteMask) -> Self {
        self.write_mask = mask;
        self
    }

    pub fn targets_temporary(&self) -> bool {
        self.file == RegisterFile::Temporary
    }
}

impl fmt::Display for DestinationOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file {
            RegisterFile::Temporary => write!(f, "r{}", self.index)?,
            RegisterFile::Output | RegisterFile::Address => {
                match OutputRegister::from_index(self.index) {
                    Some(reg) => write!(f, "{}", reg.long_name())?,
                    None => write!(f, "o{}", self.index)?,
                }
            }
            RegisterFile::EnvironmentConstant => write!(f, "c[{}]", self.index)?,
            RegisterFile::Input | RegisterFile::Undefined => write!(f, "<invalid>")?,
        }
        write!(f, "{}", self.write_mask.suffix())
    }
}
