use serde::{Deserialize, Serialize};

/// The full semantic opcode set exposed by the hardware.
///
/// MOV has no fixed unit; the merge engine decides whether it runs on the
/// MAC or the ILU. SUB is accepted by the builder but rejected at encode
/// time (see `encoder`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opcode {
    Mov,
    Add,
    Sub,
    Mul,
    Mad,
    Dp3,
    Dp4,
    Dph,
    Dst,
    Min,
    Max,
    Sge,
    Slt,
    Rcp,
    Rcc,
    Rsq,
    Exp,
    Log,
    Lit,
    Arl,
}

impl Opcode {
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        let m = mnemonic.to_ascii_lowercase();
        Some(match m.as_str() {
            "mov" => Opcode::Mov,
            "add" => Opcode::Add,
            "sub" => Opcode::Sub,
            "mul" => Opcode::Mul,
            "mad" => Opcode::Mad,
            "dp3" => Opcode::Dp3,
            "dp4" => Opcode::Dp4,
            "dph" => Opcode::Dph,
            "dst" => Opcode::Dst,
            "min" => Opcode::Min,
            "max" => Opcode::Max,
            "sge" => Opcode::Sge,
            "slt" => Opcode::Slt,
            "rcp" => Opcode::Rcp,
            "rcc" => Opcode::Rcc,
            "rsq" => Opcode::Rsq,
            "exp" | "expp" => Opcode::Exp,
            "log" | "logp" => Opcode::Log,
            "lit" => Opcode::Lit,
            "arl" => Opcode::Arl,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Mov => "mov",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Mad => "mad",
            Opcode::Dp3 => "dp3",
            Opcode::Dp4 => "dp4",
            Opcode::Dph => "dph",
            Opcode::Dst => "dst",
            Opcode::Min => "min",
            Opcode::Max => "max",
            Opcode::Sge => "sge",
            Opcode::Slt => "slt",
            Opcode::Rcp => "rcp",
            Opcode::Rcc => "rcc",
            Opcode::Rsq => "rsq",
            Opcode::Exp => "exp",
            Opcode::Log => "log",
            Opcode::Lit => "lit",
            Opcode::Arl => "arl",
        }
    }

    /// True for operations that execute on the inverse/transcendental unit.
    pub fn is_ilu(self) -> bool {
        matches!(
            self,
            Opcode::Rcp | Opcode::Rcc | Opcode::Rsq | Opcode::Exp | Opcode::Log | Opcode::Lit
        )
    }

    pub fn is_mac(self) -> bool {
        !self.is_ilu()
    }

    /// Number of source operands the textual form carries.
    pub fn source_arity(self) -> usize {
        match self {
            Opcode::Mov | Opcode::Arl => 1,
            Opcode::Rcp | Opcode::Rcc | Opcode::Rsq | Opcode::Exp | Opcode::Log | Opcode::Lit => 1,
            Opcode::Mad => 3,
            _ => 2,
        }
    }
}

/// MAC unit operation codes as encoded in the instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MacCode {
    Nop = 0,
    Mov = 1,
    Mul = 2,
    Add = 3,
    Mad = 4,
    Dp3 = 5,
    Dph = 6,
    Dp4 = 7,
    Dst = 8,
    Min = 9,
    Max = 10,
    Slt = 11,
    Sge = 12,
    Arl = 13,
}

impl MacCode {
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => MacCode::Nop,
            1 => MacCode::Mov,
            2 => MacCode::Mul,
            3 => MacCode::Add,
            4 => MacCode::Mad,
            5 => MacCode::Dp3,
            6 => MacCode::Dph,
            7 => MacCode::Dp4,
            8 => MacCode::Dst,
            9 => MacCode::Min,
            10 => MacCode::Max,
            11 => MacCode::Slt,
            12 => MacCode::Sge,
            13 => MacCode::Arl,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            MacCode::Nop => "NOP",
            MacCode::Mov => "MOV",
            MacCode::Mul => "MUL",
            MacCode::Add => "ADD",
            MacCode::Mad => "MAD",
            MacCode::Dp3 => "DP3",
            MacCode::Dph => "DPH",
            MacCode::Dp4 => "DP4",
            MacCode::Dst => "DST",
            MacCode::Min => "MIN",
            MacCode::Max => "MAX",
            MacCode::Slt => "SLT",
            MacCode::Sge => "SGE",
            MacCode::Arl => "ARL",
        }
    }
}

/// ILU unit operation codes as encoded in the instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum IluCode {
    Nop = 0,
    Mov = 1,
    Rcp = 2,
    Rcc = 3,
    Rsq = 4,
    Exp = 5,
    Log = 6,
    Lit = 7,
}

impl IluCode {
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => IluCode::Nop,
            1 => IluCode::Mov,
            2 => IluCode::Rcp,
            3 => IluCode::Rcc,
            4 => IluCode::Rsq,
            5 => IluCode::Exp,
            6 => IluCode::Log,
            7 => IluCode::Lit,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            IluCode::Nop => "NOP",
            IluCode::Mov => "MOV",
            IluCode::Rcp => "RCP",
            IluCode::Rcc => "RCC",
            IluCode::Rsq => "RSQ",
            IluCode::Exp => "EXP",
            IluCode::Log => "LOG",
            IluCode::Lit => "LIT",
        }
    }
}
