//! Description tables for one target game: opcode shapes, waited opcodes,
//! assembly routines, named labels and the code ranges to dump.
//!
//! They come from a JSON data file and stay read-only for the whole run.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::address::{Range, ROM_WINDOW};
use crate::error::{DumpError, Result};

/// Values an argument can be decoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    U8,
    U16,
    S8,
    S16,
    Hex8,
    Hex16,
    Hex24,
    Hex32,
    /// 16-bit pointer into the current bank.
    Label16,
    /// 24-bit absolute pointer.
    Label24,
    /// Object variable index.
    Var,
    /// Index into the operation name table.
    Opr,
}

impl ArgKind {
    /// Bytes consumed from the ROM.
    pub fn width(self) -> u32 {
        match self {
            ArgKind::U8 | ArgKind::S8 | ArgKind::Hex8 | ArgKind::Var | ArgKind::Opr => 1,
            ArgKind::U16 | ArgKind::S16 | ArgKind::Hex16 | ArgKind::Label16 => 2,
            ArgKind::Hex24 | ArgKind::Label24 => 3,
            ArgKind::Hex32 => 4,
        }
    }
}

/// One entry of an `args` list in the data file: either an argument to read
/// or a marker selecting the instruction shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ArgTag {
    Arg(ArgKind),
    /// `multi`: a count byte followed by that many copies of the next tag.
    Multi,
    /// `asm_arg`: a 24-bit pointer to a native routine.
    AsmCall,
}

impl ArgTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ArgTag::Arg(ArgKind::U8) => "u_8",
            ArgTag::Arg(ArgKind::U16) => "u_16",
            ArgTag::Arg(ArgKind::S8) => "s_8",
            ArgTag::Arg(ArgKind::S16) => "s_16",
            ArgTag::Arg(ArgKind::Hex8) => "hex_8",
            ArgTag::Arg(ArgKind::Hex16) => "hex_16",
            ArgTag::Arg(ArgKind::Hex24) => "hex_24",
            ArgTag::Arg(ArgKind::Hex32) => "hex_32",
            ArgTag::Arg(ArgKind::Label16) => "l_16",
            ArgTag::Arg(ArgKind::Label24) => "l_24",
            ArgTag::Arg(ArgKind::Var) => "var",
            ArgTag::Arg(ArgKind::Opr) => "opr",
            ArgTag::Multi => "multi",
            ArgTag::AsmCall => "asm_arg",
        }
    }
}

impl fmt::Display for ArgTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArgTag {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self> {
        let kind = match s {
            "u_8" => ArgKind::U8,
            "u_16" => ArgKind::U16,
            "s_8" => ArgKind::S8,
            "s_16" => ArgKind::S16,
            "hex_8" => ArgKind::Hex8,
            "hex_16" => ArgKind::Hex16,
            "hex_24" => ArgKind::Hex24,
            "hex_32" => ArgKind::Hex32,
            "l_16" => ArgKind::Label16,
            "l_24" => ArgKind::Label24,
            "var" => ArgKind::Var,
            "opr" => ArgKind::Opr,
            "multi" => return Ok(ArgTag::Multi),
            "asm_arg" => return Ok(ArgTag::AsmCall),
            _ => return Err(DumpError::InvalidArgType { tag: s.to_string() }),
        };
        Ok(ArgTag::Arg(kind))
    }
}

impl TryFrom<String> for ArgTag {
    type Error = DumpError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewlinePolicy {
    #[default]
    None,
    /// Blank line ahead of the instruction.
    Before,
    /// Blank line after the instruction.
    After,
    /// The address following the instruction gets a label.
    Label,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpcodeDescriptor {
    pub name: String,
    #[serde(default)]
    pub args: Option<Vec<ArgTag>>,
    #[serde(default)]
    pub terminator: Option<String>,
    #[serde(default)]
    pub newline: NewlinePolicy,
}

/// Sixteen consecutive opcode values starting at `range` that all mean
/// `opcode` followed by a wait of `value - range` frames.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WaitedOpcode {
    pub range: u8,
    pub opcode: u8,
}

impl WaitedOpcode {
    pub const SPAN: u8 = 16;

    /// `(canonical opcode, wait)` when `raw` falls in this block.
    pub fn remap(&self, raw: u8) -> Option<(u8, u8)> {
        let wait = raw.checked_sub(self.range)?;
        (wait < Self::SPAN).then_some((self.opcode, wait))
    }
}

/// Native routine reachable through an `asm_arg` pointer.
#[derive(Debug, Clone, Deserialize)]
pub struct AsmRoutine {
    pub address: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<ArgTag>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedLabel {
    pub address: u32,
    /// Aliases, emitted in order. Never empty.
    pub label: Vec<String>,
    #[serde(default)]
    pub comment: Vec<String>,
}

impl NamedLabel {
    /// Name used by references: the last alias, the one printed right
    /// above the instruction.
    pub fn primary(&self) -> &str {
        self.label.last().map(String::as_str).unwrap_or_default()
    }
}

/// Signature identifying the ROM: `data` is expected at `offset`.
#[derive(Debug, Clone, Deserialize)]
pub struct RomInfo {
    pub name: String,
    pub offset: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct TablesFile {
    rom_info: RomInfo,
    ranges: Vec<Range>,
    max_var: u32,
    max_opr: u32,
    operations: Vec<String>,
    opcodes: Vec<OpcodeDescriptor>,
    waited_opcodes: Vec<WaitedOpcode>,
    routines: Vec<AsmRoutine>,
    labels: Vec<NamedLabel>,
}

/// Validated, indexed view of a data file.
#[derive(Debug, Clone)]
pub struct Tables {
    pub rom_info: RomInfo,
    pub ranges: Vec<Range>,
    pub max_var: u32,
    pub max_opr: u32,
    pub operations: Vec<String>,
    pub opcodes: Vec<OpcodeDescriptor>,
    pub waited_opcodes: Vec<WaitedOpcode>,
    routines: HashMap<u32, AsmRoutine>,
    labels: BTreeMap<u32, NamedLabel>,
}

impl Tables {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let file: TablesFile = serde_json::from_str(s)?;
        Self::try_from(file)
    }

    pub fn from_value(v: serde_json::Value) -> Result<Self> {
        let file: TablesFile = serde_json::from_value(v)?;
        Self::try_from(file)
    }

    pub fn opcode(&self, opcode: u8) -> Option<&OpcodeDescriptor> {
        self.opcodes.get(opcode as usize)
    }

    /// Applies the first waited-opcode block containing `raw`.
    pub fn remap_waited(&self, raw: u8) -> (u8, Option<u8>) {
        self.waited_opcodes
            .iter()
            .find_map(|w| w.remap(raw))
            .map_or((raw, None), |(op, wait)| (op, Some(wait)))
    }

    pub fn routine(&self, address: u32) -> Option<&AsmRoutine> {
        self.routines.get(&address)
    }

    pub fn named_label(&self, address: u32) -> Option<&NamedLabel> {
        self.labels.get(&address)
    }

    /// Named labels in address order.
    pub fn named_labels(&self) -> impl Iterator<Item = &NamedLabel> {
        self.labels.values()
    }

    pub fn operation(&self, index: u8) -> Option<&str> {
        self.operations.get(index as usize).map(String::as_str)
    }
}

fn config_err(msg: impl Into<String>) -> DumpError {
    DumpError::Config(msg.into())
}

impl TryFrom<TablesFile> for Tables {
    type Error = DumpError;

    fn try_from(file: TablesFile) -> Result<Self> {
        if file.opcodes.is_empty() {
            return Err(config_err("the opcode table is empty"));
        }
        if file.rom_info.data.is_empty() {
            return Err(config_err("rom_info.data is empty"));
        }
        if let Some(r) = file.ranges.iter().find(|r| r.start >= r.end) {
            return Err(config_err(format!("range ({:#X}, {:#X}) is empty or inverted", r.start, r.end)));
        }
        if let Some(r) = file.ranges.iter().find(|r| r.end > ROM_WINDOW) {
            return Err(config_err(format!("range ({:#X}, {:#X}) ends past {ROM_WINDOW:#X}", r.start, r.end)));
        }
        // The label merge walks lines and labels in one ascending pass.
        if let Some(w) = file.ranges.windows(2).find(|w| w[0].end > w[1].start) {
            return Err(config_err(format!(
                "range ({:#X}, {:#X}) overlaps or precedes ({:#X}, {:#X})",
                w[1].start, w[1].end, w[0].start, w[0].end
            )));
        }
        if let Some(w) = file.waited_opcodes.iter().find(|w| w.opcode as usize >= file.opcodes.len()) {
            return Err(config_err(format!(
                "waited block {:#X} maps to opcode {:#X} outside the opcode table",
                w.range, w.opcode
            )));
        }

        let mut routines = HashMap::with_capacity(file.routines.len());
        for r in file.routines {
            let addr = r.address;
            if routines.insert(addr, r).is_some() {
                return Err(config_err(format!("routine {addr:#X} is listed twice")));
            }
        }

        let mut labels = BTreeMap::new();
        for l in file.labels {
            let addr = l.address;
            if l.label.is_empty() {
                return Err(config_err(format!("named label at {addr:#X} has no names")));
            }
            if labels.insert(addr, l).is_some() {
                return Err(config_err(format!("named label at {addr:#X} is listed twice")));
            }
        }

        Ok(Self {
            rom_info: file.rom_info,
            ranges: file.ranges,
            max_var: file.max_var,
            max_opr: file.max_opr,
            operations: file.operations,
            opcodes: file.opcodes,
            waited_opcodes: file.waited_opcodes,
            routines,
            labels,
        })
    }
}
