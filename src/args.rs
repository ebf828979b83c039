use std::fmt;

use crate::address::AddressSpace;
use crate::error::{DumpError, Result};
use crate::labels::default_label_name;
use crate::rom::ByteSource;
use crate::tables::{ArgKind, ArgTag, Tables};

/// One decoded argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    U8(u8),
    U16(u16),
    S8(i8),
    S16(i16),
    Hex8(u8),
    Hex16(u16),
    Hex24(u32),
    Hex32(u32),
    Var(u8),
    Opr(u8),
    /// Bank-relative pointer. `label` is set when the target is inside a
    /// code range.
    Ref16 { short: u16, target: u32, label: Option<String> },
    Ref24 { target: u32, label: Option<String> },
}

impl ArgValue {
    /// Width class printed in front of values on continuation lines.
    pub fn class(&self) -> &'static str {
        match self {
            ArgValue::U8(_) | ArgValue::S8(_) | ArgValue::Hex8(_) => "byte",
            ArgValue::U16(_) | ArgValue::S16(_) | ArgValue::Hex16(_) | ArgValue::Ref16 { .. } => "short",
            ArgValue::Hex24(_) | ArgValue::Ref24 { .. } => "adr24",
            ArgValue::Hex32(_) => "adr32",
            ArgValue::Var(_) => "var",
            ArgValue::Opr(_) => "opr",
        }
    }

    /// Address this value needs a label definition for.
    pub fn label_target(&self) -> Option<u32> {
        match self {
            ArgValue::Ref16 { target, label: Some(_), .. } | ArgValue::Ref24 { target, label: Some(_) } => {
                Some(*target)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::U8(v) | ArgValue::Var(v) | ArgValue::Opr(v) => write!(f, "{v}"),
            ArgValue::U16(v) => write!(f, "{v}"),
            ArgValue::S8(v) => write!(f, "{v}"),
            ArgValue::S16(v) => write!(f, "{v}"),
            ArgValue::Hex8(v) => write!(f, "0x{v:02X}"),
            ArgValue::Hex16(v) => write!(f, "0x{v:04X}"),
            ArgValue::Hex24(v) => write!(f, "0x{v:04X}"),
            ArgValue::Hex32(v) => write!(f, "0x{v:X}"),
            ArgValue::Ref16 { label: Some(l), .. } | ArgValue::Ref24 { label: Some(l), .. } => f.write_str(l),
            ArgValue::Ref16 { short, label: None, .. } => write!(f, "0x{short:04X}"),
            ArgValue::Ref24 { target, label: None } => write!(f, "0x{target:X}"),
        }
    }
}

/// Reads typed arguments and resolves pointers to label names.
#[derive(Debug, Clone, Copy)]
pub struct ArgReader<'t> {
    tables: &'t Tables,
    space: &'t AddressSpace,
}

impl<'t> ArgReader<'t> {
    pub fn new(tables: &'t Tables, space: &'t AddressSpace) -> Self {
        Self { tables, space }
    }

    /// Reads one argument. `origin` is the file offset of the instruction
    /// the argument belongs to; 16-bit pointers resolve into its bank.
    pub fn read<S: ByteSource>(&self, src: &mut S, tag: ArgTag, origin: u32) -> Result<ArgValue> {
        let ArgTag::Arg(kind) = tag else {
            return Err(DumpError::InvalidArgType { tag: tag.to_string() });
        };
        let value = match kind {
            ArgKind::U8 => ArgValue::U8(src.read_u8()?),
            ArgKind::U16 => ArgValue::U16(src.read_u16()?),
            ArgKind::S8 => ArgValue::S8(src.read_u8()? as i8),
            ArgKind::S16 => ArgValue::S16(src.read_u16()? as i16),
            ArgKind::Hex8 => ArgValue::Hex8(src.read_u8()?),
            ArgKind::Hex16 => ArgValue::Hex16(src.read_u16()?),
            ArgKind::Hex24 => ArgValue::Hex24(src.read_u24()?),
            ArgKind::Hex32 => {
                let high = src.read_u16()? as u32;
                let low = src.read_u16()? as u32;
                ArgValue::Hex32(high * 0x10000 + low)
            }
            ArgKind::Var => ArgValue::Var(src.read_u8()?),
            ArgKind::Opr => ArgValue::Opr(src.read_u8()?),
            ArgKind::Label16 => {
                let short = src.read_u16()?;
                let target = self.space.resolve_short(origin, short);
                ArgValue::Ref16 { short, target, label: self.label_for(target) }
            }
            ArgKind::Label24 => {
                let target = src.read_u24()?;
                ArgValue::Ref24 { target, label: self.label_for(target) }
            }
        };
        Ok(value)
    }

    /// Name a pointer to `target` is printed as, or `None` when the target
    /// lies outside every code range and stays a literal.
    pub fn label_for(&self, target: u32) -> Option<String> {
        if !self.space.in_configured_range(target) {
            return None;
        }
        Some(match self.tables.named_label(target) {
            Some(named) => named.primary().to_string(),
            None => default_label_name(target),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Range;
    use crate::rom::RomCursor;
    use serde_json::json;

    fn tables() -> Tables {
        Tables::from_value(json!({
            "rom_info": { "name": "T", "offset": 0, "data": [0] },
            "ranges": [[0x1000, 0x2000]],
            "max_var": 7, "max_opr": 0, "operations": [],
            "opcodes": [{ "name": "nop" }],
            "waited_opcodes": [], "routines": [],
            "labels": [{ "address": 0xC01800, "label": ["Loop", "Idle"] }]
        }))
        .unwrap()
    }

    fn read(bytes: &[u8], tag: &str) -> ArgValue {
        let t = tables();
        let space = AddressSpace::new(0, vec![Range { start: 0x1000, end: 0x2000 }]);
        let reader = ArgReader::new(&t, &space);
        let mut src = RomCursor::new(bytes);
        reader.read(&mut src, tag.parse().unwrap(), 0x1000).unwrap()
    }

    #[test]
    fn numeric_forms() {
        assert_eq!(read(&[0xFF], "s_8").to_string(), "-1");
        assert_eq!(read(&[0x00, 0x80], "s_16").to_string(), "-32768");
        assert_eq!(read(&[0x34, 0x12], "u_16").to_string(), "4660");
        assert_eq!(read(&[0x0A], "hex_8").to_string(), "0x0A");
        assert_eq!(read(&[0x0A, 0x00], "hex_16").to_string(), "0x000A");
        assert_eq!(read(&[0x0A, 0x00, 0x00], "hex_24").to_string(), "0x000A");
        assert_eq!(read(&[0x12, 0x00, 0x34, 0x00], "hex_32").to_string(), "0x120034");
    }

    #[test]
    fn classes() {
        assert_eq!(read(&[1], "u_8").class(), "byte");
        assert_eq!(read(&[0x00, 0x30], "l_16").class(), "short");
        assert_eq!(read(&[0, 0, 0], "l_24").class(), "adr24");
        assert_eq!(read(&[0, 0, 0, 0], "hex_32").class(), "adr32");
    }

    #[test]
    fn pointers_resolve_to_labels_in_range() {
        let v = read(&[0x00, 0x15], "l_16");
        assert_eq!(v.to_string(), "M_C01500");
        assert_eq!(v.label_target(), Some(0xC01500));

        let named = read(&[0x00, 0x18], "l_16");
        assert_eq!(named.to_string(), "Idle");

        let outside = read(&[0x00, 0x30], "l_16");
        assert_eq!(outside.to_string(), "0x3000");
        assert_eq!(outside.label_target(), None);

        let boundary = read(&[0x00, 0x10, 0xC0], "l_24");
        assert_eq!(boundary.to_string(), "0xC01000");

        let far = read(&[0x00, 0x15, 0xC0], "l_24");
        assert_eq!(far.to_string(), "M_C01500");
    }

    #[test]
    fn resolution_is_idempotent() {
        assert_eq!(read(&[0x00, 0x18], "l_16"), read(&[0x00, 0x18], "l_16"));
        assert_eq!(read(&[0x22, 0x11], "l_16"), read(&[0x22, 0x11], "l_16"));
    }

    #[test]
    fn markers_are_not_arguments() {
        let t = tables();
        let space = AddressSpace::new(0, vec![]);
        let reader = ArgReader::new(&t, &space);
        let mut src = RomCursor::new(&[0]);
        let err = reader.read(&mut src, ArgTag::Multi, 0).unwrap_err();
        assert_eq!(err.to_string(), "Trying to read an invalid argument type (multi).");
    }
}
