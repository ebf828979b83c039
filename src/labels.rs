//! Second pass: splices label definitions into the decoded listing.
//!
//! Both the listing and the label set are ordered by address, so one
//! forward walk places every label in front of the first instruction at
//! its address.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::disasm::COMMENT_WRAPPER;
use crate::extract::Line;
use crate::tables::Tables;

pub const DEF_LABEL_START: &str = "M_";

/// Name given to an address nobody named in the data file.
pub fn default_label_name(addr: u32) -> String {
    format!("{DEF_LABEL_START}{addr:X}")
}

#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub lines: Vec<Line>,
    /// Label names actually defined, by address.
    pub placed: BTreeMap<u32, Vec<String>>,
    /// Label addresses no instruction starts at.
    pub unmatched: Vec<u32>,
}

impl Resolved {
    pub fn render(&self) -> String {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

pub fn resolve_labels(lines: Vec<Line>, labels: &BTreeSet<u32>, tables: &Tables) -> Resolved {
    let mut pending = labels.iter().copied().peekable();
    let mut out = Resolved { lines: Vec::with_capacity(lines.len() + labels.len()), ..Default::default() };

    for mut line in lines {
        let Some(addr) = line.addr else {
            out.lines.push(line);
            continue;
        };

        while let Some(missed) = pending.next_if(|&l| l < addr) {
            warn!("The label at 0x{missed:X} could not be inserted.");
            out.unmatched.push(missed);
        }

        if pending.next_if_eq(&addr).is_some() {
            let prev_blank = out.lines.last().is_some_and(Line::ends_blank);
            let (block, names) = label_block(addr, tables, prev_blank);
            // The block's separator replaces the instruction's own blank line.
            let body = line.text.strip_prefix('\n').unwrap_or(&line.text);
            line.text = block + body;
            out.placed.insert(addr, names);
        }
        out.lines.push(line);
    }

    for missed in pending {
        warn!("The label at 0x{missed:X} could not be inserted.");
        out.unmatched.push(missed);
    }
    out
}

/// Comment lines and label definitions for `addr`, plus the names defined.
fn label_block(addr: u32, tables: &Tables, prev_blank: bool) -> (String, Vec<String>) {
    let mut block = String::new();
    if !prev_blank {
        block.push('\n');
    }
    let names = match tables.named_label(addr) {
        Some(named) => {
            for c in &named.comment {
                block.push_str(&format!("{}{}{}\n", COMMENT_WRAPPER.0, c, COMMENT_WRAPPER.1));
            }
            named.label.clone()
        }
        None => vec![default_label_name(addr)],
    };
    for n in &names {
        block.push_str(n);
        block.push_str(":\n");
    }
    (block, names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tables() -> Tables {
        Tables::from_value(json!({
            "rom_info": { "name": "T", "offset": 0, "data": [0] },
            "ranges": [[0, 0x100]],
            "max_var": 0, "max_opr": 0, "operations": [],
            "opcodes": [{ "name": "nop" }],
            "waited_opcodes": [], "routines": [],
            "labels": [{ "address": 0xC00004, "label": ["Begin", "Start"], "comment": ["main loop"] }]
        }))
        .unwrap()
    }

    fn listing() -> Vec<Line> {
        vec![
            Line::comment("// title\n"),
            Line::comment("\n// RANGE (0xC00000, 0xC00100)\n"),
            Line::instruction(0xC00000, "/* C00000 */   nop\n"),
            Line::instruction(0xC00002, "/* C00002 */   end\n\n"),
            Line::instruction(0xC00004, "/* C00004 */   nop\n"),
            Line::instruction(0xC00006, "\n/* C00006 */   wait\n"),
        ]
    }

    #[test]
    fn splices_default_and_named_labels() {
        let labels = BTreeSet::from([0xC00000, 0xC00004, 0xC00006]);
        let r = resolve_labels(listing(), &labels, &tables());
        let expected = concat!(
            "// title\n",
            "\n// RANGE (0xC00000, 0xC00100)\n",
            "\nM_C00000:\n/* C00000 */   nop\n",
            "/* C00002 */   end\n\n",
            "// main loop\nBegin:\nStart:\n/* C00004 */   nop\n",
            "\nM_C00006:\n/* C00006 */   wait\n",
        );
        assert_eq!(r.render(), expected);
        assert!(r.unmatched.is_empty());
        assert_eq!(r.placed[&0xC00004], vec!["Begin".to_string(), "Start".to_string()]);
    }

    #[test]
    fn unmatched_labels_warn_and_insert_nothing() {
        let labels = BTreeSet::from([0xC00001, 0xC00003, 0xC00004, 0xC00100]);
        let r = resolve_labels(listing(), &labels, &tables());
        assert_eq!(r.unmatched, vec![0xC00001, 0xC00003, 0xC00100]);
        assert_eq!(r.lines.len(), listing().len());
        for (before, after) in listing().iter().zip(&r.lines) {
            assert_eq!(before.addr, after.addr);
            if before.addr != Some(0xC00004) {
                assert_eq!(before.text, after.text);
            }
        }
    }

    #[test]
    fn empty_label_set_is_identity() {
        let r = resolve_labels(listing(), &BTreeSet::new(), &tables());
        assert_eq!(r.lines, listing());
    }
}
