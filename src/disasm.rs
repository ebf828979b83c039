use std::fmt::Write as _;

use crate::args::ArgValue;
use crate::decoder::{Instruction, Shape};
use crate::tables::{NewlinePolicy, OpcodeDescriptor, Tables};

pub const ADDR_WRAPPER: (&str, &str) = ("/* ", " */");
pub const COMMENT_WRAPPER: (&str, &str) = ("// ", "");
pub const WAIT_SUFFIX: &str = "_w";
const EXTRA_SPACING: usize = 3;
// Lines up with the opcode name after a six-digit address.
const CONTINUATION_INDENT: usize = ADDR_WRAPPER.0.len() + 6 + ADDR_WRAPPER.1.len() + EXTRA_SPACING;

/// Renders one instruction as a text chunk ending in `\n`. Counted
/// arguments and anonymous routine calls span several lines.
///
/// `prev_ends_blank` tells whether the chunk before this one already ends
/// with a blank line, so `before` spacing is not doubled.
pub fn fmt_instruction(ins: &Instruction, tables: &Tables, prev_ends_blank: bool) -> String {
    let desc = &tables.opcodes[ins.opcode as usize];
    let wait = ins.wait.map(|w| format!("{WAIT_SUFFIX}{w}")).unwrap_or_default();
    let mut out = String::new();

    if desc.newline == NewlinePolicy::Before && !prev_ends_blank {
        out.push('\n');
    }
    let _ = write!(out, "{}{:X}{}{}", ADDR_WRAPPER.0, ins.address, ADDR_WRAPPER.1, " ".repeat(EXTRA_SPACING));

    match &ins.shape {
        Shape::Call(call) => {
            let values = call.args.values();
            match &call.name {
                Some(name) => {
                    out.push_str(name);
                    out.push_str(&wait);
                    if !values.is_empty() {
                        let _ = write!(out, "({})", join(&values));
                    }
                    push_comment(&mut out, call.comment.as_deref());
                }
                None => {
                    out.push_str(&desc.name);
                    out.push_str(&wait);
                    let _ = write!(out, "(0x{:X})", call.target);
                    push_comment(&mut out, call.comment.as_deref());
                    for v in &values {
                        push_continuation(&mut out, v);
                    }
                }
            }
        }
        Shape::Counted { count, values } => {
            push_head(&mut out, desc, tables, None, None);
            out.push_str(&wait);
            if *count > 0 {
                let _ = write!(out, "({count})");
                for v in values {
                    push_continuation(&mut out, v);
                }
                out.push('\n');
                return out;
            }
        }
        Shape::Plain { args, var, opr } => {
            push_head(&mut out, desc, tables, *opr, *var);
            out.push_str(&wait);
            if !args.is_empty() {
                let _ = write!(out, "({})", join(args));
            }
        }
    }

    if desc.newline == NewlinePolicy::After {
        out.push('\n');
    }
    out.push('\n');
    out
}

/// Opcode name, operation name, terminator, variable index.
fn push_head(out: &mut String, desc: &OpcodeDescriptor, tables: &Tables, opr: Option<u8>, var: Option<u8>) {
    out.push_str(&desc.name);
    if let Some(op) = opr.and_then(|i| tables.operation(i)) {
        out.push_str(op);
    }
    if let Some(t) = &desc.terminator {
        out.push_str(t);
    }
    if let Some(v) = var {
        let _ = write!(out, "{v}");
    }
}

fn push_comment(out: &mut String, comment: Option<&str>) {
    if let Some(c) = comment {
        let _ = write!(out, "   {}{}{}", COMMENT_WRAPPER.0, c, COMMENT_WRAPPER.1);
    }
}

fn push_continuation(out: &mut String, v: &ArgValue) {
    let _ = write!(out, "\n{}{} {}", " ".repeat(CONTINUATION_INDENT), v.class(), v);
}

fn join(values: &[ArgValue]) -> String {
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
