use tracing::trace;

use crate::address::AddressSpace;
use crate::args::{ArgReader, ArgValue};
use crate::error::{DumpError, Result};
use crate::rom::ByteSource;
use crate::tables::{ArgTag, Tables};

/// One decoded action script instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Absolute address of the opcode byte.
    pub address: u32,
    /// Canonical opcode, after waited-opcode remapping.
    pub opcode: u8,
    pub wait: Option<u8>,
    pub shape: Shape,
    /// Bytes consumed, opcode included.
    pub len: u32,
}

/// The three mutually exclusive argument layouts an opcode can declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Fixed argument list. Object variable and operation indices are kept
    /// apart from the printed arguments.
    Plain { args: Vec<ArgValue>, var: Option<u8>, opr: Option<u8> },
    /// A count byte followed by `count` values of one type.
    Counted { count: u8, values: Vec<ArgValue> },
    /// Call into a native routine.
    Call(RoutineCall),
}

impl Shape {
    pub fn empty() -> Self {
        Shape::Plain { args: Vec::new(), var: None, opr: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineCall {
    pub target: u32,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub args: CallArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArgs {
    None,
    Fixed(Vec<ArgValue>),
    Counted { count: u8, values: Vec<ArgValue> },
}

impl CallArgs {
    /// Values in print order; a counted list leads with its count.
    pub fn values(&self) -> Vec<ArgValue> {
        match self {
            CallArgs::None => Vec::new(),
            CallArgs::Fixed(v) => v.clone(),
            CallArgs::Counted { count, values } => {
                std::iter::once(ArgValue::U8(*count)).chain(values.iter().cloned()).collect()
            }
        }
    }
}

impl Instruction {
    /// Every in-range address this instruction points at.
    pub fn label_targets(&self) -> Vec<u32> {
        let values: &[ArgValue] = match &self.shape {
            Shape::Plain { args, .. } => args,
            Shape::Counted { values, .. } => values,
            Shape::Call(call) => match &call.args {
                CallArgs::None => &[],
                CallArgs::Fixed(v) => v,
                CallArgs::Counted { values, .. } => values,
            },
        };
        values.iter().filter_map(ArgValue::label_target).collect()
    }
}

/// Table-driven decoder for one instruction at a time.
#[derive(Debug, Clone, Copy)]
pub struct ScriptDecoder<'t> {
    tables: &'t Tables,
    space: &'t AddressSpace,
    args: ArgReader<'t>,
}

impl<'t> ScriptDecoder<'t> {
    pub fn new(tables: &'t Tables, space: &'t AddressSpace) -> Self {
        Self { tables, space, args: ArgReader::new(tables, space) }
    }

    /// Decodes the instruction starting at file offset `offset`.
    pub fn decode<S: ByteSource>(&self, src: &mut S, offset: u32) -> Result<Instruction> {
        src.seek(offset);
        let address = self.space.to_absolute(offset);

        let (opcode, wait) = self.tables.remap_waited(src.read_u8()?);
        let desc = self
            .tables
            .opcode(opcode)
            .ok_or(DumpError::InvalidOpcode { opcode, addr: address })?;

        let shape = match desc.args.as_deref() {
            None | Some([]) => Shape::empty(),
            Some(tags) if tags.contains(&ArgTag::AsmCall) => Shape::Call(self.routine_call(src, offset, address)?),
            Some([ArgTag::Multi, rest @ ..]) => {
                let (count, values) = self.counted(src, rest.first().copied(), offset, address)?;
                Shape::Counted { count, values }
            }
            Some(tags) => self.plain(src, tags, offset, address)?,
        };

        let len = src.tell() - offset;
        trace!(opcode, len, "decoded {address:06X}");
        Ok(Instruction { address, opcode, wait, shape, len })
    }

    fn plain<S: ByteSource>(&self, src: &mut S, tags: &[ArgTag], origin: u32, address: u32) -> Result<Shape> {
        let mut args = Vec::with_capacity(tags.len());
        let mut var = None;
        let mut opr = None;
        for &tag in tags {
            match self.args.read(src, tag, origin)? {
                ArgValue::Var(v) => {
                    if v as u32 > self.tables.max_var {
                        return Err(DumpError::VarOutOfRange { value: v, max: self.tables.max_var, addr: address });
                    }
                    var = Some(v);
                }
                ArgValue::Opr(v) => {
                    if v as u32 > self.tables.max_opr || self.tables.operation(v).is_none() {
                        return Err(DumpError::InvalidOperation { value: v, max: self.tables.max_opr, addr: address });
                    }
                    opr = Some(v);
                }
                other => args.push(other),
            }
        }
        Ok(Shape::Plain { args, var, opr })
    }

    fn counted<S: ByteSource>(
        &self,
        src: &mut S,
        element: Option<ArgTag>,
        origin: u32,
        address: u32,
    ) -> Result<(u8, Vec<ArgValue>)> {
        let element = element.ok_or(DumpError::EmptyMulti { addr: address })?;
        let count = src.read_u8()?;
        let values = (0..count)
            .map(|_| self.args.read(src, element, origin))
            .collect::<Result<Vec<_>>>()?;
        Ok((count, values))
    }

    fn routine_call<S: ByteSource>(&self, src: &mut S, origin: u32, address: u32) -> Result<RoutineCall> {
        let target = src.read_u24()?;
        let Some(routine) = self.tables.routine(target) else {
            return Ok(RoutineCall { target, name: None, comment: None, args: CallArgs::None });
        };
        let args = match routine.args.as_deref() {
            None | Some([]) => CallArgs::None,
            Some([ArgTag::Multi, rest @ ..]) => {
                let (count, values) = self.counted(src, rest.first().copied(), origin, address)?;
                CallArgs::Counted { count, values }
            }
            Some(tags) => CallArgs::Fixed(
                tags.iter()
                    .map(|&tag| self.args.read(src, tag, origin))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        Ok(RoutineCall {
            target,
            name: routine.name.clone(),
            comment: routine.comment.clone(),
            args,
        })
    }
}
