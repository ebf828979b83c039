pub mod address;
pub mod args;
pub mod decoder;
pub mod disasm;
pub mod dump;
pub mod error;
pub mod extract;
pub mod labels;
pub mod rom;
pub mod tables;

pub use address::{AddressSpace, Range};
pub use decoder::{Instruction, ScriptDecoder, Shape};
pub use dump::{dump, Dump};
pub use error::{DumpError, Result};
pub use extract::{extract, Line, Listing};
pub use labels::{resolve_labels, Resolved};
pub use rom::{ByteSource, Rom, RomCursor};
pub use tables::Tables;
