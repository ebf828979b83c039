/// Every failure the dumper can hit. All of them abort the run.
#[derive(thiserror::Error, Debug)]
pub enum DumpError {
    #[error("The data file could not be parsed: {0}")]
    Data(#[from] serde_json::Error),
    #[error("The data file is inconsistent: {0}")]
    Config(String),
    #[error("The ROM does not seem to be a valid {name} ROM.")]
    InvalidRom { name: String },
    #[error("Trying to read an invalid opcode {opcode:#X} at {addr:X}.")]
    InvalidOpcode { opcode: u8, addr: u32 },
    #[error("Trying to read an invalid argument type ({tag}).")]
    InvalidArgType { tag: String },
    #[error("Trying to operate an object var ({value}) higher than {max} at {addr:X}.")]
    VarOutOfRange { value: u8, max: u32, addr: u32 },
    #[error("Trying to use an invalid operation ({value} when max is {max}) at {addr:X}.")]
    InvalidOperation { value: u8, max: u32, addr: u32 },
    #[error("Trying to use a multi-argument operation of size 0 at {addr:X}.")]
    EmptyMulti { addr: u32 },
    #[error("Unexpected end of ROM at offset {offset:#X}.")]
    UnexpectedEof { offset: u32 },
}

pub type Result<T, E = DumpError> = std::result::Result<T, E>;
