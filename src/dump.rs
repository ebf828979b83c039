use std::collections::BTreeMap;

use tracing::info;

use crate::error::Result;
use crate::extract::extract;
use crate::labels::resolve_labels;
use crate::rom::Rom;
use crate::tables::Tables;

/// Finished dump of one ROM.
#[derive(Debug, Clone)]
pub struct Dump {
    pub text: String,
    /// Label names defined in `text`, by address.
    pub labels: BTreeMap<u32, Vec<String>>,
    /// Label addresses that matched no instruction.
    pub unmatched: Vec<u32>,
    pub instructions: usize,
}

/// Validates the ROM against `tables`, decodes all ranges and resolves labels.
pub fn dump(rom_bytes: Vec<u8>, tables: &Tables) -> Result<Dump> {
    let listing = {
        let rom = Rom::open(rom_bytes, &tables.rom_info)?;
        info!("Extracting Action Script data from {}!", tables.rom_info.name);
        extract(&rom, tables)?
    };

    info!("Adding labels...");
    let resolved = resolve_labels(listing.lines, &listing.labels, tables);

    Ok(Dump {
        text: resolved.render(),
        labels: resolved.placed,
        unmatched: resolved.unmatched,
        instructions: listing.instructions,
    })
}
