use anyhow::{Context, Result};
use std::path::Path;

use actscr_rs::Tables;

/// Loads and validates the JSON description of a game's action script.
pub fn load_tables(path: &Path) -> Result<Tables> {
    let txt = std::fs::read_to_string(path).with_context(|| format!("reading data file {}", path.display()))?;
    let tables = Tables::from_json_str(&txt).with_context(|| format!("loading data file {}", path.display()))?;
    Ok(tables)
}

pub fn load_rom(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading ROM {}", path.display()))?;
    anyhow::ensure!(!bytes.is_empty(), "ROM {} is empty", path.display());
    Ok(bytes)
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LabelKV {
    pub addr: u32,
    pub name: String,
}

/// Flattens the label map into one entry per alias, in address order.
pub fn label_pairs<'a>(labels: impl IntoIterator<Item = (&'a u32, &'a Vec<String>)>) -> Vec<LabelKV> {
    labels
        .into_iter()
        .flat_map(|(addr, names)| names.iter().map(move |n| LabelKV { addr: *addr, name: n.clone() }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn loads_data_file() {
        let cwd = std::env::current_dir().unwrap();
        let path = cwd.join("_test_tables.json");
        std::fs::write(
            &path,
            r#"{
                "rom_info": { "name": "KSD", "offset": 65472, "data": [75, 73, 82] },
                "ranges": [[4096, 8192]],
                "max_var": 7, "max_opr": 0, "operations": ["="],
                "opcodes": [{ "name": "end", "newline": "after" }],
                "waited_opcodes": [], "routines": [], "labels": []
            }"#,
        )
        .unwrap();
        let t = load_tables(&path).unwrap();
        assert_eq!(t.rom_info.name, "KSD");
        assert_eq!(t.ranges.len(), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_files_are_errors() {
        assert!(load_tables(Path::new("_no_such_tables.json")).is_err());
        assert!(load_rom(Path::new("_no_such_rom.sfc")).is_err());
    }

    #[test]
    fn label_pairs_expand_aliases() {
        let mut m = BTreeMap::new();
        m.insert(0xC00010u32, vec!["A".to_string(), "B".to_string()]);
        m.insert(0xC00001u32, vec!["M_C00001".to_string()]);
        let kv = label_pairs(&m);
        assert_eq!(
            kv,
            vec![
                LabelKV { addr: 0xC00001, name: "M_C00001".into() },
                LabelKV { addr: 0xC00010, name: "A".into() },
                LabelKV { addr: 0xC00010, name: "B".into() },
            ]
        );
    }
}
