use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use miette::Result;

use crate::error;
use crate::parser::SourceLine;

// Symbol table of label -> word address
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Mapping of each label to the address of the word its line emits.
pub struct SymbolTable {
    map: FxMap<String, u32>,
}

impl SymbolTable {
    /// Collect label addresses in a single pass. Every line emits exactly
    /// one word, so a line's address is its position in the sequence; this
    /// is what lets pass 2 resolve forward references.
    pub fn build(lines: &[SourceLine], src: &str) -> Result<SymbolTable> {
        let mut map = FxMap::default();
        for (addr, line) in lines.iter().enumerate() {
            if let Some(label) = &line.label {
                if map.insert(label.val.clone(), addr as u32).is_some() {
                    return Err(error::parse_duplicate_label(label.span, src));
                }
            }
        }
        Ok(SymbolTable { map })
    }

    pub fn get(&self, label: &str) -> Option<u32> {
        self.map.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Label grammar: a letter followed by up to five alphanumerics, case
/// sensitive. Callers separately rule out mnemonics and `.fill`.
pub fn is_label(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    token.len() <= 6 && chars.all(|c| c.is_ascii_alphanumeric())
}
