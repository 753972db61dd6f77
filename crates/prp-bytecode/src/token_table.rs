//! Deduplicated string pool referenced by index from instructions.

use std::collections::HashMap;

use prp_buffers::{Reader, Writer};

use crate::error::{PrpError, Region, Result};

/// Ordered list of unique strings.
///
/// Index 0 is an ordinary entry, not a null sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTable {
    tokens: Vec<String>,
    index: HashMap<String, u32>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `text` unless present and returns its index.
    pub fn add(&mut self, text: impl Into<String>) -> u32 {
        let text = text.into();
        if let Some(&idx) = self.index.get(&text) {
            return idx;
        }
        let idx = self.tokens.len() as u32;
        self.index.insert(text.clone(), idx);
        self.tokens.push(text);
        idx
    }

    /// Removes `text`; later entries shift down by one. Returns whether it
    /// was present.
    pub fn remove(&mut self, text: &str) -> bool {
        let Some(idx) = self.index.remove(text) else {
            return false;
        };
        self.tokens.remove(idx as usize);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        true
    }

    pub fn index_of(&self, text: &str) -> Option<u32> {
        self.index.get(text).copied()
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.tokens.get(index as usize).map(String::as_str)
    }

    /// Like [`get`](Self::get) but reports an out-of-range index as a
    /// structural error.
    pub fn resolve(&self, token: u32, region: Region, index: Option<usize>) -> Result<&str> {
        self.get(token).ok_or(PrpError::TokenOutOfRange {
            region,
            index,
            token,
            count: self.tokens.len(),
        })
    }

    pub fn contains(&self, text: &str) -> bool {
        self.index.contains_key(text)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
        self.index.clear();
    }

    /// Reads `u32 count`, `u32 blob_length` and the NUL-terminated blob.
    pub fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let eof = |e| PrpError::from_buffer(e, Region::TokenTable, None);
        let count = reader.u32().map_err(eof)?;
        let blob_len = reader.u32().map_err(eof)? as usize;
        let mut blob = reader.cut(blob_len).map_err(eof)?;
        let mut table = Self::new();
        for _ in 0..count {
            let text = blob.cstr().map_err(eof)?;
            table.tokens.push(text.to_owned());
        }
        // Duplicates in the wire form keep the first index for lookups.
        for (idx, text) in table.tokens.iter().enumerate() {
            table.index.entry(text.clone()).or_insert(idx as u32);
        }
        Ok(table)
    }

    /// Writes the table. Tokens are NUL-terminated on the wire, so a token
    /// containing NUL is rejected.
    pub fn write(&self, writer: &mut Writer) -> Result<()> {
        if let Some(bad) = self.tokens.iter().find(|t| t.contains('\0')) {
            return Err(PrpError::NulInToken {
                region: Region::TokenTable,
                index: None,
                text: bad.clone(),
            });
        }
        writer.u32(self.tokens.len() as u32);
        let blob_len: usize = self.tokens.iter().map(|t| t.len() + 1).sum();
        writer.u32(blob_len as u32);
        for token in &self.tokens {
            writer.cstr(token);
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for TokenTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut table = Self::new();
        for text in iter {
            table.add(text);
        }
        table
    }
}
