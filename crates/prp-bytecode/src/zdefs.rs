//! Z-Definitions: named global constants stored ahead of the instruction
//! stream.

use prp_buffers::{Reader, Writer};
use tracing::debug;

use crate::codec::Strings;
use crate::error::{PrpError, Region, Result};

/// Declared type of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZDefinitionType {
    ArrayInt32,
    ArrayFloat32,
    StringRef1,
    StringRef2,
    StringRef3,
    StringRefTab,
}

/// Flags byte to declared type. Any byte not listed is `ERR_UNKNOWN`.
const FLAGS_TABLE: [(u8, ZDefinitionType); 6] = [
    (0x02, ZDefinitionType::ArrayInt32),
    (0x03, ZDefinitionType::ArrayFloat32),
    (0x08, ZDefinitionType::StringRef1),
    (0x09, ZDefinitionType::StringRef2),
    (0x0A, ZDefinitionType::StringRef3),
    (0x0C, ZDefinitionType::StringRefTab),
];

impl ZDefinitionType {
    pub fn from_flags(flags: u8) -> Option<Self> {
        FLAGS_TABLE
            .iter()
            .find(|(byte, _)| *byte == flags)
            .map(|(_, ty)| *ty)
    }

    pub fn flags(self) -> u8 {
        FLAGS_TABLE
            .iter()
            .find(|(_, ty)| *ty == self)
            .map(|(byte, _)| *byte)
            .unwrap_or(0)
    }

    /// Number of strings a `StringRef*` value holds.
    pub fn string_arity(self) -> Option<usize> {
        match self {
            Self::StringRef1 => Some(1),
            Self::StringRef2 => Some(2),
            Self::StringRef3 => Some(3),
            _ => None,
        }
    }
}

/// Definition payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ZDefinitionValue {
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    StringRef(Vec<String>),
    StringRefTab(Vec<String>),
}

impl ZDefinitionValue {
    pub fn matches(&self, declared: ZDefinitionType) -> bool {
        match (declared, self) {
            (ZDefinitionType::ArrayInt32, Self::IntArray(_)) => true,
            (ZDefinitionType::ArrayFloat32, Self::FloatArray(_)) => true,
            (ZDefinitionType::StringRefTab, Self::StringRefTab(_)) => true,
            (declared, Self::StringRef(items)) => declared.string_arity() == Some(items.len()),
            _ => false,
        }
    }

    fn strings(&self) -> &[String] {
        match self {
            Self::StringRef(items) | Self::StringRefTab(items) => items,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZDefinition {
    pub name: String,
    pub declared: ZDefinitionType,
    value: Option<ZDefinitionValue>,
}

impl ZDefinition {
    pub fn new(name: impl Into<String>, declared: ZDefinitionType) -> Self {
        Self {
            name: name.into(),
            declared,
            value: None,
        }
    }

    pub fn with_value(
        name: impl Into<String>,
        declared: ZDefinitionType,
        value: ZDefinitionValue,
    ) -> Result<Self> {
        let mut def = Self::new(name, declared);
        def.set_value(value)?;
        Ok(def)
    }

    /// Sets the value; rejected unless it matches the declared type.
    pub fn set_value(&mut self, value: ZDefinitionValue) -> Result<()> {
        if !value.matches(self.declared) {
            return Err(PrpError::DefinitionMismatch {
                name: self.name.clone(),
                declared: self.declared,
            });
        }
        self.value = Some(value);
        Ok(())
    }

    pub fn value(&self) -> Option<&ZDefinitionValue> {
        self.value.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }
}

/// The Z-Definitions region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZDefinitions {
    defs: Vec<ZDefinition>,
}

impl ZDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a definition, replacing one with the same name in place.
    pub fn insert(&mut self, def: ZDefinition) {
        match self.defs.iter_mut().find(|d| d.name == def.name) {
            Some(slot) => *slot = def,
            None => self.defs.push(def),
        }
    }

    /// Appends a definition even if its name is already present. Reading
    /// uses this so a region round-trips in wire order.
    pub fn push(&mut self, def: ZDefinition) {
        self.defs.push(def);
    }

    /// First definition named `name`.
    pub fn get(&self, name: &str) -> Option<&ZDefinition> {
        self.defs.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZDefinition> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Every string the region references (names and string values), in
    /// write order.
    pub fn strings(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().flat_map(|d| {
            std::iter::once(d.name.as_str())
                .chain(d.value.iter().flat_map(|v| v.strings().iter().map(String::as_str)))
        })
    }

    pub(crate) fn read(reader: &mut Reader<'_>, strings: Strings<'_>) -> Result<Self> {
        let eof = |e| PrpError::from_buffer(e, Region::ZDefinitions, None);
        let count = reader.u32().map_err(eof)?;
        let mut defs = Self::new();
        for _ in 0..count {
            let name = strings.read(reader, Region::ZDefinitions, None)?;
            let flags = reader.u8().map_err(eof)?;
            let declared = ZDefinitionType::from_flags(flags)
                .ok_or(PrpError::UnknownDefinitionType {
                    name: name.clone(),
                    flags,
                })?;
            let value = match declared {
                ZDefinitionType::ArrayInt32 => {
                    let len = reader.u32().map_err(eof)? as usize;
                    let bytes = reader.buf(len.saturating_mul(4)).map_err(eof)?;
                    ZDefinitionValue::IntArray(
                        bytes
                            .chunks_exact(4)
                            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                            .collect(),
                    )
                }
                ZDefinitionType::ArrayFloat32 => {
                    let len = reader.u32().map_err(eof)? as usize;
                    let bytes = reader.buf(len.saturating_mul(4)).map_err(eof)?;
                    ZDefinitionValue::FloatArray(
                        bytes
                            .chunks_exact(4)
                            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                            .collect(),
                    )
                }
                ZDefinitionType::StringRefTab => {
                    let len = reader.u32().map_err(eof)? as usize;
                    if len.saturating_mul(4) > reader.remaining() {
                        return Err(PrpError::UnexpectedEof {
                            region: Region::ZDefinitions,
                            index: None,
                            offset: reader.position(),
                            need: len.saturating_mul(4),
                            have: reader.remaining(),
                        });
                    }
                    let items = (0..len)
                        .map(|_| strings.read(reader, Region::ZDefinitions, None))
                        .collect::<Result<Vec<_>>>()?;
                    ZDefinitionValue::StringRefTab(items)
                }
                single => {
                    let arity = single.string_arity().unwrap_or(1);
                    let items = (0..arity)
                        .map(|_| strings.read(reader, Region::ZDefinitions, None))
                        .collect::<Result<Vec<_>>>()?;
                    ZDefinitionValue::StringRef(items)
                }
            };
            defs.push(ZDefinition::with_value(name, declared, value)?);
        }
        debug!(definitions = defs.len(), "z-definitions decoded");
        Ok(defs)
    }

    /// Writes the region. Definitions without a value are skipped since the
    /// wire form always carries a payload.
    pub(crate) fn write(&self, writer: &mut Writer, strings: Strings<'_>) -> Result<()> {
        let set: Vec<_> = self.defs.iter().filter(|d| d.is_set()).collect();
        writer.u32(set.len() as u32);
        for def in set {
            strings.write(writer, &def.name, Region::ZDefinitions, None)?;
            writer.u8(def.declared.flags());
            match &def.value {
                Some(ZDefinitionValue::IntArray(items)) => {
                    writer.u32(items.len() as u32);
                    items.iter().for_each(|v| writer.i32(*v));
                }
                Some(ZDefinitionValue::FloatArray(items)) => {
                    writer.u32(items.len() as u32);
                    items.iter().for_each(|v| writer.f32(*v));
                }
                Some(ZDefinitionValue::StringRefTab(items)) => {
                    writer.u32(items.len() as u32);
                    for item in items {
                        strings.write(writer, item, Region::ZDefinitions, None)?;
                    }
                }
                Some(ZDefinitionValue::StringRef(items)) => {
                    for item in items {
                        strings.write(writer, item, Region::ZDefinitions, None)?;
                    }
                }
                None => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_table::TokenTable;

    #[test]
    fn flags_table_roundtrip() {
        for (byte, ty) in FLAGS_TABLE {
            assert_eq!(ZDefinitionType::from_flags(byte), Some(ty));
            assert_eq!(ty.flags(), byte);
        }
        assert_eq!(ZDefinitionType::from_flags(0x01), None);
    }

    #[test]
    fn value_must_match_declared_type() {
        let mut def = ZDefinition::new("m_Ids", ZDefinitionType::ArrayInt32);
        assert!(!def.is_set());
        assert!(def
            .set_value(ZDefinitionValue::FloatArray(vec![1.0]))
            .is_err());
        assert!(!def.is_set());
        def.set_value(ZDefinitionValue::IntArray(vec![1, 2])).unwrap();
        assert!(def.is_set());

        let mut pair = ZDefinition::new("m_Pair", ZDefinitionType::StringRef2);
        assert!(pair
            .set_value(ZDefinitionValue::StringRef(vec!["a".into()]))
            .is_err());
        pair.set_value(ZDefinitionValue::StringRef(vec!["a".into(), "b".into()]))
            .unwrap();
    }

    #[test]
    fn unknown_flags_byte_is_fatal_for_region() {
        let tokens: TokenTable = ["GLOBAL"].into_iter().collect();
        let mut w = Writer::new();
        w.u32(1);
        w.u32(0);
        w.u8(0x7F);
        let data = w.flush();
        let err = ZDefinitions::read(&mut Reader::new(&data), Strings::Tokens(&tokens)).unwrap_err();
        assert_eq!(
            err,
            PrpError::UnknownDefinitionType {
                name: "GLOBAL".into(),
                flags: 0x7F
            }
        );
        assert_eq!(err.region(), Region::ZDefinitions);
    }

    #[test]
    fn insert_replaces_by_name() {
        let mut defs = ZDefinitions::new();
        defs.insert(ZDefinition::new("a", ZDefinitionType::ArrayInt32));
        defs.insert(ZDefinition::new("a", ZDefinitionType::ArrayFloat32));
        assert_eq!(defs.len(), 1);
        assert_eq!(defs.get("a").unwrap().declared, ZDefinitionType::ArrayFloat32);
    }

    #[test]
    fn duplicate_names_survive_a_round_trip() {
        let mut defs = ZDefinitions::new();
        for ids in [vec![1], vec![2, 3]] {
            defs.push(
                ZDefinition::with_value(
                    "g_Ids",
                    ZDefinitionType::ArrayInt32,
                    ZDefinitionValue::IntArray(ids),
                )
                .unwrap(),
            );
        }
        let mut w = Writer::new();
        defs.write(&mut w, Strings::Inline).unwrap();
        let data = w.flush();

        let back = ZDefinitions::read(&mut Reader::new(&data), Strings::Inline).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back, defs);
        assert_eq!(
            back.get("g_Ids").and_then(ZDefinition::value),
            Some(&ZDefinitionValue::IntArray(vec![1]))
        );
    }
}
