//! TypeRegistry - catalog of declared types indexed by name and hash.
//!
//! Loading is two-phase. Pass 1 builds every declared type with its
//! references pending; pass 2 resolves every alias target, complex parent
//! and field reference against the complete name index, so declaration
//! order does not matter and cycles are fine.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::RegistryError;
use crate::schema::TypeDeclaration;
use crate::type_def::{Type, TypeId, TypeRef, MAX_DEPTH};

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Vec<Type>,
    by_name: HashMap<String, TypeId>,
    /// name -> external hash
    hashes: HashMap<String, String>,
    /// external hash -> name
    by_hash: HashMap<String, String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards every type and hash.
    pub fn reset(&mut self) {
        self.types.clear();
        self.by_name.clear();
        self.hashes.clear();
        self.by_hash.clear();
    }

    /// Registers a batch of declarations. Returns the number of types added.
    ///
    /// A malformed declaration (unknown kind, duplicate name, missing
    /// variant field) fails the whole batch before anything is registered.
    /// References that stay unresolved are not errors.
    #[instrument(
        name = "prp::registry::register",
        level = "debug",
        skip_all,
        fields(declarations = declarations.len())
    )]
    pub fn register_types(
        &mut self,
        declarations: &[TypeDeclaration],
        name_to_hash: &HashMap<String, String>,
    ) -> Result<usize, RegistryError> {
        let mut seen = HashSet::new();
        let mut staged = Vec::with_capacity(declarations.len());
        for decl in declarations {
            if self.by_name.contains_key(&decl.name) || !seen.insert(decl.name.as_str()) {
                return Err(RegistryError::DuplicateType(decl.name.clone()));
            }
            staged.push(decl.build()?);
        }

        let added = staged.len();
        for mut ty in staged {
            let id = TypeId::from_index(self.types.len());
            if let Type::Complex(complex) = &mut ty {
                for field in &mut complex.fields {
                    field.owner = Some(id);
                }
            }
            self.by_name.insert(ty.name().to_owned(), id);
            self.types.push(ty);
        }
        for (name, hash) in name_to_hash {
            self.hashes.insert(name.clone(), hash.clone());
            self.by_hash.insert(hash.clone(), name.clone());
        }

        let unresolved = self.resolve_pending();
        debug!(added, total = self.types.len(), unresolved, "types registered");
        Ok(added)
    }

    /// Parses JSON declarations, then registers them.
    pub fn register_json(
        &mut self,
        declarations: &[serde_json::Value],
        name_to_hash: &HashMap<String, String>,
    ) -> Result<usize, RegistryError> {
        let parsed = declarations
            .iter()
            .map(|value| TypeDeclaration::deserialize(value))
            .collect::<Result<Vec<_>, _>>()?;
        self.register_types(&parsed, name_to_hash)
    }

    /// Loads a JSON array of declarations and a JSON object mapping type
    /// names to hashes.
    pub fn load_str(
        &mut self,
        types_json: &str,
        hashes_json: &str,
    ) -> Result<usize, RegistryError> {
        let declarations: Vec<TypeDeclaration> = serde_json::from_str(types_json)?;
        let hashes: HashMap<String, String> = serde_json::from_str(hashes_json)?;
        self.register_types(&declarations, &hashes)
    }

    /// Resolves every pending reference. Returns how many stay unresolved.
    fn resolve_pending(&mut self) -> usize {
        let index = &self.by_name;
        let mut unresolved = 0;
        for ty in &mut self.types {
            let owner = ty.name().to_owned();
            for type_ref in ty.refs_mut() {
                if !type_ref.resolve(index) {
                    unresolved += 1;
                    warn!(type_name = %owner, reference = %type_ref, "unresolved type reference");
                }
            }
        }
        unresolved
    }

    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.index())
    }

    pub fn type_id_by_name(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn find_type_by_name(&self, name: &str) -> Option<&Type> {
        self.type_id_by_name(name).and_then(|id| self.get(id))
    }

    pub fn find_type_by_hash(&self, hash: &str) -> Option<&Type> {
        self.by_hash
            .get(hash)
            .and_then(|name| self.find_type_by_name(name))
    }

    pub fn hash_of(&self, name: &str) -> Option<&str> {
        self.hashes.get(name).map(String::as_str)
    }

    /// Follows resolved alias targets to the first non-alias type.
    pub fn unalias(&self, id: TypeId) -> Option<&Type> {
        let mut current = self.get(id)?;
        for _ in 0..MAX_DEPTH {
            match current {
                Type::Alias(alias) => match alias.target {
                    TypeRef::Resolved(next) => current = self.get(next)?,
                    _ => return Some(current),
                },
                other => return Some(other),
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &Type)> {
        self.types
            .iter()
            .enumerate()
            .map(|(index, ty)| (TypeId::from_index(index), ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hashes(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn lookups_before_loading_fail_cleanly() {
        let registry = TypeRegistry::new();
        assert!(registry.find_type_by_name("ZGEOM").is_none());
        assert!(registry.find_type_by_hash("0001").is_none());
        assert!(registry.get(TypeId::from_index(0)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn forward_reference_resolves() {
        let mut registry = TypeRegistry::new();
        registry
            .register_json(
                &[
                    json!({"name": "ZString", "kind": "Alias", "alias": "ZName"}),
                    json!({"name": "ZName", "kind": "Alias", "alias": "PRPOpCode.String"}),
                ],
                &hashes(&[("ZString", "00A1")]),
            )
            .unwrap();
        let alias = registry.find_type_by_name("ZString").unwrap();
        assert!(alias.is_resolved());
        assert_eq!(alias.target().unwrap().type_id(), registry.type_id_by_name("ZName"));
        assert_eq!(registry.hash_of("ZString"), Some("00A1"));
        assert_eq!(registry.find_type_by_hash("00A1").map(Type::name), Some("ZString"));

        let id = registry.type_id_by_name("ZString").unwrap();
        assert_eq!(registry.unalias(id).map(Type::name), Some("ZName"));
    }

    #[test]
    fn duplicate_in_batch_leaves_registry_untouched() {
        let mut registry = TypeRegistry::new();
        let err = registry
            .register_json(
                &[
                    json!({"name": "ZBinary", "kind": "RawData"}),
                    json!({"name": "ZBinary", "kind": "Container"}),
                ],
                &HashMap::new(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateType(name) if name == "ZBinary"));
        assert!(registry.is_empty());
    }

    #[test]
    fn later_batch_resolves_earlier_pending() {
        let mut registry = TypeRegistry::new();
        registry
            .register_json(
                &[json!({"name": "ZList", "kind": "Alias", "alias": "ZContainer"})],
                &HashMap::new(),
            )
            .unwrap();
        assert!(!registry.find_type_by_name("ZList").unwrap().is_resolved());

        registry
            .register_json(
                &[json!({"name": "ZContainer", "kind": "Container"})],
                &HashMap::new(),
            )
            .unwrap();
        assert!(registry.find_type_by_name("ZList").unwrap().is_resolved());
        assert_eq!(registry.iter().count(), 2);
    }

    #[test]
    fn self_alias_cycle_is_bounded() {
        let mut registry = TypeRegistry::new();
        registry
            .register_json(
                &[json!({"name": "ZLoop", "kind": "Alias", "alias": "ZLoop"})],
                &HashMap::new(),
            )
            .unwrap();
        let id = registry.type_id_by_name("ZLoop").unwrap();
        assert!(registry.unalias(id).is_none());
    }
}
