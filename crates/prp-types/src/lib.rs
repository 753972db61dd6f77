//! Type system for PRP bytecode.
//!
//! Types are declared in JSON, loaded into a [`TypeRegistry`], and used to
//! verify and materialize slices of decoded instructions:
//!
//! - [`Type`] - closed union of the seven shapes (alias, enum, bitfield, raw
//!   data, array, container, complex)
//! - [`TypeRegistry`] - two-phase loader resolving forward and cyclic
//!   references
//! - [`Value`] - owned result of mapping instructions against a type
//! - [`scene::bind`] - maps every scene object's body in a level stream
//!
//! # Example
//!
//! ```
//! use prp_bytecode::Instruction;
//! use prp_types::TypeRegistry;
//! use serde_json::json;
//!
//! let mut registry = TypeRegistry::new();
//! registry
//!     .register_json(
//!         &[json!({"name": "EState", "kind": "Enum", "enum": [{"key": "IDLE", "value": 0}]})],
//!         &Default::default(),
//!     )
//!     .unwrap();
//!
//! let ty = registry.find_type_by_name("EState").unwrap();
//! let stream = [Instruction::string("IDLE"), Instruction::end_of_stream()];
//! let verified = ty.verify(&registry, &stream);
//! assert!(verified.ok);
//! assert_eq!(verified.rest.len(), 1);
//! ```

mod error;
pub mod registry;
pub mod scene;
pub mod schema;
pub mod type_def;
mod value;

pub use error::{RegistryError, SceneError, TypeError};
pub use registry::TypeRegistry;
pub use scene::SceneObject;
pub use schema::TypeDeclaration;
pub use type_def::{
    Mapped, Type, TypeId, TypeKind, TypeRef, ValueView, Verified, MAX_DEPTH, MAX_NESTING,
};
pub use value::{Value, ValueEntry};
