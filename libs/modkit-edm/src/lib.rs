#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! EDM (Entity Data Model) schema graph for the ModKit OData routing stack.
//!
//! - [`SchemaDef`]: serde-friendly schema definition input
//! - [`EdmModel`]: immutable, arena-backed schema graph with inheritance-aware lookups
//! - [`parse_literal`] / [`EdmValue`]: OData URI literal conversion

pub mod def;
pub mod error;
pub mod literal;
pub mod model;
pub mod types;

pub use def::{
    EnumTypeDef, NavigationPropertyDef, OperationDef, OperationImportDef, ParameterDef,
    PropertyDef, SchemaDef, StructuredTypeDef,
};
pub use error::{EdmError, LiteralError};
pub use literal::{EdmValue, parse_literal};
pub use model::{
    EdmModel, EntitySet, EnumMember, EnumType, NavigationProperty, Operation, OperationImport,
    OperationKind, Parameter, Singleton, StructuralProperty, StructuredKind, StructuredType,
};
pub use types::{
    EntitySetId, EnumTypeId, OperationId, OperationImportId, PrimitiveKind, SingletonId,
    StructuredTypeId, TypeKind, TypeRef,
};
