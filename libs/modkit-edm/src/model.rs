//! The EDM schema graph.
//!
//! Elements live in arenas owned by [`EdmModel`] and reference each other
//! through typed handles, so navigation cycles (`Customer -> Orders ->
//! Customer`) need no reference counting. A model is immutable once built and
//! is meant to be shared read-only (`Arc<EdmModel>`) between request handlers.

use std::collections::{HashMap, HashSet};

use crate::def::{OperationDef, SchemaDef, StructuredTypeDef};
use crate::error::EdmError;
use crate::types::{
    EntitySetId, EnumTypeId, OperationId, OperationImportId, PrimitiveKind, SingletonId,
    StructuredTypeId, TypeKind, TypeRef, split_collection,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructuredKind {
    Entity,
    Complex,
}

#[derive(Debug, Clone)]
pub struct StructuredType {
    pub namespace: String,
    pub name: String,
    pub kind: StructuredKind,
    pub base: Option<StructuredTypeId>,
    /// Key declared on this type; derived types inherit their base's key.
    pub declared_key: Vec<String>,
    pub properties: Vec<StructuralProperty>,
    pub navigation_properties: Vec<NavigationProperty>,
    pub is_abstract: bool,
    pub is_open: bool,
}

impl StructuredType {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    #[must_use]
    pub fn is_entity(&self) -> bool {
        self.kind == StructuredKind::Entity
    }
}

#[derive(Debug, Clone)]
pub struct StructuralProperty {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone)]
pub struct NavigationProperty {
    pub name: String,
    pub target: StructuredTypeId,
    pub collection: bool,
    pub contains_target: bool,
}

impl NavigationProperty {
    #[must_use]
    pub fn target_type(&self) -> TypeRef {
        TypeRef::structured(self.target).with_collection(self.collection)
    }
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub namespace: String,
    pub name: String,
    pub members: Vec<EnumMember>,
    pub is_flags: bool,
}

impl EnumType {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    #[must_use]
    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone)]
pub struct EntitySet {
    pub name: String,
    pub entity_type: StructuredTypeId,
}

#[derive(Debug, Clone)]
pub struct Singleton {
    pub name: String,
    pub entity_type: StructuredTypeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Action,
    Function,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Action => "action",
            Self::Function => "function",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
    pub optional: bool,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OperationKind,
    pub namespace: String,
    pub name: String,
    pub is_bound: bool,
    pub is_composable: bool,
    /// Declared parameters; for bound operations the first one is the binding parameter.
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeRef>,
}

impl Operation {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    #[must_use]
    pub fn is_function(&self) -> bool {
        self.kind == OperationKind::Function
    }

    #[must_use]
    pub fn binding_parameter(&self) -> Option<&Parameter> {
        if self.is_bound {
            self.parameters.first()
        } else {
            None
        }
    }

    /// Parameters that can appear in the URL (the binding parameter is skipped).
    #[must_use]
    pub fn url_parameters(&self) -> &[Parameter] {
        if self.is_bound && !self.parameters.is_empty() {
            &self.parameters[1..]
        } else {
            &self.parameters
        }
    }
}

#[derive(Debug, Clone)]
pub struct OperationImport {
    pub kind: OperationKind,
    pub name: String,
    /// Unbound overloads the import exposes (exactly one for action imports).
    pub operations: Vec<OperationId>,
    pub entity_set: Option<EntitySetId>,
}

/// Read-only EDM graph.
#[derive(Debug, Default)]
pub struct EdmModel {
    structured: Vec<StructuredType>,
    enums: Vec<EnumType>,
    entity_sets: Vec<EntitySet>,
    singletons: Vec<Singleton>,
    operations: Vec<Operation>,
    imports: Vec<OperationImport>,
    type_index: HashMap<String, TypeKind>,
}

impl EdmModel {
    /// Build a model from a single schema.
    ///
    /// # Errors
    /// See [`EdmModel::build`].
    pub fn from_schema(schema: SchemaDef) -> Result<Self, EdmError> {
        Self::build(vec![schema])
    }

    /// Build a model from one or more schemas sharing one entity container.
    ///
    /// # Errors
    /// Returns `EdmError` on duplicate names, unresolved type references,
    /// inheritance cycles, missing or malformed keys, and invalid operations.
    pub fn build(schemas: Vec<SchemaDef>) -> Result<Self, EdmError> {
        let mut model = EdmModel::default();
        model.register_types(&schemas)?;
        model.resolve_enums(&schemas)?;
        model.resolve_structured_types(&schemas)?;
        model.check_inheritance()?;
        model.check_keys()?;
        model.resolve_container(&schemas)?;
        model.resolve_operations(&schemas)?;
        model.resolve_imports(&schemas)?;

        tracing::debug!(
            structured_types = model.structured.len(),
            enum_types = model.enums.len(),
            entity_sets = model.entity_sets.len(),
            singletons = model.singletons.len(),
            operations = model.operations.len(),
            "Built EDM model"
        );
        Ok(model)
    }

    // ---- element access ----

    #[must_use]
    pub fn structured_type(&self, id: StructuredTypeId) -> &StructuredType {
        &self.structured[id.0]
    }

    #[must_use]
    pub fn enum_type(&self, id: EnumTypeId) -> &EnumType {
        &self.enums[id.0]
    }

    #[must_use]
    pub fn entity_set(&self, id: EntitySetId) -> &EntitySet {
        &self.entity_sets[id.0]
    }

    #[must_use]
    pub fn singleton(&self, id: SingletonId) -> &Singleton {
        &self.singletons[id.0]
    }

    #[must_use]
    pub fn operation(&self, id: OperationId) -> &Operation {
        &self.operations[id.0]
    }

    #[must_use]
    pub fn operation_import(&self, id: OperationImportId) -> &OperationImport {
        &self.imports[id.0]
    }

    pub fn entity_sets(&self) -> impl Iterator<Item = (EntitySetId, &EntitySet)> {
        self.entity_sets
            .iter()
            .enumerate()
            .map(|(i, s)| (EntitySetId(i), s))
    }

    pub fn singletons(&self) -> impl Iterator<Item = (SingletonId, &Singleton)> {
        self.singletons
            .iter()
            .enumerate()
            .map(|(i, s)| (SingletonId(i), s))
    }

    pub fn operations(&self) -> impl Iterator<Item = (OperationId, &Operation)> {
        self.operations
            .iter()
            .enumerate()
            .map(|(i, o)| (OperationId(i), o))
    }

    pub fn operation_imports(&self) -> impl Iterator<Item = (OperationImportId, &OperationImport)> {
        self.imports
            .iter()
            .enumerate()
            .map(|(i, o)| (OperationImportId(i), o))
    }

    // ---- lookups ----

    #[must_use]
    pub fn find_entity_set(&self, name: &str) -> Option<EntitySetId> {
        self.entity_sets
            .iter()
            .position(|s| s.name == name)
            .map(EntitySetId)
    }

    #[must_use]
    pub fn find_singleton(&self, name: &str) -> Option<SingletonId> {
        self.singletons
            .iter()
            .position(|s| s.name == name)
            .map(SingletonId)
    }

    #[must_use]
    pub fn find_operation_import(&self, name: &str) -> Option<OperationImportId> {
        self.imports
            .iter()
            .position(|i| i.name == name)
            .map(OperationImportId)
    }

    /// Resolve a qualified structured type name.
    #[must_use]
    pub fn find_structured_type(&self, qualified_name: &str) -> Option<StructuredTypeId> {
        match self.type_index.get(qualified_name) {
            Some(TypeKind::Structured(id)) => Some(*id),
            _ => None,
        }
    }

    /// Resolve a qualified type name, including `Edm.*` and `Collection(...)`.
    #[must_use]
    pub fn find_type(&self, type_name: &str) -> Option<TypeRef> {
        let (inner, collection) = split_collection(type_name);
        let kind = match PrimitiveKind::from_qualified_name(inner) {
            Some(p) => TypeKind::Primitive(p),
            None => *self.type_index.get(inner)?,
        };
        Some(TypeRef {
            kind,
            collection,
            nullable: false,
        })
    }

    /// The type followed by its base types, most-derived first.
    pub fn ancestors(&self, id: StructuredTypeId) -> impl Iterator<Item = StructuredTypeId> + '_ {
        std::iter::successors(Some(id), |cur| self.structured[cur.0].base)
    }

    /// `true` when `derived` is `base` or inherits from it.
    #[must_use]
    pub fn is_assignable(&self, derived: StructuredTypeId, base: StructuredTypeId) -> bool {
        self.ancestors(derived).any(|t| t == base)
    }

    /// All types inheriting (directly or transitively) from `base`.
    #[must_use]
    pub fn derived_types(&self, base: StructuredTypeId) -> Vec<StructuredTypeId> {
        (0..self.structured.len())
            .map(StructuredTypeId)
            .filter(|&id| id != base && self.is_assignable(id, base))
            .collect()
    }

    /// Effective key properties in declaration order.
    #[must_use]
    pub fn key_properties(&self, id: StructuredTypeId) -> Vec<&StructuralProperty> {
        let Some(owner) = self
            .ancestors(id)
            .find(|t| !self.structured[t.0].declared_key.is_empty())
        else {
            return Vec::new();
        };
        self.structured[owner.0]
            .declared_key
            .iter()
            .filter_map(|name| self.find_property(id, name))
            .collect()
    }

    /// Structural property lookup walking the base chain.
    #[must_use]
    pub fn find_property(&self, id: StructuredTypeId, name: &str) -> Option<&StructuralProperty> {
        self.ancestors(id).find_map(|t| {
            self.structured[t.0]
                .properties
                .iter()
                .find(|p| p.name == name)
        })
    }

    /// Navigation property lookup walking the base chain.
    #[must_use]
    pub fn find_navigation_property(
        &self,
        id: StructuredTypeId,
        name: &str,
    ) -> Option<&NavigationProperty> {
        self.ancestors(id).find_map(|t| {
            self.structured[t.0]
                .navigation_properties
                .iter()
                .find(|p| p.name == name)
        })
    }

    #[must_use]
    pub fn is_open(&self, id: StructuredTypeId) -> bool {
        self.ancestors(id).any(|t| self.structured[t.0].is_open)
    }

    /// Operations named `name` (short or qualified), any kind, bound or not.
    #[must_use]
    pub fn operations_named(&self, name: &str) -> Vec<OperationId> {
        self.operations()
            .filter(|(_, op)| op.name == name || op.full_name() == name)
            .map(|(id, _)| id)
            .collect()
    }

    /// Bound operations named `name` whose binding parameter accepts `binding`.
    ///
    /// The binding type matches when it equals the declared binding type or
    /// derives from it, with the same collection-ness.
    #[must_use]
    pub fn find_bound_operations(&self, name: &str, binding: TypeRef) -> Vec<OperationId> {
        let Some(binding_id) = binding.as_structured() else {
            return Vec::new();
        };
        self.operations()
            .filter(|(_, op)| op.is_bound && (op.name == name || op.full_name() == name))
            .filter(|(_, op)| {
                op.binding_parameter().is_some_and(|p| {
                    p.ty.collection == binding.collection
                        && p.ty
                            .as_structured()
                            .is_some_and(|declared| self.is_assignable(binding_id, declared))
                })
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Qualified display name of a type reference.
    #[must_use]
    pub fn type_name(&self, ty: &TypeRef) -> String {
        let inner = match ty.kind {
            TypeKind::Primitive(p) => p.to_string(),
            TypeKind::Enum(id) => self.enums[id.0].full_name(),
            TypeKind::Structured(id) => self.structured[id.0].full_name(),
        };
        if ty.collection {
            format!("Collection({inner})")
        } else {
            inner
        }
    }

    // ---- build steps ----

    fn resolve_type_name(&self, type_name: &str, referenced_by: &str) -> Result<TypeRef, EdmError> {
        self.find_type(type_name)
            .ok_or_else(|| EdmError::UnknownType {
                type_name: type_name.to_owned(),
                referenced_by: referenced_by.to_owned(),
            })
    }

    fn register_types(&mut self, schemas: &[SchemaDef]) -> Result<(), EdmError> {
        for schema in schemas {
            let structured = schema
                .entity_types
                .iter()
                .map(|d| (d, StructuredKind::Entity))
                .chain(
                    schema
                        .complex_types
                        .iter()
                        .map(|d| (d, StructuredKind::Complex)),
                );
            for (def, kind) in structured {
                let full_name = format!("{}.{}", schema.namespace, def.name);
                let id = StructuredTypeId(self.structured.len());
                if self
                    .type_index
                    .insert(full_name.clone(), TypeKind::Structured(id))
                    .is_some()
                {
                    return Err(EdmError::Duplicate(full_name));
                }
                self.structured.push(StructuredType {
                    namespace: schema.namespace.clone(),
                    name: def.name.clone(),
                    kind,
                    base: None,
                    declared_key: def.key.clone(),
                    properties: Vec::new(),
                    navigation_properties: Vec::new(),
                    is_abstract: def.is_abstract,
                    is_open: def.open_type,
                });
            }
            for def in &schema.enum_types {
                let full_name = format!("{}.{}", schema.namespace, def.name);
                let id = EnumTypeId(self.enums.len());
                if self
                    .type_index
                    .insert(full_name.clone(), TypeKind::Enum(id))
                    .is_some()
                {
                    return Err(EdmError::Duplicate(full_name));
                }
                self.enums.push(EnumType {
                    namespace: schema.namespace.clone(),
                    name: def.name.clone(),
                    members: Vec::new(),
                    is_flags: def.is_flags,
                });
            }
        }
        Ok(())
    }

    fn resolve_enums(&mut self, schemas: &[SchemaDef]) -> Result<(), EdmError> {
        for schema in schemas {
            for def in &schema.enum_types {
                let full_name = format!("{}.{}", schema.namespace, def.name);
                if def.members.is_empty() {
                    return Err(EdmError::InvalidEnum {
                        type_name: full_name,
                        reason: "at least one member is required".to_owned(),
                    });
                }
                let mut seen = HashSet::new();
                let mut next = 0_i64;
                let mut members = Vec::with_capacity(def.members.len());
                for m in &def.members {
                    if !seen.insert(m.name.as_str()) {
                        return Err(EdmError::InvalidEnum {
                            type_name: full_name,
                            reason: format!("duplicate member '{}'", m.name),
                        });
                    }
                    let value = m.value.unwrap_or(next);
                    next = value.saturating_add(1);
                    members.push(EnumMember {
                        name: m.name.clone(),
                        value,
                    });
                }
                if let Some(TypeKind::Enum(id)) = self.type_index.get(&full_name).copied() {
                    self.enums[id.0].members = members;
                }
            }
        }
        Ok(())
    }

    fn resolve_structured_types(&mut self, schemas: &[SchemaDef]) -> Result<(), EdmError> {
        for schema in schemas {
            for def in schema.entity_types.iter().chain(&schema.complex_types) {
                let full_name = format!("{}.{}", schema.namespace, def.name);
                let Some(id) = self.find_structured_type(&full_name) else {
                    continue;
                };
                self.resolve_structured_type(id, &full_name, def)?;
            }
        }
        Ok(())
    }

    fn resolve_structured_type(
        &mut self,
        id: StructuredTypeId,
        full_name: &str,
        def: &StructuredTypeDef,
    ) -> Result<(), EdmError> {
        let kind = self.structured[id.0].kind;

        let base = match &def.base_type {
            Some(base_name) => {
                let base_id = self.find_structured_type(base_name).ok_or_else(|| {
                    EdmError::UnknownType {
                        type_name: base_name.clone(),
                        referenced_by: full_name.to_owned(),
                    }
                })?;
                if self.structured[base_id.0].kind != kind {
                    return Err(EdmError::InvalidBaseType {
                        type_name: full_name.to_owned(),
                        reason: format!("'{base_name}' is a different kind of type"),
                    });
                }
                Some(base_id)
            }
            None => None,
        };

        let mut names = HashSet::new();
        let mut properties = Vec::with_capacity(def.properties.len());
        for p in &def.properties {
            if !names.insert(p.name.as_str()) {
                return Err(EdmError::Duplicate(format!("{full_name}/{}", p.name)));
            }
            let ty = self
                .resolve_type_name(&p.type_name, &format!("{full_name}/{}", p.name))?
                .with_nullable(p.nullable);
            properties.push(StructuralProperty {
                name: p.name.clone(),
                ty,
            });
        }

        let mut navigation_properties = Vec::with_capacity(def.navigation_properties.len());
        for n in &def.navigation_properties {
            let owner = format!("{full_name}/{}", n.name);
            if !names.insert(n.name.as_str()) {
                return Err(EdmError::Duplicate(owner));
            }
            let ty = self.resolve_type_name(&n.type_name, &owner)?;
            let target = ty
                .as_structured()
                .filter(|t| self.structured[t.0].is_entity())
                .ok_or_else(|| EdmError::NotAnEntityType {
                    name: owner.clone(),
                    type_name: n.type_name.clone(),
                })?;
            navigation_properties.push(NavigationProperty {
                name: n.name.clone(),
                target,
                collection: ty.collection,
                contains_target: n.contains_target,
            });
        }

        let ty = &mut self.structured[id.0];
        ty.base = base;
        ty.properties = properties;
        ty.navigation_properties = navigation_properties;
        Ok(())
    }

    fn check_inheritance(&self) -> Result<(), EdmError> {
        for start in 0..self.structured.len() {
            let mut visited = HashSet::new();
            let mut current = Some(StructuredTypeId(start));
            while let Some(id) = current {
                if !visited.insert(id) {
                    return Err(EdmError::InheritanceCycle(
                        self.structured[start].full_name(),
                    ));
                }
                current = self.structured[id.0].base;
            }
        }
        Ok(())
    }

    fn check_keys(&self) -> Result<(), EdmError> {
        for (index, ty) in self.structured.iter().enumerate() {
            let id = StructuredTypeId(index);
            let invalid = |reason: &str| EdmError::InvalidKey {
                type_name: ty.full_name(),
                reason: reason.to_owned(),
            };

            if !ty.is_entity() {
                if !ty.declared_key.is_empty() {
                    return Err(invalid("complex types cannot declare a key"));
                }
                continue;
            }

            if !ty.declared_key.is_empty()
                && self
                    .ancestors(id)
                    .skip(1)
                    .any(|b| !self.structured[b.0].declared_key.is_empty())
            {
                return Err(invalid("key is already defined by a base type"));
            }

            for name in &ty.declared_key {
                let prop = self
                    .find_property(id, name)
                    .ok_or_else(|| invalid(&format!("key property '{name}' is not declared")))?;
                let scalar = matches!(prop.ty.kind, TypeKind::Primitive(_) | TypeKind::Enum(_));
                if !scalar || prop.ty.collection {
                    return Err(invalid(&format!(
                        "key property '{name}' must be a single primitive or enum value"
                    )));
                }
            }

            if !ty.is_abstract && self.key_properties(id).is_empty() {
                return Err(invalid("entity type must declare at least one key property"));
            }
        }
        Ok(())
    }

    fn resolve_container(&mut self, schemas: &[SchemaDef]) -> Result<(), EdmError> {
        let mut names = HashSet::new();
        for schema in schemas {
            for def in &schema.entity_sets {
                if !names.insert(def.name.clone()) {
                    return Err(EdmError::Duplicate(def.name.clone()));
                }
                let entity_type = self.resolve_entity_type(&def.name, &def.entity_type)?;
                self.entity_sets.push(EntitySet {
                    name: def.name.clone(),
                    entity_type,
                });
            }
            for def in &schema.singletons {
                if !names.insert(def.name.clone()) {
                    return Err(EdmError::Duplicate(def.name.clone()));
                }
                let entity_type = self.resolve_entity_type(&def.name, &def.entity_type)?;
                self.singletons.push(Singleton {
                    name: def.name.clone(),
                    entity_type,
                });
            }
            for def in schema.action_imports.iter().chain(&schema.function_imports) {
                if !names.insert(def.name.clone()) {
                    return Err(EdmError::Duplicate(def.name.clone()));
                }
            }
        }
        Ok(())
    }

    fn resolve_entity_type(&self, name: &str, type_name: &str) -> Result<StructuredTypeId, EdmError> {
        let id = self
            .find_structured_type(type_name)
            .ok_or_else(|| EdmError::UnknownType {
                type_name: type_name.to_owned(),
                referenced_by: name.to_owned(),
            })?;
        if !self.structured[id.0].is_entity() {
            return Err(EdmError::NotAnEntityType {
                name: name.to_owned(),
                type_name: type_name.to_owned(),
            });
        }
        Ok(id)
    }

    fn resolve_operations(&mut self, schemas: &[SchemaDef]) -> Result<(), EdmError> {
        let mut signatures = HashSet::new();
        for schema in schemas {
            let defs = schema
                .actions
                .iter()
                .map(|d| (d, OperationKind::Action))
                .chain(schema.functions.iter().map(|d| (d, OperationKind::Function)));
            for (def, kind) in defs {
                let op = self.resolve_operation(&schema.namespace, def, kind)?;

                let mut param_names: Vec<&str> =
                    op.url_parameters().iter().map(|p| p.name.as_str()).collect();
                param_names.sort_unstable();
                let signature = format!(
                    "{}:{}:{}:{}",
                    kind,
                    op.full_name(),
                    op.binding_parameter()
                        .map(|p| self.type_name(&p.ty))
                        .unwrap_or_default(),
                    param_names.join(",")
                );
                if !signatures.insert(signature) {
                    return Err(EdmError::Duplicate(op.full_name()));
                }
                self.operations.push(op);
            }
        }
        Ok(())
    }

    fn resolve_operation(
        &self,
        namespace: &str,
        def: &OperationDef,
        kind: OperationKind,
    ) -> Result<Operation, EdmError> {
        let full_name = format!("{namespace}.{}", def.name);
        let invalid = |reason: &str| EdmError::InvalidOperation {
            operation: full_name.clone(),
            reason: reason.to_owned(),
        };

        if def.is_bound && def.parameters.is_empty() {
            return Err(invalid("bound operations require a binding parameter"));
        }
        if kind == OperationKind::Action && def.is_composable {
            return Err(invalid("actions cannot be composable"));
        }

        let mut seen = HashSet::new();
        let mut parameters = Vec::with_capacity(def.parameters.len());
        for (i, p) in def.parameters.iter().enumerate() {
            if !seen.insert(p.name.as_str()) {
                return Err(invalid(&format!("duplicate parameter '{}'", p.name)));
            }
            let ty = self
                .resolve_type_name(&p.type_name, &format!("{full_name}/{}", p.name))?
                .with_nullable(p.nullable);
            if def.is_bound && i == 0 && p.optional {
                return Err(invalid("the binding parameter cannot be optional"));
            }
            parameters.push(Parameter {
                name: p.name.clone(),
                ty,
                optional: p.optional,
            });
        }

        let return_type = def
            .return_type
            .as_deref()
            .map(|t| self.resolve_type_name(t, &full_name))
            .transpose()?;
        if kind == OperationKind::Function && return_type.is_none() {
            return Err(invalid("functions must declare a return type"));
        }

        Ok(Operation {
            kind,
            namespace: namespace.to_owned(),
            name: def.name.clone(),
            is_bound: def.is_bound,
            is_composable: def.is_composable,
            parameters,
            return_type,
        })
    }

    fn resolve_imports(&mut self, schemas: &[SchemaDef]) -> Result<(), EdmError> {
        for schema in schemas {
            let defs = schema
                .action_imports
                .iter()
                .map(|d| (d, OperationKind::Action))
                .chain(
                    schema
                        .function_imports
                        .iter()
                        .map(|d| (d, OperationKind::Function)),
                );
            for (def, kind) in defs {
                let operations: Vec<OperationId> = self
                    .operations()
                    .filter(|(_, op)| {
                        !op.is_bound && op.kind == kind && op.full_name() == def.operation
                    })
                    .map(|(id, _)| id)
                    .collect();
                if operations.is_empty() {
                    return Err(EdmError::InvalidOperation {
                        operation: def.name.clone(),
                        reason: format!("no unbound {kind} named '{}'", def.operation),
                    });
                }
                if kind == OperationKind::Action && operations.len() > 1 {
                    return Err(EdmError::InvalidOperation {
                        operation: def.name.clone(),
                        reason: "action imports must reference a single action".to_owned(),
                    });
                }
                let entity_set = def
                    .entity_set
                    .as_deref()
                    .map(|name| {
                        self.find_entity_set(name)
                            .ok_or_else(|| EdmError::UnknownType {
                                type_name: name.to_owned(),
                                referenced_by: def.name.clone(),
                            })
                    })
                    .transpose()?;
                self.imports.push(OperationImport {
                    kind,
                    name: def.name.clone(),
                    operations,
                    entity_set,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::def::{EnumTypeDef, OperationDef, StructuredTypeDef};

    fn sales() -> SchemaDef {
        SchemaDef::new("NS")
            .entity_type(
                StructuredTypeDef::new("Customer")
                    .key("Id", "Edm.Int32")
                    .property("Name", "Edm.String")
                    .navigation("Orders", "Collection(NS.Order)"),
            )
            .entity_type(StructuredTypeDef::new("VipCustomer").base("NS.Customer"))
            .entity_type(
                StructuredTypeDef::new("Order")
                    .key("Id", "Edm.Int32")
                    .navigation("Customer", "NS.Customer"),
            )
            .enum_type(EnumTypeDef::new("Color").member("Red").member("Blue"))
            .entity_set("Customers", "NS.Customer")
            .entity_set("Orders", "NS.Order")
            .function(
                OperationDef::new("GetTopOrders")
                    .bound_to("NS.Customer")
                    .parameter("count", "Edm.Int32")
                    .returns("Collection(NS.Order)"),
            )
    }

    #[test]
    fn derived_type_inherits_key_and_properties() {
        let model = EdmModel::from_schema(sales()).unwrap();
        let vip = model.find_structured_type("NS.VipCustomer").unwrap();
        let customer = model.find_structured_type("NS.Customer").unwrap();

        let keys = model.key_properties(vip);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name, "Id");
        assert!(model.find_property(vip, "Name").is_some());
        assert!(model.find_navigation_property(vip, "Orders").is_some());
        assert!(model.is_assignable(vip, customer));
        assert!(!model.is_assignable(customer, vip));
        assert_eq!(model.derived_types(customer), vec![vip]);
    }

    #[test]
    fn bound_operations_accept_derived_binding_type() {
        let model = EdmModel::from_schema(sales()).unwrap();
        let vip = model.find_structured_type("NS.VipCustomer").unwrap();
        let found = model.find_bound_operations("GetTopOrders", TypeRef::structured(vip));
        assert_eq!(found.len(), 1);
        let op = model.operation(found[0]);
        assert_eq!(op.full_name(), "NS.GetTopOrders");
        assert_eq!(op.url_parameters().len(), 1);

        let collection = TypeRef::structured(vip).with_collection(true);
        assert!(model.find_bound_operations("GetTopOrders", collection).is_empty());
    }

    #[test]
    fn type_names_render_collections() {
        let model = EdmModel::from_schema(sales()).unwrap();
        let ty = model.find_type("Collection(NS.Order)").unwrap();
        assert!(ty.collection);
        assert_eq!(model.type_name(&ty), "Collection(NS.Order)");
        assert_eq!(
            model.type_name(&model.find_type("Edm.Int32").unwrap()),
            "Edm.Int32"
        );
    }

    #[test]
    fn missing_key_is_rejected() {
        let schema = SchemaDef::new("NS").entity_type(StructuredTypeDef::new("NoKey"));
        let err = EdmModel::from_schema(schema).unwrap_err();
        assert!(matches!(err, EdmError::InvalidKey { .. }));
    }

    #[test]
    fn abstract_type_may_omit_key() {
        let schema = SchemaDef::new("NS")
            .entity_type(StructuredTypeDef::new("Base").abstract_type())
            .entity_type(
                StructuredTypeDef::new("Derived")
                    .base("NS.Base")
                    .key("Code", "Edm.String"),
            );
        assert!(EdmModel::from_schema(schema).is_ok());
    }

    #[test]
    fn redeclared_key_is_rejected() {
        let mut schema = sales();
        schema.entity_types[1].key.push("Id".to_owned());
        let err = EdmModel::from_schema(schema).unwrap_err();
        assert!(matches!(err, EdmError::InvalidKey { .. }));
    }

    #[test]
    fn inheritance_cycle_is_rejected() {
        let schema = SchemaDef::new("NS")
            .entity_type(StructuredTypeDef::new("A").base("NS.B").key("Id", "Edm.Int32"))
            .entity_type(StructuredTypeDef::new("B").base("NS.A"));
        let err = EdmModel::from_schema(schema).unwrap_err();
        assert!(matches!(err, EdmError::InheritanceCycle(_)));
    }

    #[test]
    fn unknown_property_type_is_rejected() {
        let schema = SchemaDef::new("NS").entity_type(
            StructuredTypeDef::new("A")
                .key("Id", "Edm.Int32")
                .property("X", "NS.Missing"),
        );
        let err = EdmModel::from_schema(schema).unwrap_err();
        assert_eq!(
            err,
            EdmError::UnknownType {
                type_name: "NS.Missing".to_owned(),
                referenced_by: "NS.A/X".to_owned(),
            }
        );
    }

    #[test]
    fn duplicate_container_names_are_rejected() {
        let schema = sales().singleton("Customers", "NS.Customer");
        let err = EdmModel::from_schema(schema).unwrap_err();
        assert_eq!(err, EdmError::Duplicate("Customers".to_owned()));
    }

    #[test]
    fn function_import_resolves_unbound_overloads() {
        let schema = sales()
            .function(OperationDef::new("Top").returns("Edm.Int32"))
            .function(
                OperationDef::new("Top")
                    .parameter("n", "Edm.Int32")
                    .returns("Edm.Int32"),
            )
            .function_import("Top", "NS.Top");
        let model = EdmModel::from_schema(schema).unwrap();
        let import = model.find_operation_import("Top").unwrap();
        assert_eq!(model.operation_import(import).operations.len(), 2);
    }

    #[test]
    fn enum_members_get_sequential_values() {
        let model = EdmModel::from_schema(sales()).unwrap();
        let Some(TypeRef {
            kind: TypeKind::Enum(id),
            ..
        }) = model.find_type("NS.Color")
        else {
            panic!("NS.Color should be an enum");
        };
        let color = model.enum_type(id);
        assert_eq!(color.member("Red").map(|m| m.value), Some(0));
        assert_eq!(color.member("Blue").map(|m| m.value), Some(1));
    }
}
