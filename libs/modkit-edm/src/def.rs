//! Schema definition DTOs.
//!
//! `SchemaDef` is the input of [`crate::EdmModel::build`]. It deserializes from
//! a camelCase JSON/YAML document (a trimmed-down CSDL JSON shape) and can also
//! be written fluently from Rust:
//!
//! ```rust,ignore
//! let schema = SchemaDef::new("NS")
//!     .entity_type(StructuredTypeDef::new("Customer").key("Id", "Edm.Int32"))
//!     .entity_set("Customers", "NS.Customer");
//! let model = EdmModel::from_schema(schema)?;
//! ```
//!
//! Type names are qualified (`NS.Customer`, `Edm.String`) and may be wrapped
//! as `Collection(...)`.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SchemaDef {
    pub namespace: String,
    #[serde(default)]
    pub entity_types: Vec<StructuredTypeDef>,
    #[serde(default)]
    pub complex_types: Vec<StructuredTypeDef>,
    #[serde(default)]
    pub enum_types: Vec<EnumTypeDef>,
    #[serde(default)]
    pub entity_sets: Vec<NavigationSourceDef>,
    #[serde(default)]
    pub singletons: Vec<NavigationSourceDef>,
    #[serde(default)]
    pub actions: Vec<OperationDef>,
    #[serde(default)]
    pub functions: Vec<OperationDef>,
    #[serde(default)]
    pub action_imports: Vec<OperationImportDef>,
    #[serde(default)]
    pub function_imports: Vec<OperationImportDef>,
}

impl SchemaDef {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn entity_type(mut self, def: StructuredTypeDef) -> Self {
        self.entity_types.push(def);
        self
    }

    #[must_use]
    pub fn complex_type(mut self, def: StructuredTypeDef) -> Self {
        self.complex_types.push(def);
        self
    }

    #[must_use]
    pub fn enum_type(mut self, def: EnumTypeDef) -> Self {
        self.enum_types.push(def);
        self
    }

    #[must_use]
    pub fn entity_set(mut self, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.entity_sets.push(NavigationSourceDef {
            name: name.into(),
            entity_type: entity_type.into(),
        });
        self
    }

    #[must_use]
    pub fn singleton(mut self, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.singletons.push(NavigationSourceDef {
            name: name.into(),
            entity_type: entity_type.into(),
        });
        self
    }

    #[must_use]
    pub fn action(mut self, def: OperationDef) -> Self {
        self.actions.push(def);
        self
    }

    #[must_use]
    pub fn function(mut self, def: OperationDef) -> Self {
        self.functions.push(def);
        self
    }

    #[must_use]
    pub fn action_import(mut self, name: impl Into<String>, action: impl Into<String>) -> Self {
        self.action_imports.push(OperationImportDef {
            name: name.into(),
            operation: action.into(),
            entity_set: None,
        });
        self
    }

    #[must_use]
    pub fn function_import(
        mut self,
        name: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        self.function_imports.push(OperationImportDef {
            name: name.into(),
            operation: function.into(),
            entity_set: None,
        });
        self
    }
}

/// Entity or complex type definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StructuredTypeDef {
    pub name: String,
    #[serde(default)]
    pub base_type: Option<String>,
    /// Ordered key property names (entity types only).
    #[serde(default)]
    pub key: Vec<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub navigation_properties: Vec<NavigationPropertyDef>,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub open_type: bool,
}

impl StructuredTypeDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn base(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    /// Declare a key property (also adds it as a non-nullable property).
    #[must_use]
    pub fn key(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let name = name.into();
        self.key.push(name.clone());
        self.properties.push(PropertyDef {
            name,
            type_name: type_name.into(),
            nullable: false,
        });
        self
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
        });
        self
    }

    #[must_use]
    pub fn navigation(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.navigation_properties.push(NavigationPropertyDef {
            name: name.into(),
            type_name: type_name.into(),
            contains_target: false,
        });
        self
    }

    #[must_use]
    pub fn containment(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.navigation_properties.push(NavigationPropertyDef {
            name: name.into(),
            type_name: type_name.into(),
            contains_target: true,
        });
        self
    }

    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn open(mut self) -> Self {
        self.open_type = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NavigationPropertyDef {
    pub name: String,
    /// Target entity type, `Collection(...)` for collection-valued navigation.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub contains_target: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnumTypeDef {
    pub name: String,
    #[serde(default)]
    pub members: Vec<EnumMemberDef>,
    #[serde(default)]
    pub is_flags: bool,
}

impl EnumTypeDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn member(mut self, name: impl Into<String>) -> Self {
        self.members.push(EnumMemberDef {
            name: name.into(),
            value: None,
        });
        self
    }

    #[must_use]
    pub fn member_with_value(mut self, name: impl Into<String>, value: i64) -> Self {
        self.members.push(EnumMemberDef {
            name: name.into(),
            value: Some(value),
        });
        self
    }

    #[must_use]
    pub fn flags(mut self) -> Self {
        self.is_flags = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnumMemberDef {
    pub name: String,
    /// Explicit value; when absent the previous value plus one (or 0) is used.
    #[serde(default)]
    pub value: Option<i64>,
}

/// Entity set or singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NavigationSourceDef {
    pub name: String,
    pub entity_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OperationDef {
    pub name: String,
    #[serde(default)]
    pub is_bound: bool,
    #[serde(default)]
    pub is_composable: bool,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub return_type: Option<String>,
}

impl OperationDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Mark the operation bound; `binding_type` becomes the first parameter.
    #[must_use]
    pub fn bound_to(mut self, binding_type: impl Into<String>) -> Self {
        self.is_bound = true;
        self.parameters.insert(
            0,
            ParameterDef {
                name: "bindingParameter".to_owned(),
                type_name: binding_type.into(),
                nullable: false,
                optional: false,
            },
        );
        self
    }

    #[must_use]
    pub fn composable(mut self) -> Self {
        self.is_composable = true;
        self
    }

    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            type_name: type_name.into(),
            nullable: false,
            optional: false,
        });
        self
    }

    #[must_use]
    pub fn optional_parameter(
        mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
            optional: true,
        });
        self
    }

    #[must_use]
    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = Some(type_name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OperationImportDef {
    pub name: String,
    /// Qualified name of the unbound action/function.
    pub operation: String,
    #[serde(default)]
    pub entity_set: Option<String>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_def_deserializes_camel_case() {
        let def: SchemaDef = serde_json::from_value(json!({
            "namespace": "NS",
            "entityTypes": [{
                "name": "Customer",
                "key": ["Id"],
                "properties": [
                    { "name": "Id", "type": "Edm.Int32", "nullable": false },
                    { "name": "Name", "type": "Edm.String" }
                ],
                "navigationProperties": [
                    { "name": "Orders", "type": "Collection(NS.Order)" }
                ]
            }],
            "entitySets": [{ "name": "Customers", "entityType": "NS.Customer" }],
            "functions": [{
                "name": "GetTopOrders",
                "isBound": true,
                "parameters": [
                    { "name": "bindingParameter", "type": "NS.Customer" },
                    { "name": "count", "type": "Edm.Int32", "optional": true }
                ],
                "returnType": "Collection(NS.Order)"
            }]
        }))
        .unwrap();

        assert_eq!(def.namespace, "NS");
        assert_eq!(def.entity_types[0].key, vec!["Id"]);
        assert!(def.entity_types[0].properties[1].nullable);
        assert!(def.functions[0].parameters[1].optional);
        assert_eq!(def.entity_sets[0].entity_type, "NS.Customer");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<SchemaDef, _> =
            serde_json::from_value(json!({ "namespace": "NS", "entitySet": [] }));
        assert!(result.is_err());
    }

    #[test]
    fn bound_to_inserts_binding_parameter_first() {
        let op = OperationDef::new("Rate")
            .parameter("stars", "Edm.Int32")
            .bound_to("NS.Product");
        assert!(op.is_bound);
        assert_eq!(op.parameters[0].type_name, "NS.Product");
        assert_eq!(op.parameters[1].name, "stars");
    }
}
