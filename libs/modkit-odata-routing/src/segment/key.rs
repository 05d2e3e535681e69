use modkit_edm::{EdmModel, PrimitiveKind, StructuredTypeId, TypeRef, parse_literal};

use crate::context::TranslateContext;
use crate::error::Error;
use crate::options::RouteOptions;
use crate::path::ODataPathSegment;

/// Route variable prefix for the key of the addressed entity.
pub const KEY_PREFIX: &str = "key";
/// Route variable prefix for the key of a related entity (`$ref` targets).
pub const RELATED_KEY_PREFIX: &str = "relatedKey";

/// Binds one key property to the route variable that carries its value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyMapping {
    pub property: String,
    pub variable: String,
    pub ty: TypeRef,
}

/// Key segment: `({key})`, `/{key}` or `(A={keyA},B={keyB})`.
#[derive(Clone, Debug, PartialEq)]
pub struct KeySegmentTemplate {
    entity_type: StructuredTypeId,
    mappings: Vec<KeyMapping>,
}

impl KeySegmentTemplate {
    /// Key of `entity_type` bound to `{key}` (or `{keyProp}` per property when composite).
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplate` when the type is not a keyed entity type.
    pub fn new(model: &EdmModel, entity_type: StructuredTypeId) -> Result<Self, Error> {
        Self::with_prefix(model, entity_type, KEY_PREFIX)
    }

    /// Key bound to `{relatedKey}` variables.
    ///
    /// # Errors
    /// See [`KeySegmentTemplate::new`].
    pub fn related(model: &EdmModel, entity_type: StructuredTypeId) -> Result<Self, Error> {
        Self::with_prefix(model, entity_type, RELATED_KEY_PREFIX)
    }

    /// # Errors
    /// See [`KeySegmentTemplate::new`].
    pub fn with_prefix(
        model: &EdmModel,
        entity_type: StructuredTypeId,
        prefix: &str,
    ) -> Result<Self, Error> {
        let keys = key_properties(model, entity_type)?;
        let composite = keys.len() > 1;
        let mappings = keys
            .into_iter()
            .map(|(property, ty)| KeyMapping {
                variable: if composite {
                    format!("{prefix}{property}")
                } else {
                    prefix.to_owned()
                },
                property,
                ty,
            })
            .collect();
        Ok(Self {
            entity_type,
            mappings,
        })
    }

    /// Key with explicit `(property, variable)` pairs; every key property must be mapped.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplate` for unknown or missing key properties.
    pub fn with_mappings(
        model: &EdmModel,
        entity_type: StructuredTypeId,
        mappings: &[(&str, &str)],
    ) -> Result<Self, Error> {
        let keys = key_properties(model, entity_type)?;
        let type_name = model.structured_type(entity_type).full_name();
        if let Some((unknown, _)) = mappings
            .iter()
            .find(|(p, _)| !keys.iter().any(|(k, _)| k == p))
        {
            return Err(Error::InvalidTemplate(format!(
                "'{unknown}' is not a key property of '{type_name}'"
            )));
        }
        let mappings = keys
            .into_iter()
            .map(|(property, ty)| {
                let variable = mappings
                    .iter()
                    .find(|(p, _)| *p == property)
                    .map(|(_, v)| (*v).to_owned())
                    .ok_or_else(|| {
                        Error::InvalidTemplate(format!(
                            "key property '{property}' of '{type_name}' has no route variable"
                        ))
                    })?;
                Ok(KeyMapping {
                    property,
                    variable,
                    ty,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self {
            entity_type,
            mappings,
        })
    }

    #[must_use]
    pub fn entity_type(&self) -> StructuredTypeId {
        self.entity_type
    }

    #[must_use]
    pub fn mappings(&self) -> &[KeyMapping] {
        &self.mappings
    }

    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.mappings.len() > 1
    }

    #[must_use]
    pub fn edm_type(&self) -> TypeRef {
        TypeRef::structured(self.entity_type)
    }

    /// Composite keys only render in parenthesis form.
    #[must_use]
    pub fn templates(&self, options: &RouteOptions) -> Vec<String> {
        match self.mappings.as_slice() {
            [single] => {
                let mut out = Vec::with_capacity(2);
                if options.key_in_parenthesis() {
                    out.push(format!("({{{}}})", single.variable));
                }
                if options.key_as_segment() {
                    out.push(format!("/{{{}}}", single.variable));
                }
                out
            }
            many => {
                let pairs: Vec<String> = many
                    .iter()
                    .map(|m| format!("{}={{{}}}", m.property, m.variable))
                    .collect();
                vec![format!("({})", pairs.join(","))]
            }
        }
    }

    /// Conversion failures are a no-match so another candidate route can apply.
    ///
    /// # Errors
    /// Returns `Error::AliasCycle` when a key value is a cyclic parameter alias.
    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> Result<bool, Error> {
        let model = ctx.model();
        let mut keys = Vec::with_capacity(self.mappings.len());
        for mapping in &self.mappings {
            let Some(raw) = ctx.route_value(&mapping.variable) else {
                return Ok(false);
            };
            let Ok(decoded) = urlencoding::decode(raw) else {
                return Ok(false);
            };
            let mut literal = decoded.as_ref();
            if !self.is_composite() {
                literal = literal
                    .strip_prefix(mapping.property.as_str())
                    .and_then(|rest| rest.strip_prefix('='))
                    .unwrap_or(literal);
            }
            let literal = if literal.starts_with('@') {
                ctx.resolve_alias(literal)?
            } else {
                normalize_string_key(literal, &mapping.ty)
            };
            match parse_literal(&literal, &mapping.ty, model) {
                Ok(value) if !value.is_null() => keys.push((mapping, value)),
                Ok(_) => return Ok(false),
                Err(err) => {
                    tracing::debug!(
                        variable = %mapping.variable,
                        error = %err,
                        "Key value does not convert, route does not match"
                    );
                    return Ok(false);
                }
            }
        }

        let keys = keys
            .into_iter()
            .map(|(mapping, value)| {
                ctx.record_value(&mapping.variable, value.clone(), mapping.ty);
                (mapping.property.clone(), value)
            })
            .collect();
        ctx.push_segment(ODataPathSegment::Key {
            keys,
            ty: self.edm_type(),
        });
        Ok(true)
    }
}

/// Accept `Tags/ALFKI` for string keys by quoting bare values.
///
/// A captured route value does not say which key form it came from, so
/// `Tags(ALFKI)` is accepted as well.
fn normalize_string_key(literal: &str, ty: &TypeRef) -> String {
    let is_string = ty.as_primitive() == Some(PrimitiveKind::String);
    if is_string && !(literal.len() >= 2 && literal.starts_with('\'') && literal.ends_with('\'')) {
        format!("'{}'", literal.replace('\'', "''"))
    } else {
        literal.to_owned()
    }
}

fn key_properties(
    model: &EdmModel,
    entity_type: StructuredTypeId,
) -> Result<Vec<(String, TypeRef)>, Error> {
    super::require_entity_type(model, entity_type)?;
    let keys: Vec<(String, TypeRef)> = model
        .key_properties(entity_type)
        .into_iter()
        .map(|p| (p.name.clone(), p.ty))
        .collect();
    if keys.is_empty() {
        return Err(Error::InvalidTemplate(format!(
            "entity type '{}' has no key",
            model.structured_type(entity_type).full_name()
        )));
    }
    Ok(keys)
}
