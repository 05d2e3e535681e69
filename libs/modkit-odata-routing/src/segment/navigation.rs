use modkit_edm::{EdmModel, StructuredTypeId, TypeRef};

use super::current_single_structured;
use crate::context::TranslateContext;
use crate::error::Error;
use crate::path::ODataPathSegment;

/// Type cast segment (`NS.VipCustomer`).
#[derive(Clone, Debug, PartialEq)]
pub struct CastSegmentTemplate {
    cast_type: StructuredTypeId,
    expected_type: StructuredTypeId,
    type_name: String,
    collection: bool,
}

impl CastSegmentTemplate {
    /// Cast from `expected_type` to `cast_type`, which must share its inheritance chain.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplate` for unrelated or identical types.
    pub fn new(
        model: &EdmModel,
        cast_type: StructuredTypeId,
        expected_type: StructuredTypeId,
        collection: bool,
    ) -> Result<Self, Error> {
        let type_name = model.structured_type(cast_type).full_name();
        if cast_type == expected_type {
            return Err(Error::InvalidTemplate(format!(
                "cast to '{type_name}' does not change the type"
            )));
        }
        if !model.is_assignable(cast_type, expected_type)
            && !model.is_assignable(expected_type, cast_type)
        {
            return Err(Error::InvalidTemplate(format!(
                "'{type_name}' is not related to '{}'",
                model.structured_type(expected_type).full_name()
            )));
        }
        Ok(Self {
            cast_type,
            expected_type,
            type_name,
            collection,
        })
    }

    #[must_use]
    pub fn cast_type(&self) -> StructuredTypeId {
        self.cast_type
    }

    #[must_use]
    pub fn expected_type(&self) -> StructuredTypeId {
        self.expected_type
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn edm_type(&self) -> TypeRef {
        TypeRef::structured(self.cast_type).with_collection(self.collection)
    }

    /// Unconditional: the constructor already checked the cast against the schema.
    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> bool {
        ctx.push_segment(ODataPathSegment::Type {
            type_name: self.type_name.clone(),
            ty: self.edm_type(),
        });
        true
    }
}

/// Structural property segment.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertySegmentTemplate {
    name: String,
    ty: TypeRef,
}

impl PropertySegmentTemplate {
    /// # Errors
    /// Returns `Error::InvalidTemplate` when `owner` has no such structural property.
    pub fn new(model: &EdmModel, owner: StructuredTypeId, name: &str) -> Result<Self, Error> {
        let property = model.find_property(owner, name).ok_or_else(|| {
            Error::InvalidTemplate(format!(
                "'{}' has no property '{name}'",
                model.structured_type(owner).full_name()
            ))
        })?;
        Ok(Self {
            name: property.name.clone(),
            ty: property.ty,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn edm_type(&self) -> TypeRef {
        self.ty
    }

    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> bool {
        let Some(owner) = current_single_structured(ctx) else {
            return false;
        };
        let Some(property) = ctx.model().find_property(owner, &self.name) else {
            return false;
        };
        ctx.push_segment(ODataPathSegment::Property {
            name: property.name.clone(),
            ty: property.ty,
        });
        true
    }
}

/// Navigation property segment.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigationSegmentTemplate {
    name: String,
    ty: TypeRef,
}

impl NavigationSegmentTemplate {
    /// # Errors
    /// Returns `Error::InvalidTemplate` when `owner` has no such navigation property.
    pub fn new(model: &EdmModel, owner: StructuredTypeId, name: &str) -> Result<Self, Error> {
        let (name, ty) = navigation_property(model, owner, name)?;
        Ok(Self { name, ty })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn edm_type(&self) -> TypeRef {
        self.ty
    }

    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> bool {
        match resolve_navigation(ctx, &self.name) {
            Some(ty) => {
                ctx.push_segment(ODataPathSegment::Navigation {
                    name: self.name.clone(),
                    ty,
                });
                true
            }
            None => false,
        }
    }
}

/// `Nav/$ref` segment addressing the relationship rather than the related entity.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigationLinkSegmentTemplate {
    name: String,
    ty: TypeRef,
}

impl NavigationLinkSegmentTemplate {
    /// # Errors
    /// Returns `Error::InvalidTemplate` when `owner` has no such navigation property.
    pub fn new(model: &EdmModel, owner: StructuredTypeId, name: &str) -> Result<Self, Error> {
        let (name, ty) = navigation_property(model, owner, name)?;
        Ok(Self { name, ty })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn edm_type(&self) -> TypeRef {
        self.ty
    }

    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> bool {
        match resolve_navigation(ctx, &self.name) {
            Some(ty) => {
                ctx.push_segment(ODataPathSegment::NavigationLink {
                    name: self.name.clone(),
                    ty,
                });
                true
            }
            None => false,
        }
    }
}

/// Undeclared property of an open type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicSegmentTemplate {
    name: String,
}

impl DynamicSegmentTemplate {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> bool {
        let Some(owner) = current_single_structured(ctx) else {
            return false;
        };
        if !ctx.model().is_open(owner) {
            return false;
        }
        ctx.push_segment(ODataPathSegment::Dynamic {
            name: self.name.clone(),
        });
        true
    }
}

/// What a catch-all `{parameter}` segment may resolve to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatchAllRole {
    /// Structural, navigation or dynamic property.
    Property,
    /// Navigation property followed by `/$ref`.
    NavigationLink,
}

/// Catch-all segment whose name is supplied by a route variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathTemplateSegmentTemplate {
    parameter: String,
    role: CatchAllRole,
}

impl PathTemplateSegmentTemplate {
    #[must_use]
    pub fn new(parameter: impl Into<String>, role: CatchAllRole) -> Self {
        Self {
            parameter: parameter.into(),
            role,
        }
    }

    #[must_use]
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    #[must_use]
    pub fn role(&self) -> CatchAllRole {
        self.role
    }

    #[must_use]
    pub fn template(&self) -> String {
        match self.role {
            CatchAllRole::Property => format!("{{{}}}", self.parameter),
            CatchAllRole::NavigationLink => format!("{{{}}}/$ref", self.parameter),
        }
    }

    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> bool {
        let Some(raw) = ctx.route_value(&self.parameter) else {
            return false;
        };
        let Ok(name) = urlencoding::decode(raw) else {
            return false;
        };
        let Some(owner) = current_single_structured(ctx) else {
            return false;
        };
        let model = ctx.model();
        let segment = match self.role {
            CatchAllRole::NavigationLink => model
                .find_navigation_property(owner, &name)
                .map(|nav| ODataPathSegment::NavigationLink {
                    name: nav.name.clone(),
                    ty: nav.target_type(),
                }),
            CatchAllRole::Property => {
                if let Some(property) = model.find_property(owner, &name) {
                    Some(ODataPathSegment::Property {
                        name: property.name.clone(),
                        ty: property.ty,
                    })
                } else if let Some(nav) = model.find_navigation_property(owner, &name) {
                    Some(ODataPathSegment::Navigation {
                        name: nav.name.clone(),
                        ty: nav.target_type(),
                    })
                } else if model.is_open(owner) {
                    Some(ODataPathSegment::Dynamic {
                        name: name.into_owned(),
                    })
                } else {
                    None
                }
            }
        };
        match segment {
            Some(segment) => {
                ctx.push_segment(segment);
                true
            }
            None => false,
        }
    }
}

fn navigation_property(
    model: &EdmModel,
    owner: StructuredTypeId,
    name: &str,
) -> Result<(String, TypeRef), Error> {
    let nav = model.find_navigation_property(owner, name).ok_or_else(|| {
        Error::InvalidTemplate(format!(
            "'{}' has no navigation property '{name}'",
            model.structured_type(owner).full_name()
        ))
    })?;
    Ok((nav.name.clone(), nav.target_type()))
}

fn resolve_navigation(ctx: &TranslateContext<'_>, name: &str) -> Option<TypeRef> {
    let owner = current_single_structured(ctx)?;
    ctx.model()
        .find_navigation_property(owner, name)
        .map(|nav| nav.target_type())
}
