//! Segment templates: one node of an addressable OData path shape.
//!
//! Every kind knows the literal route strings it renders to and how to
//! resolve itself against the request's route values. Templates hold only
//! arena handles and names, so they are cheap to clone and safe to share.

mod key;
mod navigation;
mod operation;
mod source;

pub use key::{KeyMapping, KeySegmentTemplate};
pub use navigation::{
    CastSegmentTemplate, CatchAllRole, DynamicSegmentTemplate, NavigationLinkSegmentTemplate,
    NavigationSegmentTemplate, PathTemplateSegmentTemplate, PropertySegmentTemplate,
};
pub use operation::{
    ActionImportSegmentTemplate, ActionSegmentTemplate, FunctionImportSegmentTemplate,
    FunctionSegmentTemplate, ParameterMapping,
};
pub use source::{EntitySetSegmentTemplate, SingletonSegmentTemplate};

use modkit_edm::{EdmModel, PrimitiveKind, StructuredTypeId, TypeRef};

use crate::context::TranslateContext;
use crate::error::Error;
use crate::options::RouteOptions;
use crate::path::ODataPathSegment;

/// Closed set of segment kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Metadata,
    EntitySet,
    Singleton,
    Key,
    Cast,
    Property,
    Navigation,
    NavigationLink,
    Function,
    Action,
    FunctionImport,
    ActionImport,
    Ref,
    Count,
    Value,
    Dynamic,
    PathTemplate,
}

/// One segment of a [`crate::PathTemplate`].
#[derive(Clone, Debug, PartialEq)]
pub enum SegmentTemplate {
    Metadata,
    EntitySet(EntitySetSegmentTemplate),
    Singleton(SingletonSegmentTemplate),
    Key(KeySegmentTemplate),
    Cast(CastSegmentTemplate),
    Property(PropertySegmentTemplate),
    Navigation(NavigationSegmentTemplate),
    NavigationLink(NavigationLinkSegmentTemplate),
    Function(FunctionSegmentTemplate),
    Action(ActionSegmentTemplate),
    FunctionImport(FunctionImportSegmentTemplate),
    ActionImport(ActionImportSegmentTemplate),
    Ref,
    Count,
    /// `$value` of a primitive property or media entity.
    Value {
        ty: Option<TypeRef>,
    },
    Dynamic(DynamicSegmentTemplate),
    PathTemplate(PathTemplateSegmentTemplate),
}

impl SegmentTemplate {
    /// Entity set segment by container element name.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplate` when the entity set does not exist.
    pub fn entity_set(model: &EdmModel, name: &str) -> Result<Self, Error> {
        let id = model
            .find_entity_set(name)
            .ok_or_else(|| Error::InvalidTemplate(format!("unknown entity set '{name}'")))?;
        Ok(Self::EntitySet(EntitySetSegmentTemplate::new(model, id)))
    }

    /// Singleton segment by container element name.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplate` when the singleton does not exist.
    pub fn singleton(model: &EdmModel, name: &str) -> Result<Self, Error> {
        let id = model
            .find_singleton(name)
            .ok_or_else(|| Error::InvalidTemplate(format!("unknown singleton '{name}'")))?;
        Ok(Self::Singleton(SingletonSegmentTemplate::new(model, id)))
    }

    #[must_use]
    pub fn kind(&self) -> SegmentKind {
        match self {
            Self::Metadata => SegmentKind::Metadata,
            Self::EntitySet(_) => SegmentKind::EntitySet,
            Self::Singleton(_) => SegmentKind::Singleton,
            Self::Key(_) => SegmentKind::Key,
            Self::Cast(_) => SegmentKind::Cast,
            Self::Property(_) => SegmentKind::Property,
            Self::Navigation(_) => SegmentKind::Navigation,
            Self::NavigationLink(_) => SegmentKind::NavigationLink,
            Self::Function(_) => SegmentKind::Function,
            Self::Action(_) => SegmentKind::Action,
            Self::FunctionImport(_) => SegmentKind::FunctionImport,
            Self::ActionImport(_) => SegmentKind::ActionImport,
            Self::Ref => SegmentKind::Ref,
            Self::Count => SegmentKind::Count,
            Self::Value { .. } => SegmentKind::Value,
            Self::Dynamic(_) => SegmentKind::Dynamic,
            Self::PathTemplate(_) => SegmentKind::PathTemplate,
        }
    }

    /// Type yielded by the segment, when it is known at build time.
    #[must_use]
    pub fn edm_type(&self) -> Option<TypeRef> {
        match self {
            Self::EntitySet(t) => Some(t.edm_type()),
            Self::Singleton(t) => Some(t.edm_type()),
            Self::Key(t) => Some(t.edm_type()),
            Self::Cast(t) => Some(t.edm_type()),
            Self::Property(t) => Some(t.edm_type()),
            Self::Navigation(t) => Some(t.edm_type()),
            Self::NavigationLink(t) => Some(t.edm_type()),
            Self::Function(t) => t.edm_type(),
            Self::Action(t) => t.edm_type(),
            Self::FunctionImport(t) => t.edm_type(),
            Self::ActionImport(t) => t.edm_type(),
            Self::Count => Some(TypeRef::primitive(PrimitiveKind::Int32)),
            Self::Value { ty } => *ty,
            Self::Metadata | Self::Ref | Self::Dynamic(_) | Self::PathTemplate(_) => None,
        }
    }

    /// `true` when the segment yields a single value (or nothing).
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.edm_type().is_none_or(|ty| !ty.collection)
    }

    /// Literal route strings this segment renders to.
    #[must_use]
    pub fn templates(&self, options: &RouteOptions) -> Vec<String> {
        match self {
            Self::Metadata => vec!["$metadata".to_owned()],
            Self::EntitySet(t) => vec![t.name().to_owned()],
            Self::Singleton(t) => vec![t.name().to_owned()],
            Self::Key(t) => t.templates(options),
            Self::Cast(t) => vec![t.type_name().to_owned()],
            Self::Property(t) => vec![t.name().to_owned()],
            Self::Navigation(t) => vec![t.name().to_owned()],
            Self::NavigationLink(t) => vec![format!("{}/$ref", t.name())],
            Self::Function(t) => t.templates(options),
            Self::Action(t) => t.templates(options),
            Self::FunctionImport(t) => t.templates(options),
            Self::ActionImport(t) => vec![t.name().to_owned()],
            Self::Ref => vec!["$ref".to_owned()],
            Self::Count => vec!["$count".to_owned()],
            Self::Value { .. } => vec!["$value".to_owned()],
            Self::Dynamic(t) => vec![t.name().to_owned()],
            Self::PathTemplate(t) => vec![t.template()],
        }
    }

    /// Resolve against the request and append the resolved segment.
    ///
    /// `Ok(false)` means the segment does not fit this request.
    ///
    /// # Errors
    /// Function parameters that match by name but fail conversion, and alias
    /// cycles, are reported as errors.
    pub fn try_translate(&self, ctx: &mut TranslateContext<'_>) -> Result<bool, Error> {
        match self {
            Self::Metadata => {
                ctx.push_segment(ODataPathSegment::Metadata);
                Ok(true)
            }
            Self::EntitySet(t) => Ok(t.translate(ctx)),
            Self::Singleton(t) => Ok(t.translate(ctx)),
            Self::Key(t) => t.translate(ctx),
            Self::Cast(t) => Ok(t.translate(ctx)),
            Self::Property(t) => Ok(t.translate(ctx)),
            Self::Navigation(t) => Ok(t.translate(ctx)),
            Self::NavigationLink(t) => Ok(t.translate(ctx)),
            Self::Function(t) => t.translate(ctx),
            Self::Action(t) => Ok(t.translate(ctx)),
            Self::FunctionImport(t) => t.translate(ctx),
            Self::ActionImport(t) => Ok(t.translate(ctx)),
            Self::Ref => {
                ctx.push_segment(ODataPathSegment::Ref);
                Ok(true)
            }
            Self::Count => {
                ctx.push_segment(ODataPathSegment::Count);
                Ok(true)
            }
            Self::Value { ty } => {
                let ty = ty.or_else(|| ctx.current_type());
                ctx.push_segment(ODataPathSegment::Value { ty });
                Ok(true)
            }
            Self::Dynamic(t) => Ok(t.translate(ctx)),
            Self::PathTemplate(t) => Ok(t.translate(ctx)),
        }
    }
}

macro_rules! impl_from_template {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for SegmentTemplate {
                fn from(t: $ty) -> Self {
                    Self::$variant(t)
                }
            }
        )*
    };
}

impl_from_template!(
    EntitySet => EntitySetSegmentTemplate,
    Singleton => SingletonSegmentTemplate,
    Key => KeySegmentTemplate,
    Cast => CastSegmentTemplate,
    Property => PropertySegmentTemplate,
    Navigation => NavigationSegmentTemplate,
    NavigationLink => NavigationLinkSegmentTemplate,
    Function => FunctionSegmentTemplate,
    Action => ActionSegmentTemplate,
    FunctionImport => FunctionImportSegmentTemplate,
    ActionImport => ActionImportSegmentTemplate,
    Dynamic => DynamicSegmentTemplate,
    PathTemplate => PathTemplateSegmentTemplate,
);

/// Single-valued structured type the context currently points at.
fn current_single_structured(ctx: &TranslateContext<'_>) -> Option<StructuredTypeId> {
    ctx.current_type()
        .filter(|ty| !ty.collection)
        .and_then(|ty| ty.as_structured())
}

fn require_entity_type(model: &EdmModel, id: StructuredTypeId) -> Result<(), Error> {
    let ty = model.structured_type(id);
    if ty.is_entity() {
        Ok(())
    } else {
        Err(Error::InvalidTemplate(format!(
            "'{}' is not an entity type",
            ty.full_name()
        )))
    }
}
