//! Routing conventions: build path templates from the schema and host actions.
//!
//! A [`ConventionSet`] holds an explicit list of conventions sorted once by
//! [`RoutingConvention::order`]. For each action the conventions run in order
//! and the first one that produces routes wins.

mod descriptor;
mod endpoint;
mod entity;
mod entity_set;
mod metadata;
mod navigation;
mod operation;
mod operation_import;
mod property;
mod reference;
mod singleton;

pub use descriptor::{ActionDescriptor, ControllerDescriptor};
pub use endpoint::{ConventionRoute, EndpointTemplate};
pub use entity::EntityRoutingConvention;
pub use entity_set::EntitySetRoutingConvention;
pub use metadata::MetadataRoutingConvention;
pub use navigation::NavigationRoutingConvention;
pub use operation::OperationRoutingConvention;
pub use operation_import::OperationImportRoutingConvention;
pub use property::PropertyRoutingConvention;
pub use reference::RefRoutingConvention;
pub use singleton::SingletonRoutingConvention;

use http::Method;
use modkit_edm::{EdmModel, EntitySetId, SingletonId, StructuredTypeId};

use crate::error::Error;
use crate::segment::{
    CastSegmentTemplate, EntitySetSegmentTemplate, KeySegmentTemplate, SegmentTemplate,
    SingletonSegmentTemplate,
};

/// One rule that turns an action into routes.
pub trait RoutingConvention: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower runs first.
    fn order(&self) -> i32;

    fn applies_to_controller(&self, ctx: &ConventionContext<'_>) -> bool;

    /// Routes for `action`; empty when the convention does not recognize it.
    ///
    /// # Errors
    /// Template construction errors for schema elements the action names.
    fn apply(
        &self,
        ctx: &ConventionContext<'_>,
        action: &ActionDescriptor,
    ) -> Result<Vec<ConventionRoute>, Error>;
}

/// Entity set or singleton a controller is named after.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationSource {
    EntitySet(EntitySetId),
    Singleton(SingletonId),
}

/// What conventions see about the controller being routed.
#[derive(Clone, Copy, Debug)]
pub struct ConventionContext<'a> {
    pub model: &'a EdmModel,
    pub controller: &'a ControllerDescriptor,
    pub source: Option<NavigationSource>,
}

impl<'a> ConventionContext<'a> {
    #[must_use]
    pub fn new(model: &'a EdmModel, controller: &'a ControllerDescriptor) -> Self {
        let name = controller.entity_name();
        let source = model
            .find_entity_set(name)
            .map(NavigationSource::EntitySet)
            .or_else(|| model.find_singleton(name).map(NavigationSource::Singleton));
        Self {
            model,
            controller,
            source,
        }
    }

    #[must_use]
    pub fn entity_set(&self) -> Option<EntitySetId> {
        match self.source {
            Some(NavigationSource::EntitySet(id)) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn singleton(&self) -> Option<SingletonId> {
        match self.source {
            Some(NavigationSource::Singleton(id)) => Some(id),
            _ => None,
        }
    }

    /// Entity type of the navigation source.
    #[must_use]
    pub fn entity_type(&self) -> Option<StructuredTypeId> {
        match self.source? {
            NavigationSource::EntitySet(id) => Some(self.model.entity_set(id).entity_type),
            NavigationSource::Singleton(id) => Some(self.model.singleton(id).entity_type),
        }
    }

    /// Short name of the source's entity type.
    #[must_use]
    pub fn entity_type_name(&self) -> Option<&'a str> {
        let model = self.model;
        self.entity_type()
            .map(|id| model.structured_type(id).name.as_str())
    }

    /// Source segment alone: `Customers` or `Me`.
    #[must_use]
    pub fn source_segment(&self) -> Option<SegmentTemplate> {
        match self.source? {
            NavigationSource::EntitySet(id) => Some(
                EntitySetSegmentTemplate::new(self.model, id).into(),
            ),
            NavigationSource::Singleton(id) => {
                Some(SingletonSegmentTemplate::new(self.model, id).into())
            }
        }
    }

    /// Segments addressing one entity: `Customers({key})` when the action takes
    /// every key variable, `Me` for singletons.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplate` when the entity type has no key.
    pub fn single_entity_path(
        &self,
        action: &ActionDescriptor,
    ) -> Result<Option<Vec<SegmentTemplate>>, Error> {
        match self.source {
            Some(NavigationSource::EntitySet(id)) => {
                let entity_type = self.model.entity_set(id).entity_type;
                let key = KeySegmentTemplate::new(self.model, entity_type)?;
                if !key
                    .mappings()
                    .iter()
                    .all(|m| action.has_parameter(&m.variable))
                {
                    return Ok(None);
                }
                Ok(Some(vec![
                    EntitySetSegmentTemplate::new(self.model, id).into(),
                    key.into(),
                ]))
            }
            Some(NavigationSource::Singleton(id)) => Ok(Some(vec![
                SingletonSegmentTemplate::new(self.model, id).into(),
            ])),
            None => Ok(None),
        }
    }

    /// `true` when the action takes a key of the source's entity.
    #[must_use]
    pub fn has_key_parameters(&self, action: &ActionDescriptor) -> bool {
        self.entity_type()
            .and_then(|et| KeySegmentTemplate::new(self.model, et).ok())
            .is_some_and(|key| {
                key.mappings()
                    .iter()
                    .any(|m| action.has_parameter(&m.variable))
            })
    }

    /// Derived type of `base` by short or qualified name.
    #[must_use]
    pub fn derived_type(&self, base: StructuredTypeId, name: &str) -> Option<StructuredTypeId> {
        self.model.derived_types(base).into_iter().find(|&id| {
            let ty = self.model.structured_type(id);
            ty.name == name || ty.full_name() == name
        })
    }

    /// Append a cast to `cast_name` (a type derived from `base`) when one is named.
    ///
    /// `Ok(None)` when the name does not denote a derived type.
    pub(crate) fn with_cast(
        &self,
        mut segments: Vec<SegmentTemplate>,
        base: StructuredTypeId,
        cast_name: Option<&str>,
        collection: bool,
    ) -> Result<Option<(Vec<SegmentTemplate>, StructuredTypeId)>, Error> {
        let Some(cast_name) = cast_name else {
            return Ok(Some((segments, base)));
        };
        let Some(derived) = self.derived_type(base, cast_name) else {
            return Ok(None);
        };
        segments.push(CastSegmentTemplate::new(self.model, derived, base, collection)?.into());
        Ok(Some((segments, derived)))
    }
}

/// HTTP verbs recognized as action name prefixes.
const VERBS: [(&str, Method); 5] = [
    ("Get", Method::GET),
    ("Post", Method::POST),
    ("Put", Method::PUT),
    ("Patch", Method::PATCH),
    ("Delete", Method::DELETE),
];

/// Split a verb prefix (among `allowed`) off an action name: `GetOrders` → (GET, `Orders`).
fn split_verb<'n>(name: &'n str, allowed: &[Method]) -> Option<(Method, &'n str)> {
    VERBS
        .iter()
        .filter(|(_, method)| allowed.contains(method))
        .find_map(|(verb, method)| name.strip_prefix(verb).map(|rest| (method.clone(), rest)))
}

/// Split an optional `From{Type}` suffix: `NameFromVipCustomer` → (`Name`, `VipCustomer`).
fn split_cast(rest: &str) -> (&str, Option<&str>) {
    match rest.rsplit_once("From") {
        Some((head, cast)) if !cast.is_empty() => (head, Some(cast)),
        _ => (rest, None),
    }
}

/// Ordered list of routing conventions.
pub struct ConventionSet {
    conventions: Vec<Box<dyn RoutingConvention>>,
}

impl ConventionSet {
    /// Sorted once by order; ties keep the given sequence.
    #[must_use]
    pub fn new(mut conventions: Vec<Box<dyn RoutingConvention>>) -> Self {
        conventions.sort_by_key(|c| c.order());
        Self { conventions }
    }

    /// All built-in conventions.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            Box::new(MetadataRoutingConvention),
            Box::new(EntitySetRoutingConvention),
            Box::new(SingletonRoutingConvention),
            Box::new(EntityRoutingConvention),
            Box::new(PropertyRoutingConvention),
            Box::new(NavigationRoutingConvention),
            Box::new(OperationRoutingConvention),
            Box::new(OperationImportRoutingConvention),
            Box::new(RefRoutingConvention),
        ])
    }

    /// Add a convention, keeping the list ordered.
    #[must_use]
    pub fn with(mut self, convention: Box<dyn RoutingConvention>) -> Self {
        self.conventions.push(convention);
        self.conventions.sort_by_key(|c| c.order());
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.conventions.iter().map(|c| c.name())
    }

    /// Route every action of every controller.
    ///
    /// # Errors
    /// Propagates template construction errors from conventions.
    pub fn build_endpoints(
        &self,
        model: &EdmModel,
        controllers: &[ControllerDescriptor],
    ) -> Result<Vec<EndpointTemplate>, Error> {
        let mut endpoints = Vec::new();
        for controller in controllers {
            let ctx = ConventionContext::new(model, controller);
            let applicable: Vec<&dyn RoutingConvention> = self
                .conventions
                .iter()
                .map(Box::as_ref)
                .filter(|c| c.applies_to_controller(&ctx))
                .collect();

            for action in &controller.actions {
                let mut routed = false;
                for convention in &applicable {
                    let mut routes = convention.apply(&ctx, action)?;
                    if let Some(method) = &action.method {
                        routes.retain(|r| &r.method == method);
                    }
                    if routes.is_empty() {
                        continue;
                    }
                    tracing::debug!(
                        controller = %controller.name,
                        action = %action.name,
                        convention = convention.name(),
                        routes = routes.len(),
                        "Action routed by convention"
                    );
                    endpoints.extend(routes.into_iter().map(|r| {
                        EndpointTemplate::new(&controller.name, &action.name, r.method, r.template)
                    }));
                    routed = true;
                    break;
                }
                if !routed {
                    tracing::debug!(
                        controller = %controller.name,
                        action = %action.name,
                        "No routing convention applies to action"
                    );
                }
            }
        }
        Ok(endpoints)
    }
}

impl Default for ConventionSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for ConventionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests;
