use http::Method;
use modkit_edm::StructuredTypeId;

use super::{ActionDescriptor, ConventionContext, ConventionRoute, RoutingConvention};
use crate::error::Error;
use crate::segment::{
    CatchAllRole, KeySegmentTemplate, NavigationLinkSegmentTemplate, PathTemplateSegmentTemplate,
    SegmentTemplate,
};
use crate::template::PathTemplate;

const NAVIGATION_PROPERTY_PARAMETER: &str = "navigationProperty";
const RELATED_KEY_PARAMETER: &str = "relatedKey";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RefAction {
    Create,
    Get,
    Delete,
}

impl RefAction {
    fn parse(name: &str) -> Option<(Self, Option<&str>)> {
        let (action, rest) = [
            ("CreateRef", Self::Create),
            ("GetRef", Self::Get),
            ("DeleteRef", Self::Delete),
        ]
        .into_iter()
        .find_map(|(prefix, action)| name.strip_prefix(prefix).map(|rest| (action, rest)))?;
        match rest {
            "" => Some((action, None)),
            _ => rest
                .strip_prefix("To")
                .filter(|nav| !nav.is_empty())
                .map(|nav| (action, Some(nav))),
        }
    }
}

/// Entity reference actions: `CreateRef`, `GetRef`, `DeleteRef` taking `key`
/// and `navigationProperty` route to `Customers({key})/{navigationProperty}/$ref`.
/// `CreateRefToOrders` style names target one navigation property, and
/// `DeleteRef` with a `relatedKey` parameter also routes
/// `Customers({key})/Orders({relatedKey})/$ref`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RefRoutingConvention;

impl RoutingConvention for RefRoutingConvention {
    fn name(&self) -> &'static str {
        "ref"
    }

    fn order(&self) -> i32 {
        800
    }

    fn applies_to_controller(&self, ctx: &ConventionContext<'_>) -> bool {
        ctx.source.is_some()
    }

    fn apply(
        &self,
        ctx: &ConventionContext<'_>,
        action: &ActionDescriptor,
    ) -> Result<Vec<ConventionRoute>, Error> {
        let Some((kind, navigation)) = RefAction::parse(&action.name) else {
            return Ok(Vec::new());
        };
        let (Some(path), Some(entity_type)) = (ctx.single_entity_path(action)?, ctx.entity_type())
        else {
            return Ok(Vec::new());
        };
        match navigation {
            Some(name) => named_routes(ctx, action, kind, path, entity_type, name),
            None => catch_all_routes(ctx, action, kind, path, entity_type),
        }
    }
}

fn named_routes(
    ctx: &ConventionContext<'_>,
    action: &ActionDescriptor,
    kind: RefAction,
    path: Vec<SegmentTemplate>,
    entity_type: StructuredTypeId,
    name: &str,
) -> Result<Vec<ConventionRoute>, Error> {
    let Some(navigation) = ctx.model.find_navigation_property(entity_type, name) else {
        return Ok(Vec::new());
    };
    let (collection, target) = (navigation.collection, navigation.target);
    let mut segments = path;
    segments.push(NavigationLinkSegmentTemplate::new(ctx.model, entity_type, name)?.into());

    let mut routes = Vec::with_capacity(2);
    match kind {
        RefAction::Create => {
            let method = if collection { Method::POST } else { Method::PUT };
            routes.push(ConventionRoute::new(method, PathTemplate::new(segments)));
        }
        RefAction::Get => routes.push(ConventionRoute::new(Method::GET, PathTemplate::new(segments))),
        RefAction::Delete => {
            if collection && action.has_parameter(RELATED_KEY_PARAMETER) {
                let mut keyed = segments.clone();
                keyed.push(KeySegmentTemplate::related(ctx.model, target)?.into());
                routes.push(ConventionRoute::new(Method::DELETE, PathTemplate::new(keyed)));
            }
            routes.push(ConventionRoute::new(Method::DELETE, PathTemplate::new(segments)));
        }
    }
    Ok(routes)
}

fn catch_all_routes(
    ctx: &ConventionContext<'_>,
    action: &ActionDescriptor,
    kind: RefAction,
    path: Vec<SegmentTemplate>,
    entity_type: StructuredTypeId,
) -> Result<Vec<ConventionRoute>, Error> {
    if !action.has_parameter(NAVIGATION_PROPERTY_PARAMETER) {
        return Ok(Vec::new());
    }
    let mut segments = path.clone();
    segments.push(
        PathTemplateSegmentTemplate::new(NAVIGATION_PROPERTY_PARAMETER, CatchAllRole::NavigationLink)
            .into(),
    );
    let template = PathTemplate::new(segments);

    let mut routes = Vec::new();
    match kind {
        RefAction::Create => {
            routes.push(ConventionRoute::new(Method::POST, template.clone()));
            routes.push(ConventionRoute::new(Method::PUT, template));
        }
        RefAction::Get => routes.push(ConventionRoute::new(Method::GET, template)),
        RefAction::Delete => {
            routes.push(ConventionRoute::new(Method::DELETE, template));
            if action.has_parameter(RELATED_KEY_PARAMETER) {
                // The related key type depends on the navigation property, so
                // spell out every collection-valued one.
                for t in ctx.model.ancestors(entity_type) {
                    for navigation in &ctx.model.structured_type(t).navigation_properties {
                        if !navigation.collection {
                            continue;
                        }
                        let mut keyed = path.clone();
                        keyed.push(
                            NavigationLinkSegmentTemplate::new(
                                ctx.model,
                                entity_type,
                                &navigation.name,
                            )?
                            .into(),
                        );
                        keyed.push(KeySegmentTemplate::related(ctx.model, navigation.target)?.into());
                        routes.push(ConventionRoute::new(Method::DELETE, PathTemplate::new(keyed)));
                    }
                }
            }
        }
    }
    Ok(routes)
}
