use http::Method;

use super::{ActionDescriptor, ConventionContext, ConventionRoute, RoutingConvention, split_cast};
use crate::error::Error;
use crate::segment::{NavigationSegmentTemplate, SegmentTemplate};
use crate::template::PathTemplate;

/// Prefixes in match order; `PostTo` and friends must win over a bare verb.
const PREFIXES: [(&str, Method); 4] = [
    ("PostTo", Method::POST),
    ("PutTo", Method::PUT),
    ("PatchTo", Method::PATCH),
    ("Get", Method::GET),
];

/// Navigation property access: `GetOrders(key)` → `Customers({key})/Orders`
/// (plus `$count` for collections), `PostToOrders`, `PutToManager`, `PatchToManager`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NavigationRoutingConvention;

impl RoutingConvention for NavigationRoutingConvention {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn order(&self) -> i32 {
        500
    }

    fn applies_to_controller(&self, ctx: &ConventionContext<'_>) -> bool {
        ctx.source.is_some()
    }

    fn apply(
        &self,
        ctx: &ConventionContext<'_>,
        action: &ActionDescriptor,
    ) -> Result<Vec<ConventionRoute>, Error> {
        let Some((method, rest)) = PREFIXES.iter().find_map(|(prefix, method)| {
            action
                .name
                .strip_prefix(prefix)
                .map(|rest| (method.clone(), rest))
        }) else {
            return Ok(Vec::new());
        };
        let (navigation_name, cast) = split_cast(rest);
        if navigation_name.is_empty() {
            return Ok(Vec::new());
        }
        let (Some(path), Some(entity_type)) = (ctx.single_entity_path(action)?, ctx.entity_type())
        else {
            return Ok(Vec::new());
        };
        let Some((mut segments, owner)) = ctx.with_cast(path, entity_type, cast, false)? else {
            return Ok(Vec::new());
        };
        let Some(navigation) = ctx.model.find_navigation_property(owner, navigation_name) else {
            return Ok(Vec::new());
        };
        let collection = navigation.collection;
        let allowed = if method == Method::POST {
            collection
        } else if method == Method::PUT || method == Method::PATCH {
            !collection
        } else {
            true
        };
        if !allowed {
            return Ok(Vec::new());
        }

        segments.push(NavigationSegmentTemplate::new(ctx.model, owner, navigation_name)?.into());
        let mut routes = Vec::with_capacity(2);
        if method == Method::GET && collection {
            let mut count = segments.clone();
            count.push(SegmentTemplate::Count);
            routes.push(ConventionRoute::new(Method::GET, PathTemplate::new(segments)));
            routes.push(ConventionRoute::new(Method::GET, PathTemplate::new(count)));
        } else {
            routes.push(ConventionRoute::new(method, PathTemplate::new(segments)));
        }
        Ok(routes)
    }
}
