use http::Method;

use super::{
    ActionDescriptor, ConventionContext, ConventionRoute, RoutingConvention, split_cast,
    split_verb,
};
use crate::error::Error;
use crate::segment::SegmentTemplate;
use crate::template::PathTemplate;

/// Collection-level actions of an entity set controller.
///
/// - `Get` / `GetCustomers` → `Customers`, `Customers/$count`
/// - `GetFromVipCustomer` → `Customers/NS.VipCustomer`, `.../$count`
/// - `Post` / `PostCustomer`, `Patch` → `Customers` (optionally cast)
#[derive(Clone, Copy, Debug, Default)]
pub struct EntitySetRoutingConvention;

impl RoutingConvention for EntitySetRoutingConvention {
    fn name(&self) -> &'static str {
        "entity_set"
    }

    fn order(&self) -> i32 {
        100
    }

    fn applies_to_controller(&self, ctx: &ConventionContext<'_>) -> bool {
        ctx.entity_set().is_some()
    }

    fn apply(
        &self,
        ctx: &ConventionContext<'_>,
        action: &ActionDescriptor,
    ) -> Result<Vec<ConventionRoute>, Error> {
        if ctx.has_key_parameters(action) {
            return Ok(Vec::new());
        }
        let (Some(set), Some(entity_type)) = (ctx.source_segment(), ctx.entity_type()) else {
            return Ok(Vec::new());
        };
        let Some((method, rest)) =
            split_verb(&action.name, &[Method::GET, Method::POST, Method::PATCH])
        else {
            return Ok(Vec::new());
        };
        let (target, cast) = split_cast(rest);
        let type_name = ctx.entity_type_name().unwrap_or_default();
        let set_name = ctx.controller.entity_name();
        if !(target.is_empty() || target == set_name || target == type_name) {
            return Ok(Vec::new());
        }

        let Some((segments, _)) = ctx.with_cast(vec![set], entity_type, cast, true)? else {
            return Ok(Vec::new());
        };
        let mut routes = Vec::with_capacity(2);
        if method == Method::GET {
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
