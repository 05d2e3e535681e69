use http::Method;

use super::{
    ActionDescriptor, ConventionContext, ConventionRoute, RoutingConvention, split_cast,
    split_verb,
};
use crate::error::Error;
use crate::template::PathTemplate;

/// `Get` / `Put` / `Patch` on a singleton controller, optionally `...From{DerivedType}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingletonRoutingConvention;

impl RoutingConvention for SingletonRoutingConvention {
    fn name(&self) -> &'static str {
        "singleton"
    }

    fn order(&self) -> i32 {
        200
    }

    fn applies_to_controller(&self, ctx: &ConventionContext<'_>) -> bool {
        ctx.singleton().is_some()
    }

    fn apply(
        &self,
        ctx: &ConventionContext<'_>,
        action: &ActionDescriptor,
    ) -> Result<Vec<ConventionRoute>, Error> {
        let (Some(singleton), Some(entity_type)) = (ctx.source_segment(), ctx.entity_type())
        else {
            return Ok(Vec::new());
        };
        let Some((method, rest)) =
            split_verb(&action.name, &[Method::GET, Method::PUT, Method::PATCH])
        else {
            return Ok(Vec::new());
        };
        let (target, cast) = split_cast(rest);
        if !(target.is_empty() || target == ctx.controller.entity_name()) {
            return Ok(Vec::new());
        }
        Ok(ctx
            .with_cast(vec![singleton], entity_type, cast, false)?
            .map(|(segments, _)| vec![ConventionRoute::new(method, PathTemplate::new(segments))])
            .unwrap_or_default())
    }
}
