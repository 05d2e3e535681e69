use http::Method;

use super::{
    ActionDescriptor, ConventionContext, ConventionRoute, RoutingConvention, split_cast,
    split_verb,
};
use crate::error::Error;
use crate::template::PathTemplate;

/// Keyed entity actions: `Get(key)` → `Customers({key})`, also `Put`, `Patch`,
/// `Delete`, with an optional entity type name and `From{DerivedType}` cast.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityRoutingConvention;

impl RoutingConvention for EntityRoutingConvention {
    fn name(&self) -> &'static str {
        "entity"
    }

    fn order(&self) -> i32 {
        300
    }

    fn applies_to_controller(&self, ctx: &ConventionContext<'_>) -> bool {
        ctx.entity_set().is_some()
    }

    fn apply(
        &self,
        ctx: &ConventionContext<'_>,
        action: &ActionDescriptor,
    ) -> Result<Vec<ConventionRoute>, Error> {
        let Some((method, rest)) = split_verb(
            &action.name,
            &[Method::GET, Method::PUT, Method::PATCH, Method::DELETE],
        ) else {
            return Ok(Vec::new());
        };
        let (target, cast) = split_cast(rest);
        if !(target.is_empty() || Some(target) == ctx.entity_type_name()) {
            return Ok(Vec::new());
        }
        let (Some(path), Some(entity_type)) = (ctx.single_entity_path(action)?, ctx.entity_type())
        else {
            return Ok(Vec::new());
        };
        Ok(ctx
            .with_cast(path, entity_type, cast, false)?
            .map(|(segments, _)| vec![ConventionRoute::new(method, PathTemplate::new(segments))])
            .unwrap_or_default())
    }
}
