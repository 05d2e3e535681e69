use http::Method;
use modkit_edm::TypeKind;

use super::{
    ActionDescriptor, ConventionContext, ConventionRoute, RoutingConvention, split_cast,
    split_verb,
};
use crate::error::Error;
use crate::segment::{PropertySegmentTemplate, SegmentTemplate};
use crate::template::PathTemplate;

/// Structural property access: `GetName(key)` → `Customers({key})/Name` and
/// `.../Name/$value`; collection properties also get `$count` and `Post`.
///
/// `GetLevelFromVipCustomer` reads a property declared on a derived type.
#[derive(Clone, Copy, Debug, Default)]
pub struct PropertyRoutingConvention;

impl RoutingConvention for PropertyRoutingConvention {
    fn name(&self) -> &'static str {
        "property"
    }

    fn order(&self) -> i32 {
        400
    }

    fn applies_to_controller(&self, ctx: &ConventionContext<'_>) -> bool {
        ctx.source.is_some()
    }

    fn apply(
        &self,
        ctx: &ConventionContext<'_>,
        action: &ActionDescriptor,
    ) -> Result<Vec<ConventionRoute>, Error> {
        let Some((method, rest)) = split_verb(
            &action.name,
            &[
                Method::GET,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::POST,
            ],
        ) else {
            return Ok(Vec::new());
        };
        let (property_name, cast) = split_cast(rest);
        if property_name.is_empty() {
            return Ok(Vec::new());
        }
        let (Some(path), Some(entity_type)) = (ctx.single_entity_path(action)?, ctx.entity_type())
        else {
            return Ok(Vec::new());
        };
        let Some((mut segments, owner)) = ctx.with_cast(path, entity_type, cast, false)? else {
            return Ok(Vec::new());
        };
        let Some(property) = ctx.model.find_property(owner, property_name) else {
            return Ok(Vec::new());
        };
        let ty = property.ty;
        if method == Method::POST && !ty.collection {
            return Ok(Vec::new());
        }

        segments.push(PropertySegmentTemplate::new(ctx.model, owner, property_name)?.into());
        let mut routes = Vec::new();
        if method == Method::GET {
            let suffix = if ty.collection {
                Some(SegmentTemplate::Count)
            } else if matches!(ty.kind, TypeKind::Primitive(_) | TypeKind::Enum(_)) {
                Some(SegmentTemplate::Value { ty: Some(ty) })
            } else {
                None
            };
            if let Some(suffix) = suffix {
                let mut extended = segments.clone();
                extended.push(suffix);
                routes.push(ConventionRoute::new(Method::GET, PathTemplate::new(extended)));
            }
        }
        routes.insert(0, ConventionRoute::new(method, PathTemplate::new(segments)));
        Ok(routes)
    }
}
