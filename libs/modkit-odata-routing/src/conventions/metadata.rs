use http::Method;

use super::{ActionDescriptor, ConventionContext, ConventionRoute, RoutingConvention};
use crate::error::Error;
use crate::segment::SegmentTemplate;
use crate::template::PathTemplate;

const METADATA_CONTROLLER: &str = "Metadata";

/// `MetadataController.GetMetadata` → `$metadata`, `GetServiceDocument` → service root.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetadataRoutingConvention;

impl RoutingConvention for MetadataRoutingConvention {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn order(&self) -> i32 {
        0
    }

    fn applies_to_controller(&self, ctx: &ConventionContext<'_>) -> bool {
        ctx.controller.entity_name() == METADATA_CONTROLLER
    }

    fn apply(
        &self,
        _ctx: &ConventionContext<'_>,
        action: &ActionDescriptor,
    ) -> Result<Vec<ConventionRoute>, Error> {
        let template = match action.name.as_str() {
            "GetMetadata" => PathTemplate::new(vec![SegmentTemplate::Metadata]),
            "GetServiceDocument" => PathTemplate::default(),
            _ => return Ok(Vec::new()),
        };
        Ok(vec![ConventionRoute::new(Method::GET, template)])
    }
}
