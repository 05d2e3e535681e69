use http::Method;
use modkit_edm::OperationKind;

use super::operation::select_overload;
use super::{ActionDescriptor, ConventionContext, ConventionRoute, RoutingConvention};
use crate::error::Error;
use crate::segment::{ActionImportSegmentTemplate, FunctionImportSegmentTemplate};
use crate::template::PathTemplate;

const OPERATION_IMPORT_CONTROLLER: &str = "ODataOperationImport";

/// Actions of the `ODataOperationImportController` named after an import.
///
/// Function imports select an overload the same way bound functions do.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperationImportRoutingConvention;

impl RoutingConvention for OperationImportRoutingConvention {
    fn name(&self) -> &'static str {
        "operation_import"
    }

    fn order(&self) -> i32 {
        700
    }

    fn applies_to_controller(&self, ctx: &ConventionContext<'_>) -> bool {
        ctx.controller.entity_name() == OPERATION_IMPORT_CONTROLLER
    }

    fn apply(
        &self,
        ctx: &ConventionContext<'_>,
        action: &ActionDescriptor,
    ) -> Result<Vec<ConventionRoute>, Error> {
        let Some(import_id) = ctx.model.find_operation_import(&action.name) else {
            return Ok(Vec::new());
        };
        let import = ctx.model.operation_import(import_id);
        let route = match import.kind {
            OperationKind::Function => {
                let Some(selected) = select_overload(ctx.model, &import.operations, action) else {
                    return Ok(Vec::new());
                };
                let segment = FunctionImportSegmentTemplate::new(ctx.model, import_id, selected)?;
                ConventionRoute::new(Method::GET, PathTemplate::new(vec![segment.into()]))
            }
            OperationKind::Action => {
                let segment = ActionImportSegmentTemplate::new(ctx.model, import_id)?;
                ConventionRoute::new(Method::POST, PathTemplate::new(vec![segment.into()]))
            }
        };
        Ok(vec![route])
    }
}
