use std::cmp::Reverse;

use http::Method;
use modkit_edm::{EdmModel, OperationId, OperationKind, TypeRef};

use super::{ActionDescriptor, ConventionContext, ConventionRoute, RoutingConvention};
use crate::error::Error;
use crate::segment::{ActionSegmentTemplate, FunctionSegmentTemplate, SegmentTemplate};
use crate::template::PathTemplate;

/// Bound functions and actions named like the controller action.
///
/// `GetTopOrders(key, count)` on `CustomersController` routes to
/// `Customers({key})/NS.GetTopOrders(count={count})`; without a key parameter
/// the operation must be bound to the collection. Function overloads are
/// resolved in three passes: candidate discovery by name and binding type,
/// parameter matching against the action's parameter names, then selection
/// (see [`select_overload`]). Ambiguous overloads produce no route.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperationRoutingConvention;

impl RoutingConvention for OperationRoutingConvention {
    fn name(&self) -> &'static str {
        "operation"
    }

    fn order(&self) -> i32 {
        600
    }

    fn applies_to_controller(&self, ctx: &ConventionContext<'_>) -> bool {
        ctx.source.is_some()
    }

    fn apply(
        &self,
        ctx: &ConventionContext<'_>,
        action: &ActionDescriptor,
    ) -> Result<Vec<ConventionRoute>, Error> {
        let Some(entity_type) = ctx.entity_type() else {
            return Ok(Vec::new());
        };
        let (path, binding) = match ctx.single_entity_path(action)? {
            Some(path) => (path, TypeRef::structured(entity_type)),
            None => match (ctx.entity_set(), ctx.source_segment()) {
                (Some(_), Some(set)) => (
                    vec![set],
                    TypeRef::structured(entity_type).with_collection(true),
                ),
                _ => return Ok(Vec::new()),
            },
        };

        let candidates = ctx.model.find_bound_operations(&action.name, binding);
        let (functions, actions): (Vec<OperationId>, Vec<OperationId>) = candidates
            .into_iter()
            .partition(|&id| ctx.model.operation(id).kind == OperationKind::Function);

        let (method, segment): (Method, SegmentTemplate) = if !functions.is_empty() {
            let Some(selected) = select_overload(ctx.model, &functions, action) else {
                return Ok(Vec::new());
            };
            (
                Method::GET,
                FunctionSegmentTemplate::new(ctx.model, selected)?.into(),
            )
        } else if !actions.is_empty() {
            let Some(selected) = select_overload(ctx.model, &actions, action) else {
                return Ok(Vec::new());
            };
            (
                Method::POST,
                ActionSegmentTemplate::new(ctx.model, selected)?.into(),
            )
        } else {
            return Ok(Vec::new());
        };

        let mut segments = path;
        segments.push(segment);
        Ok(vec![ConventionRoute::new(method, PathTemplate::new(segments))])
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    id: OperationId,
    binding_depth: usize,
    unmatched_optional: usize,
    matched: usize,
}

impl Candidate {
    fn rank(&self) -> (usize, Reverse<usize>, usize) {
        (self.binding_depth, Reverse(self.unmatched_optional), self.matched)
    }
}

/// Parameter matching and selection over discovered candidates.
///
/// A function matches when the action declares all its required parameters.
/// The winner has the most derived binding type, then the fewest unmatched
/// optional parameters, then the most matched ones. Action parameters travel
/// in the request body, so actions are never filtered by parameter names.
pub(super) fn select_overload(
    model: &EdmModel,
    candidates: &[OperationId],
    action: &ActionDescriptor,
) -> Option<OperationId> {
    let viable: Vec<Candidate> = candidates
        .iter()
        .filter_map(|&id| {
            let op = model.operation(id);
            let params = op.url_parameters();
            let is_function = op.kind == OperationKind::Function;
            if is_function
                && params
                    .iter()
                    .any(|p| !p.optional && !action.has_parameter(&p.name))
            {
                return None;
            }
            let (matched, unmatched_optional) = if is_function {
                let matched = params.iter().filter(|p| action.has_parameter(&p.name)).count();
                (matched, params.len() - matched)
            } else {
                (0, 0)
            };
            let binding_depth = op
                .binding_parameter()
                .and_then(|p| p.ty.as_structured())
                .map_or(0, |t| model.ancestors(t).count());
            Some(Candidate {
                id,
                binding_depth,
                unmatched_optional,
                matched,
            })
        })
        .collect();

    let top = viable.iter().map(Candidate::rank).max()?;
    let mut best = viable.iter().filter(|c| c.rank() == top);

    let selected = best.next()?;
    if best.next().is_some() {
        tracing::debug!(
            action = %action.name,
            candidates = viable.len(),
            "Ambiguous operation overloads, no route generated"
        );
        return None;
    }
    Some(selected.id)
}
