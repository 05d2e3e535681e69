//! Template expansion: optional-parameter power sets and route table flattening.

use std::collections::HashSet;

use modkit_edm::Parameter;

use crate::error::Error;
use crate::options::RouteOptions;
use crate::template::PathTemplate;

/// Upper bound on optional parameters per function; each one doubles the route count.
pub const MAX_OPTIONAL_PARAMETERS: usize = 16;

/// Every parameter list a call may use: required parameters always, optional
/// ones in all 2^k combinations. Declaration order is kept within each list.
///
/// # Errors
/// Returns `Error::InvalidTemplate` above [`MAX_OPTIONAL_PARAMETERS`].
pub fn optional_parameter_combinations(
    parameters: &[Parameter],
) -> Result<Vec<Vec<&Parameter>>, Error> {
    let flags: Vec<bool> = parameters.iter().map(|p| p.optional).collect();
    Ok(combination_indices(&flags)?
        .into_iter()
        .map(|combination| combination.into_iter().map(|i| &parameters[i]).collect())
        .collect())
}

/// Index form of [`optional_parameter_combinations`]; `optional[i]` flags parameter `i`.
///
/// Bit `j` of the mask selects the `j`-th optional parameter, so mask `0` is
/// the required-only list and the last mask includes everything.
pub(crate) fn combination_indices(optional: &[bool]) -> Result<Vec<Vec<usize>>, Error> {
    let optional_positions: Vec<usize> = optional
        .iter()
        .enumerate()
        .filter_map(|(i, &opt)| opt.then_some(i))
        .collect();
    let k = optional_positions.len();
    if k > MAX_OPTIONAL_PARAMETERS {
        return Err(Error::InvalidTemplate(format!(
            "{k} optional parameters exceed the limit of {MAX_OPTIONAL_PARAMETERS}"
        )));
    }

    let mut combinations = Vec::with_capacity(1 << k);
    for mask in 0u32..(1u32 << k) {
        let combination = optional
            .iter()
            .enumerate()
            .filter(|&(i, &opt)| {
                !opt || optional_positions
                    .iter()
                    .position(|&p| p == i)
                    .is_some_and(|bit| mask & (1 << bit) != 0)
            })
            .map(|(i, _)| i)
            .collect();
        combinations.push(combination);
    }
    Ok(combinations)
}

/// Flatten path templates into unique route strings, first occurrence wins.
#[must_use]
pub fn expand_templates(templates: &[PathTemplate], options: &RouteOptions) -> Vec<String> {
    let mut seen = HashSet::new();
    templates
        .iter()
        .flat_map(|t| t.templates(options))
        .filter(|literal| seen.insert(literal.clone()))
        .collect()
}
