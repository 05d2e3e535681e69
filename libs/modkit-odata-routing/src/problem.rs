//! Mapping from routing and translation errors to Problem (pure data)
//!
//! The HTTP layer decides how to write the response. Hosts attach the request
//! path and trace id with [`odata_routing_error_to_problem`].

pub use modkit_errors::{ErrDef, Problem};

use crate::error::Error;

/// Error catalog of the routing library.
pub mod catalog {
    use modkit_errors::ErrDef;

    pub const INVALID_PARAMETER_VALUE: ErrDef = ErrDef {
        status: 400,
        title: "Invalid Parameter Value",
        code: "gts.hx.core.errors.err.v1~hx.odata.routing.invalid_parameter_value.v1",
        type_url: "https://errors.hyperspot.com/gts.hx.core.errors.err.v1~hx.odata.routing.invalid_parameter_value.v1",
    };

    pub const ALIAS_CYCLE: ErrDef = ErrDef {
        status: 400,
        title: "Parameter Alias Cycle",
        code: "gts.hx.core.errors.err.v1~hx.odata.routing.alias_cycle.v1",
        type_url: "https://errors.hyperspot.com/gts.hx.core.errors.err.v1~hx.odata.routing.alias_cycle.v1",
    };

    pub const INVALID_TEMPLATE: ErrDef = ErrDef {
        status: 500,
        title: "Invalid Path Template",
        code: "gts.hx.core.errors.err.v1~hx.odata.routing.invalid_template.v1",
        type_url: "https://errors.hyperspot.com/gts.hx.core.errors.err.v1~hx.odata.routing.invalid_template.v1",
    };

    pub const CONFIG: ErrDef = ErrDef {
        status: 500,
        title: "Routing Configuration Error",
        code: "gts.hx.core.errors.err.v1~hx.odata.routing.config.v1",
        type_url: "https://errors.hyperspot.com/gts.hx.core.errors.err.v1~hx.odata.routing.config.v1",
    };
}

impl From<Error> for Problem {
    fn from(err: Error) -> Self {
        match &err {
            Error::InvalidParameterValue { .. } => {
                catalog::INVALID_PARAMETER_VALUE.as_problem(err.to_string())
            }
            Error::AliasCycle(_) => catalog::ALIAS_CYCLE.as_problem(err.to_string()),
            // Detail stays in the logs for server-side errors.
            Error::InvalidTemplate(_) => {
                tracing::error!(error = %err, "Invalid OData path template");
                catalog::INVALID_TEMPLATE.as_problem("The OData route table is misconfigured")
            }
            Error::Config(_) => {
                tracing::error!(error = %err, "Invalid OData routing configuration");
                catalog::CONFIG.as_problem("The OData routing configuration is invalid")
            }
        }
    }
}

/// Map an error to a Problem carrying the request path and trace id.
pub fn odata_routing_error_to_problem(
    err: Error,
    instance: &str,
    trace_id: Option<String>,
) -> Problem {
    modkit_errors::finalize(Problem::from(err), instance, trace_id)
}
