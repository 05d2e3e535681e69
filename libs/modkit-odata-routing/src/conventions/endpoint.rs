use std::sync::Arc;

use http::Method;

use crate::options::RouteOptions;
use crate::template::PathTemplate;

/// Route produced by a convention for one action.
#[derive(Clone, Debug, PartialEq)]
pub struct ConventionRoute {
    pub method: Method,
    pub template: PathTemplate,
}

impl ConventionRoute {
    #[must_use]
    pub fn new(method: Method, template: PathTemplate) -> Self {
        Self { method, template }
    }
}

/// Endpoint metadata: which action serves which path shape.
///
/// The template is shared with every request that matches the endpoint.
#[derive(Clone, Debug)]
pub struct EndpointTemplate {
    pub controller: String,
    pub action: String,
    pub method: Method,
    pub template: Arc<PathTemplate>,
}

impl EndpointTemplate {
    #[must_use]
    pub fn new(
        controller: impl Into<String>,
        action: impl Into<String>,
        method: Method,
        template: PathTemplate,
    ) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
            method,
            template: Arc::new(template),
        }
    }

    /// Route table entries under `prefix`: `odata/Customers({key})`, ...
    #[must_use]
    pub fn route_patterns(&self, prefix: &str, options: &RouteOptions) -> Vec<String> {
        let prefix = prefix.trim_matches('/');
        self.template
            .templates(options)
            .into_iter()
            .map(|literal| match (prefix.is_empty(), literal.is_empty()) {
                (true, _) => literal,
                (false, true) => prefix.to_owned(),
                (false, false) => format!("{prefix}/{literal}"),
            })
            .collect()
    }
}
