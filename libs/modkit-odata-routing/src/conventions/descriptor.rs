use http::Method;

const CONTROLLER_SUFFIX: &str = "Controller";

/// Host-side controller, reduced to what routing conventions read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerDescriptor {
    pub name: String,
    pub actions: Vec<ActionDescriptor>,
}

impl ControllerDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }

    /// Controller name without the `Controller` suffix: `CustomersController` → `Customers`.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        self.name
            .strip_suffix(CONTROLLER_SUFFIX)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Host-side action: its name, parameter names and optional explicit HTTP method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub name: String,
    pub parameters: Vec<String>,
    pub method: Option<Method>,
}

impl ActionDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            method: None,
        }
    }

    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(name.into());
        self
    }

    /// Restrict generated routes to one HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p == name)
    }
}
