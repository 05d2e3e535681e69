/// Unified error type for path template construction and translation.
///
/// A route that simply does not fit the request is *not* an error: segment and
/// template translation report it as `Ok(false)` and the translator as
/// `Ok(None)`, so the host can try the next candidate endpoint. The variants
/// below are raised only when continuing would hide a genuine mistake.
///
/// ## HTTP Mapping
///
/// See [`crate::problem`]:
/// - `InvalidParameterValue`, `AliasCycle` → 400
/// - `InvalidTemplate`, `Config` → 500
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A template does not fit the schema it was built against.
    #[error("invalid path template: {0}")]
    InvalidTemplate(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A function parameter literal could not be converted after the function matched.
    #[error(
        "invalid value {literal} for parameter '{parameter}' of '{operation}', expected {expected_type}: {reason}"
    )]
    InvalidParameterValue {
        operation: String,
        parameter: String,
        literal: String,
        expected_type: String,
        reason: String,
    },

    #[error("parameter alias '{0}' references itself")]
    AliasCycle(String),
}

/// Configuration errors, raised while options are set or loaded.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("'{first}' and '{second}' cannot both be disabled")]
    BothDisabled {
        first: &'static str,
        second: &'static str,
    },

    #[error("failed to load routing configuration: {0}")]
    Load(#[source] Box<figment::Error>),
}
