//! Route rendering options and their configuration loading.
//!
//! Options come in pairs that must not both be disabled (key in parenthesis /
//! key as segment, qualified / unqualified operation calls). The invariant is
//! enforced by every setter and by deserialization, so an invalid
//! configuration fails at startup rather than producing an empty route table.

use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const KEY_IN_PARENTHESIS: &str = "enable_key_in_parenthesis";
const KEY_AS_SEGMENT: &str = "enable_key_as_segment";
const QUALIFIED_CALL: &str = "enable_qualified_operation_call";
const UNQUALIFIED_CALL: &str = "enable_unqualified_operation_call";

/// How templates render keys and operation calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRouteOptions")]
#[allow(clippy::struct_excessive_bools)]
pub struct RouteOptions {
    enable_key_in_parenthesis: bool,
    enable_key_as_segment: bool,
    enable_qualified_operation_call: bool,
    enable_unqualified_operation_call: bool,
    enable_non_parenthesis_for_empty_parameter_function: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            enable_key_in_parenthesis: true,
            enable_key_as_segment: true,
            enable_qualified_operation_call: true,
            enable_unqualified_operation_call: true,
            enable_non_parenthesis_for_empty_parameter_function: false,
        }
    }
}

impl RouteOptions {
    /// Parenthesis keys and qualified calls only; used for diagnostics.
    #[must_use]
    pub const fn canonical() -> Self {
        Self {
            enable_key_in_parenthesis: true,
            enable_key_as_segment: false,
            enable_qualified_operation_call: true,
            enable_unqualified_operation_call: false,
            enable_non_parenthesis_for_empty_parameter_function: false,
        }
    }

    #[must_use]
    pub fn key_in_parenthesis(&self) -> bool {
        self.enable_key_in_parenthesis
    }

    #[must_use]
    pub fn key_as_segment(&self) -> bool {
        self.enable_key_as_segment
    }

    #[must_use]
    pub fn qualified_operation_call(&self) -> bool {
        self.enable_qualified_operation_call
    }

    #[must_use]
    pub fn unqualified_operation_call(&self) -> bool {
        self.enable_unqualified_operation_call
    }

    #[must_use]
    pub fn non_parenthesis_for_empty_parameter_function(&self) -> bool {
        self.enable_non_parenthesis_for_empty_parameter_function
    }

    /// # Errors
    /// Returns `ConfigError::BothDisabled` when disabling while key-as-segment is off.
    pub fn set_key_in_parenthesis(&mut self, enabled: bool) -> Result<(), ConfigError> {
        ensure_pair(enabled, self.enable_key_as_segment, KEY_IN_PARENTHESIS, KEY_AS_SEGMENT)?;
        self.enable_key_in_parenthesis = enabled;
        Ok(())
    }

    /// # Errors
    /// Returns `ConfigError::BothDisabled` when disabling while key-in-parenthesis is off.
    pub fn set_key_as_segment(&mut self, enabled: bool) -> Result<(), ConfigError> {
        ensure_pair(enabled, self.enable_key_in_parenthesis, KEY_AS_SEGMENT, KEY_IN_PARENTHESIS)?;
        self.enable_key_as_segment = enabled;
        Ok(())
    }

    /// # Errors
    /// Returns `ConfigError::BothDisabled` when disabling while unqualified calls are off.
    pub fn set_qualified_operation_call(&mut self, enabled: bool) -> Result<(), ConfigError> {
        ensure_pair(
            enabled,
            self.enable_unqualified_operation_call,
            QUALIFIED_CALL,
            UNQUALIFIED_CALL,
        )?;
        self.enable_qualified_operation_call = enabled;
        Ok(())
    }

    /// # Errors
    /// Returns `ConfigError::BothDisabled` when disabling while qualified calls are off.
    pub fn set_unqualified_operation_call(&mut self, enabled: bool) -> Result<(), ConfigError> {
        ensure_pair(
            enabled,
            self.enable_qualified_operation_call,
            UNQUALIFIED_CALL,
            QUALIFIED_CALL,
        )?;
        self.enable_unqualified_operation_call = enabled;
        Ok(())
    }

    pub fn set_non_parenthesis_for_empty_parameter_function(&mut self, enabled: bool) {
        self.enable_non_parenthesis_for_empty_parameter_function = enabled;
    }

    /// Builder form of [`RouteOptions::set_key_in_parenthesis`].
    ///
    /// # Errors
    /// See the setter.
    pub fn with_key_in_parenthesis(mut self, enabled: bool) -> Result<Self, ConfigError> {
        self.set_key_in_parenthesis(enabled)?;
        Ok(self)
    }

    /// # Errors
    /// See [`RouteOptions::set_key_as_segment`].
    pub fn with_key_as_segment(mut self, enabled: bool) -> Result<Self, ConfigError> {
        self.set_key_as_segment(enabled)?;
        Ok(self)
    }

    /// # Errors
    /// See [`RouteOptions::set_qualified_operation_call`].
    pub fn with_qualified_operation_call(mut self, enabled: bool) -> Result<Self, ConfigError> {
        self.set_qualified_operation_call(enabled)?;
        Ok(self)
    }

    /// # Errors
    /// See [`RouteOptions::set_unqualified_operation_call`].
    pub fn with_unqualified_operation_call(mut self, enabled: bool) -> Result<Self, ConfigError> {
        self.set_unqualified_operation_call(enabled)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_non_parenthesis_for_empty_parameter_function(mut self, enabled: bool) -> Self {
        self.enable_non_parenthesis_for_empty_parameter_function = enabled;
        self
    }
}

fn ensure_pair(
    enabled: bool,
    other_enabled: bool,
    name: &'static str,
    other: &'static str,
) -> Result<(), ConfigError> {
    if enabled || other_enabled {
        Ok(())
    } else {
        Err(ConfigError::BothDisabled {
            first: name,
            second: other,
        })
    }
}

/// Wire shape of [`RouteOptions`]; every field is optional in configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
struct RawRouteOptions {
    enable_key_in_parenthesis: bool,
    enable_key_as_segment: bool,
    enable_qualified_operation_call: bool,
    enable_unqualified_operation_call: bool,
    enable_non_parenthesis_for_empty_parameter_function: bool,
}

impl Default for RawRouteOptions {
    fn default() -> Self {
        let d = RouteOptions::default();
        Self {
            enable_key_in_parenthesis: d.enable_key_in_parenthesis,
            enable_key_as_segment: d.enable_key_as_segment,
            enable_qualified_operation_call: d.enable_qualified_operation_call,
            enable_unqualified_operation_call: d.enable_unqualified_operation_call,
            enable_non_parenthesis_for_empty_parameter_function: d
                .enable_non_parenthesis_for_empty_parameter_function,
        }
    }
}

impl TryFrom<RawRouteOptions> for RouteOptions {
    type Error = ConfigError;

    fn try_from(raw: RawRouteOptions) -> Result<Self, Self::Error> {
        ensure_pair(
            raw.enable_key_in_parenthesis,
            raw.enable_key_as_segment,
            KEY_IN_PARENTHESIS,
            KEY_AS_SEGMENT,
        )?;
        ensure_pair(
            raw.enable_qualified_operation_call,
            raw.enable_unqualified_operation_call,
            QUALIFIED_CALL,
            UNQUALIFIED_CALL,
        )?;
        Ok(Self {
            enable_key_in_parenthesis: raw.enable_key_in_parenthesis,
            enable_key_as_segment: raw.enable_key_as_segment,
            enable_qualified_operation_call: raw.enable_qualified_operation_call,
            enable_unqualified_operation_call: raw.enable_unqualified_operation_call,
            enable_non_parenthesis_for_empty_parameter_function: raw
                .enable_non_parenthesis_for_empty_parameter_function,
        })
    }
}

/// Routing section of the application configuration.
///
/// ```yaml
/// odata:
///   prefix: odata
///   options:
///     enable_key_as_segment: false
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    /// Route prefix prepended to every generated template (no slashes).
    pub prefix: String,
    pub options: RouteOptions,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            prefix: "odata".to_owned(),
            options: RouteOptions::default(),
        }
    }
}

impl RoutingConfig {
    /// Extract the routing section at `key`, falling back to defaults when absent.
    ///
    /// # Errors
    /// Returns `ConfigError::Load` when the section exists but is malformed or
    /// violates the option pair invariant.
    pub fn from_figment(figment: &Figment, key: &str) -> Result<Self, ConfigError> {
        if !figment.contains(key) {
            tracing::debug!(key, "No OData routing section, using defaults");
            return Ok(Self::default());
        }
        let config: Self = figment
            .extract_inner(key)
            .map_err(|e| ConfigError::Load(Box::new(e)))?;
        tracing::debug!(
            prefix = %config.prefix,
            options = ?config.options,
            "Loaded OData routing configuration"
        );
        Ok(config)
    }

    /// Prefix without surrounding slashes; empty when routes are mounted at the root.
    #[must_use]
    pub fn normalized_prefix(&self) -> &str {
        self.prefix.trim_matches('/')
    }
}
