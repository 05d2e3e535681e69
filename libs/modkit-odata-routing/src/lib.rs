#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! OData path template matching and translation for ModKit.
//!
//! - [`segment`] / [`PathTemplate`]: typed path shapes bound to an
//!   [`EdmModel`](modkit_edm::EdmModel), rendered into literal route strings
//! - [`ODataTemplateTranslator`]: resolves a matched template against the
//!   request's route values into an [`ODataPath`]
//! - [`ConventionSet`]: builds endpoint templates from controller actions
//! - [`RouteOptions`] / [`RoutingConfig`]: rendering switches, loadable with `figment`
//! - [`problem`]: RFC 9457 mapping of [`Error`]

pub mod conventions;
pub mod context;
pub mod error;
pub mod expansion;
pub mod options;
pub mod path;
pub mod problem;
pub mod segment;
pub mod template;
pub mod translator;

pub use conventions::{
    ActionDescriptor, ControllerDescriptor, ConventionContext, ConventionRoute, ConventionSet,
    EndpointTemplate, RoutingConvention,
};
pub use context::{RouteValues, TranslateContext, TranslationResult};
pub use error::{ConfigError, Error};
pub use expansion::{MAX_OPTIONAL_PARAMETERS, expand_templates, optional_parameter_combinations};
pub use options::{RouteOptions, RoutingConfig};
pub use path::{ODataParameterValue, ODataPath, ODataPathSegment, OperationParameter};
pub use problem::{Problem, odata_routing_error_to_problem};
pub use segment::{SegmentKind, SegmentTemplate};
pub use template::PathTemplate;
pub use translator::{DefaultODataTemplateTranslator, ODataTemplateTranslator};
