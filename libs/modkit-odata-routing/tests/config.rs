#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Route table generation driven by a figment-loaded configuration.

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use modkit_edm::{EdmModel, OperationDef, SchemaDef, StructuredTypeDef};
use modkit_odata_routing::{
    ActionDescriptor, ControllerDescriptor, ConventionSet, RoutingConfig, expand_templates,
};

fn model() -> EdmModel {
    EdmModel::from_schema(
        SchemaDef::new("NS")
            .entity_type(StructuredTypeDef::new("Customer").key("Id", "Edm.Int32"))
            .entity_set("Customers", "NS.Customer")
            .function(
                OperationDef::new("Ping")
                    .bound_to("NS.Customer")
                    .returns("Edm.Boolean"),
            ),
    )
    .unwrap()
}

fn patterns(config: &RoutingConfig) -> Vec<String> {
    let controllers = [ControllerDescriptor::new("CustomersController")
        .action(ActionDescriptor::new("Get").parameter("key"))
        .action(ActionDescriptor::new("Ping").parameter("key"))];
    ConventionSet::builtin()
        .build_endpoints(&model(), &controllers)
        .unwrap()
        .iter()
        .flat_map(|e| e.route_patterns(config.normalized_prefix(), &config.options))
        .collect()
}

#[test]
fn defaults_render_every_form() {
    assert_eq!(
        patterns(&RoutingConfig::default()),
        [
            "odata/Customers({key})",
            "odata/Customers/{key}",
            "odata/Customers({key})/NS.Ping()",
            "odata/Customers({key})/Ping()",
            "odata/Customers/{key}/NS.Ping()",
            "odata/Customers/{key}/Ping()",
        ]
    );
}

#[test]
fn yaml_file_and_environment_compose() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "config.yaml",
            r"
odata:
  prefix: /api/
  options:
    enable_key_as_segment: false
    enable_non_parenthesis_for_empty_parameter_function: true
",
        )?;
        jail.set_env("APP__ODATA__OPTIONS__ENABLE_UNQUALIFIED_OPERATION_CALL", "false");

        let figment = Figment::new()
            .merge(Yaml::file("config.yaml"))
            .merge(Env::prefixed("APP__").split("__"));
        let config = RoutingConfig::from_figment(&figment, "odata").map_err(|e| e.to_string())?;

        assert_eq!(
            patterns(&config),
            ["api/Customers({key})", "api/Customers({key})/NS.Ping"]
        );
        Ok(())
    });
}

#[test]
fn invalid_environment_override_is_rejected() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("APP__ODATA__OPTIONS__ENABLE_KEY_AS_SEGMENT", "false");
        jail.set_env("APP__ODATA__OPTIONS__ENABLE_KEY_IN_PARENTHESIS", "false");
        let figment = Figment::new().merge(Env::prefixed("APP__").split("__"));
        assert!(RoutingConfig::from_figment(&figment, "odata").is_err());
        Ok(())
    });
}

#[test]
fn expansion_deduplicates_across_templates() {
    let config = RoutingConfig::default();
    let model = model();
    let controllers = [ControllerDescriptor::new("CustomersController")
        .action(ActionDescriptor::new("Get").parameter("key"))
        .action(ActionDescriptor::new("Put").parameter("key"))];
    let templates: Vec<_> = ConventionSet::builtin()
        .build_endpoints(&model, &controllers)
        .unwrap()
        .iter()
        .map(|e| (*e.template).clone())
        .collect();
    assert_eq!(templates.len(), 2);
    assert_eq!(
        expand_templates(&templates, &config.options),
        ["Customers({key})", "Customers/{key}"]
    );
}
