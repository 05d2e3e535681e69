use http::Method;
use modkit_edm::{EdmModel, OperationDef, SchemaDef, StructuredTypeDef, TypeRef};

use super::*;
use crate::options::RouteOptions;
use crate::segment::SegmentTemplate;
use crate::template::PathTemplate;

fn model() -> EdmModel {
    EdmModel::from_schema(
        SchemaDef::new("NS")
            .complex_type(StructuredTypeDef::new("Address").property("City", "Edm.String"))
            .entity_type(
                StructuredTypeDef::new("Customer")
                    .key("Id", "Edm.Int32")
                    .property("Name", "Edm.String")
                    .property("Emails", "Collection(Edm.String)")
                    .property("Address", "NS.Address")
                    .navigation("Orders", "Collection(NS.Order)")
                    .navigation("BestFriend", "NS.Customer"),
            )
            .entity_type(
                StructuredTypeDef::new("VipCustomer")
                    .base("NS.Customer")
                    .property("Level", "Edm.Int32"),
            )
            .entity_type(
                StructuredTypeDef::new("Order")
                    .key("Id", "Edm.Int32")
                    .property("Total", "Edm.Decimal")
                    .navigation("Lines", "Collection(NS.Line)"),
            )
            .entity_type(StructuredTypeDef::new("Line").key("Id", "Edm.Int32"))
            .entity_set("Customers", "NS.Customer")
            .entity_set("VipCustomers", "NS.VipCustomer")
            .entity_set("Orders", "NS.Order")
            .singleton("Me", "NS.Customer")
            .function(
                OperationDef::new("GetTopOrders")
                    .bound_to("NS.Customer")
                    .parameter("count", "Edm.Int32")
                    .returns("Collection(NS.Order)"),
            )
            .function(
                OperationDef::new("GetTopOrders")
                    .bound_to("NS.Customer")
                    .parameter("count", "Edm.Int32")
                    .optional_parameter("minTotal", "Edm.Decimal")
                    .returns("Collection(NS.Order)"),
            )
            .function(
                OperationDef::new("MostRecent")
                    .bound_to("Collection(NS.Customer)")
                    .returns("NS.Customer"),
            )
            .function(
                OperationDef::new("Rank")
                    .bound_to("NS.Customer")
                    .returns("Edm.Int32"),
            )
            .function(
                OperationDef::new("Rank")
                    .bound_to("NS.VipCustomer")
                    .returns("Edm.Int32"),
            )
            .action(
                OperationDef::new("Rate")
                    .bound_to("NS.Customer")
                    .parameter("rating", "Edm.Int32"),
            )
            .function(
                OperationDef::new("Nearest")
                    .parameter("lat", "Edm.Double")
                    .parameter("lon", "Edm.Double")
                    .returns("NS.Customer"),
            )
            .function_import("Nearest", "NS.Nearest")
            .action(OperationDef::new("Reset"))
            .action_import("Reset", "NS.Reset"),
    )
    .unwrap()
}

fn action(name: &str, parameters: &[&str]) -> ActionDescriptor {
    parameters
        .iter()
        .fold(ActionDescriptor::new(name), |a, p| a.parameter(*p))
}

fn endpoints(model: &EdmModel, controller: ControllerDescriptor) -> Vec<EndpointTemplate> {
    ConventionSet::builtin()
        .build_endpoints(model, &[controller])
        .unwrap()
}

/// Routes in canonical form, in generation order.
fn routes(model: &EdmModel, controller: &str, action: ActionDescriptor) -> Vec<(Method, String)> {
    endpoints(model, ControllerDescriptor::new(controller).action(action))
        .into_iter()
        .map(|e| (e.method, e.template.to_string()))
        .collect()
}

fn get(path: &str) -> (Method, String) {
    (Method::GET, path.to_owned())
}

#[test]
fn builtin_conventions_run_in_order() {
    let names: Vec<&str> = ConventionSet::builtin().names().collect();
    assert_eq!(
        names,
        [
            "metadata",
            "entity_set",
            "singleton",
            "entity",
            "property",
            "navigation",
            "operation",
            "operation_import",
            "ref",
        ]
    );
}

#[test]
fn controller_resolves_its_navigation_source() {
    let model = model();
    let customers = ControllerDescriptor::new("CustomersController");
    let ctx = ConventionContext::new(&model, &customers);
    assert_eq!(
        ctx.source,
        model.find_entity_set("Customers").map(NavigationSource::EntitySet)
    );
    assert_eq!(ctx.entity_type_name(), Some("Customer"));

    let me = ControllerDescriptor::new("MeController");
    let ctx = ConventionContext::new(&model, &me);
    assert!(ctx.singleton().is_some());
    assert!(ctx.entity_set().is_none());

    let widgets = ControllerDescriptor::new("WidgetsController");
    assert!(ConventionContext::new(&model, &widgets).source.is_none());
}

#[test]
fn entity_set_get_adds_count() {
    let model = model();
    for name in ["Get", "GetCustomers", "GetCustomer"] {
        assert_eq!(
            routes(&model, "CustomersController", action(name, &[])),
            [get("Customers"), get("Customers/$count")],
            "{name}"
        );
    }
}

#[test]
fn entity_set_cast_and_post() {
    let model = model();
    assert_eq!(
        routes(&model, "CustomersController", action("GetFromVipCustomer", &[])),
        [
            get("Customers/NS.VipCustomer"),
            get("Customers/NS.VipCustomer/$count"),
        ]
    );
    assert_eq!(
        routes(&model, "CustomersController", action("PostCustomer", &[])),
        [(Method::POST, "Customers".to_owned())]
    );
    assert!(routes(&model, "CustomersController", action("GetFromUnknown", &[])).is_empty());
}

#[test]
fn entity_routes_require_key_parameter() {
    let model = model();
    assert_eq!(
        routes(&model, "CustomersController", action("Get", &["key"])),
        [get("Customers({key})")]
    );
    assert_eq!(
        routes(&model, "CustomersController", action("DeleteCustomer", &["key"])),
        [(Method::DELETE, "Customers({key})".to_owned())]
    );
    assert_eq!(
        routes(
            &model,
            "CustomersController",
            action("PutFromVipCustomer", &["key"])
        ),
        [(Method::PUT, "Customers({key})/NS.VipCustomer".to_owned())]
    );
    assert!(routes(&model, "CustomersController", action("Delete", &[])).is_empty());
}

#[test]
fn property_routes_add_value_or_count() {
    let model = model();
    assert_eq!(
        routes(&model, "CustomersController", action("GetName", &["key"])),
        [get("Customers({key})/Name"), get("Customers({key})/Name/$value")]
    );
    assert_eq!(
        routes(&model, "CustomersController", action("GetEmails", &["key"])),
        [
            get("Customers({key})/Emails"),
            get("Customers({key})/Emails/$count"),
        ]
    );
    assert_eq!(
        routes(&model, "CustomersController", action("GetAddress", &["key"])),
        [get("Customers({key})/Address")]
    );
    assert_eq!(
        routes(&model, "CustomersController", action("PostEmails", &["key"])),
        [(Method::POST, "Customers({key})/Emails".to_owned())]
    );
    assert!(routes(&model, "CustomersController", action("PostName", &["key"])).is_empty());
}

#[test]
fn property_on_derived_type_goes_through_cast() {
    let model = model();
    assert_eq!(
        routes(
            &model,
            "CustomersController",
            action("GetLevelFromVipCustomer", &["key"])
        ),
        [
            get("Customers({key})/NS.VipCustomer/Level"),
            get("Customers({key})/NS.VipCustomer/Level/$value"),
        ]
    );
    assert!(routes(&model, "CustomersController", action("GetLevel", &["key"])).is_empty());
}

#[test]
fn navigation_routes_follow_multiplicity() {
    let model = model();
    assert_eq!(
        routes(&model, "CustomersController", action("GetOrders", &["key"])),
        [
            get("Customers({key})/Orders"),
            get("Customers({key})/Orders/$count"),
        ]
    );
    assert_eq!(
        routes(&model, "CustomersController", action("GetBestFriend", &["key"])),
        [get("Customers({key})/BestFriend")]
    );
    assert_eq!(
        routes(&model, "CustomersController", action("PostToOrders", &["key"])),
        [(Method::POST, "Customers({key})/Orders".to_owned())]
    );
    assert_eq!(
        routes(&model, "CustomersController", action("PutToBestFriend", &["key"])),
        [(Method::PUT, "Customers({key})/BestFriend".to_owned())]
    );
    assert!(routes(&model, "CustomersController", action("PutToOrders", &["key"])).is_empty());
    assert!(
        routes(&model, "CustomersController", action("PostToBestFriend", &["key"])).is_empty()
    );
}

#[test]
fn singleton_routes() {
    let model = model();
    assert_eq!(routes(&model, "MeController", action("Get", &[])), [get("Me")]);
    assert_eq!(
        routes(&model, "MeController", action("PatchFromVipCustomer", &[])),
        [(Method::PATCH, "Me/NS.VipCustomer".to_owned())]
    );
    assert_eq!(
        routes(&model, "MeController", action("GetOrders", &[])),
        [get("Me/Orders"), get("Me/Orders/$count")]
    );
    assert!(routes(&model, "MeController", action("Delete", &[])).is_empty());
}

#[test]
fn function_overload_with_fewest_unmatched_optionals_wins() {
    let model = model();
    let found = endpoints(
        &model,
        ControllerDescriptor::new("CustomersController")
            .action(action("GetTopOrders", &["key", "count"])),
    );
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].template.templates(&RouteOptions::canonical()),
        ["Customers({key})/NS.GetTopOrders(count={count})"]
    );

    let found = endpoints(
        &model,
        ControllerDescriptor::new("CustomersController")
            .action(action("GetTopOrders", &["key", "count", "minTotal"])),
    );
    assert_eq!(
        found[0].template.templates(&RouteOptions::canonical()),
        [
            "Customers({key})/NS.GetTopOrders(count={count})",
            "Customers({key})/NS.GetTopOrders(count={count},minTotal={minTotal})",
        ]
    );
}

#[test]
fn function_missing_required_parameter_is_not_routed() {
    let model = model();
    assert!(routes(&model, "CustomersController", action("GetTopOrders", &["key"])).is_empty());
}

#[test]
fn collection_bound_function_without_key() {
    let model = model();
    assert_eq!(
        routes(&model, "CustomersController", action("MostRecent", &[])),
        [get("Customers/NS.MostRecent()")]
    );
    assert!(routes(&model, "CustomersController", action("MostRecent", &["key"])).is_empty());
}

#[test]
fn bound_action_routes_to_post() {
    let model = model();
    assert_eq!(
        routes(&model, "CustomersController", action("Rate", &["key"])),
        [(Method::POST, "Customers({key})/NS.Rate".to_owned())]
    );
}

#[test]
fn most_derived_binding_wins() {
    let model = model();
    let customer = model.find_structured_type("NS.Customer").unwrap();
    let on_base = model.find_bound_operations("Rank", TypeRef::structured(customer));
    assert_eq!(on_base.len(), 1);

    let found = endpoints(
        &model,
        ControllerDescriptor::new("VipCustomersController").action(action("Rank", &["key"])),
    );
    assert_eq!(found.len(), 1);
    let Some(SegmentTemplate::Function(rank)) = found[0].template.segments().last() else {
        panic!("expected a function segment");
    };
    assert_ne!(rank.operation(), on_base[0]);

    let found = endpoints(
        &model,
        ControllerDescriptor::new("CustomersController").action(action("Rank", &["key"])),
    );
    let Some(SegmentTemplate::Function(rank)) = found[0].template.segments().last() else {
        panic!("expected a function segment");
    };
    assert_eq!(rank.operation(), on_base[0]);
}

#[test]
fn operation_imports() {
    let model = model();
    assert_eq!(
        routes(
            &model,
            "ODataOperationImportController",
            action("Nearest", &["lat", "lon"])
        ),
        [get("Nearest(lat={lat},lon={lon})")]
    );
    assert_eq!(
        routes(&model, "ODataOperationImportController", action("Reset", &[])),
        [(Method::POST, "Reset".to_owned())]
    );
    assert!(
        routes(
            &model,
            "ODataOperationImportController",
            action("Nearest", &["lat"])
        )
        .is_empty()
    );
}

#[test]
fn metadata_and_service_document() {
    let model = model();
    assert_eq!(
        routes(&model, "MetadataController", action("GetMetadata", &[])),
        [get("$metadata")]
    );
    assert_eq!(
        routes(&model, "MetadataController", action("GetServiceDocument", &[])),
        [get("")]
    );
}

#[test]
fn catch_all_reference_routes() {
    let model = model();
    assert_eq!(
        routes(
            &model,
            "CustomersController",
            action("CreateRef", &["key", "navigationProperty"])
        ),
        [
            (
                Method::POST,
                "Customers({key})/{navigationProperty}/$ref".to_owned()
            ),
            (
                Method::PUT,
                "Customers({key})/{navigationProperty}/$ref".to_owned()
            ),
        ]
    );
    assert_eq!(
        routes(
            &model,
            "CustomersController",
            action("DeleteRef", &["key", "navigationProperty", "relatedKey"])
        ),
        [
            (
                Method::DELETE,
                "Customers({key})/{navigationProperty}/$ref".to_owned()
            ),
            (
                Method::DELETE,
                "Customers({key})/Orders({relatedKey})/$ref".to_owned()
            ),
        ]
    );
    assert!(routes(&model, "CustomersController", action("GetRef", &["key"])).is_empty());
}

#[test]
fn named_reference_routes() {
    let model = model();
    assert_eq!(
        routes(&model, "CustomersController", action("CreateRefToOrders", &["key"])),
        [(Method::POST, "Customers({key})/Orders/$ref".to_owned())]
    );
    assert_eq!(
        routes(
            &model,
            "CustomersController",
            action("CreateRefToBestFriend", &["key"])
        ),
        [(Method::PUT, "Customers({key})/BestFriend/$ref".to_owned())]
    );
    assert_eq!(
        routes(
            &model,
            "CustomersController",
            action("DeleteRefToOrders", &["key", "relatedKey"])
        ),
        [
            (
                Method::DELETE,
                "Customers({key})/Orders({relatedKey})/$ref".to_owned()
            ),
            (Method::DELETE, "Customers({key})/Orders/$ref".to_owned()),
        ]
    );
    assert!(
        routes(&model, "CustomersController", action("GetRefToMissing", &["key"])).is_empty()
    );
}

#[test]
fn explicit_method_filters_routes() {
    let model = model();
    let create = action("CreateRef", &["key", "navigationProperty"]).method(Method::PUT);
    assert_eq!(
        routes(&model, "CustomersController", create),
        [(
            Method::PUT,
            "Customers({key})/{navigationProperty}/$ref".to_owned()
        )]
    );
}

#[test]
fn unknown_actions_and_controllers_produce_nothing() {
    let model = model();
    assert!(routes(&model, "CustomersController", action("Frobnicate", &["key"])).is_empty());
    assert!(routes(&model, "WidgetsController", action("Get", &[])).is_empty());
}

#[test]
fn every_action_of_a_controller_is_routed() {
    let model = model();
    let controller = ControllerDescriptor::new("CustomersController")
        .action(action("Get", &[]))
        .action(action("Get", &["key"]))
        .action(action("Patch", &["key"]));
    let found = endpoints(&model, controller);
    let summary: Vec<(&str, Method)> = found
        .iter()
        .map(|e| (e.action.as_str(), e.method.clone()))
        .collect();
    assert_eq!(
        summary,
        [
            ("Get", Method::GET),
            ("Get", Method::GET),
            ("Get", Method::GET),
            ("Patch", Method::PATCH),
        ]
    );
    assert!(found.iter().all(|e| e.controller == "CustomersController"));
}

#[test]
fn route_patterns_apply_prefix_and_options() {
    let model = model();
    let found = endpoints(
        &model,
        ControllerDescriptor::new("CustomersController").action(action("Get", &["key"])),
    );
    assert_eq!(
        found[0].route_patterns("/odata/", &RouteOptions::default()),
        ["odata/Customers({key})", "odata/Customers/{key}"]
    );
    assert_eq!(
        found[0].route_patterns("", &RouteOptions::canonical()),
        ["Customers({key})"]
    );

    let root = EndpointTemplate::new(
        "MetadataController",
        "GetServiceDocument",
        Method::GET,
        PathTemplate::default(),
    );
    assert_eq!(root.route_patterns("odata", &RouteOptions::default()), ["odata"]);
}

struct CustomersRoot;

impl RoutingConvention for CustomersRoot {
    fn name(&self) -> &'static str {
        "customers_root"
    }

    fn order(&self) -> i32 {
        50
    }

    fn applies_to_controller(&self, ctx: &ConventionContext<'_>) -> bool {
        ctx.entity_set().is_some()
    }

    fn apply(
        &self,
        ctx: &ConventionContext<'_>,
        action: &ActionDescriptor,
    ) -> Result<Vec<ConventionRoute>, Error> {
        if action.name != "Get" {
            return Ok(Vec::new());
        }
        Ok(ctx
            .source_segment()
            .map(|s| vec![ConventionRoute::new(Method::GET, PathTemplate::new(vec![s]))])
            .unwrap_or_default())
    }
}

#[test]
fn custom_convention_is_ordered_before_builtins() {
    let model = model();
    let set = ConventionSet::builtin().with(Box::new(CustomersRoot));
    assert_eq!(set.names().take(2).collect::<Vec<_>>(), ["metadata", "customers_root"]);

    let found = set
        .build_endpoints(
            &model,
            &[ControllerDescriptor::new("CustomersController").action(action("Get", &[]))],
        )
        .unwrap();
    let paths: Vec<String> = found.iter().map(|e| e.template.to_string()).collect();
    assert_eq!(paths, ["Customers"]);
}
