#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Translating concrete request values through path templates.

use std::sync::Arc;

use http::StatusCode;
use modkit_edm::{EdmModel, EdmValue, OperationDef, SchemaDef, StructuredTypeDef, TypeRef};
use modkit_odata_routing::segment::{
    CastSegmentTemplate, FunctionSegmentTemplate, KeySegmentTemplate,
};
use modkit_odata_routing::{
    DefaultODataTemplateTranslator, EndpointTemplate, Error, ODataPathSegment,
    ODataTemplateTranslator, PathTemplate, Problem, RouteOptions, RouteValues, SegmentTemplate,
    TranslateContext,
};

fn model() -> EdmModel {
    EdmModel::from_schema(
        SchemaDef::new("NS")
            .entity_type(
                StructuredTypeDef::new("Customer")
                    .key("Id", "Edm.Int32")
                    .property("Name", "Edm.String")
                    .navigation("Orders", "Collection(NS.Order)"),
            )
            .entity_type(StructuredTypeDef::new("VipCustomer").base("NS.Customer"))
            .entity_type(StructuredTypeDef::new("Order").key("Id", "Edm.Int32"))
            .entity_set("Customers", "NS.Customer")
            .function(
                OperationDef::new("GetTopOrders")
                    .bound_to("NS.Customer")
                    .parameter("count", "Edm.Int32")
                    .returns("Collection(NS.Order)"),
            )
            .function(
                OperationDef::new("Scale")
                    .bound_to("NS.Customer")
                    .parameter("factor", "Edm.Single")
                    .returns("Edm.Single"),
            ),
    )
    .unwrap()
}

fn top_orders(model: &EdmModel, with_cast: bool) -> PathTemplate {
    let customer = model.find_structured_type("NS.Customer").unwrap();
    let vip = model.find_structured_type("NS.VipCustomer").unwrap();
    let function = model.operations_named("GetTopOrders")[0];

    let mut segments = vec![
        SegmentTemplate::entity_set(model, "Customers").unwrap(),
        KeySegmentTemplate::new(model, customer).unwrap().into(),
    ];
    if with_cast {
        segments.push(
            CastSegmentTemplate::new(model, vip, customer, false)
                .unwrap()
                .into(),
        );
    }
    segments.push(FunctionSegmentTemplate::new(model, function).unwrap().into());
    PathTemplate::new(segments)
}

fn translate(
    model: &EdmModel,
    template: &PathTemplate,
    route: &RouteValues,
    query: &RouteValues,
) -> Result<Option<modkit_odata_routing::TranslationResult>, Error> {
    let ctx = TranslateContext::new(model, route).with_query(query);
    DefaultODataTemplateTranslator.translate(template, ctx)
}

#[test]
fn key_cast_and_function_resolve_in_order() {
    let model = model();
    let route = RouteValues::new().with("key", "1").with("count", "5");
    let query = RouteValues::new();

    let result = translate(&model, &top_orders(&model, true), &route, &query)
        .unwrap()
        .expect("template matches");
    let segments = result.path.segments();
    assert_eq!(segments.len(), 4);
    assert!(matches!(&segments[0], ODataPathSegment::EntitySet { name, .. } if name == "Customers"));
    assert!(
        matches!(&segments[1], ODataPathSegment::Key { keys, .. } if keys == &[("Id".to_owned(), EdmValue::Int32(1))])
    );
    assert!(
        matches!(&segments[2], ODataPathSegment::Type { type_name, .. } if type_name == "NS.VipCustomer")
    );
    let ODataPathSegment::Operation { parameters, ty, .. } = &segments[3] else {
        panic!("expected an operation segment");
    };
    assert_eq!(parameters[0].name, "count");
    assert_eq!(parameters[0].value, EdmValue::Int32(5));
    assert!(ty.is_some_and(|t| t.collection));

    assert_eq!(result.route_values["count"], EdmValue::Int32(5));
    assert_eq!(result.route_values["key"], EdmValue::Int32(1));
    assert_eq!(
        result.parameters["count"].ty,
        TypeRef::primitive(modkit_edm::PrimitiveKind::Int32)
    );
    assert_eq!(
        result.path.to_string(),
        "Customers(1)/NS.VipCustomer/NS.GetTopOrders(count=5)"
    );

    let result = translate(&model, &top_orders(&model, false), &route, &query)
        .unwrap()
        .unwrap();
    assert_eq!(result.path.len(), 3);
}

#[test]
fn unconvertible_key_is_no_match() {
    let model = model();
    let route = RouteValues::new().with("key", "abc").with("count", "5");
    let result = translate(&model, &top_orders(&model, true), &route, &RouteValues::new());
    assert!(matches!(result, Ok(None)));
}

#[test]
fn unconvertible_parameter_is_a_client_error() {
    let model = model();
    let route = RouteValues::new().with("key", "1").with("count", "lots");
    let err = translate(&model, &top_orders(&model, false), &route, &RouteValues::new())
        .unwrap_err();
    assert!(matches!(&err, Error::InvalidParameterValue { parameter, .. } if parameter == "count"));

    let problem = Problem::from(err);
    assert_eq!(problem.status, StatusCode::BAD_REQUEST);
    assert!(problem.detail.contains("lots"));
}

#[test]
fn parameter_alias_resolves_through_query() {
    let model = model();
    let route = RouteValues::new().with("key", "1").with("count", "@c");
    let query = RouteValues::new().with("@c", "@top").with("@top", "7");
    let result = translate(&model, &top_orders(&model, false), &route, &query)
        .unwrap()
        .unwrap();
    assert_eq!(result.route_values["count"], EdmValue::Int32(7));
}

#[test]
fn parameter_alias_cycle_is_an_error() {
    let model = model();
    let route = RouteValues::new().with("key", "1").with("count", "@p1");
    let query = RouteValues::new().with("@p1", "@p2").with("@p2", "@p1");
    let err = translate(&model, &top_orders(&model, false), &route, &query).unwrap_err();
    assert!(matches!(err, Error::AliasCycle(alias) if alias == "@p1"));
}

#[test]
fn missing_route_value_is_no_match() {
    let model = model();
    let route = RouteValues::new().with("key", "1");
    let result = translate(&model, &top_orders(&model, false), &route, &RouteValues::new());
    assert!(matches!(result, Ok(None)));
}

#[test]
fn key_value_may_be_percent_encoded_or_named() {
    let model = model();
    let customer = model.find_structured_type("NS.Customer").unwrap();
    let template = PathTemplate::new(vec![
        SegmentTemplate::entity_set(&model, "Customers").unwrap(),
        KeySegmentTemplate::new(&model, customer).unwrap().into(),
    ]);
    for raw in ["42", "Id=42", "Id%3D42"] {
        let route = RouteValues::new().with("key", raw);
        let result = translate(&model, &template, &route, &RouteValues::new())
            .unwrap()
            .unwrap_or_else(|| panic!("{raw} should match"));
        assert_eq!(result.path.to_string(), "Customers(42)");
    }
}

#[test]
fn overflowing_float_parameter_is_a_client_error() {
    let model = model();
    let customer = model.find_structured_type("NS.Customer").unwrap();
    let scale = model.operations_named("Scale")[0];
    let template = PathTemplate::new(vec![
        SegmentTemplate::entity_set(&model, "Customers").unwrap(),
        KeySegmentTemplate::new(&model, customer).unwrap().into(),
        FunctionSegmentTemplate::new(&model, scale).unwrap().into(),
    ]);

    let route = RouteValues::new().with("key", "1").with("factor", "1e300");
    let err = translate(&model, &template, &route, &RouteValues::new()).unwrap_err();
    assert!(matches!(&err, Error::InvalidParameterValue { parameter, .. } if parameter == "factor"));

    let route = RouteValues::new().with("key", "1").with("factor", "INF");
    let result = translate(&model, &template, &route, &RouteValues::new())
        .unwrap()
        .unwrap();
    assert_eq!(result.route_values["factor"], EdmValue::Single(f32::INFINITY));
}

#[test]
fn routing_types_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PathTemplate>();
    assert_send_sync::<EndpointTemplate>();
    assert_send_sync::<RouteOptions>();
    assert_send_sync::<DefaultODataTemplateTranslator>();
}

#[test]
fn one_template_translates_concurrent_requests_independently() {
    let model = model();
    let template = Arc::new(top_orders(&model, false));
    let translator = DefaultODataTemplateTranslator;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (1..=8)
            .map(|i: i32| {
                let template = Arc::clone(&template);
                let model = &model;
                scope.spawn(move || {
                    let route = RouteValues::new()
                        .with("key", i.to_string())
                        .with("count", (i * 10).to_string());
                    let result = translator
                        .translate(&template, TranslateContext::new(model, &route))
                        .unwrap()
                        .unwrap();
                    (i, result)
                })
            })
            .collect();

        for handle in handles {
            let (i, result) = handle.join().unwrap();
            assert_eq!(result.route_values["key"], EdmValue::Int32(i));
            assert_eq!(result.route_values["count"], EdmValue::Int32(i * 10));
            assert_eq!(
                result.path.to_string(),
                format!("Customers({i})/NS.GetTopOrders(count={})", i * 10)
            );
        }
    });
}
