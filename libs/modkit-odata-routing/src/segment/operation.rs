use modkit_edm::{
    EdmModel, Operation, OperationId, OperationImportId, OperationKind, TypeRef, parse_literal,
};

use super::current_single_structured;
use crate::context::TranslateContext;
use crate::error::Error;
use crate::expansion::combination_indices;
use crate::options::RouteOptions;
use crate::path::{ODataPathSegment, OperationParameter};

/// Binds one function parameter to the route variable that carries its value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterMapping {
    pub name: String,
    pub variable: String,
    pub ty: TypeRef,
    pub optional: bool,
}

/// URL parameters of a function plus every optional-parameter combination.
#[derive(Clone, Debug, PartialEq, Eq)]
struct FunctionParameters {
    mappings: Vec<ParameterMapping>,
    combinations: Vec<Vec<usize>>,
}

impl FunctionParameters {
    fn new(operation: &Operation, renames: &[(&str, &str)]) -> Result<Self, Error> {
        let declared = operation.url_parameters();
        if let Some((unknown, _)) = renames
            .iter()
            .find(|(name, _)| !declared.iter().any(|p| p.name == *name))
        {
            return Err(Error::InvalidTemplate(format!(
                "'{}' has no parameter '{unknown}'",
                operation.full_name()
            )));
        }
        let mappings: Vec<ParameterMapping> = declared
            .iter()
            .map(|p| ParameterMapping {
                name: p.name.clone(),
                variable: renames
                    .iter()
                    .find(|(name, _)| *name == p.name)
                    .map_or_else(|| p.name.clone(), |(_, v)| (*v).to_owned()),
                ty: p.ty,
                optional: p.optional,
            })
            .collect();
        let flags: Vec<bool> = mappings.iter().map(|m| m.optional).collect();
        let combinations = combination_indices(&flags)?;
        Ok(Self {
            mappings,
            combinations,
        })
    }

    fn render(&self, name: &str, options: &RouteOptions, out: &mut Vec<String>) {
        for combination in &self.combinations {
            if combination.is_empty() {
                if options.non_parenthesis_for_empty_parameter_function() {
                    out.push(name.to_owned());
                } else {
                    out.push(format!("{name}()"));
                }
                continue;
            }
            let args: Vec<String> = combination
                .iter()
                .map(|&i| {
                    let m = &self.mappings[i];
                    format!("{}={{{}}}", m.name, m.variable)
                })
                .collect();
            out.push(format!("{name}({})", args.join(",")));
        }
    }

    /// `Ok(None)` when a required parameter has no route value.
    fn translate(
        &self,
        ctx: &mut TranslateContext<'_>,
        operation: &str,
    ) -> Result<Option<Vec<OperationParameter>>, Error> {
        if let Some(missing) = self
            .mappings
            .iter()
            .find(|m| !m.optional && ctx.route_value(&m.variable).is_none())
        {
            tracing::debug!(
                operation,
                parameter = %missing.name,
                "Required function parameter missing from route"
            );
            return Ok(None);
        }

        let model = ctx.model();
        let mut parameters = Vec::with_capacity(self.mappings.len());
        for mapping in &self.mappings {
            let Some(raw) = ctx.route_value(&mapping.variable) else {
                continue;
            };
            let literal = ctx.resolve_alias(raw)?;
            let invalid = |literal: &str, reason: String| Error::InvalidParameterValue {
                operation: operation.to_owned(),
                parameter: mapping.name.clone(),
                literal: literal.to_owned(),
                expected_type: model.type_name(&mapping.ty),
                reason,
            };
            let decoded = urlencoding::decode(&literal)
                .map_err(|e| invalid(literal.as_str(), e.to_string()))?;
            let value = parse_literal(&decoded, &mapping.ty, model)
                .map_err(|e| invalid(decoded.as_ref(), e.to_string()))?;
            ctx.record_value(&mapping.variable, value.clone(), mapping.ty);
            parameters.push(OperationParameter {
                name: mapping.name.clone(),
                value,
            });
        }
        Ok(Some(parameters))
    }
}

/// Operation names as rendered in templates.
#[derive(Clone, Debug, PartialEq, Eq)]
struct OperationNames {
    short: String,
    qualified: String,
}

impl OperationNames {
    fn of(operation: &Operation) -> Self {
        Self {
            short: operation.name.clone(),
            qualified: operation.full_name(),
        }
    }

    fn rendered(&self, options: &RouteOptions) -> Vec<&str> {
        let mut names = Vec::with_capacity(2);
        if options.qualified_operation_call() {
            names.push(self.qualified.as_str());
        }
        if options.unqualified_operation_call() {
            names.push(self.short.as_str());
        }
        names
    }
}

fn bound_operation<'m>(
    model: &'m EdmModel,
    id: OperationId,
    kind: OperationKind,
) -> Result<&'m Operation, Error> {
    let operation = model.operation(id);
    if operation.kind != kind {
        return Err(Error::InvalidTemplate(format!(
            "'{}' is not a {}",
            operation.full_name(),
            kind
        )));
    }
    if !operation.is_bound {
        return Err(Error::InvalidTemplate(format!(
            "'{}' is unbound and can only be called through an import",
            operation.full_name()
        )));
    }
    Ok(operation)
}

/// `true` when the current segment can be passed as the binding parameter.
fn binding_matches(ctx: &TranslateContext<'_>, binding: TypeRef) -> bool {
    let Some(current) = ctx.current_type() else {
        return false;
    };
    if current.collection != binding.collection {
        return false;
    }
    match (current.as_structured(), binding.as_structured()) {
        (Some(actual), Some(declared)) => ctx.model().is_assignable(actual, declared),
        _ => current.kind == binding.kind,
    }
}

/// Bound function call: `NS.GetTopOrders(count={count})`.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionSegmentTemplate {
    operation: OperationId,
    names: OperationNames,
    binding: TypeRef,
    return_type: Option<TypeRef>,
    parameters: FunctionParameters,
}

impl FunctionSegmentTemplate {
    /// Function whose parameters are read from route variables of the same name.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplate` for actions, unbound functions, or
    /// too many optional parameters.
    pub fn new(model: &EdmModel, operation: OperationId) -> Result<Self, Error> {
        Self::with_mappings(model, operation, &[])
    }

    /// Function with some parameters read from renamed route variables.
    ///
    /// # Errors
    /// See [`FunctionSegmentTemplate::new`]; also rejects unknown parameter names.
    pub fn with_mappings(
        model: &EdmModel,
        operation: OperationId,
        renames: &[(&str, &str)],
    ) -> Result<Self, Error> {
        let op = bound_operation(model, operation, OperationKind::Function)?;
        let binding = op.binding_parameter().map(|p| p.ty).ok_or_else(|| {
            Error::InvalidTemplate(format!("'{}' has no binding parameter", op.full_name()))
        })?;
        Ok(Self {
            operation,
            names: OperationNames::of(op),
            binding,
            return_type: op.return_type,
            parameters: FunctionParameters::new(op, renames)?,
        })
    }

    #[must_use]
    pub fn operation(&self) -> OperationId {
        self.operation
    }

    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.names.qualified
    }

    #[must_use]
    pub fn parameters(&self) -> &[ParameterMapping] {
        &self.parameters.mappings
    }

    #[must_use]
    pub fn edm_type(&self) -> Option<TypeRef> {
        self.return_type
    }

    #[must_use]
    pub fn templates(&self, options: &RouteOptions) -> Vec<String> {
        let mut out = Vec::new();
        for name in self.names.rendered(options) {
            self.parameters.render(name, options, &mut out);
        }
        out
    }

    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> Result<bool, Error> {
        if !binding_matches(ctx, self.binding) {
            return Ok(false);
        }
        let Some(parameters) = self.parameters.translate(ctx, &self.names.qualified)? else {
            return Ok(false);
        };
        ctx.push_segment(ODataPathSegment::Operation {
            id: self.operation,
            name: self.names.qualified.clone(),
            parameters,
            ty: self.return_type,
        });
        Ok(true)
    }
}

/// Bound action call: `NS.Rate`. Action parameters travel in the body.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionSegmentTemplate {
    operation: OperationId,
    names: OperationNames,
    binding: TypeRef,
    return_type: Option<TypeRef>,
}

impl ActionSegmentTemplate {
    /// # Errors
    /// Returns `Error::InvalidTemplate` for functions and unbound actions.
    pub fn new(model: &EdmModel, operation: OperationId) -> Result<Self, Error> {
        let op = bound_operation(model, operation, OperationKind::Action)?;
        let binding = op.binding_parameter().map(|p| p.ty).ok_or_else(|| {
            Error::InvalidTemplate(format!("'{}' has no binding parameter", op.full_name()))
        })?;
        Ok(Self {
            operation,
            names: OperationNames::of(op),
            binding,
            return_type: op.return_type,
        })
    }

    #[must_use]
    pub fn operation(&self) -> OperationId {
        self.operation
    }

    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.names.qualified
    }

    #[must_use]
    pub fn edm_type(&self) -> Option<TypeRef> {
        self.return_type
    }

    #[must_use]
    pub fn templates(&self, options: &RouteOptions) -> Vec<String> {
        self.names
            .rendered(options)
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> bool {
        if !binding_matches(ctx, self.binding) {
            return false;
        }
        ctx.push_segment(ODataPathSegment::Operation {
            id: self.operation,
            name: self.names.qualified.clone(),
            parameters: Vec::new(),
            ty: self.return_type,
        });
        true
    }
}

fn import_operation(
    model: &EdmModel,
    import: OperationImportId,
    operation: OperationId,
    kind: OperationKind,
) -> Result<(), Error> {
    let imp = model.operation_import(import);
    if imp.kind != kind {
        return Err(Error::InvalidTemplate(format!(
            "'{}' is not a {} import",
            imp.name,
            kind
        )));
    }
    if !imp.operations.contains(&operation) {
        return Err(Error::InvalidTemplate(format!(
            "'{}' does not import '{}'",
            imp.name,
            model.operation(operation).full_name()
        )));
    }
    Ok(())
}

/// Function import call: `GetNearest(lat={lat},lon={lon})`.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionImportSegmentTemplate {
    import: OperationImportId,
    operation: OperationId,
    name: String,
    return_type: Option<TypeRef>,
    parameters: FunctionParameters,
}

impl FunctionImportSegmentTemplate {
    /// Import of one function overload.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplate` when `operation` is not a function imported by `import`.
    pub fn new(
        model: &EdmModel,
        import: OperationImportId,
        operation: OperationId,
    ) -> Result<Self, Error> {
        Self::with_mappings(model, import, operation, &[])
    }

    /// # Errors
    /// See [`FunctionImportSegmentTemplate::new`].
    pub fn with_mappings(
        model: &EdmModel,
        import: OperationImportId,
        operation: OperationId,
        renames: &[(&str, &str)],
    ) -> Result<Self, Error> {
        import_operation(model, import, operation, OperationKind::Function)?;
        let op = model.operation(operation);
        Ok(Self {
            import,
            operation,
            name: model.operation_import(import).name.clone(),
            return_type: op.return_type,
            parameters: FunctionParameters::new(op, renames)?,
        })
    }

    #[must_use]
    pub fn import(&self) -> OperationImportId {
        self.import
    }

    #[must_use]
    pub fn operation(&self) -> OperationId {
        self.operation
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parameters(&self) -> &[ParameterMapping] {
        &self.parameters.mappings
    }

    #[must_use]
    pub fn edm_type(&self) -> Option<TypeRef> {
        self.return_type
    }

    #[must_use]
    pub fn templates(&self, options: &RouteOptions) -> Vec<String> {
        let mut out = Vec::new();
        self.parameters.render(&self.name, options, &mut out);
        out
    }

    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> Result<bool, Error> {
        let Some(parameters) = self.parameters.translate(ctx, &self.name)? else {
            return Ok(false);
        };
        ctx.push_segment(ODataPathSegment::OperationImport {
            id: self.import,
            operation: self.operation,
            name: self.name.clone(),
            parameters,
            ty: self.return_type,
        });
        Ok(true)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActionImportSegmentTemplate {
    import: OperationImportId,
    operation: OperationId,
    name: String,
    return_type: Option<TypeRef>,
}

impl ActionImportSegmentTemplate {
    /// # Errors
    /// Returns `Error::InvalidTemplate` when `import` is a function import.
    pub fn new(model: &EdmModel, import: OperationImportId) -> Result<Self, Error> {
        let imp = model.operation_import(import);
        let operation = imp.operations.first().copied().ok_or_else(|| {
            Error::InvalidTemplate(format!("'{}' imports no operation", imp.name))
        })?;
        import_operation(model, import, operation, OperationKind::Action)?;
        Ok(Self {
            import,
            operation,
            name: imp.name.clone(),
            return_type: model.operation(operation).return_type,
        })
    }

    #[must_use]
    pub fn import(&self) -> OperationImportId {
        self.import
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn edm_type(&self) -> Option<TypeRef> {
        self.return_type
    }

    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> bool {
        ctx.push_segment(ODataPathSegment::OperationImport {
            id: self.import,
            operation: self.operation,
            name: self.name.clone(),
            parameters: Vec::new(),
            ty: self.return_type,
        });
        true
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::context::RouteValues;
    use modkit_edm::{EdmValue, OperationDef, SchemaDef, StructuredTypeDef};

    fn model() -> EdmModel {
        EdmModel::from_schema(
            SchemaDef::new("NS")
                .entity_type(StructuredTypeDef::new("Customer").key("Id", "Edm.Int32"))
                .singleton("Me", "NS.Customer")
                .function(
                    OperationDef::new("Search")
                        .bound_to("NS.Customer")
                        .parameter("term", "Edm.String")
                        .optional_parameter("top", "Edm.Int32")
                        .optional_parameter("skip", "Edm.Int32")
                        .returns("Collection(NS.Customer)"),
                )
                .function(OperationDef::new("Ping").bound_to("NS.Customer").returns("Edm.Boolean"))
                .action(OperationDef::new("Touch").bound_to("NS.Customer"))
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

    fn op(model: &EdmModel, name: &str) -> OperationId {
        model.operations_named(name)[0]
    }

    fn on_me<'a>(model: &'a EdmModel, route: &'a RouteValues) -> TranslateContext<'a> {
        let mut ctx = TranslateContext::new(model, route);
        let me = model.find_singleton("Me").unwrap();
        crate::segment::SingletonSegmentTemplate::new(model, me).translate(&mut ctx);
        ctx
    }

    #[test]
    fn function_templates_cover_optional_combinations() {
        let model = model();
        let search = FunctionSegmentTemplate::new(&model, op(&model, "Search")).unwrap();
        let options = RouteOptions::default().with_unqualified_operation_call(false).unwrap();
        assert_eq!(
            search.templates(&options),
            [
                "NS.Search(term={term})",
                "NS.Search(term={term},top={top})",
                "NS.Search(term={term},skip={skip})",
                "NS.Search(term={term},top={top},skip={skip})",
            ]
        );
    }

    #[test]
    fn empty_parameter_function_parenthesis_follows_options() {
        let model = model();
        let ping = FunctionSegmentTemplate::new(&model, op(&model, "Ping")).unwrap();
        assert_eq!(ping.templates(&RouteOptions::default()), ["NS.Ping()", "Ping()"]);
        let options =
            RouteOptions::canonical().with_non_parenthesis_for_empty_parameter_function(true);
        assert_eq!(ping.templates(&options), ["NS.Ping"]);
    }

    #[test]
    fn kinds_and_binding_are_checked_at_build() {
        let model = model();
        assert!(FunctionSegmentTemplate::new(&model, op(&model, "Touch")).is_err());
        assert!(ActionSegmentTemplate::new(&model, op(&model, "Search")).is_err());
        assert!(FunctionSegmentTemplate::new(&model, op(&model, "NS.Nearest")).is_err());
        assert!(
            FunctionSegmentTemplate::with_mappings(&model, op(&model, "Search"), &[("nope", "x")])
                .is_err()
        );
    }

    #[test]
    fn renamed_variables_are_rendered_and_read() {
        let model = model();
        let search = FunctionSegmentTemplate::with_mappings(
            &model,
            op(&model, "Search"),
            &[("term", "q")],
        )
        .unwrap();
        assert_eq!(
            search.templates(&RouteOptions::canonical())[0],
            "NS.Search(term={q})"
        );

        let route = RouteValues::new().with("q", "'rust'");
        let mut ctx = on_me(&model, &route);
        assert!(search.translate(&mut ctx).unwrap());
        let result = ctx.into_result();
        assert_eq!(
            result.route_values["q"],
            EdmValue::String("rust".to_owned())
        );
    }

    #[test]
    fn missing_required_parameter_does_not_match() {
        let model = model();
        let search = FunctionSegmentTemplate::new(&model, op(&model, "Search")).unwrap();
        let route = RouteValues::new().with("top", "5");
        let mut ctx = on_me(&model, &route);
        assert!(!search.translate(&mut ctx).unwrap());
    }

    #[test]
    fn optional_parameters_are_omitted_when_absent() {
        let model = model();
        let search = FunctionSegmentTemplate::new(&model, op(&model, "Search")).unwrap();
        let route = RouteValues::new().with("term", "'a'").with("skip", "2");
        let mut ctx = on_me(&model, &route);
        assert!(search.translate(&mut ctx).unwrap());
        let Some(ODataPathSegment::Operation { parameters, .. }) = ctx.segments().last() else {
            panic!("expected operation segment");
        };
        let names: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["term", "skip"]);
    }

    #[test]
    fn invalid_parameter_literal_is_an_error() {
        let model = model();
        let search = FunctionSegmentTemplate::new(&model, op(&model, "Search")).unwrap();
        let route = RouteValues::new().with("term", "'a'").with("top", "many");
        let mut ctx = on_me(&model, &route);
        match search.translate(&mut ctx) {
            Err(Error::InvalidParameterValue {
                parameter,
                literal,
                expected_type,
                ..
            }) => {
                assert_eq!(parameter, "top");
                assert_eq!(literal, "many");
                assert_eq!(expected_type, "Edm.Int32");
            }
            Ok(_) | Err(_) => panic!("expected an invalid parameter value error"),
        }
    }

    #[test]
    fn parameter_alias_is_resolved_from_query() {
        let model = model();
        let search = FunctionSegmentTemplate::new(&model, op(&model, "Search")).unwrap();
        let route = RouteValues::new().with("term", "@t");
        let query = RouteValues::new().with("@t", "'from%20alias'");
        let mut ctx = on_me(&model, &route).with_query(&query);
        assert!(search.translate(&mut ctx).unwrap());
        assert_eq!(
            ctx.into_result().route_values["term"],
            EdmValue::String("from alias".to_owned())
        );
    }

    #[test]
    fn binding_type_must_match_current_segment() {
        let model = model();
        let touch = ActionSegmentTemplate::new(&model, op(&model, "Touch")).unwrap();
        let route = RouteValues::new();
        let mut ctx = TranslateContext::new(&model, &route);
        assert!(!touch.translate(&mut ctx));

        let mut ctx = on_me(&model, &route);
        assert!(touch.translate(&mut ctx));
    }

    #[test]
    fn imports_render_unqualified_names() {
        let model = model();
        let nearest_import = model.find_operation_import("Nearest").unwrap();
        let nearest =
            FunctionImportSegmentTemplate::new(&model, nearest_import, op(&model, "NS.Nearest"))
                .unwrap();
        assert_eq!(
            nearest.templates(&RouteOptions::default()),
            ["Nearest(lat={lat},lon={lon})"]
        );

        let reset = model.find_operation_import("Reset").unwrap();
        assert!(ActionImportSegmentTemplate::new(&model, reset).is_ok());
        assert!(ActionImportSegmentTemplate::new(&model, nearest_import).is_err());
    }
}
