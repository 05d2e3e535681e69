//! Per-request translation state.

use std::collections::{BTreeMap, HashMap, HashSet};

use modkit_edm::{EdmModel, EdmValue, TypeRef};

use crate::error::Error;
use crate::path::{ODataParameterValue, ODataPath, ODataPathSegment};

/// Raw string values captured from the request URL, keyed by route variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteValues(HashMap<String, String>);

impl RouteValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Output of a successful translation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranslationResult {
    pub path: ODataPath,
    /// Converted key and parameter values, keyed by route variable.
    pub route_values: BTreeMap<String, EdmValue>,
    /// Typed wrappers for the same values, consumed by parameter binding.
    pub parameters: BTreeMap<String, ODataParameterValue>,
}

/// Mutable state for one translation attempt.
///
/// Created per request and consumed by [`TranslateContext::into_result`]. The
/// route and query maps are only read; everything a segment produces goes into
/// the context itself.
#[derive(Debug)]
pub struct TranslateContext<'a> {
    model: &'a EdmModel,
    route_values: &'a RouteValues,
    query: Option<&'a RouteValues>,
    segments: Vec<ODataPathSegment>,
    updated_values: BTreeMap<String, EdmValue>,
    parameters: BTreeMap<String, ODataParameterValue>,
    alias_cache: HashMap<String, String>,
}

impl<'a> TranslateContext<'a> {
    #[must_use]
    pub fn new(model: &'a EdmModel, route_values: &'a RouteValues) -> Self {
        Self {
            model,
            route_values,
            query: None,
            segments: Vec::new(),
            updated_values: BTreeMap::new(),
            parameters: BTreeMap::new(),
            alias_cache: HashMap::new(),
        }
    }

    /// Attach query string values used to resolve `@alias` parameters.
    #[must_use]
    pub fn with_query(mut self, query: &'a RouteValues) -> Self {
        self.query = Some(query);
        self
    }

    #[must_use]
    pub fn model(&self) -> &'a EdmModel {
        self.model
    }

    #[must_use]
    pub fn route_value(&self, name: &str) -> Option<&'a str> {
        self.route_values.get(name)
    }

    #[must_use]
    pub fn segments(&self) -> &[ODataPathSegment] {
        &self.segments
    }

    pub fn push_segment(&mut self, segment: ODataPathSegment) {
        self.segments.push(segment);
    }

    /// Type yielded by the last resolved segment.
    #[must_use]
    pub fn current_type(&self) -> Option<TypeRef> {
        self.segments.last().and_then(ODataPathSegment::edm_type)
    }

    /// Record a converted value under its route variable name.
    pub fn record_value(&mut self, name: &str, value: EdmValue, ty: TypeRef) {
        self.parameters.insert(
            name.to_owned(),
            ODataParameterValue {
                value: value.clone(),
                ty,
            },
        );
        self.updated_values.insert(name.to_owned(), value);
    }

    /// Follow `@alias` references through the query values.
    ///
    /// Non-alias literals are returned unchanged. An alias with no query value
    /// resolves to `null`.
    ///
    /// # Errors
    /// Returns `Error::AliasCycle` when the chain revisits an alias.
    pub fn resolve_alias(&mut self, literal: &str) -> Result<String, Error> {
        if !literal.starts_with('@') {
            return Ok(literal.to_owned());
        }
        if let Some(cached) = self.alias_cache.get(literal) {
            return Ok(cached.clone());
        }

        let mut visited = HashSet::new();
        let mut current = literal.to_owned();
        let resolved = loop {
            if !visited.insert(current.clone()) {
                tracing::debug!(alias = literal, "Parameter alias cycle detected");
                return Err(Error::AliasCycle(literal.to_owned()));
            }
            match self.query.and_then(|q| q.get(&current)) {
                Some(next) if next.starts_with('@') => current = next.to_owned(),
                Some(value) => break value.to_owned(),
                None => break "null".to_owned(),
            }
        };

        self.alias_cache
            .insert(literal.to_owned(), resolved.clone());
        Ok(resolved)
    }

    #[must_use]
    pub fn into_result(self) -> TranslationResult {
        TranslationResult {
            path: ODataPath::new(self.segments),
            route_values: self.updated_values,
            parameters: self.parameters,
        }
    }
}
