//! Resolved OData paths produced by translation.

use std::fmt;

use modkit_edm::{
    EdmValue, EntitySetId, OperationId, OperationImportId, PrimitiveKind, SingletonId, TypeRef,
};

/// A converted value together with the EDM type it was converted to.
#[derive(Clone, Debug, PartialEq)]
pub struct ODataParameterValue {
    pub value: EdmValue,
    pub ty: TypeRef,
}

/// One resolved function/action parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationParameter {
    pub name: String,
    pub value: EdmValue,
}

/// A concrete, schema-validated path segment.
#[derive(Clone, Debug, PartialEq)]
pub enum ODataPathSegment {
    Metadata,
    EntitySet {
        id: EntitySetId,
        name: String,
        ty: TypeRef,
    },
    Singleton {
        id: SingletonId,
        name: String,
        ty: TypeRef,
    },
    /// Key values in key declaration order.
    Key {
        keys: Vec<(String, EdmValue)>,
        ty: TypeRef,
    },
    Type {
        type_name: String,
        ty: TypeRef,
    },
    Property {
        name: String,
        ty: TypeRef,
    },
    Navigation {
        name: String,
        ty: TypeRef,
    },
    NavigationLink {
        name: String,
        ty: TypeRef,
    },
    Operation {
        id: OperationId,
        name: String,
        parameters: Vec<OperationParameter>,
        ty: Option<TypeRef>,
    },
    OperationImport {
        id: OperationImportId,
        operation: OperationId,
        name: String,
        parameters: Vec<OperationParameter>,
        ty: Option<TypeRef>,
    },
    Ref,
    Count,
    Value {
        ty: Option<TypeRef>,
    },
    /// Undeclared property of an open type.
    Dynamic {
        name: String,
    },
}

impl ODataPathSegment {
    /// Type the segment yields; `None` for segments without an EDM type.
    #[must_use]
    pub fn edm_type(&self) -> Option<TypeRef> {
        match self {
            Self::EntitySet { ty, .. }
            | Self::Singleton { ty, .. }
            | Self::Key { ty, .. }
            | Self::Type { ty, .. }
            | Self::Property { ty, .. }
            | Self::Navigation { ty, .. }
            | Self::NavigationLink { ty, .. } => Some(*ty),
            Self::Operation { ty, .. } | Self::OperationImport { ty, .. } | Self::Value { ty } => {
                *ty
            }
            Self::Count => Some(TypeRef::primitive(PrimitiveKind::Int32)),
            Self::Metadata | Self::Ref | Self::Dynamic { .. } => None,
        }
    }
}

/// A single segment in URL form; keys render as `(1)` or `(A=1,B='x')`.
impl fmt::Display for ODataPathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => f.write_str("$metadata"),
            Self::EntitySet { name, .. }
            | Self::Singleton { name, .. }
            | Self::Property { name, .. }
            | Self::Navigation { name, .. }
            | Self::Dynamic { name } => f.write_str(name),
            Self::Type { type_name, .. } => f.write_str(type_name),
            Self::NavigationLink { name, .. } => write!(f, "{name}/$ref"),
            Self::Key { keys, .. } => {
                f.write_str("(")?;
                if let [(_, value)] = keys.as_slice() {
                    write!(f, "{value}")?;
                } else {
                    for (i, (name, value)) in keys.iter().enumerate() {
                        if i > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{name}={value}")?;
                    }
                }
                f.write_str(")")
            }
            Self::Operation {
                name, parameters, ..
            }
            | Self::OperationImport {
                name, parameters, ..
            } => {
                f.write_str(name)?;
                f.write_str("(")?;
                for (i, p) in parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}={}", p.name, p.value)?;
                }
                f.write_str(")")
            }
            Self::Ref => f.write_str("$ref"),
            Self::Count => f.write_str("$count"),
            Self::Value { .. } => f.write_str("$value"),
        }
    }
}

/// Ordered list of resolved segments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ODataPath(Vec<ODataPathSegment>);

impl ODataPath {
    #[must_use]
    pub fn new(segments: Vec<ODataPathSegment>) -> Self {
        Self(segments)
    }

    #[must_use]
    pub fn segments(&self) -> &[ODataPathSegment] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ODataPathSegment> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ODataPathSegment> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_segments(self) -> Vec<ODataPathSegment> {
        self.0
    }
}

impl<'a> IntoIterator for &'a ODataPath {
    type Item = &'a ODataPathSegment;
    type IntoIter = std::slice::Iter<'a, ODataPathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Renders the canonical URL form: `Customers(1)/NS.Vip/NS.GetTopOrders(count=5)`.
impl fmt::Display for ODataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for segment in &self.0 {
            let text = segment.to_string();
            if matches!(segment, ODataPathSegment::Key { .. }) {
                match out.strip_suffix("/$ref") {
                    Some(head) => out = format!("{head}{text}/$ref"),
                    None => out.push_str(&text),
                }
            } else {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push_str(&text);
            }
        }
        f.write_str(&out)
    }
}
