//! Type references and arena handles for the EDM graph.

use std::fmt;

/// Namespace used by the OData primitive types.
pub const EDM_NAMESPACE: &str = "Edm";

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the element inside the owning [`crate::EdmModel`].
            #[must_use]
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Handle to an entity or complex type.
    StructuredTypeId
);
arena_id!(
    /// Handle to an enum type.
    EnumTypeId
);
arena_id!(
    /// Handle to an entity set.
    EntitySetId
);
arena_id!(
    /// Handle to a singleton.
    SingletonId
);
arena_id!(
    /// Handle to a bound or unbound action/function.
    OperationId
);
arena_id!(
    /// Handle to an action or function import.
    OperationImportId
);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    Guid,
    Date,
    DateTimeOffset,
    TimeOfDay,
    Duration,
    Binary,
}

impl PrimitiveKind {
    const ALL: [PrimitiveKind; 16] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::SByte,
        PrimitiveKind::Int16,
        PrimitiveKind::Int32,
        PrimitiveKind::Int64,
        PrimitiveKind::Single,
        PrimitiveKind::Double,
        PrimitiveKind::Decimal,
        PrimitiveKind::String,
        PrimitiveKind::Guid,
        PrimitiveKind::Date,
        PrimitiveKind::DateTimeOffset,
        PrimitiveKind::TimeOfDay,
        PrimitiveKind::Duration,
        PrimitiveKind::Binary,
    ];

    /// Short name without the `Edm.` prefix.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::SByte => "SByte",
            PrimitiveKind::Int16 => "Int16",
            PrimitiveKind::Int32 => "Int32",
            PrimitiveKind::Int64 => "Int64",
            PrimitiveKind::Single => "Single",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Decimal => "Decimal",
            PrimitiveKind::String => "String",
            PrimitiveKind::Guid => "Guid",
            PrimitiveKind::Date => "Date",
            PrimitiveKind::DateTimeOffset => "DateTimeOffset",
            PrimitiveKind::TimeOfDay => "TimeOfDay",
            PrimitiveKind::Duration => "Duration",
            PrimitiveKind::Binary => "Binary",
        }
    }

    /// Parse a qualified primitive name such as `Edm.Int32`.
    #[must_use]
    pub fn from_qualified_name(name: &str) -> Option<Self> {
        let short = name.strip_prefix("Edm.")?;
        Self::ALL.into_iter().find(|k| k.name() == short)
    }

    #[must_use]
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::SByte
                | PrimitiveKind::Int16
                | PrimitiveKind::Int32
                | PrimitiveKind::Int64
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{EDM_NAMESPACE}.{}", self.name())
    }
}

/// What a [`TypeRef`] points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Enum(EnumTypeId),
    Structured(StructuredTypeId),
}

/// A (possibly collection-valued, possibly nullable) reference to a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub kind: TypeKind,
    pub collection: bool,
    pub nullable: bool,
}

impl TypeRef {
    #[must_use]
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self {
            kind: TypeKind::Primitive(kind),
            collection: false,
            nullable: false,
        }
    }

    #[must_use]
    pub fn structured(id: StructuredTypeId) -> Self {
        Self {
            kind: TypeKind::Structured(id),
            collection: false,
            nullable: false,
        }
    }

    #[must_use]
    pub fn enumeration(id: EnumTypeId) -> Self {
        Self {
            kind: TypeKind::Enum(id),
            collection: false,
            nullable: false,
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: bool) -> Self {
        self.collection = collection;
        self
    }

    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// The element type of a collection, or the type itself.
    #[must_use]
    pub fn element(self) -> Self {
        self.with_collection(false)
    }

    #[must_use]
    pub fn as_structured(&self) -> Option<StructuredTypeId> {
        match self.kind {
            TypeKind::Structured(id) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Split `Collection(Ns.Type)` into (`Ns.Type`, true).
pub(crate) fn split_collection(name: &str) -> (&str, bool) {
    match name
        .strip_prefix("Collection(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (inner.trim(), true),
        None => (name.trim(), false),
    }
}
