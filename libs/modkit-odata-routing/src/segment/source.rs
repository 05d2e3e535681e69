use modkit_edm::{EdmModel, EntitySetId, SingletonId, TypeRef};

use crate::context::TranslateContext;
use crate::path::ODataPathSegment;

/// Root segment addressing an entity set; yields a collection of its entity type.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySetSegmentTemplate {
    id: EntitySetId,
    name: String,
    ty: TypeRef,
}

impl EntitySetSegmentTemplate {
    #[must_use]
    pub fn new(model: &EdmModel, id: EntitySetId) -> Self {
        let set = model.entity_set(id);
        Self {
            id,
            name: set.name.clone(),
            ty: TypeRef::structured(set.entity_type).with_collection(true),
        }
    }

    #[must_use]
    pub fn id(&self) -> EntitySetId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn edm_type(&self) -> TypeRef {
        self.ty
    }

    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> bool {
        ctx.push_segment(ODataPathSegment::EntitySet {
            id: self.id,
            name: self.name.clone(),
            ty: self.ty,
        });
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SingletonSegmentTemplate {
    id: SingletonId,
    name: String,
    ty: TypeRef,
}

impl SingletonSegmentTemplate {
    #[must_use]
    pub fn new(model: &EdmModel, id: SingletonId) -> Self {
        let singleton = model.singleton(id);
        Self {
            id,
            name: singleton.name.clone(),
            ty: TypeRef::structured(singleton.entity_type),
        }
    }

    #[must_use]
    pub fn id(&self) -> SingletonId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn edm_type(&self) -> TypeRef {
        self.ty
    }

    pub(crate) fn translate(&self, ctx: &mut TranslateContext<'_>) -> bool {
        ctx.push_segment(ODataPathSegment::Singleton {
            id: self.id,
            name: self.name.clone(),
            ty: self.ty,
        });
        true
    }
}
