//! Rewrite lens - forward mapping from pre-merge references to post-merge references
//!
//! A lens is a chain of layers. Each layer holds the explicit mappings recorded by one pass
//! and rewrites everything else structurally through its class map. Looking a reference up
//! applies the oldest layer first.

mod builder;
mod produce;
mod representative;

pub use builder::LensBuilder;
pub use produce::{produce_lens, MergedGroup};
pub use representative::{FirstInGroup, MostMembers, RepresentativeChooser, RepresentativeStrategy};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

use crate::program::{ClassType, DexType, ElementId, FieldRef, MethodRef, Proto};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LensError {
    #[error("{kind} {from} is already mapped to {existing}, cannot map it to {requested}")]
    Conflict {
        kind: &'static str,
        from: String,
        existing: String,
        requested: String,
    },

    #[error("representative {representative} is not a member of its group")]
    ForeignRepresentative { representative: ClassType },
}

/// Immutable old-to-new mapping of classes, fields and methods
#[derive(Debug, Clone, Default)]
pub struct RewriteLens {
    classes: HashMap<ClassType, ClassType>,
    fields: HashMap<FieldRef, FieldRef>,
    methods: HashMap<MethodRef, MethodRef>,
    previous: Option<Arc<RewriteLens>>,
}

impl RewriteLens {
    /// The lens that maps everything to itself
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn builder() -> LensBuilder {
        LensBuilder::new()
    }

    pub fn class_type(&self, class_type: &ClassType) -> ClassType {
        let class_type = match &self.previous {
            Some(previous) => previous.class_type(class_type),
            None => class_type.clone(),
        };
        self.local_class(&class_type)
    }

    /// Rewrite a type; arrays are rewritten through their base type
    pub fn dex_type(&self, ty: &DexType) -> DexType {
        ty.map_class(|c| self.class_type(c))
    }

    pub fn proto(&self, proto: &Proto) -> Proto {
        proto.map_classes(|c| self.class_type(c))
    }

    pub fn field(&self, field: &FieldRef) -> FieldRef {
        let field = match &self.previous {
            Some(previous) => previous.field(field),
            None => field.clone(),
        };
        match self.fields.get(&field) {
            Some(mapped) => mapped.clone(),
            None => FieldRef::new(
                self.local_class(&field.holder),
                field.name.clone(),
                field.field_type.map_class(|c| self.local_class(c)),
            ),
        }
    }

    pub fn method(&self, method: &MethodRef) -> MethodRef {
        let method = match &self.previous {
            Some(previous) => previous.method(method),
            None => method.clone(),
        };
        match self.methods.get(&method) {
            Some(mapped) => mapped.clone(),
            None => MethodRef::new(
                self.local_class(&method.holder),
                method.name.clone(),
                method.proto.map_classes(|c| self.local_class(c)),
            ),
        }
    }

    pub fn element(&self, element: &ElementId) -> ElementId {
        match element {
            ElementId::Class(class_type) => ElementId::Class(self.class_type(class_type)),
            ElementId::Field(field) => ElementId::Field(self.field(field)),
            ElementId::Method(method) => ElementId::Method(self.method(method)),
        }
    }

    /// A lens equivalent to applying `self`, then `next`
    pub fn compose(&self, next: &RewriteLens) -> RewriteLens {
        next.rebased_onto(Arc::new(self.clone()))
    }

    /// Whether no layer maps anything
    pub fn is_identity(&self) -> bool {
        self.layers().all(|layer| {
            layer.classes.iter().all(|(from, to)| from == to)
                && layer.fields.iter().all(|(from, to)| from == to)
                && layer.methods.iter().all(|(from, to)| from == to)
        })
    }

    /// Number of layers in the chain
    pub fn depth(&self) -> usize {
        self.layers().count()
    }

    /// Every class some layer maps, with its final target; identity entries are dropped
    pub fn class_mappings(&self) -> BTreeMap<ClassType, ClassType> {
        self.layers()
            .flat_map(|layer| layer.classes.keys())
            .filter_map(|from| {
                let to = self.class_type(from);
                (&to != from).then(|| (from.clone(), to))
            })
            .collect()
    }

    /// Explicitly mapped fields with their final targets
    pub fn field_mappings(&self) -> BTreeMap<FieldRef, FieldRef> {
        self.layers()
            .flat_map(|layer| layer.fields.keys())
            .filter_map(|from| {
                let to = self.field(from);
                (&to != from).then(|| (from.clone(), to))
            })
            .collect()
    }

    /// Explicitly mapped methods with their final targets
    pub fn method_mappings(&self) -> BTreeMap<MethodRef, MethodRef> {
        self.layers()
            .flat_map(|layer| layer.methods.keys())
            .filter_map(|from| {
                let to = self.method(from);
                (&to != from).then(|| (from.clone(), to))
            })
            .collect()
    }

    fn local_class(&self, class_type: &ClassType) -> ClassType {
        self.classes.get(class_type).cloned().unwrap_or_else(|| class_type.clone())
    }

    fn layers(&self) -> impl Iterator<Item = &RewriteLens> {
        std::iter::successors(Some(self), |layer| layer.previous.as_deref())
    }

    /// Copy of this chain whose oldest layer sits on top of `base`
    fn rebased_onto(&self, base: Arc<RewriteLens>) -> RewriteLens {
        let previous = match &self.previous {
            Some(previous) => Arc::new(previous.rebased_onto(base)),
            None => base,
        };
        RewriteLens {
            classes: self.classes.clone(),
            fields: self.fields.clone(),
            methods: self.methods.clone(),
            previous: Some(previous),
        }
    }
}
