use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use super::{LensError, RewriteLens};
use crate::program::{ClassType, FieldRef, MethodRef};

/// Append-only collector for one lens layer.
///
/// Recording the same mapping twice is fine; mapping a source to two different targets is a
/// [`LensError::Conflict`].
#[derive(Debug, Default)]
pub struct LensBuilder {
    classes: HashMap<ClassType, ClassType>,
    fields: HashMap<FieldRef, FieldRef>,
    methods: HashMap<MethodRef, MethodRef>,
    previous: Option<Arc<RewriteLens>>,
}

impl LensBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a layer that applies after `previous`
    pub fn on_top_of(previous: RewriteLens) -> Self {
        Self {
            previous: Some(Arc::new(previous)),
            ..Self::default()
        }
    }

    pub fn map_class(&mut self, from: ClassType, to: ClassType) -> Result<&mut Self, LensError> {
        insert_mapping(&mut self.classes, "class", from, to)?;
        Ok(self)
    }

    pub fn map_field(&mut self, from: FieldRef, to: FieldRef) -> Result<&mut Self, LensError> {
        insert_mapping(&mut self.fields, "field", from, to)?;
        Ok(self)
    }

    pub fn map_method(&mut self, from: MethodRef, to: MethodRef) -> Result<&mut Self, LensError> {
        insert_mapping(&mut self.methods, "method", from, to)?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.fields.is_empty() && self.methods.is_empty()
    }

    /// Finish the layer.
    ///
    /// Explicit member targets are passed through the class map, so a moved member whose type
    /// mentions a retired class ends up referring to the class that replaced it.
    pub fn build(self) -> RewriteLens {
        let classes = self.classes;
        let rewrite = |c: &ClassType| classes.get(c).cloned().unwrap_or_else(|| c.clone());

        let fields = self
            .fields
            .into_iter()
            .map(|(from, to)| {
                let to = FieldRef::new(rewrite(&to.holder), to.name, to.field_type.map_class(rewrite));
                (from, to)
            })
            .collect();

        let methods = self
            .methods
            .into_iter()
            .map(|(from, to)| {
                let to = MethodRef::new(rewrite(&to.holder), to.name, to.proto.map_classes(rewrite));
                (from, to)
            })
            .collect();

        RewriteLens {
            classes,
            fields,
            methods,
            previous: self.previous,
        }
    }
}

fn insert_mapping<K>(map: &mut HashMap<K, K>, kind: &'static str, from: K, to: K) -> Result<(), LensError>
where
    K: Eq + Hash + Display,
{
    match map.get(&from) {
        Some(existing) if existing != &to => Err(LensError::Conflict {
            kind,
            from: from.to_string(),
            existing: existing.to_string(),
            requested: to.to_string(),
        }),
        Some(_) => Ok(()),
        None => {
            map.insert(from, to);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::DexType;

    #[test]
    fn test_conflicting_mapping_rejected() {
        let mut builder = LensBuilder::new();
        builder.map_class(ClassType::new("p.A"), ClassType::new("p.B")).unwrap();
        builder.map_class(ClassType::new("p.A"), ClassType::new("p.B")).unwrap();

        let error = builder
            .map_class(ClassType::new("p.A"), ClassType::new("p.C"))
            .unwrap_err();
        assert!(matches!(error, LensError::Conflict { kind: "class", .. }));
        assert!(error.to_string().contains("p.A is already mapped to p.B"));
    }

    #[test]
    fn test_build_rewrites_member_targets() {
        let mut builder = LensBuilder::new();
        builder
            .map_class(ClassType::new("p.A"), ClassType::new("p.B"))
            .unwrap()
            .map_field("p.A#self:p.A".parse().unwrap(), "p.B#self:p.A".parse().unwrap())
            .unwrap();
        let lens = builder.build();

        let field = lens.field(&"p.A#self:p.A".parse().unwrap());
        assert_eq!(field.holder, ClassType::new("p.B"));
        assert_eq!(field.field_type, DexType::class("p.B"));
    }

    #[test]
    fn test_layer_on_top_of_previous() {
        let mut first = LensBuilder::new();
        first.map_class(ClassType::new("p.A"), ClassType::new("p.B")).unwrap();

        let mut second = LensBuilder::on_top_of(first.build());
        second.map_class(ClassType::new("p.B"), ClassType::new("p.C")).unwrap();
        assert!(!second.is_empty());

        let lens = second.build();
        assert_eq!(lens.class_type(&ClassType::new("p.A")), ClassType::new("p.C"));
        assert_eq!(lens.depth(), 2);
    }
}
