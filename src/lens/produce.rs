// Lens production - representative choice and member relocation for merge groups

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::{LensBuilder, LensError, RepresentativeChooser, RewriteLens};
use crate::policy::MergeGroup;
use crate::program::{ClassType, DexType, FieldRef, MethodRef, Program, ProgramClass, Proto};

/// A merge decided for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedGroup {
    /// Class that survives and receives all members
    pub representative: ClassType,
    /// Classes that disappear into the representative
    pub retired: Vec<ClassType>,
}

/// Build the lens that merges every group of two or more classes into its representative.
///
/// Members of retired classes keep their name on the representative unless a member with the
/// same name and (rewritten) signature is already there; then the smallest free `name$N`
/// suffix is used. The same renaming applies to members of untouched classes whose
/// signatures become equal after rewriting.
pub fn produce_lens(
    groups: &[MergeGroup],
    program: &Program,
    chooser: &dyn RepresentativeChooser,
) -> Result<(RewriteLens, Vec<MergedGroup>), LensError> {
    let mut builder = LensBuilder::new();
    let mut merges = Vec::new();

    for group in groups.iter().filter(|g| g.len() > 1) {
        let Some(representative) = chooser.choose(group, program) else {
            continue;
        };
        if !group.contains(&representative) {
            return Err(LensError::ForeignRepresentative { representative });
        }

        let retired: Vec<ClassType> = group
            .classes()
            .iter()
            .filter(|c| **c != representative)
            .cloned()
            .collect();
        for class_type in &retired {
            builder.map_class(class_type.clone(), representative.clone())?;
        }

        debug!("Merging {} classes into {}", retired.len(), representative);
        merges.push(MergedGroup { representative, retired });
    }

    // Signatures are compared after rewriting, so members are relocated only once every
    // retired class is known
    let class_map: HashMap<ClassType, ClassType> = merges
        .iter()
        .flat_map(|m| m.retired.iter().map(move |r| (r.clone(), m.representative.clone())))
        .collect();
    let rewrite = |c: &ClassType| class_map.get(c).cloned().unwrap_or_else(|| c.clone());

    for merge in &merges {
        let mut relocator = MemberRelocator::new(&merge.representative, &rewrite);

        if let Some(target) = program.definition_for(&merge.representative) {
            relocator.relocate_class(target, &mut builder)?;
        }
        for class_type in &merge.retired {
            if let Some(class) = program.definition_for(class_type) {
                relocator.relocate_class(class, &mut builder)?;
            }
        }
    }

    // Classes outside every group keep their members in place, but two of them can still
    // collide once rewritten (foo(A) and foo(B) with B merged into A)
    if !class_map.is_empty() {
        let merged: HashSet<&ClassType> = merges
            .iter()
            .flat_map(|m| std::iter::once(&m.representative).chain(m.retired.iter()))
            .collect();
        for class in program.program_classes().filter(|c| !merged.contains(&c.class_type)) {
            MemberRelocator::new(&class.class_type, &rewrite).relocate_class(class, &mut builder)?;
        }
    }

    Ok((builder.build(), merges))
}

/// Tracks the member signatures already present on one representative
struct MemberRelocator<'a, R: Fn(&ClassType) -> ClassType> {
    representative: &'a ClassType,
    rewrite: &'a R,
    fields: HashSet<(String, DexType)>,
    methods: HashSet<(String, Proto)>,
}

impl<'a, R: Fn(&ClassType) -> ClassType> MemberRelocator<'a, R> {
    fn new(representative: &'a ClassType, rewrite: &'a R) -> Self {
        Self {
            representative,
            rewrite,
            fields: HashSet::new(),
            methods: HashSet::new(),
        }
    }

    /// Record the members of `class` on the representative, mapping them where they move or
    /// need a fresh name. With `class` as its own representative only renames are mapped.
    fn relocate_class(&mut self, class: &ProgramClass, builder: &mut LensBuilder) -> Result<(), LensError> {
        let moves = &class.class_type != self.representative;

        for field in &class.fields {
            let field_type = field.field_type.map_class(self.rewrite);
            let name = fresh_name(&field.name, |candidate| {
                self.fields.contains(&(candidate.to_string(), field_type.clone()))
            });
            self.fields.insert((name.clone(), field_type.clone()));

            if moves || name != field.name {
                builder.map_field(
                    class.field_ref(field),
                    FieldRef::new(self.representative.clone(), name, field_type),
                )?;
            }
        }

        for method in &class.methods {
            let proto = method.proto().map_classes(self.rewrite);
            let name = fresh_name(&method.name, |candidate| {
                self.methods.contains(&(candidate.to_string(), proto.clone()))
            });
            self.methods.insert((name.clone(), proto.clone()));

            if moves || name != method.name {
                builder.map_method(
                    class.method_ref(method),
                    MethodRef::new(self.representative.clone(), name, proto),
                )?;
            }
        }

        Ok(())
    }
}

/// `name` if free, else `name$N` for the smallest free `N >= 1`
fn fresh_name(name: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(name) {
        return name.to_string();
    }
    let mut suffix = 1usize;
    loop {
        let candidate = format!("{}${}", name, suffix);
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
