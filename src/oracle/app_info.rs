// Hierarchy-based implementation of the access oracles

use std::collections::{HashSet, VecDeque};

use super::{
    InstantiationOracle, ProtectedAccessOracle, Resolution, ResolutionFailure, ResolutionOracle,
    ResolvedMember, SubtypeOracle,
};
use crate::program::{
    ClassType, ElementId, FieldRef, InvokeKind, MethodRef, Program, ProgramClass, ProgramMethod, Proto,
};

const JAVA_LANG_OBJECT: &str = "java.lang.Object";

/// Answers resolution, subtyping, protected-access and instantiation queries from a [`Program`]
pub struct AppInfo<'p> {
    program: &'p Program,
    /// Classes instantiated directly, plus all of their supertypes
    instantiated: HashSet<ClassType>,
}

impl<'p> AppInfo<'p> {
    pub fn new(program: &'p Program) -> Self {
        let mut app_info = Self {
            program,
            instantiated: HashSet::new(),
        };
        app_info.instantiated = app_info.compute_instantiated();
        app_info
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    fn compute_instantiated(&self) -> HashSet<ClassType> {
        let mut direct: Vec<&ClassType> = self
            .program
            .classes()
            .filter(|c| c.instantiated)
            .map(|c| &c.class_type)
            .collect();

        for class in self.program.classes() {
            for method in &class.methods {
                direct.extend(
                    method
                        .code
                        .iter()
                        .filter_map(|u| u.instantiated_type())
                        .filter(|ty| !ty.is_array())
                        .filter_map(|ty| ty.class_type()),
                );
            }
        }

        let mut instantiated = HashSet::new();
        let mut worklist: VecDeque<&ClassType> = direct.into_iter().collect();
        while let Some(class_type) = worklist.pop_front() {
            if !instantiated.insert(class_type.clone()) {
                continue;
            }
            if let Some(class) = self.program.definition_for(class_type) {
                worklist.extend(class.super_types());
            }
        }
        instantiated
    }

    /// Walk the superclass chain starting at `start` (inclusive)
    fn class_chain<'a>(&'a self, start: &'a ClassType) -> impl Iterator<Item = &'p ProgramClass> + 'a {
        let mut visited = HashSet::new();
        let mut next = Some(start);
        std::iter::from_fn(move || {
            let current = next.take()?;
            if !visited.insert(current.clone()) {
                return None;
            }
            let class = self.program.definition_for(current)?;
            next = class.super_type.as_ref();
            Some(class)
        })
    }

    /// All interfaces reachable from `class` through superclasses and superinterfaces
    fn super_interfaces(&self, class: &'p ProgramClass) -> Vec<&'p ProgramClass> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut worklist: VecDeque<&ClassType> = VecDeque::new();

        for holder in self.class_chain(&class.class_type) {
            worklist.extend(holder.interfaces.iter());
        }
        if class.is_interface() {
            worklist.extend(class.interfaces.iter());
        }

        while let Some(interface) = worklist.pop_front() {
            if !seen.insert(interface.clone()) {
                continue;
            }
            if let Some(definition) = self.program.definition_for(interface) {
                worklist.extend(definition.interfaces.iter());
                if definition.is_interface() {
                    result.push(definition);
                }
            }
        }
        result
    }

    fn resolved_method(class: &ProgramClass, method: &ProgramMethod) -> ResolvedMember {
        ResolvedMember {
            element: ElementId::Method(class.method_ref(method)),
            holder: class.class_type.clone(),
            access: method.access,
        }
    }

    fn lookup_in_chain(&self, start: &ClassType, name: &str, proto: &Proto) -> Option<ResolvedMember> {
        self.class_chain(start).find_map(|class| {
            class
                .lookup_method(name, proto)
                .map(|method| Self::resolved_method(class, method))
        })
    }

    /// Maximally specific superinterface method (JVMS 5.4.3.3, step 3)
    fn lookup_maximally_specific(
        &self,
        class: &'p ProgramClass,
        name: &str,
        proto: &Proto,
    ) -> Result<Option<ResolvedMember>, ResolutionFailure> {
        let candidates: Vec<(&ProgramClass, &ProgramMethod)> = self
            .super_interfaces(class)
            .into_iter()
            .filter_map(|interface| {
                interface
                    .lookup_method(name, proto)
                    .filter(|m| !m.access.is_private() && !m.access.is_static)
                    .map(|m| (interface, m))
            })
            .collect();

        let maximally_specific: Vec<&(&ProgramClass, &ProgramMethod)> = candidates
            .iter()
            .filter(|(holder, _)| {
                !candidates.iter().any(|(other, _)| {
                    other.class_type != holder.class_type
                        && self.is_subtype(&other.class_type, &holder.class_type)
                })
            })
            .collect();

        let mut non_abstract = maximally_specific.iter().filter(|(_, m)| !m.access.is_abstract);
        match (non_abstract.next(), non_abstract.next()) {
            (Some((holder, method)), None) => Ok(Some(Self::resolved_method(holder, method))),
            (Some(_), Some(_)) => Err(ResolutionFailure::Ambiguous),
            (None, _) => Ok(maximally_specific
                .first()
                .map(|(holder, method)| Self::resolved_method(holder, method))),
        }
    }

    fn resolve_on_class(&self, holder: &'p ProgramClass, method: &MethodRef) -> Resolution {
        if let Some(member) = self.lookup_in_chain(&holder.class_type, &method.name, &method.proto) {
            return Self::resolved(method, member);
        }
        match self.lookup_maximally_specific(holder, &method.name, &method.proto) {
            Ok(Some(member)) => Self::resolved(method, member),
            Ok(None) => Resolution::Failed(ResolutionFailure::NoSuchMember),
            Err(failure) => Resolution::Failed(failure),
        }
    }

    fn resolve_on_interface(&self, holder: &'p ProgramClass, method: &MethodRef) -> Resolution {
        if let Some(found) = holder.lookup_method(&method.name, &method.proto) {
            return Self::resolved(method, Self::resolved_method(holder, found));
        }

        // Public instance methods of java.lang.Object are members of every interface
        let object = ClassType::new(JAVA_LANG_OBJECT);
        if let Some(object_class) = self.program.definition_for(&object) {
            if let Some(found) = object_class
                .lookup_method(&method.name, &method.proto)
                .filter(|m| m.access.is_public() && !m.access.is_static)
            {
                return Self::resolved(method, Self::resolved_method(object_class, found));
            }
        }

        match self.lookup_maximally_specific(holder, &method.name, &method.proto) {
            Ok(Some(member)) => Self::resolved(method, member),
            Ok(None) => Resolution::Failed(ResolutionFailure::NoSuchMember),
            Err(failure) => Resolution::Failed(failure),
        }
    }

    fn resolved(method: &MethodRef, member: ResolvedMember) -> Resolution {
        Resolution::Resolved {
            initial_holder: method.holder.clone(),
            member,
        }
    }

    fn lookup_field(&self, class_type: &ClassType, field: &FieldRef, visited: &mut HashSet<ClassType>) -> Option<ResolvedMember> {
        if !visited.insert(class_type.clone()) {
            return None;
        }
        let class = self.program.definition_for(class_type)?;

        if let Some(found) = class.lookup_field(&field.name, &field.field_type) {
            return Some(ResolvedMember {
                element: ElementId::Field(class.field_ref(found)),
                holder: class.class_type.clone(),
                access: found.access,
            });
        }

        for interface in &class.interfaces {
            if let Some(found) = self.lookup_field(interface, field, visited) {
                return Some(found);
            }
        }

        class
            .super_type
            .as_ref()
            .and_then(|super_type| self.lookup_field(super_type, field, visited))
    }
}

impl ResolutionOracle for AppInfo<'_> {
    fn definition_for(&self, class_type: &ClassType) -> Option<&ProgramClass> {
        self.program.definition_for(class_type)
    }

    fn resolve_field(&self, field: &FieldRef) -> Resolution {
        if self.program.definition_for(&field.holder).is_none() {
            return Resolution::Failed(ResolutionFailure::MissingHolder);
        }
        match self.lookup_field(&field.holder, field, &mut HashSet::new()) {
            Some(member) => Resolution::Resolved {
                initial_holder: field.holder.clone(),
                member,
            },
            None => Resolution::Failed(ResolutionFailure::NoSuchMember),
        }
    }

    fn resolve_method(&self, method: &MethodRef, kind: InvokeKind) -> Resolution {
        let Some(holder) = self.program.definition_for(&method.holder) else {
            return Resolution::Failed(ResolutionFailure::MissingHolder);
        };

        match kind {
            InvokeKind::Virtual => {
                if holder.is_interface() {
                    return Resolution::Failed(ResolutionFailure::IncompatibleHolder);
                }
                self.resolve_on_class(holder, method)
            }
            InvokeKind::Interface => {
                if !holder.is_interface() {
                    return Resolution::Failed(ResolutionFailure::IncompatibleHolder);
                }
                self.resolve_on_interface(holder, method)
            }
            // Dex allows direct, static and super invokes on either kind of holder
            InvokeKind::Direct | InvokeKind::Static | InvokeKind::Super => {
                if holder.is_interface() {
                    self.resolve_on_interface(holder, method)
                } else {
                    self.resolve_on_class(holder, method)
                }
            }
        }
    }
}

impl SubtypeOracle for AppInfo<'_> {
    fn is_subtype(&self, sub: &ClassType, sup: &ClassType) -> bool {
        if sub == sup {
            return true;
        }
        let mut visited = HashSet::new();
        let mut worklist = vec![sub];
        while let Some(current) = worklist.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(class) = self.program.definition_for(current) else {
                continue;
            };
            for super_type in class.super_types() {
                if super_type == sup {
                    return true;
                }
                worklist.push(super_type);
            }
        }
        false
    }
}

impl ProtectedAccessOracle for AppInfo<'_> {
    fn is_valid_protected_access(&self, member_holder: &ClassType, context: &ClassType) -> bool {
        context.same_package(member_holder) || self.is_subtype(context, member_holder)
    }
}

impl InstantiationOracle for AppInfo<'_> {
    fn is_instantiated_directly_or_indirectly(&self, class_type: &ClassType) -> bool {
        self.instantiated.contains(class_type)
    }
}
