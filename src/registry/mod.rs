//! Use registry - records which accesses tie program elements together
//!
//! For one context element (a class, field or method) the registry visits every outgoing
//! reference and adds a constraint edge when the access would break if the two sides were
//! relocated apart:
//!
//! - package-private targets, and protected targets reached without a subtype relation,
//!   are only accessible from the same package;
//! - enclosing-method and inner-class attributes encode nesting and are always kept together.
//!
//! References that cannot be resolved are skipped without error and counted in
//! [`RegistryStats::unresolved`].

mod builder;
mod parallel_builder;

pub use builder::GraphBuilder;
pub use parallel_builder::ParallelGraphBuilder;

use serde::Serialize;
use std::ops::AddAssign;
use tracing::trace;

use crate::config::GraphConfig;
use crate::graph::{ConstraintGraph, GraphError, NodeRef};
use crate::oracle::{AccessOracles, Resolution, ResolvedMember};
use crate::program::{
    ClassType, DexType, ElementId, EnclosingMethodAttribute, FieldRef, InnerClassAttribute, InvokeKind,
    MethodRef, Program, ProgramClass, Use,
};

/// Counters collected while scanning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Context elements scanned
    pub contexts: usize,
    /// Uses and attribute references visited
    pub uses: usize,
    /// New edges added by this scan
    pub edges: usize,
    /// References skipped because resolution failed
    pub unresolved: usize,
}

impl AddAssign for RegistryStats {
    fn add_assign(&mut self, other: Self) {
        self.contexts += other.contexts;
        self.uses += other.uses;
        self.edges += other.edges;
        self.unresolved += other.unresolved;
    }
}

/// The element being scanned and the facts visibility decisions depend on
#[derive(Debug, Clone)]
pub struct AccessContext {
    element: ElementId,
}

impl AccessContext {
    pub fn new(element: ElementId) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &ElementId {
        &self.element
    }

    /// Class whose code performs the access
    pub fn context_type(&self) -> &ClassType {
        self.element.holder()
    }

    pub fn package(&self) -> &str {
        self.context_type().package()
    }
}

/// Access recorder for one context element
pub struct UseRegistry<'a, O: AccessOracles + ?Sized> {
    oracles: &'a O,
    graph: &'a ConstraintGraph,
    context: AccessContext,
    /// Node of the context, `None` when the context is not tracked
    node: Option<NodeRef<'a>>,
    stats: RegistryStats,
}

impl<'a, O: AccessOracles + ?Sized> UseRegistry<'a, O> {
    pub fn new(oracles: &'a O, graph: &'a ConstraintGraph, context: AccessContext) -> Self {
        let node = graph.node(context.element());
        Self {
            oracles,
            graph,
            context,
            node,
            stats: RegistryStats {
                contexts: 1,
                ..RegistryStats::default()
            },
        }
    }

    pub fn context(&self) -> &AccessContext {
        &self.context
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats
    }

    pub fn into_stats(self) -> RegistryStats {
        self.stats
    }

    /// Record one use from the context's code
    pub fn register(&mut self, use_: &Use) -> Result<(), GraphError> {
        self.stats.uses += 1;
        match use_ {
            Use::InstanceFieldRead(field)
            | Use::InstanceFieldWrite(field)
            | Use::StaticFieldRead(field)
            | Use::StaticFieldWrite(field) => self.register_field_access(field),
            Use::InvokeVirtual(method) => self.register_invoke(method, InvokeKind::Virtual),
            Use::InvokeInterface(method) => self.register_invoke(method, InvokeKind::Interface),
            Use::InvokeDirect(method) => self.register_invoke(method, InvokeKind::Direct),
            Use::InvokeStatic(method) => self.register_invoke(method, InvokeKind::Static),
            Use::InvokeSuper(method) => self.register_invoke(method, InvokeKind::Super),
            Use::NewInstance(ty) | Use::TypeReference(ty) | Use::InstanceOf(ty) | Use::CheckCast(ty) => {
                self.register_type_access(ty)
            }
            // No synthetic init-class field is modelled, so the type access is the whole constraint
            Use::InitClass(ty) => self.register_type_access(ty),
        }
    }

    pub fn register_field_access(&mut self, field: &FieldRef) -> Result<(), GraphError> {
        let resolution = self.oracles.resolve_field(field);
        self.register_member_access(resolution, &field.to_string())
            .map(|_| ())
    }

    fn register_invoke(&mut self, method: &MethodRef, kind: InvokeKind) -> Result<(), GraphError> {
        let resolution = self.oracles.resolve_method(method, kind);
        self.register_member_access(resolution, &method.to_string())
            .map(|_| ())
    }

    /// Register a method reference that is not an invoke (e.g., from an attribute).
    ///
    /// Uses the lenient resolution that accepts class and interface holders alike.
    pub fn register_method_reference(&mut self, method: &MethodRef) -> Result<Option<ResolvedMember>, GraphError> {
        let resolution = self.oracles.resolve_method(method, InvokeKind::Direct);
        self.register_member_access(resolution, &method.to_string())
    }

    fn register_member_access(
        &mut self,
        resolution: Resolution,
        reference: &str,
    ) -> Result<Option<ResolvedMember>, GraphError> {
        let (initial_holder, member) = match resolution {
            Resolution::Resolved { initial_holder, member } => (initial_holder, member),
            Resolution::Failed(failure) => {
                // A package-private target in another package fails at runtime today; moving
                // the two sides together would make it succeed. Such failures are not tracked.
                trace!(
                    "Skipping unresolved reference {} from {}: {:?}",
                    reference,
                    self.context.element(),
                    failure
                );
                self.stats.unresolved += 1;
                return Ok(None);
            }
        };

        // Access to the class named by the reference
        if let Some(class) = self.oracles.definition_for(&initial_holder) {
            self.register_class_type_access(class, false)?;
        }

        // Access to the resolved member itself
        if self.is_member_only_accessible_from_same_package(&member) {
            if let Some(target) = self.graph.node(&member.element) {
                self.add_edge(target)?;
            }
        }

        Ok(Some(member))
    }

    pub fn register_type_access(&mut self, ty: &DexType) -> Result<(), GraphError> {
        self.register_type_access_with(ty, false)
    }

    fn register_type_access_with(&mut self, ty: &DexType, always: bool) -> Result<(), GraphError> {
        // Arrays unwrap to their base type; primitives and void never produce nodes
        let Some(class_type) = ty.class_type() else {
            return Ok(());
        };
        match self.oracles.definition_for(class_type) {
            Some(class) => self.register_class_type_access(class, always),
            None => Ok(()),
        }
    }

    fn register_class_type_access(&mut self, class: &ProgramClass, always: bool) -> Result<(), GraphError> {
        // Accesses to classes that tolerate relocation (public, or protected from a subtype)
        // impose nothing
        let Some(target) = self.graph.node(&class.element()) else {
            return Ok(());
        };
        if always || self.is_class_only_accessible_from_same_package(class) {
            self.add_edge(target)?;
        }
        Ok(())
    }

    /// EnclosingMethod attribute: the enclosing class and the holder of the enclosing method
    /// are kept together with the context regardless of their visibility
    pub fn register_enclosing_method_attribute(
        &mut self,
        attribute: &EnclosingMethodAttribute,
    ) -> Result<(), GraphError> {
        if let Some(class) = &attribute.class {
            self.stats.uses += 1;
            self.register_type_access_with(&DexType::Class(class.clone()), true)?;
        }
        if let Some(method) = &attribute.method {
            self.stats.uses += 1;
            if let Some(resolved) = self.register_method_reference(method)? {
                if let Some(holder) = self.oracles.definition_for(&resolved.holder) {
                    self.register_class_type_access(holder, true)?;
                }
            }
        }
        Ok(())
    }

    /// InnerClasses attribute entry: inner and outer classes are always kept together with
    /// the context
    pub fn register_inner_class_attribute(&mut self, attribute: &InnerClassAttribute) -> Result<(), GraphError> {
        for class_type in attribute.types() {
            self.stats.uses += 1;
            self.register_type_access_with(&DexType::Class(class_type.clone()), true)?;
        }
        Ok(())
    }

    /// Tie a member context to the class that declares it
    pub fn register_holder(&mut self) -> Result<(), GraphError> {
        if self.context.element().is_class() {
            return Ok(());
        }
        if let Some(holder) = self.graph.node(&ElementId::Class(self.context.context_type().clone())) {
            self.add_edge(holder)?;
        }
        Ok(())
    }

    fn is_class_only_accessible_from_same_package(&self, class: &ProgramClass) -> bool {
        let access = class.access;
        // A class flagged private is at most package-visible at runtime; treat it as such
        if access.is_package_private() || access.is_private() {
            return true;
        }
        access.is_protected() && !self.oracles.is_subtype(self.context.context_type(), &class.class_type)
    }

    fn is_member_only_accessible_from_same_package(&self, member: &ResolvedMember) -> bool {
        let access = member.access;
        if access.is_package_private() {
            return true;
        }
        access.is_protected()
            && !self
                .oracles
                .is_valid_protected_access(&member.holder, self.context.context_type())
    }

    fn add_edge(&mut self, target: NodeRef<'_>) -> Result<(), GraphError> {
        let Some(node) = self.node else {
            return Ok(());
        };
        if node.add_neighbor(target)? {
            self.stats.edges += 1;
        }
        Ok(())
    }
}

/// Scan one class: the class itself, then each field and each method as its own context
pub fn scan_class<O>(oracles: &O, graph: &ConstraintGraph, class: &ProgramClass) -> Result<RegistryStats, GraphError>
where
    O: AccessOracles + ?Sized,
{
    let mut stats = RegistryStats::default();

    let mut registry = UseRegistry::new(oracles, graph, AccessContext::new(class.element()));
    for super_type in class.super_types() {
        registry.register_type_access(&DexType::Class(super_type.clone()))?;
    }
    if let Some(attribute) = &class.enclosing_method {
        registry.register_enclosing_method_attribute(attribute)?;
    }
    for attribute in &class.inner_classes {
        registry.register_inner_class_attribute(attribute)?;
    }
    stats += registry.into_stats();

    for field in &class.fields {
        let mut registry = UseRegistry::new(oracles, graph, AccessContext::new(ElementId::Field(class.field_ref(field))));
        registry.register_holder()?;
        registry.register_type_access(&field.field_type)?;
        stats += registry.into_stats();
    }

    for method in &class.methods {
        let reference = class.method_ref(method);
        let mut registry = UseRegistry::new(oracles, graph, AccessContext::new(ElementId::Method(reference.clone())));
        registry.register_holder()?;
        for ty in reference.proto.types() {
            registry.register_type_access(ty)?;
        }
        for use_ in &method.code {
            registry.register(use_)?;
        }
        stats += registry.into_stats();
    }

    Ok(stats)
}

/// Build the constraint graph for a program, in parallel when configured
pub fn build_constraint_graph<O>(
    program: &Program,
    oracles: &O,
    config: &GraphConfig,
) -> Result<(ConstraintGraph, RegistryStats), GraphError>
where
    O: AccessOracles + ?Sized,
{
    if config.parallel {
        ParallelGraphBuilder::new(oracles).build_from_program(program, config)
    } else {
        let mut builder = GraphBuilder::new(oracles, program, config);
        for class in program.program_classes() {
            builder.process_class(class)?;
        }
        Ok(builder.build())
    }
}
