// Program model - the in-memory representation handed over by the front end

mod access;
mod code;
mod loader;
mod types;

pub use access::{AccessFlags, Visibility};
pub use code::{InvokeKind, Use};
pub use loader::ProgramDescription;
pub use types::{ClassType, DexType, ElementId, FieldRef, MethodRef, ParseReferenceError, PrimitiveType, Proto};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors for program descriptions that violate model invariants
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error("class {0} is defined more than once")]
    DuplicateClass(ClassType),
    #[error("{holder} declares {member} more than once")]
    DuplicateMember { holder: ClassType, member: String },
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
    #[error("conflicting visibility modifiers: {0:?}")]
    ConflictingVisibility(Vec<String>),
    #[error("class {0} lists itself as a super type")]
    SelfInheritance(ClassType),
}

/// Where a class definition comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassOrigin {
    /// Part of the program being optimized
    #[default]
    Program,
    /// Library or classpath class: resolvable, never rewritten
    Library,
}

/// EnclosingMethod attribute of a local or anonymous class
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnclosingMethodAttribute {
    #[serde(default)]
    pub class: Option<ClassType>,
    #[serde(default)]
    pub method: Option<MethodRef>,
}

/// One entry of an InnerClasses attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerClassAttribute {
    pub inner: ClassType,
    #[serde(default)]
    pub outer: Option<ClassType>,
}

impl InnerClassAttribute {
    pub fn types(&self) -> impl Iterator<Item = &ClassType> {
        std::iter::once(&self.inner).chain(self.outer.iter())
    }
}

/// A field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: DexType,
    #[serde(default)]
    pub access: AccessFlags,
}

/// A method definition; `code` is empty for abstract and native methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramMethod {
    pub name: String,
    #[serde(default)]
    pub params: Vec<DexType>,
    #[serde(default = "void_type")]
    pub returns: DexType,
    #[serde(default)]
    pub access: AccessFlags,
    #[serde(default)]
    pub code: Vec<Use>,
}

fn void_type() -> DexType {
    DexType::Void
}

impl ProgramMethod {
    pub fn new(name: impl Into<String>, proto: Proto, access: AccessFlags) -> Self {
        Self {
            name: name.into(),
            params: proto.parameters,
            returns: proto.return_type,
            access,
            code: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: Vec<Use>) -> Self {
        self.code = code;
        self
    }

    pub fn proto(&self) -> Proto {
        Proto::new(self.params.clone(), self.returns.clone())
    }

    pub fn matches(&self, name: &str, proto: &Proto) -> bool {
        self.name == name && self.params == proto.parameters && self.returns == proto.return_type
    }
}

/// A class definition with its members and structural attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramClass {
    #[serde(rename = "type")]
    pub class_type: ClassType,
    #[serde(default)]
    pub access: AccessFlags,
    #[serde(default, rename = "super")]
    pub super_type: Option<ClassType>,
    #[serde(default)]
    pub interfaces: Vec<ClassType>,
    #[serde(default)]
    pub fields: Vec<ProgramField>,
    #[serde(default)]
    pub methods: Vec<ProgramMethod>,
    #[serde(default)]
    pub enclosing_method: Option<EnclosingMethodAttribute>,
    #[serde(default)]
    pub inner_classes: Vec<InnerClassAttribute>,
    #[serde(default)]
    pub origin: ClassOrigin,
    /// Instantiated by code outside the program (reflection, native code, the manifest)
    #[serde(default)]
    pub instantiated: bool,
}

impl ProgramClass {
    pub fn new(class_type: ClassType, access: AccessFlags) -> Self {
        Self {
            class_type,
            access,
            super_type: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            enclosing_method: None,
            inner_classes: Vec::new(),
            origin: ClassOrigin::Program,
            instantiated: false,
        }
    }

    pub fn with_super(mut self, super_type: ClassType) -> Self {
        self.super_type = Some(super_type);
        self
    }

    pub fn with_interface(mut self, interface: ClassType) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_field(mut self, field: ProgramField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: ProgramMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_origin(mut self, origin: ClassOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn is_program_class(&self) -> bool {
        self.origin == ClassOrigin::Program
    }

    pub fn is_interface(&self) -> bool {
        self.access.is_interface
    }

    pub fn element(&self) -> ElementId {
        ElementId::Class(self.class_type.clone())
    }

    pub fn field_ref(&self, field: &ProgramField) -> FieldRef {
        FieldRef::new(self.class_type.clone(), field.name.clone(), field.field_type.clone())
    }

    pub fn method_ref(&self, method: &ProgramMethod) -> MethodRef {
        MethodRef::new(self.class_type.clone(), method.name.clone(), method.proto())
    }

    pub fn lookup_field(&self, name: &str, field_type: &DexType) -> Option<&ProgramField> {
        self.fields
            .iter()
            .find(|f| f.name == name && &f.field_type == field_type)
    }

    pub fn lookup_method(&self, name: &str, proto: &Proto) -> Option<&ProgramMethod> {
        self.methods.iter().find(|m| m.matches(name, proto))
    }

    /// Super class followed by directly implemented interfaces
    pub fn super_types(&self) -> impl Iterator<Item = &ClassType> {
        self.super_type.iter().chain(self.interfaces.iter())
    }

    /// This class and all of its members as graph elements
    pub fn elements(&self) -> Vec<ElementId> {
        let mut elements = Vec::with_capacity(1 + self.fields.len() + self.methods.len());
        elements.push(self.element());
        elements.extend(self.fields.iter().map(|f| ElementId::Field(self.field_ref(f))));
        elements.extend(self.methods.iter().map(|m| ElementId::Method(self.method_ref(m))));
        elements
    }

    pub fn member_count(&self) -> usize {
        self.fields.len() + self.methods.len()
    }

    fn validate(&self) -> Result<(), ProgramError> {
        if self.super_types().any(|t| t == &self.class_type) {
            return Err(ProgramError::SelfInheritance(self.class_type.clone()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert((field.name.as_str(), field.field_type.clone())) {
                return Err(ProgramError::DuplicateMember {
                    holder: self.class_type.clone(),
                    member: self.field_ref(field).to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        for method in &self.methods {
            if !seen.insert((method.name.as_str(), method.proto())) {
                return Err(ProgramError::DuplicateMember {
                    holder: self.class_type.clone(),
                    member: self.method_ref(method).to_string(),
                });
            }
        }

        Ok(())
    }
}

/// All class definitions known to one optimization pass
#[derive(Debug, Clone, Default)]
pub struct Program {
    classes: Vec<ProgramClass>,
    index: HashMap<ClassType, usize>,
}

impl Program {
    /// Build a program, rejecting duplicate classes and duplicate members
    pub fn new(classes: Vec<ProgramClass>) -> Result<Self, ProgramError> {
        let mut index = HashMap::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            class.validate()?;
            if index.insert(class.class_type.clone(), i).is_some() {
                return Err(ProgramError::DuplicateClass(class.class_type.clone()));
            }
        }
        Ok(Self { classes, index })
    }

    /// All classes, program and library, in definition order
    pub fn classes(&self) -> impl Iterator<Item = &ProgramClass> {
        self.classes.iter()
    }

    pub fn program_classes(&self) -> impl Iterator<Item = &ProgramClass> {
        self.classes.iter().filter(|c| c.is_program_class())
    }

    pub fn definition_for(&self, class_type: &ClassType) -> Option<&ProgramClass> {
        self.index.get(class_type).map(|&i| &self.classes[i])
    }

    pub fn program_definition_for(&self, class_type: &ClassType) -> Option<&ProgramClass> {
        self.definition_for(class_type).filter(|c| c.is_program_class())
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn program_class_count(&self) -> usize {
        self.program_classes().count()
    }
}
