// Outgoing references made by method code

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{DexType, FieldRef, MethodRef};

/// How a method reference is dispatched at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvokeKind {
    Virtual,
    Interface,
    Direct,
    Static,
    Super,
}

/// One reference from a method body to another program element.
///
/// Written in program descriptions as a single-key map, e.g. `invoke-super: com.example.A#foo():void`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Use {
    InstanceFieldRead(FieldRef),
    InstanceFieldWrite(FieldRef),
    StaticFieldRead(FieldRef),
    StaticFieldWrite(FieldRef),
    InvokeVirtual(MethodRef),
    InvokeDirect(MethodRef),
    InvokeStatic(MethodRef),
    InvokeInterface(MethodRef),
    InvokeSuper(MethodRef),
    NewInstance(DexType),
    TypeReference(DexType),
    InstanceOf(DexType),
    CheckCast(DexType),
    /// Class initialization barrier for a type
    InitClass(DexType),
}

impl Use {
    /// Class instantiated by this use, if any
    pub fn instantiated_type(&self) -> Option<&DexType> {
        match self {
            Use::NewInstance(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Use::InstanceFieldRead(_) => "instance-field-read",
            Use::InstanceFieldWrite(_) => "instance-field-write",
            Use::StaticFieldRead(_) => "static-field-read",
            Use::StaticFieldWrite(_) => "static-field-write",
            Use::InvokeVirtual(_) => "invoke-virtual",
            Use::InvokeDirect(_) => "invoke-direct",
            Use::InvokeStatic(_) => "invoke-static",
            Use::InvokeInterface(_) => "invoke-interface",
            Use::InvokeSuper(_) => "invoke-super",
            Use::NewInstance(_) => "new-instance",
            Use::TypeReference(_) => "type-reference",
            Use::InstanceOf(_) => "instance-of",
            Use::CheckCast(_) => "check-cast",
            Use::InitClass(_) => "init-class",
        }
    }
}

impl fmt::Display for Use {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Use::InstanceFieldRead(field)
            | Use::InstanceFieldWrite(field)
            | Use::StaticFieldRead(field)
            | Use::StaticFieldWrite(field) => write!(f, "{} {}", self.name(), field),
            Use::InvokeVirtual(method)
            | Use::InvokeDirect(method)
            | Use::InvokeStatic(method)
            | Use::InvokeInterface(method)
            | Use::InvokeSuper(method) => write!(f, "{} {}", self.name(), method),
            Use::NewInstance(ty)
            | Use::TypeReference(ty)
            | Use::InstanceOf(ty)
            | Use::CheckCast(ty)
            | Use::InitClass(ty) => write!(f, "{} {}", self.name(), ty),
        }
    }
}
