// Type and member references
//
// References are written in Java source form so that program descriptions stay readable:
//   class:  com.example.Outer$Inner
//   type:   int, void, com.example.Foo, com.example.Foo[][]
//   field:  com.example.Foo#count:int
//   method: com.example.Foo#bar(int,java.lang.String):void

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error raised when a textual reference cannot be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {what} reference '{input}': {reason}")]
pub struct ParseReferenceError {
    pub what: &'static str,
    pub input: String,
    pub reason: &'static str,
}

impl ParseReferenceError {
    fn new(what: &'static str, input: &str, reason: &'static str) -> Self {
        Self {
            what,
            input: input.to_string(),
            reason,
        }
    }
}

/// Binary name of a class (e.g., "com.example.Outer$Inner")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassType(String);

impl ClassType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Package of the class, empty for the default package
    pub fn package(&self) -> &str {
        self.0.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }

    /// Name without the package (inner classes keep their `$` suffix)
    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, name)| name).unwrap_or(&self.0)
    }

    pub fn same_package(&self, other: &ClassType) -> bool {
        self.package() == other.package()
    }

    /// JVM descriptor, e.g. `Lcom/example/Foo;`
    pub fn descriptor(&self) -> String {
        format!("L{};", self.0.replace('.', "/"))
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClassType {
    type Err = ParseReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseReferenceError::new("class", s, "empty name"));
        }
        if s.starts_with('.') || s.ends_with('.') || s.contains("..") {
            return Err(ParseReferenceError::new("class", s, "malformed package"));
        }
        if s.chars().any(|c| c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | '#' | ':' | ';' | '/')) {
            return Err(ParseReferenceError::new("class", s, "illegal character"));
        }
        Ok(ClassType(s.to_string()))
    }
}

impl TryFrom<String> for ClassType {
    type Error = ParseReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClassType> for String {
    fn from(value: ClassType) -> Self {
        value.0
    }
}

/// JVM primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn java_name(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    pub fn descriptor(&self) -> char {
        match self {
            PrimitiveType::Boolean => 'Z',
            PrimitiveType::Byte => 'B',
            PrimitiveType::Char => 'C',
            PrimitiveType::Short => 'S',
            PrimitiveType::Int => 'I',
            PrimitiveType::Long => 'J',
            PrimitiveType::Float => 'F',
            PrimitiveType::Double => 'D',
        }
    }

    fn from_java_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => PrimitiveType::Boolean,
            "byte" => PrimitiveType::Byte,
            "char" => PrimitiveType::Char,
            "short" => PrimitiveType::Short,
            "int" => PrimitiveType::Int,
            "long" => PrimitiveType::Long,
            "float" => PrimitiveType::Float,
            "double" => PrimitiveType::Double,
            _ => return None,
        })
    }

    fn from_descriptor(c: char) -> Option<Self> {
        Some(match c {
            'Z' => PrimitiveType::Boolean,
            'B' => PrimitiveType::Byte,
            'C' => PrimitiveType::Char,
            'S' => PrimitiveType::Short,
            'I' => PrimitiveType::Int,
            'J' => PrimitiveType::Long,
            'F' => PrimitiveType::Float,
            'D' => PrimitiveType::Double,
            _ => return None,
        })
    }
}

/// A value type as it appears in signatures and instructions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DexType {
    Void,
    Primitive(PrimitiveType),
    Class(ClassType),
    /// Array of `element`; the element type is never itself an array
    Array { dimensions: u8, element: Box<DexType> },
}

impl DexType {
    pub fn class(name: impl Into<String>) -> Self {
        DexType::Class(ClassType::new(name))
    }

    pub fn array_of(element: DexType, dimensions: u8) -> Self {
        match element {
            DexType::Array { dimensions: inner, element } => DexType::Array {
                dimensions: inner.saturating_add(dimensions),
                element,
            },
            other => DexType::Array {
                dimensions,
                element: Box::new(other),
            },
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, DexType::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, DexType::Primitive(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, DexType::Array { .. })
    }

    /// Strip array dimensions
    pub fn base_type(&self) -> &DexType {
        match self {
            DexType::Array { element, .. } => element,
            other => other,
        }
    }

    /// The class this type mentions after unwrapping arrays, if any
    pub fn class_type(&self) -> Option<&ClassType> {
        match self.base_type() {
            DexType::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Rebuild this type with its base class replaced
    pub fn map_class(&self, f: impl Fn(&ClassType) -> ClassType) -> DexType {
        match self {
            DexType::Class(class) => DexType::Class(f(class)),
            DexType::Array { dimensions, element } => DexType::Array {
                dimensions: *dimensions,
                element: Box::new(element.map_class(f)),
            },
            other => other.clone(),
        }
    }

    pub fn descriptor(&self) -> String {
        match self {
            DexType::Void => "V".to_string(),
            DexType::Primitive(p) => p.descriptor().to_string(),
            DexType::Class(c) => c.descriptor(),
            DexType::Array { dimensions, element } => {
                format!("{}{}", "[".repeat(*dimensions as usize), element.descriptor())
            }
        }
    }

    /// Parse a JVM descriptor such as `[[Lcom/example/Foo;` or `I`
    pub fn from_descriptor(descriptor: &str) -> Result<Self, ParseReferenceError> {
        let dimensions = descriptor.chars().take_while(|&c| c == '[').count();
        let rest = &descriptor[dimensions..];
        let base = match rest.chars().next() {
            Some('V') if rest.len() == 1 => DexType::Void,
            Some('L') if rest.ends_with(';') && rest.len() > 2 => {
                DexType::Class(rest[1..rest.len() - 1].replace('/', ".").parse()?)
            }
            Some(c) if rest.len() == 1 => match PrimitiveType::from_descriptor(c) {
                Some(p) => DexType::Primitive(p),
                None => return Err(ParseReferenceError::new("type", descriptor, "unknown descriptor")),
            },
            _ => return Err(ParseReferenceError::new("type", descriptor, "unknown descriptor")),
        };

        if dimensions == 0 {
            return Ok(base);
        }
        if base.is_void() {
            return Err(ParseReferenceError::new("type", descriptor, "array of void"));
        }
        let dimensions = u8::try_from(dimensions)
            .map_err(|_| ParseReferenceError::new("type", descriptor, "too many dimensions"))?;
        Ok(DexType::array_of(base, dimensions))
    }
}

impl fmt::Display for DexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DexType::Void => f.write_str("void"),
            DexType::Primitive(p) => f.write_str(p.java_name()),
            DexType::Class(c) => write!(f, "{}", c),
            DexType::Array { dimensions, element } => {
                write!(f, "{}{}", element, "[]".repeat(*dimensions as usize))
            }
        }
    }
}

impl FromStr for DexType {
    type Err = ParseReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut base = s;
        let mut dimensions = 0usize;
        while let Some(stripped) = base.strip_suffix("[]") {
            base = stripped.trim_end();
            dimensions += 1;
        }

        let base_type = if base == "void" {
            DexType::Void
        } else if let Some(p) = PrimitiveType::from_java_name(base) {
            DexType::Primitive(p)
        } else {
            DexType::Class(base.parse()?)
        };

        if dimensions == 0 {
            return Ok(base_type);
        }
        if base_type.is_void() {
            return Err(ParseReferenceError::new("type", s, "array of void"));
        }
        let dimensions = u8::try_from(dimensions)
            .map_err(|_| ParseReferenceError::new("type", s, "too many dimensions"))?;
        Ok(DexType::array_of(base_type, dimensions))
    }
}

impl TryFrom<String> for DexType {
    type Error = ParseReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DexType> for String {
    fn from(value: DexType) -> Self {
        value.to_string()
    }
}

/// Method prototype: parameter and return types
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Proto {
    pub parameters: Vec<DexType>,
    pub return_type: DexType,
}

impl Proto {
    pub fn new(parameters: Vec<DexType>, return_type: DexType) -> Self {
        Self {
            parameters,
            return_type,
        }
    }

    pub fn void() -> Self {
        Self::new(Vec::new(), DexType::Void)
    }

    /// All types mentioned by this prototype, return type last
    pub fn types(&self) -> impl Iterator<Item = &DexType> {
        self.parameters.iter().chain(std::iter::once(&self.return_type))
    }

    pub fn map_classes(&self, f: impl Fn(&ClassType) -> ClassType) -> Proto {
        Proto {
            parameters: self.parameters.iter().map(|p| p.map_class(&f)).collect(),
            return_type: self.return_type.map_class(&f),
        }
    }
}

impl fmt::Display for Proto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();
        write!(f, "({}):{}", params.join(","), self.return_type)
    }
}

/// Reference to a field: holder, name and type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldRef {
    pub holder: ClassType,
    pub name: String,
    pub field_type: DexType,
}

impl FieldRef {
    pub fn new(holder: ClassType, name: impl Into<String>, field_type: DexType) -> Self {
        Self {
            holder,
            name: name.into(),
            field_type,
        }
    }

    /// Same name and type on another holder
    pub fn with_holder(&self, holder: ClassType) -> Self {
        Self {
            holder,
            ..self.clone()
        }
    }

    pub fn matches(&self, name: &str, field_type: &DexType) -> bool {
        self.name == name && &self.field_type == field_type
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}:{}", self.holder, self.name, self.field_type)
    }
}

impl FromStr for FieldRef {
    type Err = ParseReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (holder, rest) = s
            .split_once('#')
            .ok_or_else(|| ParseReferenceError::new("field", s, "missing '#'"))?;
        let (name, field_type) = rest
            .split_once(':')
            .ok_or_else(|| ParseReferenceError::new("field", s, "missing ':' before type"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ParseReferenceError::new("field", s, "empty name"));
        }
        let field_type: DexType = field_type.parse()?;
        if field_type.is_void() {
            return Err(ParseReferenceError::new("field", s, "void field"));
        }
        Ok(FieldRef::new(holder.parse()?, name, field_type))
    }
}

impl TryFrom<String> for FieldRef {
    type Error = ParseReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldRef> for String {
    fn from(value: FieldRef) -> Self {
        value.to_string()
    }
}

/// Reference to a method: holder, name and prototype
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodRef {
    pub holder: ClassType,
    pub name: String,
    pub proto: Proto,
}

impl MethodRef {
    pub fn new(holder: ClassType, name: impl Into<String>, proto: Proto) -> Self {
        Self {
            holder,
            name: name.into(),
            proto,
        }
    }

    pub fn with_holder(&self, holder: ClassType) -> Self {
        Self {
            holder,
            ..self.clone()
        }
    }

    pub fn is_initializer(&self) -> bool {
        self.name == "<init>" || self.name == "<clinit>"
    }

    /// Same name and prototype, ignoring the holder
    pub fn matches(&self, name: &str, proto: &Proto) -> bool {
        self.name == name && &self.proto == proto
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}{}", self.holder, self.name, self.proto)
    }
}

impl FromStr for MethodRef {
    type Err = ParseReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (holder, rest) = s
            .split_once('#')
            .ok_or_else(|| ParseReferenceError::new("method", s, "missing '#'"))?;
        let (name, rest) = rest
            .split_once('(')
            .ok_or_else(|| ParseReferenceError::new("method", s, "missing '('"))?;
        let (params, return_type) = rest
            .split_once("):")
            .ok_or_else(|| ParseReferenceError::new("method", s, "missing '):' before return type"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ParseReferenceError::new("method", s, "empty name"));
        }

        let parameters = if params.trim().is_empty() {
            Vec::new()
        } else {
            params
                .split(',')
                .map(|p| {
                    let param: DexType = p.parse()?;
                    if param.is_void() {
                        Err(ParseReferenceError::new("method", s, "void parameter"))
                    } else {
                        Ok(param)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(MethodRef::new(
            holder.parse()?,
            name,
            Proto::new(parameters, return_type.parse()?),
        ))
    }
}

impl TryFrom<String> for MethodRef {
    type Error = ParseReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MethodRef> for String {
    fn from(value: MethodRef) -> Self {
        value.to_string()
    }
}

/// Identity of one program element: a class or one of its members
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementId {
    Class(ClassType),
    Field(FieldRef),
    Method(MethodRef),
}

impl ElementId {
    /// The class itself, or the holder of a member
    pub fn holder(&self) -> &ClassType {
        match self {
            ElementId::Class(class) => class,
            ElementId::Field(field) => &field.holder,
            ElementId::Method(method) => &method.holder,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self, ElementId::Class(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ElementId::Class(_) => "class",
            ElementId::Field(_) => "field",
            ElementId::Method(_) => "method",
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Class(class) => write!(f, "{}", class),
            ElementId::Field(field) => write!(f, "{}", field),
            ElementId::Method(method) => write!(f, "{}", method),
        }
    }
}

impl From<ClassType> for ElementId {
    fn from(value: ClassType) -> Self {
        ElementId::Class(value)
    }
}

impl From<FieldRef> for ElementId {
    fn from(value: FieldRef) -> Self {
        ElementId::Field(value)
    }
}

impl From<MethodRef> for ElementId {
    fn from(value: MethodRef) -> Self {
        ElementId::Method(value)
    }
}
