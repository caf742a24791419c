use serde::{Deserialize, Serialize};
use std::fmt;

use super::ProgramError;

/// Visibility modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    PackagePrivate, // Java default
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::PackagePrivate => "package-private",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access flags of a class or member, written as a modifier list in program descriptions
/// (`access: [public, final]`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AccessFlags {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_interface: bool,
    pub is_enum: bool,
    pub is_annotation: bool,
    pub is_synthetic: bool,
}

impl AccessFlags {
    pub fn public() -> Self {
        Self {
            visibility: Visibility::Public,
            ..Self::default()
        }
    }

    pub fn package_private() -> Self {
        Self::default()
    }

    pub fn protected() -> Self {
        Self {
            visibility: Visibility::Protected,
            ..Self::default()
        }
    }

    pub fn private() -> Self {
        Self {
            visibility: Visibility::Private,
            ..Self::default()
        }
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn with_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_interface(mut self) -> Self {
        self.is_interface = true;
        self.is_abstract = true;
        self
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_protected(&self) -> bool {
        self.visibility == Visibility::Protected
    }

    pub fn is_package_private(&self) -> bool {
        self.visibility == Visibility::PackagePrivate
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    /// Parse Java-style modifiers; anything without an explicit visibility is package-private
    pub fn from_modifiers<S: AsRef<str>>(modifiers: &[S]) -> Result<Self, ProgramError> {
        let mut flags = AccessFlags::default();
        let mut visibility: Option<Visibility> = None;

        for modifier in modifiers {
            let modifier = modifier.as_ref();
            let explicit = match modifier {
                "public" => Some(Visibility::Public),
                "protected" => Some(Visibility::Protected),
                "private" => Some(Visibility::Private),
                "package-private" => Some(Visibility::PackagePrivate),
                "static" => {
                    flags.is_static = true;
                    None
                }
                "final" => {
                    flags.is_final = true;
                    None
                }
                "abstract" => {
                    flags.is_abstract = true;
                    None
                }
                "interface" => {
                    flags.is_interface = true;
                    flags.is_abstract = true;
                    None
                }
                "enum" => {
                    flags.is_enum = true;
                    None
                }
                "annotation" => {
                    flags.is_annotation = true;
                    flags.is_interface = true;
                    flags.is_abstract = true;
                    None
                }
                "synthetic" => {
                    flags.is_synthetic = true;
                    None
                }
                other => return Err(ProgramError::UnknownModifier(other.to_string())),
            };

            if let Some(explicit) = explicit {
                if visibility.is_some_and(|v| v != explicit) {
                    return Err(ProgramError::ConflictingVisibility(
                        modifiers.iter().map(|m| m.as_ref().to_string()).collect(),
                    ));
                }
                visibility = Some(explicit);
            }
        }

        flags.visibility = visibility.unwrap_or_default();
        Ok(flags)
    }

    pub fn to_modifiers(&self) -> Vec<String> {
        let mut modifiers = Vec::new();
        if self.visibility != Visibility::PackagePrivate {
            modifiers.push(self.visibility.as_str().to_string());
        }
        if self.is_static {
            modifiers.push("static".to_string());
        }
        if self.is_final {
            modifiers.push("final".to_string());
        }
        if self.is_annotation {
            modifiers.push("annotation".to_string());
        } else if self.is_interface {
            modifiers.push("interface".to_string());
        } else if self.is_abstract {
            modifiers.push("abstract".to_string());
        }
        if self.is_enum {
            modifiers.push("enum".to_string());
        }
        if self.is_synthetic {
            modifiers.push("synthetic".to_string());
        }
        modifiers
    }
}

impl TryFrom<Vec<String>> for AccessFlags {
    type Error = ProgramError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        AccessFlags::from_modifiers(&value)
    }
}

impl From<AccessFlags> for Vec<String> {
    fn from(value: AccessFlags) -> Self {
        value.to_modifiers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_modifiers() {
        let flags = AccessFlags::from_modifiers(&["public", "final"]).unwrap();
        assert!(flags.is_public());
        assert!(flags.is_final);

        let default = AccessFlags::from_modifiers::<&str>(&[]).unwrap();
        assert!(default.is_package_private());
    }

    #[test]
    fn test_interface_implies_abstract() {
        let flags = AccessFlags::from_modifiers(&["public", "interface"]).unwrap();
        assert!(flags.is_interface);
        assert!(flags.is_abstract);
    }

    #[test]
    fn test_rejects_unknown_and_conflicting() {
        assert!(matches!(
            AccessFlags::from_modifiers(&["volatile-ish"]),
            Err(ProgramError::UnknownModifier(_))
        ));
        assert!(matches!(
            AccessFlags::from_modifiers(&["public", "private"]),
            Err(ProgramError::ConflictingVisibility(_))
        ));
    }

    #[test]
    fn test_modifier_round_trip_keeps_flags() {
        let flags = AccessFlags::protected().with_static().with_final();
        let parsed = AccessFlags::from_modifiers(&flags.to_modifiers()).unwrap();
        assert_eq!(parsed, flags);
    }
}
