use core::str::FromStr;
use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use screengate_core::DomainError;

/// Role type of a user ("administrador", "coordenador", ...).
///
/// Role types are opaque strings at this layer; they only serve as template
/// lookup keys and are matched exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleType(Cow<'static, str>);

impl RoleType {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoleType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seniority level within a role type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoleLevel {
    I,
    II,
    III,
}

impl RoleLevel {
    pub const ALL: [RoleLevel; 3] = [RoleLevel::I, RoleLevel::II, RoleLevel::III];

    pub fn as_str(self) -> &'static str {
        match self {
            RoleLevel::I => "I",
            RoleLevel::II => "II",
            RoleLevel::III => "III",
        }
    }
}

impl core::fmt::Display for RoleLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "I" | "1" => Ok(RoleLevel::I),
            "II" | "2" => Ok(RoleLevel::II),
            "III" | "3" => Ok(RoleLevel::III),
            _ => Err(DomainError::validation(format!("unknown role level '{s}'"))),
        }
    }
}

/// Template lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleKey {
    pub role_type: RoleType,
    pub role_level: RoleLevel,
}

impl RoleKey {
    pub fn new(role_type: RoleType, role_level: RoleLevel) -> Self {
        Self {
            role_type,
            role_level,
        }
    }
}

impl core::fmt::Display for RoleKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.role_type, self.role_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roman_and_arabic_levels() {
        assert_eq!("ii".parse::<RoleLevel>().unwrap(), RoleLevel::II);
        assert_eq!("3".parse::<RoleLevel>().unwrap(), RoleLevel::III);
        assert!("IV".parse::<RoleLevel>().is_err());
    }

    #[test]
    fn role_key_displays_type_and_level() {
        let key = RoleKey::new(RoleType::new("supervisor"), RoleLevel::II);
        assert_eq!(key.to_string(), "supervisor/II");
    }
}
