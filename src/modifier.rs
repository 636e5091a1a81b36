//! Named value transforms applied to a capture before coercion.
//!
//! Modifiers are written as a `:Name()` suffix on the last step of a
//! placeholder path, e.g. `#{WhoisServerRecord.TLD:ToLower()}`.

use convert_case::{Case, Casing};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Closed set of transforms a placeholder may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    #[default]
    None,
    /// Case-fold to lowercase
    ToLower,
    /// Case-fold to uppercase
    ToUpper,
    /// Strip all surrounding whitespace, including newlines
    Trim,
}

impl Modifier {
    /// Apply the transform to a captured value
    pub fn apply(self, value: &str) -> String {
        match self {
            Modifier::None => value.to_string(),
            Modifier::ToLower => value.to_lowercase(),
            Modifier::ToUpper => value.to_uppercase(),
            Modifier::Trim => value.trim().to_string(),
        }
    }

    /// Name as written in templates
    pub fn name(self) -> &'static str {
        match self {
            Modifier::None => "None",
            Modifier::ToLower => "ToLower",
            Modifier::ToUpper => "ToUpper",
            Modifier::Trim => "Trim",
        }
    }
}

impl FromStr for Modifier {
    type Err = String;

    /// Parse a modifier name, ignoring case style (`ToLower`, `toLower`, `to_lower`)
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_case(Case::Snake).as_str() {
            "to_lower" | "lower" | "lowercase" => Ok(Modifier::ToLower),
            "to_upper" | "upper" | "uppercase" => Ok(Modifier::ToUpper),
            "trim" => Ok(Modifier::Trim),
            "none" => Ok(Modifier::None),
            _ => Err(format!("unknown modifier '{}'", name)),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.name())
    }
}
