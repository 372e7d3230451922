use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Page layouts the service can render. Every accepted identifier renders the
/// full-bleed page; the older names are kept as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    #[default]
    FullBleed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown layout '{0}' (expected one of: default, modern, classic, full_bleed)")]
pub struct LayoutParseError(pub String);

impl LayoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutKind::FullBleed => "full_bleed",
        }
    }
}

impl FromStr for LayoutKind {
    type Err = LayoutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "modern" | "classic" | "full_bleed" => Ok(LayoutKind::FullBleed),
            _ => Err(LayoutParseError(s.to_string())),
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_full_bleed() {
        for name in ["default", "modern", "classic", "full_bleed", " Full_Bleed "] {
            assert_eq!(name.parse::<LayoutKind>().unwrap(), LayoutKind::FullBleed);
        }
    }

    #[test]
    fn test_unknown_layout_rejected() {
        let err = "magazine".parse::<LayoutKind>().unwrap_err();
        assert_eq!(err, LayoutParseError("magazine".to_string()));
        assert!(err.to_string().contains("magazine"));
        assert!("".parse::<LayoutKind>().is_err());
    }

    #[test]
    fn test_artifact_name_is_full_bleed() {
        assert_eq!(LayoutKind::default().to_string(), "full_bleed");
    }
}
