use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Name of a documented crate as it appears as a registry key (e.g. `ledger_core`).
///
/// Registry keys use the underscore form of the crate name, matching the
/// per-crate directory names inside a generated documentation tree.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrateName(pub String);

/// Fully-qualified path of an implementing type (e.g. `ledger_core::frame::Header`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypePath(pub String);

/// Fully-qualified path of the trait a registry asset describes
/// (e.g. `core::marker::Copy`).
///
/// The path doubles as the asset's address: segments map onto directories
/// under `implementors/`, the final segment onto the `trait.<Name>.js` file.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitPath(pub String);

impl TraitPath {
    /// Final path segment, i.e. the trait's bare name.
    pub fn name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(self.0.as_str())
    }

    /// Iterate the `::`-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split("::")
    }
}

impl fmt::Display for TraitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Item kind of an implementing type, mirrored from the anchor `class`
/// vocabulary used in record text.
///
/// Known variants keep serialization consistent; `Other` preserves forward
/// compatibility with generators that introduce new item kinds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TargetKind {
    Struct,
    Enum,
    Union,
    Trait,
    TypeAlias,
    Primitive,
    Other(String),
}

impl Serialize for TargetKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TargetKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_str(&value))
    }
}

impl TargetKind {
    pub fn as_str(&self) -> &str {
        match self {
            TargetKind::Struct => "struct",
            TargetKind::Enum => "enum",
            TargetKind::Union => "union",
            TargetKind::Trait => "trait",
            TargetKind::TypeAlias => "type",
            TargetKind::Primitive => "primitive",
            TargetKind::Other(value) => value.as_str(),
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "struct" => TargetKind::Struct,
            "enum" => TargetKind::Enum,
            "union" => TargetKind::Union,
            "trait" => TargetKind::Trait,
            "type" => TargetKind::TypeAlias,
            "primitive" => TargetKind::Primitive,
            other => TargetKind::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_kind_round_trips_known_and_unknown() {
        let known = TargetKind::TypeAlias;
        let json = serde_json::to_string(&known).unwrap();
        assert_eq!(json.trim_matches('"'), "type");
        let back: TargetKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, known);

        let custom_json = "\"attr\"";
        let parsed: TargetKind = serde_json::from_str(custom_json).unwrap();
        assert_eq!(parsed, TargetKind::Other("attr".to_string()));
        let serialized = serde_json::to_string(&parsed).unwrap();
        assert_eq!(serialized, custom_json);
    }

    #[test]
    fn trait_path_name_and_segments() {
        let path = TraitPath("core::marker::Copy".to_string());
        assert_eq!(path.name(), "Copy");
        assert_eq!(path.segments().collect::<Vec<_>>(), ["core", "marker", "Copy"]);

        let bare = TraitPath("Copy".to_string());
        assert_eq!(bare.name(), "Copy");
    }

    #[test]
    fn crate_name_and_type_path_round_trip() {
        let name = CrateName("ledger_core".to_string());
        let serialized = serde_json::to_string(&name).unwrap();
        assert_eq!(serialized, "\"ledger_core\"");
        let parsed: CrateName = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed, name);

        let path = TypePath("ledger_core::frame::Header".to_string());
        let serialized_path = serde_json::to_string(&path).unwrap();
        assert_eq!(serialized_path, "\"ledger_core::frame::Header\"");
        let parsed_path: TypePath = serde_json::from_str(&serialized_path).unwrap();
        assert_eq!(parsed_path, path);
    }
}
