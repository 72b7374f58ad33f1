//! Loading raw rule catalogs from YAML bytes, embedded or external.

use crate::error::CatalogError;
use crate::rule::{RawRule, RuleCatalogDocument};

/// The rule catalog embedded at compile time, used until (and unless) a
/// caller warms the resolver with an external catalog.
pub const EMBEDDED_RULES_YAML: &str = include_str!("../../assets/rules.default.yaml");

/// Parse a rule catalog document from YAML bytes.
pub fn parse_rules(yaml: &str) -> Result<Vec<RawRule>, CatalogError> {
    let document: RuleCatalogDocument = serde_yaml::from_str(yaml)?;
    Ok(document.into_rules())
}

/// Load the embedded default rule set.
pub fn embedded_rules() -> Vec<RawRule> {
    parse_rules(EMBEDDED_RULES_YAML).expect("embedded rule catalog must always parse")
}

/// Well-known filename for an external rule catalog under a cache directory.
pub const EXTERNAL_RULES_FILENAME: &str = "fingerprint.cache";

/// Read and parse an external rule catalog from `<cache_dir>/fingerprint.cache`.
pub fn load_external_rules(cache_dir: &std::path::Path) -> Result<Vec<RawRule>, CatalogError> {
    let path = cache_dir.join(EXTERNAL_RULES_FILENAME);
    let bytes = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_rules(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses_and_is_nonempty() {
        let rules = embedded_rules();
        assert!(!rules.is_empty());
    }

    #[test]
    fn bare_sequence_and_wrapped_mapping_both_parse() {
        let bare = "- id: a\n  protocol: http\n  product: A\n  match: foo\n";
        let wrapped = "rules:\n  - id: a\n    protocol: http\n    product: A\n    match: foo\n";
        assert_eq!(parse_rules(bare).unwrap().len(), 1);
        assert_eq!(parse_rules(wrapped).unwrap().len(), 1);
    }

    #[test]
    fn missing_external_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_external_rules(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
