//! Loading probe catalogs from YAML bytes, embedded or external, and saving
//! an external cache copy.

use std::path::Path;

use crate::error::CatalogError;
use crate::probe::{ProbeCatalog, ProbeCatalogDocument};

/// The probe catalog embedded at compile time.
pub const EMBEDDED_PROBES_YAML: &str = include_str!("../../assets/probes.default.yaml");

/// Well-known filename for an external probe catalog under a cache directory.
pub const EXTERNAL_PROBES_FILENAME: &str = "probe.catalog.yaml";

/// Parse and validate a probe catalog document from YAML bytes.
pub fn parse_probe_catalog(yaml: &str) -> Result<ProbeCatalog, CatalogError> {
    let document: ProbeCatalogDocument = serde_yaml::from_str(yaml)?;
    ProbeCatalog::new(document.groups)
}

/// Load the embedded default probe catalog.
pub fn embedded_probe_catalog() -> ProbeCatalog {
    parse_probe_catalog(EMBEDDED_PROBES_YAML).expect("embedded probe catalog must always parse")
}

/// Read and parse an external probe catalog from `<cache_dir>/probe.catalog.yaml`.
pub fn load_external_probe_catalog(cache_dir: &Path) -> Result<ProbeCatalog, CatalogError> {
    let path = cache_dir.join(EXTERNAL_PROBES_FILENAME);
    let bytes = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_probe_catalog(&bytes)
}

/// Write raw catalog bytes to `<cache_dir>/probe.catalog.yaml`, creating the
/// directory with `0755` permissions and the file with `0644` on Unix. On
/// other platforms this falls back to the platform's default permissions.
pub fn save_probe_catalog_cache(cache_dir: &Path, bytes: &[u8]) -> Result<(), CatalogError> {
    std::fs::create_dir_all(cache_dir).map_err(|source| CatalogError::Io {
        path: cache_dir.display().to_string(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(cache_dir)
            .map_err(|source| CatalogError::Io { path: cache_dir.display().to_string(), source })?
            .permissions();
        perms.set_mode(0o755);
        let _ = std::fs::set_permissions(cache_dir, perms);
    }

    let path = cache_dir.join(EXTERNAL_PROBES_FILENAME);
    std::fs::write(&path, bytes).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&path)
            .map_err(|source| CatalogError::Io { path: path.display().to_string(), source })?
            .permissions();
        perms.set_mode(0o644);
        let _ = std::fs::set_permissions(&path, perms);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_probe_catalog_parses_and_is_nonempty() {
        let catalog = embedded_probe_catalog();
        assert!(!catalog.groups().is_empty());
    }

    #[test]
    fn save_then_load_external_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        save_probe_catalog_cache(dir.path(), EMBEDDED_PROBES_YAML.as_bytes()).unwrap();
        let loaded = load_external_probe_catalog(dir.path()).unwrap();
        assert_eq!(loaded.groups().len(), embedded_probe_catalog().groups().len());
    }

    #[test]
    fn missing_external_probe_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_external_probe_catalog(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
