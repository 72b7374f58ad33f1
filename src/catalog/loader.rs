//! Process-wide catalog state: embedded-default-with-external-override
//! semantics for both the rule resolver and the probe catalog, with atomic
//! swap on warm-up.
//!
//! Modeled as a lazily initialized cell holding a shared, read-only value;
//! replacement is a single write-lock swap. There is no other global mutable
//! state beyond these two cells.

use std::path::Path;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::catalog::probe_catalog::{embedded_probe_catalog, load_external_probe_catalog};
use crate::catalog::rule_catalog::{embedded_rules, load_external_rules};
use crate::error::CatalogError;
use crate::probe::ProbeCatalog;
use crate::resolver::{FingerprintResolver, RuleResolver};
use crate::rule::compile;

static ACTIVE_RESOLVER: Lazy<RwLock<Arc<dyn FingerprintResolver>>> = Lazy::new(|| {
    let rules = compile(&embedded_rules()).expect("embedded rule catalog must compile");
    RwLock::new(Arc::new(RuleResolver::new(rules)))
});

static ACTIVE_PROBE_CATALOG: Lazy<RwLock<Arc<ProbeCatalog>>> =
    Lazy::new(|| RwLock::new(Arc::new(embedded_probe_catalog())));

/// Return the currently active fingerprint resolver. Callers either see the
/// pre-swap or post-swap resolver, never a half-constructed one.
pub fn get_fingerprint_resolver() -> Arc<dyn FingerprintResolver> {
    ACTIVE_RESOLVER
        .read()
        .expect("active resolver lock poisoned")
        .clone()
}

/// Replace the active resolver wholesale, e.g. with an externally registered
/// ML implementation. The resolver object itself is never mutated in place —
/// only the shared reference is swapped.
pub fn register_fingerprint_resolver(resolver: Arc<dyn FingerprintResolver>) {
    *ACTIVE_RESOLVER.write().expect("active resolver lock poisoned") = resolver;
}

/// Try to load `<cache_dir>/fingerprint.cache` and, on success, replace the
/// active resolver with one built from those rules. On any failure (missing
/// file, bad YAML, failed compilation) the embedded rules remain active and
/// the failure is logged, not propagated as a fatal error.
pub fn warm_with_external(cache_dir: &Path) {
    match load_external_rules(cache_dir) {
        Ok(raw_rules) => match compile(&raw_rules) {
            Ok(compiled) => {
                register_fingerprint_resolver(Arc::new(RuleResolver::new(compiled)));
                tracing::info!(cache_dir = %cache_dir.display(), "warmed resolver from external rule catalog");
            }
            Err(errors) => {
                tracing::warn!(
                    cache_dir = %cache_dir.display(),
                    error_count = errors.len(),
                    "external rule catalog failed to compile; keeping embedded rules"
                );
            }
        },
        Err(error) => {
            tracing::warn!(
                cache_dir = %cache_dir.display(),
                %error,
                "external rule catalog unavailable; keeping embedded rules"
            );
        }
    }
}

/// Return the currently active probe catalog.
pub fn get_probe_catalog() -> Arc<ProbeCatalog> {
    ACTIVE_PROBE_CATALOG
        .read()
        .expect("active probe catalog lock poisoned")
        .clone()
}

/// Try to load `<cache_dir>/probe.catalog.yaml` and, on success, replace the
/// active probe catalog. On failure the embedded catalog stays active and the
/// error is returned to the caller (the probe catalog's external-override
/// contract surfaces parse failures, unlike the rule catalog's silent fallback).
pub fn warm_probe_catalog_with_external(cache_dir: &Path) -> Result<(), CatalogError> {
    match load_external_probe_catalog(cache_dir) {
        Ok(catalog) => {
            let group_count = catalog.groups().len();
            *ACTIVE_PROBE_CATALOG
                .write()
                .expect("active probe catalog lock poisoned") = Arc::new(catalog);
            tracing::info!(cache_dir = %cache_dir.display(), group_count, "warmed probe catalog from external file");
            Ok(())
        }
        Err(CatalogError::Io { .. }) => {
            // Missing file: embedded catalog stays active, no error surfaced.
            Ok(())
        }
        Err(error) => {
            tracing::warn!(cache_dir = %cache_dir.display(), %error, "external probe catalog invalid; keeping embedded catalog");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Input;

    #[test]
    fn get_resolver_returns_working_embedded_default() {
        let resolver = get_fingerprint_resolver();
        // The embedded catalog must at least be able to miss cleanly.
        assert!(resolver
            .resolve(&Input::from_text("nonexistent-protocol", "nothing", 1))
            .is_none());
    }

    #[test]
    fn warm_with_external_falls_back_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let before = get_fingerprint_resolver().resolve(&Input::from_text("ssh", "SSH-2.0-OpenSSH_8.9", 22));
        warm_with_external(dir.path());
        let after = get_fingerprint_resolver().resolve(&Input::from_text("ssh", "SSH-2.0-OpenSSH_8.9", 22));
        assert_eq!(before.is_some(), after.is_some());
    }

    #[test]
    fn register_resolver_swaps_atomically() {
        struct AlwaysNone;
        impl FingerprintResolver for AlwaysNone {
            fn resolve(&self, _input: &Input) -> Option<crate::rule::FingerprintResult> {
                None
            }
        }

        register_fingerprint_resolver(Arc::new(AlwaysNone));
        let resolver = get_fingerprint_resolver();
        assert!(resolver
            .resolve(&Input::from_text("ssh", "SSH-2.0-OpenSSH_8.9", 22))
            .is_none());

        // Restore embedded rules for any later test relying on the default catalog.
        let rules = compile(&embedded_rules()).unwrap();
        register_fingerprint_resolver(Arc::new(RuleResolver::new(rules)));
    }

    #[test]
    fn warm_probe_catalog_with_missing_file_keeps_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let before = get_probe_catalog().groups().len();
        warm_probe_catalog_with_external(dir.path()).unwrap();
        let after = get_probe_catalog().groups().len();
        assert_eq!(before, after);
    }

    #[test]
    fn warm_probe_catalog_with_invalid_yaml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("probe.catalog.yaml"), "not: [valid, yaml: structure").unwrap();
        assert!(warm_probe_catalog_with_external(dir.path()).is_err());
    }
}
