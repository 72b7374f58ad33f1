//! Embedded-default-with-external-override catalog loading for both rule and
//! probe catalogs, plus the process-wide active-resolver/active-catalog cells.

pub mod loader;
pub mod probe_catalog;
pub mod rule_catalog;

pub use loader::{
    get_fingerprint_resolver, get_probe_catalog, register_fingerprint_resolver,
    warm_probe_catalog_with_external, warm_with_external,
};
pub use probe_catalog::{
    embedded_probe_catalog, load_external_probe_catalog, parse_probe_catalog,
    save_probe_catalog_cache, EXTERNAL_PROBES_FILENAME,
};
pub use rule_catalog::{embedded_rules, load_external_rules, parse_rules, EXTERNAL_RULES_FILENAME};
