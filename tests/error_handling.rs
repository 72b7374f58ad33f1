use svcfp::catalog::{embedded_rules, parse_rules};
use svcfp::error::{CatalogError, RuleError};
use svcfp::rule::compile;

#[test]
fn duplicate_rule_id_fails_compilation_with_typed_error() {
    let mut raw = embedded_rules();
    let duplicate = raw[0].clone();
    raw.push(duplicate);

    let errors = compile(&raw).unwrap_err();
    assert!(errors.iter().any(|e| matches!(e, RuleError::DuplicateId { .. })));
}

#[test]
fn bad_regex_is_rejected_before_compilation_completes() {
    let mut raw = embedded_rules();
    raw[0].match_pattern = "(unterminated".into();

    let errors = compile(&raw).unwrap_err();
    assert!(errors.iter().any(|e| matches!(e, RuleError::BadRegex { .. })));
}

#[test]
fn invalid_external_rule_yaml_surfaces_as_catalog_yaml_error() {
    let result = parse_rules("not: [valid, yaml: structure");
    assert!(matches!(result, Err(CatalogError::Yaml(_))));
}

#[test]
fn empty_probe_group_is_rejected_at_construction() {
    use svcfp::probe::{ProbeCatalog, ProbeGroup};

    let groups = vec![ProbeGroup {
        id: "empty-group".into(),
        description: String::new(),
        port_hints: vec![80],
        protocol_hints: vec![],
        probes: vec![],
    }];

    let result = ProbeCatalog::new(groups);
    assert!(matches!(result, Err(CatalogError::EmptyProbeGroup { .. })));
}

#[test]
fn out_of_range_resolver_settings_are_rejected() {
    use svcfp::config::ResolverSettings;
    use svcfp::error::ConfigError;

    let settings = ResolverSettings { min_confidence: -0.1, ..Default::default() };
    assert!(matches!(settings.validate(), Err(ConfigError::OutOfUnitRange { .. })));
}
