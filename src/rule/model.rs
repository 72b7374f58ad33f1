//! Declarative rule types: the raw, serde-facing form loaded from YAML and the
//! compiled, regex-backed form the resolver actually evaluates.

use serde::{Deserialize, Serialize};

/// Default pattern strength applied when a rule omits (or zeroes) the field.
pub const DEFAULT_PATTERN_STRENGTH: f32 = 0.80;

/// A single declarative fingerprint rule as loaded from a catalog file.
///
/// This is the wire/serde form: regexes are plain strings, not yet compiled.
/// Use [`crate::rule::compile::compile`] to turn a set of these into a
/// [`CompiledRuleSet`](crate::rule::compile::CompiledRuleSet).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawRule {
    pub id: String,
    pub protocol: String,
    #[serde(default)]
    pub description: String,
    pub product: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub cpe: String,
    #[serde(rename = "match")]
    pub match_pattern: String,
    #[serde(default, rename = "version_extraction")]
    pub version_extraction: String,
    #[serde(default, rename = "exclude_patterns")]
    pub hard_exclude_patterns: Vec<String>,
    #[serde(default, rename = "soft_exclude_patterns")]
    pub soft_exclude_patterns: Vec<String>,
    #[serde(default)]
    pub pattern_strength: f32,
    #[serde(default, rename = "port_bonuses")]
    pub bonus_ports: Vec<u32>,
    #[serde(default, rename = "binary_min_length")]
    pub binary_min_length: Option<usize>,
    #[serde(default, rename = "binary_magic")]
    pub binary_magic: Vec<String>,
}

/// Top-level shape of a rule catalog file: either a bare sequence of rules, or
/// a mapping with a single `rules` key holding that sequence.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleCatalogDocument {
    Wrapped { rules: Vec<RawRule> },
    Bare(Vec<RawRule>),
}

impl RuleCatalogDocument {
    pub fn into_rules(self) -> Vec<RawRule> {
        match self {
            RuleCatalogDocument::Wrapped { rules } => rules,
            RuleCatalogDocument::Bare(rules) => rules,
        }
    }
}

/// The structured result returned by a successful resolve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FingerprintResult {
    pub product: String,
    pub vendor: String,
    pub version: String,
    pub cpe: String,
    pub confidence: f32,
    pub technique: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_probe_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_observation: Option<String>,
}

/// Technique tag for resolver output produced by the static rule engine.
pub const TECHNIQUE_STATIC: &str = "static";

/// An observation of a network service, handed to the resolver.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Input {
    /// Protocol hint; empty requests fallback mode (every rule is eligible).
    #[serde(default)]
    pub protocol: String,
    /// Raw banner bytes. Stored as bytes so binary handshakes (e.g. MySQL)
    /// round-trip without lossy UTF-8 coercion.
    #[serde(default, with = "banner_bytes")]
    pub banner: Vec<u8>,
    #[serde(default)]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_hint: Option<String>,
}

impl Input {
    pub fn from_text(protocol: impl Into<String>, banner: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: protocol.into(),
            banner: banner.into().into_bytes(),
            port,
            service_hint: None,
        }
    }

    pub fn banner_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.banner)
    }
}

/// Serde helper so `Input::banner` can be expressed either as a YAML/JSON
/// string (the common case) or an explicit byte sequence in test fixtures.
pub(crate) mod banner_bytes {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Bytes(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(value) {
            Ok(text) => text.serialize(serializer),
            Err(_) => value.to_vec().serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Ok(s.into_bytes()),
            Repr::Bytes(b) => Ok(b),
        }
    }
}
