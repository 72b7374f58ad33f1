//! Probe specs and groups: the declarative shape of "what to send and when",
//! independent of how the bytes are actually transmitted (that's the
//! coordinator's `ProbeExecutor`).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single active probe: a payload to send, with optional port filters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeSpec {
    pub id: String,
    pub protocol: String,
    #[serde(default, with = "payload_bytes")]
    pub payload: Vec<u8>,
    #[serde(default)]
    pub port_include: Vec<u16>,
    #[serde(default)]
    pub port_exclude: Vec<u16>,
}

impl ProbeSpec {
    /// Whether this probe should be emitted for the given port.
    pub fn applies_to_port(&self, port: u16) -> bool {
        let included = self.port_include.is_empty() || self.port_include.contains(&port);
        let excluded = self.port_exclude.contains(&port);
        included && !excluded
    }
}

mod payload_bytes {
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

/// A named group of probes, eligible for a (port, hints) pair based on its
/// declared port/protocol hints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeGroup {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub port_hints: Vec<u16>,
    #[serde(default)]
    pub protocol_hints: Vec<String>,
    pub probes: Vec<ProbeSpec>,
}

impl ProbeGroup {
    /// A group is eligible when at least one hint matches case-insensitively
    /// (empty hint strings are ignored), or at least one port-hint matches.
    /// If neither set is declared, the group is never eligible.
    pub fn is_eligible(&self, port: u16, hints: &[String]) -> bool {
        if self.protocol_hints.is_empty() && self.port_hints.is_empty() {
            return false;
        }

        let normalized: HashSet<String> = hints
            .iter()
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        let hint_overlap = self
            .protocol_hints
            .iter()
            .any(|h| normalized.contains(&h.to_lowercase()));

        hint_overlap || self.port_hints.contains(&port)
    }
}

/// Top-level shape of a probe catalog file: `{ groups: [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeCatalogDocument {
    pub groups: Vec<ProbeGroup>,
}

/// A validated, queryable set of probe groups.
#[derive(Debug, Clone, Default)]
pub struct ProbeCatalog {
    groups: Vec<ProbeGroup>,
}

impl ProbeCatalog {
    /// Validate and wrap a set of probe groups.
    ///
    /// Each group must have a non-empty id and at least one probe; each probe
    /// must have a non-empty id, protocol, and payload.
    pub fn new(groups: Vec<ProbeGroup>) -> Result<Self, crate::error::CatalogError> {
        use crate::error::CatalogError;

        for group in &groups {
            if group.id.is_empty() {
                return Err(CatalogError::InvalidProbe {
                    id: "<unnamed group>".into(),
                    field: "id",
                });
            }
            if group.probes.is_empty() {
                return Err(CatalogError::EmptyProbeGroup { id: group.id.clone() });
            }
            for probe in &group.probes {
                if probe.id.is_empty() {
                    return Err(CatalogError::InvalidProbe {
                        id: group.id.clone(),
                        field: "probe.id",
                    });
                }
                if probe.protocol.is_empty() {
                    return Err(CatalogError::InvalidProbe {
                        id: probe.id.clone(),
                        field: "protocol",
                    });
                }
                if probe.payload.is_empty() {
                    return Err(CatalogError::InvalidProbe {
                        id: probe.id.clone(),
                        field: "payload",
                    });
                }
            }
        }

        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[ProbeGroup] {
        &self.groups
    }

    /// Pure lookup: every probe from every eligible group, in group-then-probe
    /// declaration order, filtered by that probe's own port include/exclude.
    pub fn probes_for(&self, port: u16, hints: &[String]) -> Vec<&ProbeSpec> {
        self.groups
            .iter()
            .filter(|group| group.is_eligible(port, hints))
            .flat_map(|group| group.probes.iter())
            .filter(|probe| probe.applies_to_port(port))
            .collect()
    }
}
