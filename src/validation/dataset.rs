//! Declarative validation datasets: labeled inputs the harness replays
//! through a resolver and scores against an expected outcome.

use serde::{Deserialize, Serialize};

use crate::rule::Input;

/// A single labeled case, in the flat wire shape a dataset author writes:
/// protocol/port/banner plus the expectation fields the harness classifies
/// against. `expected_match == Some(false)` marks a negative case (one that
/// should *not* match anything); everything else is a positive case compared
/// against `expected_product`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationTestCase {
    pub protocol: String,
    pub port: u16,
    #[serde(default, with = "crate::rule::model::banner_bytes")]
    pub banner: Vec<u8>,
    #[serde(default)]
    pub expected_product: Option<String>,
    #[serde(default)]
    pub expected_vendor: Option<String>,
    #[serde(default)]
    pub expected_version: Option<String>,
    #[serde(default)]
    pub expected_match: Option<bool>,
    #[serde(default)]
    pub description: String,
}

impl ValidationTestCase {
    /// `false` only when the dataset author explicitly marked the case as a
    /// non-match; everything else (including an unset field) is positive.
    pub fn is_negative(&self) -> bool {
        self.expected_match == Some(false)
    }

    /// The [`Input`] the resolver is run against.
    pub fn input(&self) -> Input {
        Input {
            protocol: self.protocol.clone(),
            banner: self.banner.clone(),
            port: self.port,
            service_hint: None,
        }
    }
}

/// A full validation run's worth of cases, grouped by what they test for.
/// The grouping is informational — the harness classifies every case the
/// same way regardless of which bucket it came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationDataset {
    #[serde(default)]
    pub true_positives: Vec<ValidationTestCase>,
    #[serde(default)]
    pub true_negatives: Vec<ValidationTestCase>,
    #[serde(default)]
    pub edge_cases: Vec<ValidationTestCase>,
}

impl ValidationDataset {
    pub fn cases(&self) -> impl Iterator<Item = &ValidationTestCase> {
        self.true_positives
            .iter()
            .chain(self.true_negatives.iter())
            .chain(self.edge_cases.iter())
    }

    pub fn len(&self) -> usize {
        self.true_positives.len() + self.true_negatives.len() + self.edge_cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(description: &str) -> ValidationTestCase {
        ValidationTestCase {
            protocol: "ssh".into(),
            port: 22,
            banner: b"banner".to_vec(),
            expected_product: None,
            expected_vendor: None,
            expected_version: None,
            expected_match: Some(false),
            description: description.into(),
        }
    }

    #[test]
    fn dataset_iterates_all_buckets() {
        let dataset = ValidationDataset {
            true_positives: vec![case("tp")],
            true_negatives: vec![case("tn")],
            edge_cases: vec![case("edge")],
        };
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.cases().count(), 3);
    }

    #[test]
    fn deserializes_the_documented_flat_shape() {
        let yaml = r#"
true_positives:
  - protocol: ssh
    port: 22
    banner: "SSH-2.0-OpenSSH_9.3"
    expected_product: OpenSSH
    expected_version: "9.3"
    description: plain openssh banner
true_negatives:
  - protocol: http
    port: 80
    banner: "just some unrelated banner text"
    expected_match: false
    description: unrelated banner
edge_cases: []
"#;
        let dataset: ValidationDataset = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(!dataset.true_positives[0].is_negative());
        assert!(dataset.true_negatives[0].is_negative());
        assert_eq!(dataset.true_positives[0].expected_product.as_deref(), Some("OpenSSH"));
    }
}
