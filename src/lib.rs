//! Service-fingerprint resolution engine.
//!
//! Identifies a network service's product, vendor, and version from a banner
//! or handshake, either passively (a single [`rule`]-based match) or through
//! an active, multi-round [`coordinator`] that can send probes and combine
//! results from several pluggable fingerprinters.
//!
//! # Quick start
//!
//! ```
//! use svcfp::catalog::get_fingerprint_resolver;
//! use svcfp::resolver::FingerprintResolver;
//! use svcfp::rule::Input;
//!
//! let resolver = get_fingerprint_resolver();
//! let input = Input::from_text("ssh", "SSH-2.0-OpenSSH_9.3", 22);
//! if let Some(result) = resolver.resolve(&input) {
//!     println!("{} {} ({})", result.product, result.version, result.cpe);
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod probe;
pub mod resolver;
pub mod rule;
pub mod validation;

pub use error::FingerprintError;
pub use rule::{FingerprintResult, Input};
