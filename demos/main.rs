//! Command-line demo: resolve a handful of built-in sample banners against
//! the embedded rule catalog and print what matched.

use svcfp::catalog::get_fingerprint_resolver;
use svcfp::resolver::FingerprintResolver;
use svcfp::rule::Input;

const SAMPLES: &[(&str, &str, u16)] = &[
    ("ssh", "SSH-2.0-OpenSSH_9.3", 22),
    ("http", "Server: nginx/1.25.3\r\n", 80),
    ("redis", "redis_version:7.2.4\r\n", 6379),
    ("http", "just a plain unrelated banner", 80),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let resolver = get_fingerprint_resolver();
    tracing::info!("resolver ready");

    for (protocol, banner, port) in SAMPLES {
        let input = Input::from_text(*protocol, *banner, *port);
        match resolver.resolve(&input) {
            Some(result) => println!(
                "{protocol}:{port} -> {} {} (confidence {:.2}, cpe {})",
                result.product, result.version, result.confidence, result.cpe
            ),
            None => println!("{protocol}:{port} -> no match"),
        }
    }

    Ok(())
}
