//! Geocode command for resolving addresses to coordinates.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use hos_remote::Geocoder;
use tokio::runtime::Runtime;

use crate::Config;

#[derive(Debug, Args)]
pub struct GeocodeArgs {
    /// Addresses to resolve.
    #[arg(required = true)]
    pub addresses: Vec<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &GeocodeArgs, config: &Config) -> Result<()> {
    let geocoder = Geocoder::new(config.geocoder_url.as_str())
        .context("failed to create geocoder")?;
    let runtime = Runtime::new().context("failed to initialize tokio runtime")?;

    let mut failures = 0;
    for address in &args.addresses {
        match runtime.block_on(geocoder.geocode(address)) {
            Ok(Some(coordinates)) => writeln!(
                writer,
                "{address}: {:.5}, {:.5}",
                coordinates.lat, coordinates.lng
            )?,
            Ok(None) => writeln!(writer, "{address}: not found")?,
            Err(e) => {
                tracing::warn!(address, error = %e, "geocoding failed");
                writeln!(writer, "{address}: error: {e}")?;
                failures += 1;
            }
        }
    }
    if failures == args.addresses.len() {
        anyhow::bail!("geocoder unreachable at {}", config.geocoder_url);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_geocoder_url() {
        let config = Config {
            geocoder_url: "ftp://example.com".to_string(),
            ..Config::default()
        };
        let args = GeocodeArgs {
            addresses: vec!["Chicago, IL".to_string()],
        };
        let err = run(&mut Vec::new(), &args, &config).unwrap_err();
        assert!(format!("{err:#}").contains("http or https"));
    }

    #[test]
    fn unreachable_geocoder_reports_each_address() {
        let config = Config {
            geocoder_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let args = GeocodeArgs {
            addresses: vec!["Chicago, IL".to_string(), "Denver, CO".to_string()],
        };
        let mut output = Vec::new();
        let err = run(&mut output, &args, &config).unwrap_err();
        assert!(err.to_string().contains("geocoder unreachable"));

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Chicago, IL: error:"));
        assert!(output.contains("Denver, CO: error:"));
    }
}
