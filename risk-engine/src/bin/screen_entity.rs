//! Screen one entity and print the report payload as JSON

use anyhow::{bail, Context, Result};
use compliance_service::QueryEntity;
use risk_engine::{EngineConfig, RiskScorer, ScreeningReport};

fn main() -> Result<()> {
    // Logs go to stderr, the report to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(name)) = (args.next(), args.next()) else {
        bail!("usage: screen-entity <config.toml> <name> [country] [address]");
    };

    let mut query = QueryEntity::new(name);
    if let Some(country) = args.next() {
        query = query.with_country(country);
    }
    if let Some(address) = args.next() {
        query = query.with_address(address);
    }

    let config = EngineConfig::from_toml_file(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;
    let scorer = RiskScorer::from_config(&config).context("initializing risk scorer")?;

    let assessment = scorer.assess(&query)?;
    let report = ScreeningReport::new(query, assessment);
    tracing::info!(
        "{}: {} ({})",
        report.file_stem(),
        report.risk.final_score,
        report.risk.risk_level
    );
    println!("{}", report.to_json()?);
    Ok(())
}
