//! Introspects the sample `Thing` and logs the zero instance of its `grinch`
//! field. `RUST_LOG=debug` shows every descriptor as it is created.
use anyhow::{Context, Result, anyhow};
use structmeta::Registry;
use structmeta::sample::Thing;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut registry = Registry::new();
    let root = registry
        .describe(&Some(Thing::default()))
        .context("failed to introspect Thing")?;
    let thing = root
        .pointer_target()
        .ok_or_else(|| anyhow!("{} is not a pointer", root.name()))?;

    for field in thing.fields() {
        if field.name() != "grinch" {
            continue;
        }
        let zero = field
            .zero()
            .ok_or_else(|| anyhow!("grinch has no zero instance"))?;
        info!(
            descriptor = field.descriptor().name(),
            zero = %zero,
            json = %serde_json::to_string(zero)?,
            "found grinch"
        );
    }
    Ok(())
}
