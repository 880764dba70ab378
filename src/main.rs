use anyhow::Context;

use snowlight::{SceneConfig, SnowlightApp};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("snowlight=info,wgpu_core=warn"),
    )
    .init();

    let config = SceneConfig::from_env().context("failed to load configuration")?;
    log::info!(
        "Assets from {}, {} flakes",
        config.asset_root.display(),
        config.flake_count
    );

    SnowlightApp::new(config)?.run()
}
