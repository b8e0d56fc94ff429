use crate::engine::SigningEngine;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Options {
    pub path: PathBuf,
}

/// Describe the bundle and print the engine's structured result.
pub(crate) async fn run<E>(engine: &E, options: Options) -> anyhow::Result<()>
where
    E: SigningEngine + ?Sized,
{
    let info = engine.describe(&options.path).await?;

    println!("{}", serde_json::to_string_pretty(&info)?);

    Ok(())
}
