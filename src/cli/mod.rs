//! Mode selection: one invocation, one engine call.

use crate::data::{
    check_incompatible, parse_info_props, ArgumentModel, ConfigError, Kwargs,
    ADHOC_INCOMPATIBLE, CREDENTIALS_DIR_INCOMPATIBLE,
};
use crate::engine::SigningEngine;
use crate::signer;
use serde_json::Value;

pub mod display;

const ADHOC_KWARGS: &[&str] = &["deep", "output_path"];

const CREDENTIALS_DIR_KWARGS: &[&str] = &[
    "apple_cert",
    "deep",
    "output_path",
    "signer_class",
    "signer_arguments",
    "entitlements_paths",
];

const STANDARD_KWARGS: &[&str] = &[
    "certificate",
    "deep",
    "key",
    "apple_cert",
    "provisioning_profiles",
    "output_path",
    "entitlements_paths",
    "signer_class",
    "signer_arguments",
];

/// Select exactly one execution path and make its engine call.
///
/// Priority: display, then adhoc, then credentials directory, then explicit
/// credential files. An in-place request is resolved into an output path
/// before mode selection so every signing path honors it. Configuration and
/// signer-load errors abort before the engine is reached.
pub async fn run<E>(mut model: ArgumentModel, engine: &E) -> anyhow::Result<()>
where
    E: SigningEngine + ?Sized,
{
    if model.display_only {
        return display::run(
            engine,
            display::Options {
                path: model.app_path.clone(),
            },
        )
        .await;
    }

    let mut kwargs = Kwargs::new();
    if let Some(info) = &model.info {
        kwargs.insert("info_props".to_string(), Value::Object(parse_info_props(info)?));
    }

    if model.inplace {
        if model.output_path.is_some() {
            return Err(ConfigError::InplaceWithOutput.into());
        }
        model.output_path = Some(model.app_path.clone());
    }

    if model.adhoc {
        check_incompatible(&model, "--adhoc", ADHOC_INCOMPATIBLE)?;
        kwargs.extend(model.kwargs(ADHOC_KWARGS));

        log::info!(
            "Signing {} with an ad hoc signature",
            model.app_path.display()
        );
        return engine.resign_adhoc(&model.app_path, &kwargs).await;
    }

    if let Some(name) = model.signer.take() {
        let resolved = signer::resolve(&name)?;
        log::debug!("Using signer implementation: {resolved} ({})", resolved.summary());
        model.signer_class = Some(resolved);

        if !model.signer_args.is_empty() {
            model.signer_arguments = Some(signer::parse_signer_args(&model.signer_args)?);
        }
    }

    if let Some(credentials_dir) = model.credentials_dir.clone() {
        check_incompatible(&model, "-n/--credentials", CREDENTIALS_DIR_INCOMPATIBLE)?;
        kwargs.extend(model.kwargs(CREDENTIALS_DIR_KWARGS));

        log::info!(
            "Re-signing {} with credentials from {}",
            model.app_path.display(),
            credentials_dir.display()
        );
        engine
            .resign_with_credentials_dir(&model.app_path, &credentials_dir, &kwargs)
            .await
    } else {
        kwargs.extend(model.kwargs(STANDARD_KWARGS));

        log::info!("Re-signing {}", model.app_path.display());
        engine.resign(&model.app_path, &kwargs).await
    }
}
