//! The seam to the external signing engine.

use crate::data::Kwargs;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

pub mod process;

/// The signing engine performing the actual cryptographic work.
///
/// This layer treats the engine as a black box: each operation either
/// succeeds or fails the whole invocation, and the engine applies its own
/// defaults for any kwarg the caller omitted.
#[async_trait]
pub trait SigningEngine {
    /// Describe the bundle without signing it.
    async fn describe(&self, path: &Path) -> anyhow::Result<Value>;

    /// Re-sign with explicitly supplied credential files.
    async fn resign(&self, path: &Path, kwargs: &Kwargs) -> anyhow::Result<()>;

    /// Re-sign with an empty ad hoc signature, no credential files.
    async fn resign_adhoc(&self, path: &Path, kwargs: &Kwargs) -> anyhow::Result<()>;

    /// Re-sign with credentials found under conventional names in a directory.
    async fn resign_with_credentials_dir(
        &self,
        path: &Path,
        credentials_dir: &Path,
        kwargs: &Kwargs,
    ) -> anyhow::Result<()>;
}
