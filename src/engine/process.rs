//! Drives the engine executable over a one-shot JSON request.

use super::SigningEngine;
use crate::data::Kwargs;
use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Overrides which engine executable is spawned.
pub const ENGINE_ENV: &str = "ISIGN_ENGINE";

const DEFAULT_ENGINE: &str = "isign-engine";

#[derive(Debug, Serialize)]
struct Request<'r> {
    op: &'static str,
    path: &'r Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials_dir: Option<&'r Path>,
    #[serde(skip_serializing_if = "Kwargs::is_empty")]
    kwargs: &'r Kwargs,
}

/// Engine bound to an external executable.
///
/// One request is written to the engine's stdin per invocation; `describe`
/// reads its structured result back from stdout. Stderr stays inherited so
/// the engine's own messages reach the terminal directly; a non-zero exit
/// becomes an error naming the exit status.
pub struct ProcessEngine {
    program: OsString,
}

impl ProcessEngine {
    pub fn from_env() -> Self {
        Self::with_program(env::var_os(ENGINE_ENV).unwrap_or_else(|| DEFAULT_ENGINE.into()))
    }

    fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn call(&self, request: Request<'_>) -> anyhow::Result<Vec<u8>> {
        let payload = serde_json::to_vec(&request)?;
        log::debug!("Engine request: {}", String::from_utf8_lossy(&payload));

        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("unable to start signing engine {:?}", self.program))?;

        let mut stdin = child.stdin.take().context("engine stdin unavailable")?;
        stdin.write_all(&payload).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            bail!("signing engine failed ({})", output.status);
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl SigningEngine for ProcessEngine {
    async fn describe(&self, path: &Path) -> anyhow::Result<Value> {
        let stdout = self
            .call(Request {
                op: "describe",
                path,
                credentials_dir: None,
                kwargs: &Kwargs::new(),
            })
            .await?;

        serde_json::from_slice(&stdout).context("signing engine returned a malformed description")
    }

    async fn resign(&self, path: &Path, kwargs: &Kwargs) -> anyhow::Result<()> {
        self.call(Request {
            op: "resign",
            path,
            credentials_dir: None,
            kwargs,
        })
        .await?;
        Ok(())
    }

    async fn resign_adhoc(&self, path: &Path, kwargs: &Kwargs) -> anyhow::Result<()> {
        self.call(Request {
            op: "resign_adhoc",
            path,
            credentials_dir: None,
            kwargs,
        })
        .await?;
        Ok(())
    }

    async fn resign_with_credentials_dir(
        &self,
        path: &Path,
        credentials_dir: &Path,
        kwargs: &Kwargs,
    ) -> anyhow::Result<()> {
        self.call(Request {
            op: "resign_with_credentials_dir",
            path,
            credentials_dir: Some(credentials_dir),
            kwargs,
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn requests_serialize_with_stable_field_names() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("deep".to_string(), Value::Bool(true));

        let request = Request {
            op: "resign_with_credentials_dir",
            path: Path::new("/apps/Foo.app"),
            credentials_dir: Some(Path::new("/creds")),
            kwargs: &kwargs,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "op": "resign_with_credentials_dir",
                "path": "/apps/Foo.app",
                "credentials_dir": "/creds",
                "kwargs": {"deep": true},
            })
        );
    }

    #[cfg(unix)]
    fn engine_script(name: &str, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = env::temp_dir().join(format!("isign-engine-{name}-{}", std::process::id()));
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn engine_failure_surfaces_the_exit_status() {
        let script = engine_script("fail", "#!/bin/sh\ncat >/dev/null\nexit 3\n");

        let engine = ProcessEngine::with_program(&script);
        let err = engine
            .resign(Path::new("/apps/Foo.app"), &Kwargs::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("signing engine failed"), "{err}");

        let _ = std::fs::remove_file(&script);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn describe_parses_the_engine_output() {
        let script = engine_script(
            "describe",
            "#!/bin/sh\ncat >/dev/null\necho '{\"CFBundleIdentifier\": \"com.example.foo\"}'\n",
        );

        let engine = ProcessEngine::with_program(&script);
        let info = engine.describe(Path::new("/apps/Foo.app")).await.unwrap();
        assert_eq!(info["CFBundleIdentifier"], "com.example.foo");

        let _ = std::fs::remove_file(&script);
    }

    #[test]
    fn unset_request_fields_are_omitted() {
        let request = Request {
            op: "describe",
            path: Path::new("/apps/Foo.app"),
            credentials_dir: None,
            kwargs: &Kwargs::new(),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"op": "describe", "path": "/apps/Foo.app"})
        );
    }
}
