//! Alternate signer implementations, resolved by dotted name.
//!
//! The engine hosts the actual signing backends; this registry mirrors the
//! implementations it ships so a bad `--signer` name fails before any engine
//! call is made.

use crate::data::ConfigError;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// A signer backend known to the signing engine.
#[derive(Debug)]
pub struct SignerSpec {
    pub module: &'static str,
    pub name: &'static str,
    pub summary: &'static str,
}

const REGISTRY: &[SignerSpec] = &[
    SignerSpec {
        module: "isign.signer",
        name: "Pkcs1Signer",
        summary: "RSA PKCS#1 v1.5 signatures with the organization key",
    },
    SignerSpec {
        module: "isign.signer",
        name: "CmsSigner",
        summary: "detached CMS signatures",
    },
];

/// A resolved reference into the registry.
#[derive(Clone, Copy, Debug)]
pub struct SignerRef(&'static SignerSpec);

impl SignerRef {
    /// The canonical dotted name, as forwarded to the engine.
    pub fn dotted(&self) -> String {
        format!("{}.{}", self.0.module, self.0.name)
    }

    pub fn summary(&self) -> &'static str {
        self.0.summary
    }
}

impl Display for SignerRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0.module, self.0.name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignerLoadError {
    #[error("signer name {0:?} is not a dotted path")]
    NotDotted(String),
    #[error("no signer module named {0:?}")]
    ModuleNotFound(String),
    #[error("signer module {module:?} has no implementation named {name:?}")]
    ImplementationNotFound { module: String, name: String },
}

/// Resolve a dotted name into a registry reference.
///
/// The name splits at the last `.` into a module path and an implementation
/// identifier; both must exist. Load errors propagate unmodified to the top
/// level.
pub fn resolve(dotted: &str) -> Result<SignerRef, SignerLoadError> {
    let (module, name) = dotted
        .rsplit_once('.')
        .ok_or_else(|| SignerLoadError::NotDotted(dotted.to_string()))?;

    if !REGISTRY.iter().any(|spec| spec.module == module) {
        return Err(SignerLoadError::ModuleNotFound(module.to_string()));
    }

    REGISTRY
        .iter()
        .find(|spec| spec.module == module && spec.name == name)
        .map(SignerRef)
        .ok_or_else(|| SignerLoadError::ImplementationNotFound {
            module: module.to_string(),
            name: name.to_string(),
        })
}

/// Parse repeated `key=value` tokens into the signer-arguments map.
pub fn parse_signer_args(tokens: &[String]) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut args = BTreeMap::new();

    for token in tokens {
        match token.split_once('=') {
            Some((key, value)) => {
                args.insert(key.to_string(), value.to_string());
            }
            None => return Err(ConfigError::MalformedKeyValue(token.to_string())),
        }
    }

    Ok(args)
}
