//! Sparse parameter maps for the signing engine.

use super::ArgumentModel;
use serde_json::Value;
use std::path::Path;

/// The minimal parameter mapping forwarded to the signing engine.
///
/// Only explicitly supplied fields appear, so the engine's own defaults
/// govern everything omitted.
pub type Kwargs = serde_json::Map<String, Value>;

impl ArgumentModel {
    /// Project the model onto the named fields, dropping anything unset.
    pub fn kwargs(&self, fields: &[&str]) -> Kwargs {
        let mut result = Kwargs::new();

        for field in fields {
            if let Some(value) = self.kwarg(field) {
                result.insert(field.to_string(), value);
            }
        }

        result
    }

    /// The engine-facing value of a single field, `None` when unset.
    fn kwarg(&self, field: &str) -> Option<Value> {
        match field {
            "deep" => Some(Value::Bool(self.deep)),
            "key" => self.key.as_deref().map(path_value),
            "certificate" => self.certificate.as_deref().map(path_value),
            "apple_cert" => self.apple_cert.as_deref().map(path_value),
            "output_path" => self.output_path.as_deref().map(path_value),
            "provisioning_profiles" => path_list(&self.provisioning_profiles),
            "entitlements_paths" => path_list(&self.entitlements_paths),
            "signer_class" => self
                .signer_class
                .map(|signer| Value::String(signer.dotted())),
            "signer_arguments" => self.signer_arguments.as_ref().map(|args| {
                Value::Object(
                    args.iter()
                        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                        .collect(),
                )
            }),
            _ => None,
        }
    }
}

fn path_value(path: &Path) -> Value {
    Value::String(path.display().to_string())
}

fn path_list(paths: &[std::path::PathBuf]) -> Option<Value> {
    if paths.is_empty() {
        None
    } else {
        Some(Value::Array(paths.iter().map(|p| path_value(p)).collect()))
    }
}
