//! The argument model and its validation rules.

use crate::signer::SignerRef;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

mod kwargs;

pub use kwargs::Kwargs;

/// Everything the command line said, resolved once and read-only afterwards.
///
/// Path-typed options are normalized at construction. Optional credential
/// paths stay `None` when the user did not supply them, so the kwarg filter
/// can omit them and the signing engine applies its own defaults. The
/// dispatcher performs two controlled mutations: the signer dotted name is
/// resolved into a registry reference, and `output_path` is forced to the
/// target when in-place signing is requested.
#[derive(Clone, Debug)]
pub struct ArgumentModel {
    pub app_path: PathBuf,
    pub provisioning_profiles: Vec<PathBuf>,
    pub entitlements_paths: Vec<PathBuf>,
    pub key: Option<PathBuf>,
    pub certificate: Option<PathBuf>,
    pub apple_cert: Option<PathBuf>,
    pub credentials_dir: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    /// Raw comma-separated `key=value` Info.plist overrides.
    pub info: Option<String>,
    pub verbose: bool,
    pub display_only: bool,
    /// Recursive signing of nested bundles, on unless `--shallow` was given.
    pub deep: bool,
    pub inplace: bool,
    pub adhoc: bool,
    /// Signer dotted name as given on the command line.
    pub signer: Option<String>,
    pub signer_args: Vec<String>,
    /// Resolved by the dispatcher from `signer`.
    pub signer_class: Option<SignerRef>,
    pub signer_arguments: Option<BTreeMap<String, String>>,
}

/// Option combinations the command line cannot express coherently.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{mode} cannot be combined with {flags}")]
    Incompatible { mode: String, flags: String },
    #[error("malformed key=value token: {0:?}")]
    MalformedKeyValue(String),
    #[error("--inplace cannot be combined with an explicit -o/--output path")]
    InplaceWithOutput,
}

/// Fields that select a credential source incompatible with `--adhoc`.
pub const ADHOC_INCOMPATIBLE: &[&str] = &[
    "apple_cert",
    "certificate",
    "key",
    "provisioning_profiles",
    "signer_class",
    "signer_arguments",
    "entitlements_paths",
];

/// Fields the credentials-directory convention supplies itself.
pub const CREDENTIALS_DIR_INCOMPATIBLE: &[&str] = &["certificate", "key", "provisioning_profiles"];

impl ArgumentModel {
    /// Whether the user explicitly supplied a value for the named field.
    pub fn is_set(&self, field: &str) -> bool {
        match field {
            "apple_cert" => self.apple_cert.is_some(),
            "certificate" => self.certificate.is_some(),
            "key" => self.key.is_some(),
            "credentials_dir" => self.credentials_dir.is_some(),
            "output_path" => self.output_path.is_some(),
            "provisioning_profiles" => !self.provisioning_profiles.is_empty(),
            "entitlements_paths" => !self.entitlements_paths.is_empty(),
            "signer_class" => self.signer.is_some() || self.signer_class.is_some(),
            "signer_arguments" => !self.signer_args.is_empty() || self.signer_arguments.is_some(),
            // a flag with a value, never unset
            "deep" => true,
            _ => false,
        }
    }
}

/// Fail when any of the forbidden fields was supplied alongside the mode.
///
/// The option groups encode alternative credential-sourcing strategies;
/// accepting both would either ignore user intent or conflict outright. The
/// error names the mode and every offending flag actually present.
pub fn check_incompatible(
    model: &ArgumentModel,
    mode: &str,
    forbidden: &[&str],
) -> Result<(), ConfigError> {
    let present: Vec<&str> = forbidden
        .iter()
        .filter(|field| model.is_set(field))
        .map(|field| flag_label(field))
        .collect();

    if present.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Incompatible {
            mode: mode.to_string(),
            flags: present.join(", "),
        })
    }
}

/// Render a model field as its command-line spelling.
fn flag_label(field: &str) -> &'static str {
    match field {
        "apple_cert" => "-a/--apple-cert",
        "certificate" => "-c/--certificate",
        "key" => "-k/--key",
        "credentials_dir" => "-n/--credentials",
        "output_path" => "-o/--output",
        "provisioning_profiles" => "-p/--provisioning-profile",
        "entitlements_paths" => "-e/--entitlements",
        "signer_class" => "--signer",
        "signer_arguments" => "--signerArg",
        other => {
            debug_assert!(false, "no flag label for field {other:?}");
            "<unknown>"
        }
    }
}

/// Parse a comma-separated `key=value` string of Info.plist overrides.
///
/// The first `=` in each segment splits key from value, so values may
/// themselves contain `=`. An empty input yields an empty map.
pub fn parse_info_props(overrides: &str) -> Result<Kwargs, ConfigError> {
    let mut props = Kwargs::new();

    if overrides.is_empty() {
        return Ok(props);
    }

    for segment in overrides.split(',') {
        match segment.split_once('=') {
            Some((key, value)) => {
                props.insert(key.to_string(), Value::String(value.to_string()));
            }
            None => return Err(ConfigError::MalformedKeyValue(segment.to_string())),
        }
    }

    Ok(props)
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    pub(crate) fn empty_model(path: &str) -> ArgumentModel {
        ArgumentModel {
            app_path: PathBuf::from(path),
            provisioning_profiles: Vec::new(),
            entitlements_paths: Vec::new(),
            key: None,
            certificate: None,
            apple_cert: None,
            credentials_dir: None,
            output_path: None,
            info: None,
            verbose: false,
            display_only: false,
            deep: true,
            inplace: false,
            adhoc: false,
            signer: None,
            signer_args: Vec::new(),
            signer_class: None,
            signer_arguments: None,
        }
    }

    #[test]
    fn check_incompatible_passes_when_nothing_forbidden_is_set() {
        let model = empty_model("/apps/Foo.app");
        check_incompatible(&model, "--adhoc", ADHOC_INCOMPATIBLE).unwrap();
    }

    #[test]
    fn check_incompatible_names_every_offending_flag() {
        let mut model = empty_model("/apps/Foo.app");
        model.key = Some(PathBuf::from("/creds/key.pem"));
        model.certificate = Some(PathBuf::from("/creds/cert.pem"));
        model.signer = Some("isign.signer.CmsSigner".to_string());

        let err = check_incompatible(&model, "--adhoc", ADHOC_INCOMPATIBLE).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("--adhoc"), "{message}");
        assert!(message.contains("-k/--key"), "{message}");
        assert!(message.contains("-c/--certificate"), "{message}");
        assert!(message.contains("--signer"), "{message}");
        assert!(!message.contains("-e/--entitlements"), "{message}");
    }

    #[test]
    fn credentials_dir_rejects_explicit_profile() {
        let mut model = empty_model("/apps/Foo.app");
        model.credentials_dir = Some(PathBuf::from("/creds"));
        model.provisioning_profiles = vec![PathBuf::from("/profiles/dev.mobileprovision")];

        let err =
            check_incompatible(&model, "-n/--credentials", CREDENTIALS_DIR_INCOMPATIBLE)
                .unwrap_err();
        assert!(err.to_string().contains("-p/--provisioning-profile"));
    }

    #[test]
    fn every_forbidden_field_has_a_flag_label() {
        for field in ADHOC_INCOMPATIBLE
            .iter()
            .chain(CREDENTIALS_DIR_INCOMPATIBLE)
        {
            assert_ne!(flag_label(field), "<unknown>", "{field}");
        }
    }

    #[test]
    fn info_props_split_on_first_equals() {
        let props = parse_info_props("a=1,b=2").unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props["a"], "1");
        assert_eq!(props["b"], "2");

        let props = parse_info_props("CFBundleVersion=1.2=3").unwrap();
        assert_eq!(props["CFBundleVersion"], "1.2=3");
    }

    #[test]
    fn empty_info_props_is_an_empty_map() {
        assert!(parse_info_props("").unwrap().is_empty());
    }

    #[test]
    fn malformed_info_props_segment_is_rejected() {
        let err = parse_info_props("a=1,oops").unwrap_err();
        assert!(err.to_string().contains("oops"));
    }
}
