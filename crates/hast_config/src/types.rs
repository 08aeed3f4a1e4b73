//! Configuration types deserialized from `hast.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// The top-level configuration parsed from `hast.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Transformer-wide defaults.
    #[serde(default)]
    pub transformer: TransformerConfig,
    /// Per-member overrides keyed by a member-name prefix
    /// (e.g. `"Primes::IsPrime"` or just `"Primes::"`).
    #[serde(default)]
    pub members: BTreeMap<String, MemberConfig>,
    /// Diagnostic escalation and suppression lists.
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    /// Report output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl ProjectConfig {
    /// Builds an all-defaults configuration for a project called `name`.
    ///
    /// Used when no `hast.toml` exists.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            project: ProjectMeta {
                name: name.into(),
                version: default_version(),
                entry_points: Vec::new(),
            },
            transformer: TransformerConfig::default(),
            members: BTreeMap::new(),
            diagnostics: DiagnosticsConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Core project metadata required in every `hast.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string.
    #[serde(default = "default_version")]
    pub version: String,
    /// Full names of the members hardware is generated for. Everything these
    /// invoke is generated too. Empty means every member of the design.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub entry_points: Vec<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Transformer-wide defaults and switches.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformerConfig {
    /// Maximum number of concurrent instances of any member a single caller
    /// may request, unless overridden under `[members]`.
    #[serde(default = "default_degree")]
    pub default_max_degree_of_parallelism: u32,
    /// How many nested levels of self-invocation a member supports.
    #[serde(default)]
    pub default_max_recursion_depth: u32,
    /// Lower independent members on a rayon thread pool.
    #[serde(default = "default_true")]
    pub parallel_lowering: bool,
}

fn default_degree() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            default_max_degree_of_parallelism: default_degree(),
            default_max_recursion_depth: 0,
            parallel_lowering: true,
        }
    }
}

/// Invocation settings for the members matching one `[members."prefix"]` key.
///
/// Unset fields fall back to [`TransformerConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberConfig {
    /// Maximum concurrent instances a caller may request.
    pub max_degree_of_parallelism: Option<u32>,
    /// Supported recursion depth.
    pub max_recursion_depth: Option<u32>,
}

/// Diagnostic policy: codes listed in `deny` are raised to errors, codes in
/// `allow` are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagnosticsConfig {
    /// Codes to treat as errors.
    #[serde(default)]
    pub deny: Vec<String>,
    /// Codes to suppress.
    #[serde(default)]
    pub allow: Vec<String>,
}

/// Report output settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Default diagnostic output format for the CLI.
    #[serde(default)]
    pub format: OutputFormat,
}

/// How the CLI renders its report.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text (default).
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Accepts both `entry_points = "Primes::IsPrime"` and
/// `entry_points = ["Primes::IsPrime", "Primes::Count"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn entry_points_single_string() {
        let toml = r#"
[project]
name = "primes"
entry_points = "Primes::IsPrime"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.entry_points, vec!["Primes::IsPrime"]);
    }

    #[test]
    fn entry_points_list() {
        let toml = r#"
[project]
name = "primes"
entry_points = ["Primes::IsPrime", "Primes::Count"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.entry_points.len(), 2);
    }

    #[test]
    fn output_format_variants() {
        for (input, expected) in [("text", OutputFormat::Text), ("json", OutputFormat::Json)] {
            let toml = format!(
                r#"
[project]
name = "primes"

[output]
format = "{input}"
"#
            );
            let config = load_config_from_str(&toml).unwrap();
            assert_eq!(config.output.format, expected);
        }
    }

    #[test]
    fn member_config_partial_override() {
        let toml = r#"
[project]
name = "primes"

[members."Primes::IsPrime"]
max_degree_of_parallelism = 4
"#;
        let config = load_config_from_str(toml).unwrap();
        let member = &config.members["Primes::IsPrime"];
        assert_eq!(member.max_degree_of_parallelism, Some(4));
        assert!(member.max_recursion_depth.is_none());
    }

    #[test]
    fn with_name_uses_defaults() {
        let config = ProjectConfig::with_name("scratch");
        assert_eq!(config.project.name, "scratch");
        assert_eq!(config.transformer.default_max_degree_of_parallelism, 1);
        assert_eq!(config.transformer.default_max_recursion_depth, 0);
        assert!(config.transformer.parallel_lowering);
        assert!(config.members.is_empty());
        assert_eq!(config.output.format, OutputFormat::Text);
    }
}
