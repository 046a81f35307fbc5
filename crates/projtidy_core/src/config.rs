//! Normalization rules and their TOML representation.
//!
//! # Responsibility
//! - Describe property priority tiers, required properties and pair rules.
//! - Load and validate user-provided rule files.
//!
//! # Invariants
//! - Every matcher carries exactly one of `equals` / `contains`.
//! - A property name appears in at most one priority tier.
//! - `NormalizeConfig::default()` reproduces the built-in rule set.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Sentinel target framework of hosted executables.
pub const HOST_TARGET_FRAMEWORK: &str = "$(BizQAHostTargetFramework)";
/// Sentinel runtime identifier paired with [`HOST_TARGET_FRAMEWORK`].
pub const HOST_RUNTIME_IDENTIFIER: &str = "$(BizQAHostRuntimeIdentifier)";
/// Output type required by hosted executables.
pub const EXECUTABLE_OUTPUT_TYPE: &str = "Exe";

/// Matches `*.csproj`, `*.vbproj`, `*.vcxproj`, `*.proj` and friends.
pub const DEFAULT_PROJECT_FILE_PATTERN: &str = r"(?i)^.+\.[a-z0-9]*proj$";

/// Full rule set driving one normalization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeConfig {
    /// File-name regex selecting project files during discovery.
    pub project_file_pattern: String,
    /// Property names sorted first, tier by tier.
    pub property_priority: Vec<Vec<String>>,
    /// Properties every property group must declare.
    pub required_properties: Vec<String>,
    /// Cross-property consistency rules.
    pub pair_rules: Vec<PairRule>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        let tiers: &[&[&str]] = &[
            &["TargetFramework", "TargetFrameworks"],
            &["RuntimeIdentifier", "RuntimeIdentifiers"],
            &["TargetLatestRuntimePatch"],
            &["CopyLocalLockFileAssemblies"],
            &["OutputType"],
            &["AssemblyName"],
            &["RootNamespace"],
            &["IsPackable"],
        ];

        Self {
            project_file_pattern: DEFAULT_PROJECT_FILE_PATTERN.to_string(),
            property_priority: tiers
                .iter()
                .map(|tier| tier.iter().map(|name| name.to_string()).collect())
                .collect(),
            required_properties: vec!["AssemblyName".to_string(), "RootNamespace".to_string()],
            pair_rules: vec![
                PairRule::new(
                    vec![PropertyMatcher::equals("TargetFramework", HOST_TARGET_FRAMEWORK)],
                    vec![
                        PropertyMatcher::equals("RuntimeIdentifier", HOST_RUNTIME_IDENTIFIER),
                        PropertyMatcher::contains("RuntimeIdentifiers", HOST_RUNTIME_IDENTIFIER),
                    ],
                ),
                PairRule::new(
                    vec![PropertyMatcher::equals("TargetFramework", HOST_TARGET_FRAMEWORK)],
                    vec![PropertyMatcher::equals("OutputType", EXECUTABLE_OUTPUT_TYPE)],
                ),
            ],
        }
    }
}

impl NormalizeConfig {
    /// Reads and validates a TOML rule file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates TOML text. Missing keys fall back to defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates declaration-level invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.file_pattern()?;

        let mut seen = BTreeSet::<&str>::new();
        for name in self.property_priority.iter().flatten() {
            require_name(name)?;
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicatePriority(name.clone()));
            }
        }

        for name in &self.required_properties {
            require_name(name)?;
        }

        for rule in &self.pair_rules {
            if rule.when.is_empty() || rule.require.is_empty() {
                return Err(ConfigError::EmptyRuleSide(rule.label()));
            }
            for matcher in rule.when.iter().chain(&rule.require) {
                require_name(&matcher.property)?;
                if matcher.equals.is_some() == matcher.contains.is_some() {
                    return Err(ConfigError::AmbiguousMatcher(matcher.property.clone()));
                }
            }
        }
        Ok(())
    }

    /// Compiles [`NormalizeConfig::project_file_pattern`].
    pub fn file_pattern(&self) -> Result<Regex, ConfigError> {
        Regex::new(&self.project_file_pattern).map_err(ConfigError::InvalidPattern)
    }
}

fn require_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::EmptyPropertyName);
    }
    Ok(())
}

/// Two groups of property conditions that must hold together.
///
/// When any `when` matcher holds, at least one `require` matcher must hold.
/// With `symmetric`, the implication is also checked in reverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairRule {
    pub when: Vec<PropertyMatcher>,
    pub require: Vec<PropertyMatcher>,
    #[serde(default = "default_symmetric")]
    pub symmetric: bool,
}

fn default_symmetric() -> bool {
    true
}

impl PairRule {
    pub fn new(when: Vec<PropertyMatcher>, require: Vec<PropertyMatcher>) -> Self {
        Self {
            when,
            require,
            symmetric: true,
        }
    }

    /// Human-readable name, e.g. `TargetFramework & OutputType`.
    pub fn label(&self) -> String {
        format!(
            "{} & {}",
            join_properties(&self.when),
            join_properties(&self.require)
        )
    }
}

fn join_properties(matchers: &[PropertyMatcher]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for matcher in matchers {
        if !names.contains(&matcher.property.as_str()) {
            names.push(&matcher.property);
        }
    }
    names.join("|")
}

/// Condition on a single property's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyMatcher {
    pub property: String,
    /// Exact, case-sensitive value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equals: Option<String>,
    /// Substring, for list-valued properties such as `RuntimeIdentifiers`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
}

impl PropertyMatcher {
    pub fn equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            equals: Some(value.into()),
            contains: None,
        }
    }

    pub fn contains(property: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            equals: None,
            contains: Some(needle.into()),
        }
    }

    /// Tests one `(name, value)` pair.
    pub fn matches(&self, name: &str, value: &str) -> bool {
        if name != self.property {
            return false;
        }
        match (&self.equals, &self.contains) {
            (Some(expected), None) => value == expected,
            (None, Some(needle)) => value.contains(needle.as_str()),
            _ => false,
        }
    }
}

/// Failure to load or validate a rule file.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    InvalidPattern(regex::Error),
    EmptyPropertyName,
    DuplicatePriority(String),
    EmptyRuleSide(String),
    AmbiguousMatcher(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::InvalidPattern(err) => write!(f, "invalid project_file_pattern: {err}"),
            Self::EmptyPropertyName => write!(f, "property names cannot be empty"),
            Self::DuplicatePriority(name) => {
                write!(f, "property `{name}` appears in more than one priority tier")
            }
            Self::EmptyRuleSide(label) => {
                write!(f, "pair rule `{label}` needs both `when` and `require` matchers")
            }
            Self::AmbiguousMatcher(property) => write!(
                f,
                "matcher for `{property}` must set exactly one of `equals` or `contains`"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidPattern(err) => Some(err),
            Self::EmptyPropertyName
            | Self::DuplicatePriority(_)
            | Self::EmptyRuleSide(_)
            | Self::AmbiguousMatcher(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, NormalizeConfig, PropertyMatcher};

    #[test]
    fn default_config_is_valid_and_labels_match_reference_text() {
        let config = NormalizeConfig::default();
        config.validate().expect("defaults should validate");
        let labels: Vec<String> = config.pair_rules.iter().map(|rule| rule.label()).collect();
        assert_eq!(
            labels,
            vec![
                "TargetFramework & RuntimeIdentifier|RuntimeIdentifiers".to_string(),
                "TargetFramework & OutputType".to_string(),
            ]
        );
    }

    #[test]
    fn default_pattern_selects_project_files_only() {
        let pattern = NormalizeConfig::default()
            .file_pattern()
            .expect("default pattern compiles");
        assert!(pattern.is_match("App.csproj"));
        assert!(pattern.is_match("Native.VCXPROJ"));
        assert!(pattern.is_match("build.proj"));
        assert!(!pattern.is_match("App.csproj.user"));
        assert!(!pattern.is_match("Directory.Build.props"));
    }

    #[test]
    fn matcher_supports_equality_and_containment() {
        let exact = PropertyMatcher::equals("OutputType", "Exe");
        assert!(exact.matches("OutputType", "Exe"));
        assert!(!exact.matches("OutputType", "exe"));
        assert!(!exact.matches("Output", "Exe"));

        let list = PropertyMatcher::contains("RuntimeIdentifiers", "win-x64");
        assert!(list.matches("RuntimeIdentifiers", "linux-x64;win-x64"));
        assert!(!list.matches("RuntimeIdentifiers", "linux-x64"));
    }

    #[test]
    fn toml_overrides_keep_remaining_defaults() {
        let config = NormalizeConfig::from_toml_str(
            r#"
required_properties = ["AssemblyName"]

[[pair_rules]]
when = [{ property = "OutputType", equals = "Exe" }]
require = [{ property = "RuntimeIdentifiers", contains = "win-x64" }]
symmetric = false
"#,
        )
        .expect("config should parse");

        assert_eq!(config.required_properties, vec!["AssemblyName".to_string()]);
        assert_eq!(config.pair_rules.len(), 1);
        assert!(!config.pair_rules[0].symmetric);
        assert_eq!(
            config.property_priority,
            NormalizeConfig::default().property_priority
        );
    }

    #[test]
    fn validation_rejects_bad_declarations() {
        let both = NormalizeConfig::from_toml_str(
            r#"
[[pair_rules]]
when = [{ property = "A", equals = "1", contains = "1" }]
require = [{ property = "B", equals = "2" }]
"#,
        )
        .expect_err("matcher with two tests must be rejected");
        assert!(matches!(both, ConfigError::AmbiguousMatcher(name) if name == "A"));

        let duplicate = NormalizeConfig::from_toml_str(
            r#"property_priority = [["OutputType"], ["AssemblyName", "OutputType"]]"#,
        )
        .expect_err("duplicate tier entry must be rejected");
        assert!(matches!(duplicate, ConfigError::DuplicatePriority(name) if name == "OutputType"));

        let pattern = NormalizeConfig::from_toml_str(r#"project_file_pattern = "(""#)
            .expect_err("broken regex must be rejected");
        assert!(matches!(pattern, ConfigError::InvalidPattern(_)));

        let unknown = NormalizeConfig::from_toml_str("sort_items = false")
            .expect_err("unknown keys must be rejected");
        assert!(matches!(unknown, ConfigError::Parse(_)));
    }
}
