//! Update policy configuration
//!
//! The update strategy, ignore rules, and registry credentials the
//! resolution engine applies. Loaded from a YAML settings file by the
//! surrounding tooling and passed in immutable.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};

/// Policy restricting which version bump types are eligible as updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    /// Admit every bump type. Equivalent to `all`.
    Major,

    /// Admit minor and patch bumps
    Minor,

    /// Admit patch bumps only
    Patch,

    /// Admit every bump type
    #[default]
    All,
}

impl UpdateStrategy {
    /// Whether a candidate of the given bump type is eligible under this strategy
    pub fn permits(&self, update_type: UpdateType) -> bool {
        match self {
            UpdateStrategy::Major | UpdateStrategy::All => true,
            UpdateStrategy::Minor => {
                matches!(update_type, UpdateType::Minor | UpdateType::Patch)
            }
            UpdateStrategy::Patch => matches!(update_type, UpdateType::Patch),
        }
    }
}

/// Classification of a candidate version relative to the current version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    Major,
    Minor,
    Patch,
}

/// User configuration suppressing updates for a named chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoreRule {
    /// Chart name the rule applies to
    pub dependency_name: String,

    /// Bump types to suppress. Absent means suppress everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_types: Option<Vec<UpdateType>>,
}

impl IgnoreRule {
    /// Whether this rule suppresses a candidate of the given bump type
    /// for the named chart
    pub fn suppresses(&self, name: &str, update_type: UpdateType) -> bool {
        if self.dependency_name != name {
            return false;
        }
        match &self.update_types {
            Some(types) => types.contains(&update_type),
            None => true,
        }
    }
}

/// Authentication scheme for a registry credential
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// Username + password sent as transport-level basic authentication
    #[default]
    Basic,

    /// Secret sent as an `Authorization: Bearer` header
    Bearer,
}

/// Credential configuration for one repository host.
///
/// At most one credential should match a given host; with overlapping
/// entries the first match in declaration order wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryCredential {
    /// Host the credential applies to (exact, case-sensitive match)
    pub registry: String,

    /// Authentication scheme
    #[serde(default)]
    pub auth_type: AuthType,

    /// Username (required for basic auth)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Secret: the basic-auth password or the bearer token
    pub password: String,
}

/// Update policy settings consumed by the resolution engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettings {
    /// Global update strategy
    #[serde(default)]
    pub update_strategy: UpdateStrategy,

    /// Ignore rules, matched by chart name
    #[serde(default)]
    pub ignore: Vec<IgnoreRule>,

    /// Credentials for authenticated repositories
    #[serde(default)]
    pub registry_credentials: Vec<RegistryCredential>,

    /// Admit pre-release versions as update candidates (default: false)
    #[serde(default)]
    pub allow_prerelease: bool,
}

impl UpdateSettings {
    /// Load settings from a YAML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check internal consistency of the settings
    pub fn validate(&self) -> Result<()> {
        for credential in &self.registry_credentials {
            if credential.registry.is_empty() {
                return Err(CoreError::InvalidConfig {
                    message: "registry credential with empty registry host".to_string(),
                });
            }
            if credential.auth_type == AuthType::Basic
                && credential.username.as_deref().unwrap_or("").is_empty()
            {
                return Err(CoreError::InvalidConfig {
                    message: format!(
                        "basic auth credential for '{}' requires a username",
                        credential.registry
                    ),
                });
            }
        }

        for rule in &self.ignore {
            if rule.dependency_name.is_empty() {
                return Err(CoreError::InvalidConfig {
                    message: "ignore rule with empty dependency name".to_string(),
                });
            }
        }

        Ok(())
    }
}
