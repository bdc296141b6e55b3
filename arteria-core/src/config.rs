//! Configuration types
//!
//! Pure data; the embedding process decides where the values come from.

use crate::identity::OrgDirectory;
use serde::{Deserialize, Serialize};

/// A single credential→organization table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMapping {
    /// Credential as presented by the gateway, e.g. "MedicalMSP".
    pub credential: String,
    /// Organization it acts for, e.g. "medical".
    pub organization: String,
}

/// Top-level configuration for an ARTERIA deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArteriaConfig {
    /// Credential→organization table. Adding an organization is a config
    /// change, never a code change in reservation logic.
    pub organizations: Vec<OrgMapping>,
}

impl Default for ArteriaConfig {
    fn default() -> Self {
        Self {
            organizations: vec![
                OrgMapping {
                    credential: "MedicalMSP".to_string(),
                    organization: "medical".to_string(),
                },
                OrgMapping {
                    credential: "PoliceMSP".to_string(),
                    organization: "police".to_string(),
                },
            ],
        }
    }
}

impl ArteriaConfig {
    /// Build the injected lookup table from this configuration.
    pub fn directory(&self) -> OrgDirectory {
        self.organizations
            .iter()
            .fold(OrgDirectory::new(), |dir, m| {
                dir.with_mapping(m.credential.clone(), m.organization.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Credential;

    #[test]
    fn test_default_config_matches_standard_directory() {
        let dir = ArteriaConfig::default().directory();
        assert_eq!(&dir, OrgDirectory::standard());
    }

    #[test]
    fn test_extra_org_flows_into_directory() {
        let mut config = ArteriaConfig::default();
        config.organizations.push(OrgMapping {
            credential: "FireMSP".to_string(),
            organization: "fire".to_string(),
        });
        let dir = config.directory();
        assert_eq!(
            dir.resolve(&Credential::from("FireMSP")).unwrap().as_str(),
            "fire"
        );
    }
}
