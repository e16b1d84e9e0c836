//! Campus → notification recipient lookup.

use std::path::Path;

use serde::Deserialize;

use crate::catalog::DEFAULT_CAMPUSES;
use crate::config::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CampusContact {
    pub campus: String,
    pub email: String,
}

/// Ordered campus table. The first entry is the fallback recipient for any
/// campus name that is not listed.
#[derive(Clone, Debug)]
pub struct CampusDirectory {
    contacts: Vec<CampusContact>,
}

impl CampusDirectory {
    pub fn new(contacts: Vec<CampusContact>) -> Result<Self, ConfigError> {
        if contacts.is_empty() {
            return Err(ConfigError::Invalid {
                key: "PORTAL_CAMPUS_DIRECTORY".to_string(),
                reason: "campus directory must list at least one campus".to_string(),
            });
        }
        Ok(Self { contacts })
    }

    /// Load a JSON array of `{ "campus": ..., "email": ... }` objects.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Invalid {
            key: "PORTAL_CAMPUS_DIRECTORY".to_string(),
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let contacts: Vec<CampusContact> =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Invalid {
                key: "PORTAL_CAMPUS_DIRECTORY".to_string(),
                reason: format!("invalid campus directory {}: {}", path.display(), e),
            })?;
        Self::new(contacts)
    }

    pub fn recipient_for(&self, campus: &str) -> &str {
        self.contacts
            .iter()
            .find(|contact| contact.campus == campus)
            .unwrap_or(&self.contacts[0])
            .email
            .as_str()
    }

    pub fn campuses(&self) -> impl Iterator<Item = &str> {
        self.contacts.iter().map(|contact| contact.campus.as_str())
    }
}

impl Default for CampusDirectory {
    fn default() -> Self {
        let emails = [
            "saisathyajain@sssihl.edu.in",
            "results@sssihl.edu.in",
            "sathyajain9@gmail.com",
            "sathyajain99@outlook.com",
        ];
        Self {
            contacts: DEFAULT_CAMPUSES
                .iter()
                .zip(emails)
                .map(|(campus, email)| CampusContact {
                    campus: campus.to_string(),
                    email: email.to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_known_campuses_resolve() {
        let directory = CampusDirectory::default();
        assert_eq!(
            directory.recipient_for("Prashanti Nilayam Campus"),
            "saisathyajain@sssihl.edu.in"
        );
        assert_eq!(directory.recipient_for("Anantapur Campus"), "results@sssihl.edu.in");
        assert_eq!(directory.recipient_for("Brindavan Campus"), "sathyajain9@gmail.com");
        assert_eq!(directory.recipient_for("Nandigiri Campus"), "sathyajain99@outlook.com");
    }

    #[test]
    fn test_unknown_campus_falls_back_to_first() {
        let directory = CampusDirectory::default();
        assert_eq!(directory.recipient_for(""), "saisathyajain@sssihl.edu.in");
        assert_eq!(directory.recipient_for("anantapur campus"), "saisathyajain@sssihl.edu.in");
        assert_eq!(directory.recipient_for("Main Campus"), "saisathyajain@sssihl.edu.in");
    }

    #[test]
    fn test_empty_directory_rejected() {
        assert!(CampusDirectory::new(Vec::new()).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("campuses.json");
        std::fs::write(
            &path,
            r#"[{"campus": "North", "email": "north@example.edu"},
                {"campus": "South", "email": "south@example.edu"}]"#,
        )
        .unwrap();

        let directory = CampusDirectory::from_file(&path).unwrap();
        assert_eq!(directory.recipient_for("South"), "south@example.edu");
        assert_eq!(directory.recipient_for("East"), "north@example.edu");
        assert_eq!(directory.campuses().collect::<Vec<_>>(), vec!["North", "South"]);

        std::fs::write(&path, "[]").unwrap();
        assert!(CampusDirectory::from_file(&path).is_err());
    }
}
