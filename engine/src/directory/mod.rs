//! Directory loading and merging
//!
//! The people directory is assembled from two JSON sources: a structured
//! team contact list and a user-profile store. Both are optional on disk;
//! entries are merged by lowercased email, and profile entries win on
//! collision because the profile store is the fresher source.
//!
//! Directory data is read-only within a request. Writes to it (adding or
//! removing a contact) happen out of band and are never assumed atomic with
//! any in-flight resolution.

use std::fs;
use std::path::Path;

use sdk::capability::Directory;
use sdk::errors::{CapabilityError, EngineError};
use sdk::types::Person;
use serde::Deserialize;
use tracing::{debug, warn};

/// Team contacts file shape: `{"employees": [{...}]}`
#[derive(Debug, Deserialize)]
struct ContactsFile {
    #[serde(default)]
    employees: Vec<ContactEntry>,
}

#[derive(Debug, Deserialize)]
struct ContactEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    department: Option<String>,
}

/// User profiles file shape: `{"users": {"email": {...}}}`
#[derive(Debug, Deserialize)]
struct ProfilesFile {
    #[serde(default)]
    users: std::collections::BTreeMap<String, ProfileEntry>,
}

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// A directory backed by the two merged JSON sources.
pub struct JsonDirectory {
    people: Vec<Person>,
}

impl JsonDirectory {
    /// Load and merge both sources.
    ///
    /// A missing file is treated as an empty source. A file that exists but
    /// fails to parse is an error: a half-loaded directory would silently
    /// mis-resolve names.
    pub fn load(contacts_path: &Path, profiles_path: &Path) -> Result<Self, EngineError> {
        let mut people: Vec<Person> = Vec::new();

        if contacts_path.exists() {
            let raw = fs::read_to_string(contacts_path).map_err(|e| {
                EngineError::Directory(format!(
                    "Failed to read {}: {}",
                    contacts_path.display(),
                    e
                ))
            })?;
            let parsed: ContactsFile = serde_json::from_str(&raw).map_err(|e| {
                EngineError::Directory(format!(
                    "Failed to parse {}: {}",
                    contacts_path.display(),
                    e
                ))
            })?;
            for entry in parsed.employees {
                if entry.name.is_empty() || entry.email.is_empty() {
                    continue;
                }
                people.push(Person {
                    name: entry.name,
                    email: entry.email,
                    role: entry.role,
                    department: entry.department,
                });
            }
        } else {
            warn!(
                "Team contacts file not found at {}, continuing without it",
                contacts_path.display()
            );
        }

        if profiles_path.exists() {
            let raw = fs::read_to_string(profiles_path).map_err(|e| {
                EngineError::Directory(format!(
                    "Failed to read {}: {}",
                    profiles_path.display(),
                    e
                ))
            })?;
            let parsed: ProfilesFile = serde_json::from_str(&raw).map_err(|e| {
                EngineError::Directory(format!(
                    "Failed to parse {}: {}",
                    profiles_path.display(),
                    e
                ))
            })?;
            for (key, entry) in parsed.users {
                let email = entry.email.unwrap_or(key);
                if entry.name.is_empty() || email.is_empty() {
                    continue;
                }
                merge_person(
                    &mut people,
                    Person {
                        name: entry.name,
                        email,
                        role: entry.role,
                        department: None,
                    },
                );
            }
        } else {
            warn!(
                "User profiles file not found at {}, continuing without it",
                profiles_path.display()
            );
        }

        debug!("Directory loaded with {} people", people.len());
        Ok(Self { people })
    }

    /// Build a directory from an in-memory list (fixtures and tests).
    pub fn from_people(people: Vec<Person>) -> Self {
        Self { people }
    }

    /// Number of entries after merging
    pub fn len(&self) -> usize {
        self.people.len()
    }

    /// True when both sources were empty or missing
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

/// Replace an existing entry with the same email, or append.
fn merge_person(people: &mut Vec<Person>, person: Person) {
    let key = person.email.to_lowercase();
    if let Some(existing) = people.iter_mut().find(|p| p.email.to_lowercase() == key) {
        *existing = person;
    } else {
        people.push(person);
    }
}

impl Directory for JsonDirectory {
    fn list_people(&self) -> Result<Vec<Person>, CapabilityError> {
        Ok(self.people.clone())
    }
}
