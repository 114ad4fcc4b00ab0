//! User roster parsing
//!
//! A roster is written `email,name;email,name`. Whitespace around each
//! field is ignored, as are empty entries.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ProvisionError;

/// One user to provision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSpec {
    /// Login email
    pub email: String,
    /// Display name
    pub name: String,
}

impl UserSpec {
    /// Create user entry
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// Users to provision, in roster order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRoster(Vec<UserSpec>);

impl UserRoster {
    /// Empty roster
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user
    #[must_use]
    pub fn with_user(mut self, email: impl Into<String>, name: impl Into<String>) -> Self {
        self.0.push(UserSpec::new(email, name));
        self
    }

    /// Iterate entries
    pub fn iter(&self) -> impl Iterator<Item = &UserSpec> {
        self.0.iter()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check for no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for UserRoster {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(';')
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| {
                let fields: Vec<&str> = entry.split(',').map(str::trim).collect();
                match fields.as_slice() {
                    [email, name] if !email.is_empty() && !name.is_empty() => Ok(UserSpec::new(*email, *name)),
                    _ => Err(ProvisionError::InvalidRoster(format!(
                        "expected 'email,name', got '{}'",
                        entry.trim()
                    ))),
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl Display for UserRoster {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self.0.iter().map(|u| format!("{},{}", u.email, u.name)).collect();
        write!(f, "{}", entries.join(";"))
    }
}

impl<'a> IntoIterator for &'a UserRoster {
    type Item = &'a UserSpec;
    type IntoIter = std::slice::Iter<'a, UserSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
