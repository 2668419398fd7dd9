//! Value objects for the abonent domain.

use serde::{Deserialize, Serialize};

use super::AbonentError;

/// Abonent name: surname and name are required, patronymic is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbonentName {
    name: String,
    surname: String,
    patronymic: Option<String>,
}

impl AbonentName {
    /// Creates a validated abonent name.
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        patronymic: Option<String>,
    ) -> Result<Self, AbonentError> {
        let name = name.into();
        let surname = surname.into();
        if name.trim().is_empty() {
            return Err(AbonentError::InvalidName);
        }
        if surname.trim().is_empty() {
            return Err(AbonentError::InvalidSurname);
        }
        Ok(Self {
            name,
            surname,
            patronymic,
        })
    }

    /// First name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last name.
    pub fn surname(&self) -> &str {
        &self.surname
    }

    /// Middle name, if any.
    pub fn patronymic(&self) -> Option<&str> {
        self.patronymic.as_deref()
    }
}

impl std::fmt::Display for AbonentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.surname, self.name)?;
        if let Some(patronymic) = &self.patronymic {
            write!(f, " {patronymic}")?;
        }
        Ok(())
    }
}

/// Email address with structural validation.
///
/// Uniqueness is a persistence concern: the store enforces it with a unique
/// constraint and the register use case translates the violation into the
/// "email already exists" outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Creates a validated email.
    pub fn new(value: impl Into<String>) -> Result<Self, AbonentError> {
        let value = value.into();
        if !Self::is_valid(&value) {
            return Err(AbonentError::InvalidEmail { email: value });
        }
        Ok(Self(value))
    }

    fn is_valid(value: &str) -> bool {
        if value.chars().any(char::is_whitespace) {
            return false;
        }
        let Some((local, domain)) = value.split_once('@') else {
            return false;
        };
        !local.is_empty()
            && !domain.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    }

    /// Returns the email as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
