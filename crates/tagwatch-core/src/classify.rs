//! Allow-list classification of credential identifiers.
//!
//! Classification is a pure, total function: every identifier maps to exactly
//! one [`IdentityCategory`], and anything that is not byte-for-byte equal to
//! one of the two reference identifiers is `Unknown`.
//!
//! ```
//! use tagwatch_core::{CredentialId, IdentityCategory, classify};
//!
//! let card = CredentialId::new(vec![0x99, 0xB6, 0xB3, 0x02]).unwrap();
//! assert_eq!(classify(&card), IdentityCategory::CategoryA);
//!
//! let stranger = CredentialId::new(vec![0x01, 0x02, 0x03, 0x04]).unwrap();
//! assert_eq!(classify(&stranger), IdentityCategory::Unknown);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CATEGORY_A_UID, DEFAULT_CATEGORY_B_UID};
use crate::error::{Error, Result};
use crate::types::{CredentialId, IdentityCategory};

/// The two reference identifiers of the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawReferenceIds")]
pub struct ReferenceIds {
    category_a: CredentialId,
    category_b: CredentialId,
}

#[derive(Deserialize)]
struct RawReferenceIds {
    category_a: CredentialId,
    category_b: CredentialId,
}

impl TryFrom<RawReferenceIds> for ReferenceIds {
    type Error = Error;

    fn try_from(raw: RawReferenceIds) -> Result<Self> {
        Self::new(raw.category_a, raw.category_b)
    }
}

impl ReferenceIds {
    /// Create a reference pair.
    ///
    /// # Errors
    /// Returns `Error::Config` if the two references differ in length or are
    /// identical (the second category could never be reached).
    pub fn new(category_a: CredentialId, category_b: CredentialId) -> Result<Self> {
        if category_a.len() != category_b.len() {
            return Err(Error::Config(format!(
                "Reference identifiers must have the same length, got {} and {}",
                category_a.len(),
                category_b.len()
            )));
        }
        if category_a == category_b {
            return Err(Error::Config(
                "Reference identifiers must differ".to_string(),
            ));
        }
        Ok(Self {
            category_a,
            category_b,
        })
    }

    /// Reference identifier for `CategoryA`.
    #[must_use]
    pub fn category_a(&self) -> &CredentialId {
        &self.category_a
    }

    /// Reference identifier for `CategoryB`.
    #[must_use]
    pub fn category_b(&self) -> &CredentialId {
        &self.category_b
    }

    /// Classify an identifier against this pair.
    #[must_use]
    pub fn classify(&self, id: &CredentialId) -> IdentityCategory {
        if id.len() != self.category_a.len() {
            return IdentityCategory::Unknown;
        }

        if *id == self.category_a {
            IdentityCategory::CategoryA
        } else if *id == self.category_b {
            IdentityCategory::CategoryB
        } else {
            IdentityCategory::Unknown
        }
    }
}

impl Default for ReferenceIds {
    fn default() -> Self {
        Self {
            category_a: CredentialId(DEFAULT_CATEGORY_A_UID.to_vec()),
            category_b: CredentialId(DEFAULT_CATEGORY_B_UID.to_vec()),
        }
    }
}

/// Classify against the built-in reference identifiers.
#[must_use]
pub fn classify(id: &CredentialId) -> IdentityCategory {
    ReferenceIds::default().classify(id)
}
