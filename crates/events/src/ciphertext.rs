// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Opaque ciphertext token issued by the cipher-compute service. The
/// protocol never inspects the contents; it only moves the token between
/// the service and the ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ciphertext(String);

impl Ciphertext {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Ciphertext {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens can be kilobytes long; keep log lines readable.
        match self.0.get(..16) {
            Some(prefix) if self.0.len() > 16 => write!(f, "{}…", prefix),
            _ => write!(f, "{}", self.0),
        }
    }
}
