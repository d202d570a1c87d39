// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

/// The closed set of financial attributes the protocol understands. Both
/// encrypted records and tasks are tagged with one of these; the
/// cipher-compute service refuses anything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    MonthlyIncome,
    CreditScore,
    PropertyValue,
}

impl DataType {
    pub const ALL: [DataType; 3] = [
        DataType::MonthlyIncome,
        DataType::CreditScore,
        DataType::PropertyValue,
    ];

    /// Wire form used by the cipher-compute service and the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::MonthlyIncome => "monthly_income",
            DataType::CreditScore => "credit_score",
            DataType::PropertyValue => "property_value",
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unsupported data type tag: {0:?}")]
pub struct InvalidDataType(pub String);

impl FromStr for DataType {
    type Err = InvalidDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly_income" => Ok(DataType::MonthlyIncome),
            "credit_score" => Ok(DataType::CreditScore),
            "property_value" => Ok(DataType::PropertyValue),
            other => Err(InvalidDataType(other.to_string())),
        }
    }
}
