use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MergeError;

/// Merge policy for one field.
///
/// Scalar codes decide whether a field is written from the presence of the
/// value on each side. Vector codes (prefixed `X`) combine arrays with set or
/// sequence operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateCode {
    /// Touch: a blank update.
    T,
    /// Create: the source is the whole instance.
    C,
    /// Ignore the change.
    N,
    /// Accept any change.
    Y,
    /// Insert or update, never delete.
    B,
    /// Update or delete only.
    U,
    /// Update only when both sides have a value.
    H,
    /// Insert only.
    I,
    /// Delete only.
    D,
    /// Replace the whole array.
    XR,
    /// Set union.
    XM,
    /// Set difference: remove the given values.
    XD,
    /// Set intersection: remove values the source lacks.
    XI,
    /// Append source after target, keeping duplicates.
    XS,
    /// Prepend source before target, keeping duplicates.
    XF,
}

impl UpdateCode {
    pub const ALL: [Self; 15] = [
        Self::T,
        Self::C,
        Self::N,
        Self::Y,
        Self::B,
        Self::U,
        Self::H,
        Self::I,
        Self::D,
        Self::XR,
        Self::XM,
        Self::XD,
        Self::XI,
        Self::XS,
        Self::XF,
    ];

    /// The token this code is written as.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::T => "T",
            Self::C => "C",
            Self::N => "N",
            Self::Y => "Y",
            Self::B => "B",
            Self::U => "U",
            Self::H => "H",
            Self::I => "I",
            Self::D => "D",
            Self::XR => "XR",
            Self::XM => "XM",
            Self::XD => "XD",
            Self::XI => "XI",
            Self::XS => "XS",
            Self::XF => "XF",
        }
    }

    /// Whether this code is handled as an array operation.
    pub fn is_vector(self) -> bool {
        matches!(
            self,
            Self::XR | Self::XM | Self::XD | Self::XI | Self::XS | Self::XF
        )
    }

    /// What a field merged under this code may undergo.
    pub fn info(self) -> UpdateCodeInfo {
        let unset = matches!(
            self,
            Self::Y | Self::D | Self::U | Self::XR | Self::XD | Self::XI
        );
        let insert = matches!(
            self,
            Self::Y | Self::I | Self::B | Self::XR | Self::XM | Self::XS | Self::XF
        );
        let update = matches!(self, Self::Y | Self::H | Self::U | Self::B) || self.is_vector();
        UpdateCodeInfo {
            insert,
            update,
            unset,
            enable: insert || update || unset,
        }
    }
}

impl fmt::Display for UpdateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateCode {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| MergeError::InvalidCode {
                code: s.to_string(),
            })
    }
}

/// Capabilities of an [`UpdateCode`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCodeInfo {
    /// May create a field the target lacks.
    pub insert: bool,
    /// May change a field the target has.
    pub update: bool,
    /// May remove a field.
    pub unset: bool,
    /// Any of the above.
    pub enable: bool,
}
