//! Entity identifiers.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A unique entity reference: a `::`-joined type path plus an opaque id.
///
/// Two UIDs are equal iff both components are byte-equal. Renders as
/// `Type::"id"` with the id quoted and escaped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub struct EntityUID {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: String,
}

impl EntityUID {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        EntityUID {
            type_name: type_name.into(),
            id: id.into(),
        }
    }
}

impl Display for EntityUID {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}::\"", self.type_name)?;
        for c in self.id.chars() {
            match c {
                '"' => write!(f, "\\\"")?,
                '\\' => write!(f, "\\\\")?,
                '\n' => write!(f, "\\n")?,
                '\r' => write!(f, "\\r")?,
                '\t' => write!(f, "\\t")?,
                '\0' => write!(f, "\\0")?,
                c => write!(f, "{c}")?,
            }
        }
        write!(f, "\"")
    }
}
