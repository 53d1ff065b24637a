//! Candidate objects offered to the cart by search and browse pages.

use serde::{Deserialize, Serialize};

/// An object that could be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type", default)]
    pub types: Vec<String>,
}

impl CartItem {
    pub fn new<I, S>(id: impl Into<String>, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            types: types.into_iter().map(Into::into).collect(),
        }
    }
}
