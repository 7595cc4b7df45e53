use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Variable holding the entity URI in each binding.
pub const ENTITY_VAR: &str = "item";
pub const LABEL_VAR: &str = "itemLabel";
pub const DESCRIPTION_VAR: &str = "itemDescription";
pub const ALIAS_VAR: &str = "itemAltLabel";

/// A SPARQL JSON results document.
///
/// Every level is optional so that an incomplete document still decodes;
/// the table formatter decides what to do with the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Head>,
    #[serde(default)]
    pub results: Option<Results>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    #[serde(default)]
    pub bindings: Option<Vec<Binding>>,
}

/// One result row: variable name → term. A `null` term decodes as `None`.
pub type Binding = BTreeMap<String, Option<Term>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

impl ResultSet {
    /// The bindings list, or `None` when the document lacks `results` or
    /// `results.bindings`.
    pub fn bindings(&self) -> Option<&[Binding]> {
        self.results.as_ref()?.bindings.as_deref()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Option<ResultSet>> {
        serde_json::from_str(json)
    }
}

/// Non-empty value of `var` in `binding`; absent, `null` and empty all read
/// as `None`.
pub fn value<'a>(binding: &'a Binding, var: &str) -> Option<&'a str> {
    binding
        .get(var)?
        .as_ref()?
        .value
        .as_deref()
        .filter(|v| !v.is_empty())
}
