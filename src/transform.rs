use regex::Regex;

use crate::results::{Binding, ResultSet, Results, ENTITY_VAR};

/// Rewrites entity URIs like `https://web.bdij.com.br/entity/Q1` into
/// internal wiki links like `[[Item:Q1|Q1]]`.
#[derive(Debug, Clone)]
pub struct EntityLinker {
    pattern: Regex,
    namespace: String,
}

impl EntityLinker {
    pub fn new(entity_base: &str, namespace: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"^{}([A-Za-z]\d+)$", regex::escape(entity_base)))?;
        Ok(Self {
            pattern,
            namespace: namespace.to_string(),
        })
    }

    /// Link markup for `value`, or `None` when it is not an entity URI.
    pub fn link(&self, value: &str) -> Option<String> {
        let id = self.pattern.captures(value)?.get(1)?.as_str();
        Some(format!("[[{}:{}|{}]]", self.namespace, id, id))
    }

    /// New result set with every matching `item` value linked.
    pub fn apply(&self, results: &ResultSet) -> ResultSet {
        let Some(bindings) = results.bindings() else {
            return results.clone();
        };

        ResultSet {
            head: results.head.clone(),
            results: Some(Results {
                bindings: Some(bindings.iter().map(|b| self.apply_binding(b)).collect()),
            }),
        }
    }

    fn apply_binding(&self, binding: &Binding) -> Binding {
        let mut out = binding.clone();
        if let Some(Some(term)) = out.get_mut(ENTITY_VAR) {
            if let Some(linked) = term.value.as_deref().and_then(|v| self.link(v)) {
                term.value = Some(linked);
            }
        }
        out
    }
}
