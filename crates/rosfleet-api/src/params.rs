// ── Command parameters ──
//
// Attributes (`=name=value` words in the binary API) are an unordered
// mapping. Queries (`?name=value` words) filter `print` results and are
// kept in insertion order because RouterOS evaluates them as a stack.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Attribute and query words for one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    attributes: BTreeMap<String, String>,
    queries: Vec<String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value for the same key.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add an equality query (`?key=value`).
    pub fn query(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.queries
            .push(format!("{}={}", key.as_ref(), value.as_ref()));
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.queries.is_empty()
    }

    /// Queries split back into `(key, value)` pairs.
    pub fn query_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.queries
            .iter()
            .filter_map(|q| q.split_once('='))
    }

    /// JSON body for the REST command bridge: attributes as top-level
    /// fields, queries under `.query`.
    pub fn to_json(&self) -> Value {
        let mut body: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        if !self.queries.is_empty() {
            body.insert(
                ".query".into(),
                Value::Array(self.queries.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(body)
    }

    /// Compact `key=value` rendering for logs and error reports.
    pub fn summary(&self) -> String {
        self.attributes
            .iter()
            .filter(|(k, _)| k.as_str() != "comment")
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            attributes: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            queries: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn attributes_are_order_independent() {
        let a = Params::new().attr("gateway", "10.0.0.1").attr("distance", "1");
        let b = Params::new().attr("distance", "1").attr("gateway", "10.0.0.1");
        assert_eq!(a, b);
    }

    #[test]
    fn json_body_carries_queries() {
        let p = Params::new()
            .attr("name", "ether1")
            .query("comment", "API_MANAGED")
            .query("interface", "bridge");
        assert_eq!(
            p.to_json(),
            json!({
                "name": "ether1",
                ".query": ["comment=API_MANAGED", "interface=bridge"],
            })
        );
    }

    #[test]
    fn summary_skips_comment() {
        let p = Params::new()
            .attr("dst-address", "0.0.0.0/0")
            .attr("comment", "API_MANAGED")
            .attr("gateway", "10.0.0.1");
        assert_eq!(p.summary(), "dst-address=0.0.0.0/0 gateway=10.0.0.1");
    }

    #[test]
    fn query_pairs_round_trip() {
        let p = Params::new().query("comment", "API_MANAGED");
        assert_eq!(p.query_pairs().collect::<Vec<_>>(), [("comment", "API_MANAGED")]);
    }
}
