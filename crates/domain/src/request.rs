//! Request types
//!
//! The request-shaped object handed to the renderer. Every string field
//! may contain template expressions; ids and the method never do.

use serde::{Deserialize, Serialize};

use crate::id::generate_id;

/// A single HTTP header entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

impl Header {
    /// Creates a header entry.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A stored request definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Unique identifier.
    pub id: String,

    /// Owning request group, or `None` at workspace level.
    pub parent_id: Option<String>,

    /// Display name.
    pub name: String,

    /// HTTP method verb.
    pub method: String,

    /// Target URL, may contain template expressions.
    pub url: String,

    /// Header entries in declaration order.
    #[serde(default)]
    pub headers: Vec<Header>,

    /// Raw request body, if any.
    #[serde(default)]
    pub body: Option<String>,
}

impl Request {
    /// Creates a request with the given name, method, and URL.
    #[must_use]
    pub fn new(name: impl Into<String>, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            parent_id: None,
            name: name.into(),
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Places the request inside a group.
    #[must_use]
    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.parent_id = Some(group_id.into());
        self
    }

    /// Appends a header entry.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push(Header::new(name, value));
    }

    /// Looks up a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut request = Request::new("login", "POST", "https://example.com/login");
        request.add_header("Content-Type", "application/json");

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(request.header("accept"), None);
    }

    #[test]
    fn test_in_group() {
        let request = Request::new("r", "GET", "https://example.com").in_group("grp_1");
        assert_eq!(request.parent_id.as_deref(), Some("grp_1"));
    }
}
