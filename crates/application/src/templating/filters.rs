//! Response body filters
//!
//! The `response` tag extracts a value from a stored body using a
//! JSONPath subset for JSON content and an element path for XML
//! content. Supported JSON paths: `$`, dot segments, `field[0]`,
//! `field[*]`. Supported XML paths: `/a/b/c`, `//tag`, with an optional
//! trailing `@attr` segment.

use serde_json::Value;

use super::error::ExtensionError;

/// Applies a JSONPath-subset filter to a JSON body.
///
/// # Errors
///
/// Returns [`ExtensionError::Filter`] when the body is not valid JSON,
/// the path is malformed, or the path matches nothing.
pub fn filter_json(body: &str, path: &str) -> Result<Value, ExtensionError> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| ExtensionError::Filter(format!("response body is not valid JSON: {e}")))?;

    match query_json_path(&json, path)? {
        Some(value) => Ok(value),
        None => Err(ExtensionError::Filter(format!(
            "path `{path}` matched nothing"
        ))),
    }
}

fn query_json_path(json: &Value, path: &str) -> Result<Option<Value>, ExtensionError> {
    let path = path.trim();
    let Some(path) = path.strip_prefix('$') else {
        return Err(ExtensionError::Filter(
            "JSON path must start with '$'".to_string(),
        ));
    };
    if path.is_empty() {
        return Ok(Some(json.clone()));
    }

    let path = path.strip_prefix('.').unwrap_or(path);
    let mut current = json.clone();

    for segment in split_path_segments(path) {
        if let Some((name, index)) = parse_array_access(&segment) {
            if !name.is_empty() {
                current = match current.get(&name) {
                    Some(v) => v.clone(),
                    None => return Ok(None),
                };
            }
            if index == "*" {
                // Wildcard returns the whole array
                continue;
            }
            let idx: usize = index
                .parse()
                .map_err(|_| ExtensionError::Filter(format!("invalid array index: {index}")))?;
            current = match current.get(idx) {
                Some(v) => v.clone(),
                None => return Ok(None),
            };
        } else {
            current = match current.get(&segment) {
                Some(v) => v.clone(),
                None => return Ok(None),
            };
        }
    }

    Ok(Some(current))
}

/// Split a path into segments, respecting array brackets.
fn split_path_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_bracket = false;

    for ch in path.chars() {
        match ch {
            '.' if !in_bracket => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            '[' => {
                in_bracket = true;
                current.push(ch);
            }
            ']' => {
                in_bracket = false;
                current.push(ch);
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Parse array access like "field[0]" into ("field", "0").
fn parse_array_access(segment: &str) -> Option<(String, String)> {
    let bracket_start = segment.find('[')?;
    if !segment.ends_with(']') {
        return None;
    }
    let name = segment[..bracket_start].to_string();
    let index = segment[bracket_start + 1..segment.len() - 1].to_string();
    Some((name, index))
}

/// Applies an element-path filter to an XML body.
///
/// # Errors
///
/// Returns [`ExtensionError::Filter`] when the body is not well-formed
/// enough to scan, the path is malformed, or nothing matches.
pub fn filter_xml(body: &str, path: &str) -> Result<Value, ExtensionError> {
    let (anywhere, segments, attr) = parse_xml_path(path)?;
    let events = scan_xml(body)?;

    let mut stack: Vec<String> = Vec::new();
    let mut capturing_depth: Option<usize> = None;
    let mut captured = String::new();

    for event in events {
        match event {
            XmlEvent::Open {
                name,
                attrs,
                self_closing,
            } => {
                stack.push(name);
                if capturing_depth.is_none() && path_matches(&stack, &segments, anywhere) {
                    if let Some(attr_name) = &attr {
                        return attrs
                            .iter()
                            .find(|(n, _)| n == attr_name)
                            .map(|(_, v)| Value::String(v.clone()))
                            .ok_or_else(|| {
                                ExtensionError::Filter(format!(
                                    "attribute `{attr_name}` not present on matched element"
                                ))
                            });
                    }
                    if self_closing {
                        return Ok(Value::String(String::new()));
                    }
                    capturing_depth = Some(stack.len());
                }
                if self_closing {
                    stack.pop();
                }
            }
            XmlEvent::Close => {
                if capturing_depth == Some(stack.len()) {
                    return Ok(Value::String(captured.trim().to_string()));
                }
                stack.pop();
            }
            XmlEvent::Text(text) => {
                if capturing_depth.is_some() {
                    captured.push_str(&text);
                }
            }
        }
    }

    Err(ExtensionError::Filter(format!(
        "path `{path}` matched nothing"
    )))
}

fn parse_xml_path(path: &str) -> Result<(bool, Vec<String>, Option<String>), ExtensionError> {
    let path = path.trim();
    let (anywhere, rest) = if let Some(rest) = path.strip_prefix("//") {
        (true, rest)
    } else if let Some(rest) = path.strip_prefix('/') {
        (false, rest)
    } else {
        return Err(ExtensionError::Filter(
            "XML path must start with '/' or '//'".to_string(),
        ));
    };

    let mut segments: Vec<String> = Vec::new();
    let mut attr = None;
    for segment in rest.split('/') {
        if segment.is_empty() {
            return Err(ExtensionError::Filter(format!("malformed XML path `{path}`")));
        }
        if let Some(attr_name) = segment.strip_prefix('@') {
            attr = Some(attr_name.to_string());
        } else {
            segments.push(segment.to_string());
        }
    }
    if segments.is_empty() {
        return Err(ExtensionError::Filter(format!("malformed XML path `{path}`")));
    }

    Ok((anywhere, segments, attr))
}

fn path_matches(stack: &[String], segments: &[String], anywhere: bool) -> bool {
    if anywhere {
        stack.len() >= segments.len() && stack[stack.len() - segments.len()..] == *segments
    } else {
        stack == segments
    }
}

enum XmlEvent {
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    Close,
    Text(String),
}

/// Tolerant XML scanner: enough structure for element-path extraction,
/// not a validating parser. Comments, declarations, and processing
/// instructions are skipped; CDATA becomes text.
fn scan_xml(body: &str) -> Result<Vec<XmlEvent>, ExtensionError> {
    let mut events = Vec::new();
    let mut rest = body;

    loop {
        let Some(open) = rest.find('<') else {
            if !rest.trim().is_empty() {
                events.push(XmlEvent::Text(decode_entities(rest)));
            }
            break;
        };

        if open > 0 {
            let text = &rest[..open];
            if !text.trim().is_empty() {
                events.push(XmlEvent::Text(decode_entities(text)));
            }
        }
        rest = &rest[open..];

        if let Some(after) = rest.strip_prefix("<!--") {
            let end = after
                .find("-->")
                .ok_or_else(|| malformed("unterminated comment"))?;
            rest = &after[end + 3..];
        } else if let Some(after) = rest.strip_prefix("<![CDATA[") {
            let end = after
                .find("]]>")
                .ok_or_else(|| malformed("unterminated CDATA section"))?;
            events.push(XmlEvent::Text(after[..end].to_string()));
            rest = &after[end + 3..];
        } else if rest.starts_with("<?") || rest.starts_with("<!") {
            let end = rest.find('>').ok_or_else(|| malformed("unterminated declaration"))?;
            rest = &rest[end + 1..];
        } else if let Some(after) = rest.strip_prefix("</") {
            let end = after.find('>').ok_or_else(|| malformed("unterminated closing tag"))?;
            events.push(XmlEvent::Close);
            rest = &after[end + 1..];
        } else {
            let end = rest.find('>').ok_or_else(|| malformed("unterminated tag"))?;
            let inner = rest[1..end].trim_end();
            let self_closing = inner.ends_with('/');
            let inner = inner.trim_end_matches('/').trim_end();

            let (name, attr_text) = match inner.find(char::is_whitespace) {
                Some(split) => (&inner[..split], &inner[split..]),
                None => (inner, ""),
            };
            if name.is_empty() {
                return Err(malformed("empty tag name"));
            }

            events.push(XmlEvent::Open {
                name: name.to_string(),
                attrs: parse_attrs(attr_text),
                self_closing,
            });
            rest = &rest[end + 1..];
        }
    }

    Ok(events)
}

fn malformed(reason: &str) -> ExtensionError {
    ExtensionError::Filter(format!("response body is not valid XML: {reason}"))
}

fn parse_attrs(text: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut rest = text;

    while let Some(eq) = rest.find('=') {
        let name = rest[..eq].trim().to_string();
        let after = rest[eq + 1..].trim_start();
        let Some(quote) = after.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            break;
        };
        let Some(close) = after[1..].find(quote) else {
            break;
        };
        attrs.push((name, decode_entities(&after[1..=close])));
        rest = &after[close + 2..];
    }

    attrs
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
