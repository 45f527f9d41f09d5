//! Template expression parser
//!
//! Tokenizes a template into literal text, `{{ variable }}` references,
//! and `{% tag arg ... %}` invocations. Variable names may be dotted
//! paths into nested context values. Tag arguments are positional:
//! quoted strings, numbers, booleans, or bare identifiers that get
//! resolved against the context before the tag runs.

use super::error::{RenderError, RenderResult};

/// A parsed template token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal text, emitted unchanged.
    Text(String),
    /// A `{{ name }}` variable reference.
    Variable {
        /// Dotted lookup path, without the delimiters.
        path: String,
        /// The expression exactly as written, including delimiters.
        raw: String,
    },
    /// A `{% tag ... %}` invocation.
    Tag(TagCall),
}

/// A parsed tag invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TagCall {
    /// Tag name.
    pub name: String,
    /// Positional arguments in source order.
    pub args: Vec<TagArg>,
    /// The invocation exactly as written, including delimiters.
    pub raw: String,
}

/// A positional tag argument before context resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum TagArg {
    /// A quoted string literal.
    Str(String),
    /// An integer literal.
    Int(i64),
    /// A float literal.
    Float(f64),
    /// A boolean literal.
    Bool(bool),
    /// A bare identifier, resolved against the render context.
    Ident(String),
}

const SNIPPET_LEN: usize = 40;

fn snippet(input: &str, start: usize) -> String {
    input[start..].chars().take(SNIPPET_LEN).collect()
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '$' | '.')
}

fn skip_whitespace(input: &str, pos: &mut usize) {
    while let Some(ch) = input[*pos..].chars().next() {
        if !ch.is_whitespace() {
            break;
        }
        *pos += ch.len_utf8();
    }
}

fn read_while(input: &str, pos: &mut usize, pred: impl Fn(char) -> bool) -> String {
    let start = *pos;
    while let Some(ch) = input[*pos..].chars().next() {
        if !pred(ch) {
            break;
        }
        *pos += ch.len_utf8();
    }
    input[start..*pos].to_string()
}

/// Parses a template into tokens.
///
/// # Errors
///
/// Returns [`RenderError::TemplateSyntax`] when delimiters are
/// unbalanced or an expression is malformed. The message names the
/// expected token (`expected variable end`, `expected tag end`).
pub fn parse_template(input: &str) -> RenderResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let next_expr = match (rest.find("{{"), rest.find("{%")) {
            (None, None) => None,
            (Some(v), None) => Some((v, false)),
            (None, Some(t)) => Some((t, true)),
            (Some(v), Some(t)) => {
                if v <= t {
                    Some((v, false))
                } else {
                    Some((t, true))
                }
            }
        };

        let Some((offset, is_tag)) = next_expr else {
            tokens.push(Token::Text(rest.to_string()));
            break;
        };

        if offset > 0 {
            tokens.push(Token::Text(rest[..offset].to_string()));
        }

        let expr_start = pos + offset;
        let (token, end) = if is_tag {
            parse_tag(input, expr_start)?
        } else {
            parse_variable(input, expr_start)?
        };
        tokens.push(token);
        pos = end;
    }

    Ok(tokens)
}

/// Returns true if the input contains any template expression markers.
#[must_use]
pub fn has_expressions(input: &str) -> bool {
    input.contains("{{") || input.contains("{%")
}

fn parse_variable(input: &str, start: usize) -> RenderResult<(Token, usize)> {
    let mut pos = start + 2;
    skip_whitespace(input, &mut pos);

    let path = read_while(input, &mut pos, is_ident_char);
    if path.is_empty() {
        return Err(RenderError::syntax(
            snippet(input, start),
            "expected variable name",
        ));
    }

    skip_whitespace(input, &mut pos);
    if !input[pos..].starts_with("}}") {
        return Err(RenderError::syntax(
            snippet(input, start),
            "expected variable end",
        ));
    }

    let end = pos + 2;
    Ok((
        Token::Variable {
            path,
            raw: input[start..end].to_string(),
        },
        end,
    ))
}

fn parse_tag(input: &str, start: usize) -> RenderResult<(Token, usize)> {
    let mut pos = start + 2;
    skip_whitespace(input, &mut pos);

    let name = read_while(input, &mut pos, |ch| {
        ch.is_ascii_alphanumeric() || ch == '_'
    });
    if name.is_empty() {
        return Err(RenderError::syntax(
            snippet(input, start),
            "expected tag name",
        ));
    }

    let mut args = Vec::new();
    loop {
        skip_whitespace(input, &mut pos);

        if pos >= input.len() {
            return Err(RenderError::syntax(
                snippet(input, start),
                "expected tag end",
            ));
        }
        if input[pos..].starts_with("%}") {
            pos += 2;
            break;
        }

        args.push(parse_arg(input, start, &mut pos)?);
    }

    Ok((
        Token::Tag(TagCall {
            name,
            args,
            raw: input[start..pos].to_string(),
        }),
        pos,
    ))
}

fn parse_arg(input: &str, tag_start: usize, pos: &mut usize) -> RenderResult<TagArg> {
    let Some(first) = input[*pos..].chars().next() else {
        return Err(RenderError::syntax(
            snippet(input, tag_start),
            "expected tag end",
        ));
    };

    if first == '\'' || first == '"' {
        let body_start = *pos + 1;
        let Some(close) = input[body_start..].find(first) else {
            return Err(RenderError::syntax(
                snippet(input, tag_start),
                "expected closing quote",
            ));
        };
        let literal = input[body_start..body_start + close].to_string();
        *pos = body_start + close + 1;
        return Ok(TagArg::Str(literal));
    }

    let token = read_while(input, pos, |ch| {
        !ch.is_whitespace() && ch != '%' && ch != '\'' && ch != '"'
    });
    if token.is_empty() {
        return Err(RenderError::syntax(
            snippet(input, tag_start),
            "expected tag end",
        ));
    }

    match token.as_str() {
        "true" => return Ok(TagArg::Bool(true)),
        "false" => return Ok(TagArg::Bool(false)),
        _ => {}
    }
    if let Ok(int) = token.parse::<i64>() {
        return Ok(TagArg::Int(int));
    }
    if let Ok(float) = token.parse::<f64>() {
        return Ok(TagArg::Float(float));
    }
    if token.chars().all(is_ident_char) {
        return Ok(TagArg::Ident(token));
    }

    Err(RenderError::syntax(
        snippet(input, tag_start),
        format!("unexpected token `{token}`"),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn syntax_message(err: RenderError) -> String {
        match err {
            RenderError::TemplateSyntax { message, .. } => message,
            RenderError::Extension { .. } => panic!("expected syntax error"),
        }
    }

    #[test]
    fn test_parse_plain_text() {
        let tokens = parse_template("Hello, World!").unwrap();
        assert_eq!(tokens, vec![Token::Text("Hello, World!".to_string())]);
    }

    #[test]
    fn test_parse_simple_variable() {
        let tokens = parse_template("{{name}}").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Variable {
                path: "name".to_string(),
                raw: "{{name}}".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_variable_with_whitespace() {
        let tokens = parse_template("{{ name }}").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Variable {
                path: "name".to_string(),
                raw: "{{ name }}".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_dotted_variable() {
        let tokens = parse_template("{{ user.name }}").unwrap();
        match &tokens[0] {
            Token::Variable { path, .. } => assert_eq!(path, "user.name"),
            other => panic!("unexpected token: {other:?}"),
        }
    }

    #[test]
    fn test_parse_text_around_variables() {
        let tokens = parse_template("a {{b}} c {{d}} e").unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0], Token::Text("a ".to_string()));
        assert_eq!(tokens[2], Token::Text(" c ".to_string()));
        assert_eq!(tokens[4], Token::Text(" e".to_string()));
    }

    #[test]
    fn test_adjacent_variables() {
        let tokens = parse_template("{{a}}{{b}}{{c}}").unwrap();
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_single_braces_are_text() {
        let tokens = parse_template("{name} and }}").unwrap();
        assert_eq!(tokens, vec![Token::Text("{name} and }}".to_string())]);
    }

    #[test]
    fn test_unterminated_variable() {
        let err = parse_template("Hello {{ msg }!").unwrap_err();
        assert_eq!(syntax_message(err), "expected variable end");
    }

    #[test]
    fn test_unclosed_variable() {
        let err = parse_template("{{name").unwrap_err();
        assert_eq!(syntax_message(err), "expected variable end");
    }

    #[test]
    fn test_empty_variable() {
        let err = parse_template("{{}}").unwrap_err();
        assert_eq!(syntax_message(err), "expected variable name");
    }

    #[test]
    fn test_parse_tag_without_args() {
        let tokens = parse_template("{% uuid %}").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Tag(TagCall {
                name: "uuid".to_string(),
                args: vec![],
                raw: "{% uuid %}".to_string(),
            })]
        );
    }

    #[test]
    fn test_parse_tag_with_mixed_args() {
        let tokens =
            parse_template("{% response 'req_1' \"$.token\" limit 5 2.5 true %}").unwrap();
        match &tokens[0] {
            Token::Tag(call) => {
                assert_eq!(call.name, "response");
                assert_eq!(
                    call.args,
                    vec![
                        TagArg::Str("req_1".to_string()),
                        TagArg::Str("$.token".to_string()),
                        TagArg::Ident("limit".to_string()),
                        TagArg::Int(5),
                        TagArg::Float(2.5),
                        TagArg::Bool(true),
                    ]
                );
            }
            other => panic!("unexpected token: {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_tag() {
        let err = parse_template("{% uuid").unwrap_err();
        assert_eq!(syntax_message(err), "expected tag end");
    }

    #[test]
    fn test_tag_without_name() {
        let err = parse_template("{% %}").unwrap_err();
        assert_eq!(syntax_message(err), "expected tag name");
    }

    #[test]
    fn test_unclosed_quote_in_tag() {
        let err = parse_template("{% base64 'encode %}").unwrap_err();
        assert_eq!(syntax_message(err), "expected closing quote");
    }

    #[test]
    fn test_error_carries_expression_snippet() {
        let err = parse_template("prefix {{ msg }!").unwrap_err();
        assert!(err.expression().starts_with("{{ msg }!"));
    }

    #[test]
    fn test_has_expressions() {
        assert!(has_expressions("{{a}}"));
        assert!(has_expressions("{% uuid %}"));
        assert!(!has_expressions("plain text"));
    }

    #[test]
    fn test_variable_then_tag() {
        let tokens = parse_template("{{host}}/{% uuid %}").unwrap();
        assert_eq!(tokens.len(), 3);
        match (&tokens[0], &tokens[2]) {
            (Token::Variable { path, .. }, Token::Tag(call)) => {
                assert_eq!(path, "host");
                assert_eq!(call.name, "uuid");
            }
            other => panic!("unexpected tokens: {other:?}"),
        }
    }
}
