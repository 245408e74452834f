// SPDX-License-Identifier: MIT

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::multispace0,
    combinator::opt,
    IResult, Parser,
};

use crate::datetime::{self, ChronoDateTime};

#[derive(Debug, Clone)]
pub struct QueryStringParseError(String);

impl std::error::Error for QueryStringParseError {}

impl std::fmt::Display for QueryStringParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "query string parse error: {}", self.0)
    }
}

impl From<nom::Err<nom::error::Error<&str>>> for QueryStringParseError {
    fn from(value: nom::Err<nom::error::Error<&str>>) -> Self {
        Self(format!("{:?}", value))
    }
}

impl From<String> for QueryStringParseError {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// A bare term, matched as a case-insensitive substring over all
    /// stringifiable record fields.
    String(String),
    /// A field:value term, matched as exact equality on that field.
    KeyValue(String, String),
    From(ChronoDateTime),
    To(ChronoDateTime),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryElement {
    pub negated: bool,
    pub value: QueryValue,
}

/// Parse a query string into elements. A default timezone offset is
/// used as time specifiers are converted to time objects.
pub fn parse(
    input: &str,
    tz_offset: Option<&str>,
) -> Result<Vec<QueryElement>, QueryStringParseError> {
    let mut elements = vec![];
    let mut ptr = input;
    let mut token;
    let mut negated = false;

    while !ptr.is_empty() {
        (ptr, token) = parse_token(ptr)?;
        if token == "-" || token == "!" {
            negated = true;
        } else if ptr.starts_with(':') {
            let key = token.to_string();
            (ptr, token) = parse_value(&ptr[1..])?;

            match key.as_ref() {
                "@from" => {
                    let ts = datetime::parse(&token, tz_offset)
                        .map_err(|_| format!("invalid time format: {}", &token))?;
                    elements.push(QueryElement {
                        negated: false,
                        value: QueryValue::From(ts),
                    });
                }
                "@to" => {
                    let ts = datetime::parse(&token, tz_offset)
                        .map_err(|_| format!("invalid time format: {}", &token))?;
                    elements.push(QueryElement {
                        negated: false,
                        value: QueryValue::To(ts),
                    });
                }
                _ => {
                    elements.push(QueryElement {
                        negated,
                        value: QueryValue::KeyValue(key, token.to_string()),
                    });
                }
            }

            negated = false;
        } else {
            elements.push(QueryElement {
                negated,
                value: QueryValue::String(token),
            });
            negated = false;
        }
    }

    Ok(elements)
}

fn parse_token(input: &str) -> IResult<&str, String> {
    // Skip any leading whitespace.
    let (input, _) = multispace0(input)?;

    // Looking for a leading operator of ! or - for negation.
    let (input, op) = opt(alt((tag("!"), tag("-")))).parse(input)?;
    if let Some(op) = op {
        return Ok((input, op.to_string()));
    }

    if input.starts_with('"') {
        return Ok(parse_quoted_string(input));
    }

    let (input, token) = take_till(|c| c == ' ' || c == ':').parse(input)?;

    Ok((input, token.to_string()))
}

// Much like parse_token, but will consume ':' chars.
fn parse_value(input: &str) -> IResult<&str, String> {
    // Skip any leading whitespace.
    let (input, _) = multispace0(input)?;

    if input.starts_with('"') {
        return Ok(parse_quoted_string(input));
    }

    let (input, token) = take_till(|c| c == ' ').parse(input)?;

    Ok((input, token.to_string()))
}

// Parse a quoted string.
//
// Returns a tuple where the first element is location after the
// quoted string, and the second element is the quoted string stripped
// of leading and trailing quotes, and any escape chars removed from
// inner quotes.
fn parse_quoted_string(input: &str) -> (&str, String) {
    assert!(input.starts_with('"'));
    let mut ptr = &input[1..];
    let mut string = String::new();

    let mut escaped = false;
    for c in ptr.chars() {
        ptr = &ptr[c.len_utf8()..];
        if escaped {
            string.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            break;
        } else {
            string.push(c);
        }
    }

    (ptr, string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let elements = parse("phishing", None).unwrap();
        assert_eq!(elements.len(), 1);
        assert!(!elements[0].negated);
        assert_eq!(elements[0].value, QueryValue::String("phishing".to_string()));

        let elements = parse("region:US", None).unwrap();
        assert_eq!(elements.len(), 1);
        assert!(!elements[0].negated);
        assert_eq!(
            elements[0].value,
            QueryValue::KeyValue("region".to_string(), "US".to_string())
        );

        let elements = parse("-region:US", None).unwrap();
        assert_eq!(elements.len(), 1);
        assert!(elements[0].negated);
        assert_eq!(
            elements[0].value,
            QueryValue::KeyValue("region".to_string(), "US".to_string())
        );

        let elements = parse(r#""Fake Store" -attack_method:Phishing"#, None).unwrap();
        assert_eq!(elements.len(), 2);
        assert!(!elements[0].negated);
        assert_eq!(
            elements[0].value,
            QueryValue::String("Fake Store".to_string())
        );
        assert!(elements[1].negated);
        assert_eq!(
            elements[1].value,
            QueryValue::KeyValue("attack_method".to_string(), "Phishing".to_string())
        );

        let elements = parse(r#"region:US @from:2024"#, None).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(
            elements[1].value,
            QueryValue::From(
                chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00.000Z").unwrap()
            )
        );

        let elements = parse(r#"store -"fake login" -"et \"shop"#, None).unwrap();
        assert_eq!(elements.len(), 3);
        assert!(!elements[0].negated);
        assert!(elements[1].negated);
        assert_eq!(
            elements[1].value,
            QueryValue::String("fake login".to_string())
        );
        assert!(elements[2].negated);
        assert_eq!(
            elements[2].value,
            QueryValue::String("et \"shop".to_string())
        );

        let elements = parse(r#"@from:2024-05-16T09:48:44"#, Some("-0600")).unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(
            elements[0].value,
            QueryValue::From(
                chrono::DateTime::parse_from_rfc3339("2024-05-16T09:48:44.000-06:00").unwrap()
            )
        );
    }

    #[test]
    fn test_parse_bad_timestamp() {
        assert!(parse("@from:tomorrow", None).is_err());
        assert!(parse("@to:not-a-date", None).is_err());
    }

    #[test]
    fn test_next_token() {
        let (rem, token) = parse_token("\"foobar\"asdf").unwrap();
        assert_eq!(rem, "asdf");
        assert_eq!(token, "foobar");

        // Space terminates value, not quoted.
        let (rem, token) = parse_token("foo bar").unwrap();
        assert_eq!(rem, " bar");
        assert_eq!(token, "foo");

        // ':' terminates value, not quoted.
        let (rem, token) = parse_token("foo:bar").unwrap();
        assert_eq!(rem, ":bar");
        assert_eq!(token, "foo");

        let (rem, token) = parse_token("").unwrap();
        assert_eq!(rem, "");
        assert_eq!(token, "");
    }

    #[test]
    fn test_parse_quoted() {
        let (n, s) = parse_quoted_string(r#""simple""#);
        assert_eq!(n, "");
        assert_eq!(s, "simple");

        let (n, s) = parse_quoted_string(r#""sim\"ple" and the rest"#);
        assert_eq!(n, " and the rest");
        assert_eq!(s, "sim\"ple");

        // No ending quote.
        let (n, s) = parse_quoted_string("\"testing; +asdf");
        assert_eq!(n, "");
        assert_eq!(s, "testing; +asdf");
    }
}
