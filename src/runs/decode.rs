//! Safe decoding of stored run blobs.
//!
//! Run writers persist their session store either as JSON or as the `repr` of
//! a Python dict (single quotes, `True`/`None`, `PosixPath('...')` values).
//! Both are read here as inert data. Blob text is never evaluated: anything
//! outside the literal grammar below is a [`DecodeError`].

use chumsky::prelude::*;
use serde_json::{Map, Value};

/// Constructors whose single string argument is kept as a plain string.
const PATH_CONSTRUCTORS: [&str; 5] = [
    "PosixPath",
    "WindowsPath",
    "PurePosixPath",
    "PureWindowsPath",
    "Path",
];

/// Deepest bracket nesting accepted by the literal grammar, matching the
/// recursion limit `serde_json` applies to JSON blobs.
const MAX_NESTING: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Neither valid JSON nor a plain data literal.
    #[error("blob is not structured data: {0}")]
    Syntax(String),

    /// Parsed, but the top level is not a mapping.
    #[error("blob must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

/// A decoded run blob: a JSON-compatible mapping of string keys.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBlob(Map<String, Value>);

impl DecodedBlob {
    /// Walk nested mappings along `path` and return the string found there.
    ///
    /// Returns `None` when a key is absent, an intermediate value is not a
    /// mapping, or the leaf is not a string.
    pub fn str_at(&self, path: &[&str]) -> Option<&str> {
        let (last, parents) = path.split_last()?;
        let mut current = &self.0;
        for key in parents {
            current = current.get(*key)?.as_object()?;
        }
        current.get(*last)?.as_str()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl TryFrom<Value> for DecodedBlob {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DecodeError::NotAMapping(kind_of(&other))),
        }
    }
}

/// Decode a stored blob into a mapping.
pub fn decode_blob(blob: &str) -> Result<DecodedBlob, DecodeError> {
    let value = match serde_json::from_str::<Value>(blob) {
        Ok(value) => value,
        Err(_) => parse_literal(blob)?,
    };
    DecodedBlob::try_from(value)
}

fn parse_literal(input: &str) -> Result<Value, DecodeError> {
    check_nesting(input)?;
    literal().parse(input).map_err(|errors| {
        let message = errors
            .first()
            .map_or_else(|| "unrecognised input".to_string(), ToString::to_string);
        DecodeError::Syntax(message)
    })
}

/// Reject input whose brackets nest deeper than [`MAX_NESTING`] before the
/// recursive grammar sees it. Brackets inside quoted strings are ignored.
fn check_nesting(input: &str) -> Result<(), DecodeError> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[' | '{' | '(') => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(DecodeError::Syntax(format!(
                        "nesting deeper than {MAX_NESTING} levels"
                    )));
                }
            }
            (None, ']' | '}' | ')') => depth = depth.saturating_sub(1),
            (None, _) => {}
        }
    }
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Grammar for plain data literals: strings, numbers, booleans, `None`,
/// lists, tuples, dicts with string keys and path constructors.
fn literal() -> impl Parser<char, Value, Error = Simple<char>> {
    recursive(|value| {
        let hex = |width: usize| {
            filter(|c: &char| c.is_ascii_hexdigit())
                .repeated()
                .exactly(width)
                .collect::<String>()
                .try_map(|digits, span| {
                    u32::from_str_radix(&digits, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| Simple::custom(span, format!("invalid code point {digits}")))
                })
        };

        let escape = just('\\').ignore_then(choice((
            just('\\'),
            just('/'),
            just('"'),
            just('\''),
            just('n').to('\n'),
            just('r').to('\r'),
            just('t').to('\t'),
            just('b').to('\x08'),
            just('f').to('\x0C'),
            just('0').to('\0'),
            just('x').ignore_then(hex(2)),
            just('u').ignore_then(hex(4)),
            just('U').ignore_then(hex(8)),
        )));

        let quoted = |quote: char| {
            just(quote)
                .ignore_then(
                    filter(move |c: &char| *c != '\\' && *c != quote && *c != '\n')
                        .or(escape.clone())
                        .repeated(),
                )
                .then_ignore(just(quote))
                .collect::<String>()
        };
        let string = quoted('\'').or(quoted('"')).labelled("string");

        let exponent = one_of("eE")
            .ignore_then(one_of("+-").or_not())
            .then(text::digits(10))
            .map(|(sign, digits): (Option<char>, String)| {
                let mut raw = String::from("e");
                raw.extend(sign);
                raw.push_str(&digits);
                raw
            });

        let number = just('-')
            .or_not()
            .then(text::int(10))
            .then(just('.').ignore_then(text::digits(10)).or_not())
            .then(exponent.or_not())
            .try_map(
                |(((sign, int), frac), exp): (((Option<char>, String), Option<String>), Option<String>),
                 span| {
                    let mut raw: String = sign.into_iter().collect();
                    raw.push_str(&int);
                    if frac.is_none() && exp.is_none() {
                        // Unbounded integers widen to u64, then to a lossy float.
                        if let Ok(int) = raw.parse::<i64>() {
                            return Ok(Value::from(int));
                        }
                        if let Ok(int) = raw.parse::<u64>() {
                            return Ok(Value::from(int));
                        }
                        return raw
                            .parse::<f64>()
                            .ok()
                            .and_then(serde_json::Number::from_f64)
                            .map(Value::Number)
                            .ok_or_else(|| {
                                Simple::custom(span, format!("integer literal out of range: {raw}"))
                            });
                    }
                    if let Some(frac) = frac {
                        raw.push('.');
                        raw.push_str(&frac);
                    }
                    raw.extend(exp);
                    raw.parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .ok_or_else(|| Simple::custom(span, "invalid float literal"))
                },
            )
            .labelled("number");

        let constant = choice((
            text::keyword("True").to(Value::Bool(true)),
            text::keyword("False").to(Value::Bool(false)),
            text::keyword("None").to(Value::Null),
        ));

        let path = choice((
            text::keyword(PATH_CONSTRUCTORS[0]),
            text::keyword(PATH_CONSTRUCTORS[1]),
            text::keyword(PATH_CONSTRUCTORS[2]),
            text::keyword(PATH_CONSTRUCTORS[3]),
            text::keyword(PATH_CONSTRUCTORS[4]),
        ))
        .ignore_then(string.clone().padded().delimited_by(just('('), just(')')))
        .map(Value::String)
        .labelled("path");

        let items = value
            .clone()
            .separated_by(just(','))
            .allow_trailing()
            .padded();
        let list = items
            .clone()
            .delimited_by(just('['), just(']'))
            .map(Value::Array)
            .labelled("list");
        let tuple = items
            .delimited_by(just('('), just(')'))
            .map(Value::Array)
            .labelled("tuple");

        let member = string.clone().padded().then_ignore(just(':')).then(value);
        let dict = member
            .separated_by(just(','))
            .allow_trailing()
            .padded()
            .delimited_by(just('{'), just('}'))
            .map(|members| Value::Object(members.into_iter().collect()))
            .labelled("dict");

        choice((
            dict,
            list,
            tuple,
            string.map(Value::String),
            number,
            constant,
            path,
        ))
        .padded()
    })
    .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_json_blob() {
        let blob = r#"{"git":{"commit_sha":"deadbeef"},"cli":{"command_path":"kedro run"},"session_id":"2021-01-01T00:00:00"}"#;
        let decoded = decode_blob(blob).unwrap();

        assert_eq!(decoded.str_at(&["git", "commit_sha"]), Some("deadbeef"));
        assert_eq!(decoded.str_at(&["cli", "command_path"]), Some("kedro run"));
        assert_eq!(decoded.str_at(&["session_id"]), Some("2021-01-01T00:00:00"));
    }

    #[test]
    fn test_decodes_python_repr_blob() {
        let blob = "{'package_name': 'spaceflights', \
            'project_path': PosixPath('/home/user/spaceflights'), \
            'session_id': '2021-10-13T09.38.52.476Z', \
            'cli': {'args': [], 'params': {'pipeline': None, 'parallel': False, 'runner': None}, \
                    'command_name': 'run', 'command_path': 'kedro run', 'retries': 3, 'ratio': -0.5, 'tolerance': 1e-05}, \
            'git': {'commit_sha': '9cbd0da', 'dirty': True}, \
            'node_names': ('a', 'b',)}";
        let decoded = decode_blob(blob).unwrap();

        assert_eq!(decoded.str_at(&["git", "commit_sha"]), Some("9cbd0da"));
        assert_eq!(decoded.str_at(&["cli", "command_path"]), Some("kedro run"));
        assert_eq!(decoded.str_at(&["session_id"]), Some("2021-10-13T09.38.52.476Z"));

        let map = decoded.as_map();
        assert_eq!(map["project_path"], json!("/home/user/spaceflights"));
        assert_eq!(map["git"]["dirty"], json!(true));
        assert_eq!(map["cli"]["params"]["pipeline"], Value::Null);
        assert_eq!(map["cli"]["retries"], json!(3));
        assert_eq!(map["cli"]["ratio"], json!(-0.5));
        assert_eq!(map["cli"]["tolerance"], json!(1e-05));
        assert_eq!(map["node_names"], json!(["a", "b"]));
    }

    #[test]
    fn test_decodes_escapes_and_mixed_quotes() {
        let blob = r#"{'message': 'it\'s "quoted"', "tab": 'a\tb', 'empty': {}}"#;
        let decoded = decode_blob(blob).unwrap();
        let map = decoded.as_map();

        assert_eq!(map["message"], json!("it's \"quoted\""));
        assert_eq!(map["tab"], json!("a\tb"));
        assert_eq!(map["empty"], json!({}));
    }

    #[test]
    fn test_rejects_executable_content() {
        let payloads = [
            "__import__('os').system('touch /tmp/pwned')",
            "{'git': __import__('os').system('id')}",
            "{'cli': open('/etc/passwd').read()}",
            "(lambda: 1)()",
            "{'a': 1 + 1}",
            "{'a': [x for x in range(3)]}",
            "{'a': exec}",
        ];

        for payload in payloads {
            let err = decode_blob(payload).unwrap_err();
            assert!(
                matches!(err, DecodeError::Syntax(_)),
                "expected syntax error for {payload:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_rejects_non_mapping_top_level() {
        assert!(matches!(
            decode_blob("[1, 2, 3]"),
            Err(DecodeError::NotAMapping("a sequence"))
        ));
        assert!(matches!(
            decode_blob("'just a string'"),
            Err(DecodeError::NotAMapping("a string"))
        ));
    }

    #[test]
    fn test_rejects_trailing_garbage_and_truncation() {
        assert!(decode_blob("{'a': 1} extra").is_err());
        assert!(decode_blob("{'a': 1").is_err());
        assert!(decode_blob("").is_err());
    }

    #[test]
    fn test_rejects_excessive_nesting() {
        let deep = format!("{{'a': {}{}}}", "[".repeat(200_000), "]".repeat(200_000));
        assert!(matches!(decode_blob(&deep), Err(DecodeError::Syntax(_))));

        let just_over = format!("{{'a': {}{}}}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(matches!(decode_blob(&just_over), Err(DecodeError::Syntax(_))));
    }

    #[test]
    fn test_nesting_limit_leaves_shallow_blobs_and_strings_alone() {
        let nested = format!("{{'a': {}{}}}", "[".repeat(100), "]".repeat(100));
        assert!(decode_blob(&nested).is_ok());

        let brackets = "[".repeat(1_000);
        let decoded = decode_blob(&format!("{{'a': '{brackets}'}}")).unwrap();
        assert_eq!(decoded.str_at(&["a"]), Some(brackets.as_str()));
    }

    #[test]
    fn test_decodes_hex_and_unicode_escapes() {
        let blob = r"{'bell': 'a\x07b', 'zwsp': '\u200b', 'emoji': '\U0001f600'}";
        let decoded = decode_blob(blob).unwrap();

        assert_eq!(decoded.str_at(&["bell"]), Some("a\u{7}b"));
        assert_eq!(decoded.str_at(&["zwsp"]), Some("\u{200b}"));
        assert_eq!(decoded.str_at(&["emoji"]), Some("\u{1f600}"));
        assert!(decode_blob(r"{'bad': '\ud800'}").is_err());
        assert!(decode_blob(r"{'short': '\x7'}").is_err());
    }

    #[test]
    fn test_wide_integers_do_not_fail_the_blob() {
        let blob = "{'git': {'commit_sha': 'abc'}, 'max': 18446744073709551615, \
                    'huge': 18446744073709551616, 'neg': -9223372036854775808}";
        let decoded = decode_blob(blob).unwrap();
        let map = decoded.as_map();

        assert_eq!(decoded.str_at(&["git", "commit_sha"]), Some("abc"));
        assert_eq!(map["max"], json!(u64::MAX));
        assert_eq!(map["huge"], json!(18_446_744_073_709_551_616_f64));
        assert_eq!(map["neg"], json!(i64::MIN));
    }

    #[test]
    fn test_str_at_ignores_non_string_leaves() {
        let decoded = decode_blob(r#"{"git": {"commit_sha": 42}, "cli": "kedro run"}"#).unwrap();

        assert_eq!(decoded.str_at(&["git", "commit_sha"]), None);
        assert_eq!(decoded.str_at(&["cli", "command_path"]), None);
        assert_eq!(decoded.str_at(&["missing"]), None);
        assert_eq!(decoded.str_at(&[]), None);
    }
}
