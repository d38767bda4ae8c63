use crate::Error;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde_json::value::RawValue;
use std::fmt;

/// A lossless JSON document that keeps every scalar as written.
///
/// Unlike `serde_json::Value`, numbers, strings and object keys hold their
/// source text, so `1E5` stays `1E5` and `"\u00e9"` stays escaped. Object
/// members keep document order, duplicates included. Only the whitespace
/// between tokens is lost.
///
/// ```
/// use pbit_vcs::JsonValue;
///
/// let value = JsonValue::parse(r#"{ "n": 1E5, "s": "\u00e9", "a": [] }"#).unwrap();
/// assert_eq!(value.to_compact(), r#"{"n":1E5,"s":"\u00e9","a":[]}"#);
/// assert_eq!(value.to_pretty(), "{\n  \"n\": 1E5,\n  \"s\": \"\\u00e9\",\n  \"a\": []\n}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonValue {
    /// `null`
    Null,

    /// `true` or `false`
    Bool(bool),

    /// A number as it appears in the source
    Number(String),

    /// A string as it appears in the source, quotes and escapes included
    String(String),

    /// An array
    Array(Vec<JsonValue>),

    /// Object members in document order, keys as they appear in the source
    Object(Vec<(String, JsonValue)>),
}

impl JsonValue {
    /// Parses a complete JSON document
    pub fn parse(text: &str) -> Result<JsonValue, Error> {
        let raw: &RawValue = serde_json::from_str(text)?;
        from_raw(raw)
    }

    /// Creates a string value from unescaped text
    pub fn string(text: &str) -> Result<JsonValue, Error> {
        Ok(JsonValue::String(serde_json::to_string(text)?))
    }

    /// Returns the unescaped text of a string value
    pub fn as_str(&self) -> Result<Option<String>, Error> {
        match self {
            JsonValue::String(lexeme) => Ok(Some(serde_json::from_str(lexeme)?)),
            _ => Ok(None),
        }
    }

    /// Writes the value without any whitespace
    pub fn to_compact(&self) -> String {
        let mut out = String::new();
        self.write_compact(&mut out);
        out
    }

    /// Writes the value with every member and element on its own line,
    /// indented by two spaces
    pub fn to_pretty(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out
    }

    fn write_compact(&self, out: &mut String) {
        match self {
            JsonValue::Array(values) => {
                out.push('[');
                for (i, value) in values.iter().enumerate() {
                    if i != 0 {
                        out.push(',');
                    }
                    value.write_compact(out);
                }
                out.push(']');
            }
            JsonValue::Object(members) => {
                out.push('{');
                for (i, (key, value)) in members.iter().enumerate() {
                    if i != 0 {
                        out.push(',');
                    }
                    out.push_str(key);
                    out.push(':');
                    value.write_compact(out);
                }
                out.push('}');
            }
            x => x.write_scalar(out),
        }
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        match self {
            JsonValue::Array(values) if values.is_empty() => out.push_str("[]"),
            JsonValue::Object(members) if members.is_empty() => out.push_str("{}"),
            JsonValue::Array(values) => {
                out.push('[');
                for (i, value) in values.iter().enumerate() {
                    if i != 0 {
                        out.push(',');
                    }
                    newline(out, depth + 1);
                    value.write_pretty(out, depth + 1);
                }
                newline(out, depth);
                out.push(']');
            }
            JsonValue::Object(members) => {
                out.push('{');
                for (i, (key, value)) in members.iter().enumerate() {
                    if i != 0 {
                        out.push(',');
                    }
                    newline(out, depth + 1);
                    out.push_str(key);
                    out.push_str(": ");
                    value.write_pretty(out, depth + 1);
                }
                newline(out, depth);
                out.push('}');
            }
            x => x.write_scalar(out),
        }
    }

    fn write_scalar(&self, out: &mut String) {
        match self {
            JsonValue::Null => out.push_str("null"),
            JsonValue::Bool(true) => out.push_str("true"),
            JsonValue::Bool(false) => out.push_str("false"),
            JsonValue::Number(lexeme) | JsonValue::String(lexeme) => out.push_str(lexeme),
            JsonValue::Array(_) | JsonValue::Object(_) => self.write_compact(out),
        }
    }
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn from_raw(raw: &RawValue) -> Result<JsonValue, Error> {
    let text = raw.get();
    let value = match text.as_bytes().first() {
        Some(b'{') => {
            let members = deserialize_members(&mut serde_json::Deserializer::from_str(text))?;
            let mut out = Vec::with_capacity(members.len());
            for (key, value) in members {
                out.push((key.get().to_string(), from_raw(value)?));
            }
            JsonValue::Object(out)
        }
        Some(b'[') => {
            let values: Vec<&RawValue> = serde_json::from_str(text)?;
            let values = values.into_iter().map(from_raw).collect::<Result<Vec<_>, Error>>()?;
            JsonValue::Array(values)
        }
        Some(b'"') => JsonValue::String(text.to_string()),
        Some(b't') => JsonValue::Bool(true),
        Some(b'f') => JsonValue::Bool(false),
        Some(b'n') => JsonValue::Null,
        _ => JsonValue::Number(text.to_string()),
    };

    Ok(value)
}

/// Object members as raw key and value text, in document order
fn deserialize_members<'de, D>(
    deserializer: D,
) -> Result<Vec<(&'de RawValue, &'de RawValue)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct MembersVisitor;

    impl<'de> Visitor<'de> for MembersVisitor {
        type Value = Vec<(&'de RawValue, &'de RawValue)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a json object")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let size = map.size_hint().unwrap_or(0);
            let mut pairs = Vec::with_capacity(size);
            while let Some(pair) = map.next_entry::<&'de RawValue, &'de RawValue>()? {
                pairs.push(pair);
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_map(MembersVisitor)
}
