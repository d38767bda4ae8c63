use crate::{codec::Transcode, Error, ErrorKind, TextEncoding};

mod value;

pub use value::JsonValue;

/// The key of the single entry object that stands in for a string holding
/// JSON
pub const EMBEDDED_JSON_KEY: &str = "__powerbi-vcs-embedded-json__";

/// Pretty prints JSON entries and minifies them back into their configured
/// encoding
///
/// Strings that hold a JSON object or array are expanded in the readable form
/// so they can be diffed like the rest of the document:
///
/// ```
/// use pbit_vcs::{Transcode, JsonCodec, TextEncoding};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = JsonCodec::new(TextEncoding::Utf8);
/// let raw = br#"{"x":"{\"y\":1E5}"}"#;
/// let readable = codec.to_readable(raw)?;
/// assert_eq!(
///     std::str::from_utf8(&readable)?,
///     "{\n  \"x\": {\n    \"__powerbi-vcs-embedded-json__\": {\n      \"y\": 1E5\n    }\n  }\n}\n"
/// );
/// assert_eq!(codec.to_raw(&readable)?, raw);
/// # Ok(())
/// # }
/// ```
///
/// Object members keep the order they were written in, and numbers, strings
/// and keys keep their source text. Sorting keys would reorder the raw
/// document, which the consuming application is sensitive to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonCodec {
    encoding: TextEncoding,
}

impl JsonCodec {
    /// Creates a JSON codec for the given raw encoding
    pub fn new(encoding: TextEncoding) -> Self {
        JsonCodec { encoding }
    }

    /// The encoding of the raw form
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}

impl Transcode for JsonCodec {
    fn to_readable(&self, raw: &[u8]) -> Result<Vec<u8>, Error> {
        let text = self.encoding.decode(raw)?;
        let value = expand_embedded(JsonValue::parse(&text)?)?;
        let mut out = value.to_pretty().into_bytes();
        out.push(b'\n');
        Ok(out)
    }

    fn to_raw(&self, readable: &[u8]) -> Result<Vec<u8>, Error> {
        let text = TextEncoding::Utf8Bom.decode(readable)?;
        let value = collapse_embedded(JsonValue::parse(&text)?)?;
        Ok(self.encoding.encode(&value.to_compact()))
    }
}

/// Replaces every string holding a JSON object or array with an embedded JSON
/// wrapper, recursing into the embedded documents as well.
///
/// A string is only wrapped when it is written without escapes beyond the
/// minimal ones and its content is already minified, so `collapse_embedded`
/// is guaranteed to restore it.
///
/// ```
/// use pbit_vcs::{expand_embedded, JsonValue};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let value = JsonValue::parse(r#"{"x":"{\"y\":1}","z":"[1, 2]","w":"3"}"#)?;
/// let expanded = expand_embedded(value)?;
/// assert_eq!(
///     expanded.to_compact(),
///     r#"{"x":{"__powerbi-vcs-embedded-json__":{"y":1}},"z":"[1, 2]","w":"3"}"#
/// );
/// # Ok(())
/// # }
/// ```
pub fn expand_embedded(value: JsonValue) -> Result<JsonValue, Error> {
    match value {
        JsonValue::String(lexeme) => {
            let text = match serde_json::from_str::<String>(&lexeme) {
                Ok(x) => x,
                Err(_) => return Ok(JsonValue::String(lexeme)),
            };

            let embedded = match JsonValue::parse(&text) {
                Ok(x @ (JsonValue::Object(_) | JsonValue::Array(_))) => x,
                _ => return Ok(JsonValue::String(lexeme)),
            };

            if embedded.to_compact() != text || serde_json::to_string(&text)? != lexeme {
                return Ok(JsonValue::String(lexeme));
            }

            let key = serde_json::to_string(EMBEDDED_JSON_KEY)?;
            Ok(JsonValue::Object(vec![(key, expand_embedded(embedded)?)]))
        }
        JsonValue::Array(values) => values
            .into_iter()
            .map(expand_embedded)
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array),
        JsonValue::Object(members) => {
            if is_wrapper(&members) {
                return Err(ErrorKind::ReservedKey.into());
            }

            let mut out = Vec::with_capacity(members.len());
            for (key, value) in members {
                out.push((key, expand_embedded(value)?));
            }
            Ok(JsonValue::Object(out))
        }
        x => Ok(x),
    }
}

/// Reverses `expand_embedded`: every embedded JSON wrapper collapses back
/// into a minified JSON string.
///
/// ```
/// use pbit_vcs::{collapse_embedded, JsonValue};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let value = JsonValue::parse(r#"{"x": {"__powerbi-vcs-embedded-json__": {"y": 1.50}}}"#)?;
/// assert_eq!(collapse_embedded(value)?.to_compact(), r#"{"x":"{\"y\":1.50}"}"#);
/// # Ok(())
/// # }
/// ```
pub fn collapse_embedded(value: JsonValue) -> Result<JsonValue, Error> {
    match value {
        JsonValue::Object(members) if is_wrapper(&members) => {
            let inner = members
                .into_iter()
                .next()
                .map(|(_, value)| value)
                .unwrap_or(JsonValue::Null);
            let inner = collapse_embedded(inner)?;
            JsonValue::string(&inner.to_compact())
        }
        JsonValue::Object(members) => {
            let mut out = Vec::with_capacity(members.len());
            for (key, value) in members {
                out.push((key, collapse_embedded(value)?));
            }
            Ok(JsonValue::Object(out))
        }
        JsonValue::Array(values) => values
            .into_iter()
            .map(collapse_embedded)
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array),
        x => Ok(x),
    }
}

fn is_wrapper(members: &[(String, JsonValue)]) -> bool {
    match members {
        [(key, _)] => serde_json::from_str::<String>(key).is_ok_and(|x| x == EMBEDDED_JSON_KEY),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use rstest::*;
    use serde_json::{json, Map, Value};

    fn utf16_raw(value: &Value) -> Vec<u8> {
        TextEncoding::Utf16Le.encode(&serde_json::to_string(value).unwrap())
    }

    fn expand_str(text: &str) -> String {
        expand_embedded(JsonValue::parse(text).unwrap()).unwrap().to_compact()
    }

    #[test]
    fn test_embedded_detection() {
        let codec = JsonCodec::new(TextEncoding::Utf16Le);
        let raw = utf16_raw(&json!({"x": "{\"y\":1}"}));

        let readable = codec.to_readable(&raw).unwrap();
        let parsed: Value = serde_json::from_slice(&readable).unwrap();
        assert_eq!(parsed, json!({"x": {EMBEDDED_JSON_KEY: {"y": 1}}}));

        let back = codec.to_raw(&readable).unwrap();
        assert_eq!(back, raw);
        let back: Value = serde_json::from_str(&TextEncoding::Utf16Le.decode(&back).unwrap()).unwrap();
        assert_eq!(back["x"], json!("{\"y\":1}"));
    }

    #[test]
    fn test_nested_embedded_detection() {
        let inner = json!({"config": "{\"a\":[1,2E3]}"}).to_string();
        let text = json!({"sections": [{"visualContainers": [{"config": inner}]}]}).to_string();
        let expanded = expand_str(&text);
        assert_eq!(
            expanded,
            format!(
                r#"{{"sections":[{{"visualContainers":[{{"config":{{"{key}":{{"config":{{"{key}":{{"a":[1,2E3]}}}}}}}}}}]}}]}}"#,
                key = EMBEDDED_JSON_KEY
            )
        );

        let collapsed = collapse_embedded(JsonValue::parse(&expanded).unwrap()).unwrap();
        assert_eq!(collapsed.to_compact(), text);
    }

    #[rstest]
    #[case(r#""{\"y\": 1}""#)]
    #[case(r#""[1,2 ]""#)]
    #[case(r#""1""#)]
    #[case(r#""\"quoted\"""#)]
    #[case(r#""true""#)]
    #[case(r#""{not json""#)]
    #[case(r#""""#)]
    #[case(r#""{\u0022a\u0022:1}""#)]
    #[case(r#""[1,2]\/""#)]
    fn test_strings_left_alone(#[case] text: &str) {
        assert_eq!(expand_str(text), text);
    }

    #[rstest]
    #[case("1E-05")]
    #[case("1E5")]
    #[case("1.5E-3")]
    #[case("1E400")]
    #[case("-0")]
    #[case("0.10")]
    #[case("123456789012345678901234567890")]
    fn test_number_text_survives(#[case] number: &str) {
        let codec = JsonCodec::new(TextEncoding::Utf16Le);
        let raw = TextEncoding::Utf16Le.encode(&format!(r#"{{"n":{}}}"#, number));

        let readable = codec.to_readable(&raw).unwrap();
        assert_eq!(
            std::str::from_utf8(&readable).unwrap(),
            format!("{{\n  \"n\": {}\n}}\n", number)
        );
        assert_eq!(codec.to_raw(&readable).unwrap(), raw);
    }

    #[test]
    fn test_embedded_number_text_survives() {
        let codec = JsonCodec::new(TextEncoding::Utf8);
        let raw = r#"{"config":"{\"x\":1E-05,\"y\":[1.5E-3]}"}"#.as_bytes();
        let readable = codec.to_readable(raw).unwrap();
        assert!(std::str::from_utf8(&readable).unwrap().contains("\"x\": 1E-05,"));
        assert_eq!(codec.to_raw(&readable).unwrap(), raw);
    }

    #[test]
    fn test_reserved_key() {
        let codec = JsonCodec::new(TextEncoding::Utf8);
        let raw = format!("{{\"a\":{{\"{}\":1}}}}", EMBEDDED_JSON_KEY);
        let err = codec.to_readable(raw.as_bytes()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ReservedKey));

        let escaped = r#"{"\u005f_powerbi-vcs-embedded-json__":1}"#;
        let err = codec.to_readable(escaped.as_bytes()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ReservedKey));
    }

    #[test]
    fn test_key_order_and_text_preserved() {
        let codec = JsonCodec::new(TextEncoding::Utf8);
        let raw = r#"{"z":1.0,"a":-0,"m":1E400,"b":[0.10,2e-3],"name":"Café ©","\u00e9":"\u00e9","z":null}"#
            .as_bytes();
        let readable = codec.to_readable(raw).unwrap();
        assert_eq!(
            std::str::from_utf8(&readable).unwrap(),
            "{\n  \"z\": 1.0,\n  \"a\": -0,\n  \"m\": 1E400,\n  \"b\": [\n    0.10,\n    2e-3\n  ],\n  \"name\": \"Café ©\",\n  \"\\u00e9\": \"\\u00e9\",\n  \"z\": null\n}\n"
        );
        assert_eq!(codec.to_raw(&readable).unwrap(), raw);
    }

    #[test]
    fn test_edited_readable_form() {
        let codec = JsonCodec::new(TextEncoding::Utf8);
        let readable = "\u{feff}{\r\n    \"a\": [ 1E5 ],\r\n    \"b\": {}\r\n}";
        assert_eq!(codec.to_raw(readable.as_bytes()).unwrap(), br#"{"a":[1E5],"b":{}}"#);
    }

    #[test]
    fn test_not_valid_json() {
        let codec = JsonCodec::new(TextEncoding::Utf8);
        let err = codec.to_readable(b"{\"a\":").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NotValidJson(_)));
    }

    #[test]
    fn test_utf16_decode_failure() {
        let codec = JsonCodec::new(TextEncoding::Utf16Le);
        let err = codec.to_readable(b"{\x00}").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Decode { .. }));
    }

    #[quickcheck]
    fn test_string_equality(key: String, s: String, items: Vec<String>) -> bool {
        let codec = JsonCodec::new(TextEncoding::Utf16Le);
        let mut map = Map::new();
        map.insert(String::from("k"), Value::String(s.clone()));
        map.insert(key, json!({"nested": s, "items": items}));
        map.insert(String::from("embedded"), Value::String(json!({"s": s}).to_string()));
        let raw = utf16_raw(&Value::Object(map));

        let readable = codec.to_readable(&raw).unwrap();
        let back = codec.to_raw(&readable).unwrap();
        let again = codec.to_readable(&back).unwrap();
        back == raw && again == readable
    }
}
