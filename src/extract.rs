//! JSON validation and extraction from free-form model output
//!
//! Extraction takes the span from the first `{` to the last `}` and parses
//! it as a whole. The scan does not balance brackets: prose containing a
//! stray brace, or a reply with several objects, yields a span that fails
//! to parse (reported as invalid JSON rather than "not found").

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

pub const NO_JSON_FOUND: &str = "no JSON object found in response";

/// Outcome of validating or extracting JSON
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult
{   /// Parsed value of any JSON shape
    Valid(Value)
  , /// Human-readable diagnostic
    Invalid(String)
}

impl ExtractionResult
{   pub fn is_valid(&self) -> bool
    {   matches!(self, ExtractionResult::Valid(_))
    }

    pub fn into_result(self) -> Result<Value, String>
    {   match self
        {   ExtractionResult::Valid(data) => Ok(data)
          , ExtractionResult::Invalid(reason) => Err(reason)
        }
    }
}

/// Wire shape: `{isValid, data}` or `{isValid, error}`
impl Serialize for ExtractionResult
{   fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
      S: Serializer
    {   let mut state = serializer.serialize_struct("ExtractionResult", 2)?;
        match self
        {   ExtractionResult::Valid(data) => {
              state.serialize_field("isValid", &true)?;
              state.serialize_field("data", data)?;
            }
          , ExtractionResult::Invalid(reason) => {
              state.serialize_field("isValid", &false)?;
              state.serialize_field("error", reason)?;
            }
        }
        state.end()
    }
}

/// Strictly parse the whole input as JSON
pub fn validate(text: &str) -> ExtractionResult
{   match serde_json::from_str::<Value>(text)
    {   Ok(data) => ExtractionResult::Valid(data)
      , Err(e) => ExtractionResult::Invalid(e.to_string())
    }
}

/// Locate the first `{`..last `}` span and validate it
pub fn extract_from_free_text(text: &str) -> ExtractionResult
{   match find_object_span(text)
    {   Some(span) => validate(span)
      , None => ExtractionResult::Invalid(NO_JSON_FOUND.to_string())
    }
}

fn find_object_span(text: &str) -> Option<&str>
{   let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start
    {   return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn validate_accepts_any_json_shape()
    {   for text in ["{\"a\":1}", "[1,2,3]", "\"str\"", "42", "null", " true "]
        {   let expected: Value = serde_json::from_str(text).unwrap();
            assert_eq!(validate(text), ExtractionResult::Valid(expected));
        }
    }

    #[test]
    fn validate_reports_parser_message()
    {   match validate("{bad json")
        {   ExtractionResult::Invalid(reason) => assert!(!reason.is_empty())
          , other => panic!("expected invalid, got {:?}", other)
        }
    }

    #[test]
    fn validate_does_not_search()
    {   assert!(!validate("here: {\"a\":1}").is_valid());
    }

    #[test]
    fn extracts_object_embedded_in_prose()
    {   let reply = "Sure!\n{\"planets\":[\"Earth\",\"Mars\"]}\nEnjoy.";
        assert_eq!(
          extract_from_free_text(reply),
          ExtractionResult::Valid(json!({"planets": ["Earth", "Mars"]}))
        );
    }

    #[test]
    fn nested_objects_are_kept_whole()
    {   let reply = "Result: {\"a\":{\"b\":{\"c\":1}}} done";
        assert_eq!(
          extract_from_free_text(reply),
          ExtractionResult::Valid(json!({"a": {"b": {"c": 1}}}))
        );
    }

    #[test]
    fn missing_brace_is_not_found()
    {   assert_eq!(
          extract_from_free_text("I cannot help with that."),
          ExtractionResult::Invalid(NO_JSON_FOUND.to_string())
        );
        assert_eq!(
          extract_from_free_text("closing } before opening {"),
          ExtractionResult::Invalid(NO_JSON_FOUND.to_string())
        );
        assert_eq!(
          extract_from_free_text("only an opening { here"),
          ExtractionResult::Invalid(NO_JSON_FOUND.to_string())
        );
    }

    #[test]
    fn malformed_span_is_invalid_with_reason()
    {   match extract_from_free_text("Here: {\"a\": [1, 2} trailing")
        {   ExtractionResult::Invalid(reason) => {
              assert!(!reason.is_empty());
              assert_ne!(reason, NO_JSON_FOUND);
            }
          , other => panic!("expected invalid, got {:?}", other)
        }
    }

    #[test]
    fn multiple_objects_produce_an_unparsable_span()
    {   let reply = "{\"a\":1} and also {\"b\":2}";
        assert!(!extract_from_free_text(reply).is_valid());
    }

    #[test]
    fn serializes_to_wire_shape()
    {   let valid = serde_json::to_value(
          ExtractionResult::Valid(json!({"x": 1}))
        ).unwrap();
        assert_eq!(valid, json!({"isValid": true, "data": {"x": 1}}));

        let invalid = serde_json::to_value(
          ExtractionResult::Invalid("oops".to_string())
        ).unwrap();
        assert_eq!(invalid, json!({"isValid": false, "error": "oops"}));
    }
}
