//! Field-level validation errors and serializer-style readers.

use std::fmt::{self, Display, Formatter};

use serde_json::{Map, Value};

/// Key used for failures that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const NULL: &str = "This field may not be null.";
const INVALID_STRING: &str = "Not a valid string.";
const INVALID_INTEGER: &str = "A valid integer is required.";
const INVALID_BOOLEAN: &str = "Must be a valid boolean.";

/// Payload type that can be built from raw request input.
pub trait Validate: Sized + Send + 'static {
    /// Parse `input`, collecting every rejected field.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when any field fails.
    fn validate(input: &Value) -> Result<Self, FieldErrors>;
}

/// Failure recorded against one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Plain messages, in the order they were raised.
    Messages(Vec<String>),
    /// Failures of a nested object.
    Nested(FieldErrors),
}

/// Ordered mapping of field name to failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(String, FieldError)>,
}

impl FieldErrors {
    /// Empty error set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// `true` when nothing was rejected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rejected fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Append `message` to the messages recorded for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        let existing = self
            .entries
            .iter_mut()
            .find_map(|(name, error)| match error {
                FieldError::Messages(messages) if name == field => Some(messages),
                _ => None,
            });
        match existing {
            Some(messages) => messages.push(message),
            None => self
                .entries
                .push((field.to_string(), FieldError::Messages(vec![message]))),
        }
    }

    /// Record the failures of a nested object under `field`.
    pub fn nest(&mut self, field: &str, errors: Self) {
        if !errors.is_empty() {
            self.entries
                .push((field.to_string(), FieldError::Nested(errors)));
        }
    }

    /// Failure recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, error)| error)
    }

    /// Iterate failures in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.entries
            .iter()
            .map(|(name, error)| (name.as_str(), error))
    }

    /// Render one `field: message, message` block per field, joined by newlines.
    ///
    /// Nested objects are rendered recursively after their field name.
    #[must_use]
    pub fn format_errors(&self) -> String {
        self.entries
            .iter()
            .map(|(field, error)| match error {
                FieldError::Messages(messages) => format!("{field}: {}", messages.join(", ")),
                FieldError::Nested(nested) => format!("{field}: {}", nested.format_errors()),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Display for FieldErrors {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.format_errors())
    }
}

/// Reads typed fields out of a JSON object while accumulating failures.
///
/// Readers return `None` when a field is absent or rejected; [`finish`]
/// turns the accumulated failures into the validation result.
///
/// [`finish`]: FieldReader::finish
#[derive(Debug)]
pub struct FieldReader<'a> {
    fields: Option<&'a Map<String, Value>>,
    errors: FieldErrors,
}

impl<'a> FieldReader<'a> {
    /// Start reading `input`; non-object input is rejected as a whole.
    #[must_use]
    pub fn new(input: &'a Value) -> Self {
        let mut errors = FieldErrors::new();
        let fields = input.as_object();
        if fields.is_none() {
            errors.add(
                NON_FIELD_ERRORS,
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    json_type(input)
                ),
            );
        }
        Self { fields, errors }
    }

    /// Non-blank string; numbers are accepted in their textual form.
    pub fn required_str(&mut self, field: &str) -> Option<String> {
        let value = self.present(field, true)?;
        self.string(field, value)
    }

    /// Like [`required_str`](Self::required_str) but absent or null is `None`.
    pub fn optional_str(&mut self, field: &str) -> Option<String> {
        let value = self.present(field, false)?;
        self.string(field, value)
    }

    /// Integer; numeric strings are accepted so query parameters validate.
    pub fn required_i64(&mut self, field: &str) -> Option<i64> {
        let value = self.scalar(field, true)?;
        self.integer(field, value)
    }

    /// Like [`required_i64`](Self::required_i64) but absent, null, or empty is `None`.
    pub fn optional_i64(&mut self, field: &str) -> Option<i64> {
        let value = self.scalar(field, false)?;
        self.integer(field, value)
    }

    /// Boolean from JSON or from the usual textual spellings.
    pub fn optional_bool(&mut self, field: &str) -> Option<bool> {
        let value = self.scalar(field, false)?;
        let parsed = match value {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" => Some(false),
                _ => None,
            },
            Value::Number(number) => match number.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            _ => None,
        };
        if parsed.is_none() {
            self.errors.add(field, INVALID_BOOLEAN);
        }
        parsed
    }

    /// Nested object validated by `T`; its failures are recorded under `field`.
    pub fn required_nested<T: Validate>(&mut self, field: &str) -> Option<T> {
        let value = self.present(field, true)?;
        self.nested(field, value)
    }

    /// Like [`required_nested`](Self::required_nested) but absent or null is `None`.
    pub fn optional_nested<T: Validate>(&mut self, field: &str) -> Option<T> {
        let value = self.present(field, false)?;
        self.nested(field, value)
    }

    /// Reject strings longer than `max` characters.
    pub fn max_length(&mut self, field: &str, value: Option<String>, max: usize) -> Option<String> {
        let value = value?;
        if value.chars().count() > max {
            self.errors.add(
                field,
                format!("Ensure this field has no more than {max} characters."),
            );
            return None;
        }
        Some(value)
    }

    /// Reject integers below `min`.
    pub fn min_value(&mut self, field: &str, value: Option<i64>, min: i64) -> Option<i64> {
        let value = value?;
        if value < min {
            self.errors.add(
                field,
                format!("Ensure this value is greater than or equal to {min}."),
            );
            return None;
        }
        Some(value)
    }

    /// Reject integers above `max`.
    pub fn max_value(&mut self, field: &str, value: Option<i64>, max: i64) -> Option<i64> {
        let value = value?;
        if value > max {
            self.errors.add(
                field,
                format!("Ensure this value is less than or equal to {max}."),
            );
            return None;
        }
        Some(value)
    }

    /// Record a custom failure.
    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Produce the validated value, or every failure recorded so far.
    ///
    /// # Errors
    ///
    /// Returns the accumulated failures, or a non-field failure when no value
    /// was assembled despite every field passing.
    pub fn finish<T>(self, value: Option<T>) -> Result<T, FieldErrors> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        value.ok_or_else(|| {
            let mut errors = FieldErrors::new();
            errors.add(NON_FIELD_ERRORS, "Invalid data.");
            errors
        })
    }

    fn present(&mut self, field: &str, required: bool) -> Option<&'a Value> {
        let fields = self.fields?;
        match fields.get(field) {
            None => {
                if required {
                    self.errors.add(field, REQUIRED);
                }
                None
            }
            Some(Value::Null) => {
                if required {
                    self.errors.add(field, NULL);
                }
                None
            }
            Some(value) => Some(value),
        }
    }

    // Empty strings count as absent for non-string fields.
    fn scalar(&mut self, field: &str, required: bool) -> Option<&'a Value> {
        let value = self.present(field, required)?;
        match value {
            Value::String(text) if text.trim().is_empty() => {
                if required {
                    self.errors.add(field, REQUIRED);
                }
                None
            }
            other => Some(other),
        }
    }

    fn string(&mut self, field: &str, value: &Value) -> Option<String> {
        let text = match value {
            Value::String(text) => text.trim().to_string(),
            Value::Number(number) => number.to_string(),
            _ => {
                self.errors.add(field, INVALID_STRING);
                return None;
            }
        };
        if text.is_empty() {
            self.errors.add(field, BLANK);
            return None;
        }
        Some(text)
    }

    fn integer(&mut self, field: &str, value: &Value) -> Option<i64> {
        let parsed = match value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.errors.add(field, INVALID_INTEGER);
        }
        parsed
    }

    fn nested<T: Validate>(&mut self, field: &str, value: &Value) -> Option<T> {
        match T::validate(value) {
            Ok(parsed) => Some(parsed),
            Err(errors) => {
                self.errors.nest(field, errors);
                None
            }
        }
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Eq)]
    struct Address {
        city: String,
        zip: i64,
    }

    impl Validate for Address {
        fn validate(input: &Value) -> Result<Self, FieldErrors> {
            let mut reader = FieldReader::new(input);
            let city = reader.required_str("city");
            let zip = reader.required_i64("zip");
            let zip = reader.min_value("zip", zip, 1);
            reader.finish(city.zip(zip).map(|(city, zip)| Self { city, zip }))
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Profile {
        name: String,
        age: Option<i64>,
        address: Option<Address>,
    }

    impl Validate for Profile {
        fn validate(input: &Value) -> Result<Self, FieldErrors> {
            let mut reader = FieldReader::new(input);
            let name = reader.required_str("name");
            let name = reader.max_length("name", name, 8);
            let age = reader.optional_i64("age");
            let address = reader.optional_nested::<Address>("address");
            reader.finish(name.map(|name| Self { name, age, address }))
        }
    }

    #[test]
    fn two_rejected_fields_render_one_line_each() {
        let Err(errors) = Profile::validate(&json!({"name": "", "age": "old"})) else {
            panic!("expected validation failure");
        };
        let message = errors.format_errors();
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(
            lines,
            vec![
                "name: This field may not be blank.",
                "age: A valid integer is required.",
            ]
        );
    }

    #[test]
    fn nested_failures_render_recursively() {
        let input = json!({"name": "ada", "address": {"zip": 0}});
        let Err(errors) = Profile::validate(&input) else {
            panic!("expected validation failure");
        };
        assert!(matches!(errors.get("address"), Some(FieldError::Nested(_))));
        assert_eq!(
            errors.format_errors(),
            "address: city: This field is required.\nzip: Ensure this value is greater than or equal to 1."
        );
    }

    #[test]
    fn messages_for_one_field_join_with_commas() {
        let mut errors = FieldErrors::new();
        errors.add("name", "first");
        errors.add("name", "second");
        errors.add("email", "third");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.to_string(), "name: first, second\nemail: third");
    }

    #[test]
    fn query_style_strings_are_coerced() -> Result<(), FieldErrors> {
        let profile = Profile::validate(&json!({"name": " ada ", "age": "42"}))?;
        assert_eq!(
            profile,
            Profile {
                name: "ada".into(),
                age: Some(42),
                address: None,
            }
        );
        let profile = Profile::validate(&json!({"name": 7, "age": ""}))?;
        assert_eq!(profile.name, "7");
        assert_eq!(profile.age, None);
        Ok(())
    }

    #[test]
    fn missing_null_and_long_values_use_serializer_messages() {
        let Err(errors) = Profile::validate(&json!({})) else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.to_string(), "name: This field is required.");

        let Err(errors) = Profile::validate(&json!({"name": null})) else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.to_string(), "name: This field may not be null.");

        let Err(errors) = Profile::validate(&json!({"name": "abcdefghi"})) else {
            panic!("expected validation failure");
        };
        assert_eq!(
            errors.to_string(),
            "name: Ensure this field has no more than 8 characters."
        );
    }

    #[test]
    fn non_object_input_is_rejected_as_a_whole() {
        let Err(errors) = Profile::validate(&json!(["ada"])) else {
            panic!("expected validation failure");
        };
        assert_eq!(
            errors.to_string(),
            "non_field_errors: Invalid data. Expected a dictionary, but got list."
        );
    }

    #[test]
    fn booleans_accept_textual_forms() {
        let input = json!({"a": "true", "b": 0, "c": "maybe"});
        let mut reader = FieldReader::new(&input);
        assert_eq!(reader.optional_bool("a"), Some(true));
        assert_eq!(reader.optional_bool("b"), Some(false));
        assert_eq!(reader.optional_bool("c"), None);
        assert_eq!(reader.optional_bool("missing"), None);
        let Err(errors) = reader.finish(Some(())) else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.to_string(), "c: Must be a valid boolean.");
    }
}
