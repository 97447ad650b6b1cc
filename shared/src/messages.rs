use serde::{Deserialize, Serialize};

/// Property name for messages that are not tied to a single field
pub const GLOBAL_MESSAGE: &str = "global";

/// A field-level validation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Ordered multi-map of field to validation messages.
///
/// Messages for the same field stay grouped together, and fields keep the
/// order in which they were first reported. An empty set means "no errors",
/// exactly like an absent one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMessageSet {
    entries: Vec<FieldError>,
}

impl ErrorMessageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message, keeping it next to earlier messages for the same field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.push(FieldError::new(field, message));
        self
    }

    pub fn push(&mut self, error: FieldError) {
        match self.entries.iter().rposition(|e| e.field == error.field) {
            Some(last) => self.entries.insert(last + 1, error),
            None => self.entries.push(error),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All messages, grouped by field in first-reported order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.entries.iter()
    }

    /// Messages reported for one field
    pub fn get<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.entries.iter().filter(move |e| e.field == field)
    }

    /// Distinct field names in first-reported order
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !fields.contains(&entry.field.as_str()) {
                fields.push(&entry.field);
            }
        }
        fields
    }

    pub fn merge(&mut self, other: ErrorMessageSet) {
        for error in other.entries {
            self.push(error);
        }
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.entries
    }
}

impl From<Vec<FieldError>> for ErrorMessageSet {
    fn from(errors: Vec<FieldError>) -> Self {
        errors.into_iter().collect()
    }
}

impl FromIterator<FieldError> for ErrorMessageSet {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        let mut set = ErrorMessageSet::new();
        for error in iter {
            set.push(error);
        }
        set
    }
}

impl IntoIterator for ErrorMessageSet {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorMessageSet {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_grouped_by_field() {
        let mut set = ErrorMessageSet::new();
        set.add("email", "is required")
            .add("name", "is too long")
            .add("email", "must be a valid address");

        let ordered: Vec<String> = set.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            ordered,
            vec![
                "email: is required",
                "email: must be a valid address",
                "name: is too long",
            ]
        );
        assert_eq!(set.fields(), vec!["email", "name"]);
        assert_eq!(set.get("email").count(), 2);
    }

    #[test]
    fn test_empty_set() {
        let set = ErrorMessageSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(set.fields().is_empty());
    }

    #[test]
    fn test_serializes_as_list() {
        let mut set = ErrorMessageSet::new();
        set.add("email", "is required");

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"field": "email", "message": "is required"}])
        );
    }

    #[test]
    fn test_merge_keeps_grouping() {
        let mut first = ErrorMessageSet::from(vec![
            FieldError::new("a", "one"),
            FieldError::new("b", "two"),
        ]);
        first.merge(ErrorMessageSet::from(vec![FieldError::new("a", "three")]));

        let fields: Vec<&str> = first.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["a", "a", "b"]);
    }
}
