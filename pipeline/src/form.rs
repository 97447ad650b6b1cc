use std::fmt;
use std::sync::Arc;

/// Handle on the in-progress processing of a multipart upload.
///
/// `rollback` releases anything written for the upload so far. Calling it when
/// nothing was written must be harmless.
pub trait UploadHandler: Send + Sync {
    fn rollback(&self);

    /// Plain (non-file) fields extracted from the multipart body
    fn parameters(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// The mutable input object bound to one request
#[derive(Clone)]
pub struct FormState {
    name: String,
    fields: Vec<(String, String)>,
    upload: Option<Arc<dyn UploadHandler>>,
}

impl FormState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            upload: None,
        }
    }

    /// Name of the form bean this state was created from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drop all values and the upload reference before population
    pub fn reset(&mut self) {
        self.fields.clear();
        self.upload = None;
    }

    /// First value submitted for a field
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn get_all<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Append a value, keeping earlier values for the same field
    pub fn append(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.push((field.into(), value.into()));
    }

    /// Replace every value of a field with a single one
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        self.fields.retain(|(name, _)| *name != field);
        self.fields.push((field, value.into()));
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(field, value);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn upload_handler(&self) -> Option<&Arc<dyn UploadHandler>> {
        self.upload.as_ref()
    }

    pub fn set_upload_handler(&mut self, handler: Arc<dyn UploadHandler>) {
        self.upload = Some(handler);
    }

    pub fn with_upload_handler(mut self, handler: Arc<dyn UploadHandler>) -> Self {
        self.upload = Some(handler);
        self
    }

    /// Field values as a JSON object; repeated fields become arrays
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.fields {
            match map.get_mut(name) {
                Some(serde_json::Value::Array(values)) => values.push(value.clone().into()),
                Some(existing) => {
                    let first = existing.take();
                    *existing = serde_json::Value::Array(vec![first, value.clone().into()]);
                }
                None => {
                    map.insert(name.clone(), value.clone().into());
                }
            }
        }
        serde_json::Value::Object(map)
    }
}

impl fmt::Debug for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormState")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("upload", &self.upload.is_some())
            .finish()
    }
}
