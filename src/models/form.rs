//! Form-side models: the submitted key/value data and the description of the
//! editing form handed to the renderer.

use serde::Serialize;
use std::collections::HashMap;

/// Name of the hidden field carrying the entity id the form was opened with.
pub const WAS_ENTITYID: &str = "was-entityid";

/// Presence of this field marks a form post as a save request.
pub const SUBMIT: &str = "submit";

/// The record keys the editor reads from a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKey {
    EntityId,
    Name,
    Description,
    AssertionConsumerService,
    SingleLogoutService,
}

impl FormKey {
    /// Record key this form field maps onto.
    pub const fn key(self) -> &'static str {
        match self {
            FormKey::EntityId => "entityid",
            FormKey::Name => "name",
            FormKey::Description => "description",
            FormKey::AssertionConsumerService => "AssertionConsumerService",
            FormKey::SingleLogoutService => "SingleLogoutService",
        }
    }

    /// Submitted field name (`field_<key>`).
    pub const fn field_name(self) -> &'static str {
        match self {
            FormKey::EntityId => "field_entityid",
            FormKey::Name => "field_name",
            FormKey::Description => "field_description",
            FormKey::AssertionConsumerService => "field_AssertionConsumerService",
            FormKey::SingleLogoutService => "field_SingleLogoutService",
        }
    }
}

/// Flat key/value data submitted by the client.
#[derive(Debug, Clone, Default)]
pub struct FormSubmission {
    values: HashMap<String, String>,
}

impl FormSubmission {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Submitted value for a known record key, if the field was sent at all.
    pub fn field(&self, key: FormKey) -> Option<&str> {
        self.get(key.field_name())
    }

    /// Raw lookup for request parameters outside the field set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_submit(&self) -> bool {
        self.values.contains_key(SUBMIT)
    }
}

impl From<HashMap<String, String>> for FormSubmission {
    fn from(values: HashMap<String, String>) -> Self {
        Self::new(values)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormSubmission {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// How a field is presented.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    ReadOnly,
    ReadOnlyDate,
}

/// One row of the form.
///
/// `value` is already HTML-escaped and can be embedded as-is.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: String,
}

/// An `<input type="hidden">`; `value` is already HTML-escaped.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HiddenField {
    pub name: &'static str,
    pub value: String,
}

/// A tab of the form.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FormSection {
    pub id: &'static str,
    pub title: &'static str,
    pub fields: Vec<FormField>,
}

/// Everything a renderer needs to produce the editing form.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDescription {
    pub hidden: Vec<HiddenField>,
    pub sections: Vec<FormSection>,
}

#[cfg(test)]
impl FormDescription {
    /// Find a visible field by its name.
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.sections
            .iter()
            .flat_map(|section| section.fields.iter())
            .find(|field| field.name == name)
    }

    pub fn hidden(&self, name: &str) -> Option<&HiddenField> {
        self.hidden.iter().find(|field| field.name == name)
    }
}
