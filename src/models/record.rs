//! Represents one service-provider metadata record as kept in the metadata store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// SAML 2.0 HTTP-POST binding, used for AssertionConsumerService endpoints.
pub const BINDING_HTTP_POST: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST";

/// SAML 2.0 HTTP-Redirect binding, used for SingleLogoutService endpoints.
pub const BINDING_HTTP_REDIRECT: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect";

/// Metadata for a single SAML 2.0 service provider.
///
/// The keys the editor understands are typed fields. Everything else (for
/// example keys carried over from an imported descriptor) is kept verbatim in
/// `extra` so a load/save cycle never drops data it does not know about.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MetadataRecord {
    /// Unique entity identifier; primary key in the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entityid: Option<String>,

    /// Display name of the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,

    /// Free-text description of the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,

    /// User id allowed to view, edit and delete this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Last save, as epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,

    /// Expiry, as epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire: Option<i64>,

    #[serde(
        rename = "AssertionConsumerService",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub assertion_consumer_service: Option<EndpointValue>,

    #[serde(
        rename = "SingleLogoutService",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub single_logout_service: Option<EndpointValue>,

    /// Keys the editor does not manage.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl MetadataRecord {
    /// A fresh record shell that only carries an owner.
    pub fn owned_by(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            ..Self::default()
        }
    }

    /// Overwrite every key that is set on `overrides`.
    ///
    /// Keys absent from `overrides` are left untouched.
    pub fn apply_overrides(&mut self, overrides: MetadataRecord) {
        let MetadataRecord {
            entityid,
            name,
            description,
            owner,
            updated,
            expire,
            assertion_consumer_service,
            single_logout_service,
            extra,
        } = overrides;

        if entityid.is_some() {
            self.entityid = entityid;
        }
        if name.is_some() {
            self.name = name;
        }
        if description.is_some() {
            self.description = description;
        }
        if owner.is_some() {
            self.owner = owner;
        }
        if updated.is_some() {
            self.updated = updated;
        }
        if expire.is_some() {
            self.expire = expire;
        }
        if assertion_consumer_service.is_some() {
            self.assertion_consumer_service = assertion_consumer_service;
        }
        if single_logout_service.is_some() {
            self.single_logout_service = single_logout_service;
        }
        self.extra.extend(extra);
    }
}

/// A text value that is either plain or keyed by language code.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl LocalizedText {
    /// Reduce to a single editable string.
    ///
    /// Language maps keep only their `en` entry; a map without one yields
    /// `None` and every other language is discarded.
    pub fn into_english(self) -> Option<String> {
        match self {
            LocalizedText::Plain(text) => Some(text),
            LocalizedText::Localized(mut by_lang) => by_lang.remove("en"),
        }
    }
}

impl From<&str> for LocalizedText {
    fn from(value: &str) -> Self {
        LocalizedText::Plain(value.to_string())
    }
}

/// Stored shape of an endpoint key.
///
/// Older records hold the location as a bare string; those are read as-is.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum EndpointValue {
    List(Vec<Endpoint>),
    Legacy(String),
}

impl EndpointValue {
    pub fn single(endpoint: Endpoint) -> Self {
        EndpointValue::List(vec![endpoint])
    }

    /// Location of the first endpoint, or the raw legacy value.
    pub fn location(&self) -> &str {
        match self {
            EndpointValue::List(endpoints) => endpoints
                .first()
                .map(|endpoint| endpoint.location.as_str())
                .unwrap_or(""),
            EndpointValue::Legacy(location) => location,
        }
    }
}

/// A protocol binding and the URL the service provider receives it on.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Endpoint {
    #[serde(rename = "Binding")]
    pub binding: String,

    #[serde(rename = "Location")]
    pub location: String,

    /// Only present on indexed endpoint types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,

    #[serde(rename = "isDefault", default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,

    /// Any other endpoint attribute, e.g. `ResponseLocation`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Endpoint {
    pub fn new(binding: &str, location: impl Into<String>, index: Option<u32>) -> Self {
        Self {
            binding: binding.to_string(),
            location: location.into(),
            index,
            is_default: None,
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_language_maps_and_plain_names() {
        let record: MetadataRecord = serde_json::from_value(json!({
            "entityid": "https://sp.example.org",
            "name": { "en": "Foo", "no": "Bar" },
            "description": "Plain text",
        }))
        .unwrap();

        let mut expected = BTreeMap::new();
        expected.insert("en".to_string(), "Foo".to_string());
        expected.insert("no".to_string(), "Bar".to_string());
        assert_eq!(record.name, Some(LocalizedText::Localized(expected)));
        assert_eq!(record.description, Some(LocalizedText::from("Plain text")));
    }

    #[test]
    fn keeps_unknown_keys_through_a_round_trip() {
        let input = json!({
            "entityid": "https://sp.example.org",
            "owner": "alice",
            "certData": "MIIC...",
            "metadata-set": "saml20-sp-remote",
        });
        let record: MetadataRecord = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(record.extra.get("certData"), Some(&json!("MIIC...")));
        assert_eq!(serde_json::to_value(&record).unwrap(), input);
    }

    #[test]
    fn tolerates_legacy_scalar_endpoints() {
        let record: MetadataRecord = serde_json::from_value(json!({
            "AssertionConsumerService": "https://sp.example.org/acs",
            "SingleLogoutService": [
                { "Binding": BINDING_HTTP_REDIRECT, "Location": "https://sp.example.org/slo" }
            ],
        }))
        .unwrap();

        let acs = record.assertion_consumer_service.unwrap();
        assert_eq!(acs, EndpointValue::Legacy("https://sp.example.org/acs".into()));
        assert_eq!(acs.location(), "https://sp.example.org/acs");
        assert_eq!(
            record.single_logout_service.unwrap().location(),
            "https://sp.example.org/slo"
        );
    }

    #[test]
    fn unindexed_endpoint_serializes_without_index() {
        let value = serde_json::to_value(Endpoint::new(
            BINDING_HTTP_REDIRECT,
            "https://sp/slo",
            None,
        ))
        .unwrap();
        assert_eq!(
            value,
            json!({ "Binding": BINDING_HTTP_REDIRECT, "Location": "https://sp/slo" })
        );
    }

    #[test]
    fn overrides_win_only_for_keys_they_set() {
        let mut record = MetadataRecord {
            entityid: Some("https://sp.example.org".into()),
            owner: Some("mallory".into()),
            ..MetadataRecord::default()
        };
        record.apply_overrides(MetadataRecord::owned_by("alice"));

        assert_eq!(record.owner.as_deref(), Some("alice"));
        assert_eq!(record.entityid.as_deref(), Some("https://sp.example.org"));
    }

    #[test]
    fn english_entry_is_kept_and_other_languages_dropped() {
        let mut by_lang = BTreeMap::new();
        by_lang.insert("no".to_string(), "Bar".to_string());
        assert_eq!(LocalizedText::Localized(by_lang.clone()).into_english(), None);

        by_lang.insert("en".to_string(), "Foo".to_string());
        assert_eq!(
            LocalizedText::Localized(by_lang).into_english().as_deref(),
            Some("Foo")
        );
    }
}
