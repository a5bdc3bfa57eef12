//! Mapping between submitted form data and metadata records.
//!
//! - [`check_form`] validates the required fields of a submission.
//! - [`form_to_meta`] folds a submission into a record.
//! - [`meta_to_form`] describes the editing form for a record.
//!
//! All three are pure; persisting the result is up to the caller.

use crate::{
    models::{
        form::{
            FieldKind, FormDescription, FormField, FormKey, FormSection, FormSubmission,
            HiddenField, WAS_ENTITYID,
        },
        record::{
            BINDING_HTTP_POST, BINDING_HTTP_REDIRECT, Endpoint, EndpointValue, LocalizedText,
            MetadataRecord,
        },
    },
    views::escape_html,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Placeholder shown for unset dates.
const NOT_SET: &str = "Not set";

/// `D. Month YYYY, H:MM`
const DATE_FORMAT: &str = "%-d. %B %Y, %-H:%M";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field [{0}] was missing")]
    MissingField(&'static str),
    #[error("required field [{0}] was empty")]
    EmptyField(&'static str),
}

/// Check that `entityid` and `name` were submitted and are not blank.
///
/// Stops at the first failure, in that order.
pub fn check_form(submission: &FormSubmission) -> Result<(), ValidationError> {
    require_field(submission, FormKey::EntityId)?;
    require_field(submission, FormKey::Name)?;
    Ok(())
}

fn require_field(submission: &FormSubmission, key: FormKey) -> Result<(), ValidationError> {
    match submission.field(key) {
        None => Err(ValidationError::MissingField(key.key())),
        Some(value) if value.trim().is_empty() => Err(ValidationError::EmptyField(key.key())),
        Some(_) => Ok(()),
    }
}

/// Build a record from a submission on top of `base`.
///
/// Every tracked key takes the submitted value, or is removed when its field
/// was not submitted. Endpoints become a single entry with the fixed binding
/// for their type. `updated` is set to now, then every key set on
/// `overrides` is applied last.
pub fn form_to_meta(
    submission: &FormSubmission,
    base: MetadataRecord,
    overrides: MetadataRecord,
) -> MetadataRecord {
    let mut record = base;

    record.entityid = submission.field(FormKey::EntityId).map(str::to_string);
    record.name = submission.field(FormKey::Name).map(LocalizedText::from);
    record.description = submission.field(FormKey::Description).map(LocalizedText::from);
    record.assertion_consumer_service = submission
        .field(FormKey::AssertionConsumerService)
        .map(|location| EndpointValue::single(Endpoint::new(BINDING_HTTP_POST, location, Some(0))));
    record.single_logout_service = submission
        .field(FormKey::SingleLogoutService)
        .map(|location| EndpointValue::single(Endpoint::new(BINDING_HTTP_REDIRECT, location, None)));
    record.updated = Some(Utc::now().timestamp());

    record.apply_overrides(overrides);
    record
}

/// Reduce `name` and `description` to their English text.
///
/// A language map without an `en` entry removes the key. This loses any
/// other language, since the form edits a single language only.
pub fn flatten_language_fields(mut record: MetadataRecord) -> MetadataRecord {
    record.name = record
        .name
        .and_then(LocalizedText::into_english)
        .map(LocalizedText::Plain);
    record.description = record
        .description
        .and_then(LocalizedText::into_english)
        .map(LocalizedText::Plain);
    record
}

/// Describe the editing form for `record`. Every value is HTML-escaped.
pub fn meta_to_form(record: &MetadataRecord) -> FormDescription {
    let record = flatten_language_fields(record.clone());

    let hidden = record
        .entityid
        .as_deref()
        .map(|entity_id| HiddenField {
            name: WAS_ENTITYID,
            value: escape_html(entity_id),
        })
        .into_iter()
        .collect();

    let basic = FormSection {
        id: "basic",
        title: "Name and description",
        fields: vec![
            text_field(FormKey::EntityId, "EntityID", record.entityid.as_deref()),
            text_field(FormKey::Name, "Name of service", plain(&record.name)),
            FormField {
                kind: FieldKind::TextArea,
                ..text_field(
                    FormKey::Description,
                    "Description of service",
                    plain(&record.description),
                )
            },
            FormField {
                name: "owner",
                label: "Owner",
                kind: FieldKind::ReadOnly,
                value: escape_html(record.owner.as_deref().unwrap_or("")),
            },
            date_field("updated", "Last updated", record.updated),
            date_field("expire", "Expire", record.expire),
        ],
    };

    let saml = FormSection {
        id: "saml",
        title: "SAML 2.0",
        fields: vec![
            text_field(
                FormKey::AssertionConsumerService,
                "AssertionConsumerService endpoint",
                record
                    .assertion_consumer_service
                    .as_ref()
                    .map(EndpointValue::location),
            ),
            text_field(
                FormKey::SingleLogoutService,
                "SingleLogoutService endpoint",
                record
                    .single_logout_service
                    .as_ref()
                    .map(EndpointValue::location),
            ),
        ],
    };

    FormDescription {
        hidden,
        sections: vec![basic, saml],
    }
}

fn plain(text: &Option<LocalizedText>) -> Option<&str> {
    match text {
        Some(LocalizedText::Plain(value)) => Some(value),
        _ => None,
    }
}

fn text_field(key: FormKey, label: &'static str, value: Option<&str>) -> FormField {
    FormField {
        name: key.field_name(),
        label,
        kind: FieldKind::Text,
        value: escape_html(value.unwrap_or("")),
    }
}

fn date_field(name: &'static str, label: &'static str, timestamp: Option<i64>) -> FormField {
    FormField {
        name,
        label,
        kind: FieldKind::ReadOnlyDate,
        value: timestamp
            .and_then(format_date)
            .unwrap_or_else(|| NOT_SET.to_string()),
    }
}

fn format_date(timestamp: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.format(DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn submission(fields: &[(&str, &str)]) -> FormSubmission {
        fields.iter().copied().collect()
    }

    fn complete() -> FormSubmission {
        submission(&[
            ("field_entityid", "https://sp.example.org"),
            ("field_name", "Example SP"),
            ("field_description", "A <b>bold</b> service"),
        ])
    }

    #[test]
    fn check_form_reports_missing_fields_in_order() {
        assert_eq!(
            check_form(&submission(&[])),
            Err(ValidationError::MissingField("entityid"))
        );
        assert_eq!(
            check_form(&submission(&[("field_entityid", "https://sp")])),
            Err(ValidationError::MissingField("name"))
        );
        assert_eq!(check_form(&complete()), Ok(()));
    }

    #[test]
    fn check_form_rejects_blank_values() {
        assert_eq!(
            check_form(&submission(&[("field_entityid", ""), ("field_name", "x")])),
            Err(ValidationError::EmptyField("entityid"))
        );
        assert_eq!(
            check_form(&submission(&[("field_entityid", "https://sp"), ("field_name", "  ")])),
            Err(ValidationError::EmptyField("name"))
        );
    }

    #[test]
    fn owner_override_beats_submitted_owner_like_fields() {
        let sub = submission(&[
            ("field_entityid", "https://sp.example.org"),
            ("field_name", "Example SP"),
            ("field_owner", "mallory"),
            ("owner", "mallory"),
        ]);
        let base = MetadataRecord::owned_by("mallory");

        let record = form_to_meta(&sub, base, MetadataRecord::owned_by("alice"));
        assert_eq!(record.owner.as_deref(), Some("alice"));
    }

    #[test]
    fn updated_is_always_refreshed() {
        let before = Utc::now().timestamp();
        let base = MetadataRecord {
            updated: Some(0),
            ..MetadataRecord::default()
        };
        let record = form_to_meta(&complete(), base, MetadataRecord::default());
        assert!(record.updated.unwrap() >= before);
    }

    #[test]
    fn omitted_fields_are_cleared() {
        let first = form_to_meta(
            &submission(&[
                ("field_entityid", "https://sp"),
                ("field_name", "SP"),
                ("field_description", "old"),
                ("field_SingleLogoutService", "https://sp/slo"),
            ]),
            MetadataRecord::default(),
            MetadataRecord::owned_by("alice"),
        );
        assert!(first.description.is_some());

        let second = form_to_meta(
            &submission(&[("field_entityid", "https://sp"), ("field_name", "SP")]),
            first,
            MetadataRecord::owned_by("alice"),
        );
        assert_eq!(second.description, None);
        assert_eq!(second.single_logout_service, None);
        assert_eq!(second.owner.as_deref(), Some("alice"));
    }

    #[test]
    fn base_keys_outside_the_form_survive() {
        let mut base = MetadataRecord::default();
        base.extra
            .insert("certData".into(), serde_json::json!("MIIC..."));
        let record = form_to_meta(&complete(), base, MetadataRecord::default());
        assert_eq!(record.extra.get("certData"), Some(&serde_json::json!("MIIC...")));
    }

    #[test]
    fn endpoints_get_fixed_bindings() {
        let record = form_to_meta(
            &submission(&[
                ("field_AssertionConsumerService", "https://sp/acs"),
                ("field_SingleLogoutService", "https://sp/slo"),
            ]),
            MetadataRecord::default(),
            MetadataRecord::default(),
        );

        assert_eq!(
            record.assertion_consumer_service,
            Some(EndpointValue::List(vec![Endpoint::new(
                BINDING_HTTP_POST,
                "https://sp/acs",
                Some(0)
            )]))
        );
        let slo = serde_json::to_value(&record.single_logout_service).unwrap();
        assert_eq!(
            slo,
            serde_json::json!([{ "Binding": BINDING_HTTP_REDIRECT, "Location": "https://sp/slo" }])
        );
    }

    #[test]
    fn round_trip_renders_submitted_values_escaped() {
        let record = form_to_meta(
            &complete(),
            MetadataRecord::default(),
            MetadataRecord::owned_by("alice"),
        );
        let form = meta_to_form(&record);

        assert_eq!(form.field("field_entityid").unwrap().value, "https://sp.example.org");
        assert_eq!(form.field("field_name").unwrap().value, "Example SP");
        let description = form.field("field_description").unwrap();
        assert_eq!(description.kind, FieldKind::TextArea);
        assert_eq!(description.value, "A &lt;b&gt;bold&lt;/b&gt; service");
        assert_eq!(form.field("owner").unwrap().value, "alice");
        assert_eq!(
            form.hidden(WAS_ENTITYID).unwrap().value,
            "https://sp.example.org"
        );
    }

    #[test]
    fn language_maps_flatten_to_english() {
        let mut both = BTreeMap::new();
        both.insert("en".to_string(), "Foo".to_string());
        both.insert("no".to_string(), "Bar".to_string());
        let mut norwegian = BTreeMap::new();
        norwegian.insert("no".to_string(), "Bar".to_string());

        let record = MetadataRecord {
            name: Some(LocalizedText::Localized(both)),
            description: Some(LocalizedText::Localized(norwegian.clone())),
            ..MetadataRecord::default()
        };
        let form = meta_to_form(&record);
        assert_eq!(form.field("field_name").unwrap().value, "Foo");
        assert_eq!(form.field("field_description").unwrap().value, "");

        let only_norwegian = MetadataRecord {
            name: Some(LocalizedText::Localized(norwegian)),
            ..MetadataRecord::default()
        };
        assert_eq!(flatten_language_fields(only_norwegian).name, None);
    }

    #[test]
    fn fresh_shell_has_no_carry_over_and_placeholder_dates() {
        let form = meta_to_form(&MetadataRecord::owned_by("alice"));

        assert!(form.hidden.is_empty());
        assert_eq!(form.field("field_entityid").unwrap().value, "");
        assert_eq!(form.field("updated").unwrap().value, NOT_SET);
        assert_eq!(form.field("expire").unwrap().kind, FieldKind::ReadOnlyDate);
    }

    #[test]
    fn dates_use_day_month_year_time() {
        let record = MetadataRecord {
            // 2024-03-05 09:07:00 UTC
            updated: Some(1_709_629_620),
            ..MetadataRecord::default()
        };
        let form = meta_to_form(&record);
        assert_eq!(form.field("updated").unwrap().value, "5. March 2024, 9:07");
    }

    #[test]
    fn endpoint_fields_read_sequences_and_legacy_scalars() {
        let record = MetadataRecord {
            assertion_consumer_service: Some(EndpointValue::single(Endpoint::new(
                BINDING_HTTP_POST,
                "https://sp/acs?a=1&b=2",
                Some(0),
            ))),
            single_logout_service: Some(EndpointValue::Legacy("https://sp/slo".into())),
            ..MetadataRecord::default()
        };
        let form = meta_to_form(&record);

        assert_eq!(
            form.field("field_AssertionConsumerService").unwrap().value,
            "https://sp/acs?a=1&amp;b=2"
        );
        assert_eq!(
            form.field("field_SingleLogoutService").unwrap().value,
            "https://sp/slo"
        );
    }
}
