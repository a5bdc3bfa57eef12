//! Bootstrapping a record from an already parsed SAML 2.0 SP descriptor.
//!
//! Descriptors arrive as JSON produced by an external metadata parser: a
//! single entity object or an array of them, in which case the last one is
//! used. Endpoint lists are then trimmed to one default endpoint each so the
//! result fits the single-endpoint edit form.

use crate::models::record::{
    BINDING_HTTP_POST, BINDING_HTTP_REDIRECT, Endpoint, EndpointValue, MetadataRecord,
};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("metadata descriptor is empty")]
    Empty,
    #[error("metadata descriptor contains no entity")]
    NoEntity,
    #[error("could not parse metadata descriptor: {0}")]
    Parse(#[from] serde_json::Error),
}

pub trait DescriptorParser: Send + Sync {
    /// Turn a submitted descriptor into an editable SP record.
    fn parse_sp(&self, input: &str) -> Result<MetadataRecord, ImportError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDescriptorParser;

impl DescriptorParser for JsonDescriptorParser {
    fn parse_sp(&self, input: &str) -> Result<MetadataRecord, ImportError> {
        if input.trim().is_empty() {
            return Err(ImportError::Empty);
        }
        let entity = match serde_json::from_str::<Value>(input)? {
            Value::Array(mut entities) => entities.pop().ok_or(ImportError::NoEntity)?,
            other => other,
        };
        let record: MetadataRecord = serde_json::from_value(entity)?;
        Ok(trim_endpoints(record))
    }
}

/// Reduce both endpoint keys to their default endpoint for the binding the
/// editor uses. A key with no usable endpoint is removed.
pub fn trim_endpoints(mut record: MetadataRecord) -> MetadataRecord {
    record.assertion_consumer_service = record
        .assertion_consumer_service
        .and_then(|value| default_endpoint(value, &[BINDING_HTTP_POST]))
        .map(EndpointValue::single);
    record.single_logout_service = record
        .single_logout_service
        .and_then(|value| default_endpoint(value, &[BINDING_HTTP_REDIRECT]))
        .map(EndpointValue::single);
    record
}

/// Pick the default endpoint among those with an allowed binding.
///
/// Preference: the first flagged `isDefault: true`, then the first without
/// an `isDefault` flag, then the first flagged `isDefault: false`. A legacy
/// bare location is read as an endpoint in the first allowed binding.
pub fn default_endpoint(value: EndpointValue, bindings: &[&str]) -> Option<Endpoint> {
    let endpoints = match value {
        EndpointValue::List(endpoints) => endpoints,
        EndpointValue::Legacy(location) => {
            return bindings
                .first()
                .map(|binding| Endpoint::new(binding, location, None));
        }
    };

    let mut first_unflagged = None;
    let mut first_allowed = None;
    for endpoint in endpoints {
        if !bindings.contains(&endpoint.binding.as_str()) {
            continue;
        }
        match endpoint.is_default {
            Some(true) => return Some(endpoint),
            Some(false) => {
                if first_allowed.is_none() {
                    first_allowed = Some(endpoint);
                }
            }
            None => {
                if first_unflagged.is_none() {
                    first_unflagged = Some(endpoint);
                }
            }
        }
    }
    first_unflagged.or(first_allowed)
}
