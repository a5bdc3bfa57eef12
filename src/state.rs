//! Shared state handed to every handler.

use crate::{
    config::EditorSettings,
    services::{auth::Authenticator, descriptor::DescriptorParser, store::MetadataStore},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MetadataStore>,
    pub auth: Arc<dyn Authenticator>,
    pub descriptors: Arc<dyn DescriptorParser>,
    pub settings: Arc<EditorSettings>,
}
