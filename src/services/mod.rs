pub mod auth;
pub mod descriptor;
pub mod editor;
pub mod file_store;
pub mod ownership;
pub mod sqlite_store;
pub mod store;
