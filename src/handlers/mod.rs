pub mod current_user;
pub mod editor_handlers;
pub mod health_handlers;
