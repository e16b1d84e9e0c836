//! Database entities

pub mod application;
pub mod file_attachment;

pub use application::{DecisionStatus, Entity as Application};
pub use file_attachment::Entity as FileAttachment;
