//! Form templates
//!
//! A template is a named list of form fields. Each field becomes one
//! `update_<identifier>` function definition, and the template's name and
//! description feed the parsing guide sent with the session configuration.

mod guide;
mod store;
mod template;

pub use guide::{function_definitions, parsing_guide, TimeContext};
pub use store::TemplateStore;
pub use template::{default_templates, FieldKind, FormField, Template};
