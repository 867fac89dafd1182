//! # Contract Templates
//!
//! Templates are HTML documents containing the tokens `${fullname}`,
//! `${email}`, `${date}` and `${signature}`.
//!
//! - `store`: persistence of templates and of the persisted selection.
//! - `selection`: the in-process selected template name, shared between the
//!   pipeline and the admin API.
//! - `render`: token substitution producing the final contract HTML.

mod render;
mod selection;
mod store;

pub use render::{escape_html, render, ContractFields};
pub use selection::TemplateSelection;
pub use store::{is_valid_template_name, SqliteTemplateStore, TemplateStore};

/// Template seeded into an empty store on first start.
pub const DEFAULT_TEMPLATE_NAME: &str = "default";
pub const DEFAULT_TEMPLATE_HTML: &str = include_str!("../../templates/default.html");
