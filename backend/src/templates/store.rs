use crate::error::StoreError;
use chrono::Utc;
use common::model::template::TemplateSummary;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;

const SELECTED_KEY: &str = "selected_template";

/// Storage of contract templates, addressed by name.
pub trait TemplateStore: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>, StoreError>;

    fn list(&self) -> Result<Vec<TemplateSummary>, StoreError>;

    /// Creates or replaces the template `name`.
    fn put(&self, name: &str, html: &str) -> Result<(), StoreError>;

    /// The persisted selection, if an administrator ever made one.
    fn selected(&self) -> Result<Option<String>, StoreError>;

    fn set_selected(&self, name: &str) -> Result<(), StoreError>;
}

/// Template names are used in URLs and logs: ASCII letters, digits, `-` and `_`.
pub fn is_valid_template_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `TemplateStore` backed by the `templates` and `settings` tables.
pub struct SqliteTemplateStore {
    db_path: PathBuf,
}

impl SqliteTemplateStore {
    /// The schema must already exist (see `db::init_schema`).
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Inserts `html` under `name` only when the store holds no template of that name.
    pub fn seed(&self, name: &str, html: &str) -> Result<bool, StoreError> {
        let conn = self.connect()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO templates (name, html, uploaded_at) VALUES (?1, ?2, ?3)",
            params![name, html, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted == 1)
    }
}

impl TemplateStore for SqliteTemplateStore {
    fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        let conn = self.connect()?;
        let html = conn
            .query_row(
                "SELECT html FROM templates WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(html)
    }

    fn list(&self) -> Result<Vec<TemplateSummary>, StoreError> {
        let selected = self.selected()?;
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT name, uploaded_at FROM templates ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut templates = Vec::new();
        for row in rows {
            let (name, uploaded_at) = row?;
            templates.push(TemplateSummary {
                selected: selected.as_deref() == Some(name.as_str()),
                name,
                uploaded_at,
            });
        }
        Ok(templates)
    }

    fn put(&self, name: &str, html: &str) -> Result<(), StoreError> {
        if !is_valid_template_name(name) {
            return Err(StoreError::InvalidId(name.to_string()));
        }
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO templates (name, html, uploaded_at) VALUES (?1, ?2, ?3)",
            params![name, html, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn selected(&self) -> Result<Option<String>, StoreError> {
        let conn = self.connect()?;
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![SELECTED_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_selected(&self, name: &str) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![SELECTED_KEY, name],
        )?;
        Ok(())
    }
}
