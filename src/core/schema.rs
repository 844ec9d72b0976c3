use serde::{Deserialize, Serialize};

pub const PERSON_TABLE: &str = "Person";
pub const PERSON_MIGRATE_TABLE: &str = "Person_Migrate";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataType {
    Integer,
    String,
}

impl DataType {
    fn sql_type(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::String => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub description: Option<String>,
}

impl Field {
    pub fn new(name: &str, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            nullable,
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Layout of a table the jobs read from or write to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub primary_key: String,
    pub fields: Vec<Field>,
}

impl TableSchema {
    pub fn new(table: &str, primary_key: &str, fields: Vec<Field>) -> Self {
        Self {
            table: table.to_string(),
            primary_key: primary_key.to_string(),
            fields,
        }
    }

    /// Both person tables share the `(id, nombre, email)` layout.
    pub fn person(table: &str) -> Self {
        Self::new(
            table,
            "id",
            vec![
                Field::new("id", DataType::Integer, false).with_description("unique person id"),
                Field::new("nombre", DataType::String, false),
                Field::new("email", DataType::String, false),
            ],
        )
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .fields
            .iter()
            .map(|field| {
                if field.name == self.primary_key {
                    format!("{} {} PRIMARY KEY", field.name, field.data_type.sql_type())
                } else if field.nullable {
                    format!("{} {}", field.name, field.data_type.sql_type())
                } else {
                    format!("{} {} NOT NULL", field.name, field.data_type.sql_type())
                }
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table,
            columns.join(", ")
        )
    }

    pub fn select_all_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} ORDER BY {}",
            self.field_names().join(", "),
            self.table,
            self.primary_key
        )
    }

    /// First keyset page; binds the page size.
    pub fn select_first_page_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} ORDER BY {} LIMIT ?",
            self.field_names().join(", "),
            self.table,
            self.primary_key
        )
    }

    /// Keyset page after the first; binds the last seen key and the page size.
    pub fn select_page_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} WHERE {} > ? ORDER BY {} LIMIT ?",
            self.field_names().join(", "),
            self.table,
            self.primary_key,
            self.primary_key
        )
    }

    /// Head of a multi-row insert; the `VALUES` rows are appended by the caller.
    pub fn insert_prefix_sql(&self) -> String {
        format!(
            "INSERT INTO {} ({}) ",
            self.table,
            self.field_names().join(", ")
        )
    }

    /// Turns an insert into an update of every non-key column on key conflict.
    pub fn upsert_conflict_sql(&self) -> String {
        let updates: Vec<String> = self
            .field_names()
            .iter()
            .filter(|name| **name != self.primary_key)
            .map(|name| format!("{name} = excluded.{name}"))
            .collect();

        format!(
            " ON CONFLICT({}) DO UPDATE SET {}",
            self.primary_key,
            updates.join(", ")
        )
    }
}
