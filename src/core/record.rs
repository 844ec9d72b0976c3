use serde::{Deserialize, Serialize};
use std::fmt;

/// A person as read from the CSV file or the `Person` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Person {
    pub id: Option<i64>,
    #[sqlx(rename = "nombre")]
    pub name: String,
    pub email: String,
}

impl Person {
    pub fn new(id: Option<i64>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "Person(id={}, name={}, email={})", id, self.name, self.email),
            None => write!(f, "Person(id=<unassigned>, name={}, email={})", self.name, self.email),
        }
    }
}

/// A row of the `Person_Migrate` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersonMigrate {
    pub id: Option<i64>,
    #[sqlx(rename = "nombre")]
    pub name: String,
    pub email: String,
}

impl From<Person> for PersonMigrate {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            name: person.name,
            email: person.email,
        }
    }
}

/// Records that can be upserted by [`crate::sink::db::UpsertSink`].
pub trait PersonRow: Send + Sync + 'static {
    fn id(&self) -> Option<i64>;

    fn name(&self) -> &str;

    fn email(&self) -> &str;
}

impl PersonRow for Person {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn email(&self) -> &str {
        &self.email
    }
}

impl PersonRow for PersonMigrate {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn email(&self) -> &str {
        &self.email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_copies_every_field() {
        let person = Person::new(Some(5), "Carlos", "c@x.com");
        let migrated = PersonMigrate::from(person.clone());

        assert_eq!(migrated.id, Some(5));
        assert_eq!(migrated.name, "Carlos");
        assert_eq!(migrated.email, person.email);
    }

    #[test]
    fn display_marks_unassigned_ids() {
        let person = Person::new(None, "Ana", "ana@example.com");
        assert_eq!(
            person.to_string(),
            "Person(id=<unassigned>, name=Ana, email=ana@example.com)"
        );
    }
}
