//! Per-record processors for the two jobs.

use crate::core::{Person, PersonMigrate, PipelineError, Result, Transform};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

pub const EMAIL_PATTERN: &str = r"^[A-Za-z0-9+_.-]+@(.+)$";

/// Keeps people with a well-formed email and uppercases their name.
pub struct CsvPersonTransform {
    email: Regex,
}

impl CsvPersonTransform {
    pub fn new() -> Result<Self> {
        let email = Regex::new(EMAIL_PATTERN)
            .map_err(|e| PipelineError::Transform(format!("invalid email pattern: {e}")))?;
        Ok(Self { email })
    }

    pub fn is_valid_email(&self, email: &str) -> bool {
        self.email.is_match(email)
    }
}

#[async_trait]
impl Transform<Person, Person> for CsvPersonTransform {
    async fn transform(&self, mut record: Person) -> Result<Option<Person>> {
        if !self.is_valid_email(&record.email) {
            debug!(id = ?record.id, email = %record.email, "filtered record with invalid email");
            return Ok(None);
        }

        record.name = record.name.to_uppercase();
        Ok(Some(record))
    }
}

/// Lowercases the name of every person on its way to `Person_Migrate`.
pub struct DbPersonTransform;

#[async_trait]
impl Transform<Person, PersonMigrate> for DbPersonTransform {
    async fn transform(&self, mut record: Person) -> Result<Option<PersonMigrate>> {
        record.name = record.name.to_lowercase();
        Ok(Some(record.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn valid_email_uppercases_name() {
        let transform = CsvPersonTransform::new().unwrap();

        let out = transform
            .transform(Person::new(Some(1), "Ana", "ana@example.com"))
            .await
            .unwrap();

        assert_eq!(out, Some(Person::new(Some(1), "ANA", "ana@example.com")));
    }

    #[tokio::test]
    async fn invalid_email_is_filtered() {
        let transform = CsvPersonTransform::new().unwrap();

        for email in ["not-an-email", "@example.com", "spaces in@x.com", ""] {
            let out = transform
                .transform(Person::new(Some(2), "Bob", email))
                .await
                .unwrap();
            assert_eq!(out, None, "{email} should be rejected");
        }
    }

    #[test]
    fn email_pattern_is_permissive_after_the_at_sign() {
        let transform = CsvPersonTransform::new().unwrap();

        assert!(transform.is_valid_email("a.b+c_d-e@x"));
        assert!(transform.is_valid_email("c@x.com"));
        assert!(!transform.is_valid_email("c@"));
    }

    #[tokio::test]
    async fn db_transform_lowercases_and_never_filters() {
        let out = DbPersonTransform
            .transform(Person::new(Some(5), "Carlos", "c@x.com"))
            .await
            .unwrap();

        assert_eq!(
            out,
            Some(PersonMigrate {
                id: Some(5),
                name: "carlos".to_string(),
                email: "c@x.com".to_string(),
            })
        );
    }
}
