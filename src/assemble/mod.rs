//! Joining users, credentials and secrets into flat output records.

pub mod record;

pub use record::{
    AssembledRecord, FieldSet, FieldValue, RecordBuilder, UnknownFieldError, DEFAULTED_FIELDS,
    OUTPUT_FIELDS,
};

use crate::dump::{TableIndex, TableRow};
use thiserror::Error;
use tracing::{debug, info};

/// Column names read from the `passphrase_credential` table.
pub mod credential {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const DATE_CREATED: &str = "dateCreated";
    pub const DATE_MODIFIED: &str = "dateModified";
    pub const USERNAME: &str = "username";
    pub const AUTHOR_PHID: &str = "authorPHID";
    pub const DESCRIPTION: &str = "description";
    pub const CREDENTIAL_TYPE: &str = "credentialType";
    pub const SECRET_ID: &str = "secretID";
}

/// Display name column of the `user` table.
pub const USER_REAL_NAME: &str = "realName";

/// Payload column of the `passphrase_secret` table.
pub const SECRET_DATA: &str = "secretData";

/// Credential type whose secret goes into "Login Password".
pub const PASSWORD_TYPE: &str = "password";

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error(transparent)]
    UnknownField(#[from] UnknownFieldError),

    #[error("credential row has no '{column}' column")]
    MissingColumn { column: String },

    #[error("credential {id}: '{column}' is not an integer: {value:?}")]
    InvalidInteger {
        id: String,
        column: String,
        value: String,
    },

    #[error("credential {id}: author '{author}' not found in the user table")]
    UnknownAuthor { id: String, author: String },
}

fn column<'r>(row: &'r TableRow, name: &str) -> Result<&'r str, AssembleError> {
    row.get(name).ok_or_else(|| AssembleError::MissingColumn {
        column: name.to_string(),
    })
}

/// Value of a column that may be cut off by a short tuple; absent reads as empty.
fn optional_column<'r>(row: &'r TableRow, name: &str) -> &'r str {
    row.get(name).unwrap_or("")
}

fn integer_column(row: &TableRow, id: &str, name: &str) -> Result<i64, AssembleError> {
    let value = column(row, name)?;
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| AssembleError::InvalidInteger {
            id: id.to_string(),
            column: name.to_string(),
            value: value.to_string(),
        })
}

/// Builds output records from the three loaded tables.
pub struct Assembler<'a> {
    users: &'a TableIndex,
    secrets: &'a TableIndex,
    builder: RecordBuilder,
}

impl<'a> Assembler<'a> {
    pub fn new(
        users: &'a TableIndex,
        secrets: &'a TableIndex,
        fields: FieldSet,
    ) -> Result<Self, AssembleError> {
        Ok(Self {
            users,
            secrets,
            builder: RecordBuilder::new(fields)?,
        })
    }

    /// Assemble the record for one credential row.
    pub fn assemble_entry(&mut self, entry: &TableRow) -> Result<AssembledRecord, AssembleError> {
        self.builder.start();

        let id = column(entry, credential::ID)?;
        let name = column(entry, credential::NAME)?;
        self.builder.set("Title", format!("K{} - {}", id, name))?;
        self.builder
            .set("Created", integer_column(entry, id, credential::DATE_CREATED)?)?;
        self.builder
            .set("Modified", integer_column(entry, id, credential::DATE_MODIFIED)?)?;

        let username = optional_column(entry, credential::USERNAME);
        if !username.is_empty() {
            self.builder.set("Login Username", username)?;
        }

        let author = optional_column(entry, credential::AUTHOR_PHID);
        if !author.is_empty() {
            let user = self
                .users
                .get(author)
                .ok_or_else(|| AssembleError::UnknownAuthor {
                    id: id.to_string(),
                    author: author.to_string(),
                })?;
            self.builder.set("Author", column(user, USER_REAL_NAME)?)?;
        }

        let description = optional_column(entry, credential::DESCRIPTION);
        if !description.is_empty() {
            self.builder.set("Notes", description)?;
        }

        let credential_type = column(entry, credential::CREDENTIAL_TYPE)?;
        self.builder.set("credential-type", credential_type)?;

        // The dump writes NULL for "no secret"; the identifier itself is kept
        let secret_id = column(entry, credential::SECRET_ID)?;
        let secret = match self.secrets.get(secret_id).and_then(|row| row.get(SECRET_DATA)) {
            Some(data) => data,
            None => {
                debug!("credential {}: secret {} not found, keeping identifier", id, secret_id);
                secret_id
            }
        };

        let target = if credential_type == PASSWORD_TYPE {
            "Login Password"
        } else {
            credential_type
        };
        self.builder.set(target, secret)?;

        Ok(self.builder.finish())
    }

    pub fn assemble(
        &mut self,
        credentials: &[TableRow],
    ) -> Result<Vec<AssembledRecord>, AssembleError> {
        let records = credentials
            .iter()
            .map(|entry| self.assemble_entry(entry))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Assembled {} records", records.len());
        Ok(records)
    }
}

/// Assemble one record per credential row, in credential order.
pub fn assemble(
    users: &TableIndex,
    credentials: &[TableRow],
    secrets: &TableIndex,
) -> Result<Vec<AssembledRecord>, AssembleError> {
    Assembler::new(users, secrets, FieldSet::default())?.assemble(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn row(pairs: &[(&str, &str)]) -> TableRow {
        let columns: Arc<[String]> = pairs.iter().map(|(c, _)| c.to_string()).collect();
        let values = pairs.iter().map(|(_, v)| v.to_string()).collect();
        TableRow::new(columns, values)
    }

    fn index(key_column: &str, rows: Vec<TableRow>) -> TableIndex {
        rows.into_iter()
            .map(|r| (r.get(key_column).unwrap().to_string(), r))
            .collect()
    }

    fn credential_row(
        username: &str,
        author: &str,
        description: &str,
        credential_type: &str,
        secret_id: &str,
    ) -> TableRow {
        row(&[
            ("id", "5"),
            ("name", "db"),
            ("dateCreated", "100"),
            ("dateModified", "200"),
            ("username", username),
            ("authorPHID", author),
            ("description", description),
            ("credentialType", credential_type),
            ("secretID", secret_id),
        ])
    }

    fn with_value(base: &TableRow, column: &str, value: &str) -> TableRow {
        let values = base
            .iter()
            .map(|(c, v)| if c == column { value } else { v.unwrap_or("") })
            .map(str::to_string)
            .collect();
        TableRow::new(base.columns().iter().cloned().collect(), values)
    }

    fn users() -> TableIndex {
        index("phid", vec![row(&[("phid", "PHID-1"), ("realName", "Alice")])])
    }

    fn secrets() -> TableIndex {
        index("id", vec![row(&[("id", "S1"), ("secretData", "hunter2")])])
    }

    #[test]
    fn test_password_entry() {
        let records = assemble(
            &users(),
            &[credential_row("", "PHID-1", "", "password", "S1")],
            &secrets(),
        )
        .unwrap();

        let r = &records[0];
        assert_eq!(r.get_text("Title"), Some("K5 - db"));
        assert_eq!(r.get("Created"), Some(&FieldValue::Integer(100)));
        assert_eq!(r.get("Modified"), Some(&FieldValue::Integer(200)));
        assert_eq!(r.get_text("Author"), Some("Alice"));
        assert_eq!(r.get_text("credential-type"), Some("password"));
        assert_eq!(r.get_text("Login Password"), Some("hunter2"));
        assert_eq!(r.get_text("Login Username"), Some(""));
        assert_eq!(r.get_text("Login URL"), Some(""));
        assert!(!r.contains("Notes"));
    }

    #[test]
    fn test_null_secret_falls_back_to_identifier() {
        let records = assemble(
            &users(),
            &[credential_row("", "", "", "password", "NULL")],
            &secrets(),
        )
        .unwrap();
        assert_eq!(records[0].get_text("Login Password"), Some("NULL"));
    }

    #[test]
    fn test_typed_secret_goes_to_type_field() {
        let records = assemble(
            &users(),
            &[credential_row("deploy", "", "key for ci", "ssh-key-text", "S1")],
            &secrets(),
        )
        .unwrap();
        let r = &records[0];
        assert_eq!(r.get_text("ssh-key-text"), Some("hunter2"));
        assert_eq!(r.get_text("Login Password"), Some(""));
        assert_eq!(r.get_text("Login Username"), Some("deploy"));
        assert_eq!(r.get_text("Notes"), Some("key for ci"));
        assert!(!r.contains("Author"));
    }

    #[test]
    fn test_typed_secret_null_fallback() {
        let records = assemble(
            &users(),
            &[credential_row("", "", "", "token", "NULL")],
            &secrets(),
        )
        .unwrap();
        assert_eq!(records[0].get_text("token"), Some("NULL"));
    }

    #[test]
    fn test_undeclared_credential_type_is_fatal() {
        let err = assemble(
            &users(),
            &[credential_row("", "", "", "certificate", "S1")],
            &secrets(),
        )
        .unwrap_err();
        match err {
            AssembleError::UnknownField(e) => assert_eq!(e.field, "certificate"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_author_is_fatal() {
        let err = assemble(
            &users(),
            &[credential_row("", "PHID-GONE", "", "password", "S1")],
            &secrets(),
        )
        .unwrap_err();
        assert!(matches!(err, AssembleError::UnknownAuthor { .. }));
    }

    #[test]
    fn test_non_integer_timestamp() {
        let entry = with_value(&credential_row("", "", "", "note", "S1"), "dateCreated", "soon");
        let err = assemble(&users(), &[entry], &secrets()).unwrap_err();
        assert!(matches!(err, AssembleError::InvalidInteger { .. }));
    }

    #[test]
    fn test_short_tuple_leaves_optional_fields_default() {
        let columns: Arc<[String]> = [
            "id",
            "name",
            "dateCreated",
            "dateModified",
            "credentialType",
            "secretID",
            "username",
            "authorPHID",
            "description",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        let values = ["5", "db", "100", "200", "password", "NULL"]
            .iter()
            .map(|v| v.to_string())
            .collect();
        let entry = TableRow::new(columns, values);

        let records = assemble(&users(), &[entry], &secrets()).unwrap();
        let r = &records[0];
        assert_eq!(r.get_text("Title"), Some("K5 - db"));
        assert_eq!(r.get_text("Login Username"), Some(""));
        assert_eq!(r.get_text("Login Password"), Some("NULL"));
        assert!(!r.contains("Author"));
        assert!(!r.contains("Notes"));
    }

    #[test]
    fn test_short_tuple_missing_name_is_fatal() {
        let columns: Arc<[String]> = ["id", "name", "dateCreated"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let entry = TableRow::new(columns, vec!["5".to_string()]);

        let err = assemble(&users(), &[entry], &secrets()).unwrap_err();
        match err {
            AssembleError::MissingColumn { column } => assert_eq!(column, "name"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_records_follow_credential_order() {
        let second = with_value(&credential_row("", "", "", "note", "S1"), "id", "9");
        let records = assemble(
            &users(),
            &[second, credential_row("", "", "", "note", "S1")],
            &secrets(),
        )
        .unwrap();
        assert_eq!(records[0].get_text("Title"), Some("K9 - db"));
        assert_eq!(records[1].get_text("Title"), Some("K5 - db"));
    }
}
