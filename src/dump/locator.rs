//! Line scanner that finds one table's schema block and its data line.
//!
//! The scanner is a four-state machine fed one line at a time. It never looks
//! back at earlier lines, so a dump can be streamed through it without being
//! held in memory. It works on `&str` lines rather than a file handle, which
//! keeps it testable without any I/O.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// Column declaration inside a `CREATE TABLE` block: indented, backticked name.
static COLUMN_DECL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ +`(\w+)`").unwrap());

/// End of the column list: the line starting with `)`.
static COLUMNS_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorState {
    /// Looking for `CREATE TABLE <table>`
    SeekingTable,
    /// Inside the column list, recording column names
    CollectingFields,
    /// Column list closed, looking for `INSERT INTO <table> VALUES`
    SeekingData,
    /// Insert line captured; nothing more is read
    Complete,
}

impl std::fmt::Display for LocatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocatorState::SeekingTable => write!(f, "seeking table"),
            LocatorState::CollectingFields => write!(f, "collecting fields"),
            LocatorState::SeekingData => write!(f, "seeking data"),
            LocatorState::Complete => write!(f, "complete"),
        }
    }
}

/// Schema and raw data recovered for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedTable {
    pub table: String,
    /// Column names in declaration order
    pub columns: Vec<String>,
    /// Everything after `VALUES ` on the insert line
    pub payload: String,
}

pub struct TableLocator {
    table: String,
    state: LocatorState,
    columns: Vec<String>,
    payload: Option<String>,
    create_re: Regex,
    insert_re: Regex,
}

impl TableLocator {
    pub fn new(table: &str) -> Self {
        let name = regex::escape(table);
        // Either `name` or a bare name that is not the prefix of a longer one
        let create_re =
            Regex::new(&format!(r"^CREATE TABLE (?:`{name}`|{name}(?:[\s(]|$))")).unwrap();
        let insert_re =
            Regex::new(&format!(r"^INSERT INTO (?:`{name}`|{name}) VALUES (.+)")).unwrap();

        Self {
            table: table.to_string(),
            state: LocatorState::SeekingTable,
            columns: Vec::new(),
            payload: None,
            create_re,
            insert_re,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn state(&self) -> LocatorState {
        self.state
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_complete(&self) -> bool {
        self.state == LocatorState::Complete
    }

    /// Advance the machine by one line (without its line terminator) and
    /// return the resulting state.
    pub fn feed(&mut self, line: &str) -> LocatorState {
        match self.state {
            LocatorState::SeekingTable => {
                if self.create_re.is_match(line) {
                    info!("Table found: {}", self.table);
                    self.state = LocatorState::CollectingFields;
                }
            }
            LocatorState::CollectingFields => {
                if let Some(caps) = COLUMN_DECL_RE.captures(line) {
                    let name = &caps[1];
                    debug!("Field found: {}", name);
                    self.columns.push(name.to_string());
                } else if COLUMNS_END_RE.is_match(line) {
                    debug!("{} columns declared for {}", self.columns.len(), self.table);
                    self.state = LocatorState::SeekingData;
                }
            }
            LocatorState::SeekingData => {
                if let Some(caps) = self.insert_re.captures(line) {
                    self.payload = Some(caps[1].to_string());
                    self.state = LocatorState::Complete;
                }
            }
            LocatorState::Complete => {}
        }

        self.state
    }

    /// Consume the locator. On failure, returns the state that was active
    /// when the input ran out.
    pub fn finish(self) -> Result<LocatedTable, LocatorState> {
        match (self.state, self.payload) {
            (LocatorState::Complete, Some(payload)) => Ok(LocatedTable {
                table: self.table,
                columns: self.columns,
                payload,
            }),
            (state, _) => Err(state),
        }
    }
}

/// Run a locator over a sequence of lines, stopping at the first insert line
/// for the table.
pub fn locate<I, S>(lines: I, table: &str) -> Result<LocatedTable, LocatorState>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut locator = TableLocator::new(table);
    for line in lines {
        if locator.feed(line.as_ref()) == LocatorState::Complete {
            break;
        }
    }
    locator.finish()
}
