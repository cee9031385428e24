//! Content loading errors.
//!
//! Loading is lenient: a bad node is reported as a [`ContentIssue`] and the
//! loader carries on with a default value. Only failures to read the data
//! directory itself are returned as hard errors.

use std::fmt;

/// What went wrong with a piece of content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentError {
    /// A named object was referenced but never defined.
    UnknownReference {
        /// Kind of object ("outfit", "ship", ...).
        kind: &'static str,
        name: String,
    },
    /// A token that should be a number is not one.
    BadNumber { token: String },
    /// A key is missing a required value token.
    MissingValue { key: String },
    /// A key that the loader does not understand.
    UnknownToken { token: String },
    /// A weapon's submunitions eventually contain the weapon itself.
    SubmunitionCycle { weapon: String },
    /// A file or directory could not be read.
    Io { path: String, message: String },
    /// Malformed line structure (unterminated quote, bad indentation).
    Syntax { message: String },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::UnknownReference { kind, name } => {
                write!(f, "undefined {kind} \"{name}\"")
            }
            ContentError::BadNumber { token } => {
                write!(f, "cannot convert value \"{token}\" to a number")
            }
            ContentError::MissingValue { key } => write!(f, "\"{key}\" requires a value"),
            ContentError::UnknownToken { token } => write!(f, "skipping unrecognized token \"{token}\""),
            ContentError::SubmunitionCycle { weapon } => {
                write!(f, "weapon \"{weapon}\" is its own submunition")
            }
            ContentError::Io { path, message } => write!(f, "{path}: {message}"),
            ContentError::Syntax { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for ContentError {}

/// Where a content node came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A content error with its location and the trace of the offending node.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentIssue {
    pub error: ContentError,
    pub location: SourceLocation,
    pub trace: String,
}

impl ContentIssue {
    pub fn new(error: ContentError, location: SourceLocation, trace: String) -> Self {
        Self {
            error,
            location,
            trace,
        }
    }

    /// An issue not tied to a particular node.
    pub fn global(error: ContentError) -> Self {
        Self {
            error,
            location: SourceLocation::default(),
            trace: String::new(),
        }
    }
}

impl fmt::Display for ContentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.file.is_empty() {
            write!(f, "{}", self.error)?;
        } else {
            write!(f, "{}: {}", self.location, self.error)?;
        }
        if !self.trace.is_empty() {
            write!(f, "\n{}", self.trace)?;
        }
        Ok(())
    }
}

impl std::error::Error for ContentIssue {}

/// Collects issues during a load and mirrors each one to the log.
#[derive(Debug, Default)]
pub struct Diagnostics {
    issues: Vec<ContentIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, issue: ContentIssue) {
        log::warn!("{issue}");
        self.issues.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn issues(&self) -> &[ContentIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<ContentIssue> {
        self.issues
    }
}
