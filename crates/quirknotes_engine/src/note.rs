/* 📖 # Why have a dedicated note model?

A note is the only entity quirknotes persists. The model keeps three kinds of values
apart that would otherwise all be "a JSON object with title and content":

1. `Note`: a stored note, always carrying its store-assigned `NoteId`
2. `NoteDraft`: a validated creation request, guaranteed to have both fields non-empty
3. `NotePatch`: a validated partial update, guaranteed to change at least one field

Handlers only reach the store with a draft or a patch, so an unvalidated body can never
be persisted, and the store never has to repeat the presence checks.
*/

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use quirknotes_base::{QuirkError, QuirkResult};

/// Message for a create request missing either field.
pub const MISSING_FIELDS_MESSAGE: &str = "Title and content are both required.";
/// Message for an id that is not 24 hex digits.
pub const INVALID_ID_MESSAGE: &str = "Invalid note ID.";
/// Message for a patch request that changes nothing.
pub const EMPTY_PATCH_MESSAGE: &str = "Must have at least one of title or content.";

const ID_BYTES: usize = 12;
const COUNTER_MASK: u32 = 0x00FF_FFFF;

static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(rand::random);
static COUNTER: LazyLock<AtomicU32> =
    LazyLock::new(|| AtomicU32::new(rand::random::<u32>() & COUNTER_MASK));

/// Unique identifier for a note, rendered as 24 lowercase hex digits.
///
/// The 12 underlying bytes are a 4-byte big-endian timestamp (seconds since the Unix
/// epoch), 5 random bytes fixed for the lifetime of the process and a 3-byte big-endian
/// counter that starts at a random value.
///
/// # Examples
/// ```
/// use quirknotes_engine::NoteId;
///
/// let id = NoteId::generate();
/// assert_eq!(id.as_str().len(), 24);
///
/// let parsed = NoteId::parse("64B7F0C2A1B2C3D4E5F60718").unwrap();
/// assert_eq!(parsed.as_str(), "64b7f0c2a1b2c3d4e5f60718");
/// assert!(NoteId::parse("not-an-id").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct NoteId(String);

impl NoteId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or_default();
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; ID_BYTES];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);

        Self(bytes.iter().map(|byte| format!("{:02x}", byte)).collect())
    }

    /// Returns true iff `candidate` is exactly 24 ASCII hex digits.
    pub fn is_valid(candidate: &str) -> bool {
        candidate.len() == ID_BYTES * 2 && candidate.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Parse a well-formed id, normalising it to lowercase.
    pub fn parse(candidate: &str) -> QuirkResult<Self> {
        if !Self::is_valid(candidate) {
            return Err(Box::new(QuirkError::invalid_input(INVALID_ID_MESSAGE)));
        }
        Ok(Self(candidate.to_ascii_lowercase()))
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NoteId {
    type Error = Box<QuirkError>;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "_id")]
    id: NoteId,
    title: String,
    content: String,
}

impl Note {
    /// Create a note from a validated draft and the id the store assigned to it.
    pub fn new(id: NoteId, draft: NoteDraft) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
        }
    }

    pub fn id(&self) -> &NoteId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Overwrite the fields the patch supplies, leaving the others untouched.
    pub fn apply(&mut self, patch: &NotePatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
    }
}

/// A validated request to create a note: both fields present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    title: String,
    content: String,
}

impl NoteDraft {
    /// Validate a draft. Text is kept exactly as given, without trimming.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> QuirkResult<Self> {
        let title = title.into();
        let content = content.into();
        if title.is_empty() || content.is_empty() {
            return Err(Box::new(QuirkError::invalid_input(MISSING_FIELDS_MESSAGE)));
        }
        Ok(Self { title, content })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A validated partial update: at least one field is supplied.
///
/// An empty string counts as "not supplied", so a patch can never blank out a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePatch {
    title: Option<String>,
    content: Option<String>,
}

impl NotePatch {
    pub fn new(title: Option<String>, content: Option<String>) -> QuirkResult<Self> {
        let title = title.filter(|title| !title.is_empty());
        let content = content.filter(|content| !content.is_empty());
        if title.is_none() && content.is_none() {
            return Err(Box::new(QuirkError::invalid_input(EMPTY_PATCH_MESSAGE)));
        }
        Ok(Self { title, content })
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}
