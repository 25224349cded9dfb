//! Media asset definitions.

use derive_more::{AsRef, Debug, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

/// Content type assumed for an [`Attachment`] that doesn't declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Binary file attached to a request, pending upload into a storage.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attachment {
    /// Original name of the file, as provided by the client.
    pub file_name: FileName,

    /// MIME type declared by the client, if any.
    pub content_type: Option<String>,

    /// Raw content of the file.
    #[debug("{} bytes", content.len())]
    pub content: Vec<u8>,
}

impl Attachment {
    /// Returns the MIME type of this [`Attachment`], falling back to the
    /// [`DEFAULT_CONTENT_TYPE`].
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Returns the lowercased extension of the [`FileName`], if it has a sane
    /// one.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let name: &str = self.file_name.as_ref();
        let (stem, ext) = name.rsplit_once('.')?;
        (!stem.is_empty()
            && !ext.is_empty()
            && ext.len() <= 8
            && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_ascii_lowercase())
    }
}

/// Name of an [`Attachment`] file.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct FileName(String);

impl FileName {
    /// Creates a new [`FileName`] if the given `name` is not empty.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        (!name.is_empty()).then_some(Self(name))
    }
}

/// Destination namespace (folder) of uploaded objects inside a storage.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Hash, PartialEq)]
#[as_ref(str, String)]
pub struct Namespace(String);

/// Opaque and stable reference to an object stored in a storage.
///
/// Nothing is assumed about its format: dangling or foreign references are
/// kept as is.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Reference(String);

impl Reference {
    /// Creates a new [`Reference`] out of the provided string.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }
}
