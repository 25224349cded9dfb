//! Raw multipart [`Form`] definitions.

use derive_more::{Debug, From};

/// Request body of a [`Property`] update, as received from a client.
///
/// [`Property`]: crate::domain::Property
#[derive(Clone, Debug)]
pub enum Payload {
    /// Body decoded into [`Part`]s.
    Form(Form),

    /// Body that couldn't be decoded at all, with the reason of the failure.
    Unreadable(String),
}

/// Multipart form consisting of named [`Part`]s in their original order.
#[derive(Clone, Debug, Default, From)]
pub struct Form(Vec<Part>);

impl Form {
    /// Creates a new empty [`Form`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the provided [`Part`] to this [`Form`].
    pub fn push(&mut self, part: Part) {
        self.0.push(part);
    }

    /// Appends a new text [`Part`] to this [`Form`].
    #[must_use]
    pub fn text(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.push(Part {
            name: name.into(),
            file_name: None,
            content_type: None,
            content: value.into().into_bytes(),
        });
        self
    }

    /// Appends a new file [`Part`] to this [`Form`].
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<&str>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        self.push(Part {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: content_type.map(ToOwned::to_owned),
            content: content.into(),
        });
        self
    }

    /// Consumes this [`Form`] returning its [`Part`]s.
    #[must_use]
    pub fn into_parts(self) -> Vec<Part> {
        self.0
    }
}

/// Single named entry of a [`Form`].
#[derive(Clone, Debug)]
pub struct Part {
    /// Name of the field this [`Part`] belongs to.
    pub name: String,

    /// Name of the file, if this [`Part`] was submitted as a file.
    pub file_name: Option<String>,

    /// Declared MIME type of the content, if any.
    pub content_type: Option<String>,

    /// Raw content of this [`Part`].
    #[debug("{} bytes", content.len())]
    pub content: Vec<u8>,
}
