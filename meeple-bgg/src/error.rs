/// Errors that can occur while talking to BoardGameGeek.
///
/// Only [`send_with_retry`](crate::retry::send_with_retry) and the parsers
/// return these; the public [`BggClient`](crate::BggClient) lookups log them
/// and degrade to "no result".
#[derive(Debug, thiserror::Error)]
pub enum BggError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rate limited by BoardGameGeek after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Server error (HTTP {status}) after {attempts} attempts")]
    ServerError { status: u16, attempts: u32 },

    #[error("Request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Response is not an XML document: {0}")]
    NotXml(String),

    #[error("Request accepted but not ready yet, try again later")]
    NotReady,

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Malformed item: {0}")]
    MalformedItem(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BggError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedItem(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the request may succeed if sent again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Transport(_))
    }
}
