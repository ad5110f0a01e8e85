use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ids::{FullMsgId, PeerId};

/// Which shared media list is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Photo,
    Video,
    RoundFile,
    File,
    VoiceFile,
    MusicFile,
    Link,
}

impl MediaKind {
    /// Kinds laid out as a grid of square tiles.
    pub fn is_grid(self) -> bool {
        matches!(self, Self::Photo | Self::Video | Self::RoundFile)
    }
}

/// Flavour of an attached document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    File,
    Video,
    RoundVideo,
    Voice,
    Song,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub kind: DocumentKind,
    pub name: String,
    pub size: i64,
    pub duration_ms: Option<u32>,
    /// Local copy, once downloaded.
    pub file_path: Option<PathBuf>,
    pub loading: bool,
}

impl Document {
    pub fn new(kind: DocumentKind, name: impl Into<String>, size: i64) -> Self {
        Self {
            kind,
            name: name.into(),
            size,
            duration_ms: None,
            file_path: None,
            loading: false,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self.kind, DocumentKind::Video | DocumentKind::RoundVideo)
    }

    pub fn is_voice(&self) -> bool {
        self.kind == DocumentKind::Voice
    }

    pub fn is_song(&self) -> bool {
        self.kind == DocumentKind::Song
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebPage {
    pub url: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Media {
    Photo { width: u32, height: u32 },
    Document(Document),
    WebPage(WebPage),
}

/// A resolved message, as far as the media list cares about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub id: FullMsgId,
    pub peer: PeerId,
    pub date: NaiveDateTime,
    pub text: String,
    pub media: Option<Media>,
    pub can_delete: bool,
    pub can_forward: bool,
}

impl MessageInfo {
    pub fn new(id: FullMsgId, peer: PeerId, date: NaiveDateTime) -> Self {
        Self {
            id,
            peer,
            date,
            text: String::new(),
            media: None,
            can_delete: true,
            can_forward: true,
        }
    }

    pub fn with_media(mut self, media: Media) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_permissions(mut self, can_delete: bool, can_forward: bool) -> Self {
        self.can_delete = can_delete;
        self.can_forward = can_forward;
        self
    }

    pub fn photo(&self) -> Option<(u32, u32)> {
        match self.media {
            Some(Media::Photo { width, height }) => Some((width, height)),
            _ => None,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        match &self.media {
            Some(Media::Document(document)) => Some(document),
            _ => None,
        }
    }

    pub fn web_page(&self) -> Option<&WebPage> {
        match &self.media {
            Some(Media::WebPage(page)) => Some(page),
            _ => None,
        }
    }

    /// Whether this message belongs to the `kind` media list.
    pub fn matches_kind(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Photo => self.photo().is_some(),
            MediaKind::Video => self
                .document()
                .is_some_and(|doc| doc.kind == DocumentKind::Video),
            MediaKind::RoundFile => self
                .document()
                .is_some_and(|doc| doc.kind == DocumentKind::RoundVideo),
            MediaKind::File => self
                .document()
                .is_some_and(|doc| doc.kind == DocumentKind::File),
            MediaKind::VoiceFile => self.document().is_some_and(Document::is_voice),
            MediaKind::MusicFile => self.document().is_some_and(Document::is_song),
            MediaKind::Link => self.web_page().is_some() || self.first_url().is_some(),
        }
    }

    /// First URL-looking word of the text, for link items without a preview.
    pub fn first_url(&self) -> Option<&str> {
        self.text
            .split_whitespace()
            .find(|word| word.starts_with("http://") || word.starts_with("https://"))
    }
}
