//! Request model for the event-file endpoint.
//!
//! # Design
//! One `Event` tree describes one newsletter dispatch. Every optional wire
//! field is an `Option` (or [`Inline`]) so the XML encoder can tell "not set"
//! apart from an explicit value. The repeated children (tags, channels,
//! virtual channels, files) are private and only grow through `add_*`
//! methods, which keep insertion order and reject duplicates.

use std::fmt;
use std::str::FromStr;

/// Date format the service assumes when `Date::format` is not sent.
pub const DEFAULT_DATE_FORMAT: &str = "dd.MM.yyyy HH:mm:ss";

/// Preview service used when none is given; the only one the service knows.
pub const DEFAULT_PREVIEW_SERVICE: &str = "litmus";

/// Tri-state `inline` attribute of html/text bodies and attachments.
///
/// `Unset` is sent as `inline="none"`, which the service reads as "this part
/// is not sent", so it must stay distinguishable from `False`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Inline {
    #[default]
    Unset,
    False,
    True,
}

impl Inline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Inline::Unset => "none",
            Inline::False => "false",
            Inline::True => "true",
        }
    }
}

impl From<bool> for Inline {
    fn from(value: bool) -> Self {
        if value {
            Inline::True
        } else {
            Inline::False
        }
    }
}

impl From<Option<bool>> for Inline {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Inline::Unset, Inline::from)
    }
}

/// Error returned when parsing one of the enum-like attribute values fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseValueError {
    kind: &'static str,
    value: String,
}

/// Per-email override of the configured tracking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingMode {
    Personal,
    Anonymous,
    /// Only accepted when the service runs in mixed mode globally.
    Mixed,
    Off,
}

impl TrackingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingMode::Personal => "personal",
            TrackingMode::Anonymous => "anonymous",
            TrackingMode::Mixed => "mixed",
            TrackingMode::Off => "off",
        }
    }
}

impl FromStr for TrackingMode {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(TrackingMode::Personal),
            "anonymous" => Ok(TrackingMode::Anonymous),
            "mixed" => Ok(TrackingMode::Mixed),
            "off" => Ok(TrackingMode::Off),
            other => Err(ParseValueError {
                kind: "tracking mode",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How images referenced by the html body are attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EmbedImages {
    /// Embed every image.
    All,
    /// Embed images referenced by a relative link.
    #[default]
    ByPath,
    /// Embed nothing.
    None,
}

impl EmbedImages {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedImages::All => "all",
            EmbedImages::ByPath => "byPath",
            EmbedImages::None => "none",
        }
    }
}

impl FromStr for EmbedImages {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(EmbedImages::All),
            "byPath" => Ok(EmbedImages::ByPath),
            "none" => Ok(EmbedImages::None),
            other => Err(ParseValueError {
                kind: "embed images",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for EmbedImages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Push `item` unless an equal item is already present.
fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) -> bool {
    if items.contains(&item) {
        return false;
    }
    items.push(item);
    true
}

/// Root of the outbound event document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Unique event id; the service generates one when absent.
    pub id: Option<String>,
    /// Newsletter series the dispatch belongs to.
    pub newsletter_group: Option<String>,
    /// Skip the dispatch if the archive already holds this event id.
    pub skip_used_ids: Option<bool>,
    /// Archive skipped dispatches as "cancelled".
    pub archive_skipped: Option<bool>,
    pub archive: Option<bool>,
    pub created_by: Option<String>,
    pub created_by_display_name: Option<String>,
    tags: Vec<String>,
    pub destination: Option<Destination>,
    pub data: Option<Data>,
    /// Scheduled send time; the newsletter goes out immediately without it.
    pub date: Option<Date>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tag. Returns `false` if the tag was already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        push_unique(&mut self.tags, tag.into())
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Who receives the newsletter: channels, virtual channels and/or a query.
///
/// With both channels and a query, recipients must be in one of the channels
/// and match the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destination {
    channels: Vec<String>,
    vchannels: Vec<String>,
    pub query: Option<String>,
    pub preview: Option<Preview>,
}

impl Destination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_channel(&mut self, channel: impl Into<String>) -> bool {
        push_unique(&mut self.channels, channel.into())
    }

    pub fn add_virtual_channel(&mut self, vchannel: impl Into<String>) -> bool {
        push_unique(&mut self.vchannels, vchannel.into())
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn virtual_channels(&self) -> &[String] {
        &self.vchannels
    }
}

/// Inbox preview settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub service: String,
    pub base_entry: Option<BaseEntry>,
}

impl Default for Preview {
    fn default() -> Self {
        Self {
            service: DEFAULT_PREVIEW_SERVICE.to_string(),
            base_entry: None,
        }
    }
}

/// Entry used to personalize the preview, identified by its email address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseEntry {
    pub email: Option<String>,
}

/// Content of the dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Data {
    /// Recipient address override, may hold personalization variables.
    pub mailto: Option<String>,
    pub email: Option<Email>,
    /// Body for non-email delivery channels.
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Email {
    pub sender: Option<String>,
    pub replyto: Option<String>,
    pub envelope_from: Option<String>,
    pub obey_prefer_html: Option<bool>,
    pub send_both_parts: Option<bool>,
    pub base_url: Option<String>,
    pub download_url: Option<String>,
    pub tracking_mode: Option<TrackingMode>,
    pub subject: Option<String>,
    pub htmltext: Option<HtmlText>,
    pub plaintext: Option<PlainText>,
    files: Vec<File>,
}

impl Email {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a file. Attachments equal in every field are kept once.
    pub fn add_file(&mut self, file: File) -> bool {
        push_unique(&mut self.files, file)
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }
}

/// Html part of the email. `content` is sent as a CDATA section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlText {
    pub inline: Inline,
    pub charset: Option<String>,
    pub embed_images: EmbedImages,
    pub base_url: Option<String>,
    pub download_url: Option<String>,
    pub link_tracking: Option<bool>,
    pub view_tracking: Option<bool>,
    pub render_callback: Option<String>,
    /// Public REST proxy the service rewrites referenced files to.
    pub rest_proxy_url: Option<String>,
    pub content: Option<String>,
}

/// Plain text part of the email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainText {
    pub inline: Inline,
    pub charset: Option<String>,
    pub base_url: Option<String>,
    pub download_url: Option<String>,
    pub link_tracking: Option<bool>,
    pub render_callback: Option<String>,
    pub content: Option<String>,
}

/// An attachment. `content` holds the base64 encoded file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct File {
    pub name: Option<String>,
    pub disposition: Option<String>,
    pub inline: Inline,
    pub content: Option<String>,
}

/// Scheduled send time, in the caller's own representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Date {
    pub value: String,
    pub format: Option<String>,
}

impl Date {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// The format the service will apply to `value`.
    pub fn effective_format(&self) -> &str {
        self.format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_tag_ignores_duplicates() {
        let mut event = Event::new();
        assert!(event.add_tag("A"));
        assert!(!event.add_tag("A"));
        assert!(event.add_tag("B"));
        assert_eq!(event.tags(), ["A", "B"]);
    }

    #[test]
    fn channels_keep_insertion_order() {
        let mut destination = Destination::new();
        destination.add_channel("z");
        destination.add_channel("a");
        destination.add_channel("z");
        destination.add_virtual_channel("v");
        destination.add_virtual_channel("v");
        assert_eq!(destination.channels(), ["z", "a"]);
        assert_eq!(destination.virtual_channels(), ["v"]);
    }

    #[test]
    fn files_deduplicate_on_every_field() {
        let logo = File {
            name: Some("logo.png".to_string()),
            disposition: Some("inline".to_string()),
            inline: Inline::True,
            content: Some("AAAA".to_string()),
        };
        let mut email = Email::new();
        assert!(email.add_file(logo.clone()));
        assert!(!email.add_file(logo.clone()));

        // Same name, different content: a distinct attachment.
        let other = File {
            content: Some("BBBB".to_string()),
            ..logo
        };
        assert!(email.add_file(other));
        assert_eq!(email.files().len(), 2);
    }

    #[test]
    fn inline_from_optional_bool() {
        assert_eq!(Inline::from(None), Inline::Unset);
        assert_eq!(Inline::from(Some(false)), Inline::False);
        assert_eq!(Inline::from(true), Inline::True);
        assert_eq!(Inline::Unset.as_str(), "none");
    }

    #[test]
    fn enum_values_parse_from_wire_strings() {
        assert_eq!("off".parse::<TrackingMode>(), Ok(TrackingMode::Off));
        assert_eq!("byPath".parse::<EmbedImages>(), Ok(EmbedImages::ByPath));
        assert!("loud".parse::<TrackingMode>().is_err());
    }

    #[test]
    fn preview_defaults_to_litmus() {
        assert_eq!(Preview::default().service, "litmus");
    }

    #[test]
    fn date_falls_back_to_service_format() {
        assert_eq!(Date::new("31.12.2024 10:00:00").effective_format(), DEFAULT_DATE_FORMAT);
        assert_eq!(
            Date::new("2024-12-31").with_format("yyyy-MM-dd").effective_format(),
            "yyyy-MM-dd"
        );
    }
}
