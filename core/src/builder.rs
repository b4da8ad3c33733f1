//! Convenience builder for [`Event`] requests.
//!
//! # Design
//! The builder keeps a typed draft with one slot per section of the document.
//! A section only materializes in the built event when one of its setters was
//! called. Setters overwrite (last write wins), the `add_*` methods append and
//! skip duplicates.
//!
//! Any email, html body or text body setter creates the email element, and
//! the built email then always carries both body parts. A part nobody
//! configured goes out with `inline="none"`, so the service knows it is not
//! sent.
//!
//! [`EventRequestBuilder::build`] leaves the draft untouched, so one builder
//! can produce several events. Call [`EventRequestBuilder::reset`] to start
//! over.

use crate::error::RequestValidationError;
use crate::event::{
    BaseEntry, Data, Date, Destination, EmbedImages, Email, Event, File, HtmlText, Inline, PlainText, Preview,
    TrackingMode, DEFAULT_PREVIEW_SERVICE,
};

#[derive(Debug, Clone, Default)]
pub struct EventRequestBuilder {
    /// Root attributes and tags. Sections below are attached on build.
    event: Event,
    destination: Option<Destination>,
    data: Option<DataDraft>,
    date: Option<Date>,
}

#[derive(Debug, Clone, Default)]
struct DataDraft {
    mailto: Option<String>,
    message: Option<String>,
    email: Option<Email>,
    html: Option<HtmlText>,
    text: Option<PlainText>,
}

impl DataDraft {
    fn has_email(&self) -> bool {
        self.email.is_some() || self.html.is_some() || self.text.is_some()
    }

    fn to_data(&self) -> Data {
        let email = self.has_email().then(|| {
            let mut email = self.email.clone().unwrap_or_default();
            email.htmltext = Some(self.html.clone().unwrap_or_default());
            email.plaintext = Some(self.text.clone().unwrap_or_default());
            email
        });
        Data {
            mailto: self.mailto.clone(),
            email,
            message: self.message.clone(),
        }
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

impl EventRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard everything set so far.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    /// Assemble the event from the current draft.
    ///
    /// # Errors
    ///
    /// Returns `RequestValidationError` when a scheduled date has no value.
    pub fn build(&self) -> Result<Event, RequestValidationError> {
        if let Some(date) = &self.date {
            if date.value.trim().is_empty() {
                return Err(RequestValidationError("date value must not be empty".to_string()));
            }
        }

        let mut event = self.event.clone();
        event.destination = self.destination.clone();
        event.data = self.data.as_ref().map(DataDraft::to_data);
        event.date = self.date.clone();
        Ok(event)
    }

    // Event

    /// Set the event id, its newsletter series and whether the dispatch is
    /// skipped when the id was used before.
    pub fn set_event_details(
        &mut self,
        id: Option<&str>,
        newsletter_group: Option<&str>,
        skip_used_ids: Option<bool>,
    ) -> &mut Self {
        self.event.id = owned(id);
        self.event.newsletter_group = owned(newsletter_group);
        self.event.skip_used_ids = skip_used_ids;
        self
    }

    pub fn set_event_created_by(&mut self, created_by: Option<&str>, display_name: Option<&str>) -> &mut Self {
        self.event.created_by = owned(created_by);
        self.event.created_by_display_name = owned(display_name);
        self
    }

    /// Whether the dispatch is archived, and whether skipped dispatches are
    /// archived as cancelled.
    pub fn set_event_archive_saving(&mut self, archive: bool, archive_skipped: bool) -> &mut Self {
        self.event.archive = Some(archive);
        self.event.archive_skipped = Some(archive_skipped);
        self
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.event.add_tag(tag);
        self
    }

    // Destination

    fn destination(&mut self) -> &mut Destination {
        self.destination.get_or_insert_with(Destination::default)
    }

    pub fn add_channel(&mut self, channel: impl Into<String>) -> &mut Self {
        self.destination().add_channel(channel);
        self
    }

    pub fn add_virtual_channel(&mut self, vchannel: impl Into<String>) -> &mut Self {
        self.destination().add_virtual_channel(vchannel);
        self
    }

    /// Request an inbox preview personalized for `base_entry_email`. The
    /// service defaults to `litmus`.
    pub fn set_preview(&mut self, base_entry_email: Option<&str>, service: Option<&str>) -> &mut Self {
        self.destination().preview = Some(Preview {
            service: service.unwrap_or(DEFAULT_PREVIEW_SERVICE).to_string(),
            base_entry: Some(BaseEntry {
                email: owned(base_entry_email),
            }),
        });
        self
    }

    pub fn set_query(&mut self, query: Option<&str>) -> &mut Self {
        self.destination().query = owned(query);
        self
    }

    // Date

    /// Schedule the dispatch. Without a format the service reads `value` as
    /// `dd.MM.yyyy HH:mm:ss`.
    pub fn set_date(&mut self, value: impl Into<String>, format: Option<&str>) -> &mut Self {
        self.date = Some(Date {
            value: value.into(),
            format: owned(format),
        });
        self
    }

    // Data

    fn data(&mut self) -> &mut DataDraft {
        self.data.get_or_insert_with(DataDraft::default)
    }

    fn email(&mut self) -> &mut Email {
        self.data().email.get_or_insert_with(Email::default)
    }

    fn html(&mut self) -> &mut HtmlText {
        self.data().html.get_or_insert_with(HtmlText::default)
    }

    fn text(&mut self) -> &mut PlainText {
        self.data().text.get_or_insert_with(PlainText::default)
    }

    pub fn set_mail_to(&mut self, mailto: Option<&str>) -> &mut Self {
        self.data().mailto = owned(mailto);
        self
    }

    pub fn set_message(&mut self, message: Option<&str>) -> &mut Self {
        self.data().message = owned(message);
        self
    }

    // Email

    pub fn set_email_base_and_download_url(&mut self, base_url: Option<&str>, download_url: Option<&str>) -> &mut Self {
        let email = self.email();
        email.base_url = owned(base_url);
        email.download_url = owned(download_url);
        self
    }

    pub fn set_email_addresses(
        &mut self,
        sender: Option<&str>,
        reply_to: Option<&str>,
        envelope_from: Option<&str>,
    ) -> &mut Self {
        let email = self.email();
        email.sender = owned(sender);
        email.replyto = owned(reply_to);
        email.envelope_from = owned(envelope_from);
        self
    }

    pub fn set_email_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.email().subject = Some(subject.into());
        self
    }

    pub fn set_email_tracking(&mut self, mode: TrackingMode) -> &mut Self {
        self.email().tracking_mode = Some(mode);
        self
    }

    /// `obey_prefer_html` honours the recipient's html preference;
    /// `send_both_parts` sends html and text as one multipart message.
    pub fn set_email_body_type(&mut self, obey_prefer_html: bool, send_both_parts: bool) -> &mut Self {
        let email = self.email();
        email.obey_prefer_html = Some(obey_prefer_html);
        email.send_both_parts = Some(send_both_parts);
        self
    }

    /// Attach a file. An attachment equal in all four fields to one already
    /// added is ignored.
    pub fn add_file(
        &mut self,
        content: Option<&str>,
        disposition: Option<&str>,
        inline: Inline,
        name: Option<&str>,
    ) -> &mut Self {
        self.email().add_file(File {
            name: owned(name),
            disposition: owned(disposition),
            inline,
            content: owned(content),
        });
        self
    }

    // Html body

    pub fn set_html_body_base_and_download_url(
        &mut self,
        base_url: Option<&str>,
        download_url: Option<&str>,
        rest_proxy_url: Option<&str>,
    ) -> &mut Self {
        let html = self.html();
        html.base_url = owned(base_url);
        html.download_url = owned(download_url);
        html.rest_proxy_url = owned(rest_proxy_url);
        self
    }

    pub fn set_html_body_encoding(&mut self, charset: Option<&str>) -> &mut Self {
        self.html().charset = owned(charset);
        self
    }

    pub fn set_html_body_content(&mut self, inline: Inline, content: Option<&str>) -> &mut Self {
        let html = self.html();
        html.inline = inline;
        html.content = owned(content);
        self
    }

    pub fn set_html_body_embed_images(&mut self, embed_images: EmbedImages) -> &mut Self {
        self.html().embed_images = embed_images;
        self
    }

    pub fn set_html_body_tracking(&mut self, link_tracking: Option<bool>, view_tracking: Option<bool>) -> &mut Self {
        let html = self.html();
        html.link_tracking = link_tracking;
        html.view_tracking = view_tracking;
        self
    }

    pub fn set_html_body_render_callback(&mut self, render_callback: Option<&str>) -> &mut Self {
        self.html().render_callback = owned(render_callback);
        self
    }

    // Text body

    pub fn set_text_body_base_and_download_url(
        &mut self,
        base_url: Option<&str>,
        download_url: Option<&str>,
    ) -> &mut Self {
        let text = self.text();
        text.base_url = owned(base_url);
        text.download_url = owned(download_url);
        self
    }

    pub fn set_text_body_encoding(&mut self, charset: Option<&str>) -> &mut Self {
        self.text().charset = owned(charset);
        self
    }

    pub fn set_text_body_content(&mut self, inline: Inline, content: Option<&str>) -> &mut Self {
        let text = self.text();
        text.inline = inline;
        text.content = owned(content);
        self
    }

    pub fn set_text_body_tracking(&mut self, link_tracking: Option<bool>) -> &mut Self {
        self.text().link_tracking = link_tracking;
        self
    }

    pub fn set_text_body_render_callback(&mut self, render_callback: Option<&str>) -> &mut Self {
        self.text().render_callback = owned(render_callback);
        self
    }
}
