//! XML encoding of event requests.
//!
//! The event-file endpoint expects a fixed document shape:
//!
//! - Root element `event`, no namespace
//! - Scalars are attributes unless they are the element's node value
//! - Booleans: lowercase `true`/`false`; an unset `inline` is `none`
//! - Unset values are omitted, and elements left without attributes,
//!   children or text are pruned
//! - The html body is a CDATA section
//! - XML declaration: `<?xml version="1.0" encoding="UTF-8"?>`
//!
//! Each entity maps itself onto an [`XmlElement`]; the tree is pruned and
//! then written with `quick_xml`.

use std::io::Write;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::escape::partial_escape;
use quick_xml::Writer;

use crate::error::EncodingError;
use crate::event::{BaseEntry, Data, Date, Destination, Email, Event, File, HtmlText, PlainText, Preview};

/// Node value of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlText {
    Plain(String),
    CData(String),
}

impl XmlText {
    fn is_empty(&self) -> bool {
        match self {
            XmlText::Plain(text) | XmlText::CData(text) => text.is_empty(),
        }
    }
}

/// An element of the document tree, before pruning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: &'static str,
    pub attributes: Vec<(&'static str, String)>,
    pub children: Vec<XmlElement>,
    pub text: Option<XmlText>,
    /// Kept by [`XmlElement::prune`] even when empty.
    pub required: bool,
}

impl XmlElement {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
            required: false,
        }
    }

    fn attr(mut self, name: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.attributes.push((name, value.to_string()));
        }
        self
    }

    fn bool_attr(self, name: &'static str, value: Option<bool>) -> Self {
        self.attr(name, value.map(bool_str))
    }

    fn child(mut self, child: Option<XmlElement>) -> Self {
        if let Some(child) = child {
            self.children.push(child);
        }
        self
    }

    fn text_child(self, name: &'static str, value: Option<&str>) -> Self {
        let child = value.map(|v| XmlElement::new(name).text(XmlText::Plain(v.to_string())));
        self.child(child)
    }

    fn repeated(mut self, name: &'static str, values: &[String]) -> Self {
        for value in values {
            self.children
                .push(XmlElement::new(name).text(XmlText::Plain(value.clone())));
        }
        self
    }

    fn text(mut self, text: XmlText) -> Self {
        self.text = Some(text);
        self
    }

    /// True when the element carries no attribute, child or text.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.children.is_empty()
            && self.text.as_ref().map_or(true, XmlText::is_empty)
    }

    /// Remove empty descendants, bottom-up, so a branch that only held empty
    /// elements disappears as a whole.
    pub fn prune(&mut self) {
        for child in &mut self.children {
            child.prune();
        }
        self.children.retain(|child| child.required || !child.is_empty());
        if self.text.as_ref().is_some_and(XmlText::is_empty) {
            self.text = None;
        }
    }

    fn write<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), EncodingError> {
        let mut start = BytesStart::new(self.name);
        for (key, value) in &self.attributes {
            start.push_attribute((*key, value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            writer.write_event(XmlEvent::Empty(start))?;
            return Ok(());
        }

        writer.write_event(XmlEvent::Start(start))?;
        match &self.text {
            Some(XmlText::Plain(text)) => {
                writer.write_event(XmlEvent::Text(BytesText::from_escaped(partial_escape(text))))?;
            }
            Some(XmlText::CData(text)) => write_cdata(writer, text)?,
            None => {}
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer.write_event(XmlEvent::End(BytesEnd::new(self.name)))?;
        Ok(())
    }
}

/// Write `text` as CDATA, splitting around any `]]>` it contains.
fn write_cdata<W: Write>(writer: &mut Writer<W>, text: &str) -> Result<(), EncodingError> {
    let parts: Vec<&str> = text.split("]]>").collect();
    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        let mut section = String::with_capacity(part.len() + 3);
        if i > 0 {
            section.push('>');
        }
        section.push_str(part);
        if i < last {
            section.push_str("]]");
        }
        writer.write_event(XmlEvent::CData(BytesCData::new(section)))?;
    }
    Ok(())
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Maps a request entity onto its XML element.
pub trait ToXml {
    fn to_xml_element(&self) -> XmlElement;
}

impl ToXml for Event {
    fn to_xml_element(&self) -> XmlElement {
        let mut root = XmlElement::new("event")
            .attr("id", self.id.as_deref())
            .attr("newsletterGroup", self.newsletter_group.as_deref())
            .bool_attr("skipUsedIDs", self.skip_used_ids)
            .bool_attr("archiveSkipped", self.archive_skipped)
            .bool_attr("archive", self.archive)
            .attr("createdBy", self.created_by.as_deref())
            .attr("createdByDisplayName", self.created_by_display_name.as_deref())
            .repeated("tag", self.tags())
            .child(self.destination.as_ref().map(ToXml::to_xml_element))
            .child(self.data.as_ref().map(ToXml::to_xml_element))
            .child(self.date.as_ref().map(ToXml::to_xml_element));
        root.required = true;
        root
    }
}

impl ToXml for Destination {
    fn to_xml_element(&self) -> XmlElement {
        XmlElement::new("destination")
            .repeated("channel", self.channels())
            .repeated("vchannel", self.virtual_channels())
            .text_child("query", self.query.as_deref())
            .child(self.preview.as_ref().map(ToXml::to_xml_element))
    }
}

impl ToXml for Preview {
    fn to_xml_element(&self) -> XmlElement {
        XmlElement::new("preview")
            .attr("service", Some(self.service.as_str()))
            .child(self.base_entry.as_ref().map(ToXml::to_xml_element))
    }
}

impl ToXml for BaseEntry {
    fn to_xml_element(&self) -> XmlElement {
        XmlElement::new("baseEntry").attr("email", self.email.as_deref())
    }
}

impl ToXml for Data {
    fn to_xml_element(&self) -> XmlElement {
        XmlElement::new("data")
            .attr("mailto", self.mailto.as_deref())
            .child(self.email.as_ref().map(ToXml::to_xml_element))
            .text_child("message", self.message.as_deref())
    }
}

impl ToXml for Email {
    fn to_xml_element(&self) -> XmlElement {
        let mut element = XmlElement::new("email")
            .attr("sender", self.sender.as_deref())
            .attr("replyto", self.replyto.as_deref())
            .attr("envelopeFrom", self.envelope_from.as_deref())
            .bool_attr("obeyPreferHtml", self.obey_prefer_html)
            .bool_attr("sendBothParts", self.send_both_parts)
            .attr("baseUrl", self.base_url.as_deref())
            .attr("downloadUrl", self.download_url.as_deref())
            .attr("trackingMode", self.tracking_mode.as_ref().map(|m| m.as_str()))
            .text_child("subject", self.subject.as_deref())
            .child(self.htmltext.as_ref().map(ToXml::to_xml_element))
            .child(self.plaintext.as_ref().map(ToXml::to_xml_element));
        for file in self.files() {
            element.children.push(file.to_xml_element());
        }
        element
    }
}

impl ToXml for HtmlText {
    fn to_xml_element(&self) -> XmlElement {
        let element = XmlElement::new("htmltext")
            .attr("inline", Some(self.inline.as_str()))
            .attr("charset", self.charset.as_deref())
            .attr("embedImages", Some(self.embed_images.as_str()))
            .attr("baseUrl", self.base_url.as_deref())
            .attr("downloadUrl", self.download_url.as_deref())
            .bool_attr("linkTracking", self.link_tracking)
            .bool_attr("viewTracking", self.view_tracking)
            .attr("renderCallback", self.render_callback.as_deref())
            .attr("restProxyUrl", self.rest_proxy_url.as_deref());
        match &self.content {
            Some(content) => element.text(XmlText::CData(content.clone())),
            None => element,
        }
    }
}

impl ToXml for PlainText {
    fn to_xml_element(&self) -> XmlElement {
        let element = XmlElement::new("plaintext")
            .attr("inline", Some(self.inline.as_str()))
            .attr("charset", self.charset.as_deref())
            .attr("baseUrl", self.base_url.as_deref())
            .attr("downloadUrl", self.download_url.as_deref())
            .bool_attr("linkTracking", self.link_tracking)
            .attr("renderCallback", self.render_callback.as_deref());
        match &self.content {
            Some(content) => element.text(XmlText::Plain(content.clone())),
            None => element,
        }
    }
}

impl ToXml for File {
    fn to_xml_element(&self) -> XmlElement {
        let element = XmlElement::new("file")
            .attr("name", self.name.as_deref())
            .attr("disposition", self.disposition.as_deref())
            .attr("inline", Some(self.inline.as_str()));
        match &self.content {
            Some(content) => element.text(XmlText::Plain(content.clone())),
            None => element,
        }
    }
}

impl ToXml for Date {
    fn to_xml_element(&self) -> XmlElement {
        XmlElement::new("date")
            .attr("format", self.format.as_deref())
            .text(XmlText::Plain(self.value.clone()))
    }
}

/// Serialize an event as a complete XML document.
///
/// # Errors
///
/// Returns `EncodingError` if the writer fails, which only happens on a defect.
pub fn to_xml(event: &Event) -> Result<String, EncodingError> {
    let mut root = event.to_xml_element();
    root.prune();

    let mut buf = Vec::with_capacity(1024);
    let mut writer = Writer::new(&mut buf);
    writer.write_event(XmlEvent::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    root.write(&mut writer)?;

    Ok(String::from_utf8(buf)?)
}
