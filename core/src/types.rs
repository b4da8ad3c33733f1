//! Response entities of the newsletter endpoints.
//!
//! # Design
//! Entities are plain snapshots decoded fresh from each response. Every field
//! has a default so a response that omits a key still decodes; unknown keys
//! are ignored. Key spelling is normalized by [`crate::json`] before serde
//! sees the object, so the derives only need the camelCase names.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::json::lenient_datetime;

/// A newsletter channel or virtual channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct NewsletterChannel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    /// `true` for a virtual channel, `false` for a plain channel.
    #[serde(rename = "isVChannel", alias = "isVchannel")]
    pub is_vchannel: bool,
    pub oid: String,
    /// Estimated number of entries in the channel or segment.
    pub estimated_count: i64,
}

/// Delivery status of one newsletter event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct NewsletterStatus {
    pub event_id: String,
    pub oid: String,
    pub send_state: i64,
    /// Absent when the service sent no date or one that does not parse.
    #[serde(deserialize_with = "lenient_datetime")]
    pub send_date: Option<NaiveDateTime>,
    pub contacted: i64,
    pub counted: i64,
    pub not_contacted: i64,
    pub in_queue: bool,
    pub is_failed: bool,
    pub is_finished: bool,
    pub is_stopped: bool,
}

/// An ordered, immutable sequence of decoded entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection<T> {
    items: Vec<T>,
}

pub type NewsletterChannelCollection = Collection<NewsletterChannel>;

impl<T> Collection<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
