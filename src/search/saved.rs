//! Persisted search state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::facet::encoding::EMPTY_FACET_STRING;

/// The stored parameters of a search, without any results.
///
/// Storage is the caller's concern; this type only round-trips through JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: Uuid,
    /// Owning user, if any.
    pub owner: Option<String>,
    pub name: String,
    pub query: String,
    pub facet_string: String,
    pub sort_string: String,
    pub page: usize,
    pub hits_per_page: usize,
    /// Hit count of the last execution; the baseline for new-hit checks.
    pub last_hits_count: u64,
    /// Whether the owner wants to be notified about new hits.
    pub new_hits_notification: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl SavedSearch {
    pub fn new<S: Into<String>>(query: S) -> Self {
        let now = Utc::now();
        SavedSearch {
            id: Uuid::new_v4(),
            owner: None,
            name: String::new(),
            query: query.into(),
            facet_string: EMPTY_FACET_STRING.to_string(),
            sort_string: String::new(),
            page: 1,
            hits_per_page: 10,
            last_hits_count: 0,
            new_hits_notification: false,
            date_created: now,
            date_updated: now,
        }
    }

    pub fn owner<S: Into<String>>(mut self, owner: S) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn facet_string<S: Into<String>>(mut self, facet_string: S) -> Self {
        self.facet_string = facet_string.into();
        self
    }

    pub fn sort_string<S: Into<String>>(mut self, sort_string: S) -> Self {
        self.sort_string = sort_string.into();
        self
    }

    pub fn paging(mut self, page: usize, hits_per_page: usize) -> Self {
        self.page = page;
        self.hits_per_page = hits_per_page;
        self
    }

    pub fn notify_on_new_hits(mut self, notify: bool) -> Self {
        self.new_hits_notification = notify;
        self
    }

    /// Record the hit count of an execution.
    pub fn record_hits_count(&mut self, hits_count: u64) {
        self.last_hits_count = hits_count;
        self.date_updated = Utc::now();
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
