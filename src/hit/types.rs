//! Hit types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::index::document::{DocType, IndexDocument};
use crate::index::fields;

/// What a search hit represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HitType {
    Docstrct,
    Page,
    Metadata,
    Ugc,
    Event,
    Person,
    Corporation,
    Location,
    Subject,
    Publisher,
    Address,
    Comment,
    Group,
    /// Placeholder for a child the user may not see.
    AccessDenied,
}

impl HitType {
    /// Parse a hit type name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let hit_type = match name.trim().to_uppercase().as_str() {
            "DOCSTRCT" => HitType::Docstrct,
            "PAGE" => HitType::Page,
            "METADATA" => HitType::Metadata,
            "UGC" => HitType::Ugc,
            "EVENT" => HitType::Event,
            "PERSON" => HitType::Person,
            "CORPORATION" => HitType::Corporation,
            "LOCATION" => HitType::Location,
            "SUBJECT" => HitType::Subject,
            "PUBLISHER" => HitType::Publisher,
            "ADDRESS" => HitType::Address,
            "COMMENT" => HitType::Comment,
            "GROUP" => HitType::Group,
            "ACCESSDENIED" | "ACCESS_DENIED" => HitType::AccessDenied,
            _ => return None,
        };
        Some(hit_type)
    }

    pub fn name(&self) -> &'static str {
        match self {
            HitType::Docstrct => "DOCSTRCT",
            HitType::Page => "PAGE",
            HitType::Metadata => "METADATA",
            HitType::Ugc => "UGC",
            HitType::Event => "EVENT",
            HitType::Person => "PERSON",
            HitType::Corporation => "CORPORATION",
            HitType::Location => "LOCATION",
            HitType::Subject => "SUBJECT",
            HitType::Publisher => "PUBLISHER",
            HitType::Address => "ADDRESS",
            HitType::Comment => "COMMENT",
            HitType::Group => "GROUP",
            HitType::AccessDenied => "ACCESS_DENIED",
        }
    }

    /// Determine the hit type of an index document.
    ///
    /// Grouped metadata documents take their type from `METADATATYPE` and
    /// user-generated content from `UGCTYPE`, falling back to the plain
    /// document type. Returns `None` if the document has no known `DOCTYPE`.
    pub fn of_document(doc: &IndexDocument) -> Option<Self> {
        let sub_type = |field: &str| doc.first(field).and_then(HitType::from_name);
        let hit_type = match doc.doc_type()? {
            DocType::Docstrct => HitType::Docstrct,
            DocType::Page => HitType::Page,
            DocType::Event => HitType::Event,
            DocType::Group => HitType::Group,
            DocType::Metadata => sub_type(fields::METADATATYPE).unwrap_or(HitType::Metadata),
            DocType::Ugc => sub_type(fields::UGCTYPE).unwrap_or(HitType::Ugc),
        };
        Some(hit_type)
    }
}

impl fmt::Display for HitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
