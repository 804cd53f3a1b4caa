//! Entries for new-hit notifications.

use serde::Serialize;

use crate::hit::aggregator::SearchHit;

/// One new hit as listed in a notification message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationEntry {
    pub thumbnail_url: Option<String>,
    pub label: String,
}

/// `(thumbnail, label)` entries for new hits, in hit order.
pub fn notification_entries(hits: &[SearchHit]) -> Vec<NotificationEntry> {
    hits.iter()
        .map(|hit| NotificationEntry {
            thumbnail_url: hit.browse_element.thumbnail_url.clone(),
            label: hit.browse_element.label.clone(),
        })
        .collect()
}

/// Plain-text body listing the new hits of a saved search.
pub fn notification_text(search_name: &str, entries: &[NotificationEntry]) -> String {
    let mut text = format!("New hits for \"{search_name}\": {}\n", entries.len());
    for entry in entries {
        text.push_str("- ");
        text.push_str(&entry.label);
        if let Some(url) = &entry.thumbnail_url {
            text.push_str(" (");
            text.push_str(url);
            text.push(')');
        }
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_text() {
        let entries = vec![
            NotificationEntry {
                thumbnail_url: Some("/thumb/1.jpg".to_string()),
                label: "Birds".to_string(),
            },
            NotificationEntry {
                thumbnail_url: None,
                label: "Owls".to_string(),
            },
        ];
        assert_eq!(
            notification_text("nature", &entries),
            "New hits for \"nature\": 2\n- Birds (/thumb/1.jpg)\n- Owls\n"
        );
    }
}
