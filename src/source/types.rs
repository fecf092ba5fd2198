//! Wire types for the engagement collection endpoint.

use serde::{Deserialize, Deserializer};
use tracing::warn;

/// Kind of media attached to an engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Audio-only recording served from the `wav` endpoint.
    Audio,
    /// Video recording served from the `video` endpoint.
    Video,
}

impl MediaKind {
    /// Path segment of the media endpoint for this kind.
    #[must_use]
    pub fn endpoint_segment(self) -> &'static str {
        match self {
            Self::Audio => "wav",
            Self::Video => "video",
        }
    }

    /// File extension used for the stored media file.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Audio => "m4a",
            Self::Video => "mp4",
        }
    }
}

/// Engagement type reported by the source platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngagementType {
    /// Phone call placed through the dialer.
    Dialer,
    /// Recorded meeting.
    #[default]
    Meeting,
    /// Manually uploaded recording.
    Recording,
    /// Any type this tool does not know about.
    #[serde(other)]
    Other,
}

impl EngagementType {
    /// Dialer calls are audio; everything else is served as video.
    #[must_use]
    pub fn media_kind(&self) -> MediaKind {
        match self {
            Self::Dialer => MediaKind::Audio,
            Self::Meeting | Self::Recording | Self::Other => MediaKind::Video,
        }
    }
}

/// One engagement record. Lives only for the duration of its page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Engagement {
    /// Source identifier. Numeric ids are kept as their decimal string.
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    /// Owner email, used as the per-user output directory.
    #[serde(default)]
    pub user: String,
    /// Title of the call or meeting.
    #[serde(default)]
    pub subject: Option<String>,
    /// Event start, seconds since the Unix epoch. Required to name the file.
    #[serde(default)]
    pub date_time: Option<i64>,
    /// Determines which media endpoint serves the recording.
    #[serde(rename = "type", default)]
    pub engagement_type: EngagementType,
}

/// One page of the engagement collection.
#[derive(Debug, Clone, Deserialize)]
pub struct EngagementPage {
    /// Cursor for the next page. Blank or missing on the last page.
    #[serde(default)]
    pub continuation_key: Option<String>,
    /// Records on this page, in server order, not yet validated.
    #[serde(default)]
    pub engagements: Vec<serde_json::Value>,
}

impl EngagementPage {
    /// Converts each record on its own so one malformed record cannot
    /// discard the rest of the page.
    #[must_use]
    pub fn into_batch(self) -> EngagementBatch {
        let mut batch = EngagementBatch::default();
        for value in self.engagements {
            let id = raw_id(&value);
            match serde_json::from_value::<Engagement>(value) {
                Ok(engagement) => batch.records.push(engagement),
                Err(e) => {
                    warn!(id = %id, error = %e, "malformed engagement record");
                    batch.malformed.push(id);
                }
            }
        }
        batch
    }
}

/// Records of one page, split into usable and malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngagementBatch {
    /// Records that decoded, in server order.
    pub records: Vec<Engagement>,
    /// Ids of records that did not decode (empty when the id itself is unusable).
    pub malformed: Vec<String>,
}

impl EngagementBatch {
    /// Number of records on the page, malformed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len() + self.malformed.len()
    }

    /// Whether the page held no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn raw_id(value: &serde_json::Value) -> String {
    match value.get("id") {
        Some(serde_json::Value::String(text)) => text.trim().to_string(),
        Some(serde_json::Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
        Null,
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text.trim().to_string(),
        RawId::Number(number) => number.to_string(),
        RawId::Null => String::new(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_engagement_numeric_id_becomes_string() {
        let engagement: Engagement = serde_json::from_str(
            r#"{"id":1,"type":"dialer","user":"a@x.com","subject":"Sync","date_time":1700000000}"#,
        )
        .unwrap();

        assert_eq!(engagement.id, "1");
        assert_eq!(engagement.engagement_type, EngagementType::Dialer);
        assert_eq!(engagement.engagement_type.media_kind(), MediaKind::Audio);
    }

    #[test]
    fn test_engagement_missing_id_is_empty() {
        let engagement: Engagement =
            serde_json::from_str(r#"{"type":"meeting","user":"a@x.com"}"#).unwrap();
        assert!(engagement.id.is_empty());

        let engagement: Engagement = serde_json::from_str(r#"{"id":null}"#).unwrap();
        assert!(engagement.id.is_empty());
    }

    #[test]
    fn test_unknown_type_maps_to_video() {
        let engagement: Engagement =
            serde_json::from_str(r#"{"id":"abc","type":"webinar"}"#).unwrap();
        assert_eq!(engagement.engagement_type, EngagementType::Other);
        assert_eq!(engagement.engagement_type.media_kind(), MediaKind::Video);
    }

    #[test]
    fn test_media_kind_endpoints() {
        assert_eq!(MediaKind::Audio.endpoint_segment(), "wav");
        assert_eq!(MediaKind::Audio.extension(), "m4a");
        assert_eq!(MediaKind::Video.endpoint_segment(), "video");
        assert_eq!(MediaKind::Video.extension(), "mp4");
    }

    #[test]
    fn test_missing_date_time_is_none() {
        let engagement: Engagement =
            serde_json::from_str(r#"{"id":"7","user":"a@x.com"}"#).unwrap();
        assert_eq!(engagement.date_time, None);
    }

    #[test]
    fn test_malformed_record_is_isolated() {
        let page: EngagementPage = serde_json::from_str(
            r#"{"engagements":[
                {"id":"1","user":"a@x.com","date_time":1700000000},
                {"id":2,"user":"a@x.com","date_time":1700000000.5},
                {"user":["not","a","string"]}
            ]}"#,
        )
        .unwrap();

        let batch = page.into_batch();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].id, "1");
        assert_eq!(batch.malformed, ["2", ""]);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_page_without_key_parses() {
        let page: EngagementPage = serde_json::from_str(r#"{"engagements":[]}"#).unwrap();
        assert!(page.continuation_key.is_none());
        assert!(page.engagements.is_empty());
    }
}
