//! Typed view of a row from the `incidents` table.
//!
//! The row arrives as an untyped JSON object from either store adapter. The
//! known columns are decoded into named fields here, at the data-access
//! boundary, while the original object is kept intact so the verification
//! prompt can embed every column, including ones this crate does not know.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::types::Timestamp;

/// Column holding the attached image reference.
pub const IMAGE_FIELD: &str = "img_url";

/// Older rows (and older clients) used this key for the same column.
pub const LEGACY_IMAGE_FIELD: &str = "image_url";

/// A single incident record fetched by primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub description: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub img_url: Option<String>,
    pub status: Option<String>,
    pub severity_level: Option<String>,
    pub category: Option<String>,
    pub estimated_people_affected: Option<i64>,
    pub agencies_assigned: Vec<String>,
    pub created_at: Option<Timestamp>,
    record: Map<String, Value>,
}

/// Known columns. Every field is lenient: a value of an unexpected shape
/// decodes to `None` rather than failing the whole row, since the raw value
/// still reaches the prompt through the retained record.
#[derive(Deserialize)]
struct IncidentColumns {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    lng: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    img_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    severity_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    category: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    estimated_people_affected: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    agencies_assigned: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    created_at: Option<Timestamp>,
}

impl Incident {
    /// Decode a row object into an `Incident`, keeping the object itself.
    pub fn from_record(record: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let columns: IncidentColumns = serde_json::from_value(Value::Object(record.clone()))?;

        let img_url = non_blank(columns.img_url).or_else(|| non_blank(columns.image_url));

        Ok(Self {
            id: columns.id,
            user_id: columns.user_id,
            description: columns.description,
            lat: columns.lat,
            lng: columns.lng,
            img_url,
            status: columns.status,
            severity_level: columns.severity_level,
            category: columns.category,
            estimated_people_affected: columns.estimated_people_affected,
            agencies_assigned: columns.agencies_assigned,
            created_at: columns.created_at,
            record,
        })
    }

    /// The attached image reference, if the row carries a non-blank one.
    pub fn image_url(&self) -> Option<&str> {
        self.img_url.as_deref()
    }

    /// The full row exactly as the store returned it.
    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    /// Render the full row as pretty-printed JSON for embedding in a prompt.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(&self.record)
            .unwrap_or_else(|_| Value::Object(self.record.clone()).to_string())
    }
}

impl Serialize for Incident {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Incident {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_record(record).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Lenient column decoders
// ---------------------------------------------------------------------------

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => chrono::DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|ts| ts.with_timezone(&chrono::Utc)),
        _ => None,
    })
}
