//! Itinerary packages, generation from catalog data, and saved itineraries.
//!
//! Packages are fixed routes grouped by trip length. Generating one resolves
//! each place name against the `heritage` and `crafts` collections and scales
//! the per-person day cost by the number of travelers.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::bookmarks::USERS_COLLECTION;
use crate::errors::ServiceError;
use crate::storage::{Backend, Document, DocumentId, StorageService};

const ITINERARIES_FIELD: &str = "itineraries";
const DEFAULT_VISIT_DURATION: &str = "2-3 hours";
const DEFAULT_TITLE: &str = "Custom Itinerary";
/// Largest party a generated itinerary is priced for.
pub const MAX_TRAVELERS: i64 = 100;

pub struct DayPlan {
    pub day: u32,
    pub region: &'static str,
    pub places: &'static [&'static str],
    /// Per person.
    pub estimated_cost: i64,
}

pub struct Package {
    pub duration: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub days: &'static [DayPlan],
}

const fn day(day: u32, region: &'static str, places: &'static [&'static str], estimated_cost: i64) -> DayPlan {
    DayPlan { day, region, places, estimated_cost }
}

pub static PACKAGES: &[Package] = &[
    Package {
        duration: 3,
        name: "Chennai Weekend Package",
        description: "Perfect for a weekend getaway - All locations within 60km radius",
        days: &[
            day(1, "Chennai City", &["Fort St. George", "San Thome Basilica"], 2500),
            day(2, "Mahabalipuram", &["Mahabalipuram Group of Monuments", "Shore Temple", "Pancha Rathas"], 3000),
            day(3, "Mahabalipuram & Return", &["Arjuna's Penance", "Kanchipuram Silk Sarees"], 2500),
        ],
    },
    Package {
        duration: 5,
        name: "Temple Circuit Package",
        description: "Chennai to Thanjavur temple trail - Southern heritage highlights",
        days: &[
            day(1, "Chennai Arrival", &["Fort St. George", "San Thome Basilica"], 2500),
            day(2, "Mahabalipuram", &["Mahabalipuram Group of Monuments", "Shore Temple", "Pancha Rathas"], 3000),
            day(3, "Travel to Thanjavur (340km)", &["Gangaikonda Cholapuram"], 3500),
            day(4, "Thanjavur", &["Brihadeeswara Temple", "Thanjavur Maratha Palace", "Thanjavur Paintings"], 2800),
            day(5, "Return Journey", &["Swamimalai Bronze Sculptures"], 2000),
        ],
    },
    Package {
        duration: 7,
        name: "Grand Heritage Tour",
        description: "Complete Tamil Nadu heritage experience - Chennai to Madurai",
        days: &[
            day(1, "Chennai", &["Fort St. George", "San Thome Basilica"], 2500),
            day(
                2,
                "Mahabalipuram",
                &["Mahabalipuram Group of Monuments", "Shore Temple", "Pancha Rathas", "Arjuna's Penance"],
                3200,
            ),
            day(3, "Travel to Thanjavur (340km)", &["Gangaikonda Cholapuram"], 3500),
            day(4, "Thanjavur", &["Brihadeeswara Temple", "Thanjavur Maratha Palace", "Thanjavur Paintings"], 2800),
            day(5, "Travel to Madurai (190km)", &["Chettinad Mansions"], 3000),
            day(6, "Madurai", &["Meenakshi Amman Temple", "Thirumalai Nayak Palace"], 2500),
            day(7, "Return Journey", &["Bhavani Jamakalam"], 2000),
        ],
    },
    Package {
        duration: 10,
        name: "Ultimate Tamil Nadu Experience",
        description: "Complete circuit covering all major destinations from north to south",
        days: &[
            day(1, "Chennai", &["Fort St. George", "San Thome Basilica"], 2500),
            day(2, "Mahabalipuram", &["Mahabalipuram Group of Monuments", "Shore Temple", "Pancha Rathas"], 3200),
            day(3, "Travel to Thanjavur", &["Gangaikonda Cholapuram", "Kanchipuram Silk Sarees"], 3500),
            day(4, "Thanjavur", &["Brihadeeswara Temple", "Thanjavur Maratha Palace", "Thanjavur Paintings"], 2800),
            day(5, "Thanjavur Area", &["Swamimalai Bronze Sculptures", "Thanjavur Bobblehead Dolls"], 2500),
            day(6, "Travel to Madurai", &["Chettinad Mansions"], 3000),
            day(7, "Madurai", &["Meenakshi Amman Temple", "Thirumalai Nayak Palace"], 2500),
            day(8, "Kanyakumari (240km)", &["Vivekananda Rock Memorial", "Thiruvalluvar Statue"], 3500),
            day(9, "Tirunelveli & Crafts", &["Pattamadai Silky Mats", "Tirunelveli Wheat Halwa"], 2500),
            day(10, "Return Journey", &["Bhavani Jamakalam"], 2000),
        ],
    },
];

pub fn package_for(duration: i64) -> Option<&'static Package> {
    PACKAGES.iter().find(|p| i64::from(p.duration) == duration)
}

/// Integer prefix of a number or numeric string: `"5"`, `"5 days"` and `5.0` all give 5.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim_start();
            let end = s
                .char_indices()
                .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
                .map_or(s.len(), |(i, _)| i);
            s[..end].parse().ok()
        }
        _ => None,
    }
}

/// `None` for values that should fall through to a default: absent, null, false, 0 or "".
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub travelers: Option<Value>,
    #[serde(default)]
    pub duration: Value,
    #[serde(default)]
    pub budget: Value,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceDetail {
    pub name: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Value>,
    pub duration: Value,
    pub entry_fee: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>,
}

impl PlaceDetail {
    fn from_document(doc: &Document) -> Self {
        Self {
            name: doc.get("name").cloned().unwrap_or(Value::Null),
            location: doc.get("location").cloned(),
            category: doc.get("category").cloned(),
            duration: present(doc.get("duration")).cloned().unwrap_or_else(|| DEFAULT_VISIT_DURATION.into()),
            entry_fee: present(doc.get("entry_fee"))
                .or_else(|| present(doc.get("priceRange")))
                .cloned()
                .unwrap_or_else(|| "Free".into()),
            image: doc.get("image").cloned(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    pub day: u32,
    pub region: &'static str,
    pub places: Vec<PlaceDetail>,
    pub estimated_cost: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItinerarySummary {
    pub travelers: i64,
    pub duration: i64,
    pub package_name: &'static str,
    pub description: &'static str,
    pub total_places: usize,
    pub estimated_total_cost: i64,
    pub budget_match: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedItinerary {
    pub itinerary: Vec<ItineraryDay>,
    pub summary: ItinerarySummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveItineraryRequest {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub duration: Option<Value>,
    #[serde(default)]
    pub estimated_cost: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub itinerary_data: Option<Value>,
}

impl SaveItineraryRequest {
    fn summary_field(&self, key: &str) -> Option<&Value> {
        present(self.itinerary_data.as_ref().and_then(|d| d.get("summary")).and_then(|s| s.get(key)))
    }

    /// Build the stored record, falling back to the generated summary for missing fields.
    pub fn into_record(self, now: chrono::DateTime<Utc>) -> Document {
        let mut record = Document::new();
        record.insert("id".into(), json!(now.timestamp_millis()));
        record.insert("createdAt".into(), json!(now.to_rfc3339_opts(SecondsFormat::Millis, true)));

        let title = present(self.title.as_ref())
            .or_else(|| self.summary_field("packageName"))
            .cloned()
            .unwrap_or_else(|| DEFAULT_TITLE.into());
        record.insert("title".into(), title);

        let fallbacks = [
            ("duration", self.duration.as_ref(), "duration"),
            ("estimatedCost", self.estimated_cost.as_ref(), "estimatedTotalCost"),
            ("description", self.description.as_ref(), "description"),
        ];
        for (key, given, summary_key) in fallbacks {
            if let Some(v) = present(given).or_else(|| self.summary_field(summary_key)) {
                record.insert(key.into(), v.clone());
            }
        }

        record.insert("details".into(), present(self.details.as_ref()).cloned().unwrap_or_else(|| json!({})));
        let itinerary = self
            .itinerary_data
            .as_ref()
            .and_then(|d| present(d.get("itinerary")))
            .cloned()
            .unwrap_or_else(|| json!([]));
        record.insert("itinerary".into(), itinerary);
        record
    }
}

#[derive(Clone)]
pub struct ItineraryService {
    users: StorageService,
    heritage: StorageService,
    crafts: StorageService,
}

impl ItineraryService {
    pub fn new(backend: &Backend) -> Self {
        Self {
            users: StorageService::new(USERS_COLLECTION, backend),
            heritage: StorageService::new("heritage", backend),
            crafts: StorageService::new("crafts", backend),
        }
    }

    pub async fn generate(&self, req: GenerateRequest) -> Result<GeneratedItinerary, ServiceError> {
        let package = parse_int(&req.duration)
            .and_then(package_for)
            .ok_or_else(|| ServiceError::Validation("Invalid duration selected".into()))?;
        let travelers = req.travelers.as_ref().and_then(parse_int).unwrap_or(1);
        if !(1..=MAX_TRAVELERS).contains(&travelers) {
            return Err(ServiceError::Validation("Invalid number of travelers".into()));
        }

        let mut places = self.heritage.get_all().await?;
        places.extend(self.crafts.get_all().await?);

        let itinerary: Vec<ItineraryDay> = package
            .days
            .iter()
            .map(|plan| ItineraryDay {
                day: plan.day,
                region: plan.region,
                places: plan
                    .places
                    .iter()
                    .filter_map(|name| places.iter().find(|p| p.get("name").and_then(Value::as_str) == Some(*name)))
                    .map(PlaceDetail::from_document)
                    .collect(),
                estimated_cost: plan.estimated_cost * travelers,
            })
            .collect();

        let total: i64 = itinerary.iter().map(|d| d.estimated_cost).sum();
        let summary = ItinerarySummary {
            travelers,
            duration: i64::from(package.duration),
            package_name: package.name,
            description: package.description,
            total_places: itinerary.iter().map(|d| d.places.len()).sum(),
            estimated_total_cost: total,
            budget_match: parse_int(&req.budget).is_some_and(|budget| total <= budget),
        };
        debug!(package = package.name, travelers, interests = req.interests.len(), "itinerary generated");
        Ok(GeneratedItinerary { itinerary, summary })
    }

    /// Append a saved itinerary to the user's list and return the stored record.
    pub async fn save(&self, user_id: &DocumentId, req: SaveItineraryRequest) -> Result<Document, ServiceError> {
        let record = req.into_record(Utc::now());
        self.users
            .array_add(user_id, ITINERARIES_FIELD, Value::Object(record.clone()))
            .await
            .map_err(|e| if e.is_not_found() { ServiceError::not_found("User") } else { e.into() })?;
        info!(user_id = %user_id, id = ?record.get("id"), "itinerary saved");
        Ok(record)
    }

    pub async fn list(&self, user_id: &DocumentId) -> Result<Vec<Value>, ServiceError> {
        let user = self.users.get_by_id(user_id).await?.ok_or_else(|| ServiceError::not_found("User"))?;
        Ok(user.get(ITINERARIES_FIELD).and_then(Value::as_array).cloned().unwrap_or_default())
    }
}
