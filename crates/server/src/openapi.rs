use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkRequestDoc {
    pub place_name: String,
}

#[derive(Serialize, ToSchema)]
pub struct BookmarksResponse {
    pub message: Option<String>,
    pub bookmarks: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateRequestDoc {
    pub travelers: i64,
    /// 3, 5, 7 or 10
    pub duration: i64,
    pub budget: i64,
    pub interests: Vec<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveItineraryRequestDoc {
    pub title: Option<String>,
    pub duration: Option<i64>,
    pub estimated_cost: Option<i64>,
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub itinerary_data: Option<serde_json::Value>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::catalog::heritage,
        crate::routes::catalog::crafts,
        crate::routes::catalog::marketplace,
        crate::routes::catalog::lang,
        crate::routes::bookmarks::list,
        crate::routes::bookmarks::add,
        crate::routes::bookmarks::remove,
        crate::routes::itinerary::generate,
        crate::routes::itinerary::save,
        crate::routes::itinerary::list,
    ),
    components(
        schemas(
            HealthResponse,
            BookmarkRequestDoc,
            BookmarksResponse,
            GenerateRequestDoc,
            SaveItineraryRequestDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "catalog"),
        (name = "bookmarks"),
        (name = "itinerary")
    )
)]
pub struct ApiDoc;
