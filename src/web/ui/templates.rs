use askama::Template;
use askama_web::WebTemplate;

pub struct RouteRow {
    pub id: String,
    pub name: String,
    pub distance_km: String,
    pub duration: String,
    pub points: usize,
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub mode: String,
    pub activity: String,
    pub confidence: String,
    pub distance_m: String,
    pub duration: String,
    pub steps: u64,
    pub total_sessions: u64,
    pub total_distance_km: String,
    pub total_duration: String,
    pub routes: Vec<RouteRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "route.html")]
pub struct RouteTemplate {
    pub name: String,
    pub distance_km: String,
    pub duration: String,
    pub average_speed: String,
    pub steps: u64,
    /// JSON payloads embedded in the page script.
    pub segments_json: String,
    pub points_json: String,
    pub bounds_json: String,
}
