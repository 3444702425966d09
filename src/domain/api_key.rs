use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ApiLogEntry {
    pub api_key_id: Option<Uuid>,
    pub method: String,
    pub path: String,
    pub status_code: i32,
    pub latency_ms: i32,
}
