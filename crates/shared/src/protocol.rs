use serde::{Deserialize, Serialize};

/// Successful `POST /users` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub token: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Query string of `GET /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLookupQuery {
    pub username: String,
}
