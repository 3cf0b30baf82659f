use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: String,
    pub message: String,
}

impl Health {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { status: "OK".to_string(), message: message.into() }
    }
}
