pub mod health;
pub use self::health::health;

pub mod logout;
pub use self::logout::logout;

pub mod session;
pub use self::session::session;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON body used for plain messages and errors.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
