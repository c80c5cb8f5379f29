use serde::Serialize;
use serde_with::skip_serializing_none;

/// Response envelope shared by every endpoint of the API.
///
/// The frontend contract is `{"success": bool, "message": ..., "data": ...}`;
/// `message` carries human-readable context on failure and is omitted on
/// plain success responses.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(data: T, message: impl ToString) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            data: Some(data),
        }
    }

    pub fn error(message: impl ToString) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
            data: None,
        }
    }
}
