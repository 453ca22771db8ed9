use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeleteAttachmentResponse {
    pub message: String,
    pub id: i64,
    pub matter_id: i64,
    pub has_attachments: bool,
}
