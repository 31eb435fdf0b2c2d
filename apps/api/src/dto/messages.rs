use serde::{Deserialize, Serialize};
use ts_rs::TS;
use veritrail_application::MessageRecord;

/// API representation of a threaded message.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/message-response.ts"
)]
pub struct MessageResponse {
    /// Stable message identifier.
    pub message_id: String,
    /// Kind of record the thread is attached to.
    pub resource_kind: String,
    /// Identifier of the record the thread is attached to.
    pub resource_id: String,
    /// Parent message for replies.
    pub parent_id: Option<String>,
    /// Author subject.
    pub author_subject: String,
    /// Message body text.
    pub body: String,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
}

impl From<MessageRecord> for MessageResponse {
    fn from(value: MessageRecord) -> Self {
        Self {
            message_id: value.message_id,
            resource_kind: value.resource_kind,
            resource_id: value.resource_id,
            parent_id: value.parent_id,
            author_subject: value.author_subject,
            body: value.body,
            created_at: value.created_at,
        }
    }
}

/// Incoming payload for posting a message or reply.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/post-message-request.ts"
)]
pub struct PostMessageRequest {
    /// Parent message for replies.
    pub parent_id: Option<String>,
    /// Message body text.
    pub body: String,
}
