//! Delivery seam between the router and the transport.

use async_trait::async_trait;

use arkive_common::Answer;

#[async_trait]
pub trait Outbound: Send + Sync {
    /// Render and send one answer, returning the ids of the messages it
    /// produced (a media group yields several, an edit yields the edited id).
    async fn deliver(&self, answer: &Answer) -> anyhow::Result<Vec<i32>>;

    /// Best-effort bulk delete of previously sent messages.
    async fn delete_messages(&self, chat_id: i64, message_ids: &[i32]) -> anyhow::Result<()>;
}
