//! Best-effort restoration of earlier turns for a session

use serde::Deserialize;

use crate::message::{ChatMessage, ConversationRole};
use crate::transport::{ChatTransport, HistoryResponse};

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    role: ConversationRole,
    content: String,
}

/// Fetch the session's earlier turns. Any failure yields an empty list.
pub async fn load_history(transport: &ChatTransport, session_id: &str) -> Vec<ChatMessage> {
    match transport.fetch_history(session_id).await {
        Ok(response) => restore_messages(response),
        Err(e) => {
            tracing::debug!(error = %e, "history unavailable");
            Vec::new()
        }
    }
}

/// Map backend records into transcript messages, oldest first.
///
/// Ids are scoped to the record's position; unreadable records are skipped.
pub fn restore_messages(response: HistoryResponse) -> Vec<ChatMessage> {
    let Some(records) = response.messages else {
        return Vec::new();
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| match serde_json::from_value::<HistoryRecord>(raw) {
            Ok(record) => Some(ChatMessage::restored(i, record.role, record.content)),
            Err(e) => {
                tracing::debug!(index = i, error = %e, "skipping history record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> HistoryResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn maps_records_in_order() {
        let restored = restore_messages(response(json!({
            "messages": [
                {"role": "user", "content": "A", "timestamp": "2024-01-01T00:00:00Z"},
                {"role": "assistant", "content": "B"}
            ],
            "session_id": "s"
        })));

        assert_eq!(
            restored,
            vec![
                ChatMessage::new("history-0", ConversationRole::User, "A"),
                ChatMessage::new("history-1", ConversationRole::Assistant, "B"),
            ]
        );
    }

    #[test]
    fn missing_messages_is_empty() {
        assert!(restore_messages(response(json!({"detail": "nope"}))).is_empty());
        assert!(restore_messages(response(json!({"messages": []}))).is_empty());
    }

    #[test]
    fn bad_records_are_skipped() {
        let restored = restore_messages(response(json!({
            "messages": [
                {"role": "system", "content": "ignored"},
                {"role": "user"},
                {"role": "assistant", "content": "kept"}
            ]
        })));

        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].id, "history-2");
        assert_eq!(restored[0].content, "kept");
    }
}
