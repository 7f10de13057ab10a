//! The assistant bridge: prompt composition, constrained-reply parsing, and
//! confirmed action application.
//!
//! One external call per turn. Any call or parse failure is absorbed into a
//! fixed fallback payload; from the caller's perspective this component never
//! fails, it only sometimes degrades to an unhelpful reply.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use packmate_core::{
    defaults, ActionKind, AssistantAction, AssistantReply, ChatTurn, CreateItemRequest,
    GenerationBackend, PackingItem, PackingItemRepository, Result, UserIdentity,
};

use crate::conversation::ConversationStore;

/// Build the fixed instruction prompt: current list state, capped history,
/// then the new user message. The JSON-only reply shape is a
/// prompt-engineering contract, not a protocol guarantee.
pub fn compose_prompt(
    items: &[PackingItem],
    history: &[ChatTurn],
    message: &str,
) -> String {
    let list = if items.is_empty() {
        "(empty)".to_string()
    } else {
        items
            .iter()
            .map(|i| format!("{} ({})", i.text, i.category))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut prompt = String::new();
    prompt.push_str(
        "You are a packing assistant for a trip planning app. \
         You help the user maintain their packing list.\n",
    );
    prompt.push_str(&format!("Current packing list: {}\n", list));

    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for turn in history {
            let role = match turn.role {
                packmate_core::ChatRole::User => "user",
                packmate_core::ChatRole::Model => "model",
            };
            prompt.push_str(&format!("{}: {}\n", role, turn.text));
        }
    }

    prompt.push_str(
        "\nRespond with JSON only, no prose outside it, in this shape:\n\
         {\"reply\": \"<your answer to the user>\", \"actions\": \
         [{\"type\": \"add\" or \"delete\", \"item\": \"<label>\", \
         \"category\": \"<optional>\", \"note\": \"<optional>\"}]}\n\
         Propose actions only when the user asks to change the list.\n",
    );
    prompt.push_str(&format!("User message: {}\n", message));
    prompt
}

/// Strip markdown code-fence markers from a raw model response.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    let rest = match rest.split_once('\n') {
        Some((_lang, body)) => body,
        None => rest,
    };
    rest.trim_end_matches('`').trim()
}

/// Parse a raw model response into the constrained reply shape.
pub fn parse_reply(raw: &str) -> Result<AssistantReply> {
    let cleaned = strip_code_fences(raw);
    let reply: AssistantReply = serde_json::from_str(cleaned)?;
    Ok(reply)
}

/// Translates chat messages into backend prompts and proposed list mutations.
pub struct AssistantBridge {
    backend: Arc<dyn GenerationBackend>,
    conversations: ConversationStore,
}

impl AssistantBridge {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            conversations: ConversationStore::new(),
        }
    }

    /// One chat turn for a (trip, user) thread.
    ///
    /// Composes the prompt from the current item list and the caller's own
    /// stored history, invokes the backend once, and parses the constrained
    /// reply. On success the user turn and the model's `reply` text (not its
    /// actions) are recorded and the history re-capped; on any failure the
    /// fixed fallback payload is returned and nothing is recorded.
    pub async fn chat(
        &self,
        trip_id: Uuid,
        user_id: &str,
        items: &[PackingItem],
        message: &str,
    ) -> AssistantReply {
        let mut history = self.conversations.get(trip_id, user_id).await;
        let prompt = compose_prompt(items, history.turns(), message);

        let parsed = match self.backend.generate(&prompt).await {
            Ok(raw) => parse_reply(&raw),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(reply) => {
                history.push(ChatTurn::user(message));
                history.push(ChatTurn::model(reply.reply.clone()));
                self.conversations.put(trip_id, user_id, history).await;

                debug!(
                    subsystem = "assistant",
                    component = "bridge",
                    op = "chat",
                    model = self.backend.model_name(),
                    action_count = reply.actions.len(),
                    "Assistant turn complete"
                );
                reply
            }
            Err(e) => {
                warn!(
                    subsystem = "assistant",
                    component = "bridge",
                    op = "chat",
                    model = self.backend.model_name(),
                    error = %e,
                    "Assistant turn degraded to fallback reply"
                );
                AssistantReply::fallback()
            }
        }
    }

    /// Drop the caller's stored history for a trip.
    pub async fn reset(&self, trip_id: Uuid, user_id: &str) {
        self.conversations.clear(trip_id, user_id).await;
    }
}

/// Replay a confirmed action list against the item store.
///
/// `add` creates an item attributed to the confirming user, with the display
/// name falling back to "AI Assistant" when none is known. `delete` is the
/// best-effort exact-text match (at most one item removed). Returns the
/// number of actions applied; per-action failures are logged and skipped.
/// The list is not re-validated against current state: if the list changed
/// since the suggestion, stale actions apply (or miss) as-is.
pub async fn apply_actions(
    items: &dyn PackingItemRepository,
    trip_id: Uuid,
    actions: &[AssistantAction],
    user: &UserIdentity,
) -> usize {
    let mut applied = 0;

    for action in actions {
        let outcome = match action.kind {
            ActionKind::Add => items
                .insert(CreateItemRequest {
                    trip_id,
                    text: action.item.clone(),
                    category: action.category.clone(),
                    note: action.note.clone(),
                    added_by_email: user.email.clone(),
                    added_by_name: Some(
                        user.name
                            .clone()
                            .unwrap_or_else(|| defaults::ASSISTANT_ATTRIBUTION.to_string()),
                    ),
                })
                .await
                .map(|_| true),
            ActionKind::Delete => items.delete_by_text(trip_id, &action.item).await,
        };

        match outcome {
            Ok(true) => applied += 1,
            Ok(false) => debug!(
                subsystem = "assistant",
                component = "bridge",
                op = "apply_actions",
                trip_id = %trip_id,
                item = %action.item,
                "Delete action matched nothing"
            ),
            Err(e) => warn!(
                subsystem = "assistant",
                component = "bridge",
                op = "apply_actions",
                trip_id = %trip_id,
                item = %action.item,
                error = %e,
                "Action failed, skipping"
            ),
        }
    }

    debug!(
        subsystem = "assistant",
        component = "bridge",
        op = "apply_actions",
        trip_id = %trip_id,
        action_count = applied,
        "Applied confirmed actions"
    );
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use async_trait::async_trait;
    use chrono::Utc;
    use packmate_core::{Error, Result};
    use std::sync::Mutex;

    fn item(text: &str, category: &str) -> PackingItem {
        PackingItem {
            id: Uuid::new_v4(),
            trip_id: Uuid::nil(),
            text: text.to_string(),
            category: category.to_string(),
            is_completed: false,
            note: None,
            added_by_email: None,
            added_by_name: None,
            created_at_utc: Some(Utc::now()),
            created_at_display: None,
        }
    }

    // ------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------

    #[test]
    fn test_strip_code_fences_plain_text_untouched() {
        assert_eq!(strip_code_fences(r#"{"reply": "ok"}"#), r#"{"reply": "ok"}"#);
    }

    #[test]
    fn test_strip_code_fences_with_language_tag() {
        let raw = "```json\n{\"reply\": \"ok\", \"actions\": []}\n```";
        assert_eq!(strip_code_fences(raw), "{\"reply\": \"ok\", \"actions\": []}");
    }

    #[test]
    fn test_strip_code_fences_bare() {
        let raw = "```\n{\"reply\": \"ok\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"reply\": \"ok\"}");
    }

    #[test]
    fn test_parse_reply_with_actions() {
        let raw = r#"```json
        {"reply": "Added sunscreen.", "actions": [{"type": "add", "item": "Sunscreen", "category": "Toiletries"}]}
        ```"#;
        let reply = parse_reply(raw).unwrap();
        assert_eq!(reply.reply, "Added sunscreen.");
        assert_eq!(reply.actions.len(), 1);
        assert_eq!(reply.actions[0].kind, ActionKind::Add);
    }

    #[test]
    fn test_parse_reply_rejects_prose() {
        assert!(parse_reply("I think you should pack light!").is_err());
    }

    // ------------------------------------------------------------------
    // Prompt composition
    // ------------------------------------------------------------------

    #[test]
    fn test_compose_prompt_embeds_list_and_message() {
        let items = vec![item("Socks", "Clothing"), item("Charger", "Electronics")];
        let prompt = compose_prompt(&items, &[], "what else?");
        assert!(prompt.contains("Socks (Clothing), Charger (Electronics)"));
        assert!(prompt.contains("User message: what else?"));
        assert!(!prompt.contains("Conversation so far"));
    }

    #[test]
    fn test_compose_prompt_includes_history() {
        let history = vec![ChatTurn::user("hi"), ChatTurn::model("hello")];
        let prompt = compose_prompt(&[], &history, "next");
        assert!(prompt.contains("user: hi"));
        assert!(prompt.contains("model: hello"));
        assert!(prompt.contains("(empty)"));
    }

    // ------------------------------------------------------------------
    // Chat turns
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_chat_success_records_reply_not_actions() {
        let backend = MockBackend::new().with_default_response(
            r#"{"reply": "Take a towel.", "actions": [{"type": "add", "item": "Towel"}]}"#,
        );
        let bridge = AssistantBridge::new(Arc::new(backend.clone()));
        let trip = Uuid::new_v4();

        let reply = bridge.chat(trip, "sub-1", &[], "what to bring?").await;
        assert_eq!(reply.reply, "Take a towel.");
        assert_eq!(reply.actions.len(), 1);

        // The next prompt carries the reply text but not the action JSON.
        bridge.chat(trip, "sub-1", &[], "anything else?").await;
        let second_prompt = backend.prompts()[1].clone();
        assert!(second_prompt.contains("user: what to bring?"));
        assert!(second_prompt.contains("model: Take a towel."));
        assert!(!second_prompt.contains("\"type\": \"add\""));
    }

    #[tokio::test]
    async fn test_collaborators_on_one_trip_get_isolated_threads() {
        let backend =
            MockBackend::new().with_default_response(r#"{"reply": "noted", "actions": []}"#);
        let bridge = AssistantBridge::new(Arc::new(backend.clone()));
        let trip = Uuid::new_v4();

        bridge
            .chat(trip, "sub-1", &[], "planning a surprise for Ravi")
            .await;
        bridge.chat(trip, "sub-2", &[], "what should I pack?").await;

        // The second caller's prompt must not carry the first caller's turn.
        let second_prompt = backend.prompts()[1].clone();
        assert!(!second_prompt.contains("surprise for Ravi"));
        assert!(!second_prompt.contains("Conversation so far"));
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_chat_backend_failure_yields_fallback() {
        let backend = MockBackend::new().failing();
        let bridge = AssistantBridge::new(Arc::new(backend.clone()));
        let reply = bridge.chat(Uuid::new_v4(), "sub-1", &[], "help").await;
        assert_eq!(reply, AssistantReply::fallback());
        // Exactly one external call per turn, even when it degrades.
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_chat_unparseable_reply_yields_fallback_and_records_nothing() {
        let backend = MockBackend::new()
            .with_response("Sure! Just pack everything you own.")
            .with_default_response(r#"{"reply": "ok", "actions": []}"#);
        let bridge = AssistantBridge::new(Arc::new(backend.clone()));
        let trip = Uuid::new_v4();

        let reply = bridge.chat(trip, "sub-1", &[], "first").await;
        assert_eq!(reply, AssistantReply::fallback());

        // The degraded turn left no trace in history.
        bridge.chat(trip, "sub-1", &[], "second").await;
        assert!(!backend.prompts()[1].contains("first"));
    }

    #[tokio::test]
    async fn test_chat_history_never_exceeds_cap() {
        let backend =
            MockBackend::new().with_default_response(r#"{"reply": "noted", "actions": []}"#);
        let bridge = AssistantBridge::new(Arc::new(backend.clone()));
        let trip = Uuid::new_v4();

        for i in 0..25 {
            bridge.chat(trip, "sub-1", &[], &format!("turn {}", i)).await;
        }

        let history = bridge.conversations.get(trip, "sub-1").await;
        assert_eq!(history.len(), defaults::HISTORY_CAP);
        // Oldest dropped first: 25 user turns + 25 replies = 50 pushes,
        // so the window starts at turn 15's user message.
        assert_eq!(history.turns()[0].text, "turn 15");
    }

    // ------------------------------------------------------------------
    // Confirmed actions
    // ------------------------------------------------------------------

    /// Minimal in-memory item store for exercising the confirm step.
    #[derive(Default)]
    struct InMemoryItems {
        items: Mutex<Vec<PackingItem>>,
    }

    #[async_trait]
    impl PackingItemRepository for InMemoryItems {
        async fn list(&self, trip_id: Uuid) -> Result<Vec<PackingItem>> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|i| i.trip_id == trip_id)
                .cloned()
                .collect())
        }

        async fn insert(&self, req: CreateItemRequest) -> Result<Uuid> {
            let id = Uuid::new_v4();
            self.items.lock().unwrap().push(PackingItem {
                id,
                trip_id: req.trip_id,
                text: req.text,
                category: req.category.unwrap_or_else(|| "General".to_string()),
                is_completed: false,
                note: req.note,
                added_by_email: req.added_by_email,
                added_by_name: req.added_by_name,
                created_at_utc: Some(Utc::now()),
                created_at_display: None,
            });
            Ok(id)
        }

        async fn insert_bulk(
            &self,
            _trip_id: Uuid,
            _block: &str,
            _category: Option<&str>,
            _added_by_email: Option<&str>,
            _added_by_name: Option<&str>,
        ) -> Result<Vec<Uuid>> {
            unimplemented!("not needed for bridge tests")
        }

        async fn toggle(&self, _id: Uuid) -> Result<()> {
            unimplemented!("not needed for bridge tests")
        }

        async fn delete(&self, id: Uuid) -> Result<()> {
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|i| i.id != id);
            if items.len() == before {
                return Err(Error::ItemNotFound(id));
            }
            Ok(())
        }

        async fn delete_by_text(&self, trip_id: Uuid, text: &str) -> Result<bool> {
            let mut items = self.items.lock().unwrap();
            match items
                .iter()
                .position(|i| i.trip_id == trip_id && i.text == text)
            {
                Some(pos) => {
                    items.remove(pos);
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    fn user_without_name() -> UserIdentity {
        UserIdentity {
            id: "sub-1".to_string(),
            email: Some("me@example.com".to_string()),
            name: None,
        }
    }

    #[tokio::test]
    async fn test_apply_empty_action_list_is_zero() {
        let store = InMemoryItems::default();
        let applied = apply_actions(&store, Uuid::new_v4(), &[], &user_without_name()).await;
        assert_eq!(applied, 0);
    }

    #[tokio::test]
    async fn test_apply_add_uses_assistant_attribution_fallback() {
        let store = InMemoryItems::default();
        let trip_id = Uuid::new_v4();
        let actions = vec![AssistantAction {
            kind: ActionKind::Add,
            item: "Power bank".to_string(),
            category: Some("Electronics".to_string()),
            note: None,
        }];

        let applied = apply_actions(&store, trip_id, &actions, &user_without_name()).await;
        assert_eq!(applied, 1);

        let items = store.list(trip_id).await.unwrap();
        assert_eq!(items[0].added_by_name.as_deref(), Some("AI Assistant"));
        assert_eq!(items[0].added_by_email.as_deref(), Some("me@example.com"));
        assert_eq!(items[0].category, "Electronics");
    }

    #[tokio::test]
    async fn test_apply_delete_counts_only_matches() {
        let store = InMemoryItems::default();
        let trip_id = Uuid::new_v4();
        store
            .insert(CreateItemRequest {
                trip_id,
                text: "Towel".to_string(),
                category: None,
                note: None,
                added_by_email: None,
                added_by_name: None,
            })
            .await
            .unwrap();

        let actions = vec![
            AssistantAction {
                kind: ActionKind::Delete,
                item: "Towel".to_string(),
                category: None,
                note: None,
            },
            AssistantAction {
                kind: ActionKind::Delete,
                item: "Nonexistent".to_string(),
                category: None,
                note: None,
            },
        ];

        let applied = apply_actions(&store, trip_id, &actions, &user_without_name()).await;
        assert_eq!(applied, 1);
        assert!(store.list(trip_id).await.unwrap().is_empty());
    }
}
