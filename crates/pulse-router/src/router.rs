//! Chat router.

use crate::{Operation, Role, RoleCell, RouterError, RouterResult};
use pulse_connection::AckResponse;
use pulse_outbox::{DeliveryReceipt, Emitter, ItemId, OutboundRequest};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Picks event names by role and hands requests to the outbox.
///
/// Clones share the emitter and the role.
#[derive(Clone, Debug)]
pub struct ChatRouter {
    emitter: Emitter,
    role: Arc<RoleCell>,
}

impl ChatRouter {
    /// Router with no role set.
    pub fn new(emitter: Emitter) -> Self {
        Self {
            emitter,
            role: Arc::new(RoleCell::default()),
        }
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn role(&self) -> Option<Role> {
        self.role.get()
    }

    /// Set the session role. Affects subsequent requests only.
    pub fn set_role(&self, role: Role) {
        self.role.set(role);
    }

    /// Forget the role, as on logout.
    pub fn clear_role(&self) {
        self.role.clear();
    }

    /// Resolve the event name, rejecting operations the current role may not perform.
    fn route(&self, operation: Operation) -> RouterResult<String> {
        let role = self.role.get();
        if !operation.permits(role) {
            warn!(operation = %operation, role = ?role, "Operation requires a staff role");
            return Err(RouterError::Unauthorized { operation, role });
        }

        let event = operation.event_name(role);
        debug!(operation = %operation, event = %event, "Routed request");
        Ok(event)
    }

    /// Single attempt, resolved with the server's answer.
    async fn request(&self, operation: Operation, payload: Value) -> RouterResult<AckResponse> {
        let event = self.route(operation)?;
        Ok(self.emitter.enqueue_awaitable(&event, payload).await?)
    }

    /// Best-effort signal; never acknowledged or retried.
    fn signal(&self, operation: Operation, payload: Value) -> RouterResult<()> {
        let event = self.route(operation)?;
        self.emitter.emit_volatile(&event, payload)?;
        Ok(())
    }

    pub async fn send_message(&self, payload: Value) -> RouterResult<AckResponse> {
        self.request(Operation::SendMessage, payload).await
    }

    /// Queue a direct message for at-least-once delivery.
    ///
    /// Unlike [`send_message`](Self::send_message) this waits out a
    /// disconnection and retries with backoff.
    pub fn send_message_reliable(&self, payload: Value) -> RouterResult<(ItemId, DeliveryReceipt)> {
        let event = self.route(Operation::SendMessage)?;
        Ok(self
            .emitter
            .enqueue_tracked(OutboundRequest::new(event, payload)))
    }

    pub async fn get_messages(&self, payload: Value) -> RouterResult<AckResponse> {
        self.request(Operation::GetMessages, payload).await
    }

    pub async fn get_contact_list(&self, payload: Value) -> RouterResult<AckResponse> {
        self.request(Operation::GetContactList, payload).await
    }

    pub async fn mark_read(&self, payload: Value) -> RouterResult<AckResponse> {
        self.request(Operation::MarkRead, payload).await
    }

    pub fn send_typing(&self, payload: Value) -> RouterResult<()> {
        self.signal(Operation::Typing, payload)
    }

    pub async fn send_group_message(&self, payload: Value) -> RouterResult<AckResponse> {
        self.request(Operation::SendGroupMessage, payload).await
    }

    pub async fn get_groups(&self, payload: Value) -> RouterResult<AckResponse> {
        self.request(Operation::GetGroups, payload).await
    }

    pub async fn mark_group_read(&self, payload: Value) -> RouterResult<AckResponse> {
        self.request(Operation::MarkGroupRead, payload).await
    }

    pub fn send_group_typing(&self, payload: Value) -> RouterResult<()> {
        self.signal(Operation::GroupTyping, payload)
    }

    // Group management, staff only

    pub async fn create_group(&self, payload: Value) -> RouterResult<AckResponse> {
        self.request(Operation::CreateGroup, payload).await
    }

    pub async fn add_group_member(&self, payload: Value) -> RouterResult<AckResponse> {
        self.request(Operation::AddGroupMember, payload).await
    }

    pub async fn remove_group_member(&self, payload: Value) -> RouterResult<AckResponse> {
        self.request(Operation::RemoveGroupMember, payload).await
    }

    pub async fn update_group(&self, payload: Value) -> RouterResult<AckResponse> {
        self.request(Operation::UpdateGroup, payload).await
    }

    pub async fn delete_group(&self, payload: Value) -> RouterResult<AckResponse> {
        self.request(Operation::DeleteGroup, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_connection::{AckBehavior, MemoryConnection};
    use pulse_outbox::OutboxError;
    use serde_json::json;
    use std::sync::Arc;

    fn router(conn: &Arc<MemoryConnection>) -> ChatRouter {
        ChatRouter::new(Emitter::with_defaults(conn.clone()))
    }

    #[tokio::test]
    async fn test_trainer_send_message_uses_staff_event() {
        let conn = MemoryConnection::shared();
        let router = router(&conn);
        router.set_role(Role::Trainer);

        router
            .send_message(json!({"recipientId": "u-2", "content": "Great session"}))
            .await
            .unwrap();

        assert_eq!(conn.emitted_events(), vec!["trainer:send-message"]);
        assert_eq!(conn.emit_count("client:send-message"), 0);
    }

    #[tokio::test]
    async fn test_client_and_unset_use_client_events() {
        let conn = MemoryConnection::shared();
        let router = router(&conn);

        router.get_contact_list(json!({})).await.unwrap();
        router.set_role(Role::Client);
        router.mark_read(json!({"conversationId": "c-1"})).await.unwrap();

        assert_eq!(
            conn.emitted_events(),
            vec!["client:get-contact-list", "client:mark-read"]
        );
    }

    #[tokio::test]
    async fn test_role_change_applies_to_later_requests() {
        let conn = MemoryConnection::shared();
        let router = router(&conn);

        router.set_role(Role::Client);
        router.get_messages(json!({})).await.unwrap();
        router.set_role(Role::Admin);
        router.get_messages(json!({})).await.unwrap();
        router.clear_role();
        router.get_messages(json!({})).await.unwrap();

        assert_eq!(
            conn.emitted_events(),
            vec![
                "client:get-messages",
                "trainer:get-messages",
                "client:get-messages"
            ]
        );
    }

    #[tokio::test]
    async fn test_group_management_unset_role_is_rejected_before_emit() {
        let conn = MemoryConnection::shared();
        let router = router(&conn);

        let err = router
            .add_group_member(json!({"groupId": "g-1", "userId": "u-3"}))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RouterError::Unauthorized {
                operation: Operation::AddGroupMember,
                role: None
            }
        ));
        assert_eq!(conn.total_emits(), 0);
        assert!(router.emitter().is_empty());
    }

    #[tokio::test]
    async fn test_group_management_client_is_rejected() {
        let conn = MemoryConnection::shared();
        let router = router(&conn);
        router.set_role(Role::Client);

        let results = [
            router.create_group(json!({"name": "Morning crew"})).await,
            router.remove_group_member(json!({})).await,
            router.update_group(json!({})).await,
            router.delete_group(json!({})).await,
        ];

        assert!(results
            .iter()
            .all(|r| matches!(r, Err(RouterError::Unauthorized { .. }))));
        assert_eq!(conn.total_emits(), 0);
    }

    #[tokio::test]
    async fn test_group_management_staff_is_sent() {
        let conn = MemoryConnection::shared();
        conn.respond_with(AckBehavior::success(json!({"groupId": "g-7"})));
        let router = router(&conn);
        router.set_role(Role::Manager);

        let response = router
            .create_group(json!({"name": "Morning crew"}))
            .await
            .unwrap();

        assert_eq!(response.data, Some(json!({"groupId": "g-7"})));
        assert_eq!(conn.emitted_events(), vec!["trainer:create-group"]);
    }

    #[tokio::test]
    async fn test_server_rejection_surfaces_reason() {
        let conn = MemoryConnection::shared();
        conn.respond_with(AckBehavior::rejected("Group not found"));
        let router = router(&conn);

        let err = router
            .send_group_message(json!({"groupId": "g-404"}))
            .await
            .unwrap_err();

        assert_eq!(err.server_reason().as_deref(), Some("Group not found"));
        assert_eq!(conn.total_emits(), 1);
    }

    #[tokio::test]
    async fn test_request_while_disconnected_fails_fast() {
        let conn = Arc::new(MemoryConnection::disconnected());
        let router = router(&conn);

        let err = router.get_groups(json!({})).await.unwrap_err();
        assert!(matches!(err, RouterError::Outbox(OutboxError::NotConnected)));
        assert!(router.emitter().is_empty());
    }

    #[tokio::test]
    async fn test_typing_is_fire_and_forget() {
        let conn = MemoryConnection::shared();
        conn.respond_with(AckBehavior::Fail("socket closed".into()));
        let router = router(&conn);
        router.set_role(Role::Trainer);

        router.send_typing(json!({"isTyping": true})).unwrap_err();
        router.send_group_typing(json!({"groupId": "g-1"})).unwrap_err();

        let emitted = conn.emitted();
        assert_eq!(emitted.len(), 2);
        assert!(emitted.iter().all(|e| !e.with_ack));
        assert_eq!(emitted[0].event, "trainer:typing");
        assert_eq!(emitted[1].event, "trainer:group-typing");
        assert!(router.emitter().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_path_follows_operation() {
        let conn = MemoryConnection::shared();
        let router = router(&conn);

        router.mark_read(json!({"conversationId": "c-1"})).await.unwrap();
        router.send_typing(json!({"isTyping": true})).unwrap();
        router.get_groups(json!({})).await.unwrap();
        router.send_group_typing(json!({"groupId": "g-1"})).unwrap();

        let expected = [
            Operation::MarkRead,
            Operation::Typing,
            Operation::GetGroups,
            Operation::GroupTyping,
        ];
        let emitted = conn.emitted();
        assert_eq!(emitted.len(), expected.len());
        for (event, operation) in emitted.iter().zip(expected) {
            assert_eq!(event.event, operation.event_name(None));
            assert_eq!(event.with_ack, !operation.is_volatile());
        }
    }

    #[tokio::test]
    async fn test_mark_group_read_routes() {
        let conn = MemoryConnection::shared();
        let router = router(&conn);
        router.mark_group_read(json!({"groupId": "g-1"})).await.unwrap();
        assert_eq!(conn.emitted_events(), vec!["client:mark-group-read"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reliable_send_waits_for_connection() {
        let conn = Arc::new(MemoryConnection::disconnected());
        let router = router(&conn);
        router.set_role(Role::Trainer);

        let (id, receipt) = router
            .send_message_reliable(json!({"content": "See you at 6"}))
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(router.emitter().get_queue_status().items[0].id, id);

        // Role changes do not rewrite queued requests
        router.set_role(Role::Client);
        conn.set_connected(true);
        router.emitter().trigger();

        assert!(receipt.await.is_ok());
        assert_eq!(conn.emitted_events(), vec!["trainer:send-message"]);
    }
}
