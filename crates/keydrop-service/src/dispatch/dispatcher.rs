//! Command dispatcher: routes command events to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use keydrop_core::config::AccessConfig;
use keydrop_core::error::{AppError, ErrorKind};
use keydrop_core::events::{CommandEvent, CommandKind, CommandReply};
use keydrop_core::result::AppResult;

use super::context::HandlerContext;
use super::handlers;

/// Trait for command handler implementations.
#[async_trait]
pub trait CommandHandler: Send + Sync + std::fmt::Debug {
    /// The command this handler processes.
    fn kind(&self) -> CommandKind;

    /// Handle an event that already passed the dispatcher's guards.
    async fn handle(&self, event: &CommandEvent, ctx: &HandlerContext) -> AppResult<CommandReply>;
}

/// Dispatches command events to the handler registered for their kind.
#[derive(Debug)]
pub struct CommandDispatcher {
    handlers: HashMap<CommandKind, Arc<dyn CommandHandler>>,
    context: HandlerContext,
    access: AccessConfig,
}

impl CommandDispatcher {
    /// Create a dispatcher with no handlers.
    pub fn new(context: HandlerContext, access: AccessConfig) -> Self {
        Self {
            handlers: HashMap::new(),
            context,
            access,
        }
    }

    /// Create a dispatcher with a handler for every command.
    pub fn with_default_handlers(context: HandlerContext, access: AccessConfig) -> Self {
        let mut dispatcher = Self::new(context, access);
        for handler in handlers::defaults() {
            dispatcher.register(handler);
        }
        dispatcher
    }

    /// Register a handler, replacing any previous handler for its kind.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        let kind = handler.kind();
        info!("Registered command handler for '{}'", kind);
        self.handlers.insert(kind, handler);
    }

    /// Check if a handler is registered for a command kind.
    pub fn has_handler(&self, kind: CommandKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Guard, route, and run a command.
    ///
    /// Outcomes the invoker should see (rejections, empty inventory, closed
    /// private messages, bad input) come back as ephemeral replies. Only
    /// infrastructure failures are returned as errors.
    pub async fn dispatch(&self, event: &CommandEvent) -> AppResult<CommandReply> {
        let kind = event.command.kind();

        if let Err(rejection) = self.guard(event) {
            warn!(
                community = %event.community_id,
                invoker = %event.invoker.id,
                command = %kind,
                reason = %rejection.message,
                "Command rejected"
            );
            return Ok(CommandReply::ephemeral(rejection.message));
        }

        let handler = self.handlers.get(&kind).ok_or_else(|| {
            AppError::internal(format!("No handler registered for command '{kind}'"))
        })?;

        info!(
            community = %event.community_id,
            invoker = %event.invoker.id,
            command = %kind,
            "Dispatching command"
        );

        match handler.handle(event, &self.context).await {
            Ok(reply) => Ok(reply),
            Err(e) if is_user_facing(e.kind) => Ok(CommandReply::ephemeral(e.message)),
            Err(e) => Err(e),
        }
    }

    fn guard(&self, event: &CommandEvent) -> AppResult<()> {
        if !self.access.allows(event.community_id) {
            return Err(AppError::authorization(
                "This command is only allowed in authorized communities.",
            ));
        }
        if !event.invoker.is_admin {
            return Err(AppError::authorization(
                "You need **Administrator** permission to use this command.",
            ));
        }
        Ok(())
    }
}

fn is_user_facing(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::Validation
            | ErrorKind::EmptyInventory
            | ErrorKind::Delivery
            | ErrorKind::Authorization
            | ErrorKind::NotFound
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use keydrop_core::events::{Command, Invoker};
    use keydrop_core::types::id::{ChannelId, CommunityId, UserId};
    use keydrop_database::store::{RecordStore, ViewPointerStore};
    use keydrop_entity::record::RecordKind;
    use keydrop_entity::record::model::NewRecord;
    use keydrop_entity::view::ViewKind;

    use crate::testing::TestServices;

    const COMMUNITY: CommunityId = CommunityId::new(1405633884598829227);

    fn event(command: Command, is_admin: bool) -> CommandEvent {
        CommandEvent {
            community_id: COMMUNITY,
            channel_id: ChannelId::new(1),
            invoker: Invoker {
                id: UserId::new(77),
                tag: "alice".to_string(),
                is_admin,
            },
            command,
            received_at: Utc::now(),
        }
    }

    fn dispatcher(services: &TestServices, access: AccessConfig) -> CommandDispatcher {
        CommandDispatcher::with_default_handlers(services.context.clone(), access)
    }

    #[test]
    fn test_every_command_has_a_handler() {
        let services = TestServices::new();
        let dispatcher = dispatcher(&services, AccessConfig::default());
        for kind in CommandKind::ALL {
            assert!(dispatcher.has_handler(kind), "missing handler for {kind}");
        }
    }

    #[tokio::test]
    async fn test_foreign_community_is_rejected() {
        let services = TestServices::new();
        let access = AccessConfig {
            allowed_communities: vec![CommunityId::new(1)],
            ..AccessConfig::default()
        };
        let reply = dispatcher(&services, access)
            .dispatch(&event(Command::RefreshViews, true))
            .await
            .unwrap();
        assert!(reply.ephemeral);
        assert!(reply.content.contains("authorized communities"));
    }

    #[tokio::test]
    async fn test_non_admin_is_rejected_before_claiming() {
        let services = TestServices::new();
        services
            .records
            .seed(&[NewRecord::login(RecordKind::Steam, "s1", "p")])
            .await
            .unwrap();

        let claim = Command::Claim {
            service: "steam".to_string(),
            count: None,
        };
        let reply = dispatcher(&services, AccessConfig::default())
            .dispatch(&event(claim, false))
            .await
            .unwrap();

        assert!(reply.content.contains("Administrator"));
        assert!(services.delivery.delivered().is_empty());
        assert!(services.records.records().iter().all(|r| !r.is_used));
    }

    #[tokio::test]
    async fn test_claim_then_empty_inventory_reply() {
        let services = TestServices::new();
        services
            .records
            .seed(&[NewRecord::login(RecordKind::Steam, "s1", "p")])
            .await
            .unwrap();
        let dispatcher = dispatcher(&services, AccessConfig::default());
        let claim = || Command::Claim {
            service: "steam".to_string(),
            count: Some(5),
        };

        let first = dispatcher.dispatch(&event(claim(), true)).await.unwrap();
        assert_eq!(
            first.content,
            "Sent you **1** Steam record(s) by private message."
        );

        let second = dispatcher.dispatch(&event(claim(), true)).await.unwrap();
        assert_eq!(second.content, "No unused **Steam** records left.");
    }

    #[tokio::test]
    async fn test_unknown_kind_is_a_reply_not_an_error() {
        let services = TestServices::new();
        let claim = Command::Claim {
            service: "origin".to_string(),
            count: None,
        };
        let reply = dispatcher(&services, AccessConfig::default())
            .dispatch(&event(claim, true))
            .await
            .unwrap();
        assert!(reply.content.contains("unknown record kind"));
    }

    #[tokio::test]
    async fn test_storage_failure_is_an_error() {
        let services = TestServices::new();
        services.records.set_unavailable(true);
        let claim = Command::Claim {
            service: "steam".to_string(),
            count: None,
        };
        let err = dispatcher(&services, AccessConfig::default())
            .dispatch(&event(claim, true))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Database);
    }

    #[tokio::test]
    async fn test_set_stock_then_restock() {
        let services = TestServices::new();
        let dispatcher = dispatcher(&services, AccessConfig::default());

        let restock = || Command::Restock {
            service: Some("fivem".to_string()),
            note: Some("fresh batch".to_string()),
        };
        let early = dispatcher.dispatch(&event(restock(), true)).await.unwrap();
        assert!(early.content.contains("set_stock"));

        dispatcher
            .dispatch(&event(
                Command::SetStock {
                    channel: ChannelId::new(55),
                },
                true,
            ))
            .await
            .unwrap();
        let pointer = services
            .pointers
            .find(COMMUNITY, ViewKind::Inventory)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pointer.channel_id, ChannelId::new(55));

        let reply = dispatcher.dispatch(&event(restock(), true)).await.unwrap();
        assert_eq!(reply.content, "Inventory updated and @everyone pinged.");
        let sent = services.publisher.sent();
        assert_eq!(
            sent.last().unwrap().2.content.as_deref(),
            Some("@everyone Restock is live! **FiveM** — fresh batch")
        );
    }

    #[tokio::test]
    async fn test_set_claim_log_routes_audit() {
        let services = TestServices::new();
        services
            .records
            .seed(&[NewRecord::login(RecordKind::Discord, "d1", "p")])
            .await
            .unwrap();
        let dispatcher = dispatcher(&services, AccessConfig::default());

        dispatcher
            .dispatch(&event(
                Command::SetClaimLog {
                    channel: ChannelId::new(99),
                },
                true,
            ))
            .await
            .unwrap();
        dispatcher
            .dispatch(&event(
                Command::Claim {
                    service: "discord".to_string(),
                    count: None,
                },
                true,
            ))
            .await
            .unwrap();

        let sent = services.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChannelId::new(99));
        assert_eq!(sent[0].1.embeds[0].fields[0].value, "alice (77)");
    }
}
