//! Built-in command handlers.

use std::sync::Arc;

use async_trait::async_trait;

use keydrop_core::error::AppError;
use keydrop_core::events::{Command, CommandEvent, CommandKind, CommandReply};
use keydrop_core::result::AppResult;
use keydrop_entity::view::ViewKind;

use super::context::HandlerContext;
use super::dispatcher::CommandHandler;
use crate::allocation::ClaimRequest;
use crate::view::{Broadcast, RefreshOutcome};

/// One handler per command kind.
pub fn defaults() -> Vec<Arc<dyn CommandHandler>> {
    vec![
        Arc::new(ClaimHandler),
        Arc::new(PublishBoardHandler::inventory()),
        Arc::new(PublishBoardHandler::leaderboard()),
        Arc::new(RestockHandler),
        Arc::new(RefreshViewsHandler),
        Arc::new(SetClaimLogHandler),
    ]
}

fn mismatch(expected: CommandKind, event: &CommandEvent) -> AppError {
    AppError::internal(format!(
        "Handler for '{expected}' received '{}'",
        event.command.kind()
    ))
}

/// Claims records and delivers them privately.
#[derive(Debug, Clone, Copy)]
pub struct ClaimHandler;

#[async_trait]
impl CommandHandler for ClaimHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::Claim
    }

    async fn handle(&self, event: &CommandEvent, ctx: &HandlerContext) -> AppResult<CommandReply> {
        let Command::Claim { service, count } = &event.command else {
            return Err(mismatch(self.kind(), event));
        };

        let request = ClaimRequest::new(service, *count, event.invoker.id)?
            .with_requester_tag(event.invoker.tag.clone());
        let settings = ctx.settings.load(event.community_id).await?;
        let allocation = ctx.engine.allocate(&settings, &request).await?;

        Ok(CommandReply::ephemeral(format!(
            "Sent you **{}** {} record(s) by private message.",
            allocation.count(),
            allocation.kind.label()
        )))
    }
}

/// Publishes a board to a channel and starts tracking it.
#[derive(Debug, Clone, Copy)]
pub struct PublishBoardHandler {
    command: CommandKind,
    view: ViewKind,
}

impl PublishBoardHandler {
    /// Handler for `set_stock`.
    pub fn inventory() -> Self {
        Self {
            command: CommandKind::SetStock,
            view: ViewKind::Inventory,
        }
    }

    /// Handler for `set_leaderboard`.
    pub fn leaderboard() -> Self {
        Self {
            command: CommandKind::SetLeaderboard,
            view: ViewKind::Leaderboard,
        }
    }
}

#[async_trait]
impl CommandHandler for PublishBoardHandler {
    fn kind(&self) -> CommandKind {
        self.command
    }

    async fn handle(&self, event: &CommandEvent, ctx: &HandlerContext) -> AppResult<CommandReply> {
        let channel = match (&event.command, self.view) {
            (Command::SetStock { channel }, ViewKind::Inventory)
            | (Command::SetLeaderboard { channel }, ViewKind::Leaderboard) => *channel,
            _ => return Err(mismatch(self.kind(), event)),
        };

        ctx.views
            .publish(event.community_id, self.view, channel, None)
            .await?;

        Ok(CommandReply::ephemeral(format!(
            "The {} board now lives in <#{channel}>.",
            self.view
        )))
    }
}

/// Refreshes the inventory board and pings everyone about a restock.
#[derive(Debug, Clone, Copy)]
pub struct RestockHandler;

#[async_trait]
impl CommandHandler for RestockHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::Restock
    }

    async fn handle(&self, event: &CommandEvent, ctx: &HandlerContext) -> AppResult<CommandReply> {
        let Command::Restock { service, note } = &event.command else {
            return Err(mismatch(self.kind(), event));
        };

        let broadcast = Broadcast::restock(
            ctx.views.restock_text(),
            service.as_deref(),
            note.as_deref(),
        );
        let outcome = ctx
            .views
            .refresh(event.community_id, ViewKind::Inventory, Some(&broadcast))
            .await?;

        let reply = match outcome {
            RefreshOutcome::NotConfigured => {
                "No inventory board is set up here yet. Use `set_stock` first."
            }
            RefreshOutcome::Edited | RefreshOutcome::Healed => {
                "Inventory updated and @everyone pinged."
            }
        };
        Ok(CommandReply::ephemeral(reply))
    }
}

/// Refreshes both boards on demand.
#[derive(Debug, Clone, Copy)]
pub struct RefreshViewsHandler;

#[async_trait]
impl CommandHandler for RefreshViewsHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::RefreshViews
    }

    async fn handle(&self, event: &CommandEvent, ctx: &HandlerContext) -> AppResult<CommandReply> {
        let summary = ctx.views.refresh_community(event.community_id).await;
        Ok(CommandReply::ephemeral(format!(
            "Boards refreshed: {} edited, {} republished, {} not set up, {} failed.",
            summary.edited, summary.healed, summary.not_configured, summary.failed
        )))
    }
}

/// Routes claim audit notifications to a channel.
#[derive(Debug, Clone, Copy)]
pub struct SetClaimLogHandler;

#[async_trait]
impl CommandHandler for SetClaimLogHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::SetClaimLog
    }

    async fn handle(&self, event: &CommandEvent, ctx: &HandlerContext) -> AppResult<CommandReply> {
        let Command::SetClaimLog { channel } = &event.command else {
            return Err(mismatch(self.kind(), event));
        };

        ctx.settings
            .set_claim_log_channel(event.community_id, Some(*channel))
            .await?;
        Ok(CommandReply::ephemeral(format!(
            "Claim log channel set to <#{channel}>."
        )))
    }
}
