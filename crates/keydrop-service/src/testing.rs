//! In-process fakes for the platform collaborators.
//!
//! Every fake records what it was asked to do and can be switched into a
//! failing mode, so tests can observe delivery order, board edits, and
//! swallowed notification errors without a network.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use keydrop_core::config::{AllocationConfig, ViewsConfig};
use keydrop_core::error::AppError;
use keydrop_core::result::AppResult;
use keydrop_core::traits::{
    ChannelPublisher, DeliveryChannel, DeliveryError, Directory, NotificationSink,
};
use keydrop_core::types::id::{ChannelId, MessageId, UserId};
use keydrop_core::types::message::OutboundMessage;
use keydrop_database::memory::{MemoryRecordStore, MemorySettingsStore, MemoryViewPointerStore};
use keydrop_database::store::RecordStore;

use crate::allocation::AllocationEngine;
use crate::dispatch::HandlerContext;
use crate::inventory::InventoryAggregator;
use crate::leaderboard::LeaderboardAggregator;
use crate::settings::SettingsService;
use crate::view::ViewStore;

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Records private deliveries.
#[derive(Debug, Default)]
pub struct RecordingDelivery {
    delivered: Mutex<Vec<(UserId, Vec<OutboundMessage>)>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingDelivery {
    /// A delivery channel that succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delivery fail as unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Sleep for `delay` before completing each delivery.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *guard(&self.delay) = delay;
    }

    /// Successful deliveries, in order.
    pub fn delivered(&self) -> Vec<(UserId, Vec<OutboundMessage>)> {
        guard(&self.delivered).clone()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingDelivery {
    async fn deliver(
        &self,
        requester: UserId,
        messages: &[OutboundMessage],
    ) -> Result<(), DeliveryError> {
        let delay = *guard(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Unreachable {
                requester,
                reason: "private messages are closed".to_string(),
            });
        }
        guard(&self.delivered).push((requester, messages.to_vec()));
        Ok(())
    }
}

/// Records notifications.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(ChannelId, OutboundMessage)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    /// A notifier that succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every notification fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Notifications that went out.
    pub fn sent(&self) -> Vec<(ChannelId, OutboundMessage)> {
        guard(&self.sent).clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, channel: ChannelId, message: &OutboundMessage) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::external("notification channel is gone"));
        }
        guard(&self.sent).push((channel, message.clone()));
        Ok(())
    }
}

/// A fake channel holding posted messages by id.
#[derive(Debug)]
pub struct RecordingPublisher {
    messages: Mutex<HashMap<MessageId, (ChannelId, OutboundMessage)>>,
    sent: Mutex<Vec<(ChannelId, MessageId, OutboundMessage)>>,
    edits: AtomicU64,
    next_id: AtomicU64,
    failing_edits: AtomicBool,
    failing_sends: AtomicBool,
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self {
            messages: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            edits: AtomicU64::new(0),
            next_id: AtomicU64::new(1000),
            failing_edits: AtomicBool::new(false),
            failing_sends: AtomicBool::new(false),
        }
    }
}

impl RecordingPublisher {
    /// An empty fake channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate someone deleting a posted message.
    pub fn delete(&self, message: MessageId) {
        guard(&self.messages).remove(&message);
    }

    /// Make edits fail even when the message exists.
    pub fn set_failing_edits(&self, failing: bool) {
        self.failing_edits.store(failing, Ordering::SeqCst);
    }

    /// Make sends fail.
    pub fn set_failing_sends(&self, failing: bool) {
        self.failing_sends.store(failing, Ordering::SeqCst);
    }

    /// Current content of a live message.
    pub fn content(&self, message: MessageId) -> Option<OutboundMessage> {
        guard(&self.messages).get(&message).map(|(_, m)| m.clone())
    }

    /// Every message ever sent, in order.
    pub fn sent(&self) -> Vec<(ChannelId, MessageId, OutboundMessage)> {
        guard(&self.sent).clone()
    }

    /// Number of successful edits.
    pub fn edit_count(&self) -> u64 {
        self.edits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelPublisher for RecordingPublisher {
    async fn send(&self, channel: ChannelId, message: &OutboundMessage) -> AppResult<MessageId> {
        if self.failing_sends.load(Ordering::SeqCst) {
            return Err(AppError::external("cannot post in channel"));
        }
        let id = MessageId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        guard(&self.messages).insert(id, (channel, message.clone()));
        guard(&self.sent).push((channel, id, message.clone()));
        Ok(id)
    }

    async fn exists(&self, channel: ChannelId, message: MessageId) -> AppResult<bool> {
        Ok(guard(&self.messages)
            .get(&message)
            .is_some_and(|(c, _)| *c == channel))
    }

    async fn edit(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &OutboundMessage,
    ) -> AppResult<()> {
        if self.failing_edits.load(Ordering::SeqCst) {
            return Err(AppError::external("edit rejected"));
        }
        let mut messages = guard(&self.messages);
        match messages.get_mut(&message) {
            Some((c, existing)) if *c == channel => {
                *existing = content.clone();
                self.edits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            _ => Err(AppError::not_found("Unknown message")),
        }
    }
}

/// A fixed name table.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    names: HashMap<UserId, String>,
    failing: HashSet<UserId>,
}

impl StaticDirectory {
    /// An empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a known user.
    pub fn with_name(mut self, user: UserId, name: impl Into<String>) -> Self {
        self.names.insert(user, name.into());
        self
    }

    /// Make lookups for `user` fail.
    pub fn with_failure(mut self, user: UserId) -> Self {
        self.failing.insert(user);
        self
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn resolve(&self, user: UserId) -> AppResult<Option<String>> {
        if self.failing.contains(&user) {
            return Err(AppError::external("directory lookup failed"));
        }
        Ok(self.names.get(&user).cloned())
    }
}

/// A fully wired service graph over in-memory stores and the fakes above.
#[derive(Debug, Clone)]
pub struct TestServices {
    pub records: MemoryRecordStore,
    pub pointers: MemoryViewPointerStore,
    pub delivery: Arc<RecordingDelivery>,
    pub notifier: Arc<RecordingNotifier>,
    pub publisher: Arc<RecordingPublisher>,
    pub context: HandlerContext,
}

impl TestServices {
    /// Wire everything with default configuration.
    pub fn new() -> Self {
        let records = MemoryRecordStore::new();
        let pointers = MemoryViewPointerStore::new();
        let delivery = Arc::new(RecordingDelivery::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let publisher = Arc::new(RecordingPublisher::new());

        let store: Arc<dyn RecordStore> = Arc::new(records.clone());
        let views = Arc::new(ViewStore::new(
            Arc::new(pointers.clone()),
            publisher.clone(),
            InventoryAggregator::new(store.clone()),
            LeaderboardAggregator::new(store.clone(), Arc::new(StaticDirectory::new()), 10),
            ViewsConfig::default(),
        ));
        let engine = Arc::new(AllocationEngine::new(
            store,
            delivery.clone(),
            notifier.clone(),
            views.clone(),
            AllocationConfig::default(),
        ));
        let settings = Arc::new(SettingsService::new(Arc::new(MemorySettingsStore::new())));

        Self {
            records,
            pointers,
            delivery,
            notifier,
            publisher,
            context: HandlerContext::new(engine, views, settings),
        }
    }
}

impl Default for TestServices {
    fn default() -> Self {
        Self::new()
    }
}
