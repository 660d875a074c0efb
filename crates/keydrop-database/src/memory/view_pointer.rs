//! In-memory view pointer table.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use keydrop_core::error::AppError;
use keydrop_core::result::AppResult;
use keydrop_core::types::id::{ChannelId, CommunityId, MessageId};
use keydrop_entity::view::{ViewKind, ViewPointer};

use super::guard;
use crate::store::ViewPointerStore;

/// In-memory [`ViewPointerStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryViewPointerStore {
    pointers: Arc<Mutex<HashMap<(CommunityId, ViewKind), ViewPointer>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryViewPointerStore {
    /// Create an empty pointer table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a database error until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored pointers.
    pub fn len(&self) -> usize {
        guard(&self.pointers).len()
    }

    /// Whether no pointer has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::database("View pointer store is unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ViewPointerStore for MemoryViewPointerStore {
    async fn find(
        &self,
        community: CommunityId,
        kind: ViewKind,
    ) -> AppResult<Option<ViewPointer>> {
        self.check_available()?;
        Ok(guard(&self.pointers).get(&(community, kind)).cloned())
    }

    async fn upsert(
        &self,
        community: CommunityId,
        kind: ViewKind,
        channel: ChannelId,
        message: MessageId,
    ) -> AppResult<ViewPointer> {
        self.check_available()?;
        let pointer = ViewPointer {
            community_id: community,
            view_kind: kind,
            channel_id: channel,
            message_id: message,
            updated_at: Utc::now(),
        };
        guard(&self.pointers).insert((community, kind), pointer.clone());
        Ok(pointer)
    }

    async fn communities(&self) -> AppResult<Vec<CommunityId>> {
        self.check_available()?;
        let communities: BTreeSet<CommunityId> =
            guard(&self.pointers).keys().map(|(c, _)| *c).collect();
        Ok(communities.into_iter().collect())
    }
}
