//! Current-avatar handle shared between the frame loop and model loads.
//!
//! Retarget and calibrate passes hold the write guard for the whole pass, so a
//! replacement can never land in the middle of one. Loads are ticketed: only
//! the most recently started load may attach its avatar.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::error::{AvatarError, VtPuppetError};

/// Proof that a load was started; stale once a newer load begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug)]
pub struct AvatarSlot<A> {
    current: RwLock<Option<A>>,
    latest_ticket: AtomicU64,
}

impl<A> Default for AvatarSlot<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> AvatarSlot<A> {
    /// An empty slot
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            latest_ticket: AtomicU64::new(0),
        }
    }

    pub fn with_avatar(avatar: A) -> Self {
        Self {
            current: RwLock::new(Some(avatar)),
            latest_ticket: AtomicU64::new(0),
        }
    }

    /// Start a load, superseding any load still in flight.
    pub fn begin_load(&self) -> LoadTicket {
        LoadTicket(self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Attach `avatar` if `ticket` is still the newest load.
    ///
    /// The previous avatar is dropped before the new one is stored, while the
    /// write guard is held.
    pub async fn replace(&self, ticket: LoadTicket, avatar: A) -> Result<(), VtPuppetError> {
        let mut current = self.current.write().await;

        let latest = self.latest_ticket.load(Ordering::SeqCst);
        if ticket.0 != latest {
            tracing::debug!("Discarding superseded load {} (latest {})", ticket.0, latest);
            return Err(AvatarError::Superseded.into());
        }

        if let Some(previous) = current.take() {
            drop(previous);
            tracing::debug!("Released previous avatar");
        }
        *current = Some(avatar);

        Ok(())
    }

    /// Run `loader` under a fresh ticket and attach its result.
    pub async fn load_with<F>(&self, loader: F) -> Result<(), VtPuppetError>
    where
        F: Future<Output = Result<A, VtPuppetError>>,
    {
        let ticket = self.begin_load();
        let avatar = loader.await?;
        self.replace(ticket, avatar).await
    }

    /// Exclusive access to the current avatar for one pass.
    pub async fn with_current<R>(&self, f: impl FnOnce(&mut A) -> R) -> Option<R> {
        let mut current = self.current.write().await;
        current.as_mut().map(f)
    }

    /// Shared access to the current avatar.
    pub async fn inspect<R>(&self, f: impl FnOnce(&A) -> R) -> Option<R> {
        let current = self.current.read().await;
        current.as_ref().map(f)
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records attach/drop order in a shared log.
    struct Tracked {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Tracked {
        fn new(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Self {
            log.lock().unwrap().push(format!("create {}", name));
            Self {
                name,
                log: log.clone(),
            }
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.log.lock().unwrap().push(format!("drop {}", self.name));
        }
    }

    #[tokio::test]
    async fn test_empty_slot() {
        let slot: AvatarSlot<u32> = AvatarSlot::new();
        assert!(!slot.is_loaded().await);
        assert_eq!(slot.with_current(|a| *a).await, None);
    }

    #[tokio::test]
    async fn test_replace_attaches() {
        let slot = AvatarSlot::new();
        let ticket = slot.begin_load();
        slot.replace(ticket, 7u32).await.unwrap();
        assert_eq!(slot.inspect(|a| *a).await, Some(7));

        slot.with_current(|a| *a += 1).await;
        assert_eq!(slot.inspect(|a| *a).await, Some(8));
    }

    #[tokio::test]
    async fn test_superseded_load_is_rejected() {
        let slot = AvatarSlot::with_avatar(0u32);
        let first = slot.begin_load();
        let second = slot.begin_load();

        slot.replace(second, 2).await.unwrap();
        let err = slot.replace(first, 1).await.unwrap_err();

        assert!(matches!(
            err,
            VtPuppetError::Avatar(AvatarError::Superseded)
        ));
        assert_eq!(slot.inspect(|a| *a).await, Some(2));
    }

    #[tokio::test]
    async fn test_older_load_finishing_first_is_still_superseded() {
        let slot = AvatarSlot::new();
        let first = slot.begin_load();
        let _second = slot.begin_load();

        assert!(slot.replace(first, 1u32).await.is_err());
        assert!(!slot.is_loaded().await);
    }

    #[tokio::test]
    async fn test_previous_avatar_dropped_before_attach() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let slot = AvatarSlot::with_avatar(Tracked::new("old", &log));

        let ticket = slot.begin_load();
        let new = Tracked::new("new", &log);
        slot.replace(ticket, new).await.unwrap();

        let name = slot.inspect(|a| a.name).await;
        assert_eq!(name, Some("new"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["create old", "create new", "drop old"]
        );
    }

    #[tokio::test]
    async fn test_load_with_propagates_loader_error() {
        let slot = AvatarSlot::with_avatar(1u32);
        let result = slot
            .load_with(async { Err(AvatarError::ManifestRead("gone".to_string()).into()) })
            .await;

        assert!(result.is_err());
        assert_eq!(slot.inspect(|a| *a).await, Some(1));
    }

    #[tokio::test]
    async fn test_load_with_attaches_result() {
        let slot = AvatarSlot::new();
        slot.load_with(async { Ok(5u32) }).await.unwrap();
        assert_eq!(slot.inspect(|a| *a).await, Some(5));
    }
}
