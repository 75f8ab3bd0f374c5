//! Current-folder tracking and default-folder resolution.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use tracing::warn;

use arkive_store::FolderStore;

/// Tracks which folder each user is currently inside and caches the id of
/// their default folder. Save-time resolution order is the explicit current
/// folder first, then the default; reversing it would silently break "save
/// into the folder I'm browsing".
pub struct FolderContext {
    folders: Arc<dyn FolderStore>,
    current: RwLock<HashMap<i64, i64>>,
    defaults: RwLock<HashMap<i64, i64>>,
}

impl FolderContext {
    pub fn new(folders: Arc<dyn FolderStore>) -> Self {
        Self {
            folders,
            current: RwLock::new(HashMap::new()),
            defaults: RwLock::new(HashMap::new()),
        }
    }

    /// The folder the user is currently inside, 0 when unset.
    pub fn current_folder(&self, user_id: i64) -> i64 {
        let map = self.current.read().unwrap_or_else(|e| e.into_inner());
        map.get(&user_id).copied().unwrap_or_default()
    }

    pub fn set_current_folder(&self, user_id: i64, folder_id: i64) {
        let mut map = self.current.write().unwrap_or_else(|e| e.into_inner());
        map.insert(user_id, folder_id);
    }

    /// The user's default folder id, 0 before first bootstrap. A non-zero
    /// store answer is cached.
    pub async fn default_folder_id(&self, user_id: i64) -> i64 {
        {
            let cache = self.defaults.read().unwrap_or_else(|e| e.into_inner());
            if let Some(id) = cache.get(&user_id) {
                return *id;
            }
        }
        match self.folders.default_folder_id(user_id).await {
            Ok(Some(id)) => {
                self.cache_default(user_id, id);
                id
            },
            Ok(None) => 0,
            Err(e) => {
                warn!(user_id, error = %e, "default folder lookup failed");
                0
            },
        }
    }

    /// Record a freshly created default folder id.
    pub fn cache_default(&self, user_id: i64, folder_id: i64) {
        let mut cache = self.defaults.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(user_id, folder_id);
    }

    /// Where a plain note lands: current folder if set, else the default.
    pub async fn save_folder_id(&self, user_id: i64) -> i64 {
        let current = self.current_folder(user_id);
        if current != 0 { current } else { self.default_folder_id(user_id).await }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use arkive_store::{Folder, Result};

    use super::*;

    #[derive(Default)]
    struct FakeFolders {
        default_id: i64,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl FolderStore for FakeFolders {
        async fn save(&self, _user_id: i64, _name: &str) -> Result<i64> {
            Ok(0)
        }
        async fn find_or_create(&self, _user_id: i64, _name: &str) -> Result<i64> {
            Ok(0)
        }
        async fn find(&self, _id: i64) -> Result<Option<String>> {
            Ok(None)
        }
        async fn list_by_user(&self, _user_id: i64) -> Result<Vec<Folder>> {
            Ok(Vec::new())
        }
        async fn delete(&self, _id: i64) -> Result<()> {
            Ok(())
        }
        async fn default_folder_id(&self, _user_id: i64) -> Result<Option<i64>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok((self.default_id != 0).then_some(self.default_id))
        }
    }

    #[tokio::test]
    async fn current_folder_wins_over_default() {
        let ctx = FolderContext::new(Arc::new(FakeFolders { default_id: 7, ..Default::default() }));
        assert_eq!(ctx.save_folder_id(1).await, 7);
        ctx.set_current_folder(1, 3);
        assert_eq!(ctx.save_folder_id(1).await, 3);
        // Resetting to zero falls back to the default again.
        ctx.set_current_folder(1, 0);
        assert_eq!(ctx.save_folder_id(1).await, 7);
    }

    #[tokio::test]
    async fn default_id_is_cached_after_first_lookup() {
        let folders = Arc::new(FakeFolders { default_id: 7, ..Default::default() });
        let ctx = FolderContext::new(Arc::clone(&folders) as Arc<dyn FolderStore>);
        assert_eq!(ctx.default_folder_id(1).await, 7);
        assert_eq!(ctx.default_folder_id(1).await, 7);
        assert_eq!(folders.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_default_is_zero_and_not_cached() {
        let folders = Arc::new(FakeFolders::default());
        let ctx = FolderContext::new(Arc::clone(&folders) as Arc<dyn FolderStore>);
        assert_eq!(ctx.default_folder_id(1).await, 0);
        assert_eq!(ctx.default_folder_id(1).await, 0);
        assert_eq!(folders.lookups.load(Ordering::SeqCst), 2);
    }
}
