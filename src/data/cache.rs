// 数据缓存系统
// 开发心理：花名册在上下文生命周期内只构建一次，并发请求同一类别时共享同一个构建过程
// 设计原则：按类别缓存“正在进行的构建”而不只是结果，图片和进化线做简单记忆化

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use log::debug;

use crate::pokemon::species::CreatureRecord;
use crate::pokemon::types::CategoryId;

/// 已验证、去重的类别花名册，顺序在缓存后不再改变。
pub type Roster = Arc<Vec<CreatureRecord>>;

// 缓存统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
        }
    }
}

// 花名册缓存
#[derive(Debug, Default)]
pub struct RosterCache {
    cells: Mutex<HashMap<CategoryId, Arc<OnceCell<Roster>>>>,
    counters: Counters,
}

impl RosterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回类别的花名册；未缓存时执行 `build`。
    /// 同一类别的并发调用只会执行一次 `build`，其余调用等待同一结果。
    pub async fn get_or_build<F, Fut>(&self, category: &CategoryId, build: F) -> Roster
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Roster>,
    {
        let cell = self.cell_for(category);

        if let Some(roster) = cell.get() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!("花名册缓存命中: {}", category);
            return roster.clone();
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let builds = &self.counters.builds;
        cell.get_or_init(move || async move {
            builds.fetch_add(1, Ordering::Relaxed);
            build().await
        })
        .await
        .clone()
    }

    pub fn get(&self, category: &CategoryId) -> Option<Roster> {
        let cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        cells.get(category).and_then(|cell| cell.get().cloned())
    }

    pub fn contains(&self, category: &CategoryId) -> bool {
        self.get(category).is_some()
    }

    /// 已完成构建的类别。
    pub fn categories(&self) -> Vec<CategoryId> {
        let cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        let mut categories: Vec<CategoryId> = cells
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(category, _)| category.clone())
            .collect();
        categories.sort();
        categories
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.counters.snapshot()
    }

    fn cell_for(&self, category: &CategoryId) -> Arc<OnceCell<Roster>> {
        let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        cells
            .entry(category.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}

// 简单的键值记忆化，用于图片地址和进化线
#[derive(Debug)]
pub struct MemoCache<V> {
    entries: Mutex<HashMap<String, V>>,
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> MemoCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// 带并发合并的记忆化：同一个键同时只有一次初始化在进行，
// 初始化失败不写入，下次调用重新尝试
#[derive(Debug)]
pub struct InFlightMemo<V> {
    cells: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V> Default for InFlightMemo<V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> InFlightMemo<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_try_init<F, Fut, E>(&self, key: &str, init: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
            cells
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        cell.get_or_try_init(init).await.cloned()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// 已成功初始化的键数。
    pub fn len(&self) -> usize {
        let cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        cells.values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn roster_of(names: &[&str]) -> Roster {
        Arc::new(
            names
                .iter()
                .map(|n| CreatureRecord::new(*n, format!("{}.png", n), Vec::new()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_build_once_then_hit() {
        let cache = RosterCache::new();
        let fire = CategoryId::new("fire").unwrap();

        let first = cache.get_or_build(&fire, || async { roster_of(&["vulpix"]) }).await;
        let second = cache.get_or_build(&fire, || async { roster_of(&["other"]) }).await;

        assert_eq!(first, second);
        assert_eq!(second[0].name, "vulpix");
        assert_eq!(cache.statistics(), CacheStatistics { hits: 1, misses: 1, builds: 1 });
    }

    #[tokio::test]
    async fn test_concurrent_builds_coalesce() {
        let cache = RosterCache::new();
        let water = CategoryId::new("water").unwrap();

        let slow_build = || async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            roster_of(&["psyduck", "golduck"])
        };

        let (a, b, c) = tokio::join!(
            cache.get_or_build(&water, slow_build),
            cache.get_or_build(&water, slow_build),
            cache.get_or_build(&water, slow_build),
        );

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(cache.statistics().builds, 1);
    }

    #[tokio::test]
    async fn test_categories_lists_built_only() {
        let cache = RosterCache::new();
        assert!(cache.categories().is_empty());

        let ice = CategoryId::new("ice").unwrap();
        assert!(!cache.contains(&ice));
        cache.get_or_build(&ice, || async { roster_of(&[]) }).await;

        assert!(cache.contains(&ice));
        assert_eq!(cache.categories(), vec![ice]);
    }

    #[tokio::test]
    async fn test_in_flight_memo_coalesces() {
        let memo: InFlightMemo<u32> = InFlightMemo::new();
        let counter = AtomicU64::new(0);
        let calls = &counter;

        let init = move || async move {
            calls.fetch_add(1, Ordering::Relaxed);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<u32, String>(7)
        };

        let (a, b) = tokio::join!(memo.get_or_try_init("chain", init), memo.get_or_try_init("chain", init));
        assert_eq!((a, b), (Ok(7), Ok(7)));
        assert_eq!(counter.load(Ordering::Relaxed), 1);
        assert_eq!(memo.get("chain"), Some(7));
    }

    #[tokio::test]
    async fn test_in_flight_memo_retries_failures() {
        let memo: InFlightMemo<u32> = InFlightMemo::new();

        let failed = memo.get_or_try_init("chain", || async { Err::<u32, &str>("down") }).await;
        assert_eq!(failed, Err("down"));
        assert!(memo.is_empty());

        let ok = memo.get_or_try_init("chain", || async { Ok::<u32, &str>(3) }).await;
        assert_eq!(ok, Ok(3));
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_memo_cache() {
        let memo: MemoCache<String> = MemoCache::new();
        assert!(memo.is_empty());

        memo.insert("pikachu", "p.png".to_string());
        assert_eq!(memo.get("pikachu"), Some("p.png".to_string()));
        assert_eq!(memo.get("raichu"), None);
        assert_eq!(memo.len(), 1);
    }
}
