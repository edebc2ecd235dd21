// 数据层 - 抓取能力与缓存
// 开发心理：传输方式与缓存策略都和锦标赛逻辑解耦，测试时换成内存数据源即可

pub mod cache;
pub mod fetcher;

pub use cache::{CacheStatistics, InFlightMemo, MemoCache, Roster, RosterCache};
#[cfg(feature = "http")]
pub use fetcher::HttpFetcher;
pub use fetcher::{DataFetcher, MirrorFetcher, StaticFetcher};
