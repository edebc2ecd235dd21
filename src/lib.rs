// 宝可梦属性人气锦标赛库入口
// 开发心理：数据管线负责把某个属性的宝可梦整理成花名册，锦标赛引擎负责两两淘汰和排名
// 数据源通过 DataFetcher 注入，联网、本地镜像、内存数据三种方式共用同一套逻辑

pub mod core;
pub mod data;
pub mod pokemon;
pub mod tournament;
pub mod utils;

// 重新导出核心类型
pub use core::{
    ConfigManager, FetchError, FetchResult, Result, TournamentConfig, TournamentError,
};
pub use data::{DataFetcher, MirrorFetcher, Roster, StaticFetcher};
#[cfg(feature = "http")]
pub use data::HttpFetcher;
pub use pokemon::{CategoryId, CreatureRecord, LineageNode, PokemonType, RosterBuilder};
pub use tournament::{
    Matchup, RankedEntry, RoundOutcome, ScoreTable, TournamentContext, TournamentPhase,
    TournamentState,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "pokemon-tournament";

/// 按默认设置初始化日志。
pub fn init() {
    utils::init_logging(false);
    log::info!("宝可梦锦标赛初始化完成 v{}", VERSION);
}

// 耗时统计：离开作用域时按 debug 级别输出
pub struct PerformanceProfiler {
    start_time: std::time::Instant,
    name: String,
}

impl PerformanceProfiler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start_time: std::time::Instant::now(),
            name: name.into(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Drop for PerformanceProfiler {
    fn drop(&mut self) {
        log::debug!("性能: {} 耗时 {:.2}ms", self.name, self.elapsed().as_secs_f64() * 1000.0);
    }
}
