// 核心模块 - 错误类型与配置管理
// 开发心理：为数据管线和锦标赛引擎提供统一的错误和配置基础

pub mod config;
pub mod error;

// 重新导出核心类型
pub use config::{
    ConfigManager, DatasetConfig, ExclusionConfig, ImageConfig, MatchConfig, TournamentConfig,
};
pub use error::{FetchError, FetchResult, Result, TournamentError};
