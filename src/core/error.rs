// 错误处理系统
// 开发心理：抓取失败在管线内部就地恢复，只有调用方输入错误和配置错误才向外传播
// 两层错误：FetchError描述单个资源的传输失败，TournamentError面向调用方

use std::io;
use thiserror::Error;

// 单个资源抓取错误 - 管线内部总是被吞掉并记录日志
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP请求失败: {0}")]
    Http(String),

    #[error("HTTP状态异常: {status} ({url})")]
    Status { status: u16, url: String },

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("文件错误: {0}")]
    Io(String),

    #[error("解析错误: {0}")]
    Parse(String),
}

impl From<io::Error> for FetchError {
    fn from(error: io::Error) -> Self {
        FetchError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        FetchError::Parse(error.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return FetchError::Status {
                status: status.as_u16(),
                url: error.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        FetchError::Http(error.to_string())
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

// 锦标赛主要错误类型
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TournamentError {
    #[error("类别标识不能为空")]
    EmptyCategory,

    #[error("宝可梦不在当前对战池中: {0}")]
    NotInPool(String),

    #[error("胜者与败者不能是同一只宝可梦: {0}")]
    SameContender(String),

    #[error("锦标赛已结束: {0}")]
    TournamentOver(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据抓取错误: {0}")]
    Fetch(#[from] FetchError),
}

impl TournamentError {
    // 调用方可以修正输入后重试的错误
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TournamentError::Config(_))
    }
}

impl From<io::Error> for TournamentError {
    fn from(error: io::Error) -> Self {
        TournamentError::Config(error.to_string())
    }
}

impl From<toml::de::Error> for TournamentError {
    fn from(error: toml::de::Error) -> Self {
        TournamentError::Config(format!("解析配置文件失败: {}", error))
    }
}

impl From<toml::ser::Error> for TournamentError {
    fn from(error: toml::ser::Error) -> Self {
        TournamentError::Config(format!("序列化配置失败: {}", error))
    }
}

// Result类型别名
pub type Result<T> = std::result::Result<T, TournamentError>;
