// 工具模块 - 日志初始化与可设种子的随机数

pub mod logger;
pub mod random;

pub use logger::{default_filter, init_logging};
pub use random::RandomGenerator;
