// 日志初始化
// 开发心理：统一走 log 门面，env_logger 负责输出，RUST_LOG 优先于命令行开关

use env_logger::{Builder, Env};
use log::debug;
use std::io::Write;

const CRATE_TARGET: &str = "pokemon_tournament";

/// 未设置 RUST_LOG 时使用的过滤规则。
pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("warn,{}={}", CRATE_TARGET, level)
}

/// 初始化全局日志。重复调用不会报错，只保留第一次的设置。
pub fn init_logging(verbose: bool) {
    let env = Env::default().default_filter_or(default_filter(verbose));

    let result = Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();

    if result.is_ok() {
        debug!("日志系统已初始化 (verbose={})", verbose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "warn,pokemon_tournament=info");
        assert_eq!(default_filter(true), "warn,pokemon_tournament=debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(false);
        init_logging(true);
        log::info!("日志测试");
    }
}
