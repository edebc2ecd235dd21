/*
* 开发心理过程：
* 1. 锦标赛配置管理，TOML文件 + 默认值 + 环境变量覆盖
* 2. 每个配置段都有Default，部分填写的配置文件也能加载
* 3. 排除规则作为具名配置，而不是散落在代码里的正则
* 4. 加载后统一校验，非法配置在启动时报错
*/

use serde::{Deserialize, Serialize};
use std::{
    env,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use log::{debug, info};

use crate::core::error::{Result, TournamentError};

pub const BASE_URL_ENV: &str = "POKEMON_TOURNAMENT_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_PLACEHOLDER: &str = "path/to/placeholder-image.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TournamentConfig {
    pub dataset: DatasetConfig,
    pub images: ImageConfig,
    pub exclusion: ExclusionConfig,
    pub tournament: MatchConfig,
}

// 数据源配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_concurrent_fetches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub placeholder: String,
}

/// 地区形态与特殊形态的排除规则。
///
/// `boundary_markers` 按单词边界匹配（`-` 视为分隔符），
/// `substring_markers` 在名字任意位置出现即排除。两者都不区分大小写。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionConfig {
    pub boundary_markers: Vec<String>,
    pub substring_markers: Vec<String>,
}

// 对战配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub seed: Option<u64>,
    pub top_n: usize,
    pub reset_clears_scores: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 250,
            max_concurrent_fetches: 16,
        }
    }
}

impl DatasetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn type_url(&self, category: &str) -> String {
        format!("{}/type/{}", self.base_url.trim_end_matches('/'), category)
    }

    pub fn pokemon_url(&self, name: &str) -> String {
        format!("{}/pokemon/{}", self.base_url.trim_end_matches('/'), name)
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        let boundary = [
            "kanto", "johto", "hoenn", "sinnoh", "hisui",
            "unova", "kalos", "alola", "galar", "paldea",
        ];
        let substring = [
            "mega", "gmax", "totem", "starter", "alola", "galar",
            "hisui", "paldea", "crowned", "origin", "other",
        ];

        Self {
            boundary_markers: boundary.iter().map(|s| s.to_string()).collect(),
            substring_markers: substring.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: None,
            top_n: 3,
            reset_clears_scores: false,
        }
    }
}

pub struct ConfigManager;

impl ConfigManager {
    /// 从文件加载配置；文件不存在时使用默认配置。随后应用环境变量并校验。
    pub fn load(path: Option<&Path>) -> Result<TournamentConfig> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => TournamentConfig::default(),
        };

        Self::apply_env_overrides(&mut config);
        Self::validate_config(&config)?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<TournamentConfig> {
        if !path.exists() {
            info!("配置文件不存在，使用默认配置: {:?}", path);
            return Ok(TournamentConfig::default());
        }

        let content = fs::read_to_string(path)?;
        let config: TournamentConfig = toml::from_str(&content)?;

        Self::validate_config(&config)?;
        info!("成功加载配置文件: {:?}", path);
        Ok(config)
    }

    pub fn save_config_to_file(config: &TournamentConfig, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(config)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        debug!("配置已保存到: {:?}", path);
        Ok(())
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let mut path = env::current_dir()?;
        path.push("config");
        path.push("tournament.toml");
        Ok(path)
    }

    fn apply_env_overrides(config: &mut TournamentConfig) {
        if let Ok(base_url) = env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                debug!("环境变量覆盖数据源地址: {}", base_url);
                config.dataset.base_url = base_url;
            }
        }
    }

    pub fn validate_config(config: &TournamentConfig) -> Result<()> {
        if config.dataset.base_url.trim().is_empty() {
            return Err(TournamentError::Config("数据源地址不能为空".to_string()));
        }

        if config.dataset.timeout_secs == 0 {
            return Err(TournamentError::Config("请求超时必须至少为1秒".to_string()));
        }

        if config.dataset.max_concurrent_fetches == 0 {
            return Err(TournamentError::Config("并发抓取数必须至少为1".to_string()));
        }

        if config.images.placeholder.trim().is_empty() {
            return Err(TournamentError::Config("占位图片路径不能为空".to_string()));
        }

        if config.tournament.top_n == 0 {
            return Err(TournamentError::Config("排行榜名额必须至少为1".to_string()));
        }

        Ok(())
    }
}
