// 变体排除过滤器
// 开发心理：地区形态、超级进化、极巨化等特殊形态不参加锦标赛
// 规则来自ExclusionConfig，编译成两条不区分大小写的正则

use regex::Regex;
use log::warn;

use crate::core::config::ExclusionConfig;
use crate::core::error::{Result, TournamentError};

#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    boundary: Option<Regex>,
    substring: Option<Regex>,
}

impl ExclusionFilter {
    pub fn new(config: &ExclusionConfig) -> Result<Self> {
        Ok(Self {
            boundary: Self::compile(&config.boundary_markers, true)?,
            substring: Self::compile(&config.substring_markers, false)?,
        })
    }

    fn compile(markers: &[String], word_boundary: bool) -> Result<Option<Regex>> {
        let escaped: Vec<String> = markers
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(regex::escape)
            .collect();

        if escaped.is_empty() {
            return Ok(None);
        }

        let alternation = escaped.join("|");
        let pattern = if word_boundary {
            format!(r"(?i)\b(?:{})\b", alternation)
        } else {
            format!(r"(?i)(?:{})", alternation)
        };

        Regex::new(&pattern)
            .map(Some)
            .map_err(|e| TournamentError::Config(format!("排除规则无效: {}", e)))
    }

    /// 名字命中任一规则即被排除。
    pub fn is_excluded(&self, name: &str) -> bool {
        self.boundary.as_ref().is_some_and(|re| re.is_match(name))
            || self.substring.as_ref().is_some_and(|re| re.is_match(name))
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        !self.is_excluded(name)
    }

    /// 保留顺序地过滤，被排除的名字记录警告日志。
    pub fn retain<T, F>(&self, items: Vec<T>, name_of: F) -> Vec<T>
    where
        F: Fn(&T) -> &str,
    {
        items
            .into_iter()
            .filter(|item| {
                let name = name_of(item);
                if self.is_excluded(name) {
                    warn!("排除变体或地区形态: {}", name);
                    false
                } else {
                    true
                }
            })
            .collect()
    }
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        let config = ExclusionConfig::default();
        Self {
            boundary: Self::compile(&config.boundary_markers, true).ok().flatten(),
            substring: Self::compile(&config.substring_markers, false).ok().flatten(),
        }
    }
}
