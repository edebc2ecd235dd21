// 图片解析器
// 开发心理：每只宝可梦都要有一张图，按优先级从官方立绘一路退到背面精灵图，最后用占位图
// 任何一步失败都只算“这一步没有”，解析器对外永远返回一个非空地址

use serde_json::Value;
use std::sync::Arc;
use log::{debug, warn};

use crate::core::config::{DatasetConfig, ImageConfig};
use crate::core::error::FetchResult;
use crate::data::cache::MemoCache;
use crate::data::fetcher::DataFetcher;

/// 图片来源，按 `PRIORITY` 顺序尝试。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteSource {
    OfficialArtwork,
    Home,
    FrontDefault,
    Showdown,
    BackDefault,
}

impl SpriteSource {
    pub const PRIORITY: [SpriteSource; 5] = [
        SpriteSource::OfficialArtwork,
        SpriteSource::Home,
        SpriteSource::FrontDefault,
        SpriteSource::Showdown,
        SpriteSource::BackDefault,
    ];

    // 在 sprites 对象里的JSON路径
    fn path(&self) -> &'static [&'static str] {
        match self {
            SpriteSource::OfficialArtwork => &["other", "official-artwork", "front_default"],
            SpriteSource::Home => &["other", "home", "front_default"],
            SpriteSource::FrontDefault => &["front_default"],
            SpriteSource::Showdown => &["other", "showdown", "front_default"],
            SpriteSource::BackDefault => &["back_default"],
        }
    }

    /// 取出该来源的地址；null、空串或非字符串都视为不存在。
    pub fn lookup<'a>(&self, sprites: &'a Value) -> Option<&'a str> {
        let mut current = sprites;
        for key in self.path() {
            current = current.get(key)?;
        }
        current.as_str().map(str::trim).filter(|url| !url.is_empty())
    }
}

/// 从 sprites 对象中按优先级选出第一张可用图片。
pub fn select_sprite(sprites: &Value) -> Option<(SpriteSource, String)> {
    SpriteSource::PRIORITY
        .iter()
        .find_map(|source| source.lookup(sprites).map(|url| (*source, url.to_string())))
}

pub struct ImageResolver {
    fetcher: Arc<dyn DataFetcher>,
    dataset: DatasetConfig,
    placeholder: String,
    memo: MemoCache<String>,
}

impl ImageResolver {
    pub fn new(fetcher: Arc<dyn DataFetcher>, dataset: DatasetConfig, images: &ImageConfig) -> Self {
        Self {
            fetcher,
            dataset,
            placeholder: images.placeholder.clone(),
            memo: MemoCache::new(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// 已抓取的 sprites 对象直接选图，不再发请求。
    pub fn from_sprites(&self, sprites: &Value) -> String {
        select_sprite(sprites)
            .map(|(_, url)| url)
            .unwrap_or_else(|| self.placeholder.clone())
    }

    /// 按名字解析图片地址，结果在解析器生命周期内记忆化。
    pub async fn resolve(&self, name: &str) -> String {
        self.resolve_by(name, name).await
    }

    /// `lookup` 是数据集里的查询键，名字或数字编号都可以；结果按名字记忆化。
    /// 抓取失败只返回占位图，不写入记忆，下次还会重试。
    pub async fn resolve_by(&self, name: &str, lookup: &str) -> String {
        if let Some(url) = self.memo.get(name) {
            return url;
        }

        match self.fetch_image(name, lookup).await {
            Ok(url) => {
                self.memo.insert(name, url.clone());
                url
            }
            Err(e) => {
                warn!("获取图片数据失败: {} ({})，使用占位图", name, e);
                self.placeholder.clone()
            }
        }
    }

    async fn fetch_image(&self, name: &str, lookup: &str) -> FetchResult<String> {
        debug!("查找图片: {} ({})", name, lookup);
        let detail = self.fetcher.fetch_json(&self.dataset.pokemon_url(lookup)).await?;

        let url = match detail.get("sprites").and_then(select_sprite) {
            Some((source, image)) => {
                debug!("图片来源 {:?}: {} -> {}", source, name, image);
                image
            }
            None => {
                warn!("没有找到 {} 的图片，使用占位图", name);
                self.placeholder.clone()
            }
        };
        Ok(url)
    }
}
