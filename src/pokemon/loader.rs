/*
* 开发心理过程：
* 1. 按类别抓取成员列表，再并发抓取每个成员的详细数据
* 2. 过滤地区形态和特殊形态
* 3. 为幸存成员解析进化线，组装成花名册
* 4. 按名字去重，结果缓存，同一类别只构建一次
* 5. 单个成员失败只丢弃该成员；成员列表失败得到空花名册
*/

use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use std::sync::Arc;
use log::{debug, info, warn};

use crate::core::config::{DatasetConfig, TournamentConfig};
use crate::core::error::{FetchError, FetchResult, Result};
use crate::data::cache::{CacheStatistics, Roster, RosterCache};
use crate::data::fetcher::DataFetcher;
use crate::pokemon::evolution::LineageResolver;
use crate::pokemon::filter::ExclusionFilter;
use crate::pokemon::species::{CreatureRecord, NamedResource, PokemonDetail, TypeResponse};
use crate::pokemon::sprites::ImageResolver;
use crate::pokemon::types::CategoryId;
use crate::PerformanceProfiler;

pub struct RosterBuilder {
    fetcher: Arc<dyn DataFetcher>,
    dataset: DatasetConfig,
    filter: ExclusionFilter,
    images: Arc<ImageResolver>,
    lineages: LineageResolver,
    cache: RosterCache,
}

impl RosterBuilder {
    pub fn new(fetcher: Arc<dyn DataFetcher>, config: &TournamentConfig) -> Result<Self> {
        let filter = ExclusionFilter::new(&config.exclusion)?;
        let images = Arc::new(ImageResolver::new(
            fetcher.clone(),
            config.dataset.clone(),
            &config.images,
        ));
        let lineages = LineageResolver::new(fetcher.clone(), images.clone());

        Ok(Self {
            fetcher,
            dataset: config.dataset.clone(),
            filter,
            images,
            lineages,
            cache: RosterCache::new(),
        })
    }

    /// 返回类别花名册，首次请求时构建并缓存。
    pub async fn build_roster(&self, category: &CategoryId) -> Roster {
        self.cache
            .get_or_build(category, || async { Arc::new(self.assemble(category).await) })
            .await
    }

    pub fn cached(&self, category: &CategoryId) -> Option<Roster> {
        self.cache.get(category)
    }

    pub fn cached_categories(&self) -> Vec<CategoryId> {
        self.cache.categories()
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }

    pub fn images(&self) -> &ImageResolver {
        &self.images
    }

    async fn assemble(&self, category: &CategoryId) -> Vec<CreatureRecord> {
        info!("开始构建花名册: {}", category);
        let _profiler = PerformanceProfiler::new(format!("构建花名册 {}", category));

        let members = match self.fetch_members(category).await {
            Ok(members) => members,
            Err(e) => {
                warn!("获取类别成员失败: {} ({})", category, e);
                return Vec::new();
            }
        };
        debug!("类别 {} 共有 {} 个成员", category, members.len());

        // 并发抓取详情，buffered保持成员列表顺序
        let details: Vec<PokemonDetail> = stream::iter(members)
            .map(|member| self.fetch_detail(member))
            .buffered(self.dataset.max_concurrent_fetches)
            .filter_map(|detail| async move { detail })
            .collect()
            .await;

        let survivors = self.filter.retain(details, |detail| detail.name.as_str());

        let records: Vec<CreatureRecord> = stream::iter(survivors)
            .map(|detail| self.to_record(detail))
            .buffered(self.dataset.max_concurrent_fetches)
            .collect()
            .await;

        let roster = dedupe_by_name(records);
        info!("花名册构建完成: {} ({} 只宝可梦)", category, roster.len());
        roster
    }

    async fn fetch_members(&self, category: &CategoryId) -> FetchResult<Vec<NamedResource>> {
        let url = self.dataset.type_url(category.as_str());
        let response: TypeResponse = serde_json::from_value(self.fetcher.fetch_json(&url).await?)?;
        Ok(response.pokemon.into_iter().map(|m| m.pokemon).collect())
    }

    async fn fetch_detail(&self, member: NamedResource) -> Option<PokemonDetail> {
        let detail = self
            .fetcher
            .fetch_json(&member.url)
            .await
            .and_then(|value| serde_json::from_value::<PokemonDetail>(value).map_err(FetchError::from));

        match detail {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!("获取宝可梦详情失败，跳过: {} ({})", member.name, e);
                None
            }
        }
    }

    async fn to_record(&self, detail: PokemonDetail) -> CreatureRecord {
        let lineage = self.lineages.resolve(&detail.species.url).await;
        let image_url = self.images.from_sprites(&detail.sprites);
        CreatureRecord::new(detail.name, image_url, lineage)
    }
}

/// 按名字去重：后出现的记录覆盖先出现的，位置保持首次出现处。
pub fn dedupe_by_name(records: Vec<CreatureRecord>) -> Vec<CreatureRecord> {
    let mut unique: IndexMap<String, CreatureRecord> = IndexMap::with_capacity(records.len());
    for record in records {
        if unique.contains_key(&record.name) {
            debug!("重复的宝可梦记录: {}", record.name);
        }
        unique.insert(record.name.clone(), record);
    }
    unique.into_values().collect()
}
