// 宝可梦进化线解析
// 开发心理：进化链是一棵树（伊布有八个分支），要把整棵树按先序展开成一条线
// 设计原则：先解析成不可变的树，再用显式栈展开；畸形分支就地截断，不影响兄弟分支

use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use log::{debug, warn};

use crate::core::error::{FetchError, FetchResult};
use crate::data::cache::InFlightMemo;
use crate::data::fetcher::DataFetcher;
use crate::pokemon::species::{resource_key, LineageNode, SpeciesResponse};
use crate::pokemon::sprites::ImageResolver;

/// 进化链中的一个节点。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainNode {
    pub species: String,
    // species.url 的最后一段，镜像数据按编号存放宝可梦
    pub species_key: Option<String>,
    pub evolves_to: Vec<ChainNode>,
}

impl ChainNode {
    pub fn leaf(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            species_key: None,
            evolves_to: Vec::new(),
        }
    }

    pub fn with_branches(species: impl Into<String>, evolves_to: Vec<ChainNode>) -> Self {
        Self {
            species: species.into(),
            species_key: None,
            evolves_to,
        }
    }

    /// 从 chain 链接解析。缺少 `species.name` 的链接返回 None，
    /// 调用方据此把该分支当作终点；`evolves_to` 缺失或不是数组时视为没有后继。
    pub fn from_value(link: &Value) -> Option<Self> {
        let species = link
            .get("species")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())?;

        let species_key = link
            .get("species")
            .and_then(|s| s.get("url"))
            .and_then(Value::as_str)
            .and_then(resource_key)
            .map(str::to_string);

        let evolves_to = match link.get("evolves_to").and_then(Value::as_array) {
            Some(children) => children
                .iter()
                .filter_map(|child| {
                    let node = ChainNode::from_value(child);
                    if node.is_none() {
                        warn!("进化链分支数据异常，截断于: {}", species);
                    }
                    node
                })
                .collect(),
            None => Vec::new(),
        };

        Some(Self {
            species: species.to_string(),
            species_key,
            evolves_to,
        })
    }

    /// 先序展开：当前节点在前，随后依次是每个分支完整展开的结果。
    pub fn flatten(&self) -> Vec<&str> {
        self.flatten_nodes()
            .into_iter()
            .map(|node| node.species.as_str())
            .collect()
    }

    pub fn flatten_nodes(&self) -> Vec<&ChainNode> {
        let mut order = Vec::new();
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            order.push(node);
            // 逆序压栈，保证兄弟分支按原顺序出栈
            stack.extend(node.evolves_to.iter().rev());
        }

        order
    }

    pub fn stage_count(&self) -> usize {
        1 + self.evolves_to.iter().map(ChainNode::stage_count).sum::<usize>()
    }
}

pub struct LineageResolver {
    fetcher: Arc<dyn DataFetcher>,
    images: Arc<ImageResolver>,
    chains: InFlightMemo<Arc<Vec<LineageNode>>>,
}

impl LineageResolver {
    pub fn new(fetcher: Arc<dyn DataFetcher>, images: Arc<ImageResolver>) -> Self {
        Self {
            fetcher,
            images,
            chains: InFlightMemo::new(),
        }
    }

    /// 解析物种的完整进化线。抓取失败或没有进化链时返回空序列。
    pub async fn resolve(&self, species_url: &str) -> Vec<LineageNode> {
        match self.try_resolve(species_url).await {
            Ok(lineage) => lineage,
            Err(e) => {
                warn!("获取进化线失败: {} ({})", species_url, e);
                Vec::new()
            }
        }
    }

    async fn try_resolve(&self, species_url: &str) -> FetchResult<Vec<LineageNode>> {
        let species: SpeciesResponse = serde_json::from_value(self.fetcher.fetch_json(species_url).await?)?;

        let chain_url = match species.evolution_chain {
            Some(reference) => reference.url,
            None => {
                debug!("物种没有进化链: {}", species_url);
                return Ok(Vec::new());
            }
        };

        // 同一家族的成员并发解析时共用一次进化链抓取
        let url = chain_url.as_str();
        let lineage = self
            .chains
            .get_or_try_init(url, move || async move {
                let chain = self.fetcher.fetch_json(url).await?;
                let lineage = match chain.get("chain").and_then(ChainNode::from_value) {
                    Some(root) => self.resolve_images(&root).await,
                    None => {
                        warn!("进化链根节点数据异常: {}", url);
                        Vec::new()
                    }
                };
                Ok::<_, FetchError>(Arc::new(lineage))
            })
            .await?;

        Ok(lineage.as_ref().clone())
    }

    /// 为展开后的每个阶段解析图片，并发执行且保持顺序。
    pub async fn resolve_images(&self, root: &ChainNode) -> Vec<LineageNode> {
        let nodes = root.flatten_nodes();
        let images = join_all(nodes.iter().map(|node| {
            let lookup = node.species_key.as_deref().unwrap_or(node.species.as_str());
            self.images.resolve_by(&node.species, lookup)
        }))
        .await;

        nodes
            .into_iter()
            .zip(images)
            .map(|(node, image_url)| LineageNode::new(node.species.as_str(), image_url))
            .collect()
    }
}
