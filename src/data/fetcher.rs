// 数据抓取层
// 开发心理：核心逻辑只依赖“给URL拿JSON”这一个能力，传输方式可以替换
// 三种实现：HTTP（在线PokeAPI）、本地镜像目录、内存数据（测试和演示）

use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use std::time::Duration;
use log::{debug, warn};

use crate::core::error::{FetchError, FetchResult};

/// 抽象的抓取能力：给定URL，返回解析后的JSON。
pub trait DataFetcher: Send + Sync {
    fn fetch_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FetchResult<Value>>;
}

// 内存数据源，按URL精确匹配
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: RwLock<HashMap<String, Value>>,
    request_counts: Mutex<HashMap<String, usize>>,
    latency: Option<Duration>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次请求前等待一段时间，用来模拟网络挂起点。
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&self, url: impl Into<String>, body: Value) {
        if let Ok(mut responses) = self.responses.write() {
            responses.insert(url.into(), body);
        }
    }

    pub fn remove(&self, url: &str) -> Option<Value> {
        self.responses.write().ok().and_then(|mut r| r.remove(url))
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.request_counts
            .lock()
            .map(|counts| counts.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.request_counts
            .lock()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }

    fn lookup(&self, url: &str) -> FetchResult<Value> {
        if let Ok(mut counts) = self.request_counts.lock() {
            *counts.entry(url.to_string()).or_insert(0) += 1;
        }

        let responses = self
            .responses
            .read()
            .map_err(|e| FetchError::Io(e.to_string()))?;
        responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

impl DataFetcher for StaticFetcher {
    fn fetch_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FetchResult<Value>> {
        Box::pin(async move {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.lookup(url)
        })
    }
}

/// 本地镜像目录，布局与 PokeAPI api-data 仓库一致：
/// `{base}/type/fire` 对应 `{root}/type/fire/index.json`。
#[derive(Debug, Clone)]
pub struct MirrorFetcher {
    root: PathBuf,
    base_url: String,
}

impl MirrorFetcher {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve_path(&self, url: &str) -> FetchResult<PathBuf> {
        let relative = url
            .strip_prefix(&self.base_url)
            .ok_or_else(|| FetchError::NotFound(url.to_string()))?;

        let mut path = self.root.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            if segment == ".." || segment == "." {
                return Err(FetchError::NotFound(url.to_string()));
            }
            path.push(segment);
        }
        path.push("index.json");
        Ok(path)
    }
}

impl DataFetcher for MirrorFetcher {
    fn fetch_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FetchResult<Value>> {
        Box::pin(async move {
            let path = self.resolve_path(url)?;
            debug!("读取镜像文件: {:?}", path);

            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(FetchError::NotFound(url.to_string()));
                }
                Err(e) => return Err(e.into()),
            };
            Ok(serde_json::from_str(&content)?)
        })
    }
}

// 在线HTTP数据源，带超时与有限次重试
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
    retry_delay: Duration,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new(config: &crate::core::config::DatasetConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("pokemon-tournament/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
        })
    }

    async fn fetch_once(&self, url: &str) -> FetchResult<Value> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(feature = "http")]
impl DataFetcher for HttpFetcher {
    fn fetch_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FetchResult<Value>> {
        Box::pin(async move {
            let mut attempt = 0;
            loop {
                match self.fetch_once(url).await {
                    Ok(value) => return Ok(value),
                    // 404和解析错误重试也不会变
                    Err(e @ (FetchError::NotFound(_) | FetchError::Parse(_))) => return Err(e),
                    Err(e) if attempt >= self.max_retries => return Err(e),
                    Err(e) => {
                        attempt += 1;
                        warn!("请求失败，第{}次重试: {} ({})", attempt, url, e);
                        tokio::time::sleep(self.retry_delay * attempt).await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_static_fetcher() {
        let fetcher = StaticFetcher::new();
        fetcher.insert("https://x/type/fire", json!({"pokemon": []}));

        let value = fetcher.fetch_json("https://x/type/fire").await.unwrap();
        assert_eq!(value, json!({"pokemon": []}));

        let missing = fetcher.fetch_json("https://x/type/ice").await;
        assert!(matches!(missing, Err(FetchError::NotFound(_))));

        assert_eq!(fetcher.request_count("https://x/type/fire"), 1);
        assert_eq!(fetcher.total_requests(), 2);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_fetcher_builds_from_config() {
        let dataset = crate::core::config::DatasetConfig::default();
        let fetcher = HttpFetcher::new(&dataset).unwrap();
        assert_eq!(fetcher.max_retries, dataset.max_retries);
        assert_eq!(fetcher.retry_delay, dataset.retry_delay());
    }

    #[test]
    fn test_mirror_path_resolution() {
        let fetcher = MirrorFetcher::new("/data/api/v2", "https://pokeapi.co/api/v2/");

        let path = fetcher.resolve_path("https://pokeapi.co/api/v2/type/fire").unwrap();
        assert_eq!(path, PathBuf::from("/data/api/v2/type/fire/index.json"));

        let path = fetcher
            .resolve_path("https://pokeapi.co/api/v2/pokemon-species/4/")
            .unwrap();
        assert_eq!(path, PathBuf::from("/data/api/v2/pokemon-species/4/index.json"));

        assert!(fetcher.resolve_path("https://elsewhere/type/fire").is_err());
        assert!(fetcher.resolve_path("https://pokeapi.co/api/v2/../secret").is_err());
    }

    #[tokio::test]
    async fn test_mirror_fetcher_reads_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("pokemon").join("vulpix");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.json"), r#"{"name": "vulpix"}"#).unwrap();

        let fetcher = MirrorFetcher::new(temp_dir.path(), "https://pokeapi.co/api/v2");
        let value = fetcher
            .fetch_json("https://pokeapi.co/api/v2/pokemon/vulpix")
            .await
            .unwrap();
        assert_eq!(value["name"], "vulpix");

        let missing = fetcher.fetch_json("https://pokeapi.co/api/v2/pokemon/ninetales").await;
        assert!(matches!(missing, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mirror_fetcher_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("type").join("ice");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.json"), "not json").unwrap();

        let fetcher = MirrorFetcher::new(temp_dir.path(), "https://pokeapi.co/api/v2");
        let result = fetcher.fetch_json("https://pokeapi.co/api/v2/type/ice").await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }
}
