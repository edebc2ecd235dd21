// 锦标赛上下文
// 开发心理：花名册缓存和胜场表归调用方持有的上下文所有，而不是全局状态
// 多个上下文互不影响，各自独立进行锦标赛

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use log::{debug, info};

use crate::core::config::TournamentConfig;
use crate::core::error::Result;
use crate::data::cache::Roster;
use crate::data::fetcher::DataFetcher;
use crate::pokemon::loader::RosterBuilder;
use crate::pokemon::species::CreatureRecord;
use crate::pokemon::types::CategoryId;
use crate::tournament::engine::{Matchup, TournamentPhase, TournamentState};
use crate::tournament::ranking::{rank_top, RankedEntry, ScoreTable, TOP_THREE};
use crate::utils::random::RandomGenerator;

/// 一次配对请求的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    Pair(Matchup),
    Concluded(Vec<RankedEntry>),
    NoContest,
    // 状态还没有经过 start_tournament
    NotStarted,
}

impl RoundOutcome {
    pub fn pair(&self) -> Option<&Matchup> {
        match self {
            RoundOutcome::Pair(matchup) => Some(matchup),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, RoundOutcome::Pair(_))
    }
}

pub struct TournamentContext {
    config: TournamentConfig,
    builder: RosterBuilder,
    scores: Mutex<HashMap<CategoryId, ScoreTable>>,
    results: Mutex<IndexMap<CategoryId, Vec<RankedEntry>>>,
}

impl TournamentContext {
    pub fn new(fetcher: Arc<dyn DataFetcher>, config: TournamentConfig) -> Result<Self> {
        let builder = RosterBuilder::new(fetcher, &config)?;
        Ok(Self {
            config,
            builder,
            scores: Mutex::new(HashMap::new()),
            results: Mutex::new(IndexMap::new()),
        })
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    pub fn roster_builder(&self) -> &RosterBuilder {
        &self.builder
    }

    /// 构建（或取缓存的）花名册，同时为尚未登记的成员建立零分记录。
    pub async fn build_roster(&self, category: &CategoryId) -> Roster {
        let roster = self.builder.build_roster(category).await;

        let mut scores = self.scores.lock().unwrap_or_else(|e| e.into_inner());
        scores
            .entry(category.clone())
            .or_default()
            .register_all(&roster);

        roster
    }

    /// 开赛：确保花名册已构建并登记分数，对战池为花名册副本。
    pub async fn start_tournament(&self, category: &CategoryId) -> TournamentState {
        let roster = self.build_roster(category).await;

        let rng = RandomGenerator::from_optional_seed(self.config.tournament.seed);
        debug!("随机种子: {}", rng.get_seed());

        let mut state = TournamentState::new(category.clone(), rng);
        state.begin(roster);
        state
    }

    /// 取下一对；池中不足两只时结算排名并记录为该类别的最新结果。
    pub fn next_pair(&self, state: &mut TournamentState) -> RoundOutcome {
        match state.phase() {
            TournamentPhase::NoContest => return RoundOutcome::NoContest,
            TournamentPhase::Uninitialized => return RoundOutcome::NotStarted,
            _ => {}
        }

        match state.draw_pair() {
            Some(matchup) => RoundOutcome::Pair(matchup),
            None if state.phase() == TournamentPhase::Concluded => {
                let ranking = self.rank(state.category(), state.roster(), self.config.tournament.top_n);
                self.record_result(state.category(), &ranking);
                RoundOutcome::Concluded(ranking)
            }
            None => RoundOutcome::NoContest,
        }
    }

    /// 结算玩家的选择：胜者加一分，败者出局，然后立即进入下一轮判定。
    pub fn resolve_choice(
        &self,
        state: &mut TournamentState,
        winner: &str,
        loser: &str,
    ) -> Result<RoundOutcome> {
        state.eliminate(winner, loser)?;

        let wins = {
            let mut scores = self.scores.lock().unwrap_or_else(|e| e.into_inner());
            scores
                .entry(state.category().clone())
                .or_default()
                .credit_win(winner)
        };
        debug!("{} 累计胜场: {}", winner, wins);

        Ok(self.next_pair(state))
    }

    /// 重新开始本类别的对战池。默认保留累计胜场，
    /// `tournament.reset_clears_scores` 打开时同时清零。
    pub fn reset_tournament(&self, state: &mut TournamentState) -> RoundOutcome {
        if self.config.tournament.reset_clears_scores {
            let mut scores = self.scores.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(table) = scores.get_mut(state.category()) {
                table.clear_scores();
            }
        }

        info!("重置锦标赛: {}", state.category());
        state.reset();
        self.next_pair(state)
    }

    pub fn top_three(&self, category: &CategoryId) -> Vec<CreatureRecord> {
        self.ranking(category, TOP_THREE)
            .into_iter()
            .map(|entry| entry.record)
            .collect()
    }

    /// 按当前胜场计算前 `n` 名；花名册未构建时为空。
    pub fn ranking(&self, category: &CategoryId, n: usize) -> Vec<RankedEntry> {
        match self.builder.cached(category) {
            Some(roster) => self.rank(category, &roster, n),
            None => Vec::new(),
        }
    }

    pub fn scores(&self, category: &CategoryId) -> Option<ScoreTable> {
        let scores = self.scores.lock().unwrap_or_else(|e| e.into_inner());
        scores.get(category).cloned()
    }

    /// 各类别最近一次结束时的排行榜，按首次结束的顺序排列。
    pub fn results(&self) -> Vec<(CategoryId, Vec<RankedEntry>)> {
        let results = self.results.lock().unwrap_or_else(|e| e.into_inner());
        results
            .iter()
            .map(|(category, ranking)| (category.clone(), ranking.clone()))
            .collect()
    }

    fn rank(&self, category: &CategoryId, roster: &[CreatureRecord], n: usize) -> Vec<RankedEntry> {
        let scores = self.scores.lock().unwrap_or_else(|e| e.into_inner());
        match scores.get(category) {
            Some(table) => rank_top(roster, table, n),
            None => Vec::new(),
        }
    }

    fn record_result(&self, category: &CategoryId, ranking: &[RankedEntry]) {
        let mut results = self.results.lock().unwrap_or_else(|e| e.into_inner());
        results.insert(category.clone(), ranking.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fetcher::StaticFetcher;
    use crate::core::error::TournamentError;
    use serde_json::json;

    const BASE: &str = "https://api.test";

    fn fixture(category: &str, names: &[&str]) -> Arc<StaticFetcher> {
        let fetcher = Arc::new(StaticFetcher::new());
        add_category(&fetcher, category, names);
        fetcher
    }

    fn add_category(fetcher: &StaticFetcher, category: &str, names: &[&str]) {
        let members: Vec<_> = names
            .iter()
            .map(|n| json!({"pokemon": {"name": n, "url": format!("{}/pokemon/{}", BASE, n)}}))
            .collect();
        fetcher.insert(format!("{}/type/{}", BASE, category), json!({ "pokemon": members }));

        for name in names {
            fetcher.insert(
                format!("{}/pokemon/{}", BASE, name),
                json!({
                    "name": name,
                    "species": {"name": name, "url": format!("{}/pokemon-species/{}/", BASE, name)},
                    "sprites": {"front_default": format!("{}.png", name)}
                }),
            );
            fetcher.insert(format!("{}/pokemon-species/{}/", BASE, name), json!({}));
        }
    }

    fn context(fetcher: Arc<StaticFetcher>, seed: u64) -> TournamentContext {
        let mut config = TournamentConfig::default();
        config.dataset.base_url = BASE.to_string();
        config.tournament.seed = Some(seed);
        TournamentContext::new(fetcher, config).unwrap()
    }

    fn names(records: &[CreatureRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_end_to_end_example() {
        let ctx = context(fixture("normal", &["alpha", "beta", "gamma"]), 1);
        let normal = CategoryId::new("normal").unwrap();
        let mut state = ctx.start_tournament(&normal).await;

        // 直接指定对局，不依赖随机抽签
        let outcome = ctx.resolve_choice(&mut state, "alpha", "beta").unwrap();
        assert!(outcome.pair().is_some());
        let scores = ctx.scores(&normal).unwrap();
        assert_eq!((scores.get("alpha"), scores.get("beta"), scores.get("gamma")), (Some(1), Some(0), Some(0)));
        assert_eq!(names(state.pool()), vec!["alpha", "gamma"]);

        let outcome = ctx.resolve_choice(&mut state, "gamma", "alpha").unwrap();
        assert_eq!(names(state.pool()), vec!["gamma"]);

        let ranking = match outcome {
            RoundOutcome::Concluded(ranking) => ranking,
            other => panic!("expected conclusion, got {:?}", other),
        };
        let ranked: Vec<&str> = ranking.iter().map(|e| e.record.name.as_str()).collect();
        assert_eq!(ranked, vec!["alpha", "gamma", "beta"]);
        assert_eq!(names(&ctx.top_three(&normal)), vec!["alpha", "gamma", "beta"]);
        assert_eq!(state.phase(), TournamentPhase::Concluded);
    }

    #[tokio::test]
    async fn test_full_random_tournament() {
        let ctx = context(fixture("bug", &["a", "b", "c", "d", "e", "f"]), 42);
        let bug = CategoryId::new("bug").unwrap();
        let mut state = ctx.start_tournament(&bug).await;

        let mut outcome = ctx.next_pair(&mut state);
        let mut rounds = 0;
        while let RoundOutcome::Pair(matchup) = outcome {
            let before = ctx.scores(&bug).unwrap();
            let (winner, loser) = (matchup.second.name.clone(), matchup.first.name.clone());
            let pool_before = state.pool().len();

            outcome = ctx.resolve_choice(&mut state, &winner, &loser).unwrap();
            rounds += 1;

            let after = ctx.scores(&bug).unwrap();
            assert_eq!(after.get(&winner), before.get(&winner).map(|w| w + 1));
            for (name, wins) in before.iter() {
                assert!(after.get(name).unwrap() >= wins);
            }
            assert_eq!(state.pool().len(), pool_before - 1);
            assert!(!state.in_pool(&loser));
            assert!(state.in_pool(&winner));
        }

        assert_eq!(rounds, 5);
        assert_eq!(ctx.scores(&bug).unwrap().total_wins(), 5);
        match outcome {
            RoundOutcome::Concluded(ranking) => assert_eq!(ranking.len(), 3),
            other => panic!("expected conclusion, got {:?}", other),
        }
        assert_eq!(ctx.results().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_category_is_no_contest() {
        let ctx = context(Arc::new(StaticFetcher::new()), 1);
        let ghost = CategoryId::new("ghost").unwrap();
        let mut state = ctx.start_tournament(&ghost).await;

        assert_eq!(state.phase(), TournamentPhase::NoContest);
        assert_eq!(ctx.next_pair(&mut state), RoundOutcome::NoContest);
        assert!(ctx.top_three(&ghost).is_empty());
        assert!(matches!(
            ctx.resolve_choice(&mut state, "a", "b"),
            Err(TournamentError::TournamentOver(_))
        ));
    }

    #[tokio::test]
    async fn test_scores_exist_once_roster_is_built() {
        let ctx = context(fixture("normal", &["alpha", "beta", "gamma"]), 1);
        let normal = CategoryId::new("normal").unwrap();

        let roster = ctx.build_roster(&normal).await;
        assert_eq!(roster.len(), 3);

        let scores = ctx.scores(&normal).unwrap();
        assert_eq!(scores.len(), 3);
        assert_eq!(scores.total_wins(), 0);
        assert_eq!(names(&ctx.top_three(&normal)), vec!["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn test_unstarted_state_is_reported() {
        let ctx = context(fixture("normal", &["alpha", "beta"]), 1);
        let normal = CategoryId::new("normal").unwrap();
        let mut state = TournamentState::new(normal, RandomGenerator::with_seed(1));

        assert_eq!(ctx.next_pair(&mut state), RoundOutcome::NotStarted);
        assert!(ctx.results().is_empty());
    }

    #[tokio::test]
    async fn test_reset_keeps_scores_by_default() {
        let ctx = context(fixture("rock", &["onix", "geodude", "rhyhorn"]), 3);
        let rock = CategoryId::new("rock").unwrap();
        let mut state = ctx.start_tournament(&rock).await;

        ctx.resolve_choice(&mut state, "onix", "geodude").unwrap();
        let outcome = ctx.reset_tournament(&mut state);

        assert!(outcome.pair().is_some());
        assert_eq!(state.pool().len(), 3);
        assert_eq!(ctx.scores(&rock).unwrap().get("onix"), Some(1));

        // 再次开赛也不会清零
        let _again = ctx.start_tournament(&rock).await;
        assert_eq!(ctx.scores(&rock).unwrap().get("onix"), Some(1));
    }

    #[tokio::test]
    async fn test_reset_can_clear_scores() {
        let mut config = TournamentConfig::default();
        config.dataset.base_url = BASE.to_string();
        config.tournament.reset_clears_scores = true;
        let ctx = TournamentContext::new(fixture("rock", &["onix", "geodude"]), config).unwrap();
        let rock = CategoryId::new("rock").unwrap();

        let mut state = ctx.start_tournament(&rock).await;
        ctx.resolve_choice(&mut state, "onix", "geodude").unwrap();
        ctx.reset_tournament(&mut state);

        assert_eq!(ctx.scores(&rock).unwrap().get("onix"), Some(0));
    }

    #[tokio::test]
    async fn test_categories_are_independent() {
        let fetcher = fixture("fire", &["vulpix", "growlithe"]);
        add_category(&fetcher, "water", &["psyduck", "poliwag"]);
        let ctx = context(fetcher, 9);

        let fire = CategoryId::new("fire").unwrap();
        let water = CategoryId::new("water").unwrap();
        let mut fire_state = ctx.start_tournament(&fire).await;
        let _water_state = ctx.start_tournament(&water).await;

        ctx.resolve_choice(&mut fire_state, "growlithe", "vulpix").unwrap();

        assert_eq!(ctx.scores(&fire).unwrap().get("growlithe"), Some(1));
        assert_eq!(ctx.scores(&water).unwrap().total_wins(), 0);
        assert_eq!(names(&ctx.top_three(&fire)), vec!["growlithe", "vulpix"]);
    }

    #[tokio::test]
    async fn test_contexts_are_isolated() {
        let fetcher = fixture("ice", &["snorunt", "sneasel"]);
        let first = context(fetcher.clone(), 1);
        let second = context(fetcher, 1);
        let ice = CategoryId::new("ice").unwrap();

        let mut state = first.start_tournament(&ice).await;
        first.resolve_choice(&mut state, "snorunt", "sneasel").unwrap();
        second.start_tournament(&ice).await;

        assert_eq!(first.scores(&ice).unwrap().get("snorunt"), Some(1));
        assert_eq!(second.scores(&ice).unwrap().get("snorunt"), Some(0));
    }

    #[tokio::test]
    async fn test_seeded_draws_are_reproducible() {
        let fetcher = fixture("grass", &["oddish", "bellsprout", "tangela", "exeggcute"]);
        let ctx = context(fetcher, 77);
        let grass = CategoryId::new("grass").unwrap();

        let mut a = ctx.start_tournament(&grass).await;
        let mut b = ctx.start_tournament(&grass).await;
        assert_eq!(ctx.next_pair(&mut a), ctx.next_pair(&mut b));
    }
}
