// 淘汰赛引擎
// 开发心理：每轮从对战池随机抽两只，玩家选出胜者，败者出局，直到池中不足两只
// 状态机：未初始化 → 等待配对 → 本轮结算 → 结束（空花名册直接进入“无比赛”）

use serde::{Deserialize, Serialize};
use log::{debug, info};

use crate::core::error::{Result, TournamentError};
use crate::data::cache::Roster;
use crate::pokemon::species::CreatureRecord;
use crate::pokemon::types::CategoryId;
use crate::utils::random::RandomGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentPhase {
    Uninitialized,
    AwaitingPair,
    RoundResolved,
    Concluded,
    NoContest,
}

impl TournamentPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TournamentPhase::Concluded | TournamentPhase::NoContest)
    }
}

/// 一轮对战的两只宝可梦
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    pub first: CreatureRecord,
    pub second: CreatureRecord,
}

impl Matchup {
    pub fn involves(&self, name: &str) -> bool {
        self.first.name == name || self.second.name == name
    }

    pub fn names(&self) -> (&str, &str) {
        (&self.first.name, &self.second.name)
    }
}

#[derive(Debug, Clone)]
pub struct TournamentState {
    category: CategoryId,
    roster: Roster,
    pool: Vec<CreatureRecord>,
    phase: TournamentPhase,
    current: Option<Matchup>,
    rounds: u32,
    rng: RandomGenerator,
}

impl TournamentState {
    pub fn new(category: CategoryId, rng: RandomGenerator) -> Self {
        Self {
            category,
            roster: Roster::default(),
            pool: Vec::new(),
            phase: TournamentPhase::Uninitialized,
            current: None,
            rounds: 0,
            rng,
        }
    }

    /// 载入花名册，对战池为其副本。空花名册进入“无比赛”。
    pub fn begin(&mut self, roster: Roster) {
        self.pool = roster.to_vec();
        self.roster = roster;
        self.current = None;

        self.phase = if self.pool.is_empty() {
            info!("类别 {} 没有有效的宝可梦，无法开赛", self.category);
            TournamentPhase::NoContest
        } else {
            info!("锦标赛开始: {} ({} 只宝可梦)", self.category, self.pool.len());
            TournamentPhase::AwaitingPair
        };
    }

    /// 重新复制花名册到对战池，轮数清零。
    pub fn reset(&mut self) {
        let roster = self.roster.clone();
        self.rounds = 0;
        self.begin(roster);
    }

    /// 抽取下一对。已有未决配对时原样返回；池中不足两只时进入结束状态并返回 None。
    pub fn draw_pair(&mut self) -> Option<Matchup> {
        if self.phase.is_terminal() || self.phase == TournamentPhase::Uninitialized {
            return None;
        }

        if let Some(current) = &self.current {
            return Some(current.clone());
        }

        let (i, j) = match self.rng.pick_pair(self.pool.len()) {
            Some(pair) => pair,
            None => {
                info!("锦标赛结束: {} (共 {} 轮)", self.category, self.rounds);
                self.phase = TournamentPhase::Concluded;
                return None;
            }
        };

        let matchup = Matchup {
            first: self.pool[i].clone(),
            second: self.pool[j].clone(),
        };
        debug!("第{}轮: {} vs {}", self.rounds + 1, matchup.first.name, matchup.second.name);

        self.phase = TournamentPhase::AwaitingPair;
        self.current = Some(matchup.clone());
        Some(matchup)
    }

    /// 结算一轮：校验后从池中移除败者的一次出现，胜者留下。
    pub fn eliminate(&mut self, winner: &str, loser: &str) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(TournamentError::TournamentOver(self.category.to_string()));
        }
        if winner == loser {
            return Err(TournamentError::SameContender(winner.to_string()));
        }
        if !self.in_pool(winner) {
            return Err(TournamentError::NotInPool(winner.to_string()));
        }

        let position = self
            .pool
            .iter()
            .position(|record| record.name == loser)
            .ok_or_else(|| TournamentError::NotInPool(loser.to_string()))?;

        self.pool.remove(position);
        self.rounds += 1;
        self.current = None;
        self.phase = TournamentPhase::RoundResolved;
        debug!("{} 胜出，{} 出局，剩余 {} 只", winner, loser, self.pool.len());
        Ok(())
    }

    pub fn in_pool(&self, name: &str) -> bool {
        self.pool.iter().any(|record| record.name == name)
    }

    pub fn category(&self) -> &CategoryId {
        &self.category
    }

    pub fn roster(&self) -> &[CreatureRecord] {
        &self.roster
    }

    pub fn pool(&self) -> &[CreatureRecord] {
        &self.pool
    }

    pub fn phase(&self) -> TournamentPhase {
        self.phase
    }

    pub fn current_pair(&self) -> Option<&Matchup> {
        self.current.as_ref()
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}
