// 排名阶段
// 开发心理：累计胜场决定名次，同分按花名册顺序排列，保证结果可重复
// 稳定排序：sort_by 对相等元素保持原有顺序

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::pokemon::species::CreatureRecord;

pub const TOP_THREE: usize = 3;

/// 单个类别的胜场表，条目只增不删，分数只增不减。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTable {
    wins: IndexMap<String, u32>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_roster(roster: &[CreatureRecord]) -> Self {
        let mut table = Self::new();
        table.register_all(roster);
        table
    }

    /// 为尚未登记的成员补零，已有分数保持不变。
    pub fn register_all(&mut self, roster: &[CreatureRecord]) {
        for record in roster {
            self.wins.entry(record.name.clone()).or_insert(0);
        }
    }

    /// 记一场胜利，返回新的胜场数。
    pub fn credit_win(&mut self, name: &str) -> u32 {
        let wins = self.wins.entry(name.to_string()).or_insert(0);
        *wins += 1;
        *wins
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.wins.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.wins.contains_key(name)
    }

    /// 所有分数归零，条目保留。
    pub fn clear_scores(&mut self) {
        for wins in self.wins.values_mut() {
            *wins = 0;
        }
    }

    pub fn total_wins(&self) -> u32 {
        self.wins.values().sum()
    }

    pub fn len(&self) -> usize {
        self.wins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.wins.iter().map(|(name, wins)| (name.as_str(), *wins))
    }
}

/// 排行榜中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub wins: u32,
    pub record: CreatureRecord,
}

/// 取胜场最多的前 `n` 名。只考虑花名册中且有分数记录的成员；
/// 同分时保持花名册顺序。
pub fn rank_top(roster: &[CreatureRecord], scores: &ScoreTable, n: usize) -> Vec<RankedEntry> {
    let mut scored: Vec<(&CreatureRecord, u32)> = roster
        .iter()
        .filter_map(|record| scores.get(&record.name).map(|wins| (record, wins)))
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));

    scored
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (record, wins))| RankedEntry {
            rank: i + 1,
            wins,
            record: record.clone(),
        })
        .collect()
}
