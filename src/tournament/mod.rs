// 锦标赛模块
// 开发心理：引擎只管对战池和配对，排名只管胜场表，上下文负责把二者和花名册串起来

pub mod context;
pub mod engine;
pub mod ranking;

pub use context::{RoundOutcome, TournamentContext};
pub use engine::{Matchup, TournamentPhase, TournamentState};
pub use ranking::{rank_top, RankedEntry, ScoreTable, TOP_THREE};
