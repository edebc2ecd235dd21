/*
* 开发心理过程：
* 1. 对战配对：从对战池中均匀抽取两个不同下标
* 2. 支持固定种子，测试和复盘时序列可重现
* 3. 统计抽样次数，便于调试
*/

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

/// 可设定种子的随机数生成器
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    rng: StdRng,
    seed: u64,
    draws: u64,
}

impl RandomGenerator {
    /// 使用系统熵生成种子
    pub fn new() -> Self {
        Self::with_seed(rand::random::<u64>())
    }

    /// 使用指定种子创建
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            draws: 0,
        }
    }

    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map(Self::with_seed).unwrap_or_default()
    }

    pub fn get_seed(&self) -> u64 {
        self.seed
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// 从 `0..len` 中不放回地均匀抽取两个不同下标。`len < 2` 时返回 None。
    pub fn pick_pair(&mut self, len: usize) -> Option<(usize, usize)> {
        if len < 2 {
            return None;
        }

        self.draws += 1;
        let picked = index::sample(&mut self.rng, len, 2);
        Some((picked.index(0), picked.index(1)))
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}
