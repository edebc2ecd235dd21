// Pokemon属性类别
// 开发心理：锦标赛按属性分组，类别标识本身是不透明字符串，18种属性只作为已知目录
// 设计原则：CategoryId只校验非空，PokemonType提供外部枚举的类别列表

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::{Result, TournamentError};

/// 类别标识，统一为去空白的小写字符串。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let normalized = raw.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(TournamentError::EmptyCategory);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CategoryId {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CategoryId {
    type Error = TournamentError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CategoryId> for String {
    fn from(id: CategoryId) -> Self {
        id.0
    }
}

impl From<PokemonType> for CategoryId {
    fn from(ty: PokemonType) -> Self {
        Self(ty.as_str().to_string())
    }
}

// Pokemon属性类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PokemonType {
    Normal,     // 一般
    Fire,       // 火
    Water,      // 水
    Grass,      // 草
    Flying,     // 飞行
    Fighting,   // 格斗
    Poison,     // 毒
    Electric,   // 电
    Ground,     // 地面
    Rock,       // 岩石
    Psychic,    // 超能力
    Ice,        // 冰
    Bug,        // 虫
    Ghost,      // 幽灵
    Steel,      // 钢
    Dragon,     // 龙
    Dark,       // 恶
    Fairy,      // 妖精
}

impl PokemonType {
    pub const ALL: [PokemonType; 18] = [
        PokemonType::Normal,
        PokemonType::Fire,
        PokemonType::Water,
        PokemonType::Grass,
        PokemonType::Flying,
        PokemonType::Fighting,
        PokemonType::Poison,
        PokemonType::Electric,
        PokemonType::Ground,
        PokemonType::Rock,
        PokemonType::Psychic,
        PokemonType::Ice,
        PokemonType::Bug,
        PokemonType::Ghost,
        PokemonType::Steel,
        PokemonType::Dragon,
        PokemonType::Dark,
        PokemonType::Fairy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PokemonType::Normal => "normal",
            PokemonType::Fire => "fire",
            PokemonType::Water => "water",
            PokemonType::Grass => "grass",
            PokemonType::Flying => "flying",
            PokemonType::Fighting => "fighting",
            PokemonType::Poison => "poison",
            PokemonType::Electric => "electric",
            PokemonType::Ground => "ground",
            PokemonType::Rock => "rock",
            PokemonType::Psychic => "psychic",
            PokemonType::Ice => "ice",
            PokemonType::Bug => "bug",
            PokemonType::Ghost => "ghost",
            PokemonType::Steel => "steel",
            PokemonType::Dragon => "dragon",
            PokemonType::Dark => "dark",
            PokemonType::Fairy => "fairy",
        }
    }

    pub fn chinese_name(&self) -> &'static str {
        match self {
            PokemonType::Normal => "一般",
            PokemonType::Fire => "火",
            PokemonType::Water => "水",
            PokemonType::Grass => "草",
            PokemonType::Flying => "飞行",
            PokemonType::Fighting => "格斗",
            PokemonType::Poison => "毒",
            PokemonType::Electric => "电",
            PokemonType::Ground => "地面",
            PokemonType::Rock => "岩石",
            PokemonType::Psychic => "超能力",
            PokemonType::Ice => "冰",
            PokemonType::Bug => "虫",
            PokemonType::Ghost => "幽灵",
            PokemonType::Steel => "钢",
            PokemonType::Dragon => "龙",
            PokemonType::Dark => "恶",
            PokemonType::Fairy => "妖精",
        }
    }
}

impl FromStr for PokemonType {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        PokemonType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == needle)
            .ok_or_else(|| TournamentError::Config(format!("未知属性: {}", s)))
    }
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
