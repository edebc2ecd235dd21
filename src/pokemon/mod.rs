// 宝可梦数据管线
// 开发心理：类别成员 → 详情 → 过滤 → 进化线和图片 → 花名册，每一步都容忍单条数据失败

pub mod evolution;
pub mod filter;
pub mod loader;
pub mod species;
pub mod sprites;
pub mod types;

// 重新导出主要类型
pub use evolution::{ChainNode, LineageResolver};
pub use filter::ExclusionFilter;
pub use loader::{dedupe_by_name, RosterBuilder};
pub use species::{CreatureRecord, LineageNode};
pub use sprites::{select_sprite, ImageResolver, SpriteSource};
pub use types::{CategoryId, PokemonType};
