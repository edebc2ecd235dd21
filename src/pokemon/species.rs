// 宝可梦记录与数据集载荷
// 开发心理：对外只暴露名字、图片和进化线三样东西，数据集里的原始结构只在解析时出现
// 原始载荷字段都做成可缺省，缺字段的记录在管线里被丢弃而不是让整个请求失败

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 进化线上的一个阶段。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageNode {
    pub name: String,
    pub image_url: String,
}

impl LineageNode {
    pub fn new(name: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_url: image_url.into(),
        }
    }
}

/// 花名册中的一只宝可梦，名字在同一类别内唯一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureRecord {
    pub name: String,
    pub image_url: String,
    pub lineage: Vec<LineageNode>,
}

impl CreatureRecord {
    pub fn new(name: impl Into<String>, image_url: impl Into<String>, lineage: Vec<LineageNode>) -> Self {
        Self {
            name: name.into(),
            image_url: image_url.into(),
            lineage,
        }
    }

    pub fn has_lineage(&self) -> bool {
        !self.lineage.is_empty()
    }
}

// 数据集中的 {name, url} 引用
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

/// 资源地址的最后一段，例如 `.../pokemon-species/25/` 得到 `25`。
pub fn resource_key(url: &str) -> Option<&str> {
    url.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
}

// GET /type/{category}
#[derive(Debug, Clone, Deserialize)]
pub struct TypeResponse {
    #[serde(default)]
    pub pokemon: Vec<TypeMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeMember {
    pub pokemon: NamedResource,
}

// GET /pokemon/{name}
#[derive(Debug, Clone, Deserialize)]
pub struct PokemonDetail {
    pub name: String,
    pub species: NamedResource,
    #[serde(default)]
    pub sprites: Value,
}

// GET /pokemon-species/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesResponse {
    #[serde(default)]
    pub evolution_chain: Option<ChainReference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainReference {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_key() {
        assert_eq!(resource_key("https://pokeapi.co/api/v2/pokemon-species/25/"), Some("25"));
        assert_eq!(resource_key("https://pokeapi.co/api/v2/pokemon-species/133"), Some("133"));
        assert_eq!(resource_key(""), None);
        assert_eq!(resource_key("https://"), None);
    }

    #[test]
    fn test_type_response_parsing() {
        let payload = json!({
            "name": "fire",
            "pokemon": [
                {"pokemon": {"name": "charmander", "url": "https://x/pokemon/4/"}, "slot": 1},
                {"pokemon": {"name": "vulpix", "url": "https://x/pokemon/37/"}, "slot": 1}
            ]
        });

        let parsed: TypeResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(parsed.pokemon.len(), 2);
        assert_eq!(parsed.pokemon[1].pokemon.name, "vulpix");
    }

    #[test]
    fn test_species_without_chain() {
        let parsed: SpeciesResponse = serde_json::from_value(json!({"name": "tauros"})).unwrap();
        assert!(parsed.evolution_chain.is_none());

        let parsed: SpeciesResponse =
            serde_json::from_value(json!({"evolution_chain": null})).unwrap();
        assert!(parsed.evolution_chain.is_none());
    }

    #[test]
    fn test_detail_requires_species() {
        let result = serde_json::from_value::<PokemonDetail>(json!({"name": "missingno"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_record_lineage_flag() {
        let record = CreatureRecord::new("tauros", "t.png", Vec::new());
        assert!(!record.has_lineage());

        let record = CreatureRecord::new("tauros", "t.png", vec![LineageNode::new("tauros", "t.png")]);
        assert!(record.has_lineage());
    }
}
