use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Section name every strategy-class heading is reported under.
pub const STRATEGIES: &str = "Strategies";

/// Document titles that identify a DREF final report.
pub const FINAL_REPORT_NAMES: &[&str] = &[
    "DREF Operation Final Report",
    "DREF Final Report",
    "DREF Operation Final Report 1",
];

pub fn is_final_report(name: &str) -> bool {
    FINAL_REPORT_NAMES
        .iter()
        .any(|n| n.eq_ignore_ascii_case(name.trim()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub name: String,
    pub id: String,
    /// Aliases map onto a sector but never name it.
    #[serde(default)]
    pub canonical: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorKeyword {
    pub keyword: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorTaxonomy {
    pub sectors: Vec<Sector>,
    /// Checked in order before any name lookup; first contained keyword wins.
    pub keywords: Vec<SectorKeyword>,
}

fn sector(name: &str, id: &str, canonical: bool) -> Sector {
    Sector {
        name: name.to_string(),
        id: id.to_string(),
        canonical,
    }
}

fn keyword(keyword: &str, id: &str) -> SectorKeyword {
    SectorKeyword {
        keyword: keyword.to_string(),
        id: id.to_string(),
    }
}

impl Default for SectorTaxonomy {
    fn default() -> Self {
        SectorTaxonomy {
            sectors: vec![
                sector("Health", "Health", true),
                sector("Education", "Education", true),
                sector("Shelter and Settlements", "Shelter", true),
                sector("Disaster Risk Reduction and Climate Action", "Disaster", true),
                sector("Water Sanitation and Hygiene", "WASH", true),
                sector("Livelihoods and Basic Needs", "Live", true),
                sector("Strategies for implementation", STRATEGIES, true),
                sector("Protection, Gender and Inclusion", "PGI", true),
                sector("Migration and Displacement", "Migration", true),
                sector("National Society Strengthening", STRATEGIES, false),
                sector("National Society Capacity", STRATEGIES, false),
                sector("Strengthen National Society", STRATEGIES, false),
                sector("Strategies for Implementation", STRATEGIES, false),
                sector("International Disaster Response", STRATEGIES, false),
                sector("Influence others as leading strategic", STRATEGIES, false),
            ],
            keywords: vec![
                keyword("livelihoods", "Live"),
                keyword("water", "WASH"),
                keyword("shelter", "Shelter"),
                keyword("inclusion", "PGI"),
                keyword("protection", "PGI"),
                keyword("disaster", "Disaster"),
                keyword("health", "Health"),
            ],
        }
    }
}

impl SectorTaxonomy {
    /// Every name (canonical and alias) filed under `id`, in table order.
    pub fn names_with_id(&self, id: &str) -> Vec<&str> {
        self.sectors
            .iter()
            .filter(|s| s.id == id)
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sectors.is_empty() {
            return Err(ConfigError::Taxonomy("sector list is empty".into()));
        }
        if let Some(s) = self.sectors.iter().find(|s| s.name.trim().is_empty() || s.id.trim().is_empty()) {
            return Err(ConfigError::Taxonomy(format!("sector with blank name or id: {s:?}")));
        }
        if let Some(k) = self.keywords.iter().find(|k| k.keyword.trim().is_empty()) {
            return Err(ConfigError::Taxonomy(format!("blank sector keyword for {}", k.id)));
        }
        if self.names_with_id(STRATEGIES).is_empty() {
            return Err(ConfigError::Taxonomy(format!("no sector filed under {STRATEGIES}")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hazard {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardTaxonomy {
    pub hazards: Vec<Hazard>,
}

impl Default for HazardTaxonomy {
    fn default() -> Self {
        let hazard = |name: &str, keywords: &[&str]| Hazard {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };
        HazardTaxonomy {
            hazards: vec![
                hazard("Flood", &["floods", "flooding", "riverine flood"]),
                hazard("Drought", &["dry spell", "water shortage"]),
                hazard("Earthquake", &["quake", "seismic"]),
                hazard("Population Movement", &["displacement", "influx", "migrants", "refugees"]),
                hazard(
                    "Epidemic",
                    &["outbreak", "cholera", "dengue", "measles", "ebola", "yellow fever", "meningitis"],
                ),
                hazard("Cyclone", &["hurricane", "typhoon", "tropical storm"]),
                hazard("Volcanic Eruption", &["volcano", "volcanic"]),
                hazard("Civil Unrest", &["unrest", "clashes", "violence"]),
                hazard("Fire", &["fires", "wildfire", "forest fire"]),
                hazard("Food Insecurity", &["food crisis", "hunger"]),
                hazard("Tornado", &[]),
                hazard("Transport Accident", &["accident", "crash"]),
                hazard("Cold Wave", &["cold", "dzud", "snowfall"]),
                hazard("Storm Surge", &["surge", "tidal wave"]),
                hazard("Heat Wave", &["heatwave", "extreme heat"]),
                hazard("Pluvial/Flash Flood", &["flash flood", "flash floods", "pluvial"]),
            ],
        }
    }
}

impl HazardTaxonomy {
    pub fn contains(&self, name: &str) -> bool {
        self.hazards.iter().any(|h| h.name == name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hazards.is_empty() {
            return Err(ConfigError::Taxonomy("hazard list is empty".into()));
        }
        match self.hazards.iter().find(|h| h.name.trim().is_empty()) {
            Some(_) => Err(ConfigError::Taxonomy("hazard with blank name".into())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_start_with_canonical_entry() {
        let t = SectorTaxonomy::default();
        let names = t.names_with_id(STRATEGIES);
        assert_eq!(names[0], "Strategies for implementation");
        assert!(names.contains(&"National Society Strengthening"));
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn default_taxonomies_validate() {
        assert!(SectorTaxonomy::default().validate().is_ok());
        assert!(HazardTaxonomy::default().validate().is_ok());
    }

    #[test]
    fn empty_taxonomy_is_rejected() {
        let t = SectorTaxonomy {
            sectors: Vec::new(),
            keywords: Vec::new(),
        };
        assert!(matches!(t.validate(), Err(ConfigError::Taxonomy(_))));
    }

    #[test]
    fn final_report_names() {
        assert!(is_final_report("DREF Final Report"));
        assert!(is_final_report("dref operation final report "));
        assert!(!is_final_report("Operation Update"));
    }
}
