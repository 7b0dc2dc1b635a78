use crate::taxonomy::{Hazard, HazardTaxonomy, SectorTaxonomy};

pub const UNKNOWN: &str = "Unknown";
pub const OTHER_HAZARD: &str = "Other";

/// Separators between country and hazard in a report title, most specific first.
const TITLE_SEPARATORS: &[&str] = &[" - ", "-", ": ", ":", " "];

/// Short sector id for a section name.
///
/// Keyword containment wins over exact id and then exact name matches.
pub fn shorten_sector<'t>(section: &str, taxonomy: &'t SectorTaxonomy) -> &'t str {
    let lower = section.to_lowercase();
    if let Some(k) = taxonomy
        .keywords
        .iter()
        .find(|k| lower.contains(&k.keyword.to_lowercase()))
    {
        return &k.id;
    }

    let wanted = section.trim();
    if let Some(s) = taxonomy
        .sectors
        .iter()
        .find(|s| s.id.trim().eq_ignore_ascii_case(wanted))
    {
        return &s.id;
    }
    taxonomy
        .sectors
        .iter()
        .find(|s| s.name.trim().eq_ignore_ascii_case(wanted))
        .map_or(UNKNOWN, |s| s.id.as_str())
}

/// Display name of a sector id; aliases never name a sector.
pub fn full_sector_name<'t>(sector_id: &str, taxonomy: &'t SectorTaxonomy) -> &'t str {
    let wanted = sector_id.trim();
    taxonomy
        .sectors
        .iter()
        .filter(|s| s.canonical)
        .find(|s| s.id.trim().eq_ignore_ascii_case(wanted))
        .map_or(UNKNOWN, |s| s.name.as_str())
}

/// Country and hazard parts of a report title like "Bolivia: Floods".
pub fn split_report_title(title: &str) -> (&str, &str) {
    TITLE_SEPARATORS
        .iter()
        .find_map(|sep| title.split_once(*sep))
        .map_or((title, ""), |(a, b)| (a.trim_matches(' '), b.trim_matches(' ')))
}

fn hazard_terms(h: &Hazard) -> Vec<String> {
    std::iter::once(h.name.to_lowercase())
        .chain(h.keywords.iter().map(|k| k.to_lowercase()))
        .collect()
}

/// Official hazard for a report, from its disaster type or else its title.
pub fn official_hazard_name(disaster_type: &str, title: &str, hazards: &HazardTaxonomy) -> String {
    if hazards.contains(disaster_type) {
        return disaster_type.to_string();
    }

    let from_title = split_report_title(title).1.trim().to_lowercase();
    if from_title.is_empty() {
        return OTHER_HAZARD.to_string();
    }
    if let Some(h) = hazards
        .hazards
        .iter()
        .find(|h| hazard_terms(h).iter().any(|n| *n == from_title))
    {
        return h.name.clone();
    }
    hazards
        .hazards
        .iter()
        .find(|h| hazard_terms(h).iter().any(|n| from_title.contains(n.as_str())))
        .map_or_else(|| OTHER_HAZARD.to_string(), |h| h.name.clone())
}
