use tracing::debug;

use super::locate::{locate, locate_any, Search};
use super::text::{bottom_line, drop_spaces_between_linebreaks, only_spaces_after_last_linebreak, trim_breaks_end};
use crate::config::EngineConfig;
use crate::taxonomy::{SectorTaxonomy, STRATEGIES};

/// Section name reported for positions ahead of every section.
pub const BEFORE_ALL: &str = "before";

/// "People reached"-style markers that follow a sector title in the classic template.
const CLASSIC_MARKERS: &[&str] = &[
    "\nPeople reached",
    "\nPeople targeted",
    "\nPopulation reached",
    "\nPopulation targeted",
    "\nTotal number of people reached",
];

const NEW_TEMPLATE_MARKER: &str = "reached";
const NEW_TEMPLATE_LABEL: &str = "Persons";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub position: usize,
    pub name: String,
}

fn back_search(config: &EngineConfig) -> Search<'static> {
    Search {
        before: config.section_back_window,
        ..Search::default()
    }
}

/// Sector titles sitting on the last line above a classic "reached/targeted" marker.
pub fn find_classic(text: &str, config: &EngineConfig) -> Vec<Section> {
    let hits = locate_any(CLASSIC_MARKERS, text, &back_search(config));
    let mut sections = Vec::with_capacity(hits.len());
    for (i, hit) in hits.iter().enumerate() {
        // "reached" right after "targeted" belongs to the same title.
        if i > 0 && hit.position < hits[i - 1].position + config.section_min_gap {
            continue;
        }
        sections.push(Section {
            position: hit.position,
            name: bottom_line(hit.before_match()).to_string(),
        });
    }
    sections
}

/// Strategy-class headings, only where the name opens its own line.
pub fn find_strategy(text: &str, taxonomy: &SectorTaxonomy, config: &EngineConfig) -> Vec<Section> {
    let names = taxonomy.names_with_id(STRATEGIES);
    locate_any(&names, text, &back_search(config))
        .into_iter()
        .filter(|hit| only_spaces_after_last_linebreak(hit.before_match()))
        .map(|hit| Section {
            position: hit.position,
            name: STRATEGIES.to_string(),
        })
        .collect()
}

/// New-template sector blocks, recognised by a "Persons" label right above "reached".
pub fn find_new_template(text: &str, config: &EngineConfig) -> Vec<Section> {
    locate(NEW_TEMPLATE_MARKER, text, &back_search(config))
        .into_iter()
        .filter(|hit| bottom_line(hit.before_match()) == NEW_TEMPLATE_LABEL)
        .map(|hit| Section {
            position: hit.position,
            name: new_template_title(hit.before_match()),
        })
        .collect()
}

/// Title above the "Persons" label, back to the previous blank-line run, with its
/// linebreaks removed.
fn new_template_title(context: &str) -> String {
    let head = match context.rfind(NEW_TEMPLATE_LABEL) {
        Some(i) => &context[..i],
        None => context,
    };
    let head = drop_spaces_between_linebreaks(trim_breaks_end(head));
    let block = match head.rfind("\n\n\n") {
        Some(i) => &head[i..],
        None => head.as_str(),
    };
    block.replace('\n', "").trim_matches(' ').to_string()
}

/// All sections from the three finders, classic first. Not sorted by position.
pub fn find_all(text: &str, taxonomy: &SectorTaxonomy, config: &EngineConfig) -> Vec<Section> {
    let classic = find_classic(text, config);
    let strategy = find_strategy(text, taxonomy, config);
    let new_template = find_new_template(text, config);
    debug!(
        classic = classic.len(),
        strategy = strategy.len(),
        new_template = new_template.len(),
        "sections located"
    );
    classic
        .into_iter()
        .chain(strategy)
        .chain(new_template)
        .collect()
}

/// Name of the nearest section starting strictly before `position`.
pub fn section_at(sections: &[Section], position: usize) -> &str {
    sections
        .iter()
        .filter(|s| s.position < position)
        .min_by_key(|s| position - s.position)
        .map_or(BEFORE_ALL, |s| s.name.as_str())
}
