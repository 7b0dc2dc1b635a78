pub mod boilerplate;
pub mod classify;
pub mod clean;
pub mod locate;
pub mod regions;
pub mod sections;
pub mod segment;
pub mod stitch;
pub mod text;

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{EngineConfig, Settings};
use crate::input::DocumentInput;
use crate::taxonomy::SectorTaxonomy;
use boilerplate::BoilerplatePattern;
use regions::Region;
use sections::Section;

/// Per-page text blocks from the PDF conversion, aligned by page index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageFragments {
    pub headers: Vec<String>,
    pub footers: Vec<String>,
    pub post_headers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExcerptKind {
    #[serde(rename = "Challenges")]
    Challenge,
    #[serde(rename = "Lessons Learnt")]
    LessonLearnt,
}

impl ExcerptKind {
    pub fn label(self) -> &'static str {
        match self {
            ExcerptKind::Challenge => "Challenges",
            ExcerptKind::LessonLearnt => "Lessons Learnt",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Challenges" => Some(ExcerptKind::Challenge),
            "Lessons Learnt" => Some(ExcerptKind::LessonLearnt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Excerpt {
    /// Byte offset of the anchor the excerpt was cut from, in the boilerplate-free text.
    pub position: usize,
    pub text: String,
    pub kind: ExcerptKind,
    pub section: String,
    pub sector_id: String,
    pub sector_name: String,
    pub lead: String,
}

/// A report with its boilerplate removed. Every position it hands out indexes
/// [`Document::text`].
pub struct Document<'a> {
    text: String,
    boilerplate: Vec<BoilerplatePattern>,
    config: &'a EngineConfig,
    sectors: &'a SectorTaxonomy,
    sections: OnceLock<Vec<Section>>,
}

impl<'a> Document<'a> {
    pub fn new(
        raw: &str,
        pages: &PageFragments,
        config: &'a EngineConfig,
        sectors: &'a SectorTaxonomy,
    ) -> Self {
        let (text, boilerplate) = boilerplate::strip_boilerplate(raw, pages, config);
        Document {
            text,
            boilerplate,
            config,
            sectors,
            sections: OnceLock::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn boilerplate(&self) -> &[BoilerplatePattern] {
        &self.boilerplate
    }

    pub fn sections(&self) -> &[Section] {
        self.sections
            .get_or_init(|| sections::find_all(&self.text, self.sectors, self.config))
    }

    pub fn section_at(&self, position: usize) -> &str {
        sections::section_at(self.sections(), position)
    }

    pub fn challenges(&self) -> Vec<Region> {
        regions::challenge_regions(&self.text, self.config)
            .iter()
            .flat_map(|r| clean::split_and_clean(r, self.config.max_strip_passes))
            .collect()
    }

    /// Lessons excerpts, cut short at the first all-capitals entry (a captured title).
    pub fn lessons_learnt(&self) -> Vec<Region> {
        regions::lessons_regions(&self.text, self.config)
            .iter()
            .flat_map(|r| clean::split_and_clean(r, self.config.max_strip_passes))
            .take_while(|r| !clean::is_shouting(&r.text))
            .collect()
    }

    /// Every excerpt of the report, challenges first, tagged with section and sector.
    pub fn excerpts(&self, lead: &str) -> Vec<Excerpt> {
        let challenges = self.challenges();
        let lessons = self.lessons_learnt();
        debug!(
            lead,
            challenges = challenges.len(),
            lessons = lessons.len(),
            sections = self.sections().len(),
            "excerpts extracted"
        );

        challenges
            .into_iter()
            .map(|r| (r, ExcerptKind::Challenge))
            .chain(lessons.into_iter().map(|r| (r, ExcerptKind::LessonLearnt)))
            .map(|(region, kind)| {
                let section = self.section_at(region.position).to_string();
                let sector_id = classify::shorten_sector(&section, self.sectors).to_string();
                let sector_name = classify::full_sector_name(&sector_id, self.sectors).to_string();
                Excerpt {
                    position: region.position,
                    text: region.text,
                    kind,
                    section,
                    sector_id,
                    sector_name,
                    lead: lead.to_string(),
                }
            })
            .collect()
    }
}

/// Everything kept about one processed report.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedReport {
    pub lead: String,
    pub hazard: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub date: Option<String>,
    pub boilerplate: Vec<BoilerplatePattern>,
    pub sections: usize,
    pub excerpts: Vec<Excerpt>,
}

pub fn process_document(doc: &DocumentInput, settings: &Settings) -> ProcessedReport {
    let document = Document::new(&doc.text, &doc.pages, &settings.engine, &settings.sectors);
    debug!(
        lead = %doc.lead,
        raw = doc.text.len(),
        stripped = document.text().len(),
        "boilerplate removed"
    );
    let excerpts = document.excerpts(&doc.lead);
    let meta = doc.meta.clone().unwrap_or_default();
    let hazard = match (&meta.disaster_type, &meta.title) {
        (None, None) => None,
        (dtype, title) => Some(classify::official_hazard_name(
            dtype.as_deref().unwrap_or(""),
            title.as_deref().unwrap_or(""),
            &settings.hazards,
        )),
    };
    let date = meta
        .date()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .or_else(|| meta.start_date.as_ref().map(|s| s.chars().take(10).collect()));

    ProcessedReport {
        lead: doc.lead.clone(),
        hazard,
        country: meta.country,
        region: meta.region,
        date,
        boilerplate: document.boilerplate().to_vec(),
        sections: document.sections().len(),
        excerpts,
    }
}
