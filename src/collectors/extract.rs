//! Field extraction for the public job-posting page layout.
//!
//! Every field is looked up on its own. A field that cannot be found is left
//! as `None` and logged; the remaining fields are still extracted.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::fetch::Document;

/// Present on a posting page once applications are closed.
pub const CLOSED_LISTING_MARKER: &str = "body > div.base-serp-page";

static CLOSED_LISTING: LazyLock<Selector> = LazyLock::new(|| selector(CLOSED_LISTING_MARKER));
static JOB_NAME: LazyLock<Selector> =
    LazyLock::new(|| selector("section.top-card-layout h1.top-card-layout__title"));
static COMPANY_NAME: LazyLock<Selector> = LazyLock::new(|| selector("a.topcard__org-name-link"));
static COMPANY_NAME_FALLBACK: LazyLock<Selector> =
    LazyLock::new(|| selector("span.topcard__flavor"));
static JOB_LOCATION: LazyLock<Selector> =
    LazyLock::new(|| selector("span.topcard__flavor.topcard__flavor--bullet"));
static CRITERIA_SECTION: LazyLock<Selector> =
    LazyLock::new(|| selector("div.decorated-job-posting__details"));
static CRITERIA_ITEM: LazyLock<Selector> =
    LazyLock::new(|| selector("li.description__job-criteria-item"));
static CRITERIA_HEADER: LazyLock<Selector> =
    LazyLock::new(|| selector("h3.description__job-criteria-subheader"));
static CRITERIA_VALUE: LazyLock<Selector> = LazyLock::new(|| {
    selector("span.description__job-criteria-text.description__job-criteria-text--criteria")
});
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector("div.show-more-less-html__markup"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static CSS selector is valid")
}

/// Entries of the "criteria" list under the description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    Level,
    EmploymentType,
    Function,
    Sector,
}

impl Criterion {
    pub fn field_name(self) -> &'static str {
        match self {
            Criterion::Level => "job_level",
            Criterion::EmploymentType => "job_type",
            Criterion::Function => "job_category",
            Criterion::Sector => "job_sector",
        }
    }

    /// Header labels, French page first, then English.
    fn labels(self) -> &'static [&'static str] {
        match self {
            Criterion::Level => &["Niveau hiérarchique", "Seniority level"],
            Criterion::EmploymentType => &["Type d’emploi", "Type d'emploi", "Employment type"],
            Criterion::Function => &["Fonction", "Job function"],
            Criterion::Sector => &["Secteurs", "Industries"],
        }
    }
}

/// Raw extraction result, one `Option` per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub job_name: Option<String>,
    pub company_name: Option<String>,
    pub job_location: Option<String>,
    pub job_level: Option<String>,
    pub job_type: Option<String>,
    pub job_category: Option<String>,
    pub job_sector: Option<String>,
    pub job_description: Option<String>,
}

/// Every field of a posting, all of them found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPosting {
    pub job_name: String,
    pub company_name: String,
    pub job_location: String,
    pub job_level: String,
    pub job_type: String,
    pub job_category: String,
    pub job_sector: String,
    pub job_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Complete(JobPosting),
    Partial {
        fields: ExtractedFields,
        missing: Vec<&'static str>,
    },
}

impl ExtractedFields {
    /// Names of the fields that were not found, in column order.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("job_name", &self.job_name),
            ("company_name", &self.company_name),
            ("job_location", &self.job_location),
            ("job_level", &self.job_level),
            ("job_type", &self.job_type),
            ("job_category", &self.job_category),
            ("job_sector", &self.job_sector),
            ("job_description", &self.job_description),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    fn complete(self) -> Result<JobPosting, Self> {
        match self {
            ExtractedFields {
                job_name: Some(job_name),
                company_name: Some(company_name),
                job_location: Some(job_location),
                job_level: Some(job_level),
                job_type: Some(job_type),
                job_category: Some(job_category),
                job_sector: Some(job_sector),
                job_description: Some(job_description),
            } => Ok(JobPosting {
                job_name,
                company_name,
                job_location,
                job_level,
                job_type,
                job_category,
                job_sector,
                job_description,
            }),
            partial => Err(partial),
        }
    }
}

pub fn extract(document: &Document) -> Extraction {
    let html = document.html();

    let fields = ExtractedFields {
        job_name: found("job_name", select_text(html, &JOB_NAME)),
        company_name: found(
            "company_name",
            select_text(html, &COMPANY_NAME).or_else(|| select_text(html, &COMPANY_NAME_FALLBACK)),
        ),
        job_location: found("job_location", select_text(html, &JOB_LOCATION)),
        job_level: criterion(html, Criterion::Level),
        job_type: criterion(html, Criterion::EmploymentType),
        job_category: criterion(html, Criterion::Function),
        job_sector: criterion(html, Criterion::Sector),
        job_description: found("job_description", select_description(html)),
    };

    match fields.complete() {
        Ok(posting) => Extraction::Complete(posting),
        Err(fields) => {
            let missing = fields.missing();
            Extraction::Partial { fields, missing }
        }
    }
}

pub fn is_listing_closed(document: &Document) -> bool {
    document.html().select(&CLOSED_LISTING).next().is_some()
}

fn found(field: &'static str, value: Option<String>) -> Option<String> {
    if value.is_none() {
        tracing::warn!(field, "Field not found on page");
    }
    value
}

fn criterion(html: &Html, criterion: Criterion) -> Option<String> {
    found(criterion.field_name(), select_criterion(html, criterion))
}

/// Trim and normalize the typographic apostrophe. Blank text counts as absent.
fn clean(text: &str) -> Option<String> {
    let text = text.trim().replace('’', "'");
    if text.is_empty() { None } else { Some(text) }
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    clean(&element.text().collect::<String>())
}

fn select_text(html: &Html, selector: &Selector) -> Option<String> {
    html.select(selector).next().and_then(element_text)
}

fn select_criterion(html: &Html, criterion: Criterion) -> Option<String> {
    let details = html.select(&CRITERIA_SECTION).next()?;
    details.select(&CRITERIA_ITEM).find_map(|entry| {
        let label = entry.select(&CRITERIA_HEADER).next()?.text().collect::<String>();
        let label = label.trim();
        if !criterion.labels().iter().any(|wanted| label.contains(wanted)) {
            return None;
        }
        entry.select(&CRITERIA_VALUE).next().and_then(element_text)
    })
}

/// Description text nodes joined by single spaces, with newlines flattened
/// and quotes reduced to the ASCII apostrophe.
fn select_description(html: &Html) -> Option<String> {
    let element = html.select(&DESCRIPTION).next()?;

    let text = element
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\n', " ")
        .replace('’', "'")
        .replace('"', "'");

    if text.is_empty() { None } else { Some(text) }
}
