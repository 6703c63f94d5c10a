//! Monthly deduplication key for job postings.
//!
//! The same posting (name, company, location) scraped twice within one
//! calendar month yields the same key, which the `jobs_information.dedup_id`
//! unique constraint then rejects.

use chrono::{Datelike, NaiveDate};

/// MD5 over `MMYYYY_name_company_location`, each part lowercased with its
/// whitespace collapsed. Returns 32 lowercase hex characters.
pub fn fingerprint(
    scrape_date: NaiveDate,
    job_name: &str,
    company_name: &str,
    job_location: &str,
) -> String {
    let month_year = format!("{:02}{:04}", scrape_date.month(), scrape_date.year());
    let key = [month_year.as_str(), job_name, company_name, job_location]
        .into_iter()
        .map(normalize)
        .collect::<Vec<_>>()
        .join("_");

    format!("{:x}", md5::compute(key.as_bytes()))
}

fn normalize(part: &str) -> String {
    part.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
