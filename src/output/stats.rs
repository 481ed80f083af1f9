//! Statistics of a finished crawl
//!
//! Computed from the final payload, so they can be produced right after a
//! crawl ends or later from a saved payload file.

use crate::state::FinalPayload;
use crate::url::UrlResolver;
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Total number of resources in the table
    pub total_resources: usize,

    /// Resources under the base URL
    pub internal: usize,

    /// Resources outside the base URL (fetched but not expanded)
    pub external: usize,

    /// Resources that received an HTTP response
    pub fetched: usize,

    /// Resources with a transport or parse error
    pub errored: usize,

    /// Count of resources by HTTP status code
    pub status_codes: BTreeMap<u16, usize>,

    /// Total number of recorded referrers, seed included
    pub referrer_edges: usize,
}

impl CrawlStatistics {
    /// Computes statistics for `payload`, classifying resources with `resolver`
    pub fn from_payload(payload: &FinalPayload, resolver: &UrlResolver) -> Self {
        let mut stats = Self::default();

        for (url, resource) in payload.resources.iter() {
            stats.total_resources += 1;

            if resolver.is_external(url) {
                stats.external += 1;
            } else {
                stats.internal += 1;
            }

            if let Some(code) = resource.status_code {
                stats.fetched += 1;
                *stats.status_codes.entry(code).or_insert(0) += 1;
            }

            if resource.error.is_some() {
                stats.errored += 1;
            }

            stats.referrer_edges += resource.from.len();
        }

        stats
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total resources: {}", stats.total_resources);
    println!("  Internal: {}", stats.internal);
    println!("  External: {}", stats.external);
    println!("  Referrer edges: {}", stats.referrer_edges);
    println!();

    if !stats.status_codes.is_empty() {
        println!("Resources by Status:");
        for (code, count) in &stats.status_codes {
            let percentage = if stats.fetched > 0 {
                (*count as f64 / stats.fetched as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", code, count, percentage);
        }
        println!();
    }

    if stats.errored > 0 {
        println!("Errored: {}", stats.errored);
        println!();
    }

    let success_rate = if stats.total_resources > 0 {
        (stats.fetched as f64 / stats.total_resources as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Fetch Rate: {:.1}% ({} / {} resources received a response)",
        success_rate, stats.fetched, stats.total_resources
    );
}
