//! Console output for the domain-sweep CLI.
//!
//! Spinner and summaries go to the terminal through `console`; the spinner
//! writes to stderr so stdout stays clean for piping. Diagnostics go through
//! `tracing`, not through this module.

use console::{pad_str, style, Alignment, Term};
use domain_sweep_lib::{score_domain, Report, Status};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// A braille-dot spinner with a live `done/total` counter.
///
/// Does nothing when stderr is not a terminal.
pub struct Spinner {
    running: Arc<AtomicBool>,
    done: Arc<AtomicUsize>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    pub fn start(label: &'static str, total: Option<usize>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let done = Arc::new(AtomicUsize::new(0));

        let term = Term::stderr();
        let handle = term.is_term().then(|| {
            let running = Arc::clone(&running);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                let mut idx = 0usize;
                while running.load(Ordering::Relaxed) {
                    let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                    let count = done.load(Ordering::Relaxed);
                    let progress = match total {
                        Some(total) => format!("{}/{}", count, total),
                        None => count.to_string(),
                    };
                    let _ = term.clear_line();
                    let _ = term.write_str(&format!(
                        "{} {} {}",
                        style(frame).cyan(),
                        label,
                        style(progress).dim()
                    ));
                    idx += 1;
                    tokio::time::sleep(Duration::from_millis(80)).await;
                }
                let _ = term.clear_line();
            })
        });

        Self {
            running,
            done,
            handle,
        }
    }

    /// Count one finished item.
    pub fn tick(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Summaries ────────────────────────────────────────────────────────────────

/// Print the outcome of `generate`.
pub fn print_generated(count: usize, tld_count: usize, path: &Path) {
    println!(
        "{} {} candidate{} across {} TLD{} {} {}",
        style("Generated").bold(),
        count,
        plural(count),
        tld_count,
        plural(tld_count),
        style("→").dim(),
        path.display()
    );
}

/// Print the run summary and the best available domains.
pub fn print_summary(report: &Report, newly_available: &[&str], results_file: &Path) {
    let summary = &report.summary;

    println!();
    println!(
        "{} {} domain{} {}",
        style("Checked").bold(),
        summary.total,
        plural(summary.total),
        style(format!("({} from cache)", summary.cached)).dim()
    );
    println!(
        "  {} {}  {} {}  {} {}  {} {}",
        style(summary.available).green().bold(),
        style("available").green(),
        style(summary.taken).red(),
        style("taken").red(),
        style(summary.unknown).yellow(),
        style("unknown").yellow(),
        style(summary.error).magenta(),
        style("errors").magenta(),
    );

    let ranked = ranked_available(report);
    if !ranked.is_empty() {
        println!();
        for (domain, score) in ranked.iter().take(10) {
            let marker = if newly_available.contains(domain) {
                style("new").cyan().bold().to_string()
            } else {
                String::new()
            };
            println!(
                "  {}  {}  {}",
                pad_str(domain, 24, Alignment::Left, Some("..")),
                style(format!("score {:>3}", score)).dim(),
                marker
            );
        }
        if ranked.len() > 10 {
            println!(
                "  {}",
                style(format!("... and {} more", ranked.len() - 10)).dim()
            );
        }
    }

    println!();
    println!(
        "{} {}",
        style("Results saved to").dim(),
        results_file.display()
    );
}

/// Available domains ordered by score, best first, then by name.
pub fn ranked_available(report: &Report) -> Vec<(&str, u8)> {
    let mut ranked: Vec<(&str, u8)> = report
        .domains_with(Status::Available)
        .into_iter()
        .map(|domain| (domain, score_domain(domain)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain_sweep_lib::{CheckResult, LookupSource};

    fn report(entries: &[(&str, Status)]) -> Report {
        let mut report = Report::default();
        for (domain, status) in entries {
            report.record(CheckResult {
                domain: domain.to_string(),
                status: *status,
                source: LookupSource::Whois,
                checked_at: Utc::now(),
                cached: false,
                error_detail: None,
            });
        }
        report
    }

    #[test]
    fn test_ranked_available_orders_by_score_then_name() {
        let report = report(&[
            ("zz.io", Status::Available),
            ("ab.com", Status::Available),
            ("aa.io", Status::Available),
            ("xy.com", Status::Taken),
        ]);

        assert_eq!(
            ranked_available(&report),
            vec![("ab.com", 70), ("aa.io", 50), ("zz.io", 50)]
        );
    }

    #[test]
    fn test_ranked_available_empty() {
        let report = report(&[("ab.us", Status::Unknown)]);
        assert!(ranked_available(&report).is_empty());
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1), "");
        assert_eq!(plural(0), "s");
        assert_eq!(plural(2), "s");
    }
}
