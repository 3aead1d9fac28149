//! Human-readable run summaries printed by the CLI

use crate::config::Config;
use crate::engine::{FeedReport, FeedRequest};
use std::fmt::Write;

/// Formats a harvest report
pub fn format_report(report: &FeedReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Harvest Report ===\n");

    let _ = writeln!(out, "Feed:");
    let _ = writeln!(out, "  Pages fetched: {}", report.feed_fetches);
    let _ = writeln!(out, "  Stopped: {}", report.termination);
    let _ = writeln!(out, "  Entries skipped: {}", report.entries_skipped);
    let _ = writeln!(out);

    let _ = writeln!(out, "Posts:");
    let _ = writeln!(out, "  Persisted: {}", report.posts_persisted);
    let _ = writeln!(out, "  Already present: {}", report.duplicates_skipped);
    let _ = writeln!(out, "  Output: {}", report.output_path.display());
    let _ = writeln!(out);

    if report.comments_collected > 0 || report.comment_streams_abandoned > 0 {
        let _ = writeln!(out, "Comments:");
        let _ = writeln!(out, "  Root comments: {}", report.comments_collected);
        let _ = writeln!(out, "  Replies: {}", report.replies_collected);
        let _ = writeln!(out);
    }

    let abandoned = report.comment_streams_abandoned + report.reply_streams_abandoned;
    if abandoned > 0 {
        let _ = writeln!(out, "Abandoned Streams ({}):", abandoned);
        let _ = writeln!(out, "  Root comment streams: {}", report.comment_streams_abandoned);
        let _ = writeln!(out, "  Reply streams: {}", report.reply_streams_abandoned);
        let _ = writeln!(out);
    }

    if !report.missing_queries.is_empty() {
        let _ = writeln!(out, "Missing Queries ({}):", report.missing_queries.len());
        for name in &report.missing_queries {
            let _ = writeln!(out, "  {}", name);
        }
        let _ = writeln!(out);
    }

    out
}

/// Prints a harvest report to stdout
pub fn print_report(report: &FeedReport) {
    print!("{}", format_report(report));
}

/// Formats what a run would do, without fetching anything
pub fn format_plan(
    config: &Config,
    request: &FeedRequest,
    query_count: usize,
    reaction_count: usize,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Harvest Plan ===\n");
    let _ = writeln!(out, "Feed: {} (id {})", config.feed.page_url, request.page_id);
    let _ = writeln!(
        out,
        "Window: {} .. {}",
        request.window.after, request.window.before
    );
    let _ = writeln!(out, "Max posts: {}", request.max_posts);
    if request.include_comments {
        let _ = writeln!(
            out,
            "Comments: up to {} root comments, {} replies each ({:?})",
            config.crawler.max_root_comments, config.crawler.max_replies, config.crawler.ranking
        );
    } else {
        let _ = writeln!(out, "Comments: disabled");
    }
    let _ = writeln!(out, "Catalog: {} queries, {} reaction names", query_count, reaction_count);
    let _ = writeln!(out, "Output: {}", request.output_path.display());
    if config.output.download_media {
        let _ = writeln!(out, "Media: {}", config.output.media_directory);
    } else {
        let _ = writeln!(out, "Media: not downloaded");
    }
    out
}

/// Prints a dry-run plan to stdout
pub fn print_plan(config: &Config, request: &FeedRequest, query_count: usize, reaction_count: usize) {
    print!("{}", format_plan(config, request, query_count, reaction_count));
}
