//! Slack Block Kit rendering for summaries and productivity reports.
//!
//! Rendering is pure: records in, `serde_json` block values out. Delivery
//! lives in `slack`.

use serde_json::{json, Value};

use crate::productivity::TeamProductivityMetrics;
use crate::repository::{PullRequestInfo, RepositoryInfo, ReviewStatus};

/// Block Kit caps a message at 50 blocks; stay well under it so the header
/// always fits.
const MAX_PULLS_PER_MESSAGE: usize = 30;
const TOP_REVIEWERS: usize = 5;
const MEDALS: [&str; 5] = [
    ":first_place_medal:",
    ":second_place_medal:",
    ":third_place_medal:",
    ":medal:",
    ":medal:",
];

/// Renders one repository's summary as one or more Block Kit messages.
/// Continuation messages repeat the header with a "(continued)" marker.
pub fn repository_messages(info: &RepositoryInfo) -> Vec<Vec<Value>> {
    info.pulls
        .chunks(MAX_PULLS_PER_MESSAGE)
        .enumerate()
        .map(|(index, chunk)| {
            let header = if index == 0 {
                format!("*{}*", info.repository)
            } else {
                format!("*{}* (continued)", info.repository)
            };
            let mut blocks = vec![section(&header)];
            blocks.extend(chunk.iter().map(pull_request_block));
            blocks
        })
        .collect()
}

fn pull_request_block(pull: &PullRequestInfo) -> Value {
    let age = if pull.age.days > 0 {
        format!("{} days", pull.age.days)
    } else {
        format!("{} hours", pull.age.hours)
    };
    let text = format!(
        "- <{url}|{title}> ({age} ago by {author}){urgency}\n  {emoji} {status} · +{added}/-{deleted} · {files} files",
        url = pull.url,
        title = pull.title,
        age = age,
        author = pull.author,
        urgency = age_urgency(pull.age.days),
        emoji = status_emoji(pull.review_status),
        status = pull.review_status,
        added = group_thousands(pull.lines_added),
        deleted = group_thousands(pull.lines_deleted),
        files = pull.changed_files,
    );
    section(&text)
}

fn age_urgency(days: i64) -> &'static str {
    if days > 9 {
        " :redalert:"
    } else if days > 7 {
        " :alert:"
    } else {
        ""
    }
}

fn status_emoji(status: ReviewStatus) -> &'static str {
    match status {
        ReviewStatus::Waiting => ":hourglass_flowing_sand:",
        ReviewStatus::Approved => ":white_check_mark:",
        ReviewStatus::ChangesRequested => ":no_entry:",
    }
}

/// Renders the team productivity report as a single Block Kit message.
pub fn productivity_message(metrics: &TeamProductivityMetrics) -> Vec<Value> {
    let mut blocks = vec![section(&format!(
        ":rocket: *Team Effort Summary* in _last {} days_ :chart_with_upwards_trend:",
        metrics.time_window_days
    ))];

    blocks.push(divider());
    blocks.push(section(&format!(
        ":dart: *Team Totals*\n:white_check_mark: *{}* merged PRs\n:heavy_plus_sign: *+{}* lines added\n:heavy_minus_sign: *-{}* lines deleted",
        metrics.total_merged_prs,
        group_thousands(metrics.total_lines_added),
        group_thousands(metrics.total_lines_deleted),
    )));

    if !metrics.repository_breakdown.is_empty() {
        blocks.push(divider());
        blocks.push(section(&repository_breakdown(metrics)));
    }

    if !metrics.reviewer_approvals.is_empty() {
        blocks.push(divider());
        blocks.push(section(&top_reviewers(metrics)));
    }

    blocks
}

fn repository_breakdown(metrics: &TeamProductivityMetrics) -> String {
    let mut text = String::from(":bar_chart: *Repository Breakdown*\n");

    let active: Vec<_> = metrics
        .repository_breakdown
        .iter()
        .filter(|repo| repo.merged_prs > 0)
        .collect();
    if active.is_empty() {
        text.push_str(":zzz: _No repository activity in this period_");
        return text;
    }

    for repo in active {
        let emoji = if repo.merged_prs >= 5 {
            ":fire:"
        } else if repo.merged_prs >= 2 {
            ":zap:"
        } else {
            ":small_blue_diamond:"
        };
        // Owner prefix dropped for cleaner display.
        text.push_str(&format!(
            "{} *{}*: {} PRs (+{}/-{})\n",
            emoji,
            repo.repository.repo,
            repo.merged_prs,
            group_thousands(repo.lines_added),
            group_thousands(repo.lines_deleted),
        ));
    }
    text.trim_end().to_string()
}

fn top_reviewers(metrics: &TeamProductivityMetrics) -> String {
    let mut text = String::from(":trophy: *Top Reviewers*\n");

    let mut reviewers: Vec<(&String, &u32)> = metrics
        .reviewer_approvals
        .iter()
        .filter(|(_, count)| **count > 0)
        .collect();
    // Count descending, then login so equal counts render deterministically.
    reviewers.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    reviewers.truncate(TOP_REVIEWERS);

    if reviewers.is_empty() {
        text.push_str(":thinking_face: _No reviews found in this period_");
        return text;
    }

    for (rank, (login, count)) in reviewers.iter().enumerate() {
        let medal = MEDALS[rank];
        let noun = if **count == 1 { "approval" } else { "approvals" };
        text.push_str(&format!(
            "{}. {} *{}*: {} {}\n",
            rank + 1,
            medal,
            login,
            count,
            noun
        ));
    }
    text.trim_end().to_string()
}

fn section(text: &str) -> Value {
    json!({
        "type": "section",
        "text": {
            "type": "mrkdwn",
            "text": text,
        }
    })
}

fn divider() -> Value {
    json!({ "type": "divider" })
}

/// 1234567 -> "1,234,567".
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
