//! Stage 3 personalization multiplier (spec.md §4.4):
//! `final = semantic * (1 + 0.20*recency + 0.10*ownership + 0.05*engagement + 0.10*connector)`

use chrono::{DateTime, Utc};
use knowledge_model::{DataSource, EnrichedItem};

const RECENCY_WEIGHT: f64 = 0.20;
const OWNERSHIP_WEIGHT: f64 = 0.10;
const ENGAGEMENT_WEIGHT: f64 = 0.05;
const CONNECTOR_WEIGHT: f64 = 0.10;

/// `0.5 ^ (daysSince(updatedAt) / halfLife(source))`, or `0` if the item
/// carries no date at all. `updatedAtTs` is the only mirror field stored on
/// `EnrichedItem` (`createdAtTs` is the fallback when an item was never
/// updated after creation).
fn recency(item: &EnrichedItem, now: DateTime<Utc>) -> f64 {
    let ts = match item.updated_at_ts.or(item.created_at_ts) {
        Some(ts) => ts,
        None => return 0.0,
    };
    let age_ms = (now.timestamp_millis() - ts).max(0) as f64;
    let days_since = age_ms / (1000.0 * 60.0 * 60.0 * 24.0);
    let half_life = item.source.recency_half_life_days();
    0.5_f64.powf(days_since / half_life)
}

fn ownership(item: &EnrichedItem) -> f64 {
    if item.is_owner || item.is_organizer || item.is_author {
        1.0
    } else if item.is_assigned_to_me {
        0.8
    } else {
        0.0
    }
}

fn engagement(item: &EnrichedItem) -> f64 {
    match item.source {
        DataSource::Chat => {
            let thread_bonus = if item.thread_ts.is_some() { 0.20 } else { 0.0 };
            (0.10 * item.reaction_count as f64 + 0.15 * item.mention_count as f64 + thread_bonus).min(1.0)
        }
        DataSource::IssueTracker => (item.priority_weight / 5.0).min(1.0),
        DataSource::Mail => match item.thread_depth {
            Some(d) if d > 3 => 0.6,
            Some(d) if d > 1 => 0.3,
            _ => 0.0,
        },
        DataSource::Wiki => (0.15 * item.label_count as f64).min(1.0),
        DataSource::CodeHost => (0.10 * item.reaction_count as f64 + 0.10 * item.label_count as f64).min(1.0),
        _ => 0.0,
    }
}

fn connector(item: &EnrichedItem) -> f64 {
    item.relevance_score
}

/// The `(1 + 0.20r + 0.10o + 0.05e + 0.10c)` factor itself (spec.md §4.4).
pub fn multiplier(item: &EnrichedItem, now: DateTime<Utc>) -> f64 {
    1.0 + RECENCY_WEIGHT * recency(item, now)
        + OWNERSHIP_WEIGHT * ownership(item)
        + ENGAGEMENT_WEIGHT * engagement(item)
        + CONNECTOR_WEIGHT * connector(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_model::EnrichedItem;

    fn item(source: DataSource) -> EnrichedItem {
        EnrichedItem::new("id-1", source, "content", "content", "hash")
    }

    #[test]
    fn no_signals_gives_multiplier_of_one() {
        let it = item(DataSource::Wiki);
        assert_eq!(multiplier(&it, Utc::now()), 1.0);
    }

    #[test]
    fn ownership_and_recency_tiebreak_scenario_5() {
        let now = Utc::now();
        let mut a = item(DataSource::Chat);
        a.is_owner = true;
        a.updated_at_ts = Some(now.timestamp_millis());

        let mut b = item(DataSource::Chat);
        b.updated_at_ts = Some(now.timestamp_millis() - 7 * 24 * 60 * 60 * 1000);

        let a_final = 0.5 * multiplier(&a, now);
        let b_final = 0.5 * multiplier(&b, now);
        assert!((a_final - 0.65).abs() < 1e-6);
        assert!((b_final - 0.55).abs() < 1e-6);
        assert!(a_final > b_final);
    }

    #[test]
    fn mail_engagement_steps() {
        let mut it = item(DataSource::Mail);
        it.thread_depth = Some(4);
        assert!((engagement(&it) - 0.6).abs() < 1e-9);
        it.thread_depth = Some(2);
        assert!((engagement(&it) - 0.3).abs() < 1e-9);
        it.thread_depth = Some(1);
        assert_eq!(engagement(&it), 0.0);
    }

    #[test]
    fn item_with_no_date_has_zero_recency() {
        let it = item(DataSource::Wiki);
        assert_eq!(recency(&it, Utc::now()), 0.0);
    }
}
