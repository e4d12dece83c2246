//! Decision-level action generation for the planner checklist.
//!
//! A single keyword cascade picks one canned bundle per coarse topic. The
//! procurement outlook is the only randomised input; callers pass the RNG in.

use rand::Rng;
use serde::Serialize;

use crate::normalizer::{fold, mentions_any};
use crate::types::CHECKLIST_BULLET;

/// Planner bundles never exceed this many lines.
pub const MAX_ACTIONS: usize = 10;

/// Optional context that personalises a bundle.
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    /// Who or what the actions are about, e.g. a visitor name.
    pub subject: Option<String>,
}

impl ActionContext {
    pub fn about(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
        }
    }
}

/// Coarse topic a bundle is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTopic {
    Visit,
    Plan,
    Summary,
    Approval,
    Schedule,
    Fallback,
}

pub fn classify_topic(query: &str) -> ActionTopic {
    let q = fold(query);
    if mentions_any(&q, &["visit", "visiting", "vip", "dignitary", "delegation"]) {
        ActionTopic::Visit
    } else if mentions_any(&q, &["plan", "planner", "prepare", "preparation"]) {
        ActionTopic::Plan
    } else if mentions_any(&q, &["summary", "summarize", "summarise", "overview", "brief", "recap"]) {
        ActionTopic::Summary
    } else if mentions_any(&q, &["approval", "approvals", "approve", "sanction", "pending"]) {
        ActionTopic::Approval
    } else if mentions_any(&q, &["schedule", "calendar", "timing", "timings", "agenda"]) {
        ActionTopic::Schedule
    } else {
        ActionTopic::Fallback
    }
}

/// Pick the bundle for a query, bulleted and capped at [`MAX_ACTIONS`].
pub fn generate(query: &str, context: Option<&ActionContext>) -> Vec<String> {
    let subject = context
        .and_then(|c| c.subject.as_deref())
        .unwrap_or("the visitor");

    let lines: Vec<String> = match classify_topic(query) {
        ActionTopic::Visit => vec![
            format!("Confirm arrival time and convoy size for {}", subject),
            "Assign protocol officer and liaison from the trust office".to_string(),
            "Reserve VIP darshan slot outside peak queue hours".to_string(),
            "Brief security on entry gate and vehicle parking".to_string(),
            "Arrange prasadam and shawl for the welcome".to_string(),
            "Inform the head priest about special archana".to_string(),
            "Keep the guest house suite ready".to_string(),
            "Alert medical team on standby".to_string(),
            "Share press note draft with PR desk".to_string(),
            "Record visit in the VIP register".to_string(),
        ],
        ActionTopic::Plan => vec![
            "List top three outcomes for the day".to_string(),
            "Block time for pending approvals".to_string(),
            "Review darshan crowd forecast".to_string(),
            "Check kitchen stock against annadanam count".to_string(),
            "Walk the queue complex before noon".to_string(),
            "Call department heads with open issues".to_string(),
            "Clear finance sign-offs before 3 PM".to_string(),
            "Confirm evening ritual staffing".to_string(),
            "Update the trust board on open items".to_string(),
            "Close the day with a five-minute review".to_string(),
        ],
        ActionTopic::Summary => vec![
            "Read the overnight security log".to_string(),
            "Scan hundi collection totals".to_string(),
            "Note any ritual schedule changes".to_string(),
            "Check open maintenance tickets".to_string(),
            "Review staff attendance exceptions".to_string(),
            "Flag approvals older than three days".to_string(),
            "Look at tomorrow's VIP list".to_string(),
            "Confirm prasadam production targets".to_string(),
            "Skim devotee grievance summary".to_string(),
            "Share highlights with the chairman's office".to_string(),
        ],
        ActionTopic::Approval => vec![
            "Sort pending approvals by amount".to_string(),
            "Approve routine purchase orders under limit".to_string(),
            "Send high-value sanctions to the board".to_string(),
            "Ask finance for budget headroom".to_string(),
            "Return incomplete requests with notes".to_string(),
            "Escalate anything pending over a week".to_string(),
            "Sign leave approvals for festival duty".to_string(),
            "Clear contractor bills with completion proof".to_string(),
            "Record decisions in the approvals register".to_string(),
            "Notify requesters of outcomes".to_string(),
        ],
        ActionTopic::Schedule => vec![
            "Publish revised darshan timings".to_string(),
            "Align ritual timings with the priests".to_string(),
            "Share shift roster with security".to_string(),
            "Block calendar for trust board review".to_string(),
            "Confirm annadanam batch timings".to_string(),
            "Update the website and notice boards".to_string(),
            "Brief the information counter staff".to_string(),
            "Reserve buffer slot for VIP requests".to_string(),
            "Check overlap with festival processions".to_string(),
            "Send the final schedule to department heads".to_string(),
        ],
        ActionTopic::Fallback => vec![
            "Review today's priorities".to_string(),
            "Check pending approvals".to_string(),
            "Walk the temple premises".to_string(),
            "Meet the operations supervisor".to_string(),
            "Review devotee feedback".to_string(),
            "Check inventory alerts".to_string(),
            "Confirm tomorrow's schedule".to_string(),
            "Follow up on open maintenance".to_string(),
            "Sign outstanding letters".to_string(),
            "Plan the week ahead".to_string(),
        ],
    };

    lines
        .into_iter()
        .take(MAX_ACTIONS)
        .map(|l| format!("{} {}", CHECKLIST_BULLET, l))
        .collect()
}

// =============================================================================
// Procurement outlook
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Low => write!(f, "Low"),
            RiskTier::Medium => write!(f, "Medium"),
            RiskTier::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementOutlook {
    pub tier: RiskTier,
    pub target_tonnes: u32,
    pub received_tonnes: u32,
}

impl ProcurementOutlook {
    pub fn progress_percent(&self) -> u32 {
        if self.target_tonnes == 0 {
            return 100;
        }
        (self.received_tonnes * 100 / self.target_tonnes).min(100)
    }
}

/// Draw a risk tier and tonnage figures.
pub fn procurement_outlook<R: Rng + ?Sized>(rng: &mut R) -> ProcurementOutlook {
    let tier = match rng.random_range(0..3u8) {
        0 => RiskTier::Low,
        1 => RiskTier::Medium,
        _ => RiskTier::High,
    };
    let target_tonnes = rng.random_range(40..=120u32);
    let received_share = match tier {
        RiskTier::Low => 85,
        RiskTier::Medium => 60,
        RiskTier::High => 30,
    };
    ProcurementOutlook {
        tier,
        target_tonnes,
        received_tonnes: target_tonnes * received_share / 100,
    }
}

/// Checklist branches on the drawn tier.
pub fn procurement_actions(outlook: &ProcurementOutlook) -> Vec<String> {
    let shortfall = outlook.target_tonnes - outlook.received_tonnes;
    let lines: Vec<String> = match outlook.tier {
        RiskTier::Low => vec![
            "Confirm final delivery date with the supplier".to_string(),
            "Schedule quality check for the last consignment".to_string(),
            format!("Release payment for {} tonnes received", outlook.received_tonnes),
            "Update stores ledger".to_string(),
        ],
        RiskTier::Medium => vec![
            format!("Chase supplier on the {} tonne balance", shortfall),
            "Line up a backup vendor quote".to_string(),
            "Check godown space for bulk arrival".to_string(),
            "Review kitchen consumption against stock".to_string(),
            "Report status to the purchase committee".to_string(),
        ],
        RiskTier::High => vec![
            format!("Escalate {} tonne shortfall to the purchase committee", shortfall),
            "Approve emergency purchase from the backup vendor".to_string(),
            "Reduce non-essential kitchen consumption".to_string(),
            "Invoke late-delivery clause with current supplier".to_string(),
            "Inform annadanam in-charge of possible cutback".to_string(),
            "Review procurement daily until stock stabilises".to_string(),
        ],
    };

    lines
        .into_iter()
        .take(MAX_ACTIONS)
        .map(|l| format!("{} {}", CHECKLIST_BULLET, l))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_topic_cascade_order() {
        assert_eq!(classify_topic("plan the minister's visit"), ActionTopic::Visit);
        assert_eq!(classify_topic("plan my approvals"), ActionTopic::Plan);
        assert_eq!(classify_topic("pending sanctions"), ActionTopic::Approval);
        assert_eq!(classify_topic("darshan timings"), ActionTopic::Schedule);
        assert_eq!(classify_topic("hello"), ActionTopic::Fallback);
    }

    #[test]
    fn test_generate_bullets_and_cap() {
        for q in ["visit", "plan", "summary", "approval", "schedule", "anything"] {
            let items = generate(q, None);
            assert!(!items.is_empty());
            assert!(items.len() <= MAX_ACTIONS);
            assert!(items.iter().all(|i| i.starts_with("[·] ")));
        }
    }

    #[test]
    fn test_visit_uses_subject() {
        let ctx = ActionContext::about("Governor Rao");
        let items = generate("vip visit", Some(&ctx));
        assert!(items[0].contains("Governor Rao"));
    }

    #[test]
    fn test_seeded_outlook_is_reproducible() {
        let a = procurement_outlook(&mut StdRng::seed_from_u64(7));
        let b = procurement_outlook(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!((40..=120).contains(&a.target_tonnes));
        assert!(a.received_tonnes <= a.target_tonnes);
    }

    #[test]
    fn test_actions_branch_on_tier() {
        let high = ProcurementOutlook {
            tier: RiskTier::High,
            target_tonnes: 100,
            received_tonnes: 30,
        };
        let low = ProcurementOutlook {
            tier: RiskTier::Low,
            target_tonnes: 100,
            received_tonnes: 85,
        };
        assert!(procurement_actions(&high)[0].contains("70 tonne shortfall"));
        assert!(procurement_actions(&low)[0].contains("delivery date"));
        assert_eq!(high.progress_percent(), 30);
    }
}
