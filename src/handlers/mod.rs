//! Query handler chain.
//!
//! An ordered registry of (trigger, producer) pairs. Dispatch walks the list
//! top to bottom and the first handler that claims the query wins. Several
//! triggers overlap ("visit", "plan", "schedule" recur across topics), so the
//! registration order in [`default_chain`] is the routing table: moving an
//! entry changes which brief a query produces.

pub mod informational;
pub mod inventory;
pub mod modules;
pub mod planner;
pub mod quick_actions;
pub mod scenarios;
pub mod topics;
pub mod vip;

use chrono::NaiveDate;
use rand::RngCore;

use crate::actions::{self, ActionContext};
use crate::normalizer::{fold, mentions_any, QueryFlags};
use crate::registry::RecordLookup;
use crate::types::{HandlerResult, HighlightCard, Section};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything a handler may look at. Handlers keep no state of their own.
pub struct HandlerContext<'a> {
    /// Query with the recommendation marker stripped, original casing.
    pub query: &'a str,
    /// Lower-cased form all triggers test against.
    pub folded: String,
    pub flags: QueryFlags,
    pub is_recommendation: bool,
    pub today: NaiveDate,
    pub user_name: &'a str,
    pub lookup: &'a dyn RecordLookup,
    pub rng: &'a mut dyn RngCore,
}

impl<'a> HandlerContext<'a> {
    pub fn new(
        query: &'a str,
        is_recommendation: bool,
        today: NaiveDate,
        user_name: &'a str,
        lookup: &'a dyn RecordLookup,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self {
            query,
            folded: fold(query),
            flags: QueryFlags::classify(query),
            is_recommendation,
            today,
            user_name,
            lookup,
            rng,
        }
    }

    pub fn mentions_any(&self, needles: &[&str]) -> bool {
        mentions_any(&self.folded, needles)
    }

    pub fn sub_intent(&self) -> SubIntent {
        SubIntent::classify(&self.folded)
    }
}

/// Whether a topical query asks for something to be done or for information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubIntent {
    Action,
    Information,
}

const ACTION_VERBS: &[&str] = &[
    "schedule", "prepare", "assign", "arrange", "issue", "plan", "organise", "organize", "send",
    "start", "initiate", "draft", "fix", "order", "book", "allocate", "set up", "raise",
];

impl SubIntent {
    pub fn classify(folded: &str) -> Self {
        if mentions_any(folded, ACTION_VERBS) {
            SubIntent::Action
        } else {
            SubIntent::Information
        }
    }
}

/// Cheap keyword test deciding whether a handler wants the query.
pub type TriggerFn = fn(&HandlerContext<'_>) -> bool;

/// Builds the result once a trigger matched. May still decline.
pub type ProduceFn = fn(&mut HandlerContext<'_>) -> HandlerResult;

/// A registered handler.
pub struct HandlerEntry {
    pub name: &'static str,
    pub trigger: TriggerFn,
    pub produce: ProduceFn,
}

/// Which handler claimed a query, and what it produced.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub handler: Option<&'static str>,
    pub result: HandlerResult,
}

/// The ordered handler list.
#[derive(Default)]
pub struct HandlerChain {
    entries: Vec<HandlerEntry>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler at the lowest precedence so far.
    pub fn register(&mut self, name: &'static str, trigger: TriggerFn, produce: ProduceFn) {
        self.entries.push(HandlerEntry {
            name,
            trigger,
            produce,
        });
    }

    /// Handler names in precedence order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// Run the chain until one handler claims the query.
    pub fn dispatch(&self, ctx: &mut HandlerContext<'_>) -> Dispatched {
        for entry in &self.entries {
            if !(entry.trigger)(ctx) {
                continue;
            }
            let result = (entry.produce)(ctx);
            if result.handled {
                log::debug!("Query '{}' claimed by {}", ctx.query, entry.name);
                return Dispatched {
                    handler: Some(entry.name),
                    result,
                };
            }
            log::debug!("{} triggered but declined '{}'", entry.name, ctx.query);
        }

        log::debug!("No handler claimed '{}'", ctx.query);
        Dispatched {
            handler: None,
            result: HandlerResult::declined(),
        }
    }
}

/// Build the chain in routing order.
pub fn default_chain() -> HandlerChain {
    let mut chain = HandlerChain::new();

    // Explicit navigation
    chain.register("module_switch", modules::triggers, modules::produce);

    // Named recurring personas and events
    chain.register("jeeyar_visit", scenarios::jeeyar_triggers, scenarios::jeeyar_produce);
    chain.register("brahmotsavam", scenarios::festival_triggers, scenarios::festival_produce);

    // Generic show/view/list/check
    chain.register("quick_action", quick_actions::triggers, quick_actions::produce);

    chain.register("inventory_check", inventory::triggers, inventory::produce);
    chain.register("add_to_planner", planner::triggers, planner::produce);

    // Long-running domain topics
    chain.register("production_batch", topics::production_triggers, topics::production_produce);
    chain.register("maintenance", topics::maintenance_triggers, topics::maintenance_produce);
    chain.register("season", topics::season_triggers, topics::season_produce);
    chain.register("approvals", topics::approvals_triggers, topics::approvals_produce);
    chain.register("directives", topics::directives_triggers, topics::directives_produce);
    chain.register("auditor_compliance", topics::auditor_triggers, topics::auditor_produce);
    chain.register("procurement_progress", topics::procurement_triggers, topics::procurement_produce);

    chain.register("vip_visit", vip::triggers, vip::produce);

    chain.register("informational", informational::triggers, informational::produce);

    chain
}

// ---------------------------------------------------------------------------
// Shared producers
// ---------------------------------------------------------------------------

/// Brief card plus a planner bundle for information requests, planner only
/// for action requests.
pub(crate) fn brief_or_checklist(
    ctx: &HandlerContext<'_>,
    slug: &str,
    title: &str,
    card: HighlightCard,
    checklist: Vec<String>,
    reply: &str,
) -> HandlerResult {
    match ctx.sub_intent() {
        SubIntent::Action => HandlerResult::handled()
            .section(Section::planner(&checklist).with_sub_title(title.to_string()))
            .message(format!("I've added the next steps for {} to your planner.", title.to_lowercase())),
        SubIntent::Information => HandlerResult::handled()
            .section(Section::focus(slug, title, card))
            .section(Section::planner(&checklist).with_sub_title(title.to_string()))
            .message(reply.to_string()),
    }
}

/// Planner bundle from the action generator for this query.
pub(crate) fn generated_checklist(ctx: &HandlerContext<'_>, subject: Option<&str>) -> Vec<String> {
    let context = subject.map(ActionContext::about);
    actions::generate(ctx.query, context.as_ref())
}


#[cfg(test)]
mod tests {
    use super::test_support::{run, section_ids};
    use super::*;

    #[test]
    fn test_chain_order_is_stable() {
        assert_eq!(
            default_chain().names(),
            vec![
                "module_switch",
                "jeeyar_visit",
                "brahmotsavam",
                "quick_action",
                "inventory_check",
                "add_to_planner",
                "production_batch",
                "maintenance",
                "season",
                "approvals",
                "directives",
                "auditor_compliance",
                "procurement_progress",
                "vip_visit",
                "informational",
            ]
        );
    }

    #[test]
    fn test_auditor_visit_beats_vip_visit() {
        let d = run("government auditor is visiting tomorrow");
        assert_eq!(d.handler, Some("auditor_compliance"));
        let ids = section_ids(&d);
        assert_eq!(ids[0], "focus-auditor-compliance");
        assert!(!ids.contains(&"focus-vip-visit".to_string()));
        assert!(d.result.vip_visit.is_none());
    }

    #[test]
    fn test_plain_visit_routes_to_vip() {
        let d = run("The Governor is visiting tomorrow at 10 AM");
        assert_eq!(d.handler, Some("vip_visit"));
        assert_eq!(section_ids(&d)[0], "focus-vip-visit");
    }

    #[test]
    fn test_quick_action_beats_topic() {
        let d = run("Show pending approvals");
        assert_eq!(d.handler, Some("quick_action"));
        let d = run("what approvals are stuck with finance committee");
        assert_eq!(d.handler, Some("approvals"));
    }

    #[test]
    fn test_unmatched_query_declines() {
        let d = run("flowers");
        assert!(d.handler.is_none());
        assert!(!d.result.handled);
        assert!(d.result.sections.is_empty());
    }

    #[test]
    fn test_declining_producer_falls_through() {
        fn always(_: &HandlerContext<'_>) -> bool {
            true
        }
        fn decline(_: &mut HandlerContext<'_>) -> HandlerResult {
            HandlerResult::declined()
        }
        fn claim(_: &mut HandlerContext<'_>) -> HandlerResult {
            HandlerResult::handled().message("second")
        }

        let mut chain = HandlerChain::new();
        chain.register("first", always, decline);
        chain.register("second", always, claim);

        let registry = crate::registry::StaticRegistry::default();
        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(0);
        let mut ctx = HandlerContext::new(
            "anything",
            false,
            super::test_support::today(),
            "EO",
            &registry,
            &mut rng,
        );
        let d = chain.dispatch(&mut ctx);
        assert_eq!(d.handler, Some("second"));
        assert_eq!(d.result.message.as_deref(), Some("second"));
    }

    #[test]
    fn test_sub_intent() {
        assert_eq!(SubIntent::classify("prepare for the audit"), SubIntent::Action);
        assert_eq!(SubIntent::classify("auditor arriving tomorrow"), SubIntent::Information);
    }
}
