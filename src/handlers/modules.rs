//! Explicit navigation: "open finance", "go to the staff module".

use std::sync::OnceLock;

use regex::Regex;

use super::HandlerContext;
use crate::types::{CanvasModule, HandlerResult};

fn navigation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:please\s+)?(?:open|go to|switch to|navigate to|take me to)\s+(?:the\s+)?([a-z]+)(?:\s+(?:module|tab|page|screen|section))?\s*$",
        )
        .unwrap()
    })
}

/// Module named by a navigation phrase, if any.
pub fn detect_module(folded: &str) -> Option<CanvasModule> {
    navigation_re()
        .captures(folded)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn triggers(ctx: &HandlerContext<'_>) -> bool {
    // Suggestion chips never navigate away from the canvas
    !ctx.is_recommendation && detect_module(&ctx.folded).is_some()
}

pub fn produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    match detect_module(&ctx.folded) {
        Some(module) => HandlerResult::handled()
            .module(module)
            .message(format!("Opening the {} module.", module)),
        None => HandlerResult::declined(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::run;

    #[test]
    fn test_detect_module_phrases() {
        assert_eq!(detect_module("open finance"), Some(CanvasModule::Finance));
        assert_eq!(detect_module("go to the hr module"), Some(CanvasModule::Staff));
        assert_eq!(detect_module("switch to events tab"), Some(CanvasModule::Events));
        assert_eq!(detect_module("open the gates at 4am"), None);
        assert_eq!(detect_module("show finance"), None);
    }

    #[test]
    fn test_module_switch_has_no_sections() {
        let d = run("Open Finance");
        assert_eq!(d.handler, Some("module_switch"));
        assert_eq!(d.result.module, Some(CanvasModule::Finance));
        assert!(d.result.sections.is_empty());
    }

    #[test]
    fn test_recommendation_does_not_navigate() {
        let d = run("[Recommended] open approvals");
        assert_ne!(d.handler, Some("module_switch"));
        assert!(d.result.module.is_none());
    }
}
