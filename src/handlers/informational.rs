//! Last resort for anything that reads as a question, summary or planning
//! request but no topic claimed.

use super::{generated_checklist, HandlerContext};
use crate::facts::{aggregate, calendar_card};
use crate::types::{HandlerResult, Section};

pub fn triggers(ctx: &HandlerContext<'_>) -> bool {
    ctx.flags.any()
}

pub fn produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    if ctx.flags.summary {
        let items = aggregate(ctx.query, Some(ctx.today));
        let card = calendar_card(&items, Some(ctx.today));
        let checklist = generated_checklist(ctx, None);
        return HandlerResult::handled()
            .section(Section::focus("daily-brief", "Daily Brief", card))
            .section(Section::planner(&checklist).with_sub_title("Today"))
            .message(format!("Here's your brief for today, {}.", ctx.user_name));
    }

    if ctx.flags.planner {
        let checklist = generated_checklist(ctx, None);
        return HandlerResult::handled()
            .section(Section::planner(&checklist))
            .message("I've put the next steps in your planner.");
    }

    // Plain question: answer in chat, leave the canvas alone
    let answer = match ctx.lookup.search(ctx.query).record {
        Some(record) => {
            let details = record
                .attributes
                .iter()
                .map(|a| format!("{}: {}", a.label, a.value))
                .collect::<Vec<_>>()
                .join(", ");
            if details.is_empty() {
                format!("{} is on record.", record.name)
            } else {
                format!("{}. {}.", record.name, details)
            }
        }
        None => "I don't have a record for that yet. Try asking about visits, approvals, stock or today's schedule."
            .to_string(),
    };
    HandlerResult::handled().message(answer)
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{run, section_ids};

    #[test]
    fn test_summary_builds_daily_brief() {
        let d = run("Give me today's overview");
        assert_eq!(d.handler, Some("informational"));
        assert_eq!(section_ids(&d), vec!["focus-daily-brief", "planner-actions"]);
        assert!(d.result.message.unwrap().contains("Executive Officer"));
    }

    #[test]
    fn test_planner_request_is_planner_only() {
        let d = run("what should i do next");
        assert_eq!(section_ids(&d), vec!["planner-actions"]);
    }

    #[test]
    fn test_question_answers_in_chat_only() {
        let d = run("Who is the head priest on duty?");
        assert_eq!(d.handler, Some("informational"));
        assert!(d.result.sections.is_empty());
        assert!(d.result.message.unwrap().contains("5:00 AM"));
    }
}
