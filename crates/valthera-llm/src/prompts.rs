//! Prompt construction for the LLM-backed oracles.

use valthera_core::types::{BehaviorSpec, Decision, Message, ReadinessScores, UserContext};

const REASONING_SYSTEM: &str = "You are a behavior design analyst using the Fogg Behavior Model. \
A behavior happens when motivation, ability, and a trigger converge. \
Given a user's motivation and ability scores (0 to 1) and the thresholds they are compared against, \
explain in two or three sentences what limits the user and what would help. \
Respond with a JSON object: {\"action\": \"trigger\" | \"improve_motivation\" | \"improve_ability\" | \"wait\", \"rationale\": \"...\"}.";

const GENERATION_SYSTEM: &str = "You write short, personal nudges that prompt a user to perform a behavior. \
Use the user's signals to pick the most suitable channel (email, in_app, push, or sms). \
Respond with a JSON object: {\"trigger_message\": \"...\", \"channel\": \"...\", \
\"confidence\": <number between 0 and 1>, \"rationale\": \"...\"}.";

/// Messages for the reasoning oracle.
pub fn reasoning_messages(scores: &ReadinessScores, behavior: &BehaviorSpec) -> Vec<Message> {
    let user = format!(
        "Behavior: {} ({})\nDescription: {}\n\nMotivation: {:.2} (threshold {:.2})\nAbility: {:.2} (threshold {:.2})",
        behavior.name,
        behavior.behavior_id,
        describe(&behavior.description),
        scores.motivation,
        scores.thresholds.motivation,
        scores.ability,
        scores.thresholds.ability,
    );
    vec![Message::system(REASONING_SYSTEM), Message::user(user)]
}

/// Messages for the generation oracle.
pub fn generation_messages(
    context: &UserContext,
    behavior: &BehaviorSpec,
    decision: &Decision,
) -> Vec<Message> {
    let signals = if context.is_empty() {
        "(none)".to_string()
    } else {
        context
            .signals()
            .iter()
            .map(|(k, v)| format!("- {}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let user = format!(
        "User: {}\nSignals:\n{}\n\nBehavior: {} ({})\nDescription: {}\n\nWhy now: {}",
        context.user_id(),
        signals,
        behavior.name,
        behavior.behavior_id,
        describe(&behavior.description),
        decision.rationale,
    );
    vec![Message::system(GENERATION_SYSTEM), Message::user(user)]
}

fn describe(description: &str) -> &str {
    if description.trim().is_empty() {
        "(none)"
    } else {
        description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valthera_core::types::{Action, DecisionSource, SignalMap, SignalValue, Thresholds};

    #[test]
    fn test_reasoning_prompt_includes_scores() {
        let scores = ReadinessScores {
            motivation: 0.58,
            ability: 0.45,
            thresholds: Thresholds::default(),
        };
        let behavior = BehaviorSpec::new("upgrade_plan", "Upgrade plan", "");
        let messages = reasoning_messages(&scores, &behavior);

        assert_eq!(messages.len(), 2);
        assert!(messages[1].content.contains("Motivation: 0.58 (threshold 0.50)"));
        assert!(messages[1].content.contains("Description: (none)"));
    }

    #[test]
    fn test_generation_prompt_lists_signals_in_order() {
        let mut signals = SignalMap::new();
        signals.insert("session_count".to_string(), SignalValue::from(3));
        signals.insert("lead_score".to_string(), SignalValue::from(80));
        let context = UserContext::new("user_12345", signals);
        let decision = Decision {
            action: Action::Trigger,
            rationale: "Ready".to_string(),
            source: DecisionSource::Deterministic,
        };

        let messages = generation_messages(
            &context,
            &BehaviorSpec::new("upgrade_plan", "Upgrade plan", "Go paid"),
            &decision,
        );
        let body = &messages[1].content;
        assert!(body.find("lead_score: 80").unwrap() < body.find("session_count: 3").unwrap());
        assert!(body.ends_with("Why now: Ready"));
    }
}
