use super::*;

fn text(content: &str) -> SilenceCandidate<'_> {
    SilenceCandidate {
        content,
        has_tool_data: false,
        kind: MessageKind::Assistant,
    }
}

#[test]
fn test_stop_tokens_case_insensitive_after_trim() {
    let policy = SilencePolicy::default();

    assert_eq!(
        policy.evaluate(&text("[SILENT]")),
        Some(SuppressReason::StopToken {
            token: "[SILENT]".into()
        })
    );
    assert!(policy.evaluate(&text("  [silent]\n")).is_some());
    assert!(policy.evaluate(&text("no_reply")).is_some());
}

#[test]
fn test_stop_token_inside_sentence_is_kept() {
    let policy = SilencePolicy::default();
    assert!(policy
        .evaluate(&text("I would normally say [SILENT] but here is the fix."))
        .is_none());
}

#[test]
fn test_meta_talk_suppressed() {
    let policy = SilencePolicy::default();

    for phrase in [
        "(staying silent)",
        "Remaining silent.",
        "I will stay silent on this one.",
        "No need to reply.",
        "There is no reason for me to respond here.",
        "Nothing to add.",
        "I have nothing further to add.",
        "Should I reply to this?",
    ] {
        assert!(
            matches!(policy.evaluate(&text(phrase)), Some(SuppressReason::MetaTalk { .. })),
            "expected meta talk: {}",
            phrase
        );
    }
}

#[test]
fn test_regular_content_kept() {
    let policy = SilencePolicy::default();

    for phrase in [
        "Here is the migration plan.",
        "No need to worry, the tests pass.",
        "**@Athena** can you review the schema?",
    ] {
        assert!(policy.evaluate(&text(phrase)).is_none(), "unexpected suppression: {}", phrase);
    }
}

#[test]
fn test_long_content_never_meta_talk() {
    let policy = SilencePolicy::default();
    let long = format!("No need to reply, {}", "but here is a long explanation. ".repeat(10));
    assert!(policy.evaluate(&text(&long)).is_none());
}

#[test]
fn test_empty_bubble() {
    let policy = SilencePolicy::default();

    assert_eq!(policy.evaluate(&text("   ")), Some(SuppressReason::EmptyBubble));

    let with_tools = SilenceCandidate {
        content: "",
        has_tool_data: true,
        kind: MessageKind::ToolCall,
    };
    assert!(policy.evaluate(&with_tools).is_none());
}

#[test]
fn test_error_messages_never_suppressed() {
    let policy = SilencePolicy::default();
    let candidate = SilenceCandidate {
        content: "",
        has_tool_data: false,
        kind: MessageKind::Error,
    };
    assert!(policy.evaluate(&candidate).is_none());
}

#[test]
fn test_invalid_pattern_rejected() {
    let config = SilenceConfig {
        meta_patterns: vec!["(unclosed".into()],
        ..SilenceConfig::default()
    };
    let err = SilencePolicy::from_config(&config).unwrap_err();
    assert!(err.to_string().contains("engine.silence.meta_patterns"));
}

#[test]
fn test_custom_rule_chain() {
    #[derive(Debug)]
    struct ShoutRule;

    impl SilenceRule for ShoutRule {
        fn name(&self) -> &str {
            "shout"
        }

        fn check(&self, candidate: &SilenceCandidate<'_>) -> Option<SuppressReason> {
            (candidate.content == "SHH").then_some(SuppressReason::EmptyBubble)
        }
    }

    let policy = SilencePolicy::empty().with_rule(ShoutRule);
    assert_eq!(policy.rule_names(), vec!["shout"]);
    assert!(policy.evaluate(&text("SHH")).is_some());
    assert!(policy.evaluate(&text("[SILENT]")).is_none());
    assert_eq!(
        SilencePolicy::default().rule_names(),
        vec!["stop_token", "meta_talk", "empty_bubble"]
    );
}

#[test]
fn test_tool_data_is_never_silenced() {
    let policy = SilencePolicy::default();

    for content in ["[SILENT]", "NO_REPLY", "Nothing to add.", ""] {
        let candidate = SilenceCandidate {
            content,
            has_tool_data: true,
            kind: MessageKind::ToolCall,
        };
        assert!(
            policy.evaluate(&candidate).is_none(),
            "tool call dropped: {:?}",
            content
        );
    }
}
