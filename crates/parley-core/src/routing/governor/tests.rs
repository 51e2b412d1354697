use super::*;
use crate::model::{new_message_id, MessageKind};

fn alpha() -> AgentIdentity {
    AgentIdentity::new("a", "Alpha")
}

fn beta() -> AgentIdentity {
    AgentIdentity::new("b", "Beta")
}

fn gamma() -> AgentIdentity {
    AgentIdentity::new("c", "Gamma")
}

fn say(agent: &AgentIdentity, content: &str) -> Message {
    Message::agent(new_message_id(), "g1", agent, MessageKind::Assistant, content)
}

/// `count` messages alternating Alpha → Beta and Beta → Alpha.
fn ping_pong(count: usize) -> Vec<Message> {
    (0..count)
        .map(|i| {
            if i % 2 == 0 {
                say(&alpha(), "**@Beta** your turn")
            } else {
                say(&beta(), "**@Alpha** back to you")
            }
        })
        .collect()
}

#[test]
fn test_no_chain_allows() {
    let governor = LoopGovernor::default();
    let history = vec![
        Message::user("g1", "alice", "**@Alpha** **@Beta** hi"),
        say(&alpha(), "hello"),
    ];
    assert_eq!(governor.chain_length(&alpha(), &beta(), &history), 0);
    assert_eq!(governor.evaluate(&alpha(), &beta(), &history), LoopDecision::Allow);
}

#[test]
fn test_chain_counts_both_directions() {
    let governor = LoopGovernor::default();
    assert_eq!(governor.chain_length(&alpha(), &beta(), &ping_pong(4)), 4);
    assert_eq!(governor.chain_length(&beta(), &alpha(), &ping_pong(4)), 4);
}

#[test]
fn test_chain_ignores_third_parties_and_users() {
    let governor = LoopGovernor::default();
    let history = vec![
        say(&gamma(), "**@Beta** and **@Alpha**"),
        Message::user("g1", "alice", "**@Beta**"),
        say(&alpha(), "**@Gamma** over to you"),
    ];
    assert_eq!(governor.chain_length(&alpha(), &beta(), &history), 0);
}

#[test]
fn test_chain_matches_mentions_by_id() {
    let governor = LoopGovernor::default();
    let history = vec![say(&alpha(), "**@b** check this")];
    assert_eq!(governor.chain_length(&alpha(), &beta(), &history), 1);
}

#[test]
fn test_soft_guidance() {
    let governor = LoopGovernor::default();
    let decision = governor.evaluate(&alpha(), &beta(), &ping_pong(1));

    match decision {
        LoopDecision::Guide {
            chain_length,
            level,
            text,
        } => {
            assert_eq!(chain_length, 1);
            assert_eq!(level, GuidanceLevel::Soft);
            assert!(text.contains("[SILENT]"));
            assert!(text.contains("Do not discuss whether you should reply"));
        }
        other => panic!("expected soft guidance, got {:?}", other),
    }
}

#[test]
fn test_critical_guidance() {
    let governor = LoopGovernor::default();
    let decision = governor.evaluate(&alpha(), &beta(), &ping_pong(3));

    assert!(matches!(
        decision,
        LoopDecision::Guide {
            level: GuidanceLevel::Critical,
            chain_length: 3,
            ..
        }
    ));
    assert!(decision.guidance().unwrap().contains("materially new information"));
}

#[test]
fn test_block_at_threshold() {
    let governor = LoopGovernor::default();
    let decision = governor.evaluate(&alpha(), &beta(), &ping_pong(10));
    assert_eq!(decision, LoopDecision::Block { chain_length: 10 });
    assert!(decision.is_blocked());
}

#[test]
fn test_window_bounds_chain() {
    let governor = LoopGovernor::default();
    let mut history = ping_pong(12);
    // Two quiet messages push the oldest exchanges out of the window.
    history.push(Message::user("g1", "alice", "hold on"));
    history.push(say(&gamma(), "noted"));

    assert_eq!(governor.chain_length(&alpha(), &beta(), &history), 8);
    assert!(!governor.evaluate(&alpha(), &beta(), &history).is_blocked());
}

#[test]
fn test_blocked_target_does_not_stop_others() {
    let governor = LoopGovernor::default();
    let history = ping_pong(10);

    let decision = governor.route(&alpha(), &[beta(), gamma()], &history);
    assert_eq!(
        decision.blocked,
        vec![BlockedTarget {
            agent_id: "b".into(),
            chain_length: 10
        }]
    );
    assert_eq!(
        decision.targets,
        vec![RoutedTarget {
            agent_id: "c".into(),
            loop_guidance: None
        }]
    );
}

#[test]
fn test_route_carries_guidance_per_target() {
    let governor = LoopGovernor::default();
    let decision = governor.route(&alpha(), &[gamma(), beta()], &ping_pong(2));

    assert_eq!(decision.targets.len(), 2);
    assert_eq!(decision.targets[0].agent_id, "c");
    assert!(decision.targets[0].loop_guidance.is_none());
    assert_eq!(decision.targets[1].agent_id, "b");
    assert!(decision.targets[1].loop_guidance.is_some());
}

#[test]
fn test_custom_thresholds() {
    let governor = LoopGovernor::new(
        LoopPolicyConfig::default()
            .with_thresholds(2, 2, 3)
            .with_silence_token("<quiet>"),
    );

    assert_eq!(governor.evaluate(&alpha(), &beta(), &ping_pong(1)), LoopDecision::Allow);
    let text = governor
        .evaluate(&alpha(), &beta(), &ping_pong(2))
        .guidance()
        .map(str::to_string)
        .unwrap();
    assert!(text.contains("<quiet>"));
    assert!(governor.evaluate(&alpha(), &beta(), &ping_pong(3)).is_blocked());
}

#[test]
fn test_policy_validation() {
    assert!(LoopPolicyConfig::default().validate().is_ok());
    assert!(LoopPolicyConfig::default().with_window(0).validate().is_err());
    assert!(LoopPolicyConfig::default()
        .with_thresholds(0, 3, 10)
        .validate()
        .is_err());
    assert!(LoopPolicyConfig::default()
        .with_thresholds(4, 3, 10)
        .validate()
        .is_err());
    assert!(LoopPolicyConfig::default()
        .with_thresholds(1, 11, 10)
        .validate()
        .is_err());
    assert!(LoopPolicyConfig::default()
        .with_silence_token("  ")
        .validate()
        .is_err());
}

#[test]
fn test_policy_validation_names_config_keys() {
    let field_of = |config: LoopPolicyConfig| match config.validate() {
        Err(Error::InvalidConfig { field, .. }) => field,
        other => panic!("expected invalid config, got {:?}", other),
    };

    assert_eq!(
        field_of(LoopPolicyConfig::default().with_window(0)),
        "engine.loop_policy.window"
    );
    assert_eq!(
        field_of(LoopPolicyConfig::default().with_thresholds(4, 3, 10)),
        "engine.loop_policy.soft"
    );
    assert_eq!(
        field_of(LoopPolicyConfig::default().with_thresholds(1, 11, 10)),
        "engine.loop_policy.critical"
    );
    assert_eq!(
        field_of(LoopPolicyConfig::default().with_silence_token("")),
        "engine.loop_policy.silence_token"
    );
}
