use async_trait::async_trait;
use battle_core::{
    ActionSubmission, CombatantId, CombatantSnapshot, EndReason, JitterKind, QueueEvent,
    RemovalReason, ResourceModel, Scheduler, SchedulerConfig, SchedulerError, SchedulerPolicy,
    Side, TurnKind,
};
use battle_runtime::{
    Aftermath, BattleEvent, BattleSession, Decision, DecisionProvider, Event, PassProvider,
    ProviderRegistry, Result, RuntimeError, ScriptedProvider, SessionConfig, Topic, TurnContext,
};
use tokio::sync::broadcast;

const HERO: CombatantId = CombatantId(1);
const FOE: CombatantId = CombatantId(2);

fn roster() -> Vec<CombatantSnapshot> {
    vec![
        CombatantSnapshot::new(HERO, Side::Party, 20),
        CombatantSnapshot::new(FOE, Side::Troop, 10),
    ]
}

fn scheduler(policy: SchedulerPolicy) -> Scheduler {
    Scheduler::new(
        SchedulerConfig::default(),
        policy.with_jitter(JitterKind::None),
    )
}

fn session(providers: ProviderRegistry, max_turns: u64) -> BattleSession {
    BattleSession::new(
        scheduler(SchedulerPolicy::standard()),
        roster(),
        providers,
        SessionConfig::default().with_max_turns(max_turns),
    )
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Never answers; only cancellation ends its turn.
struct StallProvider;

#[async_trait]
impl DecisionProvider for StallProvider {
    async fn decide(&self, _turn: &TurnContext) -> Result<Decision> {
        std::future::pending().await
    }
}

struct FailingProvider;

#[async_trait]
impl DecisionProvider for FailingProvider {
    async fn decide(&self, turn: &TurnContext) -> Result<Decision> {
        Err(RuntimeError::provider(turn.head.combatant, "input device lost"))
    }
}

#[tokio::test]
async fn test_turn_limit_concludes_battle() {
    let summary = session(ProviderRegistry::new(), 6)
        .run()
        .await
        .expect("session should finish");

    assert!(summary.hit_turn_limit);
    assert_eq!(summary.report.reason, EndReason::Concluded);
    assert_eq!(summary.report.winner, None);
    let actors: Vec<CombatantId> = summary.acted.iter().map(|(id, _)| *id).collect();
    assert_eq!(actors, vec![HERO, FOE, HERO, FOE, HERO, FOE]);
    assert_eq!(summary.report.turns_taken, 6);
}

#[tokio::test]
async fn test_defeat_aftermath_ends_battle() {
    let mut providers = ProviderRegistry::new();
    providers.bind_side(
        Side::Party,
        ScriptedProvider::new([Decision::pass(HERO).with_aftermath(Aftermath::Defeated(FOE))]),
    );

    let session = session(providers, 100);
    let mut battle = session.handle().subscribe(Topic::Battle);
    let summary = session.run().await.expect("session should finish");

    assert_eq!(summary.acted, vec![(HERO, TurnKind::Normal)]);
    assert_eq!(
        summary.report.reason,
        EndReason::SideDefeated { side: Side::Troop }
    );
    assert_eq!(summary.report.winner, Some(Side::Party));

    let events = drain(&mut battle);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::Battle(BattleEvent::CombatantLeft {
            combatant: FOE,
            reason: RemovalReason::Defeated,
        })
    )));
    assert!(matches!(
        events.last(),
        Some(Event::Battle(BattleEvent::Ended { .. }))
    ));
}

#[tokio::test]
async fn test_flee_aftermath_ends_battle_without_winner() {
    let mut providers = ProviderRegistry::new();
    providers.bind_side(
        Side::Party,
        ScriptedProvider::new([Decision::pass(HERO).with_aftermath(Aftermath::Fled(HERO))]),
    );

    let summary = session(providers, 100)
        .run()
        .await
        .expect("session should finish");

    assert_eq!(summary.acted, vec![(HERO, TurnKind::Normal)]);
    assert_eq!(summary.report.reason, EndReason::Fled { side: Side::Party });
    assert_eq!(summary.report.winner, None);
}

#[tokio::test]
async fn test_abort_cancels_pending_decision() {
    let session = session(ProviderRegistry::with_default(StallProvider), 100);
    let handle = session.handle();
    let running = tokio::spawn(session.run());

    handle.abort();
    let summary = running
        .await
        .expect("session task should not panic")
        .expect("aborted session still reports");

    assert!(handle.is_aborted());
    assert!(summary.acted.is_empty());
    assert_eq!(summary.report.reason, EndReason::Aborted);
}

#[tokio::test]
async fn test_provider_failure_aborts_battle() {
    let session = session(ProviderRegistry::with_default(FailingProvider), 100);
    let mut battle = session.handle().subscribe(Topic::Battle);

    let err = session.run().await.unwrap_err();
    assert!(matches!(err, RuntimeError::Provider { combatant: HERO, .. }));

    let ended = drain(&mut battle).into_iter().find_map(|event| match event {
        Event::Battle(BattleEvent::Ended { report }) => Some(report),
        _ => None,
    });
    assert_eq!(ended.map(|report| report.reason), Some(EndReason::Aborted));
}

/// Spending without a ledger is refused; the hero still acts once.
#[tokio::test]
async fn test_rejected_decision_falls_back_to_single_action() {
    let mut providers = ProviderRegistry::new();
    providers.bind_combatant(
        HERO,
        ScriptedProvider::new([Decision::new(
            ActionSubmission::new(HERO).with_resource_spend(1),
        )]),
    );

    let session = session(providers, 2);
    let mut battle = session.handle().subscribe(Topic::Battle);
    let summary = session.run().await.expect("session should finish");

    assert_eq!(
        summary.acted,
        vec![(HERO, TurnKind::Normal), (FOE, TurnKind::Normal)]
    );
    assert!(drain(&mut battle).iter().any(|event| matches!(
        event,
        Event::Battle(BattleEvent::DecisionRejected { actor: HERO, .. })
    )));
}

#[tokio::test]
async fn test_queue_changes_reach_the_bus() {
    let session = session(ProviderRegistry::with_default(PassProvider), 1);
    let mut queue = session.handle().subscribe(Topic::Queue);
    session.run().await.expect("session should finish");

    let changes: Vec<QueueEvent> = drain(&mut queue)
        .into_iter()
        .filter_map(|event| match event {
            Event::Queue(change) => Some(change.event),
            Event::Battle(_) => None,
        })
        .collect();

    assert!(matches!(
        changes.first(),
        Some(QueueEvent::Regenerated { round: 1, .. })
    ));
    assert!(changes.contains(&QueueEvent::BattleEnded {
        reason: EndReason::Concluded
    }));
}

/// With no regeneration both sides end up in debt and the queue runs dry:
/// the session aborts and reports the fatal error instead of failing.
#[tokio::test]
async fn test_exhausted_queue_is_reported_as_fatal() {
    let stuck = ResourceModel {
        regen_per_round: 0,
        ..ResourceModel::brave_points()
    };
    let mut providers = ProviderRegistry::new();
    providers.bind_side(
        Side::Party,
        ScriptedProvider::new([Decision::new(
            ActionSubmission::new(HERO).with_resource_spend(2),
        )]),
    );
    providers.bind_side(
        Side::Troop,
        ScriptedProvider::new([Decision::new(
            ActionSubmission::new(FOE).with_resource_spend(2),
        )]),
    );

    let session = BattleSession::new(
        scheduler(SchedulerPolicy::brave().with_resource_model(stuck)),
        roster(),
        providers,
        SessionConfig::default(),
    );
    let summary = session.run().await.expect("fatal errors are reported");

    assert_eq!(summary.fatal, Some(SchedulerError::EmptyQueue));
    assert_eq!(summary.report.reason, EndReason::Aborted);
    assert_eq!(
        summary.acted,
        vec![
            (HERO, TurnKind::Normal),
            (HERO, TurnKind::Extra),
            (HERO, TurnKind::Extra),
            (FOE, TurnKind::Normal),
            (FOE, TurnKind::Extra),
        ]
    );
}
