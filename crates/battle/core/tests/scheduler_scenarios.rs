use std::sync::{Arc, Mutex};

use battle_core::{
    ActionSubmission, Bonus, CombatantId, CombatantSnapshot, EndReason, JitterKind, Phase,
    QueueEvent, QueueSnapshot, RemovalReason, Resolution, Scheduler, SchedulerConfig,
    SchedulerError, SchedulerPolicy, Side, SpeedModifier, TurnEntryView, TurnKind,
};

const A: CombatantId = CombatantId(1);
const B: CombatantId = CombatantId(2);
const C: CombatantId = CombatantId(3);
const E: CombatantId = CombatantId(5);
const X: CombatantId = CombatantId(9);

fn party(id: CombatantId, agility: i32) -> CombatantSnapshot {
    CombatantSnapshot::new(id, Side::Party, agility)
}

fn troop(id: CombatantId, agility: i32) -> CombatantSnapshot {
    CombatantSnapshot::new(id, Side::Troop, agility)
}

/// Single-turn rounds without jitter, preempting interrupts.
fn plain() -> SchedulerPolicy {
    SchedulerPolicy::standard().with_jitter(JitterKind::None)
}

fn started(policy: SchedulerPolicy, roster: Vec<CombatantSnapshot>) -> Scheduler {
    let mut scheduler = Scheduler::new(SchedulerConfig::default(), policy);
    scheduler
        .start_battle(roster)
        .expect("battle should start");
    scheduler
}

fn act(scheduler: &mut Scheduler) -> Resolution {
    let head = scheduler.current_head().expect("someone should be acting");
    scheduler
        .submit(ActionSubmission::new(head.combatant))
        .expect("plain submission should resolve")
}

fn ids(views: &[TurnEntryView]) -> Vec<CombatantId> {
    views.iter().map(|view| view.combatant).collect()
}

fn kinds(views: &[TurnEntryView]) -> Vec<TurnKind> {
    views.iter().map(|view| view.kind).collect()
}

/// A(10), B(20), C(20) with C created after B: B, C, A.
#[test]
fn test_equal_priorities_resolve_by_creation_order() {
    let scheduler = started(plain(), vec![party(A, 10), party(B, 20), party(C, 20)]);

    assert_eq!(ids(&scheduler.forecast(3)), vec![B, C, A]);
    assert_eq!(scheduler.current_head().map(|head| head.combatant), Some(B));
}

#[test]
fn test_forecast_is_descending_for_distinct_priorities() {
    let config = SchedulerConfig::default().with_projected_phases(0);
    let mut scheduler = Scheduler::new(config, plain());
    scheduler
        .start_battle(vec![
            party(CombatantId(1), 5),
            party(CombatantId(2), 30),
            troop(CombatantId(3), 12),
            troop(CombatantId(4), 18),
        ])
        .expect("battle should start");

    let forecast = scheduler.forecast(10);
    assert_eq!(forecast.len(), 4);
    assert!(
        forecast
            .windows(2)
            .all(|pair| pair[0].priority > pair[1].priority)
    );
}

#[test]
fn test_forecast_is_idempotent() {
    let scheduler = started(
        SchedulerPolicy::standard(),
        vec![party(A, 10), party(B, 20), troop(C, 20), troop(X, 3)],
    );

    let first = scheduler.forecast(8);
    let second = scheduler.forecast(8);
    assert_eq!(first, second);
}

/// The projected next round is exactly what the scheduler generates once the
/// current round is over, jitter included.
#[test]
fn test_projection_matches_next_generation() {
    let mut scheduler = started(
        SchedulerPolicy::standard(),
        vec![party(A, 10), party(B, 20), troop(C, 20)],
    );

    let projected = scheduler.forecast(6);
    assert_eq!(projected.len(), 6);

    for _ in 0..3 {
        act(&mut scheduler);
    }
    assert_eq!(scheduler.round(), 2);
    assert_eq!(scheduler.forecast(3), projected[3..].to_vec());
}

#[test]
fn test_same_seed_same_battle() {
    let roster = vec![party(A, 10), party(B, 10), troop(C, 10), troop(X, 10)];
    let config = SchedulerConfig::default().with_seed(7).with_projected_phases(3);

    let mut first = Scheduler::new(config.clone(), SchedulerPolicy::standard());
    first.start_battle(roster.clone()).expect("battle should start");
    let mut second = Scheduler::new(config, SchedulerPolicy::standard());
    second.start_battle(roster).expect("battle should start");

    assert_eq!(first.forecast(16), second.forecast(16));
}

/// Haste on A raises it above B: A moves ahead of B, C stays behind B.
#[test]
fn test_haste_reorders_only_the_hasted_combatant() {
    let mut scheduler = started(
        SchedulerPolicy::order_turn(),
        vec![party(E, 25), party(A, 10), party(B, 20), party(C, 20), troop(X, 1)],
    );
    assert_eq!(ids(&scheduler.forecast(5)), vec![E, B, C, A, X]);

    let events = record(&mut scheduler);
    let hasted = party(A, 10).with_modifier(SpeedModifier::status(Bonus::flat(20)));
    scheduler
        .update_combatant(hasted)
        .expect("update should succeed");

    assert_eq!(ids(&scheduler.forecast(5)), vec![E, A, B, C, X]);
    assert!(events.lock().unwrap().iter().any(|event| matches!(
        event,
        QueueEvent::Reordered { combatant, priority } if *combatant == A && priority.value() == 30
    )));
}

#[test]
fn test_unchanged_speed_does_not_reorder() {
    let mut scheduler = started(plain(), vec![party(A, 10), party(B, 20), troop(X, 1)]);
    let before = scheduler.forecast(3);

    scheduler
        .update_combatant(party(A, 10))
        .expect("update should succeed");
    assert_eq!(scheduler.forecast(3), before);
}

/// B is defeated at the head before acting: C becomes the head, nothing else
/// happens.
#[test]
fn test_defeated_head_is_discarded() {
    let mut scheduler = started(
        plain(),
        vec![party(A, 10), party(B, 20), party(C, 20), troop(X, 1)],
    );
    assert_eq!(scheduler.current_head().map(|head| head.combatant), Some(B));

    scheduler
        .remove_combatant(B, RemovalReason::Defeated)
        .expect("removal should succeed");

    assert_eq!(scheduler.phase(), Phase::AwaitingAction);
    assert_eq!(scheduler.turns_taken(), 0);
    assert_eq!(ids(&scheduler.forecast(6)), vec![C, A, X, C, A, X]);
    assert_eq!(scheduler.combatant(B).map(|b| b.alive), Some(false));
}

#[test]
fn test_snapshot_turning_dead_invalidates_entries() {
    let mut scheduler = started(
        plain(),
        vec![party(A, 10), party(B, 20), troop(X, 1), troop(C, 5)],
    );

    scheduler
        .update_combatant(troop(X, 1).defeated())
        .expect("update should succeed");
    assert_eq!(ids(&scheduler.forecast(3)), vec![B, A, C]);
}

#[test]
fn test_fleeing_combatant_leaves_the_roster() {
    let mut scheduler = started(plain(), vec![party(A, 10), party(B, 20), troop(X, 1)]);

    scheduler
        .remove_combatant(A, RemovalReason::Fled)
        .expect("removal should succeed");
    assert!(scheduler.combatant(A).is_none());
    assert_eq!(ids(&scheduler.forecast(2)), vec![B, X]);
    assert_eq!(scheduler.phase(), Phase::AwaitingAction);
}

#[test]
fn test_last_member_fleeing_ends_battle_without_a_winner() {
    let mut scheduler = started(SchedulerPolicy::order_turn(), vec![party(A, 10), troop(X, 1)]);

    scheduler
        .remove_combatant(A, RemovalReason::Fled)
        .expect("removal should succeed");
    assert_eq!(scheduler.phase(), Phase::BattleEnded);
    assert_eq!(
        scheduler.end_reason(),
        Some(EndReason::Fled { side: Side::Party })
    );

    let report = scheduler.end_battle().expect("battle should tear down");
    assert_eq!(report.reason, EndReason::Fled { side: Side::Party });
    assert_eq!(report.winner, None);
}

#[test]
fn test_side_with_a_fallen_member_is_defeated_even_if_the_rest_fled() {
    let mut scheduler = started(plain(), vec![party(A, 10), party(B, 20), troop(X, 1)]);

    scheduler
        .remove_combatant(B, RemovalReason::Defeated)
        .expect("removal should succeed");
    scheduler
        .remove_combatant(A, RemovalReason::Fled)
        .expect("removal should succeed");

    let report = scheduler.end_battle().expect("battle should tear down");
    assert_eq!(report.reason, EndReason::SideDefeated { side: Side::Party });
    assert_eq!(report.winner, Some(Side::Troop));
}

#[test]
fn test_preempting_interrupt_returns_to_preempted_head() {
    let mut scheduler = started(
        plain(),
        vec![party(A, 30), party(B, 20), party(C, 10), troop(X, 1)],
    );

    scheduler.force_action(C).expect("interrupt should be accepted");
    let forecast = scheduler.forecast(5);
    assert_eq!(ids(&forecast), vec![C, A, B, C, X]);
    assert_eq!(forecast[0].kind, TurnKind::Forced);

    let resolution = act(&mut scheduler);
    assert_eq!(resolution.consumed, TurnKind::Forced);
    assert_eq!(resolution.next.map(|head| head.combatant), Some(A));
}

#[test]
fn test_invalidated_preempted_head_does_not_return() {
    let mut scheduler = started(
        plain(),
        vec![party(A, 30), party(B, 20), party(C, 10), troop(X, 1)],
    );

    scheduler.force_action(C).expect("interrupt should be accepted");
    scheduler
        .remove_combatant(A, RemovalReason::Defeated)
        .expect("removal should succeed");

    let resolution = act(&mut scheduler);
    assert_eq!(resolution.next.map(|head| head.combatant), Some(B));
}

#[test]
fn test_deferred_interrupt_waits_for_current_actor() {
    let mut scheduler = started(
        SchedulerPolicy::order_turn(),
        vec![party(A, 30), party(B, 20), party(C, 10), troop(X, 1)],
    );

    scheduler.force_action(C).expect("interrupt should be accepted");
    let forecast = scheduler.forecast(3);
    assert_eq!(ids(&forecast), vec![A, C, B]);
    assert_eq!(kinds(&forecast), vec![TurnKind::Normal, TurnKind::Forced, TurnKind::Normal]);

    let resolution = act(&mut scheduler);
    assert_eq!(
        resolution.next.map(|head| (head.combatant, head.kind)),
        Some((C, TurnKind::Forced))
    );
}

#[test]
fn test_submission_can_force_an_interrupt() {
    let mut scheduler = started(
        plain(),
        vec![party(A, 30), party(B, 20), party(C, 10), troop(X, 1)],
    );

    let resolution = scheduler
        .submit(ActionSubmission::new(A).forcing(B))
        .expect("submission should resolve");

    assert_eq!(resolution.interrupt.map(|entry| entry.combatant), Some(B));
    let forecast = scheduler.forecast(3);
    assert_eq!(ids(&forecast), vec![B, B, C]);
    assert_eq!(forecast[0].kind, TurnKind::Forced);
}

#[test]
fn test_forcing_an_unknown_combatant_changes_nothing() {
    let mut scheduler = started(plain(), vec![party(A, 30), troop(X, 1)]);
    let before = scheduler.forecast(4);

    let err = scheduler
        .submit(ActionSubmission::new(A).forcing(CombatantId(77)))
        .unwrap_err();

    assert_eq!(
        err,
        SchedulerError::UnknownCombatant {
            combatant: CombatantId(77)
        }
    );
    assert_eq!(scheduler.phase(), Phase::AwaitingAction);
    assert_eq!(scheduler.forecast(4), before);
}

#[test]
fn test_only_the_current_actor_may_submit() {
    let mut scheduler = started(plain(), vec![party(A, 30), troop(X, 1)]);

    let err = scheduler.submit(ActionSubmission::new(X)).unwrap_err();
    assert_eq!(
        err,
        SchedulerError::ActorNotCurrent {
            actor: X,
            current: Some(A),
        }
    );
}

#[test]
fn test_spending_without_a_resource_model_is_rejected() {
    let mut scheduler = started(plain(), vec![party(A, 30), troop(X, 1)]);

    let err = scheduler
        .submit(ActionSubmission::new(A).with_resource_spend(1))
        .unwrap_err();
    assert_eq!(err, SchedulerError::ResourcesDisabled);
    assert_eq!(scheduler.current_head().map(|head| head.combatant), Some(A));
}

#[test]
fn test_delayed_turn_goes_behind_every_normal_entry() {
    let mut scheduler = started(
        SchedulerPolicy::order_turn(),
        vec![party(A, 30), party(B, 20), party(C, 10), troop(X, 1)],
    );

    scheduler.delay_turn(A).expect("delay should be accepted");
    let forecast = scheduler.forecast(4);
    assert_eq!(ids(&forecast), vec![B, C, X, A]);
    assert_eq!(forecast[3].kind, TurnKind::Delayed);

    for _ in 0..3 {
        act(&mut scheduler);
    }
    let head = scheduler.current_head().expect("delayed turn should be up");
    assert_eq!((head.combatant, head.kind), (A, TurnKind::Delayed));
    assert_eq!(scheduler.round(), 1);

    assert_eq!(
        scheduler.delay_turn(A),
        Err(SchedulerError::CannotDelay { combatant: A })
    );
}

#[test]
fn test_queued_turn_can_be_delayed() {
    let mut scheduler = started(
        SchedulerPolicy::order_turn(),
        vec![party(A, 30), party(B, 20), party(C, 10), troop(X, 1)],
    );

    scheduler.delay_turn(B).expect("delay should be accepted");
    assert_eq!(ids(&scheduler.forecast(4)), vec![A, C, X, B]);
}

#[test]
fn test_speed_override_applies_to_next_round() {
    let mut scheduler = started(
        SchedulerPolicy::order_turn(),
        vec![party(A, 30), party(B, 20), troop(X, 1)],
    );

    scheduler
        .submit(ActionSubmission::new(A).with_speed_override(-15))
        .expect("submission should resolve");
    assert_eq!(ids(&scheduler.forecast(5)), vec![B, X, B, A, X]);

    act(&mut scheduler);
    act(&mut scheduler);
    assert_eq!(scheduler.round(), 2);

    let forecast = scheduler.forecast(6);
    assert_eq!(ids(&forecast), vec![B, A, X, A, B, X]);
    assert_eq!(forecast[1].priority.value(), 15);
}

#[test]
fn test_joiner_acts_from_the_next_pass() {
    let joiner = CombatantId(42);
    let mut scheduler = started(SchedulerPolicy::order_turn(), vec![party(A, 30), troop(X, 1)]);

    scheduler
        .add_combatant(party(joiner, 100))
        .expect("joiner should be accepted");
    assert_eq!(ids(&scheduler.forecast(5)), vec![A, X, joiner, A, X]);

    assert_eq!(
        scheduler.add_combatant(party(joiner, 100)),
        Err(SchedulerError::DuplicateCombatant { combatant: joiner })
    );
}

#[test]
fn test_wiping_out_a_side_ends_the_battle() {
    let mut scheduler = started(plain(), vec![party(A, 30), troop(X, 1), troop(C, 5)]);

    scheduler
        .remove_combatant(X, RemovalReason::Defeated)
        .expect("removal should succeed");
    assert_eq!(scheduler.phase(), Phase::AwaitingAction);

    scheduler
        .remove_combatant(C, RemovalReason::Defeated)
        .expect("removal should succeed");
    assert_eq!(scheduler.phase(), Phase::BattleEnded);
    assert!(scheduler.current_head().is_none());

    let report = scheduler.end_battle().expect("report should be produced");
    assert_eq!(report.winner, Some(Side::Party));
    assert!(report.balances.is_empty());
}

#[test]
fn test_mutations_after_battle_end_are_rejected() {
    let mut scheduler = started(plain(), vec![party(A, 30), troop(X, 1)]);
    scheduler.abort();

    assert_eq!(
        scheduler.force_action(A),
        Err(SchedulerError::InvalidPhase {
            expected: Phase::AwaitingAction,
            actual: Phase::BattleEnded,
        })
    );
    assert!(scheduler.forecast(4).is_empty());
}

#[test]
fn test_observers_see_every_committed_change() {
    let mut scheduler = Scheduler::new(SchedulerConfig::default(), plain());
    let events = record(&mut scheduler);
    let snapshots: Arc<Mutex<Vec<QueueSnapshot>>> = Arc::default();
    let sink = Arc::clone(&snapshots);
    scheduler.subscribe(Box::new(move |_: &QueueEvent, snapshot: &QueueSnapshot| {
        sink.lock().unwrap().push(snapshot.clone());
    }));

    scheduler
        .start_battle(vec![party(A, 30), party(B, 20), troop(X, 1)])
        .expect("battle should start");
    act(&mut scheduler);

    let events = events.lock().unwrap();
    assert!(matches!(
        events[0],
        QueueEvent::Regenerated {
            round: 1,
            entries: 3,
            ..
        }
    ));
    let heads: Vec<CombatantId> = events
        .iter()
        .filter_map(|event| match event {
            QueueEvent::HeadChanged { head: Some(head) } => Some(head.combatant),
            _ => None,
        })
        .collect();
    assert_eq!(heads, vec![A, B]);

    let snapshots = snapshots.lock().unwrap();
    assert_eq!(snapshots.len(), events.len());
    let last = snapshots.last().expect("snapshots recorded");
    assert_eq!(last.head.map(|head| head.combatant), Some(B));
    assert!(last.upcoming.len() <= SchedulerConfig::DEFAULT_FORECAST_HORIZON);
}

fn record(scheduler: &mut Scheduler) -> Arc<Mutex<Vec<QueueEvent>>> {
    let events: Arc<Mutex<Vec<QueueEvent>>> = Arc::default();
    let sink = Arc::clone(&events);
    scheduler.subscribe(Box::new(move |event: &QueueEvent, _: &QueueSnapshot| {
        sink.lock().unwrap().push(event.clone());
    }));
    events
}
