use std::fs;

use battle_content::BattleSetup;
use battle_core::{CombatantId, Phase, SchedulerPolicy, Side};
use tempfile::TempDir;

const ROSTER: &str = r#"[
    (id: (1), agility: 12, side: Party),
    (id: (2), agility: 30, side: Party),
    (id: (11), agility: 20, side: Troop),
]"#;

fn data_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for (name, content) in files {
        fs::write(dir.path().join(name), content).expect("write fixture");
    }
    dir
}

#[test]
fn test_roster_alone_uses_defaults() {
    let dir = data_dir(&[(BattleSetup::ROSTER_FILE, ROSTER)]);

    let setup = BattleSetup::from_dir(dir.path()).expect("setup should load");
    assert_eq!(setup.policy, SchedulerPolicy::standard());
    assert_eq!(setup.roster.len(), 3);
}

#[test]
fn test_missing_roster_is_an_error() {
    let dir = data_dir(&[(BattleSetup::POLICY_FILE, r#"preset = "brave""#)]);

    let err = BattleSetup::from_dir(dir.path()).unwrap_err();
    assert!(err.to_string().contains(BattleSetup::ROSTER_FILE));
}

/// A loaded setup starts a battle whose order follows the roster's agility.
#[test]
fn test_loaded_setup_runs_a_free_turn_battle() {
    let dir = data_dir(&[
        (BattleSetup::ROSTER_FILE, ROSTER),
        (BattleSetup::CONFIG_FILE, "battle_seed = 7\nforecast_horizon = 4"),
        (BattleSetup::POLICY_FILE, r#"preset = "free_turn""#),
    ]);

    let setup = BattleSetup::from_dir(dir.path()).expect("setup should load");
    let mut scheduler = setup.scheduler();
    scheduler
        .start_battle(setup.roster.clone())
        .expect("battle should start");

    assert_eq!(scheduler.phase(), Phase::AwaitingAction);
    assert_eq!(scheduler.active_side(), Some(Side::Party));
    let order: Vec<CombatantId> = scheduler
        .forecast(3)
        .iter()
        .map(|view| view.combatant)
        .collect();
    assert_eq!(order, vec![CombatantId(2), CombatantId(1), CombatantId(11)]);
}

#[test]
fn test_preset_override_replaces_file_policy() {
    let dir = data_dir(&[
        (BattleSetup::ROSTER_FILE, ROSTER),
        (BattleSetup::POLICY_FILE, r#"preset = "brave""#),
    ]);

    let setup = BattleSetup::from_dir(dir.path())
        .and_then(|setup| setup.with_preset("order_turn"))
        .expect("setup should load");
    assert_eq!(setup.policy, SchedulerPolicy::order_turn());
}
