#![no_main]

//! Full match fuzzer.
//!
//! Drives a started match with an arbitrary command stream. Every command
//! is either accepted or rejected without side effects, and the state stays
//! consistent after each one.

use arbitrary::Arbitrary;
use conquest::GameConfig;
use conquest::game::invariants::assert_invariants;
use conquest::game::{
    Command, GameFsm, Movement, PathType, PlayerSetup, Rank, TerritorySetup, Troops, ZoneType,
};
use libfuzzer_sys::fuzz_target;

const IDS: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

/// A fuzzer-generated command with indices in place of ids.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzCommand {
    Deploy { territory: u8, troops: [u8; 3] },
    Attack { from: u8, to: u8, attacker: [u8; 3], defender: [u8; 3] },
    Fortify { from: u8, to: u8, troops: [u8; 3] },
    UpgradePath { path: u8 },
    Reinforce { territory: u8 },
    Consolidate { territory: u8 },
    UseZone { territory: u8 },
    Move { from: u8, legs: Vec<(u8, [u8; 3])> },
    AdvancePhase,
    EndTurn,
}

/// Structured input for match fuzzing.
#[derive(Arbitrary, Debug)]
struct GameTurnInput {
    seed: u32,
    conquer_empty: bool,
    /// Optional starting gold override.
    starting_gold: Option<u16>,
    commands: Vec<FuzzCommand>,
}

fn id(index: u8) -> String {
    IDS[usize::from(index) % IDS.len()].to_string()
}

fn troops(counts: [u8; 3]) -> Troops {
    Troops::from_counts(&[
        (Rank::Explorer, u32::from(counts[0] % 8)),
        (Rank::Warrior, u32::from(counts[1] % 8)),
        (Rank::Elite, u32::from(counts[2] % 4)),
    ])
}

fn to_command(command: FuzzCommand) -> Command {
    match command {
        FuzzCommand::Deploy { territory, troops: t } => Command::Deploy {
            territory_id: id(territory),
            troops: troops(t),
        },
        FuzzCommand::Attack { from, to, attacker, defender } => Command::Attack {
            from_id: id(from),
            to_id: id(to),
            attacker_commit: troops(attacker),
            defender_commit: troops(defender),
        },
        FuzzCommand::Fortify { from, to, troops: t } => Command::Fortify {
            from_id: id(from),
            to_id: id(to),
            troops: troops(t),
        },
        FuzzCommand::UpgradePath { path } => Command::UpgradePath {
            path_type: PathType::ALL[usize::from(path) % PathType::ALL.len()],
        },
        FuzzCommand::Reinforce { territory } => Command::Reinforce {
            territory_id: id(territory),
        },
        FuzzCommand::Consolidate { territory } => Command::Consolidate {
            territory_id: id(territory),
        },
        FuzzCommand::UseZone { territory } => Command::UseZone {
            territory_id: id(territory),
        },
        FuzzCommand::Move { from, legs } => Command::Move {
            movements: legs
                .into_iter()
                .take(8)
                .map(|(to, t)| Movement {
                    from_id: id(from),
                    to_id: id(to),
                    troops: troops(t),
                })
                .collect(),
        },
        FuzzCommand::AdvancePhase => Command::AdvancePhase,
        FuzzCommand::EndTurn => Command::EndTurn,
    }
}

fn actions_left(fsm: &GameFsm, player: &str) -> i32 {
    fsm.state().get_player(player).map_or(0, |p| p.actions_left)
}

fuzz_target!(|input: GameTurnInput| {
    let mut config = GameConfig::default();
    config.combat.conquer_empty_territories = input.conquer_empty;
    if let Some(gold) = input.starting_gold {
        config.game_settings.starting_gold = u32::from(gold);
    }

    let players = vec![PlayerSetup::new("p1"), PlayerSetup::new("p2")];
    let territories = vec![
        TerritorySetup::new("a").spawn(),
        TerritorySetup::new("b").spawn(),
        TerritorySetup::new("c").with_zone(ZoneType::Gold),
        TerritorySetup::new("d").with_zone(ZoneType::Recruitment),
        TerritorySetup::new("e").with_zone(ZoneType::Walled),
        TerritorySetup::new("f").with_zone(ZoneType::Fast),
    ];
    let mut fsm = GameFsm::new("fuzz", input.seed, &players, &territories, config);
    if fsm.start_game().is_err() {
        return;
    }

    for command in input.commands.into_iter().take(256) {
        if fsm.state().is_game_over() {
            break;
        }
        let before = fsm.get_state();
        let rng_before = fsm.rng().clone();
        let player = fsm.state().current_player_id.clone();
        let actions_before = actions_left(&fsm, &player);
        let command = to_command(command);
        let costs_action = command.costs_action();
        let ends_turn = command == Command::EndTurn;

        if fsm.apply(&player, command).is_ok() {
            if !ends_turn {
                let spent = actions_before - actions_left(&fsm, &player);
                assert_eq!(spent, i32::from(costs_action), "wrong action cost");
            }
        } else {
            assert_eq!(&before, fsm.state(), "rejected command changed the state");
            assert_eq!(&rng_before, fsm.rng(), "rejected command consumed randomness");
        }

        assert_invariants(fsm.state(), fsm.config());
    }
});
