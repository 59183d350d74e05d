//! The match aggregate: phase machine and command handlers.
//!
//! ```text
//! LOBBY --start_game--> DEPLOY --advance--> ATTACK --advance--> FORTIFY
//!                         ^                                        |
//!                         +---------------- end_turn --------------+
//!                                              |
//!                                          GAME_OVER
//! ```
//!
//! Every handler acts for the current player and checks everything it needs
//! before the first write, so a rejected command leaves the state untouched.

// Victory share is a fraction of the map size, floored.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::error::{CommandResult, GameError};
use crate::game::combat::{CombatModifiers, CombatResult, resolve_combat};
use crate::game::economy::{
    calculate_actions, calculate_income, calculate_unit_cost, can_deploy_rank, get_chief_limit,
    path_upgrade_cost,
};
use crate::game::{
    Command, GameState, HeroType, MAX_PATH_LEVEL, Movement, PathType, Phase, Player, PlayerId,
    PlayerSetup, RandomSource, Rank, TerritoryId, TerritorySetup, TerritoryState, Troops, ZoneType,
};

/// What a successful [`GameFsm::apply`] hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Copy of the state after the command.
    pub state: GameState,
    /// Battle result, for attacks.
    pub combat: Option<CombatResult>,
}

/// Everything needed to resume a match bit-exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Game state.
    pub state: GameState,
    /// Random source, including its draw counter.
    pub rng: RandomSource,
}

/// One match.
#[derive(Debug, Clone)]
pub struct GameFsm {
    state: GameState,
    rng: RandomSource,
    config: GameConfig,
}

impl GameFsm {
    /// Create a match in the lobby.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        seed: u32,
        players: &[PlayerSetup],
        territories: &[TerritorySetup],
        config: GameConfig,
    ) -> Self {
        Self {
            state: GameState::new(id, seed, players, territories),
            rng: RandomSource::new(seed),
            config,
        }
    }

    /// Resume a match from a snapshot.
    #[must_use]
    pub fn restore(snapshot: Snapshot, config: GameConfig) -> Self {
        Self {
            state: snapshot.state,
            rng: snapshot.rng,
            config,
        }
    }

    /// Capture state and random source.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            rng: self.rng.clone(),
        }
    }

    /// Independent copy of the current state.
    #[must_use]
    pub fn get_state(&self) -> GameState {
        self.state.clone()
    }

    /// Borrow the current state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// The match configuration.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The match random source.
    #[must_use]
    pub const fn rng(&self) -> &RandomSource {
        &self.rng
    }

    /// Apply a command on behalf of `player_id`.
    ///
    /// # Errors
    ///
    /// [`GameError::GameOver`] after the match ended, [`GameError::NotYourTurn`]
    /// if `player_id` is not the current player, otherwise whatever the
    /// command's handler rejects.
    pub fn apply(&mut self, player_id: &str, command: Command) -> CommandResult<CommandOutcome> {
        self.ensure_not_over()?;
        if self.state.get_player(player_id).is_none() {
            return Err(GameError::UnknownPlayer(player_id.to_string()));
        }
        if self.state.current_player_id != player_id {
            return Err(GameError::NotYourTurn {
                player: player_id.to_string(),
            });
        }

        let name = command.name();
        let result = match command {
            Command::Deploy {
                territory_id,
                troops,
            } => self.deploy_troops(&territory_id, &troops).map(|()| None),
            Command::Attack {
                from_id,
                to_id,
                attacker_commit,
                defender_commit,
            } => self
                .attack_territory(&from_id, &to_id, &attacker_commit, &defender_commit)
                .map(Some),
            Command::Fortify {
                from_id,
                to_id,
                troops,
            } => self.fortify(&from_id, &to_id, &troops).map(|()| None),
            Command::UpgradePath { path_type } => self.upgrade_path(path_type).map(|()| None),
            Command::Reinforce { territory_id } => {
                self.reinforce_territory(&territory_id).map(|()| None)
            }
            Command::Consolidate { territory_id } => {
                self.consolidate_territory(&territory_id).map(|()| None)
            }
            Command::UseZone { territory_id } => self.use_zone(&territory_id).map(|()| None),
            Command::Move { movements } => self.move_troops(&movements).map(|()| None),
            Command::AdvancePhase => self.advance_phase().map(|_| None),
            Command::EndTurn => self.end_turn().map(|()| None),
        };

        if let Err(err) = &result {
            debug!(player = player_id, command = name, %err, "command rejected");
        }
        let combat = result?;

        Ok(CommandOutcome {
            state: self.get_state(),
            combat,
        })
    }

    /// Assign spawns and start the first turn.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside the lobby,
    /// [`GameError::InvalidPlayerCount`] or [`GameError::NotEnoughSpawns`].
    pub fn start_game(&mut self) -> CommandResult<()> {
        if self.state.phase != Phase::Lobby {
            return Err(GameError::WrongPhase {
                action: "start_game",
                phase: self.state.phase,
            });
        }

        let settings = &self.config.game_settings;
        let count = self.state.players.len();
        if count < settings.min_players || count > settings.max_players {
            return Err(GameError::InvalidPlayerCount {
                count,
                min: settings.min_players,
                max: settings.max_players,
            });
        }

        // BTreeMap iteration is already sorted by id.
        let spawns: Vec<TerritoryId> = self
            .state
            .territories
            .values()
            .filter(|t| t.is_spawn)
            .map(|t| t.id.clone())
            .collect();
        if spawns.len() < count {
            return Err(GameError::NotEnoughSpawns {
                spawns: spawns.len(),
                players: count,
            });
        }

        let starting_gold = settings.starting_gold;
        let spawn_troops = Troops::of(Rank::Warrior, settings.spawn_warriors);
        for (player, spawn) in self.state.players.iter_mut().zip(spawns) {
            if let Some(territory) = self.state.territories.get_mut(&spawn) {
                territory.change_owner(Some(player.id.clone()));
                territory.troops.merge(&spawn_troops);
            }
            player.add_territory(spawn);
            player.gold = starting_gold;
            player.actions = calculate_actions(player, &self.config);
            player.actions_left = player.actions;
        }

        self.state.phase = Phase::Deploy;
        self.state.turn = 1;
        self.state.current_player_id = self
            .state
            .players
            .first()
            .map(|p| p.id.clone())
            .unwrap_or_default();

        info!(
            game = %self.state.id,
            players = count,
            first = %self.state.current_player_id,
            "game started"
        );
        Ok(())
    }

    /// Buy units and place them on an owned territory.
    ///
    /// A RECRUITMENT zone not yet used this turn pays for
    /// `recruitment_free_units` units (one more at LAND 3), taken from the
    /// lowest requested ranks first; deploying with free units uses the zone.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside DEPLOY, [`GameError::NotOwner`],
    /// [`GameError::RankLocked`], [`GameError::ChiefLimitExceeded`],
    /// [`GameError::InsufficientGold`] or [`GameError::NoActionsLeft`].
    pub fn deploy_troops(&mut self, territory_id: &str, troops: &Troops) -> CommandResult<()> {
        self.ensure_phase("deploy", &[Phase::Deploy])?;
        let player = self.acting_player()?;
        let territory = self.owned_territory(territory_id)?;
        self.ensure_action_available(player)?;

        if let Some((rank, _)) = troops.iter().find(|&(rank, _)| !can_deploy_rank(player, rank)) {
            return Err(GameError::RankLocked(rank));
        }

        let requested_chiefs = troops.get(Rank::Chief);
        if requested_chiefs > 0 {
            let current = self.fielded(player, Rank::Chief);
            let limit = get_chief_limit(player, &self.config);
            if current.saturating_add(requested_chiefs) > limit {
                return Err(GameError::ChiefLimitExceeded {
                    current,
                    requested: requested_chiefs,
                    limit,
                });
            }
        }

        let allowance = self.free_unit_allowance(player, territory);
        let (paid, free_used) = apply_free_units(troops, allowance);
        let cost = paid.iter().fold(0u64, |acc, (rank, count)| {
            acc + u64::from(calculate_unit_cost(rank, player, &self.config)) * u64::from(count)
        });
        if cost > u64::from(player.gold) {
            return Err(GameError::InsufficientGold {
                required: u32::try_from(cost).unwrap_or(u32::MAX),
                available: player.gold,
            });
        }
        // Bounded by player.gold above.
        let cost = cost as u32;

        let player_id = player.id.clone();
        let player = self.player_mut(&player_id)?;
        player.gold -= cost;
        player.actions_left -= 1;
        let territory = self.territory_mut(territory_id)?;
        territory.troops.merge(troops);
        if free_used > 0 {
            territory.zone_used = true;
        }

        debug!(
            player = %player_id,
            territory = territory_id,
            %troops,
            cost,
            free = free_used,
            "deployed"
        );
        Ok(())
    }

    /// Attack `to_id` from `from_id`.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside ATTACK, [`GameError::NotOwner`] for
    /// the source, [`GameError::SameTerritory`], [`GameError::OwnTerritory`],
    /// [`GameError::InsufficientTroops`] for either commitment or
    /// [`GameError::NoActionsLeft`].
    pub fn attack_territory(
        &mut self,
        from_id: &str,
        to_id: &str,
        attacker_commit: &Troops,
        defender_commit: &Troops,
    ) -> CommandResult<CombatResult> {
        self.ensure_phase("attack", &[Phase::Attack])?;
        let attacker = self.acting_player()?;
        let source = self.owned_territory(from_id)?;
        if from_id == to_id {
            return Err(GameError::SameTerritory(from_id.to_string()));
        }
        let target = self.territory(to_id)?;
        if target.is_owned_by(&attacker.id) {
            return Err(GameError::OwnTerritory(to_id.to_string()));
        }
        ensure_troops(source, attacker_commit)?;
        ensure_troops(target, defender_commit)?;
        self.ensure_action_available(attacker)?;

        let defender = target
            .owner_id
            .as_deref()
            .and_then(|id| self.state.get_player(id));
        let modifiers = derive_modifiers(attacker, defender, target, &self.config);
        let attacker_id = attacker.id.clone();
        let defender_id = target.owner_id.clone();

        let result = resolve_combat(
            attacker_commit,
            defender_commit,
            &modifiers,
            &mut self.rng,
            &self.config,
        );

        self.player_mut(&attacker_id)?.actions_left -= 1;
        self.territory_mut(from_id)?
            .troops
            .subtract_saturating(&result.attacker_losses);
        let target = self.territory_mut(to_id)?;
        target.troops.subtract_saturating(&result.defender_losses);
        target.consolidated = false;

        if result.conquest {
            let mut survivors = *attacker_commit;
            survivors.subtract_saturating(&result.attacker_losses);

            let target = self.territory_mut(to_id)?;
            target.change_owner(Some(attacker_id.clone()));
            target.troops.merge(&survivors);
            self.territory_mut(from_id)?
                .troops
                .subtract_saturating(&survivors);

            if let Some(old) = defender_id.as_deref().and_then(|id| self.state.get_player_mut(id)) {
                old.remove_territory(to_id);
            }
            self.player_mut(&attacker_id)?
                .add_territory(to_id.to_string());
        }

        debug!(
            player = %attacker_id,
            from = from_id,
            to = to_id,
            attacker_losses = %result.attacker_losses,
            defender_losses = %result.defender_losses,
            damage = result.total_damage,
            conquest = result.conquest,
            "attack resolved"
        );
        if result.conquest {
            info!(player = %attacker_id, territory = to_id, "territory conquered");
        }
        Ok(result)
    }

    /// Move units between two owned territories.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside FORTIFY, [`GameError::NotOwner`] for
    /// either end, [`GameError::SameTerritory`],
    /// [`GameError::InsufficientTroops`] or [`GameError::NoActionsLeft`].
    pub fn fortify(&mut self, from_id: &str, to_id: &str, troops: &Troops) -> CommandResult<()> {
        self.ensure_phase("fortify", &[Phase::Fortify])?;
        let player = self.acting_player()?;
        let source = self.owned_territory(from_id)?;
        self.owned_territory(to_id)?;
        if from_id == to_id {
            return Err(GameError::SameTerritory(from_id.to_string()));
        }
        ensure_troops(source, troops)?;
        self.ensure_action_available(player)?;
        let player_id = player.id.clone();

        self.player_mut(&player_id)?.actions_left -= 1;
        self.territory_mut(from_id)?.troops.subtract_saturating(troops);
        self.territory_mut(to_id)?.troops.merge(troops);

        debug!(player = %player_id, from = from_id, to = to_id, %troops, "fortified");
        Ok(())
    }

    /// Raise a path by one level.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside DEPLOY and ATTACK,
    /// [`GameError::PathAtMaxLevel`], [`GameError::InsufficientGold`] or
    /// [`GameError::NoActionsLeft`].
    pub fn upgrade_path(&mut self, path: PathType) -> CommandResult<()> {
        self.ensure_phase("upgrade_path", &[Phase::Deploy, Phase::Attack])?;
        let player = self.acting_player()?;
        let level = player.path(path);
        if level >= MAX_PATH_LEVEL {
            return Err(GameError::PathAtMaxLevel(path));
        }
        let cost = path_upgrade_cost(level, &self.config);
        if cost > player.gold {
            return Err(GameError::InsufficientGold {
                required: cost,
                available: player.gold,
            });
        }
        self.ensure_action_available(player)?;
        let player_id = player.id.clone();
        let clan_levels = self.config.clan_levels;

        let player = self.player_mut(&player_id)?;
        player.gold -= cost;
        player.actions_left -= 1;
        player.paths.set(path, level + 1);
        player.clan_level = clan_levels.clan_level_for(player.path(PathType::Clan));

        debug!(player = %player_id, %path, level = level + 1, cost, "path upgraded");
        Ok(())
    }

    /// Reinforce an owned territory: defender efficiency until it changes hands.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside DEPLOY, [`GameError::NotOwner`],
    /// [`GameError::AlreadyReinforced`] or [`GameError::NoActionsLeft`].
    pub fn reinforce_territory(&mut self, territory_id: &str) -> CommandResult<()> {
        self.ensure_phase("reinforce", &[Phase::Deploy])?;
        let player = self.acting_player()?;
        let territory = self.owned_territory(territory_id)?;
        if territory.reinforced {
            return Err(GameError::AlreadyReinforced(territory_id.to_string()));
        }
        self.ensure_action_available(player)?;
        let player_id = player.id.clone();

        self.player_mut(&player_id)?.actions_left -= 1;
        self.territory_mut(territory_id)?.reinforced = true;

        debug!(player = %player_id, territory = territory_id, "reinforced");
        Ok(())
    }

    /// Consolidate an owned territory: two extra EXPLORER dice on its next defence.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside FORTIFY, [`GameError::NotOwner`],
    /// [`GameError::AlreadyConsolidated`] or [`GameError::NoActionsLeft`].
    pub fn consolidate_territory(&mut self, territory_id: &str) -> CommandResult<()> {
        self.ensure_phase("consolidate", &[Phase::Fortify])?;
        let player = self.acting_player()?;
        let territory = self.owned_territory(territory_id)?;
        if territory.consolidated {
            return Err(GameError::AlreadyConsolidated(territory_id.to_string()));
        }
        self.ensure_action_available(player)?;
        let player_id = player.id.clone();

        self.player_mut(&player_id)?.actions_left -= 1;
        self.territory_mut(territory_id)?.consolidated = true;

        debug!(player = %player_id, territory = territory_id, "consolidated");
        Ok(())
    }

    /// Mark an owned GOLD or RECRUITMENT zone as used for this turn. Free.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside DEPLOY and ATTACK,
    /// [`GameError::NotOwner`], [`GameError::ZoneUnavailable`] or
    /// [`GameError::ZoneAlreadyUsed`].
    pub fn use_zone(&mut self, territory_id: &str) -> CommandResult<()> {
        self.ensure_phase("use_zone", &[Phase::Deploy, Phase::Attack])?;
        let player = self.acting_player()?;
        let territory = self.owned_territory(territory_id)?;
        if !territory.zone.is_some_and(ZoneType::is_usable) {
            return Err(GameError::ZoneUnavailable {
                territory: territory_id.to_string(),
                zone: territory.zone,
            });
        }
        if territory.zone_used {
            return Err(GameError::ZoneAlreadyUsed(territory_id.to_string()));
        }
        let player_id = player.id.clone();

        self.territory_mut(territory_id)?.zone_used = true;

        debug!(player = %player_id, territory = territory_id, "zone used");
        Ok(())
    }

    /// Move units from one origin to several owned destinations for one action.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside FORTIFY,
    /// [`GameError::TooManyDestinations`], [`GameError::MixedOrigins`],
    /// [`GameError::NotOwner`], [`GameError::SameTerritory`],
    /// [`GameError::InsufficientTroops`] for the summed request, or
    /// [`GameError::NoActionsLeft`].
    pub fn move_troops(&mut self, movements: &[Movement]) -> CommandResult<()> {
        self.ensure_phase("move", &[Phase::Fortify])?;
        let player = self.acting_player()?;
        let max = self.config.game_settings.max_move_destinations;
        let Some(first) = movements.first() else {
            return Err(GameError::TooManyDestinations { requested: 0, max });
        };
        if movements.len() > max {
            return Err(GameError::TooManyDestinations {
                requested: movements.len(),
                max,
            });
        }

        let origin = first.from_id.as_str();
        let source = self.owned_territory(origin)?;
        let mut total = Troops::default();
        for movement in movements {
            if movement.from_id != origin {
                return Err(GameError::MixedOrigins {
                    expected: origin.to_string(),
                    found: movement.from_id.clone(),
                });
            }
            self.owned_territory(&movement.to_id)?;
            if movement.to_id == origin {
                return Err(GameError::SameTerritory(origin.to_string()));
            }
            total.merge(&movement.troops);
        }
        ensure_troops(source, &total)?;
        self.ensure_action_available(player)?;
        let player_id = player.id.clone();

        self.player_mut(&player_id)?.actions_left -= 1;
        self.territory_mut(origin)?.troops.subtract_saturating(&total);
        for movement in movements {
            self.territory_mut(&movement.to_id)?
                .troops
                .merge(&movement.troops);
        }

        debug!(
            player = %player_id,
            from = origin,
            destinations = movements.len(),
            troops = %total,
            "moved troops"
        );
        Ok(())
    }

    /// DEPLOY to ATTACK, or ATTACK to FORTIFY. Returns the new phase.
    ///
    /// # Errors
    ///
    /// [`GameError::GameOver`] after the match ended, [`GameError::WrongPhase`]
    /// in the lobby or FORTIFY.
    pub fn advance_phase(&mut self) -> CommandResult<Phase> {
        self.ensure_not_over()?;
        let next = match self.state.phase {
            Phase::Deploy => Phase::Attack,
            Phase::Attack => Phase::Fortify,
            phase => {
                return Err(GameError::WrongPhase {
                    action: "advance_phase",
                    phase,
                });
            }
        };
        self.state.phase = next;
        debug!(player = %self.state.current_player_id, phase = %next, "phase advanced");
        Ok(next)
    }

    /// Pay income, pass the turn and check for a winner.
    ///
    /// # Errors
    ///
    /// [`GameError::GameOver`] after the match ended, [`GameError::WrongPhase`]
    /// in the lobby.
    pub fn end_turn(&mut self) -> CommandResult<()> {
        self.ensure_phase("end_turn", &[Phase::Deploy, Phase::Attack, Phase::Fortify])?;
        let player = self.acting_player()?;
        let income = calculate_income(
            player,
            self.state.territories_owned_by(&player.id),
            &self.config,
        );
        let player_id = player.id.clone();
        let next_id = self
            .state
            .next_player_id(&player_id)
            .ok_or_else(|| GameError::UnknownPlayer(player_id.clone()))?;

        let player = self.player_mut(&player_id)?;
        player.gold = player.gold.saturating_add(income);

        self.state.turn += 1;
        self.state.phase = Phase::Deploy;
        self.state.current_player_id.clone_from(&next_id);

        let mut has_fast = false;
        for territory in self.state.territories.values_mut() {
            if territory.is_owned_by(&next_id) {
                territory.zone_used = false;
                has_fast |= territory.has_zone(ZoneType::Fast);
            }
        }
        let fast_bonus = if has_fast {
            self.config.zones.fast_bonus_actions
        } else {
            0
        };
        let config = &self.config;
        if let Some(next) = self.state.get_player_mut(&next_id) {
            next.actions = calculate_actions(next, config) + fast_bonus;
            next.actions_left = next.actions;
        }

        info!(
            game = %self.state.id,
            turn = self.state.turn,
            player = %next_id,
            previous = %player_id,
            income,
            "turn passed"
        );

        if let Some(winner) = self.victor() {
            info!(game = %self.state.id, winner = %winner, turn = self.state.turn, "game over");
            self.state.phase = Phase::GameOver;
            self.state.winner_id = Some(winner);
        }
        Ok(())
    }

    /// First player in seat order holding more than
    /// `floor(total * victory_share)` territories.
    fn victor(&self) -> Option<PlayerId> {
        let total = self.state.total_territories();
        let needed =
            (total as f64 * self.config.game_settings.victory_share).floor() as usize;
        self.state
            .territory_counts()
            .into_iter()
            .find(|&(_, count)| count > needed)
            .map(|(id, _)| id)
    }

    fn ensure_not_over(&self) -> CommandResult<()> {
        if self.state.is_game_over() {
            return Err(GameError::GameOver);
        }
        Ok(())
    }

    fn ensure_phase(&self, action: &'static str, allowed: &[Phase]) -> CommandResult<()> {
        self.ensure_not_over()?;
        if allowed.contains(&self.state.phase) {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                action,
                phase: self.state.phase,
            })
        }
    }

    fn ensure_action_available(&self, player: &Player) -> CommandResult<()> {
        if self.config.game_settings.enforce_action_budget && player.actions_left <= 0 {
            return Err(GameError::NoActionsLeft);
        }
        Ok(())
    }

    fn acting_player(&self) -> CommandResult<&Player> {
        self.state
            .current_player()
            .ok_or_else(|| GameError::UnknownPlayer(self.state.current_player_id.clone()))
    }

    fn player_mut(&mut self, id: &str) -> CommandResult<&mut Player> {
        self.state
            .get_player_mut(id)
            .ok_or_else(|| GameError::UnknownPlayer(id.to_string()))
    }

    fn territory(&self, id: &str) -> CommandResult<&TerritoryState> {
        self.state
            .get_territory(id)
            .ok_or_else(|| GameError::UnknownTerritory(id.to_string()))
    }

    fn territory_mut(&mut self, id: &str) -> CommandResult<&mut TerritoryState> {
        self.state
            .get_territory_mut(id)
            .ok_or_else(|| GameError::UnknownTerritory(id.to_string()))
    }

    /// Territory that exists and belongs to the current player.
    fn owned_territory(&self, id: &str) -> CommandResult<&TerritoryState> {
        let territory = self.territory(id)?;
        if !territory.is_owned_by(&self.state.current_player_id) {
            return Err(GameError::NotOwner {
                territory: id.to_string(),
                player: self.state.current_player_id.clone(),
            });
        }
        Ok(territory)
    }

    /// Units of `rank` across all of the player's territories.
    fn fielded(&self, player: &Player, rank: Rank) -> u32 {
        self.state
            .territories_owned_by(&player.id)
            .fold(0u32, |acc, t| acc.saturating_add(t.troops.get(rank)))
    }

    fn free_unit_allowance(&self, player: &Player, territory: &TerritoryState) -> u32 {
        if !territory.has_zone(ZoneType::Recruitment) || territory.zone_used {
            return 0;
        }
        let mut allowance = self.config.zones.recruitment_free_units;
        if player.path(PathType::Land) >= 3 {
            allowance += 1;
        }
        allowance
    }
}

/// Split a request into the units still to be paid for and the number of
/// free units consumed, spending the allowance on the lowest ranks first.
fn apply_free_units(requested: &Troops, allowance: u32) -> (Troops, u32) {
    let mut paid = *requested;
    let mut remaining = allowance;
    for rank in Rank::ALL {
        if remaining == 0 {
            break;
        }
        let free = paid.get(rank).min(remaining);
        paid.remove_saturating(rank, free);
        remaining -= free;
    }
    (paid, allowance - remaining)
}

fn ensure_troops(territory: &TerritoryState, requested: &Troops) -> CommandResult<()> {
    match Rank::ALL
        .into_iter()
        .find(|&rank| requested.get(rank) > territory.troops.get(rank))
    {
        Some(rank) => Err(GameError::InsufficientTroops {
            territory: territory.id.clone(),
            rank,
            requested: requested.get(rank),
            available: territory.troops.get(rank),
        }),
        None => Ok(()),
    }
}

/// Battle modifiers from the attacker's hero and paths and the target's
/// zone, flags and owner.
#[must_use]
pub fn derive_modifiers(
    attacker: &Player,
    defender: Option<&Player>,
    target: &TerritoryState,
    config: &GameConfig,
) -> CombatModifiers {
    let attacker_efficiency = attacker.has_hero(HeroType::Strategist)
        || attacker.path(PathType::War) >= 1
        || attacker.clan_level >= 3;

    let mut attacker_rerolls = 0;
    if attacker.has_hero(HeroType::Master) {
        attacker_rerolls += 3;
    }
    if attacker.path(PathType::Luck) >= 1 {
        attacker_rerolls += 1;
    }

    let mut defender_defense_bonus = 0;
    if target.has_zone(ZoneType::Walled) {
        defender_defense_bonus += config.zones.walled_defense_bonus;
    }
    if defender.is_some_and(|d| d.path(PathType::Luck) >= 2) {
        defender_defense_bonus += 1;
    }

    CombatModifiers {
        attacker_efficiency,
        defender_efficiency: target.has_zone(ZoneType::Battle) || target.reinforced,
        attacker_rerolls,
        defender_rerolls: 0,
        luck_boost_elites: attacker.path(PathType::Luck) >= 3,
        defender_defense_bonus,
        defender_consolidated: target.consolidated,
        max_troops_per_side: target
            .has_zone(ZoneType::Defensive)
            .then_some(config.zones.defensive_max_troops),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two players, four territories; spawns are "a" and "c".
    fn create_test_game() -> GameFsm {
        let players = vec![PlayerSetup::new("p1"), PlayerSetup::new("p2")];
        let territories = vec![
            TerritorySetup::new("a").spawn(),
            TerritorySetup::new("b").with_zone(ZoneType::Recruitment),
            TerritorySetup::new("c").spawn(),
            TerritorySetup::new("d"),
        ];
        GameFsm::new("test", 12345, &players, &territories, GameConfig::default())
    }

    fn started() -> GameFsm {
        let mut fsm = create_test_game();
        fsm.start_game().unwrap();
        fsm
    }

    /// Give `territory` to `player` with `troops`.
    fn grant(fsm: &mut GameFsm, player: &str, territory: &str, troops: Troops) {
        let previous = fsm.state.territories[territory].owner_id.clone();
        if let Some(prev) = previous.and_then(|id| fsm.state.get_player_mut(&id)) {
            prev.remove_territory(territory);
        }
        let t = fsm.state.get_territory_mut(territory).unwrap();
        t.change_owner(Some(player.to_string()));
        t.troops = troops;
        fsm.state
            .get_player_mut(player)
            .unwrap()
            .add_territory(territory.to_string());
    }

    #[test]
    fn test_start_game_assigns_spawns() {
        let fsm = started();
        let state = fsm.state();
        assert_eq!(state.phase, Phase::Deploy);
        assert_eq!(state.turn, 1);
        assert_eq!(state.current_player_id, "p1");
        assert_eq!(state.territories["a"].owner_id.as_deref(), Some("p1"));
        assert_eq!(state.territories["c"].owner_id.as_deref(), Some("p2"));
        assert_eq!(state.territories["a"].troops, Troops::of(Rank::Warrior, 3));
        assert_eq!(state.players[0].gold, 200);
        assert_eq!(state.players[0].actions_left, 1);
        assert_eq!(state.players[1].territories, vec!["c".to_string()]);
    }

    #[test]
    fn test_start_game_twice_is_wrong_phase() {
        let mut fsm = started();
        assert!(matches!(
            fsm.start_game(),
            Err(GameError::WrongPhase { phase: Phase::Deploy, .. })
        ));
    }

    #[test]
    fn test_start_game_player_bounds() {
        let territories = vec![TerritorySetup::new("a").spawn()];
        let mut fsm = GameFsm::new(
            "solo",
            1,
            &[PlayerSetup::new("p1")],
            &territories,
            GameConfig::default(),
        );
        assert_eq!(
            fsm.start_game(),
            Err(GameError::InvalidPlayerCount { count: 1, min: 2, max: 6 })
        );
        assert_eq!(fsm.state().phase, Phase::Lobby);
    }

    #[test]
    fn test_start_game_not_enough_spawns() {
        let players = vec![PlayerSetup::new("p1"), PlayerSetup::new("p2")];
        let territories = vec![TerritorySetup::new("a").spawn(), TerritorySetup::new("b")];
        let mut fsm = GameFsm::new("x", 1, &players, &territories, GameConfig::default());
        assert_eq!(
            fsm.start_game(),
            Err(GameError::NotEnoughSpawns { spawns: 1, players: 2 })
        );
    }

    #[test]
    fn test_deploy_debits_gold_and_action() {
        let mut fsm = started();
        fsm.deploy_troops("a", &Troops::of(Rank::Explorer, 2)).unwrap();
        let p1 = fsm.state().get_player("p1").unwrap();
        assert_eq!(p1.gold, 0);
        assert_eq!(p1.actions_left, 0);
        assert_eq!(fsm.state().territories["a"].troops.get(Rank::Explorer), 2);
    }

    #[test]
    fn test_deploy_recruitment_free_unit() {
        let mut fsm = started();
        grant(&mut fsm, "p1", "b", Troops::default());
        fsm.state.get_player_mut("p1").unwrap().gold = 250;

        // One free explorer, one paid warrior.
        let troops = Troops::from_counts(&[(Rank::Explorer, 1), (Rank::Warrior, 1)]);
        fsm.deploy_troops("b", &troops).unwrap();
        assert_eq!(fsm.state().get_player("p1").unwrap().gold, 0);
        assert_eq!(fsm.state().territories["b"].troops, troops);
        assert!(fsm.state().territories["b"].zone_used);

        // The zone is spent for the rest of the turn.
        assert_eq!(
            fsm.deploy_troops("b", &Troops::of(Rank::Explorer, 1)),
            Err(GameError::InsufficientGold { required: 100, available: 0 })
        );
    }

    #[test]
    fn test_deploy_rejections_leave_state() {
        let mut fsm = started();
        let before = fsm.get_state();

        assert_eq!(
            fsm.deploy_troops("a", &Troops::of(Rank::Elite, 1)),
            Err(GameError::RankLocked(Rank::Elite))
        );
        assert!(matches!(
            fsm.deploy_troops("c", &Troops::of(Rank::Warrior, 1)),
            Err(GameError::NotOwner { .. })
        ));
        assert_eq!(
            fsm.deploy_troops("a", &Troops::of(Rank::Warrior, 1)),
            Err(GameError::InsufficientGold { required: 250, available: 200 })
        );
        assert_eq!(
            fsm.deploy_troops("a", &Troops::of(Rank::Chief, 2)),
            Err(GameError::ChiefLimitExceeded { current: 0, requested: 2, limit: 1 })
        );
        assert_eq!(fsm.get_state(), before);
    }

    #[test]
    fn test_deploy_wrong_phase() {
        let mut fsm = started();
        fsm.advance_phase().unwrap();
        assert_eq!(
            fsm.deploy_troops("a", &Troops::of(Rank::Warrior, 1)),
            Err(GameError::WrongPhase { action: "deploy", phase: Phase::Attack })
        );
    }

    #[test]
    fn test_action_budget_enforced() {
        let mut config = GameConfig::default();
        config.game_settings.enforce_action_budget = true;
        config.game_settings.starting_gold = 10_000;
        let players = vec![PlayerSetup::new("p1"), PlayerSetup::new("p2")];
        let territories = vec![TerritorySetup::new("a").spawn(), TerritorySetup::new("c").spawn()];
        let mut fsm = GameFsm::new("budget", 1, &players, &territories, config);
        fsm.start_game().unwrap();

        fsm.deploy_troops("a", &Troops::of(Rank::Warrior, 1)).unwrap();
        assert_eq!(
            fsm.deploy_troops("a", &Troops::of(Rank::Warrior, 1)),
            Err(GameError::NoActionsLeft)
        );
    }

    #[test]
    fn test_actions_left_goes_negative_when_not_enforced() {
        let mut fsm = started();
        fsm.state.get_player_mut("p1").unwrap().gold = 1_000;
        fsm.deploy_troops("a", &Troops::of(Rank::Explorer, 1)).unwrap();
        fsm.deploy_troops("a", &Troops::of(Rank::Explorer, 1)).unwrap();
        assert_eq!(fsm.state().get_player("p1").unwrap().actions_left, -1);
    }

    #[test]
    fn test_attack_validation() {
        let mut fsm = started();
        fsm.advance_phase().unwrap();
        let one = Troops::of(Rank::Warrior, 1);

        assert_eq!(
            fsm.attack_territory("a", "a", &one, &Troops::default()),
            Err(GameError::SameTerritory("a".to_string()))
        );
        assert!(matches!(
            fsm.attack_territory("c", "a", &one, &Troops::default()),
            Err(GameError::NotOwner { .. })
        ));
        assert!(matches!(
            fsm.attack_territory("a", "c", &Troops::of(Rank::Warrior, 4), &Troops::default()),
            Err(GameError::InsufficientTroops { requested: 4, available: 3, .. })
        ));
        assert!(matches!(
            fsm.attack_territory("a", "c", &one, &Troops::of(Rank::Warrior, 9)),
            Err(GameError::InsufficientTroops { requested: 9, .. })
        ));
        grant(&mut fsm, "p1", "d", Troops::default());
        assert_eq!(
            fsm.attack_territory("a", "d", &one, &Troops::default()),
            Err(GameError::OwnTerritory("d".to_string()))
        );
        assert_eq!(
            fsm.attack_territory("a", "zzz", &one, &Troops::default()),
            Err(GameError::UnknownTerritory("zzz".to_string()))
        );
    }

    #[test]
    fn test_attack_conquest_moves_survivors() {
        let mut fsm = started();
        grant(&mut fsm, "p1", "a", Troops::of(Rank::Legend, 5));
        grant(&mut fsm, "p2", "c", Troops::of(Rank::Explorer, 1));
        fsm.advance_phase().unwrap();

        // Three d20s against one d4 at seed 12345: the explorer falls.
        let commit = Troops::of(Rank::Legend, 3);
        let result = fsm
            .attack_territory("a", "c", &commit, &Troops::of(Rank::Explorer, 1))
            .unwrap();
        assert!(result.conquest);
        assert_eq!(result.defender_losses, Troops::of(Rank::Explorer, 1));

        let state = fsm.state();
        let survivors = 3 - result.attacker_losses.get(Rank::Legend);
        assert_eq!(state.territories["c"].owner_id.as_deref(), Some("p1"));
        assert_eq!(state.territories["c"].troops.get(Rank::Legend), survivors);
        assert_eq!(state.territories["c"].troops.get(Rank::Explorer), 0);
        assert_eq!(state.territories["a"].troops.get(Rank::Legend), 2);
        assert!(state.get_player("p1").unwrap().owns("c"));
        assert!(!state.get_player("p2").unwrap().owns("c"));
        assert_eq!(state.get_player("p1").unwrap().actions_left, 0);
    }

    #[test]
    fn test_attack_consumes_consolidation() {
        let mut fsm = started();
        fsm.state.get_territory_mut("c").unwrap().consolidated = true;
        fsm.advance_phase().unwrap();
        let result = fsm
            .attack_territory("a", "c", &Troops::of(Rank::Warrior, 1), &Troops::of(Rank::Warrior, 1))
            .unwrap();
        assert_eq!(result.defender_rolls.len(), 3);
        assert!(!fsm.state().territories["c"].consolidated);
    }

    #[test]
    fn test_fortify_moves_troops() {
        let mut fsm = started();
        grant(&mut fsm, "p1", "d", Troops::default());
        fsm.advance_phase().unwrap();
        fsm.advance_phase().unwrap();
        fsm.fortify("a", "d", &Troops::of(Rank::Warrior, 2)).unwrap();
        assert_eq!(fsm.state().territories["a"].troops.get(Rank::Warrior), 1);
        assert_eq!(fsm.state().territories["d"].troops.get(Rank::Warrior), 2);

        assert!(matches!(
            fsm.fortify("a", "c", &Troops::of(Rank::Warrior, 1)),
            Err(GameError::NotOwner { .. })
        ));
        assert!(matches!(
            fsm.fortify("a", "d", &Troops::of(Rank::Warrior, 2)),
            Err(GameError::InsufficientTroops { .. })
        ));
    }

    #[test]
    fn test_upgrade_path() {
        let mut fsm = started();
        fsm.upgrade_path(PathType::Clan).unwrap();
        let p1 = fsm.state().get_player("p1").unwrap();
        assert_eq!(p1.path(PathType::Clan), 1);
        assert_eq!(p1.clan_level, 2);
        assert_eq!(p1.gold, 100);

        // Level 1 -> 2 costs 200.
        assert_eq!(
            fsm.upgrade_path(PathType::Clan),
            Err(GameError::InsufficientGold { required: 200, available: 100 })
        );

        fsm.state.get_player_mut("p1").unwrap().paths.set(PathType::War, 3);
        assert_eq!(
            fsm.upgrade_path(PathType::War),
            Err(GameError::PathAtMaxLevel(PathType::War))
        );
    }

    #[test]
    fn test_reinforce_and_consolidate_phases() {
        let mut fsm = started();
        fsm.reinforce_territory("a").unwrap();
        assert!(fsm.state().territories["a"].reinforced);
        assert_eq!(
            fsm.reinforce_territory("a"),
            Err(GameError::AlreadyReinforced("a".to_string()))
        );
        assert!(matches!(
            fsm.consolidate_territory("a"),
            Err(GameError::WrongPhase { .. })
        ));

        fsm.advance_phase().unwrap();
        fsm.advance_phase().unwrap();
        fsm.consolidate_territory("a").unwrap();
        assert!(fsm.state().territories["a"].consolidated);
        assert_eq!(
            fsm.consolidate_territory("a"),
            Err(GameError::AlreadyConsolidated("a".to_string()))
        );
    }

    #[test]
    fn test_use_zone() {
        let mut fsm = started();
        assert_eq!(
            fsm.use_zone("a"),
            Err(GameError::ZoneUnavailable { territory: "a".to_string(), zone: None })
        );
        grant(&mut fsm, "p1", "b", Troops::default());
        fsm.use_zone("b").unwrap();
        assert_eq!(fsm.use_zone("b"), Err(GameError::ZoneAlreadyUsed("b".to_string())));
        // Free action.
        assert_eq!(fsm.state().get_player("p1").unwrap().actions_left, 1);
    }

    #[test]
    fn test_move_troops_single_action() {
        let mut fsm = started();
        grant(&mut fsm, "p1", "b", Troops::default());
        grant(&mut fsm, "p1", "d", Troops::default());
        fsm.advance_phase().unwrap();
        fsm.advance_phase().unwrap();

        let legs = vec![
            Movement {
                from_id: "a".to_string(),
                to_id: "b".to_string(),
                troops: Troops::of(Rank::Warrior, 1),
            },
            Movement {
                from_id: "a".to_string(),
                to_id: "d".to_string(),
                troops: Troops::of(Rank::Warrior, 1),
            },
        ];
        fsm.move_troops(&legs).unwrap();
        let state = fsm.state();
        assert_eq!(state.territories["a"].troops.get(Rank::Warrior), 1);
        assert_eq!(state.territories["b"].troops.get(Rank::Warrior), 1);
        assert_eq!(state.territories["d"].troops.get(Rank::Warrior), 1);
        assert_eq!(state.get_player("p1").unwrap().actions_left, 0);
    }

    #[test]
    fn test_move_troops_rejections() {
        let mut fsm = started();
        grant(&mut fsm, "p1", "b", Troops::default());
        grant(&mut fsm, "p1", "d", Troops::default());
        fsm.advance_phase().unwrap();
        fsm.advance_phase().unwrap();
        let leg = |from: &str, to: &str, n: u32| Movement {
            from_id: from.to_string(),
            to_id: to.to_string(),
            troops: Troops::of(Rank::Warrior, n),
        };

        assert_eq!(
            fsm.move_troops(&[]),
            Err(GameError::TooManyDestinations { requested: 0, max: 3 })
        );
        assert!(matches!(
            fsm.move_troops(&[leg("a", "b", 1), leg("b", "d", 1)]),
            Err(GameError::MixedOrigins { .. })
        ));
        // Two legs of 2 exceed the 3 warriors at "a".
        assert!(matches!(
            fsm.move_troops(&[leg("a", "b", 2), leg("a", "d", 2)]),
            Err(GameError::InsufficientTroops { requested: 4, available: 3, .. })
        ));
        assert_eq!(
            fsm.move_troops(&[leg("a", "b", 1), leg("a", "b", 1), leg("a", "d", 1), leg("a", "d", 0)]),
            Err(GameError::TooManyDestinations { requested: 4, max: 3 })
        );
    }

    #[test]
    fn test_end_turn_rotates_and_pays() {
        let mut fsm = started();
        fsm.end_turn().unwrap();
        let state = fsm.state();
        assert_eq!(state.current_player_id, "p2");
        assert_eq!(state.turn, 2);
        assert_eq!(state.phase, Phase::Deploy);
        assert_eq!(state.get_player("p1").unwrap().gold, 250);

        fsm.end_turn().unwrap();
        assert_eq!(fsm.state().current_player_id, "p1");
    }

    #[test]
    fn test_end_turn_fast_zone_bonus_once() {
        let players = vec![PlayerSetup::new("p1"), PlayerSetup::new("p2")];
        let territories = vec![
            TerritorySetup::new("a").spawn(),
            TerritorySetup::new("b").spawn(),
            TerritorySetup::new("f1").with_zone(ZoneType::Fast),
            TerritorySetup::new("f2").with_zone(ZoneType::Fast),
            TerritorySetup::new("x1"),
            TerritorySetup::new("x2"),
            TerritorySetup::new("x3"),
            TerritorySetup::new("x4"),
        ];
        let mut fsm = GameFsm::new("fast", 3, &players, &territories, GameConfig::default());
        fsm.start_game().unwrap();
        grant(&mut fsm, "p2", "f1", Troops::default());
        grant(&mut fsm, "p2", "f2", Troops::default());

        fsm.end_turn().unwrap();
        let p2 = fsm.state().get_player("p2").unwrap();
        assert_eq!(p2.actions, 2);
        assert_eq!(p2.actions_left, 2);
    }

    #[test]
    fn test_victory_check() {
        let mut fsm = started();
        // 4 territories: more than 2 wins.
        grant(&mut fsm, "p2", "b", Troops::default());
        grant(&mut fsm, "p2", "d", Troops::default());
        fsm.end_turn().unwrap();
        assert_eq!(fsm.state().phase, Phase::GameOver);
        assert_eq!(fsm.state().winner_id.as_deref(), Some("p2"));

        assert_eq!(fsm.end_turn(), Err(GameError::GameOver));
        assert_eq!(fsm.advance_phase(), Err(GameError::GameOver));
        assert_eq!(fsm.apply("p1", Command::EndTurn), Err(GameError::GameOver));
    }

    #[test]
    fn test_exactly_half_is_not_victory() {
        let mut fsm = started();
        grant(&mut fsm, "p1", "b", Troops::default());
        fsm.end_turn().unwrap();
        assert_eq!(fsm.state().phase, Phase::Deploy);
    }

    #[test]
    fn test_end_turn_in_lobby() {
        let mut fsm = create_test_game();
        assert_eq!(
            fsm.end_turn(),
            Err(GameError::WrongPhase { action: "end_turn", phase: Phase::Lobby })
        );
    }

    #[test]
    fn test_advance_phase_sequence() {
        let mut fsm = started();
        assert_eq!(fsm.advance_phase(), Ok(Phase::Attack));
        assert_eq!(fsm.advance_phase(), Ok(Phase::Fortify));
        assert_eq!(
            fsm.advance_phase(),
            Err(GameError::WrongPhase { action: "advance_phase", phase: Phase::Fortify })
        );
    }

    #[test]
    fn test_apply_checks_turn() {
        let mut fsm = started();
        assert_eq!(
            fsm.apply("p2", Command::EndTurn),
            Err(GameError::NotYourTurn { player: "p2".to_string() })
        );
        assert_eq!(
            fsm.apply("ghost", Command::EndTurn),
            Err(GameError::UnknownPlayer("ghost".to_string()))
        );
        let outcome = fsm.apply("p1", Command::AdvancePhase).unwrap();
        assert_eq!(outcome.state.phase, Phase::Attack);
        assert!(outcome.combat.is_none());

        let outcome = fsm
            .apply(
                "p1",
                Command::Attack {
                    from_id: "a".to_string(),
                    to_id: "c".to_string(),
                    attacker_commit: Troops::of(Rank::Warrior, 3),
                    defender_commit: Troops::of(Rank::Warrior, 2),
                },
            )
            .unwrap();
        assert_eq!(outcome.combat.unwrap().attacker_rolls.len(), 3);
    }

    #[test]
    fn test_get_state_is_independent() {
        let fsm = started();
        let mut copy = fsm.get_state();
        copy.players[0].gold = 9_999;
        copy.territories.clear();
        assert_eq!(fsm.state().players[0].gold, 200);
        assert_eq!(fsm.state().total_territories(), 4);
    }

    #[test]
    fn test_snapshot_restore_continues_identically() {
        let mut fsm = started();
        fsm.advance_phase().unwrap();
        let snapshot = fsm.snapshot();
        let mut resumed = GameFsm::restore(snapshot, GameConfig::default());

        let commit = Troops::of(Rank::Warrior, 2);
        let defend = Troops::of(Rank::Warrior, 2);
        let a = fsm.attack_territory("a", "c", &commit, &defend).unwrap();
        let b = resumed.attack_territory("a", "c", &commit, &defend).unwrap();
        assert_eq!(a, b);
        assert_eq!(fsm.get_state(), resumed.get_state());
        assert_eq!(fsm.rng(), resumed.rng());
    }

    #[test]
    fn test_derive_modifiers() {
        let config = GameConfig::default();
        let mut attacker = Player::new(&PlayerSetup::new("p1").with_hero(HeroType::Master), 0);
        attacker.paths.set(PathType::Luck, 3);
        let mut defender = Player::new(&PlayerSetup::new("p2"), 1);
        defender.paths.set(PathType::Luck, 2);
        let target = TerritoryState::new(&TerritorySetup::new("w").with_zone(ZoneType::Walled));

        let mods = derive_modifiers(&attacker, Some(&defender), &target, &config);
        assert_eq!(mods.attacker_rerolls, 4);
        assert!(mods.luck_boost_elites);
        assert!(!mods.attacker_efficiency);
        assert_eq!(mods.defender_defense_bonus, 3);
        assert!(!mods.defender_efficiency);
        assert_eq!(mods.max_troops_per_side, None);

        let target = TerritoryState::new(&TerritorySetup::new("d").with_zone(ZoneType::Defensive));
        attacker.clan_level = 3;
        let mods = derive_modifiers(&attacker, None, &target, &config);
        assert!(mods.attacker_efficiency);
        assert_eq!(mods.defender_defense_bonus, 0);
        assert_eq!(mods.max_troops_per_side, Some(10));

        let strategist = Player::new(&PlayerSetup::new("s").with_hero(HeroType::Strategist), 0);
        let plain = TerritoryState::new(&TerritorySetup::new("p"));
        assert!(derive_modifiers(&strategist, None, &plain, &config).attacker_efficiency);

        let mut warlord = Player::new(&PlayerSetup::new("w"), 0);
        assert!(!derive_modifiers(&warlord, None, &plain, &config).attacker_efficiency);
        warlord.paths.set(PathType::War, 1);
        assert!(derive_modifiers(&warlord, None, &plain, &config).attacker_efficiency);

        let battle = TerritoryState::new(&TerritorySetup::new("b").with_zone(ZoneType::Battle));
        let mods = derive_modifiers(&warlord, None, &battle, &config);
        assert!(mods.defender_efficiency);
        assert_eq!(mods.defender_defense_bonus, 0);

        let mut reinforced = TerritoryState::new(&TerritorySetup::new("r"));
        assert!(!derive_modifiers(&warlord, None, &reinforced, &config).defender_efficiency);
        reinforced.reinforced = true;
        assert!(derive_modifiers(&warlord, None, &reinforced, &config).defender_efficiency);
    }

    #[test]
    fn test_reinforced_territory_defends_with_efficiency() {
        let defence = |reinforce: bool| {
            let mut fsm = started();
            if reinforce {
                fsm.reinforce_territory("a").unwrap();
            }
            fsm.end_turn().unwrap();
            fsm.advance_phase().unwrap();
            fsm.attack_territory(
                "c",
                "a",
                &Troops::of(Rank::Warrior, 1),
                &Troops::of(Rank::Warrior, 3),
            )
            .unwrap()
        };

        let plain = defence(false);
        let reinforced = defence(true);
        let faces = GameConfig::default().rank_dice.faces(Rank::Warrior);
        assert_eq!(plain.attacker_rolls, reinforced.attacker_rolls);
        for (base, boosted) in plain.defender_rolls.iter().zip(&reinforced.defender_rolls) {
            assert_eq!(boosted.value, (base.value + 1).min(faces));
        }
    }

    #[test]
    fn test_apply_free_units_lowest_first() {
        let requested = Troops::from_counts(&[(Rank::Warrior, 2), (Rank::Explorer, 1)]);
        let (paid, used) = apply_free_units(&requested, 2);
        assert_eq!(used, 2);
        assert_eq!(paid, Troops::of(Rank::Warrior, 1));

        let (paid, used) = apply_free_units(&Troops::default(), 2);
        assert_eq!(used, 0);
        assert!(paid.is_empty());
    }
}
