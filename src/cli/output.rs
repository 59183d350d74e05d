//! Output formatting utilities for CLI.

// Averages over game counts; format! into push_str reads better than write!.
#![allow(clippy::cast_precision_loss, clippy::format_push_string)]

use conquest::game::{CombatResult, CombatRoll, HeroType};
use conquest::tournament::{GameResult, PlayerSummary};
use serde::Serialize;

/// JSON-serializable game result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct JsonGameResult<'a> {
    /// Random seed used.
    seed: u32,
    /// Winner player id (null if draw).
    winner: Option<&'a str>,
    /// Turn counter when play stopped.
    turns: u32,
    /// Whether the game reached GAME_OVER.
    finished: bool,
    /// Commands in the recording.
    commands: usize,
    /// Per-player results.
    players: &'a [PlayerSummary],
}

impl<'a> JsonGameResult<'a> {
    /// Create from a `GameResult`.
    pub(super) fn from_game_result(result: &'a GameResult) -> Self {
        Self {
            seed: result.seed,
            winner: result.winner.as_deref(),
            turns: result.turns,
            finished: result.finished,
            commands: result.recording.commands.len(),
            players: &result.players,
        }
    }
}

/// Format a game result as human-readable text.
pub(super) fn format_text(result: &GameResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Game Result (seed: {})\n", result.seed));
    match &result.winner {
        Some(winner) => output.push_str(&format!("  Winner: {winner}\n")),
        None => output.push_str("  Winner: Draw (turn limit)\n"),
    }
    output.push_str(&format!(
        "  Turns: {} ({} commands)\n\n",
        result.turns,
        result.recording.commands.len()
    ));

    for player in &result.players {
        let hero = player.hero.map_or_else(|| "none".to_string(), |h| h.to_string());
        output.push_str(&format!(
            "  {} [{hero}]: {} territories, {} troops, {} gold (+{}/turn)\n",
            player.id, player.territories, player.troops, player.gold, player.income
        ));
    }

    output
}

/// Format one battle as human-readable text.
pub(super) fn format_combat(result: &CombatResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Attacker rolls: {}\n", format_rolls(&result.attacker_rolls)));
    output.push_str(&format!("Defender rolls: {}\n", format_rolls(&result.defender_rolls)));
    output.push_str(&format!("Attacker losses: {}\n", result.attacker_losses));
    output.push_str(&format!("Defender losses: {}\n", result.defender_losses));
    output.push_str(&format!("Total damage: {}\n", result.total_damage));
    output.push_str(if result.conquest {
        "Result: CONQUEST\n"
    } else {
        "Result: held\n"
    });

    output
}

fn format_rolls(rolls: &[CombatRoll]) -> String {
    if rolls.is_empty() {
        return "-".to_string();
    }
    rolls
        .iter()
        .map(|roll| format!("{}:{}", roll.rank, roll.value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tournament statistics for aggregated results.
#[derive(Debug, Default)]
pub(super) struct TournamentStats {
    /// Games that ran to a result.
    pub(super) games_played: u64,
    /// Games that failed with an error.
    pub(super) errors: u64,
    /// Win count per seat.
    pub(super) wins: Vec<u64>,
    /// Games stopped by the turn limit.
    pub(super) draws: u64,
    /// Win count per hero.
    hero_wins: [u64; 4],
    /// Games played per hero.
    hero_games: [u64; 4],
    /// Final territory count per seat.
    total_territories: Vec<f64>,
    /// Territory sum of squares for std dev calculation.
    territory_sq_sums: Vec<f64>,
    /// Total turns across all games.
    total_turns: u64,
}

fn hero_index(hero: HeroType) -> usize {
    HeroType::ALL
        .iter()
        .position(|&h| h == hero)
        .unwrap_or_default()
}

impl TournamentStats {
    /// Create new stats for n seats.
    pub(super) fn new(num_players: usize) -> Self {
        Self {
            wins: vec![0; num_players],
            total_territories: vec![0.0; num_players],
            territory_sq_sums: vec![0.0; num_players],
            ..Self::default()
        }
    }

    /// Add a game result to the stats.
    pub(super) fn add_result(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.total_turns += u64::from(result.turns);

        if result.winner.is_none() {
            self.draws += 1;
        }

        for (seat, player) in result.players.iter().enumerate() {
            let won = result.winner.as_deref() == Some(player.id.as_str());
            if won && let Some(wins) = self.wins.get_mut(seat) {
                *wins += 1;
            }
            if let Some(hero) = player.hero {
                let idx = hero_index(hero);
                self.hero_games[idx] += 1;
                if won {
                    self.hero_wins[idx] += 1;
                }
            }
            if seat < self.total_territories.len() {
                let count = player.territories as f64;
                self.total_territories[seat] += count;
                self.territory_sq_sums[seat] += count * count;
            }
        }
    }

    /// Record a failed game.
    pub(super) fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Merge another thread's stats into this one.
    pub(super) fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.errors += other.errors;
        self.draws += other.draws;
        self.total_turns += other.total_turns;
        for (a, b) in self.wins.iter_mut().zip(&other.wins) {
            *a += b;
        }
        for (a, b) in self.hero_wins.iter_mut().zip(&other.hero_wins) {
            *a += b;
        }
        for (a, b) in self.hero_games.iter_mut().zip(&other.hero_games) {
            *a += b;
        }
        for (a, b) in self.total_territories.iter_mut().zip(&other.total_territories) {
            *a += b;
        }
        for (a, b) in self.territory_sq_sums.iter_mut().zip(&other.territory_sq_sums) {
            *a += b;
        }
    }

    /// Get win rate for a seat (0.0-1.0).
    pub(super) fn win_rate(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins.get(seat).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Get win rate for a hero over the games it was dealt (0.0-1.0).
    pub(super) fn hero_win_rate(&self, hero: HeroType) -> f64 {
        let idx = hero_index(hero);
        if self.hero_games[idx] == 0 {
            return 0.0;
        }
        self.hero_wins[idx] as f64 / self.hero_games[idx] as f64
    }

    /// Get average final territory count for a seat.
    pub(super) fn avg_territories(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_territories.get(seat).copied().unwrap_or(0.0) / self.games_played as f64
    }

    /// Get territory count standard deviation for a seat.
    pub(super) fn territory_std_dev(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        let n = self.games_played as f64;
        let mean = self.avg_territories(seat);
        let sq_sum = self.territory_sq_sums.get(seat).copied().unwrap_or(0.0);
        let variance = (sq_sum / n) - (mean * mean);
        if variance < 0.0 {
            0.0
        } else {
            variance.sqrt()
        }
    }

    /// Get average game length.
    pub(super) fn avg_turns(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_turns as f64 / self.games_played as f64
    }

    fn draw_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.draws as f64 / self.games_played as f64
    }
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct JsonTournamentResult {
    /// Games that ran to a result.
    games_played: u64,
    /// Games that failed.
    errors: u64,
    /// Per-seat statistics.
    players: Vec<JsonTournamentPlayer>,
    /// Per-hero win rates.
    heroes: Vec<JsonHeroStats>,
    /// Number of draws.
    draws: u64,
    /// Average game length in turns.
    avg_turns: f64,
}

/// JSON-serializable per-seat tournament stats.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct JsonTournamentPlayer {
    /// Seat number (1-based).
    seat: usize,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average final territory count.
    avg_territories: f64,
    /// Territory count standard deviation.
    territory_std_dev: f64,
}

/// JSON-serializable per-hero stats.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct JsonHeroStats {
    hero: HeroType,
    win_rate: f64,
}

impl JsonTournamentResult {
    /// Create from stats.
    pub(super) fn from_stats(stats: &TournamentStats) -> Self {
        let players = (0..stats.wins.len())
            .map(|i| JsonTournamentPlayer {
                seat: i + 1,
                wins: stats.wins[i],
                win_rate: stats.win_rate(i),
                avg_territories: stats.avg_territories(i),
                territory_std_dev: stats.territory_std_dev(i),
            })
            .collect();
        let heroes = HeroType::ALL
            .into_iter()
            .map(|hero| JsonHeroStats {
                hero,
                win_rate: stats.hero_win_rate(hero),
            })
            .collect();

        Self {
            games_played: stats.games_played,
            errors: stats.errors,
            players,
            heroes,
            draws: stats.draws,
            avg_turns: stats.avg_turns(),
        }
    }
}

/// Format tournament stats as human-readable text.
pub(super) fn format_tournament_text(stats: &TournamentStats) -> String {
    let mut output = String::new();

    output.push_str(&format!("Tournament Results ({} games)\n", stats.games_played));
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for (i, wins) in stats.wins.iter().enumerate() {
        output.push_str(&format!(
            "  Seat {}: {:.1}% ({} wins)\n",
            i + 1,
            stats.win_rate(i) * 100.0,
            wins
        ));
    }
    output.push_str(&format!(
        "  Draws: {} ({:.1}%)\n\n",
        stats.draws,
        stats.draw_rate() * 100.0
    ));

    output.push_str("Hero Win Rates:\n");
    for hero in HeroType::ALL {
        output.push_str(&format!(
            "  {hero}: {:.1}%\n",
            stats.hero_win_rate(hero) * 100.0
        ));
    }

    output.push_str("\nFinal Territories:\n");
    for i in 0..stats.wins.len() {
        output.push_str(&format!(
            "  Seat {}: {:.1} (+/- {:.1})\n",
            i + 1,
            stats.avg_territories(i),
            stats.territory_std_dev(i)
        ));
    }

    output.push_str(&format!("\nAverage Game Length: {:.0} turns\n", stats.avg_turns()));
    if stats.errors > 0 {
        output.push_str(&format!("Failed Games: {}\n", stats.errors));
    }

    output
}

/// Format tournament stats as CSV.
pub(super) fn format_tournament_csv(stats: &TournamentStats) -> String {
    let mut output = String::new();

    // Header
    output.push_str("seat,wins,win_rate,avg_territories,territory_std_dev\n");

    // Data rows
    for i in 0..stats.wins.len() {
        output.push_str(&format!(
            "{},{},{:.4},{:.2},{:.2}\n",
            i + 1,
            stats.wins[i],
            stats.win_rate(i),
            stats.avg_territories(i),
            stats.territory_std_dev(i)
        ));
    }

    output
}
