use alloc::vec::Vec;
use hashbrown::HashSet;
use ndarray::Array2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RoundState {
    InProgress,
    Won,
    Lost,
}

impl RoundState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for RoundState {
    fn default() -> Self {
        Self::InProgress
    }
}

/// Player-facing counters for one round.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    pub cells_opened: CellCount,
    pub gems: u32,
    pub potions: u32,
    pub hints: u32,
    pub elapsed_secs: u32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    /// A fire cell was hit but an ability neutralized it.
    Frozen,
    Exploded,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Used to merge outcomes across a cascade.
impl core::ops::BitOr for RevealOutcome {
    type Output = RevealOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use RevealOutcome::*;
        match (self, rhs) {
            (Exploded, _) | (_, Exploded) => Exploded,
            (Won, _) | (_, Won) => Won,
            (Frozen, _) | (_, Frozen) => Frozen,
            (Revealed, _) | (_, Revealed) => Revealed,
            (NoChange, NoChange) => NoChange,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ClairvoyanceOutcome {
    /// One hint was consumed and the next fire interaction is covered.
    Activated,
    /// An active clairvoyance was cancelled and its hint refunded.
    Cancelled,
}

/// Cascade work item: `Enter` resolves one cell, `SpawnGems` runs the
/// per-cell gem cycle after that cell's sub-cascade has fully resolved.
#[derive(Copy, Clone, Debug)]
enum Frame {
    Enter(Coord2),
    SpawnGems(Coord2),
}

/// Authoritative state of one round, from first reveal to win or loss.
///
/// All mutations are synchronous; the presentation layer drives the engine
/// with coordinates and commands and drains [`Event`]s back out.
#[derive(Clone, Debug)]
pub struct RoundEngine {
    field: FireField,
    board: Array2<Cell>,
    counters: Counters,
    clairvoyant: bool,
    state: RoundState,
    rng: SmallRng,
    events: Vec<Event>,
}

impl RoundEngine {
    /// Starts a round over an already laid out fire field.
    pub fn new(field: FireField, seed: u64) -> Self {
        let size = usize::from(field.size());
        Self {
            field,
            board: Array2::default((size, size)),
            counters: Counters::default(),
            clairvoyant: false,
            state: RoundState::default(),
            rng: SmallRng::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    /// Generates a random fire field for `config` and starts a round on it.
    pub fn start(config: GameConfig, seed: u64) -> Result<Self> {
        let field = RandomFireFieldGenerator::new(seed).generate(config)?;
        Ok(Self::new(field, seed))
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn is_clairvoyant(&self) -> bool {
        self.clairvoyant
    }

    pub fn size(&self) -> Coord {
        self.field.size()
    }

    pub fn total_fires(&self) -> CellCount {
        self.field.fire_count()
    }

    pub fn field(&self) -> &FireField {
        &self.field
    }

    pub fn cell_at(&self, coords: Coord2) -> Cell {
        self.board[coords.to_nd_index()]
    }

    /// Drains the state-change events accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        core::mem::take(&mut self.events)
    }

    /// Advances the elapsed-time counter by one second. The caller owns the
    /// clock; the engine only counts ticks while the round is in progress.
    pub fn tick(&mut self) {
        if !self.state.is_finished() {
            self.counters.elapsed_secs += 1;
        }
    }

    /// Reveals a cell and runs the resulting cascade to completion.
    ///
    /// Revealed, flagged, and gem-occupied cells are rejected without any
    /// state change.
    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.field.validate_coords(coords)?;
        self.check_in_progress()?;

        let cell = self.board[coords.to_nd_index()];
        if cell.gem || cell.state != CellState::Hidden {
            return Ok(RevealOutcome::NoChange);
        }
        Ok(self.reveal_cascade(coords))
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        use CellState::*;
        use MarkOutcome::*;

        let coords = self.field.validate_coords(coords)?;
        self.check_in_progress()?;

        Ok(match self.board[coords.to_nd_index()].state {
            Hidden => {
                self.board[coords.to_nd_index()].state = Flagged;
                self.events.push(Event::FlagChanged {
                    coords,
                    flagged: true,
                });
                Changed
            }
            Flagged => {
                self.board[coords.to_nd_index()].state = Hidden;
                self.events.push(Event::FlagChanged {
                    coords,
                    flagged: false,
                });
                Changed
            }
            _ => NoChange,
        })
    }

    /// Collects a visible gem. In the UI the gem overlay sits on top of the
    /// cell, so a gem click always takes priority over the reveal beneath.
    pub fn collect_gem(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.field.validate_coords(coords)?;
        self.check_in_progress()?;

        if !self.board[coords.to_nd_index()].gem {
            return Ok(MarkOutcome::NoChange);
        }
        self.board[coords.to_nd_index()].gem = false;
        self.counters.gems += 1;
        self.events.push(Event::GemCollected {
            coords,
            gems: self.counters.gems,
        });
        Ok(MarkOutcome::Changed)
    }

    pub fn purchase(&mut self, item: ShopItem) -> Result<()> {
        self.check_in_progress()?;

        let cost = item.cost();
        if self.counters.gems < cost {
            return Err(GameError::NotEnoughGems);
        }
        self.counters.gems -= cost;
        match item {
            ShopItem::ClairvoyanceSpell => self.counters.hints += 1,
            ShopItem::LifePotion => self.counters.potions += 1,
        }
        self.events.push(Event::PurchaseCompleted {
            item,
            gems_left: self.counters.gems,
        });
        Ok(())
    }

    /// Activates clairvoyance by spending one hint, or cancels an active
    /// one and refunds its hint. Exactly one of the two happens per call.
    pub fn toggle_clairvoyance(&mut self) -> Result<ClairvoyanceOutcome> {
        self.check_in_progress()?;

        if self.clairvoyant {
            self.set_clairvoyant(false);
            self.counters.hints += 1;
            Ok(ClairvoyanceOutcome::Cancelled)
        } else if self.counters.hints == 0 {
            Err(GameError::NoHintsLeft)
        } else {
            self.counters.hints -= 1;
            self.set_clairvoyant(true);
            Ok(ClairvoyanceOutcome::Activated)
        }
    }

    /// Depth-first cascade with an explicit stack, matching the visitation
    /// order of a recursive reveal: a neighbor's whole sub-cascade resolves
    /// before the next sibling, and a zero cell runs its gem cycle after
    /// its children.
    fn reveal_cascade(&mut self, origin: Coord2) -> RevealOutcome {
        let mut outcome = RevealOutcome::NoChange;
        let mut stack = Vec::from([Frame::Enter(origin)]);
        let mut queued = HashSet::from([origin]);

        while let Some(frame) = stack.pop() {
            if self.state.is_finished() {
                break;
            }
            match frame {
                Frame::Enter(coords) => {
                    if self.board[coords.to_nd_index()].state != CellState::Hidden {
                        continue;
                    }
                    outcome = outcome | self.reveal_cell(coords, &mut stack, &mut queued);
                }
                Frame::SpawnGems(coords) => {
                    self.spawn_gems(coords);
                    self.check_win();
                }
            }
        }

        if matches!(self.state, RoundState::Won) {
            outcome = outcome | RevealOutcome::Won;
        }
        outcome
    }

    fn reveal_cell(
        &mut self,
        coords: Coord2,
        stack: &mut Vec<Frame>,
        queued: &mut HashSet<Coord2>,
    ) -> RevealOutcome {
        self.counters.cells_opened += 1;

        if self.field.contains_fire(coords) {
            return self.resolve_fire(coords);
        }

        let adjacent_fires = self.field.adjacent_fire_count(coords);
        // a gem left by an earlier cascade step is forfeited, never kept on
        // an open cell
        self.board[coords.to_nd_index()].gem = false;
        self.board[coords.to_nd_index()].state = CellState::Open(adjacent_fires);
        self.events.push(Event::CellRevealed {
            coords,
            adjacent_fires,
        });
        log::trace!("Opened cell at {:?}, adjacent fires: {}", coords, adjacent_fires);

        if adjacent_fires > 0 {
            if self.clairvoyant {
                // the count just said there is at least one
                if let Some(fire_coords) = self.field.first_adjacent_fire(coords) {
                    self.freeze(fire_coords);
                }
                self.set_clairvoyant(false);
            }
            self.spawn_gems(coords);
            self.check_win();
        } else {
            stack.push(Frame::SpawnGems(coords));
            let neighbors: SmallVec<[Coord2; 8]> = self
                .field
                .iter_neighbors(coords)
                .filter(|&pos| self.field.is_playable(pos))
                .filter(|&pos| self.board[pos.to_nd_index()].state == CellState::Hidden)
                .filter(|&pos| !queued.contains(&pos))
                .collect();
            // reversed so the row-major first neighbor pops first
            for &pos in neighbors.iter().rev() {
                queued.insert(pos);
                stack.push(Frame::Enter(pos));
            }
        }

        RevealOutcome::Revealed
    }

    /// Ordered ability chain for a revealed fire cell: active clairvoyance
    /// first, then a stored potion, otherwise the fire is fatal.
    fn resolve_fire(&mut self, coords: Coord2) -> RevealOutcome {
        if self.clairvoyant {
            self.freeze(coords);
            self.set_clairvoyant(false);
            self.check_win();
            return RevealOutcome::Frozen;
        }

        if self.counters.potions > 0 {
            self.counters.potions -= 1;
            self.freeze(coords);
            self.events.push(Event::PotionConsumed {
                potions_left: self.counters.potions,
            });
            self.check_win();
            return RevealOutcome::Frozen;
        }

        self.board[coords.to_nd_index()].state = CellState::Blazing;
        self.events.push(Event::FireTriggered { coords });
        self.end_round(false);
        RevealOutcome::Exploded
    }

    fn freeze(&mut self, coords: Coord2) {
        let cell = &mut self.board[coords.to_nd_index()];
        cell.state = CellState::Frozen;
        cell.gem = false;
        self.events.push(Event::CellFrozen { coords });
    }

    fn set_clairvoyant(&mut self, active: bool) {
        if self.clairvoyant != active {
            self.clairvoyant = active;
            self.events.push(Event::ClairvoyanceChanged { active });
        }
    }

    /// Clears every visible gem, then spawns 0-3 new ones on unrevealed
    /// playable neighbors of `center`. Runs once per revealed cell, so a
    /// later cascade step wipes the gems of an earlier one.
    fn spawn_gems(&mut self, center: Coord2) {
        self.clear_gems();

        let num_gems: usize = self.rng.random_range(0..4);
        if num_gems == 0 {
            return;
        }

        let mut candidates: SmallVec<[Coord2; 8]> = self
            .field
            .iter_neighbors(center)
            .filter(|&pos| self.field.is_playable(pos))
            .filter(|&pos| self.board[pos.to_nd_index()].state.is_unrevealed())
            .collect();

        let num_gems = num_gems.min(candidates.len());
        let (chosen, _) = candidates.partial_shuffle(&mut self.rng, num_gems);
        for &coords in chosen.iter() {
            self.board[coords.to_nd_index()].gem = true;
            self.events.push(Event::GemSpawned { coords });
        }
    }

    fn clear_gems(&mut self) {
        let mut cleared = false;
        for cell in self.board.iter_mut() {
            if cell.gem {
                cell.gem = false;
                cleared = true;
            }
        }
        if cleared {
            self.events.push(Event::GemsCleared);
        }
    }

    /// Won once every playable non-fire cell is open.
    fn check_win(&mut self) {
        if self.state.is_finished() {
            return;
        }
        let all_safe_open = self
            .field
            .iter_playable()
            .filter(|&coords| !self.field.contains_fire(coords))
            .all(|coords| matches!(self.board[coords.to_nd_index()].state, CellState::Open(_)));
        if all_safe_open {
            self.end_round(true);
        }
    }

    fn end_round(&mut self, won: bool) {
        if self.state.is_finished() {
            return;
        }
        self.state = if won { RoundState::Won } else { RoundState::Lost };
        self.clear_gems();
        if !won {
            // show every fire, frozen ones included, for inspection
            let fire_cells: Vec<Coord2> = self
                .field
                .iter_playable()
                .filter(|&coords| self.field.contains_fire(coords))
                .collect();
            for coords in fire_cells {
                self.board[coords.to_nd_index()].state = CellState::Blazing;
            }
        }
        log::debug!("Round ended, won: {}", won);
        self.events.push(Event::RoundEnded { won });
    }

    fn check_in_progress(&self) -> Result<()> {
        if self.state.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}
