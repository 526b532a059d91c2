//! A minimal, legal implementation of the Corridors board game.
//!
//! This is a reference/test double for the native search kernel named in
//! spec §6.1, not a production search engine: `run_simulations` performs
//! plain random rollouts rather than tree-guided MCTS. It exists so the
//! Search Adapter, Session Registry, and Scheduler can be exercised in
//! unit and integration tests without linking the real kernel binary.
use crate::Action;
use crate::Kernel;
use crate::KernelError;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;

/// Board is a `SIZE` x `SIZE` grid of cells, `SIZE - 1` x `SIZE - 1` grid
/// of wall intersections.
pub const BOARD_SIZE: u8 = 9;
const WALLS_PER_PLAYER: u8 = 10;
const ROLLOUT_DEPTH_CAP: u32 = 80;

/// Configuration accepted by [`ReferenceKernel::new`], mirroring the
/// search-variant flags of the Configuration entity (spec §3). The
/// reference kernel only meaningfully uses `seed`; the rest are accepted
/// so adapter/session code can pass one `Configuration` uniformly to any
/// kernel implementation without matching on which one it got.
#[derive(Debug, Clone, Copy)]
pub struct KernelConfig {
    pub exploration: f32,
    pub seed: u64,
    pub use_rollout: bool,
    pub decide_using_visits: bool,
    /// Evaluate children rather than just the root when deciding. Accepted
    /// for uniformity with `Configuration`; the reference kernel's rollout
    /// evaluation does not distinguish this flag.
    pub eval_children: bool,
    /// Use a PUCT-style selection policy rather than plain UCB1. Accepted
    /// for uniformity; the reference kernel's rollout selection does not
    /// distinguish this flag.
    pub use_puct: bool,
    /// Weigh candidates by a learned prior policy. Accepted for
    /// uniformity; the reference kernel has no policy network to consult.
    pub use_probs: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            exploration: (0.025f32).sqrt(),
            seed: 42,
            use_rollout: true,
            decide_using_visits: true,
            eval_children: false,
            use_puct: false,
            use_probs: false,
        }
    }
}

#[derive(Default, Clone, Copy)]
struct RootStat {
    visits: u32,
    total_value: f32,
}

pub struct ReferenceKernel {
    config: KernelConfig,
    rng: SmallRng,
    positions: [(u8, u8); 2],
    walls_remaining: [u8; 2],
    occupied_slots: HashSet<(u8, u8)>,
    horizontal: HashSet<(u8, u8)>,
    vertical: HashSet<(u8, u8)>,
    to_move: usize,
    root_stats: HashMap<Action, RootStat>,
    total_visits: usize,
}

impl ReferenceKernel {
    pub fn new(config: KernelConfig) -> Self {
        let mut kernel = Self {
            rng: SmallRng::seed_from_u64(config.seed),
            config,
            positions: [(0, 0), (0, 0)],
            walls_remaining: [WALLS_PER_PLAYER; 2],
            occupied_slots: HashSet::new(),
            horizontal: HashSet::new(),
            vertical: HashSet::new(),
            to_move: 0,
            root_stats: HashMap::new(),
            total_visits: 0,
        };
        kernel.reset();
        kernel
    }

    fn goal_row(player: usize) -> u8 {
        if player == 0 { BOARD_SIZE - 1 } else { 0 }
    }

    fn flip(action: Action) -> Action {
        match action {
            Action::Move(x, y) => Action::Move(x, BOARD_SIZE - 1 - y),
            Action::WallHorizontal(x, y) => Action::WallHorizontal(x, BOARD_SIZE - 2 - y),
            Action::WallVertical(x, y) => Action::WallVertical(x, BOARD_SIZE - 2 - y),
        }
    }

    fn to_canonical(action: Action, perspective: bool) -> Action {
        if perspective { Self::flip(action) } else { action }
    }

    fn to_local(action: Action, perspective: bool) -> Action {
        if perspective { Self::flip(action) } else { action }
    }

    fn in_bounds(x: i16, y: i16) -> bool {
        x >= 0 && y >= 0 && x < BOARD_SIZE as i16 && y < BOARD_SIZE as i16
    }

    /// True if a wall blocks the edge between two orthogonally adjacent cells.
    fn edge_blocked(&self, from: (u8, u8), to: (u8, u8)) -> bool {
        let (x1, y1) = (from.0 as i16, from.1 as i16);
        let (x2, y2) = (to.0 as i16, to.1 as i16);
        if y1 == y2 {
            // horizontal neighbor: crossing a vertical wall segment
            let x = x1.min(x2);
            let y = y1;
            (y - 1 >= 0 && self.vertical.contains(&(x as u8, (y - 1) as u8)))
                || (y < BOARD_SIZE as i16 - 1 && self.vertical.contains(&(x as u8, y as u8)))
        } else {
            // vertical neighbor: crossing a horizontal wall segment
            let x = x1;
            let y = y1.min(y2);
            (x - 1 >= 0 && self.horizontal.contains(&((x - 1) as u8, y as u8)))
                || (x < BOARD_SIZE as i16 - 1 && self.horizontal.contains(&(x as u8, y as u8)))
        }
    }

    fn orthogonal_neighbors(&self, (x, y): (u8, u8)) -> Vec<(u8, u8)> {
        let (xi, yi) = (x as i16, y as i16);
        [(xi + 1, yi), (xi - 1, yi), (xi, yi + 1), (xi, yi - 1)]
            .into_iter()
            .filter(|&(nx, ny)| Self::in_bounds(nx, ny))
            .map(|(nx, ny)| (nx as u8, ny as u8))
            .filter(|&n| !self.edge_blocked((x, y), n))
            .collect()
    }

    /// BFS from `from` to any cell with row `goal_row`, ignoring tokens.
    fn path_exists(&self, from: (u8, u8), goal_row: u8) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(from);
        seen.insert(from);
        while let Some(cell) = queue.pop_front() {
            if cell.1 == goal_row {
                return true;
            }
            for next in self.orthogonal_neighbors(cell) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    fn other(player: usize) -> usize {
        1 - player
    }

    fn legal_moves_for(&self, player: usize) -> Vec<Action> {
        let me = self.positions[player];
        let opponent = self.positions[Self::other(player)];
        let mut moves = Vec::new();
        for step in self.orthogonal_neighbors(me) {
            if step != opponent {
                moves.push(Action::Move(step.0, step.1));
                continue;
            }
            // opponent occupies the adjacent cell: try a straight jump.
            let (dx, dy) = (step.0 as i16 - me.0 as i16, step.1 as i16 - me.1 as i16);
            let beyond = (step.0 as i16 + dx, step.1 as i16 + dy);
            if Self::in_bounds(beyond.0, beyond.1) {
                let beyond_u8 = (beyond.0 as u8, beyond.1 as u8);
                if !self.edge_blocked(step, beyond_u8) {
                    moves.push(Action::Move(beyond_u8.0, beyond_u8.1));
                    continue;
                }
            }
            // straight jump blocked or off-board: diagonal jumps either side.
            let perpendicular = if dx == 0 { [(1, 0), (-1, 0)] } else { [(0, 1), (0, -1)] };
            for (px, py) in perpendicular {
                let side = (step.0 as i16 + px, step.1 as i16 + py);
                if Self::in_bounds(side.0, side.1) {
                    let side_u8 = (side.0 as u8, side.1 as u8);
                    if !self.edge_blocked(step, side_u8) {
                        moves.push(Action::Move(side_u8.0, side_u8.1));
                    }
                }
            }
        }
        moves
    }

    fn legal_walls(&self, player: usize) -> Vec<Action> {
        if self.walls_remaining[player] == 0 {
            return Vec::new();
        }
        let mut walls = Vec::new();
        for x in 0..BOARD_SIZE - 1 {
            for y in 0..BOARD_SIZE - 1 {
                if self.occupied_slots.contains(&(x, y)) {
                    continue;
                }
                if self.placement_keeps_paths_open(x, y, true) {
                    walls.push(Action::WallHorizontal(x, y));
                }
                if self.placement_keeps_paths_open(x, y, false) {
                    walls.push(Action::WallVertical(x, y));
                }
            }
        }
        walls
    }

    fn placement_keeps_paths_open(&self, x: u8, y: u8, horizontal: bool) -> bool {
        let mut probe = ReferenceKernel {
            rng: SmallRng::seed_from_u64(0),
            config: self.config,
            positions: self.positions,
            walls_remaining: self.walls_remaining,
            occupied_slots: self.occupied_slots.clone(),
            horizontal: self.horizontal.clone(),
            vertical: self.vertical.clone(),
            to_move: self.to_move,
            root_stats: HashMap::new(),
            total_visits: 0,
        };
        if horizontal {
            probe.horizontal.insert((x, y));
        } else {
            probe.vertical.insert((x, y));
        }
        probe.path_exists(probe.positions[0], Self::goal_row(0))
            && probe.path_exists(probe.positions[1], Self::goal_row(1))
    }

    fn legal_actions_for(&self, player: usize) -> Vec<Action> {
        let mut actions = self.legal_moves_for(player);
        actions.extend(self.legal_walls(player));
        actions
    }

    fn apply_canonical(&mut self, action: Action) -> Result<(), KernelError> {
        let player = self.to_move;
        let legal = self.legal_actions_for(player);
        if !legal.contains(&action) {
            return Err(KernelError::InvalidAction(format!(
                "{} is not legal for player {} in the current position",
                action, player
            )));
        }
        match action {
            Action::Move(x, y) => self.positions[player] = (x, y),
            Action::WallHorizontal(x, y) => {
                self.horizontal.insert((x, y));
                self.occupied_slots.insert((x, y));
                self.walls_remaining[player] -= 1;
            }
            Action::WallVertical(x, y) => {
                self.vertical.insert((x, y));
                self.occupied_slots.insert((x, y));
                self.walls_remaining[player] -= 1;
            }
        }
        self.to_move = Self::other(player);
        self.root_stats.clear();
        self.total_visits = 0;
        Ok(())
    }

    fn rollout_from(&self, start_mover: usize) -> i8 {
        let mut positions = self.positions;
        let mut walls_remaining = self.walls_remaining;
        let mut occupied = self.occupied_slots.clone();
        let mut horizontal = self.horizontal.clone();
        let mut vertical = self.vertical.clone();
        let mut mover = start_mover;
        let mut rng = SmallRng::seed_from_u64(self.rng.clone().random::<u64>());
        for _ in 0..ROLLOUT_DEPTH_CAP {
            let scratch = ReferenceKernel {
                rng: SmallRng::seed_from_u64(0),
                config: self.config,
                positions,
                walls_remaining,
                occupied_slots: occupied.clone(),
                horizontal: horizontal.clone(),
                vertical: vertical.clone(),
                to_move: mover,
                root_stats: HashMap::new(),
                total_visits: 0,
            };
            if positions[0].1 == Self::goal_row(0) {
                return if start_mover == 0 { 1 } else { -1 };
            }
            if positions[1].1 == Self::goal_row(1) {
                return if start_mover == 1 { 1 } else { -1 };
            }
            let mut legal = scratch.legal_moves_for(mover);
            // Bias rollouts toward walls occasionally, mostly play moves
            // so playouts actually terminate within the depth cap.
            if walls_remaining[mover] > 0 && rng.random_bool(0.1) {
                legal.extend(scratch.legal_walls(mover));
            }
            if legal.is_empty() {
                break;
            }
            let action = legal[rng.random_range(0..legal.len())];
            match action {
                Action::Move(x, y) => positions[mover] = (x, y),
                Action::WallHorizontal(x, y) => {
                    horizontal.insert((x, y));
                    occupied.insert((x, y));
                    walls_remaining[mover] -= 1;
                }
                Action::WallVertical(x, y) => {
                    vertical.insert((x, y));
                    occupied.insert((x, y));
                    walls_remaining[mover] -= 1;
                }
            }
            mover = Self::other(mover);
        }
        0
    }
}

impl Kernel for ReferenceKernel {
    fn run_simulations(&mut self, n: usize) -> usize {
        if self.is_terminal() {
            return 0;
        }
        let mover = self.to_move;
        let root_actions = self.legal_actions_for(mover);
        if root_actions.is_empty() {
            return 0;
        }
        for _ in 0..n {
            let action = root_actions[self.rng.random_range(0..root_actions.len())];
            let outcome = self.rollout_from(mover) as f32;
            let stat = self.root_stats.entry(action).or_default();
            stat.visits += 1;
            stat.total_value += outcome;
            self.total_visits += 1;
        }
        n
    }

    fn apply_move(&mut self, action: crate::Action, perspective: bool) -> Result<(), KernelError> {
        self.apply_canonical(Self::to_canonical(action, perspective))
    }

    fn best_action(&self, epsilon: f32) -> Action {
        let mut rng = self.rng.clone();
        let legal = self.legal_actions_for(self.to_move);
        if legal.is_empty() {
            // Terminal position; callers should have checked `is_terminal`
            // first. Return a sentinel rather than panic.
            return Action::Move(0, 0);
        }
        if epsilon > 0.0 && rng.random_bool(epsilon as f64) {
            return legal[rng.random_range(0..legal.len())];
        }
        self.root_stats
            .iter()
            .max_by(|(_, a), (_, b)| {
                let ka = if self.config.decide_using_visits {
                    a.visits as f32
                } else {
                    a.total_value
                };
                let kb = if self.config.decide_using_visits {
                    b.visits as f32
                } else {
                    b.total_value
                };
                ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(action, _)| *action)
            .unwrap_or_else(|| legal[rng.random_range(0..legal.len())])
    }

    fn sorted_actions(&self, perspective: bool) -> Vec<(u32, f32, Action)> {
        let mut rows: Vec<(u32, f32, Action)> = self
            .root_stats
            .iter()
            .map(|(action, stat)| {
                let equity = if stat.visits > 0 {
                    stat.total_value / stat.visits as f32
                } else {
                    0.0
                };
                (stat.visits, equity, Self::to_local(*action, perspective))
            })
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows
    }

    fn evaluation(&self) -> Option<f32> {
        if self.total_visits == 0 {
            return None;
        }
        let total: f32 = self.root_stats.values().map(|s| s.total_value).sum();
        Some(total / self.total_visits as f32)
    }

    fn visit_count(&self) -> usize {
        self.total_visits
    }

    fn render(&self, perspective: bool) -> String {
        let mut rows = Vec::new();
        for y in (0..BOARD_SIZE).rev() {
            let mut line = String::new();
            for x in 0..BOARD_SIZE {
                let cell = Self::to_local(Action::Move(x, y), perspective);
                let Action::Move(x, y) = cell else { unreachable!() };
                let here = (x, y);
                if self.positions[0] == here {
                    line.push('1');
                } else if self.positions[1] == here {
                    line.push('2');
                } else {
                    line.push('.');
                }
            }
            rows.push(line);
        }
        rows.join("\n")
    }

    fn reset(&mut self) {
        self.positions = [(BOARD_SIZE / 2, 0), (BOARD_SIZE / 2, BOARD_SIZE - 1)];
        self.walls_remaining = [WALLS_PER_PLAYER; 2];
        self.occupied_slots.clear();
        self.horizontal.clear();
        self.vertical.clear();
        self.to_move = 0;
        self.root_stats.clear();
        self.total_visits = 0;
    }

    fn is_terminal(&self) -> bool {
        self.positions[0].1 == Self::goal_row(0) || self.positions[1].1 == Self::goal_row(1)
    }

    fn legal_actions(&self) -> Vec<Action> {
        self.legal_actions_for(self.to_move)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_legal_moves() {
        let kernel = ReferenceKernel::new(KernelConfig::default());
        assert!(!kernel.legal_actions().is_empty());
        assert!(!kernel.is_terminal());
    }

    #[test]
    fn rejects_out_of_bounds_move() {
        let mut kernel = ReferenceKernel::new(KernelConfig::default());
        let result = kernel.apply_move(Action::Move(99, 99), false);
        assert!(result.is_err());
    }

    #[test]
    fn applies_a_legal_move_and_swaps_mover() {
        let mut kernel = ReferenceKernel::new(KernelConfig::default());
        let legal = kernel.legal_actions();
        let action = legal[0];
        assert!(kernel.apply_move(action, false).is_ok());
        assert_eq!(kernel.to_move, 1);
    }

    #[test]
    fn wall_placement_cannot_seal_off_a_player() {
        let kernel = ReferenceKernel::new(KernelConfig::default());
        // Every legal wall offered at the start must still leave both
        // players a path to their goal row.
        for action in kernel.legal_walls(0) {
            let mut probe = ReferenceKernel::new(KernelConfig::default());
            assert!(probe.apply_move(action, false).is_ok());
            assert!(probe.path_exists(probe.positions[0], ReferenceKernel::goal_row(0)));
            assert!(probe.path_exists(probe.positions[1], ReferenceKernel::goal_row(1)));
        }
    }

    #[test]
    fn run_simulations_populates_root_stats() {
        let mut kernel = ReferenceKernel::new(KernelConfig::default());
        let completed = kernel.run_simulations(50);
        assert_eq!(completed, 50);
        assert_eq!(kernel.visit_count(), 50);
        assert!(kernel.evaluation().is_some());
        assert!(!kernel.sorted_actions(false).is_empty());
    }

    #[test]
    fn reset_restores_initial_position() {
        let mut kernel = ReferenceKernel::new(KernelConfig::default());
        let action = kernel.legal_actions()[0];
        kernel.apply_move(action, false).unwrap();
        kernel.reset();
        assert_eq!(kernel.positions[0], (BOARD_SIZE / 2, 0));
        assert_eq!(kernel.visit_count(), 0);
    }
}
