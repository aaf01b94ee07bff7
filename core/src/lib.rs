#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Flow Defence engine.
//!
//! This crate defines the message surface that connects adapters, scenes, the
//! authoritative world, and pure systems. Scenes submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::{f32::consts::PI, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use flow_defence_store::Key;

/// Edge length of a grid cell on screen, in pixels.
pub const DEFAULT_CELL_SIZE: f32 = 46.0;

/// Screen position of the centre of cell (0, 0).
pub const DEFAULT_GRID_ORIGIN: Vec2 = Vec2::new(52.0, 62.0);

/// Direction code stored for cells without a valid flow direction.
pub const NO_DIRECTION: u8 = 8;

flow_defence_store::new_key_type! {
    /// Identity of a walker held by the world's walker store.
    #[derive(Serialize, Deserialize)]
    pub struct WalkerId;

    /// Identity of a bullet held by the world's bullet store.
    #[derive(Serialize, Deserialize)]
    pub struct BulletId;
}

/// Unique identifier assigned to a tower.
///
/// Towers are never removed, so the identifier doubles as the tower's index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Cell reached by taking one step in `direction`, if it has non-negative coordinates.
    ///
    /// Upper bounds are the grid's concern and are not checked here.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.offset();
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(CellCoord::new(column, row))
    }
}

/// Integer code stored in every grid cell.
///
/// Only [`CellType::EMPTY`] is walkable. Every other code blocks walkers; the
/// codes above [`CellType::WALL`] select decorative tile variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellType(u8);

impl CellType {
    /// Open floor that walkers may traverse.
    pub const EMPTY: CellType = CellType(0);
    /// Solid obstacle; also written by tower placement.
    pub const WALL: CellType = CellType(1);
    /// Impassable cell that is not drawn.
    pub const HIDDEN: CellType = CellType(4);
    /// Highest code the level editor offers.
    pub const MAX_EDITABLE: CellType = CellType(20);

    /// Wraps a raw cell code.
    #[must_use]
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// Raw cell code.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Reports whether walkers may enter a cell holding this code, which is
    /// only the case for [`CellType::EMPTY`].
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        self.0 == Self::EMPTY.0
    }

    /// Reports whether cells holding this code are skipped when drawing.
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.0 == Self::HIDDEN.0
    }
}

/// Compass directions stored by the flow field, in table order.
///
/// The discriminant doubles as the direction code, so ties between equally
/// good neighbours always resolve toward the earlier entry of [`Direction::ALL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    North = 0,
    /// Toward decreasing rows and increasing columns.
    NorthEast = 1,
    /// Toward increasing column indices.
    East = 2,
    /// Toward increasing rows and columns.
    SouthEast = 3,
    /// Toward increasing row indices.
    South = 4,
    /// Toward increasing rows and decreasing columns.
    SouthWest = 5,
    /// Toward decreasing column indices.
    West = 6,
    /// Toward decreasing rows and columns.
    NorthWest = 7,
}

impl Direction {
    /// Every direction in code order.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Direction code in `0..8`.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Resolves a direction code; anything outside `0..8` means "no direction".
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Direction> {
        if code < NO_DIRECTION {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }

    /// Column and row delta of a single step.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Reports whether the direction moves along both axes.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        let (dx, dy) = self.offset();
        dx != 0 && dy != 0
    }
}

/// Neighbourhood used when propagating flow-field distances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Orthogonal steps only.
    #[default]
    Four,
    /// Orthogonal and diagonal steps; diagonals may not cut blocked corners.
    Eight,
}

impl Connectivity {
    /// Reports whether the neighbourhood includes `direction`.
    #[must_use]
    pub const fn allows(self, direction: Direction) -> bool {
        match self {
            Self::Four => !direction.is_diagonal(),
            Self::Eight => true,
        }
    }
}

/// Affine mapping between grid cells and screen pixels.
///
/// Rendering, pointer hit-testing and walker snapping all go through the same
/// transform so the three never disagree about where a cell is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenTransform {
    origin: Vec2,
    cell_size: f32,
}

impl Default for ScreenTransform {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_ORIGIN, DEFAULT_CELL_SIZE)
    }
}

impl ScreenTransform {
    /// Creates a transform placing cell (0, 0) at `origin` with square cells of `cell_size` pixels.
    #[must_use]
    pub const fn new(origin: Vec2, cell_size: f32) -> Self {
        Self { origin, cell_size }
    }

    /// Screen position of the centre of cell (0, 0).
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Edge length of a cell in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Screen position of the centre of `cell`.
    #[must_use]
    pub fn to_screen(&self, cell: CellCoord) -> Vec2 {
        self.origin + Vec2::new(cell.column() as f32, cell.row() as f32) * self.cell_size
    }

    /// Cell whose square contains `point`, if the point lies right of and below the grid origin.
    ///
    /// The result is not clamped to any grid; callers check it against their grid bounds.
    #[must_use]
    pub fn to_cell(&self, point: Vec2) -> Option<CellCoord> {
        if self.cell_size <= 0.0 {
            return None;
        }

        let half = self.cell_size * 0.5;
        let local = point - self.origin + Vec2::splat(half);
        if local.x < 0.0 || local.y < 0.0 || !local.is_finite() {
            return None;
        }

        let column = (local.x / self.cell_size).floor();
        let row = (local.y / self.cell_size).floor();
        if column > u32::MAX as f32 || row > u32::MAX as f32 {
            return None;
        }

        Some(CellCoord::new(column as u32, row as u32))
    }
}

/// Screen rectangle bullets may travel in before they are discarded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    min: Vec2,
    max: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::new(1020.0, 760.0))
    }
}

impl Viewport {
    /// Creates a viewport spanning `min..=max`.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Upper-left corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Lower-right corner.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Reports whether `point` lies within the viewport, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// Region of the sprite sheet used to draw an entity, in texels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl SpriteRect {
    /// Creates a sprite rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Tint applied to a walker's sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalkerColor {
    red: u8,
    green: u8,
    blue: u8,
    alpha: u8,
}

impl WalkerColor {
    /// Opaque white, the neutral tint.
    pub const WHITE: WalkerColor = WalkerColor::from_rgba(255, 255, 255, 255);

    /// Creates a color from byte RGBA components.
    #[must_use]
    pub const fn from_rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Alpha component of the color.
    #[must_use]
    pub const fn alpha(&self) -> u8 {
        self.alpha
    }
}

/// Template every spawned walker is initialised from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalkerDefinition {
    /// Sprite drawn for the walker.
    pub sprite: SpriteRect,
    /// Energy the walker starts with; bullets subtract from it.
    pub energy: f32,
    /// Tint applied to the sprite.
    pub color: WalkerColor,
    /// Travel speed in pixels per second.
    pub speed: f32,
}

impl Default for WalkerDefinition {
    fn default() -> Self {
        Self {
            sprite: SpriteRect::new(276.0, 0.0, 24.0, 24.0),
            energy: 10.0,
            color: WalkerColor::WHITE,
            speed: 100.0,
        }
    }
}

/// Template every placed tower is initialised from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerDefinition {
    /// Sprite drawn for the tower.
    pub sprite: SpriteRect,
    /// Targeting radius in pixels.
    pub radius: f32,
    /// Energy carried by every bullet the tower fires.
    pub energy: f32,
    /// Time the tower must hold a target between shots.
    pub fire_interval: Duration,
}

impl Default for TowerDefinition {
    fn default() -> Self {
        Self {
            sprite: SpriteRect::new(0.0, 93.0, 46.0, 46.0),
            radius: 100.0,
            energy: 1.0,
            fire_interval: Duration::from_secs(1),
        }
    }
}

/// Phase of a tower's idle rotation animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdlePhase {
    /// The tower turns at a constant rate.
    Rotating,
    /// The tower holds its facing.
    #[default]
    Paused,
}

/// Idle rotation state of an untargeted tower.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IdleRotation {
    /// Facing angle in radians, wrapped to `-PI..=PI`.
    pub angle: f32,
    /// Signed angular rate in radians per second while rotating.
    pub rate: f32,
    /// Time spent in the current phase.
    pub elapsed: Duration,
    /// Length of the current phase.
    pub duration: Duration,
    /// Current phase.
    pub phase: IdlePhase,
}

impl IdleRotation {
    /// Starts a rotating phase from `angle`.
    #[must_use]
    pub const fn rotating(angle: f32, rate: f32, duration: Duration) -> Self {
        Self {
            angle,
            rate,
            elapsed: Duration::ZERO,
            duration,
            phase: IdlePhase::Rotating,
        }
    }

    /// Starts a paused phase holding `angle`.
    #[must_use]
    pub const fn paused(angle: f32, duration: Duration) -> Self {
        Self {
            angle,
            rate: 0.0,
            elapsed: Duration::ZERO,
            duration,
            phase: IdlePhase::Paused,
        }
    }

    /// Advances the current phase by `dt`.
    ///
    /// Rotation stops at the end of the phase even when `dt` overshoots it.
    #[must_use]
    pub fn advance(self, dt: Duration) -> Self {
        let remaining = self.duration.saturating_sub(self.elapsed);
        let active = dt.min(remaining);
        let angle = match self.phase {
            IdlePhase::Rotating => wrap_angle(self.angle + self.rate * active.as_secs_f32()),
            IdlePhase::Paused => self.angle,
        };

        Self {
            angle,
            elapsed: self.elapsed.saturating_add(dt),
            ..self
        }
    }

    /// Reports whether the current phase has run its full length.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Wraps an angle in radians into `-PI..=PI`.
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell already holds an obstacle.
    Occupied,
    /// Placing the tower would cut the start cell off from the end cell.
    BlocksPath,
    /// No tower definition exists at the requested index.
    UnknownDefinition,
}

/// Reasons a walker leaves the battleground without being killed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalkerExit {
    /// The walker stood on the end cell.
    ReachedGoal,
    /// The flow field offered no way forward from the walker's cell.
    Stranded,
}

/// Reasons a bullet is discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulletExit {
    /// The bullet left the viewport.
    OutOfBounds,
    /// The bullet struck a walker.
    Hit,
    /// The bullet outlived its time-to-live.
    Expired,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Spawns a walker of the given definition on the start cell.
    SpawnWalker {
        /// Index into the world's walker definitions.
        definition: usize,
    },
    /// Moves a walker to a new screen position.
    MoveWalker {
        /// Walker being moved.
        walker: WalkerId,
        /// New screen position.
        position: Vec2,
        /// Grid cell the walker is now attributed to.
        cell: CellCoord,
        /// Velocity applied during the move, in pixels per second.
        velocity: Vec2,
        /// New facing angle in radians.
        rotation: f32,
    },
    /// Removes a walker that can make no further progress.
    RemoveWalker {
        /// Walker being removed.
        walker: WalkerId,
    },
    /// Requests a tower on the provided cell.
    PlaceTower {
        /// Cell the tower should occupy.
        cell: CellCoord,
        /// Index into the world's tower definitions.
        definition: usize,
    },
    /// Selects the tower standing on the provided cell, or clears the selection.
    SelectTower {
        /// Cell under the pointer, if it lies on the grid.
        cell: Option<CellCoord>,
    },
    /// Replaces a tower's current target.
    AssignTarget {
        /// Tower being retargeted.
        tower: TowerId,
        /// New target, or `None` to clear it.
        target: Option<WalkerId>,
    },
    /// Turns a tower to face the provided angle.
    AimTower {
        /// Tower being aimed.
        tower: TowerId,
        /// Facing angle in radians.
        rotation: f32,
    },
    /// Replaces the idle animation state of an untargeted tower.
    AnimateIdleTower {
        /// Tower being animated.
        tower: TowerId,
        /// Next idle rotation state.
        idle: IdleRotation,
    },
    /// Accumulates fire cooldown on every tower holding a live target.
    ChargeTowers {
        /// Elapsed simulated time.
        dt: Duration,
    },
    /// Fires a bullet from a tower at its current target.
    FireBullet {
        /// Tower firing the bullet.
        tower: TowerId,
    },
    /// Moves every bullet and resolves collisions.
    AdvanceBullets {
        /// Elapsed simulated time.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a walker entered the battleground.
    WalkerSpawned {
        /// Identity assigned to the walker.
        walker: WalkerId,
        /// Definition the walker was built from.
        definition: usize,
        /// Cell the walker starts on.
        cell: CellCoord,
    },
    /// Reports that a walker was re-attributed to a different grid cell.
    WalkerAdvanced {
        /// Walker that advanced.
        walker: WalkerId,
        /// Cell the walker occupied before.
        from: CellCoord,
        /// Cell the walker occupies now.
        to: CellCoord,
    },
    /// Reports that a walker left the battleground without being killed.
    WalkerRemoved {
        /// Walker that left.
        walker: WalkerId,
        /// Cell the walker stood on.
        cell: CellCoord,
        /// Why the walker left.
        reason: WalkerExit,
    },
    /// Reports that a bullet struck a walker.
    WalkerHit {
        /// Walker that was struck.
        walker: WalkerId,
        /// Bullet that struck it.
        bullet: BulletId,
        /// Energy the walker has left.
        remaining_energy: f32,
    },
    /// Reports that a walker's energy was depleted.
    WalkerKilled {
        /// Walker that was killed.
        walker: WalkerId,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Cell the tower occupies.
        cell: CellCoord,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports the outcome of a selection request.
    TowerSelected {
        /// Tower now selected, if any.
        tower: Option<TowerId>,
    },
    /// Reports that a tower acquired or dropped a target.
    TowerTargetChanged {
        /// Tower whose target changed.
        tower: TowerId,
        /// New target.
        target: Option<WalkerId>,
    },
    /// Reports that a tower fired.
    BulletFired {
        /// Bullet that was created.
        bullet: BulletId,
        /// Tower that fired it.
        tower: TowerId,
        /// Walker it was aimed at.
        target: WalkerId,
    },
    /// Reports that a bullet was discarded.
    BulletRemoved {
        /// Bullet that was discarded.
        bullet: BulletId,
        /// Why it was discarded.
        reason: BulletExit,
    },
    /// Reports that the flow field was recomputed.
    FlowFieldRebuilt {
        /// Number of cells holding a distance to the end cell.
        reachable_cells: usize,
    },
}

/// Immutable representation of a single walker's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct WalkerSnapshot {
    /// Identity of the walker.
    pub id: WalkerId,
    /// Grid cell the walker is attributed to.
    pub cell: CellCoord,
    /// Screen position.
    pub position: Vec2,
    /// Velocity applied during the last move, in pixels per second.
    pub velocity: Vec2,
    /// Facing angle in radians.
    pub rotation: f32,
    /// Travel speed in pixels per second.
    pub speed: f32,
    /// Remaining energy.
    pub energy: f32,
    /// Definition the walker was built from.
    pub definition: usize,
}

/// Read-only snapshot describing all live walkers.
///
/// Snapshots keep the store's dense order, which is the iteration order
/// first-found targeting resolves ties with.
#[derive(Clone, Debug, Default)]
pub struct WalkerView {
    snapshots: Vec<WalkerSnapshot>,
}

impl WalkerView {
    /// Creates a new walker view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<WalkerSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured walker snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &WalkerSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the walker with the given identity.
    #[must_use]
    pub fn get(&self, id: WalkerId) -> Option<&WalkerSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == id)
    }

    /// Number of captured walkers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no walkers were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<WalkerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a tower used by targeting.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identity of the tower.
    pub id: TowerId,
    /// Cell the tower occupies.
    pub cell: CellCoord,
    /// Screen position of the tower's centre.
    pub position: Vec2,
    /// Facing angle in radians.
    pub rotation: f32,
    /// Targeting radius in pixels.
    pub radius: f32,
    /// Current target, if any.
    pub target: Option<WalkerId>,
    /// Idle rotation state.
    pub idle: IdleRotation,
    /// Upgrade tier.
    pub level: u32,
    /// Definition the tower was built from.
    pub definition: usize,
}

/// Read-only snapshot describing every tower in placement order.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a bullet in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BulletSnapshot {
    /// Identity of the bullet.
    pub id: BulletId,
    /// Screen position.
    pub position: Vec2,
    /// Velocity in pixels per second.
    pub velocity: Vec2,
    /// Collision radius in pixels.
    pub radius: f32,
}

/// Fire cooldown state of a single tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Identity of the tower.
    pub tower: TowerId,
    /// Current target, if it is still live.
    pub target: Option<WalkerId>,
    /// Time accumulated while holding a target.
    pub timer: Duration,
    /// Time required between shots.
    pub interval: Duration,
}

impl TowerCooldownSnapshot {
    /// Reports whether the tower may fire now.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.target.is_some() && self.timer >= self.interval
    }
}

/// Read-only view of tower fire cooldowns.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a new cooldown view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerCooldownSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerCooldownSnapshot> {
        self.snapshots
    }
}

/// Producer-defined kind of an input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventType(u32);

impl EventType {
    /// Primary pointer button was clicked.
    pub const LEFT_BUTTON_CLICKED: EventType = EventType(1);
    /// Secondary pointer button was clicked.
    pub const RIGHT_BUTTON_CLICKED: EventType = EventType(2);
    /// The battleground scene was requested.
    pub const SHOW_BATTLEGROUND: EventType = EventType(100);
    /// The level editor scene was requested.
    pub const SHOW_EDITOR: EventType = EventType(101);
    /// The application was asked to stop.
    pub const STOP: EventType = EventType(102);

    /// Creates an event type from its numeric code.
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Numeric code of the event type.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Fixed-shape payload attached to an input event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EventPayload {
    /// Screen position.
    Point(Vec2),
    /// Grid cell.
    Cell(CellCoord),
    /// Producer-defined value.
    Value(u32),
}

/// Single entry of an [`EventStream`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    /// Kind of the event.
    pub kind: EventType,
    /// Optional payload.
    pub payload: Option<EventPayload>,
}

/// Append-only log of the input events gathered during one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventStream {
    events: Vec<InputEvent>,
}

impl EventStream {
    /// Creates an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every event; called at the start of each frame.
    pub fn reset(&mut self) {
        self.events.clear();
    }

    /// Appends an event without payload.
    pub fn add(&mut self, kind: EventType) {
        self.events.push(InputEvent {
            kind,
            payload: None,
        });
    }

    /// Appends an event carrying `payload`.
    pub fn add_with_payload(&mut self, kind: EventType, payload: EventPayload) {
        self.events.push(InputEvent {
            kind,
            payload: Some(payload),
        });
    }

    /// Reports whether an event of `kind` was recorded this frame.
    #[must_use]
    pub fn contains(&self, kind: EventType) -> bool {
        self.events.iter().any(|event| event.kind == kind)
    }

    /// Payload of the first event of `kind` that carries one.
    #[must_use]
    pub fn payload(&self, kind: EventType) -> Option<EventPayload> {
        self.events
            .iter()
            .filter(|event| event.kind == kind)
            .find_map(|event| event.payload)
    }

    /// Event at `index`, in recording order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&InputEvent> {
        self.events.get(index)
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Reports whether no events were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterator over recorded events in order.
    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&TowerId::new(42));
        assert_round_trip(&CellCoord::new(5, 7));
        assert_round_trip(&PlacementError::BlocksPath);
        assert_round_trip(&WalkerId::from_raw(flow_defence_store::RawId::new(3, 9)));
    }

    #[test]
    fn direction_codes_follow_table_order() {
        for (code, direction) in Direction::ALL.iter().enumerate() {
            assert_eq!(direction.code() as usize, code);
            assert_eq!(Direction::from_code(code as u8), Some(*direction));
        }
        assert_eq!(Direction::from_code(NO_DIRECTION), None);
        assert_eq!(Direction::from_code(200), None);
    }

    #[test]
    fn step_refuses_negative_coordinates() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.step(Direction::North), None);
        assert_eq!(corner.step(Direction::West), None);
        assert_eq!(corner.step(Direction::SouthEast), Some(CellCoord::new(1, 1)));
    }

    #[test]
    fn four_connectivity_excludes_diagonals() {
        let allowed: Vec<_> = Direction::ALL
            .into_iter()
            .filter(|direction| Connectivity::Four.allows(*direction))
            .collect();
        assert_eq!(
            allowed,
            vec![
                Direction::North,
                Direction::East,
                Direction::South,
                Direction::West
            ]
        );
        assert!(Direction::ALL
            .into_iter()
            .all(|direction| Connectivity::Eight.allows(direction)));
    }

    #[test]
    fn screen_transform_round_trips_cell_centres() {
        let transform = ScreenTransform::default();
        let cell = CellCoord::new(7, 3);
        let centre = transform.to_screen(cell);

        assert_eq!(centre, Vec2::new(52.0 + 7.0 * 46.0, 62.0 + 3.0 * 46.0));
        assert_eq!(transform.to_cell(centre), Some(cell));
        assert_eq!(transform.to_cell(centre + Vec2::splat(22.0)), Some(cell));
        assert_eq!(
            transform.to_cell(centre + Vec2::splat(23.0)),
            Some(CellCoord::new(8, 4))
        );
    }

    #[test]
    fn screen_transform_rejects_points_left_of_grid() {
        let transform = ScreenTransform::default();
        assert_eq!(transform.to_cell(Vec2::new(28.0, 100.0)), None);
        assert_eq!(transform.to_cell(Vec2::new(100.0, 38.0)), None);
        assert_eq!(
            transform.to_cell(Vec2::new(29.0, 39.0)),
            Some(CellCoord::new(0, 0))
        );
    }

    #[test]
    fn viewport_includes_edges() {
        let viewport = Viewport::default();
        assert!(viewport.contains(Vec2::new(0.0, 0.0)));
        assert!(viewport.contains(Vec2::new(1020.0, 760.0)));
        assert!(!viewport.contains(Vec2::new(1020.5, 10.0)));
        assert!(!viewport.contains(Vec2::new(10.0, -0.5)));
    }

    #[test]
    fn idle_rotation_stops_at_phase_end() {
        let idle = IdleRotation::rotating(0.0, 1.0, Duration::from_millis(500));
        let advanced = idle.advance(Duration::from_secs(2));

        assert!((advanced.angle - 0.5).abs() < 1e-5);
        assert!(advanced.is_finished());

        let paused =
            IdleRotation::paused(0.25, Duration::from_secs(1)).advance(Duration::from_millis(400));
        assert!((paused.angle - 0.25).abs() < f32::EPSILON);
        assert!(!paused.is_finished());
    }

    #[test]
    fn wrap_angle_stays_within_half_turn() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!((wrap_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-5);
        assert!(wrap_angle(7.5).abs() <= PI);
    }

    #[test]
    fn event_stream_reports_contained_types_and_payloads() {
        let mut stream = EventStream::new();
        stream.add(EventType::LEFT_BUTTON_CLICKED);
        stream.add_with_payload(
            EventType::RIGHT_BUTTON_CLICKED,
            EventPayload::Point(Vec2::new(3.0, 4.0)),
        );

        assert_eq!(stream.len(), 2);
        assert!(stream.contains(EventType::LEFT_BUTTON_CLICKED));
        assert!(!stream.contains(EventType::STOP));
        assert_eq!(stream.payload(EventType::LEFT_BUTTON_CLICKED), None);
        assert_eq!(
            stream.payload(EventType::RIGHT_BUTTON_CLICKED),
            Some(EventPayload::Point(Vec2::new(3.0, 4.0)))
        );
        assert_eq!(
            stream.get(1).map(|event| event.kind),
            Some(EventType::RIGHT_BUTTON_CLICKED)
        );

        stream.reset();
        assert!(stream.is_empty());
    }

    #[test]
    fn only_empty_cells_are_walkable() {
        assert!(CellType::EMPTY.is_walkable());
        assert!(!CellType::WALL.is_walkable());
        assert!(!CellType::new(3).is_walkable());
        assert!(!CellType::MAX_EDITABLE.is_walkable());
        assert!(CellType::HIDDEN.is_hidden());
    }
}
