use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};
use crate::concurrency::lock;
use crate::constants_config::SimulationConstants;
use crate::errors::SimulationError;
use crate::particles::Particle;
use crate::utils::{BOUNDS_PADDING, MAX_TREE_DEPTH};

/// Stable identifier of a tree node within one step's tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One of the four children of a split node, in the fixed order used for
/// child selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quadrant {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::UpperLeft,
        Quadrant::UpperRight,
        Quadrant::LowerLeft,
        Quadrant::LowerRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Axis-aligned region of the simulation plane.
///
/// Containment is inclusive on every edge, so a point on a shared edge belongs
/// to several quadrants and the first one in [`Quadrant::ALL`] order wins.
///
/// # Examples
///
/// ```
/// use bh_engine::particles::{Bounds, Quadrant};
///
/// let bounds = Bounds::square(0.0, 2.0);
/// let ul = bounds.quadrant(Quadrant::UpperLeft);
/// assert_eq!((ul.left, ul.right, ul.bottom, ul.top), (0.0, 1.0, 1.0, 2.0));
///
/// // The centre lies on all four children; upper-left is tested first.
/// assert_eq!(bounds.quadrant_of(1.0, 1.0), Some(Quadrant::UpperLeft));
/// assert_eq!(bounds.quadrant_of(3.0, 1.0), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Bounds {
    /// A square spanning `[min, max]` on both axes.
    pub fn square(min: f64, max: f64) -> Self {
        Self { left: min, right: max, bottom: min, top: max }
    }

    /// The root square for the next step: the extent of all coordinates and the
    /// origin, padded on every side.
    pub fn covering(particles: &[Particle]) -> Self {
        let (min, max) = particles.iter().fold((0.0_f64, 0.0_f64), |(lo, hi), p| {
            (lo.min(p.x).min(p.y), hi.max(p.x).max(p.y))
        });
        Self::square(min - BOUNDS_PADDING, max + BOUNDS_PADDING)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }

    /// Side length; roots and all their descendants are square.
    pub fn side(&self) -> f64 {
        (self.left - self.right).abs()
    }

    pub fn quadrant(&self, quadrant: Quadrant) -> Bounds {
        let mid_x = (self.left + self.right) / 2.0;
        let mid_y = (self.top + self.bottom) / 2.0;
        match quadrant {
            Quadrant::UpperLeft => Bounds { left: self.left, right: mid_x, bottom: mid_y, top: self.top },
            Quadrant::UpperRight => Bounds { left: mid_x, right: self.right, bottom: mid_y, top: self.top },
            Quadrant::LowerLeft => Bounds { left: self.left, right: mid_x, bottom: self.bottom, top: mid_y },
            Quadrant::LowerRight => Bounds { left: mid_x, right: self.right, bottom: self.bottom, top: mid_y },
        }
    }

    /// First quadrant (UL, UR, LL, LR) whose box contains the point.
    pub fn quadrant_of(&self, x: f64, y: f64) -> Option<Quadrant> {
        Quadrant::ALL
            .into_iter()
            .find(|&q| self.quadrant(q).contains(x, y))
    }
}

/// Position snapshot of a particle held by a leaf, tagged with its array index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

/// Aggregated mass and centroid of a subtree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassSummary {
    pub mass: f64,
    pub x: f64,
    pub y: f64,
}

impl MassSummary {
    pub const EMPTY: MassSummary = MassSummary { mass: 0.0, x: 0.0, y: 0.0 };
}

#[derive(Debug, Default)]
struct NodeState {
    body: Option<Body>,
    count: usize,
}

/// A square cell of the quadtree.
///
/// Structural mutation goes through the node's own guard; children are
/// published once through a `OnceLock` and never removed, so a child reference
/// stays valid after the parent guard is released.
#[derive(Debug)]
pub struct TreeNode {
    id: NodeId,
    bounds: Bounds,
    state: Mutex<NodeState>,
    children: OnceLock<Box<[TreeNode; 4]>>,
    summary: OnceLock<MassSummary>,
}

impl TreeNode {
    fn new(id: NodeId, bounds: Bounds) -> Self {
        Self {
            id,
            bounds,
            state: Mutex::new(NodeState::default()),
            children: OnceLock::new(),
            summary: OnceLock::new(),
        }
    }

    fn split(bounds: &Bounds, ids: &AtomicUsize) -> Box<[TreeNode; 4]> {
        Box::new(Quadrant::ALL.map(|q| {
            TreeNode::new(NodeId(ids.fetch_add(1, Ordering::Relaxed)), bounds.quadrant(q))
        }))
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn children(&self) -> Option<&[TreeNode; 4]> {
        self.children.get().map(|c| &**c)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.get().is_none()
    }

    /// The real particle held by this node, if it is a non-empty leaf.
    pub fn body(&self) -> Option<Body> {
        lock(&self.state).body
    }

    /// Number of particles inserted through this node.
    pub fn count(&self) -> usize {
        lock(&self.state).count
    }

    /// Mass and centroid, available once the tree has been aggregated.
    pub fn summary(&self) -> Option<MassSummary> {
        self.summary.get().copied()
    }
}

enum Placement {
    Stored,
    Descend {
        quadrant: Quadrant,
        displaced: Option<(Quadrant, Body)>,
    },
}

/// Decides what to do with `body` at one node and applies the node-local part of
/// the mutation. The caller holds the node exclusively (guard or `&mut`) for
/// the whole call and releases it only after the count has been bumped.
fn settle(
    state: &mut NodeState,
    bounds: &Bounds,
    children: &OnceLock<Box<[TreeNode; 4]>>,
    body: Body,
    ids: &AtomicUsize,
) -> Result<Placement, SimulationError> {
    let quadrant_for = |b: &Body| {
        bounds
            .quadrant_of(b.x, b.y)
            .ok_or(SimulationError::NoContainingQuadrant { x: b.x, y: b.y })
    };

    if children.get().is_some() {
        let quadrant = quadrant_for(&body)?;
        state.count += 1;
        return Ok(Placement::Descend { quadrant, displaced: None });
    }

    match state.body {
        None => {
            state.body = Some(body);
            state.count += 1;
            Ok(Placement::Stored)
        }
        Some(resident) => {
            let resident_quadrant = quadrant_for(&resident)?;
            let quadrant = quadrant_for(&body)?;
            children.get_or_init(|| TreeNode::split(bounds, ids));
            state.body = None;
            state.count += 1;
            Ok(Placement::Descend { quadrant, displaced: Some((resident_quadrant, resident)) })
        }
    }
}

/// Barnes-Hut quadtree rebuilt from scratch every step.
///
/// # Examples
///
/// ```
/// use bh_engine::particles::{Bounds, Particle, Quadtree};
/// use bh_engine::SimulationConstants;
///
/// let particles = vec![
///     Particle::new(0.2, 0.2, 0.0, 0.0),
///     Particle::new(0.8, 0.8, 0.0, 0.0),
/// ];
/// let mut tree = Quadtree::new(Bounds::covering(&particles));
/// for (i, p) in particles.iter().enumerate() {
///     tree.insert(p.body(i)).unwrap();
/// }
/// let root = tree.aggregate();
/// assert_eq!(root.mass, 2.0);
/// assert!((root.x - 0.5).abs() < 1e-12);
///
/// let mut probe = particles[0];
/// tree.accumulate_force(&mut probe, &SimulationConstants::default()).unwrap();
/// assert!(probe.vx > 0.0 && probe.vy > 0.0);
/// ```
#[derive(Debug)]
pub struct Quadtree {
    root: TreeNode,
    next_id: AtomicUsize,
}

impl Quadtree {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            root: TreeNode::new(NodeId(0), bounds),
            next_id: AtomicUsize::new(1),
        }
    }

    pub fn covering(particles: &[Particle]) -> Self {
        Self::new(Bounds::covering(particles))
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn bounds(&self) -> Bounds {
        self.root.bounds
    }

    /// Fails on the first particle the root cannot hold.
    pub fn check_bounds(&self, particles: &[Particle]) -> Result<(), SimulationError> {
        match particles
            .iter()
            .enumerate()
            .find(|(_, p)| !self.root.bounds.contains(p.x, p.y))
        {
            Some((index, p)) => Err(SimulationError::OutOfBounds { index, x: p.x, y: p.y }),
            None => Ok(()),
        }
    }

    fn check_root(&self, body: &Body) -> Result<(), SimulationError> {
        if self.root.bounds.contains(body.x, body.y) {
            Ok(())
        } else {
            Err(SimulationError::OutOfBounds { index: body.index, x: body.x, y: body.y })
        }
    }

    /// Inserts without taking any node guard. Exclusive access to the tree
    /// makes the guards unnecessary.
    pub fn insert(&mut self, body: Body) -> Result<(), SimulationError> {
        self.check_root(&body)?;
        Self::insert_exclusive(&mut self.root, body, &self.next_id, 0)
    }

    /// Inserts while other threads may be inserting too. Each visited node is
    /// guarded across its read-decide-mutate sequence, and its count is bumped
    /// before the guard is released.
    pub fn insert_concurrent(&self, body: Body) -> Result<(), SimulationError> {
        self.check_root(&body)?;
        Self::insert_locked(&self.root, body, &self.next_id, 0)
    }

    fn insert_exclusive(
        node: &mut TreeNode,
        body: Body,
        ids: &AtomicUsize,
        depth: usize,
    ) -> Result<(), SimulationError> {
        if depth > MAX_TREE_DEPTH {
            return Err(SimulationError::TreeTooDeep { index: body.index, depth });
        }
        let TreeNode { bounds, state, children, .. } = node;
        let state = state.get_mut().unwrap_or_else(PoisonError::into_inner);

        match settle(state, bounds, children, body, ids)? {
            Placement::Stored => Ok(()),
            Placement::Descend { quadrant, displaced } => {
                let children = children
                    .get_mut()
                    .ok_or(SimulationError::NoContainingQuadrant { x: body.x, y: body.y })?;
                if let Some((resident_quadrant, resident)) = displaced {
                    Self::insert_exclusive(&mut children[resident_quadrant.index()], resident, ids, depth + 1)?;
                }
                Self::insert_exclusive(&mut children[quadrant.index()], body, ids, depth + 1)
            }
        }
    }

    fn insert_locked(
        node: &TreeNode,
        body: Body,
        ids: &AtomicUsize,
        depth: usize,
    ) -> Result<(), SimulationError> {
        if depth > MAX_TREE_DEPTH {
            return Err(SimulationError::TreeTooDeep { index: body.index, depth });
        }
        let mut state = lock(&node.state);

        match settle(&mut state, &node.bounds, &node.children, body, ids)? {
            Placement::Stored => Ok(()),
            Placement::Descend { quadrant, displaced } => {
                let children = node
                    .children
                    .get()
                    .ok_or(SimulationError::NoContainingQuadrant { x: body.x, y: body.y })?;
                // The fresh children are unreachable to other threads until this guard drops.
                if let Some((resident_quadrant, resident)) = displaced {
                    Self::insert_locked(&children[resident_quadrant.index()], resident, ids, depth + 1)?;
                }
                drop(state);
                Self::insert_locked(&children[quadrant.index()], body, ids, depth + 1)
            }
        }
    }

    /// Computes mass and centroid for every node, bottom-up, and returns the
    /// root's summary. Must not race with insertion.
    pub fn aggregate(&self) -> MassSummary {
        Self::aggregate_node(&self.root)
    }

    pub fn is_aggregated(&self) -> bool {
        self.root.summary.get().is_some()
    }

    fn aggregate_node(node: &TreeNode) -> MassSummary {
        if let Some(summary) = node.summary.get() {
            return *summary;
        }

        let summary = match node.children.get() {
            Some(children) => {
                let (mut mass, mut x, mut y) = (0.0, 0.0, 0.0);
                for child in children.iter() {
                    let child_summary = Self::aggregate_node(child);
                    if child_summary.mass != 0.0 {
                        mass += child_summary.mass;
                        x += child_summary.mass * child_summary.x;
                        y += child_summary.mass * child_summary.y;
                    }
                }
                debug_assert_eq!(mass, node.count() as f64, "node {:?} mass mismatch", node.id);
                MassSummary { mass, x: x / mass, y: y / mass }
            }
            None => match node.body() {
                Some(body) => MassSummary { mass: 1.0, x: body.x, y: body.y },
                None => MassSummary::EMPTY,
            },
        };

        *node.summary.get_or_init(|| summary)
    }

    /// Adds the velocity kick the whole tree exerts on `particle` over one
    /// time step. Reads only aggregated summaries, so it needs no locking.
    pub fn accumulate_force(
        &self,
        particle: &mut Particle,
        constants: &SimulationConstants,
    ) -> Result<(), SimulationError> {
        if !self.is_aggregated() {
            return Err(SimulationError::TreeNotAggregated);
        }
        Self::accumulate_node(&self.root, particle, constants);
        Ok(())
    }

    fn accumulate_node(node: &TreeNode, particle: &mut Particle, constants: &SimulationConstants) {
        let Some(summary) = node.summary.get() else {
            return;
        };
        if summary.mass == 0.0 {
            return;
        }

        let distance = constants.softened_distance(summary.x - particle.x, summary.y - particle.y);
        match node.children.get() {
            None => particle.pull_towards(summary.x, summary.y, summary.mass, distance, constants.time_step),
            Some(children) => {
                if constants.admits(node.bounds.side(), distance) {
                    particle.pull_towards(summary.x, summary.y, summary.mass, distance, constants.time_step);
                } else {
                    for child in children.iter() {
                        Self::accumulate_node(child, particle, constants);
                    }
                }
            }
        }
    }

    /// Calls `f` for every leaf that holds a particle, in UL, UR, LL, LR
    /// depth-first order.
    pub fn visit_leaves<F: FnMut(&TreeNode, Body)>(&self, mut f: F) {
        fn walk<F: FnMut(&TreeNode, Body)>(node: &TreeNode, f: &mut F) {
            match node.children() {
                Some(children) => {
                    for child in children.iter() {
                        walk(child, f);
                    }
                }
                None => {
                    if let Some(body) = node.body() {
                        f(node, body);
                    }
                }
            }
        }
        walk(&self.root, &mut f);
    }

    /// Points every inserted particle's back-reference at its current leaf.
    pub fn link_leaves(&self, particles: &mut [Particle]) {
        self.visit_leaves(|leaf, body| particles[body.index].leaf = Some(leaf.id));
    }

    pub fn find(&self, id: NodeId) -> Option<&TreeNode> {
        fn search(node: &TreeNode, id: NodeId) -> Option<&TreeNode> {
            if node.id == id {
                return Some(node);
            }
            node.children()?.iter().find_map(|child| search(child, id))
        }
        search(&self.root, id)
    }

    pub fn node_count(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            1 + node.children().map_or(0, |c| c.iter().map(count).sum())
        }
        count(&self.root)
    }

    /// Number of levels below the root.
    pub fn depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            node.children()
                .map_or(0, |c| 1 + c.iter().map(depth).max().unwrap_or(0))
        }
        depth(&self.root)
    }
}
