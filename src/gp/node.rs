//! Expression nodes and program trees.
//!
//! A program is a strict tree of [`Node`]s: terminals (a constant or the
//! input variable `X`) at the leaves, [`Function`] applications on the
//! branches. Every tree exclusively owns its children, so `clone` is a deep
//! copy and no two individuals ever share structure.
//!
//! Subtrees are addressed by their preorder index (root = 0), which lets the
//! genetic operators pick a crossover or mutation point and then replace
//! the subtree sitting in that slot.

use crate::error::{ConfigError, ConstructionError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

/// Name of the single input variable.
pub const VARIABLE_NAME: &str = "X";

/// Operators available to function nodes. All of them are binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    /// `a + b`.
    Add,
    /// `a - b`.
    Subtract,
    /// `a * b`.
    Multiply,
    /// `a / b`, unprotected: division by zero yields an infinity or NaN.
    Divide,
    /// `a` raised to the power `b`.
    Pow,
}

impl Function {
    /// Every function, in a fixed order.
    pub const ALL: [Self; 5] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Pow,
    ];

    /// Number of arguments the function takes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide | Self::Pow => 2,
        }
    }

    /// Apply the operator. Non-finite results are returned as-is.
    #[must_use]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Divide => a / b,
            Self::Pow => a.powf(b),
        }
    }

    /// Infix symbol used when printing expressions.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Pow => "^",
        }
    }
}

/// One entry of the node set: something random construction may place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    /// The input variable `X`.
    Variable,
    /// An ephemeral constant drawn from `[min, max]` when placed.
    Constant {
        /// Lower bound (inclusive).
        min: f64,
        /// Upper bound (inclusive).
        max: f64,
        /// Round drawn values to whole numbers.
        whole: bool,
    },
    /// A function node.
    Function(Function),
}

impl Primitive {
    /// Number of children a node built from this primitive has.
    #[must_use]
    pub const fn arity(&self) -> usize {
        match self {
            Self::Variable | Self::Constant { .. } => 0,
            Self::Function(f) => f.arity(),
        }
    }

    /// Whether this primitive produces leaves.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.arity() == 0
    }

    /// Instantiate a terminal. Returns `None` for function primitives.
    fn terminal<R: Rng>(&self, rng: &mut R) -> Option<Node> {
        match *self {
            Self::Variable => Some(Node::Var),
            Self::Constant { min, max, whole } => {
                let value = if whole {
                    let (lo, hi) = (min.ceil(), max.floor());
                    let upper = hi + 1.0;
                    if upper > lo {
                        rng.gen_range(lo..upper).floor().min(hi)
                    } else {
                        lo
                    }
                } else if max > min {
                    rng.gen_range(min..=max)
                } else {
                    min
                };
                Some(Node::Const(value))
            }
            Self::Function(_) => None,
        }
    }
}

/// The primitives random construction draws from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSet {
    /// Available primitives; drawn uniformly.
    pub primitives: Vec<Primitive>,
}

impl Default for NodeSet {
    /// `X`, every function, and whole constants in `[2, 10]`.
    fn default() -> Self {
        Self {
            primitives: vec![
                Primitive::Variable,
                Primitive::Function(Function::Pow),
                Primitive::Function(Function::Multiply),
                Primitive::Function(Function::Add),
                Primitive::Function(Function::Divide),
                Primitive::Function(Function::Subtract),
                Primitive::Constant {
                    min: 2.0,
                    max: 10.0,
                    whole: true,
                },
            ],
        }
    }
}

impl NodeSet {
    /// Check the node set can build trees at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the set is empty, has no terminal, or contains a
    /// constant whose range is non-finite, too wide to sample, inverted, or
    /// (for whole constants) holds no integer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primitives.is_empty() {
            return Err(ConfigError::EmptyNodeSet);
        }
        for p in &self.primitives {
            if let Primitive::Constant { min, max, whole } = *p {
                let empty = min > max || (whole && min.ceil() > max.floor());
                if !(max - min).is_finite() || empty {
                    return Err(ConfigError::InvalidConstantRange { min, max });
                }
            }
        }
        if !self.primitives.iter().any(Primitive::is_terminal) {
            return Err(ConfigError::NoTerminals);
        }
        Ok(())
    }

    fn pick<'a, R: Rng>(candidates: &[&'a Primitive], rng: &mut R) -> Option<&'a Primitive> {
        if candidates.is_empty() {
            None
        } else {
            Some(candidates[rng.gen_range(0..candidates.len())])
        }
    }

    fn terminals(&self) -> Vec<&Primitive> {
        self.primitives.iter().filter(|p| p.is_terminal()).collect()
    }

    fn functions(&self) -> Vec<&Primitive> {
        self.primitives.iter().filter(|p| !p.is_terminal()).collect()
    }
}

/// How random trees are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitMethod {
    /// Each slot draws from the whole node set until the depth budget runs out.
    Grow,
    /// Functions all the way down, terminals only at the depth limit.
    Full,
    /// Grow or full with equal odds, target depth ramped over `1..=max`.
    #[default]
    RampedHalfAndHalf,
}

/// Settings for random tree construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructionConfig {
    /// Discard and retry trees that break the arity or depth rules.
    pub strict: bool,
    /// Attempts before construction is declared unsatisfiable.
    pub max_attempts: usize,
    /// Tree shaping method.
    pub method: InitMethod,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            strict: true,
            max_attempts: 100,
            method: InitMethod::RampedHalfAndHalf,
        }
    }
}

/// A crossover or mutation point: a preorder index and the node's depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// Preorder index of the node (root = 0).
    pub index: usize,
    /// Depth of the node (root = 0).
    pub depth: usize,
}

/// An expression tree node. Also serves as the tree itself via its root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// A fixed value.
    Const(f64),
    /// The input variable `X`.
    Var,
    /// A function applied to exactly `arity` children.
    Call(Function, Vec<Node>),
}

impl Node {
    /// Build a binary function node.
    #[must_use]
    pub fn call(f: Function, a: Self, b: Self) -> Self {
        Self::Call(f, vec![a, b])
    }

    /// Build a random tree of depth at most `max_depth`.
    ///
    /// With strict construction, trees that are malformed or too deep are
    /// discarded and rebuilt, up to `config.max_attempts` times.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::Exhausted`] when no acceptable tree was
    /// produced within the attempt bound.
    pub fn random<R: Rng>(
        rng: &mut R,
        node_set: &NodeSet,
        max_depth: usize,
        config: &ConstructionConfig,
    ) -> Result<Self, ConstructionError> {
        let attempts = if config.strict { config.max_attempts.max(1) } else { 1 };
        for attempt in 0..attempts {
            let (method, depth) = match config.method {
                InitMethod::Grow => (InitMethod::Grow, max_depth),
                InitMethod::Full => (InitMethod::Full, max_depth),
                InitMethod::RampedHalfAndHalf => {
                    let depth = if max_depth == 0 { 0 } else { rng.gen_range(1..=max_depth) };
                    let method = if rng.gen_bool(0.5) { InitMethod::Grow } else { InitMethod::Full };
                    (method, depth)
                }
            };
            let candidate = match method {
                InitMethod::Full => Self::full(rng, node_set, depth),
                _ => Self::grow(rng, node_set, depth),
            };
            match candidate {
                Some(tree) if tree.is_well_formed() && tree.depth() <= max_depth => return Ok(tree),
                _ => log::debug!("discarding malformed tree (attempt {})", attempt + 1),
            }
        }
        Err(ConstructionError::Exhausted {
            attempts,
            max_depth,
        })
    }

    /// Grow a tree: every slot draws uniformly from the whole node set
    /// until the remaining depth budget is zero, where a terminal is forced.
    ///
    /// Returns `None` if a slot could not be resolved to a concrete node.
    pub fn grow<R: Rng>(rng: &mut R, node_set: &NodeSet, budget: usize) -> Option<Self> {
        let all: Vec<&Primitive> = node_set.primitives.iter().collect();
        let candidates = if budget == 0 { node_set.terminals() } else { all };
        let primitive = NodeSet::pick(&candidates, rng)?;
        Self::expand(rng, node_set, primitive, budget, Self::grow)
    }

    /// Build a full tree: functions until the depth budget runs out, then
    /// terminals. Falls back to terminals if the set has no functions.
    pub fn full<R: Rng>(rng: &mut R, node_set: &NodeSet, budget: usize) -> Option<Self> {
        let functions = node_set.functions();
        let candidates = if budget == 0 || functions.is_empty() {
            node_set.terminals()
        } else {
            functions
        };
        let primitive = NodeSet::pick(&candidates, rng)?;
        Self::expand(rng, node_set, primitive, budget, Self::full)
    }

    fn expand<R: Rng>(
        rng: &mut R,
        node_set: &NodeSet,
        primitive: &Primitive,
        budget: usize,
        child: fn(&mut R, &NodeSet, usize) -> Option<Self>,
    ) -> Option<Self> {
        match primitive {
            Primitive::Function(f) => {
                let child_budget = budget.checked_sub(1)?;
                let args = (0..f.arity())
                    .map(|_| child(rng, node_set, child_budget))
                    .collect::<Option<Vec<_>>>()?;
                Some(Self::Call(*f, args))
            }
            terminal => terminal.terminal(rng),
        }
    }

    /// Evaluate the tree with `X` bound to `x`.
    ///
    /// Division by zero and overflow propagate as NaN or infinities.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            Self::Const(v) => *v,
            Self::Var => x,
            Self::Call(f, args) => match args.as_slice() {
                [a, b] => f.apply(a.evaluate(x), b.evaluate(x)),
                _ => f64::NAN,
            },
        }
    }

    /// Depth of the tree: 0 for a terminal, 1 + deepest child otherwise.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Const(_) | Self::Var => 0,
            Self::Call(_, args) => 1 + args.iter().map(Self::depth).max().unwrap_or(0),
        }
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Const(_) | Self::Var => 1,
            Self::Call(_, args) => 1 + args.iter().map(Self::size).sum::<usize>(),
        }
    }

    /// Whether this node is a leaf.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Const(_) | Self::Var)
    }

    /// Every function node has exactly its arity of children.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Const(_) | Self::Var => true,
            Self::Call(f, args) => {
                args.len() == f.arity() && args.iter().all(Self::is_well_formed)
            }
        }
    }

    /// All nodes with their depths, in preorder.
    #[must_use]
    pub fn points(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.size());
        self.collect_points(0, &mut points);
        points
    }

    fn collect_points(&self, depth: usize, points: &mut Vec<Point>) {
        points.push(Point {
            index: points.len(),
            depth,
        });
        if let Self::Call(_, args) = self {
            for arg in args {
                arg.collect_points(depth + 1, points);
            }
        }
    }

    /// Pick a node uniformly at random.
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Point {
        let points = self.points();
        points[rng.gen_range(0..points.len())]
    }

    /// The subtree rooted at preorder `index`.
    #[must_use]
    pub fn subtree(&self, index: usize) -> Option<&Self> {
        if index == 0 {
            return Some(self);
        }
        let mut index = index - 1;
        if let Self::Call(_, args) = self {
            for arg in args {
                let size = arg.size();
                if index < size {
                    return arg.subtree(index);
                }
                index -= size;
            }
        }
        None
    }

    /// Mutable access to the slot holding the subtree at preorder `index`.
    pub fn subtree_mut(&mut self, index: usize) -> Option<&mut Self> {
        if index == 0 {
            return Some(self);
        }
        let mut index = index - 1;
        if let Self::Call(_, args) = self {
            for arg in args.iter_mut() {
                let size = arg.size();
                if index < size {
                    return arg.subtree_mut(index);
                }
                index -= size;
            }
        }
        None
    }

    /// Put `replacement` in the slot at `index`, returning what was there.
    pub fn replace_subtree(&mut self, index: usize, replacement: Self) -> Option<Self> {
        self.subtree_mut(index)
            .map(|slot| std::mem::replace(slot, replacement))
    }

    /// Render the tree as a Graphviz DOT digraph.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph program {\n    node [shape=box];\n");
        let mut next_id = 0;
        self.write_dot(&mut out, &mut next_id);
        out.push_str("}\n");
        out
    }

    fn write_dot(&self, out: &mut String, next_id: &mut usize) -> usize {
        let id = *next_id;
        *next_id += 1;
        let label = match self {
            Self::Const(v) => format!("{v}"),
            Self::Var => VARIABLE_NAME.to_string(),
            Self::Call(f, _) => f.symbol().to_string(),
        };
        // Writing into a String cannot fail.
        let _ = writeln!(out, "    n{id} [label=\"{label}\"];");
        if let Self::Call(_, args) = self {
            for arg in args {
                let child = arg.write_dot(out, next_id);
                let _ = writeln!(out, "    n{id} -> n{child};");
            }
        }
        id
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(v) => write!(f, "{v}"),
            Self::Var => write!(f, "{VARIABLE_NAME}"),
            Self::Call(func, args) => match args.as_slice() {
                [a, b] => write!(f, "({a} {} {b})", func.symbol()),
                _ => {
                    write!(f, "{:?}(", func)?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ")")
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    /// `2 * X + 1`
    fn linear() -> Node {
        Node::call(
            Function::Add,
            Node::call(Function::Multiply, Node::Const(2.0), Node::Var),
            Node::Const(1.0),
        )
    }

    #[test]
    fn test_evaluate_linear() {
        let tree = linear();
        assert!((tree.evaluate(1.0) - 3.0).abs() < f64::EPSILON);
        assert!((tree.evaluate(3.0) - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_divide_by_zero_is_not_finite() {
        let tree = Node::call(
            Function::Divide,
            Node::Var,
            Node::call(Function::Subtract, Node::Var, Node::Var),
        );
        assert!(tree.evaluate(1.0).is_infinite());
        assert!(tree.evaluate(0.0).is_nan());
    }

    #[test]
    fn test_depth_and_size() {
        assert_eq!(Node::Var.depth(), 0);
        assert_eq!(linear().depth(), 2);
        assert_eq!(linear().size(), 5);
    }

    #[test]
    fn test_subtree_addressing() {
        let tree = linear();
        assert_eq!(tree.subtree(1).map(Node::size), Some(3));
        assert_eq!(tree.subtree(3), Some(&Node::Var));
        assert_eq!(tree.subtree(4), Some(&Node::Const(1.0)));
        assert_eq!(tree.subtree(5), None);

        let depths: Vec<usize> = tree.points().iter().map(|p| p.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 2, 1]);
    }

    #[test]
    fn test_replace_subtree() {
        let mut tree = linear();
        let old = tree.replace_subtree(3, Node::Const(5.0));
        assert_eq!(old, Some(Node::Var));
        assert!((tree.evaluate(100.0) - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = linear();
        let mut copy = original.clone();
        copy.replace_subtree(0, Node::Const(0.0));
        assert!((original.evaluate(2.0) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_random_respects_depth() {
        let mut rng = SmallRng::seed_from_u64(42);
        let set = NodeSet::default();
        for method in [InitMethod::Grow, InitMethod::Full, InitMethod::RampedHalfAndHalf] {
            let config = ConstructionConfig {
                method,
                ..Default::default()
            };
            for _ in 0..200 {
                let tree = Node::random(&mut rng, &set, 4, &config).unwrap();
                assert!(tree.depth() <= 4);
                assert!(tree.is_well_formed());
            }
        }
    }

    #[test]
    fn test_full_reaches_depth() {
        let mut rng = SmallRng::seed_from_u64(7);
        let tree = Node::full(&mut rng, &NodeSet::default(), 3).unwrap();
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.size(), 15);
    }

    #[test]
    fn test_whole_constants_in_range() {
        let mut rng = SmallRng::seed_from_u64(1);
        let set = NodeSet {
            primitives: vec![Primitive::Constant {
                min: 2.0,
                max: 10.0,
                whole: true,
            }],
        };
        for _ in 0..100 {
            match Node::grow(&mut rng, &set, 3) {
                Some(Node::Const(v)) => {
                    assert!((2.0..=10.0).contains(&v));
                    assert!((v - v.round()).abs() < f64::EPSILON);
                }
                other => panic!("unexpected tree {other:?}"),
            }
        }
    }

    #[test]
    fn test_no_terminals_rejected() {
        let set = NodeSet {
            primitives: vec![Primitive::Function(Function::Add)],
        };
        assert_eq!(set.validate(), Err(ConfigError::NoTerminals));

        let mut rng = SmallRng::seed_from_u64(3);
        let config = ConstructionConfig {
            max_attempts: 5,
            ..Default::default()
        };
        let err = Node::random(&mut rng, &set, 2, &config).unwrap_err();
        assert_eq!(
            err,
            ConstructionError::Exhausted {
                attempts: 5,
                max_depth: 2
            }
        );
    }

    #[test]
    fn test_unsampleable_constant_ranges_rejected() {
        let with_constant = |min: f64, max: f64, whole: bool| NodeSet {
            primitives: vec![
                Primitive::Variable,
                Primitive::Constant { min, max, whole },
                Primitive::Function(Function::Add),
            ],
        };
        // Finite bounds whose width overflows.
        assert_eq!(
            with_constant(-1e308, 1e308, false).validate(),
            Err(ConfigError::InvalidConstantRange {
                min: -1e308,
                max: 1e308
            })
        );
        assert!(with_constant(f64::NAN, 1.0, false).validate().is_err());
        assert!(with_constant(3.0, 2.0, false).validate().is_err());
        // No integer between the bounds.
        assert!(with_constant(2.5, 2.7, true).validate().is_err());
        assert!(with_constant(2.5, 2.7, false).validate().is_ok());
        assert!(with_constant(-1e6, 1e6, false).validate().is_ok());
    }

    #[test]
    fn test_whole_constants_stay_inside_fractional_bounds() {
        let mut rng = SmallRng::seed_from_u64(9);
        let constant = Primitive::Constant {
            min: 2.5,
            max: 4.7,
            whole: true,
        };
        let mut seen = [false; 2];
        for _ in 0..200 {
            match constant.terminal(&mut rng) {
                Some(Node::Const(v)) => {
                    assert!((2.5..=4.7).contains(&v), "{v} out of range");
                    assert!((v - v.round()).abs() < f64::EPSILON);
                    seen[usize::from(v > 3.5)] = true;
                }
                other => panic!("unexpected terminal {other:?}"),
            }
        }
        assert_eq!(seen, [true, true]);

        let single = Primitive::Constant {
            min: 5.0,
            max: 5.0,
            whole: true,
        };
        assert_eq!(single.terminal(&mut rng), Some(Node::Const(5.0)));
    }

    #[test]
    fn test_display_and_dot() {
        let tree = linear();
        assert_eq!(tree.to_string(), "((2 * X) + 1)");
        let dot = tree.to_dot();
        assert!(dot.starts_with("digraph program {"));
        assert!(dot.contains("n0 -> n1;"));
        assert!(dot.contains("label=\"X\""));
    }

    #[test]
    fn test_malformed_tree_detected() {
        let tree = Node::Call(Function::Add, vec![Node::Var]);
        assert!(!tree.is_well_formed());
        assert!(tree.evaluate(1.0).is_nan());
    }
}
