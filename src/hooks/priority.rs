//! Ordering constraints and their resolution into a total order.

use std::collections::{BTreeSet, HashMap};

/// Where a subscriber wants to sit relative to the others.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    Default,
    First,
    Last,
    /// Run before the named module.
    Before(String),
    /// Run after the named module.
    After(String),
}

impl Priority {
    pub fn before(module: impl Into<String>) -> Self {
        Self::Before(module.into())
    }

    pub fn after(module: impl Into<String>) -> Self {
        Self::After(module.into())
    }
}

/// Precedence edges: `edges[a]` lists every `b` that `a` must precede.
fn build_edges(subs: &[(&str, &Priority)]) -> Vec<Vec<usize>> {
    let n = subs.len();
    let index: HashMap<&str, usize> = subs.iter().enumerate().map(|(i, (name, _))| (*name, i)).collect();
    let other = |name: &str, me: usize| index.get(name).copied().filter(|&t| t != me);

    let mut edges = vec![Vec::new(); n];
    for (i, (_, priority)) in subs.iter().enumerate() {
        match priority {
            Priority::Before(x) => {
                if let Some(t) = other(x, i) {
                    edges[i].push(t);
                }
            }
            Priority::After(x) => {
                if let Some(t) = other(x, i) {
                    edges[t].push(i);
                }
            }
            Priority::First => {
                for (j, (_, p)) in subs.iter().enumerate() {
                    if !matches!(p, Priority::First) {
                        edges[i].push(j);
                    }
                }
            }
            Priority::Last => {
                for (j, (_, p)) in subs.iter().enumerate() {
                    if !matches!(p, Priority::Last) {
                        edges[j].push(i);
                    }
                }
            }
            Priority::Default => {}
        }
    }
    edges
}

/// Kahn's algorithm, always taking the lowest registration index that is
/// ready. Returns the nodes left over on a cycle.
fn topo_sort(edges: &[Vec<usize>]) -> Result<Vec<usize>, Vec<usize>> {
    let n = edges.len();
    let mut indegree = vec![0usize; n];
    for targets in edges {
        for &t in targets {
            indegree[t] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut out = Vec::with_capacity(n);
    while let Some(next) = ready.pop_first() {
        out.push(next);
        for &t in &edges[next] {
            indegree[t] -= 1;
            if indegree[t] == 0 {
                ready.insert(t);
            }
        }
    }

    if out.len() == n {
        Ok(out)
    } else {
        Err((0..n).filter(|&i| indegree[i] > 0).collect())
    }
}

fn satisfies(order: &[usize], edges: &[Vec<usize>]) -> bool {
    let mut pos = vec![0usize; order.len()];
    for (p, &node) in order.iter().enumerate() {
        pos[node] = p;
    }
    edges
        .iter()
        .enumerate()
        .all(|(a, targets)| targets.iter().all(|&b| pos[a] < pos[b]))
}

/// Resolve subscribers (in registration order) into invocation order.
///
/// Starts from registration order with `First` entries hoisted and `Last`
/// entries sunk, then relocates each `Before`/`After` subscriber next to its
/// anchor only while its constraint is violated, so satisfied constraints
/// never disturb anyone else's relative position. Returns indices into
/// `subs`, or the indices caught in a cycle.
pub(crate) fn resolve(subs: &[(&str, &Priority)]) -> Result<Vec<usize>, Vec<usize>> {
    let edges = build_edges(subs);
    let fallback = topo_sort(&edges)?;

    let n = subs.len();
    let index: HashMap<&str, usize> = subs.iter().enumerate().map(|(i, (name, _))| (*name, i)).collect();
    let relative: Vec<(usize, bool, usize)> = subs
        .iter()
        .enumerate()
        .filter_map(|(i, (_, p))| match p {
            Priority::Before(x) => index.get(x.as_str()).filter(|&&t| t != i).map(|&t| (i, true, t)),
            Priority::After(x) => index.get(x.as_str()).filter(|&&t| t != i).map(|&t| (i, false, t)),
            _ => None,
        })
        .collect();

    let rank = |p: &Priority| match p {
        Priority::First => 0,
        Priority::Last => 2,
        _ => 1,
    };
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| rank(subs[i].1));

    for _ in 0..=n * n {
        let mut moved = false;
        for &(me, before, anchor) in &relative {
            let (Some(pm), Some(pa)) = (
                order.iter().position(|&x| x == me),
                order.iter().position(|&x| x == anchor),
            ) else {
                continue;
            };
            if before && pm > pa {
                order.remove(pm);
                order.insert(pa, me);
                moved = true;
            } else if !before && pm < pa {
                order.remove(pm);
                order.insert(pa, me);
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }

    if satisfies(&order, &edges) {
        Ok(order)
    } else {
        Ok(fallback)
    }
}
