use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    compromise::{check_rankings, CompromiseResult},
    Error, Ranking,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DominanceConfig {
    /// Share of rankings an alternative must win in before it dominates another. An edge requires
    /// strictly more than `quorum * k` wins, so 0.5 is a strict majority. Must be in `[0.5, 1)`.
    pub quorum: f64,
}

impl Default for DominanceConfig {
    fn default() -> Self {
        Self { quorum: 0.5 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DominanceResult {
    /// Consensus ranking, scored by net dominance (out-degree minus in-degree).
    pub compromise: CompromiseResult,
    /// Members of every dominance cycle in ascending index order, listed in ranking order.
    pub cycles: Vec<Vec<usize>>,
}

/// Consensus from the majority dominance graph.
///
/// Alternatives that dominate each other in a cycle are collapsed into one component. Components
/// are emitted in a topological order of the condensed graph, preferring the ready component with
/// the highest mean net dominance and then the lowest member index. Inside a cycle, alternatives
/// are ordered by their Borda points over that subset, then by index.
pub fn dominance_directed_graph(
    rankings: &[Ranking],
    config: &DominanceConfig,
) -> Result<DominanceResult, Error> {
    let m = check_rankings(rankings)?;
    if !(0.5..1.0).contains(&config.quorum) {
        return Err(Error::invalid(format!(
            "quorum must be in [0.5, 1), got {}",
            config.quorum
        )));
    }

    let threshold = config.quorum * rankings.len() as f64;
    let positions: Vec<Vec<usize>> = rankings.iter().map(Ranking::positions).collect();
    let edges: Vec<Vec<bool>> = (0..m)
        .map(|a| {
            (0..m)
                .map(|b| {
                    let wins = positions.iter().filter(|p| p[a] < p[b]).count();
                    (a != b) && (wins as f64 > threshold)
                })
                .collect()
        })
        .collect();
    let net: Vec<f64> = (0..m)
        .map(|a| {
            let out = edges[a].iter().filter(|e| **e).count();
            let into = edges.iter().filter(|row| row[a]).count();
            out as f64 - into as f64
        })
        .collect();

    let components = strongly_connected(&edges);
    let mut component_of = vec![0; m];
    for (id, members) in components.iter().enumerate() {
        for &a in members {
            component_of[a] = id;
        }
    }
    let mut successors = vec![BTreeSet::new(); components.len()];
    let mut in_degree = vec![0_usize; components.len()];
    for (a, row) in edges.iter().enumerate() {
        for (b, _) in row.iter().enumerate().filter(|(_, e)| **e) {
            let (from, to) = (component_of[a], component_of[b]);
            if (from != to) && successors[from].insert(to) {
                in_degree[to] += 1;
            }
        }
    }
    let mean_net: Vec<f64> = components
        .iter()
        .map(|members| members.iter().map(|&a| net[a]).sum::<f64>() / members.len() as f64)
        .collect();

    let mut ready: Vec<usize> = (0..components.len())
        .filter(|&c| in_degree[c] == 0)
        .collect();
    let mut order = Vec::with_capacity(m);
    let mut cycles = Vec::new();
    while let Some(index) = (0..ready.len()).max_by(|&x, &y| {
        let (x, y) = (ready[x], ready[y]);
        mean_net[x]
            .total_cmp(&mean_net[y])
            .then_with(|| components[y][0].cmp(&components[x][0]))
    }) {
        let component = ready.swap_remove(index);
        let members = &components[component];
        if members.len() > 1 {
            cycles.push(members.clone());
            order.extend(order_cycle(rankings, members));
        } else {
            order.push(members[0]);
        }
        for &next in &successors[component] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(next);
            }
        }
    }

    Ok(DominanceResult {
        compromise: CompromiseResult {
            ranking: Ranking::from_order(order)?,
            scores: net,
        },
        cycles,
    })
}

/// Borda points restricted to `members`, ties by index.
fn order_cycle(rankings: &[Ranking], members: &[usize]) -> Vec<usize> {
    let size = members.len();
    let mut points = vec![0_usize; rankings[0].len()];
    for ranking in rankings {
        let restricted = ranking.order().iter().filter(|a| members.contains(*a));
        for (position, &a) in restricted.enumerate() {
            points[a] += size - position;
        }
    }
    let mut ordered = members.to_vec();
    ordered.sort_by(|a, b| points[*b].cmp(&points[*a]).then(a.cmp(b)));
    ordered
}

/// Strongly connected components (Kosaraju), each sorted ascending.
fn strongly_connected(edges: &[Vec<bool>]) -> Vec<Vec<usize>> {
    let m = edges.len();

    let mut visited = vec![false; m];
    let mut finished = Vec::with_capacity(m);
    for start in 0..m {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut stack = vec![(start, 0)];
        while let Some(&(node, next)) = stack.last() {
            match (next..m).find(|&b| edges[node][b] && !visited[b]) {
                Some(b) => {
                    let top = stack.len() - 1;
                    stack[top].1 = b + 1;
                    visited[b] = true;
                    stack.push((b, 0));
                }
                None => {
                    finished.push(node);
                    stack.pop();
                }
            }
        }
    }

    let mut assigned = vec![false; m];
    let mut components = Vec::new();
    for &start in finished.iter().rev() {
        if assigned[start] {
            continue;
        }
        assigned[start] = true;
        let mut members = vec![start];
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for a in 0..m {
                if edges[a][node] && !assigned[a] {
                    assigned[a] = true;
                    members.push(a);
                    stack.push(a);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }
    components
}
