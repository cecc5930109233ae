//! Pareto dominance, non-dominated fronts and NSGA-II crowding distance.

use std::sync::Arc;

use ordered_float::OrderedFloat;

use hypertune_space::{Direction, Trial, TrialState};

/// `a` dominates `b` under the per-objective directions: at least as good in
/// every coordinate and strictly better in at least one. Equal vectors do
/// not dominate. Mismatched lengths never dominate.
pub fn dominates(a: &[f64], b: &[f64], directions: &[Direction]) -> bool {
    if a.len() != b.len() || a.len() != directions.len() {
        return false;
    }
    let mut strictly_better = false;
    for ((&av, &bv), &direction) in a.iter().zip(b).zip(directions) {
        let (ao, bo) = (direction.orient(av), direction.orient(bv));
        if ao > bo {
            return false;
        }
        if ao < bo {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Complete trials whose objective vectors no other Complete trial
/// dominates. Scalar-valued trials participate as one-element vectors.
pub fn pareto_front(trials: &[Arc<Trial>], directions: &[Direction]) -> Vec<Arc<Trial>> {
    let complete: Vec<(&Arc<Trial>, Vec<f64>)> = trials
        .iter()
        .filter(|t| t.state() == TrialState::Complete)
        .filter_map(|t| {
            t.values()
                .or_else(|| t.value().map(|v| vec![v]))
                .map(|values| (t, values))
        })
        .collect();

    let mut front = Vec::new();
    for (i, (trial, values)) in complete.iter().enumerate() {
        let dominated = complete
            .iter()
            .enumerate()
            .any(|(j, (_, other))| j != i && dominates(other, values, directions));
        if !dominated {
            front.push(Arc::clone(trial));
        }
    }
    front
}

/// NSGA-II crowding distance for each vector of `front`, given the full
/// direction vector. Boundary solutions along any objective get infinity;
/// interior solutions accumulate the normalized span of their neighbors.
pub fn crowding_distance(front: &[Vec<f64>], directions: &[Direction]) -> Vec<f64> {
    let m = front.len();
    let mut distance = vec![0.0; m];
    if m == 0 {
        return distance;
    }
    for (objective, &direction) in directions.iter().enumerate() {
        let mut order: Vec<usize> = (0..m).collect();
        order.sort_by_key(|&i| OrderedFloat(direction.orient(front[i][objective])));

        distance[order[0]] = f64::INFINITY;
        distance[order[m - 1]] = f64::INFINITY;

        let span = (front[order[m - 1]][objective] - front[order[0]][objective]).abs();
        if span == 0.0 {
            continue;
        }
        for k in 1..m.saturating_sub(1) {
            if distance[order[k]].is_finite() {
                let prev = front[order[k - 1]][objective];
                let next = front[order[k + 1]][objective];
                distance[order[k]] += (next - prev).abs() / span;
            }
        }
    }
    distance
}
