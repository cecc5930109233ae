use hypertune::{
    create_multi_objective_study, crowding_distance, dominates, Direction, ParameterRange,
    SearchSpace, TrialResult,
};

fn space_x() -> SearchSpace {
    SearchSpace::new(vec![ParameterRange::float("x", 0.0, 10.0).unwrap()]).unwrap()
}

#[test]
fn test_three_tradeoff_points_form_the_full_front() {
    let study = create_multi_objective_study(
        "pareto",
        space_x(),
        vec![Direction::Minimize, Direction::Minimize],
    )
    .unwrap();

    for values in [vec![1.0, 5.0], vec![2.0, 3.0], vec![4.0, 1.0]] {
        let trial = study.ask().unwrap();
        study
            .tell(trial.number(), TrialResult::Values(values))
            .unwrap();
    }

    let front = study.pareto_front();
    assert_eq!(front.len(), 3);
}

#[test]
fn test_dominated_points_drop_off_the_front() {
    let study = create_multi_objective_study(
        "pareto",
        space_x(),
        vec![Direction::Minimize, Direction::Minimize],
    )
    .unwrap();

    for values in [
        vec![1.0, 5.0],
        vec![2.0, 3.0],
        vec![3.0, 4.0], // dominated by (2, 3)
        vec![4.0, 1.0],
    ] {
        let trial = study.ask().unwrap();
        study
            .tell(trial.number(), TrialResult::Values(values))
            .unwrap();
    }

    let front = study.pareto_front();
    let numbers: Vec<usize> = front.iter().map(|t| t.number()).collect();
    assert_eq!(numbers, [0, 1, 3]);

    // Spot-check the dominance relation the front is built from.
    let directions = study.directions();
    assert!(dominates(&[2.0, 3.0], &[3.0, 4.0], directions));
    assert!(!dominates(&[1.0, 5.0], &[4.0, 1.0], directions));
}

#[test]
fn test_failed_and_pruned_trials_never_reach_the_front() {
    let study = create_multi_objective_study(
        "pareto",
        space_x(),
        vec![Direction::Minimize, Direction::Maximize],
    )
    .unwrap();

    let good = study.ask().unwrap();
    study
        .tell(good.number(), TrialResult::Values(vec![0.0, 100.0]))
        .unwrap();
    let failed = study.ask().unwrap();
    study.tell(failed.number(), TrialResult::Fail).unwrap();
    let pruned = study.ask().unwrap();
    study.tell(pruned.number(), TrialResult::Pruned).unwrap();

    let front = study.pareto_front();
    assert_eq!(front.len(), 1);
    assert_eq!(front[0].number(), good.number());
}

#[test]
fn test_mixed_direction_front_and_first_objective_best() {
    let study = create_multi_objective_study(
        "mixed",
        space_x(),
        vec![Direction::Minimize, Direction::Maximize],
    )
    .unwrap();

    // (cost, quality): minimize cost, maximize quality.
    for values in [vec![1.0, 2.0], vec![2.0, 5.0], vec![3.0, 4.0]] {
        let trial = study.ask().unwrap();
        study
            .tell(trial.number(), TrialResult::Values(values))
            .unwrap();
    }
    // (3, 4) loses to (2, 5) on both axes.
    let numbers: Vec<usize> = study.pareto_front().iter().map(|t| t.number()).collect();
    assert_eq!(numbers, [0, 1]);

    // best_trial ranks by the first objective only.
    assert_eq!(study.best_trial().unwrap().values(), Some(vec![1.0, 2.0]));
}

#[test]
fn test_crowding_distance_takes_the_full_direction_vector() {
    let front = vec![
        vec![0.0, 10.0],
        vec![2.0, 9.0],
        vec![3.0, 5.0],
        vec![10.0, 0.0],
    ];
    let distance = crowding_distance(
        &front,
        &[Direction::Minimize, Direction::Minimize],
    );
    assert_eq!(distance.len(), 4);
    assert_eq!(distance[0], f64::INFINITY);
    assert_eq!(distance[3], f64::INFINITY);
    assert!(distance[1].is_finite() && distance[1] > 0.0);
    assert!(distance[2].is_finite() && distance[2] > 0.0);

    // Flipping both directions reverses the sweeps but keeps the same
    // isolation structure.
    let flipped = crowding_distance(
        &front,
        &[Direction::Maximize, Direction::Maximize],
    );
    assert_eq!(flipped[0], f64::INFINITY);
    assert_eq!(flipped[3], f64::INFINITY);
    assert!((flipped[1] - distance[1]).abs() < 1e-12);
    assert!((flipped[2] - distance[2]).abs() < 1e-12);
}
