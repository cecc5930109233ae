use hypertune::{
    Direction, MedianPruner, NopPruner, ParameterRange, PercentilePruner, SearchSpace, Study,
    SuccessiveHalvingPruner, TrialResult,
};

fn space_x() -> SearchSpace {
    SearchSpace::new(vec![ParameterRange::float("x", 0.0, 10.0).unwrap()]).unwrap()
}

/// Complete `count` peers that all reported `value` at `step`.
fn seed_peers(study: &Study, count: usize, step: u64, value: f64) {
    for _ in 0..count {
        let trial = study.ask().unwrap();
        study.report(&trial, step, value);
        study.tell(trial.number(), TrialResult::Value(value)).unwrap();
    }
}

#[test]
fn test_nop_pruner_never_fires() {
    let study = Study::builder("nop", space_x())
        .direction(Direction::Minimize)
        .pruner(Box::new(NopPruner))
        .build()
        .unwrap();
    seed_peers(&study, 5, 1, 0.0);

    let trial = study.ask().unwrap();
    study.report(&trial, 1, 1e12);
    assert!(!study.should_prune(&trial));
}

#[test]
fn test_median_pruner_stops_the_laggard() {
    let study = Study::builder("median", space_x())
        .direction(Direction::Minimize)
        .pruner(Box::new(MedianPruner::new(5, 0, 1).unwrap()))
        .build()
        .unwrap();
    // Five peers at value 1.0 on step 3.
    seed_peers(&study, 5, 3, 1.0);

    let laggard = study.ask().unwrap();
    study.report(&laggard, 3, 100.0);
    assert!(study.should_prune(&laggard));
    study.tell(laggard.number(), TrialResult::Pruned).unwrap();

    let leader = study.ask().unwrap();
    study.report(&leader, 3, 0.5);
    assert!(!study.should_prune(&leader));
}

#[test]
fn test_median_pruner_on_a_maximizing_study() {
    let study = Study::builder("median-max", space_x())
        .direction(Direction::Maximize)
        .pruner(Box::new(MedianPruner::new(5, 0, 1).unwrap()))
        .build()
        .unwrap();
    seed_peers(&study, 5, 2, 10.0);

    // When maximizing, the small intermediate is the one to stop.
    let weak = study.ask().unwrap();
    study.report(&weak, 2, 1.0);
    assert!(study.should_prune(&weak));

    let strong = study.ask().unwrap();
    study.report(&strong, 2, 20.0);
    assert!(!study.should_prune(&strong));
}

#[test]
fn test_median_pruner_waits_for_startup_peers() {
    let study = Study::builder("median-startup", space_x())
        .direction(Direction::Minimize)
        .pruner(Box::new(MedianPruner::new(5, 0, 1).unwrap()))
        .build()
        .unwrap();
    seed_peers(&study, 4, 1, 1.0);

    // Four peers only: pruning stays off no matter how bad the report.
    let trial = study.ask().unwrap();
    study.report(&trial, 1, 1e9);
    assert!(!study.should_prune(&trial));
}

#[test]
fn test_percentile_pruner_uses_the_configured_quantile() {
    let study = Study::builder("percentile", space_x())
        .direction(Direction::Minimize)
        .pruner(Box::new(PercentilePruner::new(75.0, 4, 0, 1).unwrap()))
        .build()
        .unwrap();
    for value in [1.0, 2.0, 3.0, 4.0] {
        let trial = study.ask().unwrap();
        study.report(&trial, 1, value);
        study.tell(trial.number(), TrialResult::Value(value)).unwrap();
    }

    // 75th percentile of {1, 2, 3, 4} is 3: 3.5 goes, 2.5 stays.
    let over = study.ask().unwrap();
    study.report(&over, 1, 3.5);
    assert!(study.should_prune(&over));

    let under = study.ask().unwrap();
    study.report(&under, 1, 2.5);
    assert!(!study.should_prune(&under));
}

#[test]
fn test_successive_halving_prunes_outside_the_surviving_cohort() {
    let study = Study::builder("sha", space_x())
        .direction(Direction::Minimize)
        .pruner(Box::new(SuccessiveHalvingPruner::new(1, 2).unwrap()))
        .build()
        .unwrap();
    for value in [0.0, 0.5, 1.0] {
        let trial = study.ask().unwrap();
        study.report(&trial, 1, value);
        study.tell(trial.number(), TrialResult::Value(value)).unwrap();
    }

    // Cohort of four, eta = 2: two survive. 1.5 ranks last and is pruned.
    let fourth = study.ask().unwrap();
    study.report(&fourth, 1, 1.5);
    assert!(study.should_prune(&fourth));
    study.tell(fourth.number(), TrialResult::Pruned).unwrap();

    // A fifth matching the best value survives.
    let fifth = study.ask().unwrap();
    study.report(&fifth, 1, 0.0);
    assert!(!study.should_prune(&fifth));
}

#[test]
fn test_pruned_trials_never_become_best() {
    let study = Study::builder("pruned-best", space_x())
        .direction(Direction::Minimize)
        .pruner(Box::new(MedianPruner::new(1, 0, 1).unwrap()))
        .build()
        .unwrap();

    let good = study.ask().unwrap();
    study.tell(good.number(), TrialResult::Value(5.0)).unwrap();

    // This trial reported a spectacular intermediate but was pruned anyway;
    // it must not shadow the completed trial.
    let pruned = study.ask().unwrap();
    study.report(&pruned, 1, -100.0);
    study.tell(pruned.number(), TrialResult::Pruned).unwrap();

    assert_eq!(study.best_trial().unwrap().number(), good.number());
}
