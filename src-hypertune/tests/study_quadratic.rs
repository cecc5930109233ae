use hypertune::{
    create_study, Direction, ParameterRange, SearchSpace, Study, TpeSampler, TrialResult,
};

fn space_x() -> SearchSpace {
    SearchSpace::new(vec![ParameterRange::float("x", 0.0, 10.0).unwrap()]).unwrap()
}

#[test]
fn test_tpe_quadratic_1d() {
    // Minimize (x - 3)^2 over [0, 10] with 100 sequential ask/tell rounds.
    let study = Study::builder("quadratic", space_x())
        .direction(Direction::Minimize)
        .sampler(Box::new(TpeSampler::with_seed(42)))
        .build()
        .unwrap();

    for _ in 0..100 {
        let trial = study.ask().unwrap();
        let x = trial.param("x").unwrap().as_float().unwrap();
        assert!((0.0..=10.0).contains(&x), "suggestion out of range: {x}");
        study
            .tell(trial.number(), TrialResult::Value((x - 3.0).powi(2)))
            .unwrap();
    }

    let best = study.best_trial().unwrap();
    let best_x = best.param("x").unwrap().as_float().unwrap();
    assert!(best.value().unwrap() < 0.5, "best = {:?}", best.value());
    assert!((best_x - 3.0).abs() < 1.0, "best x = {best_x}");
}

#[test]
fn test_default_sampler_study_converges_reasonably() {
    // The default study (TPE, unseeded) should still beat a coin toss by a
    // wide margin on a smooth bowl.
    let study = create_study("bowl", space_x(), Direction::Minimize).unwrap();
    for _ in 0..80 {
        let trial = study.ask().unwrap();
        let x = trial.param("x").unwrap().as_float().unwrap();
        study
            .tell(trial.number(), TrialResult::Value((x - 7.0).powi(2)))
            .unwrap();
    }
    assert!(study.best_trial().unwrap().value().unwrap() < 2.0);
}

#[test]
fn test_trial_numbers_stay_dense_across_outcomes() {
    let study = create_study("dense", space_x(), Direction::Minimize).unwrap();
    for i in 0..30 {
        let trial = study.ask().unwrap();
        let result = match i % 3 {
            0 => TrialResult::Value(i as f64),
            1 => TrialResult::Fail,
            _ => TrialResult::Pruned,
        };
        study.tell(trial.number(), result).unwrap();
    }
    let trials = study.trials();
    assert_eq!(trials.len(), 30);
    for (i, trial) in trials.iter().enumerate() {
        assert_eq!(trial.number(), i);
        assert!(trial.state().is_terminal());
    }
}
