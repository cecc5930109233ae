use hypertune::{
    Direction, ParameterRange, RandomSampler, SearchSpace, Study, TpeConfig, TpeSampler,
    TrialResult,
};

fn space_2d() -> SearchSpace {
    SearchSpace::new(vec![
        ParameterRange::float("x0", 0.0, 10.0).unwrap(),
        ParameterRange::float("x1", 0.0, 10.0).unwrap(),
    ])
    .unwrap()
}

fn median(values: &mut Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    values[values.len() / 2]
}

#[test]
fn test_tpe_shifts_toward_the_correlated_coordinate() {
    // The objective is strongly negatively correlated with x0 and ignores
    // x1 entirely. Well past startup, TPE's suggested x0 median must sit
    // above what uniform sampling produces.
    let n_startup = 10usize;
    let trials_total = 5 * n_startup + 20;

    let tpe_study = Study::builder("tpe", space_2d())
        .direction(Direction::Minimize)
        .sampler(Box::new(
            TpeSampler::new(TpeConfig {
                n_startup_trials: n_startup,
                seed: Some(1234),
                ..TpeConfig::default()
            })
            .unwrap(),
        ))
        .build()
        .unwrap();
    let random_study = Study::builder("random", space_2d())
        .direction(Direction::Minimize)
        .sampler(Box::new(RandomSampler::with_seed(1234)))
        .build()
        .unwrap();

    let mut tpe_x0 = Vec::new();
    let mut random_x0 = Vec::new();
    for study in [&tpe_study, &random_study] {
        for _ in 0..trials_total {
            let trial = study.ask().unwrap();
            let x0 = trial.param("x0").unwrap().as_float().unwrap();
            study.tell(trial.number(), TrialResult::Value(-x0)).unwrap();
        }
    }
    for trial in tpe_study.trials().iter().skip(n_startup) {
        tpe_x0.push(trial.param("x0").unwrap().as_float().unwrap());
    }
    for trial in random_study.trials().iter().skip(n_startup) {
        random_x0.push(trial.param("x0").unwrap().as_float().unwrap());
    }

    let tpe_median = median(&mut tpe_x0);
    let random_median = median(&mut random_x0);
    assert!(
        tpe_median > random_median,
        "tpe median {tpe_median} should exceed random median {random_median}"
    );
    // And it should clear the uniform expectation by a real margin.
    assert!(tpe_median > 5.5, "tpe median {tpe_median}");
}

#[test]
fn test_batch_ask_with_constant_liar_spreads_suggestions() {
    let study = Study::builder("batch", space_2d())
        .direction(Direction::Minimize)
        .sampler(Box::new(
            TpeSampler::new(TpeConfig {
                n_startup_trials: 5,
                seed: Some(7),
                ..TpeConfig::default()
            })
            .unwrap(),
        ))
        .build()
        .unwrap();

    // Past startup so the estimators are in play.
    for _ in 0..10 {
        let trial = study.ask().unwrap();
        let x0 = trial.param("x0").unwrap().as_float().unwrap();
        study
            .tell(trial.number(), TrialResult::Value((x0 - 5.0).powi(2)))
            .unwrap();
    }

    let batch = study.ask_batch(8).unwrap();
    assert_eq!(batch.len(), 8);
    let numbers: Vec<usize> = batch.iter().map(|t| t.number()).collect();
    assert_eq!(numbers, (10..18).collect::<Vec<_>>());

    // Constant liar: simultaneously asked trials must not all collapse
    // onto one point.
    let mut xs: Vec<f64> = batch
        .iter()
        .map(|t| t.param("x0").unwrap().as_float().unwrap())
        .collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let spread = xs.last().unwrap() - xs.first().unwrap();
    assert!(spread > 1e-3, "batch collapsed to one point: {xs:?}");

    for trial in batch {
        let x0 = trial.param("x0").unwrap().as_float().unwrap();
        study
            .tell(trial.number(), TrialResult::Value((x0 - 5.0).powi(2)))
            .unwrap();
    }
}

#[test]
fn test_tpe_honors_maximize() {
    let study = Study::builder("maximize", space_2d())
        .direction(Direction::Maximize)
        .sampler(Box::new(TpeSampler::with_seed(17)))
        .build()
        .unwrap();

    for _ in 0..60 {
        let trial = study.ask().unwrap();
        let x0 = trial.param("x0").unwrap().as_float().unwrap();
        study.tell(trial.number(), TrialResult::Value(x0)).unwrap();
    }
    // Maximizing x0 drags the best to the right edge.
    let best_x0 = study
        .best_trial()
        .unwrap()
        .param("x0")
        .unwrap()
        .as_float()
        .unwrap();
    assert!(best_x0 > 8.0, "best x0 = {best_x0}");
}
