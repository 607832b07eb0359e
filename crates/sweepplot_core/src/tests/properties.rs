//! Randomized checks over generated record sets
//!
//! Each test uses a fixed seed so failures are reproducible.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::conditions::{Condition, Conditions};
use crate::model::{Metrics, Params, Record, Value};

const METHODS: [&str; 5] = ["fixed", "tree", "mpdm", "eudm", "mcts"];
const SAMPLES: [i64; 5] = [2, 4, 8, 16, 32];

struct Generated {
    method: &'static str,
    samples_n: i64,
    rng_seed: i64,
    record: Record,
}

fn generate(rng: &mut SmallRng, count: usize) -> Vec<Generated> {
    (0..count)
        .map(|_| {
            let method = METHODS[rng.random_range(0..METHODS.len())];
            let samples_n = SAMPLES[rng.random_range(0..SAMPLES.len())];
            let rng_seed = rng.random_range(0..4096);
            let mut params = Params::new();
            params.insert("method", method);
            params.insert(format!("{method}.samples_n"), samples_n);
            params.insert("rng_seed", rng_seed);
            let fields: Vec<f64> = (0..Metrics::ALL_FIELDS)
                .map(|_| rng.random_range(0.0..100.0))
                .collect();
            Generated {
                method,
                samples_n,
                rng_seed,
                record: Record::new(params, Metrics::from_fields(&fields).unwrap()),
            }
        })
        .collect()
}

#[test]
fn test_filter_matches_brute_force() {
    let mut rng = SmallRng::seed_from_u64(7);
    let generated = generate(&mut rng, 500);
    let records: Vec<Record> = generated.iter().map(|g| g.record.clone()).collect();

    for _ in 0..50 {
        let method = METHODS[rng.random_range(0..METHODS.len())];
        let samples_n = SAMPLES[rng.random_range(0..SAMPLES.len())];
        let max_seed = rng.random_range(0..4096);
        let min_seed = rng.random_range(0..max_seed + 1);

        let conditions = Conditions::new()
            .with(Condition::equals("method", method))
            .with(Condition::equals("samples_n", samples_n))
            .with(Condition::at_most("rng_seed", max_seed as f64))
            .with(Condition::at_least("rng_seed", min_seed as f64));

        let expected: Vec<&Record> = generated
            .iter()
            .filter(|g| {
                g.method == method
                    && g.samples_n == samples_n
                    && g.rng_seed <= max_seed
                    && g.rng_seed >= min_seed
            })
            .map(|g| &g.record)
            .collect();

        assert_eq!(conditions.filter(&records), expected, "conditions: {conditions}");
    }
}

#[test]
fn test_empty_conditions_keep_everything_in_order() {
    let mut rng = SmallRng::seed_from_u64(11);
    let records: Vec<Record> = generate(&mut rng, 100)
        .into_iter()
        .map(|g| g.record)
        .collect();

    let kept = Conditions::new().filter(&records);
    assert_eq!(kept.len(), records.len());
    assert!(kept.iter().zip(&records).all(|(a, b)| std::ptr::eq(*a, b)));
}

#[test]
fn test_codec_round_trip() {
    const KEYS: [&str; 8] = [
        "method",
        "use_cfb",
        "rng_seed",
        "replan_dt",
        "mcts.samples_n",
        "mcts.bound_mode",
        "eudm.search_depth",
        "extra_ego_accdec_policies",
    ];
    let mut rng = SmallRng::seed_from_u64(42);

    for _ in 0..200 {
        let mut params = Params::new();
        for key in KEYS {
            if rng.random_bool(0.3) {
                continue;
            }
            let value = match rng.random_range(0..5) {
                0 => Value::from(format!("v_{}", rng.random_range(0..1000))),
                1 => Value::from(rng.random_range(-5000i64..5000)),
                2 => Value::from(f64::from(rng.random_range(-400i32..400)) / 8.0),
                3 => Value::from(rng.random_bool(0.5)),
                _ => {
                    let len = rng.random_range(2..6);
                    Value::List(
                        (0..len)
                            .map(|_| Value::from(rng.random_range(-3i64..4)))
                            .collect(),
                    )
                }
            };
            params.insert(key, value);
        }

        let token = params.encode().unwrap();
        let decoded = Params::parse(&token).unwrap();
        assert_eq!(decoded, params, "token: {token}");
    }
}
