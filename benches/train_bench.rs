use criterion::{black_box, criterion_group, criterion_main, Criterion};

use postagger::factory::TaggerConfiguration;
use postagger::sample::{MemorySampleStream, PosSample, SampleStream};
use postagger::train;
use postagger::{Algorithm, TrainingParameters};

const CORPUS: &[&str] = &[
    "The_DT dog_NN barks_VBZ at_IN the_DT mailman_NN ._.",
    "A_DT cat_NN sleeps_VBZ on_IN the_DT warm_JJ mat_NN ._.",
    "The_DT old_JJ cat_NN runs_VBZ away_RB ._.",
    "A_DT dog_NN sleeps_VBZ under_IN a_DT tree_NN ._.",
    "The_DT bird_NN sings_VBZ loudly_RB ._.",
    "A_DT small_JJ bird_NN runs_VBZ to_IN the_DT nest_NN ._.",
];

fn samples() -> MemorySampleStream {
    let samples: Vec<PosSample> = CORPUS
        .iter()
        .cycle()
        .take(120)
        .map(|line| line.parse().unwrap())
        .collect();
    MemorySampleStream::new(samples)
}

fn settings(algorithm: Algorithm) -> TrainingParameters {
    let mut params = TrainingParameters::create(10, 1);
    params.put("Algorithm", algorithm.name());
    if algorithm.is_sequence() {
        params.put("TrainerType", "Sequence");
        params.put("Seed", "1");
    }
    params
}

fn criterion_benchmark(c: &mut Criterion) {
    let config = TaggerConfiguration::create(None, None, None).unwrap();

    let mut group = c.benchmark_group("train");
    for algorithm in [
        Algorithm::Maxent,
        Algorithm::Perceptron,
        Algorithm::PerceptronSequence,
    ] {
        let settings = settings(algorithm);
        group.bench_function(algorithm.name(), |b| {
            let mut stream = samples();
            b.iter(|| {
                stream.reset().unwrap();
                train::train("en", &mut stream, black_box(&settings), &config).unwrap()
            })
        });
    }
    group.finish();

    let mut stream = samples();
    let model = train::train("en", &mut stream, &settings(Algorithm::PerceptronSequence), &config)
        .unwrap();
    let words = ["The", "small", "dog", "sleeps", "on", "the", "mat", "."];
    c.bench_function("tag", |b| {
        let tagger = model.tagger();
        b.iter(|| tagger.tag(black_box(&words)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
