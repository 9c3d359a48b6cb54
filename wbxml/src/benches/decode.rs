use crate::sync_response;
use activesync_wbxml::{encode, Config, Decoder};
use criterion::{criterion_group, Criterion};

fn bench_decode(c: &mut Criterion) {
    for items in [1, 10, 100] {
        for body_len in [64, 4096] {
            let encoded = encode(&sync_response(items, body_len)).unwrap();
            for trace in [false, true] {
                let mut decoder = Decoder::new(Config {
                    trace,
                    ..Config::default()
                });
                c.bench_function(
                    &format!(
                        "{}/items={items} body={body_len} trace={trace}",
                        module_path!()
                    ),
                    |b| b.iter(|| decoder.decode_xml(encoded.clone()).unwrap()),
                );
            }
        }
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_decode
}
