use criterion::{Criterion, criterion_group, criterion_main};
use oxilog_codec::distance::{DistanceKind, SimilarityMeasure};
use oxilog_codec::qgram::qgram_ops;
use oxilog_codec::substitution::substitution_ops;
use oxilog_codec::ts2diff::{ts2diff_decode, ts2diff_encode};
use oxilog_core::bitstream::{BitReader, BitWriter};
use std::hint::black_box;

const LINE_A: &[u8] = b"Jun 11 09:46:15 combo sshd: authentication failure; \
    logname= uid=0 euid=0 tty=NODEVssh ruser= rhost=unknown.example.net  user=root";
const LINE_B: &[u8] = b"Jun 11 09:46:18 combo sshd(pam_unix)[6488]: authentication failure; \
    logname= uid=0 euid=0 tty=NODEVssh ruser= rhost=unknown.example.net  user=rst";

fn bench_aligners(c: &mut Criterion) {
    c.bench_function("qgram_ops", |b| {
        b.iter(|| qgram_ops(black_box(LINE_A), black_box(LINE_B), 3))
    });
    c.bench_function("substitution_ops", |b| {
        b.iter(|| substitution_ops(black_box(LINE_A), black_box(LINE_B)))
    });
}

fn bench_distances(c: &mut Criterion) {
    for kind in [DistanceKind::Cosine, DistanceKind::Minhash, DistanceKind::Qgram] {
        c.bench_function(&format!("distance_{kind}"), |b| {
            let mut measure = SimilarityMeasure::new(kind, 3);
            b.iter(|| measure.distance(black_box(LINE_A), black_box(LINE_B)));
        });
    }
}

fn bench_ts2diff(c: &mut Criterion) {
    let data: Vec<i32> = (0..4096).map(|i| (i % 97) * 3).collect();
    c.bench_function("ts2diff_roundtrip", |b| {
        b.iter(|| {
            let mut writer = BitWriter::new();
            ts2diff_encode(black_box(&data), &mut writer);
            let mut reader = BitReader::from_bytes(writer.into_bytes());
            ts2diff_decode(&mut reader).unwrap()
        })
    });
}

criterion_group!(benches, bench_aligners, bench_distances, bench_ts2diff);
criterion_main!(benches);
