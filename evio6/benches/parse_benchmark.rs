use criterion::{criterion_group, criterion_main, Criterion};

use evio6::EvioFile;

const MAGIC: u32 = 0xC0DA_0100;
const FILE_TYPE_ID: u32 = 0x4556_494F;

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn leaf_bank(tag: u16, values: &[u32]) -> Vec<u8> {
    let mut buf = Vec::new();
    push_u32(&mut buf, values.len() as u32 + 1);
    push_u32(&mut buf, ((tag as u32) << 16) | (0x1 << 8));
    for &v in values {
        push_u32(&mut buf, v);
    }
    buf
}

fn event(tag: u16) -> Vec<u8> {
    let child = leaf_bank(tag, &[1, 2, 3, 4, 5, 6, 7, 8]);
    let mut buf = Vec::new();
    push_u32(&mut buf, child.len() as u32 / 4 + 1);
    push_u32(&mut buf, ((tag as u32) << 16) | (0x10 << 8) | 1);
    buf.extend_from_slice(&child);
    buf
}

fn record(events: &[Vec<u8>], last: bool) -> Vec<u8> {
    let data_bytes: usize = events.iter().map(|e| e.len()).sum();
    let mut buf = Vec::new();
    push_u32(&mut buf, 14 + events.len() as u32 + data_bytes as u32 / 4);
    push_u32(&mut buf, 1);
    push_u32(&mut buf, 14);
    push_u32(&mut buf, events.len() as u32);
    push_u32(&mut buf, events.len() as u32 * 4);
    push_u32(&mut buf, 6 | if last { 1 << 9 } else { 0 });
    push_u32(&mut buf, 0);
    push_u32(&mut buf, MAGIC);
    push_u32(&mut buf, data_bytes as u32);
    push_u32(&mut buf, 0);
    for _ in 0..4 {
        push_u32(&mut buf, 0);
    }
    for ev in events {
        push_u32(&mut buf, ev.len() as u32);
    }
    for ev in events {
        buf.extend_from_slice(ev);
    }
    buf
}

/// 64 records x 128 events, little-endian.
fn synthetic_file() -> Vec<u8> {
    let mut buf = Vec::new();
    push_u32(&mut buf, FILE_TYPE_ID);
    push_u32(&mut buf, 1);
    push_u32(&mut buf, 14);
    push_u32(&mut buf, 64);
    push_u32(&mut buf, 0);
    push_u32(&mut buf, 6 | (1 << 28));
    push_u32(&mut buf, 0);
    push_u32(&mut buf, MAGIC);
    for _ in 0..6 {
        push_u32(&mut buf, 0);
    }

    for i in 0..64u32 {
        let events: Vec<Vec<u8>> = (0..128u16).map(event).collect();
        buf.extend_from_slice(&record(&events, i == 63));
    }
    buf
}

fn bench_open(c: &mut Criterion) {
    let data = synthetic_file();
    c.bench_function("evio_open", |b| {
        b.iter(|| {
            let _file = EvioFile::from_bytes(data.clone()).unwrap();
        })
    });
}

fn bench_walk_records(c: &mut Criterion) {
    let file = EvioFile::from_bytes(synthetic_file()).unwrap();
    c.bench_function("evio_walk_records", |b| {
        b.iter(|| {
            let mut events = 0usize;
            for record in file.records() {
                events += record.unwrap().event_count();
            }
            assert_eq!(events, 64 * 128);
        })
    });
}

fn bench_walk_banks(c: &mut Criterion) {
    let file = EvioFile::from_bytes(synthetic_file()).unwrap();
    c.bench_function("evio_walk_banks", |b| {
        b.iter(|| {
            let mut leaves = 0usize;
            for record in file.records() {
                let record = record.unwrap();
                for event in record.events().unwrap() {
                    let root = event.root().unwrap();
                    for child in root.children() {
                        let child = child.unwrap();
                        leaves += child.typed_data().unwrap().element_count();
                    }
                }
            }
            assert_eq!(leaves, 64 * 128 * 8);
        })
    });
}

criterion_group!(benches, bench_open, bench_walk_records, bench_walk_banks);
criterion_main!(benches);
