//! # Escrow Ledger Benchmarks
//!
//! Hot paths of the multi-envelope ledger:
//!
//! | Path | What is measured |
//! |------|------------------|
//! | Sweep | Eligibility partition of one full sequence |
//! | Deposit + disburse | N deposits then one disbursement through the service |
//! | Many keys | Disbursing across independent (depositor, payee) pairs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use escrow_ledger::prelude::*;
use escrow_ledger::{Envelope, EnvelopeSequence};
use std::time::Duration;
use tokio::runtime::Runtime;

const START: Timestamp = 1_700_000_000;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

async fn open_ledger() -> EnvelopeLedger<InMemoryEnvelopeStore> {
    EnvelopeLedger::open(
        LedgerConfig::default(),
        Arc::new(InMemoryEnvelopeStore::new()),
        Arc::new(InMemoryPayouts::new()),
        Arc::new(ManualClock::new(START)),
    )
    .await
    .expect("ledger")
}

// ============================================================================
// Domain: eligibility sweep
// ============================================================================

fn bench_sequence_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope-sequence");

    let mut full = EnvelopeSequence::new();
    for i in 0..10u64 {
        // Alternate eligible and locked envelopes.
        full.append(Envelope::new(100, START + (i % 2) * 1_000));
    }

    group.bench_function("sweep_half_eligible", |b| {
        b.iter(|| {
            let mut sequence = full.clone();
            black_box(sequence.sweep(START).map(|sweep| sweep.amount))
        })
    });

    group.bench_function("eligible_amount_preview", |b| {
        b.iter(|| black_box(full.eligible_amount(START)))
    });

    group.finish();
}

// ============================================================================
// Service: deposit then disburse one key
// ============================================================================

fn bench_deposit_disburse(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope-ledger");
    group.measurement_time(Duration::from_secs(5));
    let rt = runtime();
    let (depositor, payee) = (Address::new([1u8; 20]), Address::new([2u8; 20]));

    for envelopes in [1usize, 5, 10] {
        group.throughput(Throughput::Elements(envelopes as u64));
        group.bench_with_input(
            BenchmarkId::new("deposit_then_disburse", envelopes),
            &envelopes,
            |b, &envelopes| {
                b.iter(|| {
                    rt.block_on(async {
                        let ledger = open_ledger().await;
                        for _ in 0..envelopes {
                            let _ = ledger.deposit(depositor, START, payee, 1_000).await;
                        }
                        black_box(ledger.disburse(depositor, payee).await)
                    })
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Service: many independent keys
// ============================================================================

fn bench_many_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope-ledger-keys");
    let rt = runtime();
    let depositor = Address::new([1u8; 20]);

    for keys in [10u8, 100] {
        group.throughput(Throughput::Elements(u64::from(keys)));
        group.bench_with_input(BenchmarkId::new("disburse_all", keys), &keys, |b, &keys| {
            b.iter(|| {
                rt.block_on(async {
                    let ledger = open_ledger().await;
                    for k in 0..keys {
                        let _ = ledger
                            .deposit(depositor, START, Address::new([k; 20]), 10)
                            .await;
                    }
                    let mut released: Amount = 0;
                    for k in 0..keys {
                        if let Ok(amount) = ledger.disburse(depositor, Address::new([k; 20])).await
                        {
                            released += amount;
                        }
                    }
                    black_box(released)
                })
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sequence_sweep,
    bench_deposit_disburse,
    bench_many_keys
);
criterion_main!(benches);
