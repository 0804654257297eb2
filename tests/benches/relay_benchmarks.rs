//! # Entity Relay Benchmarks
//!
//! Hot paths of the replication layer:
//!
//! | Path | Runs per |
//! |------|----------|
//! | Envelope encode | local `set()` while connected |
//! | Envelope decode | inbound message |
//! | Fragment reassembly | inbound fragment |
//! | In-memory offer + poll | message on the test transport |

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use er_01_component_registry::{ComponentDescriptor, ComponentRegistry};
use er_02_envelope_codec::EnvelopeCodec;
use er_03_transport_bridge::FragmentAssembler;
use shared_bus::{
    Fragment, InMemoryTransport, InMemoryTransportConfig, Publication, Subscription, Transport,
    BEGIN_FRAG_FLAG, END_FRAG_FLAG,
};
use shared_types::{ComponentId, ComponentValue, EntityId, OriginId, UpdateEnvelope, ValueType};

fn registry() -> Arc<ComponentRegistry> {
    let registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("speed", 1, ValueType::Float));
    registry.register(ComponentDescriptor::new("name", 2, ValueType::Text));
    Arc::new(registry)
}

// ============================================================================
// ER-02: Envelope Codec
// ============================================================================

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("er-02-envelope-codec");
    let writer = EnvelopeCodec::new(OriginId(1), registry());
    let reader = EnvelopeCodec::new(OriginId(2), registry());

    let float = UpdateEnvelope::set(
        OriginId(1),
        EntityId(42),
        ComponentId(1),
        ComponentValue::Float(3.5),
    );
    let text = UpdateEnvelope::set(
        OriginId(1),
        EntityId(42),
        ComponentId(2),
        ComponentValue::Text("x".repeat(256)),
    );

    group.bench_function("encode_float", |b| {
        let mut buf = Vec::with_capacity(1024);
        b.iter(|| {
            buf.clear();
            writer.encode_into(black_box(&float), &mut buf).is_ok()
        })
    });

    for (name, envelope) in [("float", &float), ("text_256", &text)] {
        let Ok(bytes) = writer.encode(envelope) else {
            continue;
        };
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("decode", name), &bytes, |b, bytes| {
            b.iter(|| reader.decode(black_box(bytes)))
        });
    }

    group.bench_function("decode_self_origin", |b| {
        let Ok(bytes) = writer.encode(&float) else {
            return;
        };
        b.iter(|| writer.decode(black_box(&bytes)))
    });

    group.finish();
}

// ============================================================================
// ER-03: Fragment Reassembly
// ============================================================================

fn bench_assembler(c: &mut Criterion) {
    let mut group = c.benchmark_group("er-03-fragment-assembler");

    for parts in [1usize, 4, 16] {
        let fragments: Vec<Fragment> = (0..parts)
            .map(|i| {
                let mut flags = 0;
                if i == 0 {
                    flags |= BEGIN_FRAG_FLAG;
                }
                if i == parts - 1 {
                    flags |= END_FRAG_FLAG;
                }
                Fragment::new(1, flags, vec![0xAB; 256])
            })
            .collect();

        group.throughput(Throughput::Elements(parts as u64));
        group.bench_with_input(
            BenchmarkId::new("reassemble", parts),
            &fragments,
            |b, fragments| {
                let mut assembler = FragmentAssembler::new();
                b.iter(|| {
                    let mut complete = None;
                    for fragment in fragments {
                        complete = assembler.on_fragment(fragment.clone());
                    }
                    black_box(complete)
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// SHARED-BUS: In-Memory Transport
// ============================================================================

fn bench_in_memory_transport(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-bus-in-memory");

    let transport = InMemoryTransport::with_config(InMemoryTransportConfig {
        term_buffer_length: 1 << 20,
        mtu: 1408,
    });
    let (Ok(mut publication), Ok(mut subscription)) = (
        transport.add_publication("mem://bench", 1),
        transport.add_subscription("mem://bench", 1),
    ) else {
        return;
    };
    let message = vec![0u8; 128];

    group.bench_function("offer_poll_128b", |b| {
        b.iter(|| {
            let outcome = publication.offer(black_box(&message));
            let polled = subscription.poll(10);
            black_box((outcome, polled))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_codec,
    bench_assembler,
    bench_in_memory_transport
);
criterion_main!(benches);
