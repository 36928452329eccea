use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skstack_rs::skstack::event::{decode_event, DecodeOptions};
use skstack_rs::skstack::token::{ipaddr, uint16};
use skstack_rs::EventCode;

const FE80: &str = "FE80:0000:0000:0000:021D:1290:1234:5678";

fn benchmark_tokens(c: &mut Criterion) {
    let addr = format!("{FE80} ");
    c.bench_function("token_ipaddr", |b| {
        b.iter(|| {
            let _ = black_box(ipaddr(black_box(addr.as_bytes())));
        })
    });
    c.bench_function("token_uint16", |b| {
        b.iter(|| {
            let _ = black_box(uint16(black_box(b"0E1A ")));
        })
    });
}

fn benchmark_events(c: &mut Criterion) {
    let options = DecodeOptions::default();
    let payload = "x".repeat(64);
    let erxudp = format!("ERXUDP {FE80} {FE80} 0E1A 0E1A 001D129012345678 1 0040 {payload}\r\n");
    c.bench_function("decode_erxudp", |b| {
        b.iter(|| {
            let _ = black_box(decode_event(EventCode::Erxudp, black_box(erxudp.as_bytes()), &options));
        })
    });

    let pairs: Vec<String> = (0x21..=0x3C).map(|raw| format!("{raw:02X} 40")).collect();
    let eedscan = format!("EEDSCAN\r\n{}\r\n", pairs.join(" "));
    c.bench_function("decode_eedscan", |b| {
        b.iter(|| {
            let _ = black_box(decode_event(EventCode::Eedscan, black_box(eedscan.as_bytes()), &options));
        })
    });
}

criterion_group!(benches, benchmark_tokens, benchmark_events);
criterion_main!(benches);
