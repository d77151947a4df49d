use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use skylark_proto::Message;

fn parsing_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(1));

    group.bench_function("privmsg", |b| {
        b.iter(|| {
            black_box(":nick!user@host PRIVMSG #channel :Hello, world!".parse::<Message>())
        })
    });

    group.bench_function("numeric", |b| {
        b.iter(|| black_box(":irc.example.com 376 sky :End of /MOTD command.".parse::<Message>()))
    });

    group.bench_function("serialize", |b| {
        let msg = Message::privmsg("#channel", "Hello, world!");
        b.iter(|| black_box(msg.to_string()))
    });

    group.finish();
}

criterion_group!(benches, parsing_benchmark);
criterion_main!(benches);
