use bstr::BString;

use gfagraph::gfa::GFA;
use gfagraph::optfields::{OptFields, OptionalFields};
use gfagraph::parser::GFAParser;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

/// Build a chain graph in memory: segments with LN/RC tags, one
/// link per join plus a tagged back-link every third segment.
fn synth_lines(segments: usize) -> Vec<Vec<u8>> {
    let mut lines: Vec<Vec<u8>> = Vec::with_capacity(segments * 2 + 2);
    lines.push(b"H\tVN:Z:1.0".to_vec());
    for i in 0..segments {
        let seq = match i % 4 {
            0 => "ACGTACGTAC",
            1 => "TTGGCCAATT",
            2 => "GGGCCCAAAT",
            _ => "ACACACACAC",
        };
        lines.push(
            format!("S\ts{}\t{}\tLN:i:10\tRC:i:{}", i, seq, 10 + i % 90)
                .into_bytes(),
        );
    }
    for i in 1..segments {
        lines.push(format!("L\ts{}\t+\ts{}\t+\t2M", i - 1, i).into_bytes());
        if i % 3 == 0 {
            lines.push(
                format!("L\ts{}\t-\ts{}\t+\t2M\tRC:i:5", i - 1, i).into_bytes(),
            );
        }
    }
    lines
}

fn parse_lines<T: OptFields>(input: &[Vec<u8>]) -> GFA<BString, T> {
    let parser: GFAParser<BString, T> = GFAParser::new();

    let mut gfa: GFA<BString, T> = GFA::new();

    for line in input.iter() {
        if let Ok(parsed) = parser.parse_gfa_line(line[..].as_ref()) {
            gfa.insert_line(parsed);
        }
    }

    gfa
}

fn parse_lines_noopt(input: &[Vec<u8>]) -> GFA<BString, ()> {
    parse_lines(input)
}

fn parse_lines_withopt(input: &[Vec<u8>]) -> GFA<BString, OptionalFields> {
    parse_lines(input)
}

macro_rules! bench_gfa {
    ($parser:ident, $id:literal, $name:ident, $segments:literal) => {
        fn $name(c: &mut Criterion) {
            let lines: Vec<Vec<u8>> = synth_lines($segments);
            c.bench_with_input(
                BenchmarkId::new($id, $segments),
                &lines,
                |b, l| {
                    b.iter(|| $parser(&l));
                },
            );
        }
    };
}

macro_rules! bench_gfa_noopt {
    ($name:ident, $segments:literal) => {
        bench_gfa!(parse_lines_noopt, "excluding_optionals", $name, $segments);
    };
}

macro_rules! bench_gfa_withopt {
    ($name:ident, $segments:literal) => {
        bench_gfa!(
            parse_lines_withopt,
            "including_optionals",
            $name,
            $segments
        );
    };
}

bench_gfa_noopt!(small_noopt, 1000);
bench_gfa_noopt!(large_noopt, 20000);

bench_gfa_withopt!(small_withopt, 1000);
bench_gfa_withopt!(large_withopt, 20000);

criterion_group!(
    name = no_opt_benches;
    config = Criterion::default().sample_size(25);
    targets = small_noopt, large_noopt
);

criterion_group!(
    name = with_opt_benches;
    config = Criterion::default().sample_size(25);
    targets = small_withopt, large_withopt
);

criterion_main!(no_opt_benches, with_opt_benches);
