use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use emu_core::cpu_6502::{ArrayMemory, Cpu6502};

/// Tight loop mixing loads, stores, index math and a taken branch.
const LOOP: &[u8] = &[
    0xA9, 0x42, // LDA #$42
    0x8D, 0x00, 0x02, // STA $0200
    0xA2, 0x10, // LDX #$10
    0xBD, 0xF8, 0x02, // LDA $02F8,X (crosses a page)
    0xE8, // INX
    0xC8, // INY
    0x69, 0x01, // ADC #$01
    0xD0, 0xF0, // BNE back to LDA #$42
    0x4C, 0x00, 0x80, // JMP $8000
];

fn looping_cpu() -> Cpu6502<ArrayMemory> {
    let mut mem = ArrayMemory::new();
    mem.load_program(0x8000, LOOP);
    let mut cpu = Cpu6502::new(mem);
    let _ = cpu.reset();
    cpu
}

fn bench_cpu_step(c: &mut Criterion) {
    let mut cpu = looping_cpu();
    c.bench_function("cpu_6502_single_instruction", |b| {
        b.iter(|| {
            let _ = cpu.step();
            black_box(cpu.a);
        });
    });
}

fn bench_cpu_multiple_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_6502_multiple_steps");

    for step_count in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(step_count),
            step_count,
            |b, &count| {
                let mut cpu = looping_cpu();
                b.iter(|| {
                    for _ in 0..count {
                        let _ = cpu.step();
                    }
                    black_box(cpu.cycles);
                });
            },
        );
    }

    group.finish();
}

fn bench_cpu_flat_cycles(c: &mut Criterion) {
    // one NTSC frame worth of CPU clocks
    c.bench_function("cpu_6502_step_one_cycle_frame", |b| {
        let mut cpu = looping_cpu();
        b.iter(|| {
            for _ in 0..29_781 {
                let _ = cpu.step_one_cycle();
            }
            black_box(cpu.cycles);
        });
    });
}

fn bench_cpu_reset(c: &mut Criterion) {
    c.bench_function("cpu_6502_reset", |b| {
        let mut cpu = looping_cpu();
        b.iter(|| {
            let _ = cpu.reset();
            black_box(cpu.pc);
        });
    });
}

criterion_group!(
    benches,
    bench_cpu_step,
    bench_cpu_multiple_steps,
    bench_cpu_flat_cycles,
    bench_cpu_reset
);
criterion_main!(benches);
