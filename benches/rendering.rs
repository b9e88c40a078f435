use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rezi_core::ansi::Renderer;
use rezi_core::cell::Cell;
use rezi_core::color::{Color, ColorTier};
use rezi_core::framebuffer::Framebuffer;
use rezi_core::geometry::Size;
use rezi_core::style::TextStyle;

fn filled_frame(size: Size, text: &str, style: TextStyle) -> Framebuffer {
    let mut fb = Framebuffer::new(size);
    for y in 0..size.height {
        for x in 0..size.width {
            fb.set(x, y, Cell::new(text, style));
        }
    }
    fb
}

fn bench_diff_sparse_changes(c: &mut Criterion) {
    let mut group = c.benchmark_group("framebuffer_diff_sparse");
    for size in [Size::new(80, 24), Size::new(200, 60)] {
        let mut fb = filled_frame(size, "x", TextStyle::default());
        fb.present();
        for y in (0..size.height).step_by(7) {
            fb.set(size.width / 2, y, Cell::new("y", TextStyle::default()));
        }
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size.width, size.height)),
            &fb,
            |b, fb| {
                b.iter(|| black_box(fb.diff(black_box(false))));
            },
        );
    }
    group.finish();
}

fn bench_diff_full_redraw(c: &mut Criterion) {
    let mut group = c.benchmark_group("framebuffer_diff_full");
    for size in [Size::new(80, 24), Size::new(200, 60)] {
        let fb = filled_frame(size, "x", TextStyle::default());
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size.width, size.height)),
            &fb,
            |b, fb| {
                b.iter(|| black_box(fb.diff(black_box(true))));
            },
        );
    }
    group.finish();
}

fn bench_ansi_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("ansi_render");
    for size in [Size::new(80, 24), Size::new(200, 60)] {
        let style = TextStyle::new().bold(true).fg(Color::Rgb { r: 200, g: 100, b: 50 });
        let fb = filled_frame(size, "a", style);
        let changes = fb.diff(true).into_changes();
        let renderer = Renderer::new(ColorTier::C, false);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size.width, size.height)),
            &changes,
            |b, changes| {
                b.iter(|| black_box(renderer.render(black_box(changes), size.width)));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_diff_sparse_changes, bench_diff_full_redraw, bench_ansi_render);
criterion_main!(benches);
