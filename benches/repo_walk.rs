use criterion::{black_box, criterion_group, criterion_main, Criterion};
use storyloom::repo::RepoSandbox;
use tempfile::TempDir;

fn synthetic_repo(file_count: usize) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for i in 0..file_count {
        let path = dir
            .path()
            .join(format!("src/feature_{:03}/file_{:05}.rs", i % 120, i));
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, format!("pub fn f{i}() -> usize {{ {i} }}\n")).expect("write");
    }
    // Ignored and hidden trees the walk has to skip.
    for skipped in ["node_modules/pkg", ".git/objects", "target/debug"] {
        let path = dir.path().join(skipped);
        std::fs::create_dir_all(&path).expect("mkdir");
        for i in 0..200 {
            std::fs::write(path.join(format!("blob_{i}")), "x").expect("write");
        }
    }
    let large = "fn body() {}\n".repeat(20_000);
    std::fs::write(dir.path().join("src/large.rs"), large).expect("write");
    dir
}

fn bench_list_paths(c: &mut Criterion) {
    let repo = synthetic_repo(5_000);
    let sandbox = RepoSandbox::open(repo.path()).expect("sandbox");

    c.bench_function("list_paths_root", |b| {
        b.iter(|| black_box(sandbox.list_paths(black_box(""))))
    });
    c.bench_function("list_paths_subdir", |b| {
        b.iter(|| black_box(sandbox.list_paths(black_box("src/feature_040"))))
    });
}

fn bench_read_file(c: &mut Criterion) {
    let repo = synthetic_repo(10);
    let sandbox = RepoSandbox::open(repo.path()).expect("sandbox");

    c.bench_function("read_file_truncated", |b| {
        b.iter(|| black_box(sandbox.read_file(black_box("src/large.rs"))))
    });
    c.bench_function("read_file_escape_rejected", |b| {
        b.iter(|| black_box(sandbox.read_file(black_box("../../etc/passwd"))))
    });
}

criterion_group!(repo_walk, bench_list_paths, bench_read_file);
criterion_main!(repo_walk);
