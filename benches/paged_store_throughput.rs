/// Benchmark for local paged store throughput
///
/// Measures how fast the store commits remote pages (replace + append batches) and how
/// fast a pager-sized window can be read back, on the in-memory and the sled driver.

use reelsync::storage::{
    create_storage_driver, KvPagedStore, LocalPagedStore, PageWrite, PAGED_TREE,
};
use reelsync::{CacheMetadata, Category, Movie, PartitionCursor, PartitionKey, StorageType};
use std::time::Instant;
use tempfile::tempdir;

const PAGES: u32 = 200;
const PAGE_SIZE: u64 = 20;

fn page(page: u32) -> PageWrite {
    PageWrite {
        page,
        movies: (0..PAGE_SIZE)
            .map(|i| Movie {
                id: u64::from(page) * 1_000 + i,
                title: format!("Benchmark movie {} of page {}", i, page),
                overview: "A reasonably sized overview used to give rows a realistic payload."
                    .to_string(),
                poster_path: Some("/poster.jpg".to_string()),
                backdrop_path: Some("/backdrop.jpg".to_string()),
                release_date: Some("2024-01-01".to_string()),
                vote_average: 7.1,
                vote_count: 1_234,
                original_language: Some("en".to_string()),
            })
            .collect(),
        metadata: CacheMetadata::new(0, 3_600_000, 1),
    }
}

async fn run(label: &str, store: KvPagedStore) {
    println!("📊 Benchmark: {} driver", label);
    let key = PartitionKey::new(Category::Popular, "en");

    let write_start = Instant::now();
    store
        .replace_partition(&key, page(1), PartitionCursor::after_fetch(key.clone(), 1, PAGES, 0))
        .await
        .expect("replace failed");
    let mut cursor = PartitionCursor::after_fetch(key.clone(), 1, PAGES, 0);
    for n in 2..=PAGES {
        let next = PartitionCursor::after_fetch(key.clone(), n, PAGES, 0);
        store
            .append_page(&key, &cursor, page(n), next.clone())
            .await
            .expect("append failed")
            .expect("cursor moved during the benchmark");
        cursor = next;
    }
    let write_duration = write_start.elapsed();
    let rows = u64::from(PAGES) * PAGE_SIZE;
    println!("  Pages committed: {} ({} rows)", PAGES, rows);
    println!("  Time: {:?}", write_duration);
    println!(
        "  Throughput: {:.0} rows/sec",
        rows as f64 / write_duration.as_secs_f64()
    );

    let read_start = Instant::now();
    let iterations = 500;
    let mut last_position = None;
    for _ in 0..iterations {
        let window = store
            .read_page(&key, 20, last_position)
            .await
            .expect("read failed");
        last_position = window.last().map(|row| row.position);
    }
    let read_duration = read_start.elapsed();
    println!("  Window reads: {}", iterations);
    println!("  Time: {:?}", read_duration);
    println!(
        "  Throughput: {:.0} reads/sec",
        iterations as f64 / read_duration.as_secs_f64()
    );

    let refresh_start = Instant::now();
    store
        .replace_partition(&key, page(1), PartitionCursor::after_fetch(key.clone(), 1, PAGES, 0))
        .await
        .expect("replace failed");
    println!("  Refresh over {} rows: {:?}", rows, refresh_start.elapsed());
    println!();
}

fn main() {
    println!("=== Paged Store Throughput Benchmark ===\n");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime");

    let memory = create_storage_driver(StorageType::Memory, "").expect("memory driver");
    let store = KvPagedStore::new(memory.open_tree(PAGED_TREE).expect("tree"));
    runtime.block_on(run("memory", store));

    let temp_dir = tempdir().unwrap();
    let sled = create_storage_driver(StorageType::Sled, temp_dir.path().join("bench_db"))
        .expect("sled driver");
    let store = KvPagedStore::new(sled.open_tree(PAGED_TREE).expect("tree"));
    runtime.block_on(run("sled", store));
}
