use lexicon_rater::domain::{RatedWord, RatingLevel, Word};
use lexicon_rater::sink::{self, OutputMode, ResultSink, SinkError};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

fn records(task: usize, count: usize) -> Vec<RatedWord> {
    (0..count)
        .map(|i| {
            RatedWord::new(
                Word::new(format!("task{task}-word{i}")).unwrap(),
                RatingLevel::ALL[i % RatingLevel::ALL.len()],
            )
        })
        .collect()
}

async fn write_concurrently(sink: Arc<dyn ResultSink>, tasks: usize, per_task: usize) {
    let handles: Vec<_> = (0..tasks)
        .map(|task| {
            let sink = sink.clone();
            tokio::spawn(async move {
                for chunk in records(task, per_task).chunks(7) {
                    sink.write(chunk).await.unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_flat_writes_never_interleave() {
    let dir = TempDir::new().unwrap();
    let sink = sink::open(OutputMode::Flat, dir.path()).await.unwrap();

    write_concurrently(sink.clone(), 8, 40).await;
    sink.close().await.unwrap();

    let content = std::fs::read_to_string(dir.path().join("all_rated_words.txt")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 320);

    let valid_suffixes = ["(Rating: 0)", "(Rating: 25)", "(Rating: 50)", "(Rating: 75)", "(Rating: 100)"];
    for line in &lines {
        assert!(line.starts_with("task"), "malformed line {line:?}");
        assert!(
            valid_suffixes.iter().any(|suffix| line.ends_with(suffix)),
            "malformed line {line:?}"
        );
        assert_eq!(line.matches("(Rating:").count(), 1, "interleaved line {line:?}");
    }
    let unique: HashSet<&str> = lines.iter().copied().collect();
    assert_eq!(unique.len(), 320);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bucketed_writes_land_in_their_buckets() {
    let dir = TempDir::new().unwrap();
    let sink = sink::open(OutputMode::Bucketed, dir.path()).await.unwrap();

    write_concurrently(sink.clone(), 5, 25).await;
    sink.close().await.unwrap();

    let mut total = 0;
    for level in RatingLevel::ALL {
        let path = dir.path().join(format!("words_{}.txt", level.bucket_key()));
        let content = std::fs::read_to_string(path).unwrap();
        for line in content.lines() {
            let index: usize = line
                .rsplit("word")
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap();
            assert_eq!(RatingLevel::ALL[index % 5], level, "{line} in wrong bucket");
            total += 1;
        }
    }
    assert_eq!(total, 125);
}

#[tokio::test]
async fn records_are_on_disk_before_close() {
    let dir = TempDir::new().unwrap();
    let sink = sink::open(OutputMode::Flat, dir.path()).await.unwrap();

    sink.write(&records(0, 3)).await.unwrap();

    // Visible to an independent reader while the sink is still open.
    let content = std::fs::read_to_string(dir.path().join("all_rated_words.txt")).unwrap();
    assert_eq!(content.lines().count(), 3);

    sink.close().await.unwrap();
    assert!(matches!(
        sink.write(&records(1, 1)).await,
        Err(SinkError::Closed)
    ));
}
