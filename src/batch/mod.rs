//! Batch pipeline: discover MP3 files, run each one through
//! read → resolve → normalize → write on a bounded worker pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::lyrics::{self, CleanRules, Resolution, Resolver};
use crate::tag::{self, WriteOutcome};

/// Terminal state of one file's pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written { source: &'static str },
    SkippedExisting,
    NotFound,
    Failed { reason: String },
}

impl Outcome {
    /// Short label for the per-file report.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Written { .. } => "written",
            Outcome::SkippedExisting => "skipped",
            Outcome::NotFound => "no lyrics",
            Outcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: Outcome,
}

/// Aggregate counts over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub written: usize,
    pub skipped: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Written { .. } => self.written += 1,
            Outcome::SkippedExisting => self.skipped += 1,
            Outcome::NotFound => self.not_found += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.written + self.skipped + self.not_found + self.failed
    }
}

/// Runs the per-file pipeline over everything under a root path.
#[derive(Clone)]
pub struct Processor {
    resolver: Arc<Resolver>,
    rules: Arc<CleanRules>,
    overwrite: bool,
    workers: usize,
}

impl Processor {
    pub fn new(resolver: Resolver, rules: CleanRules, overwrite: bool, workers: usize) -> Self {
        Self {
            resolver: Arc::new(resolver),
            rules: Arc::new(rules),
            overwrite,
            workers: workers.max(1),
        }
    }

    /// Process every MP3 under `root`. Individual failures are recorded per
    /// file, never propagated; the returned reports cover every discovered
    /// file regardless of worker count.
    pub async fn run(&self, root: &Path) -> anyhow::Result<(Vec<FileReport>, Summary)> {
        let files = discover(root)?;
        info!(files = files.len(), workers = self.workers, "queueing files");

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(files.len());
        for path in files {
            let semaphore = semaphore.clone();
            let processor = self.clone();
            let task_path = path.clone();
            handles.push((
                path,
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                    processor.process_file(&task_path).await
                }),
            ));
        }

        let mut reports = Vec::with_capacity(handles.len());
        let mut summary = Summary::default();
        for (path, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => Outcome::Failed {
                    reason: format!("worker panicked: {err}"),
                },
            };
            summary.record(&outcome);
            reports.push(FileReport { path, outcome });
        }
        Ok((reports, summary))
    }

    /// Read → resolve → normalize → write for one file. Every failure is
    /// converted into an [`Outcome`] here; nothing escapes to the batch.
    async fn process_file(&self, path: &Path) -> Outcome {
        let track = match tag::read_track(path) {
            Ok(track) => track,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping file");
                return Outcome::Failed {
                    reason: err.to_string(),
                };
            }
        };

        if !self.overwrite && track.has_lyrics {
            info!(path = %path.display(), "existing lyrics; skipping");
            return Outcome::SkippedExisting;
        }

        let meta = &track.metadata;
        debug!(
            path = %path.display(),
            title = %meta.title,
            artist = %meta.artist,
            album = %meta.album,
            album_artist = %meta.album_artist,
            "read tag metadata"
        );
        let resolution = match self.resolver.resolve(&meta.title, &meta.artist).await {
            Ok(resolution) => resolution,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "lookup failed");
                return Outcome::Failed {
                    reason: err.to_string(),
                };
            }
        };
        let (raw, source) = match resolution {
            Resolution::Found { text, source } => (text, source),
            Resolution::NotFound => {
                info!(path = %path.display(), title = %meta.title, artist = %meta.artist, "no lyrics found");
                return Outcome::NotFound;
            }
        };

        let text = lyrics::normalize(&raw, &self.rules);
        if text.is_empty() {
            info!(path = %path.display(), source, "lyrics were all boilerplate");
            return Outcome::NotFound;
        }

        match tag::write_lyrics(path, &text, self.overwrite) {
            Ok(WriteOutcome::Written) => {
                info!(path = %path.display(), source, title = %meta.title, "lyrics written");
                Outcome::Written { source }
            }
            Ok(WriteOutcome::SkippedExisting) => Outcome::SkippedExisting,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "write failed");
                Outcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// Enumerate the MP3 files under `root`, which may itself be a single file.
pub fn discover(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if root.is_file() {
        anyhow::ensure!(is_mp3(root), "not an MP3 file: {}", root.display());
        return Ok(vec![root.to_path_buf()]);
    }
    anyhow::ensure!(root.is_dir(), "path does not exist: {}", root.display());

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_mp3(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            // An unreadable subtree costs its own files, not the run.
            Err(err) => warn!(error = %err, "skipping unreadable directory entry"),
        }
    }
    Ok(files)
}

fn is_mp3(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::{LookupError, LyricsSource};
    use async_trait::async_trait;
    use id3::frame::Lyrics;
    use id3::{Tag, TagLike, Version};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        text: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LyricsSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn lookup(&self, _: &str, _: &str) -> Result<Option<String>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.map(str::to_string))
        }
    }

    fn processor_with(
        text: Option<&'static str>,
        overwrite: bool,
        workers: usize,
    ) -> (Processor, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Resolver::from_sources(vec![Box::new(FixedSource {
            text,
            calls: calls.clone(),
        })]);
        let processor = Processor::new(resolver, CleanRules::default(), overwrite, workers);
        (processor, calls)
    }

    fn write_track(dir: &Path, name: &str, lyrics: Option<&str>) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"\xff\xfbAUDIO").unwrap();
        let mut tag = Tag::new();
        tag.set_title("Imagine");
        tag.set_artist("John Lennon");
        if let Some(text) = lyrics {
            tag.add_frame(Lyrics {
                lang: "eng".to_string(),
                description: String::new(),
                text: text.to_string(),
            });
        }
        tag.write_to_path(&path, Version::Id3v24).unwrap();
        path
    }

    fn outcome_for<'a>(reports: &'a [FileReport], path: &Path) -> &'a Outcome {
        &reports
            .iter()
            .find(|report| report.path == path)
            .expect("report for path")
            .outcome
    }

    #[test]
    fn discovers_mp3s_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        fs::write(dir.path().join("a.mp3"), b"x").unwrap();
        fs::write(dir.path().join("nested/b.MP3"), b"x").unwrap();
        fs::write(dir.path().join("nested/deeper/c.Mp3"), b"x").unwrap();
        fs::write(dir.path().join("nested/skip.flac"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = discover(dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|path| is_mp3(path)));
    }

    #[test]
    fn single_file_root_is_processed_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        fs::write(&path, b"x").unwrap();

        assert_eq!(discover(&path).unwrap(), vec![path]);
    }

    #[test]
    fn non_mp3_file_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.flac");
        fs::write(&path, b"x").unwrap();

        assert!(discover(&path).is_err());
        assert!(discover(&dir.path().join("missing")).is_err());
    }

    #[tokio::test]
    async fn batch_reports_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let good_a = write_track(dir.path(), "a.mp3", None);
        let good_b = write_track(dir.path(), "b.mp3", None);
        let corrupt = dir.path().join("c.mp3");
        fs::write(&corrupt, b"not a tag container").unwrap();

        let (processor, _) = processor_with(Some("Imagine all the people"), false, 2);
        let (reports, summary) = processor.run(dir.path()).await.unwrap();

        assert_eq!(reports.len(), 3);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.written, 2);
        assert_eq!(summary.failed, 1);
        assert!(matches!(
            outcome_for(&reports, &good_a),
            Outcome::Written { source: "fixed" }
        ));
        assert!(matches!(
            outcome_for(&reports, &good_b),
            Outcome::Written { source: "fixed" }
        ));
        assert!(matches!(
            outcome_for(&reports, &corrupt),
            Outcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn worker_count_does_not_change_report_count() {
        for workers in [1, 8] {
            let dir = tempfile::tempdir().unwrap();
            for i in 0..5 {
                write_track(dir.path(), &format!("{i}.mp3"), None);
            }

            let (processor, _) = processor_with(Some("Imagine all the people"), false, workers);
            let (reports, summary) = processor.run(dir.path()).await.unwrap();
            assert_eq!(reports.len(), 5);
            assert_eq!(summary.written, 5);
        }
    }

    #[tokio::test]
    async fn existing_lyrics_skip_the_lookup_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_track(dir.path(), "a.mp3", Some("Some lyrics"));
        let before = fs::read(&path).unwrap();

        let (processor, calls) = processor_with(Some("New lyrics"), false, 1);
        let (reports, summary) = processor.run(dir.path()).await.unwrap();

        assert!(matches!(
            outcome_for(&reports, &path),
            Outcome::SkippedExisting
        ));
        assert_eq!(summary.skipped, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn overwrite_replaces_existing_lyrics() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_track(dir.path(), "a.mp3", Some("Old lyrics"));

        let (processor, calls) = processor_with(Some("New lyrics"), true, 1);
        let (reports, _) = processor.run(dir.path()).await.unwrap();

        assert!(matches!(
            outcome_for(&reports, &path),
            Outcome::Written { .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(
            tag.lyrics().next().map(|frame| frame.text.as_str()),
            Some("New lyrics")
        );
    }

    #[tokio::test]
    async fn not_found_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_track(dir.path(), "a.mp3", None);
        let before = fs::read(&path).unwrap();

        let (processor, _) = processor_with(None, false, 1);
        let (reports, summary) = processor.run(dir.path()).await.unwrap();

        assert!(matches!(outcome_for(&reports, &path), Outcome::NotFound));
        assert_eq!(summary.not_found, 1);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn boilerplate_only_lyrics_count_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_track(dir.path(), "a.mp3", None);

        let (processor, _) = processor_with(Some("5 Contributors\n[Verse 1]"), false, 1);
        let (reports, _) = processor.run(dir.path()).await.unwrap();

        assert!(matches!(outcome_for(&reports, &path), Outcome::NotFound));
        let tag = Tag::read_from_path(&path).unwrap();
        assert!(tag.lyrics().next().is_none());
    }

    #[tokio::test]
    async fn normalizer_runs_before_the_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_track(dir.path(), "a.mp3", None);

        let (processor, _) = processor_with(Some("eng||\nImagine all the people"), false, 1);
        processor.run(dir.path()).await.unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(
            tag.lyrics().next().map(|frame| frame.text.as_str()),
            Some("Imagine all the people")
        );
    }
}
