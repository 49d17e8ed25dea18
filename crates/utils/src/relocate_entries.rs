use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use glob::Pattern;
use shadowpack_core::{
    ArchiveEntry, EntrySink, EntrySource, RelocatedPath, RelocationPlan, RelocationReport,
};
use tokio::task::JoinSet;

/// Compile ignore globs; an invalid pattern is an error rather than silently skipped
pub fn compile_ignore_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).with_context(|| format!("Invalid ignore pattern: {pattern}"))
        })
        .collect()
}

/// Relocate every entry of `source` into `sink`.
///
/// Entries are relocated in parallel on the blocking pool, all sharing one
/// read-only plan, and written in source order. When two entries end up at the
/// same path the first one is kept.
pub async fn relocate_entries(
    plan: Arc<RelocationPlan>,
    source: &mut dyn EntrySource,
    sink: &mut dyn EntrySink,
    ignore: &[Pattern],
) -> Result<RelocationReport> {
    let mut report = RelocationReport::default();
    let mut tasks = JoinSet::new();
    while let Some(entry) = source.next_entry().await? {
        let index = report.entries;
        report.entries += 1;
        if ignore.iter().any(|pattern| pattern.matches(&entry.path)) {
            tracing::debug!(path = %entry.path, "ignored entry");
            report.ignored += 1;
            continue;
        }
        let plan = Arc::clone(&plan);
        tasks.spawn_blocking(move || {
            let original_path = entry.path.clone();
            let original_content = entry.content.clone();
            let relocated = plan.try_apply(entry)?;
            let rewritten = relocated.content != original_content;
            Ok::<_, shadowpack_core::RelocateError>((index, original_path, relocated, rewritten))
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.context("Relocation task panicked")??);
    }
    results.sort_by_key(|(index, ..)| *index);

    let mut written: HashSet<String> = HashSet::with_capacity(results.len());
    for (_, original_path, relocated, rewritten) in results {
        if !written.insert(relocated.path.clone()) {
            tracing::warn!(
                path = %relocated.path,
                from = %original_path,
                "duplicate entry skipped"
            );
            report.duplicates.push(relocated.path);
            continue;
        }
        if rewritten {
            report.rewritten += 1;
        }
        if relocated.path != original_path {
            report.relocated.push(RelocatedPath {
                from: original_path,
                to: relocated.path.clone(),
            });
        }
        sink.write_entry(&relocated).await?;
    }
    sink.finish().await?;
    Ok(report)
}

/// Read every entry of `source` into memory, e.g. for scanning
pub async fn collect_entries(source: &mut dyn EntrySource) -> Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();
    while let Some(entry) = source.next_entry().await? {
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shadowpack_core::{RelocationRule, build_plan};
    use std::collections::VecDeque;

    #[derive(Debug)]
    struct MemorySource(VecDeque<ArchiveEntry>);

    #[async_trait]
    impl EntrySource for MemorySource {
        async fn next_entry(&mut self) -> Result<Option<ArchiveEntry>> {
            Ok(self.0.pop_front())
        }
    }

    #[derive(Debug, Default)]
    struct MemorySink {
        written: Vec<ArchiveEntry>,
        finished: bool,
    }

    #[async_trait]
    impl EntrySink for MemorySink {
        async fn write_entry(&mut self, entry: &ArchiveEntry) -> Result<()> {
            self.written.push(entry.clone());
            Ok(())
        }

        async fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn plan() -> Arc<RelocationPlan> {
        Arc::new(
            build_plan([
                RelocationRule::new("a.b", "a.b.v1"),
                RelocationRule::new("x.y", "a.b.v1.shaded.x.y"),
            ])
            .unwrap(),
        )
    }

    fn source(paths: &[&str]) -> MemorySource {
        MemorySource(
            paths
                .iter()
                .map(|path| ArchiveEntry::new(*path, b"payload".to_vec()))
                .collect(),
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_relocate_entries_keeps_source_order() {
        let paths: Vec<String> = (0..64).map(|i| format!("x/y/C{i:02}.txt")).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let mut source = source(&refs);
        let mut sink = MemorySink::default();

        let report = relocate_entries(plan(), &mut source, &mut sink, &[])
            .await
            .unwrap();

        assert!(sink.finished);
        assert_eq!(report.entries, 64);
        assert_eq!(report.relocated.len(), 64);
        assert_eq!(report.rewritten, 0);
        let written: Vec<_> = sink.written.iter().map(|e| e.path.clone()).collect();
        let expected: Vec<_> = (0..64)
            .map(|i| format!("a/b/v1/shaded/x/y/C{i:02}.txt"))
            .collect();
        assert_eq!(written, expected);
    }

    #[tokio::test]
    async fn test_relocate_entries_ignores_signature_files() {
        let mut source = source(&["META-INF/SERVER.SF", "META-INF/SERVER.RSA", "a/b/W.txt"]);
        let mut sink = MemorySink::default();
        let ignore = compile_ignore_patterns(&["META-INF/*.SF".into(), "META-INF/*.RSA".into()])
            .unwrap();

        let report = relocate_entries(plan(), &mut source, &mut sink, &ignore)
            .await
            .unwrap();

        assert_eq!(report.ignored, 2);
        assert_eq!(report.written(), 1);
        assert_eq!(sink.written[0].path, "a/b/v1/W.txt");
    }

    #[tokio::test]
    async fn test_relocate_entries_reports_duplicates() {
        let mut source = MemorySource(VecDeque::from([
            ArchiveEntry::new("c/d/W.txt", b"first".to_vec()),
            ArchiveEntry::new("a/b/W.txt", b"second".to_vec()),
        ]));
        let plan = Arc::new(build_plan([RelocationRule::new("a.b", "c.d")]).unwrap());
        let mut sink = MemorySink::default();

        let report = relocate_entries(plan, &mut source, &mut sink, &[])
            .await
            .unwrap();

        assert_eq!(report.duplicates, vec!["c/d/W.txt".to_string()]);
        assert_eq!(sink.written.len(), 1);
        assert_eq!(sink.written[0].content, b"first");
    }

    #[tokio::test]
    async fn test_relocate_entries_fails_on_malformed_class() {
        let mut source = source(&["a/b/Broken.class"]);
        let mut sink = MemorySink::default();
        let result = relocate_entries(plan(), &mut source, &mut sink, &[]).await;
        assert!(result.is_err());
        assert!(sink.written.is_empty());
    }

    #[tokio::test]
    async fn test_collect_entries() {
        let mut source = source(&["a", "b"]);
        let entries = collect_entries(&mut source).await.unwrap();
        assert_eq!(entries.len(), 2);
    }
}
