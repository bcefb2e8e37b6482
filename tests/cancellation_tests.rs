mod common;

use codesheet::{CancelFlag, ExportError, ExportEvent, ExportOptions, ExportPipelineBuilder, ExportRequest};
use common::fixtures::*;
use common::{TestResult, drain};
use std::path::Path;

/// 40 slots per page, 2 pages per file: 80 items per file.
fn options() -> ExportOptions {
    ExportOptions { per_file_max_pages: 2, ..grid_options() }
}

type CancelledRun = (Result<codesheet::ExportSummary, ExportError>, Vec<ExportEvent>);

fn cancelling_run(at: usize, dir: &Path) -> Result<CancelledRun, Box<dyn std::error::Error>> {
    cancelling_run_with(at, &options(), dir)
}

fn cancelling_run_with(at: usize, opts: &ExportOptions, dir: &Path) -> Result<CancelledRun, Box<dyn std::error::Error>> {
    let flag = CancelFlag::new();
    let (tx, rx) = async_channel::unbounded();
    let pipeline = ExportPipelineBuilder::new()
        .with_worker_cap(3)
        .with_renderer(CancellingRenderer { flag: flag.clone(), at, inner: TinyRenderer::new() })
        .with_cancel_flag(flag)
        .with_event_sender(tx)
        .build()?;
    let request = ExportRequest::new(codes(250), opts)?;
    let result = pipeline.run(&request, dir);
    assert_eq!(pipeline.state().phase, codesheet::ExportPhase::Cancelled);
    Ok((result, drain(&rx)))
}

#[test]
fn test_cancel_after_file_keeps_identical_files() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let full_dir = tempfile::tempdir()?;
    let cut_dir = tempfile::tempdir()?;

    let full = common::run_export(codes(250), &options(), TinyRenderer::new(), full_dir.path())?.result?;
    assert_eq!(full.files.len(), 4);

    // Item 130 is on page 4, which closes file 2; file 3 is never started.
    let (result, events) = cancelling_run(130, cut_dir.path())?;
    assert!(matches!(result, Err(ref e) if e.is_cancelled()));

    for n in 1..=2 {
        let name = format!("qrbarcode_export_part_{}.pdf", n);
        assert_eq!(
            std::fs::read(cut_dir.path().join(&name))?,
            std::fs::read(full_dir.path().join(&name))?,
            "{} differs from the uninterrupted run",
            name
        );
    }
    assert!(!cut_dir.path().join("qrbarcode_export_part_3.pdf").exists());

    let done: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ExportEvent::FileDone { file_index, .. } => Some(*file_index),
            _ => None,
        })
        .collect();
    assert_eq!(done, vec![1, 2]);
    assert_eq!(events.last(), Some(&ExportEvent::Cancelled));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    Ok(())
}

#[test]
fn test_cancel_mid_file_finalizes_committed_pages() -> TestResult {
    let dir = tempfile::tempdir()?;

    // Item 100 is on page 3, the first page of file 2.
    let (result, events) = cancelling_run(100, dir.path())?;
    assert!(matches!(result, Err(ExportError::Cancelled)));

    assert_pdf_page_count!(dir.path().join("qrbarcode_export_part_1.pdf"), 2);
    assert_pdf_page_count!(dir.path().join("qrbarcode_export_part_2.pdf"), 1);
    assert!(!dir.path().join("qrbarcode_export_part_3.pdf").exists());

    // Every reported item landed in a file.
    let last_index = events.iter().rev().find_map(|e| match e {
        ExportEvent::Exporting { index, .. } => Some(*index),
        _ => None,
    });
    assert_eq!(last_index, Some(120));
    Ok(())
}

#[test]
fn test_cancel_during_a_page_still_commits_it() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir()?;
    let opts = ExportOptions { per_file_max_pages: 5, ..grid_options() };

    // Item 79 is the last slot of page 2; the whole page is rendered before the cancel is seen.
    let (result, events) = cancelling_run_with(79, &opts, dir.path())?;
    assert!(matches!(result, Err(ExportError::Cancelled)));

    assert_pdf_page_count!(dir.path().join("qrbarcode_export_part_1.pdf"), 2);
    assert!(!dir.path().join("qrbarcode_export_part_2.pdf").exists());

    let last_index = events.iter().rev().find_map(|e| match e {
        ExportEvent::Exporting { index, .. } => Some(*index),
        _ => None,
    });
    assert_eq!(last_index, Some(80));
    let done: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ExportEvent::FileDone { file_index, .. } => Some(*file_index),
            _ => None,
        })
        .collect();
    assert_eq!(done, vec![1]);
    assert_eq!(events.last(), Some(&ExportEvent::Cancelled));
    Ok(())
}

#[test]
fn test_cancel_before_start_writes_nothing() -> TestResult {
    let dir = tempfile::tempdir()?;
    let flag = CancelFlag::new();
    flag.cancel();
    let pipeline = ExportPipelineBuilder::new()
        .with_renderer(TinyRenderer::new())
        .with_cancel_flag(flag)
        .build()?;
    let request = ExportRequest::new(codes(10), &options())?;

    let err = pipeline.run(&request, dir.path()).unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}
