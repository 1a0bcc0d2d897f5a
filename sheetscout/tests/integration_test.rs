use anyhow::Result;
use calamine::{open_workbook_auto, Reader};
use rust_xlsxwriter::Workbook;
use sheetscout::{
    discover_files, run_search, scan_files, BarProgress, KeywordSet, MatchRecord, ScanConfig,
    ScanError, SilentProgress,
};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn write_book(path: &Path, rows: &[&[&str]]) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32, c as u16, *value)?;
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

fn read_output(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)?;
    assert_eq!(workbook.sheet_names(), vec!["搜索结果".to_string()]);
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow::anyhow!("no sheets in {}", path.display()))??;
    Ok(range
        .rows()
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
            while cells.last().is_some_and(|c| c.is_empty()) {
                cells.pop();
            }
            cells
        })
        .collect())
}

fn sorted(mut records: Vec<MatchRecord>) -> Vec<MatchRecord> {
    records.sort();
    records
}

/// Twelve workbooks in nested folders; every third row of each mentions "TODO",
/// every fifth mentions "FIXME", so some rows carry both keywords
fn create_corpus(dir: &TempDir) -> Result<()> {
    for i in 0..12 {
        let folder = dir.path().join(format!("dept{}", i % 3));
        fs::create_dir_all(&folder)?;
        let rows: Vec<Vec<String>> = (0..30)
            .map(|j| {
                let mut note = format!("row {} of book {}", j, i);
                if j % 3 == 0 {
                    note.push_str(" TODO");
                }
                if j % 5 == 0 {
                    note.push_str(" FIXME");
                }
                vec![format!("id-{}-{}", i, j), note]
            })
            .collect();
        let rows: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect();
        let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
        write_book(&folder.join(format!("book{}.xlsx", i)), &rows)?;
    }
    Ok(())
}

fn config_for(dir: &TempDir, keywords: &[&str]) -> Result<ScanConfig> {
    let keyword_file = dir.path().join("keywords.xlsx");
    let rows: Vec<&[&str]> = keywords.iter().map(std::slice::from_ref).collect();
    write_book(&keyword_file, &rows)?;

    let data = dir.path().join("data");
    fs::create_dir_all(&data)?;
    let mut config = ScanConfig::new(&data, &keyword_file);
    config.output_path = dir.path().join("result.xlsx");
    config.thread_count = NonZeroUsize::new(4).unwrap();
    Ok(config)
}

#[test]
fn test_two_file_scenario() -> Result<()> {
    let dir = tempdir()?;
    let config = config_for(&dir, &["apple", "banana"])?;
    write_book(
        &config.search_directory.join("first.xlsx"),
        &[&["apple pie", "42"]],
    )?;
    write_book(
        &config.search_directory.join("second.xlsx"),
        &[&["orange", "banana split"], &["kiwi", "99"]],
    )?;

    let summary = run_search(&config, &SilentProgress)?;
    assert_eq!(summary.total_matches, 2);
    assert_eq!(summary.files_with_matches, 2);
    assert_eq!(summary.files_failed(), 0);

    let mut rows = read_output(&config.output_path)?;
    assert_eq!(rows.remove(0), vec!["文件名", "匹配行内容"]);
    rows.sort();
    assert_eq!(
        rows,
        vec![
            vec!["first.xlsx", "apple pie", "42"],
            vec!["second.xlsx", "orange", "banana split"],
        ]
    );
    Ok(())
}

#[test]
fn test_completeness_and_soundness() -> Result<()> {
    let dir = tempdir()?;
    create_corpus(&dir)?;
    let files = discover_files(dir.path())?;
    assert_eq!(files.len(), 12);

    let keywords = KeywordSet::new(["TODO", "FIXME"]);
    let output = scan_files(&files, &keywords, NonZeroUsize::new(3).unwrap(), &SilentProgress)?;

    // Rows 0..30 matching j % 3 == 0 || j % 5 == 0: 14 per book, each once
    assert_eq!(output.total_matches(), 12 * 14);
    assert_eq!(output.rows_scanned, 12 * 30);
    assert!(output
        .records
        .iter()
        .all(|r| r.cells[1].contains("TODO") || r.cells[1].contains("FIXME")));

    let mut ids: Vec<_> = output.records.iter().map(|r| r.cells[0].clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), output.total_matches());
    Ok(())
}

#[test]
fn test_corrupt_file_is_isolated() -> Result<()> {
    let dir = tempdir()?;
    create_corpus(&dir)?;
    let keywords = KeywordSet::new(["TODO"]);
    let threads = NonZeroUsize::new(4).unwrap();

    let clean = scan_files(&discover_files(dir.path())?, &keywords, threads, &SilentProgress)?;

    fs::write(dir.path().join("dept1").join("broken.xlsx"), b"PK\x03\x04 truncated")?;
    fs::write(dir.path().join("legacy.xls"), b"definitely not BIFF")?;
    let progress = BarProgress::hidden();
    let dirty = scan_files(&discover_files(dir.path())?, &keywords, threads, &progress)?;

    assert_eq!(dirty.files_failed(), 2);
    assert_eq!(dirty.files_scanned, clean.files_scanned + 2);
    assert_eq!(progress.position(), 14);
    assert_eq!(sorted(dirty.records), sorted(clean.records));
    Ok(())
}

#[test]
fn test_empty_keyword_set_writes_header_only() -> Result<()> {
    let dir = tempdir()?;
    let config = config_for(&dir, &["", "   "])?;
    write_book(
        &config.search_directory.join("a.xlsx"),
        &[&["apple pie", "42"]],
    )?;

    let summary = run_search(&config, &SilentProgress)?;
    assert_eq!(summary.keywords, 0);
    assert_eq!(summary.total_matches, 0);
    assert_eq!(read_output(&config.output_path)?, vec![vec!["文件名", "匹配行内容"]]);
    Ok(())
}

#[test]
fn test_no_candidate_files_writes_header_only() -> Result<()> {
    let dir = tempdir()?;
    let config = config_for(&dir, &["apple"])?;
    fs::write(config.search_directory.join("notes.txt"), "apple")?;
    fs::write(config.search_directory.join("table.csv"), "apple,1\n")?;

    let summary = run_search(&config, &SilentProgress)?;
    assert_eq!(summary.files_discovered, 0);
    assert_eq!(read_output(&config.output_path)?, vec![vec!["文件名", "匹配行内容"]]);
    Ok(())
}

#[test]
fn test_csv_keyword_file_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let mut config = config_for(&dir, &["apple"])?;
    write_book(&config.search_directory.join("a.xlsx"), &[&["apple"]])?;
    config.keyword_file = dir.path().join("keywords.csv");
    fs::write(&config.keyword_file, "apple\n")?;

    let err = run_search(&config, &SilentProgress).unwrap_err();
    assert!(matches!(err, ScanError::UnsupportedFileType(_)));
    assert!(!config.output_path.exists());
    Ok(())
}

#[test]
fn test_discovery_order_does_not_matter() -> Result<()> {
    let dir = tempdir()?;
    create_corpus(&dir)?;
    let keywords = KeywordSet::new(["FIXME"]);
    let threads = NonZeroUsize::new(2).unwrap();

    let mut files = discover_files(dir.path())?;
    let forward = scan_files(&files, &keywords, threads, &SilentProgress)?;
    files.reverse();
    files.rotate_left(5);
    let shuffled = scan_files(&files, &keywords, threads, &SilentProgress)?;

    assert_eq!(sorted(forward.records), sorted(shuffled.records));
    Ok(())
}

#[test]
fn test_pool_size_does_not_change_results() -> Result<()> {
    let dir = tempdir()?;
    create_corpus(&dir)?;
    let keywords = KeywordSet::new(["TODO", "book 7"]);
    let files = discover_files(dir.path())?;

    let single = scan_files(&files, &keywords, NonZeroUsize::MIN, &SilentProgress)?;
    let many = scan_files(&files, &keywords, NonZeroUsize::new(8).unwrap(), &SilentProgress)?;

    assert_eq!(single.files_with_matches, many.files_with_matches);
    assert_eq!(sorted(single.records), sorted(many.records));
    Ok(())
}

#[test]
fn test_output_is_overwritten() -> Result<()> {
    let dir = tempdir()?;
    let config = config_for(&dir, &["apple"])?;
    write_book(&config.output_path, &[&["stale"], &["rows"], &["here"]])?;
    write_book(&config.search_directory.join("a.xlsx"), &[&["apple"]])?;

    run_search(&config, &SilentProgress)?;
    let rows = read_output(&config.output_path)?;
    assert_eq!(rows, vec![vec!["文件名", "匹配行内容"], vec!["a.xlsx", "apple"]]);
    Ok(())
}
