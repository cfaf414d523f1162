use std::path::{Path, PathBuf};

/// Write `matches_<stem>.csv` under `dir` with one record per line.
pub fn write_match_file(dir: &Path, stem: &str, lines: &[&str]) -> PathBuf {
    std::fs::create_dir_all(dir).expect("create match dir");
    let path = dir.join(format!("matches_{stem}.csv"));
    let mut contents = lines.join("\n");
    contents.push('\n');
    std::fs::write(&path, contents).expect("write match file");
    path
}

/// Write a match file of `count` generated records at `level`.
pub fn write_generated(dir: &Path, stem: &str, count: usize, level: u32) -> PathBuf {
    let lines: Vec<String> = (0..count)
        .map(|i| format!("{stem}{i:08},{level},Generated"))
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_match_file(dir, stem, &refs)
}
