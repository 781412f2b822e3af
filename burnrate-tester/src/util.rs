use std::path::{Path, PathBuf};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Per-run save directory: `<base>/<strategy>/seed-<seed>`.
pub fn run_save_dir(base: &Path, strategy: &str, seed: u64) -> PathBuf {
    base.join(strategy).join(format!("seed-{seed}"))
}
