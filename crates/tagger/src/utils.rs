use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Returns the SHA256 digest of a file.
pub(crate) fn sha256<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;

    let hash = hasher.finalize();
    Ok(hash.iter().fold(String::new(), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    }))
}

/// Reads a list of paths, one per line. Blank lines are skipped.
pub(crate) fn read_lines<P: AsRef<Path>>(path: P) -> io::Result<Vec<PathBuf>> {
    let reader = BufReader::new(File::open(path)?);
    let mut paths = vec![];

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            paths.push(PathBuf::from(line));
        }
    }

    Ok(paths)
}
