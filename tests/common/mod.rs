#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn temp_dir(prefix: &str) -> PathBuf {
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let mut dir = std::env::temp_dir();
    dir.push(format!("ihexmap_{prefix}_{}_{}", std::process::id(), id));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_file(path: &Path, data: &[u8]) {
    std::fs::write(path, data).unwrap();
}

pub fn run_ihexmap(args: &[String]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ihexmap"))
        .args(args)
        .output()
        .unwrap()
}

pub fn assert_success(output: &Output) {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("ihexmap failed: {stderr}");
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn read_nonempty_lines(path: &Path) -> Vec<String> {
    let text = std::fs::read_to_string(path).unwrap();
    text.lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Two blocks: 0x0100..=0x011F and 0x0800_0000..=0x0800_0003, plus a start address.
pub const TWO_BLOCKS_HEX: &[u8] = b":10010000214601360121470136007EFE09D2190140\r\n\
:100110002146017E17C20001FF5F16002148011928\r\n\
:020000040800F2\r\n\
:04000000DEADBEEFC4\r\n\
:0400000508000131BD\r\n\
:00000001FF\r\n";
