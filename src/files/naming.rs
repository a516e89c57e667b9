use std::sync::atomic::{AtomicI64, Ordering};

use crate::now_millis;

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Wall-clock millis that never repeat or go backwards within this process.
pub fn monotonic_millis() -> i64 {
    let now = now_millis();
    let mut last = LAST_STAMP.load(Ordering::SeqCst);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Replaces everything outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn storage_key(name: &str, stamp: i64) -> String {
    format!("{stamp}_{}", sanitize(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_characters() {
        assert_eq!(sanitize("report-v2.final.pdf"), "report-v2.final.pdf");
        assert_eq!(sanitize("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize("naïve.txt"), "na_ve.txt");
    }

    #[test]
    fn keys_are_prefixed_with_stamp() {
        assert_eq!(storage_key("a b.txt", 1700000000000), "1700000000000_a_b.txt");
    }

    #[test]
    fn stamps_strictly_increase() {
        let stamps: Vec<i64> = (0..1000).map(|_| monotonic_millis()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }
}
