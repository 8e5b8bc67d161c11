//! Local-time stamps used in file names and log records.

use chrono::Local;

/// `YYYYMMDD`, the date key of per-day files.
pub fn today() -> String {
    Local::now().format("%Y%m%d").to_string()
}

/// `YYYYMMDD_HHMMSS`, the suffix of timestamped singleton files.
pub fn file_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// ISO-8601 local time with microseconds and no offset.
pub fn iso_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

pub fn session_stamp() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_have_fixed_shapes() {
        assert_eq!(today().len(), 8);
        assert!(today().chars().all(|c| c.is_ascii_digit()));
        assert_eq!(file_stamp().len(), 15);
        assert_eq!(&file_stamp()[8..9], "_");
        assert_eq!(session_stamp().len(), 19);
        assert!(iso_now().contains('T'));
    }
}
