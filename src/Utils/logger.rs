use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};
use std::fs::File;
use std::io::{self, Write};

/// Level filter of a loglevel string, `None` for "off"/"none" and unknown levels
pub fn level_filter(loglevel: Option<&str>) -> Option<LevelFilter> {
    match loglevel {
        None => Some(LevelFilter::Info),
        Some("debug") => Some(LevelFilter::Debug),
        Some("info") => Some(LevelFilter::Info),
        Some("warn") => Some(LevelFilter::Warn),
        Some("error") => Some(LevelFilter::Error),
        Some(_) => None,
    }
}

/// Initializes the terminal logger. Returns false when logging is switched off or a logger is
/// already installed (the first one wins).
pub fn init_logger(loglevel: Option<&str>) -> bool {
    let Some(log_option) = level_filter(loglevel) else {
        return false;
    };
    CombinedLogger::init(vec![TermLogger::new(
        log_option,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .is_ok()
}

/// saves sampled (x, y) values as a tab separated table with a header line
pub fn save_samples_to_file(samples: &[(f64, f64)], headers: (&str, &str), filename: &str) -> io::Result<()> {
    let mut file = File::create(filename)?;
    writeln!(file, "{}\t{}", headers.0, headers.1)?;
    for (x, y) in samples {
        writeln!(file, "{}\t{}", x, y)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter(Some("warn")), Some(LevelFilter::Warn));
        assert_eq!(level_filter(None), Some(LevelFilter::Info));
        assert_eq!(level_filter(Some("off")), None);
        assert!(!init_logger(Some("none")));
    }

    #[test]
    fn test_save_samples() {
        let path = std::env::temp_dir().join("vop_logger_samples.txt");
        let filename = path.to_string_lossy().to_string();
        save_samples_to_file(&[(0.0, 1.0), (0.5, 2.0)], ("x", "y"), &filename).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.starts_with("x\ty"));
        let _ = std::fs::remove_file(path);
    }
}
