use std::path::PathBuf;

use super::UciError;
use crate::engine::DEFAULT_HASH_MB;

pub const MAX_HASH_MB: usize = 65536;
pub const MAX_THREADS: usize = 256;

/// A validated `setoption`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciOption {
    Hash(usize),
    Threads(usize),
    EvalFile(PathBuf),
}

impl UciOption {
    /// Validate a raw name/value pair. Names are case-insensitive.
    pub fn parse(name: &str, value: Option<&str>) -> Result<Self, UciError> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        let spin = |max: usize| -> Result<usize, UciError> {
            let raw = value.ok_or(UciError::MissingParts)?;
            raw.parse::<usize>()
                .ok()
                .filter(|v| (1..=max).contains(v))
                .ok_or_else(|| UciError::InvalidValue {
                    name: name.to_string(),
                    value: raw.to_string(),
                })
        };

        match name.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(UciOption::Hash(spin(MAX_HASH_MB)?)),
            "threads" => Ok(UciOption::Threads(spin(MAX_THREADS)?)),
            "evalfile" => value
                .map(|v| UciOption::EvalFile(PathBuf::from(v)))
                .ok_or(UciError::MissingParts),
            _ => Err(UciError::UnknownOption(name.to_string())),
        }
    }
}

/// Identification and option declarations sent in reply to `uci`
#[must_use]
pub fn uci_banner() -> String {
    format!(
        "id name {} {}\n\
         id author {}\n\
         option name Hash type spin default {DEFAULT_HASH_MB} min 1 max {MAX_HASH_MB}\n\
         option name Threads type spin default 1 min 1 max {MAX_THREADS}\n\
         option name EvalFile type string default <internal>\n\
         uciok",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        option_env!("CARGO_PKG_AUTHORS").filter(|a| !a.is_empty()).unwrap_or("unknown"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_options_are_range_checked() {
        assert_eq!(UciOption::parse("Hash", Some("64")).unwrap(), UciOption::Hash(64));
        assert_eq!(UciOption::parse("threads", Some(" 4 ")).unwrap(), UciOption::Threads(4));
        assert!(matches!(
            UciOption::parse("Hash", Some("0")),
            Err(UciError::InvalidValue { .. })
        ));
        assert!(matches!(
            UciOption::parse("Hash", Some("lots")),
            Err(UciError::InvalidValue { .. })
        ));
        assert!(matches!(UciOption::parse("Hash", None), Err(UciError::MissingParts)));
    }

    #[test]
    fn eval_file_and_unknown_options() {
        assert_eq!(
            UciOption::parse("EvalFile", Some("nets/a.bin")).unwrap(),
            UciOption::EvalFile(PathBuf::from("nets/a.bin"))
        );
        assert!(matches!(
            UciOption::parse("Ponder", Some("true")),
            Err(UciError::UnknownOption(_))
        ));
    }

    #[test]
    fn banner_ends_with_uciok() {
        let banner = uci_banner();
        assert!(banner.starts_with("id name "));
        assert!(banner.contains("option name Hash type spin"));
        assert!(banner.ends_with("uciok"));
    }
}
