//! Destination resolution for matched entries.
//!
//! An entry's stem is tried against an ordered pattern list; the first full
//! match wins. The matched pattern's named captures `year`, `month` and `day`
//! decide the destination: `<archive>/<year>` when only the year is known,
//! `<archive>/<year>/<year>_<month>_<day>` when both month and day were
//! captured. A captured year outside the configured bounds aborts matching
//! with a validation error.

use regex::Regex;
use std::path::{Path, PathBuf};

/// Default lower bound for extracted years (exclusive).
pub const START_YEAR: i32 = 1970;
/// Default upper bound for extracted years (exclusive).
pub const END_YEAR: i32 = 2022;

/// Validation failures raised by a matched pattern.
#[derive(Debug, Clone)]
pub enum ResolveError {
    /// A pattern matched but captured no `year` group.
    MissingYearCapture { path: PathBuf },
    /// The captured year does not lie strictly inside the configured bounds,
    /// or is not a number at all.
    YearOutOfRange {
        year: String,
        path: PathBuf,
        start: i32,
        end: i32,
    },
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::MissingYearCapture { path } => {
                write!(
                    f,
                    "Pattern matched {} but captured no year",
                    path.display()
                )
            }
            ResolveError::YearOutOfRange {
                year,
                path,
                start,
                end,
            } => {
                write!(
                    f,
                    "Year {} is not between {} and {} in {}",
                    year,
                    start,
                    end,
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// Computes archive destinations for entries matching a pattern list.
pub struct Resolver {
    archive_root: PathBuf,
    start_year: i32,
    end_year: i32,
}

impl Resolver {
    pub fn new(archive_root: PathBuf, start_year: i32, end_year: i32) -> Self {
        Self {
            archive_root,
            start_year,
            end_year,
        }
    }

    /// Resolves `path` against `patterns`, first match wins.
    ///
    /// Returns `Ok(None)` when no pattern matches the stem. On a match the
    /// captured year is validated; month and day are optional and only used
    /// when both are present. Matching is not retried against later patterns
    /// after a validation failure.
    pub fn resolve(
        &self,
        path: &Path,
        patterns: &[Regex],
    ) -> Result<Option<PathBuf>, ResolveError> {
        let stem = match path.file_stem() {
            Some(stem) => stem.to_string_lossy(),
            None => return Ok(None),
        };

        for pattern in patterns {
            let Some(caps) = pattern.captures(&stem) else {
                continue;
            };

            let year = named_field(&caps, "year").ok_or_else(|| {
                ResolveError::MissingYearCapture {
                    path: path.to_path_buf(),
                }
            })?;

            let parsed: i32 = year
                .parse()
                .map_err(|_| self.out_of_range(year, path))?;
            if !(self.start_year < parsed && parsed < self.end_year) {
                return Err(self.out_of_range(year, path));
            }

            let mut destination = self.archive_root.join(year);
            if let (Some(month), Some(day)) =
                (named_field(&caps, "month"), named_field(&caps, "day"))
            {
                destination.push(format!("{}_{}_{}", year, month, day));
            }

            return Ok(Some(destination));
        }

        Ok(None)
    }

    fn out_of_range(&self, year: &str, path: &Path) -> ResolveError {
        ResolveError::YearOutOfRange {
            year: year.to_string(),
            path: path.to_path_buf(),
            start: self.start_year,
            end: self.end_year,
        }
    }
}

/// An optional named capture; an empty capture counts as absent.
fn named_field<'c>(caps: &'c regex::Captures<'_>, name: &str) -> Option<&'c str> {
    caps.name(name)
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::compile_anchored;

    fn resolver() -> Resolver {
        Resolver::new(PathBuf::from("/archive"), START_YEAR, END_YEAR)
    }

    fn patterns(sources: &[&str]) -> Vec<Regex> {
        sources
            .iter()
            .map(|s| compile_anchored(s).expect("test pattern should compile"))
            .collect()
    }

    #[test]
    fn test_full_date_destination() {
        let patterns = patterns(&[r"(?P<year>\d{4})_(?P<month>\d{2})_(?P<day>\d{2})_.*"]);
        let destination = resolver()
            .resolve(Path::new("/inbox/2020_05_14_beach.jpg"), &patterns)
            .expect("year is in range");

        assert_eq!(destination, Some(PathBuf::from("/archive/2020/2020_05_14")));
    }

    #[test]
    fn test_year_only_destination() {
        let patterns = patterns(&[r"IMG_(?P<year>\d{4})_.*"]);
        let destination = resolver()
            .resolve(Path::new("/inbox/IMG_2001_trip.jpg"), &patterns)
            .expect("year is in range");

        assert_eq!(destination, Some(PathBuf::from("/archive/2001")));
    }

    #[test]
    fn test_month_without_day_falls_back_to_year() {
        let patterns = patterns(&[r"(?P<year>\d{4})-(?P<month>\d{2})-.*"]);
        let destination = resolver()
            .resolve(Path::new("/inbox/2010-07-holiday.png"), &patterns)
            .expect("year is in range");

        assert_eq!(destination, Some(PathBuf::from("/archive/2010")));
    }

    #[test]
    fn test_no_match_is_none_not_an_error() {
        let patterns = patterns(&[r"(?P<year>\d{4})_.*"]);
        let destination = resolver()
            .resolve(Path::new("/inbox/holiday.jpg"), &patterns)
            .expect("no match is not an error");

        assert_eq!(destination, None);
    }

    #[test]
    fn test_match_is_anchored_to_the_whole_stem() {
        let patterns = patterns(&[r"(?P<year>\d{4})"]);
        // The stem "x2020y" contains a year but does not fully match
        let destination = resolver()
            .resolve(Path::new("/inbox/x2020y.jpg"), &patterns)
            .expect("no match is not an error");

        assert_eq!(destination, None);
    }

    #[test]
    fn test_year_below_range_is_rejected() {
        let patterns = patterns(&[r"(?P<year>\d{4})_(?P<month>\d{2})_(?P<day>\d{2})_.*"]);
        let err = resolver()
            .resolve(Path::new("/inbox/1960_05_14_beach.jpg"), &patterns)
            .expect_err("1960 is out of range");

        match err {
            ResolveError::YearOutOfRange { year, path, .. } => {
                assert_eq!(year, "1960");
                assert_eq!(path, PathBuf::from("/inbox/1960_05_14_beach.jpg"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_year_bounds_are_exclusive() {
        let patterns = patterns(&[r"(?P<year>\d{4})"]);
        let resolver = resolver();

        assert!(resolver.resolve(Path::new("1970.jpg"), &patterns).is_err());
        assert!(resolver.resolve(Path::new("2022.jpg"), &patterns).is_err());
        assert_eq!(
            resolver
                .resolve(Path::new("1971.jpg"), &patterns)
                .expect("1971 is in range"),
            Some(PathBuf::from("/archive/1971"))
        );
        assert_eq!(
            resolver
                .resolve(Path::new("2021.jpg"), &patterns)
                .expect("2021 is in range"),
            Some(PathBuf::from("/archive/2021"))
        );
    }

    #[test]
    fn test_validation_failure_is_not_retried_against_later_patterns() {
        // The second pattern would happily match with a valid year, but
        // matching aborts on the first pattern's validation failure.
        let patterns = patterns(&[r"(?P<year>\d{4})_.*", r".*_(?P<year>\d{4})_.*"]);
        let result = resolver().resolve(Path::new("/inbox/1900_2001_x.jpg"), &patterns);

        assert!(matches!(
            result,
            Err(ResolveError::YearOutOfRange { .. })
        ));
    }

    #[test]
    fn test_first_matching_pattern_wins() {
        let patterns = patterns(&[
            r"(?P<year>\d{4})_(?P<month>\d{2})_(?P<day>\d{2})",
            r"(?P<year>\d{4})_.*",
        ]);
        let resolver = resolver();

        // Fully dated stem hits the first pattern
        assert_eq!(
            resolver
                .resolve(Path::new("2005_03_09.jpg"), &patterns)
                .unwrap(),
            Some(PathBuf::from("/archive/2005/2005_03_09"))
        );
        // Anything else falls through to the second
        assert_eq!(
            resolver
                .resolve(Path::new("2005_rome.jpg"), &patterns)
                .unwrap(),
            Some(PathBuf::from("/archive/2005"))
        );
    }

    #[test]
    fn test_match_without_year_capture_is_an_error() {
        let patterns = patterns(&[r"scan_\d+"]);
        let result = resolver().resolve(Path::new("/inbox/scan_042.jpg"), &patterns);

        assert!(matches!(
            result,
            Err(ResolveError::MissingYearCapture { .. })
        ));
    }

    #[test]
    fn test_empty_month_capture_counts_as_absent() {
        // month and day participate in the match but capture nothing
        let patterns = patterns(&[r"(?P<year>\d{4})(?P<month>\d*)(?P<day>\d*)"]);
        let destination = resolver()
            .resolve(Path::new("/inbox/2012.jpg"), &patterns)
            .expect("year is in range");

        assert_eq!(destination, Some(PathBuf::from("/archive/2012")));
    }

    #[test]
    fn test_unparseable_year_is_a_validation_failure() {
        let patterns = patterns(&[r"(?P<year>\d+)_.*"]);
        let result = resolver().resolve(Path::new("/inbox/99999999999999_x.jpg"), &patterns);

        assert!(matches!(
            result,
            Err(ResolveError::YearOutOfRange { .. })
        ));
    }
}
