//! Column selection for chart specs.

use regex::{Regex, RegexBuilder};

use crate::catalog::ChartSpec;
use crate::error::{EbasError, EbasResult};
use crate::types::DataSet;

/// Compiled inclusion/exclusion patterns of one [`ChartSpec`].
///
/// Both patterns are searched case-insensitively anywhere in a column name; they are not
/// anchored unless the pattern itself uses `^`/`$`.
#[derive(Debug, Clone)]
pub struct ColumnMatcher {
    include: Regex,
    exclude: Option<Regex>,
}

impl ColumnMatcher {
    /// Compile a matcher from raw patterns.
    pub fn new(include: &str, exclude: Option<&str>) -> Result<Self, regex::Error> {
        Ok(Self {
            include: compile(include)?,
            exclude: exclude.map(compile).transpose()?,
        })
    }

    /// Compile the patterns of `spec`, reporting the offending pattern on failure.
    pub fn for_spec(spec: &ChartSpec) -> EbasResult<Self> {
        let invalid = |pattern: &str, e: regex::Error| EbasError::InvalidPattern {
            chart_id: spec.id.clone(),
            pattern: pattern.to_owned(),
            message: e.to_string(),
        };

        let include = compile(&spec.columns_pattern).map_err(|e| invalid(&spec.columns_pattern, e))?;
        let exclude = match spec.exclude_pattern.as_deref() {
            Some(p) => Some(compile(p).map_err(|e| invalid(p, e))?),
            None => None,
        };
        Ok(Self { include, exclude })
    }

    /// Returns `true` if `name` matches the inclusion pattern and not the exclusion pattern.
    pub fn is_match(&self, name: &str) -> bool {
        self.include.is_match(name) && !self.exclude.as_ref().is_some_and(|ex| ex.is_match(name))
    }

    /// Matching names, sorted in ascending string order.
    ///
    /// The result does not depend on the order of `names`.
    pub fn select<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut out: Vec<String> = names
            .into_iter()
            .filter(|name| self.is_match(name))
            .map(str::to_owned)
            .collect();
        out.sort();
        out
    }
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Columns of `dataset` selected by `spec`, sorted.
pub fn match_columns(dataset: &DataSet, spec: &ChartSpec) -> EbasResult<Vec<String>> {
    Ok(ColumnMatcher::for_spec(spec)?.select(dataset.column_names()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ChartKind;

    const COLUMNS: [&str; 8] = [
        "starttime",
        "endtime",
        "bin_2",
        "bin_10",
        "bin_1",
        "flag_bin_1",
        "RH_inlet",
        "flag_RH_inlet",
    ];

    #[test]
    fn anchored_pattern_with_exclusion() {
        let m = ColumnMatcher::new(r"^bin_\d+$", Some("flag_")).unwrap();
        assert_eq!(m.select(COLUMNS), vec!["bin_1", "bin_10", "bin_2"]);
    }

    #[test]
    fn search_is_unanchored_and_case_insensitive() {
        let m = ColumnMatcher::new("rh", Some("FLAG_")).unwrap();
        assert_eq!(m.select(COLUMNS), vec!["RH_inlet"]);
    }

    #[test]
    fn selection_ignores_input_order() {
        let m = ColumnMatcher::new(r"bin", None).unwrap();
        let mut reversed = COLUMNS;
        reversed.reverse();
        assert_eq!(m.select(COLUMNS), m.select(reversed));
        assert_eq!(m.select(COLUMNS), m.select(COLUMNS));
    }

    #[test]
    fn no_match_is_empty() {
        let m = ColumnMatcher::new(r"^bnhier\d+$", None).unwrap();
        assert!(m.select(COLUMNS).is_empty());
    }

    #[test]
    fn invalid_pattern_names_the_chart() {
        let spec = ChartSpec::new("chart_bad", "Bad", ChartKind::Line, "(unclosed");
        let err = ColumnMatcher::for_spec(&spec).unwrap_err();
        match err {
            EbasError::InvalidPattern { chart_id, pattern, .. } => {
                assert_eq!(chart_id, "chart_bad");
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_exclusion_is_reported_too() {
        let spec = ChartSpec::new("chart_x", "X", ChartKind::Line, "x").with_exclude("[");
        assert!(matches!(
            ColumnMatcher::for_spec(&spec),
            Err(EbasError::InvalidPattern { pattern, .. }) if pattern == "["
        ));
    }
}
