//! Label Encoding

use crate::FeatureError;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Maps category strings to integer codes by sorted rank
///
/// Classes sort by value when every one of them parses as a number, so
/// `"2"` ranks before `"10"`; otherwise they sort as strings.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEncoder {
    column: String,
    /// Known classes, sorted; a class's code is its index
    classes: Vec<String>,
    numeric: bool,
}

impl LabelEncoder {
    /// Learn the classes of one column
    pub fn fit<S: AsRef<str>>(column: &str, values: &[S]) -> Self {
        let distinct: BTreeSet<&str> = values.iter().map(|v| v.as_ref()).collect();
        let numeric = !distinct.is_empty() && distinct.iter().all(|c| parse_number(c).is_some());
        let mut classes: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        if numeric {
            classes.sort_by(|a, b| compare(true, a, b));
        }
        Self {
            column: column.to_string(),
            classes,
            numeric,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Code of a known class
    pub fn code(&self, value: &str) -> Option<usize> {
        if self.numeric && parse_number(value).is_none() {
            return None;
        }
        self.classes
            .binary_search_by(|c| compare(self.numeric, c, value))
            .ok()
    }

    /// Encode values; unknown ones get code `n_classes`
    ///
    /// Returns the codes and the number of unknown values.
    pub fn transform<S: AsRef<str>>(&self, values: &[S]) -> (Vec<f64>, usize) {
        let mut unseen = 0;
        let codes = values
            .iter()
            .map(|v| match self.code(v.as_ref()) {
                Some(code) => code as f64,
                None => {
                    unseen += 1;
                    self.n_classes() as f64
                }
            })
            .collect();
        (codes, unseen)
    }

    /// Encode values, rejecting any unknown one
    pub fn transform_strict<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<f64>, FeatureError> {
        values
            .iter()
            .map(|v| {
                self.code(v.as_ref())
                    .map(|code| code as f64)
                    .ok_or_else(|| FeatureError::UnseenLabel {
                        column: self.column.clone(),
                        value: v.as_ref().to_string(),
                    })
            })
            .collect()
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Class order; equal numbers fall back to string order
fn compare(numeric: bool, a: &str, b: &str) -> Ordering {
    if numeric {
        if let (Some(x), Some(y)) = (parse_number(a), parse_number(b)) {
            return x.total_cmp(&y).then_with(|| a.cmp(b));
        }
    }
    a.cmp(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_order() {
        let enc = LabelEncoder::fit("room", &["Room_Type 4", "Room_Type 1", "Room_Type 4", "Room_Type 2"]);

        assert_eq!(enc.classes(), &["Room_Type 1", "Room_Type 2", "Room_Type 4"]);
        assert_eq!(enc.code("Room_Type 4"), Some(2));
        let (codes, unseen) = enc.transform(&["Room_Type 2", "Room_Type 1"]);
        assert_eq!(codes, vec![1.0, 0.0]);
        assert_eq!(unseen, 0);
    }

    #[test]
    fn test_numeric_classes_sort_by_value() {
        let encoder = LabelEncoder::fit("no_of_adults", &["10", "2", "1", "2", "0"]);
        assert_eq!(encoder.classes(), &["0", "1", "2", "10"]);
        assert_eq!(encoder.code("10"), Some(3));

        let (codes, unseen) = encoder.transform(&["2", "10", "3", "x"]);
        assert_eq!(codes, vec![2.0, 3.0, 4.0, 4.0]);
        assert_eq!(unseen, 2);
    }

    #[test]
    fn test_mixed_classes_sort_as_strings() {
        let encoder = LabelEncoder::fit("room", &["10", "2", "Room_Type 1"]);
        assert_eq!(encoder.classes(), &["10", "2", "Room_Type 1"]);
        assert_eq!(encoder.code("2"), Some(1));
    }

    #[test]
    fn test_unseen_category_gets_extra_code() {
        let enc = LabelEncoder::fit("meal", &["Meal Plan 1", "Not Selected"]);
        let (codes, unseen) = enc.transform(&["Meal Plan 3", "Not Selected"]);

        assert_eq!(codes, vec![2.0, 1.0]);
        assert_eq!(unseen, 1);
    }

    #[test]
    fn test_strict_rejects_unseen() {
        let enc = LabelEncoder::fit("booking_status", &["Canceled", "Not_Canceled"]);
        assert_eq!(enc.transform_strict(&["Not_Canceled"]).unwrap(), vec![1.0]);

        let err = enc.transform_strict(&["Pending"]).unwrap_err();
        assert!(matches!(err, FeatureError::UnseenLabel { ref value, .. } if value == "Pending"));
    }
}
