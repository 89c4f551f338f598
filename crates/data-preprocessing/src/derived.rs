//! Engineered columns

use crate::FeatureError;
use pipeline_core::{DerivedColumn, DerivedKind};
use tabular::NumericTable;

/// Values of one derived column computed row by row from `table`
pub fn compute_derived(derived: &DerivedColumn, table: &NumericTable) -> Result<Vec<f64>, FeatureError> {
    let inputs = derived
        .columns
        .iter()
        .map(|name| {
            table
                .column(name)
                .map_err(|_| FeatureError::MissingColumn(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if derived.kind == DerivedKind::Ratio && inputs.len() != 2 {
        return Err(FeatureError::Arity {
            column: derived.name.clone(),
            inputs: inputs.len(),
        });
    }

    let values = (0..table.n_rows())
        .map(|row| match derived.kind {
            DerivedKind::Sum => inputs.iter().map(|col| col[row]).sum::<f64>(),
            DerivedKind::Difference => {
                let mut cols = inputs.iter();
                let first = cols.next().map_or(0.0, |col| col[row]);
                cols.fold(first, |acc, col| acc - col[row])
            }
            DerivedKind::Ratio => {
                let (num, den) = (inputs[0][row], inputs[1][row]);
                if den == 0.0 {
                    0.0
                } else {
                    num / den
                }
            }
        })
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> NumericTable {
        let mut t = NumericTable::with_rows(3);
        t.push_column("a", vec![1.0, 2.0, 3.0]).unwrap();
        t.push_column("b", vec![4.0, 0.0, 1.5]).unwrap();
        t.push_column("c", vec![1.0, 1.0, 1.0]).unwrap();
        t
    }

    fn derived(kind: DerivedKind, columns: &[&str]) -> DerivedColumn {
        DerivedColumn {
            name: "out".into(),
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_sum_and_difference() {
        let t = table();
        assert_eq!(
            compute_derived(&derived(DerivedKind::Sum, &["a", "b", "c"]), &t).unwrap(),
            vec![6.0, 3.0, 5.5]
        );
        assert_eq!(
            compute_derived(&derived(DerivedKind::Difference, &["b", "a", "c"]), &t).unwrap(),
            vec![2.0, -3.0, -2.5]
        );
    }

    #[test]
    fn test_ratio_zero_divisor() {
        let values = compute_derived(&derived(DerivedKind::Ratio, &["a", "b"]), &table()).unwrap();
        assert_eq!(values, vec![0.25, 0.0, 2.0]);
    }

    #[test]
    fn test_missing_input() {
        let err = compute_derived(&derived(DerivedKind::Sum, &["a", "zzz"]), &table()).unwrap_err();
        assert!(matches!(err, FeatureError::MissingColumn(ref c) if c == "zzz"));
    }
}
