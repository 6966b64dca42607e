use num_complex::Complex64;
use proptest::prelude::*;
use qel_numeric::{
    format_array, format_integer, parse_array, parse_integer, Dialect, Number, NumericArray,
};

fn real_grid() -> impl Strategy<Value = Vec<Vec<f64>>> {
    (1usize..4, 1usize..4).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(prop::collection::vec(-1e6f64..1e6, cols), rows)
    })
}

fn complex_grid() -> impl Strategy<Value = Vec<Vec<(f64, f64)>>> {
    (1usize..3, 1usize..3).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(
            prop::collection::vec((-1e3f64..1e3, -1e3f64..1e3), cols),
            rows,
        )
    })
}

proptest! {
    #[test]
    fn real_arrays_round_trip_in_both_dialects(grid in real_grid()) {
        let rows = grid
            .into_iter()
            .map(|row| row.into_iter().map(Number::Real).collect())
            .collect();
        let array = NumericArray::from_rows(rows).unwrap();
        for dialect in [Dialect::Matlab, Dialect::Python] {
            let text = format_array(&array, dialect, None);
            let (parsed, detected) = parse_array(&text, false).unwrap();
            prop_assert_eq!(detected, dialect);
            prop_assert_eq!(&parsed, &array);
        }
    }

    #[test]
    fn complex_arrays_round_trip(grid in complex_grid()) {
        let rows = grid
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(re, im)| Number::Complex(Complex64::new(re, im)))
                    .collect()
            })
            .collect();
        let array = NumericArray::from_rows(rows).unwrap();
        for dialect in [Dialect::Matlab, Dialect::Python] {
            let text = format_array(&array, dialect, None);
            let (parsed, _) = parse_array(&text, true).unwrap();
            prop_assert_eq!(&parsed, &array);
        }
    }

    #[test]
    fn integers_round_trip_in_every_base(value in any::<i128>(), base in 2u32..=36) {
        let text = format_integer(value, base).unwrap();
        prop_assert_eq!(parse_integer(&text, base).unwrap(), value);
    }

    #[test]
    fn parsing_never_panics(text in "\\PC{0,40}") {
        let _ = parse_array(&text, true);
        let _ = parse_array(&text, false);
        let _ = parse_integer(&text, 0);
    }
}
