use proptest::prelude::*;
use qel_units::{parse_quantity, UnitSystem};

const SYMBOLS: &[&str] = &["m", "km", "m/s^2", "kg m / s^2", "N·m", "μA", "ft", "1/s", "mol/L"];

proptest! {
    #[test]
    fn formatted_quantities_parse_back(
        magnitude in -1e9f64..1e9,
        symbol in prop::sample::select(SYMBOLS),
    ) {
        let system = UnitSystem::shared().unwrap();
        let quantity = parse_quantity(&format!("{magnitude} {symbol}"), system).unwrap();
        let reparsed = parse_quantity(&quantity.to_string(), system).unwrap();
        prop_assert_eq!(reparsed, quantity);
    }

    #[test]
    fn arbitrary_text_never_panics(text in "\\PC{0,24}") {
        let system = UnitSystem::shared().unwrap();
        let _ = parse_quantity(&text, system);
    }
}
