use qel_core::QelError;
use qel_units::{parse_quantity, parse_unit, BaseDimension, Dimensions, UnitError, UnitSystem};

fn system() -> &'static UnitSystem {
    UnitSystem::shared().unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
}

#[test]
fn tokens_resolve_prefixes_and_whole_names() {
    let s = system();
    let kilonewton = s.lookup("kN").unwrap();
    assert!(close(kilonewton.multiplier(), 1e6));
    assert_eq!(kilonewton.dimensions(), Dimensions([-2, 1, 1, 0, 0, 0, 0]));

    assert!(close(s.lookup("min").unwrap().multiplier(), 60.0));
    assert!(close(s.lookup("mi").unwrap().multiplier(), 1_609.344));
    assert!(close(s.lookup("μs").unwrap().multiplier(), 1e-6));
    assert!(close(s.lookup("us").unwrap().multiplier(), 1e-6));
    assert!(close(s.lookup("dam").unwrap().multiplier(), 10.0));
    assert!(close(s.lookup("kg").unwrap().multiplier(), 1_000.0));
    assert_eq!(
        s.lookup("mol").unwrap().dimensions(),
        Dimensions::base(BaseDimension::Amount)
    );
    assert_eq!(
        s.lookup("cd").unwrap().dimensions(),
        Dimensions::base(BaseDimension::Luminosity)
    );
    assert!(s.lookup("Pa").is_some());
    assert!(s.lookup("furlong").is_none());
    assert!(s.lookup("kmin").is_none());
}

#[test]
fn shared_registry_is_built_once() {
    let a = UnitSystem::shared().unwrap() as *const UnitSystem;
    let b = UnitSystem::shared().unwrap() as *const UnitSystem;
    assert_eq!(a, b);
}

#[test]
fn unit_expressions_combine() {
    let s = system();
    let newton = s.lookup("N").unwrap();
    assert!(parse_unit("kg m/s^2", s).unwrap().matches(&newton));
    assert!(parse_unit("kg*m*s**-2", s).unwrap().matches(&newton));
    assert!(parse_unit("N·m", s)
        .unwrap()
        .matches(&s.lookup("J").unwrap()));
    assert!(parse_unit("1/s", s)
        .unwrap()
        .matches(&s.lookup("Hz").unwrap()));
    let squared = parse_unit("(m / s)^2", s).unwrap();
    assert_eq!(squared.dimensions(), Dimensions([-2, 2, 0, 0, 0, 0, 0]));
    let inverse = parse_unit("m**(-2)", s).unwrap();
    assert_eq!(inverse.dimensions(), Dimensions([0, -2, 0, 0, 0, 0, 0]));
    assert!(!parse_unit("km", s).unwrap().matches(&s.lookup("m").unwrap()));
}

#[test]
fn unit_expression_errors() {
    let s = system();
    assert_eq!(
        parse_unit("m +", s).unwrap_err(),
        UnitError::InvalidExpression { offset: 1 }
    );
    let err = parse_unit("furlong/s", s).unwrap_err();
    assert_eq!(
        err,
        UnitError::UndefinedUnit {
            name: "furlong".into()
        }
    );
    assert_eq!(err.to_string(), "Invalid unit.");
    let err: QelError = err.into();
    assert_eq!(err.info().context.get("unit").map(String::as_str), Some("furlong"));
    assert!(parse_unit("m2", s).is_err());
}

#[test]
fn quantities_split_magnitude_from_unit() {
    let s = system();
    let g = parse_quantity("9.81 m/s^2", s).unwrap();
    assert!(close(g.magnitude(), 9.81));
    assert_eq!(g.symbol(), "m/s^2");

    let negative = parse_quantity("\u{2212}3 km", s).unwrap();
    assert!(close(negative.to_base(), -3_000.0));

    let packed = parse_quantity("2.5e3m", s).unwrap();
    assert!(close(packed.magnitude(), 2_500.0));
    assert_eq!(packed.symbol(), "m");

    let bare = parse_quantity("5", s).unwrap();
    assert!(!bare.has_unit());
    assert!(bare.is_dimensionless());

    let angle = parse_quantity("1.5 rad", s).unwrap();
    assert!(angle.has_unit());
    assert!(angle.is_dimensionless());

    let unitless = parse_quantity("eV", s).unwrap();
    assert!(close(unitless.magnitude(), 1.0));
    assert_eq!(parse_quantity("5 m", s).unwrap().to_string(), "5 m");
}
