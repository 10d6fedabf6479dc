//! Peso / UVA conversion.
//!
//! The index value is always positive: every tier of the fallback chain,
//! including the hardcoded default, yields a positive number.

/// Converts a peso amount into UVAs at the given index value.
pub fn pesos_to_uva(pesos: f64, uva_value: f64) -> f64 {
    debug_assert!(uva_value > 0.0, "UVA value must be positive");
    pesos / uva_value
}

/// Converts a UVA amount into pesos at the given index value.
pub fn uva_to_pesos(uvas: f64, uva_value: f64) -> f64 {
    debug_assert!(uva_value > 0.0, "UVA value must be positive");
    uvas * uva_value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion() {
        assert_eq!(pesos_to_uva(2969.64, 1484.82), 2.0);
        assert_eq!(uva_to_pesos(2.0, 1484.82), 2969.64);
    }

    #[test]
    fn test_round_trip() {
        for (pesos, uva) in [
            (35_000_000.0, 1484.82),
            (1.0, 0.01),
            (123_456.78, 731.5),
        ] {
            let back = uva_to_pesos(pesos_to_uva(pesos, uva), uva);
            assert!(
                (back - pesos).abs() < 1e-6 * pesos.max(1.0),
                "round trip drifted: {pesos} -> {back}"
            );
        }
    }
}
