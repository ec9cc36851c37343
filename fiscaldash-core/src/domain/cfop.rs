//! CFOP (tax-operation code) descriptions
//!
//! The mapping is static data; it is never derived from the loaded files.

/// Code assigned when no CFOP value is available
pub const UNIDENTIFIED_CODE: &str = "Não identificado";

/// Description paired with [`UNIDENTIFIED_CODE`]
pub const CODE_NOT_FOUND_DESCRIPTION: &str = "CFOP não encontrado";

/// Description for codes missing from the mapping
pub const OTHER_DESCRIPTION: &str = "Other";

const CFOP_DESCRIPTIONS: &[(&str, &str)] = &[
    ("5101", "Venda de mercadorias"),
    ("5102", "Venda de mercadorias"),
    ("5905", "Remessa para depósito fechado"),
    ("5910", "Bonificação - Dentro do estado"),
    ("6101", "Venda de mercadorias"),
    ("6102", "Venda de mercadorias"),
    ("6108", "Venda de mercadorias"),
    ("6905", "Remessa para depósito"),
    ("6910", "Bonificação - Fora do estado"),
];

/// Look up the description of a code
pub fn describe(code: &str) -> &'static str {
    if code == UNIDENTIFIED_CODE {
        return CODE_NOT_FOUND_DESCRIPTION;
    }
    CFOP_DESCRIPTIONS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, description)| *description)
        .unwrap_or(OTHER_DESCRIPTION)
}

/// All known codes with their descriptions, ordered by code
pub fn legend() -> &'static [(&'static str, &'static str)] {
    CFOP_DESCRIPTIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_to_their_description() {
        assert_eq!(describe("5102"), "Venda de mercadorias");
        assert_eq!(describe("5910"), "Bonificação - Dentro do estado");
        assert_eq!(describe("6910"), "Bonificação - Fora do estado");
        assert_eq!(describe("5905"), "Remessa para depósito fechado");
    }

    #[test]
    fn test_unknown_codes_map_to_other() {
        for code in ["9999", "", "5102 ", "nan", "1.202"] {
            assert_eq!(describe(code), OTHER_DESCRIPTION, "code {:?}", code);
        }
    }

    #[test]
    fn test_unidentified_code_has_not_found_description() {
        assert_eq!(describe(UNIDENTIFIED_CODE), CODE_NOT_FOUND_DESCRIPTION);
    }

    #[test]
    fn test_every_legend_entry_round_trips_through_describe() {
        for (code, description) in legend() {
            assert_eq!(describe(code), *description);
        }
    }
}
