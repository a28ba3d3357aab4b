use serde::{Deserialize, Serialize};

/// All 58 Algerian wilayas in official numbering order. This is the
/// offline fallback body for the reference-data endpoint, so the list and
/// its order must match what the API serves.
pub const ALGERIAN_WILAYAS: [&str; 58] = [
    "Adrar",
    "Chlef",
    "Laghouat",
    "Oum El Bouaghi",
    "Batna",
    "Béjaïa",
    "Biskra",
    "Béchar",
    "Blida",
    "Bouira",
    "Tamanrasset",
    "Tébessa",
    "Tlemcen",
    "Tiaret",
    "Tizi Ouzou",
    "Alger",
    "Djelfa",
    "Jijel",
    "Sétif",
    "Saïda",
    "Skikda",
    "Sidi Bel Abbès",
    "Annaba",
    "Guelma",
    "Constantine",
    "Médéa",
    "Mostaganem",
    "M'Sila",
    "Mascara",
    "Ouargla",
    "Oran",
    "El Bayadh",
    "Illizi",
    "Bordj Bou Arréridj",
    "Boumerdès",
    "El Tarf",
    "Tindouf",
    "Tissemsilt",
    "El Oued",
    "Khenchela",
    "Souk Ahras",
    "Tipaza",
    "Mila",
    "Aïn Defla",
    "Naâma",
    "Aïn Témouchent",
    "Ghardaïa",
    "Relizane",
    "Timimoun",
    "Bordj Badji Mokhtar",
    "Ouled Djellal",
    "Béni Abbès",
    "In Salah",
    "In Guezzam",
    "Touggourt",
    "Djanet",
    "El Meghaier",
    "El Meniaa",
];

/// Wire shape of the reference-data endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatesResponse {
    pub states: Vec<String>,
}

impl StatesResponse {
    /// The synthesized offline body: the full fixed wilaya list.
    pub fn offline() -> Self {
        Self {
            states: ALGERIAN_WILAYAS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wilaya_count_is_58() {
        assert_eq!(ALGERIAN_WILAYAS.len(), 58);
        assert_eq!(StatesResponse::offline().states.len(), 58);
    }

    #[test]
    fn test_wilaya_order_endpoints() {
        assert_eq!(ALGERIAN_WILAYAS[0], "Adrar");
        assert_eq!(ALGERIAN_WILAYAS[15], "Alger");
        assert_eq!(ALGERIAN_WILAYAS[57], "El Meniaa");
    }

    #[test]
    fn test_wilayas_are_distinct() {
        let mut names: Vec<&str> = ALGERIAN_WILAYAS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 58);
    }

    #[test]
    fn test_parse_states_response() {
        let json = r#"{"states": ["Adrar", "Chlef"]}"#;
        let parsed: StatesResponse = serde_json::from_str(json).expect("states should parse");
        assert_eq!(parsed.states, vec!["Adrar", "Chlef"]);
    }
}
