//! Label classification: block/database splitting, section resolution and
//! per-unit subsection extraction.
//!
//! The label grammar is loose, grown alongside the PLC data blocks it
//! mirrors, so classification works on ordered substring rules rather than
//! a formal grammar. Rule order is significant: the first matching rule
//! wins.

/// Labels with this prefix bypass section classification entirely.
pub const GLOBAL_PREFIX: &str = "DB_GlobalData";

/// Highest unit index the structured output emits.
pub const MAX_UNIT: u32 = 16;

/// Top-level sections in canonical emission order.
///
/// The `Ord` derive follows declaration order, which is the fixed output
/// order of the structured document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    AllgemeineParameter,
    Ventilkonfiguration,
    KonfigurationLangzeittest,
    KonfigurationDetailtest,
    KonfigurationEinzeltest,
    Kommandos,
    DatenLangzeittest,
    DatenStrommessung,
    DatenDurchflussmessung,
    DatenKraftmessung,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::AllgemeineParameter,
        Section::Ventilkonfiguration,
        Section::KonfigurationLangzeittest,
        Section::KonfigurationDetailtest,
        Section::KonfigurationEinzeltest,
        Section::Kommandos,
        Section::DatenLangzeittest,
        Section::DatenStrommessung,
        Section::DatenDurchflussmessung,
        Section::DatenKraftmessung,
    ];

    /// Element name of this section in the structured document.
    pub fn key(&self) -> &'static str {
        match self {
            Section::AllgemeineParameter => "DB_AllgemeineParameter_1-4",
            Section::Ventilkonfiguration => "DB_Ventilkonfiguration_1-4",
            Section::KonfigurationLangzeittest => "DB_Konfiguration_Langzeittest_1-4",
            Section::KonfigurationDetailtest => "DB_Konfiguration_Detailtest_1-4",
            Section::KonfigurationEinzeltest => "DB_Konfiguration_Einzeltest_1-4",
            Section::Kommandos => "DB_Kommandos_1-4",
            Section::DatenLangzeittest => "DB_Daten_Langzeittest_1-4",
            Section::DatenStrommessung => "DB_Daten_Strommessung_1-4",
            Section::DatenDurchflussmessung => "DB_Daten_Durchflussmessung_1-4",
            Section::DatenKraftmessung => "DB_Daten_Kraftmessung_1-4",
        }
    }

    /// Banner title: the key with underscores spaced out.
    pub fn title(&self) -> String {
        self.key().replace('_', " ")
    }
}

/// One of the four fixed block groupings under every section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Block {
    Block1,
    Block2,
    Block3,
    Block4,
}

impl Block {
    pub const ALL: [Block; 4] = [Block::Block1, Block::Block2, Block::Block3, Block::Block4];

    /// Parse a block key. Anything but `Block1..Block4` is a
    /// classification failure for the entry that carried it.
    pub fn parse(key: &str) -> Option<Block> {
        match key {
            "Block1" => Some(Block::Block1),
            "Block2" => Some(Block::Block2),
            "Block3" => Some(Block::Block3),
            "Block4" => Some(Block::Block4),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Block::Block1 => "Block1",
            Block::Block2 => "Block2",
            Block::Block3 => "Block3",
            Block::Block4 => "Block4",
        }
    }
}

/// Result of splitting a dotted label. Total: every label yields a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelParts<'a> {
    /// First segment, when it begins with the reserved `Block` prefix.
    pub block: Option<&'a str>,
    /// Second segment (the database name), when present.
    pub database: Option<&'a str>,
    /// Segments three onward rejoined with `.`; empty when absent.
    pub remainder: String,
}

/// Split a label into (block, database, remainder). Labels with fewer than
/// two segments yield no block and no database.
pub fn split_label(label: &str) -> LabelParts<'_> {
    let parts: Vec<&str> = label.split('.').collect();
    if parts.len() < 2 {
        return LabelParts {
            block: None,
            database: None,
            remainder: String::new(),
        };
    }
    LabelParts {
        block: if parts[0].starts_with("Block") {
            Some(parts[0])
        } else {
            None
        },
        database: Some(parts[1]),
        remainder: parts[2..].join("."),
    }
}

/// Resolve the top-level section for a database name.
///
/// The Detailtest data family is a multi-measurement container; the label
/// disambiguates among the three measurement subtypes. No match resolves
/// to `None` and the entry is later dropped from the structured output.
pub fn resolve_section(database: &str, label: &str) -> Option<Section> {
    if database.contains("AllgemeineParameter") {
        Some(Section::AllgemeineParameter)
    } else if database.contains("VentilKonfiguration") {
        Some(Section::Ventilkonfiguration)
    } else if database.contains("LangzeittestKonfiguration") {
        Some(Section::KonfigurationLangzeittest)
    } else if database.contains("DetailtestKonfiguration") {
        Some(Section::KonfigurationDetailtest)
    } else if database.contains("EinzeltestKonfiguration") {
        Some(Section::KonfigurationEinzeltest)
    } else if database.contains("Kommandos") {
        Some(Section::Kommandos)
    } else if database.contains("Daten_Langzeittest") {
        Some(Section::DatenLangzeittest)
    } else if database.contains("Daten_Detailtest") {
        if label.contains("Strommessung") {
            Some(Section::DatenStrommessung)
        } else if label.contains("Durchflussmessung") {
            Some(Section::DatenDurchflussmessung)
        } else if label.contains("Kraftmessung") {
            Some(Section::DatenKraftmessung)
        } else {
            None
        }
    } else {
        None
    }
}

/// Extract the per-unit subsection index for the three measurement
/// families. Current measurements mark the unit with `DB_Ventil_Ext{N}`,
/// flow and force measurements with a bare `DB_Ventil{N}`.
///
/// No bound check happens here; the emitter excludes indices outside
/// `1..=MAX_UNIT`.
pub fn resolve_unit(label: &str) -> Option<u32> {
    if label.contains("DB_Strommessung1.DB_Ventil") {
        if let Some(unit) = digits_after(label, "DB_Ventil_Ext") {
            return Some(unit);
        }
    }
    if label.contains("DB_Durchflussmessung1.DB_Ventil") {
        if let Some(unit) = digits_after(label, "DB_Ventil") {
            return Some(unit);
        }
    }
    if label.contains("DB_Kraftmessung1.DB_Ventil") {
        if let Some(unit) = digits_after(label, "DB_Ventil") {
            return Some(unit);
        }
    }
    None
}

/// Scan for the first occurrence of `marker` that is immediately followed
/// by at least one decimal digit and parse the digit run.
fn digits_after(label: &str, marker: &str) -> Option<u32> {
    let mut search = label;
    while let Some(found) = search.find(marker) {
        let tail = &search[found + marker.len()..];
        let digits: String = tail.chars().take_while(|ch| ch.is_ascii_digit()).collect();
        if !digits.is_empty() {
            return digits.parse().ok();
        }
        search = &search[found + marker.len()..];
    }
    None
}

/// Whether an annotation would duplicate a structural banner and must be
/// suppressed at emission: it contains the banner delimiter run or the
/// block keyword.
pub fn is_banner_like(text: &str) -> bool {
    text.contains("===") || text.contains("Block")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_label_full() {
        let parts = split_label("Block1.DB_AllgemeineParameter.Zykluszeit.Soll");
        assert_eq!(parts.block, Some("Block1"));
        assert_eq!(parts.database, Some("DB_AllgemeineParameter"));
        assert_eq!(parts.remainder, "Zykluszeit.Soll");
    }

    #[test]
    fn test_split_label_is_total() {
        let parts = split_label("Standalone");
        assert_eq!(parts.block, None);
        assert_eq!(parts.database, None);
        assert_eq!(parts.remainder, "");

        let parts = split_label("");
        assert_eq!(parts.block, None);
        assert_eq!(parts.remainder, "");
    }

    #[test]
    fn test_split_label_non_block_prefix() {
        let parts = split_label("Station.DB_Kommandos.Start");
        assert_eq!(parts.block, None);
        assert_eq!(parts.database, Some("DB_Kommandos"));
    }

    #[test]
    fn test_section_rules_first_match_wins() {
        assert_eq!(
            resolve_section("DB_AllgemeineParameter", ""),
            Some(Section::AllgemeineParameter)
        );
        assert_eq!(
            resolve_section("DB_VentilKonfiguration", ""),
            Some(Section::Ventilkonfiguration)
        );
        assert_eq!(
            resolve_section("DB_LangzeittestKonfiguration", ""),
            Some(Section::KonfigurationLangzeittest)
        );
        assert_eq!(resolve_section("DB_Kommandos", ""), Some(Section::Kommandos));
        assert_eq!(resolve_section("DB_Unbekannt", ""), None);
    }

    #[test]
    fn test_detailtest_family_needs_label() {
        let db = "DB_Daten_Detailtest";
        assert_eq!(
            resolve_section(db, "Block1.DB_Daten_Detailtest.DB_Strommessung1.Wert"),
            Some(Section::DatenStrommessung)
        );
        assert_eq!(
            resolve_section(db, "Block1.DB_Daten_Detailtest.DB_Durchflussmessung1.Wert"),
            Some(Section::DatenDurchflussmessung)
        );
        assert_eq!(
            resolve_section(db, "Block1.DB_Daten_Detailtest.DB_Kraftmessung1.Wert"),
            Some(Section::DatenKraftmessung)
        );
        assert_eq!(resolve_section(db, "Block1.DB_Daten_Detailtest.Sonstiges"), None);
    }

    #[test]
    fn test_unit_extraction_current_measurement() {
        assert_eq!(
            resolve_unit("Block1.DB_Daten_Detailtest.DB_Strommessung1.DB_Ventil_Ext7.Strom"),
            Some(7)
        );
    }

    #[test]
    fn test_unit_extraction_flow_and_force() {
        assert_eq!(
            resolve_unit("Block2.DB_Daten_Detailtest.DB_Durchflussmessung1.DB_Ventil12.Durchfluss"),
            Some(12)
        );
        assert_eq!(
            resolve_unit("Block3.DB_Daten_Detailtest.DB_Kraftmessung1.DB_Ventil3.Kraft"),
            Some(3)
        );
    }

    #[test]
    fn test_unit_extraction_out_of_range_is_still_extracted() {
        // Bound enforcement belongs to the emitter, not the resolver.
        assert_eq!(
            resolve_unit("Block1.DB_Daten_Detailtest.DB_Strommessung1.DB_Ventil_Ext17.Strom"),
            Some(17)
        );
    }

    #[test]
    fn test_unit_extraction_none_without_marker() {
        assert_eq!(resolve_unit("Block1.DB_AllgemeineParameter.Zykluszeit"), None);
        // Marker without digits does not match.
        assert_eq!(
            resolve_unit("Block1.DB_Daten_Detailtest.DB_Durchflussmessung1.DB_Ventil.Summe"),
            None
        );
    }

    #[test]
    fn test_banner_predicate() {
        assert!(is_banner_like("========="));
        assert!(is_banner_like(" Block3 "));
        assert!(is_banner_like(" DB Kommandos 1-4 =========="));
        assert!(!is_banner_like(" Zykluszeit aktueller Test "));
        assert!(!is_banner_like(""));
    }
}
