//! Static content tables: journey steps, delay events, support tokens, and the board deck.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

const DEFAULT_STEPS_DATA: &str = include_str!("../data/steps.json");
const DEFAULT_EVENT_DECK_DATA: &str = include_str!("../data/event_deck.json");
const DEFAULT_BOARD_DECK_DATA: &str = include_str!("../data/board_deck.json");
const DEFAULT_SUPPORTS_DATA: &str = include_str!("../data/supports.json");

/// Non-medical barrier category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "INS")]
    Insurance,
    #[serde(rename = "ADM")]
    Paperwork,
    #[serde(rename = "TRN")]
    Transport,
    #[serde(rename = "WRK")]
    Work,
    #[serde(rename = "CHD")]
    Childcare,
    #[serde(rename = "CLN")]
    Clinic,
}

impl Category {
    pub const ALL: [Self; 6] = [
        Self::Insurance,
        Self::Paperwork,
        Self::Transport,
        Self::Work,
        Self::Childcare,
        Self::Clinic,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Insurance => "INS",
            Self::Paperwork => "ADM",
            Self::Transport => "TRN",
            Self::Work => "WRK",
            Self::Childcare => "CHD",
            Self::Clinic => "CLN",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Insurance => "Insurance",
            Self::Paperwork => "Paperwork",
            Self::Transport => "Transport",
            Self::Work => "Work",
            Self::Childcare => "Childcare",
            Self::Clinic => "Clinic",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Insurance => "🧾",
            Self::Paperwork => "📄",
            Self::Transport => "🚌",
            Self::Work => "🕒",
            Self::Childcare => "🧸",
            Self::Clinic => "🏥",
        }
    }

    /// Dense index used by per-category totals.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Insurance => 0,
            Self::Paperwork => 1,
            Self::Transport => 2,
            Self::Work => 3,
            Self::Childcare => 4,
            Self::Clinic => 5,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Consumable support token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportKind {
    #[serde(rename = "NAV")]
    Navigator,
    #[serde(rename = "RIDE")]
    RideVoucher,
    #[serde(rename = "LEAVE")]
    PaidLeave,
    #[serde(rename = "FUND")]
    SupportFund,
}

/// Display and coverage data for one support token kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportDef {
    pub kind: SupportKind,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub covers: Vec<Category>,
}

/// Immutable delay event entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCard {
    pub category: Category,
    pub title: String,
    pub base_days: u32,
    pub stress: u32,
    pub why: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventDeck {
    pub events: Vec<EventCard>,
}

/// Card drawn in the board race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardCard {
    /// Delay card; `spaces` is the baseline severity before mitigations.
    Setback {
        category: Category,
        title: String,
        spaces: u32,
        #[serde(default)]
        stress: u32,
        why: String,
    },
    /// Fast-track card, moves the player forward.
    Boost {
        title: String,
        spaces: u32,
        why: String,
    },
}

impl BoardCard {
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Setback { title, .. } | Self::Boost { title, .. } => title,
        }
    }

    #[must_use]
    pub fn why(&self) -> &str {
        match self {
            Self::Setback { why, .. } | Self::Boost { why, .. } => why,
        }
    }

    #[must_use]
    pub const fn category(&self) -> Option<Category> {
        match self {
            Self::Setback { category, .. } => Some(*category),
            Self::Boost { .. } => None,
        }
    }

    /// View a setback as a resolvable event measured in spaces.
    #[must_use]
    pub fn as_event(&self) -> Option<EventCard> {
        match self {
            Self::Setback {
                category,
                title,
                spaces,
                stress,
                why,
            } => Some(EventCard {
                category: *category,
                title: title.clone(),
                base_days: *spaces,
                stress: *stress,
                why: why.clone(),
            }),
            Self::Boost { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoardDeck {
    pub cards: Vec<BoardCard>,
}

/// All content needed by the simulations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub steps: Vec<String>,
    pub events: EventDeck,
    pub supports: Vec<SupportDef>,
    pub board: BoardDeck,
}

impl Catalog {
    /// Parse the catalog from its four JSON documents.
    ///
    /// # Errors
    ///
    /// Returns an error if any document cannot be parsed.
    pub fn from_json(
        steps: &str,
        events: &str,
        supports: &str,
        board: &str,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            steps: serde_json::from_str(steps)?,
            events: serde_json::from_str(events)?,
            supports: serde_json::from_str(supports)?,
            board: serde_json::from_str(board)?,
        })
    }

    /// Load the tables compiled into the crate.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(
            DEFAULT_STEPS_DATA,
            DEFAULT_EVENT_DECK_DATA,
            DEFAULT_SUPPORTS_DATA,
            DEFAULT_BOARD_DECK_DATA,
        )
        .unwrap_or_default()
    }

    /// Empty catalog (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn step_name(&self, index: usize) -> &str {
        self.steps.get(index).map_or("Diagnosis", String::as_str)
    }

    #[must_use]
    pub fn support(&self, kind: SupportKind) -> Option<&SupportDef> {
        self.supports.iter().find(|def| def.kind == kind)
    }

    /// Whether a token of `kind` may cancel an event of `category`.
    #[must_use]
    pub fn covers(&self, kind: SupportKind, category: Category) -> bool {
        self.support(kind)
            .is_some_and(|def| def.covers.contains(&category))
    }

    #[must_use]
    pub fn support_label(&self, kind: SupportKind) -> String {
        self.support(kind).map_or_else(
            || format!("{kind:?}"),
            |def| format!("{} {}", def.name, def.icon),
        )
    }
}

/// Shared handle to the compiled-in catalog.
#[must_use]
pub fn shared() -> Arc<Catalog> {
    static CATALOG: OnceLock<Arc<Catalog>> = OnceLock::new();
    CATALOG
        .get_or_init(|| Arc::new(Catalog::load_from_static()))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_catalog_has_expected_shapes() {
        let catalog = Catalog::load_from_static();
        assert_eq!(catalog.steps.len(), 9);
        assert_eq!(catalog.steps[0], "Diagnosis");
        assert_eq!(catalog.steps[8], "Start Treatment");
        assert_eq!(catalog.events.events.len(), 13);
        assert_eq!(catalog.supports.len(), 4);
        assert!(!catalog.board.cards.is_empty());
    }

    #[test]
    fn every_category_appears_in_event_deck() {
        let catalog = Catalog::load_from_static();
        for category in Category::ALL {
            assert!(
                catalog
                    .events
                    .events
                    .iter()
                    .any(|event| event.category == category),
                "missing {category}"
            );
        }
    }

    #[test]
    fn coverage_follows_support_table() {
        let catalog = Catalog::load_from_static();
        assert!(catalog.covers(SupportKind::Navigator, Category::Insurance));
        assert!(catalog.covers(SupportKind::RideVoucher, Category::Transport));
        assert!(!catalog.covers(SupportKind::RideVoucher, Category::Insurance));
        assert!(catalog.covers(SupportKind::SupportFund, Category::Childcare));
        assert!(!Catalog::empty().covers(SupportKind::Navigator, Category::Insurance));
    }

    #[test]
    fn board_cards_parse_both_kinds() {
        let json = r#"{ "cards": [
            { "kind": "setback", "category": "TRN", "title": "Late bus", "spaces": 2, "why": "x" },
            { "kind": "boost", "title": "Open slot", "spaces": 3, "why": "y" }
        ] }"#;
        let deck: BoardDeck = serde_json::from_str(json).expect("parse deck");
        assert_eq!(deck.cards[0].category(), Some(Category::Transport));
        assert_eq!(deck.cards[0].as_event().map(|e| e.stress), Some(0));
        assert!(deck.cards[1].as_event().is_none());
        assert_eq!(deck.cards[1].title(), "Open slot");
    }

    #[test]
    fn category_codes_roundtrip_through_serde() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).expect("serialize");
            assert_eq!(json, format!("\"{}\"", category.code()));
        }
        assert_eq!(Category::Clinic.index(), 5);
    }
}
