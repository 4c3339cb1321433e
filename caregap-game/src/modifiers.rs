//! Delay modifier resolution.
//!
//! Mitigations are a flat rule table. Each active mitigation contributes a
//! fixed reduction for its target categories; contributions are summed once,
//! so the order in which supports and levers were toggled never matters.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::catalog::{Category, EventCard};
use crate::constants::{
    BOARD_MAX_SETBACK, BOARD_MAX_STRESS, JOURNEY_MAX_DAYS, JOURNEY_MAX_STRESS,
    JOURNEY_STRESS_SPIKE_DAYS, LEVER_REDUCTION, NAVIGATOR_PROGRAM_REDUCTION,
    NAVIGATOR_STRESS_RELIEF, SUPPORT_REDUCTION,
};
use crate::numbers::clamp_to_u32;

/// Personal support a single participant may or may not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalSupport {
    Navigator,
    Ride,
    PaidLeave,
}

impl PersonalSupport {
    pub const ALL: [Self; 3] = [Self::Navigator, Self::Ride, Self::PaidLeave];
}

impl FromStr for PersonalSupport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nav" | "navigator" => Ok(Self::Navigator),
            "ride" => Ok(Self::Ride),
            "leave" | "paid_leave" | "paid-leave" => Ok(Self::PaidLeave),
            other => Err(format!("unknown personal support: {other}")),
        }
    }
}

/// Run-wide policy lever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyLever {
    NavigatorProgram,
    Transit,
    AdminSimplification,
    PaidLeave,
    ClinicCapacity,
}

impl PolicyLever {
    pub const ALL: [Self; 5] = [
        Self::NavigatorProgram,
        Self::Transit,
        Self::AdminSimplification,
        Self::PaidLeave,
        Self::ClinicCapacity,
    ];
}

impl FromStr for PolicyLever {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nav" | "navigator" | "navigator_program" => Ok(Self::NavigatorProgram),
            "transit" | "trn" => Ok(Self::Transit),
            "admin" | "adm" | "admin_simplification" => Ok(Self::AdminSimplification),
            "leave" | "paid_leave" | "paid-leave" => Ok(Self::PaidLeave),
            "capacity" | "cap" | "clinic_capacity" => Ok(Self::ClinicCapacity),
            other => Err(format!("unknown policy lever: {other}")),
        }
    }
}

/// Toggle set of personal supports for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonalSupports {
    #[serde(default)]
    pub navigator: bool,
    #[serde(default)]
    pub ride: bool,
    #[serde(default)]
    pub paid_leave: bool,
}

impl PersonalSupports {
    #[must_use]
    pub const fn is_active(&self, support: PersonalSupport) -> bool {
        match support {
            PersonalSupport::Navigator => self.navigator,
            PersonalSupport::Ride => self.ride,
            PersonalSupport::PaidLeave => self.paid_leave,
        }
    }

    pub const fn set(&mut self, support: PersonalSupport, enabled: bool) {
        match support {
            PersonalSupport::Navigator => self.navigator = enabled,
            PersonalSupport::Ride => self.ride = enabled,
            PersonalSupport::PaidLeave => self.paid_leave = enabled,
        }
    }
}

/// Toggle set of run-wide policy levers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyLevers {
    #[serde(default)]
    pub navigator_program: bool,
    #[serde(default)]
    pub transit: bool,
    #[serde(default)]
    pub admin_simplification: bool,
    #[serde(default)]
    pub paid_leave: bool,
    #[serde(default)]
    pub clinic_capacity: bool,
}

impl PolicyLevers {
    #[must_use]
    pub const fn is_active(&self, lever: PolicyLever) -> bool {
        match lever {
            PolicyLever::NavigatorProgram => self.navigator_program,
            PolicyLever::Transit => self.transit,
            PolicyLever::AdminSimplification => self.admin_simplification,
            PolicyLever::PaidLeave => self.paid_leave,
            PolicyLever::ClinicCapacity => self.clinic_capacity,
        }
    }

    pub const fn set(&mut self, lever: PolicyLever, enabled: bool) {
        match lever {
            PolicyLever::NavigatorProgram => self.navigator_program = enabled,
            PolicyLever::Transit => self.transit = enabled,
            PolicyLever::AdminSimplification => self.admin_simplification = enabled,
            PolicyLever::PaidLeave => self.paid_leave = enabled,
            PolicyLever::ClinicCapacity => self.clinic_capacity = enabled,
        }
    }

    /// Every lever switched on.
    #[must_use]
    pub const fn all_on() -> Self {
        Self {
            navigator_program: true,
            transit: true,
            admin_simplification: true,
            paid_leave: true,
            clinic_capacity: true,
        }
    }
}

/// A single mitigation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "id", rename_all = "snake_case")]
pub enum Mitigation {
    Personal(PersonalSupport),
    Lever(PolicyLever),
}

/// Mitigations in effect for one participant at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MitigationSet {
    pub personal: PersonalSupports,
    pub levers: PolicyLevers,
}

impl MitigationSet {
    #[must_use]
    pub const fn new(personal: PersonalSupports, levers: PolicyLevers) -> Self {
        Self { personal, levers }
    }

    #[must_use]
    pub const fn is_active(&self, mitigation: Mitigation) -> bool {
        match mitigation {
            Mitigation::Personal(support) => self.personal.is_active(support),
            Mitigation::Lever(lever) => self.levers.is_active(lever),
        }
    }

    const fn navigator_active(&self) -> bool {
        self.personal.navigator || self.levers.navigator_program
    }
}

struct MitigationRule {
    mitigation: Mitigation,
    categories: &'static [Category],
    reduction: i64,
}

const RULES: [MitigationRule; 8] = [
    MitigationRule {
        mitigation: Mitigation::Personal(PersonalSupport::Navigator),
        categories: &[Category::Paperwork, Category::Insurance],
        reduction: SUPPORT_REDUCTION,
    },
    MitigationRule {
        mitigation: Mitigation::Personal(PersonalSupport::Ride),
        categories: &[Category::Transport],
        reduction: SUPPORT_REDUCTION,
    },
    MitigationRule {
        mitigation: Mitigation::Personal(PersonalSupport::PaidLeave),
        categories: &[Category::Work],
        reduction: SUPPORT_REDUCTION,
    },
    MitigationRule {
        mitigation: Mitigation::Lever(PolicyLever::AdminSimplification),
        categories: &[Category::Paperwork, Category::Insurance],
        reduction: LEVER_REDUCTION,
    },
    MitigationRule {
        mitigation: Mitigation::Lever(PolicyLever::Transit),
        categories: &[Category::Transport],
        reduction: LEVER_REDUCTION,
    },
    MitigationRule {
        mitigation: Mitigation::Lever(PolicyLever::PaidLeave),
        categories: &[Category::Work],
        reduction: LEVER_REDUCTION,
    },
    MitigationRule {
        mitigation: Mitigation::Lever(PolicyLever::ClinicCapacity),
        categories: &[Category::Clinic],
        reduction: LEVER_REDUCTION,
    },
    MitigationRule {
        mitigation: Mitigation::Lever(PolicyLever::NavigatorProgram),
        categories: &[Category::Paperwork, Category::Insurance],
        reduction: NAVIGATOR_PROGRAM_REDUCTION,
    },
];

/// Inclusive upper bounds applied after mitigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBounds {
    pub max_severity: u32,
    pub max_secondary: u32,
}

impl SeverityBounds {
    /// Days and stress in the two-patient journey.
    pub const JOURNEY: Self = Self {
        max_severity: JOURNEY_MAX_DAYS,
        max_secondary: JOURNEY_MAX_STRESS,
    };

    /// Spaces and stress in the board race.
    pub const BOARD: Self = Self {
        max_severity: BOARD_MAX_SETBACK,
        max_secondary: BOARD_MAX_STRESS,
    };
}

impl Default for SeverityBounds {
    fn default() -> Self {
        Self::JOURNEY
    }
}

/// One reduction that contributed to an adjusted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedReduction {
    pub mitigation: Mitigation,
    pub amount: i64,
}

/// Event severity after mitigation and clamping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedEvent {
    /// Days (journey) or spaces (board) lost.
    pub severity: u32,
    /// Stress added.
    pub secondary: u32,
    #[serde(default)]
    pub reductions: Vec<AppliedReduction>,
}

/// Resolve an event against the active mitigations.
#[must_use]
pub fn resolve(event: &EventCard, mitigations: &MitigationSet, bounds: SeverityBounds) -> AdjustedEvent {
    let reductions: Vec<AppliedReduction> = RULES
        .iter()
        .filter(|rule| rule.categories.contains(&event.category))
        .filter(|rule| mitigations.is_active(rule.mitigation))
        .map(|rule| AppliedReduction {
            mitigation: rule.mitigation,
            amount: rule.reduction,
        })
        .collect();
    let total_reduction: i64 = reductions.iter().map(|r| r.amount).sum();
    let days = i64::from(event.base_days) - total_reduction;

    let mut stress = i64::from(event.stress);
    if mitigations.navigator_active() {
        stress -= NAVIGATOR_STRESS_RELIEF;
    }
    if days > JOURNEY_STRESS_SPIKE_DAYS {
        stress += 1;
    }

    AdjustedEvent {
        severity: clamp_to_u32(days, bounds.max_severity),
        secondary: clamp_to_u32(stress, bounds.max_secondary),
        reductions,
    }
}
