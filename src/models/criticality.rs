use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Criticality level of a SOW contract, ordered low to critical.
///
/// The ordering and the display strings are part of the external contract:
/// indices 0..=3 map to `BAJO < MEDIO < ALTO < CRÍTICO` and every confusion
/// matrix, probability vector, and persisted label uses this order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum Criticality {
    /// Long-term contract, no urgency
    #[strum(serialize = "BAJO")]
    #[serde(rename = "BAJO")]
    Bajo,

    /// Mid-term window
    #[strum(serialize = "MEDIO")]
    #[serde(rename = "MEDIO")]
    Medio,

    /// Expiring soon without staff, or mid-term with a large team
    #[strum(serialize = "ALTO")]
    #[serde(rename = "ALTO")]
    Alto,

    /// Expiring (or expired) with active workers
    #[strum(serialize = "CRÍTICO")]
    #[serde(rename = "CRÍTICO")]
    Critico,
}

/// Number of criticality classes.
pub const N_CLASSES: usize = 4;

impl Criticality {
    /// All classes in ascending order.
    pub const ALL: [Criticality; N_CLASSES] = [
        Criticality::Bajo,
        Criticality::Medio,
        Criticality::Alto,
        Criticality::Critico,
    ];

    /// Stable class index (BAJO=0 .. CRÍTICO=3).
    pub fn as_index(&self) -> usize {
        match self {
            Criticality::Bajo => 0,
            Criticality::Medio => 1,
            Criticality::Alto => 2,
            Criticality::Critico => 3,
        }
    }

    /// Class for a stable index, if in range.
    pub fn from_index(index: usize) -> Option<Criticality> {
        Criticality::ALL.get(index).copied()
    }
}
