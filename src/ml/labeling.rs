use crate::models::{Criticality, SowRecord};

/// Classify a single SOW by days-to-expiration and staffed worker count.
///
/// Business rules, first match wins:
/// - CRÍTICO: ≤30 days and workers on board (includes already-expired SOWs)
/// - ALTO:    ≤30 days without workers, or 31-60 days with more than 5 workers
/// - MEDIO:   31-90 days
/// - BAJO:    everything else (>90 days)
///
/// Total over all integer inputs and applied strictly per record.
pub fn classify(days_before_expiration: i64, active_sow_workers: u32) -> Criticality {
    let days = days_before_expiration;
    let workers = active_sow_workers;

    if days <= 30 && workers > 0 {
        Criticality::Critico
    } else if (days <= 30 && workers == 0) || ((31..=60).contains(&days) && workers > 5) {
        Criticality::Alto
    } else if (31..=90).contains(&days) {
        Criticality::Medio
    } else {
        Criticality::Bajo
    }
}

/// Classify a record.
pub fn classify_record(record: &SowRecord) -> Criticality {
    classify(record.days_before_expiration, record.active_sow_workers)
}
