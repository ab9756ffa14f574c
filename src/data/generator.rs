use crate::models::SowRecord;
use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;

const SUPPLIERS: &[&str] = &[
    "Accenture",
    "TCS",
    "Infosys",
    "Wipro",
    "Cognizant",
    "Capgemini",
    "Deloitte",
    "PWC",
    "KPMG",
    "EY",
    "Tech Solutions Inc",
    "Global IT Services",
    "DataCore Systems",
    "CloudMasters Ltd",
    "Digital Innovations",
    "Agile Consulting",
];

const BUSINESS_UNITS: &[&str] = &[
    "Technology",
    "Finance",
    "Operations",
    "Marketing",
    "Human Resources",
    "Sales",
    "Customer Service",
    "Product",
    "Engineering",
    "Data & Analytics",
];

const PRIMARY_LOBS: &[&str] = &[
    "IT Infrastructure",
    "Application Development",
    "Data Engineering",
    "Cybersecurity",
    "Cloud Services",
    "Business Intelligence",
    "Project Management",
    "Quality Assurance",
    "DevOps",
    "Digital Transformation",
    "AI/ML Services",
];

const SOW_TITLES: &[&str] = &[
    "Software Development Services",
    "Data Engineering Team Augmentation",
    "Cloud Migration Support",
    "Cybersecurity Assessment and Remediation",
    "Business Intelligence Dashboard Development",
    "Mobile App Development",
    "Infrastructure Maintenance and Support",
    "QA Testing Services",
    "DevOps Pipeline Implementation",
    "SAP Implementation Services",
    "Salesforce Customization",
    "Network Security Enhancement",
    "Data Analytics Consulting",
    "UX/UI Design Services",
    "Technical Support Tier 2/3",
];

const SOW_OWNERS: &[&str] = &[
    "John Martinez",
    "Sarah Chen",
    "Michael Rodriguez",
    "Emily Johnson",
    "David Kim",
    "Lisa Anderson",
    "Robert Garcia",
    "Jennifer Lee",
    "William Brown",
    "Maria Santos",
    "James Wilson",
    "Patricia Davis",
    "Carlos Hernandez",
    "Amanda Taylor",
    "Daniel Moore",
];

// Weighted toward USD and Active, matching the source distributions.
const CURRENCIES: &[&str] = &["USD", "USD", "USD", "EUR", "GBP"];
const NEAR_EXPIRY_STATUSES: &[&str] = &["Active", "Pending Renewal", "Active"];
const CONTRACT_DURATIONS: &[i64] = &[180, 270, 365, 545, 730];

/// The four canonical gold cases the validator re-scores, anchored on a
/// reference date.
pub fn gold_cases(today: NaiveDate) -> Vec<SowRecord> {
    let case = |sow_id: &str,
                days: i64,
                status: &str,
                title: &str,
                workers: u32,
                duration: i64,
                budget: f64,
                supplier: &str,
                business_unit: &str,
                primary_lob: &str,
                owner: &str| {
        let end_date = today + Duration::days(days);
        SowRecord {
            sow_id: sow_id.to_string(),
            days_before_expiration: days,
            sow_status: status.to_string(),
            sow_title: title.to_string(),
            contract_id: sow_id.replace("SOW", "CNT"),
            active_sow_workers: workers,
            start_date: end_date - Duration::days(duration),
            end_date,
            latest_maximum_budget: budget,
            currency: "USD".to_string(),
            supplier: supplier.to_string(),
            business_unit: business_unit.to_string(),
            primary_lob: primary_lob.to_string(),
            sow_owner: owner.to_string(),
        }
    };

    vec![
        // Expiring with a large staffed team
        case(
            "SOW-2024-CRIT-001",
            28,
            "Active",
            "Enterprise Data Platform Development",
            25,
            365,
            1_500_000.0,
            "Accenture",
            "Technology",
            "Data Engineering",
            "Sarah Chen",
        ),
        case(
            "SOW-2024-CRIT-002",
            15,
            "Active",
            "Cloud Infrastructure Migration",
            12,
            365,
            850_000.0,
            "Deloitte",
            "Technology",
            "Cloud Services",
            "Michael Rodriguez",
        ),
        // Already expired with workers still on board
        case(
            "SOW-2024-CRIT-003",
            -5,
            "Expired",
            "Cybersecurity Operations Support",
            8,
            365,
            450_000.0,
            "Cognizant",
            "Technology",
            "Cybersecurity",
            "Jennifer Lee",
        ),
        // Expiring without workers
        case(
            "SOW-2024-CRIT-004",
            20,
            "Active",
            "Software License Management",
            0,
            365,
            75_000.0,
            "Tech Solutions Inc",
            "Finance",
            "IT Infrastructure",
            "David Kim",
        ),
    ]
}

/// Generate a synthetic SOW dataset of `total_records` rows, the four gold
/// cases included, sorted most-critical-first (days ascending, workers
/// descending). A fixed seed makes the dataset reproducible.
pub fn generate(total_records: usize, seed: Option<u64>, today: NaiveDate) -> Vec<SowRecord> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut records = gold_cases(today);
    let regular = total_records.saturating_sub(records.len());

    for index in 0..regular {
        records.push(generate_record(&mut rng, index, today));
    }

    records.sort_by(|a, b| {
        a.days_before_expiration
            .cmp(&b.days_before_expiration)
            .then(b.active_sow_workers.cmp(&a.active_sow_workers))
    });

    info!(records = records.len(), "synthetic dataset generated");
    records
}

fn generate_record(rng: &mut StdRng, index: usize, today: NaiveDate) -> SowRecord {
    let year = *[2023, 2024, 2025].choose(rng).unwrap_or(&2024);
    let sow_id = format!("SOW-{year}-{:04}", index + 1);
    let contract_id = format!("CNT-{year}-{:04}", index + 1);

    // 80% expire well in the future, 15% expire soon, 5% expired recently.
    let bucket: f64 = rng.gen();
    let days_before_expiration = if bucket < 0.80 {
        rng.gen_range(31..=365)
    } else if bucket < 0.95 {
        rng.gen_range(1..=30)
    } else {
        rng.gen_range(-10..=0)
    };

    let duration = *CONTRACT_DURATIONS.choose(rng).unwrap_or(&365);
    let end_date = today + Duration::days(days_before_expiration);
    let start_date = end_date - Duration::days(duration);

    let budget = match rng.gen_range(0..4) {
        0 => rng.gen_range(25_000..=100_000),
        1 => rng.gen_range(100_000..=300_000),
        2 => rng.gen_range(300_000..=750_000),
        _ => rng.gen_range(750_000..=2_000_000),
    } as f64;

    let active_sow_workers = realistic_workers(rng, days_before_expiration, budget);

    let sow_status = if days_before_expiration < 0 {
        "Expired".to_string()
    } else if days_before_expiration < 30 {
        NEAR_EXPIRY_STATUSES
            .choose(rng)
            .unwrap_or(&"Active")
            .to_string()
    } else {
        "Active".to_string()
    };

    SowRecord {
        sow_id,
        days_before_expiration,
        sow_status,
        sow_title: SOW_TITLES.choose(rng).unwrap_or(&SOW_TITLES[0]).to_string(),
        contract_id,
        active_sow_workers,
        start_date,
        end_date,
        latest_maximum_budget: budget,
        currency: CURRENCIES.choose(rng).unwrap_or(&"USD").to_string(),
        supplier: SUPPLIERS.choose(rng).unwrap_or(&SUPPLIERS[0]).to_string(),
        business_unit: BUSINESS_UNITS
            .choose(rng)
            .unwrap_or(&BUSINESS_UNITS[0])
            .to_string(),
        primary_lob: PRIMARY_LOBS
            .choose(rng)
            .unwrap_or(&PRIMARY_LOBS[0])
            .to_string(),
        sow_owner: SOW_OWNERS.choose(rng).unwrap_or(&SOW_OWNERS[0]).to_string(),
    }
}

/// Worker counts follow budget size; expired contracts almost never keep
/// workers on board (5% chance of keeping 1-2).
fn realistic_workers(rng: &mut StdRng, days_before_expiration: i64, budget: f64) -> u32 {
    if days_before_expiration < 0 {
        return if rng.gen::<f64>() > 0.05 {
            0
        } else {
            rng.gen_range(1..=2)
        };
    }

    if budget > 500_000.0 {
        rng.gen_range(10..=50)
    } else if budget > 200_000.0 {
        rng.gen_range(5..=20)
    } else if budget > 50_000.0 {
        rng.gen_range(1..=10)
    } else {
        rng.gen_range(0..=5)
    }
}
