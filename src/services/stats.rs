//! Dashboard statistics
//!
//! Everything here is computed on demand from the current entity store; no
//! result is cached. The pure functions take the collections and a reference
//! "now" so calendar windows can be evaluated for any instant.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{Actor, Clinic, Equipment, EquipmentStatus, RepairRequest, RepairStatus, StatusBucket},
    store::SharedStore,
};

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// Named calendar period containing "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Day,
    /// Monday-starting week
    Week,
    #[default]
    Month,
    All,
}

/// Explicit creation-date range, both ends inclusive.
///
/// Only applies when `from` is set: `from` alone means "from that day on",
/// `to` alone is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn is_active(&self) -> bool {
        self.from.is_some()
    }

    /// None when the range does not apply
    pub fn contains(&self, date: NaiveDate) -> Option<bool> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Some(from <= date && date <= to),
            (Some(from), None) => Some(from <= date),
            (None, _) => None,
        }
    }
}

/// Time filter applied to requests before aggregation. An active date range
/// overrides the period entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsWindow {
    pub period: Period,
    pub range: DateRange,
}

impl StatsWindow {
    pub fn period(period: Period) -> Self {
        Self {
            period,
            range: DateRange::default(),
        }
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            period: Period::All,
            range: DateRange::new(Some(from), Some(to)),
        }
    }

    pub fn since(from: NaiveDate) -> Self {
        Self {
            period: Period::All,
            range: DateRange::new(Some(from), None),
        }
    }

    /// Whether an instant falls in the window, with calendar boundaries
    /// taken in the offset of `now`
    pub fn contains(&self, instant: DateTime<Utc>, now: DateTime<FixedOffset>) -> bool {
        let date = instant.with_timezone(&now.timezone()).date_naive();
        if let Some(in_range) = self.range.contains(date) {
            return in_range;
        }
        let today = now.date_naive();
        match self.period {
            Period::Day => date == today,
            Period::Week => date.iso_week() == today.iso_week(),
            Period::Month => date.year() == today.year() && date.month() == today.month(),
            Period::All => true,
        }
    }
}

/// Query parameters selecting a window
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct WindowQuery {
    /// day, week, month (default) or all
    pub period: Option<Period>,
    /// Inclusive start date; overrides `period`
    pub from: Option<NaiveDate>,
    /// Inclusive end date, only used together with `from`
    pub to: Option<NaiveDate>,
}

impl From<&WindowQuery> for StatsWindow {
    fn from(query: &WindowQuery) -> Self {
        StatsWindow {
            period: query.period.unwrap_or_default(),
            range: DateRange::new(query.from, query.to),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Request counts by dashboard bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCounts {
    /// New + Pending_Approval
    pub pending: i64,
    /// Approved + In_Progress
    pub in_progress: i64,
    pub completed: i64,
    pub rejected: i64,
}

impl StatusCounts {
    fn record(&mut self, status: RepairStatus) {
        match status.bucket() {
            StatusBucket::Pending => self.pending += 1,
            StatusBucket::InProgress => self.in_progress += 1,
            StatusBucket::Completed => self.completed += 1,
            StatusBucket::Rejected => self.rejected += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClinicActivity {
    pub clinic_id: String,
    pub clinic_name: String,
    pub request_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EquipmentFrequency {
    /// Name as recorded on the requests
    pub equipment_name: String,
    pub request_count: i64,
}

/// Statistics snapshot for one window
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RepairStats {
    pub total_requests: i64,
    pub by_status: StatusCounts,
    /// Sum of repair costs of completed requests
    #[schema(value_type = String)]
    pub total_cost: Decimal,
    /// Every clinic, busiest first
    pub clinics: Vec<ClinicActivity>,
    /// Absent when no request matched
    pub most_active_clinic: Option<ClinicActivity>,
    /// Equipment names, most requested first
    pub equipment: Vec<EquipmentFrequency>,
    /// Absent when no request matched
    pub most_repaired_equipment: Option<EquipmentFrequency>,
    /// Current equipment count, not windowed
    pub equipment_total: i64,
    /// Equipment currently out of service for repair, not windowed
    pub equipment_in_maintenance: i64,
}

/// Compute the dashboard snapshot for `window`.
///
/// Rankings use a stable sort, so ties keep the order of `clinics` (for
/// clinics) and of first appearance in `requests` (for equipment names).
pub fn aggregate(
    requests: &[RepairRequest],
    equipment: &[Equipment],
    clinics: &[Clinic],
    window: &StatsWindow,
    now: DateTime<FixedOffset>,
) -> RepairStats {
    let in_window: Vec<&RepairRequest> = requests
        .iter()
        .filter(|r| window.contains(r.create_date, now))
        .collect();

    let mut by_status = StatusCounts::default();
    let mut total_cost = Decimal::ZERO;
    let mut by_name: IndexMap<&str, i64> = IndexMap::new();
    for request in &in_window {
        by_status.record(request.status);
        total_cost += request.effective_cost();
        *by_name.entry(request.equipment_name.as_str()).or_default() += 1;
    }

    let mut clinic_ranking: Vec<ClinicActivity> = clinics
        .iter()
        .map(|clinic| ClinicActivity {
            clinic_id: clinic.id.clone(),
            clinic_name: clinic.name.clone(),
            request_count: in_window.iter().filter(|r| r.clinic_id == clinic.id).count() as i64,
        })
        .collect();
    clinic_ranking.sort_by(|a, b| b.request_count.cmp(&a.request_count));

    let mut equipment_ranking: Vec<EquipmentFrequency> = by_name
        .into_iter()
        .map(|(name, count)| EquipmentFrequency {
            equipment_name: name.to_string(),
            request_count: count,
        })
        .collect();
    equipment_ranking.sort_by(|a, b| b.request_count.cmp(&a.request_count));

    RepairStats {
        total_requests: in_window.len() as i64,
        by_status,
        total_cost,
        most_active_clinic: clinic_ranking.first().filter(|c| c.request_count > 0).cloned(),
        clinics: clinic_ranking,
        most_repaired_equipment: equipment_ranking.first().cloned(),
        equipment: equipment_ranking,
        equipment_total: equipment.len() as i64,
        equipment_in_maintenance: equipment
            .iter()
            .filter(|e| e.status == EquipmentStatus::Maintenance)
            .count() as i64,
    }
}

/// Completed repairs of one piece of equipment, newest completion first
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EquipmentHistory {
    pub equipment_id: String,
    pub repairs: Vec<RepairRequest>,
    pub repair_count: i64,
    /// Lifetime sum of the repair costs listed in `repairs`
    #[schema(value_type = String)]
    pub total_cost: Decimal,
}

/// Lifetime repair history; ignores any window
pub fn equipment_history(requests: &[RepairRequest], equipment_id: &str) -> EquipmentHistory {
    let mut repairs: Vec<RepairRequest> = requests
        .iter()
        .filter(|r| r.equipment_id == equipment_id && r.status == RepairStatus::Completed)
        .cloned()
        .collect();
    repairs.sort_by(|a, b| b.completion_date.cmp(&a.completion_date));

    EquipmentHistory {
        equipment_id: equipment_id.to_string(),
        repair_count: repairs.len() as i64,
        total_cost: repairs.iter().map(RepairRequest::effective_cost).sum(),
        repairs,
    }
}

/// Per-clinic cost card
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClinicSummary {
    pub clinic_id: String,
    pub clinic_name: String,
    pub address: Option<String>,
    pub request_count: i64,
    #[schema(value_type = String)]
    pub total_cost: Decimal,
}

/// One card per clinic, in clinic order
pub fn clinic_summaries(
    requests: &[RepairRequest],
    clinics: &[Clinic],
    window: &StatsWindow,
    now: DateTime<FixedOffset>,
) -> Vec<ClinicSummary> {
    clinics
        .iter()
        .map(|clinic| {
            let own = requests
                .iter()
                .filter(|r| r.clinic_id == clinic.id && window.contains(r.create_date, now));
            let (count, cost) = own.fold((0i64, Decimal::ZERO), |(n, total), r| {
                (n + 1, total + r.effective_cost())
            });
            ClinicSummary {
                clinic_id: clinic.id.clone(),
                clinic_name: clinic.name.clone(),
                address: clinic.address.clone(),
                request_count: count,
                total_cost: cost,
            }
        })
        .collect()
}

/// Lifetime overview of one clinic
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClinicOverview {
    pub clinic_id: String,
    pub equipment_count: i64,
    pub equipment_in_maintenance: i64,
    pub total_requests: i64,
    pub by_status: StatusCounts,
}

pub fn clinic_overview(
    requests: &[RepairRequest],
    equipment: &[Equipment],
    clinic_id: &str,
) -> ClinicOverview {
    let mut by_status = StatusCounts::default();
    let mut total_requests = 0;
    for request in requests.iter().filter(|r| r.clinic_id == clinic_id) {
        by_status.record(request.status);
        total_requests += 1;
    }
    let own_equipment = equipment.iter().filter(|e| e.clinic_id == clinic_id);
    let (equipment_count, equipment_in_maintenance) =
        own_equipment.fold((0i64, 0i64), |(n, m), e| {
            (n + 1, m + i64::from(e.status == EquipmentStatus::Maintenance))
        });

    ClinicOverview {
        clinic_id: clinic_id.to_string(),
        equipment_count,
        equipment_in_maintenance,
        total_requests,
        by_status,
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct StatsService {
    store: SharedStore,
    offset: FixedOffset,
}

impl StatsService {
    pub fn new(store: SharedStore, offset: FixedOffset) -> Self {
        Self { store, offset }
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Dashboard statistics, optionally limited to one clinic
    pub async fn get_stats(&self, window: StatsWindow, clinic_id: Option<&str>) -> AppResult<RepairStats> {
        let store = self.store.read().await;
        let stats = match clinic_id {
            Some(id) => {
                let requests: Vec<RepairRequest> = store
                    .requests()
                    .iter()
                    .filter(|r| r.clinic_id == id)
                    .cloned()
                    .collect();
                let equipment: Vec<Equipment> = store.clinic_equipment(id).cloned().collect();
                let clinics: Vec<Clinic> = store.clinic(id).cloned().into_iter().collect();
                aggregate(&requests, &equipment, &clinics, &window, self.now())
            }
            None => aggregate(
                store.requests(),
                store.equipment(),
                store.clinics(),
                &window,
                self.now(),
            ),
        };
        Ok(stats)
    }

    pub async fn clinic_summaries(&self, window: StatsWindow) -> AppResult<Vec<ClinicSummary>> {
        let store = self.store.read().await;
        Ok(clinic_summaries(store.requests(), store.clinics(), &window, self.now()))
    }

    pub async fn clinic_overview(&self, clinic_id: &str) -> AppResult<ClinicOverview> {
        let store = self.store.read().await;
        if store.clinic(clinic_id).is_none() {
            return Err(AppError::NotFound(format!("Clinic {} not found", clinic_id)));
        }
        Ok(clinic_overview(store.requests(), store.equipment(), clinic_id))
    }

    /// Clinic staff only see listed equipment of their own clinic, and only
    /// their clinic's requests for equipment that is no longer listed
    pub async fn equipment_history(&self, actor: &Actor, equipment_id: &str) -> AppResult<EquipmentHistory> {
        let store = self.store.read().await;
        let Some(own) = actor.scoped_clinic() else {
            return Ok(equipment_history(store.requests(), equipment_id));
        };
        if let Some(equipment) = store.equipment_by_id(equipment_id) {
            if equipment.clinic_id != own {
                return Err(AppError::Authorization(format!(
                    "Equipment {} belongs to another clinic",
                    equipment_id
                )));
            }
        }
        let own_requests: Vec<RepairRequest> = store
            .requests()
            .iter()
            .filter(|r| r.clinic_id == own)
            .cloned()
            .collect();
        Ok(equipment_history(&own_requests, equipment_id))
    }
}
