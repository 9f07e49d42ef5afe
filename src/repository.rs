use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::attendance::{self, AttendanceOverview};
use crate::config::SchedulingConfig;
use crate::confirmations::{self, ConfirmationBoard};
use crate::db::{self, now, Database};
use crate::error::Result;
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::models::{
    AttendanceFilter, AttendanceReview, AttendanceUpdate, ConfirmationFilter, ConfirmationStatus,
    CreatedShifts, DutyFilter, DutyPage, NewBulkShifts, NewRecurringShifts, NewSingleShift,
    ReplacementCandidate, ShiftDetail, ShiftFilter, ShiftUpdate, User,
};
use crate::replacements;
use crate::scheduling::{self, SchedulePage};
use crate::shifts::{self, ShiftOverview};

/// Async access to every admin operation.
///
/// Writes take the acting admin's id; each write runs in one transaction.
#[async_trait]
pub trait SchedulingRepository: Send + Sync {
    /// User behind an unexpired session token
    async fn authenticate(&self, token: &str) -> Result<Option<User>>;

    async fn schedule_page(&self, today: NaiveDate) -> Result<SchedulePage>;
    async fn create_single_shift(&self, admin_id: i64, form: NewSingleShift) -> Result<CreatedShifts>;
    async fn create_recurring_shifts(&self, admin_id: i64, form: NewRecurringShifts) -> Result<CreatedShifts>;
    async fn create_bulk_shifts(&self, admin_id: i64, form: NewBulkShifts) -> Result<CreatedShifts>;

    async fn confirmation_board(&self, filter: ConfirmationFilter, today: NaiveDate) -> Result<ConfirmationBoard>;
    async fn update_confirmation(
        &self,
        admin_id: i64,
        shift_id: i64,
        status: ConfirmationStatus,
        notes: Option<String>,
    ) -> Result<String>;
    async fn assign_replacement(&self, admin_id: i64, shift_id: i64, volunteer_id: i64) -> Result<String>;
    async fn send_reminder(&self, shift_id: i64, volunteer_id: Option<i64>) -> Result<String>;
    async fn find_replacements(
        &self,
        shift_id: i64,
        exclude: Option<i64>,
        today: NaiveDate,
    ) -> Result<Vec<ReplacementCandidate>>;
    async fn duty_assignments(&self, filter: DutyFilter) -> Result<DutyPage>;

    async fn shift_overview(&self, filter: ShiftFilter, today: NaiveDate) -> Result<ShiftOverview>;
    async fn shift_details(&self, shift_id: i64) -> Result<ShiftDetail>;
    async fn update_shift(&self, admin_id: i64, shift_id: i64, update: ShiftUpdate) -> Result<String>;
    async fn update_attendance(&self, admin_id: i64, shift_id: i64, update: AttendanceUpdate) -> Result<String>;
    async fn cancel_shift(&self, admin_id: i64, shift_id: i64) -> Result<String>;

    async fn attendance_overview(&self, filter: AttendanceFilter, today: NaiveDate) -> Result<AttendanceOverview>;
    async fn review_attendance(&self, admin_id: i64, attendance_id: i64, review: AttendanceReview) -> Result<String>;
    async fn delete_attendance(&self, attendance_id: i64) -> Result<String>;
}

/// [`SchedulingRepository`] over the SQLite pool.
///
/// rusqlite is blocking, so every call moves to the blocking thread pool.
#[derive(Clone)]
pub struct SqliteRepository {
    db: Arc<Database>,
    settings: Arc<SchedulingConfig>,
    metrics: MetricsCollector,
}

impl SqliteRepository {
    pub fn new(db: Arc<Database>, settings: SchedulingConfig) -> Self {
        let metrics = MetricsCollector::default();
        metrics.update_connection_pool_size(db.pool_size());
        Self {
            db,
            settings: Arc::new(settings),
            metrics,
        }
    }

    /// Shared database handle
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    async fn read<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &SchedulingConfig) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let settings = Arc::clone(&self.settings);
        let timer = MetricsTimer::new(self.metrics, operation);

        let result = tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            f(&conn, &settings)
        })
        .await
        .unwrap_or_else(|e| Err(e.into()));

        self.finish(operation, timer, &result);
        result
    }

    async fn write<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &SchedulingConfig) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let settings = Arc::clone(&self.settings);
        let timer = MetricsTimer::new(self.metrics, operation);

        let result = tokio::task::spawn_blocking(move || db.transaction(|tx| f(tx, &settings)))
            .await
            .unwrap_or_else(|e| Err(e.into()));

        self.finish(operation, timer, &result);
        result
    }

    fn finish<T>(&self, operation: &'static str, timer: MetricsTimer, result: &Result<T>) {
        timer.finish(result.is_ok());
        if let Err(e) = result {
            self.metrics.record_error(e.kind(), operation);
            if e.is_internal() {
                warn!(operation, error = %e, "Repository operation failed");
            } else {
                debug!(operation, error = %e, "Repository operation rejected");
            }
        }
    }
}

#[async_trait]
impl SchedulingRepository for SqliteRepository {
    async fn authenticate(&self, token: &str) -> Result<Option<User>> {
        let token = token.to_string();
        self.read("authenticate", move |conn, _| {
            db::find_session_user(conn, &token, now())
        })
        .await
    }

    async fn schedule_page(&self, today: NaiveDate) -> Result<SchedulePage> {
        self.read("schedule_page", move |conn, settings| {
            scheduling::schedule_page(conn, today, settings.upcoming_window_days)
        })
        .await
    }

    async fn create_single_shift(&self, admin_id: i64, form: NewSingleShift) -> Result<CreatedShifts> {
        let created = self
            .write("create_single_shift", move |tx, settings| {
                scheduling::create_single_shift(tx, settings, admin_id, &form)
            })
            .await?;
        self.metrics.record_shifts_created("single", created.shift_ids.len());
        Ok(created)
    }

    async fn create_recurring_shifts(&self, admin_id: i64, form: NewRecurringShifts) -> Result<CreatedShifts> {
        let created = self
            .write("create_recurring_shifts", move |tx, settings| {
                scheduling::create_recurring_shifts(tx, settings, admin_id, &form)
            })
            .await?;
        self.metrics.record_shifts_created("recurring", created.shift_ids.len());
        Ok(created)
    }

    async fn create_bulk_shifts(&self, admin_id: i64, form: NewBulkShifts) -> Result<CreatedShifts> {
        let created = self
            .write("create_bulk_shifts", move |tx, settings| {
                scheduling::create_bulk_shifts(tx, settings, admin_id, &form)
            })
            .await?;
        self.metrics.record_shifts_created("bulk", created.shift_ids.len());
        Ok(created)
    }

    async fn confirmation_board(&self, filter: ConfirmationFilter, today: NaiveDate) -> Result<ConfirmationBoard> {
        self.read("confirmation_board", move |conn, settings| {
            confirmations::confirmation_board(conn, &filter, today, settings.upcoming_window_days)
        })
        .await
    }

    async fn update_confirmation(
        &self,
        admin_id: i64,
        shift_id: i64,
        status: ConfirmationStatus,
        notes: Option<String>,
    ) -> Result<String> {
        let message = self
            .write("update_confirmation", move |tx, _| {
                confirmations::update_confirmation(tx, admin_id, shift_id, status, notes.as_deref())
            })
            .await?;
        self.metrics.record_confirmation_update(status.as_str());
        Ok(message)
    }

    async fn assign_replacement(&self, admin_id: i64, shift_id: i64, volunteer_id: i64) -> Result<String> {
        let message = self
            .write("assign_replacement", move |tx, _| {
                confirmations::assign_replacement(tx, admin_id, shift_id, volunteer_id)
            })
            .await?;
        self.metrics.record_replacement_assigned();
        Ok(message)
    }

    async fn send_reminder(&self, shift_id: i64, volunteer_id: Option<i64>) -> Result<String> {
        let message = self
            .write("send_reminder", move |tx, _| {
                confirmations::send_reminder(tx, shift_id, volunteer_id)
            })
            .await?;
        self.metrics.record_reminder_sent();
        Ok(message)
    }

    async fn find_replacements(
        &self,
        shift_id: i64,
        exclude: Option<i64>,
        today: NaiveDate,
    ) -> Result<Vec<ReplacementCandidate>> {
        let candidates = self
            .read("find_replacements", move |conn, settings| {
                replacements::find_replacements(
                    conn,
                    shift_id,
                    exclude,
                    today,
                    settings.replacement_lookback_days,
                    settings.replacement_limit,
                )
            })
            .await?;
        self.metrics.record_replacement_search(candidates.len());
        Ok(candidates)
    }

    async fn duty_assignments(&self, filter: DutyFilter) -> Result<DutyPage> {
        self.read("duty_assignments", move |conn, settings| {
            confirmations::list_duty_assignments(conn, &filter, settings.duty_page_size)
        })
        .await
    }

    async fn shift_overview(&self, filter: ShiftFilter, today: NaiveDate) -> Result<ShiftOverview> {
        self.read("shift_overview", move |conn, _| shifts::shift_overview(conn, &filter, today))
            .await
    }

    async fn shift_details(&self, shift_id: i64) -> Result<ShiftDetail> {
        self.read("shift_details", move |conn, _| shifts::get_shift_details(conn, shift_id))
            .await
    }

    async fn update_shift(&self, admin_id: i64, shift_id: i64, update: ShiftUpdate) -> Result<String> {
        self.write("update_shift", move |tx, _| {
            shifts::update_shift(tx, admin_id, shift_id, &update)
        })
        .await
    }

    async fn update_attendance(&self, admin_id: i64, shift_id: i64, update: AttendanceUpdate) -> Result<String> {
        let message = self
            .write("update_attendance", move |tx, _| {
                shifts::update_attendance(tx, admin_id, shift_id, &update)
            })
            .await?;
        self.metrics.record_attendance_update("shift");
        Ok(message)
    }

    async fn cancel_shift(&self, admin_id: i64, shift_id: i64) -> Result<String> {
        let (message, changed) = self
            .write("cancel_shift", move |tx, _| shifts::cancel_shift(tx, admin_id, shift_id))
            .await?;
        if changed {
            self.metrics.record_shift_cancelled();
        }
        Ok(message)
    }

    async fn attendance_overview(&self, filter: AttendanceFilter, today: NaiveDate) -> Result<AttendanceOverview> {
        self.read("attendance_overview", move |conn, _| {
            attendance::attendance_overview(conn, &filter, today)
        })
        .await
    }

    async fn review_attendance(&self, admin_id: i64, attendance_id: i64, review: AttendanceReview) -> Result<String> {
        let message = self
            .write("review_attendance", move |tx, _| {
                attendance::review_attendance(tx, admin_id, attendance_id, &review)
            })
            .await?;
        self.metrics.record_attendance_update("review");
        Ok(message)
    }

    async fn delete_attendance(&self, attendance_id: i64) -> Result<String> {
        let message = self
            .write("delete_attendance", move |tx, _| attendance::delete_attendance(tx, attendance_id))
            .await?;
        self.metrics.record_attendance_update("delete");
        Ok(message)
    }
}
