//! SQLite-backed implementation of the ItemStore trait

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{ToSql, Value as SqlValue};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::schema::{Schema, SCHEMA_VERSION};
use crate::allocator::{check_year, DisplayId};
use crate::config::IntakeConfig;
use crate::error::{
    DuplicateIdentifierError, LostFoundError, NotFoundError, PersistenceError, Result,
    ValidationError,
};
use crate::item::{
    BundledSubItem, CashBreakdown, Classification, ContactBlock, Denomination, FinderType,
    FoundItem, FoundItemId, LossReport, LossReportId, NewBundledSubItem, NewFoundItem,
    NewLossReport, DATETIME_FORMAT, DATE_FORMAT,
};
use crate::lifecycle::{self, Transition};
use crate::query::sql::{compile_criteria, CompiledQuery};
use crate::query::{FilterSpec, Page, Screen, Target};
use crate::store::{ItemStore, SessionId};

/// How long a handle waits on another handle's write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed implementation of the ItemStore trait.
pub struct SqliteItemStore {
    conn: Mutex<Connection>,
    intake: IntakeConfig,
}

impl SqliteItemStore {
    /// Open (or create) a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_with_connection(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_with_connection(conn)
    }

    /// Replace the intake settings (allocator retries, default location).
    pub fn with_intake_config(mut self, intake: IntakeConfig) -> Self {
        self.intake = intake;
        self
    }

    fn init_with_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(Schema::pragmas())?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            intake: IntakeConfig::default(),
        })
    }

    /// Initialize the database schema
    fn initialize(conn: &Connection) -> Result<()> {
        let current_version = Self::get_schema_version(conn).unwrap_or(0);

        if current_version == 0 {
            conn.execute_batch(Schema::create_tables())?;
            Self::set_schema_version(conn, SCHEMA_VERSION)?;
        } else if current_version < SCHEMA_VERSION {
            for version in current_version..SCHEMA_VERSION {
                if let Some(migration) = Schema::migration(version, version + 1) {
                    conn.execute_batch(migration)?;
                }
            }
            Self::set_schema_version(conn, SCHEMA_VERSION)?;
        } else if current_version > SCHEMA_VERSION {
            return Err(PersistenceError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                actual: current_version,
            }
            .into());
        }

        Ok(())
    }

    fn get_schema_version(conn: &Connection) -> Option<u32> {
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .ok()
        .flatten()
    }

    fn set_schema_version(conn: &Connection, version: u32) -> Result<()> {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PersistenceError::Database(e.to_string()).into())
    }

    // ==================== Receipt numbers ====================

    /// Bump the scope counter; caller holds an IMMEDIATE transaction
    fn next_display_id(conn: &Connection, finder_type: FinderType, year: i32) -> Result<DisplayId> {
        check_year(year)?;
        let last: Option<u32> = conn
            .query_row(
                "SELECT last_seq FROM id_counters WHERE finder_type = ?1 AND year_scope = ?2",
                params![finder_type.as_str(), year],
                |row| row.get(0),
            )
            .optional()?;
        let id = DisplayId::next_after(finder_type, year, last.unwrap_or(0))?;
        conn.execute(
            "INSERT INTO id_counters (finder_type, year_scope, last_seq) VALUES (?1, ?2, ?3)
             ON CONFLICT(finder_type, year_scope) DO UPDATE SET last_seq = excluded.last_seq",
            params![finder_type.as_str(), year, id.seq],
        )?;
        Ok(id)
    }

    /// Move the counter past every sequence already stored in the scope
    fn resync_counter(conn: &Connection, finder_type: FinderType, year: i32) -> Result<()> {
        conn.execute(
            "INSERT INTO id_counters (finder_type, year_scope, last_seq)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(main_seq), 0) FROM found_items
                              WHERE finder_type = ?1 AND year_scope = ?2))
             ON CONFLICT(finder_type, year_scope) DO UPDATE
             SET last_seq = MAX(last_seq, excluded.last_seq)",
            params![finder_type.as_str(), year],
        )?;
        Ok(())
    }

    // ==================== Found items ====================

    fn insert_found_item(
        conn: &Connection,
        id: &DisplayId,
        new: &NewFoundItem,
    ) -> rusqlite::Result<FoundItemId> {
        conn.execute(
            "INSERT INTO found_items
             (main_id, main_seq, year_scope, finder_type, custody_status, refund_status,
              found_at, received_at, received_by, found_area, class_large, class_medium,
              class_small, feature, color, high_value, quantity, storage_location, expires_on,
              finder_name, finder_phone, finder_postal_code, finder_address, finder_affiliation,
              owner_waiver)
             VALUES (?1, ?2, ?3, ?4, 'STORED', 'NONE', ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
            params![
                id.to_string(),
                id.seq,
                id.year,
                id.finder_type.as_str(),
                datetime_sql(&new.found_at),
                datetime_sql(&new.received_at),
                new.received_by,
                new.found_area,
                new.classification.large,
                new.classification.medium,
                new.classification.small,
                new.feature,
                new.color,
                new.high_value,
                new.quantity,
                new.storage_location,
                date_sql(new.expires_on),
                new.finder.name,
                new.finder.phone,
                new.finder.postal_code,
                new.finder.address,
                new.finder.affiliation,
                new.owner_waiver.as_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Write back everything a transition can change
    fn update_found_item(conn: &Connection, item: &FoundItem) -> Result<()> {
        let returned = item.returned.as_ref().map(serde_json::to_string).transpose()?;
        let owner_contact = item
            .owner_contact
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            "UPDATE found_items SET
                custody_status = ?2, refund_status = ?3,
                police_filed_date = ?4, police_station = ?5,
                receipt_number = ?6, refund_expected_date = ?7, refund_date = ?8,
                refund_handled_by = ?9, refunded_disposition = ?10,
                refunded_processed_by = ?11, refunded_processed_sub = ?12,
                refunded_processed_date = ?13, disposal_date = ?14, selling_price = ?15,
                return_date = ?16, returned = ?17, owner_contact = ?18
             WHERE id = ?1",
            params![
                item.id,
                item.custody_status.as_str(),
                item.refund_status.as_str(),
                date_sql(item.police_filed_date),
                item.police_station,
                item.receipt_number,
                date_sql(item.refund_expected_date),
                date_sql(item.refund_date),
                item.refund_handled_by,
                item.refunded_disposition.map(|d| d.as_str()),
                item.refunded_processed_by,
                item.refunded_processed_sub,
                date_sql(item.refunded_processed_date),
                date_sql(item.disposal_date),
                item.selling_price,
                date_sql(item.return_date),
                returned,
                owner_contact,
            ],
        )?;
        Ok(())
    }

    fn load_found_item(conn: &Connection, id: FoundItemId) -> Result<Option<FoundItem>> {
        let mut stmt = conn.prepare("SELECT * FROM found_items WHERE id = ?1")?;
        let row = stmt
            .query_row([id], |row| Ok(Self::row_to_found_item(row)))
            .optional()?;
        row.transpose()
    }

    fn row_to_found_item(row: &Row<'_>) -> Result<FoundItem> {
        Ok(FoundItem {
            id: row.get("id")?,
            main_id: row.get("main_id")?,
            main_seq: row.get("main_seq")?,
            year_scope: row.get("year_scope")?,
            finder_type: parse_literal(row.get("finder_type")?)?,
            custody_status: parse_literal(row.get("custody_status")?)?,
            refund_status: parse_literal(row.get("refund_status")?)?,
            found_at: parse_datetime(row.get("found_at")?)?,
            received_at: parse_datetime(row.get("received_at")?)?,
            received_by: row.get("received_by")?,
            found_area: row.get("found_area")?,
            classification: Classification {
                large: row.get("class_large")?,
                medium: row.get("class_medium")?,
                small: row.get("class_small")?,
            },
            feature: row.get("feature")?,
            color: row.get("color")?,
            high_value: row.get("high_value")?,
            quantity: row.get("quantity")?,
            storage_location: row.get("storage_location")?,
            expires_on: parse_date(row.get("expires_on")?)?,
            finder: ContactBlock {
                name: row.get("finder_name")?,
                phone: row.get("finder_phone")?,
                postal_code: row.get("finder_postal_code")?,
                address: row.get("finder_address")?,
                affiliation: row.get("finder_affiliation")?,
            },
            owner_waiver: parse_literal(row.get("owner_waiver")?)?,
            police_filed_date: parse_date(row.get("police_filed_date")?)?,
            police_station: row.get("police_station")?,
            receipt_number: row.get("receipt_number")?,
            refund_expected_date: parse_date(row.get("refund_expected_date")?)?,
            refund_date: parse_date(row.get("refund_date")?)?,
            refund_handled_by: row.get("refund_handled_by")?,
            refunded_disposition: row
                .get::<_, Option<String>>("refunded_disposition")?
                .map(parse_literal)
                .transpose()?,
            refunded_processed_by: row.get("refunded_processed_by")?,
            refunded_processed_sub: row.get("refunded_processed_sub")?,
            refunded_processed_date: parse_date(row.get("refunded_processed_date")?)?,
            disposal_date: parse_date(row.get("disposal_date")?)?,
            selling_price: row.get("selling_price")?,
            return_date: parse_date(row.get("return_date")?)?,
            returned: parse_json(row.get("returned")?)?,
            owner_contact: parse_json(row.get("owner_contact")?)?,
        })
    }

    fn ensure_item_exists(conn: &Connection, id: FoundItemId) -> Result<()> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM found_items WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(NotFoundError::FoundItem(id).into())
        }
    }

    // ==================== Loss reports ====================

    fn load_loss_report(conn: &Connection, id: LossReportId) -> Result<Option<LossReport>> {
        let mut stmt = conn.prepare("SELECT * FROM loss_reports WHERE id = ?1")?;
        let row = stmt
            .query_row([id], |row| Ok(Self::row_to_loss_report(row)))
            .optional()?;
        row.transpose()
    }

    fn row_to_loss_report(row: &Row<'_>) -> Result<LossReport> {
        Ok(LossReport {
            id: row.get("id")?,
            reported_at: parse_datetime(row.get("reported_at")?)?,
            lost_at: parse_date(row.get("lost_at")?)?,
            lost_area: row.get("lost_area")?,
            reporter: ContactBlock {
                name: row.get("reporter_name")?,
                phone: row.get("reporter_phone")?,
                postal_code: row.get("reporter_postal_code")?,
                address: row.get("reporter_address")?,
                affiliation: None,
            },
            classification: Classification {
                large: row.get("class_large")?,
                medium: row.get("class_medium")?,
                small: row.get("class_small")?,
            },
            feature: row.get("feature")?,
            color: row.get("color")?,
            expires_on: parse_date(row.get("expires_on")?)?,
            status: parse_literal(row.get("status")?)?,
            resolved_on: parse_date(row.get("resolved_on")?)?,
        })
    }

    // ==================== Screens ====================

    /// Run a compiled screen query, returning the page rows and total matches
    fn run_page<T>(
        conn: &Connection,
        table: &str,
        compiled: &CompiledQuery,
        map: fn(&Row<'_>) -> Result<T>,
    ) -> Result<(Vec<T>, u64)> {
        let params_ref: Vec<&dyn ToSql> =
            compiled.params.iter().map(|p| p as &dyn ToSql).collect();

        let count_sql = format!("SELECT COUNT(*) FROM {} {}", table, compiled.where_clause);
        let total: i64 = conn.query_row(&count_sql, params_ref.as_slice(), |row| row.get(0))?;

        let sql = format!(
            "SELECT * FROM {} {} {} {}",
            table, compiled.where_clause, compiled.order_clause, compiled.limit_offset
        );
        debug!(sql = %sql, params = compiled.params.len(), "screen query");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), |row| Ok(map(row)))?;

        let mut items = Vec::new();
        for row_result in rows {
            items.push(row_result??);
        }
        Ok((items, u64::try_from(total).unwrap_or(0)))
    }
}

impl ItemStore for SqliteItemStore {
    fn allocate(&self, finder_type: FinderType, year: i32) -> Result<DisplayId> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = Self::next_display_id(&tx, finder_type, year)?;
        tx.commit()?;
        debug!(main_id = %id, "allocated receipt number");
        Ok(id)
    }

    fn intake(&self, mut new: NewFoundItem) -> Result<FoundItem> {
        new.validate()?;
        if new.storage_location.is_none() {
            new.storage_location = self.intake.default_storage_location.clone();
        }
        let finder_type = new.finder_type;
        let year = new.year_scope();

        let mut conn = self.lock()?;
        let mut attempt = 0;
        loop {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let display_id = Self::next_display_id(&tx, finder_type, year)?;

            match Self::insert_found_item(&tx, &display_id, &new) {
                Ok(id) => {
                    tx.commit()?;
                    info!(id, main_id = %display_id, finder_type = %finder_type, "intake");
                    return Ok(FoundItem::from_intake(id, &display_id, new));
                }
                Err(e) if is_constraint_violation(&e) => {
                    drop(tx);
                    if attempt >= self.intake.allocator_retries {
                        return Err(DuplicateIdentifierError {
                            finder_type,
                            year,
                            main_id: display_id.to_string(),
                        }
                        .into());
                    }
                    attempt += 1;
                    warn!(
                        main_id = %display_id,
                        attempt,
                        "receipt number already taken, resyncing counter"
                    );
                    Self::resync_counter(&conn, finder_type, year)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn get(&self, id: FoundItemId) -> Result<Option<FoundItem>> {
        let conn = self.lock()?;
        Self::load_found_item(&conn, id)
    }

    fn apply_transition(&self, id: FoundItemId, transition: &Transition) -> Result<FoundItem> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = Self::load_found_item(&tx, id)?.ok_or(NotFoundError::FoundItem(id))?;
        let next = lifecycle::apply(&current, transition)?;
        Self::update_found_item(&tx, &next)?;
        tx.commit()?;
        Ok(next)
    }

    fn search_items(
        &self,
        screen: Screen,
        spec: &FilterSpec,
        page: u32,
    ) -> Result<Page<FoundItem>> {
        if screen.target() != Target::FoundItems {
            return Err(ValidationError::field(
                "screen",
                format!("{} does not list found items", screen),
            )
            .into());
        }
        let compiled = compile_criteria(screen, spec, page)?;
        let conn = self.lock()?;
        let (items, total) =
            Self::run_page(&conn, "found_items", &compiled, Self::row_to_found_item)?;
        Ok(Page::new(items, total, page))
    }

    fn record_cash(&self, breakdown: &CashBreakdown) -> Result<()> {
        match breakdown.computed_total() {
            Some(counted) if counted == breakdown.total => {}
            Some(counted) => {
                return Err(ValidationError::field(
                    "total",
                    format!("{} does not match the counted {}", breakdown.total, counted),
                )
                .into());
            }
            None => {
                return Err(ValidationError::field("total", "amount is too large").into());
            }
        }

        let conn = self.lock()?;
        Self::ensure_item_exists(&conn, breakdown.item_id)?;

        let columns: Vec<&str> = Denomination::ALL.iter().map(|d| d.column()).collect();
        let placeholders = vec!["?"; columns.len() + 3].join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO cash_breakdowns (item_id, {}, memorial_coins, total)
             VALUES ({})",
            columns.join(", "),
            placeholders
        );

        let mut values = vec![SqlValue::Integer(breakdown.item_id)];
        values.extend(
            Denomination::ALL
                .iter()
                .map(|d| SqlValue::Integer(i64::from(breakdown.count(*d)))),
        );
        values.push(SqlValue::Text(serde_json::to_string(&breakdown.memorial_coins)?));
        values.push(SqlValue::Integer(breakdown.total));

        conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        debug!(item = breakdown.item_id, total = breakdown.total, "recorded cash");
        Ok(())
    }

    fn cash_breakdown(&self, item_id: FoundItemId) -> Result<Option<CashBreakdown>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT * FROM cash_breakdowns WHERE item_id = ?1")?;
        let row = stmt
            .query_row([item_id], |row| {
                let mut counts = std::collections::BTreeMap::new();
                for d in Denomination::ALL {
                    let n: u32 = row.get(d.column())?;
                    if n > 0 {
                        counts.insert(d, n);
                    }
                }
                let coins: String = row.get("memorial_coins")?;
                let total: i64 = row.get("total")?;
                Ok((counts, coins, total))
            })
            .optional()?;

        let Some((counts, coins, total)) = row else {
            return Ok(None);
        };
        let breakdown = CashBreakdown {
            item_id,
            counts,
            memorial_coins: serde_json::from_str(&coins)?,
            total,
        };
        if !breakdown.is_consistent() {
            return Err(PersistenceError::Corrupt(format!(
                "cash total {} for item {} does not match its counts",
                total, item_id
            ))
            .into());
        }
        Ok(Some(breakdown))
    }

    fn add_bundled_item(
        &self,
        parent_id: FoundItemId,
        new: NewBundledSubItem,
    ) -> Result<BundledSubItem> {
        new.validate()?;
        let conn = self.lock()?;
        Self::ensure_item_exists(&conn, parent_id)?;
        conn.execute(
            "INSERT INTO bundled_items
             (parent_id, class_large, class_medium, class_small, feature, color, quantity,
              high_value, remarks)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                parent_id,
                new.classification.large,
                new.classification.medium,
                new.classification.small,
                new.feature,
                new.color,
                new.quantity,
                new.high_value,
                new.remarks,
            ],
        )?;
        Ok(BundledSubItem {
            id: conn.last_insert_rowid(),
            parent_id,
            classification: new.classification,
            feature: new.feature,
            color: new.color,
            quantity: new.quantity,
            high_value: new.high_value,
            remarks: new.remarks,
        })
    }

    fn bundled_items(&self, parent_id: FoundItemId) -> Result<Vec<BundledSubItem>> {
        let conn = self.lock()?;
        Self::ensure_item_exists(&conn, parent_id)?;
        let mut stmt =
            conn.prepare("SELECT * FROM bundled_items WHERE parent_id = ?1 ORDER BY id ASC")?;
        let rows = stmt.query_map([parent_id], |row| {
            Ok(BundledSubItem {
                id: row.get("id")?,
                parent_id: row.get("parent_id")?,
                classification: Classification {
                    large: row.get("class_large")?,
                    medium: row.get("class_medium")?,
                    small: row.get("class_small")?,
                },
                feature: row.get("feature")?,
                color: row.get("color")?,
                quantity: row.get("quantity")?,
                high_value: row.get("high_value")?,
                remarks: row.get("remarks")?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn report_loss(&self, new: NewLossReport) -> Result<LossReport> {
        new.validate()?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO loss_reports
             (reported_at, lost_at, lost_area, reporter_name, reporter_phone,
              reporter_postal_code, reporter_address, class_large, class_medium, class_small,
              feature, color, expires_on, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 'OPEN')",
            params![
                datetime_sql(&new.reported_at),
                date_sql(new.lost_at),
                new.lost_area,
                new.reporter.name,
                new.reporter.phone,
                new.reporter.postal_code,
                new.reporter.address,
                new.classification.large,
                new.classification.medium,
                new.classification.small,
                new.feature,
                new.color,
                date_sql(new.expires_on),
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(id, "loss report filed");

        let mut report = LossReport::from_new(id, new);
        report.reporter.affiliation = None;
        Ok(report)
    }

    fn get_loss_report(&self, id: LossReportId) -> Result<Option<LossReport>> {
        let conn = self.lock()?;
        Self::load_loss_report(&conn, id)
    }

    fn resolve_loss_report(&self, id: LossReportId, resolved_on: NaiveDate) -> Result<LossReport> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let report = Self::load_loss_report(&tx, id)?.ok_or(NotFoundError::LossReport(id))?;
        let resolved = report.resolve(resolved_on)?;
        tx.execute(
            "UPDATE loss_reports SET status = ?2, resolved_on = ?3 WHERE id = ?1",
            params![id, resolved.status.as_str(), date_sql(resolved.resolved_on)],
        )?;
        tx.commit()?;
        Ok(resolved)
    }

    fn search_loss_reports(&self, spec: &FilterSpec, page: u32) -> Result<Page<LossReport>> {
        let compiled = compile_criteria(Screen::LossReports, spec, page)?;
        let conn = self.lock()?;
        let (items, total) =
            Self::run_page(&conn, "loss_reports", &compiled, Self::row_to_loss_report)?;
        Ok(Page::new(items, total, page))
    }

    fn save_criteria(&self, session: &SessionId, screen: Screen, spec: &FilterSpec) -> Result<()> {
        let json = serde_json::to_string(spec)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO saved_criteria (session_id, screen, spec) VALUES (?1, ?2, ?3)
             ON CONFLICT(session_id, screen) DO UPDATE
             SET spec = excluded.spec, saved_at = datetime('now')",
            params![session.as_str(), screen.as_str(), json],
        )?;
        Ok(())
    }

    fn load_criteria(&self, session: &SessionId, screen: Screen) -> Result<Option<FilterSpec>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT spec FROM saved_criteria WHERE session_id = ?1 AND screen = ?2",
                params![session.as_str(), screen.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn clear_criteria(&self, session: &SessionId, screen: Screen) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM saved_criteria WHERE session_id = ?1 AND screen = ?2",
            params![session.as_str(), screen.as_str()],
        )?;
        Ok(removed > 0)
    }

    fn prune_criteria(&self, cutoff: NaiveDateTime) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM saved_criteria WHERE saved_at < ?1",
            params![cutoff.format(DATETIME_FORMAT).to_string()],
        )?;
        if removed > 0 {
            debug!("Pruned {} saved criteria older than {}", removed, cutoff);
        }
        Ok(removed)
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn datetime_sql(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn date_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn corrupt(message: String) -> LostFoundError {
    PersistenceError::Corrupt(message).into()
}

/// Status and type columns must hold a known literal
fn parse_literal<T: FromStr<Err = String>>(raw: String) -> Result<T> {
    raw.parse().map_err(corrupt)
}

fn parse_datetime(raw: String) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT)
        .map_err(|e| corrupt(format!("bad timestamp '{}': {}", raw, e)))
}

fn parse_date(raw: Option<String>) -> Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(&s, DATE_FORMAT)
            .map_err(|e| corrupt(format!("bad date '{}': {}", s, e)))
    })
    .transpose()
}

fn parse_json<T: DeserializeOwned>(raw: Option<String>) -> Result<Option<T>> {
    Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::error::AllocatorError;
    use crate::item::{LossReportStatus, MemorialCoin, OwnerWaiver};
    use crate::lifecycle::{
        CustodyStatus, PoliceFiling, RefundSchedule, RefundStatus, ReturnPayload,
    };
    use crate::query::{self, Clause, Field, ShowAlso, Value, PAGE_SIZE};

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn form(finder_type: FinderType, when: &str, feature: &str) -> NewFoundItem {
        let mut f = NewFoundItem::new(finder_type, at(when), at(when), "Bags", feature);
        if finder_type == FinderType::ThirdPartyFound {
            f.finder.name = Some("Customer".into());
        }
        f
    }

    fn owner_form(feature: &str) -> NewFoundItem {
        form(FinderType::OwnerFound, "2024-04-01 09:00:00", feature)
    }

    fn file_police() -> Transition {
        Transition::FilePolice(PoliceFiling {
            filed_on: day("2024-04-02"),
            station: None,
        })
    }

    fn return_to_owner() -> Transition {
        Transition::ReturnToOwner(ReturnPayload {
            returned_on: day("2024-04-03"),
            owner: ContactBlock {
                name: Some("Owner".into()),
                ..Default::default()
            },
            handled_by: "Desk".into(),
            identity_document: None,
        })
    }

    fn show_returned() -> FilterSpec {
        FilterSpec::default().showing(ShowAlso {
            returned: true,
            ..Default::default()
        })
    }

    #[test]
    fn intake_numbers_each_scope_separately() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let a = store.intake(owner_form("a")).unwrap();
        let b = store.intake(owner_form("b")).unwrap();
        let c = store
            .intake(form(FinderType::ThirdPartyFound, "2024-05-01 10:00:00", "c"))
            .unwrap();
        let d = store
            .intake(form(FinderType::OwnerFound, "2025-01-02 10:00:00", "d"))
            .unwrap();

        assert_eq!(a.main_id, "12400001");
        assert_eq!(b.main_id, "12400002");
        assert_eq!(c.main_id, "22400001");
        assert_eq!(d.main_id, "12500001");
        assert!(a.id < b.id && b.id < c.id);

        let stored = store.get(b.id).unwrap().unwrap();
        assert_eq!(stored, b);
        assert_eq!(stored.custody_status, CustodyStatus::Stored);
        assert_eq!(stored.refund_status, RefundStatus::None);
    }

    #[test]
    fn allocate_is_gap_free() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let seqs: Vec<u32> = (0..5)
            .map(|_| store.allocate(FinderType::ThirdPartyFound, 2030).unwrap().seq)
            .collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            store.allocate(FinderType::OwnerFound, 2030).unwrap().to_string(),
            "13000001"
        );
    }

    #[test]
    fn concurrent_handles_share_one_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lostfound.db");
        SqliteItemStore::open(&path).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let store = SqliteItemStore::open(&path).unwrap();
                    (0..25)
                        .map(|_| store.allocate(FinderType::OwnerFound, 2024).unwrap().seq)
                        .collect::<Vec<u32>>()
                })
            })
            .collect();

        let mut all: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (1..=100).collect::<Vec<u32>>());
    }

    #[test]
    fn shared_handle_across_threads() {
        let store = Arc::new(SqliteItemStore::open_in_memory().unwrap());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..5 {
                        store.intake(owner_form(&format!("{}-{}", i, j))).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let page = store.search_items(Screen::Items, &FilterSpec::default(), 1).unwrap();
        let mut ids: Vec<String> = page.items.into_iter().map(|i| i.main_id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
        assert_eq!(ids.last().map(String::as_str), Some("12400020"));
    }

    #[test]
    fn invalid_intake_stores_nothing() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let err = store.intake(owner_form("  ")).unwrap_err();
        assert!(matches!(err, LostFoundError::Validation(_)));
        let page = store.search_items(Screen::Items, &FilterSpec::default(), 1).unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(store.allocate(FinderType::OwnerFound, 2024).unwrap().seq, 1);
    }

    #[test]
    fn intake_skips_numbers_taken_outside_the_counter() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute(
                "INSERT INTO found_items (main_id, main_seq, year_scope, finder_type,
                    custody_status, refund_status, found_at, received_at, class_large,
                    feature, owner_waiver)
                 VALUES ('12400001', 1, 2024, 'OWNER_FOUND', 'STORED', 'NONE',
                    '2024-01-01 00:00:00', '2024-01-01 00:00:00', 'Keys', 'legacy', 'RETAINS')",
                [],
            )
            .unwrap();
        }
        let item = store.intake(owner_form("new")).unwrap();
        assert_eq!(item.main_id, "12400002");
    }

    #[test]
    fn collision_without_retries_is_reported() {
        let store = SqliteItemStore::open_in_memory()
            .unwrap()
            .with_intake_config(IntakeConfig {
                allocator_retries: 0,
                default_storage_location: None,
            });
        store.intake(owner_form("first")).unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute("UPDATE id_counters SET last_seq = 0", []).unwrap();
        }
        let err = store.intake(owner_form("second")).unwrap_err();
        match err {
            LostFoundError::DuplicateIdentifier(e) => {
                assert_eq!(e.main_id, "12400001");
                assert_eq!(e.year, 2024);
            }
            other => panic!("expected duplicate identifier, got {other}"),
        }
    }

    #[test]
    fn exhausted_sequence_fails() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        store.allocate(FinderType::OwnerFound, 2024).unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute("UPDATE id_counters SET last_seq = 99999", []).unwrap();
        }
        let err = store.allocate(FinderType::OwnerFound, 2024).unwrap_err();
        assert!(matches!(
            err,
            LostFoundError::Allocator(AllocatorError::SequenceExhausted { .. })
        ));
        assert!(matches!(
            store.allocate(FinderType::OwnerFound, 0),
            Err(LostFoundError::Allocator(AllocatorError::InvalidYear(0)))
        ));
    }

    #[test]
    fn default_storage_location_fills_blank_intake() {
        let store = SqliteItemStore::open_in_memory()
            .unwrap()
            .with_intake_config(IntakeConfig {
                allocator_retries: 3,
                default_storage_location: Some("Back office".into()),
            });
        let item = store.intake(owner_form("x")).unwrap();
        assert_eq!(item.storage_location.as_deref(), Some("Back office"));
    }

    #[test]
    fn transitions_persist_and_failures_do_not() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let item = store.intake(owner_form("umbrella")).unwrap();

        let filed = store.apply_transition(item.id, &file_police()).unwrap();
        assert_eq!(filed.custody_status, CustodyStatus::PoliceFiled);
        assert_eq!(store.get(item.id).unwrap().unwrap(), filed);

        let err = store.apply_transition(item.id, &file_police()).unwrap_err();
        assert!(matches!(err, LostFoundError::InvalidTransition(_)));
        assert_eq!(store.get(item.id).unwrap().unwrap(), filed);

        let returned = store.apply_transition(item.id, &return_to_owner()).unwrap();
        let reread = store.get(item.id).unwrap().unwrap();
        assert_eq!(reread, returned);
        assert_eq!(reread.returned.unwrap().handled_by, "Desk");

        assert!(matches!(
            store.apply_transition(9999, &file_police()),
            Err(LostFoundError::NotFound(NotFoundError::FoundItem(9999)))
        ));
    }

    #[test]
    fn unknown_status_literal_is_corrupt() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let item = store.intake(owner_form("x")).unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute("UPDATE found_items SET custody_status = 'LOST'", [])
                .unwrap();
        }
        assert!(matches!(
            store.get(item.id),
            Err(LostFoundError::Persistence(PersistenceError::Corrupt(_)))
        ));
    }

    #[test]
    fn screen_defaults_and_show_also() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let kept = store.intake(owner_form("kept")).unwrap();
        let gone = store.intake(owner_form("gone")).unwrap();
        store.apply_transition(gone.id, &return_to_owner()).unwrap();

        let default = store.search_items(Screen::Items, &FilterSpec::default(), 1).unwrap();
        assert_eq!(default.total, 1);
        assert_eq!(default.items[0].id, kept.id);

        let wide = store.search_items(Screen::Items, &show_returned(), 1).unwrap();
        assert_eq!(wide.total, 2);
        assert!(default.items.iter().all(|i| wide.items.contains(i)));

        let police = store
            .search_items(Screen::PoliceFiling, &FilterSpec::default(), 1)
            .unwrap();
        assert_eq!(police.total, 1);

        let refunds = store
            .search_items(Screen::RefundProcessing, &FilterSpec::default(), 1)
            .unwrap();
        assert_eq!(refunds.total, 0);
        store
            .apply_transition(
                kept.id,
                &Transition::ScheduleRefund(RefundSchedule {
                    receipt_number: "R-9".into(),
                    expected_on: day("2024-05-01"),
                }),
            )
            .unwrap();
        let refunds = store
            .search_items(Screen::RefundProcessing, &FilterSpec::default(), 1)
            .unwrap();
        assert_eq!(refunds.total, 1);

        assert!(matches!(
            store.search_items(Screen::LossReports, &FilterSpec::default(), 1),
            Err(LostFoundError::Validation(_))
        ));
    }

    #[test]
    fn pages_are_id_ordered() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        for i in 0..120 {
            store.intake(owner_form(&format!("item {}", i))).unwrap();
        }

        let first = store.search_items(Screen::Items, &FilterSpec::default(), 1).unwrap();
        assert_eq!(first.total, 120);
        assert_eq!(first.page_count, 3);
        assert_eq!(first.items.len(), PAGE_SIZE as usize);
        assert!(first.items.windows(2).all(|w| w[0].id < w[1].id));

        let last = store.search_items(Screen::Items, &FilterSpec::default(), 3).unwrap();
        assert_eq!(last.items.len(), 20);
        assert!(first.items[49].id < last.items[0].id);

        let past = store.search_items(Screen::Items, &FilterSpec::default(), 4).unwrap();
        assert!(past.items.is_empty());
        assert_eq!(past.total, 120);
    }

    #[test]
    fn text_and_date_clauses() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        store
            .intake(form(FinderType::OwnerFound, "2024-03-01 10:00:00", "Blue Umbrella"))
            .unwrap();
        store
            .intake(form(FinderType::OwnerFound, "2024-03-05 10:00:00", "blue 50%_off bag"))
            .unwrap();
        store
            .intake(form(FinderType::ThirdPartyFound, "2024-03-09 10:00:00", "bluex"))
            .unwrap();

        let blue = FilterSpec::default().with_clause(Clause::TextContains {
            field: Field::Feature,
            pattern: "BLUE".into(),
        });
        assert_eq!(store.search_items(Screen::Items, &blue, 1).unwrap().total, 3);

        let literal = FilterSpec::default().with_clause(Clause::TextContains {
            field: Field::Feature,
            pattern: "%_".into(),
        });
        assert_eq!(store.search_items(Screen::Items, &literal, 1).unwrap().total, 1);

        let march = FilterSpec::default().with_clause(Clause::DateRange {
            field: Field::FoundAt,
            start: Some(day("2024-03-05")),
            end: Some(day("2024-03-09")),
        });
        assert_eq!(store.search_items(Screen::Items, &march, 1).unwrap().total, 2);

        let third = march.with_clause(Clause::Equals {
            field: Field::FinderType,
            value: Value::Text("THIRD_PARTY_FOUND".into()),
        });
        let page = store.search_items(Screen::Items, &third, 1).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].feature, "bluex");
    }

    #[test]
    fn id_range_expiry_and_waiver_clauses() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let mut ids = Vec::new();
        for (i, expires) in ["2024-06-30", "2024-07-31", "2024-08-31"].iter().enumerate() {
            let mut f = owner_form(&format!("item {}", i));
            f.expires_on = Some(day(expires));
            if i > 0 {
                f.owner_waiver = OwnerWaiver::WaivesAll;
            }
            ids.push(store.intake(f).unwrap().id);
        }
        store.intake(owner_form("no expiry")).unwrap();

        let expiring = FilterSpec::default().with_clause(Clause::DateRange {
            field: Field::ExpiresOn,
            start: None,
            end: Some(day("2024-07-31")),
        });
        let page = store.search_items(Screen::Disposal, &expiring, 1).unwrap();
        assert_eq!(page.items.iter().map(|i| i.id).collect::<Vec<_>>(), ids[..2]);

        let waived = FilterSpec::default().with_clause(Clause::Equals {
            field: Field::OwnerWaiver,
            value: Value::Text("WAIVES_ALL".into()),
        });
        let page = store
            .search_items(Screen::RefundRegistration, &waived, 1)
            .unwrap();
        assert_eq!(page.items.iter().map(|i| i.id).collect::<Vec<_>>(), ids[1..]);

        let range = FilterSpec::default().with_clause(Clause::IntRange {
            field: Field::Id,
            start: Some(ids[1]),
            end: None,
        });
        assert_eq!(store.search_items(Screen::Items, &range, 1).unwrap().total, 3);
        let range = range.with_clause(Clause::IntRange {
            field: Field::Id,
            start: None,
            end: Some(ids[1]),
        });
        let page = store.search_items(Screen::Items, &range, 1).unwrap();
        assert_eq!(page.items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![ids[1]]);
    }

    #[test]
    fn saved_criteria_are_per_session_and_screen() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        store.intake(owner_form("red scarf")).unwrap();
        store.intake(owner_form("green scarf")).unwrap();
        store.intake(owner_form("red hat")).unwrap();

        let alice = SessionId::new("alice");
        let bob = SessionId::new("bob");
        let red = FilterSpec::default().with_clause(Clause::TextContains {
            field: Field::Feature,
            pattern: "red".into(),
        });

        let applied = query::apply_criteria(&store, &alice, Screen::Items, &red).unwrap();
        let refetched = query::fetch_screen(&store, &alice, Screen::Items, 1).unwrap();
        assert_eq!(applied, refetched);
        assert_eq!(refetched.total(), 2);
        assert_eq!(refetched.page_count(), 1);

        assert_eq!(
            query::fetch_screen(&store, &bob, Screen::Items, 1).unwrap().total(),
            3
        );
        assert_eq!(
            query::fetch_screen(&store, &alice, Screen::Disposal, 1).unwrap().total(),
            3
        );

        assert_eq!(
            store.load_criteria(&alice, Screen::Items).unwrap(),
            Some(red.clone())
        );
        assert!(store.clear_criteria(&alice, Screen::Items).unwrap());
        assert!(!store.clear_criteria(&alice, Screen::Items).unwrap());
        assert_eq!(
            query::fetch_screen(&store, &alice, Screen::Items, 1).unwrap().total(),
            3
        );
    }

    #[test]
    fn stale_criteria_are_pruned() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let old = SessionId::new("old");
        let fresh = SessionId::new("fresh");
        store
            .save_criteria(&old, Screen::Items, &show_returned())
            .unwrap();
        store
            .save_criteria(&old, Screen::Disposal, &show_returned())
            .unwrap();
        store
            .save_criteria(&fresh, Screen::Items, &show_returned())
            .unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute(
                "UPDATE saved_criteria SET saved_at = '2024-01-01 00:00:00' WHERE session_id = 'old'",
                [],
            )
            .unwrap();
        }

        assert_eq!(store.prune_criteria(at("2024-01-01 00:00:00")).unwrap(), 0);
        assert_eq!(store.prune_criteria(at("2024-06-01 00:00:00")).unwrap(), 2);
        assert!(store.load_criteria(&old, Screen::Items).unwrap().is_none());
        assert_eq!(
            store.load_criteria(&fresh, Screen::Items).unwrap(),
            Some(show_returned())
        );
    }

    #[test]
    fn invalid_criteria_do_not_replace_saved_ones() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let session = SessionId::new("s");
        let good = show_returned();
        query::apply_criteria(&store, &session, Screen::Items, &good).unwrap();

        let bad = FilterSpec::default().with_clause(Clause::TextContains {
            field: Field::HighValue,
            pattern: "x".into(),
        });
        assert!(query::apply_criteria(&store, &session, Screen::Items, &bad).is_err());
        assert_eq!(
            store.load_criteria(&session, Screen::Items).unwrap(),
            Some(good)
        );
    }

    #[test]
    fn cash_breakdown_round_trip_and_corruption() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let item = store.intake(owner_form("wallet")).unwrap();
        let cash = CashBreakdown::new(
            item.id,
            BTreeMap::from([(Denomination::Yen1000, 2), (Denomination::Yen10, 3)]),
            vec![MemorialCoin {
                name: "Olympic 1000".into(),
                value: 1000,
            }],
        )
        .unwrap();

        assert!(store.cash_breakdown(item.id).unwrap().is_none());
        store.record_cash(&cash).unwrap();
        assert_eq!(store.cash_breakdown(item.id).unwrap().unwrap(), cash);

        let mut tampered = cash.clone();
        tampered.total += 1;
        assert!(matches!(
            store.record_cash(&tampered),
            Err(LostFoundError::Validation(_))
        ));

        {
            let conn = store.lock().unwrap();
            conn.execute("UPDATE cash_breakdowns SET total = 1", []).unwrap();
        }
        assert!(matches!(
            store.cash_breakdown(item.id),
            Err(LostFoundError::Persistence(PersistenceError::Corrupt(_)))
        ));

        let overflowing = CashBreakdown {
            item_id: item.id,
            counts: BTreeMap::new(),
            memorial_coins: vec![
                MemorialCoin {
                    name: "Gold".into(),
                    value: i64::MAX,
                },
                MemorialCoin {
                    name: "Silver".into(),
                    value: 1,
                },
            ],
            total: 0,
        };
        assert!(matches!(
            store.record_cash(&overflowing),
            Err(LostFoundError::Validation(_))
        ));

        {
            let conn = store.lock().unwrap();
            conn.execute(
                "UPDATE cash_breakdowns SET memorial_coins = ?1",
                [serde_json::to_string(&overflowing.memorial_coins).unwrap()],
            )
            .unwrap();
        }
        assert!(matches!(
            store.cash_breakdown(item.id),
            Err(LostFoundError::Persistence(PersistenceError::Corrupt(_)))
        ));

        let orphan = CashBreakdown::new(404, BTreeMap::new(), vec![]).unwrap();
        assert!(matches!(
            store.record_cash(&orphan),
            Err(LostFoundError::NotFound(_))
        ));
    }

    #[test]
    fn bundled_items_follow_parent() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let parent = store.intake(owner_form("backpack")).unwrap();
        let sub: NewBundledSubItem = serde_json::from_str(
            r#"{"classification": {"large": "Books"}, "feature": "paperback", "quantity": 2}"#,
        )
        .unwrap();
        let added = store.add_bundled_item(parent.id, sub).unwrap();
        assert_eq!(added.parent_id, parent.id);

        let listed = store.bundled_items(parent.id).unwrap();
        assert_eq!(listed, vec![added.clone()]);

        let returned = store.apply_transition(parent.id, &return_to_owner()).unwrap();
        assert_eq!(added.disposition(&returned), CustodyStatus::ReturnedToOwner);

        assert!(matches!(
            store.bundled_items(404),
            Err(LostFoundError::NotFound(_))
        ));
    }

    #[test]
    fn loss_report_lifecycle() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let new: NewLossReport = serde_json::from_str(
            r#"{
                "reported_at": "2024-06-01T12:00:00",
                "lost_at": "2024-05-31",
                "reporter": {"name": "Ito", "phone": "03-0000-0000"},
                "classification": {"large": "Phones"},
                "feature": "cracked screen",
                "expires_on": "2024-09-01"
            }"#,
        )
        .unwrap();
        let report = store.report_loss(new).unwrap();
        assert_eq!(report.status, LossReportStatus::Open);
        assert_eq!(store.get_loss_report(report.id).unwrap().unwrap(), report);

        assert_eq!(report.expires_on, Some(day("2024-09-01")));
        let open = store.search_loss_reports(&FilterSpec::default(), 1).unwrap();
        assert_eq!(open.total, 1);
        let expired = FilterSpec::default().with_clause(Clause::DateRange {
            field: Field::ExpiresOn,
            start: None,
            end: Some(day("2024-08-31")),
        });
        assert_eq!(store.search_loss_reports(&expired, 1).unwrap().total, 0);

        let resolved = store
            .resolve_loss_report(report.id, day("2024-06-05"))
            .unwrap();
        assert_eq!(resolved.status, LossReportStatus::Resolved);
        assert!(matches!(
            store.resolve_loss_report(report.id, day("2024-06-06")),
            Err(LostFoundError::InvalidTransition(_))
        ));
        assert!(matches!(
            store.resolve_loss_report(77, day("2024-06-06")),
            Err(LostFoundError::NotFound(NotFoundError::LossReport(77)))
        ));

        assert_eq!(
            store.search_loss_reports(&FilterSpec::default(), 1).unwrap().total,
            0
        );
        let all = FilterSpec::default().showing(ShowAlso {
            resolved: true,
            ..Default::default()
        });
        let page = store.search_loss_reports(&all, 1).unwrap();
        assert_eq!(page.items, vec![resolved]);
    }

    #[test]
    fn version_one_database_gains_loss_report_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lostfound.db");
        {
            let v1 = Schema::create_tables().replace(
                "    color TEXT,\n    expires_on TEXT,\n    status TEXT NOT NULL,",
                "    color TEXT,\n    status TEXT NOT NULL,",
            );
            assert_ne!(v1, Schema::create_tables());
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(&v1).unwrap();
            conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])
                .unwrap();
        }

        let store = SqliteItemStore::open(&path).unwrap();
        let new: NewLossReport = serde_json::from_str(
            r#"{
                "reported_at": "2024-06-01T12:00:00",
                "reporter": {"name": "Ito", "phone": "03"},
                "classification": {"large": "Keys"},
                "expires_on": "2024-12-01"
            }"#,
        )
        .unwrap();
        let report = store.report_loss(new).unwrap();
        assert_eq!(
            store.get_loss_report(report.id).unwrap().unwrap().expires_on,
            Some(day("2024-12-01"))
        );
        let conn = store.lock().unwrap();
        assert_eq!(
            SqliteItemStore::get_schema_version(&conn),
            Some(SCHEMA_VERSION)
        );
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lostfound.db");
        {
            let store = SqliteItemStore::open(&path).unwrap();
            let conn = store.lock().unwrap();
            conn.execute("INSERT INTO schema_version (version) VALUES (99)", [])
                .unwrap();
        }
        assert!(matches!(
            SqliteItemStore::open(&path),
            Err(LostFoundError::Persistence(
                PersistenceError::SchemaVersionMismatch {
                    expected: SCHEMA_VERSION,
                    actual: 99
                }
            ))
        ));
    }
}
