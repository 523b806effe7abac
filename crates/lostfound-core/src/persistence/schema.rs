//! SQLite schema for the lost & found store

/// Schema version for migrations
pub const SCHEMA_VERSION: u32 = 2;

/// SQLite schema definition
pub struct Schema;

impl Schema {
    /// Connection settings applied on every open
    pub fn pragmas() -> &'static str {
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;"
    }

    /// Get the complete schema SQL
    pub fn create_tables() -> &'static str {
        r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Found items
CREATE TABLE IF NOT EXISTS found_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    main_id TEXT NOT NULL,
    main_seq INTEGER NOT NULL,
    year_scope INTEGER NOT NULL,
    finder_type TEXT NOT NULL,
    custody_status TEXT NOT NULL,
    refund_status TEXT NOT NULL,
    found_at TEXT NOT NULL,
    received_at TEXT NOT NULL,
    received_by TEXT,
    found_area TEXT,
    class_large TEXT NOT NULL,
    class_medium TEXT,
    class_small TEXT,
    feature TEXT NOT NULL,
    color TEXT,
    high_value INTEGER NOT NULL DEFAULT 0,
    quantity INTEGER NOT NULL DEFAULT 1,
    storage_location TEXT,
    expires_on TEXT,
    finder_name TEXT,
    finder_phone TEXT,
    finder_postal_code TEXT,
    finder_address TEXT,
    finder_affiliation TEXT,
    owner_waiver TEXT NOT NULL,
    police_filed_date TEXT,
    police_station TEXT,
    receipt_number TEXT,
    refund_expected_date TEXT,
    refund_date TEXT,
    refund_handled_by TEXT,
    refunded_disposition TEXT,
    refunded_processed_by TEXT,
    refunded_processed_sub TEXT,
    refunded_processed_date TEXT,
    disposal_date TEXT,
    selling_price INTEGER,
    return_date TEXT,
    returned TEXT,
    owner_contact TEXT,
    UNIQUE (finder_type, year_scope, main_id)
);

CREATE INDEX IF NOT EXISTS idx_found_custody ON found_items(custody_status);
CREATE INDEX IF NOT EXISTS idx_found_refund ON found_items(refund_status);
CREATE INDEX IF NOT EXISTS idx_found_found_at ON found_items(found_at);

-- Atomic receipt number counters
CREATE TABLE IF NOT EXISTS id_counters (
    finder_type TEXT NOT NULL,
    year_scope INTEGER NOT NULL,
    last_seq INTEGER NOT NULL,
    PRIMARY KEY (finder_type, year_scope)
);

-- Cash breakdowns (1:1 with found items)
CREATE TABLE IF NOT EXISTS cash_breakdowns (
    item_id INTEGER PRIMARY KEY REFERENCES found_items(id),
    yen_10000 INTEGER NOT NULL DEFAULT 0,
    yen_5000 INTEGER NOT NULL DEFAULT 0,
    yen_2000 INTEGER NOT NULL DEFAULT 0,
    yen_1000 INTEGER NOT NULL DEFAULT 0,
    yen_500 INTEGER NOT NULL DEFAULT 0,
    yen_100 INTEGER NOT NULL DEFAULT 0,
    yen_50 INTEGER NOT NULL DEFAULT 0,
    yen_10 INTEGER NOT NULL DEFAULT 0,
    yen_5 INTEGER NOT NULL DEFAULT 0,
    yen_1 INTEGER NOT NULL DEFAULT 0,
    memorial_coins TEXT NOT NULL DEFAULT '[]',
    total INTEGER NOT NULL
);

-- Items found together with a main item
CREATE TABLE IF NOT EXISTS bundled_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES found_items(id),
    class_large TEXT NOT NULL,
    class_medium TEXT,
    class_small TEXT,
    feature TEXT NOT NULL,
    color TEXT,
    quantity INTEGER NOT NULL DEFAULT 1,
    high_value INTEGER NOT NULL DEFAULT 0,
    remarks TEXT
);

CREATE INDEX IF NOT EXISTS idx_bundled_parent ON bundled_items(parent_id);

-- Loss reports
CREATE TABLE IF NOT EXISTS loss_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reported_at TEXT NOT NULL,
    lost_at TEXT,
    lost_area TEXT,
    reporter_name TEXT,
    reporter_phone TEXT,
    reporter_postal_code TEXT,
    reporter_address TEXT,
    class_large TEXT NOT NULL,
    class_medium TEXT,
    class_small TEXT,
    feature TEXT NOT NULL,
    color TEXT,
    expires_on TEXT,
    status TEXT NOT NULL,
    resolved_on TEXT
);

CREATE INDEX IF NOT EXISTS idx_loss_status ON loss_reports(status);

-- Last criteria applied per (session, screen)
CREATE TABLE IF NOT EXISTS saved_criteria (
    session_id TEXT NOT NULL,
    screen TEXT NOT NULL,
    spec TEXT NOT NULL,
    saved_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (session_id, screen)
);
"#
    }

    /// Get migration SQL for upgrading between versions
    pub fn migration(from_version: u32, to_version: u32) -> Option<&'static str> {
        match (from_version, to_version) {
            (1, 2) => Some("ALTER TABLE loss_reports ADD COLUMN expires_on TEXT;"),
            _ => None,
        }
    }
}
