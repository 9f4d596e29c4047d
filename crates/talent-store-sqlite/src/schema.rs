//! SQL schema for the talent SQLite store.
//!
//! Executed once at connection startup. Each entity table holds its
//! non-relational fields as a JSON object in `attributes`; owning-side
//! relations are real foreign-key columns so that the inverse side can be
//! derived with an indexed lookup. Column names must match
//! [`talent_core::relation::RELATIONS`].

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS employees (
    id            TEXT PRIMARY KEY,
    attributes    TEXT NOT NULL,
    date_created  TEXT NOT NULL,
    date_modified TEXT NOT NULL
);

-- employee_id is the owning side of a one-to-one link.
CREATE TABLE IF NOT EXISTS job_postings (
    id            TEXT PRIMARY KEY,
    attributes    TEXT NOT NULL,
    date_created  TEXT NOT NULL,
    date_modified TEXT NOT NULL,
    employee_id   TEXT UNIQUE REFERENCES employees(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS skills (
    id            TEXT PRIMARY KEY,
    attributes    TEXT NOT NULL,
    date_created  TEXT NOT NULL,
    date_modified TEXT NOT NULL,
    employee_id   TEXT REFERENCES employees(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS competences (
    id            TEXT PRIMARY KEY,
    attributes    TEXT NOT NULL,
    date_created  TEXT NOT NULL,
    date_modified TEXT NOT NULL,
    employee_id   TEXT REFERENCES employees(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS goals (
    id            TEXT PRIMARY KEY,
    attributes    TEXT NOT NULL,
    date_created  TEXT NOT NULL,
    date_modified TEXT NOT NULL,
    employee_id   TEXT REFERENCES employees(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS interests (
    id            TEXT PRIMARY KEY,
    attributes    TEXT NOT NULL,
    date_created  TEXT NOT NULL,
    date_modified TEXT NOT NULL,
    employee_id   TEXT REFERENCES employees(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS job_functions (
    id            TEXT PRIMARY KEY,
    attributes    TEXT NOT NULL,
    date_created  TEXT NOT NULL,
    date_modified TEXT NOT NULL,
    employee_id   TEXT REFERENCES employees(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS contracts (
    id            TEXT PRIMARY KEY,
    attributes    TEXT NOT NULL,
    date_created  TEXT NOT NULL,
    date_modified TEXT NOT NULL,
    employee_id   TEXT REFERENCES employees(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS educations (
    id            TEXT PRIMARY KEY,
    attributes    TEXT NOT NULL,
    date_created  TEXT NOT NULL,
    date_modified TEXT NOT NULL,
    employee_id   TEXT REFERENCES employees(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS applications (
    id             TEXT PRIMARY KEY,
    attributes     TEXT NOT NULL,
    date_created   TEXT NOT NULL,
    date_modified  TEXT NOT NULL,
    employee_id    TEXT REFERENCES employees(id)    ON DELETE SET NULL,
    job_posting_id TEXT REFERENCES job_postings(id) ON DELETE SET NULL
);

-- Versioned change entries. Append-only.
CREATE TABLE IF NOT EXISTS change_logs (
    id            TEXT PRIMARY KEY,
    resource_kind TEXT    NOT NULL,
    resource_id   TEXT    NOT NULL,
    version       INTEGER NOT NULL,
    action        TEXT    NOT NULL,   -- 'create' | 'update' | 'remove'
    data          TEXT    NOT NULL,   -- JSON object of changed fields
    logged_at     TEXT    NOT NULL,
    UNIQUE (resource_kind, resource_id, version)
);

-- One row per HTTP request addressed to a record. Append-only.
CREATE TABLE IF NOT EXISTS audit_trails (
    id            TEXT PRIMARY KEY,
    resource_kind TEXT    NOT NULL,
    resource_id   TEXT    NOT NULL,
    method        TEXT    NOT NULL,
    route         TEXT,
    endpoint      TEXT    NOT NULL,
    status_code   INTEGER NOT NULL,
    content_type  TEXT,
    accept        TEXT,
    user_agent    TEXT,
    username      TEXT,
    date_created  TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS skills_employee_idx        ON skills(employee_id);
CREATE INDEX IF NOT EXISTS competences_employee_idx   ON competences(employee_id);
CREATE INDEX IF NOT EXISTS goals_employee_idx         ON goals(employee_id);
CREATE INDEX IF NOT EXISTS interests_employee_idx     ON interests(employee_id);
CREATE INDEX IF NOT EXISTS job_functions_employee_idx ON job_functions(employee_id);
CREATE INDEX IF NOT EXISTS contracts_employee_idx     ON contracts(employee_id);
CREATE INDEX IF NOT EXISTS educations_employee_idx    ON educations(employee_id);
CREATE INDEX IF NOT EXISTS applications_employee_idx  ON applications(employee_id);
CREATE INDEX IF NOT EXISTS applications_posting_idx   ON applications(job_posting_id);
CREATE INDEX IF NOT EXISTS change_logs_resource_idx   ON change_logs(resource_kind, resource_id);
CREATE INDEX IF NOT EXISTS audit_trails_resource_idx  ON audit_trails(resource_kind, resource_id);

PRAGMA user_version = 1;
";
