//! Database schema definitions for RustReads.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Books table (the library catalog)
CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    author TEXT,
    genre TEXT,
    page_count INTEGER,
    status TEXT NOT NULL DEFAULT 'to_read',
    started_at TEXT,
    finished_at TEXT,
    rating INTEGER,
    review TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_user_id ON books(user_id);
CREATE INDEX IF NOT EXISTS idx_books_user_status ON books(user_id, status);
CREATE INDEX IF NOT EXISTS idx_books_finished_at ON books(finished_at);

-- Quotes table
CREATE TABLE IF NOT EXISTS quotes (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    book_id TEXT REFERENCES books(id) ON DELETE SET NULL,
    text TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_quotes_user_id ON quotes(user_id);

-- Collections table
CREATE TABLE IF NOT EXISTS collections (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(user_id, name)
);

-- Collection membership table
CREATE TABLE IF NOT EXISTS collection_books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection_id TEXT NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
    book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    added_at TEXT NOT NULL,
    UNIQUE(collection_id, book_id)
);

CREATE INDEX IF NOT EXISTS idx_collection_books_collection ON collection_books(collection_id);

-- Challenge templates table
CREATE TABLE IF NOT EXISTS challenge_templates (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    challenge_type TEXT NOT NULL,
    target INTEGER NOT NULL,
    period TEXT NOT NULL,
    icon TEXT NOT NULL,
    genre_filter TEXT,
    is_predefined INTEGER NOT NULL DEFAULT 0,
    created_by TEXT,
    created_at TEXT NOT NULL
);

-- Title is the reconciliation key for the predefined catalog
CREATE UNIQUE INDEX IF NOT EXISTS idx_templates_predefined_title
    ON challenge_templates(title) WHERE is_predefined = 1;

-- Challenge enrollments table (one user's pursuit of a template)
CREATE TABLE IF NOT EXISTS challenge_enrollments (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    template_id TEXT NOT NULL REFERENCES challenge_templates(id),
    progress INTEGER NOT NULL DEFAULT 0,
    manual_progress INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'active',
    completed_at TEXT,
    started_at TEXT NOT NULL,
    start_date TEXT,
    end_date TEXT,
    UNIQUE(user_id, template_id)
);

CREATE INDEX IF NOT EXISTS idx_enrollments_user_id ON challenge_enrollments(user_id);
CREATE INDEX IF NOT EXISTS idx_enrollments_user_status ON challenge_enrollments(user_id, status);

-- Unlocked badges table
CREATE TABLE IF NOT EXISTS badges (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    icon TEXT NOT NULL,
    category TEXT NOT NULL,
    unlocked_at TEXT NOT NULL,
    UNIQUE(user_id, name)
);

CREATE INDEX IF NOT EXISTS idx_badges_user_id ON badges(user_id);
"#;

/// SQL for schema version tracking (migrations)
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;
