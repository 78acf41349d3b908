//! SQL schema, pragmas and FTS triggers (spec.md §4.4).

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    parent_path TEXT,
    is_directory INTEGER NOT NULL DEFAULT 0,
    size INTEGER NOT NULL DEFAULT 0,
    mime_type TEXT,
    file_hash TEXT,
    created_at TEXT,
    modified_at TEXT,
    indexed_at TEXT,
    full_text TEXT
);

CREATE INDEX IF NOT EXISTS idx_files_parent ON files(parent_path);
CREATE INDEX IF NOT EXISTS idx_files_mime ON files(mime_type);
CREATE INDEX IF NOT EXISTS idx_files_size ON files(size DESC);
CREATE INDEX IF NOT EXISTS idx_files_modified ON files(modified_at DESC);
CREATE INDEX IF NOT EXISTS idx_files_hash ON files(file_hash);
CREATE INDEX IF NOT EXISTS idx_files_is_dir ON files(is_directory);
CREATE INDEX IF NOT EXISTS idx_files_name ON files(name);

CREATE VIRTUAL TABLE IF NOT EXISTS files_fts USING fts5(
    name,
    full_text,
    path,
    content='files',
    content_rowid='id',
    tokenize='porter unicode61'
);

CREATE TRIGGER IF NOT EXISTS files_ai AFTER INSERT ON files BEGIN
    INSERT INTO files_fts(rowid, name, full_text, path)
    VALUES (new.id, new.name, new.full_text, new.path);
END;

CREATE TRIGGER IF NOT EXISTS files_ad AFTER DELETE ON files BEGIN
    INSERT INTO files_fts(files_fts, rowid, name, full_text, path)
    VALUES ('delete', old.id, old.name, old.full_text, old.path);
END;

CREATE TRIGGER IF NOT EXISTS files_au AFTER UPDATE ON files BEGIN
    INSERT INTO files_fts(files_fts, rowid, name, full_text, path)
    VALUES ('delete', old.id, old.name, old.full_text, old.path);
    INSERT INTO files_fts(rowid, name, full_text, path)
    VALUES (new.id, new.name, new.full_text, new.path);
END;

CREATE TABLE IF NOT EXISTS file_metadata (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL UNIQUE,
    metadata TEXT,
    FOREIGN KEY (file_id) REFERENCES files(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS file_tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL,
    tag TEXT NOT NULL,
    tag_type TEXT NOT NULL DEFAULT 'rule',
    FOREIGN KEY (file_id) REFERENCES files(id) ON DELETE CASCADE,
    UNIQUE(file_id, tag)
);

CREATE INDEX IF NOT EXISTS idx_tags_file ON file_tags(file_id);
CREATE INDEX IF NOT EXISTS idx_tags_tag ON file_tags(tag);

CREATE TABLE IF NOT EXISTS scan_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    status TEXT NOT NULL DEFAULT 'running',
    files_scanned INTEGER NOT NULL DEFAULT 0,
    files_added INTEGER NOT NULL DEFAULT 0,
    files_updated INTEGER NOT NULL DEFAULT 0,
    files_removed INTEGER NOT NULL DEFAULT 0,
    errors INTEGER NOT NULL DEFAULT 0,
    error_log TEXT
);
"#;

/// Pragmas applied to every pooled connection (spec.md §6): WAL journaling,
/// relaxed sync for throughput, a 64MB page cache, and foreign keys on so
/// the `ON DELETE CASCADE` clauses above actually fire.
pub const PRAGMAS: &str = r#"
PRAGMA journal_mode=WAL;
PRAGMA synchronous=NORMAL;
PRAGMA cache_size=-64000;
PRAGMA foreign_keys=ON;
"#;
