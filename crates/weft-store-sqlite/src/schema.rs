//! SQL schema for the weft SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS owners (
    owner_id    INTEGER PRIMARY KEY,
    version     INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    item_id     INTEGER PRIMARY KEY,
    fields      TEXT NOT NULL DEFAULT '{}',  -- JSON object
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- View presence is a separate fact: an item can exist in zero views.
CREATE TABLE IF NOT EXISTS item_views (
    item_id     INTEGER NOT NULL REFERENCES items(item_id) ON DELETE CASCADE,
    view        TEXT NOT NULL,               -- 'draft' | 'public'
    written_at  TEXT NOT NULL,
    PRIMARY KEY (item_id, view)
);

-- One row per relationship instance. The same table carries edit history:
-- a live_copy row's linked_item_id points at the item it stands in for.
CREATE TABLE IF NOT EXISTS links (
    link_id         INTEGER PRIMARY KEY,
    relation        TEXT NOT NULL,
    owner_id        INTEGER NOT NULL REFERENCES owners(owner_id),
    item_id         INTEGER NOT NULL REFERENCES items(item_id),
    status          TEXT NOT NULL,           -- see LinkStatus
    linked_item_id  INTEGER,                 -- live_copy back-link
    editor_id       INTEGER,
    version         INTEGER NOT NULL DEFAULT 0,
    extra           TEXT NOT NULL DEFAULT '{}',
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    UNIQUE (relation, owner_id, item_id)
);

CREATE INDEX IF NOT EXISTS links_scope_idx ON links(relation, owner_id);
CREATE INDEX IF NOT EXISTS links_item_idx  ON links(item_id);

-- At most one live shadow per edited item within a relation and owner.
CREATE UNIQUE INDEX IF NOT EXISTS links_shadow_idx
    ON links(relation, owner_id, linked_item_id)
    WHERE status = 'live_copy' AND linked_item_id IS NOT NULL;

PRAGMA user_version = 1;
";
