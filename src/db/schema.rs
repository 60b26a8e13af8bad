//! SQL DDL for initializing the inventory database.
//! SQLite-first design; ids are hyphenated UUID text, timestamps RFC3339 text.

/// SQLite schema with:
/// - `users.email`, `user_roles.name`, `suppliers.name` and
///   `chemicals.chemical_name` UNIQUE (case-insensitive), so lookup-or-insert
///   can rely on `ON CONFLICT`
/// - `user_role_assignments` UNIQUE(user_id, role_id)
/// - `inventory.chemical_id` / `created_by` RESTRICT, `supplier_id` /
///   `updated_by` SET NULL
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    name TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_roles (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    description TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_role_assignments (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    role_id TEXT NOT NULL REFERENCES user_roles(id) ON DELETE CASCADE,
    assigned_at TEXT NOT NULL,
    assigned_by TEXT NULL REFERENCES users(id) ON DELETE SET NULL,
    UNIQUE (user_id, role_id)
);

CREATE TABLE IF NOT EXISTS suppliers (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    contact_email TEXT NULL,
    contact_phone TEXT NULL,
    address TEXT NULL,
    website TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chemicals (
    id TEXT PRIMARY KEY NOT NULL,
    chemical_name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    cid_number TEXT NULL,
    cas_number TEXT NULL,
    molecular_formula TEXT NULL,
    hazard_class TEXT NULL,
    description TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS inventory (
    id TEXT PRIMARY KEY NOT NULL,
    chemical_id TEXT NOT NULL REFERENCES chemicals(id) ON DELETE RESTRICT,
    supplier_id TEXT NULL REFERENCES suppliers(id) ON DELETE SET NULL,
    quantity REAL NOT NULL CHECK (quantity > 0),
    unit TEXT NOT NULL,
    location TEXT NULL,
    lot_number TEXT NULL,
    expiration_date TEXT NULL, -- YYYY-MM-DD
    date_added TEXT NOT NULL,
    notes TEXT NULL,
    created_by TEXT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    updated_by TEXT NULL REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_inventory_chemical_id ON inventory(chemical_id);
CREATE INDEX IF NOT EXISTS idx_inventory_supplier_id ON inventory(supplier_id);
CREATE INDEX IF NOT EXISTS idx_inventory_created_by ON inventory(created_by);
CREATE INDEX IF NOT EXISTS idx_role_assignments_user_id ON user_role_assignments(user_id);
"#;
