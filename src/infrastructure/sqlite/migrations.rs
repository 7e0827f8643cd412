use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            brand TEXT NOT NULL,
            caliber TEXT NOT NULL,
            caliber_norm TEXT NOT NULL,
            bullet_type TEXT NOT NULL,
            grain_weight INTEGER,
            pressure_rating TEXT NOT NULL DEFAULT 'standard',
            muzzle_velocity_fps INTEGER,
            is_subsonic INTEGER NOT NULL DEFAULT 0,
            round_count INTEGER,
            case_material TEXT,
            short_barrel_optimized INTEGER NOT NULL DEFAULT 0,
            low_flash INTEGER NOT NULL DEFAULT 0,
            match_grade INTEGER NOT NULL DEFAULT 0,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS retailers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            tier TEXT NOT NULL DEFAULT 'standard',
            status TEXT NOT NULL DEFAULT 'eligible'
        );

        CREATE TABLE IF NOT EXISTS merchant_links (
            retailer_id TEXT PRIMARY KEY,
            listed INTEGER NOT NULL,
            active INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS source_adapters (
            retailer_id TEXT PRIMARY KEY,
            robots_compliant INTEGER NOT NULL,
            tos_compliant INTEGER NOT NULL,
            enabled INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS source_observations (
            id TEXT PRIMARY KEY,
            source_item_id TEXT NOT NULL,
            retailer_id TEXT NOT NULL,
            price REAL NOT NULL,
            currency TEXT NOT NULL DEFAULT 'USD',
            in_stock INTEGER NOT NULL,
            observed_at TEXT NOT NULL,
            run_type TEXT NOT NULL,
            run_id TEXT NOT NULL,
            shipping_cost REAL,
            url TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS resolution_links (
            id TEXT PRIMARY KEY,
            source_item_id TEXT NOT NULL UNIQUE,
            product_id TEXT NOT NULL,
            status TEXT NOT NULL,
            confidence REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS corrections (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            factor REAL,
            scope TEXT NOT NULL,
            scope_id TEXT NOT NULL,
            starts_at TEXT NOT NULL,
            ends_at TEXT NOT NULL,
            revoked INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS vectors (
            id TEXT PRIMARY KEY,
            vector BLOB NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_products_caliber ON products(caliber_norm);
        CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand);
        CREATE INDEX IF NOT EXISTS idx_obs_retailer ON source_observations(retailer_id);
        CREATE INDEX IF NOT EXISTS idx_obs_observed ON source_observations(observed_at);
        CREATE INDEX IF NOT EXISTS idx_obs_source ON source_observations(source_item_id);
        CREATE INDEX IF NOT EXISTS idx_links_product ON resolution_links(product_id);
        CREATE INDEX IF NOT EXISTS idx_corrections_window ON corrections(starts_at, ends_at);
        "
    ).map_err(|e| format!("Migration failed: {e}"))
}
