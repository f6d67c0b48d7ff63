use crate::config::AppConfig;
use crate::entities;
use sea_orm::sea_query::{ColumnType, TableCreateStatement};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    EntityTrait, Schema,
};
use std::time::Duration;
use tracing::{debug, info};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// Establishes a connection pool to the database.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, DbErr> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };
    establish_connection_with_config(&config).await
}

/// Establishes a connection pool with explicit pool settings.
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, DbErr> {
    debug!(url = %config.url, "Configuring database connection");

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    let pool = Database::connect(opt).await?;
    info!("Database connection established");
    Ok(pool)
}

/// Establishes a connection using pool settings from the application config.
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, DbErr> {
    let config = DbConfig {
        url: cfg.database_url.clone(),
        max_connections: cfg.db_max_connections,
        min_connections: cfg.db_min_connections,
        ..Default::default()
    };
    establish_connection_with_config(&config).await
}

/// Rebuilds a `CREATE TABLE` statement so it is accepted by sea-query's
/// SQLite backend, which rejects `Decimal` columns with precision greater
/// than 16 (it panics while building the DDL). The production Postgres
/// schema keeps the full precision declared on the entities; this clamp
/// only applies to the dev/test SQLite path, where SQLite stores numeric
/// values with NUMERIC affinity and ignores the declared precision anyway.
fn clamp_sqlite_decimals(stmt: &TableCreateStatement) -> TableCreateStatement {
    let mut patched = TableCreateStatement::new();
    if let Some(table) = stmt.get_table_name() {
        patched.table(table.clone());
    }
    for column in stmt.get_columns() {
        let mut column = column.clone();
        let clamp_scale = match column.get_column_type() {
            Some(ColumnType::Decimal(Some((precision, scale)))) if *precision > 16 => Some(*scale),
            _ => None,
        };
        if let Some(scale) = clamp_scale {
            column.decimal_len(16, scale);
        }
        patched.col(column);
    }
    for foreign_key in stmt.get_foreign_key_create_stmts() {
        patched.foreign_key(&mut foreign_key.clone());
    }
    for index in stmt.get_indexes() {
        patched.index(&mut index.clone());
    }
    patched.if_not_exists();
    patched
}

async fn create_table_for<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    let built = if backend == DatabaseBackend::Sqlite {
        backend.build(&clamp_sqlite_decimals(&stmt))
    } else {
        backend.build(&stmt)
    };
    db.execute(built).await?;
    Ok(())
}

/// Creates any missing tables from the entity definitions.
///
/// Intended for dev/test setups on SQLite; production databases are
/// migrated externally.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table_for(db, entities::product::Entity).await?;
    create_table_for(db, entities::partner::Entity).await?;
    create_table_for(db, entities::job_party::Entity).await?;
    create_table_for(db, entities::stock_location::Entity).await?;
    create_table_for(db, entities::stock_lot::Entity).await?;
    create_table_for(db, entities::stock_picking::Entity).await?;
    create_table_for(db, entities::stock_move::Entity).await?;
    create_table_for(db, entities::production_order::Entity).await?;
    create_table_for(db, entities::work_center::Entity).await?;
    create_table_for(db, entities::work_center_shift::Entity).await?;
    create_table_for(db, entities::downtime_entry::Entity).await?;
    create_table_for(db, entities::packing_memo::Entity).await?;
    create_table_for(db, entities::packing_memo_line::Entity).await?;
    create_table_for(db, entities::report_row::Entity).await?;
    info!("Schema ensured");
    Ok(())
}
