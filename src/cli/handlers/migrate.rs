use super::HandlerContext;
use crate::error::Result;
use crate::storage::PgStore;
use serde_json::json;

/// Apply the embedded migrations to `database.url`
pub fn handle_migrate(ctx: &HandlerContext) -> Result<()> {
    ctx.config.database_url()?;
    ctx.runtime()?.block_on(async {
        let store = PgStore::connect(&ctx.config.database).await?;
        store.migrate().await
    })?;

    if ctx.formatter.is_json() {
        ctx.formatter.print_json(&json!({ "status": "migrated" }))?;
    } else {
        ctx.formatter.success("Database schema is up to date");
    }
    Ok(())
}
