use super::HandlerContext;
use crate::config::Config;
use crate::error::Result;

/// Print the resolved configuration with the database password masked
pub fn handle_config_show(ctx: &HandlerContext) -> Result<()> {
    let config = ctx.config.redacted();
    if ctx.formatter.is_json() {
        return ctx.formatter.print_json(&config);
    }

    let formatter = &ctx.formatter;
    if let Some(path) = Config::default_path() {
        formatter.info(&format!("Default config file: {}", path.display()));
    }

    formatter.info("\n[server]");
    formatter.field("host", &config.server.host);
    formatter.field("port", &config.server.port.to_string());
    formatter.field("cors_permissive", &config.server.cors_permissive.to_string());

    formatter.info("\n[database]");
    formatter.field("url", config.database.url.as_deref().unwrap_or("(not set)"));
    formatter.field("max_connections", &config.database.max_connections.to_string());
    formatter.field("connect_timeout_secs", &config.database.connect_timeout_secs.to_string());
    formatter.field("run_migrations", &config.database.run_migrations.to_string());

    formatter.info("\n[pagination]");
    formatter.field("default_limit", &config.pagination.default_limit.to_string());
    formatter.field("max_limit", &config.pagination.max_limit.to_string());

    formatter.info("\n[logging]");
    formatter.field("level", &config.logging.level);

    if config.database.url.is_none() {
        formatter.warning("database.url is not set; `serve` needs it unless --in-memory is given");
    }
    Ok(())
}
