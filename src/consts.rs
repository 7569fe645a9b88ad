/// Unit suffix of stored elapsed times ("1.5s")
pub(crate) const ELAPSED_UNIT: &str = "s";

/// Environment variable overriding the database location
pub(crate) const DB_ENV: &str = "TOOLSTATS_DB";

/// Environment variable pointing at an explicit config file
pub(crate) const CONFIG_ENV: &str = "TOOLSTATS_CONFIG";

pub(crate) const APP_DIR: &str = "toolstats";
pub(crate) const DB_FILE: &str = "usage.db";
