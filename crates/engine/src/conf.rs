//! Well-known session configuration keys.

pub const EXECUTOR_ID: &str = "spark.executor.id";
pub const SUBMIT_DEPLOY_MODE: &str = "spark.submit.deployMode";
pub const DRIVER_HOST: &str = "spark.driver.host";
pub const DRIVER_PORT: &str = "spark.driver.port";
pub const APP_NAME: &str = "spark.app.name";
pub const MASTER: &str = "spark.master";

/// Executor id the driver runs under.
pub const DRIVER_EXECUTOR_ID: &str = "driver";
