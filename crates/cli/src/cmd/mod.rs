mod context;
mod env;
mod exec;
mod run;

pub use env::cmd_env;
pub use exec::cmd_exec;
pub use run::cmd_run;
