//! pkgrun-lib: the lifecycle script executor behind pkgrun
//!
//! Given a package descriptor, a working directory and a shell command, this crate:
//! - synthesizes the child environment from package metadata and configuration (`environment`)
//! - assembles the executable search path for the dependency tree (`search_path`)
//! - runs the command through the host shell and maps its exit (`lifecycle`)
//! - dispatches the optional stage hook once the command succeeds (`lifecycle::hook`)

pub mod config;
pub mod consts;
pub mod environment;
pub mod lifecycle;
pub mod package;
pub mod platform;
pub mod search_path;
pub mod util;

pub use config::{Config, ConfigSource, ConfigValue};
pub use environment::{EnvCache, EnvSnapshot, Environment, synthesize};
pub use lifecycle::{ErrorCode, ExecContext, ExitDiagnostic, Lifecycle, LifecycleError};
pub use package::{Meta, Object, Package};
pub use platform::Host;
