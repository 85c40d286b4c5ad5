pub mod classpath;
pub mod task;

pub use classpath::{build_classpath, client_jar_path, ResolvedFileSet};
pub use task::{build_launch_args, launch, LaunchHandle, LaunchRequest, ServerTarget};
