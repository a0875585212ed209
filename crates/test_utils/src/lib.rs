use once_cell::sync::Lazy;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Global mutex to serialize tests that modify the process working directory.
/// Changing the directory concurrently can lead to nondeterministic failures.
pub static TEST_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// A complete `stack.yml` pointing at the fixture function directories
/// written by [`write_fixture_project`].
pub const FIXTURE_STACK_YML: &str = r#"name: weather-stack
project: cautious-guacamole-381604
region: us-central1
repository:
  owner: hsmtkk
  name: cautious-guacamole
cities:
  - Tokyo
secret:
  id: open-weather-secret
  version: "2"
functions:
  weather_getter:
    source_dir: weathergetter
    entry_point: GetWeather
  transformer:
    source_dir: transformer
    entry_point: Transform
schedule:
  cron: "* * * * *"
warehouse:
  dataset: weather_dataset
  table: weather_table
  sink: topic_bridge
"#;

pub const WEATHER_GETTER_SOURCE: &str = "package weathergetter\n\nfunc GetWeather() {}\n";
pub const TRANSFORMER_SOURCE: &str = "package transformer\n\nfunc Transform() {}\n";

/// Write `stack.yml` plus two small function source trees into `root` and
/// return `root`.
pub fn write_fixture_project(root: &Path, stack_yml: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(root)?;
    fs::write(root.join("stack.yml"), stack_yml)?;

    let getter = root.join("weathergetter");
    fs::create_dir_all(&getter)?;
    fs::write(getter.join("weathergetter.go"), WEATHER_GETTER_SOURCE)?;
    fs::write(getter.join("go.mod"), "module weathergetter\n\ngo 1.21\n")?;

    let transformer = root.join("transformer");
    fs::create_dir_all(&transformer)?;
    fs::write(transformer.join("transformer.go"), TRANSFORMER_SOURCE)?;
    fs::write(transformer.join("go.mod"), "module transformer\n\ngo 1.21\n")?;

    Ok(root.to_path_buf())
}

/// Write a set of `(relative path, contents)` files under `root`, creating
/// parent directories as needed.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> io::Result<()> {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
    }
    Ok(())
}

/// Temporarily change the current working directory for the duration of the closure.
/// Guards against concurrent `chdir` calls by taking the global `TEST_MUTEX` lock.
/// Always restores the original directory, even if the closure panics.
pub fn with_chdir<F, T>(target: impl AsRef<Path>, f: F) -> io::Result<T>
where
    F: FnOnce() -> T,
{
    let _lock = TEST_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let original = env::current_dir()?;
    env::set_current_dir(target.as_ref())?;

    struct Reset(PathBuf);
    impl Drop for Reset {
        fn drop(&mut self) {
            let _ = env::set_current_dir(&self.0);
        }
    }
    let _guard = Reset(original);

    Ok(f())
}
