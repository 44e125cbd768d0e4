#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::fs;
    use std::path::{Path, PathBuf};

    use crate::store::ConfigStore;

    /// Write `content` to `dir/rel`, creating parent directories.
    pub fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// A store whose home directory is pinned to `home`, so global lookups
    /// never touch the real one.
    pub fn store_with_home(home: &Path) -> ConfigStore {
        ConfigStore::builder().home_dir(home).build()
    }

    /// Env lookup over a fixed set of variables.
    pub fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn write_creates_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write(dir.path(), "a/b/c.json", "{}");
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");
    }

    #[test]
    fn lookup_returns_only_known_vars() {
        let env = lookup(&[("HOST", "db1")]);
        assert_eq!(env("HOST").as_deref(), Some("db1"));
        assert_eq!(env("PORT"), None);
    }
}
