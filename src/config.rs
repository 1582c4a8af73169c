use crate::logging;
use crate::settings::{CfgDefaultKeymaps, Keymap, Settings};
use eyre::Result;
use serde::de::DeserializeOwned;
use std::{fs, path::PathBuf};

pub const APP_NAME: &str = "docnav";
const CONFIG_FILE: &str = "configuration.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub keymap: Keymap,
    keymap_user_dict: CfgDefaultKeymaps,
    filepath: PathBuf,
}

impl Config {
    /// Load the configuration from the app data directory, writing the
    /// defaults out on first run.
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        let filepath = prefix.join(CONFIG_FILE);
        let existed = filepath.exists();

        let config = Self::load_from(filepath)?;
        if !existed {
            config.save()?;
        }
        Ok(config)
    }

    /// Load configuration from a custom path. A missing or malformed file
    /// yields the defaults.
    pub fn load_from(filepath: PathBuf) -> Result<Self> {
        let mut settings = Settings::default();
        let mut keymap_user_dict = CfgDefaultKeymaps::default();

        if filepath.exists() {
            let config_str = fs::read_to_string(&filepath)?;
            match serde_json::from_str::<serde_json::Value>(&config_str) {
                Ok(user_config) => {
                    if let Some(user_settings) = section::<Settings>(&user_config, "Setting") {
                        settings.merge(user_settings);
                    }
                    if let Some(user_keymap) = section::<CfgDefaultKeymaps>(&user_config, "Keymap") {
                        keymap_user_dict.merge(user_keymap);
                    }
                }
                Err(err) => logging::warn(format!(
                    "ignoring invalid configuration {}: {}",
                    filepath.display(),
                    err
                )),
            }
        }

        Ok(Self::from_parts(settings, keymap_user_dict, filepath))
    }

    pub fn from_parts(settings: Settings, keymap_user_dict: CfgDefaultKeymaps, filepath: PathBuf) -> Self {
        let keymap = Keymap::from_user(&keymap_user_dict);
        Self {
            settings,
            keymap,
            keymap_user_dict,
            filepath,
        }
    }

    pub fn filepath(&self) -> &PathBuf {
        &self.filepath
    }

    /// Key names as the user wrote them, for the help window.
    pub fn keymap_user_dict(&self) -> &CfgDefaultKeymaps {
        &self.keymap_user_dict
    }

    pub fn save(&self) -> Result<()> {
        let config_json = serde_json::json!({
            "Setting": self.settings,
            "Keymap": self.keymap_user_dict,
        });
        let config_str = serde_json::to_string_pretty(&config_json)?;

        if let Some(parent) = self.filepath.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.filepath, config_str)?;
        Ok(())
    }
}

fn section<T: DeserializeOwned>(config: &serde_json::Value, name: &str) -> Option<T> {
    let value = config.get(name)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            logging::warn(format!("ignoring invalid \"{}\" section: {}", name, err));
            None
        }
    }
}

pub fn get_app_data_prefix() -> Result<PathBuf> {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(config_home).join(APP_NAME));
    } else if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home.clone()).join(".config").join(APP_NAME);
        if path.exists() {
            return Ok(path);
        }
        return Ok(PathBuf::from(home).join(format!(".{}", APP_NAME)));
    } else if let Some(user_profile) = std::env::var_os("USERPROFILE") {
        return Ok(PathBuf::from(user_profile).join(format!(".{}", APP_NAME)));
    }

    Err(eyre::eyre!("Could not determine application data directory"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Action;
    use std::env;
    use std::sync::{Mutex, OnceLock};
    use tempfile::tempdir;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("lock env mutex")
    }

    struct SavedEnv {
        home: Option<std::ffi::OsString>,
        xdg_config_home: Option<std::ffi::OsString>,
        userprofile: Option<std::ffi::OsString>,
    }

    impl SavedEnv {
        fn isolate(dir: &tempfile::TempDir) -> Self {
            let saved = Self {
                home: env::var_os("HOME"),
                xdg_config_home: env::var_os("XDG_CONFIG_HOME"),
                userprofile: env::var_os("USERPROFILE"),
            };
            unsafe {
                env::set_var("XDG_CONFIG_HOME", dir.path());
                env::remove_var("HOME");
                env::remove_var("USERPROFILE");
            }
            saved
        }
    }

    impl Drop for SavedEnv {
        fn drop(&mut self) {
            unsafe {
                for (key, value) in [
                    ("HOME", &self.home),
                    ("XDG_CONFIG_HOME", &self.xdg_config_home),
                    ("USERPROFILE", &self.userprofile),
                ] {
                    match value {
                        Some(value) => env::set_var(key, value),
                        None => env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_new_writes_defaults() -> Result<()> {
        let _env_lock = lock_env();
        let dir = tempdir()?;
        let _saved = SavedEnv::isolate(&dir);

        let config = Config::new()?;
        let expected = dir.path().join("docnav").join("configuration.json");
        assert_eq!(config.filepath(), &expected);
        assert!(expected.exists());

        let json_value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&expected)?)?;
        let loaded: Settings = serde_json::from_value(json_value["Setting"].clone())?;
        assert_eq!(loaded, Settings::default());
        let keys: CfgDefaultKeymaps = serde_json::from_value(json_value["Keymap"].clone())?;
        assert_eq!(keys, CfgDefaultKeymaps::default());
        Ok(())
    }

    #[test]
    fn test_config_new_reads_existing_file() -> Result<()> {
        let _env_lock = lock_env();
        let dir = tempdir()?;
        let _saved = SavedEnv::isolate(&dir);

        let config_path = dir.path().join("docnav").join("configuration.json");
        fs::create_dir_all(dir.path().join("docnav"))?;
        let config_json = serde_json::json!({
            "Setting": { "root_selector": "main", "back_top_threshold": 100.0 },
            "Keymap": { "quit": "Q" }
        });
        fs::write(&config_path, serde_json::to_string(&config_json)?)?;

        let config = Config::new()?;
        assert_eq!(config.settings.root_selector, "main");
        assert_eq!(config.settings.back_top_threshold, 100.0);
        assert_eq!(config.settings.nav_selector, "nav");
        assert_eq!(config.keymap_user_dict().quit, "Q");
        assert_eq!(config.keymap.action("Q"), Some(Action::Quit));
        assert_eq!(config.keymap.action("q"), None);
        Ok(())
    }

    #[test]
    fn test_load_from_invalid_json_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json")?;

        let config = Config::load_from(path)?;
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.keymap_user_dict(), &CfgDefaultKeymaps::default());
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("configuration.json");

        let mut settings = Settings::default();
        settings.fallback_back_url = "https://example.com/docs/".to_string();
        settings.toast_duration_ms = 2000;
        Config::from_parts(settings.clone(), CfgDefaultKeymaps::default(), path.clone()).save()?;

        let reloaded = Config::load_from(path)?;
        assert_eq!(reloaded.settings, settings);
        Ok(())
    }

    #[test]
    fn test_get_app_data_prefix() {
        let _env_lock = lock_env();
        let xdg_dir = tempdir().unwrap();
        let _saved = SavedEnv::isolate(&xdg_dir);
        assert_eq!(get_app_data_prefix().unwrap(), xdg_dir.path().join("docnav"));

        let home_dir = tempdir().unwrap();
        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
            env::set_var("HOME", home_dir.path());
        }
        assert_eq!(get_app_data_prefix().unwrap(), home_dir.path().join(".docnav"));

        std::fs::create_dir_all(home_dir.path().join(".config").join("docnav")).unwrap();
        assert_eq!(
            get_app_data_prefix().unwrap(),
            home_dir.path().join(".config").join("docnav")
        );
    }
}
