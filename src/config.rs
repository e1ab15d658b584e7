use crate::font_asset::AliasOptions;
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

pub const CONFIG_PATH: &str = "fntimport.ini";

// --- Minimal INI reader ---
#[derive(Debug, Default)]
pub struct SimpleIni {
    sections: HashMap<String, HashMap<String, String>>,
}

impl SimpleIni {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        self.load_str(&content);
        Ok(())
    }

    pub fn load_str(&mut self, content: &str) {
        self.sections.clear();

        let mut current_section: Option<String> = None;

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            // Section header: [SectionName]
            if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
                let section = line[1..line.len() - 1].trim().to_string();
                current_section = Some(section.clone());
                self.sections.entry(section).or_default();
                continue;
            }

            if let Some((key_raw, value_raw)) = line.split_once('=') {
                let key = key_raw.trim();
                if key.is_empty() {
                    continue;
                }
                let section = current_section.clone().unwrap_or_default();
                self.sections
                    .entry(section)
                    .or_default()
                    .insert(key.to_string(), value_raw.trim().to_string());
            }
        }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section).and_then(|s| s.get(key)).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: LogLevel,
    /// Descend into subdirectories when a directory is given.
    pub recursive: bool,
    /// Read the size of page images next to each descriptor.
    pub resolve_textures: bool,
    pub aliases: AliasOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            recursive: true,
            resolve_textures: true,
            aliases: AliasOptions::default(),
        }
    }
}

// Global, mutable configuration instance.
static CONFIG: std::sync::LazyLock<Mutex<Config>> =
    std::sync::LazyLock::new(|| Mutex::new(Config::default()));

fn parse_bool(v: &str) -> Option<bool> {
    let v = v.trim();
    if v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") || v.eq_ignore_ascii_case("on")
    {
        Some(true)
    } else if v.eq_ignore_ascii_case("false")
        || v.eq_ignore_ascii_case("no")
        || v.eq_ignore_ascii_case("off")
    {
        Some(false)
    } else {
        v.parse::<u8>().ok().map(|n| n != 0)
    }
}

/// Hex code point, with or without a `U+`/`0x` prefix.
fn parse_codepoint(v: &str) -> Option<u32> {
    let t = v.trim();
    let digits = t
        .strip_prefix("U+")
        .or_else(|| t.strip_prefix("u+"))
        .or_else(|| t.strip_prefix("0x"))
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    u32::from_str_radix(digits, 16).ok()
}

fn parse_codepoint_list(v: &str) -> Option<Vec<u32>> {
    v.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_codepoint)
        .collect()
}

/// Build a config from parsed INI content, defaulting anything missing or invalid.
pub fn from_ini(conf: &SimpleIni) -> Config {
    let default = Config::default();

    let log_level = match conf.get("Options", "LogLevel") {
        Some(v) => LogLevel::from_str(&v).unwrap_or_else(|()| {
            warn!("Invalid LogLevel '{v}', using {}", default.log_level.as_str());
            default.log_level
        }),
        None => default.log_level,
    };
    let recursive = conf
        .get("Options", "Recursive")
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default.recursive);
    let resolve_textures = conf
        .get("Options", "ResolveTextures")
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default.resolve_textures);

    let source = match conf.get("Options", "AliasSource") {
        Some(v) => parse_codepoint(&v).unwrap_or_else(|| {
            warn!("Invalid AliasSource '{v}', using U+{:04X}", default.aliases.source);
            default.aliases.source
        }),
        None => default.aliases.source,
    };
    let codes = match conf.get("Options", "AliasCodepoints") {
        Some(v) => parse_codepoint_list(&v).unwrap_or_else(|| {
            warn!("Invalid AliasCodepoints '{v}', using defaults");
            default.aliases.codes.clone()
        }),
        None => default.aliases.codes.clone(),
    };

    Config {
        log_level,
        recursive,
        resolve_textures,
        aliases: AliasOptions { source, codes },
    }
}

pub fn load() {
    load_from(CONFIG_PATH);
}

pub fn load_from<P: AsRef<Path>>(path: P) {
    let path = path.as_ref();
    if !path.exists() {
        info!("'{}' not found, using default options.", path.display());
        return;
    }
    let mut conf = SimpleIni::new();
    match conf.load(path) {
        Ok(()) => {
            let cfg = from_ini(&conf);
            *CONFIG.lock().unwrap() = cfg;
            info!("Configuration loaded from '{}'.", path.display());
        }
        Err(e) => warn!("Failed to read '{}': {e}; using defaults.", path.display()),
    }
}

pub fn get() -> Config {
    CONFIG.lock().unwrap().clone()
}

#[cfg(test)]
mod tests {
    use super::{Config, LogLevel, SimpleIni, from_ini, parse_codepoint};

    fn ini(text: &str) -> SimpleIni {
        let mut conf = SimpleIni::new();
        conf.load_str(text);
        conf
    }

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(from_ini(&ini("")), Config::default());
    }

    #[test]
    fn reads_options_section() {
        let conf = ini("; comment\n\
            [Options]\n\
            LogLevel = debug\n\
            Recursive=0\n\
            ResolveTextures=off\n\
            AliasSource=U+0030\n\
            AliasCodepoints=2026, 0x5F ,U+00A0\n");
        let cfg = from_ini(&conf);
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert!(!cfg.recursive);
        assert!(!cfg.resolve_textures);
        assert_eq!(cfg.aliases.source, 0x30);
        assert_eq!(cfg.aliases.codes, vec![0x2026, 0x5F, 0xA0]);
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let conf = ini("[Options]\nLogLevel=loud\nRecursive=maybe\nAliasCodepoints=zz\n");
        let cfg = from_ini(&conf);
        let default = Config::default();
        assert_eq!(cfg.log_level, default.log_level);
        assert_eq!(cfg.recursive, default.recursive);
        assert_eq!(cfg.aliases.codes, default.aliases.codes);
    }

    #[test]
    fn keys_outside_options_are_ignored() {
        let conf = ini("LogLevel=trace\n[Other]\nRecursive=0\n");
        assert_eq!(from_ini(&conf), Config::default());
        assert_eq!(conf.get("", "LogLevel").as_deref(), Some("trace"));
    }

    #[test]
    fn codepoint_prefixes() {
        assert_eq!(parse_codepoint("2026"), Some(0x2026));
        assert_eq!(parse_codepoint("u+5f"), Some(0x5F));
        assert_eq!(parse_codepoint("0X41"), Some(0x41));
        assert_eq!(parse_codepoint("nope"), None);
    }
}
