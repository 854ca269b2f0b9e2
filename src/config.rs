use crate::engine::DEFAULT_CHAR_WHITELIST;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "plate-ocr-server")]
#[command(about = "License plate recognition server: color-region tracking, OCR and plate extraction")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value = "9292")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 20MB)
    #[arg(long, env = "OCR_MAX_FILE_SIZE", default_value = "20971520")]
    pub max_file_size: usize,

    /// Preferred OCR engine ("ocrs" or "leptess"); first available if unset
    #[arg(long, env = "OCR_ENGINE")]
    pub engine: Option<String>,

    /// Tesseract language (leptess engine only)
    #[arg(long, env = "OCR_LANGUAGE", default_value = "eng")]
    pub language: String,

    /// Path to tessdata directory (downloaded to the cache if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Characters the recognizer may emit
    #[arg(long, env = "OCR_CHAR_WHITELIST", default_value = DEFAULT_CHAR_WHITELIST)]
    pub char_whitelist: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub engine: Option<String>,
    pub language: String,
    pub tessdata_path: Option<String>,
    pub char_whitelist: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9292,
            max_file_size: 20 * 1024 * 1024,
            engine: None,
            language: "eng".to_string(),
            tessdata_path: None,
            char_whitelist: DEFAULT_CHAR_WHITELIST.to_string(),
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            engine: args.engine,
            language: args.language,
            tessdata_path: args.tessdata_path,
            char_whitelist: args.char_whitelist,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults_match_config_defaults() {
        let args = Args::parse_from(["plate-ocr-server"]);
        let config = Config::from(args);
        let defaults = Config::default();

        assert_eq!(config.port, defaults.port);
        assert_eq!(config.max_file_size, defaults.max_file_size);
        assert_eq!(config.char_whitelist, defaults.char_whitelist);
    }

    #[test]
    fn test_args_override() {
        let args = Args::parse_from([
            "plate-ocr-server",
            "--port",
            "8080",
            "--engine",
            "leptess",
            "--char-whitelist",
            "0123456789ABC",
        ]);
        let config = Config::from(args);

        assert_eq!(config.port, 8080);
        assert_eq!(config.engine.as_deref(), Some("leptess"));
        assert_eq!(config.char_whitelist, "0123456789ABC");
    }
}
