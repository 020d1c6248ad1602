//! # Modulo de configuracion
//! Lee el archivo de configuracion del cliente, con lineas en formato "clave valor".

use log::warn;
use std::{
    collections::HashMap,
    error::Error,
    fmt,
    fs::File,
    io::{BufRead, BufReader},
};

const PORT: &str = "port";
const DOWNLOAD_PATH: &str = "download_path";
const LOG_PATH: &str = "log_path";
const WHITESPACE: char = ' ';
const COMMENT: char = '#';

const DEFAULT_PORT: u32 = 6881;
const DEFAULT_DOWNLOAD_PATH: &str = "downloads";
const DEFAULT_LOG_PATH: &str = "logs";

type ResultConfig<T> = Result<T, ConfigFileDataError>;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ConfigFileData {
    pub port: u32,
    pub log_path: String,
    pub download_path: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigFileDataError {
    FileNotFound(String),
    Reading(String),
    PortNotANumber,
    InvalidFormat(String),
    MissingPort,
    MissingPath(String),
}

impl fmt::Display for ConfigFileDataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Error del archivo de configuración.\n Backtrace: {:?}\n",
            self
        )
    }
}

impl Error for ConfigFileDataError {}

impl Default for ConfigFileData {
    fn default() -> Self {
        ConfigFileData {
            port: DEFAULT_PORT,
            log_path: DEFAULT_LOG_PATH.to_string(),
            download_path: DEFAULT_DOWNLOAD_PATH.to_string(),
        }
    }
}

impl ConfigFileData {
    /// Datos del archivo de configuración, en formato "clave valor" separados por un espacio.
    /// Requiere las claves:
    /// port: puerto que se anuncia al tracker
    /// download_path: directorio donde se crea el archivo descargado
    /// log_path: directorio del archivo de logs
    /// Las lineas vacias o que comienzan con `#` se ignoran.
    /// ```txt
    /// port 6881
    /// download_path downloads
    /// log_path logs
    /// ```
    pub fn new(config_file_path: &str) -> ResultConfig<ConfigFileData> {
        let lines = read_config_file(config_file_path)?;
        let config_map = get_data_from_config_file(lines)?;
        Ok(ConfigFileData {
            port: read_port(&config_map)?,
            log_path: read_path(&config_map, LOG_PATH)?,
            download_path: read_path(&config_map, DOWNLOAD_PATH)?,
        })
    }

    /// Igual que `new`, pero si el archivo no existe se usan los valores por defecto.
    /// Cualquier otro error del archivo se propaga.
    pub fn new_or_default(config_file_path: &str) -> ResultConfig<ConfigFileData> {
        match ConfigFileData::new(config_file_path) {
            Err(ConfigFileDataError::FileNotFound(path)) => {
                warn!(
                    "No se encontró el archivo de configuración {}, se usan los valores por defecto",
                    path
                );
                Ok(ConfigFileData::default())
            }
            result => result,
        }
    }

    pub fn get_port(&self) -> u32 {
        self.port
    }

    pub fn get_log_path(&self) -> String {
        self.log_path.clone()
    }

    pub fn get_download_path(&self) -> String {
        self.download_path.clone()
    }
}

fn get_data_from_config_file(lines: Vec<String>) -> ResultConfig<HashMap<String, String>> {
    let mut config_map: HashMap<String, String> = HashMap::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT) {
            continue;
        }
        let pair_data_value: Vec<&str> = line
            .split(WHITESPACE)
            .filter(|s| !s.is_empty())
            .collect();

        match &pair_data_value[..] {
            [key, value] => {
                config_map.insert(key.to_string(), value.to_string());
            }
            _ => return Err(ConfigFileDataError::InvalidFormat(line.to_string())),
        }
    }
    Ok(config_map)
}

fn read_port(config_map: &HashMap<String, String>) -> ResultConfig<u32> {
    match config_map.get(PORT) {
        Some(value_read) => value_read
            .parse::<u32>()
            .map_err(|_| ConfigFileDataError::PortNotANumber),
        None => Err(ConfigFileDataError::MissingPort),
    }
}

fn read_path(config_map: &HashMap<String, String>, path_key: &str) -> ResultConfig<String> {
    config_map
        .get(path_key)
        .cloned()
        .ok_or_else(|| ConfigFileDataError::MissingPath(path_key.to_string()))
}

fn read_config_file(filename: &str) -> ResultConfig<Vec<String>> {
    let file =
        File::open(filename).map_err(|_| ConfigFileDataError::FileNotFound(filename.to_string()))?;

    BufReader::new(file)
        .lines()
        .map(|line| line.map_err(|err| ConfigFileDataError::Reading(format!("{}", err))))
        .collect()
}

#[cfg(test)]
mod tests_config_file {
    use super::*;
    use std::{env, fs};

    fn write_temp_config(name: &str, content: &str) -> Result<String, Box<dyn Error>> {
        let path = env::temp_dir().join(name);
        fs::write(&path, content)?;
        Ok(path.display().to_string())
    }

    #[test]
    fn read_fill_config_data_ok() -> Result<(), Box<dyn Error>> {
        let path = write_temp_config(
            "ferris_leech_config_ok.txt",
            "port 6882\ndownload_path results/download\nlog_path results/logs\n",
        )?;
        let config = ConfigFileData::new(&path)?;
        fs::remove_file(&path)?;

        assert_eq!(config.get_port(), 6882);
        assert_eq!(config.get_download_path(), "results/download");
        assert_eq!(config.get_log_path(), "results/logs");
        Ok(())
    }

    #[test]
    fn config_ignores_comments_and_empty_lines() -> Result<(), Box<dyn Error>> {
        let path = write_temp_config(
            "ferris_leech_config_comments.txt",
            "# cliente\n\nport 7000\nlog_path l\ndownload_path d\n",
        )?;
        let config = ConfigFileData::new(&path)?;
        fs::remove_file(&path)?;

        assert_eq!(config.port, 7000);
        Ok(())
    }

    #[test]
    fn config_with_port_not_a_number_error() -> Result<(), Box<dyn Error>> {
        let path = write_temp_config(
            "ferris_leech_config_bad_port.txt",
            "port abc\ndownload_path d\nlog_path l\n",
        )?;
        let result = ConfigFileData::new(&path);
        fs::remove_file(&path)?;

        assert_eq!(Err(ConfigFileDataError::PortNotANumber), result);
        Ok(())
    }

    #[test]
    fn config_missing_log_path_error() -> Result<(), Box<dyn Error>> {
        let path = write_temp_config(
            "ferris_leech_config_missing_log.txt",
            "port 1\ndownload_path d\n",
        )?;
        let result = ConfigFileData::new(&path);
        fs::remove_file(&path)?;

        assert_eq!(
            Err(ConfigFileDataError::MissingPath(LOG_PATH.to_string())),
            result
        );
        Ok(())
    }

    #[test]
    fn config_with_invalid_line_error() -> Result<(), Box<dyn Error>> {
        let path = write_temp_config(
            "ferris_leech_config_invalid_line.txt",
            "port 1 2\n",
        )?;
        let result = ConfigFileData::new(&path);
        fs::remove_file(&path)?;

        assert!(matches!(result, Err(ConfigFileDataError::InvalidFormat(_))));
        Ok(())
    }

    #[test]
    fn missing_config_file_uses_defaults() -> Result<(), ConfigFileDataError> {
        let config = ConfigFileData::new_or_default("no_existe_config_ferris_leech.txt")?;
        assert_eq!(ConfigFileData::default(), config);
        Ok(())
    }
}
