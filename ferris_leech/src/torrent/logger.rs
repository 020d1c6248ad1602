//! # Modulo de logs en archivo
//! Registro de eventos de una descarga (piezas completadas, fin, errores) en un archivo propio
//! por torrent. La escritura la realiza un unico thread que consume un canal.

use std::{
    error::Error,
    fmt,
    fs::{self, File, OpenOptions},
    io::Write,
    path::Path,
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

use log::error;
use shared::torrent_file_data::is_safe_file_name;

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Logger {
    log_path: String,
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub enum LogError {
    CanNotCreateDir(String),
    InvalidTorrentName(String),
    CanNotOpenFile(String),
    CanNotJoin,
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for LogError {}

impl Logger {
    /// Crea el logger del torrent indicado; el archivo resultante es `{dir}/{nombre}-logs.txt`.
    /// Si el directorio no existe se crea.
    pub fn new(log_path_dir: &str, torrent_name: &str) -> Result<Logger, LogError> {
        if !is_safe_file_name(torrent_name) {
            return Err(LogError::InvalidTorrentName(format!(
                "[LogError] {} is not a valid file name",
                torrent_name
            )));
        }
        fs::create_dir_all(log_path_dir)
            .map_err(|err| LogError::CanNotCreateDir(format!("{}: {}", log_path_dir, err)))?;
        let log_path = Path::new(log_path_dir)
            .join(format!("{}-logs.txt", torrent_name))
            .display()
            .to_string();
        Ok(Logger { log_path })
    }

    /// Inicializa el logueo y devuelve el sender para el envío de mensajes junto con el handle
    /// del thread escritor. Pueden existir múltiples senders clonando el sender retornado; el
    /// thread termina cuando se dropean todos.
    ///
    /// #Ejemplo
    /// ```
    /// use ferris_leech::torrent::logger::*;
    ///
    /// let logger = Logger::new("temp/logs", "mitorrent.torrent").unwrap();
    /// let (sender1, handle) = logger.init_logger().unwrap();
    /// let sender2 = sender1.clone();
    /// sender1.send("Descargué la pieza 1".to_string()).unwrap();
    /// sender2.send("Descargué la pieza 2".to_string()).unwrap();
    ///
    /// drop(sender2);
    /// close_logger(sender1, handle).unwrap();
    ///
    /// std::fs::remove_file(logger.get_log_path()).unwrap();
    /// ```
    pub fn init_logger(&self) -> Result<(Sender<String>, JoinHandle<()>), LogError> {
        let (sender, receiver): (Sender<String>, Receiver<String>) = mpsc::channel();
        let log_path = self.get_log_path();
        let mut logger_file = open_logger(&log_path)?;
        let handle = thread::spawn(move || {
            for content in receiver.iter() {
                if let Err(err) = writeln!(logger_file, "{}", &content) {
                    error!(
                        "No se pudo escribir el mensaje {} en el archivo de logs {}, error: {}",
                        &content, &log_path, &err
                    )
                }
            }
        });

        Ok((sender, handle))
    }

    pub fn get_log_path(&self) -> String {
        self.log_path.clone()
    }
}

/// Dropea el sender recibido y espera a que el thread escritor vuelque todo lo pendiente.
pub fn close_logger(sender: Sender<String>, handle: JoinHandle<()>) -> Result<(), LogError> {
    drop(sender);
    handle.join().map_err(|_| LogError::CanNotJoin)
}

fn open_logger(log_path: &str) -> Result<File, LogError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|err| LogError::CanNotOpenFile(format!("{}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};

    fn read_log_file(logger: &Logger) -> Result<Vec<String>, Box<dyn Error>> {
        let file = File::open(logger.get_log_path())?;
        let lines = BufReader::new(file).lines().collect::<Result<Vec<_>, _>>()?;
        fs::remove_file(logger.get_log_path())?;
        Ok(lines)
    }

    #[test]
    fn logger_with_name_outside_directory_error() {
        assert!(matches!(
            Logger::new("temp/logs", "../escaped"),
            Err(LogError::InvalidTorrentName(_))
        ));
        assert!(matches!(
            Logger::new("temp/logs", "/tmp/escaped"),
            Err(LogError::InvalidTorrentName(_))
        ));
    }

    #[test]
    fn write_in_log_with_one_sender_ok() -> Result<(), Box<dyn Error>> {
        let logger = Logger::new("temp/logs", "write_in_log_with_one_sender_ok.torrent")?;
        let (sender1, handle) = logger.init_logger()?;
        sender1.send("test_msg".to_string())?;

        close_logger(sender1, handle)?;

        let result = read_log_file(&logger)?;
        assert_eq!(result, vec!["test_msg".to_string()]);
        Ok(())
    }

    #[test]
    fn write_in_log_with_two_senders_keeps_order_per_sender() -> Result<(), Box<dyn Error>> {
        let logger = Logger::new("temp/logs", "write_in_log_with_two_senders.torrent")?;
        let (sender1, handle) = logger.init_logger()?;
        let sender2 = sender1.clone();
        for i in 0..3 {
            sender1.send(format!("test_msg{}", i))?;
        }
        sender2.send("test_sender2".to_string())?;

        drop(sender2);
        close_logger(sender1, handle)?;

        let result = read_log_file(&logger)?;
        assert_eq!(
            result,
            vec!["test_msg0", "test_msg1", "test_msg2", "test_sender2"]
        );
        Ok(())
    }

    #[test]
    fn logger_creates_missing_directory() -> Result<(), Box<dyn Error>> {
        let dir = std::env::temp_dir().join("ferris_leech_logs_nuevo_dir");
        let _ = fs::remove_dir_all(&dir);
        let logger = Logger::new(&dir.display().to_string(), "archivo")?;

        assert!(dir.is_dir());
        assert!(logger.get_log_path().ends_with("archivo-logs.txt"));
        fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
