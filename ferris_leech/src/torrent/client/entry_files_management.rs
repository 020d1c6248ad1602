use std::{env, error::Error, fmt, path::Path};

use log::error;

#[derive(Debug, PartialEq, Eq)]
pub enum EntryFilesError {
    NoArgs,
    TooManyArgs(usize),
    NotFound(String),
}

impl fmt::Display for EntryFilesError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for EntryFilesError {}

#[derive(Debug, PartialEq, Eq, Clone)]
/// Argumentos recibidos por consola: `<archivo.torrent> [directorio_destino] [archivo_parcial]`
pub struct EntryArgs {
    pub torrent_path: String,
    pub output_dir: Option<String>,
    pub resume_file: Option<String>,
}

///
/// Funcion encargada de interpretar los argumentos recibidos (sin incluir el nombre del programa).
/// El .torrent debe existir; el directorio destino y el archivo parcial son opcionales.
///
pub fn parse_entry_args(args: Vec<String>) -> Result<EntryArgs, EntryFilesError> {
    let mut iter_args = args.into_iter();
    let torrent_path = match iter_args.next() {
        Some(path) => path,
        None => {
            error!("No ingreso un archivo .torrent por terminal");
            return Err(EntryFilesError::NoArgs);
        }
    };
    if !Path::new(&torrent_path).is_file() {
        error!("No se encontro el archivo ingresado");
        return Err(EntryFilesError::NotFound(torrent_path));
    }

    let output_dir = iter_args.next();
    let resume_file = iter_args.next();
    let extra_args = iter_args.count();
    if extra_args > 0 {
        return Err(EntryFilesError::TooManyArgs(3 + extra_args));
    }

    Ok(EntryArgs {
        torrent_path,
        output_dir,
        resume_file,
    })
}

/// Lee los argumentos del programa desde `env::args`.
pub fn read_entry_args() -> Result<EntryArgs, EntryFilesError> {
    parse_entry_args(env::args().skip(1).collect())
}
