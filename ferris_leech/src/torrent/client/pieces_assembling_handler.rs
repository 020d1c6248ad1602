//! # Modulo de ensamblado de piezas.
//! Este modulo contiene el archivo destino de la descarga: se reserva con el tamaño total del torrent
//! y cada pieza validada se escribe directamente en su offset.
//!

use core::fmt;
use log::info;
use shared::torrent_file_data::is_safe_file_name;
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, PartialEq, Eq)]
pub enum PiecesAssemblerError {
    SetUpDownloadDirectory(String),
    InvalidFileName(String),
    OpeningTargetFile(String),
    WritingTargetFile(String),
    ReadingTargetFile(String),
    ClosingTargetFile(String),
}

impl fmt::Display for PiecesAssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for PiecesAssemblerError {}

#[derive(Debug)]
/// Archivo destino de la descarga.
pub struct TargetFile {
    file: File,
    path: PathBuf,
}

fn set_len(file: &File, size: u64) -> Result<(), PiecesAssemblerError> {
    file.set_len(size)
        .map_err(|err| PiecesAssemblerError::OpeningTargetFile(format!("{}", err)))
}

impl TargetFile {
    /// Crea (o trunca) el archivo `{dir}/{name}` con el tamaño total de la descarga.
    /// El directorio se crea si no existe. `name` debe ser un nombre de archivo simple.
    pub fn allocate(dir: &str, name: &str, size: u64) -> Result<Self, PiecesAssemblerError> {
        if !is_safe_file_name(name) {
            return Err(PiecesAssemblerError::InvalidFileName(format!(
                "[PiecesAssemblerError] {} is not a valid file name",
                name
            )));
        }
        info!("Preparando el archivo destino de la descarga en {}", dir);
        fs::create_dir_all(dir)
            .map_err(|err| PiecesAssemblerError::SetUpDownloadDirectory(format!("{}", err)))?;

        let path = Path::new(dir).join(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|err| {
                PiecesAssemblerError::OpeningTargetFile(format!("{}: {}", path.display(), err))
            })?;
        set_len(&file, size)?;
        Ok(TargetFile { file, path })
    }

    /// Abre un archivo parcialmente descargado. Si es mas corto que `size` se extiende con ceros.
    pub fn open(path: &str, size: u64) -> Result<Self, PiecesAssemblerError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|err| PiecesAssemblerError::OpeningTargetFile(format!("{}: {}", path, err)))?;

        let current_len = file
            .metadata()
            .map_err(|err| PiecesAssemblerError::OpeningTargetFile(format!("{}", err)))?
            .len();
        if current_len < size {
            set_len(&file, size)?;
        }
        Ok(TargetFile {
            file,
            path: PathBuf::from(path),
        })
    }

    pub fn write_at(&mut self, buf: &[u8], begin: u64) -> Result<(), PiecesAssemblerError> {
        self.file
            .seek(SeekFrom::Start(begin))
            .map_err(|err| PiecesAssemblerError::WritingTargetFile(format!("{}", err)))?;
        self.file
            .write_all(buf)
            .map_err(|err| PiecesAssemblerError::WritingTargetFile(format!("{}", err)))
    }

    /// Lee los bytes del rango `[begin, end)`.
    pub fn read_at(&mut self, begin: u64, end: u64) -> Result<Vec<u8>, PiecesAssemblerError> {
        let length = end.checked_sub(begin).ok_or_else(|| {
            PiecesAssemblerError::ReadingTargetFile(format!(
                "[PiecesAssemblerError] Invalid range {}..{}",
                begin, end
            ))
        })?;
        self.file
            .seek(SeekFrom::Start(begin))
            .map_err(|err| PiecesAssemblerError::ReadingTargetFile(format!("{}", err)))?;

        let mut buf = vec![0; length as usize];
        self.file
            .read_exact(&mut buf)
            .map_err(|err| PiecesAssemblerError::ReadingTargetFile(format!("{}", err)))?;
        Ok(buf)
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    /// Vuelca a disco lo escrito. Los errores del flush se devuelven.
    pub fn close(self) -> Result<(), PiecesAssemblerError> {
        self.file
            .sync_all()
            .map_err(|err| PiecesAssemblerError::ClosingTargetFile(format!("{}", err)))
    }
}
