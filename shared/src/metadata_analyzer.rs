//! # Modulo de lectura de archivos .torrent
//! Lee un .torrent del disco y lo interpreta como diccionario Bencoding.

use crate::parsers::bencoding;
use crate::parsers::bencoding::values::{DicValues, ErrorBencoding};
use std::ffi::OsStr;
use std::io::Read;
use std::{error::Error, fmt, fs::File, path::Path};

type ResultMetadata<T> = Result<T, MetadataError>;

const TORRENT: &str = "torrent";

#[derive(Debug, PartialEq, Eq)]
pub enum MetadataError {
    FileNotFound(String),
    IsNotTorrent(String),
    Reading(String),
    TransferToDic(ErrorBencoding),
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for MetadataError {}

/// Se encarga de leer la información del .torrent
/// Devuelve los bytes del archivo leído, los cuales se encuentran en formato Bencoding
///
pub fn read_torrent_file(filename: &str) -> ResultMetadata<Vec<u8>> {
    if !check_filename_extension_is_torrent(filename) {
        return Err(MetadataError::IsNotTorrent(filename.to_string()));
    }

    let mut file = File::open(filename)
        .map_err(|err| MetadataError::FileNotFound(format!("{}: {}", filename, err)))?;

    let mut bytes_vec: Vec<u8> = Vec::new();
    file.read_to_end(&mut bytes_vec)
        .map_err(|err| MetadataError::Reading(format!("{}", err)))?;

    Ok(bytes_vec)
}

/// Lee el .torrent y devuelve su diccionario principal.
pub fn read_torrent_file_to_dic(filename: &str) -> ResultMetadata<DicValues> {
    let metadata = read_torrent_file(filename)?;
    bencoding::decoder::from_torrent_to_dic(metadata).map_err(MetadataError::TransferToDic)
}

fn check_filename_extension_is_torrent(filename: &str) -> bool {
    let extension = Path::new(filename).extension().and_then(OsStr::to_str);
    Some(TORRENT) == extension
}
