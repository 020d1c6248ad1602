//! # Modulo de data de un archivo .torrent
//! Este modulo contiene las funciones encargadas de almacenar solo la info
//! importante a partir de la info completa de un .torrent interpretado.
//! Solo se soportan torrents de un unico archivo.

use sha1::{Digest, Sha1};
use std::{
    error::Error,
    fmt,
    path::{Component, Path},
};

use crate::parsers::bencoding::{
    self,
    values::{DicValues, ValuesBencoding},
};
use crate::parsers::p2p::{constants::NUM_OF_BYTES_SHA1, message::InfoHash};

const ANNOUNCE: &str = "announce";
const INFO: &str = "info";
const PIECE_LENGTH: &str = "piece length";
const LENGTH: &str = "length";
const FILES: &str = "files";
const NAME: &str = "name";
const PIECES: &str = "pieces";

#[derive(Debug, PartialEq, Eq)]
///Enumerado que representa la seccion en la que el error puede surgir
pub enum Section {
    Announce,
    Info,
    PieceLength,
    Length,
    Name,
    Pieces,
    Files,
}

#[derive(Debug, PartialEq, Eq)]
///Enumerado que representa el tipo de error que puede surgir, que por dentro tendra
/// su seccion correspondiente
pub enum TorrentFileDataError {
    NotFound(Section),
    Format(Section),
    Creation(Section),
    Calculation(Section),
    MultipleFilesNotSupported(String),
    PieceIndexOutOfRange(String),
}

impl fmt::Display for TorrentFileDataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for TorrentFileDataError {}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TorrentFileData {
    pub url_tracker_main: String,
    pub name: String,
    pub sha1_pieces: Vec<u8>,
    pub sha1_info_hash: InfoHash,
    pub piece_length: u64,
    pub total_length: u64,
    pub total_amount_of_pieces: usize,
}

fn vec_u8_to_string(vec: &[u8]) -> String {
    String::from_utf8_lossy(vec).to_string()
}

fn key(name: &str) -> Vec<u8> {
    name.as_bytes().to_vec()
}

fn init_tracker_main(dic_torrent: &DicValues) -> Result<String, TorrentFileDataError> {
    match dic_torrent.get(&key(ANNOUNCE)) {
        Some(ValuesBencoding::String(tracker)) => Ok(vec_u8_to_string(tracker)),
        Some(_) => Err(TorrentFileDataError::Format(Section::Announce)),
        None => Err(TorrentFileDataError::NotFound(Section::Announce)),
    }
}

fn init_info(dic_torrent: &DicValues) -> Result<&DicValues, TorrentFileDataError> {
    match dic_torrent.get(&key(INFO)) {
        Some(ValuesBencoding::Dic(dic_info)) => Ok(dic_info),
        Some(_) => Err(TorrentFileDataError::Format(Section::Info)),
        None => Err(TorrentFileDataError::NotFound(Section::Info)),
    }
}

fn init_info_hash(dic_info: &DicValues) -> InfoHash {
    //Paso info a bencoding y le aplico SHA-1
    let vec_info = bencoding::encoder::from_dic(dic_info);
    let mut hasher = Sha1::new();
    hasher.update(vec_info);
    let mut info_hash = [0u8; NUM_OF_BYTES_SHA1];
    info_hash.copy_from_slice(hasher.finalize().as_slice());
    info_hash
}

/// Indica si `name` puede usarse como nombre de archivo dentro de un directorio sin salir de el:
/// un unico componente normal, sin separadores ni bytes nulos.
pub fn is_safe_file_name(name: &str) -> bool {
    if name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

fn init_name(dic_info: &DicValues) -> Result<String, TorrentFileDataError> {
    match dic_info.get(&key(NAME)) {
        Some(ValuesBencoding::String(name)) => {
            let name = vec_u8_to_string(name);
            if !is_safe_file_name(&name) {
                return Err(TorrentFileDataError::Format(Section::Name));
            }
            Ok(name)
        }
        Some(_) => Err(TorrentFileDataError::Format(Section::Name)),
        None => Err(TorrentFileDataError::NotFound(Section::Name)),
    }
}

fn init_positive_integer(
    dic_info: &DicValues,
    field: &str,
    section: Section,
) -> Result<u64, TorrentFileDataError> {
    match dic_info.get(&key(field)) {
        Some(ValuesBencoding::Integer(value)) if *value > 0 => {
            u64::try_from(*value).map_err(|_| TorrentFileDataError::Creation(section))
        }
        Some(_) => Err(TorrentFileDataError::Format(section)),
        None => Err(TorrentFileDataError::NotFound(section)),
    }
}

fn init_pieces(dic_info: &DicValues) -> Result<Vec<u8>, TorrentFileDataError> {
    match dic_info.get(&key(PIECES)) {
        Some(ValuesBencoding::String(pieces)) if pieces.len() % NUM_OF_BYTES_SHA1 == 0 => {
            Ok(pieces.clone())
        }
        Some(_) => Err(TorrentFileDataError::Format(Section::Pieces)),
        None => Err(TorrentFileDataError::NotFound(Section::Pieces)),
    }
}

fn init_total_amount_pieces(total_size: u64, piece_lenght: u64) -> usize {
    let mut total_amount_pieces = (total_size / piece_lenght) as usize;
    if total_size % piece_lenght > 0 {
        total_amount_pieces += 1;
    }
    total_amount_pieces
}

impl TorrentFileData {
    ///Crea la estructura a partir del diccionario de un .torrent ya interpretado.
    ///
    /// Falla si falta algun campo necesario, si el campo pieces no es multiplo de 20 bytes,
    /// si la cantidad de hashes no coincide con la cantidad de piezas, o si el torrent es
    /// de multiples archivos.
    pub fn new(dic_torrent: DicValues) -> Result<Self, TorrentFileDataError> {
        let url_tracker_main = init_tracker_main(&dic_torrent)?;
        let dic_info = init_info(&dic_torrent)?;

        if dic_info.contains_key(&key(FILES)) {
            return Err(TorrentFileDataError::MultipleFilesNotSupported(
                "[TorrentFileDataError] Multiple file torrents are not supported".to_string(),
            ));
        }

        let name = init_name(dic_info)?;
        let piece_length = init_positive_integer(dic_info, PIECE_LENGTH, Section::PieceLength)?;
        let total_length = init_positive_integer(dic_info, LENGTH, Section::Length)?;
        let sha1_pieces = init_pieces(dic_info)?;
        let total_amount_of_pieces = init_total_amount_pieces(total_length, piece_length);

        if sha1_pieces.len() / NUM_OF_BYTES_SHA1 != total_amount_of_pieces {
            return Err(TorrentFileDataError::Calculation(Section::Pieces));
        }

        Ok(TorrentFileData {
            url_tracker_main,
            name,
            sha1_pieces,
            sha1_info_hash: init_info_hash(dic_info),
            piece_length,
            total_length,
            total_amount_of_pieces,
        })
    }

    pub fn get_tracker_main(&self) -> String {
        self.url_tracker_main.clone()
    }

    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    pub fn get_info_hash(&self) -> InfoHash {
        self.sha1_info_hash
    }

    pub fn get_piece_length(&self) -> u64 {
        self.piece_length
    }

    pub fn get_total_length(&self) -> u64 {
        self.total_length
    }

    pub fn get_total_amount_pieces(&self) -> usize {
        self.total_amount_of_pieces
    }

    fn check_piece_index(&self, piece_index: usize) -> Result<(), TorrentFileDataError> {
        if piece_index >= self.total_amount_of_pieces {
            return Err(TorrentFileDataError::PieceIndexOutOfRange(format!(
                "[TorrentFileDataError] Piece index {} out of a torrent with {} pieces",
                piece_index, self.total_amount_of_pieces
            )));
        }
        Ok(())
    }

    ///Devuelve el SHA1 esperado de la pieza de indice dado
    pub fn get_piece_sha1(&self, piece_index: usize) -> Result<[u8; 20], TorrentFileDataError> {
        self.check_piece_index(piece_index)?;
        let start = piece_index * NUM_OF_BYTES_SHA1;
        let mut sha1 = [0u8; NUM_OF_BYTES_SHA1];
        sha1.copy_from_slice(&self.sha1_pieces[start..start + NUM_OF_BYTES_SHA1]);
        Ok(sha1)
    }

    /// Devuelve el rango de bytes `[begin, end)` que ocupa la pieza dentro del archivo final.
    /// La ultima pieza se recorta al largo total.
    pub fn calc_piece_bounds(&self, piece_index: usize) -> Result<(u64, u64), TorrentFileDataError> {
        self.check_piece_index(piece_index)?;
        let begin = piece_index as u64 * self.piece_length;
        let end = (begin + self.piece_length).min(self.total_length);
        Ok((begin, end))
    }

    pub fn calculate_piece_lenght(&self, piece_index: usize) -> Result<u64, TorrentFileDataError> {
        let (begin, end) = self.calc_piece_bounds(piece_index)?;
        Ok(end - begin)
    }
}
