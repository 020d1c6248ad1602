//! # Modulo de Bitfield
//! Representacion compacta de las piezas que posee un peer: un bit por pieza, donde el bit mas
//! significativo de cada byte corresponde a la pieza de menor indice.

use shared::parsers::p2p::constants::NUM_BITS_ON_A_BYTE;
use std::{error::Error, fmt};

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum BitfieldError {
    IndexOutOfRange(String),
}

impl fmt::Display for BitfieldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\n    {:#?}\n", self)
    }
}

impl Error for BitfieldError {}

#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Bitfield {
    bytes: Vec<u8>,
}

fn bit_position(piece_index: usize) -> (usize, u8) {
    let byte_index = piece_index / NUM_BITS_ON_A_BYTE;
    let offset = piece_index % NUM_BITS_ON_A_BYTE;
    (byte_index, 1 << (NUM_BITS_ON_A_BYTE - 1 - offset))
}

impl Bitfield {
    /// Crea un bitfield a partir de los bytes recibidos en un mensaje Bitfield.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Bitfield { bytes }
    }

    /// Indica si el peer posee la pieza. Un indice fuera de rango se considera como pieza ausente.
    pub fn has_piece(&self, piece_index: usize) -> bool {
        let (byte_index, mask) = bit_position(piece_index);
        match self.bytes.get(byte_index) {
            Some(byte) => byte & mask != 0,
            None => false,
        }
    }

    /// Marca la pieza como disponible. El bitfield nunca crece: escribir un indice
    /// fuera de rango devuelve `IndexOutOfRange`.
    pub fn set_piece(&mut self, piece_index: usize) -> Result<(), BitfieldError> {
        let (byte_index, mask) = bit_position(piece_index);
        let amount_of_bytes = self.bytes.len();
        match self.bytes.get_mut(byte_index) {
            Some(byte) => {
                *byte |= mask;
                Ok(())
            }
            None => Err(BitfieldError::IndexOutOfRange(format!(
                "[BitfieldError] Piece index {} out of a bitfield of {} bytes",
                piece_index, amount_of_bytes
            ))),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
