//! # Modulo de encoder de Bencoding
//! Este Modulo va a servir para pasar un String/Integer/List/Dic al formato Bencoding
//!  el cual sera representado por un vector de bytes

use super::constants::*;
use super::values::{DicValues, ValuesBencoding};

///Esta funcion devuelve en formato Bencoding los bytes del string que se le haya pasado
pub fn from_string(to_bencode: &[u8]) -> Vec<u8> {
    let mut bencoding = to_bencode.len().to_string().into_bytes();
    bencoding.push(TWO_POINTS);
    bencoding.extend_from_slice(to_bencode);
    bencoding
}

///Esta funcion devuelve en formato Bencoding el integer pasado
pub fn from_integer(to_bencode: i64) -> Vec<u8> {
    let mut bencoding = vec![CHAR_I];
    bencoding.extend_from_slice(to_bencode.to_string().as_bytes());
    bencoding.push(CHAR_E);
    bencoding
}

fn from_value(value: &ValuesBencoding) -> Vec<u8> {
    match value {
        ValuesBencoding::String(str) => from_string(str),
        ValuesBencoding::Integer(int) => from_integer(*int),
        ValuesBencoding::List(list) => from_list(list),
        ValuesBencoding::Dic(dic) => from_dic(dic),
    }
}

///Esta funcion devuelve en formato Bencoding la lista ([Vec]) pasada
pub fn from_list(to_bencode: &[ValuesBencoding]) -> Vec<u8> {
    let mut bencoding = vec![CHAR_L];
    for value in to_bencode {
        bencoding.extend(from_value(value));
    }
    bencoding.push(CHAR_E);
    bencoding
}

///Esta funcion devuelve en formato Bencoding el Diccionario pasado.
/// Las claves se escriben ordenadas, como exige el formato canonico
/// (necesario para calcular el info_hash).
pub fn from_dic(to_bencode: &DicValues) -> Vec<u8> {
    let mut bencoding = vec![CHAR_D];
    let mut keys_vector: Vec<&Vec<u8>> = to_bencode.keys().collect();
    keys_vector.sort();

    for key in keys_vector {
        if let Some(value) = to_bencode.get(key) {
            bencoding.extend(from_string(key));
            bencoding.extend(from_value(value));
        }
    }
    bencoding.push(CHAR_E);
    bencoding
}
