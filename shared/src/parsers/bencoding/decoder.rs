//! # Modulo de decoder de Bencoding
//! Este Modulo va a servir para pasar de bytes en formato Bencoding a los valores
//! [ValuesBencoding] correspondientes. Cada funcion devuelve el valor leido junto con
//! los bytes que quedaron sin interpretar.

use super::constants::*;
use super::values::{DicValues, ErrorBencoding, ErrorType, ValuesBencoding};

type TupleStringRest<'a> = (Vec<u8>, &'a [u8]);
type TupleIntegerRest<'a> = (i64, &'a [u8]);
type TupleListRest<'a> = (Vec<ValuesBencoding>, &'a [u8]);
type TupleValueRest<'a> = (ValuesBencoding, &'a [u8]);
type TupleDicRest<'a> = (DicValues, &'a [u8]);

type ResultBencoding<T> = Result<T, ErrorBencoding>;

///Toma un string bencodeado (<largo>:<bytes>) del comienzo de los bytes recibidos
pub fn to_string(to_parse: &[u8]) -> ResultBencoding<TupleStringRest> {
    //Tomo todos los valores antes del ':' que deberian representar el largo del string
    let pos_two_points = match to_parse.iter().position(|byte| *byte == TWO_POINTS) {
        Some(pos) => pos,
        None => return Err(ErrorBencoding::String(ErrorType::Format)),
    };

    let long_bytes = &to_parse[..pos_two_points];
    if long_bytes.is_empty() || !long_bytes.iter().all(u8::is_ascii_digit) {
        return Err(ErrorBencoding::String(ErrorType::Format));
    }
    let long_int = String::from_utf8_lossy(long_bytes)
        .parse::<usize>()
        .map_err(|_| ErrorBencoding::String(ErrorType::Format))?;

    let rest = &to_parse[pos_two_points + 1..];
    if rest.len() < long_int {
        return Err(ErrorBencoding::String(ErrorType::Long));
    }

    Ok((rest[..long_int].to_vec(), &rest[long_int..]))
}

fn is_valid_number(num: &[u8]) -> bool {
    let digits = match num.split_first() {
        Some((&CHAR_MINUS, digits)) => {
            // "-0" no es un numero valido
            if digits.first() == Some(&CHAR_ZERO) {
                return false;
            }
            digits
        }
        _ => num,
    };

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return false;
    }
    !(digits[0] == CHAR_ZERO && digits.len() > 1)
}

///Toma un entero bencodeado (i<numero>e) del comienzo de los bytes recibidos
pub fn to_integer(to_parse: &[u8]) -> ResultBencoding<TupleIntegerRest> {
    //Valido que el primer caracter sea 'i'
    if to_parse.first() != Some(&CHAR_I) {
        return Err(ErrorBencoding::Integer(ErrorType::Format));
    }

    //Valido que termine en 'e'
    let pos_e = match to_parse.iter().position(|byte| *byte == CHAR_E) {
        Some(pos) => pos,
        None => return Err(ErrorBencoding::Integer(ErrorType::Format)),
    };

    let num_bytes = &to_parse[1..pos_e];
    if !is_valid_number(num_bytes) {
        return Err(ErrorBencoding::Integer(ErrorType::Number));
    }

    match String::from_utf8_lossy(num_bytes).parse::<i64>() {
        Ok(num) => Ok((num, &to_parse[pos_e + 1..])),
        Err(_) => Err(ErrorBencoding::Integer(ErrorType::Number)),
    }
}

fn take_value_by_type(from: u8, to_parse: &[u8]) -> ResultBencoding<TupleValueRest> {
    match to_parse.first() {
        Some(type_char) if type_char.is_ascii_digit() => {
            let (str, next_parse) = to_string(to_parse)?;
            Ok((ValuesBencoding::String(str), next_parse))
        }
        Some(&CHAR_I) => {
            let (int, next_parse) = to_integer(to_parse)?;
            Ok((ValuesBencoding::Integer(int), next_parse))
        }
        Some(&CHAR_L) => {
            let (list, next_parse) = to_list(to_parse)?;
            Ok((ValuesBencoding::List(list), next_parse))
        }
        Some(&CHAR_D) => {
            let (dic, next_parse) = to_dic(to_parse)?;
            Ok((ValuesBencoding::Dic(dic), next_parse))
        }
        _ if from == CHAR_L => Err(ErrorBencoding::List(ErrorType::Format)),
        _ => Err(ErrorBencoding::Dic(ErrorType::Format)),
    }
}

///Toma una lista bencodeada (l<valores>e) del comienzo de los bytes recibidos
pub fn to_list(to_parse: &[u8]) -> ResultBencoding<TupleListRest> {
    //Reviso que comience con 'l'
    let mut to_parse = match to_parse.split_first() {
        Some((&CHAR_L, rest)) => rest,
        _ => return Err(ErrorBencoding::List(ErrorType::Format)),
    };

    let mut list_return = Vec::new();
    loop {
        match to_parse.first() {
            Some(&CHAR_E) => return Ok((list_return, &to_parse[1..])),
            None => return Err(ErrorBencoding::List(ErrorType::Format)),
            Some(_) => {
                let (value, next_parse) = take_value_by_type(CHAR_L, to_parse)?;
                list_return.push(value);
                to_parse = next_parse;
            }
        }
    }
}

///Toma un diccionario bencodeado (d<clave><valor>...e) del comienzo de los bytes recibidos.
/// Las claves deben ser strings.
pub fn to_dic(to_parse: &[u8]) -> ResultBencoding<TupleDicRest> {
    //Reviso que comience con 'd'
    let mut to_parse = match to_parse.split_first() {
        Some((&CHAR_D, rest)) => rest,
        _ => return Err(ErrorBencoding::Dic(ErrorType::Format)),
    };

    let mut dic_return = DicValues::new();
    loop {
        match to_parse.first() {
            Some(&CHAR_E) => return Ok((dic_return, &to_parse[1..])),
            None => return Err(ErrorBencoding::Dic(ErrorType::Format)),
            Some(_) => {
                let (key, next_parse) =
                    to_string(to_parse).map_err(|_| ErrorBencoding::Dic(ErrorType::Format))?;
                let (value, next_parse) = take_value_by_type(CHAR_D, next_parse)?;
                dic_return.insert(key, value);
                to_parse = next_parse;
            }
        }
    }
}

/// Funcion principal del decoder: interpreta el contenido completo de un .torrent (o de la respuesta
/// de un tracker) y devuelve el diccionario principal. Los bytes sobrantes luego del
/// diccionario se ignoran.
///
/// # Ejemplo de uso básico:
///
/// ```
/// # use shared::parsers::bencoding::{decoder, values::ValuesBencoding};
/// let dic = decoder::from_torrent_to_dic(b"d3:cow3:mooe".to_vec()).unwrap();
/// assert_eq!(
///     dic.get(&b"cow".to_vec()),
///     Some(&ValuesBencoding::String(b"moo".to_vec()))
/// );
/// ```
pub fn from_torrent_to_dic(torrent: Vec<u8>) -> ResultBencoding<DicValues> {
    let (dic, _rest) = to_dic(&torrent)?;
    Ok(dic)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod tests_to_string {
        use super::*;

        #[test]
        fn to_string_ok() -> Result<(), ErrorBencoding> {
            let (result, rest) = to_string(b"4:testi3e")?;
            assert_eq!(b"test".to_vec(), result);
            assert_eq!(b"i3e", rest);
            Ok(())
        }

        #[test]
        fn to_string_with_binary_content_ok() -> Result<(), ErrorBencoding> {
            let (result, rest) = to_string(&[b'3', b':', 0xff, 0x00, 0xfe])?;
            assert_eq!(vec![0xff, 0x00, 0xfe], result);
            assert!(rest.is_empty());
            Ok(())
        }

        #[test]
        fn to_string_empty_ok() -> Result<(), ErrorBencoding> {
            let (result, _) = to_string(b"0:")?;
            assert!(result.is_empty());
            Ok(())
        }

        #[test]
        fn to_string_without_two_points_error() {
            assert_eq!(
                Err(ErrorBencoding::String(ErrorType::Format)),
                to_string(b"4test")
            );
        }

        #[test]
        fn to_string_too_short_error() {
            assert_eq!(
                Err(ErrorBencoding::String(ErrorType::Long)),
                to_string(b"10:test")
            );
        }
    }

    mod tests_to_integer {
        use super::*;

        #[test]
        fn to_integer_ok() -> Result<(), ErrorBencoding> {
            assert_eq!(42, to_integer(b"i42e")?.0);
            assert_eq!(-42, to_integer(b"i-42e")?.0);
            assert_eq!(0, to_integer(b"i0e")?.0);
            Ok(())
        }

        #[test]
        fn to_integer_invalid_numbers_error() {
            assert_eq!(
                Err(ErrorBencoding::Integer(ErrorType::Number)),
                to_integer(b"i-0e")
            );
            assert_eq!(
                Err(ErrorBencoding::Integer(ErrorType::Number)),
                to_integer(b"i03e")
            );
            assert_eq!(
                Err(ErrorBencoding::Integer(ErrorType::Number)),
                to_integer(b"ie")
            );
        }

        #[test]
        fn to_integer_without_end_error() {
            assert_eq!(
                Err(ErrorBencoding::Integer(ErrorType::Format)),
                to_integer(b"i42")
            );
        }
    }

    mod tests_to_list {
        use super::*;

        #[test]
        fn to_list_ok() -> Result<(), ErrorBencoding> {
            let (list, rest) = to_list(b"l4:spami7eli1eee3:end")?;
            assert_eq!(
                vec![
                    ValuesBencoding::String(b"spam".to_vec()),
                    ValuesBencoding::Integer(7),
                    ValuesBencoding::List(vec![ValuesBencoding::Integer(1)]),
                ],
                list
            );
            assert_eq!(b"3:end", rest);
            Ok(())
        }

        #[test]
        fn to_list_without_end_error() {
            assert_eq!(
                Err(ErrorBencoding::List(ErrorType::Format)),
                to_list(b"l4:spam")
            );
        }
    }

    mod tests_to_dic {
        use super::*;

        #[test]
        fn to_dic_nested_ok() -> Result<(), ErrorBencoding> {
            let dic = from_torrent_to_dic(b"d4:infod6:lengthi10ee4:name1:ae".to_vec())?;

            let mut info = DicValues::new();
            info.insert(b"length".to_vec(), ValuesBencoding::Integer(10));
            assert_eq!(Some(&ValuesBencoding::Dic(info)), dic.get(&b"info".to_vec()));
            assert_eq!(
                Some(&ValuesBencoding::String(b"a".to_vec())),
                dic.get(&b"name".to_vec())
            );
            Ok(())
        }

        #[test]
        fn to_dic_with_integer_key_error() {
            assert_eq!(
                Err(ErrorBencoding::Dic(ErrorType::Format)),
                from_torrent_to_dic(b"di1e3:fooe".to_vec())
            );
        }

        #[test]
        fn from_torrent_that_is_not_a_dic_error() {
            assert_eq!(
                Err(ErrorBencoding::Dic(ErrorType::Format)),
                from_torrent_to_dic(b"l3:fooe".to_vec())
            );
        }
    }
}
